//! Calendar store backed by a caldir directory (one .ics file per event).

use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::date_range::DateRange;
use crate::error::{FeedsError, FeedsResult};
use crate::ics::{generate_ics, parse_destination_event};
use crate::store::{CalendarStore, DestinationEvent, NewEvent};

/// A directory of .ics files. The file stem is the event id.
#[derive(Debug, Clone)]
pub struct DirCalendarStore {
    path: PathBuf,
    zone: Tz,
}

impl DirCalendarStore {
    pub fn new(path: impl Into<PathBuf>, zone: Tz) -> Self {
        DirCalendarStore {
            path: path.into(),
            zone,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn event_path(&self, id: &str) -> FeedsResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(FeedsError::Store(format!("Invalid event id '{}'", id)));
        }
        Ok(self.path.join(format!("{}.ics", id)))
    }

    /// Generate a unique file stem for an event, handling collisions.
    /// Timed events: `YYYY-MM-DDTHHMM__slug`
    /// All-day events: `YYYY-MM-DD__slug`
    fn unique_id_for(&self, event: &NewEvent) -> FeedsResult<String> {
        let base = Self::base_id_for(event, self.zone);

        if !self.path.join(format!("{}.ics", base)).exists() {
            return Ok(base);
        }

        // Collision - try suffixes
        for n in 2..=100 {
            let suffixed = format!("{}-{}", base, n);
            if !self.path.join(format!("{}.ics", suffixed)).exists() {
                return Ok(suffixed);
            }
        }

        Err(FeedsError::Store(format!(
            "Too many filename collisions for '{}'",
            base
        )))
    }

    fn base_id_for(event: &NewEvent, zone: Tz) -> String {
        let mut title_slug = slug::slugify(&event.title);
        title_slug.truncate(50);
        let title_slug = title_slug.trim_end_matches('-');
        let title_slug = if title_slug.is_empty() { "event" } else { title_slug };

        let local = event.start.with_timezone(&zone);
        let date = if event.all_day {
            local.format("%Y-%m-%d").to_string()
        } else {
            local.format("%Y-%m-%dT%H%M").to_string()
        };

        format!("{}__{}", date, title_slug)
    }
}

impl CalendarStore for DirCalendarStore {
    fn create_event(&self, event: &NewEvent) -> FeedsResult<String> {
        std::fs::create_dir_all(&self.path)?;

        let id = self.unique_id_for(event)?;
        let uid = uuid::Uuid::new_v4().to_string();
        let content = generate_ics(event, &uid, self.zone)?;

        std::fs::write(self.event_path(&id)?, content)?;
        Ok(id)
    }

    fn list_events(&self, range: &DateRange) -> FeedsResult<Vec<DestinationEvent>> {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events: Vec<DestinationEvent> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .filter_map(|path| {
                let id = path.file_stem()?.to_str()?.to_string();
                let content = match std::fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "unreadable event file");
                        return None;
                    }
                };
                let event = parse_destination_event(&id, &content, self.zone);
                if event.is_none() {
                    tracing::warn!(path = %path.display(), "could not parse event file");
                }
                event
            })
            .filter(|event| range.contains(event.start))
            .collect();

        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    fn delete_event(&self, id: &str) -> FeedsResult<()> {
        std::fs::remove_file(self.event_path(id)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::EventKey;
    use crate::provenance::Provenance;
    use chrono::{Duration, TimeZone, Utc};

    fn new_event(title: &str, key: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            start: Utc.with_ymd_and_hms(2030, 6, 15, 16, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2030, 6, 15, 17, 0, 0).unwrap(),
            all_day: false,
            location: Some("Room 4".to_string()),
            color: None,
            description: "Notes".to_string(),
            provenance: Provenance::new("Work", EventKey::from(key)),
        }
    }

    #[test]
    fn test_create_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirCalendarStore::new(dir.path(), Tz::UTC);

        let id = store.create_event(&new_event("Work Demo", "k1")).unwrap();
        assert_eq!(id, "2030-06-15T1600__work-demo");

        let events = store.list_events(&DateRange::unbounded()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].title, "Work Demo");
        assert!(events[0].belongs_to("Work"));
        assert_eq!(
            events[0].provenance.as_ref().map(|p| p.key.as_str()),
            Some("k1")
        );

        store.delete_event(&id).unwrap();
        assert!(store.list_events(&DateRange::unbounded()).unwrap().is_empty());
    }

    #[test]
    fn test_colliding_titles_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirCalendarStore::new(dir.path(), Tz::UTC);

        let first = store.create_event(&new_event("Demo", "k1")).unwrap();
        let second = store.create_event(&new_event("Demo", "k2")).unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("-2"));
    }

    #[test]
    fn test_list_filters_by_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirCalendarStore::new(dir.path(), Tz::UTC);
        store.create_event(&new_event("Demo", "k1")).unwrap();

        let after = Utc.with_ymd_and_hms(2030, 6, 16, 0, 0, 0).unwrap();
        let range = DateRange::between(after, after + Duration::days(30));
        assert!(store.list_events(&range).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_files_are_listed_without_provenance() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("dentist.ics"),
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:d\nSUMMARY:Dentist\nDTSTART:20300615T090000Z\nDTEND:20300615T100000Z\nEND:VEVENT\nEND:VCALENDAR\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not an event").unwrap();

        let store = DirCalendarStore::new(dir.path(), Tz::UTC);
        let events = store.list_events(&DateRange::unbounded()).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].provenance.is_none());
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirCalendarStore::new(dir.path().join("absent"), Tz::UTC);
        assert!(store.list_events(&DateRange::unbounded()).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirCalendarStore::new(dir.path(), Tz::UTC);
        assert!(store.delete_event("../escape").is_err());
    }
}
