//! Low-level field extraction from raw feed text.
//!
//! Feeds are scanned line by line rather than through a full calendar parser:
//! subscriptions in the wild are often slightly malformed, and the engine only
//! needs a handful of fields per event.

/// The unparsed text of one `BEGIN:VEVENT` .. `END:VEVENT` block.
///
/// Lines are stored unfolded. Lines belonging to nested components
/// (e.g. `VALARM`) are kept out of `lines` so they never shadow the
/// event's own fields.
#[derive(Debug, Clone)]
pub struct RawEventRecord {
    raw: String,
    lines: Vec<String>,
}

/// One content line split into name, parameters and raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

/// Split a feed into its event records.
///
/// Text outside of `VEVENT` blocks (calendar properties, `VTIMEZONE`
/// definitions) is ignored. An unterminated trailing block is dropped.
pub fn split_records(feed: &str) -> Vec<RawEventRecord> {
    let normalized = normalize_newlines(feed);
    let mut records = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in normalized.split('\n') {
        let marker = line.trim_end();
        if marker.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(vec![line]);
        } else if marker.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(mut lines) = current.take() {
                lines.push(line);
                records.push(RawEventRecord::new(&lines.join("\n")));
            }
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }

    records
}

impl RawEventRecord {
    pub fn new(raw: &str) -> Self {
        let raw = normalize_newlines(raw);
        let unfolded = unfold(&raw);

        let mut lines = Vec::new();
        let mut depth = 0usize;
        for line in unfolded.split('\n') {
            let upper = line.trim_end().to_ascii_uppercase();
            if upper == "BEGIN:VEVENT" || upper == "END:VEVENT" {
                continue;
            }
            if upper.starts_with("BEGIN:") {
                depth += 1;
                continue;
            }
            if upper.starts_with("END:") {
                depth = depth.saturating_sub(1);
                continue;
            }
            if depth == 0 && !line.trim().is_empty() {
                lines.push(line.to_string());
            }
        }

        RawEventRecord { raw, lines }
    }

    /// The record text as it appeared in the feed (newlines normalized).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Unfolded content lines of the event itself.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// First unfolded line whose name matches `name` (case-insensitive).
    pub fn line(&self, name: &str) -> Option<&str> {
        self.lines()
            .find(|line| field_name(line).is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// First occurrence of a field, split into parameters and value.
    pub fn field(&self, name: &str) -> Option<ParsedField> {
        self.line(name).and_then(parse_line)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.line(name).is_some()
    }

    /// Decoded text value of a field (SUMMARY, DESCRIPTION, LOCATION...).
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).map(|f| decode_text(&f.value))
    }
}

impl ParsedField {
    /// Parameter value by key (case-insensitive), quotes stripped.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn tzid(&self) -> Option<&str> {
        self.param("TZID").filter(|tz| !tz.trim().is_empty())
    }

    /// Whether the value carries its own UTC marker (`...Z`).
    pub fn is_utc(&self) -> bool {
        self.value.trim().ends_with(['Z', 'z'])
    }

    /// Whether the value is a bare date (all-day event).
    pub fn is_date_only(&self) -> bool {
        let value = self.value.trim();
        let eight_digits = value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit());
        eight_digits
            || self
                .param("VALUE")
                .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
    }
}

/// Join continuation lines (leading space or tab) onto the previous line.
///
/// The single leading whitespace character is the folding marker and is
/// removed; nothing is inserted in its place.
pub fn unfold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in normalize_newlines(text).split('\n').enumerate() {
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if i > 0 {
                out.push_str(rest);
                continue;
            }
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// Decode TEXT escapes: `\,` `\;` `\n` `\N` `\\`.
///
/// Single left-to-right pass, so `\\n` decodes to a backslash followed by
/// a literal `n`, never to a newline.
pub fn decode_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('n') | Some('N') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn field_name(line: &str) -> Option<&str> {
    let end = line.find([';', ':'])?;
    Some(line[..end].trim())
}

/// Split `NAME;P1=V1;P2="V:2":VALUE` into its parts.
///
/// Colons and semicolons inside double quotes belong to the parameter value.
fn parse_line(line: &str) -> Option<ParsedField> {
    let name_end = line.find([';', ':'])?;
    let name = line[..name_end].trim().to_string();

    let mut params = Vec::new();
    let mut rest = &line[name_end..];

    while let Some(after) = rest.strip_prefix(';') {
        let end = unquoted_position(after, &[';', ':'])?;
        let (key, val) = after[..end].split_once('=').unwrap_or((&after[..end], ""));
        params.push((key.trim().to_string(), unquote(val.trim()).to_string()));
        rest = &after[end..];
    }

    let value = rest.strip_prefix(':')?;

    Some(ParsedField {
        name,
        params,
        value: value.to_string(),
    })
}

fn unquoted_position(text: &str, delimiters: &[char]) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && delimiters.contains(&c) {
            return Some(i);
        }
    }
    None
}

pub(crate) fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
