use std::fmt;

use serde::{Deserialize, Serialize};

/// Mirrored events are never updated in place: a rescheduled event gets a
/// new key, so it shows up as one delete and one create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    Create,
    Delete,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::Create => write!(f, "+"),
            DiffKind::Delete => write!(f, "-"),
        }
    }
}
