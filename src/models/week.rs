//! Teaching weeks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Week identifier, referenced by session streams.
pub type WeekId = u32;

/// A week of the term. Only used as a set-membership key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Week {
    /// Unique week identifier.
    pub id: WeekId,
    /// Display name (e.g. "1", "Mid-sem break").
    pub name: String,
}

impl Week {
    /// Creates a week.
    pub fn new(id: WeekId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Creates weeks `1..=count` named after their number.
    pub fn term(count: WeekId) -> Vec<Self> {
        (1..=count).map(|id| Self::new(id, id.to_string())).collect()
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Week {}", self.name)
    }
}
