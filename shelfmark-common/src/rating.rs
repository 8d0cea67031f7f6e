//! The two-sided rating value shared by the store, engine and events

use serde::{Deserialize, Serialize};
use std::fmt;

/// User-assigned rating for a catalog item or an author.
///
/// The unset state is `Option<Rating>::None` everywhere; absence of a
/// stored key means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Bad,
}

impl Rating {
    /// Stored string form (`"good"` / `"bad"`)
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::Bad => "bad",
        }
    }

    /// Parse the stored string form.
    ///
    /// Unknown values are unset rather than an error: the store has no
    /// schema versioning and a foreign value must not wedge painting.
    pub fn parse_lossy(value: &str) -> Option<Rating> {
        match value {
            "good" => Some(Rating::Good),
            "bad" => Some(Rating::Bad),
            _ => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
