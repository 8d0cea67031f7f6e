//! Legacy blocked-author list
//!
//! Pre-database releases kept a single comma-separated list of blocked
//! author names. It is consulted read-only as a fallback source of user
//! intent when an explicit author rating is removed; it is never written.

use shelfmark_common::text::normalize;
use shelfmark_common::Rating;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only view of the deprecated blocked-authors list
#[derive(Debug, Default, Clone)]
pub struct LegacyAuthorList {
    blocked: HashSet<String>,
}

impl LegacyAuthorList {
    /// Parse the raw comma-separated list form
    pub fn from_raw(raw: &str) -> Self {
        let blocked = raw
            .split(',')
            .map(|entry| normalize(entry.trim()))
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { blocked }
    }

    /// Load the list from its legacy location.
    ///
    /// A missing file is the common case after migration and yields an
    /// empty list; an unreadable file is logged and treated the same.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let list = Self::from_raw(&raw);
                debug!(
                    path = %path.display(),
                    entries = list.blocked.len(),
                    "Loaded legacy author list"
                );
                list
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read legacy author list");
                Self::default()
            }
        }
    }

    /// Deprecated-list rating for an author: `bad` iff the normalized
    /// name is present, none otherwise
    pub fn lookup(&self, name: &str) -> Option<Rating> {
        if self.blocked.contains(&normalize(name)) {
            Some(Rating::Bad)
        } else {
            None
        }
    }
}
