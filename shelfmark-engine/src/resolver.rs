//! Asynchronous author resolution
//!
//! Resolves the author of a catalog item that does not already display
//! one: cache first, then a debounced network fetch through the fetch
//! proxy. The process-lifetime cache is append-and-read only; a genuine
//! name and the no-information sentinel are cached, failures are not.

use crate::fetch::{DocumentQuery, FetchProxy};
use shelfmark_common::text::truncate_at_bracket;
use shelfmark_common::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Debounce interval between hover intent and the network fetch
pub const HOVER_DEBOUNCE: Duration = Duration::from_millis(500);

/// Outcome of a resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A genuine author name
    Name(String),
    /// The detail document carries no author information; cached so the
    /// entity is not fetched again
    NoInfo,
}

impl Resolved {
    /// The genuine name, if this outcome carries one
    pub fn name(&self) -> Option<&str> {
        match self {
            Resolved::Name(name) => Some(name),
            Resolved::NoInfo => None,
        }
    }
}

/// Author resolver: process-scoped cache plus per-entity debounce state.
///
/// Created once at engine start; the cache lives until full
/// reinitialization.
pub struct AuthorResolver {
    fetch: Arc<dyn FetchProxy>,
    query: Arc<dyn DocumentQuery>,
    /// asin → outcome; append-and-read only, shared by all attempts
    cache: Mutex<HashMap<String, Resolved>>,
    /// Pending debounce token per entity; arming replaces the prior token
    pending: Mutex<HashMap<String, CancellationToken>>,
    debounce: Duration,
}

impl AuthorResolver {
    pub fn new(fetch: Arc<dyn FetchProxy>, query: Arc<dyn DocumentQuery>) -> Self {
        Self::with_debounce(fetch, query, HOVER_DEBOUNCE)
    }

    pub fn with_debounce(
        fetch: Arc<dyn FetchProxy>,
        query: Arc<dyn DocumentQuery>,
        debounce: Duration,
    ) -> Self {
        Self {
            fetch,
            query,
            cache: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            debounce,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Cached outcome for an entity, if any
    pub fn cached(&self, asin: &str) -> Option<Resolved> {
        self.cache.lock().unwrap().get(asin).cloned()
    }

    /// Seed the cache from a persisted association (reload-survival path).
    ///
    /// Append-only: an outcome already in the cache wins.
    pub fn prime(&self, asin: &str, name: &str) {
        self.cache
            .lock()
            .unwrap()
            .entry(asin.to_string())
            .or_insert_with(|| Resolved::Name(name.to_string()));
    }

    /// Arm the hover debounce for an entity.
    ///
    /// Returns the token the scheduled task must watch, or None when the
    /// entity is already cached and the trigger is a no-op. A prior
    /// pending task for the same entity is cancelled: the debounce
    /// restarts.
    pub fn arm_hover(&self, asin: &str) -> Option<CancellationToken> {
        if self.cached(asin).is_some() {
            return None;
        }
        let token = CancellationToken::new();
        let mut pending = self.pending.lock().unwrap();
        if let Some(prior) = pending.insert(asin.to_string(), token.clone()) {
            prior.cancel();
        }
        Some(token)
    }

    /// Cancel a pending hover resolution.
    ///
    /// Harmless when nothing is pending or the timer already fired: the
    /// race favors doing nothing once cancelled.
    pub fn cancel_hover(&self, asin: &str) {
        if let Some(token) = self.pending.lock().unwrap().remove(asin) {
            token.cancel();
        }
    }

    /// Resolve the author of an entity.
    ///
    /// Cache hits return immediately without network I/O, including hits
    /// that appeared while a debounce was pending. A fetched name is cut
    /// at the first bracket glyph; an empty result is cached as
    /// [`Resolved::NoInfo`]; a fetch failure is returned as the error and
    /// NOT cached, so a later trigger may retry.
    pub async fn resolve(&self, asin: &str, url: &str) -> Result<Resolved> {
        if let Some(hit) = self.cached(asin) {
            debug!(asin, "Author already cached, skipping fetch");
            return Ok(hit);
        }

        let document = self.fetch.fetch_text(url).await?;

        let outcome = match self.query.author_text(&document) {
            Some(raw) => {
                let name = truncate_at_bracket(raw.trim()).to_string();
                if name.is_empty() {
                    Resolved::NoInfo
                } else {
                    Resolved::Name(name)
                }
            }
            None => Resolved::NoInfo,
        };

        // A racing attempt may have cached first; keep the earlier entry
        // so every reader observes a single outcome.
        let mut cache = self.cache.lock().unwrap();
        let entry = cache
            .entry(asin.to_string())
            .or_insert_with(|| outcome.clone());
        Ok(entry.clone())
    }
}
