//! Event types for the Shelfmark event system
//!
//! Provides shared event definitions and the EventBus the engine uses to
//! notify external surfaces (e.g. the settings editor) of rating changes.

use crate::Rating;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Shelfmark event types
///
/// Events are broadcast via EventBus after the triggering store mutation
/// has been acknowledged, never optimistically before.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShelfmarkEvent {
    /// A catalog item's rating changed (`None` = cleared back to unset)
    ItemRatingChanged {
        /// Catalog item id
        asin: String,
        /// Rating after the change
        rating: Option<Rating>,
        /// When the change was acknowledged by the store
        timestamp: DateTime<Utc>,
    },

    /// An author's rating changed (`None` = cleared back to unset)
    AuthorRatingChanged {
        /// Normalized author name (the identity key)
        author: String,
        /// Rating after the change
        rating: Option<Rating>,
        /// When the change was acknowledged by the store
        timestamp: DateTime<Utc>,
    },

    /// An author identity was resolved and associated with an item
    AuthorResolved {
        /// Catalog item id
        asin: String,
        /// Normalized author name
        author: String,
        /// When resolution completed
        timestamp: DateTime<Utc>,
    },

    /// An author resolution attempt failed; retryable on the next trigger
    AuthorResolutionFailed {
        /// Catalog item id
        asin: String,
        /// Failure description
        error: String,
        /// When the attempt failed
        timestamp: DateTime<Utc>,
    },

    /// The persistent store's connection handle became invalid; store
    /// operations short-circuit until the hosting context is restored
    StoreUnavailable {
        /// When the condition was detected
        timestamp: DateTime<Utc>,
    },
}

/// Central event distribution bus
///
/// Backed by tokio::broadcast: non-blocking publish, any number of
/// concurrent subscribers, slow subscribers observe lag instead of
/// blocking producers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ShelfmarkEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ShelfmarkEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the subscriber count, or an error when nobody is listening.
    /// Painting never depends on the bus, so an unobserved event is fine.
    pub fn emit(
        &self,
        event: ShelfmarkEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<ShelfmarkEvent>> {
        self.tx.send(event)
    }
}
