//! Rating propagation engine
//!
//! Owns the single-threaded event loop that serializes every mutation.
//! Rendering-layer signals and user interactions enter through the engine
//! channel; spawned resolution work re-enters the loop as completion
//! events. Per-entity store mutations therefore apply in the order the
//! triggering actions were issued, and UI synchronization always runs
//! strictly after the store acknowledgment, never optimistically before.

use crate::legacy::LegacyAuthorList;
use crate::resolver::{AuthorResolver, Resolved};
use crate::store::RatingStore;
use crate::sync;
use crate::template::{date_link, render_template, ItemInfo, DEFAULT_DATE_LINK_URL, DEFAULT_TEMPLATE};
use crate::view::{CatalogView, InstanceId, ResolveHint};
use chrono::Utc;
use shelfmark_common::events::{EventBus, ShelfmarkEvent};
use shelfmark_common::text::normalize;
use shelfmark_common::{Error, Rating, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Notice surfaced when the store handle has been invalidated
const STORE_UNAVAILABLE_NOTICE: &str =
    "Ratings are temporarily unavailable. Reload the page to reconnect.";

/// Events processed by the engine loop.
///
/// The first five arrive from the rendering layer; the last two are
/// completions of resolution work the engine spawned itself.
#[derive(Debug)]
pub enum EngineEvent {
    /// The rendering layer surfaced a new entity container
    ContainerAdded { instance: InstanceId, asin: String },

    /// The user clicked an item rating marker
    ItemMarkClicked { asin: String, rating: Rating },

    /// The user clicked an author rating marker
    AuthorMarkClicked { display_name: String, rating: Rating },

    /// Pointer entered an entity's title region (hover intent)
    HoverStarted { instance: InstanceId, asin: String },

    /// Pointer left the hover target
    HoverEnded { instance: InstanceId, asin: String },

    /// A debounced hover resolution completed
    HoverResolved {
        instance: InstanceId,
        asin: String,
        outcome: Result<Resolved>,
    },

    /// A cascade-triggered resolution completed
    CascadeResolved {
        asin: String,
        outcome: Result<Resolved>,
    },
}

/// Engine tying the store, resolver, legacy list and rendering layer
/// together behind one event loop
pub struct RatingEngine {
    store: RatingStore,
    view: Arc<dyn CatalogView>,
    resolver: Arc<AuthorResolver>,
    legacy: LegacyAuthorList,
    bus: EventBus,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl RatingEngine {
    /// Create the engine and the receiving end of its event channel
    pub fn new(
        pool: SqlitePool,
        view: Arc<dyn CatalogView>,
        resolver: Arc<AuthorResolver>,
        legacy: LegacyAuthorList,
        bus: EventBus,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            store: RatingStore::new(pool),
            view,
            resolver,
            legacy,
            bus,
            tx,
        });
        (engine, rx)
    }

    /// Sender the rendering layer uses to feed signals into the loop
    pub fn sender(&self) -> mpsc::UnboundedSender<EngineEvent> {
        self.tx.clone()
    }

    /// Store handle, shared with external read paths
    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    /// Run the event loop until every sender is dropped
    pub async fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<EngineEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
        }
    }

    /// Process one event to completion
    pub async fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::ContainerAdded { instance, asin } => {
                self.container_added(instance, &asin).await
            }
            EngineEvent::ItemMarkClicked { asin, rating } => {
                self.item_toggled(&asin, rating).await
            }
            EngineEvent::AuthorMarkClicked {
                display_name,
                rating,
            } => self.author_toggled(&display_name, rating).await,
            EngineEvent::HoverStarted { instance, asin } => self.hover_started(instance, &asin),
            EngineEvent::HoverEnded { instance, asin } => self.hover_ended(instance, &asin),
            EngineEvent::HoverResolved {
                instance,
                asin,
                outcome,
            } => self.hover_resolved(instance, &asin, outcome).await,
            EngineEvent::CascadeResolved { asin, outcome } => {
                self.cascade_resolved(&asin, outcome).await
            }
        }
    }

    /// Paint a freshly-surfaced container from stored state
    async fn container_added(&self, instance: InstanceId, asin: &str) {
        let (rating, saved_author) = match self.store.initial_state(asin).await {
            Ok(state) => state,
            Err(e) => return self.store_failed("load initial state", e),
        };

        if rating.is_some() {
            sync::apply_item_rating(self.view.as_ref(), asin, rating);
        }

        // A label the rendering layer already shows IS the author identity;
        // otherwise a persisted association restores the label from a
        // previous session.
        if let Some(label) = self.view.find_label_region(instance) {
            self.paint_author_label(instance, &label).await;
        } else if let Some(name) = saved_author {
            self.resolver.prime(asin, &name);
            self.view.insert_author_label(instance, &name);
            self.paint_author_label(instance, &name).await;
        }
    }

    /// Paint one rendered author label from its stored rating, falling
    /// back to the legacy list when no explicit rating exists
    async fn paint_author_label(&self, instance: InstanceId, display_name: &str) {
        let normalized = normalize(display_name);
        let rating = match self.store.author_rating(&normalized).await {
            Ok(rating) => rating,
            Err(e) => return self.store_failed("load author rating", e),
        };
        let effective = rating.or_else(|| self.legacy.lookup(display_name));
        if effective.is_some() {
            self.view.set_author_marker(instance, effective);
            sync::recompute_emphasis(self.view.as_ref(), instance);
        }
    }

    /// Toggle an item rating: the active rating clears, anything else
    /// overwrites
    async fn item_toggled(&self, asin: &str, rating: Rating) {
        let current = match self.store.item_rating(asin).await {
            Ok(r) => r,
            Err(e) => return self.store_failed("load item rating", e),
        };

        if current == Some(rating) {
            if let Err(e) = self.store.clear_item_rating(asin).await {
                return self.store_failed("clear item rating", e);
            }
            sync::apply_item_rating(self.view.as_ref(), asin, None);
            self.emit(ShelfmarkEvent::ItemRatingChanged {
                asin: asin.to_string(),
                rating: None,
                timestamp: Utc::now(),
            });
            return;
        }

        if let Err(e) = self.store.set_item_rating(asin, rating).await {
            return self.store_failed("set item rating", e);
        }
        sync::apply_item_rating(self.view.as_ref(), asin, Some(rating));
        self.emit(ShelfmarkEvent::ItemRatingChanged {
            asin: asin.to_string(),
            rating: Some(rating),
            timestamp: Utc::now(),
        });

        // A transition into good promotes the item's author as well
        if rating == Rating::Good {
            self.cascade_author_good(asin).await;
        }
    }

    /// Resolve the author of a freshly good-rated item and promote it
    async fn cascade_author_good(&self, asin: &str) {
        // Prefer an author the rendering layer already shows
        let visible = self
            .view
            .instances_of(asin)
            .into_iter()
            .find_map(|instance| self.view.find_label_region(instance));

        if let Some(name) = visible {
            self.promote_author_good(&name).await;
            // Keep the cache and the persisted association consistent
            // with the on-screen identity
            if self.resolver.cached(asin).is_none() {
                self.resolver.prime(asin, &name);
                if let Err(e) = self.store.set_cached_author(asin, &name).await {
                    self.store_failed("persist author association", e);
                }
            }
            return;
        }

        // Not visible: resolve asynchronously; the promotion finishes in
        // the loop when the completion event arrives
        let Some(url) = self.detail_url_for(asin) else {
            debug!(asin, "No detail URL available for cascade resolution");
            return;
        };
        let resolver = Arc::clone(&self.resolver);
        let tx = self.tx.clone();
        let asin = asin.to_string();
        tokio::spawn(async move {
            let outcome = resolver.resolve(&asin, &url).await;
            let _ = tx.send(EngineEvent::CascadeResolved { asin, outcome });
        });
    }

    fn detail_url_for(&self, asin: &str) -> Option<String> {
        self.view
            .instances_of(asin)
            .into_iter()
            .find_map(|instance| self.view.detail_url(instance))
    }

    /// Promote an author to good unless it already is (no redundant write)
    async fn promote_author_good(&self, display_name: &str) {
        let normalized = normalize(display_name);
        let current = match self.store.author_rating(&normalized).await {
            Ok(r) => r,
            Err(e) => return self.store_failed("load author rating", e),
        };
        if current == Some(Rating::Good) {
            return;
        }
        if let Err(e) = self.store.set_author_rating(&normalized, Rating::Good).await {
            return self.store_failed("promote author rating", e);
        }
        sync::apply_author_rating(self.view.as_ref(), &normalized, Some(Rating::Good));
        self.emit(ShelfmarkEvent::AuthorRatingChanged {
            author: normalized,
            rating: Some(Rating::Good),
            timestamp: Utc::now(),
        });
    }

    /// Toggle an author rating on the normalized name
    async fn author_toggled(&self, display_name: &str, rating: Rating) {
        let normalized = normalize(display_name);
        let current = match self.store.author_rating(&normalized).await {
            Ok(r) => r,
            Err(e) => return self.store_failed("load author rating", e),
        };

        if current == Some(rating) {
            if let Err(e) = self.store.clear_author_rating(&normalized).await {
                return self.store_failed("clear author rating", e);
            }
            // Pre-upgrade intent survives: paint the deprecated-list
            // rating instead of unset, without writing it back
            let fallback = self.legacy.lookup(display_name);
            sync::apply_author_rating(self.view.as_ref(), &normalized, fallback);
            self.emit(ShelfmarkEvent::AuthorRatingChanged {
                author: normalized,
                rating: None,
                timestamp: Utc::now(),
            });
        } else {
            if let Err(e) = self.store.set_author_rating(&normalized, rating).await {
                return self.store_failed("set author rating", e);
            }
            sync::apply_author_rating(self.view.as_ref(), &normalized, Some(rating));
            self.emit(ShelfmarkEvent::AuthorRatingChanged {
                author: normalized,
                rating: Some(rating),
                timestamp: Utc::now(),
            });
        }
    }

    /// Hover intent: arm the debounced resolution
    fn hover_started(&self, instance: InstanceId, asin: &str) {
        let Some(token) = self.resolver.arm_hover(asin) else {
            // Cached (name or no-info): nothing to fetch, nothing to show
            return;
        };
        let Some(url) = self.view.detail_url(instance) else {
            self.resolver.cancel_hover(asin);
            return;
        };

        let resolver = Arc::clone(&self.resolver);
        let view = Arc::clone(&self.view);
        let tx = self.tx.clone();
        let asin = asin.to_string();
        let debounce = resolver.debounce();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    // A concurrent path may have satisfied the entity
                    // while the timer ran
                    if resolver.cached(&asin).is_some() {
                        return;
                    }
                    view.show_hint(instance, ResolveHint::Fetching);
                    let outcome = resolver.resolve(&asin, &url).await;
                    let _ = tx.send(EngineEvent::HoverResolved {
                        instance,
                        asin,
                        outcome,
                    });
                }
            }
        });
    }

    /// Pointer left: clear the hint and cancel any pending timer
    fn hover_ended(&self, instance: InstanceId, asin: &str) {
        self.view.clear_hint(instance);
        self.resolver.cancel_hover(asin);
    }

    async fn hover_resolved(&self, instance: InstanceId, asin: &str, outcome: Result<Resolved>) {
        match outcome {
            Ok(Resolved::Name(name)) => {
                self.view.clear_hint(instance);
                self.finish_resolution(asin, &name).await;
            }
            Ok(Resolved::NoInfo) => {
                // Cached negative result; suppresses further attempts
                self.view.clear_hint(instance);
            }
            Err(e) => {
                warn!(asin, error = %e, "Author resolution failed");
                // Swap the in-flight hint for an error hint; if the user
                // already left, there is nothing to show
                if self.view.hint(instance) == Some(ResolveHint::Fetching) {
                    self.view.show_hint(instance, ResolveHint::Error);
                }
                self.emit(ShelfmarkEvent::AuthorResolutionFailed {
                    asin: asin.to_string(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    async fn cascade_resolved(&self, asin: &str, outcome: Result<Resolved>) {
        match outcome {
            Ok(Resolved::Name(name)) => {
                self.promote_author_good(&name).await;
                self.finish_resolution(asin, &name).await;
            }
            Ok(Resolved::NoInfo) => {
                debug!(asin, "No author information for cascade promotion");
            }
            Err(e) => {
                warn!(asin, error = %e, "Cascade author resolution failed");
                self.emit(ShelfmarkEvent::AuthorResolutionFailed {
                    asin: asin.to_string(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Persist and display a freshly-resolved author name
    async fn finish_resolution(&self, asin: &str, name: &str) {
        if let Err(e) = self.store.set_cached_author(asin, name).await {
            self.store_failed("persist author association", e);
        }

        // Insert the rendered name wherever the entity lacks a label
        for instance in self.view.instances_of(asin) {
            if self.view.find_label_region(instance).is_none() {
                self.view.insert_author_label(instance, name);
                self.paint_author_label(instance, name).await;
            }
        }

        self.emit(ShelfmarkEvent::AuthorResolved {
            asin: asin.to_string(),
            author: normalize(name),
            timestamp: Utc::now(),
        });
    }

    /// Render the output template for an item using the configured format
    pub async fn render_item_info(&self, info: ItemInfo) -> Result<String> {
        let template = self
            .store
            .setting("format_template")
            .await?
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        Ok(render_template(&template, &info.sanitized()))
    }

    /// Calendar link for an item's release date using the configured base
    /// URL; None when the date is not recognizable
    pub async fn calendar_link(&self, date: &str) -> Result<Option<String>> {
        let base = self
            .store
            .setting("date_link_url")
            .await?
            .unwrap_or_else(|| DEFAULT_DATE_LINK_URL.to_string());
        Ok(date_link(&base, date))
    }

    fn emit(&self, event: ShelfmarkEvent) {
        // Nobody listening is fine; painting never depends on the bus
        let _ = self.bus.emit(event);
    }

    /// Store failure policy: an invalidated handle is surfaced to the
    /// user, anything else is logged and the operation becomes a no-op
    fn store_failed(&self, operation: &str, err: Error) {
        match err {
            Error::StoreUnavailable => {
                error!(operation, "Persistent store unavailable");
                self.view.notify(STORE_UNAVAILABLE_NOTICE);
                self.emit(ShelfmarkEvent::StoreUnavailable {
                    timestamp: Utc::now(),
                });
            }
            other => warn!(operation, error = %other, "Store operation failed"),
        }
    }
}
