//! Shared test fixtures: an in-memory catalog view, a scripted fetch
//! proxy and a harness wiring them into an engine over an in-memory store.
#![allow(dead_code)]

use async_trait::async_trait;
use shelfmark_common::db::create_store_table;
use shelfmark_common::events::{EventBus, ShelfmarkEvent};
use shelfmark_common::{Error, Rating, Result};
use shelfmark_engine::fetch::{DocumentQuery, FetchProxy};
use shelfmark_engine::legacy::LegacyAuthorList;
use shelfmark_engine::view::{AuthorLabel, CatalogView, Emphasis, InstanceId, ResolveHint};
use shelfmark_engine::{AuthorResolver, EngineEvent, RatingEngine};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

#[derive(Default)]
struct Card {
    asin: String,
    item_marker: Option<Rating>,
    author_label: Option<String>,
    author_marker: Option<Rating>,
    emphasis: Emphasis,
    hint: Option<ResolveHint>,
    detail_url: Option<String>,
}

/// In-memory stand-in for the rendering layer
#[derive(Default)]
pub struct MemoryView {
    cards: Mutex<BTreeMap<InstanceId, Card>>,
    next_id: Mutex<InstanceId>,
    notices: Mutex<Vec<String>>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a new entity container, optionally with a visible author
    /// label and a detail URL
    pub fn add_card(
        &self,
        asin: &str,
        author_label: Option<&str>,
        detail_url: Option<&str>,
    ) -> InstanceId {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = *next;
        self.cards.lock().unwrap().insert(
            id,
            Card {
                asin: asin.to_string(),
                author_label: author_label.map(str::to_string),
                detail_url: detail_url.map(str::to_string),
                ..Card::default()
            },
        );
        id
    }

    pub fn item_marker_of(&self, instance: InstanceId) -> Option<Rating> {
        self.cards.lock().unwrap()[&instance].item_marker
    }

    pub fn author_marker_of(&self, instance: InstanceId) -> Option<Rating> {
        self.cards.lock().unwrap()[&instance].author_marker
    }

    pub fn emphasis_of(&self, instance: InstanceId) -> Emphasis {
        self.cards.lock().unwrap()[&instance].emphasis
    }

    pub fn label_of(&self, instance: InstanceId) -> Option<String> {
        self.cards.lock().unwrap()[&instance].author_label.clone()
    }

    pub fn hint_of(&self, instance: InstanceId) -> Option<ResolveHint> {
        self.cards.lock().unwrap()[&instance].hint
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl CatalogView for MemoryView {
    fn instances_of(&self, asin: &str) -> Vec<InstanceId> {
        self.cards
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, card)| card.asin == asin)
            .map(|(id, _)| *id)
            .collect()
    }

    fn author_labels(&self) -> Vec<AuthorLabel> {
        self.cards
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(id, card)| {
                card.author_label.as_ref().map(|text| AuthorLabel {
                    instance: *id,
                    text: text.clone(),
                })
            })
            .collect()
    }

    fn item_marker(&self, instance: InstanceId) -> Option<Rating> {
        self.cards.lock().unwrap()[&instance].item_marker
    }

    fn set_item_marker(&self, instance: InstanceId, rating: Option<Rating>) {
        if let Some(card) = self.cards.lock().unwrap().get_mut(&instance) {
            card.item_marker = rating;
        }
    }

    fn author_marker(&self, instance: InstanceId) -> Option<Rating> {
        self.cards.lock().unwrap()[&instance].author_marker
    }

    fn set_author_marker(&self, instance: InstanceId, rating: Option<Rating>) {
        if let Some(card) = self.cards.lock().unwrap().get_mut(&instance) {
            card.author_marker = rating;
        }
    }

    fn set_emphasis(&self, instance: InstanceId, emphasis: Emphasis) {
        if let Some(card) = self.cards.lock().unwrap().get_mut(&instance) {
            card.emphasis = emphasis;
        }
    }

    fn find_label_region(&self, instance: InstanceId) -> Option<String> {
        self.cards.lock().unwrap()[&instance].author_label.clone()
    }

    fn insert_author_label(&self, instance: InstanceId, name: &str) {
        if let Some(card) = self.cards.lock().unwrap().get_mut(&instance) {
            if card.author_label.is_none() {
                card.author_label = Some(name.to_string());
            }
        }
    }

    fn detail_url(&self, instance: InstanceId) -> Option<String> {
        self.cards.lock().unwrap()[&instance].detail_url.clone()
    }

    fn hint(&self, instance: InstanceId) -> Option<ResolveHint> {
        self.cards.lock().unwrap()[&instance].hint
    }

    fn show_hint(&self, instance: InstanceId, hint: ResolveHint) {
        if let Some(card) = self.cards.lock().unwrap().get_mut(&instance) {
            card.hint = Some(hint);
        }
    }

    fn clear_hint(&self, instance: InstanceId) {
        if let Some(card) = self.cards.lock().unwrap().get_mut(&instance) {
            card.hint = None;
        }
    }

    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

/// Fetch proxy returning scripted responses per URL and counting calls
#[derive(Default)]
pub struct ScriptedFetch {
    responses: Mutex<HashMap<String, std::result::Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_string()));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(reason.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchProxy for ScriptedFetch {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(reason)) => Err(Error::Fetch(reason.clone())),
            None => Err(Error::Fetch(format!("no scripted response for {url}"))),
        }
    }
}

/// Document query stub: the author field is whatever follows "byline:"
pub struct BylineQuery;

impl DocumentQuery for BylineQuery {
    fn author_text(&self, document: &str) -> Option<String> {
        document
            .lines()
            .find_map(|line| line.strip_prefix("byline:").map(str::to_string))
    }
}

/// Engine plus every collaborator a test wants to observe
pub struct Harness {
    pub engine: Arc<RatingEngine>,
    pub rx: mpsc::UnboundedReceiver<EngineEvent>,
    pub view: Arc<MemoryView>,
    pub fetch: Arc<ScriptedFetch>,
    pub resolver: Arc<AuthorResolver>,
    pub bus_rx: broadcast::Receiver<ShelfmarkEvent>,
    pub pool: SqlitePool,
}

pub async fn harness() -> Harness {
    harness_with_legacy(LegacyAuthorList::default()).await
}

pub async fn harness_with_legacy(legacy: LegacyAuthorList) -> Harness {
    // These tests run under `#[tokio::test(start_paused = true)]`. The sqlx
    // pool establishes its connection on a dedicated worker thread in real
    // time, but under the paused clock the runtime auto-advances straight to
    // the pool's acquire timeout and reports `PoolTimedOut` before that thread
    // can respond. Briefly resume the real clock while the connection is
    // established (and the `:memory:` single connection is pinned so the
    // `store` table stays visible to every later query), then re-pause so the
    // tests' debounce-timing assertions still run against a frozen clock.
    // Under the paused clock any pool acquire that has to wait on the
    // connection's worker thread (establishment, the pre-acquire ping, or a
    // connection still being reset back into the pool) parks the runtime,
    // which then auto-advances the virtual clock straight to the acquire
    // timeout and fails with `PoolTimedOut`. Two things together avoid that:
    //   * a pool of several connections over a shared-cache in-memory
    //     database (all seeing the same `store` table), so a top-level query
    //     always finds an already-idle connection even while an earlier one
    //     is still returning, and
    //   * `test_before_acquire(false)`, so checking out an idle connection is
    //     a synchronous pop with no worker round-trip and never parks.
    // Establishment and warm-up happen while the clock is briefly resumed.
    static DB_SEQ: AtomicUsize = AtomicUsize::new(0);
    let db_url = format!(
        "file:shelfmark_test_{}?mode=memory&cache=shared",
        DB_SEQ.fetch_add(1, Ordering::Relaxed)
    );
    const POOL_SIZE: u32 = 6;

    tokio::time::resume();
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(POOL_SIZE)
        .min_connections(POOL_SIZE)
        .test_before_acquire(false)
        .connect(&db_url)
        .await
        .unwrap();
    create_store_table(&pool).await.unwrap();
    // Open every connection at once so the pool establishes them all, then
    // release and let their return/reset tasks finish, so all six sit idle
    // in the pool before the clock freezes.
    let mut warm = Vec::new();
    for _ in 0..POOL_SIZE {
        warm.push(pool.acquire().await.unwrap());
    }
    drop(warm);
    while pool.num_idle() < POOL_SIZE as usize {
        tokio::task::yield_now().await;
    }
    tokio::time::pause();

    let view = Arc::new(MemoryView::new());
    let fetch = Arc::new(ScriptedFetch::new());
    let resolver = Arc::new(AuthorResolver::new(fetch.clone(), Arc::new(BylineQuery)));
    let bus = EventBus::new(64);
    let bus_rx = bus.subscribe();

    let (engine, rx) = RatingEngine::new(pool.clone(), view.clone(), resolver.clone(), legacy, bus);

    Harness {
        engine,
        rx,
        view,
        fetch,
        resolver,
        bus_rx,
        pool,
    }
}
