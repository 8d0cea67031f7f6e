//! Rendering-layer collaborator interface
//!
//! The rendering layer owns the actual presentation and surfaces catalog
//! entity containers to the engine. It is specified here purely at its
//! interface: the engine discovers instances, reads label regions, and
//! converges marker and emphasis state through this trait, while the
//! rendering layer feeds container and interaction events into the
//! engine's channel.

use shelfmark_common::Rating;

/// Opaque handle for one rendered entity container.
///
/// Handles are issued by the rendering layer and are only stable for the
/// lifetime of the underlying element; identity across re-renders is by
/// entity, never by handle.
pub type InstanceId = u64;

/// One rendered author label with its current display text
#[derive(Debug, Clone)]
pub struct AuthorLabel {
    /// Container instance the label belongs to
    pub instance: InstanceId,
    /// Raw display text, not normalized
    pub text: String,
}

/// Transient hint shown while a resolution is in flight or has failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveHint {
    Fetching,
    Error,
}

/// Derived per-instance visual class, distinct from the stored rating.
///
/// Exactly one applies to an instance at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    #[default]
    None,
    /// Item explicitly rated good
    GoodItem,
    /// Item rated bad, or unrated with a bad author
    BadItem,
    /// Item unrated, author rated good
    GoodAuthor,
}

/// Interface to the rendering layer
pub trait CatalogView: Send + Sync {
    /// Every currently-rendered instance of the item
    fn instances_of(&self, asin: &str) -> Vec<InstanceId>;

    /// Every currently-rendered author label, with its display text
    fn author_labels(&self) -> Vec<AuthorLabel>;

    /// Current item marker of an instance
    fn item_marker(&self, instance: InstanceId) -> Option<Rating>;

    /// Set or clear the item marker of an instance
    fn set_item_marker(&self, instance: InstanceId, rating: Option<Rating>);

    /// Current author marker shown within an instance
    fn author_marker(&self, instance: InstanceId) -> Option<Rating>;

    /// Set or clear the author marker shown within an instance
    fn set_author_marker(&self, instance: InstanceId, rating: Option<Rating>);

    /// Apply the derived emphasis class
    fn set_emphasis(&self, instance: InstanceId, emphasis: Emphasis);

    /// Display text of the instance's author label region, if it has one
    fn find_label_region(&self, instance: InstanceId) -> Option<String>;

    /// Insert an author label into an instance that lacks one
    fn insert_author_label(&self, instance: InstanceId, name: &str);

    /// URL of the entity's detail document, used for author resolution
    fn detail_url(&self, instance: InstanceId) -> Option<String>;

    /// Currently-shown resolution hint of an instance, if any
    fn hint(&self, instance: InstanceId) -> Option<ResolveHint>;

    /// Show a transient resolution hint on an instance
    fn show_hint(&self, instance: InstanceId, hint: ResolveHint);

    /// Clear any resolution hint from an instance
    fn clear_hint(&self, instance: InstanceId);

    /// Surface a user-visible notice (store unavailability)
    fn notify(&self, message: &str);
}
