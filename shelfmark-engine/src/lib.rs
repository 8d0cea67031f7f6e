//! # Shelfmark Engine
//!
//! Core rating and identity-resolution engine: maps rendered catalog
//! containers to stable entity identities, stores and toggles two-tier
//! ratings with a good-item → good-author cascade, resolves author
//! identities lazily over the network, and converges every rendered
//! instance of an entity to one visual state.
//!
//! The rendering layer, the persistent key-value store and the
//! network-fetch proxy are external collaborators; their seams are
//! [`view::CatalogView`], [`store::RatingStore`] and [`fetch::FetchProxy`].

pub mod engine;
pub mod fetch;
pub mod legacy;
pub mod resolver;
pub mod store;
pub mod sync;
pub mod template;
pub mod view;

pub use engine::{EngineEvent, RatingEngine};
pub use resolver::{AuthorResolver, Resolved};
pub use view::{CatalogView, Emphasis, InstanceId};
