//! Multi-instance UI synchronization
//!
//! The rendering layer may present the same item or author in any number
//! of simultaneously-visible containers. These passes converge every
//! rendered instance of an entity to the stored rating. Author instances
//! match by normalized label text, never by handle identity, since the
//! rendering layer offers no stable handle across repeated renders.

use crate::view::{CatalogView, Emphasis, InstanceId};
use shelfmark_common::text::normalize;
use shelfmark_common::Rating;

/// Converge every rendered instance of an item to `rating`
pub fn apply_item_rating(view: &dyn CatalogView, asin: &str, rating: Option<Rating>) {
    for instance in view.instances_of(asin) {
        view.set_item_marker(instance, rating);
        recompute_emphasis(view, instance);
    }
}

/// Converge every rendered author label whose normalized text equals
/// `normalized` to `rating`
pub fn apply_author_rating(view: &dyn CatalogView, normalized: &str, rating: Option<Rating>) {
    for label in view.author_labels() {
        if normalize(&label.text) == normalized {
            view.set_author_marker(label.instance, rating);
            recompute_emphasis(view, label.instance);
        }
    }
}

/// Recompute the derived emphasis of one instance from its current
/// markers. Idempotent; safe to invoke redundantly.
pub fn recompute_emphasis(view: &dyn CatalogView, instance: InstanceId) {
    let emphasis = emphasis_for(view.item_marker(instance), view.author_marker(instance));
    view.set_emphasis(instance, emphasis);
}

/// Emphasis precedence, high to low: item good, item bad, author bad
/// (greys out an unrated item), author good (highlights an unrated item)
pub fn emphasis_for(item: Option<Rating>, author: Option<Rating>) -> Emphasis {
    match (item, author) {
        (Some(Rating::Good), _) => Emphasis::GoodItem,
        (Some(Rating::Bad), _) => Emphasis::BadItem,
        (None, Some(Rating::Bad)) => Emphasis::BadItem,
        (None, Some(Rating::Good)) => Emphasis::GoodAuthor,
        (None, None) => Emphasis::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_rating_outranks_author_rating() {
        assert_eq!(
            emphasis_for(Some(Rating::Good), Some(Rating::Bad)),
            Emphasis::GoodItem
        );
        assert_eq!(
            emphasis_for(Some(Rating::Bad), Some(Rating::Good)),
            Emphasis::BadItem
        );
    }

    #[test]
    fn unrated_item_follows_its_author() {
        assert_eq!(emphasis_for(None, Some(Rating::Bad)), Emphasis::BadItem);
        assert_eq!(emphasis_for(None, Some(Rating::Good)), Emphasis::GoodAuthor);
    }

    #[test]
    fn nothing_rated_means_no_emphasis() {
        assert_eq!(emphasis_for(None, None), Emphasis::None);
    }
}
