//! Listing predicates and ranked ordering.
//!
//! Pure functions over anything implementing [`ListingAttrs`]. Filtering
//! never reorders and never mutates; ranking is a separate explicit step.

use std::cmp::Ordering;

use crate::criteria::ListingCriteria;
use crate::listing::ListingAttrs;

/// Whether `listing` satisfies every active predicate in `criteria`.
pub fn matches<L: ListingAttrs + ?Sized>(listing: &L, criteria: &ListingCriteria) -> bool {
    if let Some(keyword) = criteria.keyword.as_deref() {
        let needle = keyword.to_lowercase();
        let hit = contains_ci(listing.name(), &needle)
            || listing
                .description()
                .is_some_and(|d| contains_ci(d, &needle))
            || listing.services().iter().any(|s| contains_ci(s, &needle));
        if !hit {
            return false;
        }
    }

    if let Some(service) = criteria.service.as_deref() {
        let needle = service.to_lowercase();
        if !listing.services().iter().any(|s| contains_ci(s, &needle)) {
            return false;
        }
    }

    if !eq_ci(Some(listing.city()), criteria.city.as_deref())
        || !eq_ci(listing.eye_color(), criteria.eye_color.as_deref())
        || !eq_ci(listing.hair_color(), criteria.hair_color.as_deref())
        || !eq_ci(listing.nationality(), criteria.nationality.as_deref())
        || !eq_ci(listing.body_type(), criteria.body_type.as_deref())
        || !eq_ci(listing.bust_size(), criteria.bust_size.as_deref())
    {
        return false;
    }

    in_range(Some(listing.age()), criteria.min_age, criteria.max_age)
        && in_range(listing.height(), criteria.min_height, criteria.max_height)
        && in_range(listing.weight(), criteria.min_weight, criteria.max_weight)
        && in_range(Some(listing.price()), criteria.min_price, criteria.max_price)
        && in_range(Some(listing.rating()), criteria.min_rating, None)
}

/// Keep the listings matching `criteria`, preserving input order.
pub fn filter_listings<'a, L: ListingAttrs>(
    listings: &'a [L],
    criteria: &ListingCriteria,
) -> Vec<&'a L> {
    listings.iter().filter(|l| matches(*l, criteria)).collect()
}

/// Ranked order: rating descending, then newest first, then highest id.
pub fn rank_cmp<L: ListingAttrs + ?Sized>(a: &L, b: &L) -> Ordering {
    b.rating()
        .total_cmp(&a.rating())
        .then_with(|| b.created_at().cmp(&a.created_at()))
        .then_with(|| b.id().cmp(&a.id()))
}

/// Sort in place into ranked order.
pub fn sort_ranked<L: ListingAttrs>(listings: &mut [L]) {
    listings.sort_by(|a, b| rank_cmp(a, b));
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Inactive predicate (`wanted == None`) always passes; an active one needs
/// the attribute to be present and equal ignoring case.
fn eq_ci(actual: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual.is_some_and(|a| a.to_lowercase() == wanted.to_lowercase()),
    }
}

/// Inclusive range check. With at least one bound active, a missing value fails.
fn in_range<T: PartialOrd>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}
