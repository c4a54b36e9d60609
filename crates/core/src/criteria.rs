//! Search criteria: the raw query-string bag and its parsed form.
//!
//! Parsing is deliberately forgiving. Blank values mean "no constraint" and a
//! value that does not parse as the expected number is dropped, so a typo in
//! one field never fails the whole search.

use serde::Deserialize;

use crate::pagination::PageRequest;

/// Query parameters exactly as they arrive on `GET /listings`.
///
/// Every field is kept as a string so that malformed numbers reach
/// [`ListingCriteria::from_raw`] instead of being rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListingQuery {
    pub keyword: Option<String>,
    pub city: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub min_height: Option<String>,
    pub max_height: Option<String>,
    pub min_weight: Option<String>,
    pub max_weight: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_rating: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub nationality: Option<String>,
    pub body_type: Option<String>,
    pub bust_size: Option<String>,
    pub service: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl RawListingQuery {
    pub fn criteria(&self) -> ListingCriteria {
        ListingCriteria::from_raw(self)
    }

    /// Page request with malformed `page`/`limit` falling back to defaults.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(number(&self.page), number(&self.limit))
    }
}

/// Parsed search predicates. `None` means the predicate is inactive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingCriteria {
    /// Case-insensitive substring of name, description, or any service tag.
    pub keyword: Option<String>,
    pub city: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_height: Option<i32>,
    pub max_height: Option<i32>,
    pub min_weight: Option<i32>,
    pub max_weight: Option<i32>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub min_rating: Option<f64>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub nationality: Option<String>,
    pub body_type: Option<String>,
    pub bust_size: Option<String>,
    /// Case-insensitive substring of at least one service tag.
    pub service: Option<String>,
}

impl ListingCriteria {
    pub fn from_raw(raw: &RawListingQuery) -> Self {
        Self {
            keyword: text(&raw.keyword),
            city: text(&raw.city),
            min_age: number(&raw.min_age),
            max_age: number(&raw.max_age),
            min_height: number(&raw.min_height),
            max_height: number(&raw.max_height),
            min_weight: number(&raw.min_weight),
            max_weight: number(&raw.max_weight),
            min_price: number(&raw.min_price),
            max_price: number(&raw.max_price),
            min_rating: decimal(&raw.min_rating),
            eye_color: text(&raw.eye_color),
            hair_color: text(&raw.hair_color),
            nationality: text(&raw.nationality),
            body_type: text(&raw.body_type),
            bust_size: text(&raw.bust_size),
            service: text(&raw.service),
        }
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn number<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    text(value)?.parse().ok()
}

fn decimal(value: &Option<String>) -> Option<f64> {
    number::<f64>(value).filter(|v| v.is_finite())
}
