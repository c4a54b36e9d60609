//! Listing constants, moderation/payment vocabularies, and field validation.
//!
//! The bounds here mirror the `CHECK` constraints on the `listings` table and
//! the request validators in the API layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Field bounds
-------------------------------------------------------------------------- */

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 100;

/// Height in centimetres.
pub const MIN_HEIGHT: i32 = 140;
pub const MAX_HEIGHT: i32 = 220;

/// Weight in kilograms.
pub const MIN_WEIGHT: i32 = 40;
pub const MAX_WEIGHT: i32 = 150;

/// Hourly price.
pub const MIN_PRICE: i32 = 1_000;
pub const MAX_PRICE: i32 = 1_000_000;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;

pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;

/// Maximum number of service tags on one listing.
pub const MAX_SERVICES: usize = 39;

/// Maximum length of a single service tag.
pub const MAX_SERVICE_LENGTH: usize = 100;

/// City codes a listing may be published in.
pub const VALID_CITIES: &[&str] = &[
    "moscow",
    "spb",
    "krasnodar",
    "sochi",
    "ekaterinburg",
    "kazan",
];

/* --------------------------------------------------------------------------
Moderation
-------------------------------------------------------------------------- */

/// Moderation state gating public visibility of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid moderation status '{other}'. Must be one of: pending, approved, rejected"
            ))),
        }
    }
}

/* --------------------------------------------------------------------------
Payment tiers (mock; selecting one never moves money)
-------------------------------------------------------------------------- */

/// Plan of a listing that never selected a tier. Not selectable.
pub const PLAN_NONE: &str = "none";

pub const PLAN_BASIC: &str = "basic";
pub const PLAN_PREMIUM: &str = "premium";
pub const PLAN_VIP: &str = "vip";

pub const VALID_PAYMENT_PLANS: &[&str] = &[PLAN_BASIC, PLAN_PREMIUM, PLAN_VIP];

pub fn validate_payment_plan(plan: &str) -> Result<(), CoreError> {
    if VALID_PAYMENT_PLANS.contains(&plan) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid payment plan '{plan}'. Must be one of: {}",
            VALID_PAYMENT_PLANS.join(", ")
        )))
    }
}

/* --------------------------------------------------------------------------
Media
-------------------------------------------------------------------------- */

pub const MEDIA_KIND_IMAGE: &str = "image";
pub const MEDIA_KIND_VIDEO: &str = "video";

pub const VALID_MEDIA_KINDS: &[&str] = &[MEDIA_KIND_IMAGE, MEDIA_KIND_VIDEO];

pub fn validate_media_kind(kind: &str) -> Result<(), CoreError> {
    if VALID_MEDIA_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid media kind '{kind}'. Must be one of: {}",
            VALID_MEDIA_KINDS.join(", ")
        )))
    }
}

/* --------------------------------------------------------------------------
Services and city
-------------------------------------------------------------------------- */

/// Trim service tags, drop blanks, and remove duplicates keeping the first
/// occurrence of each tag. Tags that differ only in case are duplicates,
/// since service filtering ignores case.
pub fn normalize_services(services: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(services.len());
    let mut out: Vec<String> = Vec::with_capacity(services.len());
    for service in services {
        let trimmed = service.trim();
        let key = trimmed.to_lowercase();
        if trimmed.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

/// Merge service tags from many listings into one sorted, case-insensitively
/// distinct list. Among spellings of one tag the lexically smallest wins.
pub fn distinct_service_tags<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags: Vec<&str> = tags.into_iter().collect();
    tags.sort_by_cached_key(|t| (t.to_lowercase(), t.to_string()));
    tags.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
    tags.into_iter().map(str::to_string).collect()
}

/// Check a (normalized) service list: 1..=39 tags, each 1..=100 characters.
pub fn validate_services(services: &[String]) -> Result<(), CoreError> {
    if services.is_empty() || services.len() > MAX_SERVICES {
        return Err(CoreError::Validation(format!(
            "Services must contain between 1 and {MAX_SERVICES} items"
        )));
    }
    if let Some(bad) = services
        .iter()
        .find(|s| s.is_empty() || s.chars().count() > MAX_SERVICE_LENGTH)
    {
        return Err(CoreError::Validation(format!(
            "Invalid service '{bad}'. Each service must be 1 to {MAX_SERVICE_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_city(city: &str) -> Result<(), CoreError> {
    if VALID_CITIES.contains(&city) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Invalid city '{city}'")))
    }
}

/* --------------------------------------------------------------------------
Filterable view of a listing
-------------------------------------------------------------------------- */

/// Read-only accessors the filter and ranking functions need.
///
/// Implemented by the in-memory catalog listing and by the database row so
/// both can be run through the same predicates.
pub trait ListingAttrs {
    fn id(&self) -> DbId;
    fn name(&self) -> &str;
    fn age(&self) -> i32;
    fn city(&self) -> &str;
    fn height(&self) -> Option<i32>;
    fn weight(&self) -> Option<i32>;
    fn bust_size(&self) -> Option<&str>;
    fn eye_color(&self) -> Option<&str>;
    fn hair_color(&self) -> Option<&str>;
    fn nationality(&self) -> Option<&str>;
    fn body_type(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn price(&self) -> i32;
    fn services(&self) -> &[String];
    fn rating(&self) -> f64;
    fn created_at(&self) -> Timestamp;
}

impl<T: ListingAttrs + ?Sized> ListingAttrs for &T {
    fn id(&self) -> DbId {
        (**self).id()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
    fn age(&self) -> i32 {
        (**self).age()
    }
    fn city(&self) -> &str {
        (**self).city()
    }
    fn height(&self) -> Option<i32> {
        (**self).height()
    }
    fn weight(&self) -> Option<i32> {
        (**self).weight()
    }
    fn bust_size(&self) -> Option<&str> {
        (**self).bust_size()
    }
    fn eye_color(&self) -> Option<&str> {
        (**self).eye_color()
    }
    fn hair_color(&self) -> Option<&str> {
        (**self).hair_color()
    }
    fn nationality(&self) -> Option<&str> {
        (**self).nationality()
    }
    fn body_type(&self) -> Option<&str> {
        (**self).body_type()
    }
    fn description(&self) -> Option<&str> {
        (**self).description()
    }
    fn price(&self) -> i32 {
        (**self).price()
    }
    fn services(&self) -> &[String] {
        (**self).services()
    }
    fn rating(&self) -> f64 {
        (**self).rating()
    }
    fn created_at(&self) -> Timestamp {
        (**self).created_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_services_dedups_and_trims() {
        let input = vec![
            " massage ".to_string(),
            "dinner".to_string(),
            "massage".to_string(),
            "   ".to_string(),
            "Dinner".to_string(),
        ];
        assert_eq!(
            normalize_services(input),
            vec!["massage".to_string(), "dinner".to_string()]
        );
    }

    #[test]
    fn normalize_services_ignores_case_beyond_ascii() {
        let input = vec!["Массаж".to_string(), "массаж".to_string(), "SPA".to_string()];
        assert_eq!(
            normalize_services(input),
            vec!["Массаж".to_string(), "SPA".to_string()]
        );
    }

    #[test]
    fn distinct_service_tags_sorts_and_folds_case() {
        let tags = ["massage", "Dinner", "Massage", "aromatherapy", "dinner"];
        assert_eq!(
            distinct_service_tags(tags),
            vec!["aromatherapy", "Dinner", "Massage"]
        );
    }

    #[test]
    fn empty_services_rejected() {
        assert!(validate_services(&[]).is_err());
    }

    #[test]
    fn overlong_service_rejected() {
        let long = "x".repeat(MAX_SERVICE_LENGTH + 1);
        assert!(validate_services(&[long]).is_err());
        assert!(validate_services(&["ok".to_string()]).is_ok());
    }

    #[test]
    fn too_many_services_rejected() {
        let services: Vec<String> = (0..=MAX_SERVICES).map(|i| format!("s{i}")).collect();
        assert!(validate_services(&services).is_err());
    }

    #[test]
    fn moderation_status_round_trips_through_str() {
        for status in [
            ModerationStatus::Pending,
            ModerationStatus::Approved,
            ModerationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ModerationStatus>().unwrap(), status);
        }
        assert!("published".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn plan_and_media_vocabularies() {
        assert!(validate_payment_plan("vip").is_ok());
        assert!(validate_payment_plan("gold").is_err());
        assert!(validate_media_kind("video").is_ok());
        assert!(validate_media_kind("audio").is_err());
        assert!(validate_city("kazan").is_ok());
        assert!(validate_city("paris").is_err());
    }
}
