//! Listing entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use velvet_core::listing::{normalize_services, ListingAttrs, ModerationStatus};
use velvet_core::types::{DbId, Timestamp};

use super::media::ListingMedia;
use super::validation;

/// A row from the `listings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub age: i32,
    pub city: String,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub bust_size: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub nationality: Option<String>,
    pub body_type: Option<String>,
    pub clothing_size: Option<String>,
    pub description: Option<String>,
    pub price: i32,
    pub services: Vec<String>,
    pub phone: Option<String>,
    pub rating: f64,
    pub review_count: i32,
    pub views: i64,
    /// `pending`, `approved` or `rejected`.
    pub status: String,
    pub payment_plan: String,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Listing {
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved.as_str()
    }
}

impl ListingAttrs for Listing {
    fn id(&self) -> DbId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn age(&self) -> i32 {
        self.age
    }
    fn city(&self) -> &str {
        &self.city
    }
    fn height(&self) -> Option<i32> {
        self.height
    }
    fn weight(&self) -> Option<i32> {
        self.weight
    }
    fn bust_size(&self) -> Option<&str> {
        self.bust_size.as_deref()
    }
    fn eye_color(&self) -> Option<&str> {
        self.eye_color.as_deref()
    }
    fn hair_color(&self) -> Option<&str> {
        self.hair_color.as_deref()
    }
    fn nationality(&self) -> Option<&str> {
        self.nationality.as_deref()
    }
    fn body_type(&self) -> Option<&str> {
        self.body_type.as_deref()
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn price(&self) -> i32 {
        self.price
    }
    fn services(&self) -> &[String] {
        &self.services
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// A listing enriched with its media, ordered by position.
#[derive(Debug, Clone, Serialize)]
pub struct ListingWithMedia {
    #[serde(flatten)]
    pub listing: Listing,
    pub media: Vec<ListingMedia>,
}

/// Request body for `POST /listings`.
///
/// Call [`CreateListing::normalize`] before validating so trimmed and
/// deduplicated values are the ones checked and stored.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListing {
    #[validate(
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"),
        custom(function = validation::listing_name)
    )]
    pub name: String,
    #[validate(range(min = 18, max = 100, message = "Age must be between 18 and 100"))]
    pub age: i32,
    #[validate(custom(function = validation::city))]
    pub city: String,
    #[validate(range(min = 140, max = 220, message = "Height must be between 140 and 220 cm"))]
    pub height: Option<i32>,
    #[validate(range(min = 40, max = 150, message = "Weight must be between 40 and 150 kg"))]
    pub weight: Option<i32>,
    #[validate(length(max = 20))]
    pub bust_size: Option<String>,
    #[validate(length(max = 50))]
    pub eye_color: Option<String>,
    #[validate(length(max = 50))]
    pub hair_color: Option<String>,
    #[validate(length(max = 50))]
    pub nationality: Option<String>,
    #[validate(length(max = 50))]
    pub body_type: Option<String>,
    #[validate(length(max = 20))]
    pub clothing_size: Option<String>,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: Option<String>,
    #[validate(range(
        min = 1000,
        max = 1000000,
        message = "Price must be between 1000 and 1000000"
    ))]
    pub price: i32,
    #[validate(custom(function = validation::services))]
    pub services: Vec<String>,
    #[validate(custom(function = validation::phone))]
    pub phone: Option<String>,
}

impl CreateListing {
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.city = self.city.trim().to_string();
        self.description = trim_opt(self.description.take());
        self.phone = trim_opt(self.phone.take());
        self.services = normalize_services(std::mem::take(&mut self.services));
    }
}

/// Request body for `PUT /listings/{id}`.
///
/// Only non-`None` attribute fields are applied. `version` is the value the
/// client last read; the update is rejected if the row has moved on.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListing {
    pub version: i32,
    #[validate(
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"),
        custom(function = validation::listing_name)
    )]
    pub name: Option<String>,
    #[validate(range(min = 18, max = 100, message = "Age must be between 18 and 100"))]
    pub age: Option<i32>,
    #[validate(custom(function = validation::city))]
    pub city: Option<String>,
    #[validate(range(min = 140, max = 220, message = "Height must be between 140 and 220 cm"))]
    pub height: Option<i32>,
    #[validate(range(min = 40, max = 150, message = "Weight must be between 40 and 150 kg"))]
    pub weight: Option<i32>,
    #[validate(length(max = 20))]
    pub bust_size: Option<String>,
    #[validate(length(max = 50))]
    pub eye_color: Option<String>,
    #[validate(length(max = 50))]
    pub hair_color: Option<String>,
    #[validate(length(max = 50))]
    pub nationality: Option<String>,
    #[validate(length(max = 50))]
    pub body_type: Option<String>,
    #[validate(length(max = 20))]
    pub clothing_size: Option<String>,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: Option<String>,
    #[validate(range(
        min = 1000,
        max = 1000000,
        message = "Price must be between 1000 and 1000000"
    ))]
    pub price: Option<i32>,
    #[validate(custom(function = validation::services))]
    pub services: Option<Vec<String>>,
    #[validate(custom(function = validation::phone))]
    pub phone: Option<String>,
}

impl UpdateListing {
    pub fn normalize(&mut self) {
        self.name = trim_opt(self.name.take());
        self.city = trim_opt(self.city.take());
        self.description = trim_opt(self.description.take());
        self.phone = trim_opt(self.phone.take());
        self.services = self.services.take().map(normalize_services);
    }
}

/// Request body for `PUT /listings/{id}/plan`.
#[derive(Debug, Deserialize)]
pub struct SelectPlan {
    pub plan: String,
}

/// Request body for `PUT /admin/listings/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatus {
    /// Parsed with [`ModerationStatus::from_str`](std::str::FromStr).
    pub status: String,
}

/// Blank strings collapse to `None`.
fn trim_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
