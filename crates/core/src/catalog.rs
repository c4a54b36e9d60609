//! In-memory catalog of listings and reviews.
//!
//! [`Catalog`] is a plain value owned by its caller: every mutation goes
//! through a method, and persistence is an explicit [`Catalog::load`] /
//! [`Catalog::save`] against a [`KeyValueStore`].

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::criteria::ListingCriteria;
use crate::error::CoreError;
use crate::filter::{filter_listings, rank_cmp, sort_ranked};
use crate::listing::{
    distinct_service_tags, normalize_services, validate_city, validate_media_kind,
    validate_payment_plan, validate_services, ListingAttrs, ModerationStatus, MAX_AGE,
    MAX_DESCRIPTION_LENGTH, MAX_HEIGHT, MAX_NAME_LENGTH, MAX_PRICE, MAX_WEIGHT, MIN_AGE,
    MIN_DESCRIPTION_LENGTH, MIN_HEIGHT, MIN_NAME_LENGTH, MIN_PRICE, MIN_WEIGHT, PLAN_NONE,
};
use crate::pagination::{paginate, PageRequest, PaginationMeta};
use crate::rating::{validate_review_text, validate_score, RatingSummary};
use crate::storage::KeyValueStore;
use crate::types::{DbId, Timestamp};

/// Store key holding the serialized listing array.
pub const LISTINGS_KEY: &str = "velvet_listings";

/// Store key holding reviews grouped by listing id.
pub const REVIEWS_KEY: &str = "velvet_reviews";

/* --------------------------------------------------------------------------
Entities
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// `image` or `video`.
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: DbId,
    /// Identifier of the owning account.
    pub owner: String,
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
    pub media: Vec<MediaItem>,
    pub rating: f64,
    pub review_count: i32,
    pub views: i64,
    pub status: ModerationStatus,
    pub payment_plan: String,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Listing {
    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            rating: self.rating,
            review_count: self.review_count,
        }
    }

    fn apply(&mut self, draft: ListingDraft) {
        self.name = draft.name.trim().to_string();
        self.age = draft.age;
        self.city = draft.city;
        self.height = draft.height;
        self.weight = draft.weight;
        self.bust_size = draft.bust_size;
        self.eye_color = draft.eye_color;
        self.hair_color = draft.hair_color;
        self.nationality = draft.nationality;
        self.body_type = draft.body_type;
        self.clothing_size = draft.clothing_size;
        self.description = draft.description;
        self.price = draft.price;
        self.services = draft.services;
        self.phone = draft.phone;
        self.media = draft.media;
    }

    fn apply_summary(&mut self, summary: RatingSummary) {
        self.rating = summary.rating;
        self.review_count = summary.review_count;
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: DbId,
    pub listing_id: DbId,
    pub author: String,
    pub rating: i32,
    pub text: String,
    pub created_at: Timestamp,
}

/// Owner-editable attributes of a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
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
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

impl ListingDraft {
    /// Normalize the service tags in place, then check every field bound.
    pub fn normalize_and_validate(&mut self) -> Result<(), CoreError> {
        self.services = normalize_services(std::mem::take(&mut self.services));
        self.validate()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let name_len = self.name.trim().chars().count();
        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name_len) {
            return Err(CoreError::Validation(format!(
                "Name must be between {MIN_NAME_LENGTH} and {MAX_NAME_LENGTH} characters"
            )));
        }
        check_range("Age", Some(self.age), MIN_AGE, MAX_AGE)?;
        check_range("Height", self.height, MIN_HEIGHT, MAX_HEIGHT)?;
        check_range("Weight", self.weight, MIN_WEIGHT, MAX_WEIGHT)?;
        check_range("Price", Some(self.price), MIN_PRICE, MAX_PRICE)?;
        validate_city(&self.city)?;

        if let Some(description) = &self.description {
            let len = description.chars().count();
            if !(MIN_DESCRIPTION_LENGTH..=MAX_DESCRIPTION_LENGTH).contains(&len) {
                return Err(CoreError::Validation(format!(
                    "Description must be between {MIN_DESCRIPTION_LENGTH} and \
                     {MAX_DESCRIPTION_LENGTH} characters"
                )));
            }
        }

        validate_services(&self.services)?;
        for item in &self.media {
            validate_media_kind(&item.kind)?;
            if item.url.trim().is_empty() {
                return Err(CoreError::Validation("Media url must not be empty".into()));
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, value: Option<i32>, min: i32, max: i32) -> Result<(), CoreError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(CoreError::Validation(format!(
            "{field} must be between {min} and {max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

/// One page of ranked, approved listings.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage<'a> {
    pub listings: Vec<&'a Listing>,
    pub pagination: PaginationMeta,
}

/* --------------------------------------------------------------------------
Catalog
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    listings: Vec<Listing>,
    reviews: BTreeMap<DbId, Vec<Review>>,
    next_listing_id: DbId,
    next_review_id: DbId,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            next_listing_id: 1,
            next_review_id: 1,
            ..Self::default()
        }
    }

    /// Restore a catalog from `store`. Missing keys start empty.
    ///
    /// Rating aggregates are rebuilt from the stored reviews; the persisted
    /// `rating` and `reviewCount` fields are not trusted.
    pub fn load(store: &impl KeyValueStore) -> Result<Self, CoreError> {
        let mut listings: Vec<Listing> = match store.get(LISTINGS_KEY)? {
            Some(raw) => decode(LISTINGS_KEY, &raw)?,
            None => Vec::new(),
        };
        let reviews: BTreeMap<DbId, Vec<Review>> = match store.get(REVIEWS_KEY)? {
            Some(raw) => decode(REVIEWS_KEY, &raw)?,
            None => BTreeMap::new(),
        };

        let next_listing_id = listings.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        let next_review_id = reviews
            .values()
            .flatten()
            .map(|r| r.id)
            .max()
            .unwrap_or(0)
            + 1;

        for listing in &mut listings {
            let scores = reviews.get(&listing.id).into_iter().flatten().map(|r| r.rating);
            listing.apply_summary(RatingSummary::from_scores(scores));
        }

        Ok(Self {
            listings,
            reviews,
            next_listing_id,
            next_review_id,
        })
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), CoreError> {
        store.set(LISTINGS_KEY, encode(&self.listings)?)?;
        store.set(REVIEWS_KEY, encode(&self.reviews)?)
    }

    // -- Reads ---------------------------------------------------------------

    /// All listings in insertion order, regardless of status.
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, id: DbId) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn find_by_owner(&self, owner: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.owner == owner)
    }

    /// Reviews of a listing, oldest first.
    pub fn reviews(&self, listing_id: DbId) -> &[Review] {
        self.reviews
            .get(&listing_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every listing matching `criteria`, in insertion order.
    pub fn search(&self, criteria: &ListingCriteria) -> Vec<&Listing> {
        filter_listings(&self.listings, criteria)
    }

    /// Approved listings matching `criteria`, ranked, one page at a time.
    pub fn browse(&self, criteria: &ListingCriteria, request: PageRequest) -> CatalogPage<'_> {
        let mut matched: Vec<&Listing> = self
            .search(criteria)
            .into_iter()
            .filter(|l| l.status == ModerationStatus::Approved)
            .collect();
        sort_ranked(&mut matched);
        let pagination = PaginationMeta::new(request, matched.len() as i64);
        CatalogPage {
            listings: paginate(&matched, request).to_vec(),
            pagination,
        }
    }

    /// Distinct service tags offered by approved listings, sorted
    /// case-insensitively. Tags differing only in case appear once.
    pub fn service_tags(&self) -> Vec<String> {
        distinct_service_tags(
            self.listings
                .iter()
                .filter(|l| l.status == ModerationStatus::Approved)
                .flat_map(|l| l.services.iter().map(String::as_str)),
        )
    }

    /// 1-based position of a listing in the public ranking, or `None` when it
    /// is missing or not approved.
    pub fn rank(&self, id: DbId) -> Option<usize> {
        let listing = self.get(id)?;
        if listing.status != ModerationStatus::Approved {
            return None;
        }
        let ahead = self
            .listings
            .iter()
            .filter(|l| l.status == ModerationStatus::Approved && l.id != id)
            .filter(|l| rank_cmp(*l, listing).is_lt())
            .count();
        Some(ahead + 1)
    }

    // -- Listing writes ------------------------------------------------------

    /// Create a pending listing for `owner`. One listing per owner.
    pub fn create_listing(
        &mut self,
        owner: &str,
        mut draft: ListingDraft,
    ) -> Result<&Listing, CoreError> {
        draft.normalize_and_validate()?;
        if self.find_by_owner(owner).is_some() {
            return Err(CoreError::Conflict(format!(
                "Owner '{owner}' already has a listing"
            )));
        }

        let now = Utc::now();
        let mut listing = Listing {
            id: self.next_listing_id,
            owner: owner.to_string(),
            name: String::new(),
            age: 0,
            city: String::new(),
            height: None,
            weight: None,
            bust_size: None,
            eye_color: None,
            hair_color: None,
            nationality: None,
            body_type: None,
            clothing_size: None,
            description: None,
            price: 0,
            services: Vec::new(),
            phone: None,
            media: Vec::new(),
            rating: 0.0,
            review_count: 0,
            views: 0,
            status: ModerationStatus::Pending,
            payment_plan: PLAN_NONE.to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        listing.apply(draft);
        self.next_listing_id += 1;
        self.listings.push(listing);
        Ok(&self.listings[self.listings.len() - 1])
    }

    /// Replace the attributes of a listing last read at `expected_version`.
    ///
    /// A stale version is a [`CoreError::Conflict`]. A successful update bumps
    /// the version and sends the listing back to moderation.
    pub fn update_listing(
        &mut self,
        id: DbId,
        expected_version: i32,
        mut draft: ListingDraft,
    ) -> Result<&Listing, CoreError> {
        draft.normalize_and_validate()?;
        let listing = self.listing_mut(id)?;
        if listing.version != expected_version {
            return Err(CoreError::Conflict(format!(
                "Listing {id} was modified (current version {}, expected {expected_version})",
                listing.version
            )));
        }
        listing.apply(draft);
        listing.version += 1;
        listing.status = ModerationStatus::Pending;
        listing.updated_at = Utc::now();
        Ok(listing)
    }

    /// Remove a listing together with its reviews.
    pub fn delete_listing(&mut self, id: DbId) -> Result<Listing, CoreError> {
        let index = self
            .listings
            .iter()
            .position(|l| l.id == id)
            .ok_or(CoreError::NotFound {
                entity: "Listing",
                id,
            })?;
        self.reviews.remove(&id);
        Ok(self.listings.remove(index))
    }

    pub fn set_status(
        &mut self,
        id: DbId,
        status: ModerationStatus,
    ) -> Result<&Listing, CoreError> {
        let listing = self.listing_mut(id)?;
        listing.status = status;
        listing.updated_at = Utc::now();
        Ok(listing)
    }

    /// Select a mock payment tier. No money moves.
    pub fn set_payment_plan(&mut self, id: DbId, plan: &str) -> Result<&Listing, CoreError> {
        validate_payment_plan(plan)?;
        let listing = self.listing_mut(id)?;
        listing.payment_plan = plan.to_string();
        listing.updated_at = Utc::now();
        Ok(listing)
    }

    /// Best-effort view counter. Returns `false` when the listing is gone.
    pub fn record_view(&mut self, id: DbId) -> bool {
        match self.listings.iter_mut().find(|l| l.id == id) {
            Some(listing) => {
                listing.views = listing.views.saturating_add(1);
                true
            }
            None => false,
        }
    }

    // -- Reviews -------------------------------------------------------------

    /// Add a review and recompute the listing aggregate in the same step.
    ///
    /// Only approved listings accept reviews (anything else reads as not
    /// found), and an owner may not review their own listing.
    pub fn add_review(
        &mut self,
        listing_id: DbId,
        author: &str,
        score: i32,
        text: &str,
    ) -> Result<RatingSummary, CoreError> {
        validate_score(score)?;
        validate_review_text(text)?;
        let listing = self.listing_mut(listing_id)?;
        if listing.status != ModerationStatus::Approved {
            return Err(CoreError::NotFound {
                entity: "Listing",
                id: listing_id,
            });
        }
        if listing.owner == author {
            return Err(CoreError::Forbidden(
                "You cannot review your own listing".into(),
            ));
        }

        let reviews = self.reviews.entry(listing_id).or_default();
        if reviews.iter().any(|r| r.author == author) {
            return Err(CoreError::Conflict(format!(
                "'{author}' has already reviewed listing {listing_id}"
            )));
        }
        reviews.push(Review {
            id: self.next_review_id,
            listing_id,
            author: author.to_string(),
            rating: score,
            text: text.trim().to_string(),
            created_at: Utc::now(),
        });
        self.next_review_id += 1;

        self.recompute(listing_id)
    }

    /// Remove one review and recompute the listing aggregate.
    pub fn remove_review(
        &mut self,
        listing_id: DbId,
        review_id: DbId,
    ) -> Result<RatingSummary, CoreError> {
        self.listing_mut(listing_id)?;
        let not_found = || CoreError::NotFound {
            entity: "Review",
            id: review_id,
        };
        let reviews = self.reviews.get_mut(&listing_id).ok_or_else(not_found)?;
        let index = reviews
            .iter()
            .position(|r| r.id == review_id)
            .ok_or_else(not_found)?;
        reviews.remove(index);
        if reviews.is_empty() {
            self.reviews.remove(&listing_id);
        }

        self.recompute(listing_id)
    }

    fn recompute(&mut self, listing_id: DbId) -> Result<RatingSummary, CoreError> {
        let summary =
            RatingSummary::from_scores(self.reviews(listing_id).iter().map(|r| r.rating));
        self.listing_mut(listing_id)?.apply_summary(summary);
        Ok(summary)
    }

    fn listing_mut(&mut self, id: DbId) -> Result<&mut Listing, CoreError> {
        self.listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CoreError::NotFound {
                entity: "Listing",
                id,
            })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string(value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize catalog: {e}")))
}

fn decode<T: for<'de> Deserialize<'de>>(key: &str, raw: &str) -> Result<T, CoreError> {
    serde_json::from_str(raw)
        .map_err(|e| CoreError::Internal(format!("Corrupt catalog data under '{key}': {e}")))
}
