//! Review score validation and listing rating aggregation.
//!
//! The aggregate is always the arithmetic mean of the current review scores.
//! [`RatingSummary::with_added`] and [`RatingSummary::with_removed`] are the
//! incremental forms; callers that hold the full score list should prefer
//! [`RatingSummary::from_scores`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

pub const MIN_REVIEW_TEXT_LENGTH: usize = 10;
pub const MAX_REVIEW_TEXT_LENGTH: usize = 500;

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

pub fn validate_score(score: i32) -> Result<(), CoreError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Rating must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
        )))
    }
}

/// Review text is trimmed before the length check.
pub fn validate_review_text(text: &str) -> Result<(), CoreError> {
    let len = text.trim().chars().count();
    if (MIN_REVIEW_TEXT_LENGTH..=MAX_REVIEW_TEXT_LENGTH).contains(&len) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Review text must be between {MIN_REVIEW_TEXT_LENGTH} and \
             {MAX_REVIEW_TEXT_LENGTH} characters"
        )))
    }
}

/* --------------------------------------------------------------------------
Aggregate
-------------------------------------------------------------------------- */

/// Denormalized rating stored on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean score in `[0, 5]`; `0.0` when there are no reviews.
    pub rating: f64,
    pub review_count: i32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        rating: 0.0,
        review_count: 0,
    };

    /// Full recompute from every current score.
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let (sum, count) = scores
            .into_iter()
            .fold((0i64, 0i32), |(sum, n), s| (sum + i64::from(s), n + 1));
        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            rating: sum as f64 / f64::from(count),
            review_count: count,
        }
    }

    /// Aggregate after one more review with `score`: `(a*n + r) / (n + 1)`.
    pub fn with_added(self, score: i32) -> Self {
        let n = f64::from(self.review_count);
        Self {
            rating: (self.rating * n + f64::from(score)) / (n + 1.0),
            review_count: self.review_count + 1,
        }
    }

    /// Aggregate after removing one review with `score`.
    ///
    /// Removing the last review yields [`RatingSummary::EMPTY`].
    pub fn with_removed(self, score: i32) -> Self {
        if self.review_count <= 1 {
            return Self::EMPTY;
        }
        let n = f64::from(self.review_count);
        Self {
            rating: (self.rating * n - f64::from(score)) / (n - 1.0),
            review_count: self.review_count - 1,
        }
    }
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self::EMPTY
    }
}
