//! Repository for the `listings` table.
//!
//! Search runs the same predicates as [`velvet_core::filter::matches`], as a
//! single static statement: every optional filter is written as
//! `($n IS NULL OR ...)` so an absent criterion binds `NULL` and drops out.

use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use velvet_core::criteria::ListingCriteria;
use velvet_core::listing::{distinct_service_tags, ModerationStatus};
use velvet_core::pagination::PageRequest;
use velvet_core::types::DbId;

use crate::models::listing::{CreateListing, Listing, UpdateListing};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, user_id, name, age, city, height, weight, bust_size, \
                        eye_color, hair_color, nationality, body_type, clothing_size, \
                        description, price, services, phone, rating, review_count, views, \
                        status, payment_plan, version, created_at, updated_at";

/// Highest rated first, newest first among equals, then by id for a stable page order.
const RANKED_ORDER: &str = "rating DESC, created_at DESC, id DESC";

/// Filter predicates over `$1..$17`, in the order [`bind_filters`] binds them.
const FILTER_CLAUSE: &str = "
    ($1::TEXT IS NULL
        OR name ILIKE $1
        OR description ILIKE $1
        OR EXISTS (SELECT 1 FROM unnest(services) s WHERE s ILIKE $1))
    AND ($2::TEXT IS NULL OR LOWER(city) = LOWER($2))
    AND ($3::INT IS NULL OR age >= $3)
    AND ($4::INT IS NULL OR age <= $4)
    AND ($5::INT IS NULL OR height >= $5)
    AND ($6::INT IS NULL OR height <= $6)
    AND ($7::INT IS NULL OR weight >= $7)
    AND ($8::INT IS NULL OR weight <= $8)
    AND ($9::INT IS NULL OR price >= $9)
    AND ($10::INT IS NULL OR price <= $10)
    AND ($11::DOUBLE PRECISION IS NULL OR rating >= $11)
    AND ($12::TEXT IS NULL OR LOWER(eye_color) = LOWER($12))
    AND ($13::TEXT IS NULL OR LOWER(hair_color) = LOWER($13))
    AND ($14::TEXT IS NULL OR LOWER(nationality) = LOWER($14))
    AND ($15::TEXT IS NULL OR LOWER(body_type) = LOWER($15))
    AND ($16::TEXT IS NULL OR LOWER(bust_size) = LOWER($16))
    AND ($17::TEXT IS NULL OR EXISTS (SELECT 1 FROM unnest(services) s WHERE s ILIKE $17))";

/// Provides CRUD and search operations for listings.
pub struct ListingRepo;

impl ListingRepo {
    /// Insert a new listing for `user_id`. It starts `pending` at version 1.
    ///
    /// A second listing for the same user fails on `uq_listings_user`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateListing,
    ) -> Result<Listing, sqlx::Error> {
        let query = format!(
            "INSERT INTO listings
                (user_id, name, age, city, height, weight, bust_size, eye_color, hair_color,
                 nationality, body_type, clothing_size, description, price, services, phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Listing>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(input.age)
            .bind(&input.city)
            .bind(input.height)
            .bind(input.weight)
            .bind(&input.bust_size)
            .bind(&input.eye_color)
            .bind(&input.hair_color)
            .bind(&input.nationality)
            .bind(&input.body_type)
            .bind(&input.clothing_size)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.services)
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Listing>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM listings WHERE id = $1");
        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The listing owned by `user_id`, if any. A user owns at most one.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Listing>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM listings WHERE user_id = $1");
        sqlx::query_as::<_, Listing>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply the non-`None` fields of `input` if the row is still at
    /// `input.version`.
    ///
    /// A successful edit bumps the version and sends the listing back to
    /// moderation. Returns `None` when the id does not exist or the version
    /// has moved on.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateListing,
    ) -> Result<Option<Listing>, sqlx::Error> {
        let query = format!(
            "UPDATE listings SET
                name = COALESCE($3, name),
                age = COALESCE($4, age),
                city = COALESCE($5, city),
                height = COALESCE($6, height),
                weight = COALESCE($7, weight),
                bust_size = COALESCE($8, bust_size),
                eye_color = COALESCE($9, eye_color),
                hair_color = COALESCE($10, hair_color),
                nationality = COALESCE($11, nationality),
                body_type = COALESCE($12, body_type),
                clothing_size = COALESCE($13, clothing_size),
                description = COALESCE($14, description),
                price = COALESCE($15, price),
                services = COALESCE($16, services),
                phone = COALESCE($17, phone),
                status = 'pending',
                version = version + 1
             WHERE id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .bind(input.version)
            .bind(&input.name)
            .bind(input.age)
            .bind(&input.city)
            .bind(input.height)
            .bind(input.weight)
            .bind(&input.bust_size)
            .bind(&input.eye_color)
            .bind(&input.hair_color)
            .bind(&input.nationality)
            .bind(&input.body_type)
            .bind(&input.clothing_size)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.services)
            .bind(&input.phone)
            .fetch_optional(pool)
            .await
    }

    /// Delete a listing. Media, reviews and favorites cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump the view counter. Returns `false` if the listing is gone.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE listings SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: ModerationStatus,
    ) -> Result<Option<Listing>, sqlx::Error> {
        let query = format!("UPDATE listings SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn set_payment_plan(
        pool: &PgPool,
        id: DbId,
        plan: &str,
    ) -> Result<Option<Listing>, sqlx::Error> {
        let query =
            format!("UPDATE listings SET payment_plan = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Listing>(&query)
            .bind(id)
            .bind(plan)
            .fetch_optional(pool)
            .await
    }

    /// One page of approved listings matching `criteria`, ranked, plus the
    /// total number of matches.
    pub async fn search(
        pool: &PgPool,
        criteria: &ListingCriteria,
        page: PageRequest,
    ) -> Result<(Vec<Listing>, i64), sqlx::Error> {
        let filters = SqlFilters::from_criteria(criteria);

        let count_query =
            format!("SELECT COUNT(*) FROM listings WHERE status = 'approved' AND {FILTER_CLAUSE}");
        let (total,): (i64,) = bind_filters(sqlx::query_as(&count_query), &filters)
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM listings
             WHERE status = 'approved' AND {FILTER_CLAUSE}
             ORDER BY {RANKED_ORDER}
             LIMIT $18 OFFSET $19"
        );
        let rows = bind_filters(sqlx::query_as::<_, Listing>(&query), &filters)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Sorted, distinct service tags across approved listings.
    pub async fn service_tags(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT tag FROM listings, unnest(services) AS tag
             WHERE status = 'approved'",
        )
        .fetch_all(pool)
        .await?;
        Ok(distinct_service_tags(tags.iter().map(String::as_str)))
    }

    /// 1-based position of a listing in the public ranking. `None` unless the
    /// listing exists and is approved.
    pub async fn rank_of(pool: &PgPool, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        let query = format!(
            "SELECT position FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY {RANKED_ORDER}) AS position
                FROM listings WHERE status = 'approved'
             ) ranked
             WHERE id = $1"
        );
        sqlx::query_scalar(&query).bind(id).fetch_optional(pool).await
    }

    /// Listings for the moderation queue, oldest first. `None` lists every status.
    pub async fn list_by_status(
        pool: &PgPool,
        status: Option<ModerationStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Listing>, i64), sqlx::Error> {
        let status = status.map(ModerationStatus::as_str);

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM listings WHERE ($1::TEXT IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(pool)
                .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM listings
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, Listing>(&query)
            .bind(status)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }
}

/// Bind values for [`FILTER_CLAUSE`]. Substring filters are pre-built
/// `ILIKE` patterns.
struct SqlFilters {
    keyword: Option<String>,
    service: Option<String>,
    criteria: ListingCriteria,
}

impl SqlFilters {
    fn from_criteria(criteria: &ListingCriteria) -> Self {
        Self {
            keyword: criteria.keyword.as_deref().map(contains_pattern),
            service: criteria.service.as_deref().map(contains_pattern),
            criteria: criteria.clone(),
        }
    }
}

fn bind_filters<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    f: &'q SqlFilters,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    let c = &f.criteria;
    query
        .bind(f.keyword.as_deref())
        .bind(c.city.as_deref())
        .bind(c.min_age)
        .bind(c.max_age)
        .bind(c.min_height)
        .bind(c.max_height)
        .bind(c.min_weight)
        .bind(c.max_weight)
        .bind(c.min_price)
        .bind(c.max_price)
        .bind(c.min_rating)
        .bind(c.eye_color.as_deref())
        .bind(c.hair_color.as_deref())
        .bind(c.nationality.as_deref())
        .bind(c.body_type.as_deref())
        .bind(c.bust_size.as_deref())
        .bind(f.service.as_deref())
}

/// `%needle%` with `LIKE` metacharacters escaped.
fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(needle))
}

/// Escape `\`, `%` and `_` so user input matches literally under `LIKE`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
