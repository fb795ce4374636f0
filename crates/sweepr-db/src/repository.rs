//! Listing repositories for PostgreSQL.
//!
//! Both tables share the ordering and activation columns, so the queries that
//! only touch those columns live in table-agnostic helpers. Table and column
//! names are const literals; `format!()` only ever splices those, never input.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Pool, Postgres};
use sweepr_core::error::AppError;
use sweepr_core::models::{
    ListingPatch, NewSweepstake, NewTestimonial, SortUpdate, Sweepstake, Testimonial,
};
use sweepr_core::traits::ListingStore;
use tracing::debug;
use uuid::Uuid;

const SWEEPSTAKES_TABLE: &str = "sweepstakes";
const TESTIMONIALS_TABLE: &str = "testimonials";

/// Column list for sweepstake SELECT/RETURNING clauses.
const SWEEPSTAKE_COLUMNS: &str =
    "id, name, image_url, url, countries, sort_order, active, created_at, updated_at";

/// Column list for testimonial SELECT/RETURNING clauses.
const TESTIMONIAL_COLUMNS: &str = "id, quote, name, location, rating, avatar_url, countries, sort_order, active, created_at, updated_at";

/// Repository for the `sweepstakes` table.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use sweepr_db::SweepstakeRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/sweepr")
///     .await?;
///
/// let repo = SweepstakeRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SweepstakeRepository {
    pool: Pool<Postgres>,
}

impl SweepstakeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore<Sweepstake> for SweepstakeRepository {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Sweepstake>, AppError> {
        list_rows(&self.pool, SWEEPSTAKES_TABLE, SWEEPSTAKE_COLUMNS, include_inactive).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Sweepstake>, AppError> {
        get_row(&self.pool, SWEEPSTAKES_TABLE, SWEEPSTAKE_COLUMNS, id).await
    }

    async fn insert(&self, new: &NewSweepstake, sort_order: i32) -> Result<Sweepstake, AppError> {
        let query = format!(
            "INSERT INTO {SWEEPSTAKES_TABLE} (name, image_url, url, countries, active, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SWEEPSTAKE_COLUMNS}"
        );
        sqlx::query_as::<_, Sweepstake>(&query)
            .bind(&new.name)
            .bind(&new.image_url)
            .bind(&new.url)
            .bind(&new.countries)
            .bind(new.active)
            .bind(sort_order)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn replace(&self, id: Uuid, new: &NewSweepstake) -> Result<Sweepstake, AppError> {
        let query = format!(
            "UPDATE {SWEEPSTAKES_TABLE} SET \
                name = $2, \
                image_url = $3, \
                url = $4, \
                countries = $5, \
                active = $6, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {SWEEPSTAKE_COLUMNS}"
        );
        sqlx::query_as::<_, Sweepstake>(&query)
            .bind(id)
            .bind(&new.name)
            .bind(&new.image_url)
            .bind(&new.url)
            .bind(&new.countries)
            .bind(new.active)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or(AppError::ListingNotFound(id))
    }

    async fn update_fields(&self, id: Uuid, patch: &ListingPatch) -> Result<Sweepstake, AppError> {
        patch_row(&self.pool, SWEEPSTAKES_TABLE, SWEEPSTAKE_COLUMNS, id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        delete_row(&self.pool, SWEEPSTAKES_TABLE, id).await
    }

    async fn count(&self) -> Result<i64, AppError> {
        count_rows(&self.pool, SWEEPSTAKES_TABLE).await
    }

    async fn apply_sort_orders(&self, updates: &[SortUpdate]) -> Result<(), AppError> {
        apply_sort_orders_tx(&self.pool, SWEEPSTAKES_TABLE, updates).await
    }
}

/// Repository for the `testimonials` table.
#[derive(Clone)]
pub struct TestimonialRepository {
    pool: Pool<Postgres>,
}

impl TestimonialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore<Testimonial> for TestimonialRepository {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Testimonial>, AppError> {
        list_rows(&self.pool, TESTIMONIALS_TABLE, TESTIMONIAL_COLUMNS, include_inactive).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Testimonial>, AppError> {
        get_row(&self.pool, TESTIMONIALS_TABLE, TESTIMONIAL_COLUMNS, id).await
    }

    async fn insert(&self, new: &NewTestimonial, sort_order: i32) -> Result<Testimonial, AppError> {
        let query = format!(
            "INSERT INTO {TESTIMONIALS_TABLE} \
                (quote, name, location, rating, avatar_url, countries, active, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {TESTIMONIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Testimonial>(&query)
            .bind(&new.quote)
            .bind(&new.name)
            .bind(&new.location)
            .bind(new.rating)
            .bind(&new.avatar_url)
            .bind(&new.countries)
            .bind(new.active)
            .bind(sort_order)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn replace(&self, id: Uuid, new: &NewTestimonial) -> Result<Testimonial, AppError> {
        let query = format!(
            "UPDATE {TESTIMONIALS_TABLE} SET \
                quote = $2, \
                name = $3, \
                location = $4, \
                rating = $5, \
                avatar_url = $6, \
                countries = $7, \
                active = $8, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TESTIMONIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Testimonial>(&query)
            .bind(id)
            .bind(&new.quote)
            .bind(&new.name)
            .bind(&new.location)
            .bind(new.rating)
            .bind(&new.avatar_url)
            .bind(&new.countries)
            .bind(new.active)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or(AppError::ListingNotFound(id))
    }

    async fn update_fields(&self, id: Uuid, patch: &ListingPatch) -> Result<Testimonial, AppError> {
        patch_row(&self.pool, TESTIMONIALS_TABLE, TESTIMONIAL_COLUMNS, id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        delete_row(&self.pool, TESTIMONIALS_TABLE, id).await
    }

    async fn count(&self) -> Result<i64, AppError> {
        count_rows(&self.pool, TESTIMONIALS_TABLE).await
    }

    async fn apply_sort_orders(&self, updates: &[SortUpdate]) -> Result<(), AppError> {
        apply_sort_orders_tx(&self.pool, TESTIMONIALS_TABLE, updates).await
    }
}

// =============================================================================
// Table-agnostic queries
// =============================================================================

fn list_query(table: &str, columns: &str, include_inactive: bool) -> String {
    if include_inactive {
        format!("SELECT {columns} FROM {table} ORDER BY sort_order, id")
    } else {
        format!("SELECT {columns} FROM {table} WHERE active = true ORDER BY sort_order, id")
    }
}

fn patch_query(table: &str, columns: &str) -> String {
    format!(
        "UPDATE {table} SET \
            sort_order = COALESCE($2, sort_order), \
            active = COALESCE($3, active), \
            updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {columns}"
    )
}

async fn list_rows<T>(
    pool: &PgPool,
    table: &str,
    columns: &str,
    include_inactive: bool,
) -> Result<Vec<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(&list_query(table, columns, include_inactive))
        .fetch_all(pool)
        .await
        .map_err(AppError::DatabaseError)
}

async fn get_row<T>(pool: &PgPool, table: &str, columns: &str, id: Uuid) -> Result<Option<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let query = format!("SELECT {columns} FROM {table} WHERE id = $1");
    sqlx::query_as::<_, T>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::DatabaseError)
}

async fn patch_row<T>(
    pool: &PgPool,
    table: &str,
    columns: &str,
    id: Uuid,
    patch: &ListingPatch,
) -> Result<T, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(&patch_query(table, columns))
        .bind(id)
        .bind(patch.sort_order)
        .bind(patch.active)
        .fetch_optional(pool)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or(AppError::ListingNotFound(id))
}

async fn delete_row(pool: &PgPool, table: &str, id: Uuid) -> Result<(), AppError> {
    let query = format!("DELETE FROM {table} WHERE id = $1");
    let result = sqlx::query(&query)
        .bind(id)
        .execute(pool)
        .await
        .map_err(AppError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(AppError::ListingNotFound(id));
    }
    Ok(())
}

async fn count_rows(pool: &PgPool, table: &str) -> Result<i64, AppError> {
    let query = format!("SELECT COUNT(*) FROM {table}");
    let row: (i64,) = sqlx::query_as(&query)
        .fetch_one(pool)
        .await
        .map_err(AppError::DatabaseError)?;
    Ok(row.0)
}

/// Writes a reorder batch in one transaction.
///
/// Any missing id rolls the whole batch back.
async fn apply_sort_orders_tx(
    pool: &PgPool,
    table: &str,
    updates: &[SortUpdate],
) -> Result<(), AppError> {
    if updates.is_empty() {
        return Ok(());
    }

    let query = format!("UPDATE {table} SET sort_order = $2, updated_at = NOW() WHERE id = $1");
    let mut tx = pool.begin().await.map_err(AppError::DatabaseError)?;

    for update in updates {
        let result = sqlx::query(&query)
            .bind(update.id)
            .bind(update.sort_order)
            .execute(&mut *tx)
            .await
            .map_err(AppError::DatabaseError)?;

        if result.rows_affected() == 0 {
            // Dropping `tx` rolls back.
            return Err(AppError::ListingNotFound(update.id));
        }
    }

    tx.commit().await.map_err(AppError::DatabaseError)?;
    debug!("Committed {} sort order updates to {}", updates.len(), table);
    Ok(())
}
