//! Database operations for the `influencers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SELECT_COLUMNS: &str = "id, public_id, name, email, instagram_handle, instagram_url, \
     followers_count, bio, avatar_url, notes, is_active, created_at, updated_at, deleted_at";

/// A row from the `influencers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InfluencerRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub email: String,
    pub instagram_handle: Option<String>,
    pub instagram_url: Option<String>,
    pub followers_count: Option<i64>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for a new influencer row.
#[derive(Debug, Clone, Default)]
pub struct NewInfluencer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub instagram_handle: Option<&'a str>,
    pub instagram_url: Option<&'a str>,
    pub followers_count: Option<i64>,
    pub bio: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Sparse update; `None` preserves the existing value.
#[derive(Debug, Clone, Default)]
pub struct UpdateInfluencer<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub instagram_handle: Option<&'a str>,
    pub instagram_url: Option<&'a str>,
    pub followers_count: Option<i64>,
    pub bio: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Creates a new influencer row and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails. A duplicate email surfaces
/// as a unique violation; check with [`DbError::is_unique_violation`].
pub async fn create_influencer(
    pool: &PgPool,
    new: &NewInfluencer<'_>,
) -> Result<InfluencerRow, DbError> {
    let row = sqlx::query_as::<_, InfluencerRow>(&format!(
        "INSERT INTO influencers \
           (name, email, instagram_handle, instagram_url, followers_count, bio, avatar_url, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(new.name)
    .bind(new.email)
    .bind(new.instagram_handle)
    .bind(new.instagram_url)
    .bind(new.followers_count)
    .bind(new.bio)
    .bind(new.avatar_url)
    .bind(new.notes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all active, non-deleted influencers, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_influencers(pool: &PgPool, limit: i64) -> Result<Vec<InfluencerRow>, DbError> {
    let rows = sqlx::query_as::<_, InfluencerRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM influencers \
         WHERE is_active = true AND deleted_at IS NULL \
         ORDER BY name \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active influencer by public id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no matching row exists, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_influencer_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<InfluencerRow, DbError> {
    let row = sqlx::query_as::<_, InfluencerRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM influencers \
         WHERE public_id = $1 AND is_active = true AND deleted_at IS NULL"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the active influencer with the given email, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_influencer_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<InfluencerRow>, DbError> {
    let row = sqlx::query_as::<_, InfluencerRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM influencers \
         WHERE email = $1 AND is_active = true AND deleted_at IS NULL"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Updates fields on an existing influencer; `None` fields are preserved.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active row exists for `public_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_influencer(
    pool: &PgPool,
    public_id: Uuid,
    update: &UpdateInfluencer<'_>,
) -> Result<InfluencerRow, DbError> {
    let row = sqlx::query_as::<_, InfluencerRow>(&format!(
        "UPDATE influencers \
         SET name             = COALESCE($2, name), \
             email            = COALESCE($3, email), \
             instagram_handle = COALESCE($4, instagram_handle), \
             instagram_url    = COALESCE($5, instagram_url), \
             followers_count  = COALESCE($6, followers_count), \
             bio              = COALESCE($7, bio), \
             avatar_url       = COALESCE($8, avatar_url), \
             notes            = COALESCE($9, notes), \
             updated_at       = NOW() \
         WHERE public_id = $1 AND is_active = true AND deleted_at IS NULL \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(update.name)
    .bind(update.email)
    .bind(update.instagram_handle)
    .bind(update.instagram_url)
    .bind(update.followers_count)
    .bind(update.bio)
    .bind(update.avatar_url)
    .bind(update.notes)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Soft-deletes an influencer by setting `is_active = false` and `deleted_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no active row exists for `public_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_influencer(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE influencers \
         SET is_active = false, deleted_at = NOW(), updated_at = NOW() \
         WHERE public_id = $1 AND deleted_at IS NULL",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
