//! Database operations for the `campaigns` and `campaign_influencers` tables.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SELECT_COLUMNS: &str = "id, public_id, name, brief, status, budget, starts_on, ends_on, \
     created_at, updated_at, deleted_at";

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub brief: Option<String>,
    pub status: String,
    pub budget: Option<Decimal>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for a new campaign row.
#[derive(Debug, Clone, Default)]
pub struct NewCampaign<'a> {
    pub name: &'a str,
    pub brief: Option<&'a str>,
    pub budget: Option<Decimal>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

/// Creates a new campaign in `draft` status and returns the inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_campaign(pool: &PgPool, new: &NewCampaign<'_>) -> Result<CampaignRow, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "INSERT INTO campaigns (name, brief, status, budget, starts_on, ends_on) \
         VALUES ($1, $2, 'draft', $3, $4, $5) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(new.name)
    .bind(new.brief)
    .bind(new.budget)
    .bind(new.starts_on)
    .bind(new.ends_on)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all non-deleted campaigns, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaigns(pool: &PgPool, limit: i64) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM campaigns \
         WHERE deleted_at IS NULL \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single campaign by public id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no matching row exists, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<CampaignRow, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM campaigns \
         WHERE public_id = $1 AND deleted_at IS NULL"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Updates campaign fields; `None` fields are preserved.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for `public_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_campaign(
    pool: &PgPool,
    public_id: Uuid,
    name: Option<&str>,
    brief: Option<&str>,
    status: Option<&str>,
    budget: Option<Decimal>,
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
) -> Result<CampaignRow, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "UPDATE campaigns \
         SET name       = COALESCE($2, name), \
             brief      = COALESCE($3, brief), \
             status     = COALESCE($4, status), \
             budget     = COALESCE($5, budget), \
             starts_on  = COALESCE($6, starts_on), \
             ends_on    = COALESCE($7, ends_on), \
             updated_at = NOW() \
         WHERE public_id = $1 AND deleted_at IS NULL \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(name)
    .bind(brief)
    .bind(status)
    .bind(budget)
    .bind(starts_on)
    .bind(ends_on)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Soft-deletes a campaign.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for `public_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_campaign(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE campaigns \
         SET deleted_at = NOW(), updated_at = NOW() \
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

/// Assigns an influencer to a campaign in `invited` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails. A duplicate assignment
/// surfaces as a unique violation; check with [`DbError::is_unique_violation`].
pub async fn assign_influencer(
    pool: &PgPool,
    campaign_id: i64,
    influencer_id: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO campaign_influencers (campaign_id, influencer_id, status) \
         VALUES ($1, $2, 'invited')",
    )
    .bind(campaign_id)
    .bind(influencer_id)
    .execute(pool)
    .await?;

    Ok(())
}
