//! Database operations for the `scrape_runs` run log.
//!
//! The run log is a best-effort local mirror of provider-side job state:
//! writes here must never be treated as the source of truth for a live run.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Statuses that must never be overwritten once reached.
const TERMINAL_STATUSES: &str = "('SUCCEEDED', 'FAILED', 'TIMED-OUT', 'ABORTED')";

const SELECT_COLUMNS: &str = "id, run_id, actor_id, status, started_at, finished_at, \
     status_message, results_count, is_dry_run, target_url, created_at, updated_at";

/// A row from the `scrape_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub id: i64,
    pub run_id: String,
    pub actor_id: Option<String>,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status_message: Option<String>,
    /// The schema defines this as `INTEGER NOT NULL DEFAULT 0`.
    pub results_count: i32,
    pub is_dry_run: bool,
    pub target_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider-reported state to mirror into an existing (or new) run row.
#[derive(Debug, Clone)]
pub struct ScrapeRunMirror<'a> {
    pub run_id: &'a str,
    pub actor_id: Option<&'a str>,
    pub status: &'a str,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status_message: Option<&'a str>,
    pub results_count: Option<i32>,
}

/// Creates a new run row in `CREATED` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including the unique
/// violation raised when a row for `run_id` already exists.
pub async fn create_scrape_run(
    pool: &PgPool,
    run_id: &str,
    actor_id: Option<&str>,
    is_dry_run: bool,
    target_url: Option<&str>,
) -> Result<ScrapeRunRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "INSERT INTO scrape_runs (run_id, actor_id, status, is_dry_run, target_url) \
         VALUES ($1, $2, 'CREATED', $3, $4) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(run_id)
    .bind(actor_id)
    .bind(is_dry_run)
    .bind(target_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a single run by its run identifier.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for `run_id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_run(pool: &PgPool, run_id: &str) -> Result<ScrapeRunRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM scrape_runs WHERE run_id = $1"
    ))
    .bind(run_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Marks a dry run as `RUNNING` and sets `started_at = NOW()`.
///
/// Gated on the prior status so a simulated transition that raced another
/// write cannot regress the row.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the row is not in
/// `CREATED`, or [`DbError::Sqlx`] if the update fails.
pub async fn mark_dry_run_running(pool: &PgPool, run_id: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'RUNNING', started_at = NOW(), updated_at = NOW() \
         WHERE run_id = $1 AND status = 'CREATED'",
    )
    .bind(run_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            run_id: run_id.to_string(),
            expected_status: "CREATED",
        });
    }

    Ok(())
}

/// Marks a dry run as `SUCCEEDED`, sets `finished_at = NOW()` and the
/// simulated `results_count`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeRunTransition`] if the row is not in
/// `RUNNING`, or [`DbError::Sqlx`] if the update fails.
pub async fn mark_dry_run_succeeded(
    pool: &PgPool,
    run_id: &str,
    results_count: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = 'SUCCEEDED', finished_at = NOW(), results_count = $1, \
             status_message = 'Dry run completed', updated_at = NOW() \
         WHERE run_id = $2 AND status = 'RUNNING'",
    )
    .bind(results_count)
    .bind(run_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeRunTransition {
            run_id: run_id.to_string(),
            expected_status: "RUNNING",
        });
    }

    Ok(())
}

/// Upserts provider-reported state into the local mirror and returns the
/// merged row.
///
/// Rows that already reached a terminal status are left untouched: the
/// status machine is monotonic, and a provider blip must not resurrect a
/// finished run. Returns the row as stored after the write either way.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert or the follow-up read fails.
pub async fn mirror_scrape_run(
    pool: &PgPool,
    mirror: &ScrapeRunMirror<'_>,
) -> Result<ScrapeRunRow, DbError> {
    sqlx::query(&format!(
        "INSERT INTO scrape_runs \
             (run_id, actor_id, status, started_at, finished_at, status_message, results_count) \
         VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0)) \
         ON CONFLICT (run_id) DO UPDATE SET \
             status         = EXCLUDED.status, \
             started_at     = COALESCE(EXCLUDED.started_at, scrape_runs.started_at), \
             finished_at    = COALESCE(EXCLUDED.finished_at, scrape_runs.finished_at), \
             status_message = COALESCE(EXCLUDED.status_message, scrape_runs.status_message), \
             results_count  = GREATEST(EXCLUDED.results_count, scrape_runs.results_count), \
             updated_at     = NOW() \
         WHERE scrape_runs.status NOT IN {TERMINAL_STATUSES}"
    ))
    .bind(mirror.run_id)
    .bind(mirror.actor_id)
    .bind(mirror.status)
    .bind(mirror.started_at)
    .bind(mirror.finished_at)
    .bind(mirror.status_message)
    .bind(mirror.results_count)
    .execute(pool)
    .await?;

    get_scrape_run(pool, mirror.run_id).await
}

/// Returns the most recent `limit` runs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_runs(pool: &PgPool, limit: i64) -> Result<Vec<ScrapeRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM scrape_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns live (non-dry-run) runs that are neither terminal nor recently
/// refreshed, for the background status-mirror job.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stale_live_runs(
    pool: &PgPool,
    older_than_secs: f64,
) -> Result<Vec<ScrapeRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM scrape_runs \
         WHERE is_dry_run = false \
           AND status NOT IN {TERMINAL_STATUSES} \
           AND updated_at < NOW() - make_interval(secs => $1) \
         ORDER BY updated_at ASC"
    ))
    .bind(older_than_secs)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
