//! Scrape-run lifecycle orchestration.
//!
//! One [`ScrapeRunner`] serves the whole process. It owns the run log
//! (best-effort local mirror), delegates outbound work to a
//! [`ScrapeProvider`], and simulates the full lifecycle for dry runs so the
//! rest of the system can be exercised without provider credentials.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reachdb_apify::ActorRun;
use reachdb_core::{AppConfig, RunStatus, ScrapeResult};
use reachdb_db::{ScrapeRunMirror, ScrapeRunRow};
use sqlx::PgPool;

use crate::error::ScrapeError;
use crate::normalize::{canned_dry_run_profile, dedup_emails, normalize_profile, username_from_url};
use crate::provider::{ProviderError, ScrapeProvider};

/// Run identifiers with this prefix are synthetic and never sent to the
/// provider.
pub const DRY_RUN_PREFIX: &str = "dry-run-";

/// Delays between the simulated transitions of a dry run.
///
/// Each delay is relative to the previous transition, so a dry run is
/// `CREATED` immediately, `RUNNING` after `to_running`, and `SUCCEEDED`
/// `to_succeeded` later. Injected rather than hard-coded so tests can run
/// the whole lifecycle in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct DryRunDelays {
    pub to_running: Duration,
    pub to_succeeded: Duration,
}

impl DryRunDelays {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            to_running: Duration::from_millis(config.dry_run_to_running_ms),
            to_succeeded: Duration::from_millis(config.dry_run_to_succeeded_ms),
        }
    }
}

/// Status view returned to callers polling a run.
///
/// Built from the local run log when available, or directly from a provider
/// snapshot when the local mirror write failed (the mirror is best-effort,
/// not the source of truth).
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunStatusView {
    pub run_id: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status_message: Option<String>,
    pub results_count: i32,
    pub is_dry_run: bool,
}

impl From<ScrapeRunRow> for RunStatusView {
    fn from(row: ScrapeRunRow) -> Self {
        Self {
            run_id: row.run_id,
            status: row.status,
            started_at: row.started_at,
            finished_at: row.finished_at,
            status_message: row.status_message,
            results_count: row.results_count,
            is_dry_run: row.is_dry_run,
        }
    }
}

impl RunStatusView {
    fn from_provider(run: &ActorRun) -> Self {
        Self {
            run_id: run.id.clone(),
            status: run.status.clone(),
            started_at: run.started_at,
            finished_at: run.finished_at,
            status_message: run.status_message.clone(),
            results_count: 0,
            is_dry_run: false,
        }
    }
}

/// Orchestrates scrape runs end to end: submission, status polling with a
/// self-healing local mirror, and result retrieval with normalization.
#[derive(Clone)]
pub struct ScrapeRunner {
    pool: PgPool,
    provider: Arc<dyn ScrapeProvider>,
    delays: DryRunDelays,
    profile_actor_id: String,
    email_actor_id: String,
    results_limit: u32,
}

impl ScrapeRunner {
    #[must_use]
    pub fn new(pool: PgPool, provider: Arc<dyn ScrapeProvider>, config: &AppConfig) -> Self {
        Self {
            pool,
            provider,
            delays: DryRunDelays::from_config(config),
            profile_actor_id: config.profile_actor_id.clone(),
            email_actor_id: config.email_actor_id.clone(),
            results_limit: config.scrape_results_limit,
        }
    }

    /// Overrides the dry-run simulation delays.
    #[must_use]
    pub fn with_delays(mut self, delays: DryRunDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Submits a scrape for `instagram_url` and returns the run identifier
    /// to poll with. Dry runs never leave the process.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidTarget`] if the URL is not an Instagram
    ///   profile URL.
    /// - [`ScrapeError::Provider`] if the live job could not be started.
    /// - [`ScrapeError::Db`] if the dry-run record could not be created (a
    ///   dry run with no local row would be unobservable).
    pub async fn submit(&self, instagram_url: &str, dry_run: bool) -> Result<String, ScrapeError> {
        let username = username_from_url(instagram_url)
            .ok_or_else(|| ScrapeError::InvalidTarget(instagram_url.to_owned()))?;

        if dry_run {
            return self.submit_dry_run(instagram_url).await;
        }

        let run = self
            .provider
            .start_profile_scrape(&self.profile_actor_id, &username, self.results_limit)
            .await?;

        tracing::info!(run_id = %run.id, %username, "started live scrape run");

        // The job is already running provider-side. A mirror write failure
        // must not fail the submission; a later status poll re-creates the row.
        if let Err(err) = reachdb_db::create_scrape_run(
            &self.pool,
            &run.id,
            Some(&self.profile_actor_id),
            false,
            Some(instagram_url),
        )
        .await
        {
            tracing::warn!(run_id = %run.id, error = %err, "failed to record live scrape run");
        }

        Ok(run.id)
    }

    async fn submit_dry_run(&self, instagram_url: &str) -> Result<String, ScrapeError> {
        let run_id = format!("{DRY_RUN_PREFIX}{}", Utc::now().timestamp_millis());
        reachdb_db::create_scrape_run(&self.pool, &run_id, None, true, Some(instagram_url))
            .await?;

        tracing::info!(run_id = %run_id, "created dry run, scheduling simulated transitions");

        let pool = self.pool.clone();
        let delays = self.delays;
        let id = run_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delays.to_running).await;
            if let Err(err) = reachdb_db::mark_dry_run_running(&pool, &id).await {
                tracing::warn!(run_id = %id, error = %err, "dry-run RUNNING transition skipped");
                return;
            }
            tokio::time::sleep(delays.to_succeeded).await;
            if let Err(err) = reachdb_db::mark_dry_run_succeeded(&pool, &id, 1).await {
                tracing::warn!(run_id = %id, error = %err, "dry-run SUCCEEDED transition skipped");
            }
        });

        Ok(run_id)
    }

    /// Returns the current status of a run.
    ///
    /// Dry runs are read from the local log verbatim. Live runs are polled
    /// at the provider and the local mirror is upserted with the reported
    /// state, so a row lost locally heals on the next poll.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::NotFound`] if the run is unknown.
    /// - [`ScrapeError::Provider`] if the provider call failed.
    pub async fn get_status(&self, run_id: &str) -> Result<RunStatusView, ScrapeError> {
        if run_id.starts_with(DRY_RUN_PREFIX) {
            let row = reachdb_db::get_scrape_run(&self.pool, run_id).await?;
            return Ok(row.into());
        }

        let run = self.provider.fetch_run(run_id).await?;
        Ok(self.mirror_provider_run(&run).await)
    }

    /// Returns the normalized result of a completed run.
    ///
    /// For dry runs this is the canned profile. For live runs the dataset is
    /// fetched and the first item normalized; an empty dataset is a "no
    /// data" result, not an error. Contact-email discovery runs as a second
    /// provider call whose failure is swallowed: partial success beats total
    /// failure.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::NotFound`] if the run is unknown.
    /// - [`ScrapeError::InvalidState`] if the run has not succeeded yet.
    /// - [`ScrapeError::Provider`] if the dataset fetch failed.
    pub async fn get_results(&self, run_id: &str) -> Result<ScrapeResult, ScrapeError> {
        if run_id.starts_with(DRY_RUN_PREFIX) {
            let row = reachdb_db::get_scrape_run(&self.pool, run_id).await?;
            if RunStatus::parse(&row.status) != Some(RunStatus::Succeeded) {
                return Err(ScrapeError::InvalidState { status: row.status });
            }
            return Ok(ScrapeResult::found(canned_dry_run_profile()));
        }

        let run = self.provider.fetch_run(run_id).await?;
        if RunStatus::parse(&run.status) != Some(RunStatus::Succeeded) {
            return Err(ScrapeError::InvalidState {
                status: run.status.clone(),
            });
        }

        let Some(dataset_id) = run.default_dataset_id.as_deref() else {
            return Ok(ScrapeResult::empty());
        };
        let items = self.provider.fetch_dataset_items(dataset_id).await?;

        self.mirror_provider_run_with_count(&run, i32::try_from(items.len()).unwrap_or(i32::MAX))
            .await;

        let Some(first) = items.first() else {
            return Ok(ScrapeResult::empty());
        };

        let mut profile = normalize_profile(first);
        let profile_url = profile.url.clone().unwrap_or_else(|| {
            format!("https://www.instagram.com/{}/", profile.username)
        });

        let emails = match self
            .provider
            .discover_emails(&self.email_actor_id, &profile_url)
            .await
        {
            Ok(found) => dedup_emails(found),
            Err(err) => {
                tracing::warn!(run_id, error = %err, "email discovery failed, continuing without");
                Vec::new()
            }
        };
        profile.emails = emails;

        Ok(ScrapeResult::found(profile))
    }

    /// Refreshes the local mirror for live runs that are neither terminal
    /// nor recently updated. Returns how many rows were refreshed.
    ///
    /// Used by the background poller; per-run failures are logged and do not
    /// stop the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Db`] if the stale-run listing itself fails.
    pub async fn refresh_stale_runs(&self, older_than_secs: f64) -> Result<usize, ScrapeError> {
        let stale = reachdb_db::list_stale_live_runs(&self.pool, older_than_secs).await?;
        let mut refreshed = 0;
        for row in stale {
            match self.provider.fetch_run(&row.run_id).await {
                Ok(run) => {
                    self.mirror_provider_run(&run).await;
                    refreshed += 1;
                }
                Err(ProviderError::NotFound) => {
                    tracing::warn!(run_id = %row.run_id, "provider no longer knows this run");
                }
                Err(err) => {
                    tracing::warn!(run_id = %row.run_id, error = %err, "stale-run refresh failed");
                }
            }
        }
        Ok(refreshed)
    }

    async fn mirror_provider_run(&self, run: &ActorRun) -> RunStatusView {
        self.mirror(run, None).await
    }

    async fn mirror_provider_run_with_count(
        &self,
        run: &ActorRun,
        results_count: i32,
    ) -> RunStatusView {
        self.mirror(run, Some(results_count)).await
    }

    /// Upserts provider-reported state into the run log and returns the
    /// merged view. A write failure degrades to the provider snapshot.
    async fn mirror(&self, run: &ActorRun, results_count: Option<i32>) -> RunStatusView {
        let mirror = ScrapeRunMirror {
            run_id: &run.id,
            actor_id: run.actor_id.as_deref(),
            status: &run.status,
            started_at: run.started_at,
            finished_at: run.finished_at,
            status_message: run.status_message.as_deref(),
            results_count,
        };
        match reachdb_db::mirror_scrape_run(&self.pool, &mirror).await {
            Ok(row) => row.into(),
            Err(err) => {
                tracing::warn!(run_id = %run.id, error = %err, "run-log mirror write failed");
                RunStatusView::from_provider(run)
            }
        }
    }
}
