//! Background job scheduler.
//!
//! Registers a recurring job that refreshes the local run-log mirror for
//! live scrape runs that have gone stale (non-terminal and not recently
//! updated), so a run finished provider-side is eventually reflected
//! locally even if nobody polls it.

use reachdb_scrape::ScrapeRunner;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// A live run counts as stale once its mirror row is this old.
const STALE_AFTER_SECS: f64 = 60.0;

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(runner: ScrapeRunner) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    // Every minute, on the minute.
    let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let runner = runner.clone();
        Box::pin(async move {
            match runner.refresh_stale_runs(STALE_AFTER_SECS).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(refreshed = n, "scheduler: refreshed stale scrape runs"),
                Err(e) => tracing::error!(error = %e, "scheduler: stale-run refresh failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
