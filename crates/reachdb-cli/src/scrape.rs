//! Scrape command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established; user-facing output goes to stdout, diagnostics to tracing.

use reachdb_scrape::ScrapeRunner;

/// Submit a scrape and print the run id to poll with.
pub(crate) async fn run_scrape(
    runner: &ScrapeRunner,
    url: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let run_id = runner.submit(url, dry_run).await?;
    if dry_run {
        println!("dry run started: {run_id}");
        println!("poll with: reachdb-cli status {run_id}");
    } else {
        println!("scrape run started: {run_id}");
    }
    Ok(())
}

/// Print the current status of a run.
pub(crate) async fn run_status(runner: &ScrapeRunner, run_id: &str) -> anyhow::Result<()> {
    let status = runner.get_status(run_id).await?;
    println!("run:            {}", status.run_id);
    println!("status:         {}", status.status);
    println!("dry run:        {}", status.is_dry_run);
    println!("results:        {}", status.results_count);
    if let Some(started) = status.started_at {
        println!("started:        {started}");
    }
    if let Some(finished) = status.finished_at {
        println!("finished:       {finished}");
    }
    if let Some(message) = &status.status_message {
        println!("message:        {message}");
    }
    Ok(())
}

/// Print the normalized result of a completed run as pretty JSON.
pub(crate) async fn run_results(runner: &ScrapeRunner, run_id: &str) -> anyhow::Result<()> {
    let result = runner.get_results(run_id).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// List recent runs from the local log.
pub(crate) async fn run_list(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let rows = reachdb_db::list_scrape_runs(pool, limit.clamp(1, 200)).await?;
    if rows.is_empty() {
        println!("no scrape runs recorded");
        return Ok(());
    }
    for row in rows {
        let kind = if row.is_dry_run { "dry" } else { "live" };
        println!(
            "{:<28} {:<10} {:>4} {:>8}  {}",
            row.run_id,
            row.status,
            kind,
            row.results_count,
            row.target_url.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
