mod scrape;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use reachdb_scrape::{ApifyProvider, ScrapeRunner};

#[derive(Debug, Parser)]
#[command(name = "reachdb-cli")]
#[command(about = "ReachDB command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a profile scrape and print the run id.
    Scrape {
        /// Instagram profile URL to scrape.
        url: String,
        /// Simulate the run locally instead of calling the provider.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the current status of a scrape run.
    Status { run_id: String },
    /// Print the normalized result of a completed scrape run.
    Results { run_id: String },
    /// List recent scrape runs from the local log.
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// List active influencers.
    Influencers {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Run pending database migrations.
    Migrate,
    /// Insert demo influencers and a demo campaign.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = reachdb_core::load_app_config()?;
    let pool_config = reachdb_db::PoolConfig::from_app_config(&config);
    let pool = reachdb_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Scrape { url, dry_run } => {
            let runner = build_runner(pool, &config)?;
            scrape::run_scrape(&runner, &url, dry_run).await?;
        }
        Commands::Status { run_id } => {
            let runner = build_runner(pool, &config)?;
            scrape::run_status(&runner, &run_id).await?;
        }
        Commands::Results { run_id } => {
            let runner = build_runner(pool, &config)?;
            scrape::run_results(&runner, &run_id).await?;
        }
        Commands::Runs { limit } => scrape::run_list(&pool, limit).await?,
        Commands::Influencers { limit } => list_influencers(&pool, limit).await?,
        Commands::Migrate => {
            let applied = reachdb_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Seed => {
            let count = reachdb_db::seed_demo_data(&pool).await?;
            println!("seeded {count} demo influencer(s) and the demo campaign");
        }
    }

    Ok(())
}

async fn list_influencers(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let rows = reachdb_db::list_influencers(pool, limit.clamp(1, 200)).await?;
    if rows.is_empty() {
        println!("no influencers recorded");
        return Ok(());
    }
    for row in rows {
        println!(
            "{:<38} {:<30} {:>9}  {}",
            row.public_id,
            row.name,
            row.followers_count
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            row.email,
        );
    }
    Ok(())
}

fn build_runner(
    pool: sqlx::PgPool,
    config: &reachdb_core::AppConfig,
) -> anyhow::Result<ScrapeRunner> {
    let token = config.apify_token.clone().unwrap_or_default();
    if token.is_empty() {
        tracing::warn!("APIFY_TOKEN not set; only dry-run scrapes will work");
    }
    let client = reachdb_apify::ApifyClient::with_base_url(
        &token,
        config.apify_timeout_secs,
        &config.apify_base_url,
    )?
    .with_retry_policy(config.apify_max_retries, config.apify_retry_backoff_base_ms);

    Ok(ScrapeRunner::new(
        pool,
        Arc::new(ApifyProvider::new(client)),
        config,
    ))
}
