mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use reachdb_scrape::{ApifyProvider, ScrapeRunner};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(reachdb_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = reachdb_db::PoolConfig::from_app_config(&config);
    let pool = reachdb_db::connect_pool(&config.database_url, pool_config).await?;
    reachdb_db::run_migrations(&pool).await?;

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
    let runner = ScrapeRunner::new(pool.clone(), Arc::new(ApifyProvider::new(client)), &config);

    let _scheduler = scheduler::build_scheduler(runner.clone()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        reachdb_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            runner: Arc::new(runner),
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
