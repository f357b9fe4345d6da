use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub apify_token: Option<String>,
    pub apify_base_url: String,
    pub apify_timeout_secs: u64,
    pub apify_max_retries: u32,
    pub apify_retry_backoff_base_ms: u64,
    pub profile_actor_id: String,
    pub email_actor_id: String,
    pub scrape_results_limit: u32,
    pub dry_run_to_running_ms: u64,
    pub dry_run_to_succeeded_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("apify_token", &self.apify_token.as_ref().map(|_| "[redacted]"))
            .field("apify_base_url", &self.apify_base_url)
            .field("apify_timeout_secs", &self.apify_timeout_secs)
            .field("apify_max_retries", &self.apify_max_retries)
            .field(
                "apify_retry_backoff_base_ms",
                &self.apify_retry_backoff_base_ms,
            )
            .field("profile_actor_id", &self.profile_actor_id)
            .field("email_actor_id", &self.email_actor_id)
            .field("scrape_results_limit", &self.scrape_results_limit)
            .field("dry_run_to_running_ms", &self.dry_run_to_running_ms)
            .field("dry_run_to_succeeded_ms", &self.dry_run_to_succeeded_ms)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
