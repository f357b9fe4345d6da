use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses: every object endpoint nests the payload
/// under `data`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub data: T,
}

/// Actor run metadata as reported by `GET /actor-runs/{id}` and run-start
/// responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRun {
    pub id: String,
    /// Provider status string, e.g. `READY`, `RUNNING`, `SUCCEEDED`,
    /// `TIMED-OUT`. Kept as a string; interpretation happens upstream.
    pub status: String,
    #[serde(rename = "actId")]
    pub actor_id: Option<String>,
    #[serde(rename = "statusMessage")]
    pub status_message: Option<String>,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: Option<String>,
}

/// Input for the Instagram profile scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileScraperInput {
    pub usernames: Vec<String>,
    #[serde(rename = "resultsLimit")]
    pub results_limit: u32,
}

/// A start URL entry used by URL-driven actor inputs.
#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

/// Input for the contact-discovery actor that extracts emails from a
/// profile page.
#[derive(Debug, Clone, Serialize)]
pub struct ContactScraperInput {
    #[serde(rename = "startUrls")]
    pub start_urls: Vec<StartUrl>,
    #[serde(rename = "maxRequestsPerStartUrl")]
    pub max_requests_per_start_url: u32,
}
