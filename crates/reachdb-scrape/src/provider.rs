//! Provider seam between the orchestrator and the Apify client.
//!
//! The orchestrator depends on this trait rather than on `ApifyClient`
//! directly so tests can substitute a scripted provider and so a different
//! scrape vendor could be wired in without touching run-lifecycle logic.

use async_trait::async_trait;
use reachdb_apify::{ActorRun, ApifyClient, ApifyError, ContactScraperInput, ProfileScraperInput, StartUrl};
use thiserror::Error;

/// Errors a scrape provider can report.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no job for the given identifier.
    #[error("provider reports no such job")]
    NotFound,

    /// Any other provider failure: connectivity, auth, malformed response.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Outbound scrape operations the orchestrator needs.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    /// Starts a profile-scrape job for `username` and returns the provider's
    /// run metadata, including the run identifier used for all later polling.
    async fn start_profile_scrape(
        &self,
        actor_id: &str,
        username: &str,
        results_limit: u32,
    ) -> Result<ActorRun, ProviderError>;

    /// Fetches the current metadata snapshot for a run.
    async fn fetch_run(&self, run_id: &str) -> Result<ActorRun, ProviderError>;

    /// Fetches the raw items of a run's default dataset.
    async fn fetch_dataset_items(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<serde_json::Value>, ProviderError>;

    /// Runs the contact-discovery actor against `profile_url` and returns
    /// whatever email addresses it finds, possibly with duplicates.
    async fn discover_emails(
        &self,
        actor_id: &str,
        profile_url: &str,
    ) -> Result<Vec<String>, ProviderError>;
}

fn map_err(err: ApifyError) -> ProviderError {
    if err.is_not_found() {
        ProviderError::NotFound
    } else {
        ProviderError::Unavailable(err.to_string())
    }
}

/// [`ScrapeProvider`] backed by the real Apify API.
pub struct ApifyProvider {
    client: ApifyClient,
}

impl ApifyProvider {
    #[must_use]
    pub fn new(client: ApifyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScrapeProvider for ApifyProvider {
    async fn start_profile_scrape(
        &self,
        actor_id: &str,
        username: &str,
        results_limit: u32,
    ) -> Result<ActorRun, ProviderError> {
        let input = ProfileScraperInput {
            usernames: vec![username.to_owned()],
            results_limit,
        };
        self.client
            .start_actor_run(actor_id, &input)
            .await
            .map_err(map_err)
    }

    async fn fetch_run(&self, run_id: &str) -> Result<ActorRun, ProviderError> {
        self.client.get_run(run_id).await.map_err(map_err)
    }

    async fn fetch_dataset_items(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<serde_json::Value>, ProviderError> {
        self.client
            .get_dataset_items(dataset_id)
            .await
            .map_err(map_err)
    }

    async fn discover_emails(
        &self,
        actor_id: &str,
        profile_url: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let input = ContactScraperInput {
            start_urls: vec![StartUrl {
                url: profile_url.to_owned(),
            }],
            max_requests_per_start_url: 1,
        };
        let items = self
            .client
            .run_actor_sync_items(actor_id, &input)
            .await
            .map_err(map_err)?;

        // Each item carries an `emails` array; non-string entries are skipped.
        let emails = items
            .iter()
            .filter_map(|item| item.get("emails").and_then(serde_json::Value::as_array))
            .flatten()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();

        Ok(emails)
    }
}
