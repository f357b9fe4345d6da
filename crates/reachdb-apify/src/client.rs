//! HTTP client for the Apify v2 REST API.
//!
//! Wraps `reqwest` with bearer-token auth, typed response deserialization,
//! and retry-with-backoff on transient failures for idempotent reads. Run
//! starts are never retried: a duplicate POST would launch a second billable
//! actor run.

use std::time::Duration;

use serde::Serialize;

use crate::error::ApifyError;
use crate::retry::retry_with_backoff;
use crate::types::{ActorRun, ApiEnvelope};

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Client for the Apify v2 REST API.
///
/// Use [`ApifyClient::new`] for production or [`ApifyClient::with_base_url`]
/// to point at a mock server in tests.
pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ApifyClient {
    /// Creates a new client pointed at the production Apify API.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ApifyError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ApifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("reachdb/0.1 (campaign-crm)")
            .build()?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy (attempts beyond the first, base delay).
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Starts an actor run and returns immediately with the run metadata.
    ///
    /// Not retried: the POST is not idempotent.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::Api`] on a non-2xx response.
    /// - [`ApifyError::Http`] on network failure.
    /// - [`ApifyError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn start_actor_run<I: Serialize + Sync>(
        &self,
        actor_id: &str,
        input: &I,
    ) -> Result<ActorRun, ApifyError> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;
        let body = Self::read_success_body(response).await?;

        let envelope: ApiEnvelope<ActorRun> =
            serde_json::from_str(&body).map_err(|e| ApifyError::Deserialize {
                context: format!("startActorRun(actor={actor_id})"),
                source: e,
            })?;

        Ok(envelope.data)
    }

    /// Fetches the current metadata snapshot for a run.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::Api`] on a non-2xx response (404 when the run id is
    ///   unknown; see [`ApifyError::is_not_found`]).
    /// - [`ApifyError::Http`] on network failure.
    /// - [`ApifyError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn get_run(&self, run_id: &str) -> Result<ActorRun, ApifyError> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
            Self::read_success_body(response).await
        })
        .await?;

        let envelope: ApiEnvelope<ActorRun> =
            serde_json::from_str(&body).map_err(|e| ApifyError::Deserialize {
                context: format!("getRun(id={run_id})"),
                source: e,
            })?;

        Ok(envelope.data)
    }

    /// Fetches all items of a dataset as raw JSON values.
    ///
    /// The item schema varies between actor versions, so no typed
    /// deserialization happens here; normalization is the caller's concern.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::Api`] on a non-2xx response.
    /// - [`ApifyError::Http`] on network failure.
    /// - [`ApifyError::Deserialize`] if the body is not a JSON array.
    pub async fn get_dataset_items(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<serde_json::Value>, ApifyError> {
        let url = format!("{}/datasets/{}/items?format=json", self.base_url, dataset_id);
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
            Self::read_success_body(response).await
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| ApifyError::Deserialize {
            context: format!("getDatasetItems(id={dataset_id})"),
            source: e,
        })
    }

    /// Runs an actor synchronously and returns its dataset items.
    ///
    /// Used for small side lookups (contact discovery) where waiting for the
    /// actor inline is cheaper than a start/poll/fetch cycle. Not retried:
    /// each attempt is a fresh billable run.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::Api`] on a non-2xx response.
    /// - [`ApifyError::Http`] on network failure.
    /// - [`ApifyError::Deserialize`] if the body is not a JSON array.
    pub async fn run_actor_sync_items<I: Serialize + Sync>(
        &self,
        actor_id: &str,
        input: &I,
    ) -> Result<Vec<serde_json::Value>, ApifyError> {
        let url = format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url, actor_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;
        let body = Self::read_success_body(response).await?;

        serde_json::from_str(&body).map_err(|e| ApifyError::Deserialize {
            context: format!("runActorSyncItems(actor={actor_id})"),
            source: e,
        })
    }

    /// Asserts a 2xx status and returns the response body as text.
    ///
    /// Non-2xx responses become [`ApifyError::Api`] carrying the body, which
    /// is where Apify puts its error message.
    async fn read_success_body(response: reqwest::Response) -> Result<String, ApifyError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_url_strips_trailing_slash() {
        let client = ApifyClient::with_base_url("test-token", 30, "https://api.apify.com/v2/")
            .expect("client construction should not fail");
        assert_eq!(client.base_url, "https://api.apify.com/v2");
    }

    #[test]
    fn retry_policy_override() {
        let client = ApifyClient::new("test-token", 30)
            .expect("client construction should not fail")
            .with_retry_policy(5, 250);
        assert_eq!(client.max_retries, 5);
        assert_eq!(client.backoff_base_ms, 250);
    }
}
