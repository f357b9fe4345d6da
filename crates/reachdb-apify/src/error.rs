use thiserror::Error;

/// Errors returned by the Apify API client.
#[derive(Debug, Error)]
pub enum ApifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Apify API returned a non-2xx status with a response body.
    #[error("Apify API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApifyError {
    /// Returns `true` if the provider reported the resource as unknown.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApifyError::Api { status: 404, .. })
    }
}
