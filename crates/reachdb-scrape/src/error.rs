use reachdb_db::DbError;
use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced by the scrape-run orchestrator.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No run exists for the given identifier, locally or at the provider.
    #[error("scrape run not found")]
    NotFound,

    /// Results were requested before the run completed.
    #[error("scrape run is not complete (status: {status})")]
    InvalidState { status: String },

    /// The submitted target is not a usable Instagram profile URL.
    #[error("invalid scrape target: {0}")]
    InvalidTarget(String),

    /// The provider call failed; the underlying cause is logged server-side.
    #[error("provider request failed: {0}")]
    Provider(String),

    /// A run-log read or write failed in a way the orchestrator cannot paper
    /// over.
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for ScrapeError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ScrapeError::NotFound,
            DbError::InvalidScrapeRunTransition {
                expected_status, ..
            } => ScrapeError::InvalidState {
                status: format!("expected {expected_status}"),
            },
            other => ScrapeError::Db(other),
        }
    }
}

impl From<ProviderError> for ScrapeError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => ScrapeError::NotFound,
            ProviderError::Unavailable(message) => ScrapeError::Provider(message),
        }
    }
}
