//! Scrape-run orchestration: dry-run/live-run lifecycle, status polling
//! against a self-healing local mirror, and result normalization.
//!
//! The [`ScrapeRunner`] is the only entry point the HTTP layer and the
//! background poller use; outbound provider calls go through the
//! [`ScrapeProvider`] seam so tests can script them.

mod error;
pub mod normalize;
mod provider;
mod runner;

pub use error::ScrapeError;
pub use provider::{ApifyProvider, ProviderError, ScrapeProvider};
pub use runner::{DryRunDelays, RunStatusView, ScrapeRunner, DRY_RUN_PREFIX};
