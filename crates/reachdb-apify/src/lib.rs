//! Pure Apify REST API client.
//!
//! Wraps the Apify v2 actor-execution endpoints the scrape orchestrator
//! needs: start an actor run, fetch run metadata, fetch dataset items, and
//! run an actor synchronously for small side lookups. Knows nothing about
//! run logs or persistence.

mod client;
mod error;
mod retry;
mod types;

pub use client::ApifyClient;
pub use error::ApifyError;
pub use types::{ActorRun, ContactScraperInput, ProfileScraperInput, StartUrl};
