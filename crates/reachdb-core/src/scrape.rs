//! Shared scrape-run types: lifecycle status, normalized profile output.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a scrape run.
///
/// Mirrors the provider's reported statuses. `Ready` is an
/// accepted-but-not-started state some actors report before `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Created,
    Ready,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
}

impl RunStatus {
    /// The provider's wire representation, also used as the stored value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Created => "CREATED",
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Aborted => "ABORTED",
        }
    }

    /// Parses a provider-reported status string.
    ///
    /// Accepts both `TIMED-OUT` (what the provider sends) and `TIMED_OUT`.
    /// Returns `None` for anything unrecognized so callers can decide how to
    /// treat new provider statuses rather than failing hard.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(RunStatus::Created),
            "READY" => Some(RunStatus::Ready),
            "RUNNING" => Some(RunStatus::Running),
            "SUCCEEDED" => Some(RunStatus::Succeeded),
            "FAILED" => Some(RunStatus::Failed),
            "TIMED-OUT" | "TIMED_OUT" => Some(RunStatus::TimedOut),
            "ABORTED" => Some(RunStatus::Aborted),
            _ => None,
        }
    }

    /// Terminal statuses never transition to anything else.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::TimedOut | RunStatus::Aborted
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if a stored status string denotes a terminal run.
///
/// Unknown strings are treated as non-terminal: a status this code does not
/// recognize must never block a later provider-reported transition.
#[must_use]
pub fn is_terminal_status(s: &str) -> bool {
    RunStatus::parse(s).is_some_and(RunStatus::is_terminal)
}

/// Normalized Instagram profile, independent of the provider's raw schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub username: String,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub followers_count: Option<i64>,
    pub profile_pic_url: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

/// Outcome of a result-retrieval call.
///
/// Result absence is data, not a protocol error: an empty provider dataset
/// yields `success = false` with an explanatory message instead of an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub profile_data: Option<ProfileRecord>,
    pub emails: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl ScrapeResult {
    #[must_use]
    pub fn found(profile: ProfileRecord) -> Self {
        let emails = profile.emails.clone();
        Self {
            profile_data: Some(profile),
            emails,
            success: true,
            error: None,
        }
    }

    /// The "no data" result returned when a completed run produced no items.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            profile_data: None,
            emails: Vec::new(),
            success: false,
            error: Some("No profile data found".to_string()),
        }
    }
}
