//! Normalization of raw provider payloads into [`ProfileRecord`]s.
//!
//! Actor versions disagree on field names (`username` vs `ownerUsername`,
//! `biography` vs `bio`, ...), so every field is resolved through a fixed
//! alias priority list: the first alias with a non-empty value wins.

use reachdb_core::ProfileRecord;
use serde_json::Value;

const USERNAME_ALIASES: &[&str] = &["username", "ownerUsername"];
const FULL_NAME_ALIASES: &[&str] = &["fullName", "ownerFullName"];
const BIOGRAPHY_ALIASES: &[&str] = &["biography", "bio"];
const FOLLOWERS_ALIASES: &[&str] = &["followersCount", "followers"];
const AVATAR_ALIASES: &[&str] = &["profilePicUrlHD", "profilePicUrl"];
const URL_ALIASES: &[&str] = &["url", "inputUrl"];

fn string_field(item: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

fn int_field(item: &Value, aliases: &[&str]) -> Option<i64> {
    aliases
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_i64))
}

/// Builds a normalized profile from one raw dataset item.
///
/// Missing fields stay `None`; a payload with no recognizable handle yields
/// an empty username rather than an error, since partial data is still worth
/// returning to the caller.
#[must_use]
pub fn normalize_profile(item: &Value) -> ProfileRecord {
    ProfileRecord {
        username: string_field(item, USERNAME_ALIASES).unwrap_or_default(),
        full_name: string_field(item, FULL_NAME_ALIASES),
        biography: string_field(item, BIOGRAPHY_ALIASES),
        followers_count: int_field(item, FOLLOWERS_ALIASES),
        profile_pic_url: string_field(item, AVATAR_ALIASES),
        url: string_field(item, URL_ALIASES),
        emails: Vec::new(),
    }
}

/// Deduplicates email addresses, keeping the first occurrence of each.
///
/// Comparison is case-insensitive on the trimmed address; the casing of the
/// first occurrence is preserved. Empty entries are dropped.
#[must_use]
pub fn dedup_emails(emails: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for email in emails {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_owned());
        }
    }
    out
}

/// Extracts the profile handle from an Instagram profile URL.
///
/// Accepts `http(s)://[www.]instagram.com/<handle>[/...]` and returns `None`
/// for anything else; callers treat `None` as a validation failure.
#[must_use]
pub fn username_from_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = rest.split_once('/')?;
    let host = host.to_lowercase();
    if host != "instagram.com" && host != "www.instagram.com" {
        return None;
    }
    let handle = path
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .trim_start_matches('@');
    if handle.is_empty()
        || !handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
    {
        return None;
    }
    Some(handle.to_owned())
}

/// The fixed profile returned for completed dry runs.
///
/// Stable contents so demos and downstream consumers can assert against it
/// without live provider credentials.
#[must_use]
pub fn canned_dry_run_profile() -> ProfileRecord {
    ProfileRecord {
        username: "dry_run_profile".to_owned(),
        full_name: Some("Dry Run Profile".to_owned()),
        biography: Some("Simulated profile returned by dry-run scrapes.".to_owned()),
        followers_count: Some(12_345),
        profile_pic_url: Some("https://example.com/dry-run-avatar.jpg".to_owned()),
        url: Some("https://www.instagram.com/dry_run_profile/".to_owned()),
        emails: vec![
            "contact@dryrun.example".to_owned(),
            "partnerships@dryrun.example".to_owned(),
        ],
    }
}
