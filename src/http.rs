//! Shared HTTP client construction for the external APIs.

use crate::error::{Result, SokordError};
use std::time::Duration;

/// Default User-Agent for outbound requests.
pub const DEFAULT_USER_AGENT: &str = concat!("sokord/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] with a per-request timeout and User-Agent.
///
/// # Errors
///
/// Returns [`SokordError::Config`] if the client cannot be constructed.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SokordError::Config(format!("failed to build HTTP client: {e}")))
}

/// Truncate a response body for inclusion in an error message.
pub(crate) fn body_excerpt(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
