//! Status codes embedded in Places API payloads and their human-readable messages.
//!
//! Every Places response carries a `status` field next to its results. The
//! [`ApiStatus`] enum models the documented codes, and [`StatusMessages`] maps
//! each code to a message suitable for showing to a user. The message table is
//! an ordinary value: build one per language and hand it to the client builder
//! or to [`Error::description`](crate::Error::description).

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Possible values of the `status` field in Places API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    /// No errors occurred and at least one result was returned.
    Ok,
    /// The request was valid but returned no results.
    ZeroResults,
    /// The API key is over its quota.
    OverQueryLimit,
    /// The request was denied, usually because of an invalid API key.
    RequestDenied,
    /// A required parameter is missing or malformed.
    InvalidRequest,
    /// A server-side error; trying again may succeed.
    UnknownError,
}

impl ApiStatus {
    /// All statuses, in the order they are documented by the API.
    pub const ALL: [ApiStatus; 6] = [
        ApiStatus::Ok,
        ApiStatus::ZeroResults,
        ApiStatus::OverQueryLimit,
        ApiStatus::RequestDenied,
        ApiStatus::InvalidRequest,
        ApiStatus::UnknownError,
    ];

    /// Returns the wire code, e.g. `"OVER_QUERY_LIMIT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStatus::Ok => "OK",
            ApiStatus::ZeroResults => "ZERO_RESULTS",
            ApiStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            ApiStatus::RequestDenied => "REQUEST_DENIED",
            ApiStatus::InvalidRequest => "INVALID_REQUEST",
            ApiStatus::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Returns `true` if the payload should be decoded as a regular result.
    ///
    /// `ZERO_RESULTS` counts as successful: the request was fine, there is
    /// simply nothing to show.
    pub fn is_success(&self) -> bool {
        matches!(self, ApiStatus::Ok | ApiStatus::ZeroResults)
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised Places API status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ApiStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ApiStatus {
    // Codes added to the API after this enum was written are treated as
    // `UNKNOWN_ERROR` rather than failing the whole payload.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(code.parse().unwrap_or(ApiStatus::UnknownError))
    }
}

/// Lookup table from [`ApiStatus`] to a human-readable message.
///
/// # Examples
///
/// ```
/// use placefinder::{ApiStatus, StatusMessages};
///
/// let english = StatusMessages::default();
/// assert_eq!(english.message(ApiStatus::OverQueryLimit), "Too many requests.");
///
/// let french = StatusMessages::default()
///     .with_message(ApiStatus::ZeroResults, "Aucun résultat.");
/// assert_eq!(french.message(ApiStatus::ZeroResults), "Aucun résultat.");
/// ```
#[derive(Debug, Clone)]
pub struct StatusMessages {
    messages: HashMap<ApiStatus, String>,
}

impl StatusMessages {
    /// Creates a table from explicit entries. Missing statuses fall back to
    /// their wire code.
    pub fn from_entries(entries: impl IntoIterator<Item = (ApiStatus, String)>) -> Self {
        Self {
            messages: entries.into_iter().collect(),
        }
    }

    /// Replaces the message for one status.
    pub fn with_message(mut self, status: ApiStatus, message: impl Into<String>) -> Self {
        self.messages.insert(status, message.into());
        self
    }

    /// Returns the message for `status`.
    pub fn message(&self, status: ApiStatus) -> &str {
        self.messages
            .get(&status)
            .map(String::as_str)
            .unwrap_or_else(|| status.as_str())
    }
}

impl Default for StatusMessages {
    fn default() -> Self {
        Self::from_entries([
            (ApiStatus::Ok, "OK".to_string()),
            (ApiStatus::ZeroResults, "No results.".to_string()),
            (ApiStatus::OverQueryLimit, "Too many requests.".to_string()),
            (ApiStatus::RequestDenied, "Unsupported request.".to_string()),
            (ApiStatus::InvalidRequest, "Malformed request.".to_string()),
            (ApiStatus::UnknownError, "Unknown error.".to_string()),
        ])
    }
}
