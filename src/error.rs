//! Error types for Places API calls.
//!
//! Every failure a call can end with is one variant of [`Error`]. The variant
//! is decided once, where the failure is detected, and reaches the caller
//! unchanged. Only transient network failures (see [`TransportErrorKind`])
//! are retried automatically.

use crate::status::{ApiStatus, StatusMessages};
use http::{HeaderMap, StatusCode};
use std::fmt;

/// Boxed error used as the underlying cause of transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sub-classification of network-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The request did not complete in time.
    Timeout,
    /// The host could not be reached or refused the connection.
    HostUnreachable,
    /// The connection was dropped while the exchange was in progress.
    ConnectionReset,
    /// The host name could not be resolved.
    DnsFailure,
    /// Any other network-level failure (TLS, malformed request, ...).
    Other,
}

impl TransportErrorKind {
    /// Returns `true` for conditions that usually clear up by themselves.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportErrorKind::Other)
    }

    fn explanation(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "The request timed out.",
            TransportErrorKind::HostUnreachable => "Could not connect to the server.",
            TransportErrorKind::ConnectionReset => "The network connection was lost.",
            TransportErrorKind::DnsFailure => "The server's host name could not be resolved.",
            TransportErrorKind::Other => "The request could not be sent.",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::HostUnreachable => "host unreachable",
            TransportErrorKind::ConnectionReset => "connection reset",
            TransportErrorKind::DnsFailure => "DNS failure",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// The error type for Places API calls.
///
/// # Examples
///
/// ```no_run
/// use placefinder::{Client, Endpoint, Error, PlaceType};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().api_key("my-key").build()?;
/// let endpoint = Endpoint::autocomplete("Paris", PlaceType::Cities, "session-1");
///
/// match client.execute(endpoint).await {
///     Ok(response) => println!("{} bytes", response.raw_body.len()),
///     Err(Error::Exhausted { attempts, .. }) => {
///         eprintln!("Gave up after {} attempts, ask the user to try again", attempts);
///     }
///     Err(Error::UnexpectedStatus { status, raw_response, .. }) => {
///         eprintln!("HTTP {}: {:?}", status, raw_response);
///     }
///     Err(e) => eprintln!("Failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level failure. Retried when `kind` is transient.
    #[error("Transport error ({kind}): {source}")]
    Transport {
        /// What went wrong at the network layer.
        kind: TransportErrorKind,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// Any other failure of the transport layer.
    #[error("Request failed: {0}")]
    General(#[source] BoxError),

    /// Something arrived, but it was not a well-formed HTTP response.
    #[error("Response is not a valid HTTP response")]
    InvalidResponseShape,

    /// The server answered with a status outside `200..=299`.
    #[error("HTTP error {status}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body, if there was one and it was valid UTF-8.
        raw_response: Option<String>,
        /// The response headers.
        headers: HeaderMap,
    },

    /// The server answered with a success status but no body.
    #[error("Empty response body")]
    EmptyBody,

    /// The retry ceiling was reached.
    ///
    /// Raised after the attempt that used up the last retry, whatever that
    /// attempt returned.
    #[error("Gave up after {attempts} attempts")]
    Exhausted {
        /// Total number of transport attempts, including the first one.
        attempts: usize,
        /// The most recent failure of the call, kept for diagnostics. `None`
        /// only when no attempt failed.
        last_error: Option<Box<Error>>,
    },

    /// The payload did not match the expected schema.
    #[error("Failed to decode response: {message}")]
    Decoding {
        /// The decoder's message.
        message: String,
        /// The payload that failed to decode.
        raw_response: String,
    },

    /// The payload's own `status` field reported a failure.
    #[error("Places API returned {status}")]
    ApiStatus {
        /// The reported status.
        status: ApiStatus,
        /// The payload's `error_message`, if any.
        message: Option<String>,
    },

    /// Invalid configuration was supplied to the client builder.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was supplied to the client builder.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if the failure is worth re-attempting without caller
    /// intervention.
    ///
    /// Only transport failures with a transient [`TransportErrorKind`]
    /// qualify. Everything else, including [`Error::Exhausted`], is final.
    ///
    /// # Examples
    ///
    /// ```
    /// use placefinder::{Error, TransportErrorKind};
    ///
    /// let reset = Error::Transport {
    ///     kind: TransportErrorKind::ConnectionReset,
    ///     source: "connection reset by peer".into(),
    /// };
    /// assert!(reset.is_retryable());
    ///
    /// let tls = Error::Transport {
    ///     kind: TransportErrorKind::Other,
    ///     source: "invalid certificate".into(),
    /// };
    /// assert!(!tls.is_retryable());
    /// assert!(!Error::EmptyBody.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { kind, .. } => kind.is_transient(),
            Error::General(_)
            | Error::InvalidResponseShape
            | Error::UnexpectedStatus { .. }
            | Error::EmptyBody
            | Error::Exhausted { .. }
            | Error::Decoding { .. }
            | Error::ApiStatus { .. }
            | Error::ConfigurationError(_)
            | Error::InvalidUrl(_) => false,
        }
    }

    /// Returns the transport sub-kind, if this is a transport failure.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Error::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::UnexpectedStatus { raw_response, .. } => raw_response.as_deref(),
            Error::Decoding { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// A short, human-readable description of the failure.
    ///
    /// API status failures are described through `messages`, so the text
    /// follows whichever language table the caller passes in.
    pub fn description(&self, messages: &StatusMessages) -> Option<String> {
        match self {
            Error::Transport { source, .. } => Some(source.to_string()),
            Error::General(source) => Some(source.to_string()),
            Error::Decoding { message, .. } => Some(message.clone()),
            Error::ApiStatus { status, .. } => Some(messages.message(*status).to_string()),
            Error::Exhausted { .. } => Some("Bad network conditions".to_string()),
            Error::InvalidResponseShape
            | Error::UnexpectedStatus { .. }
            | Error::EmptyBody
            | Error::ConfigurationError(_)
            | Error::InvalidUrl(_) => None,
        }
    }

    /// Explains why the failure happened, complementing [`Error::description`].
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Error::Transport { kind, .. } => Some(kind.explanation().to_string()),
            Error::General(source) => source.source().map(|cause| cause.to_string()),
            Error::InvalidResponseShape => Some("Response is not HTTP response.".to_string()),
            Error::UnexpectedStatus { .. } => Some("Unexpected response contents.".to_string()),
            Error::EmptyBody => Some("Empty response body.".to_string()),
            Error::Exhausted { .. } => {
                Some("Multiple repeated failures to execute network request.".to_string())
            }
            Error::ApiStatus { message, .. } => message.clone(),
            Error::Decoding { .. } | Error::ConfigurationError(_) | Error::InvalidUrl(_) => None,
        }
    }
}

/// Convenience for transports that only have an error message.
impl From<(TransportErrorKind, &str)> for Error {
    fn from((kind, message): (TransportErrorKind, &str)) -> Self {
        Error::Transport {
            kind,
            source: BoxError::from(message),
        }
    }
}

/// A specialized `Result` type for Places API calls.
pub type Result<T> = std::result::Result<T, Error>;
