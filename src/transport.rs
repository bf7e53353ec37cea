//! Network transport and validation of a single attempt.
//!
//! A [`Transport`] performs exactly one round trip for a [`WireRequest`] and
//! reports what came back, or the network failure that prevented it.
//! [`validate`] then turns that raw exchange into a typed outcome, which is
//! what the client's retry loop works with.

use crate::config::Config;
use crate::error::TransportErrorKind;
use crate::request::WireRequest;
use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use std::future::Future;
use std::io;
use std::time::Duration;

/// What a transport received for one request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The status code exactly as received. Validated by [`validate`].
    pub status: u16,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body, if any was received.
    pub body: Option<Vec<u8>>,
}

impl RawResponse {
    /// A response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body.into()),
        }
    }
}

/// Performs one network round trip.
///
/// Implementations report network-level failures as [`Error::Transport`]
/// (with the most specific [`TransportErrorKind`] they can determine) or
/// [`Error::General`]. They do not judge the status code or the body; that is
/// left to [`validate`].
///
/// # Examples
///
/// A transport that always answers with the same canned payload:
///
/// ```
/// use placefinder::{RawResponse, Result, Transport, WireRequest};
/// use std::future::Future;
///
/// struct Canned(&'static str);
///
/// impl Transport for Canned {
///     fn send(&self, _request: &WireRequest) -> impl Future<Output = Result<RawResponse>> + Send {
///         let body = self.0;
///         async move { Ok(RawResponse::new(200, body)) }
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` and waits for the response.
    fn send(&self, request: &WireRequest) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// [`Transport`] backed by a `reqwest` connection pool.
///
/// The session headers of the [`Config`] are installed once on the pool and
/// sent with every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a transport for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the underlying HTTP client
    /// cannot be created.
    pub fn new(config: &Config, timeout: Option<Duration>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .default_headers(config.session_headers().clone())
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &WireRequest) -> impl Future<Output = Result<RawResponse>> + Send {
        let mut builder = self
            .http_client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        async move {
            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(classify)?;

            Ok(RawResponse {
                status,
                headers,
                body: Some(body.to_vec()),
            })
        }
    }
}

/// Maps a `reqwest` failure onto the error taxonomy.
fn classify(error: reqwest::Error) -> Error {
    if error.is_builder() || error.is_redirect() || error.is_decode() {
        return Error::General(Box::new(error));
    }

    let kind = if error.is_timeout() {
        Some(TransportErrorKind::Timeout)
    } else if let Some(kind) = kind_from_causes(&error) {
        Some(kind)
    } else if error.is_connect() || error.is_request() || error.is_body() {
        // Connect failures without a recognised cause include TLS handshake
        // and certificate errors.
        Some(TransportErrorKind::Other)
    } else {
        None
    };

    match kind {
        Some(kind) => Error::Transport {
            kind,
            source: Box::new(error),
        },
        None => Error::General(Box::new(error)),
    }
}

/// Walks the cause chain looking for a recognisable network condition.
fn kind_from_causes(error: &(dyn std::error::Error + 'static)) -> Option<TransportErrorKind> {
    let mut current = Some(error);
    while let Some(cause) = current {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            match io_error.kind() {
                io::ErrorKind::TimedOut => return Some(TransportErrorKind::Timeout),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => {
                    return Some(TransportErrorKind::ConnectionReset)
                }
                io::ErrorKind::ConnectionRefused
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::NotConnected => {
                    return Some(TransportErrorKind::HostUnreachable)
                }
                _ => {}
            }
        }

        // hyper reports resolver failures as plain "dns error" messages.
        let message = cause.to_string();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return Some(TransportErrorKind::DnsFailure);
        }

        current = cause.source();
    }
    None
}

/// A validated, successful exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// A status in `200..=299`.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The non-empty response body.
    pub body: Vec<u8>,
}

/// Applies the response checks, in order, stopping at the first failure:
///
/// 1. transport failures pass through unchanged,
/// 2. an invalid status code is [`Error::InvalidResponseShape`],
/// 3. a status outside `200..=299` is [`Error::UnexpectedStatus`],
/// 4. a missing or empty body is [`Error::EmptyBody`].
///
/// # Examples
///
/// ```
/// use placefinder::transport::validate;
/// use placefinder::{Error, RawResponse};
///
/// let ok = validate(Ok(RawResponse::new(200, r#"{"status":"OK"}"#))).unwrap();
/// assert_eq!(ok.status.as_u16(), 200);
///
/// assert!(matches!(validate(Ok(RawResponse::new(204, ""))), Err(Error::EmptyBody)));
/// assert!(matches!(
///     validate(Ok(RawResponse::new(404, "Not found"))),
///     Err(Error::UnexpectedStatus { .. })
/// ));
/// ```
pub fn validate(result: Result<RawResponse>) -> Result<Exchange> {
    let raw = result?;

    let status = StatusCode::from_u16(raw.status).map_err(|_| Error::InvalidResponseShape)?;

    if !status.is_success() {
        let raw_response = raw.body.and_then(|body| String::from_utf8(body).ok());
        return Err(Error::UnexpectedStatus {
            status,
            raw_response,
            headers: raw.headers,
        });
    }

    match raw.body {
        Some(body) if !body.is_empty() => Ok(Exchange {
            status,
            headers: raw.headers,
            body,
        }),
        _ => Err(Error::EmptyBody),
    }
}

/// Runs one attempt: sends `request` through `transport`, validates the
/// result and logs the outcome.
pub(crate) async fn execute_once<T>(
    transport: &T,
    request: &WireRequest,
    endpoint: &'static str,
    attempt: usize,
) -> Result<Exchange>
where
    T: Transport,
{
    tracing::debug!(
        endpoint = endpoint,
        method = %request.method,
        path = %request.url.path(),
        attempt = attempt,
        "Executing HTTP request"
    );

    let outcome = validate(transport.send(request).await);

    match &outcome {
        Ok(exchange) => {
            tracing::info!(
                endpoint = endpoint,
                status = exchange.status.as_u16(),
                bytes = exchange.body.len(),
                attempt = attempt,
                "Received HTTP response"
            );
        }
        Err(Error::General(source)) => {
            tracing::error!(
                endpoint = endpoint,
                error = %source,
                attempt = attempt,
                "Request failed"
            );
        }
        Err(Error::UnexpectedStatus {
            status,
            raw_response,
            ..
        }) => {
            tracing::warn!(
                endpoint = endpoint,
                status = status.as_u16(),
                response = raw_response.as_deref().unwrap_or(""),
                attempt = attempt,
                "Unexpected HTTP status"
            );
        }
        Err(e) => {
            tracing::warn!(
                endpoint = endpoint,
                error = %e,
                retryable = e.is_retryable(),
                attempt = attempt,
                "Request failed"
            );
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_success_in_range() {
        for status in [200, 201, 299] {
            let exchange = validate(Ok(RawResponse::new(status, "{}"))).unwrap();
            assert_eq!(exchange.status.as_u16(), status);
            assert_eq!(exchange.body, b"{}");
        }
    }

    #[test]
    fn test_empty_or_missing_body() {
        assert!(matches!(
            validate(Ok(RawResponse::new(200, ""))),
            Err(Error::EmptyBody)
        ));

        let raw = RawResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: None,
        };
        assert!(matches!(validate(Ok(raw)), Err(Error::EmptyBody)));
    }

    #[test]
    fn test_unexpected_status_keeps_body_and_headers() {
        let mut raw = RawResponse::new(404, "Not found");
        raw.headers
            .insert("x-request-id", HeaderValue::from_static("abc"));

        match validate(Ok(raw)) {
            Err(Error::UnexpectedStatus {
                status,
                raw_response,
                headers,
            }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(raw_response.as_deref(), Some("Not found"));
                assert_eq!(headers.get("x-request-id").unwrap(), "abc");
            }
            other => panic!("Expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_error_body_is_dropped() {
        match validate(Ok(RawResponse::new(500, vec![0xff, 0xfe, 0x00]))) {
            Err(Error::UnexpectedStatus {
                status,
                raw_response,
                ..
            }) => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(raw_response, None);
            }
            other => panic!("Expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_non_success_checked_before_empty_body() {
        match validate(Ok(RawResponse::new(302, ""))) {
            Err(Error::UnexpectedStatus { raw_response, .. }) => {
                assert_eq!(raw_response.as_deref(), Some(""));
            }
            other => panic!("Expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_status_is_invalid_shape() {
        assert!(matches!(
            validate(Ok(RawResponse::new(1000, "{}"))),
            Err(Error::InvalidResponseShape)
        ));
        assert!(matches!(
            validate(Ok(RawResponse::new(42, "{}"))),
            Err(Error::InvalidResponseShape)
        ));
    }

    #[test]
    fn test_transport_failure_passes_through() {
        let failure = Error::from((TransportErrorKind::DnsFailure, "no such host"));
        match validate(Err(failure)) {
            Err(Error::Transport { kind, source }) => {
                assert_eq!(kind, TransportErrorKind::DnsFailure);
                assert_eq!(source.to_string(), "no such host");
            }
            other => panic!("Expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_failure_is_general() {
        let error = reqwest::Client::new().get("not a url").build().unwrap_err();
        let classified = classify(error);
        assert!(matches!(classified, Error::General(_)), "{:?}", classified);
        assert!(!classified.is_retryable());
    }

    #[test]
    fn test_kind_from_io_causes() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert_eq!(
            kind_from_causes(&reset),
            Some(TransportErrorKind::ConnectionReset)
        );

        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(
            kind_from_causes(&refused),
            Some(TransportErrorKind::HostUnreachable)
        );

        let dns = io::Error::new(io::ErrorKind::Other, "dns error: no record found");
        assert_eq!(kind_from_causes(&dns), Some(TransportErrorKind::DnsFailure));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(kind_from_causes(&denied), None);
    }
}
