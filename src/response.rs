//! Successful call results together with details of the HTTP exchange.

use http::{HeaderMap, StatusCode};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// The successful outcome of a call.
///
/// Calls made through [`Client::execute`](crate::Client::execute) yield a
/// `Response<Arc<[u8]>>` whose data is the raw body itself, shared with
/// `raw_body` rather than copied. The typed helpers map that into a decoded
/// payload while keeping the metadata.
///
/// # Examples
///
/// ```no_run
/// use placefinder::{Client, PlaceType};
///
/// # async fn example() -> Result<(), placefinder::Error> {
/// let client = Client::builder().api_key("my-key").build()?;
///
/// let response = client
///     .autocomplete("Paris", &[], PlaceType::Cities, "session-1")
///     .await?;
///
/// for prediction in &response.predictions {
///     println!("{}", prediction.description);
/// }
/// println!("Took {:?} over {} attempt(s)", response.latency, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The response data.
    pub data: T,

    /// The raw response body.
    pub raw_body: Arc<[u8]>,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from the first attempt until the response was received, retries included.
    pub latency: Duration,

    /// The number of transport attempts made, `1` if no retry was needed.
    pub attempts: usize,
}

impl Response<Arc<[u8]>> {
    /// Wraps a raw body as a response whose data is the body itself.
    pub fn raw(
        body: Vec<u8>,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        let body: Arc<[u8]> = body.into();
        Self {
            data: Arc::clone(&body),
            raw_body: body,
            status,
            headers,
            latency,
            attempts,
        }
    }
}

impl<T> Response<T> {
    /// Maps the response data to a different type, preserving the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use placefinder::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::raw(
    ///     b"42".to_vec(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let length = response.map(|body| body.len());
    /// assert_eq!(length.data, 2);
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Like [`Response::map`], for conversions that can fail.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Response<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        let data = f(self.data)?;
        Ok(Response {
            data,
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        })
    }

    /// Returns `true` if the call needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// The raw body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_body)
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
