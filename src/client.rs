//! Places client with bounded automatic retries.
//!
//! The [`Client`] type is the entry point for making Places API calls.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::{AppIdentity, Config, Locale, DEFAULT_BASE_URL},
    endpoint::{Endpoint, PlaceType},
    models::{self, AutocompleteResponse, PlaceDetailsResponse},
    request::WireRequest,
    retry::{RetryOnRetryable, RetryPredicate, RetryStrategy},
    status::StatusMessages,
    transport::{self, HttpTransport, Transport},
    Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use url::Url;

/// A client for the Places API that retries transient network failures.
///
/// The client is cheap to clone and safe to share between tasks; every call
/// is independent and only reads the configuration fixed at construction.
///
/// # Examples
///
/// ```no_run
/// use placefinder::{Client, Endpoint, PlaceType};
///
/// # async fn example() -> Result<(), placefinder::Error> {
/// let client = Client::builder()
///     .api_key("my-key")
///     .build()?;
///
/// // Typed helper
/// let suggestions = client
///     .autocomplete("Paris", &["fr"], PlaceType::Cities, "session-1")
///     .await?;
/// let place_id = &suggestions.predictions[0].place_id;
///
/// let details = client.details(place_id, "session-1").await?;
/// if let Some(place) = &details.result {
///     println!("{}", place.formatted_address);
/// }
///
/// // Raw bytes through a completion callback
/// client.call(Endpoint::details(place_id, "session-1"), |outcome| match outcome {
///     Ok(response) => println!("{} bytes", response.raw_body.len()),
///     Err(e) => eprintln!("lookup failed: {}", e),
/// });
/// # Ok(())
/// # }
/// ```
pub struct Client<T = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    transport: T,
    config: Config,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
    status_messages: StatusMessages,
    runtime: Handle,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Starts a call and returns immediately.
    ///
    /// The call runs on the Tokio runtime the client was built on.
    /// `completion` is invoked exactly once, from a runtime worker, with the
    /// final outcome: the raw response body on success, or the error that
    /// ended the call.
    pub fn call<F>(&self, endpoint: Endpoint, completion: F)
    where
        F: FnOnce(Result<Response<Arc<[u8]>>>) + Send + 'static,
    {
        let client = self.clone();
        self.inner.runtime.spawn(async move {
            let outcome = client.execute(endpoint).await;
            completion(outcome);
        });
    }

    /// Executes a call and returns the raw response body.
    ///
    /// The request is built once. After every attempt the retry ceiling is
    /// checked first: once `max_retries` retries have been made the call ends
    /// with [`Error::Exhausted`], whatever the attempt returned. Below the
    /// ceiling a success or a failure the retry predicate declines is
    /// returned as is, and any other failure is attempted again.
    pub async fn execute(&self, endpoint: Endpoint) -> Result<Response<Arc<[u8]>>> {
        let inner = &self.inner;
        let request = WireRequest::build(&endpoint, &inner.config);
        let name = endpoint.name();
        let max_retries = inner.retry_strategy.max_retries();
        let start_time = Instant::now();
        let mut retries = 0;
        let mut last_failure = None;

        loop {
            let attempt = retries + 1;
            let outcome = transport::execute_once(&inner.transport, &request, name, attempt).await;

            if retries >= max_retries {
                let last_error = match outcome {
                    Err(e) => Some(e),
                    Ok(_) => last_failure,
                };
                tracing::warn!(
                    endpoint = name,
                    attempts = attempt,
                    last_error = ?last_error,
                    "Too many unsuccessful attempts"
                );
                return Err(Error::Exhausted {
                    attempts: attempt,
                    last_error: last_error.map(Box::new),
                });
            }

            let error = match outcome {
                Ok(exchange) => {
                    return Ok(Response::raw(
                        exchange.body,
                        exchange.status,
                        exchange.headers,
                        start_time.elapsed(),
                        attempt,
                    ));
                }
                Err(e) => e,
            };

            if !inner.retry_predicate.should_retry(&error, attempt) {
                return Err(error);
            }

            retries += 1;
            let delay = inner.retry_strategy.delay_for_retry(retries);
            tracing::info!(
                endpoint = name,
                retry = retries,
                delay_ms = delay.as_millis(),
                error = %error,
                "Retrying request"
            );
            last_failure = Some(error);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Runs an autocomplete search and decodes the predictions.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`Client::execute`], returns
    /// [`Error::ApiStatus`] when the payload reports a failure status and
    /// [`Error::Decoding`] when it does not match the expected schema.
    pub async fn autocomplete(
        &self,
        term: &str,
        country_codes: &[&str],
        place_type: PlaceType,
        session_token: &str,
    ) -> Result<Response<AutocompleteResponse>> {
        let endpoint = Endpoint::autocomplete(term, place_type, session_token)
            .with_countries(country_codes.iter().copied());
        let response = self.execute(endpoint).await?;
        response.try_map(|body| models::decode(&body))
    }

    /// Looks up the address and location of a place.
    ///
    /// # Errors
    ///
    /// As for [`Client::autocomplete`].
    pub async fn details(
        &self,
        place_id: &str,
        session_token: &str,
    ) -> Result<Response<PlaceDetailsResponse>> {
        let response = self
            .execute(Endpoint::details(place_id, session_token))
            .await?;
        response.try_map(|body| models::decode(&body))
    }

    /// Human-readable description of `error`, using the client's status messages.
    pub fn describe(&self, error: &Error) -> Option<String> {
        error.description(&self.inner.status_messages)
    }

    /// The configuration shared by every call.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The table [`Client::describe`] reads API status messages from.
    pub fn status_messages(&self) -> &StatusMessages {
        &self.inner.status_messages
    }

    /// The retry ceiling and delays applied to every call.
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.inner.retry_strategy
    }

    /// The transport calls are sent through.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// Only the API key is required. The builder must run inside a Tokio runtime
/// unless one is supplied with [`ClientBuilder::runtime`].
///
/// # Examples
///
/// ```no_run
/// use placefinder::{AppIdentity, ClientBuilder, Locale, RetryStrategy};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), placefinder::Error> {
/// let client = ClientBuilder::new()
///     .api_key("my-key")
///     .locale(Locale::parse("fr_CH").unwrap_or_default())
///     .app_identity(AppIdentity::new("Courier", "3.2.0", "311"))
///     .timeout(Duration::from_secs(15))
///     .retry_strategy(RetryStrategy::immediate(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<Url>,
    locale: Option<Locale>,
    app_identity: AppIdentity,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    timeout: Option<Duration>,
    status_messages: StatusMessages,
    runtime: Option<Handle>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            locale: None,
            app_identity: AppIdentity::default(),
            default_headers: HeaderMap::new(),
            retry_strategy: RetryStrategy::default(),
            retry_predicate: None,
            timeout: None,
            status_messages: StatusMessages::default(),
            runtime: None,
        }
    }

    /// Sets the API key sent with every request.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the base address, e.g. to point at a proxy or a mock server.
    ///
    /// Defaults to [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the locale. Defaults to [`Locale::from_env`].
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Sets the application identity used in the `User-Agent` header.
    pub fn app_identity(mut self, app_identity: AppIdentity) -> Self {
        self.app_identity = app_identity;
        self
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry strategy. Defaults to ten immediate retries.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default, requests are retried based on `Error::is_retryable()`.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Sets the timeout of each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the table used by [`Client::describe`].
    pub fn status_messages(mut self, messages: StatusMessages) -> Self {
        self.status_messages = messages;
        self
    }

    /// Sets the runtime [`Client::call`] spawns work on.
    ///
    /// Defaults to the runtime the builder runs in.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing, the configuration is
    /// invalid, or no Tokio runtime is available.
    pub fn build(self) -> Result<Client> {
        let config = self.config()?;
        let transport = HttpTransport::new(&config, self.timeout)?;
        self.assemble(config, transport)
    }

    /// Builds a client that sends requests through `transport`.
    ///
    /// The timeout setting only applies to the built-in transport.
    ///
    /// # Errors
    ///
    /// As for [`ClientBuilder::build`].
    pub fn build_with_transport<T>(self, transport: T) -> Result<Client<T>>
    where
        T: Transport,
    {
        let config = self.config()?;
        self.assemble(config, transport)
    }

    fn config(&self) -> Result<Config> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| Error::ConfigurationError("API key is required".to_string()))?;
        let base_url = match &self.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        let locale = self.locale.clone().unwrap_or_else(Locale::from_env);

        Config::new(
            api_key,
            base_url,
            locale,
            self.app_identity.clone(),
            self.default_headers.clone(),
        )
    }

    fn assemble<T>(self, config: Config, transport: T) -> Result<Client<T>>
    where
        T: Transport,
    {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                Error::ConfigurationError(format!("No Tokio runtime available: {}", e))
            })?,
        };

        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Box::new(RetryOnRetryable));

        tracing::debug!(
            base_url = %config.base_url(),
            locale = config.locale().identifier(),
            max_retries = self.retry_strategy.max_retries(),
            "Places client initialised"
        );

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                config,
                retry_strategy: self.retry_strategy,
                retry_predicate,
                status_messages: self.status_messages,
                runtime,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
