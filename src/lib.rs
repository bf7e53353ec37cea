//! # Placefinder - a resilient Places API client
//!
//! Placefinder runs place autocomplete searches and place details lookups
//! against the Places web service. Each call is turned into an HTTP request
//! once, executed over a pluggable transport, validated, and retried
//! automatically while it fails with transient network errors (timeouts,
//! unreachable hosts, dropped connections, DNS failures). After a bounded
//! number of retries the call gives up with [`Error::Exhausted`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use placefinder::{AppIdentity, Client, PlaceType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), placefinder::Error> {
//!     let client = Client::builder()
//!         .api_key("my-api-key")
//!         .app_identity(AppIdentity::new("Courier", "3.2.0", "311"))
//!         .build()?;
//!
//!     let suggestions = client
//!         .autocomplete("Paris", &["fr", "be"], PlaceType::Cities, "session-42")
//!         .await?;
//!
//!     for prediction in &suggestions.predictions {
//!         println!("{} ({})", prediction.description, prediction.place_id);
//!     }
//!     println!("Took {:?} over {} attempt(s)", suggestions.latency, suggestions.attempts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed operations** - [`Endpoint`] is a closed set of operations, each with its own parameters
//! - **Bounded retries** - transient network failures are retried up to a ceiling (10 by default)
//! - **Failure taxonomy** - every failure is one [`Error`] variant, decided where it is detected
//! - **Callback or future** - [`Client::call`] takes a completion callback, [`Client::execute`] is `async`
//! - **Pluggable transport** - `reqwest` by default, any [`Transport`] for tests or proxies
//! - **Structured logging** - attempts and outcomes are logged with `tracing`
//!
//! ## Error Handling
//!
//! ```no_run
//! use placefinder::{Client, Endpoint, Error, PlaceType};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().api_key("my-api-key").build()?;
//! match client.details("ChIJN1t_tDeuEmsRUsoyG83frY4", "session-42").await {
//!     Ok(response) => println!("{:?}", response.result),
//!     Err(Error::Exhausted { attempts, .. }) => {
//!         eprintln!("Network looks bad, gave up after {} attempts", attempts);
//!     }
//!     Err(e @ Error::ApiStatus { .. }) => {
//!         eprintln!("{}", client.describe(&e).unwrap_or_default());
//!     }
//!     Err(e) => eprintln!("Lookup failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod endpoint;
mod error;
pub mod models;
pub mod request;
mod response;
pub mod retry;
mod status;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{AppIdentity, Config, Locale};
pub use endpoint::{Endpoint, PlaceType, UnknownPlaceType, MAX_COUNTRY_FILTERS};
pub use error::{BoxError, Error, Result, TransportErrorKind};
pub use request::WireRequest;
pub use response::Response;
pub use retry::{RetryPredicate, RetryStrategy};
pub use status::{ApiStatus, StatusMessages, UnknownStatus};
pub use transport::{HttpTransport, RawResponse, Transport};
