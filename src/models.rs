//! Payloads returned by the autocomplete and place details endpoints.
//!
//! Decoding is a separate, pure step on top of the raw bytes delivered by the
//! client. It first reads the payload's `status` envelope: anything other than
//! `OK` or `ZERO_RESULTS` becomes [`Error::ApiStatus`]. Only then is the full
//! payload decoded; a mismatch at either step becomes [`Error::Decoding`].

use crate::endpoint::PlaceType;
use crate::status::ApiStatus;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Decodes a Places payload of type `T`.
///
/// # Examples
///
/// ```
/// use placefinder::models::{decode, AutocompleteResponse};
/// use placefinder::{ApiStatus, Error};
///
/// let body = br#"{"status": "ZERO_RESULTS", "predictions": []}"#;
/// let payload: AutocompleteResponse = decode(body).unwrap();
/// assert!(payload.predictions.is_empty());
///
/// let body = br#"{"status": "REQUEST_DENIED", "error_message": "Invalid key"}"#;
/// match decode::<AutocompleteResponse>(body) {
///     Err(Error::ApiStatus { status, message }) => {
///         assert_eq!(status, ApiStatus::RequestDenied);
///         assert_eq!(message.as_deref(), Some("Invalid key"));
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
pub fn decode<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let envelope: Envelope = serde_json::from_slice(body).map_err(|e| decoding_error(e, body))?;
    if !envelope.status.is_success() {
        tracing::warn!(
            status = %envelope.status,
            error_message = ?envelope.error_message,
            "Places API reported an error status"
        );
        return Err(Error::ApiStatus {
            status: envelope.status,
            message: envelope.error_message,
        });
    }

    serde_json::from_slice(body).map_err(|e| decoding_error(e, body))
}

fn decoding_error(error: serde_json::Error, body: &[u8]) -> Error {
    let raw_response = String::from_utf8_lossy(body).into_owned();
    tracing::error!(
        error = %error,
        raw_response = %raw_response,
        "Failed to decode Places payload"
    );
    Error::Decoding {
        message: error.to_string(),
        raw_response,
    }
}

#[derive(Deserialize)]
struct Envelope {
    status: ApiStatus,
    #[serde(default)]
    error_message: Option<String>,
}

/// Autocomplete response payload.
///
/// See <https://developers.google.com/places/web-service/autocomplete#place_autocomplete_responses>.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteResponse {
    /// Payload status; always a success status once decoded.
    pub status: ApiStatus,
    /// Extra detail the service adds to some statuses.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Suggestions, best match first. Empty for `ZERO_RESULTS`.
    #[serde(default)]
    pub predictions: Vec<AutocompletePrediction>,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompletePrediction {
    /// Human-readable name of the place. For businesses this is usually the business name.
    pub description: String,

    /// Straight-line distance from the request origin in meters. Only present
    /// when an origin was sent, and never for routes.
    #[serde(default)]
    pub distance_meters: Option<u64>,

    /// Identifier to pass to a place details lookup.
    pub place_id: String,

    /// The sections of `description`, usually separated by commas.
    #[serde(default)]
    pub terms: Vec<AutocompleteTerm>,

    /// Raw type codes. Kept as strings because the API reports types outside
    /// the set [`PlaceType`] models.
    #[serde(default)]
    pub types: Vec<String>,
}

/// A section of [`AutocompletePrediction::description`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutocompleteTerm {
    /// Start position of the term in the description, in Unicode characters.
    pub offset: usize,
    /// The text of the term.
    pub value: String,
}

/// Place details response payload.
///
/// See <https://developers.google.com/places/web-service/details#PlaceDetailsResponses>.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetailsResponse {
    /// Payload status; always a success status once decoded.
    pub status: ApiStatus,
    /// Extra detail the service adds to some statuses.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Attributions that must be shown alongside the result.
    #[serde(default)]
    pub html_attributions: Vec<String>,
    /// Absent when the status is `ZERO_RESULTS`.
    #[serde(default)]
    pub result: Option<PlaceDetails>,
}

/// The address and location part of a place details result.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    /// Human-readable address. Use `address_components` rather than parsing this.
    pub formatted_address: String,

    /// The address in the adr microformat.
    #[serde(default)]
    pub adr_address: Option<String>,

    /// Where the place is.
    pub geometry: Geometry,

    /// The structured parts of the address.
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

/// Location data of a place.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Geometry {
    /// The geocoded position.
    pub location: Location,
}

/// A geocoded latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// One component of a structured address, e.g. the street number or the country.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressComponent {
    /// Full text, e.g. `Australia`.
    pub long_name: String,
    /// Abbreviated text, e.g. `AU`.
    pub short_name: String,
    /// Raw type codes; see [`AddressComponent::place_types`].
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    /// The component's types that [`PlaceType`] knows about.
    pub fn place_types(&self) -> Vec<PlaceType> {
        self.types
            .iter()
            .filter_map(|code| code.parse().ok())
            .collect()
    }
}
