//! The closed set of Places API operations this client knows how to call.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The Places API allows filtering autocomplete results by at most this many countries.
pub const MAX_COUNTRY_FILTERS: usize = 5;

/// One Places API call and its parameters.
///
/// An `Endpoint` says *what* to ask for; it is turned into a
/// [`WireRequest`](crate::request::WireRequest) once per call and that request
/// is reused for every retry.
///
/// # Examples
///
/// ```
/// use placefinder::{Endpoint, PlaceType};
///
/// let search = Endpoint::autocomplete("Paris", PlaceType::Cities, "session-1")
///     .with_countries(["fr", "be"]);
///
/// let details = Endpoint::Details {
///     place_id: "ChIJD7fiBh9u5kcRYJSMaMOCCwQ".to_string(),
///     session_token: "session-1".to_string(),
/// };
/// # let _ = (search, details);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Place autocomplete search.
    Autocomplete {
        /// The text typed so far.
        term: String,
        /// ISO 3166-1 alpha-2 country codes restricting the results. Only the
        /// first [`MAX_COUNTRY_FILTERS`] are sent.
        country_codes: Vec<String>,
        /// The category of results to return.
        place_type: PlaceType,
        /// Token grouping the autocomplete and details calls of one user session.
        session_token: String,
    },

    /// Place details lookup.
    Details {
        /// Identifier of the place, usually taken from an autocomplete prediction.
        place_id: String,
        /// Token grouping the autocomplete and details calls of one user session.
        session_token: String,
    },
}

impl Endpoint {
    /// Creates an autocomplete endpoint without country filters.
    pub fn autocomplete(
        term: impl Into<String>,
        place_type: PlaceType,
        session_token: impl Into<String>,
    ) -> Self {
        Endpoint::Autocomplete {
            term: term.into(),
            country_codes: Vec::new(),
            place_type,
            session_token: session_token.into(),
        }
    }

    /// Creates a place details endpoint.
    pub fn details(place_id: impl Into<String>, session_token: impl Into<String>) -> Self {
        Endpoint::Details {
            place_id: place_id.into(),
            session_token: session_token.into(),
        }
    }

    /// Appends country filters to an autocomplete endpoint.
    ///
    /// Has no effect on other endpoints.
    pub fn with_countries<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Endpoint::Autocomplete { country_codes, .. } = &mut self {
            country_codes.extend(codes.into_iter().map(Into::into));
        }
        self
    }

    /// Path below the API base address.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Autocomplete { .. } => "autocomplete/json",
            Endpoint::Details { .. } => "details/json",
        }
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Autocomplete { .. } => "autocomplete",
            Endpoint::Details { .. } => "details",
        }
    }
}

/// Place types accepted by autocomplete requests and reported on address components.
///
/// See <https://developers.google.com/places/supported_types>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    /// Only geocoding results, no businesses.
    Geocode,
    /// Geocoding results with a precise address.
    Address,
    /// Only business results.
    Establishment,
    /// Localities, sublocalities, postal codes, countries and the first two
    /// administrative area levels.
    #[serde(rename = "(regions)")]
    Regions,
    /// Localities and the third administrative area level.
    #[serde(rename = "(cities)")]
    Cities,
    Political,
    Route,
    Country,
    Floor,
    Subpremise,
    StreetAddress,
    StreetNumber,
    Neighborhood,
    PostBox,
    PostalCode,
    PostalCodePrefix,
    PostalCodeSuffix,
    Locality,
    Sublocality,
    #[serde(rename = "sublocality_level_1")]
    SublocalityLevel1,
    #[serde(rename = "sublocality_level_2")]
    SublocalityLevel2,
    #[serde(rename = "sublocality_level_3")]
    SublocalityLevel3,
    #[serde(rename = "sublocality_level_4")]
    SublocalityLevel4,
    #[serde(rename = "sublocality_level_5")]
    SublocalityLevel5,
    #[serde(rename = "administrative_area_level_1")]
    AdministrativeAreaLevel1,
    #[serde(rename = "administrative_area_level_2")]
    AdministrativeAreaLevel2,
    #[serde(rename = "administrative_area_level_3")]
    AdministrativeAreaLevel3,
    #[serde(rename = "administrative_area_level_4")]
    AdministrativeAreaLevel4,
    #[serde(rename = "administrative_area_level_5")]
    AdministrativeAreaLevel5,
}

impl PlaceType {
    /// Every place type, in declaration order.
    pub const ALL: [PlaceType; 29] = [
        PlaceType::Geocode,
        PlaceType::Address,
        PlaceType::Establishment,
        PlaceType::Regions,
        PlaceType::Cities,
        PlaceType::Political,
        PlaceType::Route,
        PlaceType::Country,
        PlaceType::Floor,
        PlaceType::Subpremise,
        PlaceType::StreetAddress,
        PlaceType::StreetNumber,
        PlaceType::Neighborhood,
        PlaceType::PostBox,
        PlaceType::PostalCode,
        PlaceType::PostalCodePrefix,
        PlaceType::PostalCodeSuffix,
        PlaceType::Locality,
        PlaceType::Sublocality,
        PlaceType::SublocalityLevel1,
        PlaceType::SublocalityLevel2,
        PlaceType::SublocalityLevel3,
        PlaceType::SublocalityLevel4,
        PlaceType::SublocalityLevel5,
        PlaceType::AdministrativeAreaLevel1,
        PlaceType::AdministrativeAreaLevel2,
        PlaceType::AdministrativeAreaLevel3,
        PlaceType::AdministrativeAreaLevel4,
        PlaceType::AdministrativeAreaLevel5,
    ];

    /// Returns the code sent in the `types` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceType::Geocode => "geocode",
            PlaceType::Address => "address",
            PlaceType::Establishment => "establishment",
            PlaceType::Regions => "(regions)",
            PlaceType::Cities => "(cities)",
            PlaceType::Political => "political",
            PlaceType::Route => "route",
            PlaceType::Country => "country",
            PlaceType::Floor => "floor",
            PlaceType::Subpremise => "subpremise",
            PlaceType::StreetAddress => "street_address",
            PlaceType::StreetNumber => "street_number",
            PlaceType::Neighborhood => "neighborhood",
            PlaceType::PostBox => "post_box",
            PlaceType::PostalCode => "postal_code",
            PlaceType::PostalCodePrefix => "postal_code_prefix",
            PlaceType::PostalCodeSuffix => "postal_code_suffix",
            PlaceType::Locality => "locality",
            PlaceType::Sublocality => "sublocality",
            PlaceType::SublocalityLevel1 => "sublocality_level_1",
            PlaceType::SublocalityLevel2 => "sublocality_level_2",
            PlaceType::SublocalityLevel3 => "sublocality_level_3",
            PlaceType::SublocalityLevel4 => "sublocality_level_4",
            PlaceType::SublocalityLevel5 => "sublocality_level_5",
            PlaceType::AdministrativeAreaLevel1 => "administrative_area_level_1",
            PlaceType::AdministrativeAreaLevel2 => "administrative_area_level_2",
            PlaceType::AdministrativeAreaLevel3 => "administrative_area_level_3",
            PlaceType::AdministrativeAreaLevel4 => "administrative_area_level_4",
            PlaceType::AdministrativeAreaLevel5 => "administrative_area_level_5",
        }
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised place type code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised place type: {0}")]
pub struct UnknownPlaceType(pub String);

impl FromStr for PlaceType {
    type Err = UnknownPlaceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlaceType::ALL
            .into_iter()
            .find(|place_type| place_type.as_str() == s)
            .ok_or_else(|| UnknownPlaceType(s.to_string()))
    }
}
