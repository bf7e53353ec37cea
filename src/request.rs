//! Wire-level requests built from [`Endpoint`]s.

use crate::config::Config;
use crate::endpoint::{Endpoint, MAX_COUNTRY_FILTERS};
use http::header::{ACCEPT, ACCEPT_LANGUAGE};
use http::{HeaderMap, HeaderValue, Method};
use std::collections::BTreeMap;
use url::{form_urlencoded, Url};

/// A fully resolved HTTP request, ready for a [`Transport`](crate::Transport).
///
/// Built once per call and reused unchanged for every retry.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    /// The HTTP method. Always `GET` for the Places endpoints.
    pub method: Method,

    /// The complete URL, query string included.
    pub url: Url,

    /// Per-request headers. Session headers are added by the transport.
    pub headers: HeaderMap,

    /// The query parameters encoded into `url`.
    pub query_params: BTreeMap<String, String>,
}

impl WireRequest {
    /// Builds the request for `endpoint`.
    ///
    /// This is a pure function of its inputs: the same endpoint and
    /// configuration always produce the same request.
    ///
    /// # Panics
    ///
    /// Panics if the configured base URL cannot carry a path. [`Config::new`]
    /// rejects such URLs, so this indicates a bug rather than bad input.
    pub fn build(endpoint: &Endpoint, config: &Config) -> Self {
        let query_params = query_params(endpoint, config);

        let mut url = config.base_url().clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().extend(endpoint.path().split('/'));
            }
            Err(()) => unreachable!("base URL {} cannot carry a path", config.base_url()),
        }
        url.set_query(Some(&encode_query(&query_params)));

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, config.accept_language().clone());

        Self {
            method: Method::GET,
            url,
            headers,
            query_params,
        }
    }

    /// Returns a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

fn query_params(endpoint: &Endpoint, config: &Config) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();

    match endpoint {
        Endpoint::Autocomplete {
            term,
            country_codes,
            place_type,
            session_token,
        } => {
            params.insert("input".to_string(), term.clone());
            params.insert("sessiontoken".to_string(), session_token.clone());
            params.insert("types".to_string(), place_type.as_str().to_string());
            if !country_codes.is_empty() {
                params.insert("components".to_string(), components_value(country_codes));
            }
        }
        Endpoint::Details {
            place_id,
            session_token,
        } => {
            params.insert("placeid".to_string(), place_id.clone());
            params.insert("sessiontoken".to_string(), session_token.clone());
        }
    }

    params.insert("key".to_string(), config.api_key().to_string());
    params
}

/// Percent-encodes the query per RFC 3986, so a space is `%20` rather than
/// the form encoding's `+`.
fn encode_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", encode_component(name), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(raw: &str) -> String {
    // A literal `+` is serialized as `%2B`, so every `+` left is a space.
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `country:fr|country:be|...`, limited to the first five codes.
fn components_value(country_codes: &[String]) -> String {
    country_codes
        .iter()
        .take(MAX_COUNTRY_FILTERS)
        .map(|code| format!("country:{}", code))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppIdentity, Locale, DEFAULT_BASE_URL};
    use crate::endpoint::PlaceType;

    fn config_with_base(base: &str) -> Config {
        Config::new(
            "test-key",
            Url::parse(base).unwrap(),
            Locale::parse("fr_FR").unwrap(),
            AppIdentity::default(),
            HeaderMap::new(),
        )
        .unwrap()
    }

    fn config() -> Config {
        config_with_base(DEFAULT_BASE_URL)
    }

    #[test]
    fn test_autocomplete_request() {
        let endpoint = Endpoint::autocomplete("Paris", PlaceType::Cities, "session-1");
        let request = WireRequest::build(&endpoint, &config());

        assert_eq!(request.method, Method::GET);
        assert_eq!(
            request.url.path(),
            "/maps/api/place/autocomplete/json"
        );
        assert_eq!(request.query_param("input"), Some("Paris"));
        assert_eq!(request.query_param("sessiontoken"), Some("session-1"));
        assert_eq!(request.query_param("types"), Some("(cities)"));
        assert_eq!(request.query_param("key"), Some("test-key"));
        assert_eq!(request.query_param("components"), None);
        assert_eq!(request.query_params.len(), 4);
    }

    #[test]
    fn test_details_request() {
        let endpoint = Endpoint::details("ChIJN1t_tDeuEmsRUsoyG83frY4", "session-2");
        let request = WireRequest::build(&endpoint, &config());

        assert_eq!(request.url.path(), "/maps/api/place/details/json");
        assert_eq!(
            request.query_param("placeid"),
            Some("ChIJN1t_tDeuEmsRUsoyG83frY4")
        );
        assert_eq!(request.query_param("sessiontoken"), Some("session-2"));
        assert_eq!(request.query_param("key"), Some("test-key"));
        assert_eq!(request.query_params.len(), 3);
    }

    #[test]
    fn test_country_filters_truncated_to_five_in_order() {
        let endpoint = Endpoint::autocomplete("Main St", PlaceType::Address, "t")
            .with_countries(["us", "pr", "vi", "gu", "mp", "ca", "mx"]);
        let request = WireRequest::build(&endpoint, &config());

        assert_eq!(
            request.query_param("components"),
            Some("country:us|country:pr|country:vi|country:gu|country:mp")
        );
    }

    #[test]
    fn test_query_is_encoded_into_url() {
        let endpoint = Endpoint::autocomplete("Rue de l'Église & co", PlaceType::Address, "t")
            .with_countries(["fr"]);
        let request = WireRequest::build(&endpoint, &config());

        let decoded: BTreeMap<String, String> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(decoded, request.query_params);
        assert!(!request.url.as_str().contains(' '));
    }

    #[test]
    fn test_spaces_are_percent_encoded() {
        let endpoint = Endpoint::autocomplete("New York", PlaceType::Cities, "t");
        let request = WireRequest::build(&endpoint, &config());
        let query = request.url.query().unwrap();

        assert!(query.contains("input=New%20York"), "{}", query);
        assert!(!query.contains('+'));

        let endpoint = Endpoint::autocomplete("C++ & more", PlaceType::Cities, "t");
        let request = WireRequest::build(&endpoint, &config());
        let query = request.url.query().unwrap();
        assert!(query.contains("input=C%2B%2B%20%26%20more"), "{}", query);
        assert_eq!(request.query_param("input"), Some("C++ & more"));
    }

    #[test]
    fn test_headers() {
        let endpoint = Endpoint::details("abc", "t");
        let request = WireRequest::build(&endpoint, &config());

        assert_eq!(request.headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(request.headers.get(ACCEPT_LANGUAGE).unwrap(), "fr");
    }

    #[test]
    fn test_building_is_deterministic() {
        let endpoint = Endpoint::autocomplete("Zürich", PlaceType::Geocode, "t")
            .with_countries(["ch", "de", "at"]);
        let config = config();

        let first = WireRequest::build(&endpoint, &config);
        let second = WireRequest::build(&endpoint, &config);
        assert_eq!(first, second);
        assert_eq!(first.url.as_str(), second.url.as_str());
    }

    #[test]
    fn test_base_url_with_trailing_slash() {
        let config = config_with_base("http://localhost:8080/place/");
        let request = WireRequest::build(&Endpoint::details("abc", "t"), &config);
        assert_eq!(request.url.path(), "/place/details/json");

        let config = config_with_base("http://localhost:8080");
        let request = WireRequest::build(&Endpoint::details("abc", "t"), &config);
        assert_eq!(request.url.path(), "/details/json");
    }
}
