//! Process-wide client configuration.
//!
//! A [`Config`] is assembled once by [`ClientBuilder`](crate::ClientBuilder)
//! and never changes afterwards. Every call made through a client reads the
//! same API key, base address, locale and session headers.

use crate::{Error, Result};
use http::header::{ACCEPT_CHARSET, ACCEPT_ENCODING, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use url::Url;

/// Base address of the Places web service.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Language used when no locale can be determined.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Environment variables consulted for the locale, highest priority first.
const LOCALE_VARIABLES: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Immutable configuration shared by every call of a client.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: String,
    base_url: Url,
    locale: Locale,
    app: AppIdentity,
    accept_language: HeaderValue,
    session_headers: HeaderMap,
}

impl Config {
    /// Validates the inputs and assembles a configuration.
    ///
    /// `extra_headers` are sent with every request in addition to the session
    /// headers (`User-Agent`, `Accept-Charset`, `Accept-Encoding`) and may
    /// override them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the API key is empty, the base
    /// URL cannot carry a path, or the user agent is not a valid header value.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Url,
        locale: Locale,
        app: AppIdentity,
        extra_headers: HeaderMap,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::ConfigurationError(
                "API key must not be empty".to_string(),
            ));
        }

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL must be an http(s) URL that can carry a path: {}",
                base_url
            )));
        }

        let accept_language = HeaderValue::from_str(locale.language()).map_err(|e| {
            Error::ConfigurationError(format!("Invalid Accept-Language value: {}", e))
        })?;

        let user_agent = app.user_agent(&locale);
        let user_agent = HeaderValue::from_str(&user_agent)
            .map_err(|e| Error::ConfigurationError(format!("Invalid User-Agent: {}", e)))?;

        let mut session_headers = HeaderMap::new();
        session_headers.insert(USER_AGENT, user_agent);
        session_headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        session_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        for (name, value) in &extra_headers {
            session_headers.insert(name.clone(), value.clone());
        }

        Ok(Self {
            api_key,
            base_url,
            locale,
            app,
            accept_language,
            session_headers,
        })
    }

    /// The API key sent as the `key` query parameter.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Base address every endpoint path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The locale requests are made in.
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The application identity the `User-Agent` header is built from.
    pub fn app(&self) -> &AppIdentity {
        &self.app
    }

    /// Value of the per-request `Accept-Language` header.
    pub fn accept_language(&self) -> &HeaderValue {
        &self.accept_language
    }

    /// Headers installed once on the transport session.
    pub fn session_headers(&self) -> &HeaderMap {
        &self.session_headers
    }
}

/// A locale identifier such as `fr_CH`, reduced to what the client sends.
///
/// # Examples
///
/// ```
/// use placefinder::Locale;
///
/// let locale = Locale::parse("de_CH.UTF-8").unwrap();
/// assert_eq!(locale.identifier(), "de_CH");
/// assert_eq!(locale.language(), "de");
///
/// assert!(Locale::parse("C").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    identifier: String,
    language: String,
}

impl Locale {
    /// Parses a POSIX locale (`fr_FR.UTF-8@euro`) or a language tag (`fr-FR`).
    ///
    /// Returns `None` for the `C`/`POSIX` locales and for anything whose
    /// language part is not two or three ASCII letters.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag
            .split(|c| c == '.' || c == '@')
            .next()
            .unwrap_or("")
            .trim();
        if tag.is_empty() || tag == "C" || tag == "POSIX" {
            return None;
        }

        let identifier = tag.replace('-', "_");
        if !identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return None;
        }

        let language = identifier.split('_').next()?.to_ascii_lowercase();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }

        Some(Self {
            identifier,
            language,
        })
    }

    /// Determines the locale from `LC_ALL`, `LC_MESSAGES` and `LANG`, falling
    /// back to English.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Locale::from_env`] but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        LOCALE_VARIABLES
            .iter()
            .filter_map(|name| lookup(name))
            .find_map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// Full identifier, e.g. `fr_FR`. Used in the user agent.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Language code, e.g. `fr`. Sent as `Accept-Language`.
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            identifier: FALLBACK_LANGUAGE.to_string(),
            language: FALLBACK_LANGUAGE.to_string(),
        }
    }
}

/// Name, version and build of the application embedding the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    /// Application name.
    pub name: String,
    /// Marketing version, e.g. `3.2.0`.
    pub version: String,
    /// Build number.
    pub build: String,
}

impl AppIdentity {
    /// Creates an identity from its three parts.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: build.into(),
        }
    }

    /// Formats the `User-Agent` value: `"<name> <version> (<build>); <locale>"`.
    pub fn user_agent(&self, locale: &Locale) -> String {
        format!(
            "{} {} ({}); {}",
            self.name,
            self.version,
            self.build,
            locale.identifier()
        )
    }
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), "1")
    }
}
