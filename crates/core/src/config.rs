//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into [`HttpCohortApi`]. Request
//! handling never reads environment variables; the `*_from_env_value` helpers take the raw
//! value so the binary decides where it comes from.
//!
//! [`HttpCohortApi`]: crate::HttpCohortApi

use crate::constants::DEFAULT_BACKEND_URL;
use crate::validation::validate_base_url;
use crate::{CohortError, CohortResult};
use reqwest::Url;
use std::time::Duration;

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// `request_timeout` of `None` means requests wait indefinitely.
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> CohortResult<Self> {
        let base_url = validate_base_url(base_url)?;

        if request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CohortError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

/// Resolve the backend base URL from an optional raw value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_BACKEND_URL`].
pub fn base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

/// Parse an optional request timeout given in whole seconds.
///
/// `None`, empty/whitespace and `0` all mean "no timeout".
pub fn request_timeout_from_env_value(value: Option<String>) -> CohortResult<Option<Duration>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(None);
    };

    let secs: u64 = value.parse().map_err(|_| {
        CohortError::InvalidInput(format!("request timeout must be whole seconds, got '{value}'"))
    })?;

    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_when_unset_or_blank() {
        assert_eq!(base_url_from_env_value(None), DEFAULT_BACKEND_URL);
        assert_eq!(base_url_from_env_value(Some("  ".into())), DEFAULT_BACKEND_URL);
        assert_eq!(
            base_url_from_env_value(Some(" http://10.0.0.4:8080 ".into())),
            "http://10.0.0.4:8080"
        );
    }

    #[test]
    fn timeout_parsing() {
        assert_eq!(request_timeout_from_env_value(None).unwrap(), None);
        assert_eq!(request_timeout_from_env_value(Some("0".into())).unwrap(), None);
        assert_eq!(
            request_timeout_from_env_value(Some("30".into())).unwrap(),
            Some(Duration::from_secs(30))
        );
        assert!(request_timeout_from_env_value(Some("soon".into())).is_err());
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let err = ClientConfig::new(DEFAULT_BACKEND_URL, Some(Duration::ZERO)).unwrap_err();
        assert!(matches!(err, CohortError::InvalidInput(_)));
    }

    #[test]
    fn config_keeps_validated_url() {
        let cfg = ClientConfig::new("http://localhost:5050", None).unwrap();
        assert_eq!(cfg.base_url().as_str(), "http://localhost:5050/");
        assert_eq!(cfg.request_timeout(), None);
    }
}
