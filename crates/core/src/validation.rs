//! Input validation utilities.
//!
//! Validates configuration values before any request is built from them.

use crate::{CohortError, CohortResult};
use reqwest::Url;

/// Validates that a backend base URL can have API paths appended to it.
///
/// - Rejects empty or whitespace-only strings
/// - Requires an `http` or `https` scheme with a host
/// - Rejects query strings and fragments, which would be silently dropped from every request
///
/// # Errors
///
/// Returns `CohortError::InvalidBaseUrl` if the URL is unusable.
pub fn validate_base_url(raw: &str) -> CohortResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CohortError::InvalidBaseUrl("URL cannot be empty".into()));
    }

    let url = Url::parse(raw).map_err(|e| CohortError::InvalidBaseUrl(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CohortError::InvalidBaseUrl(format!(
            "{raw}: scheme must be http or https"
        )));
    }

    if url.host_str().is_none() {
        return Err(CohortError::InvalidBaseUrl(format!("{raw}: missing host")));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(CohortError::InvalidBaseUrl(format!(
            "{raw}: query strings and fragments are not allowed"
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_host_and_port() {
        let url = validate_base_url(" http://localhost:5050 ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5050/");
    }

    #[test]
    fn accepts_path_prefix() {
        let url = validate_base_url("https://research.example.org/hipfx/").unwrap();
        assert_eq!(url.path(), "/hipfx/");
    }

    #[test]
    fn rejects_empty_and_bad_scheme() {
        assert!(matches!(
            validate_base_url("   "),
            Err(CohortError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            validate_base_url("ftp://localhost"),
            Err(CohortError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            validate_base_url("not a url"),
            Err(CohortError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn rejects_query_string() {
        assert!(matches!(
            validate_base_url("http://localhost:5050/?debug=1"),
            Err(CohortError::InvalidBaseUrl(_))
        ));
    }
}
