//! Constants used throughout the cohort core crate.

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5050";

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "COHORT_API_URL";

/// Environment variable holding an optional request timeout in whole seconds.
pub const API_TIMEOUT_ENV: &str = "COHORT_API_TIMEOUT_SECS";

/// Path segments of the count endpoint (`POST /api/cohort`).
pub const COUNT_PATH: &[&str] = &["api", "cohort"];

/// Path segments of the saved cohorts collection (`/api/cohorts`).
pub const COHORTS_PATH: &[&str] = &["api", "cohorts"];

/// Trailing path segment of the analyse endpoint (`/api/cohorts/:id/analyse`).
pub const ANALYSE_SEGMENT: &str = "analyse";
