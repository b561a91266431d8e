//! # Cohort Core
//!
//! Client-side logic for the hip fracture cohort builder.
//!
//! This crate contains the typed state behind the two cohort views and the calls they make to
//! the cohort backend:
//! - [`FilterSet`]: the full set of registry filter values submitted for a count
//! - [`FilterForm`]: builds a cohort, shows its count and saves it under a name
//! - [`CohortBrowser`]: lists saved cohorts, deletes them and shows their analysis charts
//! - [`HttpCohortApi`]: the reqwest-backed implementation of [`CohortApi`]
//!
//! **No presentation concerns**: rendering, prompting and alerting belong to the front end,
//! which plugs in through the [`Prompter`] trait.

pub mod analysis;
pub mod api;
pub mod browser;
pub mod cache;
pub mod cohort;
pub mod config;
pub mod constants;
pub mod error;
pub mod filters;
pub mod form;
pub mod prompt;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::{
    AnalyseResponse, AnalysisResult, ChartImage, ChartKind, ChartSelection, EnhancedMetrics,
    MortalitySummary,
};
pub use api::{CohortApi, HttpCohortApi};
pub use browser::{BrowserState, CohortBrowser, CohortSummary};
pub use cache::CohortCache;
pub use cohort::{Cohort, NewCohort};
pub use config::ClientConfig;
pub use constants::DEFAULT_BACKEND_URL;
pub use error::{CohortError, CohortResult};
pub use filters::{active_filter_count, AgeRange, FieldValue, FilterSet, SelectionMode};
pub use form::{FilterForm, ResultPanel};
pub use prompt::{Notice, Prompter};

pub use cohort_types::{CohortId, CohortName, TextError};
pub use registry::{FilterField, Section};
