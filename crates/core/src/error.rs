use cohort_types::{CohortId, TextError};
use registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),
    #[error("{0}")]
    Text(#[from] TextError),
    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("Please build a cohort first")]
    CountRequired,
    #[error("unknown cohort: {0}")]
    UnknownCohort(CohortId),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },
    #[error("failed to decode backend response: {0}")]
    Decode(serde_json::Error),

    #[error("chart is not a base64 data URI: {0}")]
    InvalidChart(String),
    #[error("failed to decode chart image: {0}")]
    ChartDecode(base64::DecodeError),
    #[error("failed to write chart file: {0}")]
    FileWrite(std::io::Error),
}

impl CohortError {
    /// True for failures that happened before any request was sent.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            CohortError::Transport(_) | CohortError::Status { .. } | CohortError::Decode(_)
        )
    }
}

pub type CohortResult<T> = std::result::Result<T, CohortError>;
