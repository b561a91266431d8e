//! Hip fracture registry vocabulary.
//!
//! This crate is the boundary description of the registry fields a cohort can be filtered on:
//! their wire names (as the backend expects them in a filter set), display labels, clinical
//! sections and the closed list of values each enumerated field accepts.
//!
//! It holds no state and performs no I/O. Filter state and backend calls live in `cohort-core`.

pub mod field;
pub mod section;

pub use field::{ChoiceOption, FieldKind, FilterField, AGE_MAX_KEY, AGE_MIN_KEY};
pub use section::Section;

/// Errors returned by the `registry` crate.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown filter field: {0}")]
    UnknownField(String),

    #[error("'{option}' is not an option of filter field '{field}'")]
    UnknownOption { field: &'static str, option: String },
}

/// Type alias for Results that can fail with a [`RegistryError`].
pub type RegistryResult<T> = Result<T, RegistryError>;
