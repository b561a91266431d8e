//! Validated identifier and text types shared across the cohort workspace.
//!
//! - [`CohortName`]: a user-supplied cohort name, trimmed and guaranteed non-empty.
//! - [`CohortId`]: the backend-assigned identifier of a saved cohort.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Please enter a cohort name")]
    Empty,
    /// The identifier was empty or contained only whitespace
    #[error("cohort id cannot be empty")]
    EmptyId,
}

/// A cohort name that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so a name made
/// only of whitespace is rejected before anything reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CohortName(String);

impl CohortName {
    /// Creates a new `CohortName` from the given input.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CohortName)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CohortName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CohortName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for CohortName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for CohortName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CohortName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Server-assigned identifier of a saved cohort.
///
/// The backend owns id allocation and may emit either a JSON string or a JSON integer. Both are
/// held as text; the client never interprets the value beyond using it in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CohortId(String);

impl CohortId {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::EmptyId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CohortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CohortId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for CohortId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for CohortId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        let raw = match Wire::deserialize(deserializer)? {
            Wire::Text(s) => s,
            Wire::Unsigned(n) => n.to_string(),
            Wire::Signed(n) => n.to_string(),
        };
        CohortId::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cohort_name_is_trimmed() {
        let name = CohortName::new("  Over 90s  ").unwrap();
        assert_eq!(name.as_str(), "Over 90s");
    }

    #[test]
    fn cohort_name_rejects_whitespace_only() {
        assert_eq!(CohortName::new("   \t"), Err(TextError::Empty));
        assert_eq!(CohortName::new(""), Err(TextError::Empty));
    }

    #[test]
    fn cohort_name_deserialize_rejects_blank() {
        let err = serde_json::from_str::<CohortName>("\"  \"");
        assert!(err.is_err());
    }

    #[test]
    fn cohort_id_accepts_string_and_integer_json() {
        let from_text: CohortId = serde_json::from_str("\"a1b2\"").unwrap();
        let from_number: CohortId = serde_json::from_str("17").unwrap();

        assert_eq!(from_text.as_str(), "a1b2");
        assert_eq!(from_number.as_str(), "17");
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"17\"");
    }

    #[test]
    fn cohort_id_rejects_empty() {
        assert_eq!("  ".parse::<CohortId>(), Err(TextError::EmptyId));
    }
}
