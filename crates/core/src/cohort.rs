//! Saved cohort records as exchanged with the backend.

use crate::filters::{active_filter_count, FilterSet};
use chrono::{DateTime, NaiveDateTime, Utc};
use cohort_types::{CohortId, CohortName};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named, persisted patient subset owned by the backend store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: FilterSet,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    /// Server timestamp, passed through as sent whatever its JSON type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
}

/// Reads `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Cohort {
    pub fn active_filter_count(&self) -> usize {
        active_filter_count(&self.filters)
    }

    /// Creation time, if the backend sent a recognisable ISO 8601 timestamp.
    ///
    /// Timestamps without an offset are taken to be UTC. Non-string timestamps yield `None`.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_ref()?.as_str()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Body of `POST /api/cohorts`.
#[derive(Clone, Debug, Serialize)]
pub struct NewCohort {
    pub name: CohortName,
    pub filters: FilterSet,
    pub count: u64,
}

/// Body of the `POST /api/cohort` response.
#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct CountResponse {
    pub count: u64,
}
