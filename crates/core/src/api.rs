//! Backend cohort API.
//!
//! [`CohortApi`] is the seam between the views and the network. [`HttpCohortApi`] talks to the
//! JSON backend over HTTP; tests substitute in-memory fakes.

use crate::analysis::AnalyseResponse;
use crate::cohort::{Cohort, CountResponse, NewCohort};
use crate::config::ClientConfig;
use crate::constants::{ANALYSE_SEGMENT, COHORTS_PATH, COUNT_PATH};
use crate::filters::FilterSet;
use crate::{CohortError, CohortResult};
use async_trait::async_trait;
use cohort_types::CohortId;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

/// Operations the cohort backend offers.
#[async_trait]
pub trait CohortApi: Send + Sync {
    /// `POST /api/cohort`: number of patients matching `filters`.
    async fn count(&self, filters: &FilterSet) -> CohortResult<u64>;

    /// `GET /api/cohorts`: every saved cohort, in backend order.
    async fn list(&self) -> CohortResult<Vec<Cohort>>;

    /// `POST /api/cohorts`: persist a new cohort.
    async fn create(&self, cohort: &NewCohort) -> CohortResult<Cohort>;

    /// `DELETE /api/cohorts/:id`.
    async fn delete(&self, id: &CohortId) -> CohortResult<()>;

    /// `POST /api/cohorts/:id/analyse`.
    async fn analyse(&self, id: &CohortId) -> CohortResult<AnalyseResponse>;
}

/// [`CohortApi`] over HTTP with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpCohortApi {
    client: Client,
    base_url: Url,
}

impl HttpCohortApi {
    pub fn new(cfg: &ClientConfig) -> CohortResult<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("cohort-core/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: cfg.base_url().clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> CohortResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CohortError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn cohort_endpoint(&self, id: &CohortId, action: Option<&str>) -> CohortResult<Url> {
        let mut segments: Vec<&str> = COHORTS_PATH.to_vec();
        segments.push(id.as_str());
        segments.extend(action);
        self.endpoint(&segments)
    }

    /// Sends `request` and returns the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> CohortResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!("backend responded {status}: {body}");
            return Err(CohortError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> CohortResult<T> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(CohortError::Decode)
    }
}

#[async_trait]
impl CohortApi for HttpCohortApi {
    async fn count(&self, filters: &FilterSet) -> CohortResult<u64> {
        let url = self.endpoint(COUNT_PATH)?;
        tracing::debug!("POST {url}");
        let response: CountResponse = self
            .execute_json(self.client.post(url).json(filters))
            .await?;
        Ok(response.count)
    }

    async fn list(&self) -> CohortResult<Vec<Cohort>> {
        let url = self.endpoint(COHORTS_PATH)?;
        tracing::debug!("GET {url}");
        let body: Value = self.execute_json(self.client.get(url)).await?;
        cohorts_from_listing(body)
    }

    async fn create(&self, cohort: &NewCohort) -> CohortResult<Cohort> {
        let url = self.endpoint(COHORTS_PATH)?;
        tracing::debug!("POST {url} name={}", cohort.name);
        self.execute_json(self.client.post(url).json(cohort)).await
    }

    async fn delete(&self, id: &CohortId) -> CohortResult<()> {
        let url = self.cohort_endpoint(id, None)?;
        tracing::debug!("DELETE {url}");
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }

    async fn analyse(&self, id: &CohortId) -> CohortResult<AnalyseResponse> {
        let url = self.cohort_endpoint(id, Some(ANALYSE_SEGMENT))?;
        tracing::debug!("POST {url}");
        self.execute_json(self.client.post(url)).await
    }
}

/// Flattens a cohort listing into records.
///
/// The backend answers with either an array or an object keyed by id. Object order is kept as
/// received. Entries that cannot be read as a cohort are skipped.
fn cohorts_from_listing(body: Value) -> CohortResult<Vec<Cohort>> {
    let entries: Vec<Value> = match body {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .map(|(key, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields.entry("id").or_insert(Value::String(key));
                }
                entry
            })
            .collect(),
        other => {
            return Err(CohortError::Decode(serde_json::Error::custom(format!(
                "expected a cohort list, got {other}"
            ))))
        }
    };

    let mut cohorts = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<Cohort>(entry) {
            Ok(cohort) => cohorts.push(cohort),
            Err(e) => tracing::warn!("skipping unreadable cohort record: {e}"),
        }
    }
    Ok(cohorts)
}
