//! In-memory fakes shared by the view tests.

use crate::analysis::AnalyseResponse;
use crate::api::CohortApi;
use crate::cohort::{Cohort, NewCohort};
use crate::filters::FilterSet;
use crate::prompt::{Notice, Prompter};
use crate::{CohortError, CohortResult};
use async_trait::async_trait;
use cohort_types::CohortId;
use serde_json::{json, Value};
use std::sync::Mutex;

pub(crate) const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

pub(crate) fn cohort(id: &str, name: &str) -> Cohort {
    Cohort {
        id: id.parse().unwrap(),
        name: name.to_string(),
        filters: FilterSet::default(),
        count: 10,
        created_at: None,
    }
}

/// Number of calls made to each endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Calls {
    pub count: usize,
    pub list: usize,
    pub create: usize,
    pub delete: usize,
    pub analyse: usize,
}

#[derive(Default)]
struct FakeState {
    cohorts: Vec<Cohort>,
    next_id: u64,
    count: u64,
    analysis: Option<Value>,
    fail_count: bool,
    fail_list: bool,
    fail_create: bool,
    fail_delete: bool,
    fail_analyse: bool,
    calls: Calls,
    counted: Vec<FilterSet>,
    created: Vec<NewCohort>,
}

/// Backend fake holding cohorts in memory. Failures answer with HTTP 500.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

fn server_error() -> CohortError {
    CohortError::Status {
        status: 500,
        body: "boom".into(),
    }
}

impl FakeApi {
    pub fn with_cohorts(cohorts: Vec<Cohort>) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.next_id = 100;
            state.cohorts = cohorts;
        }
        api
    }

    pub fn with_count(self, count: u64) -> Self {
        self.state.lock().unwrap().count = count;
        self
    }

    pub fn with_analysis(self, analysis: Value) -> Self {
        self.state.lock().unwrap().analysis = Some(analysis);
        self
    }

    pub fn fail_count(&self) {
        self.state.lock().unwrap().fail_count = true;
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    pub fn fail_analyse(&self) {
        self.state.lock().unwrap().fail_analyse = true;
    }

    /// Drop a cohort as if another client had deleted it.
    pub fn forget(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .cohorts
            .retain(|c| c.id.as_str() != id);
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn counted(&self) -> Vec<FilterSet> {
        self.state.lock().unwrap().counted.clone()
    }

    pub fn created(&self) -> Vec<NewCohort> {
        self.state.lock().unwrap().created.clone()
    }
}

#[async_trait]
impl CohortApi for FakeApi {
    async fn count(&self, filters: &FilterSet) -> CohortResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.count += 1;
        state.counted.push(filters.clone());
        if state.fail_count {
            return Err(server_error());
        }
        Ok(state.count)
    }

    async fn list(&self) -> CohortResult<Vec<Cohort>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list += 1;
        if state.fail_list {
            return Err(server_error());
        }
        Ok(state.cohorts.clone())
    }

    async fn create(&self, cohort: &NewCohort) -> CohortResult<Cohort> {
        let mut state = self.state.lock().unwrap();
        state.calls.create += 1;
        state.created.push(cohort.clone());
        if state.fail_create {
            return Err(server_error());
        }
        state.next_id += 1;
        let stored = Cohort {
            id: state.next_id.to_string().parse()?,
            name: cohort.name.to_string(),
            filters: cohort.filters.clone(),
            count: cohort.count,
            created_at: Some("2025-03-14T09:26:53".into()),
        };
        state.cohorts.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &CohortId) -> CohortResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete += 1;
        if state.fail_delete {
            return Err(server_error());
        }
        state.cohorts.retain(|c| &c.id != id);
        Ok(())
    }

    async fn analyse(&self, _id: &CohortId) -> CohortResult<AnalyseResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.analyse += 1;
        if state.fail_analyse {
            return Err(server_error());
        }
        let body = state
            .analysis
            .clone()
            .unwrap_or_else(|| json!({ "mortality_chart": PNG_URI, "total_patients": 10 }));
        serde_json::from_value(body).map_err(CohortError::Decode)
    }
}

/// Prompter with a fixed confirm answer that records what it was asked and told.
pub(crate) struct ScriptedPrompter {
    answer: bool,
    confirmations: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl ScriptedPrompter {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            confirmations: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, message: &str) -> bool {
        self.confirmations.lock().unwrap().push(message.to_string());
        self.answer
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
