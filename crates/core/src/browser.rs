//! Saved cohort browser with per-cohort analysis charts.
//!
//! State moves `Empty -> LoadingList -> Idle`, and `Idle -> Analysing -> Idle` for each
//! analyse request. Failures never leave an error state behind: the view returns to `Idle` and
//! the front end is told through its [`Prompter`].

use crate::analysis::{AnalysisResult, ChartImage, ChartKind, ChartSelection};
use crate::api::CohortApi;
use crate::cache::CohortCache;
use crate::prompt::{Notice, Prompter};
use crate::{CohortError, CohortResult};
use cohort_types::CohortId;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BrowserState {
    /// Not mounted yet.
    #[default]
    Empty,
    LoadingList,
    Idle,
    Analysing(CohortId),
}

/// Header of the analysis panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CohortSummary {
    pub name: String,
    pub patients: u64,
    pub filters_applied: usize,
}

pub struct CohortBrowser {
    api: Arc<dyn CohortApi>,
    prompter: Arc<dyn Prompter>,
    state: BrowserState,
    cohorts: CohortCache,
    analysis: Option<AnalysisResult>,
    selection: ChartSelection,
}

impl CohortBrowser {
    pub fn new(api: Arc<dyn CohortApi>, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            api,
            prompter,
            state: BrowserState::Empty,
            cohorts: CohortCache::new(),
            analysis: None,
            selection: ChartSelection::All,
        }
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn cohorts(&self) -> &CohortCache {
        &self.cohorts
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn selection(&self) -> ChartSelection {
        self.selection
    }

    /// Initial list load. Failures are logged.
    pub async fn mount(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::error!("failed to load cohorts: {e}");
        }
    }

    /// Reload the cohort list. An analysis whose cohort is gone is dropped.
    pub async fn refresh(&mut self) -> CohortResult<()> {
        self.state = BrowserState::LoadingList;
        let result = self.cohorts.refresh(self.api.as_ref()).await;
        self.state = BrowserState::Idle;
        result?;

        if let Some(analysis) = &self.analysis {
            if self.cohorts.get(&analysis.cohort_id).is_none() {
                tracing::debug!("dropping analysis of removed cohort {}", analysis.cohort_id);
                self.analysis = None;
            }
        }
        Ok(())
    }

    /// Confirm and delete a cohort. Clears the analysis if it belonged to that cohort.
    pub async fn remove(&mut self, id: &CohortId) -> CohortResult<bool> {
        let removed = self
            .cohorts
            .remove(self.api.as_ref(), self.prompter.as_ref(), id)
            .await?;

        if removed && self.analysis.as_ref().is_some_and(|a| &a.cohort_id == id) {
            self.analysis = None;
        }
        Ok(removed)
    }

    /// Request the analysis of one cohort, replacing any previous analysis.
    ///
    /// The chart selection resets to all charts. On failure, including an id missing from the
    /// loaded list, no analysis is shown and [`Notice::AnalyseFailed`] is raised.
    pub async fn analyse(&mut self, id: &CohortId) -> CohortResult<()> {
        let Some(name) = self.cohorts.get(id).map(|c| c.name.clone()) else {
            tracing::error!("cannot analyse cohort {id}: not in the loaded list");
            self.analysis = None;
            self.prompter.notify(Notice::AnalyseFailed);
            return Err(CohortError::UnknownCohort(id.clone()));
        };

        self.state = BrowserState::Analysing(id.clone());
        let response = self.api.analyse(id).await;
        self.state = BrowserState::Idle;

        match response {
            Ok(response) => {
                let result = AnalysisResult::from_response(id.clone(), name, response);
                tracing::info!(
                    "analysed cohort {}: {} charts",
                    result.cohort_name,
                    result.charts.len()
                );
                self.selection = ChartSelection::All;
                self.analysis = Some(result);
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to analyse cohort {id}: {e}");
                self.analysis = None;
                self.prompter.notify(Notice::AnalyseFailed);
                Err(e)
            }
        }
    }

    /// Choose which fetched charts are shown. Never fetches.
    pub fn select_chart(&mut self, selection: ChartSelection) {
        self.selection = selection;
    }

    pub fn visible_charts(&self) -> Vec<(ChartKind, &ChartImage)> {
        self.analysis
            .as_ref()
            .map(|a| a.visible(self.selection))
            .unwrap_or_default()
    }

    /// Name, size and filter count of the analysed cohort, from the cached list.
    pub fn selected_summary(&self) -> Option<CohortSummary> {
        let analysis = self.analysis.as_ref()?;
        let cached = self.cohorts.get(&analysis.cohort_id);
        Some(CohortSummary {
            name: analysis.cohort_name.clone(),
            patients: cached.map(|c| c.count).unwrap_or(0),
            filters_applied: cached.map(|c| c.active_filter_count()).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cohort, FakeApi, ScriptedPrompter, PNG_URI};
    use serde_json::json;

    fn browser_with(
        api: FakeApi,
        confirm: bool,
    ) -> (CohortBrowser, Arc<FakeApi>, Arc<ScriptedPrompter>) {
        let api = Arc::new(api);
        let prompter = Arc::new(ScriptedPrompter::answering(confirm));
        let browser = CohortBrowser::new(api.clone(), prompter.clone());
        (browser, api, prompter)
    }

    #[tokio::test]
    async fn mount_loads_list_and_goes_idle() {
        let (mut browser, _, _) =
            browser_with(FakeApi::with_cohorts(vec![cohort("1", "A")]), true);
        assert_eq!(browser.state(), &BrowserState::Empty);

        browser.mount().await;

        assert_eq!(browser.state(), &BrowserState::Idle);
        assert_eq!(browser.cohorts().len(), 1);
        assert!(browser.analysis().is_none());
    }

    #[tokio::test]
    async fn analyse_replaces_result_and_resets_selection() {
        let api = FakeApi::with_cohorts(vec![cohort("1", "A"), cohort("2", "B")]).with_analysis(
            json!({ "mortality_chart": PNG_URI, "time_to_surgery_chart": PNG_URI }),
        );
        let (mut browser, api, _) = browser_with(api, true);
        browser.mount().await;

        browser.analyse(&"1".parse().unwrap()).await.unwrap();
        browser.select_chart(ChartSelection::Only(ChartKind::Surgery));
        assert_eq!(browser.visible_charts().len(), 1);

        browser.analyse(&"2".parse().unwrap()).await.unwrap();

        assert_eq!(browser.selection(), ChartSelection::All);
        assert_eq!(browser.visible_charts().len(), 2);
        assert_eq!(browser.analysis().unwrap().cohort_name, "B");
        assert_eq!(browser.state(), &BrowserState::Idle);
        assert_eq!(api.calls().analyse, 2);
    }

    #[tokio::test]
    async fn select_chart_never_fetches() {
        let (mut browser, api, _) =
            browser_with(FakeApi::with_cohorts(vec![cohort("1", "A")]), true);
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();

        browser.select_chart(ChartSelection::Only(ChartKind::Walking));
        assert!(browser.visible_charts().is_empty());
        browser.select_chart(ChartSelection::All);
        assert_eq!(browser.visible_charts().len(), 1);

        assert_eq!(api.calls().analyse, 1);
    }

    #[tokio::test]
    async fn failed_analyse_clears_previous_result() {
        let (mut browser, api, prompter) =
            browser_with(FakeApi::with_cohorts(vec![cohort("1", "A")]), true);
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();
        api.fail_analyse();

        assert!(browser.analyse(&"1".parse().unwrap()).await.is_err());

        assert!(browser.analysis().is_none());
        assert!(browser.visible_charts().is_empty());
        assert_eq!(browser.state(), &BrowserState::Idle);
        assert_eq!(prompter.notices(), vec![Notice::AnalyseFailed]);
    }

    #[tokio::test]
    async fn deleting_analysed_cohort_clears_charts() {
        let (mut browser, _, _) = browser_with(
            FakeApi::with_cohorts(vec![cohort("1", "A"), cohort("2", "B")]),
            true,
        );
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();

        assert!(browser.remove(&"1".parse().unwrap()).await.unwrap());

        assert!(browser.cohorts().get(&"1".parse().unwrap()).is_none());
        assert!(browser.analysis().is_none());
    }

    #[tokio::test]
    async fn deleting_other_cohort_keeps_analysis() {
        let (mut browser, _, _) = browser_with(
            FakeApi::with_cohorts(vec![cohort("1", "A"), cohort("2", "B")]),
            true,
        );
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();

        browser.remove(&"2".parse().unwrap()).await.unwrap();

        assert_eq!(browser.analysis().unwrap().cohort_name, "A");
    }

    #[tokio::test]
    async fn refresh_drops_analysis_of_vanished_cohort() {
        let (mut browser, api, _) =
            browser_with(FakeApi::with_cohorts(vec![cohort("1", "A")]), true);
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();
        api.forget("1");

        browser.refresh().await.unwrap();

        assert!(browser.analysis().is_none());
        assert!(browser.selected_summary().is_none());
    }

    #[tokio::test]
    async fn summary_uses_cached_cohort() {
        let mut record = cohort("1", "Over 90s");
        record.count = 412;
        record.filters.set_age("90", "");
        record.filters.apply("sex", "Female").unwrap();
        let (mut browser, _, _) = browser_with(FakeApi::with_cohorts(vec![record]), true);
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();

        assert_eq!(
            browser.selected_summary(),
            Some(CohortSummary {
                name: "Over 90s".into(),
                patients: 412,
                filters_applied: 2,
            })
        );
    }

    #[tokio::test]
    async fn analysing_unknown_cohort_sends_nothing_and_clears_charts() {
        let (mut browser, api, prompter) =
            browser_with(FakeApi::with_cohorts(vec![cohort("1", "A")]), true);
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();

        let err = browser.analyse(&"9".parse().unwrap()).await.unwrap_err();

        assert!(matches!(err, CohortError::UnknownCohort(_)));
        assert_eq!(api.calls().analyse, 1);
        assert!(browser.analysis().is_none());
        assert!(browser.visible_charts().is_empty());
        assert_eq!(prompter.notices(), vec![Notice::AnalyseFailed]);
    }

    #[tokio::test]
    async fn failed_refresh_returns_to_idle_and_keeps_analysis() {
        let (mut browser, api, _) =
            browser_with(FakeApi::with_cohorts(vec![cohort("1", "A")]), true);
        browser.mount().await;
        browser.analyse(&"1".parse().unwrap()).await.unwrap();
        api.fail_list();

        assert!(browser.refresh().await.is_err());

        assert_eq!(browser.state(), &BrowserState::Idle);
        assert_eq!(browser.cohorts().len(), 1);
        assert_eq!(browser.analysis().unwrap().cohort_name, "A");
        assert_eq!(browser.visible_charts().len(), 1);
    }
}
