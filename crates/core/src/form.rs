//! The cohort builder form.
//!
//! Holds the filter selections, the last computed count and the save dialog state. The form
//! also keeps its own copy of the saved cohort list, shown alongside it.

use crate::api::CohortApi;
use crate::cache::CohortCache;
use crate::cohort::NewCohort;
use crate::filters::{FieldValue, FilterSet, SelectionMode};
use crate::prompt::{Notice, Prompter};
use crate::{CohortError, CohortResult};
use cohort_types::{CohortId, CohortName};
use registry::FilterField;
use std::sync::Arc;

/// What the result area beside the form shows. Error and count are never shown together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultPanel<'a> {
    Error(&'a str),
    Count(u64),
    Building,
    /// Nothing built yet.
    Placeholder,
}

pub struct FilterForm {
    api: Arc<dyn CohortApi>,
    prompter: Arc<dyn Prompter>,
    filters: FilterSet,
    count: Option<u64>,
    error: Option<String>,
    loading: bool,
    save_dialog_open: bool,
    cohort_name: String,
    saved: CohortCache,
}

impl FilterForm {
    pub fn new(api: Arc<dyn CohortApi>, prompter: Arc<dyn Prompter>, mode: SelectionMode) -> Self {
        Self {
            api,
            prompter,
            filters: FilterSet::new(mode),
            count: None,
            error: None,
            loading: false,
            save_dialog_open: false,
            cohort_name: String::new(),
            saved: CohortCache::new(),
        }
    }

    /// Load the saved cohort list. A failure is logged and leaves the list empty.
    pub async fn mount(&mut self) {
        if let Err(e) = self.saved.refresh(self.api.as_ref()).await {
            tracing::error!("failed to load saved cohorts: {e}");
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn saved(&self) -> &CohortCache {
        &self.saved
    }

    pub fn set_field(&mut self, field: FilterField, value: FieldValue) -> CohortResult<()> {
        self.filters.set_field(field, value)
    }

    pub fn toggle_option(&mut self, field: FilterField, option: &str) -> CohortResult<bool> {
        self.filters.toggle_option(field, option)
    }

    /// Apply a `key=value` style edit using wire names (`minAge`, `sex`, ...).
    pub fn apply(&mut self, key: &str, value: &str) -> CohortResult<()> {
        self.filters.apply(key, value)
    }

    /// Send the filters to the count endpoint.
    ///
    /// A failure is stored as the form error. The previous count is kept but hidden while the
    /// error is set.
    pub async fn submit(&mut self) {
        self.loading = true;
        self.error = None;

        match self.api.count(&self.filters).await {
            Ok(count) => {
                tracing::info!("cohort matches {count} patients");
                self.count = Some(count);
            }
            Err(e) => {
                tracing::error!("failed to build cohort: {e}");
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
    }

    pub fn result_panel(&self) -> ResultPanel<'_> {
        if let Some(error) = &self.error {
            return ResultPanel::Error(error);
        }
        if let Some(count) = self.count {
            return ResultPanel::Count(count);
        }
        if self.loading {
            return ResultPanel::Building;
        }
        ResultPanel::Placeholder
    }

    pub fn is_save_dialog_open(&self) -> bool {
        self.save_dialog_open
    }

    pub fn open_save_dialog(&mut self) {
        self.save_dialog_open = true;
    }

    pub fn cancel_save(&mut self) {
        self.save_dialog_open = false;
        self.cohort_name.clear();
    }

    pub fn cohort_name(&self) -> &str {
        &self.cohort_name
    }

    pub fn set_cohort_name(&mut self, name: impl Into<String>) {
        self.cohort_name = name.into();
    }

    /// Save the current filters and count under the name in the save dialog.
    pub async fn save(&mut self) -> CohortResult<()> {
        let name = self.cohort_name.clone();
        self.save_as(&name).await
    }

    /// Save the current filters and count as `name`.
    ///
    /// A blank name or a missing count is rejected with [`Notice::Invalid`] and nothing is sent.
    /// On success the name is cleared, the dialog closed and the saved list reloaded.
    pub async fn save_as(&mut self, name: &str) -> CohortResult<()> {
        let name = match CohortName::new(name) {
            Ok(name) => name,
            Err(e) => {
                self.prompter.notify(Notice::Invalid(e.to_string()));
                return Err(e.into());
            }
        };
        let Some(count) = self.count else {
            let err = CohortError::CountRequired;
            self.prompter.notify(Notice::Invalid(err.to_string()));
            return Err(err);
        };

        let body = NewCohort {
            name,
            filters: self.filters.clone(),
            count,
        };

        match self.api.create(&body).await {
            Ok(stored) => {
                tracing::info!("saved cohort {} as {}", stored.name, stored.id);
                self.cohort_name.clear();
                self.save_dialog_open = false;
                if let Err(e) = self.saved.refresh(self.api.as_ref()).await {
                    tracing::warn!("failed to reload cohorts after save: {e}");
                }
                self.prompter.notify(Notice::Saved {
                    name: body.name.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to save cohort: {e}");
                self.prompter.notify(Notice::SaveFailed);
                Err(e)
            }
        }
    }

    /// Delete a saved cohort after confirmation.
    pub async fn remove(&mut self, id: &CohortId) -> CohortResult<bool> {
        self.saved
            .remove(self.api.as_ref(), self.prompter.as_ref(), id)
            .await
    }
}
