//! Local copy of the saved cohort list.
//!
//! Both views keep one of these. It is only ever replaced wholesale from the backend, except
//! for a confirmed delete, which drops the entry straight away and then re-syncs.

use crate::api::CohortApi;
use crate::cohort::Cohort;
use crate::prompt::{delete_confirmation, Notice, Prompter};
use crate::{CohortError, CohortResult};
use cohort_types::CohortId;

#[derive(Clone, Debug, Default)]
pub struct CohortCache {
    cohorts: Vec<Cohort>,
}

impl CohortCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached cohorts in backend order.
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    pub fn get(&self, id: &CohortId) -> Option<&Cohort> {
        self.cohorts.iter().find(|c| &c.id == id)
    }

    /// Replace the cache with the backend's list.
    ///
    /// On failure the previous contents are kept and the error is returned.
    pub async fn refresh(&mut self, api: &dyn CohortApi) -> CohortResult<()> {
        let cohorts = api.list().await?;
        tracing::debug!("loaded {} saved cohorts", cohorts.len());
        self.cohorts = cohorts;
        Ok(())
    }

    /// Confirm, then delete a cohort and re-sync.
    ///
    /// Returns `Ok(false)` if the user declined, in which case nothing is sent. A failed delete
    /// raises [`Notice::DeleteFailed`] and leaves the cache untouched. A failed re-sync after a
    /// successful delete is logged and otherwise ignored.
    pub async fn remove(
        &mut self,
        api: &dyn CohortApi,
        prompter: &dyn Prompter,
        id: &CohortId,
    ) -> CohortResult<bool> {
        let name = self
            .get(id)
            .map(|c| c.name.clone())
            .ok_or_else(|| CohortError::UnknownCohort(id.clone()))?;

        if !prompter.confirm(&delete_confirmation(&name)).await {
            return Ok(false);
        }

        if let Err(e) = api.delete(id).await {
            tracing::error!("failed to delete cohort {id}: {e}");
            prompter.notify(Notice::DeleteFailed);
            return Err(e);
        }

        self.cohorts.retain(|c| &c.id != id);
        if let Err(e) = self.refresh(api).await {
            tracing::warn!("failed to reload cohorts after delete: {e}");
        }
        Ok(true)
    }
}
