//! PR lifecycle: the OPEN -> MERGED transition and per-user review
//! listings.

use super::Engine;
use crate::error::{EngineError, Resource};
use crate::model::{PrId, PrRecord, PrStatus, PullRequest, UserId};

impl Engine {
    /// Mark a PR merged and return it with its final reviewer set.
    ///
    /// Merging an already-merged PR is not an error: the current state is
    /// returned unchanged. Once this call succeeds no reviewer binding can
    /// be added or removed — reassignment rejects merged PRs.
    pub async fn merge_pr(&self, pr_id: &PrId) -> Result<PullRequest, EngineError> {
        let mut record = self
            .store()
            .get_pr(pr_id)
            .await?
            .ok_or(EngineError::NotFound(Resource::PullRequest))?;

        if record.status != PrStatus::Merged {
            self.store().set_pr_status(pr_id, PrStatus::Merged).await?;
            record.status = PrStatus::Merged;
        }

        let reviewers = self.store().pr_reviewers(pr_id).await?;
        Ok(PullRequest::from_record(record, reviewers))
    }

    /// PRs on which the given user is currently bound as a reviewer.
    pub async fn user_reviews(&self, user_id: &UserId) -> Result<Vec<PrRecord>, EngineError> {
        if self.store().get_user(user_id).await?.is_none() {
            return Err(EngineError::NotFound(Resource::User));
        }
        Ok(self.store().prs_reviewed_by(user_id).await?)
    }
}
