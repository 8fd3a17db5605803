//! Reviewer assignment: the initial draw at PR creation and the
//! remove-then-add swap on reassignment.

use tracing::warn;

use super::Engine;
use crate::error::{EngineError, Resource};
use crate::model::{PrId, PrStatus, PullRequest, User, UserId};
use crate::selection::{self, INITIAL_REVIEWERS};

impl Engine {
    /// Create a PR and draw up to two reviewers from the author's team.
    ///
    /// The PR is persisted before any reviewer is bound, so it exists even
    /// if the draw comes up empty or a binding fails. An author without a
    /// team gets a PR with no reviewers — not an error. The returned
    /// reviewer set is what was actually bound, which can be smaller than
    /// the draw if individual bindings fail.
    pub async fn create_pr(
        &self,
        pr_id: &PrId,
        title: &str,
        author: &UserId,
    ) -> Result<PullRequest, EngineError> {
        if self.store().pr_exists(pr_id).await? {
            return Err(EngineError::AlreadyExists(Resource::PullRequest));
        }
        if self.store().get_user(author).await?.is_none() {
            return Err(EngineError::NotFound(Resource::User));
        }

        let team = self.store().user_team(author).await?;

        self.store().create_pr(pr_id, title, author).await?;

        let mut bound = Vec::new();
        if let Some(team_name) = team {
            let picked = self
                .draw_candidates(&team_name, author, INITIAL_REVIEWERS)
                .await?;
            for candidate in picked {
                if let Err(err) = self.store().add_reviewer(pr_id, &candidate.id).await {
                    warn!(pr = %pr_id, reviewer = %candidate.id, error = %err,
                        "failed to bind reviewer; continuing without them");
                    continue;
                }
                if let Err(err) = self.store().record_assignment(pr_id, &candidate.id).await {
                    warn!(pr = %pr_id, reviewer = %candidate.id, error = %err,
                        "failed to record assignment event");
                }
                bound.push(candidate);
            }
        }

        Ok(PullRequest {
            id: pr_id.clone(),
            title: title.to_string(),
            author: author.clone(),
            status: PrStatus::Open,
            reviewers: bound,
        })
    }

    /// Swap one reviewer on an open PR for a random active teammate.
    ///
    /// The replacement pool is the outgoing reviewer's team, excluding only
    /// the outgoing reviewer. Removal happens before addition; if the add
    /// fails after the remove succeeded the PR is left with one reviewer
    /// fewer, which the returned reviewer set reflects.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &PrId,
        old_reviewer: &UserId,
    ) -> Result<(PullRequest, UserId), EngineError> {
        let record = self
            .store()
            .get_pr(pr_id)
            .await?
            .ok_or(EngineError::NotFound(Resource::PullRequest))?;

        if record.status == PrStatus::Merged {
            return Err(EngineError::AlreadyMerged);
        }

        let current = self.store().pr_reviewers(pr_id).await?;
        if !current.iter().any(|u| u.id == *old_reviewer) {
            return Err(EngineError::NotAssigned);
        }

        let team = self
            .store()
            .user_team(old_reviewer)
            .await?
            .ok_or_else(|| {
                EngineError::Internal(format!("reviewer {old_reviewer} belongs to no team"))
            })?;

        let picked = self.draw_candidates(&team, old_reviewer, 1).await?;
        let replacement = picked.into_iter().next().ok_or(EngineError::NoCandidate)?;

        self.store().remove_reviewer(pr_id, old_reviewer).await?;
        self.store().add_reviewer(pr_id, &replacement.id).await?;
        if let Err(err) = self
            .store()
            .record_assignment(pr_id, &replacement.id)
            .await
        {
            warn!(pr = %pr_id, reviewer = %replacement.id, error = %err,
                "failed to record assignment event");
        }

        let reviewers = self.store().pr_reviewers(pr_id).await?;
        let pr = PullRequest::from_record(record, reviewers);
        Ok((pr, replacement.id))
    }

    /// Fetch the eligible pool and draw from it with fresh entropy.
    async fn draw_candidates(
        &self,
        team: &str,
        exclude: &UserId,
        limit: usize,
    ) -> Result<Vec<User>, EngineError> {
        let pool = self.store().active_members_except(team, exclude).await?;
        // thread_rng is scoped so the future stays Send.
        let picked = {
            let mut rng = rand::thread_rng();
            selection::pick_candidates(pool, limit, &mut rng)
        };
        Ok(picked)
    }
}
