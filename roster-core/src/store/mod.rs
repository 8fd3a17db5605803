//! Directory store abstraction.
//!
//! This module defines the [`DirectoryStore`] trait — the narrow data-access
//! contract the engine is built against. Implementations provide different
//! backends; [`MemoryDirectory`] lives here for tests and ephemeral use, the
//! SQLite backend lives in the server crate.
//!
//! The engine performs no multi-step transactions: each trait method is a
//! single atomic read or write, and a sequence of calls can be observed
//! partially completed if one of them fails.

mod memory;

pub use memory::MemoryDirectory;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{PrId, PrRecord, PrStatus, Team, TeamId, User, UserId};

/// Failure inside a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A backend operation failed. `operation` names the store call so the
    /// log line identifies the failing statement without a backtrace.
    #[error("store operation '{operation}' failed: {detail}")]
    Storage {
        operation: &'static str,
        detail: String,
    },

    /// A stored record could not be interpreted, e.g. an unknown PR status.
    #[error("corrupt record: {0}")]
    Corruption(&'static str),
}

impl StoreError {
    pub fn storage(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            detail: detail.into(),
        }
    }
}

/// Durable record of users, teams, membership, PRs, reviewer bindings, and
/// assignment events.
///
/// Lookups return `Ok(None)` for absent records; `Err` is reserved for
/// backend failures. Writes against absent parents (e.g. binding a reviewer
/// to an unknown PR) are backend errors, not engine-level conditions — the
/// engine checks its preconditions before writing.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    // Users

    /// Create the user, or update the display name if the id is taken.
    /// Leaves the active flag of an existing user untouched; new users start
    /// active.
    async fn upsert_user(&self, id: &UserId, name: &str) -> Result<(), StoreError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    async fn set_user_active(&self, id: &UserId, active: bool) -> Result<(), StoreError>;

    // Teams

    async fn team_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Create a team and return its surrogate id. The name must be unused.
    async fn create_team(&self, name: &str) -> Result<TeamId, StoreError>;

    /// Bind a user to a team. Idempotent per (team, user) pair.
    async fn add_member(&self, team: TeamId, user: &UserId) -> Result<(), StoreError>;

    async fn get_team(&self, name: &str) -> Result<Option<Team>, StoreError>;

    /// All members of the team with their current active flags.
    async fn team_members(&self, name: &str) -> Result<Vec<User>, StoreError>;

    /// Active members of the team, excluding one user — the candidate pool
    /// for reviewer selection.
    async fn active_members_except(
        &self,
        name: &str,
        exclude: &UserId,
    ) -> Result<Vec<User>, StoreError>;

    /// The team a user belongs to, if any.
    async fn user_team(&self, id: &UserId) -> Result<Option<String>, StoreError>;

    /// Set every member of the team inactive in one bulk write.
    async fn deactivate_team_members(&self, team: TeamId) -> Result<(), StoreError>;

    // Pull requests

    async fn pr_exists(&self, id: &PrId) -> Result<bool, StoreError>;

    /// Persist a new PR with status OPEN.
    async fn create_pr(&self, id: &PrId, title: &str, author: &UserId) -> Result<(), StoreError>;

    async fn get_pr(&self, id: &PrId) -> Result<Option<PrRecord>, StoreError>;

    async fn set_pr_status(&self, id: &PrId, status: PrStatus) -> Result<(), StoreError>;

    /// Bind a reviewer to a PR. Idempotent per (PR, user) pair.
    async fn add_reviewer(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError>;

    async fn remove_reviewer(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError>;

    /// Current reviewer bindings for a PR, in binding order.
    async fn pr_reviewers(&self, pr: &PrId) -> Result<Vec<User>, StoreError>;

    /// PRs on which the user is currently a reviewer.
    async fn prs_reviewed_by(&self, user: &UserId) -> Result<Vec<PrRecord>, StoreError>;

    // Assignment events

    /// Append one assignment event for (PR, user), stamped with the current
    /// time by the store. Events are never updated or deleted.
    async fn record_assignment(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError>;

    /// Count of assignment events per user, over the full history.
    async fn assignment_counts(&self) -> Result<HashMap<String, u64>, StoreError>;
}
