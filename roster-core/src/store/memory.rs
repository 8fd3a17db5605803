//! In-memory implementation of [`DirectoryStore`].
//!
//! All state is held in maps behind a `tokio::sync::RwLock` and lost when
//! the process exits. This is the substitutable fake the engine tests run
//! against, and it doubles as a reference for what each contract method is
//! supposed to do.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DirectoryStore, StoreError};
use crate::model::{PrId, PrRecord, PrStatus, Team, TeamId, User, UserId};

/// One appended assignment event.
#[derive(Debug, Clone)]
struct AssignmentEvent {
    #[allow(dead_code)] // kept so the record matches the durable schema
    pr: PrId,
    user: UserId,
    #[allow(dead_code)]
    recorded_at: i64,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    /// Team name -> surrogate id.
    teams: HashMap<String, TeamId>,
    /// Surrogate id -> team name (reverse of `teams`).
    team_names: HashMap<TeamId, String>,
    next_team_id: i64,
    /// Members per team, in insertion order.
    members: HashMap<TeamId, Vec<UserId>>,
    /// The single team a user belongs to.
    user_team: HashMap<UserId, TeamId>,
    prs: HashMap<PrId, PrRecord>,
    /// Reviewer bindings per PR, in binding order.
    reviewers: HashMap<PrId, Vec<UserId>>,
    events: Vec<AssignmentEvent>,
}

/// In-memory directory store.
pub struct MemoryDirectory {
    inner: RwLock<Inner>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn now_secs() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn upsert_user(&self, id: &UserId, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(id) {
            Some(user) => user.name = name.to_string(),
            None => {
                inner.users.insert(
                    id.clone(),
                    User {
                        id: id.clone(),
                        name: name.to_string(),
                        active: true,
                    },
                );
            }
        }
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).cloned())
    }

    async fn set_user_active(&self, id: &UserId, active: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(id) {
            user.active = active;
        }
        Ok(())
    }

    async fn team_exists(&self, name: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.teams.contains_key(name))
    }

    async fn create_team(&self, name: &str) -> Result<TeamId, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.teams.contains_key(name) {
            return Err(StoreError::storage("create_team", "team name already taken"));
        }
        inner.next_team_id += 1;
        let id = TeamId(inner.next_team_id);
        inner.teams.insert(name.to_string(), id);
        inner.team_names.insert(id, name.to_string());
        inner.members.insert(id, Vec::new());
        Ok(id)
    }

    async fn add_member(&self, team: TeamId, user: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let members = inner
            .members
            .get_mut(&team)
            .ok_or_else(|| StoreError::storage("add_member", "unknown team id"))?;
        if !members.contains(user) {
            members.push(user.clone());
        }
        inner.user_team.insert(user.clone(), team);
        Ok(())
    }

    async fn get_team(&self, name: &str) -> Result<Option<Team>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.teams.get(name).map(|id| Team {
            id: *id,
            name: name.to_string(),
        }))
    }

    async fn team_members(&self, name: &str) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let Some(team_id) = inner.teams.get(name) else {
            return Ok(Vec::new());
        };
        let member_ids = inner.members.get(team_id).cloned().unwrap_or_default();
        Ok(member_ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn active_members_except(
        &self,
        name: &str,
        exclude: &UserId,
    ) -> Result<Vec<User>, StoreError> {
        let members = self.team_members(name).await?;
        Ok(members
            .into_iter()
            .filter(|u| u.active && u.id != *exclude)
            .collect())
    }

    async fn user_team(&self, id: &UserId) -> Result<Option<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .user_team
            .get(id)
            .and_then(|team_id| inner.team_names.get(team_id).cloned()))
    }

    async fn deactivate_team_members(&self, team: TeamId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let member_ids = inner.members.get(&team).cloned().unwrap_or_default();
        for id in member_ids {
            if let Some(user) = inner.users.get_mut(&id) {
                user.active = false;
            }
        }
        Ok(())
    }

    async fn pr_exists(&self, id: &PrId) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.prs.contains_key(id))
    }

    async fn create_pr(&self, id: &PrId, title: &str, author: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.prs.contains_key(id) {
            return Err(StoreError::storage("create_pr", "pr id already taken"));
        }
        inner.prs.insert(
            id.clone(),
            PrRecord {
                id: id.clone(),
                title: title.to_string(),
                author: author.clone(),
                status: PrStatus::Open,
            },
        );
        inner.reviewers.insert(id.clone(), Vec::new());
        Ok(())
    }

    async fn get_pr(&self, id: &PrId) -> Result<Option<PrRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.prs.get(id).cloned())
    }

    async fn set_pr_status(&self, id: &PrId, status: PrStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.prs.get_mut(id) {
            Some(pr) => {
                pr.status = status;
                Ok(())
            }
            None => Err(StoreError::storage("set_pr_status", "unknown pr id")),
        }
    }

    async fn add_reviewer(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let bindings = inner
            .reviewers
            .get_mut(pr)
            .ok_or_else(|| StoreError::storage("add_reviewer", "unknown pr id"))?;
        if !bindings.contains(user) {
            bindings.push(user.clone());
        }
        Ok(())
    }

    async fn remove_reviewer(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(bindings) = inner.reviewers.get_mut(pr) {
            bindings.retain(|id| id != user);
        }
        Ok(())
    }

    async fn pr_reviewers(&self, pr: &PrId) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let bindings = inner.reviewers.get(pr).cloned().unwrap_or_default();
        Ok(bindings
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn prs_reviewed_by(&self, user: &UserId) -> Result<Vec<PrRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<PrRecord> = inner
            .reviewers
            .iter()
            .filter(|(_, bindings)| bindings.contains(user))
            .filter_map(|(pr_id, _)| inner.prs.get(pr_id).cloned())
            .collect();
        // Map iteration order is arbitrary; keep the listing stable.
        records.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(records)
    }

    async fn record_assignment(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.events.push(AssignmentEvent {
            pr: pr.clone(),
            user: user.clone(),
            recorded_at: Self::now_secs(),
        });
        Ok(())
    }

    async fn assignment_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        let inner = self.inner.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for event in &inner.events {
            *counts.entry(event.user.0.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
