//! Team membership operations: creation with initial members, lookup,
//! per-user activity toggling, and bulk deactivation.

use super::Engine;
use crate::error::{EngineError, Resource};
use crate::model::{NewMember, Team, User, UserId};

impl Engine {
    /// Create a team and enrol its initial members.
    ///
    /// Each member record is applied as three independent writes: the user
    /// is created (or their display name updated), their active flag is set
    /// from the record, and they are bound to the team. There is no
    /// transaction around the loop — a failure partway leaves the team and
    /// the members processed so far persisted.
    pub async fn create_team(
        &self,
        name: &str,
        members: &[NewMember],
    ) -> Result<Team, EngineError> {
        if self.store().team_exists(name).await? {
            return Err(EngineError::AlreadyExists(Resource::Team));
        }

        let team_id = self.store().create_team(name).await?;

        for member in members {
            self.store()
                .upsert_user(&member.user_id, &member.username)
                .await?;
            self.store()
                .set_user_active(&member.user_id, member.active)
                .await?;
            self.store().add_member(team_id, &member.user_id).await?;
        }

        Ok(Team {
            id: team_id,
            name: name.to_string(),
        })
    }

    /// Look up a team and its current member list.
    ///
    /// Member active flags are whatever the directory holds now, not a
    /// snapshot from creation time.
    pub async fn get_team(&self, name: &str) -> Result<(Team, Vec<User>), EngineError> {
        let team = self
            .store()
            .get_team(name)
            .await?
            .ok_or(EngineError::NotFound(Resource::Team))?;
        let members = self.store().team_members(name).await?;
        Ok((team, members))
    }

    /// Set a user's active flag and return their updated record together
    /// with the team they belong to, if any.
    ///
    /// Deactivation does not touch reviewer bindings the user already
    /// holds; it only removes them from future candidate pools.
    pub async fn set_user_active(
        &self,
        user_id: &UserId,
        active: bool,
    ) -> Result<(User, Option<String>), EngineError> {
        let mut user = self
            .store()
            .get_user(user_id)
            .await?
            .ok_or(EngineError::NotFound(Resource::User))?;

        self.store().set_user_active(user_id, active).await?;
        user.active = active;

        let team = self.store().user_team(user_id).await?;
        Ok((user, team))
    }

    /// Deactivate every current member of a team in one bulk write.
    ///
    /// `reassign_open_prs` is accepted for wire compatibility and ignored:
    /// open PRs keep their existing reviewer bindings, and deactivation
    /// only affects future candidate selection.
    pub async fn deactivate_team(
        &self,
        name: &str,
        reassign_open_prs: bool,
    ) -> Result<(), EngineError> {
        let team = self
            .store()
            .get_team(name)
            .await?
            .ok_or(EngineError::NotFound(Resource::Team))?;

        if reassign_open_prs {
            tracing::warn!(
                team = name,
                "reassign_open_prs requested; open PRs are left untouched"
            );
        }

        self.store().deactivate_team_members(team.id).await?;
        Ok(())
    }
}
