//! Request and response shapes for the HTTP API.
//!
//! Field names follow the wire contract (`user_id`, `pull_request_name`,
//! ...) rather than the domain names, so conversions from the core types
//! live here and nowhere else.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use roster_core::model::{PrRecord, PullRequest, User};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub members: Vec<MemberPayload>,
}

#[derive(Debug, Deserialize)]
pub struct MemberPayload {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreatePrRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergePrRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateTeamRequest {
    /// Accepted for wire compatibility; the engine documents this as a
    /// no-op — open PRs keep their reviewers.
    #[serde(default)]
    pub reassign_open_prs: bool,
}

/// Query parameters are optional at the type level so their absence maps to
/// the error envelope instead of axum's default rejection.
#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

impl UserResponse {
    pub fn with_team(user: User, team_name: Option<String>) -> Self {
        Self {
            user_id: user.id.0,
            username: user.name,
            is_active: user.active,
            team_name,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::with_team(user, None)
    }
}

#[derive(Debug, Serialize)]
pub struct TeamBody {
    pub team_name: String,
    pub members: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub team: TeamBody,
}

#[derive(Debug, Serialize)]
pub struct SetActiveResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct PrBody {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub assigned_reviewers: Vec<String>,
}

impl From<PullRequest> for PrBody {
    fn from(pr: PullRequest) -> Self {
        let assigned_reviewers = pr.reviewers.iter().map(|u| u.id.0.clone()).collect();
        Self {
            pull_request_id: pr.id.0,
            pull_request_name: pr.title,
            author_id: pr.author.0,
            status: pr.status.as_str().to_string(),
            assigned_reviewers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrResponse {
    pub pr: PrBody,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PrBody,
    pub replaced_by: String,
}

/// A PR without its reviewer list, for per-user review listings.
#[derive(Debug, Serialize)]
pub struct PrSummaryBody {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl From<PrRecord> for PrSummaryBody {
    fn from(record: PrRecord) -> Self {
        Self {
            pull_request_id: record.id.0,
            pull_request_name: record.title,
            author_id: record.author.0,
            status: record.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PrSummaryBody>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub assignment_stats: HashMap<String, u64>,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::model::{PrId, PrStatus, UserId};

    #[test]
    fn pr_body_serializes_reviewer_ids_only() {
        let pr = PullRequest {
            id: PrId::from("pr-1"),
            title: "Add feature".to_string(),
            author: UserId::from("author1"),
            status: PrStatus::Open,
            reviewers: vec![User {
                id: UserId::from("r1"),
                name: "Reviewer".to_string(),
                active: true,
            }],
        };

        let body = PrBody::from(pr);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["pull_request_id"], "pr-1");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"], serde_json::json!(["r1"]));
    }

    #[test]
    fn user_response_omits_absent_team() {
        let user = User {
            id: UserId::from("u1"),
            name: "Alice".to_string(),
            active: false,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["username"], "Alice");
        assert_eq!(json["is_active"], false);
        assert!(json.get("team_name").is_none());
    }

    #[test]
    fn deactivate_request_defaults_the_flag() {
        let req: DeactivateTeamRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.reassign_open_prs);
    }
}
