//! Request handlers. Each one unpacks the wire shape, calls a single engine
//! operation, and repacks the result; no policy lives here.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use roster_core::model::{NewMember, PrId, UserId};

use super::types::{
    CreatePrRequest, CreateTeamRequest, CreateTeamResponse, DeactivateTeamRequest,
    HealthResponse, MergePrRequest, PrBody, PrResponse, PrSummaryBody, ReassignRequest,
    ReassignResponse, SetActiveRequest, SetActiveResponse, StatsResponse, TeamBody, TeamQuery,
    UserQuery, UserResponse, UserReviewsResponse,
};
use super::ApiError;
use crate::AppState;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "roster",
        version: crate::service_version(),
    })
}

pub async fn create_team(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreateTeamResponse>), ApiError> {
    let members: Vec<NewMember> = req
        .members
        .iter()
        .map(|m| NewMember {
            user_id: UserId::from(m.user_id.as_str()),
            username: m.username.clone(),
            active: m.is_active,
        })
        .collect();

    state.engine.create_team(&req.team_name, &members).await?;

    // Re-read so the response reflects what was actually persisted.
    let (team, members) = state.engine.get_team(&req.team_name).await?;
    let body = CreateTeamResponse {
        team: TeamBody {
            team_name: team.name,
            members: members.into_iter().map(UserResponse::from).collect(),
        },
    };
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<TeamBody>, ApiError> {
    let team_name = query
        .team_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("team_name is required"))?;

    let (team, members) = state.engine.get_team(&team_name).await?;
    Ok(Json(TeamBody {
        team_name: team.name,
        members: members.into_iter().map(UserResponse::from).collect(),
    }))
}

pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<SetActiveResponse>, ApiError> {
    let user_id = UserId::from(req.user_id.as_str());
    let (user, team_name) = state.engine.set_user_active(&user_id, req.is_active).await?;
    Ok(Json(SetActiveResponse {
        user: UserResponse::with_team(user, team_name),
    }))
}

pub async fn user_reviews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let user_id = query
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("user_id is required"))?;

    let records = state
        .engine
        .user_reviews(&UserId::from(user_id.as_str()))
        .await?;
    Ok(Json(UserReviewsResponse {
        user_id,
        pull_requests: records.into_iter().map(PrSummaryBody::from).collect(),
    }))
}

pub async fn create_pr(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePrRequest>,
) -> Result<(StatusCode, Json<PrResponse>), ApiError> {
    let pr = state
        .engine
        .create_pr(
            &PrId::from(req.pull_request_id.as_str()),
            &req.pull_request_name,
            &UserId::from(req.author_id.as_str()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(PrResponse { pr: PrBody::from(pr) })))
}

pub async fn merge_pr(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MergePrRequest>,
) -> Result<Json<PrResponse>, ApiError> {
    let pr = state
        .engine
        .merge_pr(&PrId::from(req.pull_request_id.as_str()))
        .await?;
    Ok(Json(PrResponse { pr: PrBody::from(pr) }))
}

pub async fn reassign_reviewer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReassignRequest>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let (pr, replacement) = state
        .engine
        .reassign_reviewer(
            &PrId::from(req.pull_request_id.as_str()),
            &UserId::from(req.old_user_id.as_str()),
        )
        .await?;
    Ok(Json(ReassignResponse {
        pr: PrBody::from(pr),
        replaced_by: replacement.0,
    }))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let assignment_stats = state.engine.assignment_stats().await?;
    Ok(Json(StatsResponse {
        assignment_stats,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn deactivate_team(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
    Json(req): Json<DeactivateTeamRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .deactivate_team(&team, req.reassign_open_prs)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
