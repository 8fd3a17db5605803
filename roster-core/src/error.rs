//! Error taxonomy for engine operations.
//!
//! Every user-visible failure maps to exactly one variant here; the
//! transport layer translates variants to status codes without inspecting
//! messages.

use std::fmt;

use crate::store::StoreError;

/// The kind of entity a `NotFound`/`AlreadyExists` failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Team,
    PullRequest,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Team => write!(f, "team"),
            Self::PullRequest => write!(f, "pull request"),
        }
    }
}

/// Typed failures returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A referenced user, team, or PR does not exist.
    #[error("{0} not found")]
    NotFound(Resource),

    /// A team name or PR id is already taken.
    #[error("{0} already exists")]
    AlreadyExists(Resource),

    /// A mutation was attempted on a PR whose status is MERGED.
    #[error("pull request is already merged")]
    AlreadyMerged,

    /// The reviewer named for reassignment is not bound to the PR.
    #[error("reviewer is not assigned to this pull request")]
    NotAssigned,

    /// No active replacement candidate exists in the relevant team.
    #[error("no active candidate in team")]
    NoCandidate,

    /// A precondition the engine cannot express as one of the kinds above,
    /// e.g. an assigned reviewer who belongs to no team.
    #[error("{0}")]
    Internal(String),

    /// The directory store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// True for the unclassified failures that surface as a 500 at the
    /// transport layer.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Store(_))
    }
}
