//! Domain types for the reviewer assignment engine.
//!
//! Identifiers are newtypes so a user id can never be handed to an API that
//! expects a PR id. Wire-format concerns (serde renames etc.) live in the
//! server crate; these types are plain data.

use std::fmt;

/// Newtype for a user's opaque string identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Newtype for a pull request's opaque string identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrId(pub String);

impl fmt::Display for PrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PrId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PrId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Newtype for a team's surrogate numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamId(pub i64);

impl From<i64> for TeamId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A user as stored in the directory.
///
/// The `active` flag gates eligibility for new reviewer assignments; it does
/// not affect bindings the user already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub active: bool,
}

/// A team. Membership is held in the store, not on this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

/// A member record supplied at team creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub user_id: UserId,
    pub username: String,
    pub active: bool,
}

/// Lifecycle status of a pull request.
///
/// The only transition is `Open` -> `Merged`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }

    /// Parse the stored representation. Returns `None` for anything the
    /// store should never contain.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "MERGED" => Some(Self::Merged),
            _ => None,
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pull request row as the store holds it, without the reviewer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRecord {
    pub id: PrId,
    pub title: String,
    pub author: UserId,
    pub status: PrStatus,
}

/// A pull request with its current reviewer bindings resolved.
///
/// The reviewer list is whatever is actually bound in the store at the time
/// the operation returned — after a partial assignment failure it can be
/// smaller than the two reviewers the engine aimed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: PrId,
    pub title: String,
    pub author: UserId,
    pub status: PrStatus,
    pub reviewers: Vec<User>,
}

impl PullRequest {
    pub fn from_record(record: PrRecord, reviewers: Vec<User>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            status: record.status,
            reviewers,
        }
    }

    /// Reviewer ids in binding order.
    pub fn reviewer_ids(&self) -> Vec<UserId> {
        self.reviewers.iter().map(|u| u.id.clone()).collect()
    }
}
