//! Core of the reviewer assignment service: domain model, error taxonomy,
//! the directory-store contract with an in-memory implementation, uniform
//! candidate selection, and the engine that ties them together.
//!
//! Storage backends and the HTTP surface live in `roster-server`; this
//! crate is transport-free and testable end to end against
//! [`store::MemoryDirectory`].

pub mod engine;
pub mod error;
pub mod model;
pub mod selection;
pub mod store;

pub use engine::Engine;
pub use error::{EngineError, Resource};
pub use model::{
    NewMember, PrId, PrRecord, PrStatus, PullRequest, Team, TeamId, User, UserId,
};
pub use store::{DirectoryStore, MemoryDirectory, StoreError};
