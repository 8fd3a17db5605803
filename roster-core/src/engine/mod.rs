//! The reviewer assignment and PR lifecycle engine.
//!
//! [`Engine`] orchestrates every operation the service exposes: team
//! creation and bulk deactivation (`teams`), PR creation and reviewer
//! reassignment (`assignment`), merge and per-user review listings
//! (`lifecycle`), and assignment statistics (here). It holds no state of
//! its own beyond the injected [`DirectoryStore`], performs no multi-step
//! transactions, and never retries — partial completion of a multi-write
//! operation is surfaced in the returned data rather than rolled back.

mod assignment;
mod lifecycle;
mod teams;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EngineError;
use crate::store::DirectoryStore;

/// The engine. Cheap to clone; all clones share the same store.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DirectoryStore>,
}

impl Engine {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &dyn DirectoryStore {
        self.store.as_ref()
    }

    /// Per-user count of assignment events over the full history — every
    /// time a user became a reviewer, whether at PR creation or through
    /// reassignment.
    pub async fn assignment_stats(&self) -> Result<HashMap<String, u64>, EngineError> {
        Ok(self.store.assignment_counts().await?)
    }
}
