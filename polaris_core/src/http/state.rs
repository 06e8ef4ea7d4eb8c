//! Shared state of the mock server.

use std::sync::Arc;

use crate::client::{ClientResult, LocalProposalToolApi, ProposalToolApi};

#[derive(Clone)]
pub struct AppState {
    /// Backend every handler delegates to.
    pub api: Arc<dyn ProposalToolApi>,
}

impl AppState {
    pub fn new(api: Arc<dyn ProposalToolApi>) -> Self {
        Self { api }
    }

    /// State backed by an in-memory store seeded with the optical
    /// telescope catalog.
    pub fn local() -> ClientResult<Self> {
        Ok(Self::new(Arc::new(LocalProposalToolApi::with_default_catalog()?)))
    }
}
