//! Server-only response bodies. Everything else reuses [`crate::api`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Telescopes known to the backend, or the error that prevented
    /// listing them.
    pub telescopes: String,
}
