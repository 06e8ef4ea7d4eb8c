//! Mock proposal tool REST server.
//!
//! Serves the `/pst/api` endpoints used by [`HttpProposalToolApi`] from any
//! [`ProposalToolApi`], normally the in-memory [`LocalProposalToolApi`]. Used
//! for front-end development and end-to-end tests of the HTTP client.
//!
//! ```text
//! HTTP request ──► axum handler ──► ProposalToolApi ──► JSON / ErrorPayload
//! ```
//!
//! [`HttpProposalToolApi`]: crate::client::HttpProposalToolApi
//! [`ProposalToolApi`]: crate::client::ProposalToolApi
//! [`LocalProposalToolApi`]: crate::client::LocalProposalToolApi

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::{create_router, API_PREFIX};
pub use state::AppState;
