//! Backend access.
//!
//! - `proposal_tool`: the [`ProposalToolApi`] trait
//! - `remote`: HTTP implementation on reqwest
//! - `local`: in-memory implementation for tests and offline development
//! - `factory`: builds a client from configuration

pub mod error;
pub mod factory;
#[cfg(feature = "local-api")]
pub mod local;
pub mod proposal_tool;
#[cfg(feature = "http-client")]
pub mod remote;

#[cfg(all(test, feature = "local-api"))]
mod local_tests;

pub use error::{ClientError, ClientResult, ErrorContext};
pub use factory::{ClientFactory, ClientType};
#[cfg(feature = "local-api")]
pub use local::{
    LocalProposalToolApi, RecordedRequest, DEFAULT_REQUEST_LOG_LIMIT, DEFAULT_TELESCOPE_NAMES,
};
pub use proposal_tool::ProposalToolApi;
#[cfg(feature = "http-client")]
pub use remote::HttpProposalToolApi;
