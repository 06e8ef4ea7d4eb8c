//! Client core of the Polaris proposal tool's optical telescope support.
//!
//! - [`models`]: typed telescope schemas, saved configurations, allocations
//! - [`api`]: wire DTOs of the proposal tool REST backend
//! - [`client`]: the [`ProposalToolApi`](client::ProposalToolApi) seam with
//!   HTTP and in-memory implementations
//! - [`services`]: schema store, configuration draft and form, allocation
//!   table, debounced resource editing, view scopes, notifications
//! - [`config`] / [`logging`]: ambient setup
//! - `http`: mock REST server (feature `mock-server`)

pub mod api;
pub mod client;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;

#[cfg(feature = "mock-server")]
pub mod http;

pub use client::{ClientError, ClientFactory, ClientResult, ClientType, ProposalToolApi};
pub use config::ClientConfig;
pub use services::{
    ConfigurationDraft, ConfigurationSession, ModeGradeGrid, Notification, NotificationLog,
    Notifier, ResourceAmountEditor, ViewScope,
};
