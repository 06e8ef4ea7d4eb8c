//! Router configuration for the mock REST API.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Path prefix of every backend endpoint.
pub const API_PREFIX: &str = "/pst/api";

/// Create the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive: this server only backs local development and tests.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/polarisMode", get(handlers::polaris_mode))
        .route("/opticalTelescopes/names", get(handlers::telescope_names))
        .route("/opticalTelescopes/telescopes", get(handlers::telescope_schemas))
        .route("/opticalTelescopes/load", post(handlers::load_configuration))
        .route("/opticalTelescopes/save", put(handlers::save_configuration))
        .route("/opticalTelescopes/delete", delete(handlers::delete_configuration))
        .route(
            "/proposalCycles/{cycle}/observingTimeTotals",
            get(handlers::observing_time_totals),
        )
        .route(
            "/proposalCycles/{cycle}/allocatedProposals/{allocated_proposal}/allocatedBlocks",
            get(handlers::allocated_blocks),
        )
        .route(
            "/proposalCycles/{cycle}/allocatedProposals/{allocated_proposal}/allocatedBlocks/{block}/resource",
            put(handlers::update_resource_amount),
        )
        .route(
            "/proposalCycles/{cycle}/availableResources/{resource_name}/remaining",
            get(handlers::resource_remaining),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
