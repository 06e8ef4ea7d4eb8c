//! HTTP handlers for the mock REST API.
//!
//! Each handler decodes the wire shape from [`crate::api`], delegates to the
//! backing [`ProposalToolApi`](crate::client::ProposalToolApi) and encodes
//! the result the way the real backend does.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    catalog_to_wire, ObservationKeyDto, SaveTelescopeRequest, SavedTelescopeChoices,
    TelescopeSchemasResponse,
};
use crate::models::{
    AllocatedBlock, AllocatedBlockId, AllocatedProposalId, CycleId, ModeGradeTotal,
    ObservationKey,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn observation_key(dto: &ObservationKeyDto) -> Result<ObservationKey, AppError> {
    ObservationKey::try_from(dto)
        .map_err(|e| AppError::BadRequest(format!("Invalid observation key: {}", e)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let telescopes = match state.api.telescope_names().await {
        Ok(names) => names.len().to_string(),
        Err(e) => format!("error: {}", e),
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        telescopes,
    })
}

// =============================================================================
// Optical telescopes
// =============================================================================

/// GET /pst/api/polarisMode
pub async fn polaris_mode(State(state): State<AppState>) -> HandlerResult<i64> {
    Ok(Json(state.api.polaris_mode().await?.code()))
}

/// GET /pst/api/opticalTelescopes/names
pub async fn telescope_names(State(state): State<AppState>) -> HandlerResult<Vec<String>> {
    Ok(Json(state.api.telescope_names().await?))
}

/// GET /pst/api/opticalTelescopes/telescopes
pub async fn telescope_schemas(
    State(state): State<AppState>,
) -> HandlerResult<TelescopeSchemasResponse> {
    let catalog = state.api.telescope_schemas().await?;
    Ok(Json(catalog_to_wire(&catalog)))
}

/// POST /pst/api/opticalTelescopes/load
///
/// Answers `null` when nothing was saved for the observation.
pub async fn load_configuration(
    State(state): State<AppState>,
    Json(body): Json<ObservationKeyDto>,
) -> HandlerResult<Option<SavedTelescopeChoices>> {
    let key = observation_key(&body)?;
    let saved = state.api.load_configuration(key).await?;
    Ok(Json(saved.map(|cfg| SaveTelescopeRequest::from(&cfg).into())))
}

/// PUT /pst/api/opticalTelescopes/save
pub async fn save_configuration(
    State(state): State<AppState>,
    Json(body): Json<SaveTelescopeRequest>,
) -> HandlerResult<bool> {
    let key = observation_key(&body.primary_key)?;
    debug!(%key, telescope = %body.telescope_name, fields = body.choices.len(), "save request");
    let configuration = SavedTelescopeChoices::from(body).into_configuration(key);
    Ok(Json(state.api.save_configuration(&configuration).await?))
}

/// DELETE /pst/api/opticalTelescopes/delete
pub async fn delete_configuration(
    State(state): State<AppState>,
    Json(body): Json<ObservationKeyDto>,
) -> HandlerResult<bool> {
    let key = observation_key(&body)?;
    Ok(Json(state.api.delete_configuration(key).await?))
}

// =============================================================================
// Proposal cycles
// =============================================================================

/// GET /pst/api/proposalCycles/{cycle}/observingTimeTotals
pub async fn observing_time_totals(
    State(state): State<AppState>,
    Path(cycle): Path<i64>,
) -> HandlerResult<Vec<ModeGradeTotal>> {
    Ok(Json(state.api.observing_time_totals(CycleId(cycle)).await?))
}

/// GET /pst/api/proposalCycles/{cycle}/allocatedProposals/{id}/allocatedBlocks
pub async fn allocated_blocks(
    State(state): State<AppState>,
    Path((cycle, allocated_proposal)): Path<(i64, i64)>,
) -> HandlerResult<Vec<AllocatedBlock>> {
    let blocks = state
        .api
        .allocated_blocks(CycleId(cycle), AllocatedProposalId(allocated_proposal))
        .await?;
    Ok(Json(blocks))
}

/// PUT /pst/api/proposalCycles/{cycle}/allocatedProposals/{id}/allocatedBlocks/{block}/resource
///
/// The amount arrives as a plain-text number.
pub async fn update_resource_amount(
    State(state): State<AppState>,
    Path((cycle, allocated_proposal, block)): Path<(i64, i64, i64)>,
    body: String,
) -> Result<StatusCode, AppError> {
    let amount: f64 = body
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid resource amount '{}'", body.trim())))?;
    state
        .api
        .update_resource_amount(
            CycleId(cycle),
            AllocatedProposalId(allocated_proposal),
            AllocatedBlockId(block),
            amount,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /pst/api/proposalCycles/{cycle}/availableResources/{name}/remaining
pub async fn resource_remaining(
    State(state): State<AppState>,
    Path((cycle, resource_name)): Path<(i64, String)>,
) -> HandlerResult<f64> {
    Ok(Json(
        state
            .api
            .resource_remaining(CycleId(cycle), &resource_name)
            .await?,
    ))
}
