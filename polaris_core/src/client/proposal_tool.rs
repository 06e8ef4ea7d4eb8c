//! The typed seam between the client core and the proposal tool backend.

use async_trait::async_trait;

use super::error::ClientResult;
use crate::models::{
    AllocatedBlock, AllocatedBlockId, AllocatedProposalId, CycleId, ModeGradeTotal,
    ObservationConfiguration, ObservationKey, PolarisMode, TelescopeCatalog,
};

/// Backend operations used by the optical telescope form and the allocation
/// views.
///
/// Implementations decode transport failures into
/// [`ClientError`](super::ClientError) before returning; callers never see raw
/// status codes or bodies.
#[async_trait]
pub trait ProposalToolApi: Send + Sync {
    /// Which observing domains this deployment supports.
    async fn polaris_mode(&self) -> ClientResult<PolarisMode>;

    /// Names of the optical telescopes, in backend order.
    async fn telescope_names(&self) -> ClientResult<Vec<String>>;

    /// Full telescope → instrument → field schema.
    async fn telescope_schemas(&self) -> ClientResult<TelescopeCatalog>;

    /// Saved configuration for one observation.
    ///
    /// # Returns
    /// * `Ok(None)` when nothing has been saved yet
    async fn load_configuration(
        &self,
        key: ObservationKey,
    ) -> ClientResult<Option<ObservationConfiguration>>;

    /// Replace the saved configuration of `configuration.key`.
    async fn save_configuration(&self, configuration: &ObservationConfiguration)
        -> ClientResult<bool>;

    /// Remove the saved configuration of an observation, if any.
    async fn delete_configuration(&self, key: ObservationKey) -> ClientResult<bool>;

    /// Observing time per (mode, grade) summed over a cycle's allocations.
    async fn observing_time_totals(&self, cycle: CycleId) -> ClientResult<Vec<ModeGradeTotal>>;

    async fn allocated_blocks(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
    ) -> ClientResult<Vec<AllocatedBlock>>;

    /// Set the amount of one allocated block. Sent as a text/plain body.
    async fn update_resource_amount(
        &self,
        cycle: CycleId,
        allocated_proposal: AllocatedProposalId,
        block: AllocatedBlockId,
        amount: f64,
    ) -> ClientResult<()>;

    /// Amount of a resource type still unallocated in the cycle.
    async fn resource_remaining(&self, cycle: CycleId, resource_name: &str) -> ClientResult<f64>;
}
