//! Domain model for the Polaris proposal tool core.
//!
//! These are the typed entities the services work with. Wire shapes (what the
//! REST backend actually sends) live in [`crate::api`] and are converted into
//! these types once, at the client boundary.

#[macro_use]
pub mod macros;

pub mod allocation;
pub mod configuration;
pub mod ids;
pub mod investigator;
pub mod polaris_mode;
pub mod telescope;

pub use allocation::{AllocatedBlock, ModeGradeTotal};
pub use configuration::{
    ObservationConfiguration, ObservationKey, SkyCondition, TelescopeTime, TimeUnit, UserType,
    NO_SELECTION,
};
pub use ids::{AllocatedBlockId, AllocatedProposalId, CycleId, ObservationId, ProposalId};
pub use investigator::{pi_count, Investigator, InvestigatorKind};
pub use polaris_mode::PolarisMode;
pub use telescope::{
    Field, FieldKind, FieldValue, Instrument, Telescope, TelescopeCatalog, DEFAULT_TEXT_LIMIT,
};
