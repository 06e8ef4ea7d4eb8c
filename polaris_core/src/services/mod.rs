//! Client-side services behind the proposal views.
//!
//! - `schema_store`: cached telescope names and instrument schemas
//! - `configuration`: per-observation draft and its async session
//! - `form`: schema-driven form description and input routing
//! - `allocation_table`: mode × grade totals grid
//! - `debounce` / `allocation_editor`: debounced resource-amount edits
//! - `scope`: cancellation bound to a view's lifetime
//! - `notifications`: user-facing outcome reports

pub mod allocation_editor;
pub mod allocation_table;
pub mod configuration;
pub mod debounce;
pub mod form;
pub mod notifications;
pub mod schema_store;
pub mod scope;


pub use allocation_editor::ResourceAmountEditor;
pub use allocation_table::{
    load_observing_time_table, GradeCell, ModeGradeGrid, ModeRow, TableState, GRADE_TOTALS_LABEL,
};
pub use configuration::{
    delete_observation_configuration, ConfigurationDraft, ConfigurationSession, FieldState,
    UnrecognizedField,
};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE_DELAY};
pub use form::{
    Control, FieldControl, FieldInput, FormInput, RenderedForm, SelectControl, TimingControls,
};
pub use notifications::{
    notify_failure, Notification, NotificationLevel, NotificationLog, Notifier,
};
pub use schema_store::SchemaStore;
pub use scope::ViewScope;
