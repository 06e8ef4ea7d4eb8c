//! Per-observation telescope configuration state.
//!
//! [`ConfigurationDraft`] is the pure state of the optical telescope form:
//! the selected telescope and instrument, one typed value per field of the
//! active instrument, the timing sub-form, and a dirty flag. It merges the
//! saved record with the schema and validates every edit.
//!
//! [`ConfigurationSession`] wraps a draft with the async side: schema
//! loading, the saved-record round trip, and a cancellation scope bound to
//! the view that owns it.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::notifications::{notify_failure, Notification, Notifier};
use super::schema_store::SchemaStore;
use super::scope::ViewScope;
use crate::client::{ClientError, ClientResult, ErrorContext, ProposalToolApi};
use crate::models::{
    FieldKind, FieldValue, Instrument, ObservationConfiguration, ObservationKey, SkyCondition,
    TelescopeCatalog, TelescopeTime, TimeUnit, UserType, DEFAULT_TEXT_LIMIT, NO_SELECTION,
};

/// How a field obtained its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldState {
    /// No value yet (no schema applied).
    Unset,
    /// Seeded from the kind default or adopted from the saved record.
    Defaulted,
    /// Changed by the user since the schema was applied.
    UserEdited,
}

/// A field the client cannot render because its kind is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedField {
    pub field: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSlot {
    value: FieldValue,
    state: FieldState,
}

/// Editable state of one observation's telescope configuration.
#[derive(Debug, Clone)]
pub struct ConfigurationDraft {
    key: ObservationKey,
    telescope: Option<String>,
    instrument: Option<String>,
    schema: Option<Instrument>,
    fields: BTreeMap<String, FieldSlot>,
    saved: Option<ObservationConfiguration>,
    telescope_time: Option<TelescopeTime>,
    condition: Option<SkyCondition>,
    user_type: Option<UserType>,
    dirty: bool,
    text_limit: usize,
}

/// `None`, empty and the placeholder entry all mean "nothing selected".
fn normalize_selection(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty() && *n != NO_SELECTION)
        .map(str::to_string)
}

impl ConfigurationDraft {
    pub fn new(key: ObservationKey) -> Self {
        Self {
            key,
            telescope: None,
            instrument: None,
            schema: None,
            fields: BTreeMap::new(),
            saved: None,
            telescope_time: None,
            condition: None,
            user_type: None,
            dirty: false,
            text_limit: DEFAULT_TEXT_LIMIT,
        }
    }

    pub fn with_text_limit(mut self, text_limit: usize) -> Self {
        self.text_limit = text_limit;
        self
    }

    pub fn key(&self) -> ObservationKey {
        self.key
    }

    pub fn telescope(&self) -> Option<&str> {
        self.telescope.as_deref()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    /// Field set of the active instrument, once a schema has been applied.
    pub fn schema(&self) -> Option<&Instrument> {
        self.schema.as_ref()
    }

    pub fn saved(&self) -> Option<&ObservationConfiguration> {
        self.saved.as_ref()
    }

    pub fn text_limit(&self) -> usize {
        self.text_limit
    }

    pub fn telescope_time(&self) -> Option<TelescopeTime> {
        self.telescope_time
    }

    pub fn condition(&self) -> Option<SkyCondition> {
        self.condition
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.user_type
    }

    pub fn field_value(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).map(|slot| &slot.value)
    }

    pub fn field_state(&self, name: &str) -> FieldState {
        self.fields
            .get(name)
            .map(|slot| slot.state)
            .unwrap_or(FieldState::Unset)
    }

    /// Record the configuration loaded for this observation.
    ///
    /// When nothing is selected yet, the saved telescope, instrument and
    /// timing sub-form are adopted. A record saved for a different
    /// observation key is ignored.
    pub fn adopt_saved(&mut self, saved: Option<ObservationConfiguration>) {
        let Some(saved) = saved else {
            self.saved = None;
            return;
        };
        if saved.key != self.key {
            warn!(expected = %self.key, got = %saved.key, "ignoring saved configuration for another observation");
            return;
        }

        if self.telescope.is_none() {
            if let Some(telescope) = normalize_selection(Some(saved.telescope_name.as_str())) {
                self.telescope = Some(telescope);
                self.instrument = normalize_selection(Some(saved.instrument_name.as_str()));
                self.telescope_time = saved.telescope_time;
                self.condition = saved.condition;
                self.user_type = saved.user_type;
                debug!(key = %self.key, telescope = ?self.telescope, instrument = ?self.instrument, "adopted saved selection");
            }
        }
        self.saved = Some(saved);
    }

    /// Seed one value per field of `instrument`.
    ///
    /// Saved values are adopted only when the saved record belongs to the
    /// current telescope/instrument pair; everything else gets its kind
    /// default. Fields already present keep their value. Fields with an
    /// unknown kind are skipped and returned.
    pub fn apply_schema(&mut self, instrument: &Instrument) -> Vec<UnrecognizedField> {
        let saved_elements = match (&self.saved, &self.telescope, &self.instrument) {
            (Some(saved), Some(telescope), Some(current))
                if saved.matches_selection(telescope, current) =>
            {
                Some(&saved.elements)
            }
            _ => None,
        };

        let mut issues = Vec::new();
        let mut fields = BTreeMap::new();
        for field in instrument.fields() {
            if let FieldKind::Unrecognized(raw) = &field.kind {
                issues.push(UnrecognizedField {
                    field: field.name.clone(),
                    kind: raw.clone(),
                });
                continue;
            }

            if let Some(existing) = self.fields.remove(&field.name) {
                fields.insert(field.name.clone(), existing);
                continue;
            }

            let value = saved_elements
                .and_then(|elements| elements.get(&field.name))
                .and_then(|raw| field.decode_stored(raw, self.text_limit))
                .or_else(|| field.default_value());
            if let Some(value) = value {
                fields.insert(
                    field.name.clone(),
                    FieldSlot {
                        value,
                        state: FieldState::Defaulted,
                    },
                );
            }
        }

        self.fields = fields;
        self.schema = Some(instrument.clone());
        issues
    }

    /// Change the telescope. Clears the instrument and every field value.
    pub fn select_telescope(&mut self, name: Option<&str>) {
        let name = normalize_selection(name);
        if name == self.telescope {
            return;
        }
        self.telescope = name;
        self.instrument = None;
        self.clear_fields();
    }

    /// Change the instrument and seed the new instrument's defaults.
    ///
    /// # Returns
    /// * Fields skipped because their kind is unknown
    /// * `Err(ClientError::Validation)` when no telescope is selected
    pub fn select_instrument(
        &mut self,
        name: Option<&str>,
        catalog: &TelescopeCatalog,
    ) -> ClientResult<Vec<UnrecognizedField>> {
        let name = normalize_selection(name);
        if name == self.instrument {
            return Ok(Vec::new());
        }
        let Some(telescope) = self.telescope.clone() else {
            if name.is_none() {
                return Ok(Vec::new());
            }
            return Err(self.validation_error("Please select a telescope"));
        };

        self.instrument = name;
        self.clear_fields();

        let schema = self
            .instrument
            .as_deref()
            .and_then(|instrument| catalog.instrument(&telescope, instrument));
        Ok(match schema {
            Some(instrument) => self.apply_schema(instrument),
            None => Vec::new(),
        })
    }

    fn clear_fields(&mut self) {
        self.fields.clear();
        self.schema = None;
        self.saved = None;
        self.dirty = true;
    }

    /// Store a user edit after validating it against the field's kind.
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> ClientResult<()> {
        let field = self
            .schema
            .as_ref()
            .and_then(|schema| schema.field(name))
            .ok_or_else(|| self.validation_error(format!("Unknown field: {}", name)))?;
        field
            .validate(&value, self.text_limit)
            .map_err(|message| self.validation_error(message))?;

        self.fields.insert(
            name.to_string(),
            FieldSlot {
                value,
                state: FieldState::UserEdited,
            },
        );
        self.dirty = true;
        Ok(())
    }

    pub fn set_telescope_time(&mut self, value: f64, unit: TimeUnit) -> ClientResult<()> {
        let time = TelescopeTime::new(value, unit).map_err(|m| self.validation_error(m))?;
        self.telescope_time = Some(time);
        self.dirty = true;
        Ok(())
    }

    pub fn set_condition(&mut self, condition: SkyCondition) {
        self.condition = Some(condition);
        self.dirty = true;
    }

    pub fn set_user_type(&mut self, user_type: UserType) {
        self.user_type = Some(user_type);
        self.dirty = true;
    }

    /// Current values, string-encoded the way the backend stores them.
    pub fn elements(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(name, slot)| (name.clone(), slot.value.encode()))
            .collect()
    }

    /// Snapshot of the draft as a saveable record.
    pub fn to_configuration(&self) -> ClientResult<ObservationConfiguration> {
        let telescope = self
            .telescope
            .clone()
            .ok_or_else(|| self.validation_error("Please select a telescope"))?;
        let instrument = self
            .instrument
            .clone()
            .ok_or_else(|| self.validation_error("Please select a instrument"))?;

        Ok(ObservationConfiguration {
            key: self.key,
            telescope_name: telescope,
            instrument_name: instrument,
            elements: self.elements(),
            telescope_time: self.telescope_time,
            condition: self.condition,
            user_type: self.user_type,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_save(&self) -> bool {
        self.dirty && self.telescope.is_some() && self.instrument.is_some()
    }

    /// The backend accepted the current state.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
        if let Ok(configuration) = self.to_configuration() {
            self.saved = Some(configuration);
        }
    }

    fn validation_error(&self, message: impl Into<String>) -> ClientError {
        ClientError::validation_with_context(
            message,
            ErrorContext::new("edit_configuration")
                .with_entity("observation")
                .with_entity_id(self.key),
        )
    }
}

/// The optical telescope form of one observation, bound to a view.
pub struct ConfigurationSession {
    api: Arc<dyn ProposalToolApi>,
    notifier: Arc<dyn Notifier>,
    store: SchemaStore,
    scope: ViewScope,
    draft: ConfigurationDraft,
    telescope_names: Vec<String>,
    catalog: Arc<TelescopeCatalog>,
}

impl ConfigurationSession {
    /// Load names, schemas and the saved record, and build the draft.
    ///
    /// Failures are notified and degrade: missing schemas yield an empty
    /// form, a missing saved record yields a defaulted draft.
    pub async fn open(
        api: Arc<dyn ProposalToolApi>,
        notifier: Arc<dyn Notifier>,
        key: ObservationKey,
    ) -> Self {
        Self::open_with_text_limit(api, notifier, key, DEFAULT_TEXT_LIMIT).await
    }

    pub async fn open_with_text_limit(
        api: Arc<dyn ProposalToolApi>,
        notifier: Arc<dyn Notifier>,
        key: ObservationKey,
        text_limit: usize,
    ) -> Self {
        let store = SchemaStore::new(Arc::clone(&api), Arc::clone(&notifier));
        let mut session = Self {
            api,
            notifier,
            store,
            scope: ViewScope::new(),
            draft: ConfigurationDraft::new(key).with_text_limit(text_limit),
            telescope_names: Vec::new(),
            catalog: Arc::new(TelescopeCatalog::new()),
        };

        session.telescope_names = session.store.load_telescope_names(&session.scope).await;
        session.catalog = session.store.load_telescope_schemas(&session.scope).await;

        let saved = session.load_saved(key).await;
        session.draft.adopt_saved(saved);
        session.refresh_schema();
        info!(%key, telescope = ?session.draft.telescope(), "configuration session opened");
        session
    }

    /// Saved configuration of `key`; `None` when absent or on failure.
    pub async fn load_saved(&self, key: ObservationKey) -> Option<ObservationConfiguration> {
        match self.scope.run(self.api.load_configuration(key)).await {
            Ok(saved) => saved,
            Err(err) => {
                notify_failure(
                    self.notifier.as_ref(),
                    "Failed to load optical telescope data",
                    &err,
                );
                None
            }
        }
    }

    fn refresh_schema(&mut self) {
        let instrument = match (self.draft.telescope(), self.draft.instrument()) {
            (Some(telescope), Some(instrument)) => {
                self.catalog.instrument(telescope, instrument).cloned()
            }
            _ => None,
        };
        if let Some(instrument) = instrument {
            let issues = self.draft.apply_schema(&instrument);
            self.report_unrecognized(&issues);
        }
    }

    pub(super) fn report_unrecognized(&self, issues: &[UnrecognizedField]) {
        for issue in issues {
            warn!(field = %issue.field, kind = %issue.kind, "unrecognised field type");
            self.notifier.notify(Notification::error(
                "Unrecognised field type",
                format!("{} has unsupported type '{}'", issue.field, issue.kind),
            ));
        }
    }

    pub fn draft(&self) -> &ConfigurationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ConfigurationDraft {
        &mut self.draft
    }

    pub fn telescope_names(&self) -> &[String] {
        &self.telescope_names
    }

    pub fn catalog(&self) -> &TelescopeCatalog {
        &self.catalog
    }

    pub fn catalog_handle(&self) -> Arc<TelescopeCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Whether this deployment shows the optical telescope form.
    pub async fn optical_form_offered(&self) -> bool {
        self.store.optical_form_offered(&self.scope).await
    }

    pub fn select_telescope(&mut self, name: Option<&str>) {
        self.draft.select_telescope(name);
    }

    /// Select an instrument; unknown field kinds and a missing telescope are
    /// notified.
    pub fn select_instrument(&mut self, name: Option<&str>) {
        match self.draft.select_instrument(name, &self.catalog) {
            Ok(issues) => self.report_unrecognized(&issues),
            Err(err) => notify_failure(self.notifier.as_ref(), "Invalid selection", &err),
        }
    }

    /// Send the whole draft to the backend.
    ///
    /// # Returns
    /// * `true` when the backend accepted the write
    /// * `false` when nothing was sent (draft not dirty, incomplete
    ///   selection, disposed view) or the write failed; failures are
    ///   notified and the draft is kept as is
    pub async fn save(&mut self) -> bool {
        if !self.draft.is_dirty() {
            debug!(key = %self.draft.key(), "nothing to save");
            return false;
        }
        let configuration = match self.draft.to_configuration() {
            Ok(configuration) => configuration,
            Err(err) => {
                notify_failure(
                    self.notifier.as_ref(),
                    "Failed to update optical telescope data",
                    &err,
                );
                return false;
            }
        };

        match self
            .scope
            .run(self.api.save_configuration(&configuration))
            .await
        {
            Ok(true) => {
                self.draft.mark_saved();
                info!(key = %configuration.key, telescope = %configuration.telescope_name, "configuration saved");
                self.notifier.notify(Notification::success(
                    "Telescopes data Updated",
                    "telescope data saved",
                ));
                true
            }
            Ok(false) => {
                self.notifier.notify(Notification::error(
                    "Failed to update optical telescope data",
                    "The backend did not accept the configuration",
                ));
                false
            }
            Err(err) => {
                notify_failure(
                    self.notifier.as_ref(),
                    "Failed to update optical telescope data",
                    &err,
                );
                false
            }
        }
    }

    /// Cancel in-flight work; later results are discarded.
    pub fn dispose(&self) {
        self.scope.cancel();
    }
}

/// Remove an observation's saved configuration as part of deleting the
/// observation. Best effort: a failure is notified and swallowed, nothing is
/// rolled back.
pub async fn delete_observation_configuration(
    api: &dyn ProposalToolApi,
    notifier: &dyn Notifier,
    key: ObservationKey,
) -> bool {
    match api.delete_configuration(key).await {
        Ok(removed) => {
            debug!(%key, removed, "deleted observation configuration");
            removed
        }
        Err(err) => {
            warn!(%key, error = %err, "failed to delete observation configuration");
            notify_failure(
                notifier,
                "Failed to delete optical telescope data",
                &err,
            );
            false
        }
    }
}
