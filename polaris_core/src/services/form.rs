//! Schema-driven rendering of the optical telescope form.
//!
//! Produces a presentation-neutral description of the controls (what to
//! show, with which value and constraints) from a [`ConfigurationDraft`] and
//! the telescope catalog, and routes user input back into the draft.

use super::configuration::{ConfigurationDraft, ConfigurationSession, FieldState, UnrecognizedField};
use super::notifications::notify_failure;
use crate::client::ClientResult;
use crate::models::{
    FieldKind, FieldValue, SkyCondition, TelescopeCatalog, TimeUnit, UserType, NO_SELECTION,
};

/// Rows shown by text areas.
pub const TEXT_AREA_ROWS: u16 = 3;

/// A single-choice select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl {
    pub options: Vec<String>,
    /// Current value; `None` when nothing is selected.
    pub value: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Select(SelectControl),
    TextArea {
        value: String,
        rows: u16,
        max_length: usize,
        remaining: usize,
    },
    Checkbox {
        checked: bool,
    },
}

/// One rendered instrument field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldControl {
    /// Stable identity: telescope + instrument + field name.
    pub key: String,
    pub field: String,
    pub state: FieldState,
    pub control: Control,
}

/// The telescope-time / condition / user-type sub-form.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingControls {
    pub time_value: Option<f64>,
    pub time_unit: SelectControl,
    pub condition: SelectControl,
    pub user_type: SelectControl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedForm {
    pub telescope: SelectControl,
    /// Present once a telescope is chosen.
    pub instrument: Option<SelectControl>,
    /// Controls of the active instrument, in field-name order.
    pub fields: Vec<FieldControl>,
    pub timing: TimingControls,
    /// Fields omitted because their kind is unknown.
    pub skipped: Vec<UnrecognizedField>,
}

impl RenderedForm {
    pub fn field(&self, name: &str) -> Option<&FieldControl> {
        self.fields.iter().find(|c| c.field == name)
    }
}

/// Edit of a single instrument field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    /// `None` when the select was cleared.
    Select(Option<String>),
    Text(String),
    Checkbox(bool),
}

/// Any edit the form accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum FormInput {
    Telescope(Option<String>),
    Instrument(Option<String>),
    Field { name: String, input: FieldInput },
    TelescopeTime { value: f64, unit: TimeUnit },
    Condition(SkyCondition),
    UserType(UserType),
}

fn with_placeholder<I: IntoIterator<Item = String>>(names: I) -> Vec<String> {
    std::iter::once(NO_SELECTION.to_string())
        .chain(names)
        .collect()
}

fn enum_select(options: Vec<String>, value: Option<&str>) -> SelectControl {
    SelectControl {
        options,
        value: value.map(str::to_string),
        disabled: false,
    }
}

/// Describe the form for the current draft.
pub fn render(
    draft: &ConfigurationDraft,
    telescope_names: &[String],
    catalog: &TelescopeCatalog,
) -> RenderedForm {
    let telescope = SelectControl {
        options: with_placeholder(telescope_names.iter().cloned()),
        value: Some(draft.telescope().unwrap_or(NO_SELECTION).to_string()),
        disabled: false,
    };

    let instrument = draft.telescope().map(|name| SelectControl {
        options: with_placeholder(
            catalog
                .telescope(name)
                .map(|t| t.instrument_names())
                .unwrap_or_default(),
        ),
        value: Some(draft.instrument().unwrap_or(NO_SELECTION).to_string()),
        disabled: false,
    });

    let mut fields = Vec::new();
    let mut skipped = Vec::new();
    if let (Some(telescope_name), Some(instrument_name), Some(schema)) =
        (draft.telescope(), draft.instrument(), draft.schema())
    {
        for field in schema.fields() {
            let value = draft.field_value(&field.name);
            let control = match &field.kind {
                FieldKind::List => {
                    let current = value
                        .and_then(FieldValue::as_str)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                    let disabled = field.is_fixed_choice();
                    Control::Select(SelectControl {
                        options: field.allowed_values.clone(),
                        value: if disabled {
                            field.allowed_values.first().cloned()
                        } else {
                            current
                        },
                        disabled,
                    })
                }
                FieldKind::Text => {
                    let text = value
                        .and_then(FieldValue::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let used = text.chars().count();
                    Control::TextArea {
                        value: text,
                        rows: TEXT_AREA_ROWS,
                        max_length: draft.text_limit(),
                        remaining: draft.text_limit().saturating_sub(used),
                    }
                }
                FieldKind::Boolean => Control::Checkbox {
                    checked: value.and_then(FieldValue::as_flag).unwrap_or(false),
                },
                FieldKind::Unrecognized(raw) => {
                    skipped.push(UnrecognizedField {
                        field: field.name.clone(),
                        kind: raw.clone(),
                    });
                    continue;
                }
            };
            fields.push(FieldControl {
                key: format!("{}{}{}", telescope_name, instrument_name, field.name),
                field: field.name.clone(),
                state: draft.field_state(&field.name),
                control,
            });
        }
    }

    let timing = TimingControls {
        time_value: draft.telescope_time().map(|t| t.value),
        time_unit: enum_select(
            TimeUnit::ALL.iter().map(|u| u.as_str().to_string()).collect(),
            draft.telescope_time().map(|t| t.unit.as_str()),
        ),
        condition: enum_select(
            SkyCondition::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            draft.condition().map(|c| c.as_str()),
        ),
        user_type: enum_select(
            UserType::ALL.iter().map(|u| u.as_str().to_string()).collect(),
            draft.user_type().map(|u| u.as_str()),
        ),
    };

    RenderedForm {
        telescope,
        instrument,
        fields,
        timing,
        skipped,
    }
}

/// Route one edit into the draft.
///
/// # Returns
/// * Fields skipped when a new instrument's schema was applied
/// * `Err(ClientError::Validation)` when the value is rejected; the draft is
///   left unchanged
pub fn apply_input(
    draft: &mut ConfigurationDraft,
    catalog: &TelescopeCatalog,
    input: FormInput,
) -> ClientResult<Vec<UnrecognizedField>> {
    match input {
        FormInput::Telescope(name) => {
            draft.select_telescope(name.as_deref());
            Ok(Vec::new())
        }
        FormInput::Instrument(name) => draft.select_instrument(name.as_deref(), catalog),
        FormInput::Field { name, input } => {
            let value = match input {
                FieldInput::Select(choice) => FieldValue::Choice(choice.unwrap_or_default()),
                FieldInput::Text(text) => FieldValue::Text(text),
                FieldInput::Checkbox(checked) => FieldValue::Flag(checked),
            };
            draft.set_field(&name, value)?;
            Ok(Vec::new())
        }
        FormInput::TelescopeTime { value, unit } => {
            draft.set_telescope_time(value, unit)?;
            Ok(Vec::new())
        }
        FormInput::Condition(condition) => {
            draft.set_condition(condition);
            Ok(Vec::new())
        }
        FormInput::UserType(user_type) => {
            draft.set_user_type(user_type);
            Ok(Vec::new())
        }
    }
}

impl ConfigurationSession {
    /// Render the current draft. Unknown field kinds were already notified
    /// when the instrument's schema was applied.
    pub fn render(&self) -> RenderedForm {
        render(self.draft(), self.telescope_names(), self.catalog())
    }

    /// Apply an edit; rejected edits are notified.
    ///
    /// # Returns
    /// `true` if the draft accepted the edit
    pub fn apply_input(&mut self, input: FormInput) -> bool {
        let catalog = self.catalog_handle();
        match apply_input(self.draft_mut(), &catalog, input) {
            Ok(skipped) => {
                self.report_unrecognized(&skipped);
                true
            }
            Err(err) => {
                notify_failure(self.notifier(), "Invalid value", &err);
                false
            }
        }
    }
}
