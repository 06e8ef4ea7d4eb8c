//! Wire DTOs exchanged with the proposal tool REST backend.
//!
//! These types mirror the JSON the backend sends and accepts. They are
//! converted into the typed [`crate::models`] at the client boundary so that
//! nothing downstream ever handles the raw nested-map shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{
    Field, FieldKind, Instrument, ObservationConfiguration, ObservationId, ObservationKey,
    ProposalId, SkyCondition, Telescope, TelescopeCatalog, TelescopeTime, TimeUnit, UserType,
};

// =========================================================
// Telescope schema
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDto {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstrumentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub elements: BTreeMap<String, FieldDto>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelescopeDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentDto>,
}

/// Body of `GET /opticalTelescopes/telescopes`, keyed by telescope name.
pub type TelescopeSchemasResponse = BTreeMap<String, TelescopeDto>;

impl InstrumentDto {
    fn into_model(self, key: String) -> Instrument {
        let mut instrument = Instrument::new(key);
        for (field_name, dto) in self.elements {
            instrument.insert_field(Field::new(field_name, dto.kind, dto.values));
        }
        instrument
    }
}

impl TelescopeDto {
    fn into_model(self, key: String) -> Telescope {
        let mut telescope = Telescope::new(key);
        for (instrument_name, dto) in self.instruments {
            telescope.insert_instrument(dto.into_model(instrument_name));
        }
        telescope
    }
}

/// Convert the schema response into the typed catalog. Map keys win over the
/// embedded `name` fields, which the backend does not always fill in.
pub fn catalog_from_wire(body: TelescopeSchemasResponse) -> TelescopeCatalog {
    body.into_iter()
        .map(|(name, dto)| dto.into_model(name))
        .collect()
}

pub fn catalog_to_wire(catalog: &TelescopeCatalog) -> TelescopeSchemasResponse {
    catalog
        .telescopes()
        .map(|telescope| {
            let instruments = telescope
                .instruments()
                .map(|instrument| {
                    let elements = instrument
                        .fields()
                        .map(|field| {
                            (
                                field.name.clone(),
                                FieldDto {
                                    kind: field.kind.clone(),
                                    values: field.allowed_values.clone(),
                                },
                            )
                        })
                        .collect();
                    (
                        instrument.name.clone(),
                        InstrumentDto {
                            name: Some(instrument.name.clone()),
                            elements,
                        },
                    )
                })
                .collect();
            (
                telescope.name.clone(),
                TelescopeDto {
                    name: Some(telescope.name.clone()),
                    instruments,
                },
            )
        })
        .collect()
}

/// `GET /opticalTelescopes/names` answers either a bare array or
/// `{ names, length }` depending on the backend version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelescopeNamesResponse {
    List(Vec<String>),
    Wrapped {
        names: Vec<String>,
        #[serde(default)]
        length: Option<usize>,
    },
}

impl TelescopeNamesResponse {
    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::List(names) | Self::Wrapped { names, .. } => names,
        }
    }
}

// =========================================================
// Saved choices
// =========================================================

/// Observation key as the backend expects it: both ids as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationKeyDto {
    #[serde(rename = "proposalID")]
    pub proposal_id: String,
    #[serde(rename = "observationID")]
    pub observation_id: String,
}

impl From<ObservationKey> for ObservationKeyDto {
    fn from(key: ObservationKey) -> Self {
        Self {
            proposal_id: key.proposal_id.to_string(),
            observation_id: key.observation_id.to_string(),
        }
    }
}

impl TryFrom<&ObservationKeyDto> for ObservationKey {
    type Error = String;

    fn try_from(dto: &ObservationKeyDto) -> Result<Self, Self::Error> {
        Ok(ObservationKey {
            proposal_id: dto.proposal_id.parse::<ProposalId>()?,
            observation_id: dto.observation_id.parse::<ObservationId>()?,
        })
    }
}

/// Body of `POST /opticalTelescopes/load` and `DELETE /opticalTelescopes/delete`.
pub type LoadTelescopeRequest = ObservationKeyDto;

/// Body of `PUT /opticalTelescopes/save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTelescopeRequest {
    pub primary_key: ObservationKeyDto,
    pub telescope_name: String,
    pub instrument_name: String,
    pub choices: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope_time_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope_time_unit: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<SkyCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

impl From<&ObservationConfiguration> for SaveTelescopeRequest {
    fn from(cfg: &ObservationConfiguration) -> Self {
        Self {
            primary_key: cfg.key.into(),
            telescope_name: cfg.telescope_name.clone(),
            instrument_name: cfg.instrument_name.clone(),
            choices: cfg.elements.clone(),
            telescope_time_value: cfg.telescope_time.map(|t| t.value),
            telescope_time_unit: cfg.telescope_time.map(|t| t.unit),
            condition: cfg.condition,
            user_type: cfg.user_type,
        }
    }
}

/// Saved per-observation record as returned by `POST /opticalTelescopes/load`.
///
/// Deliberately distinct from [`TelescopeDto`]: this is a flat map of
/// field name to string-encoded value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTelescopeChoices {
    #[serde(default)]
    pub telescope_name: String,
    #[serde(default)]
    pub instrument_name: String,
    #[serde(default)]
    pub choices: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope_time_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telescope_time_unit: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<SkyCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

impl SavedTelescopeChoices {
    pub fn into_configuration(self, key: ObservationKey) -> ObservationConfiguration {
        let telescope_time = match (self.telescope_time_value, self.telescope_time_unit) {
            (Some(value), Some(unit)) => TelescopeTime::new(value, unit).ok(),
            _ => None,
        };
        ObservationConfiguration {
            key,
            telescope_name: self.telescope_name,
            instrument_name: self.instrument_name,
            elements: self.choices,
            telescope_time,
            condition: self.condition,
            user_type: self.user_type,
        }
    }
}

impl From<SaveTelescopeRequest> for SavedTelescopeChoices {
    fn from(req: SaveTelescopeRequest) -> Self {
        Self {
            telescope_name: req.telescope_name,
            instrument_name: req.instrument_name,
            choices: req.choices,
            telescope_time_value: req.telescope_time_value,
            telescope_time_unit: req.telescope_time_unit,
            condition: req.condition,
            user_type: req.user_type,
        }
    }
}

// =========================================================
// Error payload
// =========================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Error body produced by the backend for failed requests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<ErrorStack>,
}

impl ErrorPayload {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Human-readable text: `stack.message`, then `message`, else a generic
    /// fallback.
    pub fn display_message(&self) -> String {
        self.stack
            .as_ref()
            .and_then(|s| s.message.as_deref())
            .filter(|m| !m.is_empty())
            .or_else(|| self.message.as_deref().filter(|m| !m.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| "Unexpected error".to_string())
    }
}
