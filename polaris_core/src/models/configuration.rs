//! Saved per-observation telescope configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::ids::{ObservationId, ProposalId};

/// Placeholder entry offered first in the telescope and instrument selects.
pub const NO_SELECTION: &str = "None";

/// Identity of an observation configuration: (proposal, observation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationKey {
    pub proposal_id: ProposalId,
    pub observation_id: ObservationId,
}

impl ObservationKey {
    pub const fn new(proposal_id: i64, observation_id: i64) -> Self {
        Self {
            proposal_id: ProposalId(proposal_id),
            observation_id: ObservationId(observation_id),
        }
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.proposal_id, self.observation_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Hours,
    Nights,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 2] = [TimeUnit::Hours, TimeUnit::Nights];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "Hours",
            Self::Nights => "Nights",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hours" => Ok(Self::Hours),
            "nights" => Ok(Self::Nights),
            _ => Err(format!("Unknown telescope time unit: {}", s)),
        }
    }
}

/// Requested telescope time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeTime {
    pub value: f64,
    pub unit: TimeUnit,
}

impl TelescopeTime {
    pub fn new(value: f64, unit: TimeUnit) -> Result<Self, String> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!(
                "Telescope time must be a non-negative number, got {}",
                value
            ));
        }
        Ok(Self { value, unit })
    }
}

/// Moon condition requested for the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkyCondition {
    #[serde(rename = "Dark Moon")]
    DarkMoon,
    #[serde(rename = "Gray Moon")]
    GrayMoon,
    #[serde(rename = "Bright Moon")]
    BrightMoon,
    #[serde(rename = "None")]
    NoPreference,
}

impl SkyCondition {
    pub const ALL: [SkyCondition; 4] = [
        SkyCondition::DarkMoon,
        SkyCondition::GrayMoon,
        SkyCondition::BrightMoon,
        SkyCondition::NoPreference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DarkMoon => "Dark Moon",
            Self::GrayMoon => "Gray Moon",
            Self::BrightMoon => "Bright Moon",
            Self::NoPreference => NO_SELECTION,
        }
    }
}

impl FromStr for SkyCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown sky condition: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    Servicer,
    Visitor,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Servicer, UserType::Visitor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Servicer => "Servicer",
            Self::Visitor => "Visitor",
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "servicer" => Ok(Self::Servicer),
            "visitor" => Ok(Self::Visitor),
            _ => Err(format!("Unknown user type: {}", s)),
        }
    }
}

/// The per-observation record of the selected telescope/instrument and the
/// current field values, string-encoded as stored by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationConfiguration {
    pub key: ObservationKey,
    pub telescope_name: String,
    pub instrument_name: String,
    pub elements: BTreeMap<String, String>,
    pub telescope_time: Option<TelescopeTime>,
    pub condition: Option<SkyCondition>,
    pub user_type: Option<UserType>,
}

impl ObservationConfiguration {
    pub fn new(
        key: ObservationKey,
        telescope_name: impl Into<String>,
        instrument_name: impl Into<String>,
    ) -> Self {
        Self {
            key,
            telescope_name: telescope_name.into(),
            instrument_name: instrument_name.into(),
            elements: BTreeMap::new(),
            telescope_time: None,
            condition: None,
            user_type: None,
        }
    }

    pub fn with_element(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.elements.insert(name.into(), value.into());
        self
    }

    /// Whether this record was saved for the given telescope/instrument pair.
    pub fn matches_selection(&self, telescope: &str, instrument: &str) -> bool {
        self.telescope_name == telescope && self.instrument_name == instrument
    }
}
