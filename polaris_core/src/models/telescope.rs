//! Optical telescope instrument schema.
//!
//! The backend describes, per telescope and per instrument, the set of
//! configuration fields an observer fills in. The schema is modelled as three
//! explicit levels ([`Telescope`] → [`Instrument`] → [`Field`]) so that it can
//! never be confused with the saved per-observation choices, which the wire
//! protocol happens to encode with a similar nested-map shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum characters accepted by text fields (VARCHAR limit on the backend).
pub const DEFAULT_TEXT_LIMIT: usize = 255;

/// Kind of input a field expects.
///
/// Kinds the client does not know are kept as [`FieldKind::Unrecognized`]
/// instead of failing the whole schema; renderers report and skip them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Single choice out of `allowed_values`.
    List,
    /// Free text.
    Text,
    /// Yes/no checkbox.
    Boolean,
    /// Raw kind value the client could not interpret.
    Unrecognized(String),
}

impl FieldKind {
    /// Decode a wire kind: `"LIST" | "TEXT" | "BOOLEAN"` (any case) or the
    /// numeric ordinals `0 | 1 | 2`.
    pub fn from_wire(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "LIST" => Self::List,
                "TEXT" => Self::Text,
                "BOOLEAN" | "BOOL" => Self::Boolean,
                _ => Self::Unrecognized(s.clone()),
            },
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(0) => Self::List,
                Some(1) => Self::Text,
                Some(2) => Self::Boolean,
                _ => Self::Unrecognized(n.to_string()),
            },
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::List => "LIST",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_wire(&raw))
    }
}

/// Current value of a field, typed by the field's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Choice(String),
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// String encoding used when the configuration is stored.
    pub fn encode(&self) -> String {
        match self {
            Self::Choice(s) | Self::Text(s) => s.clone(),
            Self::Flag(b) => b.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Choice(s) | Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// A named, typed configuration slot of an instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Ordered choices; only meaningful for [`FieldKind::List`].
    pub allowed_values: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, allowed_values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            allowed_values,
        }
    }

    pub fn list<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldKind::List,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text, Vec::new())
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean, Vec::new())
    }

    /// Value seeded when nothing was saved for this field.
    ///
    /// A list with no allowed values seeds the empty choice.
    pub fn default_value(&self) -> Option<FieldValue> {
        match &self.kind {
            FieldKind::List => Some(FieldValue::Choice(
                self.allowed_values.first().cloned().unwrap_or_default(),
            )),
            FieldKind::Text => Some(FieldValue::Text(String::new())),
            FieldKind::Boolean => Some(FieldValue::Flag(false)),
            FieldKind::Unrecognized(_) => None,
        }
    }

    /// True when the list offers exactly one value, i.e. there is no real choice.
    pub fn is_fixed_choice(&self) -> bool {
        self.kind == FieldKind::List && self.allowed_values.len() == 1
    }

    /// Coerce a stored string back into a typed value.
    ///
    /// Returns `None` when the stored value no longer fits the field (a choice
    /// outside `allowed_values`, text over `text_limit`), so callers fall back
    /// to the default.
    pub fn decode_stored(&self, raw: &str, text_limit: usize) -> Option<FieldValue> {
        let value = match &self.kind {
            FieldKind::List => FieldValue::Choice(raw.to_string()),
            FieldKind::Text => FieldValue::Text(raw.to_string()),
            FieldKind::Boolean => FieldValue::Flag(raw == "true"),
            FieldKind::Unrecognized(_) => return None,
        };
        self.validate(&value, text_limit).ok().map(|()| value)
    }

    /// Check that `value` is acceptable for this field.
    ///
    /// The empty choice is accepted for lists; it means "nothing selected".
    pub fn validate(&self, value: &FieldValue, text_limit: usize) -> Result<(), String> {
        match (&self.kind, value) {
            (FieldKind::List, FieldValue::Choice(choice)) => {
                if choice.is_empty() || self.allowed_values.iter().any(|v| v == choice) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is not an allowed value for {}",
                        choice, self.name
                    ))
                }
            }
            (FieldKind::Text, FieldValue::Text(text)) => {
                let len = text.chars().count();
                if len <= text_limit {
                    Ok(())
                } else {
                    Err(format!(
                        "{} exceeds the maximum of {} characters ({})",
                        self.name, text_limit, len
                    ))
                }
            }
            (FieldKind::Boolean, FieldValue::Flag(_)) => Ok(()),
            (FieldKind::Unrecognized(raw), _) => {
                Err(format!("{} has an unrecognised type '{}'", self.name, raw))
            }
            (kind, other) => Err(format!(
                "{} expects a {} value, got {:?}",
                self.name, kind, other
            )),
        }
    }
}

/// A named set of fields belonging to one telescope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instrument {
    pub name: String,
    fields: BTreeMap<String, Field>,
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.insert_field(field);
        self
    }

    /// Insert or replace a field; names are unique within an instrument.
    pub fn insert_field(&mut self, field: Field) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Telescope {
    pub name: String,
    instruments: BTreeMap<String, Instrument>,
}

impl Telescope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruments: BTreeMap::new(),
        }
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.insert_instrument(instrument);
        self
    }

    pub fn insert_instrument(&mut self, instrument: Instrument) {
        self.instruments.insert(instrument.name.clone(), instrument);
    }

    pub fn instrument(&self, name: &str) -> Option<&Instrument> {
        self.instruments.get(name)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    pub fn instrument_names(&self) -> Vec<String> {
        self.instruments.keys().cloned().collect()
    }
}

/// Every optical telescope known to the backend. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelescopeCatalog {
    telescopes: BTreeMap<String, Telescope>,
}

impl TelescopeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, telescope: Telescope) {
        self.telescopes.insert(telescope.name.clone(), telescope);
    }

    pub fn telescope(&self, name: &str) -> Option<&Telescope> {
        self.telescopes.get(name)
    }

    /// Three-level lookup: telescope → instrument.
    pub fn instrument(&self, telescope: &str, instrument: &str) -> Option<&Instrument> {
        self.telescope(telescope)?.instrument(instrument)
    }

    pub fn telescopes(&self) -> impl Iterator<Item = &Telescope> {
        self.telescopes.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.telescopes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.telescopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.telescopes.is_empty()
    }
}

impl FromIterator<Telescope> for TelescopeCatalog {
    fn from_iter<T: IntoIterator<Item = Telescope>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for telescope in iter {
            catalog.insert(telescope);
        }
        catalog
    }
}
