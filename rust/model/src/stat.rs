use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a stat, fixed when the ruleset is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    Int,
    Float,
    Bool,
    String,
}

impl StatType {
    /// Zero value used when a stat is declared without a default.
    pub fn zero(self) -> StatValue {
        match self {
            StatType::Int => StatValue::Int(0),
            StatType::Float => StatValue::Float(0.0),
            StatType::Bool => StatValue::Bool(false),
            StatType::String => StatValue::String(String::new()),
        }
    }

    /// Converts `value` into this type if it is compatible.
    ///
    /// Integers widen into floats; every other combination must match exactly.
    pub fn coerce(self, value: &StatValue) -> Option<StatValue> {
        match (self, value) {
            (StatType::Float, StatValue::Int(v)) => Some(StatValue::Float(*v as f64)),
            (expected, value) if value.stat_type() == expected => Some(value.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatType::Int => "int",
            StatType::Float => "float",
            StatType::Bool => "bool",
            StatType::String => "string",
        };
        f.write_str(name)
    }
}

/// Current or default value of a stat.
///
/// Encoded as the bare JSON scalar (`1`, `2.5`, `true`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl StatValue {
    pub fn stat_type(&self) -> StatType {
        match self {
            StatValue::Bool(_) => StatType::Bool,
            StatValue::Int(_) => StatType::Int,
            StatValue::Float(_) => StatType::Float,
            StatValue::String(_) => StatType::String,
        }
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        StatValue::Int(value)
    }
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        StatValue::Float(value)
    }
}

impl From<bool> for StatValue {
    fn from(value: bool) -> Self {
        StatValue::Bool(value)
    }
}

impl From<&str> for StatValue {
    fn from(value: &str) -> Self {
        StatValue::String(value.to_string())
    }
}

/// A stat tracked for every player of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    /// Key of the stat, unique within its ruleset
    pub name: String,
    /// Human-readable label
    pub label: String,
    pub stat_type: StatType,
    /// Value every player starts with
    pub default_value: StatValue,
}

impl Stat {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        stat_type: StatType,
        default_value: StatValue,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let default_value =
            stat_type
                .coerce(&default_value)
                .ok_or_else(|| ModelError::DefaultTypeMismatch {
                    stat: name.clone(),
                    expected: stat_type,
                    found: default_value.stat_type(),
                })?;

        Ok(Self {
            name,
            label: label.into(),
            stat_type,
            default_value,
        })
    }
}

/// Stat as submitted by a client; type and default may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatDraft {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub stat_type: Option<StatType>,
    #[serde(default)]
    pub default_value: Option<StatValue>,
}

impl StatDraft {
    /// Resolves the draft into a typed stat.
    ///
    /// A missing type is taken from the default value, a missing default is
    /// the type's zero value.
    pub fn into_stat(self) -> Result<Stat, ModelError> {
        let (stat_type, default_value) = match (self.stat_type, self.default_value) {
            (Some(ty), Some(value)) => (ty, value),
            (Some(ty), None) => (ty, ty.zero()),
            (None, Some(value)) => (value.stat_type(), value),
            (None, None) => return Err(ModelError::UntypedStat(self.name)),
        };
        Stat::new(self.name, self.label, stat_type, default_value)
    }
}
