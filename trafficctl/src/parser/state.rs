//! Canonical controller state model.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Canonical field names shared by every parser.
pub mod fields {
    pub const ADDRESS: &str = "address";
    pub const CURRENT_STAGE: &str = "current_stage";
    pub const CURRENT_PLAN: &str = "current_plan";
    pub const CURRENT_MODE: &str = "current_mode";
    pub const PLAN_SOURCE: &str = "plan_source";
    pub const FIXED_TIME_STATUS: &str = "fixed_time_status";
    pub const SOFT_FLAGS: &str = "soft_flags";
    pub const NUM_DETECTORS: &str = "num_detectors";
    pub const HAS_DET_FAULTS: &str = "has_det_faults";
    pub const IS_MANUAL: &str = "is_manual";
    pub const EQUIPMENT_STATUS: &str = "equipment_status";
    pub const STATUS_MODE: &str = "status_mode";
    pub const OPERATION_MODE: &str = "operation_mode";
    pub const LOCAL_ADAPTIVE_STATUS: &str = "local_adaptive_status";
    pub const FLASH: &str = "flash";
    pub const DARK: &str = "dark";
    pub const STATUS: &str = "status";
    pub const STREAMS: &str = "streams";
    pub const LIGHT_STATUS: &str = "light_status";
    pub const REQUESTED_STAGE: &str = "requested_stage";
    pub const INPUTS_CHANGED: &str = "inputs_changed";
    pub const COMMANDS_SENT: &str = "commands_sent";
}

/// A canonical scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    /// Integer view; numeric text is accepted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Text view (only for text values).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Ordered map from canonical field name to value.
///
/// This is the single output of every parser and the only input of mode
/// inference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedStateMap {
    fields: IndexMap<String, FieldValue>,
}

impl NormalizedStateMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Integer value of a field.
    pub fn int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_int)
    }

    /// Text value of a field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Whether a field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
