//! Per-host operation outcome.

use std::time::Duration;

use serde::Serialize;

use crate::error::ErrorRecord;
use crate::parser::{FieldValue, NormalizedStateMap};

/// Result of one operation on one host.
///
/// Serializes to the data fields merged with an `errors` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostResponse {
    /// Failures; empty on success.
    pub errors: Vec<ErrorRecord>,

    /// Normalized controller data; empty on failure.
    #[serde(flatten)]
    pub data: NormalizedStateMap,

    /// Time taken by the operation.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl HostResponse {
    /// Create a successful response.
    pub fn ok(data: NormalizedStateMap, elapsed: Duration) -> Self {
        Self {
            errors: Vec::new(),
            data,
            elapsed,
        }
    }

    /// Create a failed response.
    pub fn failed(error: ErrorRecord, elapsed: Duration) -> Self {
        Self {
            errors: vec![error],
            data: NormalizedStateMap::new(),
            elapsed,
        }
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get a data field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.data.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::fields;

    #[test]
    fn test_serializes_flat() {
        let mut data = NormalizedStateMap::new();
        data.insert(fields::CURRENT_STAGE, 4i64);
        data.insert(fields::CURRENT_MODE, "VA");
        let response = HostResponse::ok(data, Duration::from_millis(12));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"errors": [], "current_stage": 4, "current_mode": "VA"})
        );
    }

    #[test]
    fn test_failed_response() {
        let response = HostResponse::failed(ErrorRecord::TransportTimeout, Duration::ZERO);
        assert!(!response.is_success());
        assert!(response.data.is_empty());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"errors": ["request timed out"]}));
    }
}
