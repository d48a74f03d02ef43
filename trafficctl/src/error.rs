//! Error types for trafficctl.
//!
//! Internal failures are carried by the layered [`Error`] enum. Every host
//! operation converts whatever went wrong into a single [`ErrorRecord`], the
//! serializable outcome handed back to callers.

use std::io;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::platform::{ProtocolFamily, Vendor};

/// Main error type for trafficctl operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Wire-level errors (SNMP, HTTP, SSH)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Request encoding errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Session-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Vendor/platform errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Transport layer errors.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to reach the host or the host refused the request
    #[error("Connection failed to {host}: {message}")]
    ConnectionFailed { host: String, message: String },

    /// The host answered, but not like the declared controller family
    #[error("{host} did not answer as the expected controller: {message}")]
    BadControllerType { host: String, message: String },

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Well-formed reply carrying an error indication
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Server host key differs from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Server host key is not in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Classify this error into the per-host outcome taxonomy.
    pub fn record(&self) -> ErrorRecord {
        match self {
            Self::Timeout(_) => ErrorRecord::TransportTimeout,
            Self::BadControllerType { .. }
            | Self::HostKeyChanged { .. }
            | Self::HostKeyUnknown { .. } => ErrorRecord::BadControllerType,
            Self::Protocol(detail) => ErrorRecord::ProtocolError(detail.clone()),
            Self::AuthenticationFailed { .. } => ErrorRecord::ProtocolError(self.to_string()),
            Self::ConnectionFailed { .. }
            | Self::Ssh(_)
            | Self::Key(_)
            | Self::KnownHosts(_)
            | Self::Disconnected
            | Self::Io(_) => ErrorRecord::TransportConnectionFailed,
        }
    }
}

/// Request encoding errors. All of them are detected before any I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Requested stage is outside the vendor's range
    #[error("stage {stage} is out of range 0..={max} for {vendor}")]
    StageOutOfRange { vendor: Vendor, stage: u32, max: u32 },

    /// A site-addressed request was built without a site control number
    #[error("site control number is required for {0} requests")]
    MissingScn(ProtocolFamily),

    /// A named controller input does not exist
    #[error("input '{name}' not found on the controller")]
    InputNotFound { name: String },

    /// The vendor cannot serve the operation over this protocol
    #[error("{protocol} is not supported for {operation} on {vendor}")]
    UnsupportedProtocol {
        vendor: Vendor,
        protocol: ProtocolFamily,
        operation: &'static str,
    },
}

/// Session-level errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The host directory has no record for the token
    #[error("host '{token}' not found")]
    NotFound { token: String },

    /// The site control number could not be fetched
    #[error("SCN resolution failed: {message}")]
    ScnResolution { message: String },

    /// The reply parsed to nothing the vendor tables recognize
    #[error("reply from {host} contained no {vendor} fields")]
    EmptyResponse { host: String, vendor: Vendor },

    /// The controller terminal rejected a command
    #[error("terminal rejected '{command}': {message}")]
    TerminalRejected { command: String, message: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/vendor errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Vendor name is not one of the known controller types
    #[error("Unknown controller type: '{name}'")]
    UnknownVendor { name: String },
}

/// Result type alias using trafficctl's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Per-host outcome of a failed operation.
///
/// Records are appended to a [`HostResponse`](crate::driver::HostResponse)
/// and serialize to their display text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorRecord {
    #[error("request timed out")]
    TransportTimeout,

    #[error("connection failed")]
    TransportConnectionFailed,

    #[error("bad controller type")]
    BadControllerType,

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("invalid {field}: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("SCN resolution failed: {0}")]
    ScnResolutionFailed(String),

    #[error("host '{0}' not found")]
    NotFound(String),
}

impl ErrorRecord {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl Serialize for ErrorRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&CodecError> for ErrorRecord {
    fn from(err: &CodecError) -> Self {
        match err {
            CodecError::StageOutOfRange { .. } | CodecError::InputNotFound { .. } => {
                Self::validation("stage", err.to_string())
            }
            CodecError::UnsupportedProtocol { .. } => Self::validation("protocol", err.to_string()),
            CodecError::MissingScn(_) => Self::ScnResolutionFailed(err.to_string()),
        }
    }
}

impl From<&Error> for ErrorRecord {
    fn from(err: &Error) -> Self {
        match err {
            Error::Transport(e) => e.record(),
            Error::Codec(e) => e.into(),
            Error::Driver(DriverError::NotFound { token }) => Self::NotFound(token.clone()),
            Error::Driver(DriverError::ScnResolution { message }) => {
                Self::ScnResolutionFailed(message.clone())
            }
            Error::Driver(DriverError::EmptyResponse { .. }) => Self::BadControllerType,
            Error::Driver(e @ DriverError::TerminalRejected { .. }) => {
                Self::ProtocolError(e.to_string())
            }
            Error::Driver(DriverError::InvalidConfig { message }) => {
                Self::validation("config", message.clone())
            }
            Error::Platform(e @ PlatformError::UnknownVendor { .. }) => {
                Self::validation("type_controller", e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(1)).record(),
            ErrorRecord::TransportTimeout
        );
        assert_eq!(
            TransportError::ConnectionFailed {
                host: "10.0.0.1".into(),
                message: "refused".into()
            }
            .record(),
            ErrorRecord::TransportConnectionFailed
        );
        assert_eq!(
            TransportError::BadControllerType {
                host: "10.0.0.1".into(),
                message: "certificate".into()
            }
            .record(),
            ErrorRecord::BadControllerType
        );
        assert_eq!(
            TransportError::Protocol("genErr".into()).record(),
            ErrorRecord::ProtocolError("genErr".into())
        );
    }

    #[test]
    fn test_codec_errors_are_validation_records() {
        let err = Error::from(CodecError::StageOutOfRange {
            vendor: Vendor::Swarco,
            stage: 9,
            max: 8,
        });
        match ErrorRecord::from(&err) {
            ErrorRecord::ValidationError { field, reason } => {
                assert_eq!(field, "stage");
                assert!(reason.contains("0..=8"));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_is_bad_controller_type() {
        let err = Error::from(DriverError::EmptyResponse {
            host: "10.0.0.1".into(),
            vendor: Vendor::PotokS,
        });
        assert_eq!(ErrorRecord::from(&err), ErrorRecord::BadControllerType);
    }

    #[test]
    fn test_record_serializes_to_text() {
        let json = serde_json::to_string(&ErrorRecord::NotFound("11".into())).unwrap();
        assert_eq!(json, "\"host '11' not found\"");
    }
}
