//! Vendor profile and static field-table definitions.

use std::time::Duration;

use super::{ProtocolFamily, Vendor};
use crate::error::CodecError;

/// Timeout and retry policy for one SNMP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnmpPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,

    /// Extra attempts after the first one times out.
    pub retries: u32,
}

impl SnmpPolicy {
    /// Create a new policy.
    pub const fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    /// Worst-case time the transport may spend on one request.
    pub fn budget(&self) -> Duration {
        self.timeout * (self.retries + 1)
    }
}

impl Default for SnmpPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 0)
    }
}

/// How a raw varbind value becomes a canonical field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDecoder {
    /// Printable text, trimmed
    Text,
    /// Signed integer
    Integer,
    /// Any non-zero value becomes 1
    Flag,
    /// First two soft-IO flag bits
    SoftFlags,
    /// Swarco phase status (rotated wire number or bitmask octet)
    SwarcoStage,
    /// Potok-S stage (wire value is stage + 1)
    PotokSStage,
    /// UG405 one-hot stage bitmask
    Ug405Stage,
    /// Status code looked up in a label table
    Status(&'static [(i64, &'static str)]),
}

/// One row of a vendor's OID table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Dotted OID without the site suffix.
    pub oid: &'static str,

    /// Canonical field name.
    pub field: &'static str,

    /// Value decoder.
    pub decoder: FieldDecoder,

    /// Whether the OID is suffixed with the site control number on the wire.
    pub scn_addressed: bool,
}

impl FieldSpec {
    /// A flat OID field.
    pub const fn flat(oid: &'static str, field: &'static str, decoder: FieldDecoder) -> Self {
        Self {
            oid,
            field,
            decoder,
            scn_addressed: false,
        }
    }

    /// A site-addressed (UG405) OID field.
    pub const fn addressed(oid: &'static str, field: &'static str, decoder: FieldDecoder) -> Self {
        Self {
            oid,
            field,
            decoder,
            scn_addressed: true,
        }
    }
}

/// Static, per-vendor configuration.
#[derive(Debug, Clone)]
pub struct VendorProfile {
    /// Vendor this profile describes.
    pub vendor: Vendor,

    /// Highest valid stage number (0 is always valid and means "release").
    pub max_stage: u32,

    /// Protocol used to read state.
    pub state_protocol: ProtocolFamily,

    /// Protocols able to set a stage; the first one is the default.
    pub set_stage_protocols: Vec<ProtocolFamily>,

    /// Policy for SNMP reads.
    pub snmp_get: SnmpPolicy,

    /// Policy for SNMP writes.
    pub snmp_set: SnmpPolicy,

    /// Timeout for each HTTP sub-request.
    pub http_timeout: Duration,
}

impl VendorProfile {
    /// Create a profile with conservative defaults.
    pub fn new(vendor: Vendor, state_protocol: ProtocolFamily) -> Self {
        Self {
            vendor,
            max_stage: 0,
            state_protocol,
            set_stage_protocols: vec![],
            snmp_get: SnmpPolicy::default(),
            snmp_set: SnmpPolicy::default(),
            http_timeout: Duration::from_secs(3),
        }
    }

    /// Set the highest valid stage.
    pub fn with_max_stage(mut self, max_stage: u32) -> Self {
        self.max_stage = max_stage;
        self
    }

    /// Add a protocol able to set stages.
    pub fn with_set_protocol(mut self, protocol: ProtocolFamily) -> Self {
        self.set_stage_protocols.push(protocol);
        self
    }

    /// Set the SNMP read policy.
    pub fn with_snmp_get(mut self, policy: SnmpPolicy) -> Self {
        self.snmp_get = policy;
        self
    }

    /// Set the SNMP write policy.
    pub fn with_snmp_set(mut self, policy: SnmpPolicy) -> Self {
        self.snmp_set = policy;
        self
    }

    /// Set the HTTP sub-request timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Default protocol for set-stage.
    pub fn default_set_protocol(&self) -> ProtocolFamily {
        self.set_stage_protocols
            .first()
            .copied()
            .unwrap_or(self.state_protocol)
    }

    /// Whether `protocol` can carry a set-stage for this vendor.
    pub fn supports_set_protocol(&self, protocol: ProtocolFamily) -> bool {
        self.set_stage_protocols.contains(&protocol)
    }

    /// Check a requested stage against this vendor's range.
    pub fn check_stage(&self, stage: u32) -> Result<(), CodecError> {
        if stage > self.max_stage {
            return Err(CodecError::StageOutOfRange {
                vendor: self.vendor,
                stage,
                max: self.max_stage,
            });
        }
        Ok(())
    }
}
