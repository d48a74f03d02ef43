//! Protocol encoders.
//!
//! Turn an [`Operation`] for a vendor into the [`Payload`] the transport
//! sends. Every payload is built fresh and never mutated afterwards.

mod encode;
pub mod payload;
pub mod scn;

pub use encode::{encode, encode_peek_changes, encode_scn_request, encode_terminal_stage};
pub use payload::{HttpRequest, Payload, SnmpRequest, TerminalCommand, TerminalScript};
pub use scn::{Scn, scn_to_ascii};

use std::fmt;

use serde::Serialize;

use crate::error::CodecError;
use crate::platform::Vendor;

/// What to do with a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read the current state
    GetState,
    /// Select a stage; 0 hands control back to the controller
    SetStage(u32),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetState => f.write_str("get-state"),
            Self::SetStage(stage) => write!(f, "set-stage {stage}"),
        }
    }
}

/// A stage request already checked against the vendor's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCommand {
    pub vendor: Vendor,
    pub stage: u32,
}

impl StageCommand {
    pub fn new(vendor: Vendor, stage: u32) -> Result<Self, CodecError> {
        vendor.profile().check_stage(stage)?;
        Ok(Self { vendor, stage })
    }
}
