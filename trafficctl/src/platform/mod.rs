//! Controller vendor definitions.
//!
//! This module defines the per-vendor tables: protocol families, stage
//! ranges, timeouts, OID/field tables and operating-mode inference.

mod definition;
pub mod mode;
mod registry;
pub mod vendors;

pub use definition::{FieldDecoder, FieldSpec, SnmpPolicy, VendorProfile};
pub use mode::{LightStatus, Mode, infer_light_status, infer_mode};
pub use registry::VendorRegistry;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PlatformError;

/// Traffic-light controller manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    Swarco,
    PotokP,
    PotokS,
    Peek,
}

impl Vendor {
    /// All known vendors.
    pub const ALL: [Vendor; 4] = [Vendor::Swarco, Vendor::PotokP, Vendor::PotokS, Vendor::Peek];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Swarco => "swarco",
            Self::PotokP => "potok_p",
            Self::PotokS => "potok_s",
            Self::Peek => "peek",
        }
    }

    /// Static profile for this vendor.
    pub fn profile(self) -> &'static VendorProfile {
        VendorRegistry::global().get(self)
    }

    /// Protocol used to read the controller state.
    pub fn state_protocol(self) -> ProtocolFamily {
        self.profile().state_protocol
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|v| v.name() == normalized)
            .ok_or_else(|| PlatformError::UnknownVendor { name: s.to_string() })
    }
}

/// Wire protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolFamily {
    /// SNMP, flat numeric OIDs
    Stcip,
    /// SNMP, OIDs suffixed with the site control number
    Ug405,
    /// Scraped web control panel
    Http,
    /// Interactive terminal
    Ssh,
}

impl ProtocolFamily {
    /// Whether this family is carried over SNMP.
    pub fn is_snmp(self) -> bool {
        matches!(self, Self::Stcip | Self::Ug405)
    }
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stcip => "STCIP",
            Self::Ug405 => "UG405",
            Self::Http => "HTTP",
            Self::Ssh => "SSH",
        })
    }
}
