//! Operating-mode and light-status inference.

use std::fmt;

use serde::{Serialize, Serializer};

use super::{Vendor, vendors};
use crate::parser::NormalizedStateMap;

/// Coarse operating mode of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Under central (UTC) control
    Central,
    /// Manual stage selection
    Manual,
    /// Fixed time
    Ft,
    /// Vehicle actuated
    Va,
    /// Synchronized with neighbours
    Sync,
    /// Flashing yellow
    Flash,
    /// Lamps off
    Dark,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Central => "Central",
            Self::Manual => "Manual",
            Self::Ft => "FT",
            Self::Va => "VA",
            Self::Sync => "SYNC",
            Self::Flash => "FLASH",
            Self::Dark => "DARK",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What the signal heads are showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightStatus {
    ThreeLight,
    Flash,
    Dark,
}

impl LightStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreeLight => "3_light",
            Self::Flash => "flash",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for LightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LightStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Infer the operating mode from a normalized state map.
///
/// Returns `None` when no rule of the vendor's table matches.
pub fn infer_mode(vendor: Vendor, state: &NormalizedStateMap) -> Option<Mode> {
    match vendor {
        Vendor::Swarco => vendors::swarco::infer_mode(state),
        Vendor::PotokP => vendors::potok_p::infer_mode(state),
        Vendor::PotokS => vendors::potok_s::infer_mode(state),
        Vendor::Peek => vendors::peek::infer_mode(state),
    }
}

/// Infer what the signal heads show.
///
/// Returns `None` when the reply carries no lamp information.
pub fn infer_light_status(vendor: Vendor, state: &NormalizedStateMap) -> Option<LightStatus> {
    match vendor {
        Vendor::Swarco | Vendor::PotokS => vendors::equipment_light_status(state),
        Vendor::PotokP => vendors::potok_p::infer_light_status(state),
        Vendor::Peek => vendors::peek::infer_light_status(state),
    }
}
