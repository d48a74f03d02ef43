//! Vendor-specific tables and codecs.
//!
//! Each vendor module exposes a `profile()` function returning its
//! [`VendorProfile`](crate::platform::VendorProfile), its static OID tables
//! and its mode-inference rules.

pub mod peek;
pub mod potok_p;
pub mod potok_s;
pub mod swarco;

use super::{FieldSpec, LightStatus, Vendor};
use crate::parser::{NormalizedStateMap, fields};

/// Equipment status labels shared by the STCIP controllers.
pub const EQUIPMENT_STATUS: &[(i64, &str)] = &[
    (0, "no_information"),
    (1, "working_properly"),
    (2, "power_up"),
    (3, "dark"),
    (4, "flash"),
    (5, "partial_flash"),
    (6, "all_red"),
];

/// OID table read by get-state.
pub fn state_fields(vendor: Vendor) -> &'static [FieldSpec] {
    match vendor {
        Vendor::Swarco => swarco::STATE_FIELDS,
        Vendor::PotokP => potok_p::STATE_FIELDS,
        Vendor::PotokS => potok_s::STATE_FIELDS,
        Vendor::Peek => &[],
    }
}

/// OID table used to read back the echo of an SNMP set-stage.
pub fn set_fields(vendor: Vendor) -> &'static [FieldSpec] {
    match vendor {
        Vendor::Swarco => swarco::SET_FIELDS,
        Vendor::PotokP => potok_p::SET_FIELDS,
        Vendor::PotokS => potok_s::SET_FIELDS,
        Vendor::Peek => &[],
    }
}

/// Light status from a decoded STCIP equipment status.
pub(crate) fn equipment_light_status(state: &NormalizedStateMap) -> Option<LightStatus> {
    match state.text(fields::EQUIPMENT_STATUS)? {
        "dark" => Some(LightStatus::Dark),
        "flash" | "partial_flash" => Some(LightStatus::Flash),
        _ => Some(LightStatus::ThreeLight),
    }
}
