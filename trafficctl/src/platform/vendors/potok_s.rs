//! Potok-S controllers (STCIP over SNMP).

use std::time::Duration;

use crate::parser::{NormalizedStateMap, fields};
use crate::platform::definition::{FieldDecoder, FieldSpec, SnmpPolicy, VendorProfile};
use crate::platform::{Mode, ProtocolFamily, Vendor};

use super::{EQUIPMENT_STATUS, swarco};

pub const STAGE_STATUS: &str = swarco::PHASE_STATUS;
pub const STAGE_COMMAND: &str = swarco::PHASE_COMMAND;
pub const STATUS_MODE: &str = "1.3.6.1.4.1.1618.3.6.2.2.2.0";

pub const MAX_STAGE: u32 = 128;

pub const STATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::flat(STAGE_STATUS, fields::CURRENT_STAGE, FieldDecoder::PotokSStage),
    FieldSpec::flat(STATUS_MODE, fields::STATUS_MODE, FieldDecoder::Integer),
    FieldSpec::flat(swarco::PLAN_CURRENT, fields::CURRENT_PLAN, FieldDecoder::Integer),
    FieldSpec::flat(swarco::DETECTOR_QTY, fields::NUM_DETECTORS, FieldDecoder::Integer),
    FieldSpec::flat(
        swarco::STATUS_EQUIPMENT,
        fields::EQUIPMENT_STATUS,
        FieldDecoder::Status(EQUIPMENT_STATUS),
    ),
];

pub const SET_FIELDS: &[FieldSpec] = &[FieldSpec::flat(
    STAGE_COMMAND,
    fields::REQUESTED_STAGE,
    FieldDecoder::PotokSStage,
)];

/// Create the Potok-S profile.
pub fn profile() -> VendorProfile {
    let policy = SnmpPolicy::new(Duration::from_secs(1), 0);

    VendorProfile::new(Vendor::PotokS, ProtocolFamily::Stcip)
        .with_max_stage(MAX_STAGE)
        .with_set_protocol(ProtocolFamily::Stcip)
        .with_snmp_get(policy)
        .with_snmp_set(policy)
}

pub fn stage_to_wire(stage: u32) -> u32 {
    if stage == 0 { 0 } else { stage + 1 }
}

pub fn stage_from_wire(value: i64) -> Option<u32> {
    match value {
        0 => Some(0),
        v => u32::try_from(v - 1).ok(),
    }
}

pub(crate) fn infer_mode(state: &NormalizedStateMap) -> Option<Mode> {
    match state.int(fields::STATUS_MODE)? {
        8 => Some(Mode::Va),
        10 => Some(Mode::Manual),
        11 => Some(Mode::Central),
        12 => Some(Mode::Ft),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trip() {
        for stage in 0..=MAX_STAGE {
            let wire = stage_to_wire(stage);
            assert_eq!(stage_from_wire(i64::from(wire)), Some(stage));
        }
        assert_eq!(stage_to_wire(1), 2);
        assert_eq!(stage_from_wire(-3), None);
    }

    #[test]
    fn test_status_mode_lookup() {
        let cases: [(i64, Option<Mode>); 5] = [
            (8, Some(Mode::Va)),
            (10, Some(Mode::Manual)),
            (11, Some(Mode::Central)),
            (12, Some(Mode::Ft)),
            (3, None),
        ];
        for (code, expected) in cases {
            let mut state = NormalizedStateMap::new();
            state.insert(fields::STATUS_MODE, code);
            assert_eq!(infer_mode(&state), expected, "status_mode {code}");
        }
    }
}
