//! Potok-P controllers (UG405 over SNMP).
//!
//! Most objects are indexed by the site control number (SCN). The SCN itself
//! is read from a flat object before any addressed request is issued.

use std::time::Duration;

use crate::parser::{NormalizedStateMap, fields};
use crate::platform::definition::{FieldDecoder, FieldSpec, SnmpPolicy, VendorProfile};
use crate::platform::{LightStatus, Mode, ProtocolFamily, Vendor};

pub const SCN: &str = "1.3.6.1.4.1.13267.3.2.3.2.0";
pub const OPERATION_MODE: &str = "1.3.6.1.4.1.13267.3.2.4.1.0";
pub const DETECTOR_COUNT: &str = "1.3.6.1.4.1.13267.3.2.1.3.0";
pub const PLAN: &str = "1.3.6.1.4.1.13267.1.2.9.1.3.0";

pub const REPLY_GN: &str = "1.3.6.1.4.1.13267.3.2.5.1.1.3";
pub const REPLY_DF: &str = "1.3.6.1.4.1.13267.3.2.5.1.1.5";
pub const REPLY_LOCAL_ADAPTIVE: &str = "1.3.6.1.4.1.13267.3.2.5.1.1.30";
pub const REPLY_LAMPS_OFF: &str = "1.3.6.1.4.1.13267.3.2.5.1.1.33";
pub const REPLY_FR: &str = "1.3.6.1.4.1.13267.3.2.5.1.1.36";
pub const REPLY_MC: &str = "1.3.6.1.4.1.13267.3.2.5.1.1.15";

pub const CONTROL_TO: &str = "1.3.6.1.4.1.13267.3.2.4.2.1.2";
pub const CONTROL_FN: &str = "1.3.6.1.4.1.13267.3.2.4.2.1.5";

pub const MAX_STAGE: u32 = 128;

/// Operation mode: standalone.
pub const MODE_STANDALONE: i64 = 1;
/// Operation mode: monitor only.
pub const MODE_MONITOR: i64 = 2;
/// Operation mode: under UTC control.
pub const MODE_UTC_CONTROL: i64 = 3;

pub const STATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::flat(OPERATION_MODE, fields::OPERATION_MODE, FieldDecoder::Integer),
    FieldSpec::flat(DETECTOR_COUNT, fields::NUM_DETECTORS, FieldDecoder::Integer),
    FieldSpec::flat(PLAN, fields::CURRENT_PLAN, FieldDecoder::Integer),
    FieldSpec::addressed(REPLY_GN, fields::CURRENT_STAGE, FieldDecoder::Ug405Stage),
    FieldSpec::addressed(REPLY_DF, fields::HAS_DET_FAULTS, FieldDecoder::Flag),
    FieldSpec::addressed(REPLY_MC, fields::IS_MANUAL, FieldDecoder::Flag),
    FieldSpec::addressed(REPLY_FR, fields::FLASH, FieldDecoder::Flag),
    FieldSpec::addressed(REPLY_LAMPS_OFF, fields::DARK, FieldDecoder::Flag),
    FieldSpec::addressed(
        REPLY_LOCAL_ADAPTIVE,
        fields::LOCAL_ADAPTIVE_STATUS,
        FieldDecoder::Integer,
    ),
];

pub const SET_FIELDS: &[FieldSpec] = &[
    FieldSpec::flat(OPERATION_MODE, fields::OPERATION_MODE, FieldDecoder::Integer),
    FieldSpec::addressed(CONTROL_FN, fields::REQUESTED_STAGE, FieldDecoder::Ug405Stage),
];

/// Create the Potok-P profile.
pub fn profile() -> VendorProfile {
    VendorProfile::new(Vendor::PotokP, ProtocolFamily::Ug405)
        .with_max_stage(MAX_STAGE)
        .with_set_protocol(ProtocolFamily::Ug405)
        .with_snmp_get(SnmpPolicy::new(Duration::from_secs(1), 1))
        .with_snmp_set(SnmpPolicy::new(Duration::from_secs(1), 0))
}

/// One-hot stage bitmask, big-endian with no leading zero bytes.
///
/// Stage 0 encodes as a single zero byte.
pub fn stage_to_octets(stage: u32) -> Vec<u8> {
    if stage == 0 || stage > MAX_STAGE {
        return vec![0x00];
    }
    let mask = 1u128 << (stage - 1);
    let bytes = mask.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

/// Stage selected by a one-hot bitmask. The highest set bit wins.
pub fn stage_from_octets(octets: &[u8]) -> Option<u32> {
    if octets.len() > 16 {
        return None;
    }
    let mask = octets
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
    Some(if mask == 0 { 0 } else { mask.ilog2() + 1 })
}

/// Decode a stage bitmask given as hex text.
pub fn stage_from_hex(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let mask = u128::from_str_radix(&digits, 16).ok()?;
    Some(if mask == 0 { 0 } else { mask.ilog2() + 1 })
}

/// Varbind values (operation mode, TO, Fn) for a set-stage.
pub fn control_values(stage: u32) -> (i64, i64, Vec<u8>) {
    if stage == 0 {
        (MODE_STANDALONE, 0, vec![0x00])
    } else {
        (MODE_UTC_CONTROL, 1, stage_to_octets(stage))
    }
}

pub(crate) fn infer_mode(state: &NormalizedStateMap) -> Option<Mode> {
    let operation_mode = state.int(fields::OPERATION_MODE);
    let is_manual = state.int(fields::IS_MANUAL);
    let local_adaptive = state.int(fields::LOCAL_ADAPTIVE_STATUS);
    let detectors = state.int(fields::NUM_DETECTORS);
    let faults = state.int(fields::HAS_DET_FAULTS);
    let local = matches!(operation_mode, Some(MODE_STANDALONE | MODE_MONITOR));

    if operation_mode == Some(MODE_UTC_CONTROL) {
        return Some(Mode::Central);
    }
    if is_manual == Some(1) {
        return Some(Mode::Manual);
    }
    if local && local_adaptive == Some(1) && detectors.is_some_and(|d| d > 0) && faults == Some(0)
    {
        return Some(Mode::Va);
    }
    if local && (local_adaptive == Some(0) || detectors == Some(0) || faults == Some(1)) {
        return Some(Mode::Ft);
    }
    None
}

pub(crate) fn infer_light_status(state: &NormalizedStateMap) -> Option<LightStatus> {
    let dark = state.int(fields::DARK);
    let flash = state.int(fields::FLASH);
    if dark.is_none() && flash.is_none() {
        return None;
    }
    if dark == Some(1) {
        Some(LightStatus::Dark)
    } else if flash == Some(1) {
        Some(LightStatus::Flash)
    } else {
        Some(LightStatus::ThreeLight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_octets() {
        assert_eq!(stage_to_octets(0), vec![0x00]);
        assert_eq!(stage_to_octets(1), vec![0x01]);
        assert_eq!(stage_to_octets(8), vec![0x80]);
        assert_eq!(stage_to_octets(9), vec![0x01, 0x00]);
        assert_eq!(stage_to_octets(128).len(), 16);
    }

    #[test]
    fn test_stage_round_trip() {
        for stage in 0..=MAX_STAGE {
            let octets = stage_to_octets(stage);
            assert_eq!(stage_from_octets(&octets), Some(stage));
            let hex: String = octets.iter().map(|b| format!("{b:02x}")).collect();
            assert_eq!(stage_from_hex(&hex), Some(stage));
        }
    }

    #[test]
    fn test_control_values() {
        assert_eq!(control_values(0), (1, 0, vec![0x00]));
        assert_eq!(control_values(3), (3, 1, vec![0x04]));
    }

    fn state(entries: &[(&str, i64)]) -> NormalizedStateMap {
        let mut map = NormalizedStateMap::new();
        for (field, value) in entries {
            map.insert(*field, *value);
        }
        map
    }

    #[test]
    fn test_modes() {
        assert_eq!(
            infer_mode(&state(&[(fields::OPERATION_MODE, 3), (fields::IS_MANUAL, 1)])),
            Some(Mode::Central)
        );
        assert_eq!(
            infer_mode(&state(&[(fields::OPERATION_MODE, 1), (fields::IS_MANUAL, 1)])),
            Some(Mode::Manual)
        );
        assert_eq!(
            infer_mode(&state(&[
                (fields::OPERATION_MODE, 1),
                (fields::IS_MANUAL, 0),
                (fields::LOCAL_ADAPTIVE_STATUS, 1),
                (fields::NUM_DETECTORS, 4),
                (fields::HAS_DET_FAULTS, 0),
            ])),
            Some(Mode::Va)
        );
        assert_eq!(
            infer_mode(&state(&[
                (fields::OPERATION_MODE, 2),
                (fields::IS_MANUAL, 0),
                (fields::LOCAL_ADAPTIVE_STATUS, 1),
                (fields::NUM_DETECTORS, 4),
                (fields::HAS_DET_FAULTS, 1),
            ])),
            Some(Mode::Ft)
        );
    }

    #[test]
    fn test_light_status() {
        assert_eq!(infer_light_status(&state(&[])), None);
        assert_eq!(
            infer_light_status(&state(&[(fields::DARK, 1), (fields::FLASH, 1)])),
            Some(LightStatus::Dark)
        );
        assert_eq!(
            infer_light_status(&state(&[(fields::DARK, 0), (fields::FLASH, 1)])),
            Some(LightStatus::Flash)
        );
        assert_eq!(
            infer_light_status(&state(&[(fields::DARK, 0), (fields::FLASH, 0)])),
            Some(LightStatus::ThreeLight)
        );
    }
}
