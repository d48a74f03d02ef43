//! Swarco controllers (STCIP over SNMP, optional terminal access).
//!
//! Stage numbers are rotated by one on the wire: stage 1 is written as 2,
//! stage 7 as 8 and stage 8 wraps around to 1. The phase status object
//! reports either that rotated number or a one-hot bitmask, as a hex octet.

use std::time::Duration;

use crate::parser::terminal::InputStates;
use crate::parser::{NormalizedStateMap, fields};
use crate::platform::definition::{FieldDecoder, FieldSpec, SnmpPolicy, VendorProfile};
use crate::platform::{Mode, ProtocolFamily, Vendor};

use super::EQUIPMENT_STATUS;

pub const PHASE_STATUS: &str = "1.3.6.1.4.1.1618.3.7.2.11.2.0";
pub const PHASE_COMMAND: &str = "1.3.6.1.4.1.1618.3.7.2.11.1.0";
pub const PLAN_CURRENT: &str = "1.3.6.1.4.1.1618.3.7.2.2.2.0";
pub const PLAN_SOURCE: &str = "1.3.6.1.4.1.1618.3.7.2.2.1.0";
pub const FIXED_TIME_STATUS: &str = "1.3.6.1.4.1.1618.3.2.2.4.0";
pub const SOFT_IO_STATUS: &str = "1.3.6.1.4.1.1618.5.1.1.1.1.0";
pub const DETECTOR_QTY: &str = "1.3.6.1.4.1.1618.3.3.1.0";
pub const STATUS_EQUIPMENT: &str = "1.3.6.1.4.1.1618.3.6.2.1.2.0";

pub const MAX_STAGE: u32 = 8;

/// Plan source: control block (central system).
pub const SOURCE_CONTROL_BLOCK: i64 = 3;
/// Plan source: calendar clock.
pub const SOURCE_CALENDAR_CLOCK: i64 = 2;
/// Plan source: traffic situation.
pub const SOURCE_TRAFFIC_SITUATION: i64 = 1;

pub const PLAN_CENTRAL: i64 = 16;
pub const PLAN_MANUAL: i64 = 15;
pub const PLAN_SYNC: i64 = 13;

pub const STATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::flat(PHASE_STATUS, fields::CURRENT_STAGE, FieldDecoder::SwarcoStage),
    FieldSpec::flat(PLAN_CURRENT, fields::CURRENT_PLAN, FieldDecoder::Integer),
    FieldSpec::flat(PLAN_SOURCE, fields::PLAN_SOURCE, FieldDecoder::Integer),
    FieldSpec::flat(FIXED_TIME_STATUS, fields::FIXED_TIME_STATUS, FieldDecoder::Integer),
    FieldSpec::flat(SOFT_IO_STATUS, fields::SOFT_FLAGS, FieldDecoder::SoftFlags),
    FieldSpec::flat(DETECTOR_QTY, fields::NUM_DETECTORS, FieldDecoder::Integer),
    FieldSpec::flat(
        STATUS_EQUIPMENT,
        fields::EQUIPMENT_STATUS,
        FieldDecoder::Status(EQUIPMENT_STATUS),
    ),
];

pub const SET_FIELDS: &[FieldSpec] = &[FieldSpec::flat(
    PHASE_COMMAND,
    fields::REQUESTED_STAGE,
    FieldDecoder::SwarcoStage,
)];

/// Terminal commands sent before the level-2 password.
pub const TERMINAL_LOGIN: &[&str] = &["lang UK", "l2"];

/// Terminal status query listing the enable input and the stage inputs.
pub const TERMINAL_STATUS_QUERY: &str = "instat102 ?";

/// Input that hands stage selection over to the terminal.
pub const ENABLE_INPUT: u32 = 102;

/// Create the Swarco profile.
pub fn profile() -> VendorProfile {
    let policy = SnmpPolicy::new(Duration::from_secs(1), 0);

    VendorProfile::new(Vendor::Swarco, ProtocolFamily::Stcip)
        .with_max_stage(MAX_STAGE)
        .with_set_protocol(ProtocolFamily::Stcip)
        .with_set_protocol(ProtocolFamily::Ssh)
        .with_snmp_get(policy)
        .with_snmp_set(policy)
}

/// Wire value written to the phase command object.
pub fn stage_to_wire(stage: u32) -> u32 {
    match stage {
        0 => 0,
        MAX_STAGE => 1,
        n => n + 1,
    }
}

/// Decode a numeric phase value: a rotated stage number or a bitmask.
pub fn stage_from_value(value: u64) -> u32 {
    match value {
        0 => 0,
        1 => MAX_STAGE,
        v if v <= u64::from(MAX_STAGE) => v as u32 - 1,
        v => v.ilog2() + 1,
    }
}

/// Decode the phase status octet string.
pub fn decode_stage(raw: &str) -> Option<u32> {
    match raw {
        " " => return Some(6),
        "@" => return Some(7),
        _ => {}
    }

    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    u64::from_str_radix(trimmed, 16).ok().map(stage_from_value)
}

/// Terminal input that selects `stage`.
pub fn stage_input(stage: u32) -> u32 {
    ENABLE_INPUT + 1 + stage
}

/// Commands that move the terminal inputs to `stage`.
///
/// Stage 0 switches every active stage input off, then the enable input.
/// Any other stage switches the enable input on if needed, turns the other
/// stage inputs off and the target one on.
pub fn terminal_stage_commands(inputs: &InputStates, stage: u32) -> Vec<String> {
    let active = (1..=MAX_STAGE)
        .map(stage_input)
        .filter(|input| inputs.is_on(*input));

    let mut commands = Vec::new();
    if stage == 0 {
        commands.extend(active.map(|input| format!("inp{input}=0")));
        if inputs.is_on(ENABLE_INPUT) {
            commands.push(format!("inp{ENABLE_INPUT}=0"));
        }
        return commands;
    }

    if !inputs.is_on(ENABLE_INPUT) {
        commands.push(format!("inp{ENABLE_INPUT}=1"));
    }
    let target = stage_input(stage);
    commands.extend(
        active
            .filter(|input| *input != target)
            .map(|input| format!("inp{input}=0")),
    );
    commands.push(format!("inp{target}=1"));
    commands
}

pub(crate) fn infer_mode(state: &NormalizedStateMap) -> Option<Mode> {
    let plan = state.int(fields::CURRENT_PLAN);
    let source = state.int(fields::PLAN_SOURCE);
    let fixed_time = state.int(fields::FIXED_TIME_STATUS);
    let flags = state.text(fields::SOFT_FLAGS);
    let detectors = state.int(fields::NUM_DETECTORS);

    if plan == Some(PLAN_CENTRAL) && source == Some(SOURCE_CONTROL_BLOCK) {
        return Some(Mode::Central);
    }
    if plan == Some(PLAN_MANUAL) && source == Some(SOURCE_CONTROL_BLOCK) {
        return Some(Mode::Manual);
    }
    if plan == Some(PLAN_SYNC)
        && matches!(source, Some(SOURCE_CONTROL_BLOCK | SOURCE_TRAFFIC_SITUATION))
    {
        return Some(Mode::Sync);
    }
    if fixed_time == Some(0) && flags == Some("00") && detectors.is_some_and(|d| d > 0) {
        return Some(Mode::Va);
    }
    if source == Some(SOURCE_CALENDAR_CLOCK)
        && (flags.is_some_and(|f| f.contains('1'))
            || detectors == Some(0)
            || fixed_time == Some(1))
    {
        return Some(Mode::Ft);
    }
    None
}
