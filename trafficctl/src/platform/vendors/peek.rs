//! Peek controllers (web control panel over HTTP).
//!
//! Stage selection goes through named controller inputs: `MPP_MAN` hands
//! control to the panel and `MPP_PH<n>` selects stage `n`.

use std::time::Duration;

use serde::Serialize;

use crate::error::CodecError;
use crate::parser::{NormalizedStateMap, fields};
use crate::platform::definition::VendorProfile;
use crate::platform::{LightStatus, Mode, ProtocolFamily, Vendor};

pub const MAIN_PAGE_ROUTE: &str = "hvi?file=m001a.hvi&pos1=0&pos2=-1";
pub const INPUTS_PAGE_ROUTE: &str = "hvi?file=cell6710.hvi&pos1=0&pos2=-1";
pub const SET_INPUT_ROUTE: &str = "hvi?file=data.hvi&page=cell6710.hvi";

pub const MANUAL_INPUT: &str = "MPP_MAN";
pub const STAGE_INPUT_PREFIX: &str = "MPP_PH";

pub const MAX_STAGE: u32 = 32;

/// Raw key of the stream-1 mode text.
pub const STREAM1_MODE: &str = "stream.1.mode";

/// Create the Peek profile.
pub fn profile() -> VendorProfile {
    VendorProfile::new(Vendor::Peek, ProtocolFamily::Http)
        .with_max_stage(MAX_STAGE)
        .with_set_protocol(ProtocolFamily::Http)
        .with_http_timeout(Duration::from_secs(3))
}

/// One row of the inputs page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeekInput {
    pub index: u32,
    pub name: String,
    pub state: bool,
}

impl PeekInput {
    pub fn new(index: u32, name: impl Into<String>, state: bool) -> Self {
        Self {
            index,
            name: name.into(),
            state,
        }
    }

    /// Stage selected by this input, if it is a stage input.
    pub fn stage(&self) -> Option<u32> {
        self.name.strip_prefix(STAGE_INPUT_PREFIX)?.parse().ok()
    }
}

/// A single input write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputChange {
    pub index: u32,
    pub name: String,
    pub on: bool,
}

impl InputChange {
    /// Form fields posted to [`SET_INPUT_ROUTE`].
    pub fn form(&self) -> Vec<(String, String)> {
        vec![
            ("par_name".to_string(), format!("XIN.R20/{}", self.index)),
            (
                "par_value".to_string(),
                if self.on { "1" } else { "0" }.to_string(),
            ),
        ]
    }
}

fn change(input: &PeekInput, on: bool) -> Option<InputChange> {
    (input.state != on).then(|| InputChange {
        index: input.index,
        name: input.name.clone(),
        on,
    })
}

/// Input writes that leave exactly `stage` selected.
///
/// Only inputs whose state differs are returned. Stage 0 switches every
/// stage input and the manual input off.
pub fn make_values_to_set_stage(
    inputs: &[PeekInput],
    stage: u32,
) -> Result<Vec<InputChange>, CodecError> {
    let manual = inputs
        .iter()
        .find(|input| input.name == MANUAL_INPUT)
        .ok_or_else(|| CodecError::InputNotFound {
            name: MANUAL_INPUT.to_string(),
        })?;

    if stage > 0 && !inputs.iter().any(|input| input.stage() == Some(stage)) {
        return Err(CodecError::InputNotFound {
            name: format!("{STAGE_INPUT_PREFIX}{stage}"),
        });
    }

    let stage_changes = inputs
        .iter()
        .filter_map(|input| Some((input, input.stage()?)))
        .filter_map(|(input, n)| change(input, n == stage));

    let mut changes = Vec::new();
    if stage == 0 {
        changes.extend(stage_changes);
        changes.extend(change(manual, false));
    } else {
        changes.extend(change(manual, true));
        changes.extend(stage_changes);
    }
    Ok(changes)
}

/// Apply input writes to a snapshot of the inputs page.
pub fn apply_changes(inputs: &[PeekInput], changes: &[InputChange]) -> Vec<PeekInput> {
    inputs
        .iter()
        .map(|input| {
            let state = changes
                .iter()
                .rev()
                .find(|c| c.index == input.index)
                .map_or(input.state, |c| c.on);
            PeekInput { state, ..input.clone() }
        })
        .collect()
}

/// Stage currently selected through the inputs; 0 when manual is off.
pub fn selected_stage(inputs: &[PeekInput]) -> Option<u32> {
    let manual = inputs.iter().find(|input| input.name == MANUAL_INPUT)?;
    if !manual.state {
        return Some(0);
    }
    inputs
        .iter()
        .filter(|input| input.state)
        .find_map(PeekInput::stage)
}

fn mode_from_text(text: &str) -> Option<Mode> {
    let upper = text.trim().to_ascii_uppercase();
    let word = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|w| !w.is_empty())?;
    match word {
        "FT" | "FIX" => Some(Mode::Ft),
        "VA" => Some(Mode::Va),
        "MAN" | "MANUAL" => Some(Mode::Manual),
        "UTC" | "CTRL" => Some(Mode::Central),
        "SYNC" | "CLF" => Some(Mode::Sync),
        "FL" | "FLASH" => Some(Mode::Flash),
        "OFF" | "DARK" => Some(Mode::Dark),
        _ => None,
    }
}

pub(crate) fn infer_mode(state: &NormalizedStateMap) -> Option<Mode> {
    mode_from_text(state.text(STREAM1_MODE)?)
}

pub(crate) fn infer_light_status(state: &NormalizedStateMap) -> Option<LightStatus> {
    match infer_mode(state)? {
        Mode::Flash => Some(LightStatus::Flash),
        Mode::Dark => Some(LightStatus::Dark),
        _ => Some(LightStatus::ThreeLight),
    }
}
