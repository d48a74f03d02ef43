//! Peek web panel pages.
//!
//! Pages are line-oriented records separated by `;`:
//!
//! ```text
//! :SUBTITLE;<address>;
//! :TABLE;<title>;
//! :D;MODE;VA;
//! :D;STAGE;2;
//! :ENDTABLE
//! ```
//!
//! Every `:TABLE` block is one signal stream; stream 1 feeds the canonical
//! fields. The inputs page uses `:D;<index>;<name>;<state>;<actuator>;` rows.

use log::debug;

use super::state::{NormalizedStateMap, fields};
use crate::platform::vendors::peek::PeekInput;

const SUBTITLE: &str = ":SUBTITLE";
const TABLE: &str = ":TABLE";
const END_TABLE: &str = ":ENDTABLE";
const DATA: &str = ":D";

fn records(body: &str) -> impl Iterator<Item = Vec<&str>> {
    body.split(['\n', '\r'])
        .flat_map(|line| line.split("<br>"))
        .map(str::trim)
        .filter(|line| line.starts_with(':'))
        .map(|line| line.split(';').map(str::trim).collect())
}

fn leading_number(text: &str) -> Option<i64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse the main status page.
pub fn parse_main_page(body: &str) -> NormalizedStateMap {
    let mut map = NormalizedStateMap::new();
    let mut streams = 0u32;
    let mut in_table = false;

    for record in records(body) {
        match record.as_slice() {
            [SUBTITLE, address, ..] if !address.is_empty() => {
                map.insert(fields::ADDRESS, *address);
            }
            [TABLE, ..] => {
                streams += 1;
                in_table = true;
            }
            [END_TABLE, ..] => in_table = false,
            [DATA, key, value, ..] if in_table && !key.is_empty() => {
                map.insert(
                    format!("stream.{streams}.{}", key.to_ascii_lowercase()),
                    *value,
                );
            }
            _ => {}
        }
    }

    if streams == 0 {
        debug!("panel page has no stream tables");
        return NormalizedStateMap::new();
    }
    map.insert(fields::STREAMS, streams);

    if let Some(stage) = map.text("stream.1.stage").and_then(leading_number) {
        map.insert(fields::CURRENT_STAGE, stage);
    }
    if let Some(plan) = map.text("stream.1.plan").map(str::to_string) {
        match leading_number(&plan) {
            Some(number) => map.insert(fields::CURRENT_PLAN, number),
            None => map.insert(fields::CURRENT_PLAN, plan),
        }
    }
    if let Some(status) = map.text("stream.1.status").map(str::to_string) {
        map.insert(fields::STATUS, status);
    }
    map
}

/// Parse the inputs page.
pub fn parse_inputs_page(body: &str) -> Vec<PeekInput> {
    records(body)
        .filter_map(|record| match record.as_slice() {
            [DATA, index, name, state, ..] => {
                let index = index.parse().ok()?;
                let state = match state.to_ascii_uppercase().as_str() {
                    "1" | "ON" => true,
                    "0" | "OFF" => false,
                    _ => return None,
                };
                Some(PeekInput::new(index, *name, state))
            }
            _ => None,
        })
        .collect()
}
