//! Controller terminal output.

use indexmap::IndexMap;

use super::state::NormalizedStateMap;

/// Substrings marking a rejected terminal command.
pub const FAILURE_PATTERNS: &[&str] = &[
    "Unknown command",
    "Access denied",
    "Invalid password",
    "Syntax error",
    "not allowed",
];

/// Width of one `instat` column.
const COLUMN_WIDTH: usize = 4;

/// Strip the command echo and the trailing prompt line.
pub fn normalize_output(raw: &str, command: &str) -> String {
    let output = raw.trim_start_matches(['\r', '\n']);
    let output = output
        .strip_prefix(command)
        .unwrap_or(output)
        .trim_start_matches(['\r', '\n']);

    match output.rfind('\n') {
        Some(pos) => output[..pos].trim_end_matches('\r').to_string(),
        None => output.to_string(),
    }
}

/// First line of `output` matching a failure pattern.
pub fn detect_failure(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| FAILURE_PATTERNS.iter().any(|p| line.contains(p)))
        .map(|line| line.trim().to_string())
}

/// On/off state of numbered terminal inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputStates(IndexMap<u32, bool>);

impl InputStates {
    /// Whether `input` is reported and on.
    pub fn is_on(&self, input: u32) -> bool {
        self.0.get(&input).copied().unwrap_or(false)
    }

    pub fn get(&self, input: u32) -> Option<bool> {
        self.0.get(&input).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `input.<n>` fields, 1 for on and 0 for off.
    pub fn to_state_map(&self) -> NormalizedStateMap {
        let mut map = NormalizedStateMap::new();
        for (input, on) in &self.0 {
            map.insert(format!("input.{input}"), i64::from(*on));
        }
        map
    }
}

impl FromIterator<(u32, bool)> for InputStates {
    fn from_iter<I: IntoIterator<Item = (u32, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn columns(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches('\r');
    let mut cells = Vec::new();
    let mut start = 0;
    while start < line.len() {
        let end = (start + COLUMN_WIDTH).min(line.len());
        let Some(cell) = line.get(start..end) else {
            break;
        };
        cells.push(cell.trim());
        start = end;
    }
    cells
}

/// Parse an `instat` reply (echo included).
///
/// Input numbers are on the third line and their states on the fourth,
/// in fixed-width columns.
pub fn parse_instat(raw: &str) -> Option<InputStates> {
    let lines: Vec<&str> = raw.trim_start_matches(['\r', '\n']).lines().collect();
    let numbers = columns(lines.get(2)?);
    let states = columns(lines.get(3)?);
    if numbers.is_empty() || numbers.len() != states.len() {
        return None;
    }

    numbers
        .iter()
        .zip(&states)
        .map(|(number, state)| {
            let input = number.parse().ok()?;
            let on = match *state {
                "1" => true,
                "0" => false,
                _ => return None,
            };
            Some((input, on))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTAT: &str = "instat102 ?\r\nINPUT STATUS\r\n 102 103 104 105 106\r\n   1   0   0   1   0\r\nSWARCO>";

    #[test]
    fn test_parse_instat() {
        let states = parse_instat(INSTAT).unwrap();
        assert_eq!(states.len(), 5);
        assert!(states.is_on(102));
        assert!(!states.is_on(103));
        assert!(states.is_on(105));
        assert!(!states.is_on(111));
        assert_eq!(states.get(111), None);
    }

    #[test]
    fn test_parse_instat_rejects_garbage() {
        assert!(parse_instat("instat102 ?\r\nUnknown command\r\nSWARCO>").is_none());
        assert!(parse_instat("a\nb\n 102 103\n   1\n").is_none());
    }

    #[test]
    fn test_normalize_output() {
        let raw = "inp104=1\r\ninp104 = 1\r\nSWARCO>";
        assert_eq!(normalize_output(raw, "inp104=1"), "inp104 = 1");
    }

    #[test]
    fn test_detect_failure() {
        assert_eq!(
            detect_failure("l2\r\nInvalid password\r\n>"),
            Some("Invalid password".to_string())
        );
        assert_eq!(detect_failure("inp104 = 1\r\n"), None);
    }

    #[test]
    fn test_state_map() {
        let states = InputStates::from_iter([(102, true), (104, false)]);
        let map = states.to_state_map();
        assert_eq!(map.int("input.102"), Some(1));
        assert_eq!(map.int("input.104"), Some(0));
    }
}
