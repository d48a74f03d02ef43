//! Per-protocol request units.

use std::fmt;

use crate::transport::Varbind;

/// SNMP request: one PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpRequest {
    Get(Vec<String>),
    Set(Vec<Varbind>),
}

/// HTTP request against a panel route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpRequest {
    Get { route: String },
    Post { route: String, form: Vec<(String, String)> },
}

/// One terminal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Line(String),
    /// Level-2 password, filled in from credentials at send time
    Password,
}

impl fmt::Display for TerminalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => f.write_str(line),
            Self::Password => f.write_str("********"),
        }
    }
}

/// Ordered terminal commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalScript {
    pub commands: Vec<TerminalCommand>,
}

impl TerminalScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.commands.push(TerminalCommand::Line(line.into()));
        self
    }

    pub fn password(mut self) -> Self {
        self.commands.push(TerminalCommand::Password);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TerminalCommand> {
        self.commands.iter()
    }
}

impl FromIterator<String> for TerminalScript {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().map(TerminalCommand::Line).collect(),
        }
    }
}

/// A request ready for the transport. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Snmp(SnmpRequest),
    Http(HttpRequest),
    Terminal(TerminalScript),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_masked() {
        let script = TerminalScript::new().line("l2").password();
        let shown: Vec<String> = script.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["l2", "********"]);
    }
}
