//! Operation + vendor (+ SCN) → payload.

use log::trace;

use super::payload::{HttpRequest, Payload, SnmpRequest, TerminalScript};
use super::scn::{Scn, addressed};
use super::{Operation, StageCommand};
use crate::error::CodecError;
use crate::parser::terminal::InputStates;
use crate::platform::vendors::{self, peek, potok_p, potok_s, swarco};
use crate::platform::{FieldSpec, ProtocolFamily, Vendor};
use crate::transport::{SnmpValue, Varbind};

/// Build the first (or only) payload of `operation`.
///
/// Stage ranges are checked before anything else. Multi-phase flows
/// (Peek inputs, Swarco terminal) continue with [`encode_peek_changes`]
/// and [`encode_terminal_stage`] once the first reply is known.
pub fn encode(
    operation: Operation,
    vendor: Vendor,
    protocol: ProtocolFamily,
    scn: Option<&Scn>,
) -> Result<Payload, CodecError> {
    let payload = match operation {
        Operation::GetState => encode_get_state(vendor, protocol, scn)?,
        Operation::SetStage(stage) => {
            let command = StageCommand::new(vendor, stage)?;
            encode_set_stage(command, protocol, scn)?
        }
    };
    trace!("{operation} for {vendor} over {protocol}: {payload:?}");
    Ok(payload)
}

/// Flat read of the SCN object.
pub fn encode_scn_request() -> Payload {
    Payload::Snmp(SnmpRequest::Get(vec![potok_p::SCN.to_string()]))
}

/// One form post per input change.
pub fn encode_peek_changes(changes: &[peek::InputChange]) -> Vec<Payload> {
    changes
        .iter()
        .map(|change| {
            Payload::Http(HttpRequest::Post {
                route: peek::SET_INPUT_ROUTE.to_string(),
                form: change.form(),
            })
        })
        .collect()
}

/// Terminal commands switching the Swarco inputs to `stage`.
pub fn encode_terminal_stage(inputs: &InputStates, stage: u32) -> TerminalScript {
    swarco::terminal_stage_commands(inputs, stage)
        .into_iter()
        .collect()
}

fn unsupported(vendor: Vendor, protocol: ProtocolFamily, operation: &'static str) -> CodecError {
    CodecError::UnsupportedProtocol {
        vendor,
        protocol,
        operation,
    }
}

fn oids(table: &[FieldSpec], scn: Option<&Scn>) -> Result<Vec<String>, CodecError> {
    table
        .iter()
        .map(|spec| match (spec.scn_addressed, scn) {
            (false, _) => Ok(spec.oid.to_string()),
            (true, Some(scn)) => Ok(addressed(spec.oid, scn)),
            (true, None) => Err(CodecError::MissingScn(ProtocolFamily::Ug405)),
        })
        .collect()
}

fn encode_get_state(
    vendor: Vendor,
    protocol: ProtocolFamily,
    scn: Option<&Scn>,
) -> Result<Payload, CodecError> {
    if protocol != vendor.state_protocol() {
        return Err(unsupported(vendor, protocol, "get-state"));
    }

    match protocol {
        ProtocolFamily::Stcip | ProtocolFamily::Ug405 => Ok(Payload::Snmp(SnmpRequest::Get(
            oids(vendors::state_fields(vendor), scn)?,
        ))),
        ProtocolFamily::Http => Ok(Payload::Http(HttpRequest::Get {
            route: peek::MAIN_PAGE_ROUTE.to_string(),
        })),
        ProtocolFamily::Ssh => Err(unsupported(vendor, protocol, "get-state")),
    }
}

fn encode_set_stage(
    command: StageCommand,
    protocol: ProtocolFamily,
    scn: Option<&Scn>,
) -> Result<Payload, CodecError> {
    let StageCommand { vendor, stage } = command;
    if !vendor.profile().supports_set_protocol(protocol) {
        return Err(unsupported(vendor, protocol, "set-stage"));
    }

    let payload = match (vendor, protocol) {
        (Vendor::Swarco, ProtocolFamily::Stcip) => Payload::Snmp(SnmpRequest::Set(vec![
            Varbind::new(
                swarco::PHASE_COMMAND,
                SnmpValue::Integer(i64::from(swarco::stage_to_wire(stage))),
            ),
        ])),
        (Vendor::PotokS, ProtocolFamily::Stcip) => Payload::Snmp(SnmpRequest::Set(vec![
            Varbind::new(
                potok_s::STAGE_COMMAND,
                SnmpValue::Integer(i64::from(potok_s::stage_to_wire(stage))),
            ),
        ])),
        (Vendor::PotokP, ProtocolFamily::Ug405) => {
            let scn = scn.ok_or(CodecError::MissingScn(ProtocolFamily::Ug405))?;
            let (mode, to, function) = potok_p::control_values(stage);
            Payload::Snmp(SnmpRequest::Set(vec![
                Varbind::new(potok_p::OPERATION_MODE, SnmpValue::Integer(mode)),
                Varbind::new(addressed(potok_p::CONTROL_TO, scn), SnmpValue::Integer(to)),
                Varbind::new(
                    addressed(potok_p::CONTROL_FN, scn),
                    SnmpValue::Octets(function),
                ),
            ]))
        }
        (Vendor::Peek, ProtocolFamily::Http) => Payload::Http(HttpRequest::Get {
            route: peek::INPUTS_PAGE_ROUTE.to_string(),
        }),
        (Vendor::Swarco, ProtocolFamily::Ssh) => {
            let script = swarco::TERMINAL_LOGIN
                .iter()
                .fold(TerminalScript::new(), |script, line| script.line(*line));
            Payload::Terminal(script.password().line(swarco::TERMINAL_STATUS_QUERY))
        }
        _ => return Err(unsupported(vendor, protocol, "set-stage")),
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::payload::TerminalCommand;

    fn co1111() -> Scn {
        Scn::new("CO1111").unwrap()
    }

    #[test]
    fn test_stage_checked_before_anything_else() {
        let err = encode(Operation::SetStage(9), Vendor::Swarco, ProtocolFamily::Ssh, None)
            .unwrap_err();
        assert!(matches!(err, CodecError::StageOutOfRange { max: 8, .. }));

        let err = encode(Operation::SetStage(129), Vendor::PotokP, ProtocolFamily::Ug405, None)
            .unwrap_err();
        assert!(matches!(err, CodecError::StageOutOfRange { max: 128, .. }));

        let err = encode(Operation::SetStage(33), Vendor::Peek, ProtocolFamily::Http, None)
            .unwrap_err();
        assert!(matches!(err, CodecError::StageOutOfRange { max: 32, .. }));
    }

    #[test]
    fn test_swarco_set_writes_rotated_stage() {
        let payload =
            encode(Operation::SetStage(8), Vendor::Swarco, ProtocolFamily::Stcip, None).unwrap();
        assert_eq!(
            payload,
            Payload::Snmp(SnmpRequest::Set(vec![Varbind::new(
                swarco::PHASE_COMMAND,
                SnmpValue::Integer(1)
            )]))
        );
    }

    #[test]
    fn test_potok_s_set_writes_stage_plus_one() {
        let payload =
            encode(Operation::SetStage(5), Vendor::PotokS, ProtocolFamily::Stcip, None).unwrap();
        assert_eq!(
            payload,
            Payload::Snmp(SnmpRequest::Set(vec![Varbind::new(
                potok_s::STAGE_COMMAND,
                SnmpValue::Integer(6)
            )]))
        );
    }

    #[test]
    fn test_ug405_get_is_addressed() {
        let scn = co1111();
        let payload =
            encode(Operation::GetState, Vendor::PotokP, ProtocolFamily::Ug405, Some(&scn)).unwrap();
        let Payload::Snmp(SnmpRequest::Get(oids)) = payload else {
            panic!("expected an SNMP get");
        };
        assert!(oids.contains(&potok_p::OPERATION_MODE.to_string()));
        assert!(oids.contains(&format!("{}.1.6.67.79.49.49.49.49", potok_p::REPLY_GN)));
    }

    #[test]
    fn test_ug405_requires_scn() {
        assert_eq!(
            encode(Operation::GetState, Vendor::PotokP, ProtocolFamily::Ug405, None),
            Err(CodecError::MissingScn(ProtocolFamily::Ug405))
        );
        assert_eq!(
            encode(Operation::SetStage(2), Vendor::PotokP, ProtocolFamily::Ug405, None),
            Err(CodecError::MissingScn(ProtocolFamily::Ug405))
        );
    }

    #[test]
    fn test_ug405_set_stage_and_release() {
        let scn = co1111();
        let set = encode(Operation::SetStage(9), Vendor::PotokP, ProtocolFamily::Ug405, Some(&scn))
            .unwrap();
        let Payload::Snmp(SnmpRequest::Set(varbinds)) = set else {
            panic!("expected an SNMP set");
        };
        assert_eq!(varbinds[0].value, SnmpValue::Integer(3));
        assert_eq!(varbinds[1].value, SnmpValue::Integer(1));
        assert_eq!(varbinds[2].value, SnmpValue::Octets(vec![0x01, 0x00]));

        let release =
            encode(Operation::SetStage(0), Vendor::PotokP, ProtocolFamily::Ug405, Some(&scn))
                .unwrap();
        let Payload::Snmp(SnmpRequest::Set(varbinds)) = release else {
            panic!("expected an SNMP set");
        };
        assert_eq!(varbinds[0].value, SnmpValue::Integer(1));
        assert_eq!(varbinds[1].value, SnmpValue::Integer(0));
        assert_eq!(varbinds[2].value, SnmpValue::Octets(vec![0x00]));
    }

    #[test]
    fn test_swarco_terminal_script() {
        let payload =
            encode(Operation::SetStage(3), Vendor::Swarco, ProtocolFamily::Ssh, None).unwrap();
        let Payload::Terminal(script) = payload else {
            panic!("expected a terminal script");
        };
        assert_eq!(
            script.commands,
            vec![
                TerminalCommand::Line("lang UK".into()),
                TerminalCommand::Line("l2".into()),
                TerminalCommand::Password,
                TerminalCommand::Line("instat102 ?".into()),
            ]
        );
    }

    #[test]
    fn test_unsupported_combinations() {
        assert!(matches!(
            encode(Operation::GetState, Vendor::Swarco, ProtocolFamily::Ssh, None),
            Err(CodecError::UnsupportedProtocol { .. })
        ));
        assert!(matches!(
            encode(Operation::SetStage(1), Vendor::PotokS, ProtocolFamily::Ssh, None),
            Err(CodecError::UnsupportedProtocol { .. })
        ));
    }

    #[test]
    fn test_peek_flow() {
        let first = encode(Operation::SetStage(2), Vendor::Peek, ProtocolFamily::Http, None).unwrap();
        assert_eq!(
            first,
            Payload::Http(HttpRequest::Get {
                route: peek::INPUTS_PAGE_ROUTE.to_string()
            })
        );

        let changes = vec![peek::InputChange {
            index: 4,
            name: "MPP_PH2".into(),
            on: true,
        }];
        let posts = encode_peek_changes(&changes);
        assert_eq!(posts.len(), 1);
        assert!(matches!(
            &posts[0],
            Payload::Http(HttpRequest::Post { route, .. }) if route == peek::SET_INPUT_ROUTE
        ));
    }
}
