//! Varbind parsing against static OID tables.

use log::warn;

use super::state::{FieldValue, NormalizedStateMap};
use crate::codec::scn::{Scn, strip_scn_suffix};
use crate::platform::vendors::{potok_p, potok_s, swarco};
use crate::platform::{FieldDecoder, FieldSpec};
use crate::transport::{SnmpValue, Varbind};

/// Decode varbinds with `table`.
///
/// Missing values are skipped. OIDs absent from the table are kept under
/// their raw OID, but only when at least one table field matched: a reply
/// with no known field yields an empty map.
pub fn parse_varbinds(
    table: &[FieldSpec],
    varbinds: &[Varbind],
    scn: Option<&Scn>,
) -> NormalizedStateMap {
    let mut map = NormalizedStateMap::new();
    let mut unmatched = Vec::new();
    let mut matched = false;

    for varbind in varbinds {
        if varbind.value.is_missing() {
            continue;
        }
        let oid = varbind.oid.trim_start_matches('.');
        let (base, addressed) = match scn.and_then(|scn| strip_scn_suffix(oid, scn)) {
            Some(base) => (base, true),
            None => (oid, false),
        };

        let spec = table
            .iter()
            .find(|spec| spec.oid == base && spec.scn_addressed == addressed);
        match spec.and_then(|spec| Some((spec.field, decode(spec.decoder, &varbind.value)?))) {
            Some((field, value)) => {
                map.insert(field, value);
                matched = true;
            }
            None => unmatched.push((oid, &varbind.value)),
        }
    }

    if !matched {
        return NormalizedStateMap::new();
    }
    for (oid, value) in unmatched {
        warn!("unmatched OID {oid} kept raw");
        if let Some(text) = value.as_text() {
            map.insert(oid, text);
        }
    }
    map
}

/// Apply one field decoder.
pub fn decode(decoder: FieldDecoder, value: &SnmpValue) -> Option<FieldValue> {
    match decoder {
        FieldDecoder::Text => Some(FieldValue::Text(value.as_text()?.trim().to_string())),
        FieldDecoder::Integer => value.as_i64().map(FieldValue::Int),
        FieldDecoder::Flag => {
            let set = match value {
                SnmpValue::Octets(bytes) => bytes.iter().any(|b| *b != 0 && *b != b'0'),
                other => other.as_i64()? != 0,
            };
            Some(FieldValue::Int(i64::from(set)))
        }
        FieldDecoder::SoftFlags => {
            let text = value.as_text()?;
            Some(FieldValue::Text(text.trim().chars().take(2).collect()))
        }
        FieldDecoder::SwarcoStage => {
            let stage = match value {
                SnmpValue::Integer(v) => swarco::stage_from_value(u64::try_from(*v).ok()?),
                SnmpValue::Octets(bytes) if !bytes.is_empty() && bytes.iter().all(|b| *b == 0) => {
                    0
                }
                // raw bitmask octets arrive as hex text, printable ones as-is
                other => swarco::decode_stage(&other.as_text()?)?,
            };
            Some(FieldValue::from(stage))
        }
        FieldDecoder::PotokSStage => {
            potok_s::stage_from_wire(value.as_i64()?).map(FieldValue::from)
        }
        FieldDecoder::Ug405Stage => {
            let stage = match value {
                SnmpValue::Octets(bytes) => potok_p::stage_from_octets(bytes)?,
                SnmpValue::Integer(v) => {
                    let mask = u128::try_from(*v).ok()?;
                    potok_p::stage_from_octets(&mask.to_be_bytes())?
                }
                other => potok_p::stage_from_hex(&other.as_text()?)?,
            };
            Some(FieldValue::from(stage))
        }
        FieldDecoder::Status(labels) => {
            let code = value.as_i64()?;
            Some(
                labels
                    .iter()
                    .find(|(known, _)| *known == code)
                    .map_or(FieldValue::Int(code), |(_, label)| FieldValue::from(*label)),
            )
        }
    }
}
