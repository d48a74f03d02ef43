//! Response parsers: raw reply → [`NormalizedStateMap`].
//!
//! Parsers are pure. A reply that carries nothing the vendor tables know
//! parses to an empty map; callers treat that as a controller mismatch.

pub mod html;
pub mod snmp;
mod state;
pub mod terminal;

pub use state::{FieldValue, NormalizedStateMap, fields};

use crate::codec::Scn;
use crate::platform::vendors;
use crate::platform::{ProtocolFamily, Vendor};
use crate::transport::Varbind;

/// A raw transport reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReply {
    Snmp(Vec<Varbind>),
    Html(String),
    Terminal(String),
}

/// Parse a get-state reply.
pub fn parse(
    vendor: Vendor,
    protocol: ProtocolFamily,
    raw: &RawReply,
    scn: Option<&Scn>,
) -> NormalizedStateMap {
    match (protocol, raw) {
        (ProtocolFamily::Stcip, RawReply::Snmp(varbinds)) => {
            snmp::parse_varbinds(vendors::state_fields(vendor), varbinds, None)
        }
        (ProtocolFamily::Ug405, RawReply::Snmp(varbinds)) => {
            snmp::parse_varbinds(vendors::state_fields(vendor), varbinds, scn)
        }
        (ProtocolFamily::Http, RawReply::Html(body)) => html::parse_main_page(body),
        (ProtocolFamily::Ssh, RawReply::Terminal(output)) => terminal::parse_instat(output)
            .map(|states| states.to_state_map())
            .unwrap_or_default(),
        _ => NormalizedStateMap::new(),
    }
}
