//! Site control numbers (SCN) and SCN-addressed OIDs.
//!
//! UG405 objects are indexed by the SCN string: the OID suffix is
//! `.1.<length>.<ascii code>...`.

use std::fmt;

use crate::transport::SnmpValue;

/// A site control number such as `CO1111`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scn(String);

impl Scn {
    /// Validate a SCN: non-empty printable ASCII without spaces.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        Some(Self(value.to_string()))
    }

    /// Read a SCN out of an SNMP reply value.
    pub fn from_value(value: &SnmpValue) -> Option<Self> {
        match value {
            SnmpValue::Octets(bytes) => Self::new(String::from_utf8_lossy(bytes)),
            SnmpValue::Other(text) => Self::new(text),
            SnmpValue::Integer(_) | SnmpValue::Missing => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// OID suffix addressing this site.
    pub fn oid_suffix(&self) -> String {
        scn_to_ascii(&self.0)
    }
}

impl fmt::Display for Scn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a SCN as an OID suffix.
pub fn scn_to_ascii(scn: &str) -> String {
    let mut suffix = format!(".1.{}", scn.len());
    for byte in scn.bytes() {
        suffix.push('.');
        suffix.push_str(&byte.to_string());
    }
    suffix
}

/// Append the SCN suffix to `oid`.
pub fn addressed(oid: &str, scn: &Scn) -> String {
    format!("{oid}{}", scn.oid_suffix())
}

/// Remove the SCN suffix from `oid`, if present.
pub fn strip_scn_suffix<'a>(oid: &'a str, scn: &Scn) -> Option<&'a str> {
    oid.strip_suffix(scn.oid_suffix().as_str())
}
