//! SNMP v2c transport using async-snmp.

use std::fmt;

use async_snmp::{Auth, Backoff, Client, Oid, Retry, UdpClient, Value};
use bytes::Bytes;
use log::{debug, trace};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Result, TransportError};
use crate::platform::SnmpPolicy;

/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// A varbind value, reduced to what controllers actually return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    Octets(Vec<u8>),
    /// `noSuchObject`, `noSuchInstance` or `endOfMibView`
    Missing,
    /// Any other type, as printed by the SNMP library
    Other(String),
}

impl SnmpValue {
    /// Text view: printable octets as-is, other octets as hex.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Integer(v) => Some(v.to_string()),
            Self::Octets(bytes) => {
                let trimmed = bytes
                    .iter()
                    .rposition(|b| *b != 0)
                    .map_or(&bytes[..0], |end| &bytes[..=end]);
                if trimmed.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                    Some(String::from_utf8_lossy(trimmed).into_owned())
                } else {
                    Some(trimmed.iter().map(|b| format!("{b:02x}")).collect())
                }
            }
            Self::Missing => None,
            Self::Other(text) => Some(text.clone()),
        }
    }

    /// Integer view; numeric text is accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Octets(_) | Self::Other(_) => self.as_text()?.trim().parse().ok(),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("<missing>"),
        }
    }
}

/// One OID/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varbind {
    pub oid: String,
    pub value: SnmpValue,
}

impl Varbind {
    pub fn new(oid: impl Into<String>, value: SnmpValue) -> Self {
        Self {
            oid: oid.into(),
            value,
        }
    }
}

/// Where and how to send an SNMP request.
#[derive(Debug, Clone)]
pub struct SnmpTarget {
    pub host: String,
    pub port: u16,
    pub community: SecretString,
    pub policy: SnmpPolicy,
}

impl SnmpTarget {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Stateless SNMP client; one UDP socket per request.
#[derive(Debug, Clone, Default)]
pub struct SnmpClient;

impl SnmpClient {
    async fn connect(&self, target: &SnmpTarget) -> Result<UdpClient> {
        Client::builder(
            target.socket_addr(),
            Auth::v2c(target.community.expose_secret()),
        )
        .timeout(target.policy.timeout)
        .retry(retry_policy(&target.policy))
        .connect()
        .await
        .map_err(|e| {
            TransportError::ConnectionFailed {
                host: target.host.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Read all `oids` in one PDU.
    pub async fn get(&self, target: &SnmpTarget, oids: &[String]) -> Result<Vec<Varbind>> {
        let parsed = oids
            .iter()
            .map(|oid| parse_oid(oid))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("SNMP GET {} ({} oids)", target.socket_addr(), parsed.len());
        let client = self.connect(target).await?;
        let reply = client
            .get_many(&parsed)
            .await
            .map_err(|e| classify(target, *e))?;

        let varbinds: Vec<Varbind> = reply
            .into_iter()
            .map(|vb| Varbind::new(vb.oid.to_string(), from_wire(&vb.value)))
            .collect();
        trace!("SNMP GET {} reply: {:?}", target.host, varbinds);
        Ok(varbinds)
    }

    /// Write all `varbinds` in one PDU and return the agent's echo.
    pub async fn set(&self, target: &SnmpTarget, varbinds: &[Varbind]) -> Result<Vec<Varbind>> {
        let request = varbinds
            .iter()
            .map(|vb| Ok((parse_oid(&vb.oid)?, to_wire(&vb.value)?)))
            .collect::<Result<Vec<_>>>()?;

        debug!("SNMP SET {} ({} varbinds)", target.socket_addr(), request.len());
        let client = self.connect(target).await?;
        let reply = client
            .set_many(&request)
            .await
            .map_err(|e| classify(target, *e))?;

        let echoed: Vec<Varbind> = reply
            .into_iter()
            .map(|vb| Varbind::new(vb.oid.to_string(), from_wire(&vb.value)))
            .collect();
        if let Some(missing) = echoed.iter().find(|vb| vb.value.is_missing()) {
            return Err(TransportError::Protocol(format!("{} was not written", missing.oid)).into());
        }
        trace!("SNMP SET {} reply: {:?}", target.host, echoed);
        Ok(echoed)
    }
}

/// Retries go out as soon as an attempt times out.
fn retry_policy(policy: &SnmpPolicy) -> Retry {
    Retry {
        max_attempts: policy.retries,
        backoff: Backoff::None,
    }
}

fn parse_oid(oid: &str) -> std::result::Result<Oid, TransportError> {
    Oid::parse(oid.trim_start_matches('.'))
        .map_err(|e| TransportError::Protocol(format!("invalid OID '{oid}': {e}")))
}

fn classify(target: &SnmpTarget, err: async_snmp::Error) -> crate::Error {
    match err {
        async_snmp::Error::Timeout { .. } => TransportError::Timeout(target.policy.budget()),
        async_snmp::Error::Snmp { .. } => TransportError::Protocol(err.to_string()),
        other => TransportError::ConnectionFailed {
            host: target.host.clone(),
            message: other.to_string(),
        },
    }
    .into()
}

fn from_wire(value: &Value) -> SnmpValue {
    match value {
        Value::Integer(v) => SnmpValue::Integer(i64::from(*v)),
        Value::OctetString(bytes) => SnmpValue::Octets(bytes.to_vec()),
        Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => SnmpValue::Missing,
        other => SnmpValue::Other(other.to_string()),
    }
}

fn to_wire(value: &SnmpValue) -> Result<Value> {
    match value {
        SnmpValue::Integer(v) => i32::try_from(*v)
            .map(Value::Integer)
            .map_err(|_| TransportError::Protocol(format!("integer {v} out of range")).into()),
        SnmpValue::Octets(bytes) => Ok(Value::OctetString(Bytes::from(bytes.clone()))),
        SnmpValue::Missing | SnmpValue::Other(_) => {
            Err(TransportError::Protocol(format!("cannot write value {value}")).into())
        }
    }
}
