//! Builder for creating host sessions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use super::credentials::Credentials;
use super::session::{HostSession, ScnState, SessionState, TerminalSettings};
use crate::channel::DrainConfig;
use crate::codec::Scn;
use crate::error::{DriverError, Result};
use crate::platform::{ProtocolFamily, SnmpPolicy, Vendor};
use crate::transport::snmp::DEFAULT_PORT;

/// Builder for constructing [`HostSession`]s.
///
/// Policies default to the vendor profile; anything set here overrides it.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use trafficctl::driver::{Credentials, SessionBuilder};
/// use trafficctl::platform::Vendor;
/// use trafficctl::transport::NetTransport;
///
/// # async fn example() -> Result<(), trafficctl::Error> {
/// let transport = Arc::new(NetTransport::new()?);
/// let session = SessionBuilder::new(Vendor::PotokS, "10.45.154.16")
///     .credentials(Credentials::new().with_stcip("public", "private"))
///     .build(transport)?;
///
/// let response = session.get_state().await;
/// println!("{:?}", response.get("current_mode"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    vendor: Vendor,
    address: String,
    key: Option<String>,
    scn: Option<String>,
    credentials: Credentials,
    snmp_port: u16,
    snmp_get: Option<SnmpPolicy>,
    snmp_set: Option<SnmpPolicy>,
    http_timeout: Option<Duration>,
    https: bool,
    set_stage_protocol: Option<ProtocolFamily>,
    terminal: TerminalSettings,
}

impl SessionBuilder {
    /// Create a new builder for `vendor` at `address`.
    pub fn new(vendor: Vendor, address: impl Into<String>) -> Self {
        Self {
            vendor,
            address: address.into(),
            key: None,
            scn: None,
            credentials: Credentials::default(),
            snmp_port: DEFAULT_PORT,
            snmp_get: None,
            snmp_set: None,
            http_timeout: None,
            https: false,
            set_stage_protocol: None,
            terminal: TerminalSettings::default(),
        }
    }

    /// Result key (default: the address).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Known site control number; skips the SCN read.
    pub fn scn(mut self, scn: impl Into<String>) -> Self {
        self.scn = Some(scn.into());
        self
    }

    /// Set the credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the SNMP port (default: 161).
    pub fn snmp_port(mut self, port: u16) -> Self {
        self.snmp_port = port;
        self
    }

    /// Override the SNMP read policy.
    pub fn snmp_get_policy(mut self, policy: SnmpPolicy) -> Self {
        self.snmp_get = Some(policy);
        self
    }

    /// Override the SNMP write policy.
    pub fn snmp_set_policy(mut self, policy: SnmpPolicy) -> Self {
        self.snmp_set = Some(policy);
        self
    }

    /// Override the per-request HTTP timeout.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Use HTTPS for the web panel.
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Protocol for set-stage (default: first one the vendor supports).
    pub fn set_stage_protocol(mut self, protocol: ProtocolFamily) -> Self {
        self.set_stage_protocol = Some(protocol);
        self
    }

    /// Set the SSH port for terminal sessions (default: 22).
    pub fn terminal_port(mut self, port: u16) -> Self {
        self.terminal.port = port;
        self
    }

    /// Set the SSH connect timeout.
    pub fn terminal_timeout(mut self, timeout: Duration) -> Self {
        self.terminal.connect_timeout = timeout;
        self
    }

    /// Set how terminal replies are read.
    pub fn terminal_drain(mut self, drain: DrainConfig) -> Self {
        self.terminal.drain = drain;
        self
    }

    /// Build the session.
    ///
    /// No I/O happens here; the first operation talks to the controller.
    pub fn build<T>(self, transport: Arc<T>) -> Result<HostSession<T>> {
        if self.address.trim().is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "address is required".to_string(),
            }
            .into());
        }

        let profile = self.vendor.profile();
        let set_stage_protocol = match self.set_stage_protocol {
            Some(protocol) if profile.supports_set_protocol(protocol) => protocol,
            Some(protocol) => {
                return Err(DriverError::InvalidConfig {
                    message: format!("{} cannot set stages over {}", self.vendor, protocol),
                }
                .into());
            }
            None => profile.default_set_protocol(),
        };

        let scn = match self.scn {
            Some(raw) => {
                let scn = Scn::new(&raw).ok_or_else(|| DriverError::InvalidConfig {
                    message: format!("invalid SCN '{raw}'"),
                })?;
                ScnState::Resolved(scn)
            }
            None => ScnState::Unknown,
        };
        let state = match scn {
            ScnState::Resolved(_) => SessionState::ScnResolved,
            _ => SessionState::Created,
        };

        Ok(HostSession {
            key: self.key.unwrap_or_else(|| self.address.clone()),
            vendor: self.vendor,
            address: self.address,
            transport,
            credentials: self.credentials,
            snmp_port: self.snmp_port,
            snmp_get: self.snmp_get.unwrap_or(profile.snmp_get),
            snmp_set: self.snmp_set.unwrap_or(profile.snmp_set),
            http_timeout: self.http_timeout.unwrap_or(profile.http_timeout),
            https: self.https,
            set_stage_protocol,
            terminal: self.terminal,
            scn: AsyncMutex::new(scn),
            terminal_lock: AsyncMutex::new(()),
            state: Mutex::new(state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::MockTransport;
    use tokio_test::{assert_err, assert_ok};

    fn transport() -> Arc<MockTransport> {
        Arc::new(MockTransport::new())
    }

    #[test]
    fn test_builder_defaults_from_profile() {
        let session = assert_ok!(SessionBuilder::new(Vendor::PotokP, "10.0.0.5").build(transport()));
        assert_eq!(session.key(), "10.0.0.5");
        assert_eq!(session.set_stage_protocol(), ProtocolFamily::Ug405);
        assert_eq!(session.snmp_get.retries, 1);
        assert_eq!(session.snmp_set.retries, 0);
        assert_eq!(session.state(), SessionState::Created);
    }

    #[test]
    fn test_builder_overrides() {
        let session = SessionBuilder::new(Vendor::Swarco, "10.0.0.7")
            .key("11")
            .set_stage_protocol(ProtocolFamily::Ssh)
            .snmp_get_policy(SnmpPolicy::new(Duration::from_millis(300), 2))
            .terminal_port(2222)
            .build(transport())
            .unwrap();
        assert_eq!(session.key(), "11");
        assert_eq!(session.set_stage_protocol(), ProtocolFamily::Ssh);
        assert_eq!(session.snmp_get.budget(), Duration::from_millis(900));
        assert_eq!(session.terminal.port, 2222);
    }

    #[test]
    fn test_builder_rejects_unsupported_set_protocol() {
        let err = assert_err!(
            SessionBuilder::new(Vendor::Peek, "10.0.0.9")
                .set_stage_protocol(ProtocolFamily::Stcip)
                .build(transport())
        );
        assert!(err.to_string().contains("cannot set stages"));
    }

    #[test]
    fn test_builder_rejects_empty_address() {
        assert_err!(SessionBuilder::new(Vendor::Swarco, " ").build(transport()));
    }

    #[tokio::test]
    async fn test_supplied_scn_is_resolved() {
        let session = SessionBuilder::new(Vendor::PotokP, "10.0.0.5")
            .scn("CO1111")
            .build(transport())
            .unwrap();
        assert_eq!(session.scn().await.unwrap().as_str(), "CO1111");
        assert_eq!(session.state(), SessionState::ScnResolved);

        let err = SessionBuilder::new(Vendor::PotokP, "10.0.0.5")
            .scn("CO 11")
            .build(transport())
            .unwrap_err();
        assert!(err.to_string().contains("invalid SCN"));
    }
}
