//! Wire-protocol transport layer.
//!
//! A single [`Transport`] value is shared by every host session of a
//! process. It only moves raw requests and replies: SNMP varbinds, HTTP
//! bodies and terminal text. Encoding and parsing live elsewhere.

pub mod config;
pub mod http;
pub mod snmp;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, HttpConfig, SshConfig, TlsMode};
pub use http::HttpClient;
pub use snmp::{SnmpClient, SnmpTarget, SnmpValue, Varbind};
pub use ssh::SshTransport;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use russh::Channel;
use russh::client::Msg;
use secrecy::SecretString;
use url::Url;

use crate::channel::{DrainConfig, PtyChannel};
use crate::error::Result;

/// Where and how to open a controller terminal.
#[derive(Debug, Clone)]
pub struct TerminalTarget {
    pub ssh: SshConfig,
    pub drain: DrainConfig,
}

/// An open interactive terminal, owned by one operation.
pub trait TerminalSession: Send {
    /// Send one line and return the raw reply.
    fn exchange(&mut self, line: &str) -> impl Future<Output = Result<String>> + Send;

    /// Send a secret line. Implementations must not log it.
    fn exchange_secret(
        &mut self,
        secret: &SecretString,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Close the terminal and its connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Raw request/reply operations for every protocol family.
pub trait Transport: Send + Sync {
    type Terminal: TerminalSession;

    /// Read `oids` in one PDU.
    fn snmp_get(
        &self,
        target: &SnmpTarget,
        oids: &[String],
    ) -> impl Future<Output = Result<Vec<Varbind>>> + Send;

    /// Write `varbinds` in one PDU.
    fn snmp_set(
        &self,
        target: &SnmpTarget,
        varbinds: &[Varbind],
    ) -> impl Future<Output = Result<Vec<Varbind>>> + Send;

    /// Fetch a page body.
    fn http_get(&self, url: &Url, timeout: Duration)
    -> impl Future<Output = Result<String>> + Send;

    /// Post a form and return the response body.
    fn http_post(
        &self,
        url: &Url,
        form: &[(String, String)],
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Open an interactive terminal.
    fn open_terminal(
        &self,
        target: &TerminalTarget,
    ) -> impl Future<Output = Result<Self::Terminal>> + Send;
}

/// Network-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct NetTransport {
    snmp: SnmpClient,
    http: HttpClient,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl NetTransport {
    /// Transport with default settings.
    pub fn new() -> Result<Self> {
        NetTransportBuilder::new().build()
    }

    pub fn builder() -> NetTransportBuilder {
        NetTransportBuilder::new()
    }
}

impl Transport for NetTransport {
    type Terminal = SshTerminal;

    async fn snmp_get(&self, target: &SnmpTarget, oids: &[String]) -> Result<Vec<Varbind>> {
        self.snmp.get(target, oids).await
    }

    async fn snmp_set(&self, target: &SnmpTarget, varbinds: &[Varbind]) -> Result<Vec<Varbind>> {
        self.snmp.set(target, varbinds).await
    }

    async fn http_get(&self, url: &Url, timeout: Duration) -> Result<String> {
        self.http.get(url, timeout).await
    }

    async fn http_post(
        &self,
        url: &Url,
        form: &[(String, String)],
        timeout: Duration,
    ) -> Result<String> {
        self.http.post(url, form, timeout).await
    }

    async fn open_terminal(&self, target: &TerminalTarget) -> Result<SshTerminal> {
        let mut ssh = target.ssh.clone();
        ssh.host_key_verification = self.host_key_verification.clone();
        if ssh.known_hosts_path.is_none() {
            ssh.known_hosts_path = self.known_hosts_path.clone();
        }
        SshTerminal::open(ssh, target.drain.clone()).await
    }
}

/// Builder for [`NetTransport`].
#[derive(Debug, Clone, Default)]
pub struct NetTransportBuilder {
    http: HttpConfig,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl NetTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-wide HTTP timeout ceiling.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// TLS verification for web panels.
    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.http.tls = tls;
        self
    }

    /// Host key verification for controller terminals.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// known_hosts file used when a terminal target does not name one.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<NetTransport> {
        Ok(NetTransport {
            snmp: SnmpClient,
            http: HttpClient::new(&self.http)?,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        })
    }
}

/// Terminal over an SSH PTY shell.
pub struct SshTerminal {
    transport: SshTransport,
    pty: PtyChannel<Channel<Msg>>,
}

impl SshTerminal {
    async fn open(config: SshConfig, drain: DrainConfig) -> Result<Self> {
        let transport = SshTransport::connect(config).await?;
        let channel = transport.open_shell().await?;
        let mut pty = PtyChannel::new(channel, drain);
        let banner = pty.read_banner().await;
        debug!("terminal banner: {} bytes", banner.len());
        Ok(Self { transport, pty })
    }
}

impl TerminalSession for SshTerminal {
    async fn exchange(&mut self, line: &str) -> Result<String> {
        self.pty.exchange(line).await
    }

    async fn exchange_secret(&mut self, secret: &SecretString) -> Result<String> {
        self.pty.exchange_secret(secret).await
    }

    async fn close(self) -> Result<()> {
        let channel = self.pty.into_inner();
        if let Err(e) = channel.close().await {
            debug!("terminal channel close failed: {e}");
        }
        self.transport.close().await
    }
}
