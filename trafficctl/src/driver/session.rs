//! One controller, one session.
//!
//! A [`HostSession`] owns everything needed to talk to a single controller:
//! its vendor, address, credentials and policies, plus the cached site
//! control number (SCN) for UG405 hosts. Operations take `&self`; SCN
//! resolution and terminal access are each serialized by an async mutex.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::sync::Mutex as AsyncMutex;
use url::Url;

use super::credentials::Credentials;
use super::response::HostResponse;
use crate::channel::DrainConfig;
use crate::codec::{
    self, HttpRequest, Operation, Payload, Scn, SnmpRequest, StageCommand, TerminalCommand,
    TerminalScript,
};
use crate::error::{DriverError, Error, ErrorRecord, Result, TransportError};
use crate::parser::terminal::{detect_failure, normalize_output, parse_instat};
use crate::parser::{self, NormalizedStateMap, RawReply, fields, html, snmp};
use crate::platform::vendors::{self, peek, swarco};
use crate::platform::{ProtocolFamily, SnmpPolicy, Vendor, infer_light_status, infer_mode};
use crate::transport::{
    AuthMethod, SnmpTarget, SshConfig, TerminalSession, TerminalTarget, Transport, Varbind,
    http::page_url,
};

/// Lifecycle of a session. Sessions are reusable: `Completed` goes back to
/// `RequestInFlight` on the next operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    ScnPending,
    ScnResolved,
    RequestInFlight,
    Completed { ok: bool },
}

/// Cached site control number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScnState {
    Unknown,
    Resolved(Scn),
    Failed(String),
}

/// SSH terminal settings.
#[derive(Debug, Clone)]
pub struct TerminalSettings {
    pub port: u16,
    pub connect_timeout: Duration,
    pub drain: DrainConfig,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout: Duration::from_secs(10),
            drain: DrainConfig::default(),
        }
    }
}

/// Session for one controller. Build it with
/// [`SessionBuilder`](super::SessionBuilder).
pub struct HostSession<T> {
    pub(crate) key: String,
    pub(crate) vendor: Vendor,
    pub(crate) address: String,
    pub(crate) transport: Arc<T>,
    pub(crate) credentials: Credentials,
    pub(crate) snmp_port: u16,
    pub(crate) snmp_get: SnmpPolicy,
    pub(crate) snmp_set: SnmpPolicy,
    pub(crate) http_timeout: Duration,
    pub(crate) https: bool,
    pub(crate) set_stage_protocol: ProtocolFamily,
    pub(crate) terminal: TerminalSettings,
    pub(crate) scn: AsyncMutex<ScnState>,
    pub(crate) terminal_lock: AsyncMutex<()>,
    pub(crate) state: Mutex<SessionState>,
}

impl<T> fmt::Debug for HostSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSession")
            .field("key", &self.key)
            .field("vendor", &self.vendor)
            .field("address", &self.address)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T> HostSession<T> {
    /// Key under which results are reported.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Protocol used for set-stage.
    pub fn set_stage_protocol(&self) -> ProtocolFamily {
        self.set_stage_protocol
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(SessionState::Created)
    }
}

impl<T: Transport> HostSession<T> {
    /// Cached SCN, if resolved.
    pub async fn scn(&self) -> Option<Scn> {
        match &*self.scn.lock().await {
            ScnState::Resolved(scn) => Some(scn.clone()),
            ScnState::Unknown | ScnState::Failed(_) => None,
        }
    }

    /// Forget the cached SCN (or cached SCN failure).
    pub async fn invalidate_scn(&self) {
        let mut scn = self.scn.lock().await;
        if *scn != ScnState::Unknown {
            debug!("{}: SCN invalidated", self.key);
            *scn = ScnState::Unknown;
        }
    }

    /// Read the controller state.
    pub async fn get_state(&self) -> HostResponse {
        self.run(Operation::GetState).await
    }

    /// Select `stage`; 0 releases manual control.
    pub async fn set_stage(&self, stage: u32) -> HostResponse {
        self.run(Operation::SetStage(stage)).await
    }

    /// Run one operation and capture its outcome.
    pub async fn run(&self, operation: Operation) -> HostResponse {
        let start = Instant::now();
        debug!("{}: {} on {} ({})", self.key, operation, self.address, self.vendor);

        match self.execute(operation).await {
            Ok(data) => {
                self.transition(SessionState::Completed { ok: true });
                HostResponse::ok(data, start.elapsed())
            }
            Err(err) => {
                let record = ErrorRecord::from(&err);
                if record == ErrorRecord::BadControllerType {
                    self.invalidate_scn().await;
                }
                warn!("{}: {} failed: {}", self.key, operation, err);
                self.transition(SessionState::Completed { ok: false });
                HostResponse::failed(record, start.elapsed())
            }
        }
    }

    fn transition(&self, next: SessionState) {
        if let Ok(mut state) = self.state.lock() {
            debug!("{}: {:?} -> {:?}", self.key, *state, next);
            *state = next;
        }
    }

    fn protocol_for(&self, operation: Operation) -> ProtocolFamily {
        match operation {
            Operation::GetState => self.vendor.state_protocol(),
            Operation::SetStage(_) => self.set_stage_protocol,
        }
    }

    async fn execute(&self, operation: Operation) -> Result<NormalizedStateMap> {
        if let Operation::SetStage(stage) = operation {
            StageCommand::new(self.vendor, stage)?;
        }

        let protocol = self.protocol_for(operation);
        let scn = match protocol {
            ProtocolFamily::Ug405 => Some(self.resolve_scn().await?),
            _ => None,
        };

        let payload = codec::encode(operation, self.vendor, protocol, scn.as_ref())?;
        self.transition(SessionState::RequestInFlight);

        let mut data = match (operation, payload) {
            (Operation::GetState, Payload::Snmp(SnmpRequest::Get(oids))) => {
                let target = self.snmp_target(protocol, false);
                let varbinds = self.transport.snmp_get(&target, &oids).await?;
                parser::parse(self.vendor, protocol, &RawReply::Snmp(varbinds), scn.as_ref())
            }
            (Operation::GetState, Payload::Http(HttpRequest::Get { route })) => {
                let body = self.fetch(&route).await?;
                parser::parse(self.vendor, protocol, &RawReply::Html(body), None)
            }
            (Operation::SetStage(_), Payload::Snmp(SnmpRequest::Set(varbinds))) => {
                self.snmp_set_stage(protocol, &varbinds, scn.as_ref()).await?
            }
            (Operation::SetStage(stage), Payload::Http(HttpRequest::Get { route })) => {
                self.peek_set_stage(&route, stage).await?
            }
            (Operation::SetStage(stage), Payload::Terminal(script)) => {
                self.terminal_set_stage(&script, stage).await?
            }
            (_, payload) => {
                return Err(TransportError::Protocol(format!(
                    "no exchange for {operation} with {payload:?}"
                ))
                .into());
            }
        };

        if data.is_empty() {
            return Err(DriverError::EmptyResponse {
                host: self.address.clone(),
                vendor: self.vendor,
            }
            .into());
        }

        if let Some(mode) = infer_mode(self.vendor, &data) {
            data.insert(fields::CURRENT_MODE, mode.as_str());
        }
        if let Some(light) = infer_light_status(self.vendor, &data) {
            data.insert(fields::LIGHT_STATUS, light.as_str());
        }
        Ok(data)
    }

    /// Resolve the SCN once; both success and failure are cached.
    async fn resolve_scn(&self) -> Result<Scn> {
        let mut cached = self.scn.lock().await;
        match &*cached {
            ScnState::Resolved(scn) => return Ok(scn.clone()),
            ScnState::Failed(message) => {
                return Err(DriverError::ScnResolution {
                    message: message.clone(),
                }
                .into());
            }
            ScnState::Unknown => {}
        }

        self.transition(SessionState::ScnPending);
        match self.fetch_scn().await {
            Ok(scn) => {
                debug!("{}: SCN resolved to {}", self.key, scn);
                *cached = ScnState::Resolved(scn.clone());
                self.transition(SessionState::ScnResolved);
                Ok(scn)
            }
            Err(err) => {
                let message = err.to_string();
                *cached = ScnState::Failed(message.clone());
                Err(DriverError::ScnResolution { message }.into())
            }
        }
    }

    async fn fetch_scn(&self) -> Result<Scn> {
        let Payload::Snmp(SnmpRequest::Get(oids)) = codec::encode_scn_request() else {
            return Err(TransportError::Protocol("SCN request is not an SNMP get".into()).into());
        };
        let target = self.snmp_target(ProtocolFamily::Ug405, false);
        let varbinds = self.transport.snmp_get(&target, &oids).await?;

        varbinds
            .iter()
            .find_map(|vb| Scn::from_value(&vb.value))
            .ok_or_else(|| {
                DriverError::ScnResolution {
                    message: format!("{} returned no SCN", self.address),
                }
                .into()
            })
    }

    fn snmp_target(&self, protocol: ProtocolFamily, write: bool) -> SnmpTarget {
        SnmpTarget {
            host: self.address.clone(),
            port: self.snmp_port,
            community: self.credentials.community(protocol, write).clone(),
            policy: if write { self.snmp_set } else { self.snmp_get },
        }
    }

    async fn snmp_set_stage(
        &self,
        protocol: ProtocolFamily,
        varbinds: &[Varbind],
        scn: Option<&Scn>,
    ) -> Result<NormalizedStateMap> {
        let target = self.snmp_target(protocol, true);
        let echo = self.transport.snmp_set(&target, varbinds).await?;
        Ok(snmp::parse_varbinds(vendors::set_fields(self.vendor), &echo, scn))
    }

    fn url(&self, route: &str) -> Result<Url> {
        page_url(&self.address, route, self.https)
    }

    async fn fetch(&self, route: &str) -> Result<String> {
        let url = self.url(route)?;
        self.transport.http_get(&url, self.http_timeout).await
    }

    async fn peek_set_stage(&self, route: &str, stage: u32) -> Result<NormalizedStateMap> {
        let page = self.fetch(route).await?;
        let inputs = html::parse_inputs_page(&page);
        if inputs.is_empty() {
            return Ok(NormalizedStateMap::new());
        }

        let changes = peek::make_values_to_set_stage(&inputs, stage)?;
        debug!("{}: {} input changes for stage {}", self.key, changes.len(), stage);
        for payload in codec::encode_peek_changes(&changes) {
            if let Payload::Http(HttpRequest::Post { route, form }) = payload {
                let url = self.url(&route)?;
                self.transport.http_post(&url, &form, self.http_timeout).await?;
            }
        }

        let mut data = NormalizedStateMap::new();
        data.insert(fields::REQUESTED_STAGE, stage);
        data.insert(fields::INPUTS_CHANGED, changes.len() as i64);
        Ok(data)
    }

    fn terminal_target(&self) -> TerminalTarget {
        let auth = match &self.credentials.ssh_key {
            Some(path) => AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: self.credentials.ssh_key_passphrase.clone(),
            },
            None => AuthMethod::Password(self.credentials.ssh_password.clone()),
        };
        let mut ssh = SshConfig::new(
            self.address.clone(),
            self.credentials.ssh_user.clone(),
            auth,
        );
        ssh.port = self.terminal.port;
        ssh.timeout = self.terminal.connect_timeout;
        TerminalTarget {
            ssh,
            drain: self.terminal.drain.clone(),
        }
    }

    async fn terminal_set_stage(
        &self,
        login: &TerminalScript,
        stage: u32,
    ) -> Result<NormalizedStateMap> {
        let _exclusive = self.terminal_lock.lock().await;
        let mut terminal = self.transport.open_terminal(&self.terminal_target()).await?;
        let outcome = self.drive_terminal(&mut terminal, login, stage).await;
        if let Err(e) = terminal.close().await {
            debug!("{}: terminal close failed: {}", self.key, e);
        }
        outcome
    }

    async fn drive_terminal(
        &self,
        terminal: &mut T::Terminal,
        login: &TerminalScript,
        stage: u32,
    ) -> Result<NormalizedStateMap> {
        let mut status_reply = String::new();
        for command in login.iter() {
            status_reply = self.send_terminal(terminal, command).await?;
        }

        let inputs = parse_instat(&status_reply).ok_or_else(|| DriverError::TerminalRejected {
            command: swarco::TERMINAL_STATUS_QUERY.to_string(),
            message: "unreadable input status".to_string(),
        })?;

        let script = codec::encode_terminal_stage(&inputs, stage);
        for command in script.iter() {
            self.send_terminal(terminal, command).await?;
        }

        let mut data = NormalizedStateMap::new();
        data.insert(fields::REQUESTED_STAGE, stage);
        data.insert(fields::COMMANDS_SENT, script.len() as i64);
        Ok(data)
    }

    async fn send_terminal(
        &self,
        terminal: &mut T::Terminal,
        command: &TerminalCommand,
    ) -> Result<String> {
        let reply = match command {
            TerminalCommand::Line(line) => terminal.exchange(line).await?,
            TerminalCommand::Password => {
                terminal
                    .exchange_secret(&self.credentials.terminal_password)
                    .await?
            }
        };

        let shown = command.to_string();
        let output = match command {
            TerminalCommand::Line(line) => normalize_output(&reply, line),
            TerminalCommand::Password => reply.clone(),
        };
        if let Some(message) = detect_failure(&output) {
            return Err(Error::from(DriverError::TerminalRejected {
                command: shown,
                message,
            }));
        }
        Ok(reply)
    }
}
