//! In-memory transport for driver tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{Result, TransportError};
use crate::transport::{
    SnmpTarget, SnmpValue, TerminalSession, TerminalTarget, Transport, Varbind,
};

/// Canned failure for every request to one host.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Timeout,
    Refused,
    Certificate,
}

impl Failure {
    fn error(self, host: &str) -> TransportError {
        match self {
            Self::Timeout => TransportError::Timeout(Duration::from_secs(1)),
            Self::Refused => TransportError::ConnectionFailed {
                host: host.to_string(),
                message: "connection refused".to_string(),
            },
            Self::Certificate => TransportError::BadControllerType {
                host: host.to_string(),
                message: "invalid peer certificate".to_string(),
            },
        }
    }
}

/// Transport answering from tables and recording every request.
#[derive(Default)]
pub(crate) struct MockTransport {
    snmp: HashMap<String, SnmpValue>,
    pages: Vec<(String, String)>,
    terminal_replies: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    stalls: Mutex<HashMap<String, Duration>>,
    failures: HashMap<String, Failure>,
    pub gets: Mutex<HashMap<String, usize>>,
    pub sets: Mutex<Vec<Varbind>>,
    pub posts: Mutex<Vec<Vec<(String, String)>>>,
    pub terminal_log: Arc<Mutex<Vec<String>>>,
    pub terminals_closed: Arc<Mutex<usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snmp(mut self, oid: impl Into<String>, value: SnmpValue) -> Self {
        self.snmp.insert(oid.into(), value);
        self
    }

    /// Page served for any URL ending with `route`.
    pub fn with_page(mut self, route: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.push((route.into(), body.into()));
        self
    }

    pub fn with_terminal_reply(mut self, line: impl Into<String>, reply: impl Into<String>) -> Self {
        self.terminal_replies.insert(line.into(), reply.into());
        self
    }

    pub fn with_delay(mut self, host: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(host.into(), delay);
        self
    }

    /// The first read of `oid` waits `delay` before answering.
    pub fn with_stall(self, oid: impl Into<String>, delay: Duration) -> Self {
        self.stalls.lock().unwrap().insert(oid.into(), delay);
        self
    }

    pub fn with_failure(mut self, host: impl Into<String>, failure: Failure) -> Self {
        self.failures.insert(host.into(), failure);
        self
    }

    /// Number of reads of `oid`, including ones that never got an answer.
    pub fn get_count(&self, oid: &str) -> usize {
        self.gets.lock().unwrap().get(oid).copied().unwrap_or(0)
    }

    async fn enter(&self, host: &str) -> Result<()> {
        if let Some(delay) = self.delays.get(host) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(host) {
            Some(failure) => Err(failure.error(host).into()),
            None => Ok(()),
        }
    }

    fn page(&self, url: &Url) -> Option<String> {
        self.pages
            .iter()
            .find(|(route, _)| url.as_str().ends_with(route.as_str()))
            .map(|(_, body)| body.clone())
    }
}

impl Transport for MockTransport {
    type Terminal = MockTerminal;

    async fn snmp_get(&self, target: &SnmpTarget, oids: &[String]) -> Result<Vec<Varbind>> {
        {
            let mut gets = self.gets.lock().unwrap();
            for oid in oids {
                *gets.entry(oid.clone()).or_default() += 1;
            }
        }
        self.enter(&target.host).await?;

        let stall = {
            let mut stalls = self.stalls.lock().unwrap();
            oids.iter().find_map(|oid| stalls.remove(oid))
        };
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }

        Ok(oids
            .iter()
            .map(|oid| {
                let value = self.snmp.get(oid).cloned().unwrap_or(SnmpValue::Missing);
                Varbind::new(oid.clone(), value)
            })
            .collect())
    }

    async fn snmp_set(&self, target: &SnmpTarget, varbinds: &[Varbind]) -> Result<Vec<Varbind>> {
        self.enter(&target.host).await?;
        self.sets.lock().unwrap().extend(varbinds.iter().cloned());
        Ok(varbinds.to_vec())
    }

    async fn http_get(&self, url: &Url, _timeout: Duration) -> Result<String> {
        let host = url.host_str().unwrap_or_default().to_string();
        self.enter(&host).await?;
        self.page(url).ok_or_else(|| {
            TransportError::ConnectionFailed {
                host,
                message: "HTTP 404".to_string(),
            }
            .into()
        })
    }

    async fn http_post(
        &self,
        url: &Url,
        form: &[(String, String)],
        _timeout: Duration,
    ) -> Result<String> {
        self.enter(url.host_str().unwrap_or_default()).await?;
        self.posts.lock().unwrap().push(form.to_vec());
        Ok(String::new())
    }

    async fn open_terminal(&self, target: &TerminalTarget) -> Result<MockTerminal> {
        self.enter(&target.ssh.host).await?;
        Ok(MockTerminal {
            replies: self.terminal_replies.clone(),
            log: Arc::clone(&self.terminal_log),
            closed: Arc::clone(&self.terminals_closed),
        })
    }
}

/// Terminal echoing each line followed by a prompt, unless a reply is scripted.
pub(crate) struct MockTerminal {
    replies: HashMap<String, String>,
    log: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<usize>>,
}

impl MockTerminal {
    fn answer(&self, line: &str) -> String {
        self.replies
            .get(line)
            .cloned()
            .unwrap_or_else(|| format!("{line}\r\nSWARCO>"))
    }
}

impl TerminalSession for MockTerminal {
    async fn exchange(&mut self, line: &str) -> Result<String> {
        self.log.lock().unwrap().push(line.to_string());
        Ok(self.answer(line))
    }

    async fn exchange_secret(&mut self, secret: &SecretString) -> Result<String> {
        let secret = secret.expose_secret().to_string();
        self.log.lock().unwrap().push(secret.clone());
        Ok(self.answer(&secret))
    }

    async fn close(self) -> Result<()> {
        *self.closed.lock().unwrap() += 1;
        Ok(())
    }
}
