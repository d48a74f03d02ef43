//! Concurrent multi-host execution.
//!
//! Every host runs under its own timeout inside one bounded fan-out. A
//! slow or failing host only ever affects its own entry; the result map
//! holds exactly one outcome per key, in submission order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use indexmap::IndexMap;
use log::{debug, warn};
use tokio::time::Instant;

use super::builder::SessionBuilder;
use super::credentials::Credentials;
use super::directory::{HostDirectory, HostRecord};
use super::response::HostResponse;
use super::session::HostSession;
use crate::codec::Operation;
use crate::error::ErrorRecord;
use crate::platform::Vendor;
use crate::transport::Transport;

/// Fan-out limits.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Hosts in flight at once (at least 1).
    pub max_concurrency: usize,

    /// Budget for one host's whole operation.
    pub operation_timeout: Duration,

    /// Credentials for sessions built by [`dispatch`].
    pub credentials: Credentials,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 32,
            operation_timeout: Duration::from_secs(30),
            credentials: Credentials::default(),
        }
    }
}

impl RunOptions {
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// A command as received from a caller.
///
/// `vendor` and `address` override the directory record; with both set
/// the directory is not consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub token: String,
    pub vendor: Option<Vendor>,
    pub address: Option<String>,
    pub scn: Option<String>,
    pub operation: Operation,
}

impl InboundCommand {
    pub fn new(token: impl Into<String>, operation: Operation) -> Self {
        Self {
            token: token.into(),
            vendor: None,
            address: None,
            scn: None,
            operation,
        }
    }

    pub fn with_host(mut self, vendor: Vendor, address: impl Into<String>) -> Self {
        self.vendor = Some(vendor);
        self.address = Some(address.into());
        self
    }

    pub fn with_scn(mut self, scn: impl Into<String>) -> Self {
        self.scn = Some(scn.into());
        self
    }

    fn resolve(&self, directory: &dyn HostDirectory) -> Option<HostRecord> {
        let record = match (self.vendor, &self.address) {
            (Some(vendor), Some(address)) => HostRecord::new(vendor, address.clone()),
            _ => {
                let mut record = directory.lookup(&self.token)?;
                if let Some(vendor) = self.vendor {
                    record.vendor = vendor;
                }
                if let Some(address) = &self.address {
                    record.address = address.clone();
                }
                record
            }
        };
        Some(match &self.scn {
            Some(scn) => record.with_scn(scn.clone()),
            None => record,
        })
    }
}

/// Run `operation` on every session.
///
/// Sessions sharing a key run once; the first one wins.
pub async fn run<T: Transport>(
    operation: Operation,
    sessions: &[HostSession<T>],
    options: &RunOptions,
) -> IndexMap<String, HostResponse> {
    let mut results = IndexMap::with_capacity(sessions.len());
    let mut jobs = Vec::with_capacity(sessions.len());
    for session in sessions {
        if results.contains_key(session.key()) {
            warn!("duplicate host key {}, skipped", session.key());
            continue;
        }
        results.insert(session.key().to_string(), HostResponse::default());
        jobs.push((session.key().to_string(), session.run(operation)));
    }

    debug!("{} on {} hosts", operation, jobs.len());
    fan_out(jobs, options, &mut results).await;
    results
}

/// Resolve `commands` through `directory` and run them.
///
/// Unknown tokens and unbuildable sessions are reported without any I/O.
pub async fn dispatch<T: Transport>(
    commands: &[InboundCommand],
    directory: &dyn HostDirectory,
    transport: Arc<T>,
    options: &RunOptions,
) -> IndexMap<String, HostResponse> {
    let mut results = IndexMap::with_capacity(commands.len());
    let mut sessions = Vec::with_capacity(commands.len());

    for command in commands {
        if results.contains_key(&command.token) {
            warn!("duplicate host token {}, skipped", command.token);
            continue;
        }

        let Some(record) = command.resolve(directory) else {
            debug!("host {} not in directory", command.token);
            results.insert(
                command.token.clone(),
                HostResponse::failed(ErrorRecord::NotFound(command.token.clone()), Duration::ZERO),
            );
            continue;
        };

        let mut builder = SessionBuilder::new(record.vendor, record.address)
            .key(command.token.clone())
            .credentials(options.credentials.clone());
        if let Some(scn) = record.scn {
            builder = builder.scn(scn);
        }

        match builder.build(Arc::clone(&transport)) {
            Ok(session) => {
                results.insert(command.token.clone(), HostResponse::default());
                sessions.push((session, command.operation));
            }
            Err(err) => {
                results.insert(
                    command.token.clone(),
                    HostResponse::failed(ErrorRecord::from(&err), Duration::ZERO),
                );
            }
        }
    }

    let jobs = sessions
        .iter()
        .map(|(session, operation)| (session.key().to_string(), session.run(*operation)));
    fan_out(jobs, options, &mut results).await;
    results
}

async fn fan_out<I, F>(jobs: I, options: &RunOptions, results: &mut IndexMap<String, HostResponse>)
where
    I: IntoIterator<Item = (String, F)>,
    F: Future<Output = HostResponse>,
{
    let budget = options.operation_timeout;
    let mut completed = stream::iter(jobs)
        .map(|(key, job)| async move {
            let start = Instant::now();
            let response = match tokio::time::timeout(budget, job).await {
                Ok(response) => response,
                Err(_) => {
                    warn!("{key}: no outcome within {budget:?}");
                    HostResponse::failed(ErrorRecord::TransportTimeout, start.elapsed())
                }
            };
            (key, response)
        })
        .buffer_unordered(options.max_concurrency.max(1));

    while let Some((key, response)) = completed.next().await {
        results.insert(key, response);
    }
}
