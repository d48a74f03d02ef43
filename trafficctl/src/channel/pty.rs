//! Interactive PTY channel with drain-until-idle reads.

use std::future::Future;
use std::time::Duration;

use log::{trace, warn};
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::{Instant, timeout};

use super::buffer::OutputBuffer;
use crate::error::{Result, TransportError};

/// Byte stream of an interactive shell.
pub trait ShellIo: Send {
    /// Next chunk of output, or `None` once the shell is closed.
    fn next_chunk(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Write raw bytes to the shell.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

impl ShellIo for Channel<Msg> {
    async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.wait().await? {
                ChannelMsg::Data { data } => return Some(data.to_vec()),
                ChannelMsg::ExtendedData { data, .. } => return Some(data.to_vec()),
                ChannelMsg::Eof | ChannelMsg::Close => return None,
                _ => continue,
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data(data).await.map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// When a drain read stops.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Stop once no byte arrived for this long.
    pub idle: Duration,

    /// Hard cap for one read.
    pub deadline: Duration,

    /// Stop early when the tail matches this prompt.
    pub prompt: Option<Regex>,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_millis(400),
            deadline: Duration::from_secs(5),
            prompt: None,
        }
    }
}

/// Why a drain read stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    Idle,
    Prompt,
    Closed,
    Deadline,
}

/// Read into `buffer` until the shell goes quiet, closes, shows the prompt
/// or the deadline passes.
pub async fn drain<S: ShellIo>(
    io: &mut S,
    buffer: &mut OutputBuffer,
    config: &DrainConfig,
) -> DrainEnd {
    let deadline = Instant::now() + config.deadline;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!("terminal read hit its {:?} cap", config.deadline);
            return DrainEnd::Deadline;
        }

        let window = config.idle.min(remaining);
        match timeout(window, io.next_chunk()).await {
            Ok(Some(chunk)) => {
                buffer.extend(&chunk);
                if config
                    .prompt
                    .as_ref()
                    .is_some_and(|prompt| buffer.tail_contains(prompt))
                {
                    return DrainEnd::Prompt;
                }
            }
            Ok(None) => return DrainEnd::Closed,
            Err(_) if window < config.idle => {
                warn!("terminal read hit its {:?} cap", config.deadline);
                return DrainEnd::Deadline;
            }
            Err(_) => return DrainEnd::Idle,
        }
    }
}

/// Command/reply exchange over a [`ShellIo`].
pub struct PtyChannel<S> {
    io: S,
    buffer: OutputBuffer,
    drain: DrainConfig,
}

impl<S: ShellIo> PtyChannel<S> {
    pub fn new(io: S, drain: DrainConfig) -> Self {
        Self {
            io,
            buffer: OutputBuffer::default(),
            drain,
        }
    }

    /// Read whatever the shell prints before the first command.
    pub async fn read_banner(&mut self) -> String {
        drain(&mut self.io, &mut self.buffer, &self.drain).await;
        self.buffer.take_string()
    }

    /// Send one command line and return the raw reply.
    pub async fn exchange(&mut self, command: &str) -> Result<String> {
        trace!("terminal > {command}");
        self.io.write(format!("{command}\r").as_bytes()).await?;
        self.read_reply().await
    }

    /// Send a secret line. The line itself is never logged.
    pub async fn exchange_secret(&mut self, secret: &SecretString) -> Result<String> {
        trace!("terminal > ********");
        let mut line = secret.expose_secret().as_bytes().to_vec();
        line.push(b'\r');
        self.io.write(&line).await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<String> {
        let end = drain(&mut self.io, &mut self.buffer, &self.drain).await;
        let reply = self.buffer.take_string();
        if end == DrainEnd::Closed && reply.is_empty() {
            return Err(TransportError::Disconnected.into());
        }
        trace!("terminal < {reply:?}");
        Ok(reply)
    }

    /// Give the underlying stream back.
    pub fn into_inner(self) -> S {
        self.io
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::sync::mpsc;

    /// In-memory shell: replies come from a channel, writes are recorded.
    pub(crate) struct ScriptedShell {
        pub rx: mpsc::UnboundedReceiver<Vec<u8>>,
        pub written: Vec<String>,
    }

    impl ShellIo for ScriptedShell {
        async fn next_chunk(&mut self) -> Option<Vec<u8>> {
            self.rx.recv().await
        }

        async fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written.push(String::from_utf8_lossy(data).into_owned());
            Ok(())
        }
    }

    fn shell() -> (mpsc::UnboundedSender<Vec<u8>>, ScriptedShell) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, ScriptedShell { rx, written: vec![] })
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_stops_when_idle() {
        let (tx, mut io) = shell();
        tx.send(b"line 1\r\n".to_vec()).unwrap();
        tx.send(b"line 2\r\n".to_vec()).unwrap();

        let mut buffer = OutputBuffer::default();
        let end = drain(&mut io, &mut buffer, &DrainConfig::default()).await;
        assert_eq!(end, DrainEnd::Idle);
        assert_eq!(buffer.take_string(), "line 1\nline 2\n");
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_stops_at_prompt() {
        let (tx, mut io) = shell();
        tx.send(b"OK\r\nSWARCO>".to_vec()).unwrap();
        tx.send(b"late".to_vec()).unwrap();

        let config = DrainConfig {
            prompt: Some(Regex::new(r">\s*$").unwrap()),
            ..Default::default()
        };
        let mut buffer = OutputBuffer::default();
        assert_eq!(drain(&mut io, &mut buffer, &config).await, DrainEnd::Prompt);
        assert_eq!(buffer.as_slice(), b"OK\nSWARCO>");
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_reports_close() {
        let (tx, mut io) = shell();
        tx.send(b"bye".to_vec()).unwrap();
        drop(tx);

        let mut buffer = OutputBuffer::default();
        let end = drain(&mut io, &mut buffer, &DrainConfig::default()).await;
        assert_eq!(end, DrainEnd::Closed);
        assert_eq!(buffer.as_slice(), b"bye");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_is_capped_by_deadline() {
        let (tx, mut io) = shell();
        let feeder = tokio::spawn(async move {
            loop {
                if tx.send(b".".to_vec()).is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        });

        let config = DrainConfig {
            deadline: Duration::from_secs(1),
            ..Default::default()
        };
        let mut buffer = OutputBuffer::default();
        assert_eq!(drain(&mut io, &mut buffer, &config).await, DrainEnd::Deadline);
        assert!(buffer.len() >= 9);
        drop(io);
        feeder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_instat_reply_parses_after_cleaning() {
        use crate::parser::terminal::{normalize_output, parse_instat};

        let (tx, io) = shell();
        let config = DrainConfig {
            prompt: Some(Regex::new(r">\s*$").unwrap()),
            ..Default::default()
        };
        let mut pty = PtyChannel::new(io, config);
        tx.send(b"instat102 ?\r\n\x1b[1mINPUT STATUS\x1b[0m\r\n".to_vec())
            .unwrap();
        tx.send(b" 102 103 104 105\r\n\0  1   0   0   1\r\nSWARCO>".to_vec())
            .unwrap();

        let reply = pty.exchange("instat102 ?").await.unwrap();
        assert!(!reply.contains('\r'));
        assert_eq!(
            normalize_output(&reply, "instat102 ?"),
            "INPUT STATUS\n 102 103 104 105\n  1   0   0   1"
        );

        let inputs = parse_instat(&reply).unwrap();
        assert!(inputs.is_on(102));
        assert!(!inputs.is_on(103));
        assert!(inputs.is_on(105));
    }

    #[tokio::test(start_paused = true)]
    async fn test_secret_is_written_but_not_echoed_in_command_log() {
        let (tx, io) = shell();
        let mut pty = PtyChannel::new(io, DrainConfig::default());
        tx.send(b"\r\nLevel 2 OK\r\n".to_vec()).unwrap();

        let reply = pty
            .exchange_secret(&SecretString::from("2222"))
            .await
            .unwrap();
        assert!(reply.contains("Level 2 OK"));
        assert_eq!(pty.into_inner().written, vec!["2222\r"]);
    }
}
