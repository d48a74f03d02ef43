//! SSH transport for controller terminals, using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// An authenticated SSH connection to one controller.
pub struct SshTransport {
    session: Handle<SshHandler>,
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the controller and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let host_key_error = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: Arc::clone(&host_key_error),
        };

        debug!("SSH connect {}", config.socket_addr());
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the detailed host-key error over russh's UnknownKey
            host_key_error
                .lock()
                .ok()
                .and_then(|mut slot| slot.take())
                .unwrap_or(TransportError::Ssh(e))
        })?;

        Self::authenticate(&mut session, &config).await?;
        Ok(Self { session, config })
    }

    /// Open an interactive shell on a PTY.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "vt100",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// `Ok(true)` if known and matching, `Ok(false)` if unknown.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => russh::keys::known_hosts::learn_known_hosts_path(
                &self.host, self.port, pubkey, path,
            ),
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn verify(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let strict = match self.host_key_verification {
            HostKeyVerification::Disabled => return Ok(()),
            HostKeyVerification::Strict => true,
            HostKeyVerification::AcceptNew => false,
        };

        if self.check_known_hosts(pubkey)? {
            return Ok(());
        }
        if strict {
            return Err(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            });
        }
        if let Err(e) = self.learn_host_key(pubkey) {
            warn!("Failed to save host key for {}: {}", self.host, e);
        }
        Ok(())
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.verify(server_public_key) {
            Ok(()) => Ok(true),
            Err(e) => {
                if let Ok(mut slot) = self.host_key_error.lock() {
                    *slot = Some(e);
                }
                Ok(false)
            }
        }
    }
}
