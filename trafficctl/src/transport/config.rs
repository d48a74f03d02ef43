//! Transport configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// SSH connection configuration for a controller terminal.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Create a configuration with default port, timeout and terminal size.
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            timeout: Duration::from_secs(10),
            terminal_width: 132,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

/// TLS verification mode for controller web panels.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the built-in root store.
    System,
    /// Trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (controllers usually ship self-signed ones).
    #[default]
    DangerAcceptInvalid,
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub tls: TlsMode,

    /// Client-wide ceiling; each request also carries its vendor timeout.
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_config_defaults() {
        let config = SshConfig::new(
            "10.0.0.5",
            "admin",
            AuthMethod::Password(SecretString::from("secret")),
        );
        assert_eq!(config.socket_addr(), "10.0.0.5:22");
        assert!(matches!(
            config.host_key_verification,
            HostKeyVerification::AcceptNew
        ));
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let auth = AuthMethod::Password(SecretString::from("hunter2"));
        assert!(!format!("{auth:?}").contains("hunter2"));
    }
}
