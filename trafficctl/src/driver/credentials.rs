//! Controller credentials.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::platform::ProtocolFamily;

/// Secrets used to reach controllers.
///
/// Every secret is a [`SecretString`]: `Debug` output is redacted and the
/// values are only exposed at the moment they go on the wire.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub stcip_read: SecretString,
    pub stcip_write: SecretString,
    pub ug405_read: SecretString,
    pub ug405_write: SecretString,
    pub ssh_user: String,
    pub ssh_password: SecretString,
    /// Private key file; takes precedence over `ssh_password`.
    pub ssh_key: Option<PathBuf>,
    pub ssh_key_passphrase: Option<SecretString>,
    /// Level-2 terminal password
    pub terminal_password: SecretString,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            stcip_read: SecretString::from("public"),
            stcip_write: SecretString::from("private"),
            ug405_read: SecretString::from("public"),
            ug405_write: SecretString::from("private"),
            ssh_user: String::new(),
            ssh_password: SecretString::from(""),
            ssh_key: None,
            ssh_key_passphrase: None,
            terminal_password: SecretString::from(""),
        }
    }
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// STCIP read and write communities.
    pub fn with_stcip(mut self, read: impl Into<String>, write: impl Into<String>) -> Self {
        self.stcip_read = SecretString::from(read.into());
        self.stcip_write = SecretString::from(write.into());
        self
    }

    /// UG405 read and write communities.
    pub fn with_ug405(mut self, read: impl Into<String>, write: impl Into<String>) -> Self {
        self.ug405_read = SecretString::from(read.into());
        self.ug405_write = SecretString::from(write.into());
        self
    }

    /// SSH login.
    pub fn with_ssh(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.ssh_user = user.into();
        self.ssh_password = SecretString::from(password.into());
        self
    }

    /// SSH login with a private key file.
    pub fn with_ssh_key(
        mut self,
        user: impl Into<String>,
        path: impl Into<PathBuf>,
        passphrase: Option<String>,
    ) -> Self {
        self.ssh_user = user.into();
        self.ssh_key = Some(path.into());
        self.ssh_key_passphrase = passphrase.map(SecretString::from);
        self
    }

    /// Level-2 terminal password.
    pub fn with_terminal_password(mut self, password: impl Into<String>) -> Self {
        self.terminal_password = SecretString::from(password.into());
        self
    }

    /// Community for an SNMP family.
    pub fn community(&self, protocol: ProtocolFamily, write: bool) -> &SecretString {
        match (protocol, write) {
            (ProtocolFamily::Ug405, false) => &self.ug405_read,
            (ProtocolFamily::Ug405, true) => &self.ug405_write,
            (_, false) => &self.stcip_read,
            (_, true) => &self.stcip_write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_debug_is_redacted() {
        let credentials = Credentials::new()
            .with_stcip("reader-7", "writer-7")
            .with_ssh("operator", "ssh-pass-1")
            .with_terminal_password("2222");
        let shown = format!("{credentials:?}");
        for secret in ["reader-7", "writer-7", "ssh-pass-1", "2222"] {
            assert!(!shown.contains(secret), "{secret} leaked");
        }
        assert!(shown.contains("operator"));

        let keyed = Credentials::new().with_ssh_key(
            "operator",
            "/etc/trafficctl/id_ed25519",
            Some("key-phrase-3".to_string()),
        );
        let shown = format!("{keyed:?}");
        assert!(!shown.contains("key-phrase-3"));
        assert!(shown.contains("id_ed25519"));
    }

    #[test]
    fn test_community_selection() {
        let credentials = Credentials::new().with_ug405("u-read", "u-write");
        assert_eq!(
            credentials.community(ProtocolFamily::Ug405, true).expose_secret(),
            "u-write"
        );
        assert_eq!(
            credentials.community(ProtocolFamily::Stcip, false).expose_secret(),
            "public"
        );
    }
}
