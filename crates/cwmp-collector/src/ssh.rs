//! Remote execution over SSH.
//!
//! Authentication tries password, embedded key bytes, then a key file —
//! first configured method wins. Host keys are verified against a
//! known-hosts file or a pinned SHA-256 fingerprint; accepting any key is an
//! explicit opt-in that is logged loudly, never a default.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Msg};
use russh::{Channel, ChannelMsg};
use russh_keys::key;
use tracing::{debug, warn};

use crate::CollectorError;
use crate::exec::CommandResult;

#[derive(Debug, Clone)]
pub enum HostKeyPolicy {
    /// Verify against an OpenSSH `known_hosts` file.
    KnownHosts(PathBuf),
    /// Verify against a pinned SHA-256 fingerprint (the `ssh-keygen -lf`
    /// base64 form, with or without the `SHA256:` prefix).
    Fingerprint(String),
    /// Accept any host key. Configuration opt-out only.
    InsecureAcceptAny,
}

#[derive(Debug, Clone)]
pub struct SshConfig {
    pub username: String,
    pub password: Option<String>,
    /// PEM-encoded private key material embedded in the configuration.
    pub private_key: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub host_key_policy: HostKeyPolicy,
}

struct HostKeyVerifier {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for HostKeyVerifier {
    type Error = russh::Error;

    async fn check_server_key(
        self,
        server_public_key: &key::PublicKey,
    ) -> Result<(Self, bool), Self::Error> {
        let accepted = match &self.policy {
            HostKeyPolicy::KnownHosts(path) => {
                let known = russh_keys::check_known_hosts_path(
                    &self.host,
                    self.port,
                    server_public_key,
                    path,
                )
                .unwrap_or(false);
                if !known {
                    warn!(host = %self.host, "host key not present in {}", path.display());
                }
                known
            }
            HostKeyPolicy::Fingerprint(pinned) => {
                let fingerprint = server_public_key.fingerprint();
                let pinned = pinned.trim_start_matches("SHA256:");
                let matches = fingerprint.trim_start_matches("SHA256:") == pinned;
                if !matches {
                    warn!(
                        host = %self.host,
                        presented = %fingerprint,
                        "host key fingerprint mismatch"
                    );
                }
                matches
            }
            HostKeyPolicy::InsecureAcceptAny => {
                warn!(
                    host = %self.host,
                    "accepting SSH host key without verification (insecure opt-out)"
                );
                true
            }
        };
        Ok((self, accepted))
    }
}

fn split_host_port(host: &str) -> (String, u16) {
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name.to_owned(), port),
            Err(_) => (host.to_owned(), 22),
        },
        None => (host.to_owned(), 22),
    }
}

fn load_key(config: &SshConfig) -> Result<Option<Arc<key::KeyPair>>, CollectorError> {
    if let Some(pem) = &config.private_key {
        let pair = russh_keys::decode_secret_key(pem, None)
            .map_err(|e| CollectorError::Ssh(format!("bad embedded key: {e}")))?;
        return Ok(Some(Arc::new(pair)));
    }
    if let Some(path) = &config.private_key_path {
        let pair = russh_keys::load_secret_key(path, None)
            .map_err(|e| CollectorError::Ssh(format!("bad key file: {e}")))?;
        return Ok(Some(Arc::new(pair)));
    }
    Ok(None)
}

/// Connects, authenticates and runs one command. The caller wraps this in
/// the executor deadline.
pub async fn run(
    config: &SshConfig,
    host: &str,
    command: &str,
) -> Result<CommandResult, CollectorError> {
    let (hostname, port) = split_host_port(host);
    let handler = HostKeyVerifier {
        host: hostname.clone(),
        port,
        policy: config.host_key_policy.clone(),
    };

    let ssh_config = Arc::new(client::Config::default());
    let mut session = client::connect(ssh_config, (hostname.as_str(), port), handler)
        .await
        .map_err(|e| match e {
            russh::Error::UnknownKey => CollectorError::HostKeyRejected {
                host: host.to_owned(),
                reason: "server key failed the host key policy".to_owned(),
            },
            other => CollectorError::from(other),
        })?;

    let authenticated = authenticate(&mut session, config).await?;
    if !authenticated {
        return Err(CollectorError::Ssh("authentication failed".to_owned()));
    }

    let channel = session.channel_open_session().await?;
    let result = exec_on_channel(channel, command).await;

    let _ = session
        .disconnect(russh::Disconnect::ByApplication, "", "en")
        .await;
    result
}

async fn authenticate(
    session: &mut client::Handle<HostKeyVerifier>,
    config: &SshConfig,
) -> Result<bool, CollectorError> {
    if let Some(password) = &config.password {
        debug!(user = %config.username, "authenticating with password");
        return Ok(session
            .authenticate_password(&config.username, password)
            .await?);
    }
    if let Some(key) = load_key(config)? {
        debug!(user = %config.username, "authenticating with private key");
        return Ok(session
            .authenticate_publickey(&config.username, key)
            .await?);
    }
    Err(CollectorError::NoSshAuth)
}

async fn exec_on_channel(
    mut channel: Channel<Msg>,
    command: &str,
) -> Result<CommandResult, CollectorError> {
    channel.exec(true, command).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_status = None;

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
            ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
            ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
            _ => {}
        }
    }

    Ok(CommandResult::from_output(
        stdout,
        String::from_utf8_lossy(&stderr).into_owned(),
        exit_status == Some(0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_port_splitting_defaults_to_22() {
        assert_eq!(split_host_port("router.lan"), ("router.lan".to_owned(), 22));
        assert_eq!(
            split_host_port("router.lan:2222"),
            ("router.lan".to_owned(), 2222)
        );
        assert_eq!(
            split_host_port("router.lan:abc"),
            ("router.lan:abc".to_owned(), 22)
        );
    }
}
