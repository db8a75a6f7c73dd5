//! Local and remote command execution under a deadline.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::ssh::{self, SshConfig};
use crate::CollectorError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a command's stdout classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    String,
    Json,
    Xml,
    Binary,
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub kind: OutputKind,
    /// Trimmed textual form of stdout (empty for binary output).
    pub text: String,
    pub stderr: String,
    pub raw: Vec<u8>,
    pub success: bool,
}

impl CommandResult {
    pub fn from_output(raw: Vec<u8>, stderr: String, success: bool) -> Self {
        let (kind, text) = classify(&raw);
        Self {
            kind,
            text,
            stderr,
            raw,
            success,
        }
    }

    /// A successful result carrying a fixed value (collectors that read
    /// configuration rather than running commands).
    pub fn fixed(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            kind: OutputKind::String,
            raw: value.clone().into_bytes(),
            text: value,
            stderr: String::new(),
            success: true,
        }
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        if self.kind == OutputKind::Json {
            serde_json::from_slice(&self.raw).ok()
        } else {
            None
        }
    }
}

/// The classification chain: JSON, then XML, then binary (non-printable
/// bytes), then trimmed string.
fn classify(raw: &[u8]) -> (OutputKind, String) {
    if raw.is_empty() {
        return (OutputKind::String, String::new());
    }
    if serde_json::from_slice::<serde_json::Value>(raw).is_ok() {
        return (
            OutputKind::Json,
            String::from_utf8_lossy(raw).trim().to_owned(),
        );
    }
    if let Ok(text) = std::str::from_utf8(raw) {
        if roxmltree::Document::parse(text).is_ok() {
            return (OutputKind::Xml, text.trim().to_owned());
        }
    }
    let binary = raw
        .iter()
        .any(|byte| *byte < 32 && !matches!(byte, 9 | 10 | 13));
    if binary {
        (OutputKind::Binary, String::new())
    } else {
        (
            OutputKind::String,
            String::from_utf8_lossy(raw).trim().to_owned(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    /// Per-invocation deadline; zero means [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
    pub ssh: Option<SshConfig>,
}

/// Runs commands locally or on the configured SSH host, always under the
/// deadline. Deadlines are the sole cancellation mechanism.
#[derive(Debug, Clone)]
pub struct Executor {
    config: ExecConfig,
}

impl Executor {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn ssh_config(&self) -> Option<&SshConfig> {
        self.config.ssh.as_ref()
    }

    /// Runs a command with arguments locally.
    #[instrument(level = "debug", skip(self))]
    pub async fn execute(
        &self,
        command: &str,
        args: &[&str],
    ) -> Result<CommandResult, CollectorError> {
        if command.is_empty() {
            return Err(CollectorError::EmptyCommand);
        }
        let child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let deadline = self.timeout();
        let output = tokio::time::timeout(deadline, child.wait_with_output())
            .await
            .map_err(|_| CollectorError::Timeout(deadline))??;

        let result = CommandResult::from_output(
            output.stdout,
            String::from_utf8_lossy(&output.stderr).into_owned(),
            output.status.success(),
        );
        debug!(kind = ?result.kind, success = result.success, "command finished");
        Ok(result)
    }

    /// Runs a shell pipeline locally (`sh -c`). The collector one-liners
    /// are pipelines with fallbacks, so this is the common entry point.
    pub async fn shell(&self, script: &str) -> Result<CommandResult, CollectorError> {
        self.execute("sh", &["-c", script]).await
    }

    /// Runs a command on a remote host over SSH, same deadline, same result
    /// shape.
    #[instrument(level = "debug", skip(self, command))]
    pub async fn execute_remote(
        &self,
        host: &str,
        command: &str,
    ) -> Result<CommandResult, CollectorError> {
        if host.is_empty() || command.is_empty() {
            return Err(CollectorError::EmptyCommand);
        }
        let ssh = self
            .config
            .ssh
            .as_ref()
            .ok_or(CollectorError::NoSshAuth)?;
        let deadline = self.timeout();
        tokio::time::timeout(deadline, ssh::run(ssh, host, command))
            .await
            .map_err(|_| CollectorError::Timeout(deadline))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_chain_json_xml_binary_string() {
        assert_eq!(classify(br#"{"up":true}"#).0, OutputKind::Json);
        assert_eq!(classify(b"<status><up/></status>").0, OutputKind::Xml);
        assert_eq!(classify(&[0x7f, 0x45, 0x4c, 0x46, 0x01]).0, OutputKind::Binary);
        let (kind, text) = classify(b"  OpenWrt 23.05  \n");
        assert_eq!(kind, OutputKind::String);
        assert_eq!(text, "OpenWrt 23.05");
        assert_eq!(classify(b"").0, OutputKind::String);
    }

    #[test]
    fn tabs_and_newlines_are_not_binary() {
        let (kind, _) = classify(b"col1\tcol2\r\nval1\tval2\n");
        assert_eq!(kind, OutputKind::String);
    }

    #[tokio::test]
    async fn executes_local_commands() {
        let executor = Executor::new(ExecConfig::default());
        let result = executor.execute("echo", &["hello"]).await.unwrap();
        assert!(result.success);
        assert_eq!(result.text, "hello");
    }

    #[tokio::test]
    async fn deadline_expiry_is_a_timeout() {
        let executor = Executor::new(ExecConfig {
            timeout: Some(Duration::from_millis(50)),
            ssh: None,
        });
        let error = executor.shell("sleep 5").await.unwrap_err();
        assert!(matches!(error, CollectorError::Timeout(_)));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let executor = Executor::new(ExecConfig::default());
        assert!(matches!(
            executor.execute("", &[]).await,
            Err(CollectorError::EmptyCommand)
        ));
    }
}
