//! Parameter collection from the host operating system.
//!
//! The session engine asks the [`registry::CollectorRegistry`] for values by
//! TR-181 path; collectors run commands through the [`exec::Executor`]
//! (locally or over SSH), read UCI configuration through a
//! [`uci::ConfigStore`], call ubus objects, or enumerate wireless stations
//! over nl80211. Every invocation is bounded by a deadline; a missing
//! backing subsystem yields an empty result, never a session error.

pub mod exec;
pub mod nl80211;
pub mod refresh;
pub mod registry;
pub mod ssh;
pub mod ubus;
pub mod uci;

pub use exec::{CommandResult, ExecConfig, Executor, OutputKind};
pub use registry::CollectorRegistry;
pub use ssh::{HostKeyPolicy, SshConfig};

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// Deadline expiry. The session engine treats the parameter as absent.
    #[error("command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("command cannot be empty")]
    EmptyCommand,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH error: {0}")]
    Ssh(String),

    #[error("SSH host key rejected for {host}: {reason}")]
    HostKeyRejected { host: String, reason: String },

    #[error("no SSH authentication method configured")]
    NoSshAuth,

    #[error("UCI parse error at line {line}: {reason}")]
    UciParse { line: usize, reason: String },

    #[error("backing subsystem unavailable: {0}")]
    Unavailable(&'static str),
}

impl From<russh::Error> for CollectorError {
    fn from(error: russh::Error) -> Self {
        Self::Ssh(error.to_string())
    }
}
