//! Agent configuration.
//!
//! A single YAML file, `/etc/cwmp/config.yaml` by default. A missing file
//! (or directory) is created with defaults on first start; failing to do so
//! is fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use cwmp_collector::{HostKeyPolicy, SshConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/cwmp/config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub acs_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub serial_number: String,
    /// Seconds between periodic informs.
    #[serde(default = "default_periodic_interval")]
    pub periodic_interval: u64,
    /// Ceiling for the adaptive interval when sessions keep timing out.
    #[serde(default = "default_periodic_interval_max")]
    pub periodic_interval_max: u64,
    #[serde(default)]
    pub provisioning_code: String,
    /// Remote-execution settings for collectors that run over SSH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSettings {
    pub host: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// PEM key material inline in the configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,
    /// OpenSSH known-hosts file to verify the server key against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_hosts: Option<PathBuf>,
    /// Pinned SHA-256 host key fingerprint, `ssh-keygen -lf` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_fingerprint: Option<String>,
    /// Explicit opt-out of host key verification. Off by default.
    #[serde(default)]
    pub insecure_accept_any_host_key: bool,
}

impl SshSettings {
    /// Resolves the host-key policy; refusing to guess when nothing is
    /// configured is the point of the redesign.
    pub fn host_key_policy(&self) -> anyhow::Result<HostKeyPolicy> {
        if let Some(path) = &self.known_hosts {
            return Ok(HostKeyPolicy::KnownHosts(path.clone()));
        }
        if let Some(fingerprint) = &self.host_key_fingerprint {
            return Ok(HostKeyPolicy::Fingerprint(fingerprint.clone()));
        }
        if self.insecure_accept_any_host_key {
            return Ok(HostKeyPolicy::InsecureAcceptAny);
        }
        anyhow::bail!(
            "ssh host key policy required: set known_hosts, host_key_fingerprint, \
             or insecure_accept_any_host_key: true"
        )
    }

    pub fn to_ssh_config(&self) -> anyhow::Result<SshConfig> {
        Ok(SshConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            private_key: self.private_key.clone(),
            private_key_path: self.private_key_path.clone(),
            host_key_policy: self.host_key_policy()?,
        })
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            acs_url: "https://acs.example.net/tr069".to_owned(),
            username: String::new(),
            password: String::new(),
            serial_number: String::new(),
            periodic_interval: default_periodic_interval(),
            periodic_interval_max: default_periodic_interval_max(),
            provisioning_code: String::new(),
            ssh: None,
        }
    }
}

fn default_periodic_interval() -> u64 {
    30
}

fn default_periodic_interval_max() -> u64 {
    300
}

impl AgentConfig {
    pub fn periodic_interval(&self) -> Duration {
        Duration::from_secs(self.periodic_interval.max(1))
    }

    pub fn periodic_interval_max(&self) -> Duration {
        Duration::from_secs(self.periodic_interval_max.max(self.periodic_interval))
    }

    /// Loads the configuration, writing a default file on first start.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let default = Self::default();
            let rendered = serde_yaml::to_string(&default).context("rendering default config")?;
            std::fs::write(path, rendered)
                .with_context(|| format!("writing default config to {}", path.display()))?;
            info!(path = %path.display(), "wrote default configuration");
            return Ok(default);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cwmp/config.yaml");

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.periodic_interval, 30);
        assert!(path.exists());

        // and the written file parses back to the same values
        let reloaded = AgentConfig::load(&path).unwrap();
        assert_eq!(reloaded.acs_url, config.acs_url);
    }

    #[test]
    fn parses_the_documented_surface() {
        let yaml = "\
acs_url: https://acs.example.com/tr069
username: cpe-1
password: hunter2
serial_number: SN1
periodic_interval: 60
provisioning_code: prov
";
        let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.serial_number, "SN1");
        assert_eq!(config.periodic_interval(), Duration::from_secs(60));
        assert_eq!(config.periodic_interval_max, 300);
    }

    #[test]
    fn ssh_requires_an_explicit_host_key_policy() {
        let settings = SshSettings {
            host: "router.lan".to_owned(),
            username: "root".to_owned(),
            password: Some(String::new()),
            private_key: None,
            private_key_path: None,
            known_hosts: None,
            host_key_fingerprint: None,
            insecure_accept_any_host_key: false,
        };
        assert!(settings.host_key_policy().is_err());

        let pinned = SshSettings {
            host_key_fingerprint: Some("SHA256:abcdef".to_owned()),
            ..settings
        };
        assert!(matches!(
            pinned.host_key_policy().unwrap(),
            HostKeyPolicy::Fingerprint(_)
        ));
    }
}
