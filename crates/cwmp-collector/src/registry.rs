//! The path→collector registry.
//!
//! An immutable table built once at startup and handed to the session
//! engine as an explicit dependency. Each collector takes the executor and
//! an optional SSH host and yields a raw byte string plus a success flag;
//! paths not in the table are simply absent.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::exec::{CommandResult, Executor};
use crate::CollectorError;

pub type CollectorFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CommandResult, CollectorError>> + Send + 'a>>;

/// A collector function: `(exec, optional ssh host) -> (raw bytes, success)`.
pub type Collector =
    Arc<dyn for<'a> Fn(&'a Executor, Option<&'a str>) -> CollectorFuture<'a> + Send + Sync>;

/// Static values collectors read from the agent configuration instead of
/// the host system.
#[derive(Debug, Clone, Default)]
pub struct InformSettings {
    pub acs_url: String,
    pub username: String,
    pub password: String,
    pub serial_number: String,
    pub periodic_interval_secs: u64,
    pub provisioning_code: String,
}

pub struct CollectorRegistry {
    collectors: HashMap<String, Collector>,
}

impl CollectorRegistry {
    pub fn get(&self, path: &str) -> Option<&Collector> {
        self.collectors.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.collectors.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Registered paths in deterministic order.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.collectors.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Runs the collector for `path`. `None` when the path is not
    /// registered or the collector failed or timed out — the caller treats
    /// all three as "parameter absent".
    pub async fn collect(
        &self,
        path: &str,
        executor: &Executor,
        ssh_host: Option<&str>,
    ) -> Option<CommandResult> {
        let collector = self.collectors.get(path)?;
        match collector(executor, ssh_host).await {
            Ok(result) if result.success => Some(result),
            Ok(result) => {
                debug!(path, stderr = %result.stderr, "collector reported failure");
                None
            }
            Err(CollectorError::Timeout(deadline)) => {
                warn!(path, ?deadline, "collector timed out, treating as absent");
                None
            }
            Err(error) => {
                warn!(path, %error, "collector failed");
                None
            }
        }
    }
}

/// Builder used while assembling the table; `build` freezes it.
#[derive(Default)]
pub struct RegistryBuilder {
    collectors: HashMap<String, Collector>,
}

impl RegistryBuilder {
    pub fn fixed(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        self.collectors.insert(
            path.into(),
            Arc::new(move |_, _| {
                let value = value.clone();
                Box::pin(async move { Ok(CommandResult::fixed(value)) })
            }),
        );
        self
    }

    /// A shell one-liner, run locally or over SSH depending on the host
    /// argument.
    pub fn shell(mut self, path: impl Into<String>, script: impl Into<String>) -> Self {
        let script: Arc<str> = Arc::from(script.into());
        self.collectors.insert(
            path.into(),
            Arc::new(move |executor, ssh_host| {
                let script = Arc::clone(&script);
                Box::pin(async move {
                    match ssh_host {
                        Some(host) => executor.execute_remote(host, &script).await,
                        None => executor.shell(&script).await,
                    }
                })
            }),
        );
        self
    }

    pub fn build(self) -> CollectorRegistry {
        CollectorRegistry {
            collectors: self.collectors,
        }
    }
}

/// The collector set behind the Inform parameter list. Shell pipelines
/// carry their own fallbacks so a missing source degrades to a default
/// instead of a failure.
pub fn inform_registry(settings: &InformSettings) -> CollectorRegistry {
    let mut builder = RegistryBuilder::default()
        .fixed("Device.ManagementServer.URL", &settings.acs_url)
        .fixed("Device.ManagementServer.Username", &settings.username)
        .fixed("Device.ManagementServer.Password", &settings.password)
        .fixed("Device.ManagementServer.PeriodicInformEnable", "1")
        .fixed(
            "Device.ManagementServer.PeriodicInformInterval",
            settings.periodic_interval_secs.to_string(),
        )
        .fixed(
            "Device.DeviceInfo.ProvisioningCode",
            &settings.provisioning_code,
        )
        .shell(
            "Device.DeviceInfo.Manufacturer",
            r#"cat /etc/device_info 2>/dev/null | grep "DEVICE_MANUFACTURER" | cut -f 2 -d '=' | sed -e "s/['\"]//g" | head -n1 | tr -d '\r\n' || echo "OpenWrt""#,
        )
        .shell(
            "Device.DeviceInfo.ManufacturerOUI",
            r"cat /sys/class/net/eth0/address 2>/dev/null | cut -c 1-8 | tr -d ':' | tr '[:lower:]' '[:upper:]' || echo '000000'",
        )
        .shell(
            "Device.DeviceInfo.ManufacturerURL",
            r#"cat /etc/device_info 2>/dev/null | grep "DEVICE_MANUFACTURER_URL" | cut -f 2 -d '=' | sed -e "s/['\"]//g" | head -n1 | tr -d '\r\n' || echo "https://openwrt.org/""#,
        )
        .shell(
            "Device.DeviceInfo.ModelName",
            r#"cat /etc/device_info 2>/dev/null | grep "DEVICE_PRODUCT" | cut -f 2 -d '=' | sed -e "s/['\"]//g" | head -n1 | tr -d '\r\n' || cat /tmp/board.json 2>/dev/null | grep '"name"' | cut -f 4 -d '"' | tr -d '\r\n'"#,
        )
        .shell(
            "Device.DeviceInfo.Description",
            r#"cat /tmp/board.json 2>/dev/null | grep '"name"' | cut -f 4 -d '"' | tr -d '\r\n'"#,
        )
        .shell(
            "Device.DeviceInfo.ProductClass",
            r#"cat /tmp/board.json 2>/dev/null | grep '"id"' | cut -f 4 -d '"' | tr -d '\r\n'"#,
        )
        .shell(
            "Device.DeviceInfo.SpecVersion",
            r#"cat /etc/openwrt_release 2>/dev/null | grep "DISTRIB_RELEASE" | cut -f 2 -d '=' | tr -d '"' | tr -d '\r\n' || echo "Unknown""#,
        )
        .shell(
            "Device.DeviceInfo.HardwareVersion",
            r#"cat /etc/device_info 2>/dev/null | grep "DEVICE_REVISION" | cut -f 2 -d '=' | sed -e "s/['\"]//g" | head -n1 | tr -d '\r\n' || echo "v0""#,
        )
        .shell(
            "Device.DeviceInfo.SoftwareVersion",
            r#"cat /etc/openwrt_version 2>/dev/null | tr -d '\r\n' || cat /etc/os-release 2>/dev/null | grep "VERSION=" | cut -f 2 -d '=' | tr -d '"' | tr -d '\r\n' || echo "Unknown""#,
        )
        .shell(
            "Device.DeviceInfo.UpTime",
            r"cat /proc/uptime 2>/dev/null | cut -f 1 -d ' ' | cut -f 1 -d '.' | tr -d '\r\n' || echo '0'",
        )
        .shell(
            "Device.DeviceInfo.VendorConfigFileNumberOfEntries",
            r"ls /etc/config 2>/dev/null | wc -l | tr -d ' \r\n' || echo '0'",
        )
        .shell(
            "Device.DeviceInfo.MemoryStatus.Total",
            r#"cat /proc/meminfo 2>/dev/null | grep "MemTotal" | awk '{print $2}' | tr -d '\r\n' || echo "0""#,
        )
        .shell(
            "Device.DeviceInfo.MemoryStatus.Free",
            r#"cat /proc/meminfo 2>/dev/null | grep "MemFree" | awk '{print $2}' | tr -d '\r\n' || echo "0""#,
        )
        .shell(
            "Device.DeviceInfo.ProcessStatus.CPUUsage",
            r#"top -bn1 2>/dev/null | grep "%Cpu(s)" | awk '{print int($2 + $4)}' | tr -d '\r\n' || echo "0""#,
        )
        .shell(
            "Device.OutsideIPAddress",
            r#"curl -s "https://ip.longshot-router.com/json" 2>/dev/null | grep -o '"realIp":"[^"]*"' | cut -d':' -f2 | tr -d '"' || echo """#,
        );

    if !settings.serial_number.is_empty() {
        builder = builder.fixed("Device.DeviceInfo.SerialNumber", &settings.serial_number);
    } else {
        builder = builder.shell(
            "Device.DeviceInfo.SerialNumber",
            r#"cat /proc/cpuinfo 2>/dev/null | grep "Serial" | cut -f 2 -d ':' | tr -d ' \r\n' || uci get system.@system[0].serial 2>/dev/null | tr -d '\r\n' || echo "Unknown""#,
        );
    }

    // vendor configuration file table: name, description, backup eligibility
    for slot in 1..=6u32 {
        builder = builder
            .shell(
                format!("Device.DeviceInfo.VendorConfigFile.{slot}.Name"),
                format!(
                    r"ls /etc/config 2>/dev/null | head -n{slot} | tail -n1 | tr -d '\r\n'"
                ),
            )
            .shell(
                format!("Device.DeviceInfo.VendorConfigFile.{slot}.Description"),
                format!(
                    r#"ls /etc/config 2>/dev/null | head -n{slot} | tail -n1 | xargs -I {{}} echo "Configuration file for {{}}" | tr -d '\r\n'"#
                ),
            )
            .shell(
                format!("Device.DeviceInfo.VendorConfigFile.{slot}.UseForBackupRestore"),
                format!(
                    r#"ls /etc/config 2>/dev/null | head -n{slot} | tail -n1 | grep -E "^(system|network|firewall|dhcp|wireless)$" >/dev/null && echo "true" || echo "false""#
                ),
            );
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecConfig;

    fn settings() -> InformSettings {
        InformSettings {
            acs_url: "https://acs.example.net/tr069".to_owned(),
            username: "cpe".to_owned(),
            password: "secret".to_owned(),
            serial_number: "SN1".to_owned(),
            periodic_interval_secs: 30,
            provisioning_code: "prov-1".to_owned(),
        }
    }

    #[tokio::test]
    async fn fixed_collectors_surface_configuration() {
        let registry = inform_registry(&settings());
        let executor = Executor::new(ExecConfig::default());

        let url = registry
            .collect("Device.ManagementServer.URL", &executor, None)
            .await
            .unwrap();
        assert_eq!(url.text, "https://acs.example.net/tr069");

        let serial = registry
            .collect("Device.DeviceInfo.SerialNumber", &executor, None)
            .await
            .unwrap();
        assert_eq!(serial.text, "SN1");

        let interval = registry
            .collect(
                "Device.ManagementServer.PeriodicInformInterval",
                &executor,
                None,
            )
            .await
            .unwrap();
        assert_eq!(interval.text, "30");
    }

    #[tokio::test]
    async fn unregistered_paths_are_absent() {
        let registry = inform_registry(&settings());
        let executor = Executor::new(ExecConfig::default());
        assert!(
            registry
                .collect("Device.DeviceInfo.NoSuchThing", &executor, None)
                .await
                .is_none()
        );
    }

    #[test]
    fn registry_is_closed_and_deterministic() {
        let registry = inform_registry(&settings());
        assert!(registry.contains("Device.DeviceInfo.Manufacturer"));
        assert!(registry.contains("Device.DeviceInfo.VendorConfigFile.6.Name"));
        assert_eq!(registry.paths(), registry.paths());
        assert!(registry.len() > 20);
    }
}
