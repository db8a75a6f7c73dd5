//! Snapshot refresh jobs.
//!
//! These run outside the inform path (the scheduler fires them) and persist
//! what they find into the `tr069` UCI package through a [`ConfigStore`].
//! Everything degrades: no wireless subsystem means an empty snapshot, not
//! an error.

use tracing::{debug, warn};

use crate::exec::Executor;
use crate::nl80211;
use crate::ubus::UbusClient;
use crate::uci::ConfigStore;
use crate::CollectorError;

/// A logical wireless interface assembled from the UCI `wireless` package
/// plus live interface state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiInterface {
    pub name: String,
    pub device: String,
    pub ssid: String,
    pub enabled: bool,
    pub network: String,
    pub status: String,
    pub bssid: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors_sent: u64,
    pub errors_received: u64,
    pub discards_sent: u64,
    pub discards_received: u64,
}

/// Parses `uci show wireless` output into interface records. Handles both
/// named sections (`wireless.wifinet0`) and anonymous `@wifi-iface[n]`
/// sections.
pub fn parse_wireless_config(output: &str) -> Vec<WifiInterface> {
    let mut iface_sections: Vec<String> = Vec::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            if !key.contains('.') {
                continue;
            }
            if unquote(value) == "wifi-iface" {
                if let Some(section) = key.strip_prefix("wireless.") {
                    iface_sections.push(section.to_owned());
                }
            }
        }
    }

    let mut interfaces = Vec::new();
    for section in &iface_sections {
        let prefix = format!("wireless.{section}.");
        let mut iface = WifiInterface {
            enabled: true,
            ..WifiInterface::default()
        };
        for line in output.lines() {
            let Some(rest) = line.strip_prefix(&prefix) else {
                continue;
            };
            let Some((option, value)) = rest.split_once('=') else {
                continue;
            };
            let value = unquote(value);
            match option {
                "ifname" => iface.name = value.to_owned(),
                "device" => iface.device = value.to_owned(),
                "ssid" => iface.ssid = value.to_owned(),
                "network" => iface.network = value.to_owned(),
                "disabled" => iface.enabled = value != "1",
                _ => {}
            }
        }
        if !iface.ssid.is_empty() {
            interfaces.push(iface);
        }
    }
    interfaces
}

fn unquote(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches(['\'', '"'])
        .trim_end_matches(['\'', '"'])
}

async fn wireless_interfaces(executor: &Executor) -> Vec<WifiInterface> {
    let output = match executor.execute("uci", &["show", "wireless"]).await {
        Ok(result) if result.success => result.text,
        Ok(result) => {
            debug!(stderr = %result.stderr, "no wireless configuration");
            return Vec::new();
        }
        Err(error) => {
            debug!(%error, "uci unavailable");
            return Vec::new();
        }
    };
    let mut interfaces = parse_wireless_config(&output);
    for interface in &mut interfaces {
        if interface.name.is_empty() {
            // No explicit ifname: fall back to the radio's default name.
            interface.name = format!("wlan{}", interface.device.trim_start_matches("radio"));
        }
        let (status, mac) = interface_state(executor, &interface.name).await;
        interface.status = status;
        interface.mac_address = mac.clone();
        interface.bssid = mac;
    }
    interfaces
}

async fn interface_state(executor: &Executor, ifname: &str) -> (String, String) {
    let mut operstate = executor
        .shell(&format!("cat /sys/class/net/{ifname}/operstate 2>/dev/null"))
        .await
        .map(|r| r.text)
        .unwrap_or_default();
    if operstate.is_empty() {
        // sysfs not there (container, odd driver): ask netifd over ubus
        let ubus = UbusClient::new(executor.clone());
        if let Ok(Some(status)) = ubus
            .call(
                "network.device",
                "status",
                &serde_json::json!({ "name": ifname }),
            )
            .await
        {
            if status.get("up").and_then(serde_json::Value::as_bool) == Some(true) {
                operstate = "up".to_owned();
            }
        }
    }
    let status = if operstate == "up" { "Up" } else { "Down" };
    let mac = executor
        .shell(&format!("cat /sys/class/net/{ifname}/address 2>/dev/null"))
        .await
        .map(|r| r.text)
        .unwrap_or_default();
    (status.to_owned(), mac)
}

async fn link_stats(executor: &Executor, ifname: &str) -> LinkStats {
    async fn counter(executor: &Executor, ifname: &str, name: &str) -> u64 {
        executor
            .shell(&format!(
                "cat /sys/class/net/{ifname}/statistics/{name} 2>/dev/null"
            ))
            .await
            .ok()
            .and_then(|r| r.text.parse().ok())
            .unwrap_or(0)
    }
    LinkStats {
        bytes_sent: counter(executor, ifname, "tx_bytes").await,
        bytes_received: counter(executor, ifname, "rx_bytes").await,
        packets_sent: counter(executor, ifname, "tx_packets").await,
        packets_received: counter(executor, ifname, "rx_packets").await,
        errors_sent: counter(executor, ifname, "tx_errors").await,
        errors_received: counter(executor, ifname, "rx_errors").await,
        discards_sent: counter(executor, ifname, "tx_dropped").await,
        discards_received: counter(executor, ifname, "rx_dropped").await,
    }
}

/// Stations associated to `ifname`: nl80211 first, `iw` output as the
/// fallback for kernels the raw path cannot talk to.
pub async fn associated_stations(executor: &Executor, ifname: &str) -> Vec<nl80211::Station> {
    let owned = ifname.to_owned();
    let stations = tokio::task::spawn_blocking(move || nl80211::station_dump(&owned))
        .await
        .unwrap_or_default();
    if !stations.is_empty() {
        return stations;
    }
    match executor
        .execute("iw", &["dev", ifname, "station", "dump"])
        .await
    {
        Ok(result) if result.success => parse_iw_station_dump(&result.text),
        _ => Vec::new(),
    }
}

/// Parses `iw dev <if> station dump` output.
pub fn parse_iw_station_dump(output: &str) -> Vec<nl80211::Station> {
    let mut stations: Vec<nl80211::Station> = Vec::new();
    for raw_line in output.lines() {
        let line = raw_line.trim();
        if let Some(rest) = line.strip_prefix("Station ") {
            let mac = rest.split_whitespace().next().unwrap_or_default();
            stations.push(nl80211::Station {
                mac: mac.to_ascii_lowercase(),
                signal_dbm: 0,
                inactive_ms: 0,
            });
        } else if let Some(station) = stations.last_mut() {
            if let Some(value) = line.strip_prefix("signal:") {
                station.signal_dbm = leading_int(value);
            } else if let Some(value) = line.strip_prefix("inactive time:") {
                station.inactive_ms = leading_int(value).max(0) as u32;
            }
        }
    }
    stations
}

fn leading_int(raw: &str) -> i32 {
    raw.trim()
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

/// Collects the wireless snapshot and persists it under the `WiFi` section
/// of the store: SSID table, per-SSID stats, and the associated stations of
/// each access point.
pub async fn refresh_wifi(
    executor: &Executor,
    store: &mut dyn ConfigStore,
) -> Result<(), CollectorError> {
    let interfaces = wireless_interfaces(executor).await;
    store
        .set("WiFi", "SSIDNumberOfEntries", &interfaces.len().to_string())
        .await?;
    store
        .set(
            "WiFi",
            "AccessPointNumberOfEntries",
            &interfaces.len().to_string(),
        )
        .await?;

    for (position, interface) in interfaces.iter().enumerate() {
        let slot = position + 1;
        let ssid = format!("SSID.{slot}.");
        store
            .set(
                "WiFi",
                &format!("{ssid}Enable"),
                if interface.enabled { "true" } else { "false" },
            )
            .await?;
        store
            .set("WiFi", &format!("{ssid}Status"), &interface.status)
            .await?;
        store
            .set("WiFi", &format!("{ssid}SSID"), &interface.ssid)
            .await?;
        store
            .set("WiFi", &format!("{ssid}BSSID"), &interface.bssid)
            .await?;
        store
            .set("WiFi", &format!("{ssid}MACAddress"), &interface.mac_address)
            .await?;
        store
            .set(
                "WiFi",
                &format!("{ssid}LowerLayers"),
                &format!("Device.WiFi.Radio.{}.", interface.device),
            )
            .await?;

        let stats = link_stats(executor, &interface.name).await;
        for (leaf, value) in [
            ("Stats.BytesSent", stats.bytes_sent),
            ("Stats.BytesReceived", stats.bytes_received),
            ("Stats.PacketsSent", stats.packets_sent),
            ("Stats.PacketsReceived", stats.packets_received),
            ("Stats.ErrorsSent", stats.errors_sent),
            ("Stats.ErrorsReceived", stats.errors_received),
            ("Stats.DiscardPacketsSent", stats.discards_sent),
            ("Stats.DiscardPacketsReceived", stats.discards_received),
        ] {
            store
                .set("WiFi", &format!("{ssid}{leaf}"), &value.to_string())
                .await?;
        }

        let stations = associated_stations(executor, &interface.name).await;
        store
            .set(
                "WiFi",
                &format!("AccessPoint.{slot}.AssociatedDeviceNumberOfEntries"),
                &stations.len().to_string(),
            )
            .await?;
        for (station_position, station) in stations.iter().enumerate() {
            let device = format!("AccessPoint.{slot}.AssociatedDevice.{}.", station_position + 1);
            store
                .set("WiFi", &format!("{device}MACAddress"), &station.mac)
                .await?;
            store
                .set(
                    "WiFi",
                    &format!("{device}SignalStrength"),
                    &station.signal_dbm.to_string(),
                )
                .await?;
            store
                .set(
                    "WiFi",
                    &format!("{device}X_ISPAPP_Stats.LastActivity"),
                    &station.inactive_ms.to_string(),
                )
                .await?;
        }
    }

    if interfaces.is_empty() {
        warn!("no wireless interfaces found, wrote empty snapshot");
    }
    store.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;

    const UCI_SHOW_WIRELESS: &str = "\
wireless.radio0=wifi-device
wireless.radio0.type='mac80211'
wireless.radio0.channel='6'
wireless.default_radio0=wifi-iface
wireless.default_radio0.device='radio0'
wireless.default_radio0.network='lan'
wireless.default_radio0.mode='ap'
wireless.default_radio0.ssid='homenet'
wireless.default_radio0.ifname='wlan0'
wireless.@wifi-iface[1]=wifi-iface
wireless.@wifi-iface[1].device='radio1'
wireless.@wifi-iface[1].ssid='guestnet'
wireless.@wifi-iface[1].disabled='1'
";

    #[test]
    fn parses_named_and_anonymous_iface_sections() {
        let interfaces = parse_wireless_config(UCI_SHOW_WIRELESS);
        assert_eq!(interfaces.len(), 2);

        assert_eq!(interfaces[0].ssid, "homenet");
        assert_eq!(interfaces[0].name, "wlan0");
        assert_eq!(interfaces[0].device, "radio0");
        assert!(interfaces[0].enabled);

        assert_eq!(interfaces[1].ssid, "guestnet");
        assert!(!interfaces[1].enabled);
    }

    #[test]
    fn iface_sections_without_ssid_are_skipped() {
        let interfaces =
            parse_wireless_config("wireless.x=wifi-iface\nwireless.x.device='radio0'\n");
        assert!(interfaces.is_empty());
    }

    #[test]
    fn parses_iw_station_dump_output() {
        let output = "\
Station b8:27:eb:89:cc:2d (on wlan0)
	inactive time:	1500 ms
	rx bytes:	123456
	signal:  	-62 [-63, -65] dBm
Station aa:bb:cc:dd:ee:ff (on wlan0)
	signal:  	-70 dBm
";
        let stations = parse_iw_station_dump(output);
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].mac, "b8:27:eb:89:cc:2d");
        assert_eq!(stations[0].signal_dbm, -62);
        assert_eq!(stations[0].inactive_ms, 1500);
        assert_eq!(stations[1].signal_dbm, -70);
    }

    #[tokio::test]
    async fn refresh_writes_counts_even_without_wireless() {
        use crate::exec::ExecConfig;
        use crate::uci::{ConfigStore, UciFile};

        let executor = Executor::new(ExecConfig::default());
        let mut store = UciFile::new("tr069");
        refresh_wifi(&executor, &mut store).await.unwrap();
        assert_eq!(
            store.get("WiFi", "SSIDNumberOfEntries").await.unwrap(),
            Some("0".to_owned())
        );
    }
}
