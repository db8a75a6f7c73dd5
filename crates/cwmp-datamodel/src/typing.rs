//! Path→type rules.
//!
//! The wire type of a parameter is a pure function of its path, resolved
//! against an ordered rule list, most specific first. The unsigned counter
//! rules (`UpTime`, `LeaseTime`, ...) deliberately precede the dateTime
//! rules so that `*Time`-suffixed counters stay numeric.

use std::sync::LazyLock;

use cwmp_soap::XsdType;
use regex::Regex;

static RULES: LazyLock<Vec<(Regex, XsdType)>> = LazyLock::new(|| {
    let table: &[(&str, XsdType)] = &[
        // Booleans
        (r"\.Enable$", XsdType::Boolean),
        (r"Enabled$", XsdType::Boolean),
        (r"\.EnablePerConnectionResults$", XsdType::Boolean),
        (r"\.PeriodicInformEnable$", XsdType::Boolean),
        (r"\.AutoChannel", XsdType::Boolean),
        (r"\.AliasBasedAddressing$", XsdType::Boolean),
        (r"\.AuthenticationState$", XsdType::Boolean),
        (r"\.StaticRoute$", XsdType::Boolean),
        (r"\.UseForBackupRestore$", XsdType::Boolean),
        (r"\.Log$", XsdType::Boolean),
        (r"Exclude$", XsdType::Boolean),
        (r"\.UplinkCA$", XsdType::Boolean),
        // Unsigned counters, indices, sizes
        (r"NumberOfEntries$", XsdType::UnsignedInt),
        (r"\.Index$", XsdType::UnsignedInt),
        (r"\.PeriodicInformInterval$", XsdType::UnsignedInt),
        (r"\.Channel$", XsdType::UnsignedInt),
        (r"\.CurrentBitRate$", XsdType::UnsignedInt),
        (r"\.[A-Za-z0-9_]*Port", XsdType::UnsignedInt),
        (r"\.UpTime$", XsdType::UnsignedInt),
        (r"\.Total$", XsdType::UnsignedInt),
        (r"\.Free$", XsdType::UnsignedInt),
        (r"\.CPUUsage$", XsdType::UnsignedInt),
        (r"\.LeaseTime$", XsdType::UnsignedInt),
        (r"\.TestFileLength$", XsdType::UnsignedInt),
        (r"\.NumberOfRepetitions$", XsdType::UnsignedInt),
        (r"\.Timeout$", XsdType::UnsignedInt),
        (r"\.DataBlockSize$", XsdType::UnsignedInt),
        (r"\.DSCP$", XsdType::UnsignedInt),
        (r"\.EthernetPriority$", XsdType::UnsignedInt),
        (r"\.NumberOfConnections$", XsdType::UnsignedInt),
        (r"\.NumberOfTries$", XsdType::UnsignedInt),
        (r"\.MaxHopCount$", XsdType::UnsignedInt),
        (r"\.Order$", XsdType::UnsignedInt),
        (r"\.Protocol$", XsdType::UnsignedInt),
        (r"\.Stats\.", XsdType::UnsignedInt),
        (r"\.X_[A-Za-z0-9]+_Stats\.", XsdType::UnsignedInt),
        // Cellular radio quality (unsigned)
        (r"\.Band$", XsdType::UnsignedInt),
        (r"\.Fcn$", XsdType::UnsignedInt),
        (r"\.Bandwidth$", XsdType::UnsignedInt),
        (r"\.PhysicalCellId$", XsdType::UnsignedInt),
        (r"\.CQI$", XsdType::UnsignedInt),
        (r"\.RI$", XsdType::UnsignedInt),
        (r"\.MCS$", XsdType::UnsignedInt),
        (r"\.TBS$", XsdType::UnsignedInt),
        (r"\.RBs$", XsdType::UnsignedInt),
        (r"\.CellId$", XsdType::UnsignedInt),
        // Signal measurements (signed)
        (r"SignalStrength", XsdType::Int),
        (r"\.RSSI$", XsdType::Int),
        (r"\.RSCP$", XsdType::Int),
        (r"\.ECNO$", XsdType::Int),
        (r"\.SINR$", XsdType::Int),
        (r"\.RSRP$", XsdType::Int),
        (r"\.RSRQ$", XsdType::Int),
        (r"\.SNR$", XsdType::Int),
        (r"\.SignalToNoise$", XsdType::Int),
        (r"\.Noise$", XsdType::Int),
        (r"\.TxP", XsdType::Int),
        (r"\.TxSRS$", XsdType::Int),
        // Rates and traffic monitoring
        (r"Rate", XsdType::UnsignedInt),
        // Timestamps
        (r"Time$", XsdType::DateTime),
        (r"Time\.", XsdType::DateTime),
    ];
    table
        .iter()
        .map(|(pattern, xsd)| {
            let regex = Regex::new(pattern).unwrap_or_else(|e| {
                unreachable!("type rule {pattern:?} failed to compile: {e}")
            });
            (regex, *xsd)
        })
        .collect()
});

/// First matching rule wins; anything unmatched is a string.
pub fn xsd_type_for(path: &str) -> XsdType {
    RULES
        .iter()
        .find(|(regex, _)| regex.is_match(path))
        .map_or(XsdType::String, |(_, xsd)| *xsd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representative_paths_classify_per_the_table() {
        assert_eq!(
            xsd_type_for("Device.ManagementServer.PeriodicInformEnable"),
            XsdType::Boolean
        );
        assert_eq!(
            xsd_type_for("Device.WiFi.Radio.1.AutoChannelEnable"),
            XsdType::Boolean
        );
        assert_eq!(
            xsd_type_for("Device.Hosts.HostNumberOfEntries"),
            XsdType::UnsignedInt
        );
        assert_eq!(
            xsd_type_for("Device.ManagementServer.PeriodicInformInterval"),
            XsdType::UnsignedInt
        );
        assert_eq!(
            xsd_type_for("Device.WiFi.SSID.2.Stats.BytesSent"),
            XsdType::UnsignedInt
        );
        assert_eq!(
            xsd_type_for("Device.Cellular.Interface.1.X_ISPAPP_RSRP"),
            XsdType::Int
        );
        assert_eq!(
            xsd_type_for(
                "Device.WiFi.AccessPoint.1.AssociatedDevice.3.SignalStrength"
            ),
            XsdType::Int
        );
        assert_eq!(xsd_type_for("Device.DeviceInfo.Manufacturer"), XsdType::String);
    }

    #[test]
    fn uptime_is_unsigned_not_datetime() {
        assert_eq!(xsd_type_for("Device.DeviceInfo.UpTime"), XsdType::UnsignedInt);
        assert_eq!(
            xsd_type_for("Device.DHCPv4.Server.Pool.1.LeaseTime"),
            XsdType::UnsignedInt
        );
        // but genuine timestamps stay dateTime
        assert_eq!(
            xsd_type_for("Device.IP.Diagnostics.DownloadDiagnostics.ROMTime"),
            XsdType::DateTime
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                xsd_type_for("Device.Ethernet.Interface.1.CurrentBitRate"),
                XsdType::UnsignedInt
            );
        }
    }
}
