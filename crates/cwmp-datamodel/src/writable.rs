//! Writable-path classification.
//!
//! A parameter is writable unless it matches the read-only deny list. The
//! wildcard patterns compile once into a `RegexSet`; any match wins, so the
//! order of the list is immaterial.

use std::sync::LazyLock;

use regex::RegexSet;

/// Read-only deny list. `*` is the only wildcard.
const READ_ONLY: &[&str] = &[
    "*ProcessStatus*",
    "*.Stats.*",
    "*.X_*_Stats.*",
    "*SignalStrength*",
    "*Rate*",
    "*MemoryStatus*",
    "*DiagnosticsState*",
    "*InterfaceStack*",
    "*UpTime*",
    "*SoftwareVersion*",
    "*HardwareVersion*",
    "*SerialNumber*",
    "*NumberOfEntries*",
    "*.Diagnostics.*",
    "*.X_*_ConnTrack.*",
    "*.X_*_Filter.*",
    "*.X_*_NAT.*",
    "*.AssociatedDevice*",
    "*AuthenticationState*",
    "*.PhysAddress*",
    "*.MACAddress",
    "*.BSSID",
    "*.NeighboringWiFiDiagnostic.*",
    "*.X_*_ArchName",
    "*.X_*_BrandingPckgBuildTime",
    "*.X_*_AutosupoutTime",
    "*.VendorConfigFile.*",
    // dynamic parameters the ACS must not touch
    "Device.DNS.Client.Server.*",
    "Device.IP.Interface.*.IPv4Address.*.IPAddress",
    "Device.IP.Interface.*.IPv4Address.*.SubnetMask",
    "Device.DHCPv4.Client.*.IPAddress",
    "Device.DHCPv4.Client.*.SubnetMask",
    "Device.DHCPv4.Client.*.IPRouters",
    "Device.DHCPv4.Client.*.DNSServers",
    "Device.DHCPv4.Client.*.DHCPServer",
    "Device.DHCPv4.Server.Pool.*.StaticAddress.*",
    "Device.DHCPv4.Server.Pool.*.Client.*",
    "Device.WAN.*.ExternalIPAddress",
    "Device.WAN.*.ConnectionStatus",
    "Device.WAN.*.LastConnectionError",
    // Ethernet mirrors the switch chip; everything under it is read-only
    "Device.Ethernet.Interface.*",
    "Device.Ethernet.Link.*",
];

static CLASSIFIER: LazyLock<RegexSet> = LazyLock::new(|| {
    let patterns: Vec<String> = READ_ONLY.iter().map(|p| wildcard_to_regex(p)).collect();
    RegexSet::new(&patterns)
        .unwrap_or_else(|e| unreachable!("read-only deny list failed to compile: {e}"))
});

fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '.' => regex.push_str(r"\."),
            other => regex.push(other),
        }
    }
    regex.push('$');
    regex
}

/// True iff the ACS may mutate the path via SetParameterValues.
pub fn is_writable(path: &str) -> bool {
    !CLASSIFIER.is_match(path)
}
