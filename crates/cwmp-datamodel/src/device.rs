//! The TR-181 `Device.` mirror.
//!
//! Shapes follow the TR-181 data model plus the `X_ISPAPP_` vendor
//! extensions. Collection elements carry an externally assigned 1-based
//! `index` that is their identity; list positions mean nothing. List-valued
//! leaves (`LowerLayers`, `DNSServers`, band lists) are comma-separated
//! strings, which is TR-181's own list encoding.

use cwmp_macros::{Tr181Instance, Tr181Node};

/// Root of the mirror. Created empty at startup, populated by the collector
/// and mutated only by the RPC dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct Device {
    pub root_data_model_version: f64,
    pub device_summary: String,
    pub device_info: DeviceInfo,
    pub management_server: ManagementServer,
    pub interface_stack: Vec<InterfaceStackEntry>,
    pub cellular: CellularDevice,
    pub ethernet: EthernetDevice,
    #[tr181(name = "WiFi")]
    pub wifi: WiFiDevice,
    #[tr181(name = "PPP")]
    pub ppp: PPPDevice,
    #[tr181(name = "IP")]
    pub ip: IPDevice,
    pub routing: RoutingDevice,
    pub hosts: HostsDevice,
    #[tr181(name = "DNS")]
    pub dns: DNSDevice,
    #[tr181(name = "DHCPv4")]
    pub dhcpv4: DHCPv4Device,
    pub firewall: FirewallDevice,
    #[tr181(name = "WAN")]
    pub wan: WANDevice,
    #[tr181(name = "X_ISPAPP_Interface")]
    pub x_ispapp_interface: XIspappInterfaceDevice,
    #[tr181(name = "X_ISPAPP_Monitor")]
    pub x_ispapp_monitor: XIspappMonitorDevice,
}

/// Some ACS products address the tree by its IGD-era name.
pub type InternetGatewayDevice = Device;

/// General identification and status of the CPE.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct DeviceInfo {
    #[tr181(name = "OutsideIPAddress")]
    pub outside_ip_address: String,
    pub manufacturer: String,
    #[tr181(name = "ManufacturerOUI")]
    pub manufacturer_oui: String,
    #[tr181(name = "ManufacturerURL")]
    pub manufacturer_url: String,
    pub model_name: String,
    pub description: String,
    pub product_class: String,
    pub serial_number: String,
    pub spec_version: String,
    pub hardware_version: String,
    pub software_version: String,
    pub provisioning_code: String,
    #[tr181(name = "UpTime")]
    pub up_time: u32,
    #[tr181(name = "X_ISPAPP_SystemIdentity")]
    pub x_ispapp_system_identity: String,
    #[tr181(name = "X_ISPAPP_ArchName")]
    pub x_ispapp_arch_name: String,
    #[tr181(name = "X_ISPAPP_BrandingPckgBuildTime")]
    pub x_ispapp_branding_pckg_build_time: String,
    #[tr181(name = "X_ISPAPP_AutosupoutTime")]
    pub x_ispapp_autosupout_time: String,
    #[tr181(name = "VendorConfigFiles")]
    pub vendor_config_files: Vec<VendorConfigFile>,
    pub memory_status: MemoryStatus,
    pub process_status: ProcessStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub geolocation_source: String,
    pub geolocation_last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct VendorConfigFile {
    pub index: u32,
    pub name: String,
    pub description: String,
    pub use_for_backup_restore: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct MemoryStatus {
    pub total: u32,
    pub free: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct ProcessStatus {
    #[tr181(name = "CPUUsage")]
    pub cpu_usage: u32,
}

/// Parameters of the CPE↔ACS management relationship.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct ManagementServer {
    #[tr181(name = "URL")]
    pub url: String,
    pub username: String,
    pub password: String,
    pub periodic_inform_enable: bool,
    pub periodic_inform_interval: u32,
    pub parameter_key: String,
    #[tr181(name = "ConnectionRequestURL")]
    pub connection_request_url: String,
    pub connection_request_username: String,
    pub connection_request_password: String,
    pub alias_based_addressing: bool,
    #[tr181(name = "InformParameters")]
    pub inform_parameters: Vec<InformParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct InformParameter {
    pub index: u32,
    pub enable: bool,
    pub parameter_name: String,
    pub event_list: String,
}

/// One link in the interface layering table.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct InterfaceStackEntry {
    pub index: u32,
    pub higher_layer: String,
    pub lower_layer: String,
}

// --- Cellular ---------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct CellularDevice {
    #[tr181(name = "X_ISPAPP_Antenna")]
    pub x_ispapp_antenna: String,
    #[tr181(name = "X_ISPAPP_CurrentAntenna")]
    pub x_ispapp_current_antenna: String,
    pub interfaces: Vec<CellularInterface>,
    #[tr181(name = "AccessPoints")]
    pub access_points: Vec<CellularAccessPoint>,
    #[tr181(name = "X_ISPAPP_CellDiagnostics")]
    pub x_ispapp_cell_diagnostics: CellDiagnostics,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct CellDiagnostics {
    pub diagnostics_state: String,
    pub interface: String,
    pub seconds: u32,
    #[tr181(name = "Results")]
    pub results: Vec<CellDiagResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct CellDiagResult {
    pub index: u32,
    pub band: u32,
    pub fcn: u32,
    #[tr181(name = "PhysicalCellId")]
    pub physical_cell_id: u32,
    #[tr181(name = "RSSI")]
    pub rssi: i32,
    #[tr181(name = "RSRP")]
    pub rsrp: i32,
    #[tr181(name = "RSRQ")]
    pub rsrq: i32,
}

/// A cellular modem interface. The `X_ISPAPP_` block mirrors what RouterOS
/// exposes about the LTE/5G link.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct CellularInterface {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
    #[tr181(name = "IMEI")]
    pub imei: String,
    #[tr181(name = "RSSI")]
    pub rssi: i32,
    #[tr181(name = "X_ISPAPP_Model")]
    pub x_ispapp_model: String,
    #[tr181(name = "X_ISPAPP_Revision")]
    pub x_ispapp_revision: String,
    #[tr181(name = "X_ISPAPP_ExtRevision")]
    pub x_ispapp_ext_revision: String,
    #[tr181(name = "X_ISPAPP_SupportedAccessTechnologies")]
    pub x_ispapp_supported_access_technologies: String,
    #[tr181(name = "X_ISPAPP_AccessTechnologies")]
    pub x_ispapp_access_technologies: String,
    #[tr181(name = "X_ISPAPP_CurrentAccessTechnology")]
    pub x_ispapp_current_access_technology: String,
    #[tr181(name = "X_ISPAPP_SupportedLteBands")]
    pub x_ispapp_supported_lte_bands: String,
    #[tr181(name = "X_ISPAPP_LteBands")]
    pub x_ispapp_lte_bands: String,
    #[tr181(name = "X_ISPAPP_LteCellLock")]
    pub x_ispapp_lte_cell_lock: String,
    #[tr181(name = "X_ISPAPP_Supported5GBands")]
    pub x_ispapp_supported_5g_bands: String,
    #[tr181(name = "X_ISPAPP_5GBands")]
    pub x_ispapp_5g_bands: String,
    #[tr181(name = "X_ISPAPP_RSCP")]
    pub x_ispapp_rscp: i32,
    #[tr181(name = "X_ISPAPP_ECNO")]
    pub x_ispapp_ecno: i32,
    #[tr181(name = "X_ISPAPP_SINR")]
    pub x_ispapp_sinr: i32,
    #[tr181(name = "X_ISPAPP_RSRP")]
    pub x_ispapp_rsrp: i32,
    #[tr181(name = "X_ISPAPP_MimoRSRP")]
    pub x_ispapp_mimo_rsrp: String,
    #[tr181(name = "X_ISPAPP_RSRQ")]
    pub x_ispapp_rsrq: i32,
    #[tr181(name = "X_ISPAPP_CQI")]
    pub x_ispapp_cqi: u32,
    #[tr181(name = "X_ISPAPP_RI")]
    pub x_ispapp_ri: u32,
    #[tr181(name = "X_ISPAPP_MCS")]
    pub x_ispapp_mcs: u32,
    #[tr181(name = "X_ISPAPP_TBS")]
    pub x_ispapp_tbs: u32,
    #[tr181(name = "X_ISPAPP_RBs")]
    pub x_ispapp_rbs: u32,
    #[tr181(name = "X_ISPAPP_Modulation")]
    pub x_ispapp_modulation: String,
    #[tr181(name = "X_ISPAPP_5G_CQI")]
    pub x_ispapp_5g_cqi: u32,
    #[tr181(name = "X_ISPAPP_5G_RI")]
    pub x_ispapp_5g_ri: u32,
    #[tr181(name = "X_ISPAPP_5G_MCS")]
    pub x_ispapp_5g_mcs: u32,
    #[tr181(name = "X_ISPAPP_5G_TBS")]
    pub x_ispapp_5g_tbs: u32,
    #[tr181(name = "X_ISPAPP_5G_RBs")]
    pub x_ispapp_5g_rbs: u32,
    #[tr181(name = "X_ISPAPP_5G_Modulation")]
    pub x_ispapp_5g_modulation: String,
    #[tr181(name = "X_ISPAPP_5G_DataPath")]
    pub x_ispapp_5g_data_path: String,
    #[tr181(name = "X_ISPAPP_TxPUCCH")]
    pub x_ispapp_tx_pucch: i32,
    #[tr181(name = "X_ISPAPP_TxPUSCH")]
    pub x_ispapp_tx_pusch: i32,
    #[tr181(name = "X_ISPAPP_TxSRS")]
    pub x_ispapp_tx_srs: i32,
    #[tr181(name = "X_ISPAPP_TxPRACH")]
    pub x_ispapp_tx_prach: i32,
    #[tr181(name = "X_ISPAPP_5G_TxPUCCH")]
    pub x_ispapp_5g_tx_pucch: i32,
    #[tr181(name = "X_ISPAPP_5G_TxPUSCH")]
    pub x_ispapp_5g_tx_pusch: i32,
    #[tr181(name = "X_ISPAPP_5G_TxSRS")]
    pub x_ispapp_5g_tx_srs: i32,
    #[tr181(name = "X_ISPAPP_5G_TxPRACH")]
    pub x_ispapp_5g_tx_prach: i32,
    #[tr181(name = "X_ISPAPP_5G_Band")]
    pub x_ispapp_5g_band: u32,
    #[tr181(name = "X_ISPAPP_5G_Bandwidth")]
    pub x_ispapp_5g_bandwidth: u32,
    #[tr181(name = "X_ISPAPP_5G_PhysicalCellId")]
    pub x_ispapp_5g_physical_cell_id: u32,
    #[tr181(name = "X_ISPAPP_5G_SINR")]
    pub x_ispapp_5g_sinr: i32,
    #[tr181(name = "X_ISPAPP_5G_RSRP")]
    pub x_ispapp_5g_rsrp: i32,
    #[tr181(name = "X_ISPAPP_5G_RSRQ")]
    pub x_ispapp_5g_rsrq: i32,
    #[tr181(name = "X_ISPAPP_CellId")]
    pub x_ispapp_cell_id: u32,
    #[tr181(name = "X_ISPAPP_BandInfo")]
    pub x_ispapp_band_info: String,
    #[tr181(name = "X_ISPAPP_LinkDowns")]
    pub x_ispapp_link_downs: u32,
    #[tr181(name = "X_ISPAPP_AccessPoints")]
    pub x_ispapp_access_point_profiles: String,
    #[tr181(name = "USIM")]
    pub usim: SIMCard,
    pub stats: InterfaceStats,
    #[tr181(name = "X_ISPAPP_CarrierInfo")]
    pub x_ispapp_carrier_info: Vec<CarrierInfo>,
    #[tr181(name = "X_ISPAPP_CarrierInfo5G")]
    pub x_ispapp_carrier_info_5g: Vec<CarrierInfo5G>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct CarrierInfo {
    pub index: u32,
    pub band: u32,
    pub fcn: u32,
    pub bandwidth: u32,
    #[tr181(name = "PhysicalCellId")]
    pub physical_cell_id: u32,
    #[tr181(name = "RSSI")]
    pub rssi: i32,
    #[tr181(name = "SINR")]
    pub sinr: i32,
    #[tr181(name = "RSRP")]
    pub rsrp: i32,
    #[tr181(name = "RSRQ")]
    pub rsrq: i32,
    #[tr181(name = "UplinkCA")]
    pub uplink_ca: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct CarrierInfo5G {
    pub index: u32,
    pub band: u32,
    pub bandwidth: u32,
    #[tr181(name = "PhysicalCellId")]
    pub physical_cell_id: u32,
    #[tr181(name = "SINR")]
    pub sinr: i32,
    #[tr181(name = "RSRP")]
    pub rsrp: i32,
    #[tr181(name = "RSRQ")]
    pub rsrq: i32,
    #[tr181(name = "SNR")]
    pub snr: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct SIMCard {
    #[tr181(name = "IMSI")]
    pub imsi: String,
    #[tr181(name = "ICCID")]
    pub iccid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct CellularAccessPoint {
    pub index: u32,
    #[tr181(name = "APN")]
    pub apn: String,
    pub username: String,
    pub password: String,
}

// --- Ethernet ---------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct EthernetDevice {
    pub interfaces: Vec<EthernetInterface>,
    pub links: Vec<EthernetLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct EthernetLink {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
}

/// A physical Ethernet port.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct EthernetInterface {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
    #[tr181(name = "MACAddress")]
    pub mac_address: String,
    pub current_bit_rate: u32,
    #[tr181(name = "X_ISPAPP_LinkDowns")]
    pub x_ispapp_link_downs: u32,
    #[tr181(name = "X_ISPAPP_Name")]
    pub x_ispapp_name: String,
    #[tr181(name = "X_ISPAPP_Comment")]
    pub x_ispapp_comment: String,
    pub stats: InterfaceStats,
}

// --- WiFi -------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct WiFiDevice {
    pub radios: Vec<WiFiRadio>,
    #[tr181(name = "SSIDs")]
    pub ssids: Vec<WiFiSSID>,
    #[tr181(name = "AccessPoints")]
    pub access_points: Vec<WiFiAccessPoint>,
    #[tr181(name = "NeighboringWiFiDiagnostic")]
    pub neighboring_wifi_diagnostic: NeighboringWiFiDiagnostic,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct NeighboringWiFiDiagnostic {
    pub diagnostics_state: String,
    #[tr181(name = "Results")]
    pub results: Vec<NeighboringWiFiResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct NeighboringWiFiResult {
    pub index: u32,
    pub radio: String,
    #[tr181(name = "SSID")]
    pub ssid: String,
    #[tr181(name = "BSSID")]
    pub bssid: String,
    pub channel: u32,
    pub signal_strength: i32,
    pub operating_frequency_band: String,
    pub operating_standards: String,
    pub operating_channel_bandwidth: String,
    pub noise: i32,
}

/// A physical radio (2.4 GHz or 5 GHz).
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct WiFiRadio {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
    pub supported_frequency_bands: String,
    pub operating_frequency_band: String,
    pub supported_standards: String,
    pub operating_standards: String,
    pub possible_channels: String,
    pub channel: u32,
    pub auto_channel_supported: bool,
    pub auto_channel_enable: bool,
    #[tr181(name = "X_ISPAPP_SkipDFSChannels")]
    pub x_ispapp_skip_dfs_channels: String,
    pub stats: WiFiRadioStats,
    #[tr181(name = "X_ISPAPP_Stats")]
    pub x_ispapp_stats: XIspappWiFiRadioStats,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct WiFiRadioStats {
    pub noise: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappWiFiRadioStats {
    #[tr181(name = "OverallTxCCQ")]
    pub overall_tx_ccq: u32,
}

/// A logical WiFi network running on a radio.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct WiFiSSID {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
    #[tr181(name = "BSSID")]
    pub bssid: String,
    #[tr181(name = "MACAddress")]
    pub mac_address: String,
    #[tr181(name = "SSID")]
    pub ssid: String,
    pub stats: WiFiSSIDStats,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct WiFiSSIDStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors_sent: u32,
    pub errors_received: u32,
    pub discard_packets_sent: u32,
    pub discard_packets_received: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct WiFiAccessPoint {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    #[tr181(name = "SSIDReference")]
    pub ssid_reference: String,
    #[tr181(name = "SSIDAdvertisementEnabled")]
    pub ssid_advertisement_enabled: bool,
    pub security: WiFiSecurity,
    pub associated_devices: Vec<WiFiAssociatedDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct WiFiSecurity {
    pub modes_supported: String,
    pub mode_enabled: String,
    pub key_passphrase: String,
}

/// A client station associated to an access point.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct WiFiAssociatedDevice {
    pub index: u32,
    #[tr181(name = "MACAddress")]
    pub mac_address: String,
    pub authentication_state: bool,
    pub signal_strength: i32,
    pub stats: WiFiAssociatedDeviceStats,
    #[tr181(name = "X_ISPAPP_Stats")]
    pub x_ispapp_stats: XIspappAssociatedDeviceStats,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct WiFiAssociatedDeviceStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappAssociatedDeviceStats {
    pub tx_frames: u64,
    pub rx_frames: u64,
    pub tx_frame_bytes: u64,
    pub rx_frame_bytes: u64,
    pub tx_hw_frames: u64,
    pub rx_hw_frames: u64,
    pub tx_hw_frame_bytes: u64,
    pub rx_hw_frame_bytes: u64,
    #[tr181(name = "TxCCQ")]
    pub tx_ccq: u64,
    #[tr181(name = "RxCCQ")]
    pub rx_ccq: u64,
    pub signal_to_noise: i32,
    pub rx_rate: String,
    pub tx_rate: String,
    pub last_activity: u64,
    #[tr181(name = "SignalStrengthCh0")]
    pub signal_strength_ch0: i32,
    #[tr181(name = "SignalStrengthCh1")]
    pub signal_strength_ch1: i32,
    pub strength_at_rates: String,
    #[tr181(name = "UpTime")]
    pub up_time: u64,
}

/// Common interface counters.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct InterfaceStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors_sent: u32,
    pub errors_received: u32,
    pub discard_packets_sent: u32,
    pub discard_packets_received: u32,
}

// --- PPP --------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct PPPDevice {
    pub interfaces: Vec<PPPInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct PPPInterface {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
    pub connection_status: String,
    pub auto_disconnect_time: u32,
    pub idle_disconnect_time: u32,
    pub username: String,
    pub password: String,
    pub encryption_protocol: String,
    pub connection_trigger: String,
    #[tr181(name = "X_ISPAPP_Type")]
    pub x_ispapp_type: String,
    #[tr181(name = "PPPoE")]
    pub pppoe: PPPoESettings,
    #[tr181(name = "IPCP")]
    pub ipcp: IPCPSettings,
    pub stats: InterfaceStats,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct PPPoESettings {
    #[tr181(name = "ACName")]
    pub ac_name: String,
    pub service_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct IPCPSettings {
    #[tr181(name = "LocalIPAddress")]
    pub local_ip_address: String,
    #[tr181(name = "RemoteIPAddress")]
    pub remote_ip_address: String,
}

// --- IP ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct IPDevice {
    pub interfaces: Vec<IPInterface>,
    pub diagnostics: IPDiagnostics,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct IPInterface {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub lower_layers: String,
    #[tr181(name = "Type")]
    pub interface_type: String,
    #[tr181(name = "IPv4Addresses")]
    pub ipv4_addresses: Vec<IPv4AddressEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct IPv4AddressEntry {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    #[tr181(name = "IPAddress")]
    pub ip_address: String,
    pub subnet_mask: String,
    pub addressing_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct IPDiagnostics {
    #[tr181(name = "IPPing")]
    pub ip_ping: IPPingDiagnostics,
    pub trace_route: TraceRouteDiagnostics,
    pub download_diagnostics: DownloadDiagnostics,
    pub upload_diagnostics: UploadDiagnostics,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct IPPingDiagnostics {
    pub diagnostics_state: String,
    pub interface: String,
    pub host: String,
    pub number_of_repetitions: u32,
    pub timeout: u32,
    pub data_block_size: u32,
    #[tr181(name = "DSCP")]
    pub dscp: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub average_response_time: u32,
    pub minimum_response_time: u32,
    pub maximum_response_time: u32,
    pub average_response_time_detailed: u32,
    pub minimum_response_time_detailed: u32,
    pub maximum_response_time_detailed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct TraceRouteDiagnostics {
    pub diagnostics_state: String,
    pub interface: String,
    pub host: String,
    pub number_of_tries: u32,
    pub timeout: u32,
    pub data_block_size: u32,
    #[tr181(name = "DSCP")]
    pub dscp: u32,
    pub max_hop_count: u32,
    pub response_time: u32,
    #[tr181(name = "RouteHops")]
    pub route_hops: Vec<TraceRouteHop>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct TraceRouteHop {
    pub index: u32,
    pub host: String,
    pub host_address: String,
    pub error_code: u32,
    #[tr181(name = "RTTimes")]
    pub rt_times: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct DownloadDiagnostics {
    pub diagnostics_state: String,
    #[tr181(name = "DownloadURL")]
    pub download_url: String,
    pub download_diagnostic_max_connections: u32,
    #[tr181(name = "DSCP")]
    pub dscp: u32,
    pub ethernet_priority: u32,
    pub number_of_connections: u32,
    #[tr181(name = "ROMTime")]
    pub rom_time: String,
    #[tr181(name = "BOMTime")]
    pub bom_time: String,
    #[tr181(name = "EOMTime")]
    pub eom_time: String,
    pub test_bytes_received: u64,
    pub total_bytes_received: u64,
    pub total_bytes_sent: u64,
    pub test_bytes_received_under_full_loading: u64,
    pub total_bytes_received_under_full_loading: u64,
    pub total_bytes_sent_under_full_loading: u64,
    pub period_of_full_loading: u64,
    #[tr181(name = "TCPOpenRequestTime")]
    pub tcp_open_request_time: String,
    #[tr181(name = "TCPOpenResponseTime")]
    pub tcp_open_response_time: String,
    pub enable_per_connection_results: bool,
    #[tr181(name = "PerConnectionResults")]
    pub per_connection_results: Vec<PerConnectionDownloadResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct PerConnectionDownloadResult {
    pub index: u32,
    #[tr181(name = "ROMTime")]
    pub rom_time: String,
    #[tr181(name = "BOMTime")]
    pub bom_time: String,
    #[tr181(name = "EOMTime")]
    pub eom_time: String,
    pub test_bytes_received: u64,
    #[tr181(name = "TCPOpenRequestTime")]
    pub tcp_open_request_time: String,
    #[tr181(name = "TCPOpenResponseTime")]
    pub tcp_open_response_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct UploadDiagnostics {
    pub diagnostics_state: String,
    #[tr181(name = "UploadURL")]
    pub upload_url: String,
    pub upload_diagnostics_max_connections: u32,
    #[tr181(name = "DSCP")]
    pub dscp: u32,
    pub ethernet_priority: u32,
    pub test_file_length: u32,
    pub number_of_connections: u32,
    #[tr181(name = "ROMTime")]
    pub rom_time: String,
    #[tr181(name = "BOMTime")]
    pub bom_time: String,
    #[tr181(name = "EOMTime")]
    pub eom_time: String,
    pub test_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub total_bytes_sent: u64,
    pub test_bytes_sent_under_full_loading: u64,
    pub total_bytes_received_under_full_loading: u64,
    pub total_bytes_sent_under_full_loading: u64,
    pub period_of_full_loading: u64,
    #[tr181(name = "TCPOpenRequestTime")]
    pub tcp_open_request_time: String,
    #[tr181(name = "TCPOpenResponseTime")]
    pub tcp_open_response_time: String,
    pub enable_per_connection_results: bool,
    #[tr181(name = "PerConnectionResults")]
    pub per_connection_results: Vec<PerConnectionUploadResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct PerConnectionUploadResult {
    pub index: u32,
    #[tr181(name = "ROMTime")]
    pub rom_time: String,
    #[tr181(name = "BOMTime")]
    pub bom_time: String,
    #[tr181(name = "EOMTime")]
    pub eom_time: String,
    pub test_bytes_sent: u64,
    #[tr181(name = "TCPOpenRequestTime")]
    pub tcp_open_request_time: String,
    #[tr181(name = "TCPOpenResponseTime")]
    pub tcp_open_response_time: String,
}

// --- Routing, Hosts, DNS, DHCPv4 --------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct RoutingDevice {
    pub routers: Vec<Router>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct Router {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    #[tr181(name = "IPv4Forwardings")]
    pub ipv4_forwardings: Vec<IPv4ForwardingEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct IPv4ForwardingEntry {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub static_route: bool,
    #[tr181(name = "DestIPAddress")]
    pub dest_ip_address: String,
    pub dest_subnet_mask: String,
    #[tr181(name = "GatewayIPAddress")]
    pub gateway_ip_address: String,
    pub interface: String,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct HostsDevice {
    pub hosts: Vec<HostEntry>,
}

/// A host the CPE has learned about (DHCP lease, ARP, WiFi association).
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct HostEntry {
    pub index: u32,
    pub phys_address: String,
    #[tr181(name = "IPAddress")]
    pub ip_address: String,
    #[tr181(name = "DHCPClient")]
    pub dhcp_client: String,
    pub associated_device: String,
    pub layer1_interface: String,
    pub layer3_interface: String,
    pub host_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct DNSDevice {
    pub client: DNSClient,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct DNSClient {
    pub servers: Vec<DNSServerEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct DNSServerEntry {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    #[tr181(name = "DNSServer")]
    pub dns_server: String,
    #[tr181(name = "Type")]
    pub server_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct DHCPv4Device {
    pub clients: Vec<DHCPv4Client>,
    pub server: DHCPv4Server,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct DHCPv4Client {
    pub index: u32,
    pub enable: bool,
    pub interface: String,
    pub status: String,
    #[tr181(name = "DHCPStatus")]
    pub dhcp_status: String,
    #[tr181(name = "IPAddress")]
    pub ip_address: String,
    pub subnet_mask: String,
    #[tr181(name = "IPRouters")]
    pub ip_routers: String,
    #[tr181(name = "DNSServers")]
    pub dns_servers: String,
    #[tr181(name = "DHCPServer")]
    pub dhcp_server: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct DHCPv4Server {
    pub pools: Vec<DHCPv4ServerPool>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct DHCPv4ServerPool {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub interface: String,
    pub min_address: String,
    pub max_address: String,
    pub subnet_mask: String,
    #[tr181(name = "DNSServers")]
    pub dns_servers: String,
    pub domain_name: String,
    #[tr181(name = "IPRouters")]
    pub ip_routers: String,
    pub lease_time: u32,
    #[tr181(name = "StaticAddresses")]
    pub static_addresses: Vec<DHCPv4StaticAddress>,
    pub clients: Vec<DHCPv4ServerClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct DHCPv4StaticAddress {
    pub index: u32,
    pub enable: bool,
    pub chaddr: String,
    pub yiaddr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct DHCPv4ServerClient {
    pub index: u32,
    pub chaddr: String,
    #[tr181(name = "IPv4Addresses")]
    pub ipv4_addresses: Vec<DHCPv4ClientIPv4Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct DHCPv4ClientIPv4Address {
    pub index: u32,
    #[tr181(name = "IPAddress")]
    pub ip_address: String,
    pub lease_time_remaining: String,
}

// --- Firewall and vendor tables ---------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct FirewallDevice {
    #[tr181(name = "X_ISPAPP_ConnTrack")]
    pub x_ispapp_conn_track: XIspappConnTrack,
    #[tr181(name = "X_ISPAPP_Filter")]
    pub x_ispapp_filter: XIspappFilter,
    #[tr181(name = "X_ISPAPP_NAT")]
    pub x_ispapp_nat: XIspappNAT,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappConnTrack {
    pub total_entries: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappFilter {
    pub chains: Vec<XIspappFirewallChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappNAT {
    pub chains: Vec<XIspappFirewallChain>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct XIspappFirewallChain {
    pub index: u32,
    pub enable: bool,
    pub name: String,
    pub rules: Vec<XIspappFirewallRule>,
}

/// One filter or NAT rule. The NAT-only fields stay empty on filter chains.
#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct XIspappFirewallRule {
    pub index: u32,
    pub enable: bool,
    pub order: u32,
    pub description: String,
    pub target: String,
    pub target_chain: String,
    pub log: bool,
    pub source_interface_group: String,
    pub source_interface: String,
    pub source_interface_exclude: bool,
    pub dest_interface_group: String,
    pub dest_interface: String,
    pub dest_interface_exclude: bool,
    #[tr181(name = "DestIPRange")]
    pub dest_ip_range: String,
    #[tr181(name = "DestIPExclude")]
    pub dest_ip_exclude: bool,
    #[tr181(name = "SourceIPRange")]
    pub source_ip_range: String,
    #[tr181(name = "SourceIPExclude")]
    pub source_ip_exclude: bool,
    pub protocol: i32,
    pub protocol_exclude: bool,
    pub dest_port_list: String,
    pub dest_port_exclude: bool,
    pub source_port_list: String,
    pub source_port_exclude: bool,
    pub conn_state: String,
    pub conn_state_exclude: bool,
    pub to_addresses: String,
    pub to_ports: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappInterfaceDevice {
    #[tr181(name = "Generics")]
    pub generics: Vec<XIspappGenericInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct XIspappGenericInterface {
    pub index: u32,
    pub enable: bool,
    pub status: String,
    pub name: String,
    pub lower_layers: String,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct XIspappMonitorDevice {
    #[tr181(name = "Traffics")]
    pub traffic_monitors: Vec<XIspappTrafficMonitor>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct XIspappTrafficMonitor {
    pub index: u32,
    pub enable: bool,
    pub interface: String,
    pub rx_rate: u32,
    pub tx_rate: u32,
    pub max_rx_rate: u32,
    pub max_tx_rate: u32,
}

// --- WAN --------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Tr181Node)]
pub struct WANDevice {
    #[tr181(name = "WANConnectionDevices")]
    pub wan_connection_devices: Vec<WANConnectionDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct WANConnectionDevice {
    pub index: u32,
    #[tr181(name = "WANIPConnections")]
    pub wan_ip_connections: Vec<WANIPConnection>,
}

#[derive(Debug, Clone, Default, PartialEq, Tr181Node, Tr181Instance)]
pub struct WANIPConnection {
    pub index: u32,
    pub enable: bool,
    pub connection_status: String,
    pub connection_type: String,
    pub name: String,
    pub last_connection_error: String,
    pub auto_disconnect_time: u32,
    pub idle_disconnect_time: u32,
    #[tr181(name = "ExternalIPAddress")]
    pub external_ip_address: String,
    pub subnet_mask: String,
    pub default_gateway: String,
    #[tr181(name = "DNSEnabled")]
    pub dns_enabled: bool,
    #[tr181(name = "DNSOverrideAllowed")]
    pub dns_override_allowed: bool,
    #[tr181(name = "DNSServers")]
    pub dns_servers: String,
    #[tr181(name = "MaxMTUSize")]
    pub max_mtu_size: u32,
    #[tr181(name = "MACAddress")]
    pub mac_address: String,
    pub connection_trigger: String,
    pub route_protocol_rx: String,
    pub shaping_rate: u32,
    pub shaping_burst_size: u32,
    pub port_mapping_number_of_entries: u32,
}
