//! Indexer behaviour over the mirror: determinism, path uniqueness, sparse
//! indices and the singular-form path convention.

use std::collections::HashSet;

use cwmp_datamodel::device::{Device, HostEntry, WiFiSSID};
use cwmp_datamodel::{IndexOptions, Parameter};
use cwmp_soap::XsdType;

fn paths(parameters: &[Parameter]) -> Vec<&str> {
    parameters.iter().map(|p| p.path.as_str()).collect()
}

#[test]
fn near_empty_mirror_emits_one_leaf_and_zero_counts() {
    let mut device = Device::default();
    device.device_info.manufacturer = "MikroTik".to_owned();

    let parameters = device.index(IndexOptions::default());

    let non_count: Vec<&Parameter> = parameters
        .iter()
        .filter(|p| !p.path.ends_with("NumberOfEntries"))
        .collect();
    assert_eq!(non_count.len(), 1, "{:?}", paths(&parameters));
    assert_eq!(non_count[0].path, "Device.DeviceInfo.Manufacturer");
    assert_eq!(non_count[0].value, "MikroTik");
    assert_eq!(non_count[0].xsd, XsdType::String);

    for count_path in [
        "Device.WiFi.SSIDNumberOfEntries",
        "Device.WiFi.RadioNumberOfEntries",
        "Device.WiFi.AccessPointNumberOfEntries",
        "Device.Hosts.HostNumberOfEntries",
        "Device.IP.InterfaceNumberOfEntries",
        "Device.Routing.RouterNumberOfEntries",
        "Device.InterfaceStackNumberOfEntries",
    ] {
        let parameter = parameters
            .iter()
            .find(|p| p.path == count_path)
            .unwrap_or_else(|| panic!("{count_path} missing"));
        assert_eq!(parameter.value, "0", "{count_path}");
        assert_eq!(parameter.xsd, XsdType::UnsignedInt, "{count_path}");
    }
}

#[test]
fn indexer_is_deterministic() {
    let mut device = Device::default();
    device.device_info.manufacturer = "MikroTik".to_owned();
    device.hosts.hosts.push(HostEntry {
        index: 7,
        host_name: "printer".to_owned(),
        ..HostEntry::default()
    });

    let first = device.index(IndexOptions {
        include_defaults: true,
    });
    let second = device.index(IndexOptions {
        include_defaults: true,
    });
    assert_eq!(first, second);
}

#[test]
fn indexer_never_emits_a_path_twice() {
    let mut device = Device::default();
    device.hosts.hosts.push(HostEntry {
        index: 1,
        ..HostEntry::default()
    });
    device.wifi.ssids.push(WiFiSSID {
        index: 2,
        ssid: "backhaul".to_owned(),
        ..WiFiSSID::default()
    });

    let parameters = device.index(IndexOptions {
        include_defaults: true,
    });
    let mut seen = HashSet::new();
    for parameter in &parameters {
        assert!(seen.insert(&parameter.path), "duplicate {}", parameter.path);
    }
}

#[test]
fn sparse_indices_survive_in_paths() {
    let mut device = Device::default();
    device.hosts.hosts = vec![
        HostEntry {
            index: 153,
            ip_address: "192.168.1.100".to_owned(),
            ..HostEntry::default()
        },
        HostEntry {
            index: 167,
            ip_address: "192.168.1.101".to_owned(),
            ..HostEntry::default()
        },
    ];

    let parameters = device.index(IndexOptions::default());
    let host_paths: Vec<&str> = parameters
        .iter()
        .map(|p| p.path.as_str())
        .filter(|p| p.starts_with("Device.Hosts.Host."))
        .collect();

    assert!(host_paths.contains(&"Device.Hosts.Host.153.IPAddress"));
    assert!(host_paths.contains(&"Device.Hosts.Host.167.IPAddress"));
    for path in &host_paths {
        assert!(
            !path.starts_with("Device.Hosts.Host.1.") && !path.starts_with("Device.Hosts.Host.2."),
            "positional index leaked into {path}"
        );
    }

    let count = parameters
        .iter()
        .find(|p| p.path == "Device.Hosts.HostNumberOfEntries")
        .unwrap();
    assert_eq!(count.value, "2");
}

#[test]
fn indexed_segments_use_singular_nouns() {
    let mut device = Device::default();
    device.hosts.hosts.push(HostEntry {
        index: 1,
        ..HostEntry::default()
    });
    device.wifi.ssids.push(WiFiSSID {
        index: 1,
        ..WiFiSSID::default()
    });

    let parameters = device.index(IndexOptions {
        include_defaults: true,
    });
    for parameter in &parameters {
        let segments: Vec<&str> = parameter.path.split('.').collect();
        for window in segments.windows(2) {
            if window[1].chars().all(|c| c.is_ascii_digit()) {
                let noun = window[0];
                assert!(
                    !noun.ends_with('s') || noun.ends_with("ss"),
                    "plural noun {noun:?} precedes index in {}",
                    parameter.path
                );
            }
        }
    }

    // spot checks for the full nested shape
    let all_paths: HashSet<String> = parameters.into_iter().map(|p| p.path).collect();
    assert!(all_paths.contains("Device.WiFi.SSID.1.SSID"));
    assert!(all_paths.contains("Device.Hosts.Host.1.PhysAddress"));
}

#[test]
fn include_defaults_controls_empty_suppression() {
    let device = Device::default();

    let suppressed = device.index(IndexOptions::default());
    assert!(
        suppressed
            .iter()
            .all(|p| p.path.ends_with("NumberOfEntries")),
        "only count leaves expected on an empty mirror"
    );

    let full = device.index(IndexOptions {
        include_defaults: true,
    });
    assert!(full.iter().any(|p| p.path == "Device.DeviceInfo.Manufacturer"));
    assert!(full.len() > suppressed.len());
}
