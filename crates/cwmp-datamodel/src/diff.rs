//! The envelope differ.
//!
//! Compares the ACS's snapshot of the parameter set against the mirror and
//! produces a minimal SetParameterValues patch: only parameters the mirror
//! holds a non-empty value for, that differ semantically from the remote
//! value, and that the ACS is allowed to write. The snapshot is also echoed
//! back with the mirror's values substituted into the changed entries.

use cwmp_soap::request::GetParameterValuesResponse;
use cwmp_soap::response::SetParameterValues;
use cwmp_soap::value::{ParameterValue, TypedValue, canonical_numeric, normalize_boolean};
use tracing::debug;

use crate::device::Device;
use crate::writable;

/// Patch plus the corrected snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    /// Empty (never absent) when no genuine differences exist. The
    /// `parameter_key` encodes the change count.
    pub patch: SetParameterValues,
    pub echoed: GetParameterValuesResponse,
}

/// Semantic equality of two parameter values at the same path.
///
/// Equal when both are empty after trimming, when they match exactly, when
/// both normalise to the same boolean, or when both parse to the same
/// canonical number (`"5"` equals `"5.0"`). Otherwise trimmed string
/// equality decides. Symmetric by construction.
pub fn values_equal(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a == b {
        return true;
    }
    if let (Some(left), Some(right)) = (normalize_boolean(a), normalize_boolean(b)) {
        return left == right;
    }
    if let (Some(left), Some(right)) = (canonical_numeric(a), canonical_numeric(b)) {
        return left == right;
    }
    false
}

impl Device {
    /// Diffs the remote snapshot against the mirror.
    pub fn diff(&self, snapshot: &GetParameterValuesResponse) -> DiffOutcome {
        let mirror_values = self.parameter_map();
        let mut echoed = snapshot.clone();
        let mut changed: Vec<ParameterValue> = Vec::new();

        for entry in &mut echoed.parameters {
            let path = entry.name.trim();
            if path.is_empty() {
                continue;
            }
            // Read-only parameters never enter the patch; pushing them back
            // would only earn a 9008 from ourselves.
            if !writable::is_writable(path) {
                continue;
            }
            let Some(mirror_value) = mirror_values.get(path) else {
                continue;
            };
            if mirror_value.is_empty() {
                continue;
            }
            if values_equal(mirror_value, &entry.value.text) {
                continue;
            }
            debug!(
                path,
                remote = %entry.value.text,
                local = %mirror_value,
                "parameter drifted"
            );
            // Keep the snapshot's declared type; substitute our value.
            entry.value = TypedValue::typed(entry.value.xsd, mirror_value.clone());
            changed.push(ParameterValue::new(path, entry.value.clone()));
        }

        let patch = SetParameterValues {
            parameter_key: format!("EnvelopeCompare_{}_changes", changed.len()),
            parameters: changed,
        };
        DiffOutcome { patch, echoed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwmp_soap::value::XsdType;

    fn snapshot(entries: &[(&str, &str)]) -> GetParameterValuesResponse {
        GetParameterValuesResponse {
            parameters: entries
                .iter()
                .map(|(name, value)| ParameterValue::new(*name, TypedValue::detected(*value)))
                .collect(),
        }
    }

    #[test]
    fn semantic_equality_is_symmetric() {
        let pairs = [
            ("true", "1"),
            ("5", "5.0"),
            ("", "   "),
            ("MikroTik", "MikroTik"),
            ("on", "ENABLED"),
            ("-70", "-70.0"),
            ("a", "b"),
            ("1", "2"),
        ];
        for (a, b) in pairs {
            assert_eq!(values_equal(a, b), values_equal(b, a), "({a:?}, {b:?})");
        }
        assert!(values_equal("true", "1"));
        assert!(values_equal("5", "5.0"));
        assert!(!values_equal("a", "b"));
    }

    #[test]
    fn differ_filters_read_only_and_equal_parameters() {
        let mut device = Device::default();
        device.device_info.manufacturer = "MikroTik".to_owned();
        device.device_info.model_name = "RB952Ui-5ac2nD".to_owned();

        let outcome = device.diff(&snapshot(&[
            ("Device.DeviceInfo.Manufacturer", "MikroTik"),
            ("Device.DeviceInfo.ModelName", "CHANGED"),
            ("Device.WiFi.SSID.1.Stats.BytesSent", "123"),
            ("Device.DeviceInfo.UpTime", "456"),
            ("Device.Hosts.HostNumberOfEntries", "7"),
            (
                "Device.WiFi.AccessPoint.1.AssociatedDevice.1.SignalStrength",
                "-70",
            ),
        ]));

        assert_eq!(outcome.patch.parameters.len(), 1);
        assert_eq!(
            outcome.patch.parameters[0].name,
            "Device.DeviceInfo.ModelName"
        );
        assert_eq!(outcome.patch.parameters[0].value.text, "RB952Ui-5ac2nD");
        assert_eq!(outcome.patch.parameter_key, "EnvelopeCompare_1_changes");

        // the echoed snapshot carries the corrected value
        let echoed_model = outcome
            .echoed
            .parameters
            .iter()
            .find(|p| p.name == "Device.DeviceInfo.ModelName")
            .unwrap();
        assert_eq!(echoed_model.value.text, "RB952Ui-5ac2nD");
    }

    #[test]
    fn boolean_and_numeric_equivalents_produce_an_empty_patch() {
        let mut device = Device::default();
        device.management_server.periodic_inform_enable = true;
        device.management_server.periodic_inform_interval = 5;

        let outcome = device.diff(&snapshot(&[
            ("Device.ManagementServer.PeriodicInformEnable", "1"),
            ("Device.ManagementServer.PeriodicInformInterval", "5.0"),
        ]));

        assert!(outcome.patch.parameters.is_empty());
        assert_eq!(outcome.patch.parameter_key, "EnvelopeCompare_0_changes");
    }

    #[test]
    fn patch_entries_are_writable_and_differ_from_the_snapshot() {
        let mut device = Device::default();
        device.device_info.model_name = "hAP ac2".to_owned();
        device.management_server.url = "https://acs.example.net/tr069".to_owned();
        device.management_server.periodic_inform_interval = 60;

        let remote = snapshot(&[
            ("Device.DeviceInfo.ModelName", "other"),
            ("Device.ManagementServer.URL", "https://old.example.net"),
            ("Device.ManagementServer.PeriodicInformInterval", "60"),
            ("Device.DeviceInfo.SerialNumber", "SPOOFED"),
        ]);
        let outcome = device.diff(&remote);

        for entry in &outcome.patch.parameters {
            assert!(crate::writable::is_writable(&entry.name), "{}", entry.name);
            let remote_value = remote
                .parameters
                .iter()
                .find(|p| p.name == entry.name)
                .unwrap();
            assert!(!values_equal(&entry.value.text, &remote_value.value.text));
        }
        assert_eq!(outcome.patch.parameters.len(), 2);

        // re-applying the patch to the snapshot values yields semantic equality
        let corrected = outcome.echoed;
        for entry in &outcome.patch.parameters {
            let echoed = corrected
                .parameters
                .iter()
                .find(|p| p.name == entry.name)
                .unwrap();
            assert!(values_equal(&echoed.value.text, &entry.value.text));
        }
    }

    #[test]
    fn mirror_holds_no_value_means_no_patch_entry() {
        let device = Device::default();
        let outcome = device.diff(&snapshot(&[(
            "Device.DeviceInfo.ModelName",
            "anything",
        )]));
        assert!(outcome.patch.parameters.is_empty());
    }

    #[test]
    fn snapshot_type_attribute_is_preserved_in_patch() {
        let mut device = Device::default();
        device.management_server.periodic_inform_interval = 90;
        let remote = GetParameterValuesResponse {
            parameters: vec![ParameterValue::new(
                "Device.ManagementServer.PeriodicInformInterval",
                TypedValue::typed(XsdType::UnsignedInt, "60"),
            )],
        };
        let outcome = device.diff(&remote);
        assert_eq!(outcome.patch.parameters.len(), 1);
        assert_eq!(outcome.patch.parameters[0].value.xsd, XsdType::UnsignedInt);
        assert_eq!(outcome.patch.parameters[0].value.text, "90");
    }
}
