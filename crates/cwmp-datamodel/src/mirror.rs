//! Path-addressed operations on the mirror.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::device::Device;
use crate::node::{IndexOptions, Parameter, PathError, Tr181Field, Walk};
use crate::writable;

/// Result of applying a SetParameterValues patch: which paths took and which
/// were rejected, with the per-path error for the fault reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub applied: Vec<String>,
    pub rejected: Vec<(String, PathError)>,
}

impl ApplyOutcome {
    pub fn first_fault(&self) -> Option<PathError> {
        self.rejected.first().map(|(_, error)| *error)
    }
}

/// Splits a dotted parameter path into segments below the root. Accepts the
/// `InternetGatewayDevice.` alias and tolerates a trailing dot (AddObject
/// and DeleteObject paths end with one).
fn segments(path: &str) -> Result<Vec<&str>, PathError> {
    let trimmed = path.trim().trim_end_matches('.');
    let mut parts = trimmed.split('.');
    match parts.next() {
        Some("Device" | "InternetGatewayDevice") => {}
        _ => return Err(PathError::UnknownPath),
    }
    Ok(parts.collect())
}

impl Device {
    /// Walks the mirror depth-first and streams `(path, value, type)`
    /// triples into `sink`. Deterministic: two walks of an unchanged mirror
    /// produce identical sequences.
    pub fn index_into(&self, options: IndexOptions, sink: &mut dyn FnMut(Parameter)) {
        let mut walk = Walk::new(options, sink);
        self.visit("Device", &mut walk);
    }

    /// Convenience: the full parameter set as a vector.
    pub fn index(&self, options: IndexOptions) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        self.index_into(options, &mut |parameter| parameters.push(parameter));
        parameters
    }

    /// Path→value lookup table over the whole tree, defaults included. The
    /// differ works against this.
    pub fn parameter_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        self.index_into(
            IndexOptions {
                include_defaults: true,
            },
            &mut |parameter| {
                map.insert(parameter.path, parameter.value);
            },
        );
        map
    }

    /// Sets a single parameter, enforcing the writable classifier.
    pub fn set_parameter(&mut self, path: &str, value: &str) -> Result<(), PathError> {
        if !writable::is_writable(path) {
            return Err(PathError::ReadOnlyPath);
        }
        self.apply(&segments(path)?, value)
    }

    /// Applies a SetParameterValues patch. Rejected paths do not abort the
    /// rest of the patch; the caller decides whether to fault the session.
    pub fn apply_parameters<'a, I>(&mut self, parameters: I) -> ApplyOutcome
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut outcome = ApplyOutcome::default();
        for (path, value) in parameters {
            match self.set_parameter(path, value) {
                Ok(()) => {
                    debug!(path, "applied parameter");
                    outcome.applied.push(path.to_owned());
                }
                Err(error) => {
                    warn!(path, %error, "rejected parameter");
                    outcome.rejected.push((path.to_owned(), error));
                }
            }
        }
        outcome
    }

    /// AddObject: allocates the next sparse index in the named collection.
    pub fn add_object(&mut self, object_path: &str) -> Result<u32, PathError> {
        let segments = segments(object_path)?;
        if segments.is_empty() {
            return Err(PathError::NotACollection);
        }
        self.add_instance(&segments)
    }

    /// DeleteObject: removes the element the path names.
    pub fn delete_object(&mut self, object_path: &str) -> Result<(), PathError> {
        let segments = segments(object_path)?;
        if segments.is_empty() {
            return Err(PathError::NotAnElement);
        }
        self.delete_instance(&segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostEntry;

    fn mirror_with_hosts() -> Device {
        let mut device = Device::default();
        device.hosts.hosts = vec![
            HostEntry {
                index: 153,
                ip_address: "192.168.1.100".to_owned(),
                host_name: "raspberry-pi".to_owned(),
                ..HostEntry::default()
            },
            HostEntry {
                index: 167,
                ip_address: "192.168.1.101".to_owned(),
                ..HostEntry::default()
            },
        ];
        device
    }

    #[test]
    fn set_parameter_routes_to_sparse_element() {
        let mut device = mirror_with_hosts();
        device
            .set_parameter("Device.Hosts.Host.167.HostName", "printer")
            .unwrap();
        assert_eq!(device.hosts.hosts[1].host_name, "printer");
    }

    #[test]
    fn set_parameter_rejects_unknown_and_readonly_and_mistyped() {
        let mut device = mirror_with_hosts();
        assert_eq!(
            device.set_parameter("Device.Hosts.Host.2.HostName", "x"),
            Err(PathError::UnknownPath)
        );
        assert_eq!(
            device.set_parameter("Device.Nope.Thing", "x"),
            Err(PathError::UnknownPath)
        );
        assert_eq!(
            device.set_parameter("Device.DeviceInfo.UpTime", "1"),
            Err(PathError::ReadOnlyPath)
        );
        assert_eq!(
            device.set_parameter("Device.ManagementServer.PeriodicInformInterval", "soon"),
            Err(PathError::TypeMismatch)
        );
    }

    #[test]
    fn add_object_allocates_past_the_highest_index() {
        let mut device = mirror_with_hosts();
        let index = device.add_object("Device.Hosts.Host.").unwrap();
        assert_eq!(index, 168);
        assert_eq!(device.hosts.hosts.len(), 3);

        // nested collection
        let router = device.add_object("Device.Routing.Router.").unwrap();
        assert_eq!(router, 1);
        let forwarding = device
            .add_object("Device.Routing.Router.1.IPv4Forwarding.")
            .unwrap();
        assert_eq!(forwarding, 1);
    }

    #[test]
    fn add_object_rejects_non_collections() {
        let mut device = Device::default();
        assert_eq!(
            device.add_object("Device.DeviceInfo.Manufacturer."),
            Err(PathError::NotACollection)
        );
        assert_eq!(device.add_object("Device."), Err(PathError::NotACollection));
    }

    #[test]
    fn delete_object_removes_by_index() {
        let mut device = mirror_with_hosts();
        device.delete_object("Device.Hosts.Host.153.").unwrap();
        assert_eq!(device.hosts.hosts.len(), 1);
        assert_eq!(device.hosts.hosts[0].index, 167);

        assert_eq!(
            device.delete_object("Device.Hosts.Host.153."),
            Err(PathError::UnknownPath)
        );
        assert_eq!(
            device.delete_object("Device.Hosts.Host."),
            Err(PathError::NotAnElement)
        );
    }

    #[test]
    fn igd_alias_addresses_the_same_tree() {
        let mut device = mirror_with_hosts();
        device
            .set_parameter("InternetGatewayDevice.Hosts.Host.153.HostName", "pi")
            .unwrap();
        assert_eq!(device.hosts.hosts[0].host_name, "pi");
    }
}
