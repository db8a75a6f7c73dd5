//! ACS-initiated RPC dispatch.
//!
//! For each inbound body variant the dispatcher either produces the
//! response envelope body the CPE owes the ACS, or nothing (the session
//! loop then posts an empty body to solicit the next request). Mutations go
//! through the mirror; side effects (downloads, reboots) are recorded and
//! executed after the session closes.

use async_trait::async_trait;
use cwmp_collector::{CollectorRegistry, Executor};
use cwmp_datamodel::node::IndexOptions;
use cwmp_datamodel::{Device, is_writable};
use cwmp_soap::request::{
    AddObjectResponse, DeleteObjectResponse, GetParameterNamesResponse,
    GetParameterValuesResponse, GetRPCMethodsResponse, ParameterInfo, RequestBody,
    SetParameterValuesResponse,
};
use cwmp_soap::response::{ResponseBody, XCommand};
use cwmp_soap::value::{ParameterValue, TypedValue};
use cwmp_soap::{CwmpFault, fault};
use tracing::{info, warn};

/// The RPC method list advertised to the ACS.
pub const METHODS: &[&str] = &[
    "GetRPCMethods",
    "GetParameterValues",
    "SetParameterValues",
    "GetParameterNames",
    "GetParameterAttributes",
    "SetParameterAttributes",
    "AddObject",
    "DeleteObject",
    "Download",
    "Upload",
    "Reboot",
    "FactoryReset",
    "Inform",
    "TransferComplete",
    "AutonomousTransferComplete",
    "RequestDownload",
    "X_Command",
];

/// Side effects scheduled by a session, executed once it has closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Download {
        command_key: String,
        url: String,
        username: Option<String>,
        password: Option<String>,
        target_file_name: String,
    },
    Reboot {
        command_key: String,
    },
    FactoryReset {
        command_key: String,
    },
}

/// Hook for the vendor `X_Command` RPC.
#[async_trait]
pub trait ExtensionHandler: Send + Sync {
    /// Returns the response body to send, or `None` to continue with an
    /// empty post.
    async fn handle(&self, command: &XCommand, executor: &Executor) -> Option<RequestBody>;
}

/// Default extension handler: run the command on the host, log, move on.
pub struct ExecExtension;

#[async_trait]
impl ExtensionHandler for ExecExtension {
    async fn handle(&self, command: &XCommand, executor: &Executor) -> Option<RequestBody> {
        info!(command_key = %command.command_key, "running vendor command");
        match executor.shell(&command.command).await {
            Ok(result) => info!(success = result.success, "vendor command finished"),
            Err(error) => warn!(%error, "vendor command failed"),
        }
        None
    }
}

pub struct Dispatcher<'a> {
    pub device: &'a mut Device,
    pub registry: &'a CollectorRegistry,
    pub executor: &'a Executor,
    pub ssh_host: Option<&'a str>,
    pub extension: &'a dyn ExtensionHandler,
    pub effects: &'a mut Vec<SideEffect>,
}

impl Dispatcher<'_> {
    pub async fn dispatch(&mut self, body: &ResponseBody) -> Option<RequestBody> {
        info!(method = body.method_name(), "dispatching ACS request");
        match body {
            ResponseBody::GetRPCMethods => {
                Some(RequestBody::GetRPCMethodsResponse(GetRPCMethodsResponse {
                    methods: METHODS.iter().map(|&m| m.to_owned()).collect(),
                }))
            }
            ResponseBody::GetParameterValues(request) => {
                Some(self.get_parameter_values(&request.parameter_names).await)
            }
            ResponseBody::SetParameterValues(request) => {
                let outcome = self.device.apply_parameters(
                    request
                        .parameters
                        .iter()
                        .map(|p| (p.name.as_str(), p.value.text.as_str())),
                );
                if let Some(error) = outcome.first_fault() {
                    warn!(
                        rejected = outcome.rejected.len(),
                        applied = outcome.applied.len(),
                        "SetParameterValues faulted"
                    );
                    return Some(RequestBody::Fault(CwmpFault::new(error.fault_code())));
                }
                self.device.management_server.parameter_key = request.parameter_key.clone();
                Some(RequestBody::SetParameterValuesResponse(
                    SetParameterValuesResponse { status: 0 },
                ))
            }
            ResponseBody::GetParameterNames(request) => Some(RequestBody::GetParameterNamesResponse(
                self.get_parameter_names(&request.parameter_path, request.next_level),
            )),
            ResponseBody::AddObject(request) => match self.device.add_object(&request.object_name) {
                Ok(instance_number) => Some(RequestBody::AddObjectResponse(AddObjectResponse {
                    instance_number,
                    status: 0,
                })),
                Err(error) => Some(RequestBody::Fault(CwmpFault::new(error.fault_code()))),
            },
            ResponseBody::DeleteObject(request) => {
                match self.device.delete_object(&request.object_name) {
                    Ok(()) => Some(RequestBody::DeleteObjectResponse(DeleteObjectResponse {
                        status: 0,
                    })),
                    Err(error) => Some(RequestBody::Fault(CwmpFault::new(error.fault_code()))),
                }
            }
            ResponseBody::Download(request) => {
                self.effects.push(SideEffect::Download {
                    command_key: request.command_key.clone(),
                    url: request.url.clone(),
                    username: request.username.clone(),
                    password: request.password.clone(),
                    target_file_name: request.target_file_name.clone(),
                });
                // Status 1: the transfer completes after the session; the
                // TransferComplete carries the real outcome.
                let now = cwmp_soap::CwmpTime::now();
                Some(RequestBody::DownloadResponse(
                    cwmp_soap::request::DownloadResponse {
                        status: 1,
                        start_time: now,
                        complete_time: now,
                    },
                ))
            }
            ResponseBody::Reboot(request) => {
                self.effects.push(SideEffect::Reboot {
                    command_key: request.command_key.clone(),
                });
                Some(RequestBody::RebootResponse)
            }
            ResponseBody::FactoryReset(request) => {
                self.effects.push(SideEffect::FactoryReset {
                    command_key: request.command_key.clone(),
                });
                Some(RequestBody::FactoryResetResponse)
            }
            ResponseBody::GetParameterAttributes
            | ResponseBody::SetParameterAttributes
            | ResponseBody::Upload => Some(RequestBody::Fault(CwmpFault::new(
                fault::METHOD_NOT_SUPPORTED,
            ))),
            ResponseBody::XCommand(command) => {
                self.extension.handle(command, self.executor).await
            }
            ResponseBody::Fault(response) => {
                warn!(
                    code = %response.fault_code,
                    detail = ?response.detail_code,
                    "ACS sent a fault, continuing"
                );
                None
            }
            ResponseBody::InformResponse(_)
            | ResponseBody::TransferCompleteResponse
            | ResponseBody::RequestDownloadResponse => None,
        }
    }

    /// Answers GetParameterValues. Prefix names (trailing dot) expand to the
    /// whole sub-tree with defaults included — the ACS asked for them
    /// explicitly. Registry-backed paths are collected live and override
    /// the mirror's cached values.
    async fn get_parameter_values(&mut self, names: &[String]) -> RequestBody {
        let requested: Vec<&str> = if names.is_empty() {
            vec!["Device."]
        } else {
            names.iter().map(String::as_str).collect()
        };

        let all = self.device.index(IndexOptions {
            include_defaults: true,
        });
        let mut parameters: Vec<ParameterValue> = Vec::new();
        let mut unknown = false;

        for name in &requested {
            let mut matched = false;
            if let Some(prefix) = name.strip_suffix('.') {
                for parameter in all.iter().filter(|p| {
                    p.path == *prefix || p.path.starts_with(&format!("{prefix}."))
                }) {
                    matched = true;
                    parameters.push(ParameterValue::new(
                        parameter.path.clone(),
                        TypedValue::typed(parameter.xsd, parameter.value.clone()),
                    ));
                }
            } else if let Some(parameter) = all.iter().find(|p| p.path == *name) {
                matched = true;
                parameters.push(ParameterValue::new(
                    parameter.path.clone(),
                    TypedValue::typed(parameter.xsd, parameter.value.clone()),
                ));
            }

            // live values for registered collector paths under the request
            for path in self.registry.paths() {
                let in_scope = match name.strip_suffix('.') {
                    Some(prefix) => path.starts_with(&format!("{prefix}.")),
                    None => path == *name,
                };
                if !in_scope {
                    continue;
                }
                if let Some(result) = self
                    .registry
                    .collect(path, self.executor, self.ssh_host)
                    .await
                {
                    matched = true;
                    let value = TypedValue::typed(
                        cwmp_datamodel::xsd_type_for(path),
                        result.text.clone(),
                    );
                    match parameters.iter_mut().find(|p| p.name == path) {
                        Some(existing) => existing.value = value,
                        None => parameters.push(ParameterValue::new(path, value)),
                    }
                }
            }

            if !matched {
                unknown = true;
            }
        }

        if unknown && parameters.is_empty() {
            return RequestBody::Fault(CwmpFault::new(fault::INVALID_PARAMETER_NAME));
        }
        RequestBody::GetParameterValuesResponse(GetParameterValuesResponse { parameters })
    }

    /// Answers GetParameterNames: leaves below the requested path, or only
    /// the next level of the hierarchy (containers keep a trailing dot).
    fn get_parameter_names(&self, parameter_path: &str, next_level: bool) -> GetParameterNamesResponse {
        let prefix = if parameter_path.is_empty() {
            "Device.".to_owned()
        } else {
            parameter_path.to_owned()
        };

        let all = self.device.index(IndexOptions {
            include_defaults: true,
        });
        let mut parameters: Vec<ParameterInfo> = Vec::new();

        for parameter in &all {
            let Some(rest) = parameter.path.strip_prefix(&prefix) else {
                continue;
            };
            if next_level {
                let child = match rest.split_once('.') {
                    // a deeper sub-tree: report the container itself
                    Some((head, _)) => format!("{prefix}{head}."),
                    None => format!("{prefix}{rest}"),
                };
                if !parameters.iter().any(|p| p.name == child) {
                    let writable = !child.ends_with('.') && is_writable(&child);
                    parameters.push(ParameterInfo {
                        name: child,
                        writable,
                    });
                }
            } else if !parameters.iter().any(|p| p.name == parameter.path) {
                parameters.push(ParameterInfo {
                    name: parameter.path.clone(),
                    writable: is_writable(&parameter.path),
                });
            }
        }

        GetParameterNamesResponse { parameters }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwmp_collector::ExecConfig;
    use cwmp_collector::registry::RegistryBuilder;
    use cwmp_soap::response::{DeleteObject, SetParameterValues};

    fn harness() -> (CollectorRegistry, Executor) {
        let registry = RegistryBuilder::default()
            .fixed("Device.DeviceInfo.Manufacturer", "MikroTik")
            .build();
        let executor = Executor::new(ExecConfig::default());
        (registry, executor)
    }

    #[tokio::test]
    async fn set_parameter_values_on_readonly_path_faults_9008() {
        let mut device = Device::default();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let mut dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };

        let body = ResponseBody::SetParameterValues(SetParameterValues {
            parameters: vec![ParameterValue::new(
                "Device.DeviceInfo.UpTime",
                TypedValue::string("1234"),
            )],
            parameter_key: "k".to_owned(),
        });
        let response = dispatcher.dispatch(&body).await.unwrap();
        let RequestBody::Fault(fault) = response else {
            panic!("expected fault, got {response:?}");
        };
        assert_eq!(fault.code, 9008);
        assert_eq!(fault.string, "Attempt to set a non-writable parameter");
    }

    #[tokio::test]
    async fn set_parameter_values_applies_and_stores_parameter_key() {
        let mut device = Device::default();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let mut dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };

        let body = ResponseBody::SetParameterValues(SetParameterValues {
            parameters: vec![ParameterValue::new(
                "Device.ManagementServer.PeriodicInformInterval",
                TypedValue::string("60"),
            )],
            parameter_key: "commit-1".to_owned(),
        });
        let response = dispatcher.dispatch(&body).await.unwrap();
        assert!(matches!(
            response,
            RequestBody::SetParameterValuesResponse(SetParameterValuesResponse { status: 0 })
        ));
        assert_eq!(device.management_server.periodic_inform_interval, 60);
        assert_eq!(device.management_server.parameter_key, "commit-1");
    }

    #[tokio::test]
    async fn add_and_delete_object_round_trip() {
        let mut device = Device::default();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let mut dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };

        let added = dispatcher
            .dispatch(&ResponseBody::AddObject(cwmp_soap::response::AddObject {
                object_name: "Device.Hosts.Host.".to_owned(),
                parameter_key: String::new(),
            }))
            .await
            .unwrap();
        let RequestBody::AddObjectResponse(added) = added else {
            panic!("expected AddObjectResponse");
        };
        assert_eq!(added.instance_number, 1);

        let deleted = dispatcher
            .dispatch(&ResponseBody::DeleteObject(DeleteObject {
                object_name: "Device.Hosts.Host.1.".to_owned(),
                parameter_key: String::new(),
            }))
            .await
            .unwrap();
        assert!(matches!(
            deleted,
            RequestBody::DeleteObjectResponse(DeleteObjectResponse { status: 0 })
        ));

        // deleting it again names a gone element
        let missing = dispatcher
            .dispatch(&ResponseBody::DeleteObject(DeleteObject {
                object_name: "Device.Hosts.Host.1.".to_owned(),
                parameter_key: String::new(),
            }))
            .await
            .unwrap();
        let RequestBody::Fault(fault) = missing else {
            panic!("expected fault");
        };
        assert_eq!(fault.code, 9005);
    }

    #[tokio::test]
    async fn stub_methods_fault_9000() {
        let mut device = Device::default();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let mut dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };
        for body in [
            ResponseBody::Upload,
            ResponseBody::GetParameterAttributes,
            ResponseBody::SetParameterAttributes,
        ] {
            let RequestBody::Fault(fault) = dispatcher.dispatch(&body).await.unwrap() else {
                panic!("expected fault for {}", body.method_name());
            };
            assert_eq!(fault.code, 9000);
        }
    }

    #[tokio::test]
    async fn download_schedules_a_side_effect() {
        let mut device = Device::default();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let mut dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };
        let response = dispatcher
            .dispatch(&ResponseBody::Download(cwmp_soap::response::Download {
                command_key: "fw-1".to_owned(),
                url: "https://acs.example.net/fw.bin".to_owned(),
                target_file_name: "fw.bin".to_owned(),
                ..cwmp_soap::response::Download::default()
            }))
            .await
            .unwrap();
        assert!(matches!(response, RequestBody::DownloadResponse(_)));
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], SideEffect::Download { .. }));
    }

    #[tokio::test]
    async fn get_parameter_values_merges_mirror_and_collectors() {
        let mut device = Device::default();
        device.device_info.model_name = "hAP ac2".to_owned();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let mut dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };
        let response = dispatcher
            .dispatch(&ResponseBody::GetParameterValues(
                cwmp_soap::response::GetParameterValues {
                    parameter_names: vec!["Device.DeviceInfo.".to_owned()],
                },
            ))
            .await
            .unwrap();
        let RequestBody::GetParameterValuesResponse(gpv) = response else {
            panic!("expected GetParameterValuesResponse");
        };
        let model = gpv
            .parameters
            .iter()
            .find(|p| p.name == "Device.DeviceInfo.ModelName")
            .unwrap();
        assert_eq!(model.value.text, "hAP ac2");
        let manufacturer = gpv
            .parameters
            .iter()
            .find(|p| p.name == "Device.DeviceInfo.Manufacturer")
            .unwrap();
        assert_eq!(manufacturer.value.text, "MikroTik");
    }

    #[tokio::test]
    async fn get_parameter_names_next_level_reports_containers() {
        let mut device = Device::default();
        let (registry, executor) = harness();
        let mut effects = Vec::new();
        let dispatcher = Dispatcher {
            device: &mut device,
            registry: &registry,
            executor: &executor,
            ssh_host: None,
            extension: &ExecExtension,
            effects: &mut effects,
        };
        let names = dispatcher.get_parameter_names("Device.", true);
        assert!(names.parameters.iter().any(|p| p.name == "Device.DeviceInfo."));
        assert!(
            names
                .parameters
                .iter()
                .any(|p| p.name == "Device.ManagementServer.")
        );
        let info = names
            .parameters
            .iter()
            .find(|p| p.name == "Device.DeviceInfo.")
            .unwrap();
        assert!(!info.writable);
    }
}
