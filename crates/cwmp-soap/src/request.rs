//! CPE→ACS envelopes.
//!
//! A request envelope carries the session correlation ID and exactly one
//! body variant: either a CPE-originated call (`Inform`, `TransferComplete`,
//! ...) or the response the CPE returns to an ACS-initiated RPC. Envelopes
//! are immutable once built; [`RequestEnvelope::to_xml`] produces canonical
//! SOAP and [`RequestEnvelope::from_xml`] accepts everything the emitter
//! produces (the codec round-trips).

use crate::time::CwmpTime;
use crate::value::{ParameterValue, TypedValue, XsdType};
use crate::xml::{self, Element};
use crate::{CWMP_NS, SOAP_ENC_NS, SOAP_ENV_NS, SoapError, XSD_NS, XSI_NS, fault::CwmpFault};

#[derive(Debug, Clone, PartialEq, typed_builder::TypedBuilder)]
pub struct RequestEnvelope {
    /// `cwmp:ID` header value; the serial number on the first request of a
    /// session, the ACS's ID afterwards.
    #[builder(setter(into))]
    pub id: String,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Inform(Inform),
    TransferComplete(TransferComplete),
    AutonomousTransferComplete(AutonomousTransferComplete),
    RequestDownload(RequestDownload),
    ScheduleInform(ScheduleInform),
    SetVouchers(SetVouchers),
    GetOptions(GetOptions),
    Fault(CwmpFault),
    GetRPCMethodsResponse(GetRPCMethodsResponse),
    GetParameterValuesResponse(GetParameterValuesResponse),
    SetParameterValuesResponse(SetParameterValuesResponse),
    GetParameterNamesResponse(GetParameterNamesResponse),
    DownloadResponse(DownloadResponse),
    RebootResponse,
    FactoryResetResponse,
    AddObjectResponse(AddObjectResponse),
    DeleteObjectResponse(DeleteObjectResponse),
}

impl RequestBody {
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Inform(_) => "Inform",
            Self::TransferComplete(_) => "TransferComplete",
            Self::AutonomousTransferComplete(_) => "AutonomousTransferComplete",
            Self::RequestDownload(_) => "RequestDownload",
            Self::ScheduleInform(_) => "ScheduleInform",
            Self::SetVouchers(_) => "SetVouchers",
            Self::GetOptions(_) => "GetOptions",
            Self::Fault(_) => "Fault",
            Self::GetRPCMethodsResponse(_) => "GetRPCMethodsResponse",
            Self::GetParameterValuesResponse(_) => "GetParameterValuesResponse",
            Self::SetParameterValuesResponse(_) => "SetParameterValuesResponse",
            Self::GetParameterNamesResponse(_) => "GetParameterNamesResponse",
            Self::DownloadResponse(_) => "DownloadResponse",
            Self::RebootResponse => "RebootResponse",
            Self::FactoryResetResponse => "FactoryResetResponse",
            Self::AddObjectResponse(_) => "AddObjectResponse",
            Self::DeleteObjectResponse(_) => "DeleteObjectResponse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, typed_builder::TypedBuilder)]
pub struct DeviceId {
    #[builder(setter(into))]
    pub manufacturer: String,
    #[builder(setter(into))]
    pub oui: String,
    #[builder(setter(into))]
    pub product_class: String,
    #[builder(setter(into))]
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStruct {
    /// `"0 BOOTSTRAP"`, `"1 BOOT"`, `"2 PERIODIC"`, `"4 VALUE CHANGE"`,
    /// `"6 CONNECTION REQUEST"`, ...
    pub event_code: String,
    pub command_key: String,
}

impl EventStruct {
    pub fn new(event_code: impl Into<String>) -> Self {
        Self {
            event_code: event_code.into(),
            command_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, typed_builder::TypedBuilder)]
pub struct Inform {
    pub device_id: DeviceId,
    pub events: Vec<EventStruct>,
    #[builder(default = 1)]
    pub max_envelopes: u32,
    #[builder(default = CwmpTime::now())]
    pub current_time: CwmpTime,
    #[builder(default = 0)]
    pub retry_count: u32,
    #[builder(default)]
    pub parameter_list: Vec<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferComplete {
    pub command_key: String,
    pub fault_code: u32,
    pub fault_string: String,
    pub start_time: CwmpTime,
    pub complete_time: CwmpTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutonomousTransferComplete {
    pub announce_url: String,
    pub transfer_url: String,
    pub fault_code: u32,
    pub fault_string: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDownload {
    /// `"1 Firmware Upgrade Image"`, `"3 Vendor Configuration File"`, ...
    pub file_type: String,
    pub file_size: u64,
    pub target_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInform {
    pub delay_seconds: u32,
    pub command_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetVouchers {
    pub vouchers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOptions {
    pub option_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRPCMethodsResponse {
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetParameterValuesResponse {
    pub parameters: Vec<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetParameterValuesResponse {
    /// 0 = applied, 1 = applied but requires reboot to take effect.
    pub status: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetParameterNamesResponse {
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadResponse {
    pub status: i32,
    pub start_time: CwmpTime,
    pub complete_time: CwmpTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddObjectResponse {
    pub instance_number: u32,
    pub status: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObjectResponse {
    pub status: i32,
}

// --- emission ---------------------------------------------------------------

impl RequestEnvelope {
    pub fn to_xml(&self) -> String {
        let header = Element::new("soap-env:Header").child(
            Element::text_node("cwmp:ID", &self.id).attr("soap-env:mustUnderstand", "1"),
        );
        let body = Element::new("soap-env:Body").child(self.body.to_element());

        Element::new("soap-env:Envelope")
            .attr("xmlns:soap-env", SOAP_ENV_NS)
            .attr("xmlns:soap-enc", SOAP_ENC_NS)
            .attr("xmlns:xsd", XSD_NS)
            .attr("xmlns:xsi", XSI_NS)
            .attr("xmlns:cwmp", CWMP_NS)
            .child(header)
            .child(body)
            .into_document()
    }
}

fn parameter_list_element(parameters: &[ParameterValue]) -> Element {
    Element::new("ParameterList")
        .attr(
            "soap-enc:arrayType",
            format!("cwmp:ParameterValueStruct[{}]", parameters.len()),
        )
        .children(parameters.iter().map(|param| {
            Element::new("ParameterValueStruct")
                .child(Element::text_node("Name", &param.name))
                .child(
                    Element::text_node("Value", param.value.render())
                        .attr("xsi:type", param.value.xsd.as_str()),
                )
        }))
}

impl RequestBody {
    fn to_element(&self) -> Element {
        let method = Element::new(format!("cwmp:{}", self.method_name()));
        match self {
            Self::Inform(inform) => method
                .child(
                    Element::new("DeviceId")
                        .child(Element::text_node("Manufacturer", &inform.device_id.manufacturer))
                        .child(Element::text_node("OUI", &inform.device_id.oui))
                        .child(Element::text_node("ProductClass", &inform.device_id.product_class))
                        .child(Element::text_node("SerialNumber", &inform.device_id.serial_number)),
                )
                .child(
                    Element::new("Event")
                        .attr(
                            "soap-enc:arrayType",
                            format!("cwmp:EventStruct[{}]", inform.events.len()),
                        )
                        .children(inform.events.iter().map(|event| {
                            Element::new("EventStruct")
                                .child(Element::text_node("EventCode", &event.event_code))
                                .child(Element::text_node("CommandKey", &event.command_key))
                        })),
                )
                .child(Element::text_node("MaxEnvelopes", inform.max_envelopes.to_string()))
                .child(Element::text_node("CurrentTime", inform.current_time.to_rfc3339()))
                .child(Element::text_node("RetryCount", inform.retry_count.to_string()))
                .child(parameter_list_element(&inform.parameter_list)),
            Self::TransferComplete(tc) => method
                .child(Element::text_node("CommandKey", &tc.command_key))
                .child(
                    Element::new("FaultStruct")
                        .child(Element::text_node("FaultCode", tc.fault_code.to_string()))
                        .child(Element::text_node("FaultString", &tc.fault_string)),
                )
                .child(Element::text_node("StartTime", tc.start_time.to_rfc3339()))
                .child(Element::text_node("CompleteTime", tc.complete_time.to_rfc3339())),
            Self::AutonomousTransferComplete(atc) => method
                .child(Element::text_node("AnnounceURL", &atc.announce_url))
                .child(Element::text_node("TransferURL", &atc.transfer_url))
                .child(
                    Element::new("FaultStruct")
                        .child(Element::text_node("FaultCode", atc.fault_code.to_string()))
                        .child(Element::text_node("FaultString", &atc.fault_string)),
                )
                .child(Element::text_node("FileSize", atc.file_size.to_string())),
            Self::RequestDownload(rd) => method
                .child(Element::text_node("FileType", &rd.file_type))
                .child(Element::text_node("FileSize", rd.file_size.to_string()))
                .child(Element::text_node("TargetFileName", &rd.target_file_name)),
            Self::ScheduleInform(si) => method
                .child(Element::text_node("DelaySeconds", si.delay_seconds.to_string()))
                .child(Element::text_node("CommandKey", &si.command_key)),
            Self::SetVouchers(sv) => method.child(
                Element::new("VoucherList").children(
                    sv.vouchers
                        .iter()
                        .map(|voucher| Element::text_node("string", voucher)),
                ),
            ),
            Self::GetOptions(go) => {
                method.child(Element::text_node("OptionName", &go.option_name))
            }
            Self::Fault(fault) => Element::new("soap-env:Fault")
                .child(Element::text_node("faultcode", fault.soap_fault_code()))
                .child(Element::text_node("faultstring", "CWMP fault"))
                .child(
                    Element::new("detail").child(
                        Element::new("cwmp:Fault")
                            .child(Element::text_node("FaultCode", fault.code.to_string()))
                            .child(Element::text_node("FaultString", &fault.string)),
                    ),
                ),
            Self::GetRPCMethodsResponse(gr) => method.child(
                Element::new("MethodList")
                    .attr(
                        "soap-enc:arrayType",
                        format!("xsd:string[{}]", gr.methods.len()),
                    )
                    .children(gr.methods.iter().map(|m| Element::text_node("string", m))),
            ),
            Self::GetParameterValuesResponse(gpv) => {
                method.child(parameter_list_element(&gpv.parameters))
            }
            Self::SetParameterValuesResponse(spv) => {
                method.child(Element::text_node("Status", spv.status.to_string()))
            }
            Self::GetParameterNamesResponse(gpn) => method.child(
                Element::new("ParameterList")
                    .attr(
                        "soap-enc:arrayType",
                        format!("cwmp:ParameterInfoStruct[{}]", gpn.parameters.len()),
                    )
                    .children(gpn.parameters.iter().map(|info| {
                        Element::new("ParameterInfoStruct")
                            .child(Element::text_node("Name", &info.name))
                            .child(Element::text_node(
                                "Writable",
                                if info.writable { "1" } else { "0" },
                            ))
                    })),
            ),
            Self::DownloadResponse(dr) => method
                .child(Element::text_node("Status", dr.status.to_string()))
                .child(Element::text_node("StartTime", dr.start_time.to_rfc3339()))
                .child(Element::text_node("CompleteTime", dr.complete_time.to_rfc3339())),
            Self::RebootResponse | Self::FactoryResetResponse => method,
            Self::AddObjectResponse(ao) => method
                .child(Element::text_node("InstanceNumber", ao.instance_number.to_string()))
                .child(Element::text_node("Status", ao.status.to_string())),
            Self::DeleteObjectResponse(d) => {
                method.child(Element::text_node("Status", d.status.to_string()))
            }
        }
    }
}

// --- parsing ----------------------------------------------------------------

fn malformed(reason: impl Into<String>) -> SoapError {
    SoapError::MalformedEnvelope(reason.into())
}

fn required_text(node: roxmltree::Node<'_, '_>, name: &str) -> Result<String, SoapError> {
    xml::child_text(node, name).ok_or_else(|| malformed(format!("missing <{name}>")))
}

fn parse_number<T: std::str::FromStr>(raw: &str, ctx: &str) -> Result<T, SoapError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| malformed(format!("invalid {ctx}: {raw:?}")))
}

fn required_number<T: std::str::FromStr>(
    node: roxmltree::Node<'_, '_>,
    name: &str,
) -> Result<T, SoapError> {
    parse_number(&required_text(node, name)?, name)
}

fn required_time(node: roxmltree::Node<'_, '_>, name: &str) -> Result<CwmpTime, SoapError> {
    CwmpTime::parse(&required_text(node, name)?)
}

pub(crate) fn parse_parameter_list(
    node: roxmltree::Node<'_, '_>,
    list_name: &str,
) -> Result<Vec<ParameterValue>, SoapError> {
    let Some(list) = xml::first_child(node, list_name) else {
        return Ok(Vec::new());
    };
    xml::element_children(list)
        .map(|entry| {
            let name = required_text(entry, "Name")?;
            let value_node = xml::first_child(entry, "Value")
                .ok_or_else(|| malformed(format!("parameter {name:?} has no <Value>")))?;
            let xsd = xml::attribute(value_node, "type")
                .and_then(XsdType::parse)
                .unwrap_or(XsdType::String);
            let value = TypedValue::typed(xsd, value_node.text().unwrap_or_default().trim());
            value.validate()?;
            Ok(ParameterValue::new(name, value))
        })
        .collect()
}

impl RequestEnvelope {
    pub fn from_xml(raw: &str) -> Result<Self, SoapError> {
        let doc = roxmltree::Document::parse(raw)?;
        let envelope = doc.root_element();
        if envelope.tag_name().name() != "Envelope" {
            return Err(malformed("document root is not an Envelope"));
        }

        let id = xml::first_child(envelope, "Header")
            .and_then(|header| xml::child_text(header, "ID"))
            .unwrap_or_default();

        let body_node = xml::first_child(envelope, "Body")
            .ok_or_else(|| malformed("envelope has no Body"))?;
        let mut methods = xml::element_children(body_node);
        let method = methods.next().ok_or_else(|| malformed("empty Body"))?;
        if methods.next().is_some() {
            return Err(malformed("more than one body element"));
        }

        let body = RequestBody::from_node(method)?;
        Ok(Self { id, body })
    }
}

impl RequestBody {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, SoapError> {
        let body = match node.tag_name().name() {
            "Inform" => {
                let device_node = xml::first_child(node, "DeviceId")
                    .ok_or_else(|| malformed("Inform has no DeviceId"))?;
                let device_id = DeviceId {
                    manufacturer: required_text(device_node, "Manufacturer")?,
                    oui: required_text(device_node, "OUI")?,
                    product_class: required_text(device_node, "ProductClass")?,
                    serial_number: required_text(device_node, "SerialNumber")?,
                };
                let events = match xml::first_child(node, "Event") {
                    Some(event_node) => xml::element_children(event_node)
                        .map(|entry| {
                            Ok(EventStruct {
                                event_code: required_text(entry, "EventCode")?,
                                command_key: xml::child_text(entry, "CommandKey")
                                    .unwrap_or_default(),
                            })
                        })
                        .collect::<Result<_, SoapError>>()?,
                    None => Vec::new(),
                };
                Self::Inform(Inform {
                    device_id,
                    events,
                    max_envelopes: required_number(node, "MaxEnvelopes")?,
                    current_time: required_time(node, "CurrentTime")?,
                    retry_count: required_number(node, "RetryCount")?,
                    parameter_list: parse_parameter_list(node, "ParameterList")?,
                })
            }
            "TransferComplete" => {
                let fault_node = xml::first_child(node, "FaultStruct");
                Self::TransferComplete(TransferComplete {
                    command_key: xml::child_text(node, "CommandKey").unwrap_or_default(),
                    fault_code: fault_node
                        .and_then(|f| xml::child_text(f, "FaultCode"))
                        .map_or(Ok(0), |raw| parse_number(&raw, "FaultCode"))?,
                    fault_string: fault_node
                        .and_then(|f| xml::child_text(f, "FaultString"))
                        .unwrap_or_default(),
                    start_time: required_time(node, "StartTime")?,
                    complete_time: required_time(node, "CompleteTime")?,
                })
            }
            "AutonomousTransferComplete" => {
                let fault_node = xml::first_child(node, "FaultStruct");
                Self::AutonomousTransferComplete(AutonomousTransferComplete {
                    announce_url: xml::child_text(node, "AnnounceURL").unwrap_or_default(),
                    transfer_url: xml::child_text(node, "TransferURL").unwrap_or_default(),
                    fault_code: fault_node
                        .and_then(|f| xml::child_text(f, "FaultCode"))
                        .map_or(Ok(0), |raw| parse_number(&raw, "FaultCode"))?,
                    fault_string: fault_node
                        .and_then(|f| xml::child_text(f, "FaultString"))
                        .unwrap_or_default(),
                    file_size: required_number(node, "FileSize")?,
                })
            }
            "RequestDownload" => Self::RequestDownload(RequestDownload {
                file_type: required_text(node, "FileType")?,
                file_size: required_number(node, "FileSize")?,
                target_file_name: xml::child_text(node, "TargetFileName").unwrap_or_default(),
            }),
            "ScheduleInform" => Self::ScheduleInform(ScheduleInform {
                delay_seconds: required_number(node, "DelaySeconds")?,
                command_key: xml::child_text(node, "CommandKey").unwrap_or_default(),
            }),
            "SetVouchers" => Self::SetVouchers(SetVouchers {
                vouchers: xml::first_child(node, "VoucherList")
                    .map(|list| {
                        xml::element_children(list)
                            .map(|v| v.text().unwrap_or_default().trim().to_owned())
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            "GetOptions" => Self::GetOptions(GetOptions {
                option_name: required_text(node, "OptionName")?,
            }),
            "Fault" => {
                let detail = xml::first_child(node, "detail")
                    .and_then(|d| xml::first_child(d, "Fault"))
                    .ok_or_else(|| malformed("SOAP fault without cwmp:Fault detail"))?;
                Self::Fault(CwmpFault::with_string(
                    required_number(detail, "FaultCode")?,
                    required_text(detail, "FaultString")?,
                ))
            }
            "GetRPCMethodsResponse" => Self::GetRPCMethodsResponse(GetRPCMethodsResponse {
                methods: xml::first_child(node, "MethodList")
                    .map(|list| {
                        xml::element_children(list)
                            .map(|m| m.text().unwrap_or_default().trim().to_owned())
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            "GetParameterValuesResponse" => {
                Self::GetParameterValuesResponse(GetParameterValuesResponse {
                    parameters: parse_parameter_list(node, "ParameterList")?,
                })
            }
            "SetParameterValuesResponse" => {
                Self::SetParameterValuesResponse(SetParameterValuesResponse {
                    status: required_number(node, "Status")?,
                })
            }
            "GetParameterNamesResponse" => {
                let parameters = xml::first_child(node, "ParameterList")
                    .map(|list| {
                        xml::element_children(list)
                            .map(|entry| {
                                Ok(ParameterInfo {
                                    name: required_text(entry, "Name")?,
                                    writable: matches!(
                                        required_text(entry, "Writable")?.as_str(),
                                        "1" | "true"
                                    ),
                                })
                            })
                            .collect::<Result<_, SoapError>>()
                    })
                    .transpose()?
                    .unwrap_or_default();
                Self::GetParameterNamesResponse(GetParameterNamesResponse { parameters })
            }
            "DownloadResponse" => Self::DownloadResponse(DownloadResponse {
                status: required_number(node, "Status")?,
                start_time: required_time(node, "StartTime")?,
                complete_time: required_time(node, "CompleteTime")?,
            }),
            "RebootResponse" => Self::RebootResponse,
            "FactoryResetResponse" => Self::FactoryResetResponse,
            "AddObjectResponse" => Self::AddObjectResponse(AddObjectResponse {
                instance_number: required_number(node, "InstanceNumber")?,
                status: required_number(node, "Status")?,
            }),
            "DeleteObjectResponse" => Self::DeleteObjectResponse(DeleteObjectResponse {
                status: required_number(node, "Status")?,
            }),
            other => return Err(malformed(format!("unknown request body: {other}"))),
        };
        Ok(body)
    }
}
