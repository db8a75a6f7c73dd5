//! ACS→CPE envelopes.
//!
//! A response envelope is parsed from the HTTP body the ACS returns. The
//! body must contain exactly one method element from the known set; zero or
//! several is a [`SoapError::MalformedEnvelope`].

use crate::value::ParameterValue;
use crate::xml;
use crate::{SoapError, request::parse_parameter_list};

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// `cwmp:ID` from the header, when the ACS sent one.
    pub id: Option<String>,
    /// The header's `soap-env:mustUnderstand` flag on the ID.
    pub must_understand: bool,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    GetRPCMethods,
    GetParameterValues(GetParameterValues),
    SetParameterValues(SetParameterValues),
    GetParameterNames(GetParameterNames),
    /// Stub: answered with fault 9000.
    GetParameterAttributes,
    /// Stub: answered with fault 9000.
    SetParameterAttributes,
    Download(Download),
    /// Stub: answered with fault 9000.
    Upload,
    Reboot(Reboot),
    FactoryReset(FactoryReset),
    AddObject(AddObject),
    DeleteObject(DeleteObject),
    InformResponse(InformResponse),
    TransferCompleteResponse,
    RequestDownloadResponse,
    XCommand(XCommand),
    Fault(FaultResponse),
}

impl ResponseBody {
    /// Symbolic dispatch tag for the contained variant.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::GetRPCMethods => "GetRPCMethods",
            Self::GetParameterValues(_) => "GetParameterValues",
            Self::SetParameterValues(_) => "SetParameterValues",
            Self::GetParameterNames(_) => "GetParameterNames",
            Self::GetParameterAttributes => "GetParameterAttributes",
            Self::SetParameterAttributes => "SetParameterAttributes",
            Self::Download(_) => "Download",
            Self::Upload => "Upload",
            Self::Reboot(_) => "Reboot",
            Self::FactoryReset(_) => "FactoryReset",
            Self::AddObject(_) => "AddObject",
            Self::DeleteObject(_) => "DeleteObject",
            Self::InformResponse(_) => "InformResponse",
            Self::TransferCompleteResponse => "TransferCompleteResponse",
            Self::RequestDownloadResponse => "RequestDownloadResponse",
            Self::XCommand(_) => "X_Command",
            Self::Fault(_) => "Fault",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetParameterValues {
    pub parameter_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetParameterValues {
    pub parameters: Vec<ParameterValue>,
    pub parameter_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetParameterNames {
    pub parameter_path: String,
    pub next_level: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Download {
    pub command_key: String,
    pub file_type: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub file_size: Option<u64>,
    pub target_file_name: String,
    pub delay_seconds: u32,
    pub success_url: String,
    pub failure_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reboot {
    pub command_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactoryReset {
    pub command_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddObject {
    /// Partial path of the collection, e.g. `"Device.Hosts.Host."`.
    pub object_name: String,
    pub parameter_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObject {
    /// Partial path of the element, e.g. `"Device.Hosts.Host.153."`.
    pub object_name: String,
    pub parameter_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InformResponse {
    pub max_envelopes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XCommand {
    pub command_key: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultResponse {
    pub fault_code: String,
    pub fault_string: String,
    pub detail_code: Option<u32>,
    pub detail_string: Option<String>,
}

fn malformed(reason: impl Into<String>) -> SoapError {
    SoapError::MalformedEnvelope(reason.into())
}

fn optional_number<T: std::str::FromStr>(
    node: roxmltree::Node<'_, '_>,
    name: &str,
) -> Result<Option<T>, SoapError> {
    match xml::child_text(node, name) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| malformed(format!("invalid {name}: {raw:?}"))),
    }
}

impl ResponseEnvelope {
    pub fn from_xml(raw: &str) -> Result<Self, SoapError> {
        let doc = roxmltree::Document::parse(raw)?;
        let envelope = doc.root_element();
        if envelope.tag_name().name() != "Envelope" {
            return Err(malformed("document root is not an Envelope"));
        }

        let header = xml::first_child(envelope, "Header");
        let id_node = header.and_then(|h| xml::first_child(h, "ID"));
        let id = id_node.map(|node| node.text().unwrap_or_default().trim().to_owned());
        let must_understand = id_node
            .and_then(|node| xml::attribute(node, "mustUnderstand"))
            .is_some_and(|v| v.trim() == "1" || v.trim() == "true");

        let body_node = xml::first_child(envelope, "Body")
            .ok_or_else(|| malformed("envelope has no Body"))?;
        let mut methods = xml::element_children(body_node);
        let method = methods.next().ok_or_else(|| malformed("empty Body"))?;
        if methods.next().is_some() {
            return Err(malformed("more than one body element"));
        }

        let body = ResponseBody::from_node(method)?;
        tracing::debug!(method = body.method_name(), "parsed ACS envelope");
        Ok(Self {
            id,
            must_understand,
            body,
        })
    }
}

impl ResponseBody {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, SoapError> {
        let body = match node.tag_name().name() {
            "GetRPCMethods" => Self::GetRPCMethods,
            "GetParameterValues" => {
                let names = xml::first_child(node, "ParameterNames")
                    .map(|list| {
                        xml::element_children(list)
                            .map(|n| n.text().unwrap_or_default().trim().to_owned())
                            .collect()
                    })
                    .unwrap_or_default();
                Self::GetParameterValues(GetParameterValues {
                    parameter_names: names,
                })
            }
            "SetParameterValues" => Self::SetParameterValues(SetParameterValues {
                parameters: parse_parameter_list(node, "ParameterList")?,
                parameter_key: xml::child_text(node, "ParameterKey").unwrap_or_default(),
            }),
            "GetParameterNames" => Self::GetParameterNames(GetParameterNames {
                parameter_path: xml::child_text(node, "ParameterPath").unwrap_or_default(),
                next_level: xml::child_text(node, "NextLevel")
                    .is_some_and(|v| v == "1" || v == "true"),
            }),
            "GetParameterAttributes" => Self::GetParameterAttributes,
            "SetParameterAttributes" => Self::SetParameterAttributes,
            "Download" => Self::Download(Download {
                command_key: xml::child_text(node, "CommandKey").unwrap_or_default(),
                file_type: xml::child_text(node, "FileType").unwrap_or_default(),
                url: xml::child_text(node, "URL").unwrap_or_default(),
                username: xml::child_text(node, "Username").filter(|s| !s.is_empty()),
                password: xml::child_text(node, "Password").filter(|s| !s.is_empty()),
                file_size: optional_number(node, "FileSize")?,
                target_file_name: xml::child_text(node, "TargetFileName").unwrap_or_default(),
                delay_seconds: optional_number(node, "DelaySeconds")?.unwrap_or(0),
                success_url: xml::child_text(node, "SuccessURL").unwrap_or_default(),
                failure_url: xml::child_text(node, "FailureURL").unwrap_or_default(),
            }),
            "Upload" => Self::Upload,
            "Reboot" => Self::Reboot(Reboot {
                command_key: xml::child_text(node, "CommandKey").unwrap_or_default(),
            }),
            "FactoryReset" => Self::FactoryReset(FactoryReset {
                command_key: xml::child_text(node, "CommandKey").unwrap_or_default(),
            }),
            "AddObject" => Self::AddObject(AddObject {
                object_name: xml::child_text(node, "ObjectName")
                    .ok_or_else(|| malformed("AddObject has no ObjectName"))?,
                parameter_key: xml::child_text(node, "ParameterKey").unwrap_or_default(),
            }),
            "DeleteObject" => Self::DeleteObject(DeleteObject {
                object_name: xml::child_text(node, "ObjectName")
                    .ok_or_else(|| malformed("DeleteObject has no ObjectName"))?,
                parameter_key: xml::child_text(node, "ParameterKey").unwrap_or_default(),
            }),
            "InformResponse" => Self::InformResponse(InformResponse {
                max_envelopes: optional_number(node, "MaxEnvelopes")?.unwrap_or(1),
            }),
            "TransferCompleteResponse" => Self::TransferCompleteResponse,
            "RequestDownloadResponse" => Self::RequestDownloadResponse,
            "X_Command" => {
                let parameters = xml::first_child(node, "Parameters");
                Self::XCommand(XCommand {
                    command_key: xml::child_text(node, "CommandKey").unwrap_or_default(),
                    command: parameters
                        .and_then(|p| xml::child_text(p, "Command"))
                        .unwrap_or_default(),
                })
            }
            "Fault" => {
                let detail = xml::first_child(node, "detail")
                    .and_then(|d| xml::first_child(d, "Fault"))
                    .or_else(|| xml::first_child(node, "FaultDetail"));
                Self::Fault(FaultResponse {
                    fault_code: xml::child_text(node, "faultcode")
                        .or_else(|| xml::child_text(node, "FaultCode"))
                        .unwrap_or_default(),
                    fault_string: xml::child_text(node, "faultstring")
                        .or_else(|| xml::child_text(node, "FaultString"))
                        .unwrap_or_default(),
                    detail_code: detail.map_or(Ok(None), |d| optional_number(d, "FaultCode"))?,
                    detail_string: detail.and_then(|d| xml::child_text(d, "FaultString")),
                })
            }
            other => return Err(malformed(format!("unsupported ACS method: {other}"))),
        };
        Ok(body)
    }
}
