//! SOAP envelope model and codec for TR-069 (CWMP) 1.2.
//!
//! The CPE→ACS direction is [`request::RequestEnvelope`]; the ACS→CPE
//! direction is [`response::ResponseEnvelope`]. Both directions share the
//! typed parameter value model in [`value`] and the RFC 3339 timestamp codec
//! in [`time`].

pub mod fault;
pub mod request;
pub mod response;
pub mod time;
pub mod value;
pub mod xml;

pub use fault::CwmpFault;
pub use request::{RequestBody, RequestEnvelope};
pub use response::{ResponseBody, ResponseEnvelope};
pub use time::CwmpTime;
pub use value::{ParameterValue, TypedValue, XsdType};

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.1 encoding namespace (`arrayType`).
pub const SOAP_ENC_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
/// CWMP method namespace; also the `SOAPAction` header value.
pub const CWMP_NS: &str = "urn:dslforum-org:cwmp-1-2";
/// XML Schema namespace (`xsd:` value types).
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
/// XML Schema instance namespace (`xsi:type`).
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

#[derive(Debug, thiserror::Error)]
pub enum SoapError {
    /// XML did not parse, or the body did not contain exactly one known
    /// method element.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("malformed envelope: {0}")]
    Xml(#[from] roxmltree::Error),

    /// A `dateTime` value failed to parse on ingest. Never silently
    /// downcast to string.
    #[error("invalid dateTime value: {0:?}")]
    InvalidDateTime(String),
}
