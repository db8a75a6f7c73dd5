//! TR-069 fault codes and the CPE fault body.

/// Method not supported.
pub const METHOD_NOT_SUPPORTED: u32 = 9000;
/// Invalid parameter name.
pub const INVALID_PARAMETER_NAME: u32 = 9005;
/// Invalid parameter type.
pub const INVALID_PARAMETER_TYPE: u32 = 9006;
/// Attempt to set a non-writable parameter.
pub const NON_WRITABLE_PARAMETER: u32 = 9008;

/// The `cwmp:Fault` detail the CPE sends inside a SOAP fault body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CwmpFault {
    pub code: u32,
    pub string: String,
}

impl CwmpFault {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            string: default_fault_string(code).to_owned(),
        }
    }

    pub fn with_string(code: u32, string: impl Into<String>) -> Self {
        Self {
            code,
            string: string.into(),
        }
    }

    /// TR-069 splits fault codes into sender classes: 9000-9799 are CPE
    /// ("Server" is the ACS side of the SOAP exchange, so CPE faults carry
    /// faultcode "Client" for request errors and "Server" otherwise).
    pub fn soap_fault_code(&self) -> &'static str {
        match self.code {
            9000..=9799 => "Client",
            _ => "Server",
        }
    }
}

pub fn default_fault_string(code: u32) -> &'static str {
    match code {
        METHOD_NOT_SUPPORTED => "Method not supported",
        9001 => "Request denied",
        9002 => "Internal error",
        9003 => "Invalid arguments",
        9004 => "Resources exceeded",
        INVALID_PARAMETER_NAME => "Invalid parameter name",
        INVALID_PARAMETER_TYPE => "Invalid parameter type",
        9007 => "Invalid parameter value",
        NON_WRITABLE_PARAMETER => "Attempt to set a non-writable parameter",
        9009 => "Notification request rejected",
        9010 => "Download failure",
        9011 => "Upload failure",
        _ => "Fault",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_strings_match_tr069() {
        assert_eq!(CwmpFault::new(9005).string, "Invalid parameter name");
        assert_eq!(
            CwmpFault::new(9008).string,
            "Attempt to set a non-writable parameter"
        );
        assert_eq!(CwmpFault::new(9006).string, "Invalid parameter type");
    }
}
