//! XSD-typed parameter values.
//!
//! Every `ParameterValueStruct` on the wire carries an `xsi:type` attribute
//! from a closed set and chardata content. Rendering is canonical: booleans
//! are the literals `true`/`false` regardless of what was ingested, numerics
//! are in minimal form, timestamps are RFC 3339.

use crate::SoapError;
use crate::time::CwmpTime;

/// The closed set of wire types for parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XsdType {
    String,
    Int,
    UnsignedInt,
    Boolean,
    DateTime,
    Float,
    Double,
    Base64Binary,
}

impl XsdType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "xsd:string",
            Self::Int => "xsd:int",
            Self::UnsignedInt => "xsd:unsignedInt",
            Self::Boolean => "xsd:boolean",
            Self::DateTime => "xsd:dateTime",
            Self::Float => "xsd:float",
            Self::Double => "xsd:double",
            Self::Base64Binary => "xsd:base64Binary",
        }
    }

    /// Accepts both prefixed (`xsd:int`) and bare (`int`) spellings; ACS
    /// implementations disagree on the prefix.
    pub fn parse(raw: &str) -> Option<Self> {
        let local = raw.trim().rsplit(':').next()?;
        Some(match local {
            "string" => Self::String,
            "int" => Self::Int,
            "unsignedInt" | "unsignedLong" => Self::UnsignedInt,
            "boolean" => Self::Boolean,
            "dateTime" => Self::DateTime,
            "float" => Self::Float,
            "double" => Self::Double,
            "base64Binary" => Self::Base64Binary,
            _ => return None,
        })
    }
}

/// Normalises the usual boolean spellings. The table is closed; anything
/// else is not a boolean.
pub fn normalize_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// Canonical numeric form: integers without leading zeros, floats with
/// trailing zeros stripped (`5.0` and `5` agree). `None` when not numeric.
pub fn canonical_numeric(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(int.to_string());
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            // `Display` for f64 already drops trailing zeros ("5.0" -> "5").
            return Some(float.to_string());
        }
    }
    None
}

/// Determines the wire type of an untyped raw value. The chain is the
/// contract: boolean, then integer, then float, then dateTime, then string.
/// An integer-looking string is `xsd:unsignedInt` unless negative.
pub fn detect_type(raw: &str) -> XsdType {
    let trimmed = raw.trim();
    if normalize_boolean(trimmed).is_some() {
        return XsdType::Boolean;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return if int < 0 { XsdType::Int } else { XsdType::UnsignedInt };
    }
    if trimmed.parse::<f64>().is_ok_and(f64::is_finite) && !trimmed.is_empty() {
        return XsdType::Float;
    }
    if CwmpTime::parse(trimmed).is_ok() {
        return XsdType::DateTime;
    }
    XsdType::String
}

/// A value plus its declared wire type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub xsd: XsdType,
    pub text: String,
}

impl TypedValue {
    pub fn string(text: impl Into<String>) -> Self {
        Self {
            xsd: XsdType::String,
            text: text.into(),
        }
    }

    pub fn typed(xsd: XsdType, text: impl Into<String>) -> Self {
        Self { xsd, text: text.into() }
    }

    /// Type detected from the content (collector results arrive untyped).
    pub fn detected(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            xsd: detect_type(&text),
            text,
        }
    }

    /// Validates the content against the declared type on ingest. Only
    /// `dateTime` is strict: a bad timestamp is a malformed envelope.
    pub fn validate(&self) -> Result<(), SoapError> {
        if self.xsd == XsdType::DateTime && !self.text.trim().is_empty() {
            CwmpTime::parse(&self.text)?;
        }
        Ok(())
    }

    /// Canonical chardata for emission.
    pub fn render(&self) -> String {
        match self.xsd {
            XsdType::Boolean => match normalize_boolean(&self.text) {
                Some(true) => "true".to_owned(),
                Some(false) => "false".to_owned(),
                None => self.text.trim().to_owned(),
            },
            XsdType::Int | XsdType::UnsignedInt | XsdType::Float | XsdType::Double => {
                canonical_numeric(&self.text).unwrap_or_else(|| self.text.trim().to_owned())
            }
            XsdType::DateTime => CwmpTime::parse(&self.text)
                .map(CwmpTime::to_rfc3339)
                .unwrap_or_else(|_| self.text.trim().to_owned()),
            XsdType::String | XsdType::Base64Binary => self.text.clone(),
        }
    }
}

/// One `(Name, Value)` pair of a `ParameterList`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValue {
    pub name: String,
    pub value: TypedValue,
}

impl ParameterValue {
    pub fn new(name: impl Into<String>, value: TypedValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_table_is_case_insensitive() {
        for raw in ["true", "1", "YES", "On", "Enabled"] {
            assert_eq!(normalize_boolean(raw), Some(true), "{raw}");
        }
        for raw in ["false", "0", "No", "OFF", "disabled"] {
            assert_eq!(normalize_boolean(raw), Some(false), "{raw}");
        }
        assert_eq!(normalize_boolean("maybe"), None);
    }

    #[test]
    fn boolean_normalisation_is_idempotent() {
        for raw in ["true", "false"] {
            let normalised = if normalize_boolean(raw).unwrap() { "true" } else { "false" };
            assert_eq!(normalised, raw);
        }
    }

    #[test]
    fn booleans_always_render_as_literals() {
        assert_eq!(TypedValue::typed(XsdType::Boolean, "1").render(), "true");
        assert_eq!(TypedValue::typed(XsdType::Boolean, "off").render(), "false");
        assert_eq!(TypedValue::typed(XsdType::Boolean, "true").render(), "true");
    }

    #[test]
    fn numerics_render_minimal() {
        assert_eq!(TypedValue::typed(XsdType::UnsignedInt, "007").render(), "7");
        assert_eq!(TypedValue::typed(XsdType::Float, "5.10000").render(), "5.1");
        assert_eq!(TypedValue::typed(XsdType::Float, "5.0").render(), "5");
    }

    #[test]
    fn detection_chain_is_deterministic() {
        assert_eq!(detect_type("true"), XsdType::Boolean);
        assert_eq!(detect_type("42"), XsdType::UnsignedInt);
        assert_eq!(detect_type("-70"), XsdType::Int);
        assert_eq!(detect_type("2.45"), XsdType::Float);
        assert_eq!(detect_type("2024-05-01T12:30:45Z"), XsdType::DateTime);
        assert_eq!(detect_type("RB952Ui-5ac2nD"), XsdType::String);
        // "1" looks boolean and integer; boolean wins by chain order.
        assert_eq!(detect_type("1"), XsdType::Boolean);
    }

    #[test]
    fn datetime_values_validate_on_ingest() {
        assert!(TypedValue::typed(XsdType::DateTime, "not-a-date").validate().is_err());
        assert!(TypedValue::typed(XsdType::DateTime, "2024-05-01T12:30:45Z").validate().is_ok());
    }
}
