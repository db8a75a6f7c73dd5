//! RFC 3339 timestamp codec for `xsd:dateTime` values.

use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, Utc};

use crate::SoapError;

/// A TR-069 timestamp. Parses and emits RFC 3339; a value that does not
/// parse propagates [`SoapError::InvalidDateTime`] instead of degrading to a
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CwmpTime(pub DateTime<FixedOffset>);

impl CwmpTime {
    pub fn parse(raw: &str) -> Result<Self, SoapError> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(Self)
            .map_err(|_| SoapError::InvalidDateTime(raw.to_owned()))
    }

    /// Current time at second precision (the emitted resolution, so a value
    /// survives an emit/parse round trip unchanged).
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(0).fixed_offset())
    }

    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl std::fmt::Display for CwmpTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_reemits_rfc3339() {
        let t = CwmpTime::parse("2024-05-01T12:30:45Z").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-05-01T12:30:45Z");

        let offset = CwmpTime::parse("2024-05-01T12:30:45+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-05-01T12:30:45+02:00");
    }

    #[test]
    fn rejects_non_rfc3339() {
        assert!(CwmpTime::parse("01/05/2024 12:30").is_err());
        assert!(CwmpTime::parse("").is_err());
    }

    #[test]
    fn roundtrips_through_parse() {
        let t = CwmpTime::now();
        assert_eq!(CwmpTime::parse(&t.to_rfc3339()).unwrap(), t);
    }
}
