use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::marshalling::MarshallError;

const WIRE_FORMAT: &str = "%Y%m%dT%H:%M:%S";
const WIRE_FORMAT_WITH_OFFSET: &str = "%Y%m%dT%H:%M:%S%z";
const EXTENDED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Length of `YYYYMMDDTHH:MM:SS`, the part of a wire timestamp before any offset.
const WIRE_PREFIX_LEN: usize = 17;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Raw `dateTime.iso8601` payload as sent by the server, e.g. `20140414T16:27:00+0200`.
///
/// The value is kept verbatim; parsing happens only when a native date/time is requested.
pub struct WireDateTime(String);

impl WireDateTime {
    /// Wrap a raw wire string without validating it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Encode a naive instant as `YYYYMMDDTHH:MM:SS` (no offset).
    pub fn from_naive(value: &NaiveDateTime) -> Self {
        Self(value.format(WIRE_FORMAT).to_string())
    }

    /// Encode an instant keeping its offset, e.g. `20140414T16:27:00+0200`.
    pub fn from_fixed(value: &DateTime<FixedOffset>) -> Self {
        Self(value.format(WIRE_FORMAT_WITH_OFFSET).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse to second precision, dropping any trailing offset.
    pub fn to_naive(&self) -> Result<NaiveDateTime, MarshallError> {
        let raw = self.0.trim();
        let prefix = raw.get(..WIRE_PREFIX_LEN).unwrap_or(raw);
        NaiveDateTime::parse_from_str(prefix, WIRE_FORMAT)
            .or_else(|_| {
                let extended = raw.get(..WIRE_PREFIX_LEN + 2).unwrap_or(raw);
                NaiveDateTime::parse_from_str(extended, EXTENDED_FORMAT)
            })
            .map_err(|_| self.invalid())
    }

    /// Parse keeping the offset; a value without one is taken as UTC.
    pub fn to_fixed(&self) -> Result<DateTime<FixedOffset>, MarshallError> {
        let raw = self.0.trim();
        if let Ok(parsed) = DateTime::parse_from_str(raw, WIRE_FORMAT_WITH_OFFSET) {
            return Ok(parsed);
        }
        if raw.len() == WIRE_PREFIX_LEN {
            return self.to_naive().map(|naive| naive.and_utc().fixed_offset());
        }
        Err(self.invalid())
    }

    fn invalid(&self) -> MarshallError {
        MarshallError::InvalidDateTime {
            input: self.0.clone(),
        }
    }
}
