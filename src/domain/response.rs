use std::collections::BTreeMap;
use std::fmt;

use crate::domain::value::ApiStatus;
use crate::marshalling::{FromWire, MarshallError, Mapping, Native, Value, marshall_result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Protocol generation reported by `api.version`.
pub enum ApiDialect {
    /// The older `bajaja` API.
    Legacy,
    /// The `cipisek` API this client speaks.
    Current,
    Unknown(String),
}

impl ApiDialect {
    pub const LEGACY_NAME: &'static str = "bajaja";
    pub const CURRENT_NAME: &'static str = "cipisek";

    pub fn from_name(name: &str) -> Self {
        match name {
            Self::LEGACY_NAME => Self::Legacy,
            Self::CURRENT_NAME => Self::Current,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    pub name: String,
    pub number: String,
}

impl ApiVersion {
    pub fn dialect(&self) -> ApiDialect {
        ApiDialect::from_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Anti-abuse throttling window and per-operation batch limits from `api.limits`.
pub struct Limits {
    pub anti_dos_call_count: i64,
    pub anti_dos_time_interval: i64,
    /// Operation name (`keywords.create`, `global.create`, ...) -> max items per call.
    pub batch_call_limits: BTreeMap<String, u32>,
}

impl Limits {
    /// Batch limit for `resource.verb`, falling back to `global.verb`.
    pub fn batch_limit(&self, operation: &str) -> Option<u32> {
        if let Some(limit) = self.batch_call_limits.get(operation) {
            return Some(*limit);
        }
        let (_, verb) = operation.split_once('.')?;
        self.batch_call_limits.get(&format!("global.{verb}")).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One entry of a response's `problems` / `diagnostics` list.
pub struct Diagnostic {
    /// Rule id such as `bad_url`, when the server sent one.
    pub id: Option<String>,
    pub raw: Value,
}

impl Diagnostic {
    /// Accepts plain strings and structs carrying an `id`.
    pub fn from_value(raw: Value) -> Self {
        let id = match &raw {
            Value::String(s) => Some(s.clone()),
            other => other.get("id").and_then(Value::as_str).map(str::to_owned),
        };
        Self { id, raw }
    }

    /// Parse a whole list; a missing or nil list yields no diagnostics.
    pub fn list_from(value: Option<Value>) -> Vec<Self> {
        match value {
            Some(Value::Array(items)) => items.into_iter().map(Self::from_value).collect(),
            Some(Value::Nil) | None => Vec::new(),
            Some(other) => vec![Self::from_value(other)],
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => f.write_str(id),
            None => write!(f, "{:?}", self.raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a mutating call that may legitimately do nothing.
pub enum Completion {
    Done,
    /// Status 409: the target was already in the requested state.
    NoAction { message: String },
}

impl Completion {
    pub fn is_no_action(&self) -> bool {
        matches!(self, Self::NoAction { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Successful (200 or 409) response envelope with its payload members.
pub struct ApiResponse {
    pub status: ApiStatus,
    pub status_message: Option<String>,
    pub payload: Mapping,
}

impl ApiResponse {
    /// Decode and remove a payload member.
    pub fn take<T: FromWire>(&mut self, key: &str) -> Result<T, MarshallError> {
        let value = self
            .payload
            .shift_remove(key)
            .ok_or_else(|| MarshallError::MissingMember {
                key: key.to_owned(),
            })?;
        T::from_wire(value)
    }

    /// Like [`ApiResponse::take`], but an absent or nil member yields `T::default()`.
    pub fn take_or_default<T: FromWire + Default>(&mut self, key: &str) -> Result<T, MarshallError> {
        match self.payload.shift_remove(key) {
            None | Some(Value::Nil) => Ok(T::default()),
            Some(value) => T::from_wire(value),
        }
    }

    /// Remaining payload as a native tree (date/times decoded, structs as maps).
    pub fn into_native(self) -> Result<Native, MarshallError> {
        marshall_result(Value::Struct(self.payload))
    }

    pub fn completion(&self) -> Completion {
        if self.status.as_i32() == 409 {
            Completion::NoAction {
                message: self.status_message.clone().unwrap_or_default(),
            }
        } else {
            Completion::Done
        }
    }
}
