use indexmap::IndexMap;

use crate::marshalling::datetime::WireDateTime;

/// Ordered `struct` payload as it travels over the wire.
pub type Mapping = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
/// Transport-safe value understood by the XML-RPC codec.
///
/// Date/time values stay in their wire form ([`WireDateTime`]) at this level;
/// converting them to `chrono` types is the job of [`FromWire`](super::FromWire).
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    DateTime(WireDateTime),
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(Mapping),
}

impl Value {
    /// Build a `struct` value from key/value pairs, keeping their order.
    pub fn struct_from<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Struct(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// XML-RPC type name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::DateTime(_) => "dateTime.iso8601",
            Self::Base64(_) => "base64",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_struct(&self) -> Option<&Mapping> {
        match self {
            Self::Struct(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Look up a member of a `struct` value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|map| map.get(key))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Self::Struct(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}
