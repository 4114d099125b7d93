use crate::marshalling::{FromWire, MarshallError, ToWire, Value};

#[derive(Debug, Clone, PartialEq, Default)]
/// Entity field value with three states.
///
/// `Missing` means "the caller never set this field" and is never sent to the
/// server. `Null` is an explicit nil on the wire.
pub enum Field<T> {
    #[default]
    Missing,
    Null,
    Present(T),
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Borrow the value when present.
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing | Self::Null => None,
        }
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing | Self::Null => None,
        }
    }

    /// Take the value when present, collapsing `Missing` and `Null` to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing | Self::Null => None,
        }
    }
}

impl<T: ToWire> Field<T> {
    /// Wire form of this field; `None` for `Missing`.
    pub(crate) fn to_wire_value(&self) -> Option<Value> {
        match self {
            Self::Missing => None,
            Self::Null => Some(Value::Nil),
            Self::Present(value) => Some(value.to_wire()),
        }
    }

    pub(crate) fn to_wire_field(&self) -> Field<Value> {
        match self.to_wire_value() {
            Some(value) => Field::Present(value),
            None => Field::Missing,
        }
    }
}

impl<T: FromWire> Field<T> {
    pub(crate) fn from_wire_value(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Nil => Ok(Self::Null),
            other => T::from_wire(other).map(Self::Present),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl From<&str> for Field<String> {
    fn from(value: &str) -> Self {
        Self::Present(value.to_owned())
    }
}
