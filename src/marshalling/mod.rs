//! Marshalling layer: the single translation boundary between native values
//! (entities, `chrono` date/times, collections) and transport-safe [`Value`]s.
//!
//! Outbound conversion is [`ToWire`], inbound is [`FromWire`]. Both recurse
//! through arrays, structs and entities. Lazy sequences stay lazy through
//! [`marshall_param_iter`] / [`marshall_result_iter`].

mod datetime;
mod value;

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use indexmap::IndexMap;

use crate::domain::SchemaError;

pub use datetime::WireDateTime;
pub use value::{Mapping, Value};

#[derive(Debug, thiserror::Error)]
/// Failure converting a wire [`Value`] into a native type.
pub enum MarshallError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("integer {value} does not fit into {target}")]
    OutOfRange { value: i64, target: &'static str },

    #[error("invalid date/time value: {input}")]
    InvalidDateTime { input: String },

    #[error("missing member `{key}`")]
    MissingMember { key: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MarshallError {
    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.kind(),
        }
    }
}

/// Outbound conversion: native value -> transport-safe [`Value`].
pub trait ToWire {
    fn to_wire(&self) -> Value;
}

/// Inbound conversion: transport [`Value`] -> native value.
pub trait FromWire: Sized {
    fn from_wire(value: Value) -> Result<Self, MarshallError>;
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self) -> Value {
        (**self).to_wire()
    }
}

impl ToWire for Value {
    fn to_wire(&self) -> Value {
        self.clone()
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToWire for i32 {
    fn to_wire(&self) -> Value {
        Value::Int(i64::from(*self))
    }
}

impl ToWire for u32 {
    fn to_wire(&self) -> Value {
        Value::Int(i64::from(*self))
    }
}

impl ToWire for i64 {
    fn to_wire(&self) -> Value {
        Value::Int(*self)
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> Value {
        Value::Double(*self)
    }
}

impl ToWire for str {
    fn to_wire(&self) -> Value {
        Value::String(self.to_owned())
    }
}

impl ToWire for String {
    fn to_wire(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToWire for NaiveDateTime {
    fn to_wire(&self) -> Value {
        Value::DateTime(WireDateTime::from_naive(self))
    }
}

impl ToWire for DateTime<FixedOffset> {
    fn to_wire(&self) -> Value {
        Value::DateTime(WireDateTime::from_fixed(self))
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> Value {
        match self {
            Some(value) => value.to_wire(),
            None => Value::Nil,
        }
    }
}

impl<T: ToWire> ToWire for [T] {
    fn to_wire(&self) -> Value {
        Value::Array(self.iter().map(ToWire::to_wire).collect())
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> Value {
        self.as_slice().to_wire()
    }
}

impl<T: ToWire> ToWire for IndexMap<String, T> {
    fn to_wire(&self) -> Value {
        Value::Struct(self.iter().map(|(k, v)| (k.clone(), v.to_wire())).collect())
    }
}

impl<T: ToWire> ToWire for BTreeMap<String, T> {
    fn to_wire(&self) -> Value {
        Value::Struct(self.iter().map(|(k, v)| (k.clone(), v.to_wire())).collect())
    }
}

impl FromWire for Value {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        Ok(value)
    }
}

impl FromWire for bool {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(MarshallError::mismatch("boolean", &other)),
        }
    }
}

impl FromWire for i64 {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(MarshallError::mismatch("int", &other)),
        }
    }
}

impl FromWire for i32 {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        let wide = i64::from_wire(value)?;
        i32::try_from(wide).map_err(|_| MarshallError::OutOfRange {
            value: wide,
            target: "i32",
        })
    }
}

impl FromWire for u32 {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        let wide = i64::from_wire(value)?;
        u32::try_from(wide).map_err(|_| MarshallError::OutOfRange {
            value: wide,
            target: "u32",
        })
    }
}

impl FromWire for f64 {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Double(d) => Ok(d),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(i as f64),
            other => Err(MarshallError::mismatch("double", &other)),
        }
    }
}

impl FromWire for String {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(MarshallError::mismatch("string", &other)),
        }
    }
}

impl FromWire for NaiveDateTime {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::DateTime(wire) => wire.to_naive(),
            Value::String(raw) => WireDateTime::new(raw).to_naive(),
            other => Err(MarshallError::mismatch("dateTime.iso8601", &other)),
        }
    }
}

impl FromWire for DateTime<FixedOffset> {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::DateTime(wire) => wire.to_fixed(),
            Value::String(raw) => WireDateTime::new(raw).to_fixed(),
            other => Err(MarshallError::mismatch("dateTime.iso8601", &other)),
        }
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_wire(other).map(Some),
        }
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_wire).collect(),
            other => Err(MarshallError::mismatch("array", &other)),
        }
    }
}

impl<T: FromWire> FromWire for IndexMap<String, T> {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Struct(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, T::from_wire(v)?)))
                .collect(),
            other => Err(MarshallError::mismatch("struct", &other)),
        }
    }
}

impl<T: FromWire> FromWire for BTreeMap<String, T> {
    fn from_wire(value: Value) -> Result<Self, MarshallError> {
        match value {
            Value::Struct(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, T::from_wire(v)?)))
                .collect(),
            other => Err(MarshallError::mismatch("struct", &other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Marker target for [`marshall_result`]: structs stay maps.
pub enum Untyped {}

#[derive(Debug, Clone, PartialEq)]
/// Decoded response tree with native date/times.
///
/// With a target entity `E`, every struct becomes `Entity(E)`; with [`Untyped`]
/// structs are kept as `Map`.
pub enum Native<E = Untyped> {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    List(Vec<Native<E>>),
    Map(IndexMap<String, Native<E>>),
    Entity(E),
}

/// Outbound marshalling of anything convertible to the wire.
pub fn marshall_param<T: ToWire + ?Sized>(data: &T) -> Value {
    data.to_wire()
}

/// Outbound marshalling that stays lazy: items are converted as the caller pulls them.
pub fn marshall_param_iter<I>(items: I) -> impl Iterator<Item = Value>
where
    I: IntoIterator,
    I::Item: ToWire,
{
    items.into_iter().map(|item| item.to_wire())
}

/// Inbound marshalling without a target entity: structs stay maps.
pub fn marshall_result(data: Value) -> Result<Native, MarshallError> {
    to_native(data, &|map| {
        map.into_iter()
            .map(|(k, v)| Ok((k, marshall_result(v)?)))
            .collect::<Result<IndexMap<_, _>, MarshallError>>()
            .map(Native::Map)
    })
}

/// Inbound marshalling with a target: every struct is decoded as `E`.
pub fn marshall_result_as<E: FromWire>(data: Value) -> Result<Native<E>, MarshallError> {
    to_native(data, &|map| E::from_wire(Value::Struct(map)).map(Native::Entity))
}

/// Lazy inbound marshalling of a sequence of wire values.
pub fn marshall_result_iter<E, I>(items: I) -> impl Iterator<Item = Result<Native<E>, MarshallError>>
where
    E: FromWire,
    I: IntoIterator<Item = Value>,
{
    items.into_iter().map(marshall_result_as::<E>)
}

/// Wrap a raw `Value -> Value` function so it takes native arguments and yields a typed result.
///
/// For synchronous handlers such as local fixtures. Remote calls go through
/// [`call_marshalled`].
pub fn marshalled<A, T, F>(func: F) -> impl Fn(&A) -> Result<T, MarshallError>
where
    A: ToWire + ?Sized,
    T: FromWire,
    F: Fn(Value) -> Value,
{
    move |args: &A| T::from_wire(func(args.to_wire()))
}

/// Async form of [`marshalled`]: marshall `args`, await `call`, decode its reply as `T`.
pub async fn call_marshalled<A, T, F, Fut, E>(args: &A, call: F) -> Result<T, E>
where
    A: ToWire + ?Sized,
    T: FromWire,
    F: FnOnce(Value) -> Fut,
    Fut: Future<Output = Result<Value, E>>,
    E: From<MarshallError>,
{
    let reply = call(args.to_wire()).await?;
    Ok(T::from_wire(reply)?)
}

type StructHandler<'a, E> = dyn Fn(Mapping) -> Result<Native<E>, MarshallError> + 'a;

fn to_native<E>(data: Value, on_struct: &StructHandler<'_, E>) -> Result<Native<E>, MarshallError> {
    Ok(match data {
        Value::Nil => Native::Nil,
        Value::Bool(b) => Native::Bool(b),
        Value::Int(i) => Native::Int(i),
        Value::Double(d) => Native::Double(d),
        Value::String(s) => Native::String(s),
        Value::Base64(bytes) => Native::Bytes(bytes),
        Value::DateTime(wire) => Native::DateTime(wire.to_naive()?),
        Value::Array(items) => Native::List(
            items
                .into_iter()
                .map(|item| to_native(item, on_struct))
                .collect::<Result<_, _>>()?,
        ),
        Value::Struct(map) => on_struct(map)?,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Ad, Entity, Field};

    fn ad() -> Ad {
        Ad {
            creative1: "headline".into(),
            creative2: Field::Null,
            clickthru_url: "http://example.com/subpage".into(),
            ..Ad::default()
        }
    }

    fn ad_mapping() -> Mapping {
        Mapping::from_iter([
            ("creative1".to_owned(), Value::from("headline")),
            ("creative2".to_owned(), Value::Nil),
            (
                "clickthruUrl".to_owned(),
                Value::from("http://example.com/subpage"),
            ),
        ])
    }

    fn sample_instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 4, 14)
            .unwrap()
            .and_hms_opt(16, 27, 0)
            .unwrap()
    }

    #[test]
    fn entity_becomes_its_mapping() {
        assert_eq!(marshall_param(&ad()), Value::Struct(ad_mapping()));
    }

    #[test]
    fn mixed_list_keeps_scalars_in_place() {
        let ad = Ad {
            creative1: "x".into(),
            ..Ad::default()
        };
        let items: Vec<&dyn ToWire> = vec![&1234, &ad, &"abcdef"];

        assert_eq!(
            marshall_param(&items),
            Value::Array(vec![
                Value::Int(1234),
                Value::struct_from([("creative1", Value::from("x"))]),
                Value::from("abcdef"),
            ])
        );
    }

    #[test]
    fn nested_maps_and_lists_are_marshalled() {
        let mut data: IndexMap<String, Vec<&dyn ToWire>> = IndexMap::new();
        let ad = ad();
        data.insert("item".to_owned(), vec![&ad, &12]);
        data.insert("not".to_owned(), vec![&"foo"]);

        let expected = Value::struct_from([
            (
                "item",
                Value::Array(vec![Value::Struct(ad_mapping()), Value::Int(12)]),
            ),
            ("not", Value::Array(vec![Value::from("foo")])),
        ]);
        assert_eq!(marshall_param(&data), expected);
    }

    #[test]
    fn datetime_param_uses_wire_form() {
        assert_eq!(
            marshall_param(&sample_instant()),
            Value::DateTime(WireDateTime::new("20140414T16:27:00"))
        );
    }

    #[test]
    fn param_iter_is_lazy() {
        let produced = Cell::new(0);
        let source = (0..3).map(|_| {
            produced.set(produced.get() + 1);
            ad()
        });

        let mut marshalled = marshall_param_iter(source);
        assert_eq!(produced.get(), 0);
        assert_eq!(marshalled.next(), Some(Value::Struct(ad_mapping())));
        assert_eq!(produced.get(), 1);
        assert_eq!(marshalled.count(), 2);
    }

    #[test]
    fn result_with_target_builds_entities() {
        let data = Value::Array(vec![
            Value::Int(1234),
            Value::Struct(ad_mapping()),
            Value::from("abcdef"),
        ]);

        let native = marshall_result_as::<Ad>(data).unwrap();
        assert_eq!(
            native,
            Native::List(vec![
                Native::Int(1234),
                Native::Entity(ad()),
                Native::String("abcdef".to_owned()),
            ])
        );
    }

    #[test]
    fn result_without_target_keeps_maps() {
        let native = marshall_result(Value::Struct(ad_mapping())).unwrap();
        let Native::Map(map) = native else {
            panic!("expected a map");
        };
        assert_eq!(
            map.get("creative1"),
            Some(&Native::String("headline".to_owned()))
        );
        assert_eq!(map.get("creative2"), Some(&Native::Nil));
    }

    #[test]
    fn result_converts_nested_datetimes() {
        let wire = Value::DateTime(WireDateTime::new("20140414T16:27:00+0200"));

        assert_eq!(
            marshall_result(wire.clone()).unwrap(),
            Native::DateTime(sample_instant())
        );

        let nested = Value::struct_from([(
            "X",
            Value::Array(vec![Value::struct_from([("a", wire.clone())])]),
        )]);
        let Native::Map(outer) = marshall_result(nested).unwrap() else {
            panic!("expected map");
        };
        let Some(Native::List(items)) = outer.get("X") else {
            panic!("expected list");
        };
        let Native::Map(inner) = &items[0] else {
            panic!("expected inner map");
        };
        assert_eq!(inner.get("a"), Some(&Native::DateTime(sample_instant())));

        let typed = Vec::<IndexMap<String, NaiveDateTime>>::from_wire(Value::Array(vec![
            Value::struct_from([("a", wire)]),
        ]))
        .unwrap();
        assert_eq!(typed[0]["a"], sample_instant());
    }

    #[test]
    fn entity_date_fields_decode_to_native() {
        let value = Value::struct_from([(
            "createDate",
            Value::DateTime(WireDateTime::new("20140414T16:27:00+0200")),
        )]);
        let ad = Ad::from_wire(value).unwrap();
        assert_eq!(ad.create_date, Field::Present(sample_instant()));
    }

    #[test]
    fn result_iter_is_lazy_and_typed() {
        let mut results = marshall_result_iter::<Ad, _>(vec![
            Value::Struct(ad_mapping()),
            Value::Struct(ad_mapping()),
        ]);
        assert_eq!(results.next().unwrap().unwrap(), Native::Entity(ad()));
        assert_eq!(results.count(), 1);
    }

    #[test]
    fn marshalled_wrapper_round_trips_entities() {
        let passthru = marshalled::<Ad, Ad, _>(|value| {
            assert_eq!(value, Value::Struct(ad_mapping()));
            value
        });
        assert_eq!(passthru(&ad()).unwrap(), ad());
    }

    #[tokio::test]
    async fn call_marshalled_awaits_and_decodes() {
        let found: Ad = call_marshalled(&ad(), |value| async move {
            assert_eq!(value, Value::Struct(ad_mapping()));
            Ok::<_, MarshallError>(value)
        })
        .await
        .unwrap();
        assert_eq!(found, ad());

        let err = call_marshalled::<_, i64, _, _, MarshallError>(&[1i64, 2][..], |_| async {
            Ok(Value::from("x"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, MarshallError::TypeMismatch { expected: "int", .. }));
    }

    #[test]
    fn scalar_decoders_reject_other_kinds() {
        assert!(matches!(
            i64::from_wire(Value::from("1")),
            Err(MarshallError::TypeMismatch {
                expected: "int",
                found: "string"
            })
        ));
        assert!(matches!(
            i32::from_wire(Value::Int(i64::MAX)),
            Err(MarshallError::OutOfRange { target: "i32", .. })
        ));
        assert_eq!(f64::from_wire(Value::Int(3)).unwrap(), 3.0);
        assert_eq!(Option::<i64>::from_wire(Value::Nil).unwrap(), None);
    }
}
