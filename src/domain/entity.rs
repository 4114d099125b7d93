//! Entity model: records with a fixed, statically declared schema.

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::field::Field;
use crate::marshalling::{FromWire, MarshallError, Mapping, ToWire, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Static description of an entity variant.
pub struct EntitySchema {
    /// Variant name, e.g. `Campaign`.
    pub name: &'static str,
    /// Wire field names in declaration order.
    pub fields: &'static [&'static str],
    /// Fields sent by update calls; `None` means every field.
    pub updatable: Option<&'static [&'static str]>,
    /// `(field, variant)` pairs for fields holding lists of other entities.
    pub nested: &'static [(&'static str, &'static str)],
    /// Fields where a server-side nil means "not set".
    pub null_as_missing: &'static [&'static str],
}

impl EntitySchema {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(&name)
    }

    pub fn is_updatable(&self, name: &str) -> bool {
        self.updatable.is_none_or(|fields| fields.contains(&name))
    }
}

#[derive(Debug, thiserror::Error)]
/// Entity construction failure.
pub enum SchemaError {
    #[error("{entity} has no field `{field}`")]
    UnknownField { entity: &'static str, field: String },

    #[error("{entity}.{field}: {source}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        #[source]
        source: Box<MarshallError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnknownFields {
    Reject,
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
/// Input accepted by [`Entity::marshall_list`].
pub enum EntitySource<E> {
    Entity(E),
    Mapping(Mapping),
}

impl<E: Entity> From<E> for EntitySource<E> {
    fn from(value: E) -> Self {
        Self::Entity(value)
    }
}

impl<E: Entity> From<Mapping> for EntitySource<E> {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

/// Common behaviour of all entity variants.
///
/// Implementations are generated by `define_entity!`; only [`Entity::fields`]
/// and [`Entity::set_field`] are variant specific.
pub trait Entity: Clone + PartialEq + Default + ToWire + FromWire {
    const SCHEMA: EntitySchema;

    /// Every field in schema order, `Missing` included. A nil in one of the
    /// schema's `null_as_missing` fields reads as `Missing`.
    fn fields(&self) -> Vec<(&'static str, Field<Value>)>;

    /// Assign a field by wire name. Returns `Ok(false)` for unknown names.
    fn set_field(&mut self, name: &str, value: Value) -> Result<bool, SchemaError>;

    /// Build from a caller-supplied mapping. Unknown keys are an error.
    fn from_mapping(mapping: Mapping) -> Result<Self, SchemaError> {
        build(mapping, UnknownFields::Reject)
    }

    /// Build from a server response. Unknown keys are dropped.
    fn from_response(mapping: Mapping) -> Result<Self, SchemaError> {
        build(mapping, UnknownFields::Ignore)
    }

    /// Non-missing fields in schema order; what a request carries.
    fn to_mapping(&self) -> Mapping {
        self.fields()
            .into_iter()
            .filter_map(|(name, field)| field.into_option().map(|v| (name.to_owned(), v)))
            .collect()
    }

    /// All fields in schema order, `Missing` included.
    fn to_mapping_with_missing(&self) -> IndexMap<&'static str, Field<Value>> {
        self.fields().into_iter().collect()
    }

    /// Non-missing fields restricted to the variant's updatable subset.
    fn to_updatable_mapping(&self) -> Mapping {
        self.fields()
            .into_iter()
            .filter(|(name, _)| Self::SCHEMA.is_updatable(name))
            .filter_map(|(name, field)| field.into_option().map(|v| (name.to_owned(), v)))
            .collect()
    }

    fn all_fields_missing(&self) -> bool {
        self.fields().iter().all(|(_, field)| field.is_missing())
    }

    /// Convert mappings or entities into entities of this variant.
    ///
    /// Entities pass through unchanged.
    fn marshall_list<I, S>(items: I) -> Result<Vec<Self>, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<EntitySource<Self>>,
    {
        items
            .into_iter()
            .map(|item| match item.into() {
                EntitySource::Entity(entity) => Ok(entity),
                EntitySource::Mapping(mapping) => Self::from_mapping(mapping),
            })
            .collect()
    }
}

/// Wire view of an entity's fields with `null_as_missing` applied.
pub(crate) fn wire_fields(
    schema: &EntitySchema,
    fields: Vec<(&'static str, Field<Value>)>,
) -> Vec<(&'static str, Field<Value>)> {
    fields
        .into_iter()
        .map(|(name, field)| match field {
            Field::Null if schema.null_as_missing.contains(&name) => (name, Field::Missing),
            field => (name, field),
        })
        .collect()
}

fn build<E: Entity>(mapping: Mapping, unknown: UnknownFields) -> Result<E, SchemaError> {
    let schema = E::SCHEMA;
    let mut entity = E::default();
    for (key, value) in mapping {
        if value.is_nil() && schema.null_as_missing.contains(&key.as_str()) {
            continue;
        }
        if entity.set_field(&key, value)? {
            continue;
        }
        match unknown {
            UnknownFields::Reject => {
                return Err(SchemaError::UnknownField {
                    entity: schema.name,
                    field: key,
                });
            }
            UnknownFields::Ignore => {
                debug!(entity = schema.name, field = %key, "dropping unknown field");
            }
        }
    }
    Ok(entity)
}

/// Declare an entity struct with `Field<T>` members and its [`Entity`] impl.
macro_rules! define_entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty => $wire:literal,
            )+
        }
        updatable = $updatable:expr;
        nested = $nested:expr;
        null_as_missing = $null_as_missing:expr;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $crate::domain::Field<$ty>,
            )+
        }

        impl $crate::domain::Entity for $name {
            const SCHEMA: $crate::domain::EntitySchema = $crate::domain::EntitySchema {
                name: stringify!($name),
                fields: &[$($wire),+],
                updatable: $updatable,
                nested: $nested,
                null_as_missing: $null_as_missing,
            };

            fn fields(&self) -> Vec<(&'static str, $crate::domain::Field<$crate::marshalling::Value>)> {
                $crate::domain::entity::wire_fields(
                    &<Self as $crate::domain::Entity>::SCHEMA,
                    vec![$(($wire, self.$field.to_wire_field())),+],
                )
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::marshalling::Value,
            ) -> Result<bool, $crate::domain::SchemaError> {
                match name {
                    $(
                        $wire => {
                            self.$field = $crate::domain::Field::from_wire_value(value).map_err(
                                |source| $crate::domain::SchemaError::InvalidField {
                                    entity: stringify!($name),
                                    field: $wire,
                                    source: Box::new(source),
                                },
                            )?;
                            Ok(true)
                        }
                    )+
                    _ => Ok(false),
                }
            }
        }

        // Field-by-field on the wire view, so a nil that the schema treats as
        // missing equals `Missing`.
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                $crate::domain::Entity::fields(self) == $crate::domain::Entity::fields(other)
            }
        }

        impl $crate::marshalling::ToWire for $name {
            fn to_wire(&self) -> $crate::marshalling::Value {
                $crate::marshalling::Value::Struct($crate::domain::Entity::to_mapping(self))
            }
        }

        impl $crate::marshalling::FromWire for $name {
            fn from_wire(
                value: $crate::marshalling::Value,
            ) -> Result<Self, $crate::marshalling::MarshallError> {
                match value {
                    $crate::marshalling::Value::Struct(mapping) => {
                        Ok(<Self as $crate::domain::Entity>::from_response(mapping)?)
                    }
                    other => Err($crate::marshalling::MarshallError::mismatch(
                        stringify!($name),
                        &other,
                    )),
                }
            }
        }
    };
}

pub(crate) use define_entity;
