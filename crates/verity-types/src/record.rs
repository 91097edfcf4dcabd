//! The field-accessor capability for structured values.
//!
//! A [`Record`] enumerates its field names and reads a named field. There is
//! no ad hoc runtime lookup: each structured type either implements the trait
//! by hand, through [`impl_record!`](crate::impl_record), or is represented
//! by a [`FieldMap`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::descriptor::TypeDescriptor;
use crate::error::{IntrospectionError, IntrospectionResult};
use crate::value::Value;

/// A structured value with named fields.
pub trait Record: fmt::Debug + Send + Sync {
    /// The runtime type of this record.
    fn type_descriptor(&self) -> &'static TypeDescriptor;

    /// The names of all readable fields, in declaration order.
    fn field_names(&self) -> Vec<&str>;

    /// Read a named field.
    ///
    /// Returns [`IntrospectionError::UnknownField`] if the runtime type has
    /// no field with this name.
    fn field_value(&self, name: &str) -> IntrospectionResult<Value>;

    /// Structural equality: same runtime type, same set of field names and
    /// every field structurally equal. A field that cannot be read on either
    /// side makes the records unequal.
    fn structural_eq(&self, other: &dyn Record) -> bool {
        if self.type_descriptor() != other.type_descriptor() {
            return false;
        }
        let names: BTreeSet<&str> = self.field_names().into_iter().collect();
        let other_names: BTreeSet<&str> = other.field_names().into_iter().collect();
        if names != other_names {
            return false;
        }
        names.into_iter().all(|name| {
            match (self.field_value(name), other.field_value(name)) {
                (Ok(a), Ok(b)) => a.structural_eq(&b),
                _ => false,
            }
        })
    }

    /// The natural order of this record type, if it has one.
    fn natural_cmp(&self, _other: &dyn Record) -> Option<Ordering> {
        None
    }
}

/// A [`Record`] backed by an ordered field map.
///
/// Field names are reported in lexicographic order.
#[derive(Clone, Debug)]
pub struct FieldMap {
    descriptor: &'static TypeDescriptor,
    fields: BTreeMap<String, Value>,
}

impl FieldMap {
    /// Create an empty record of the given type.
    pub fn new(descriptor: &'static TypeDescriptor) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Record for FieldMap {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    fn field_value(&self, name: &str) -> IntrospectionResult<Value> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| IntrospectionError::UnknownField {
                type_name: self.descriptor.name().to_string(),
                field: name.to_string(),
            })
    }
}

/// Implement [`Record`] for a struct from its descriptor and field list.
///
/// Each listed field must be `Clone` and convertible into a [`Value`].
///
/// ```
/// use verity_types::{impl_record, Record, TypeDescriptor, Value, OBJECT};
///
/// static PERSON: TypeDescriptor = TypeDescriptor::class("people.Person").extends(&OBJECT);
///
/// #[derive(Clone, Debug)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// impl_record!(Person, PERSON, { name, age });
///
/// let frodo = Person { name: "Frodo".into(), age: 33 };
/// assert_eq!(frodo.field_names(), vec!["name", "age"]);
/// assert_eq!(frodo.field_value("age").unwrap(), Value::Int(33));
/// assert!(frodo.field_value("height").is_err());
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty, $descriptor:expr, { $($field:ident),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn type_descriptor(&self) -> &'static $crate::TypeDescriptor {
                &$descriptor
            }

            fn field_names(&self) -> ::std::vec::Vec<&str> {
                ::std::vec![$(::std::stringify!($field)),*]
            }

            fn field_value(&self, name: &str) -> $crate::IntrospectionResult<$crate::Value> {
                match name {
                    $(::std::stringify!($field) => {
                        ::std::result::Result::Ok($crate::Value::from(self.$field.clone()))
                    })*
                    _ => ::std::result::Result::Err($crate::IntrospectionError::UnknownField {
                        type_name: $descriptor.name().to_string(),
                        field: name.to_string(),
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::OBJECT;

    static POINT: TypeDescriptor = TypeDescriptor::class("test.Point").extends(&OBJECT);
    static OTHER_POINT: TypeDescriptor = TypeDescriptor::class("test.OtherPoint").extends(&OBJECT);

    #[derive(Clone, Debug)]
    struct Point {
        x: i64,
        y: i64,
        label: Option<String>,
    }

    crate::impl_record!(Point, POINT, { x, y, label });

    #[test]
    fn generated_accessors() {
        let p = Point { x: 1, y: 2, label: None };
        assert_eq!(p.type_descriptor(), &POINT);
        assert_eq!(p.field_names(), vec!["x", "y", "label"]);
        assert_eq!(p.field_value("y").unwrap(), Value::Int(2));
        assert!(p.field_value("label").unwrap().is_null());
    }

    #[test]
    fn unknown_field_is_an_introspection_error() {
        let p = Point { x: 1, y: 2, label: None };
        let err = p.field_value("z").unwrap_err();
        assert_eq!(
            err,
            IntrospectionError::UnknownField {
                type_name: "test.Point".into(),
                field: "z".into(),
            }
        );
        assert_eq!(err.field(), "z");
    }

    #[test]
    fn structural_eq_compares_every_field() {
        let a = Point { x: 1, y: 2, label: Some("a".into()) };
        let b = Point { x: 1, y: 2, label: Some("a".into()) };
        let c = Point { x: 1, y: 2, label: Some("c".into()) };
        assert!(a.structural_eq(&b));
        assert!(!a.structural_eq(&c));
    }

    #[test]
    fn structural_eq_requires_same_type() {
        let a = FieldMap::new(&POINT).with("x", 1);
        let b = FieldMap::new(&OTHER_POINT).with("x", 1);
        assert!(!a.structural_eq(&b));
        assert!(!Value::record(a).structural_eq(&Value::record(b)));
    }

    #[test]
    fn structural_eq_requires_same_field_names() {
        let small = FieldMap::new(&POINT).with("x", 1);
        let big = FieldMap::new(&POINT).with("x", 1).with("y", 2);
        assert!(!small.structural_eq(&big));
        assert!(!big.structural_eq(&small));
        assert_ne!(Value::record(small.clone()), Value::record(big.clone()));
        assert_ne!(Value::record(big), Value::record(small));

        let reordered = FieldMap::new(&POINT).with("y", 2).with("x", 1);
        let same = FieldMap::new(&POINT).with("x", 1).with("y", 2);
        assert!(reordered.structural_eq(&same) && same.structural_eq(&reordered));
    }

    #[test]
    fn field_map_accessors() {
        let mut m = FieldMap::new(&POINT).with("y", 2).with("x", 1);
        assert_eq!(m.field_names(), vec!["x", "y"]);
        assert_eq!(m.insert("x", 5), Some(Value::Int(1)));
        assert_eq!(m.len(), 2);
        assert!(m.field_value("missing").is_err());
    }
}
