//! The dynamic value model.
//!
//! [`Value`] is what every equality policy compares. Scalars, byte strings
//! and lists are built in; structured values are [`Record`]s exposing their
//! fields through the field-accessor capability.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::descriptor::{TypeDescriptor, BOOL, BYTES, FLOAT, INT, LIST, TEXT};
use crate::record::Record;

/// A dynamically typed value.
///
/// `Null` is the absent value. Every other variant has a runtime type,
/// reported by [`Value::type_descriptor`].
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Record(Arc<dyn Record>),
}

impl Value {
    /// Wrap a record.
    pub fn record<R: Record + 'static>(record: R) -> Self {
        Self::Record(Arc::new(record))
    }

    /// Build a list from anything convertible into values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The runtime type of this value, or `None` for `Null`.
    pub fn type_descriptor(&self) -> Option<&'static TypeDescriptor> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(&BOOL),
            Self::Int(_) => Some(&INT),
            Self::Float(_) => Some(&FLOAT),
            Self::Text(_) => Some(&TEXT),
            Self::Bytes(_) => Some(&BYTES),
            Self::List(_) => Some(&LIST),
            Self::Record(r) => Some(r.type_descriptor()),
        }
    }

    /// The runtime type name, `"null"` for `Null`.
    pub fn type_name(&self) -> &'static str {
        self.type_descriptor().map_or("null", TypeDescriptor::name)
    }

    /// Returns `true` if this value's runtime type is a subtype of `ty`.
    /// `Null` is an instance of nothing.
    pub fn is_instance_of(&self, ty: &TypeDescriptor) -> bool {
        self.type_descriptor().is_some_and(|t| t.is_subtype_of(ty))
    }

    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&dyn Record> {
        match self {
            Self::Record(r) => Some(r.as_ref()),
            _ => None,
        }
    }

    /// Deep value equality.
    ///
    /// Values of different runtime types are never equal (`Int(1)` is not
    /// `Float(1.0)`). Floats are equal when their bit patterns match, and all
    /// NaNs are equal to each other, so equality is reflexive for every value.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
            }
            (Self::Record(a), Self::Record(b)) => {
                Arc::ptr_eq(a, b) || a.structural_eq(b.as_ref())
            }
            _ => false,
        }
    }

    /// The natural order between two values, if one exists.
    ///
    /// Defined for two values of the same built-in kind, element-wise for
    /// lists, and by [`Record::natural_cmp`] for records. Consistent with
    /// [`Value::structural_eq`]: `Some(Equal)` iff structurally equal.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Some(float_cmp(*a, *b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) => Some(a.cmp(b)),
            (Self::List(a), Self::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.natural_cmp(y)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Self::Record(a), Self::Record(b)) => a.natural_cmp(b.as_ref()),
            _ => None,
        }
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

fn float_cmp(a: f64, b: f64) -> Ordering {
    if a.is_nan() && b.is_nan() {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Arc<dyn Record>> for Value {
    fn from(v: Arc<dyn Record>) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
