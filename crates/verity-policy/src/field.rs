//! Field-selective comparison of records.
//!
//! [`FieldSelectivePolicy`] is a one-level comparison: every selected field
//! is compared with plain structural equality, and a field that cannot be
//! read is reported as an error. [`FieldByFieldComparator`] is its
//! best-effort counterpart: per-field and per-type comparators take part,
//! and unreadable fields simply make the records unequal.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};
use verity_types::{Record, Value};

use crate::comparator::Comparator;
use crate::error::{PolicyError, PolicyResult};
use crate::policy::EqualityPolicy;
use crate::registry::TypeComparatorRegistry;

/// Which fields of a record take part in a comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every field the left record reports.
    All,
    /// Only the named fields.
    On(Vec<String>),
    /// Every field the left record reports except the named ones.
    Ignoring(Vec<String>),
}

impl FieldSelection {
    /// Select only the named fields.
    ///
    /// The list must be non-empty and every name non-blank.
    pub fn on<I, S>(fields: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = checked_names(fields)?;
        if fields.is_empty() {
            return Err(PolicyError::EmptyFieldList);
        }
        Ok(Self::On(fields))
    }

    /// Select every field except the named ones. An empty list selects
    /// every field.
    pub fn ignoring<I, S>(fields: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::Ignoring(checked_names(fields)?))
    }

    /// The field names to compare for a record.
    pub fn fields_of<'a>(&'a self, record: &'a dyn Record) -> Vec<&'a str> {
        match self {
            Self::All => record.field_names(),
            Self::On(fields) => fields.iter().map(String::as_str).collect(),
            Self::Ignoring(ignored) => record
                .field_names()
                .into_iter()
                .filter(|name| !ignored.iter().any(|i| i == name))
                .collect(),
        }
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all fields"),
            Self::On(fields) => write!(f, "fields [{}]", fields.join(", ")),
            Self::Ignoring(fields) => write!(f, "all fields except [{}]", fields.join(", ")),
        }
    }
}

fn checked_names<I, S>(fields: I) -> PolicyResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let name = name.into();
            if name.trim().is_empty() {
                Err(PolicyError::BlankFieldName { index })
            } else {
                Ok(name)
            }
        })
        .collect()
}

/// The records behind two values, if the right one is an instance of the
/// left one's runtime type.
fn compatible_records<'v>(
    left: &'v Value,
    right: &'v Value,
) -> Option<(&'v dyn Record, &'v dyn Record)> {
    let l = left.as_record()?;
    if !right.is_instance_of(l.type_descriptor()) {
        return None;
    }
    Some((l, right.as_record()?))
}

// ---------------------------------------------------------------------
// FieldSelectivePolicy
// ---------------------------------------------------------------------

/// Compares records by a selection of their fields.
///
/// Two records are equal iff the right one is an instance of the left one's
/// runtime type and every selected field is structurally equal. Values that
/// are not records are compared structurally. This policy defines equality
/// only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSelectivePolicy {
    selection: FieldSelection,
}

impl FieldSelectivePolicy {
    /// Compare only the named fields.
    pub fn on_fields<I, S>(fields: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            selection: FieldSelection::on(fields)?,
        })
    }

    /// Compare every field except the named ones.
    pub fn ignoring_fields<I, S>(fields: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            selection: FieldSelection::ignoring(fields)?,
        })
    }

    /// Compare every field.
    pub fn all_fields() -> Self {
        Self {
            selection: FieldSelection::All,
        }
    }

    pub fn selection(&self) -> &FieldSelection {
        &self.selection
    }
}

impl EqualityPolicy for FieldSelectivePolicy {
    fn equals_present(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        if left.as_record().is_none() {
            return Ok(left.structural_eq(right));
        }
        let Some((l, r)) = compatible_records(left, right) else {
            trace!(
                left = left.type_name(),
                right = right.type_name(),
                "incompatible runtime types"
            );
            return Ok(false);
        };
        for name in self.selection.fields_of(l) {
            let a = l.field_value(name)?;
            let b = r.field_value(name)?;
            if !a.structural_eq(&b) {
                trace!(field = name, "field differs");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn supports_ordering(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("field-by-field comparison on {}", self.selection)
    }
}

// ---------------------------------------------------------------------
// FieldByFieldComparator
// ---------------------------------------------------------------------

/// A comparator that reports whether two records are equal field by field.
///
/// Each selected field is compared with, in order of preference: the
/// comparator registered for that field name, the comparator the type
/// registry resolves for the field value's type, or structural equality.
/// The result is `Equal` or [`FieldByFieldComparator::NOT_EQUAL`]; this
/// comparator detects equality and does not define a meaningful order.
///
/// A field that cannot be read makes the records unequal; the failure is
/// logged, not returned.
#[derive(Clone)]
pub struct FieldByFieldComparator {
    selection: FieldSelection,
    field_comparators: BTreeMap<String, Arc<dyn Comparator>>,
    type_comparators: Option<Arc<TypeComparatorRegistry>>,
}

impl FieldByFieldComparator {
    /// Ordering reported for unequal values.
    pub const NOT_EQUAL: Ordering = Ordering::Less;

    /// Compare every field.
    pub fn new() -> Self {
        Self::with_selection(FieldSelection::All)
    }

    pub fn with_selection(selection: FieldSelection) -> Self {
        Self {
            selection,
            field_comparators: BTreeMap::new(),
            type_comparators: None,
        }
    }

    /// Compare only the named fields.
    pub fn on_fields<I, S>(fields: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::with_selection(FieldSelection::on(fields)?))
    }

    /// Compare every field except the named ones.
    pub fn ignoring_fields<I, S>(fields: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::with_selection(FieldSelection::ignoring(fields)?))
    }

    /// Use `comparator` for the field called `name`.
    pub fn with_field_comparator<C: Comparator + 'static>(
        mut self,
        name: impl Into<String>,
        comparator: C,
    ) -> Self {
        self.field_comparators.insert(name.into(), Arc::new(comparator));
        self
    }

    /// Resolve comparators for field values through `registry`.
    pub fn with_type_comparators(mut self, registry: Arc<TypeComparatorRegistry>) -> Self {
        self.type_comparators = Some(registry);
        self
    }

    pub fn selection(&self) -> &FieldSelection {
        &self.selection
    }

    fn are_equal(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        let (l, r) = match (left, right) {
            (Value::Record(_), _) => match compatible_records(left, right) {
                Some(records) => records,
                None => return Ok(false),
            },
            _ => return self.values_equal(left, right),
        };
        for name in self.selection.fields_of(l) {
            let a = l.field_value(name)?;
            let b = r.field_value(name)?;
            let equal = match self.field_comparators.get(name) {
                Some(comparator) => match (a.is_null(), b.is_null()) {
                    (true, true) => true,
                    (false, false) => comparator.compare(&a, &b)? == Ordering::Equal,
                    _ => false,
                },
                None => self.values_equal(&a, &b)?,
            };
            if !equal {
                trace!(field = name, "field differs");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn values_equal(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        if left.is_null() || right.is_null() {
            return Ok(left.is_null() && right.is_null());
        }
        if let (Some(registry), Some(ty)) = (&self.type_comparators, left.type_descriptor()) {
            if let Some(resolved) = registry.resolve(ty)? {
                if right.is_instance_of(resolved.registered_for) {
                    return Ok(resolved.comparator.compare(left, right)? == Ordering::Equal);
                }
            }
        }
        Ok(left.structural_eq(right))
    }
}

impl Default for FieldByFieldComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator for FieldByFieldComparator {
    fn compare(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        match self.are_equal(left, right) {
            Ok(true) => Ok(Ordering::Equal),
            Ok(false) => Ok(Self::NOT_EQUAL),
            Err(PolicyError::Introspection(e)) => {
                warn!(
                    field = e.field(),
                    error = %e,
                    "field could not be read, treating values as not equal"
                );
                Ok(Self::NOT_EQUAL)
            }
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        if self.field_comparators.is_empty() {
            format!("field-by-field comparator on {}", self.selection)
        } else {
            let names: Vec<&str> = self.field_comparators.keys().map(String::as_str).collect();
            format!(
                "field-by-field comparator on {} with comparators for [{}]",
                self.selection,
                names.join(", ")
            )
        }
    }
}

impl fmt::Debug for FieldByFieldComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldByFieldComparator")
            .field("selection", &self.selection)
            .field("field_comparators", &self.field_comparators.keys().collect::<Vec<_>>())
            .field("type_comparators", &self.type_comparators.is_some())
            .finish()
    }
}
