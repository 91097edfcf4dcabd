//! The [`EqualityPolicy`] capability and its two ordering-capable variants.
//!
//! A policy decides, at call time, what "equal" and "ordered" mean for two
//! values. Implementors provide the type-specific logic for two present
//! values; the provided methods apply the null rules first:
//!
//! - two nulls are equal, and compare as `Equal`;
//! - a null and a non-null value are unequal, and cannot be ordered;
//! - policies that define equality only fail every ordering request with
//!   [`PolicyError::OrderingUnsupported`], nulls included.
//!
//! Policies are stateless values: build once, share behind an `Arc`, reuse.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use verity_types::Value;

use crate::comparator::Comparator;
use crate::error::{PolicyError, PolicyResult};

/// A pluggable definition of equality and order.
pub trait EqualityPolicy: Send + Sync {
    /// Equality of two non-null values.
    fn equals_present(&self, left: &Value, right: &Value) -> PolicyResult<bool>;

    /// Order of two non-null values.
    ///
    /// The default reports [`PolicyError::OrderingUnsupported`].
    fn compare_present(&self, _left: &Value, _right: &Value) -> PolicyResult<Ordering> {
        Err(PolicyError::OrderingUnsupported {
            policy: self.describe(),
        })
    }

    /// Whether this policy defines an ordering at all.
    fn supports_ordering(&self) -> bool {
        true
    }

    /// A short description used in diagnostics.
    fn describe(&self) -> String;

    /// Returns `true` only for plain structural equality.
    fn is_standard(&self) -> bool {
        false
    }

    /// Equality under this policy.
    fn equals(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        match (left.is_null(), right.is_null()) {
            (true, true) => Ok(true),
            (true, false) | (false, true) => Ok(false),
            (false, false) => self.equals_present(left, right),
        }
    }

    /// Order under this policy.
    ///
    /// Consistent with [`equals`](Self::equals): `Equal` iff equal, whenever
    /// both are defined.
    fn compare(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        if !self.supports_ordering() {
            return Err(PolicyError::OrderingUnsupported {
                policy: self.describe(),
            });
        }
        match (left.is_null(), right.is_null()) {
            (true, true) => Ok(Ordering::Equal),
            (true, false) | (false, true) => Err(PolicyError::NullOrdering),
            (false, false) => self.compare_present(left, right),
        }
    }

    fn is_less_than(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        Ok(self.compare(left, right)? == Ordering::Less)
    }

    fn is_less_than_or_equal_to(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        Ok(self.compare(left, right)? != Ordering::Greater)
    }

    fn is_greater_than(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        Ok(self.compare(left, right)? == Ordering::Greater)
    }

    fn is_greater_than_or_equal_to(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        Ok(self.compare(left, right)? != Ordering::Less)
    }

    /// Whether `string` begins with text equal to `prefix` under this
    /// policy.
    fn string_starts_with(&self, string: &str, prefix: &str) -> PolicyResult<bool> {
        match char_windows(string, prefix.chars().count()).first() {
            Some(head) => self.equals(&Value::from(*head), &Value::from(prefix)),
            None => Ok(false),
        }
    }

    /// Whether `string` ends with text equal to `suffix` under this policy.
    fn string_ends_with(&self, string: &str, suffix: &str) -> PolicyResult<bool> {
        match char_windows(string, suffix.chars().count()).last() {
            Some(tail) => self.equals(&Value::from(*tail), &Value::from(suffix)),
            None => Ok(false),
        }
    }

    /// Whether some run of `string` is equal to `sequence` under this
    /// policy.
    fn string_contains(&self, string: &str, sequence: &str) -> PolicyResult<bool> {
        let sequence_value = Value::from(sequence);
        for window in char_windows(string, sequence.chars().count()) {
            if self.equals(&Value::from(window), &sequence_value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Every run of `n` consecutive chars in `s`, left to right.
fn char_windows(s: &str, n: usize) -> Vec<&str> {
    let bounds: Vec<usize> = s
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .collect();
    bounds
        .iter()
        .zip(bounds.iter().skip(n))
        .map(|(&start, &end)| &s[start..end])
        .collect()
}

// ---------------------------------------------------------------------
// Structural
// ---------------------------------------------------------------------

/// Each value's own definition of equality and, where it has one, its
/// natural order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardPolicy;

impl StandardPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl EqualityPolicy for StandardPolicy {
    fn equals_present(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        Ok(left.structural_eq(right))
    }

    fn compare_present(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        left.natural_cmp(right).ok_or_else(|| PolicyError::NotComparable {
            left: left.type_name().to_string(),
            right: right.type_name().to_string(),
        })
    }

    fn describe(&self) -> String {
        String::from("standard structural equality")
    }

    fn is_standard(&self) -> bool {
        true
    }

    fn string_starts_with(&self, string: &str, prefix: &str) -> PolicyResult<bool> {
        Ok(string.starts_with(prefix))
    }

    fn string_ends_with(&self, string: &str, suffix: &str) -> PolicyResult<bool> {
        Ok(string.ends_with(suffix))
    }

    fn string_contains(&self, string: &str, sequence: &str) -> PolicyResult<bool> {
        Ok(string.contains(sequence))
    }
}

// ---------------------------------------------------------------------
// Comparator-based
// ---------------------------------------------------------------------

/// Equality and order defined by a caller-supplied [`Comparator`]: two
/// values are equal iff the comparator orders them `Equal`.
#[derive(Clone)]
pub struct ComparatorPolicy {
    comparator: Arc<dyn Comparator>,
}

impl ComparatorPolicy {
    pub fn new<C: Comparator + 'static>(comparator: C) -> Self {
        Self {
            comparator: Arc::new(comparator),
        }
    }

    /// Wrap an already shared comparator.
    pub fn from_shared(comparator: Arc<dyn Comparator>) -> Self {
        Self { comparator }
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }
}

impl EqualityPolicy for ComparatorPolicy {
    fn equals_present(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        Ok(self.comparator.compare(left, right)? == Ordering::Equal)
    }

    fn compare_present(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        self.comparator.compare(left, right)
    }

    fn describe(&self) -> String {
        format!("comparator-based policy using {}", self.comparator.describe())
    }
}

impl fmt::Debug for ComparatorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorPolicy")
            .field("comparator", &self.comparator.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{DescribedComparator, FloatComparator};
    use proptest::prelude::*;

    fn case_insensitive() -> ComparatorPolicy {
        ComparatorPolicy::new(DescribedComparator::new(
            "case-insensitive",
            |a: &Value, b: &Value| match (a.as_text(), b.as_text()) {
                (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
                _ => a.type_name().cmp(&b.type_name()),
            },
        ))
    }

    #[test]
    fn nulls_are_handled_before_delegation() {
        let policies: Vec<Box<dyn EqualityPolicy>> =
            vec![Box::new(StandardPolicy), Box::new(case_insensitive())];
        for policy in &policies {
            assert!(policy.equals(&Value::Null, &Value::Null).unwrap());
            assert!(!policy.equals(&Value::Null, &Value::from("a")).unwrap());
            assert!(!policy.equals(&Value::from("a"), &Value::Null).unwrap());
            assert_eq!(policy.compare(&Value::Null, &Value::Null).unwrap(), Ordering::Equal);
            assert!(matches!(
                policy.compare(&Value::Null, &Value::from("a")),
                Err(PolicyError::NullOrdering)
            ));
        }
    }

    #[test]
    fn standard_policy_uses_structural_equality() {
        let p = StandardPolicy;
        assert!(p.equals(&Value::list([1, 2]), &Value::list([1, 2])).unwrap());
        assert!(!p.equals(&Value::Int(1), &Value::Float(1.0)).unwrap());
        assert!(p.is_standard());
    }

    #[test]
    fn standard_policy_orders_naturally() {
        let p = StandardPolicy;
        assert!(p.is_less_than(&Value::Int(1), &Value::Int(2)).unwrap());
        assert!(p.is_greater_than_or_equal_to(&Value::from("b"), &Value::from("b")).unwrap());
        assert!(p.is_less_than_or_equal_to(&Value::from("a"), &Value::from("b")).unwrap());
        assert!(!p.is_greater_than(&Value::from("a"), &Value::from("b")).unwrap());
    }

    #[test]
    fn standard_policy_rejects_mixed_ordering() {
        let err = StandardPolicy
            .compare(&Value::Int(1), &Value::from("1"))
            .unwrap_err();
        assert!(matches!(err, PolicyError::NotComparable { .. }));
    }

    #[test]
    fn comparator_policy_equality_is_zero_ordering() {
        let p = case_insensitive();
        assert!(p.equals(&Value::from("Frodo"), &Value::from("FRODO")).unwrap());
        assert!(!p.equals(&Value::from("Frodo"), &Value::from("Sam")).unwrap());
        assert!(p.is_less_than(&Value::from("frodo"), &Value::from("SAM")).unwrap());
        assert!(!p.is_standard());
    }

    #[test]
    fn comparator_policy_propagates_comparator_errors() {
        let p = ComparatorPolicy::new(FloatComparator::default());
        assert!(p.equals(&Value::from("x"), &Value::Float(1.0)).is_err());
    }

    #[test]
    fn string_checks_follow_the_policy() {
        let p = case_insensitive();
        assert!(p.string_starts_with("Frodo Baggins", "FRODO").unwrap());
        assert!(p.string_ends_with("Frodo Baggins", "baggins").unwrap());
        assert!(p.string_contains("Frodo Baggins", "O B").unwrap());
        assert!(p.string_starts_with("\u{c9}owyn", "\u{e9}").unwrap());
        assert!(!p.string_contains("Frodo", "Sam").unwrap());

        let s = StandardPolicy;
        assert!(!s.string_starts_with("Frodo Baggins", "FRODO").unwrap());
        assert!(s.string_ends_with("Frodo Baggins", "Baggins").unwrap());
        assert!(s.string_contains("Frodo Baggins", "o B").unwrap());
    }

    #[test]
    fn string_checks_edge_cases() {
        let p = case_insensitive();
        assert!(p.string_starts_with("abc", "").unwrap());
        assert!(p.string_ends_with("", "").unwrap());
        assert!(p.string_contains("", "").unwrap());
        assert!(!p.string_starts_with("ab", "abc").unwrap());
        assert!(!p.string_ends_with("ab", "abc").unwrap());
        assert!(!p.string_contains("ab", "abc").unwrap());
    }

    fn natural_text() -> ComparatorPolicy {
        ComparatorPolicy::new(|a: &Value, b: &Value| a.as_text().cmp(&b.as_text()))
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Int),
            any::<f64>().prop_map(Value::Float),
            "[a-c]{0,3}".prop_map(Value::Text),
        ]
    }

    proptest! {
        #[test]
        fn equality_is_reflexive(v in scalar()) {
            prop_assert!(StandardPolicy.equals(&v, &v).unwrap());
            prop_assert!(case_insensitive().equals(&v, &v).unwrap());
        }

        #[test]
        fn comparator_string_checks_match_str(string in "[ab]{0,5}", part in "[ab]{0,3}") {
            let p = natural_text();
            prop_assert_eq!(
                p.string_starts_with(&string, &part).unwrap(),
                string.starts_with(&part)
            );
            prop_assert_eq!(p.string_ends_with(&string, &part).unwrap(), string.ends_with(&part));
            prop_assert_eq!(p.string_contains(&string, &part).unwrap(), string.contains(&part));
        }

        #[test]
        fn equals_agrees_with_compare(a in scalar(), b in scalar()) {
            let p = StandardPolicy;
            if let Ok(ordering) = p.compare(&a, &b) {
                prop_assert_eq!(ordering == Ordering::Equal, p.equals(&a, &b).unwrap());
            }
        }
    }

    #[test]
    fn describe_names_the_comparator() {
        assert_eq!(
            case_insensitive().describe(),
            "comparator-based policy using case-insensitive"
        );
        assert_eq!(StandardPolicy.describe(), "standard structural equality");
    }
}
