//! Multiset differences between two sequences under an equality policy.
//!
//! Matching is duplicate-aware: each element of one sequence can satisfy at
//! most one equal element of the other. `[1, 1]` against `[1]` leaves one
//! `1` unexpected.

use tracing::{debug, trace};
use verity_policy::EqualityPolicy;
use verity_types::Value;

use crate::error::DiffResult;

/// The elements two sequences do not have in common.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceDiff {
    missing: Vec<Value>,
    unexpected: Vec<Value>,
}

impl SequenceDiff {
    /// Elements of the expected sequence not matched in the actual one, in
    /// expected order.
    pub fn missing(&self) -> &[Value] {
        &self.missing
    }

    /// Elements of the actual sequence not matched in the expected one, in
    /// actual order.
    pub fn unexpected(&self) -> &[Value] {
        &self.unexpected
    }

    pub fn has_differences(&self) -> bool {
        !self.missing.is_empty() || !self.unexpected.is_empty()
    }

    /// Split into `(missing, unexpected)`.
    pub fn into_parts(self) -> (Vec<Value>, Vec<Value>) {
        (self.missing, self.unexpected)
    }
}

/// Two elements at the same index that are not equal.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementMismatch {
    pub index: usize,
    pub actual: Value,
    pub expected: Value,
}

/// Sequence algorithms parameterized by an [`EqualityPolicy`].
///
/// The policy is always asked `equals(actual_element, expected_element)`,
/// so asymmetric policies see their operands in a stable role.
#[derive(Clone, Copy)]
pub struct SequenceDiffer<'p> {
    policy: &'p dyn EqualityPolicy,
}

impl<'p> SequenceDiffer<'p> {
    pub fn new(policy: &'p dyn EqualityPolicy) -> Self {
        Self { policy }
    }

    /// Compute the elements `expected` has that `actual` lacks, and the
    /// reverse. Neither input is modified.
    pub fn diff(&self, actual: &[Value], expected: &[Value]) -> DiffResult<SequenceDiff> {
        let missing = self.unmatched(expected, actual, Role::Expected)?;
        let unexpected = self.unmatched(actual, expected, Role::Actual)?;
        debug!(
            actual = actual.len(),
            expected = expected.len(),
            missing = missing.len(),
            unexpected = unexpected.len(),
            policy = %self.policy.describe(),
            "diffed sequences"
        );
        Ok(SequenceDiff {
            missing,
            unexpected,
        })
    }

    /// Elements of `wanted` left over after each one removes one equal
    /// element from a working copy of `pool`.
    fn unmatched(&self, wanted: &[Value], pool: &[Value], role: Role) -> DiffResult<Vec<Value>> {
        let mut working: Vec<&Value> = pool.iter().collect();
        let mut leftover = Vec::new();
        for w in wanted {
            let mut matched = None;
            for (i, candidate) in working.iter().enumerate() {
                let equal = match role {
                    Role::Expected => self.policy.equals(candidate, w)?,
                    Role::Actual => self.policy.equals(w, candidate)?,
                };
                if equal {
                    matched = Some(i);
                    break;
                }
            }
            match matched {
                Some(i) => {
                    working.remove(i);
                }
                None => {
                    trace!(element = ?w, "unmatched element");
                    leftover.push(w.clone());
                }
            }
        }
        Ok(leftover)
    }

    /// Elements occurring more than once, each reported once as its first
    /// occurrence, in order of first repetition.
    pub fn duplicates_from(&self, sequence: &[Value]) -> DiffResult<Vec<Value>> {
        let mut seen_once: Vec<&Value> = Vec::new();
        let mut duplicates: Vec<&Value> = Vec::new();
        for element in sequence {
            if self.position_in(&duplicates, element)?.is_some() {
                continue;
            }
            match self.position_in(&seen_once, element)? {
                Some(i) => duplicates.push(seen_once.remove(i)),
                None => seen_once.push(element),
            }
        }
        Ok(duplicates.into_iter().cloned().collect())
    }

    fn position_in(&self, elements: &[&Value], value: &Value) -> DiffResult<Option<usize>> {
        for (i, element) in elements.iter().enumerate() {
            if self.policy.equals(element, value)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Returns `true` if some element of `sequence` equals `value`.
    pub fn contains(&self, sequence: &[Value], value: &Value) -> DiffResult<bool> {
        for element in sequence {
            if self.policy.equals(element, value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Remove and return the first element equal to `value`.
    pub fn remove_first(
        &self,
        sequence: &mut Vec<Value>,
        value: &Value,
    ) -> DiffResult<Option<Value>> {
        for i in 0..sequence.len() {
            if self.policy.equals(&sequence[i], value)? {
                return Ok(Some(sequence.remove(i)));
            }
        }
        Ok(None)
    }

    /// Remove every element equal to `value`, returning how many were
    /// removed. On error the sequence is left unchanged.
    pub fn remove_all(&self, sequence: &mut Vec<Value>, value: &Value) -> DiffResult<usize> {
        let mut keep = Vec::with_capacity(sequence.len());
        for element in sequence.iter() {
            keep.push(!self.policy.equals(element, value)?);
        }
        let before = sequence.len();
        let mut flags = keep.into_iter();
        sequence.retain(|_| flags.next().unwrap_or(true));
        Ok(before - sequence.len())
    }

    /// Positions, within the common prefix, where the elements differ.
    pub fn index_mismatches(
        &self,
        actual: &[Value],
        expected: &[Value],
    ) -> DiffResult<Vec<ElementMismatch>> {
        let mut mismatches = Vec::new();
        for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
            if !self.policy.equals(a, e)? {
                mismatches.push(ElementMismatch {
                    index,
                    actual: a.clone(),
                    expected: e.clone(),
                });
            }
        }
        Ok(mismatches)
    }
}

#[derive(Clone, Copy)]
enum Role {
    /// The wanted elements come from the expected sequence.
    Expected,
    /// The wanted elements come from the actual sequence.
    Actual,
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;
    use std::sync::Arc;

    use super::*;
    use crate::error::DiffError;
    use proptest::prelude::*;
    use verity_policy::{
        ComparatorPolicy, DescribedComparator, FieldSelectivePolicy, PolicyError, StandardPolicy,
    };
    use verity_types::{FieldMap, TypeDescriptor, OBJECT};

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    fn standard() -> SequenceDiffer<'static> {
        SequenceDiffer::new(&StandardPolicy)
    }

    #[test]
    fn identical_sequences_have_no_differences() {
        let diff = standard().diff(&ints(&[1, 2, 3]), &ints(&[3, 2, 1])).unwrap();
        assert!(!diff.has_differences());
    }

    #[test]
    fn extra_duplicate_is_unexpected() {
        let diff = standard().diff(&ints(&[1, 1]), &ints(&[1])).unwrap();
        assert_eq!(diff.unexpected(), ints(&[1]).as_slice());
        assert!(diff.missing().is_empty());
    }

    #[test]
    fn missing_duplicate_is_missing() {
        let diff = standard().diff(&ints(&[2]), &ints(&[2, 2, 3])).unwrap();
        assert_eq!(diff.missing(), ints(&[2, 3]).as_slice());
        assert!(diff.unexpected().is_empty());
    }

    #[test]
    fn empty_inputs() {
        let expected = ints(&[1, 2]);
        let diff = standard().diff(&[], &expected).unwrap();
        assert_eq!(diff.missing(), expected.as_slice());
        assert!(diff.unexpected().is_empty());

        let diff = standard().diff(&expected, &[]).unwrap();
        assert!(diff.missing().is_empty());
        assert_eq!(diff.unexpected(), expected.as_slice());
    }

    #[test]
    fn policy_governs_matching() {
        let policy = ComparatorPolicy::new(DescribedComparator::new(
            "case-insensitive",
            |a: &Value, b: &Value| {
                let lower = |v: &Value| v.as_text().map(str::to_lowercase);
                lower(a).cmp(&lower(b))
            },
        ));
        let differ = SequenceDiffer::new(&policy);
        let actual = vec![Value::from("Frodo"), Value::from("SAM")];
        let expected = vec![Value::from("sam"), Value::from("frodo")];
        assert!(!differ.diff(&actual, &expected).unwrap().has_differences());
    }

    #[test]
    fn policy_sees_actual_on_the_left() {
        static HOBBIT: TypeDescriptor = TypeDescriptor::class("shire.Hobbit").extends(&OBJECT);
        static BAGGINS: TypeDescriptor = TypeDescriptor::class("shire.Baggins").extends(&HOBBIT);
        let policy = FieldSelectivePolicy::on_fields(["name"]).unwrap();
        let differ = SequenceDiffer::new(&policy);

        // Right operand must be an instance of the left one's type.
        let hobbit = Value::record(FieldMap::new(&HOBBIT).with("name", "Bilbo"));
        let baggins = Value::record(FieldMap::new(&BAGGINS).with("name", "Bilbo"));
        let diff = differ.diff(&[hobbit.clone()], &[baggins.clone()]).unwrap();
        assert!(!diff.has_differences());
        let diff = differ.diff(&[baggins], &[hobbit]).unwrap();
        assert!(diff.has_differences());
    }

    #[test]
    fn records_with_extra_fields_differ() {
        static HOBBIT: TypeDescriptor = TypeDescriptor::class("shire.Hobbit").extends(&OBJECT);
        let sam = Value::record(FieldMap::new(&HOBBIT).with("name", "Sam"));
        let gardener = Value::record(
            FieldMap::new(&HOBBIT)
                .with("name", "Sam")
                .with("trade", "gardener"),
        );
        let diff = standard().diff(&[sam.clone()], &[gardener.clone()]).unwrap();
        assert_eq!(diff.missing(), &[gardener.clone()]);
        assert_eq!(diff.unexpected(), &[sam.clone()]);
        assert!(standard().diff(&[gardener], &[sam]).unwrap().has_differences());
    }

    #[test]
    fn policy_errors_propagate() {
        let policy = FieldSelectivePolicy::on_fields(["height"]).unwrap();
        static HOBBIT: TypeDescriptor = TypeDescriptor::class("shire.Hobbit").extends(&OBJECT);
        let frodo = Value::record(FieldMap::new(&HOBBIT).with("name", "Frodo"));
        let err = SequenceDiffer::new(&policy)
            .diff(&[frodo.clone()], &[frodo])
            .unwrap_err();
        assert!(matches!(err, DiffError::Policy(PolicyError::Introspection(_))));
    }

    #[test]
    fn duplicates() {
        let d = standard();
        assert!(d.duplicates_from(&[]).unwrap().is_empty());
        assert!(d.duplicates_from(&ints(&[1, 2, 3])).unwrap().is_empty());
        assert_eq!(d.duplicates_from(&ints(&[1, 2, 2, 3, 3, 3])).unwrap(), ints(&[2, 3]));
        assert_eq!(d.duplicates_from(&ints(&[3, 1, 3, 1, 3])).unwrap(), ints(&[3, 1]));
    }

    #[test]
    fn duplicates_keep_first_seen_element() {
        let policy = ComparatorPolicy::new(|a: &Value, b: &Value| {
            let lower = |v: &Value| v.as_text().map(str::to_lowercase);
            lower(a).cmp(&lower(b))
        });
        let seq = vec![Value::from("Ring"), Value::from("RING"), Value::from("ring")];
        let dups = SequenceDiffer::new(&policy).duplicates_from(&seq).unwrap();
        assert_eq!(dups, vec![Value::from("Ring")]);
    }

    #[test]
    fn contains_and_removal() {
        let d = standard();
        let mut seq = ints(&[1, 2, 1, 3, 1]);
        assert!(d.contains(&seq, &Value::Int(3)).unwrap());
        assert!(!d.contains(&seq, &Value::Int(4)).unwrap());

        assert_eq!(d.remove_first(&mut seq, &Value::Int(1)).unwrap(), Some(Value::Int(1)));
        assert_eq!(seq, ints(&[2, 1, 3, 1]));
        assert_eq!(d.remove_all(&mut seq, &Value::Int(1)).unwrap(), 2);
        assert_eq!(seq, ints(&[2, 3]));
        assert_eq!(d.remove_first(&mut seq, &Value::Int(9)).unwrap(), None);
    }

    #[test]
    fn index_mismatches_cover_common_prefix() {
        let mismatches = standard()
            .index_mismatches(&ints(&[1, 5, 3, 7]), &ints(&[1, 2, 3]))
            .unwrap();
        assert_eq!(
            mismatches,
            vec![ElementMismatch {
                index: 1,
                actual: Value::Int(5),
                expected: Value::Int(2),
            }]
        );
    }

    #[test]
    fn nulls_match_nulls() {
        let diff = standard()
            .diff(&[Value::Null, Value::Int(1)], &[Value::Int(1), Value::Null])
            .unwrap();
        assert!(!diff.has_differences());
    }

    #[test]
    fn shared_policy_works_through_arc() {
        let policy: Arc<dyn EqualityPolicy> = Arc::new(ComparatorPolicy::new(
            |a: &Value, b: &Value| a.natural_cmp(b).unwrap_or(Ordering::Less),
        ));
        let diff = SequenceDiffer::new(policy.as_ref())
            .diff(&ints(&[1, 2]), &ints(&[2, 3]))
            .unwrap();
        assert_eq!(diff.into_parts(), (ints(&[3]), ints(&[1])));
    }

    fn small_ints() -> impl Strategy<Value = Vec<i64>> {
        proptest::collection::vec(0i64..5, 0..12)
    }

    fn multiset(values: &[i64]) -> Vec<i64> {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        sorted
    }

    proptest! {
        #[test]
        fn self_diff_is_empty(a in small_ints()) {
            let a = ints(&a);
            prop_assert!(!standard().diff(&a, &a).unwrap().has_differences());
        }

        #[test]
        fn empty_diff_iff_same_multiset(a in small_ints(), b in small_ints()) {
            let diff = standard().diff(&ints(&a), &ints(&b)).unwrap();
            prop_assert_eq!(!diff.has_differences(), multiset(&a) == multiset(&b));
        }

        #[test]
        fn diff_is_symmetric(a in small_ints(), b in small_ints()) {
            let (a, b) = (ints(&a), ints(&b));
            let forward = standard().diff(&a, &b).unwrap();
            let backward = standard().diff(&b, &a).unwrap();
            prop_assert_eq!(forward.missing(), backward.unexpected());
            prop_assert_eq!(forward.unexpected(), backward.missing());
        }
    }
}
