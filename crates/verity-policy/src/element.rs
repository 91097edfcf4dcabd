//! Element-wise comparison of lists.

use std::sync::Arc;

use verity_types::Value;

use crate::comparator::Comparator;
use crate::error::PolicyResult;
use crate::policy::{ComparatorPolicy, EqualityPolicy};

/// Compares two lists element by element under a per-element policy.
///
/// Lists of different lengths are unequal without inspecting any element.
/// Values that are not both lists are compared structurally. This policy
/// defines equality only.
#[derive(Clone)]
pub struct ElementWisePolicy {
    element: Arc<dyn EqualityPolicy>,
}

impl ElementWisePolicy {
    pub fn new(element: Arc<dyn EqualityPolicy>) -> Self {
        Self { element }
    }

    /// Compare elements with a caller-supplied ordering.
    pub fn with_comparator<C: Comparator + 'static>(comparator: C) -> Self {
        Self::new(Arc::new(ComparatorPolicy::new(comparator)))
    }

    pub fn element_policy(&self) -> &Arc<dyn EqualityPolicy> {
        &self.element
    }
}

impl EqualityPolicy for ElementWisePolicy {
    fn equals_present(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        let (Some(a), Some(b)) = (left.as_list(), right.as_list()) else {
            return Ok(left.structural_eq(right));
        };
        if a.len() != b.len() {
            return Ok(false);
        }
        for (x, y) in a.iter().zip(b) {
            if !self.element.equals(x, y)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn supports_ordering(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("element-wise comparison using {}", self.element.describe())
    }
}

impl std::fmt::Debug for ElementWisePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementWisePolicy")
            .field("element", &self.element.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;
    use crate::comparator::{Comparator, FloatComparator};
    use crate::error::PolicyError;
    use crate::policy::StandardPolicy;

    struct Panicking;

    impl Comparator for Panicking {
        fn compare(&self, _: &Value, _: &Value) -> PolicyResult<Ordering> {
            panic!("elements must not be inspected");
        }
    }

    #[test]
    fn compares_elements_with_element_policy() {
        let p = ElementWisePolicy::with_comparator(FloatComparator::new(0.01).unwrap());
        assert!(p.equals(&Value::list([1.0, 2.0]), &Value::list([1.001, 2.0])).unwrap());
        assert!(!p.equals(&Value::list([1.0, 2.0]), &Value::list([1.0, 2.5])).unwrap());
    }

    #[test]
    fn unequal_lengths_skip_elements() {
        let p = ElementWisePolicy::with_comparator(Panicking);
        assert!(!p.equals(&Value::list([1, 2]), &Value::list([1])).unwrap());
    }

    #[test]
    fn null_elements_follow_null_rules() {
        let p = ElementWisePolicy::new(Arc::new(StandardPolicy));
        let a = Value::List(vec![Value::Null, Value::Int(1)]);
        let b = Value::List(vec![Value::Null, Value::Int(1)]);
        let c = Value::List(vec![Value::Int(0), Value::Int(1)]);
        assert!(p.equals(&a, &b).unwrap());
        assert!(!p.equals(&a, &c).unwrap());
    }

    #[test]
    fn non_lists_compare_structurally() {
        let p = ElementWisePolicy::new(Arc::new(StandardPolicy));
        assert!(p.equals(&Value::from("a"), &Value::from("a")).unwrap());
        assert!(!p.equals(&Value::list(["a"]), &Value::from("a")).unwrap());
    }

    #[test]
    fn element_wise_policy_has_no_ordering() {
        let p = ElementWisePolicy::new(Arc::new(StandardPolicy));
        assert!(matches!(
            p.compare(&Value::list([1]), &Value::list([1])),
            Err(PolicyError::OrderingUnsupported { .. })
        ));
        assert_eq!(
            p.describe(),
            "element-wise comparison using standard structural equality"
        );
    }
}
