//! Policies that consult a [`TypeComparatorRegistry`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use verity_types::Value;

use crate::comparator::Comparator;
use crate::error::PolicyResult;
use crate::policy::{EqualityPolicy, StandardPolicy};
use crate::registry::TypeComparatorRegistry;

/// Uses the comparator registered for the left value's runtime type, and
/// a fallback policy when there is none.
///
/// A resolved comparator applies only when the right value is an instance
/// of the type it was registered for, so a `FLOAT` comparator is never
/// handed a text value.
#[derive(Clone)]
pub struct TypeAwarePolicy {
    registry: Arc<TypeComparatorRegistry>,
    fallback: Arc<dyn EqualityPolicy>,
}

impl TypeAwarePolicy {
    /// Fall back to [`StandardPolicy`].
    pub fn new(registry: Arc<TypeComparatorRegistry>) -> Self {
        Self::with_fallback(registry, Arc::new(StandardPolicy))
    }

    pub fn with_fallback(
        registry: Arc<TypeComparatorRegistry>,
        fallback: Arc<dyn EqualityPolicy>,
    ) -> Self {
        Self { registry, fallback }
    }

    pub fn registry(&self) -> &Arc<TypeComparatorRegistry> {
        &self.registry
    }

    fn comparator_for(
        &self,
        left: &Value,
        right: &Value,
    ) -> PolicyResult<Option<Arc<dyn Comparator>>> {
        let Some(ty) = left.type_descriptor() else {
            return Ok(None);
        };
        Ok(self
            .registry
            .resolve(ty)?
            .filter(|resolved| right.is_instance_of(resolved.registered_for))
            .map(|resolved| resolved.comparator))
    }
}

impl EqualityPolicy for TypeAwarePolicy {
    fn equals_present(&self, left: &Value, right: &Value) -> PolicyResult<bool> {
        match self.comparator_for(left, right)? {
            Some(comparator) => Ok(comparator.compare(left, right)? == Ordering::Equal),
            None => self.fallback.equals(left, right),
        }
    }

    fn compare_present(&self, left: &Value, right: &Value) -> PolicyResult<Ordering> {
        match self.comparator_for(left, right)? {
            Some(comparator) => comparator.compare(left, right),
            None => self.fallback.compare(left, right),
        }
    }

    fn describe(&self) -> String {
        format!("type-aware policy falling back to {}", self.fallback.describe())
    }
}

impl fmt::Debug for TypeAwarePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeAwarePolicy")
            .field("registry", &self.registry)
            .field("fallback", &self.fallback.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{DescribedComparator, FloatComparator};
    use crate::error::PolicyError;
    use crate::field::FieldSelectivePolicy;
    use verity_types::{FieldMap, TypeDescriptor, FLOAT, OBJECT, TEXT};

    fn registry() -> Arc<TypeComparatorRegistry> {
        let registry = TypeComparatorRegistry::new();
        registry.register(&FLOAT, FloatComparator::new(0.01).unwrap()).unwrap();
        registry
            .register(
                &TEXT,
                DescribedComparator::new("case-insensitive", |a: &Value, b: &Value| {
                    let lower = |v: &Value| v.as_text().map(str::to_lowercase);
                    lower(a).cmp(&lower(b))
                }),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn registered_comparator_is_used() {
        let p = TypeAwarePolicy::new(registry());
        assert!(p.equals(&Value::Float(1.0), &Value::Float(1.005)).unwrap());
        assert!(p.equals(&Value::from("Gandalf"), &Value::from("GANDALF")).unwrap());
        assert_eq!(
            p.compare(&Value::Float(1.0), &Value::Float(2.0)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn falls_back_without_registration() {
        let p = TypeAwarePolicy::new(registry());
        assert!(p.equals(&Value::Int(1), &Value::Int(1)).unwrap());
        assert!(!p.equals(&Value::Int(1), &Value::Int(2)).unwrap());
    }

    #[test]
    fn comparator_skipped_for_incompatible_right_value() {
        let p = TypeAwarePolicy::new(registry());
        assert!(!p.equals(&Value::Float(1.0), &Value::from("1.0")).unwrap());
        assert!(matches!(
            p.compare(&Value::Float(1.0), &Value::from("1.0")),
            Err(PolicyError::NotComparable { .. })
        ));
    }

    #[test]
    fn fallback_policy_rules_apply() {
        static SHIP: TypeDescriptor = TypeDescriptor::class("sea.Ship").extends(&OBJECT);
        let ship = |name: &str, crew: i64| {
            Value::record(FieldMap::new(&SHIP).with("name", name).with("crew", crew))
        };
        let fallback = Arc::new(FieldSelectivePolicy::on_fields(["name"]).unwrap());
        let p = TypeAwarePolicy::with_fallback(registry(), fallback);
        assert!(p.equals(&ship("Pearl", 10), &ship("Pearl", 12)).unwrap());
        assert!(p.compare(&ship("Pearl", 10), &ship("Pearl", 12)).is_err());
    }

    #[test]
    fn nulls_handled_before_lookup() {
        let p = TypeAwarePolicy::new(registry());
        assert!(p.equals(&Value::Null, &Value::Null).unwrap());
        assert!(!p.equals(&Value::Float(1.0), &Value::Null).unwrap());
    }
}
