//! Comparators keyed by runtime type, with inheritance-aware lookup.
//!
//! [`TypeComparatorRegistry`] stores one comparator per [`TypeDescriptor`]
//! in a `HashMap` behind a `RwLock`. Registration is expected during setup;
//! lookups may then run concurrently from any number of threads.
//!
//! # Resolution order
//!
//! [`resolve`](TypeComparatorRegistry::resolve) returns, in order of
//! preference:
//!
//! 1. the comparator registered for the exact type;
//! 2. the comparator of the nearest registered superclass;
//! 3. the comparator of the first registered interface, visiting interfaces
//!    in [`TypeDescriptor::interfaces_by_distance`] order: those the type
//!    declares (in declaration order), then those its superclasses declare
//!    (closest first), then super-interfaces level by level;
//! 4. nothing.
//!
//! When a type implements two unrelated interfaces that both have a
//! registration, the one declared first on the type wins. The outcome never
//! depends on registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};
use verity_types::{TypeDescriptor, FLOAT};

use crate::comparator::{Comparator, FloatComparator};
use crate::error::{PolicyError, PolicyResult};

/// A comparator found for a type, with the type it was registered for.
#[derive(Clone)]
pub struct Resolved {
    /// The registered type the lookup matched: the queried type itself, one
    /// of its superclasses, or one of its interfaces.
    pub registered_for: &'static TypeDescriptor,
    pub comparator: Arc<dyn Comparator>,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("registered_for", &self.registered_for.name())
            .field("comparator", &self.comparator.describe())
            .finish()
    }
}

struct Registration {
    descriptor: &'static TypeDescriptor,
    comparator: Arc<dyn Comparator>,
}

/// Maps runtime types to caller-registered comparators.
pub struct TypeComparatorRegistry {
    comparators: RwLock<HashMap<&'static str, Registration>>,
}

impl TypeComparatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            comparators: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry seeded with the default comparators: a
    /// [`FloatComparator`] with the given tolerance for `FLOAT`.
    pub fn with_defaults(float_precision: f64) -> PolicyResult<Self> {
        let registry = Self::new();
        registry.register(&FLOAT, FloatComparator::new(float_precision)?)?;
        Ok(registry)
    }

    /// Register a comparator for an exact type, replacing and returning any
    /// previous registration for that type.
    pub fn register<C: Comparator + 'static>(
        &self,
        descriptor: &'static TypeDescriptor,
        comparator: C,
    ) -> PolicyResult<Option<Arc<dyn Comparator>>> {
        self.register_shared(descriptor, Arc::new(comparator))
    }

    /// Register an already shared comparator.
    pub fn register_shared(
        &self,
        descriptor: &'static TypeDescriptor,
        comparator: Arc<dyn Comparator>,
    ) -> PolicyResult<Option<Arc<dyn Comparator>>> {
        let mut comparators = self.comparators.write().map_err(|e| {
            PolicyError::RegistryPoisoned(e.to_string())
        })?;
        debug!(
            type_name = descriptor.name(),
            comparator = %comparator.describe(),
            "registering type comparator"
        );
        let previous = comparators.insert(
            descriptor.name(),
            Registration {
                descriptor,
                comparator,
            },
        );
        Ok(previous.map(|r| r.comparator))
    }

    /// Find the comparator for a runtime type and the type it was
    /// registered for. See the module docs for the resolution order.
    pub fn resolve(&self, descriptor: &TypeDescriptor) -> PolicyResult<Option<Resolved>> {
        let comparators = self.comparators.read().map_err(|e| {
            PolicyError::RegistryPoisoned(e.to_string())
        })?;
        if comparators.is_empty() {
            return Ok(None);
        }

        let found = comparators
            .get(descriptor.name())
            .or_else(|| {
                descriptor
                    .superclasses()
                    .find_map(|ancestor| comparators.get(ancestor.name()))
            })
            .or_else(|| {
                descriptor
                    .interfaces_by_distance()
                    .into_iter()
                    .find_map(|interface| comparators.get(interface.name()))
            });

        let resolved = found.map(|r| Resolved {
            registered_for: r.descriptor,
            comparator: Arc::clone(&r.comparator),
        });
        trace!(
            type_name = descriptor.name(),
            registered_for = resolved.as_ref().map(|r| r.registered_for.name()),
            "resolved type comparator"
        );
        Ok(resolved)
    }

    /// Find the comparator for a runtime type.
    pub fn lookup(&self, descriptor: &TypeDescriptor) -> PolicyResult<Option<Arc<dyn Comparator>>> {
        Ok(self.resolve(descriptor)?.map(|r| r.comparator))
    }

    /// Returns `true` if a comparator is registered for exactly this type.
    pub fn contains(&self, descriptor: &TypeDescriptor) -> PolicyResult<bool> {
        let comparators = self.comparators.read().map_err(|e| {
            PolicyError::RegistryPoisoned(e.to_string())
        })?;
        Ok(comparators.contains_key(descriptor.name()))
    }

    /// Names of all registered types, sorted.
    pub fn registered_types(&self) -> PolicyResult<Vec<&'static str>> {
        let comparators = self.comparators.read().map_err(|e| {
            PolicyError::RegistryPoisoned(e.to_string())
        })?;
        let mut names: Vec<&'static str> = comparators.keys().copied().collect();
        names.sort_unstable();
        Ok(names)
    }

    pub fn len(&self) -> PolicyResult<usize> {
        let comparators = self.comparators.read().map_err(|e| {
            PolicyError::RegistryPoisoned(e.to_string())
        })?;
        Ok(comparators.len())
    }

    pub fn is_empty(&self) -> PolicyResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every registration.
    pub fn clear(&self) -> PolicyResult<()> {
        let mut comparators = self.comparators.write().map_err(|e| {
            PolicyError::RegistryPoisoned(e.to_string())
        })?;
        comparators.clear();
        Ok(())
    }
}

impl Default for TypeComparatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeComparatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        if let Ok(comparators) = self.comparators.read() {
            let mut entries: Vec<_> = comparators.iter().collect();
            entries.sort_unstable_by_key(|(name, _)| **name);
            for (name, registration) in entries {
                list.entry(name, &registration.comparator.describe());
            }
        }
        list.finish()
    }
}
