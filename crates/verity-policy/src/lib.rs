//! Equality policies for Verity.
//!
//! An [`EqualityPolicy`] decides at call time what "equal" and "ordered"
//! mean for two [`Value`](verity_types::Value)s. Every higher-level
//! operation in Verity (sequence diffs, duplicate detection) takes a policy
//! as an explicit parameter.
//!
//! # Key Types
//!
//! - [`StandardPolicy`] -- Structural equality and natural order
//! - [`ComparatorPolicy`] -- Equality and order from a caller-supplied [`Comparator`]
//! - [`FieldSelectivePolicy`] -- Records compared on, or ignoring, named fields
//! - [`ElementWisePolicy`] -- Lists compared element by element
//! - [`TypeAwarePolicy`] -- Per-type comparators with a fallback policy
//! - [`TypeComparatorRegistry`] -- Comparators keyed by runtime type
//! - [`FieldByFieldComparator`] -- Best-effort record equality as a comparator

pub mod comparator;
pub mod element;
pub mod error;
pub mod field;
pub mod policy;
pub mod registry;
pub mod type_aware;

pub use comparator::{Comparator, DescribedComparator, FloatComparator};
pub use element::ElementWisePolicy;
pub use error::{PolicyError, PolicyResult};
pub use field::{FieldByFieldComparator, FieldSelection, FieldSelectivePolicy};
pub use policy::{ComparatorPolicy, EqualityPolicy, StandardPolicy};
pub use registry::{Resolved, TypeComparatorRegistry};
pub use type_aware::TypeAwarePolicy;
