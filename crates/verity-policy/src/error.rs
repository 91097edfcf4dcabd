//! Error types for equality policies.

use thiserror::Error;
use verity_types::IntrospectionError;

/// Errors that can occur while building or applying an equality policy.
///
/// Variants fall into three groups: configuration errors, raised when a
/// policy or comparator is constructed; introspection errors, raised when a
/// selected field cannot be read; and usage errors, raised when a policy is
/// asked for something it does not define.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// An on-fields selection was built from an empty field list.
    #[error("field list must not be empty")]
    EmptyFieldList,

    /// A field name in a selection is empty or whitespace.
    #[error("field name at index {index} is blank")]
    BlankFieldName { index: usize },

    /// A tolerance was negative or NaN.
    #[error("invalid precision {0}: must be a non-negative number")]
    InvalidPrecision(f64),

    /// A selected field could not be read.
    #[error("introspection error: {0}")]
    Introspection(#[from] IntrospectionError),

    /// The policy defines equality only.
    #[error("{policy} does not define an ordering")]
    OrderingUnsupported { policy: String },

    /// The two values have no common ordering.
    #[error("values of type {left} and {right} are not comparable")]
    NotComparable { left: String, right: String },

    /// An ordering was requested between a null and a non-null value.
    #[error("null cannot be ordered against a non-null value")]
    NullOrdering,

    /// The type comparator registry lock was poisoned by a panicking writer.
    #[error("type comparator registry lock poisoned: {0}")]
    RegistryPoisoned(String),
}

impl PolicyError {
    /// Returns `true` for errors raised while constructing a policy.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyFieldList | Self::BlankFieldName { .. } | Self::InvalidPrecision(_)
        )
    }

    /// Returns `true` if a field could not be read.
    pub fn is_introspection(&self) -> bool {
        matches!(self, Self::Introspection(_))
    }

    /// Returns `true` for requests the policy does not support.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::OrderingUnsupported { .. } | Self::NotComparable { .. } | Self::NullOrdering
        )
    }
}

/// Convenience alias for policy results.
pub type PolicyResult<T> = Result<T, PolicyError>;
