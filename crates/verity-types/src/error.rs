use thiserror::Error;

/// Failure to read a named field through a [`Record`](crate::Record).
///
/// Distinct from "not equal": a comparison that cannot read a field it was
/// asked to compare has not compared anything.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntrospectionError {
    #[error("unknown field `{field}` on type {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("field `{field}` on type {type_name} is not accessible: {reason}")]
    Inaccessible {
        type_name: String,
        field: String,
        reason: String,
    },
}

impl IntrospectionError {
    /// The name of the field that could not be read.
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownField { field, .. } | Self::Inaccessible { field, .. } => field,
        }
    }
}

/// Convenience alias for field access results.
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;
