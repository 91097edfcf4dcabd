//! Foundation types for Verity.
//!
//! This crate provides the value model every comparison in Verity operates
//! on. Every other Verity crate depends on `verity-types`.
//!
//! # Key Types
//!
//! - [`Value`] -- Dynamic value compared by equality policies
//! - [`TypeDescriptor`] -- Runtime type-identity token with declared ancestry
//! - [`Record`] -- Field-accessor capability for structured values
//! - [`FieldMap`] -- Map-backed [`Record`] for ad hoc structured values
//! - [`IntrospectionError`] -- Failure to read a named field

pub mod descriptor;
pub mod error;
pub mod record;
pub mod value;

pub use descriptor::{TypeDescriptor, TypeKind, BOOL, BYTES, FLOAT, INT, LIST, NUMBER, OBJECT, TEXT};
pub use error::{IntrospectionError, IntrospectionResult};
pub use record::{FieldMap, Record};
pub use value::Value;
