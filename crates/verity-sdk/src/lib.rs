//! High-level SDK for Verity.
//!
//! Provides a unified API over the Verity crates: an [`Engine`] owns the
//! configuration and the shared type comparator registry, hands out
//! equality policies, and runs the sequence, byte, line and digest differs.
//! This is the main entry point for applications embedding Verity.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{ContentDiff, Engine};
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use verity_diff::{
    ByteDiff, ByteSource, DigestDiff, LineDelta, LineSource, Patch, ReaderSource, SequenceDiff,
    StreamByte,
};
pub use verity_policy::{Comparator, EqualityPolicy, FieldSelection, TypeComparatorRegistry};
pub use verity_types::{FieldMap, Record, TypeDescriptor, Value};
