//! Diff engine for Verity.
//!
//! Computes differences between two collections under an
//! [`EqualityPolicy`](verity_policy::EqualityPolicy), and between two byte
//! or text streams.
//!
//! # Key Types
//!
//! - [`SequenceDiffer`] / [`SequenceDiff`] -- Duplicate-aware missing/unexpected elements
//! - [`ByteStreamDiffer`] / [`ByteDiff`] -- First differing byte of two streams
//! - [`LineDiffer`] / [`Patch`] / [`LineDelta`] -- Minimal line edit script
//! - [`Hunk`] / [`HunkLine`] -- Deltas grouped with context for unified output
//! - [`DigestDiff`] -- BLAKE3 digest of a stream against an expected digest
//! - [`ByteSource`] / [`LineSource`] -- Sequential sources with explicit release

pub mod bytes;
pub mod digest;
pub mod error;
pub mod lines;
pub mod sequence;
pub mod source;

pub use bytes::{ByteDiff, ByteStreamDiffer, StreamByte};
pub use digest::{digest_diff, DigestDiff};
pub use error::{DiffError, DiffResult};
pub use lines::{split_lines, Chunk, DeltaKind, Hunk, HunkLine, LineDelta, LineDiffer, Patch};
pub use sequence::{ElementMismatch, SequenceDiff, SequenceDiffer};
pub use source::{ByteSource, LineSource, ReaderSource};
