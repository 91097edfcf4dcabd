//! First-difference comparison of byte streams.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::source::{settle, ByteSource, ReaderSource};

/// One position of a byte stream: a byte, or the end of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamByte {
    Byte(u8),
    Eof,
}

impl From<Option<u8>> for StreamByte {
    fn from(b: Option<u8>) -> Self {
        b.map_or(Self::Eof, Self::Byte)
    }
}

impl fmt::Display for StreamByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(b) => write!(f, "0x{b:02x}"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

/// The result of comparing two byte streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteDiff {
    /// Both streams ended at the same offset with no mismatch.
    Identical,
    /// The first position where the streams differ.
    Mismatch {
        offset: u64,
        expected: StreamByte,
        actual: StreamByte,
    },
}

impl ByteDiff {
    pub fn has_differences(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }

    /// Offset of the first mismatch, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Identical => None,
            Self::Mismatch { offset, .. } => Some(*offset),
        }
    }
}

/// Compares two byte sources one byte at a time and reports the first
/// difference.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteStreamDiffer;

impl ByteStreamDiffer {
    pub fn new() -> Self {
        Self
    }

    /// Compare `actual` against `expected`.
    ///
    /// Both sources are released before returning, whatever the outcome.
    /// A read failure takes priority over a release failure.
    pub fn diff<A, E>(&self, actual: &mut A, expected: &mut E) -> DiffResult<ByteDiff>
    where
        A: ByteSource + ?Sized,
        E: ByteSource + ?Sized,
    {
        let (actual_name, expected_name) = (actual.description(), expected.description());
        let outcome = scan(actual, expected);
        let released = [actual.release(), expected.release()];
        let diff = settle(outcome, released).map_err(|source| DiffError::Io {
            expected: expected_name.clone(),
            actual: actual_name.clone(),
            source,
        })?;
        debug!(
            actual = %actual_name,
            expected = %expected_name,
            offset = diff.offset(),
            "compared byte streams"
        );
        Ok(diff)
    }

    /// Compare two in-memory byte slices.
    pub fn diff_slices(&self, actual: &[u8], expected: &[u8]) -> ByteDiff {
        match actual.iter().zip(expected).position(|(a, e)| a != e) {
            Some(i) => mismatch(i, expected.get(i).copied(), actual.get(i).copied()),
            None if actual.len() == expected.len() => ByteDiff::Identical,
            None => {
                let i = actual.len().min(expected.len());
                mismatch(i, expected.get(i).copied(), actual.get(i).copied())
            }
        }
    }

    /// Compare two in-memory byte slices through the streaming path.
    pub fn diff_bytes(&self, actual: &[u8], expected: &[u8]) -> DiffResult<ByteDiff> {
        let mut a = ReaderSource::from_bytes("actual", actual);
        let mut e = ReaderSource::from_bytes("expected", expected);
        self.diff(&mut a, &mut e)
    }
}

fn mismatch(offset: usize, expected: Option<u8>, actual: Option<u8>) -> ByteDiff {
    ByteDiff::Mismatch {
        offset: offset as u64,
        expected: expected.into(),
        actual: actual.into(),
    }
}

fn scan<A, E>(actual: &mut A, expected: &mut E) -> std::io::Result<ByteDiff>
where
    A: ByteSource + ?Sized,
    E: ByteSource + ?Sized,
{
    let mut offset = 0u64;
    loop {
        let e = expected.read_byte()?;
        let a = actual.read_byte()?;
        match (e, a) {
            (None, None) => return Ok(ByteDiff::Identical),
            (Some(x), Some(y)) if x == y => offset += 1,
            _ => {
                return Ok(ByteDiff::Mismatch {
                    offset,
                    expected: e.into(),
                    actual: a.into(),
                })
            }
        }
    }
}
