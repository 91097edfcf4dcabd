//! Content digests compared against an expected value.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DiffError, DiffResult};
use crate::source::{settle, ByteSource};

/// Size of a BLAKE3 digest in bytes.
const DIGEST_LEN: usize = 32;

/// The digest of a source and the digest it was expected to have, both as
/// lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestDiff {
    pub actual: String,
    pub expected: String,
}

impl DigestDiff {
    pub fn has_differences(&self) -> bool {
        self.actual != self.expected
    }
}

/// Hash `source` with BLAKE3 and compare it with `expected_hex`.
///
/// The expected digest is validated before the source is read. The source
/// is released on every path; a read failure takes priority over a release
/// failure.
pub fn digest_diff<S: ByteSource + ?Sized>(
    source: &mut S,
    expected_hex: &str,
) -> DiffResult<DigestDiff> {
    let name = source.description();
    let expected = match parse_digest(expected_hex) {
        Ok(expected) => expected,
        Err(e) => {
            if let Err(release) = source.release() {
                warn!(source = %name, error = %release, "release failed after invalid digest");
            }
            return Err(e);
        }
    };

    let outcome = hash(source);
    let released = [source.release(), Ok(())];
    let actual = settle(outcome, released).map_err(|io| DiffError::Io {
        expected: format!("digest {expected}"),
        actual: name.clone(),
        source: io,
    })?;

    let diff = DigestDiff { actual, expected };
    debug!(source = %name, differs = diff.has_differences(), "compared digest");
    Ok(diff)
}

fn parse_digest(hex_digest: &str) -> DiffResult<String> {
    let bytes = hex::decode(hex_digest.trim())
        .map_err(|e| DiffError::InvalidDigest(format!("{hex_digest:?}: {e}")))?;
    if bytes.len() != DIGEST_LEN {
        return Err(DiffError::InvalidDigest(format!(
            "{hex_digest:?}: expected {DIGEST_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(hex::encode(bytes))
}

fn hash<S: ByteSource + ?Sized>(source: &mut S) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = source.read_into(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::Faulty;
    use crate::source::ReaderSource;

    fn digest_of(bytes: &[u8]) -> String {
        blake3::hash(bytes).to_hex().to_string()
    }

    #[test]
    fn matching_digest() {
        let mut source = ReaderSource::from_bytes("mem", b"precious".to_vec());
        let diff = digest_diff(&mut source, &digest_of(b"precious")).unwrap();
        assert!(!diff.has_differences());
    }

    #[test]
    fn differing_digest() {
        let mut source = ReaderSource::from_bytes("mem", b"precious".to_vec());
        let diff = digest_diff(&mut source, &digest_of(b"my precious")).unwrap();
        assert!(diff.has_differences());
        assert_eq!(diff.actual, digest_of(b"precious"));
    }

    #[test]
    fn expected_digest_is_case_insensitive() {
        let mut source = ReaderSource::from_bytes("mem", b"x".to_vec());
        let upper = digest_of(b"x").to_uppercase();
        assert!(!digest_diff(&mut source, &upper).unwrap().has_differences());
    }

    #[test]
    fn invalid_digest_is_rejected_and_source_released() {
        let mut source = Faulty::new(b"x");
        let err = digest_diff(&mut source, "not hex").unwrap_err();
        assert!(matches!(err, DiffError::InvalidDigest(_)));
        assert!(source.released);

        let mut source = Faulty::new(b"x");
        assert!(digest_diff(&mut source, "abcd").is_err());
    }

    #[test]
    fn read_error_is_io() {
        let mut source = Faulty::new(b"abc").failing_read_at(1).failing_release();
        let err = digest_diff(&mut source, &digest_of(b"abc")).unwrap_err();
        match err {
            DiffError::Io { source: io, actual, .. } => {
                assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
                assert_eq!(actual, "faulty");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(source.released);
    }
}
