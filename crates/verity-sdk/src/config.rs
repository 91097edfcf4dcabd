use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Configuration for an [`Engine`](crate::Engine).
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Unchanged lines shown around each change in unified diffs.
    pub context_lines: usize,
    /// Tolerance of the default comparator registered for floats.
    pub float_precision: f64,
    /// Whether a new engine seeds its registry with the default
    /// comparators.
    pub default_type_comparators: bool,
    /// Whether file content diffs fall back to a byte comparison when the
    /// content is not valid UTF-8.
    pub binary_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            float_precision: 1e-15,
            default_type_comparators: true,
            binary_fallback: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SdkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.float_precision.is_nan() || self.float_precision < 0.0 {
            return Err(SdkError::Config(format!(
                "float_precision must be a non-negative number, got {}",
                self.float_precision
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.context_lines, 3);
        assert_eq!(c.float_precision, 1e-15);
        assert!(c.default_type_comparators);
        assert!(c.binary_fallback);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = EngineConfig::from_toml_str("context_lines = 1\n").unwrap();
        assert_eq!(c.context_lines, 1);
        assert!(c.binary_fallback);
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn rejects_negative_precision() {
        let err = EngineConfig::from_toml_str("float_precision = -0.5").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(EngineConfig::from_toml_str("context = 2").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let c = EngineConfig {
            context_lines: 5,
            float_precision: 0.001,
            default_type_comparators: false,
            binary_fallback: false,
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verity.toml");
        std::fs::write(&path, "binary_fallback = false\n").unwrap();
        let c = EngineConfig::load(&path).unwrap();
        assert!(!c.binary_fallback);

        let err = EngineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, SdkError::Io { .. }));
    }
}
