use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use verity_diff::{
    ByteDiff, ByteSource, ByteStreamDiffer, DiffError, DigestDiff, LineDiffer, LineSource, Patch,
    ReaderSource, SequenceDiff, SequenceDiffer,
};
use verity_policy::{
    Comparator, ComparatorPolicy, ElementWisePolicy, EqualityPolicy, FieldByFieldComparator,
    FieldSelection, FieldSelectivePolicy, StandardPolicy, TypeAwarePolicy, TypeComparatorRegistry,
};
use verity_types::{TypeDescriptor, Value};

use crate::config::EngineConfig;
use crate::error::{SdkError, SdkResult};

/// The result of comparing two files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentDiff {
    /// Both files are text; their line deltas.
    Lines(Patch),
    /// At least one file is not valid UTF-8; the first differing byte.
    Binary(ByteDiff),
}

impl ContentDiff {
    pub fn has_differences(&self) -> bool {
        match self {
            Self::Lines(patch) => !patch.is_empty(),
            Self::Binary(diff) => diff.has_differences(),
        }
    }
}

/// High-level comparison API.
///
/// Owns the configuration and a shared [`TypeComparatorRegistry`]. Policies
/// handed out by the engine that resolve comparators by type share its
/// registry, so comparators registered later apply to them as well.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: Arc<TypeComparatorRegistry>,
}

impl Engine {
    /// Create an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> SdkResult<Self> {
        config.validate()?;
        let registry = if config.default_type_comparators {
            TypeComparatorRegistry::with_defaults(config.float_precision)?
        } else {
            TypeComparatorRegistry::new()
        };
        info!(
            context_lines = config.context_lines,
            float_precision = config.float_precision,
            default_type_comparators = config.default_type_comparators,
            "engine ready"
        );
        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    /// Create an engine with the default configuration.
    pub fn with_defaults() -> SdkResult<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TypeComparatorRegistry> {
        &self.registry
    }

    // ---- Type comparators ----

    /// Register a comparator for a type, returning the one it replaces.
    pub fn register_comparator<C: Comparator + 'static>(
        &self,
        ty: &'static TypeDescriptor,
        comparator: C,
    ) -> SdkResult<Option<Arc<dyn Comparator>>> {
        Ok(self.registry.register(ty, comparator)?)
    }

    /// The comparator that applies to a type, following supertypes.
    pub fn comparator_for(&self, ty: &TypeDescriptor) -> SdkResult<Option<Arc<dyn Comparator>>> {
        Ok(self.registry.lookup(ty)?)
    }

    // ---- Policies ----

    pub fn standard_policy(&self) -> StandardPolicy {
        StandardPolicy
    }

    /// Registered type comparators first, structural equality otherwise.
    pub fn type_aware_policy(&self) -> TypeAwarePolicy {
        TypeAwarePolicy::new(Arc::clone(&self.registry))
    }

    pub fn comparator_policy<C: Comparator + 'static>(&self, comparator: C) -> ComparatorPolicy {
        ComparatorPolicy::new(comparator)
    }

    pub fn on_fields_policy<I, S>(&self, fields: I) -> SdkResult<FieldSelectivePolicy>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(FieldSelectivePolicy::on_fields(fields)?)
    }

    pub fn ignoring_fields_policy<I, S>(&self, fields: I) -> SdkResult<FieldSelectivePolicy>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(FieldSelectivePolicy::ignoring_fields(fields)?)
    }

    pub fn element_wise_policy(&self, element: Arc<dyn EqualityPolicy>) -> ElementWisePolicy {
        ElementWisePolicy::new(element)
    }

    /// A field-by-field comparator that resolves field comparators through
    /// the engine's registry.
    pub fn field_by_field_comparator(&self, selection: FieldSelection) -> FieldByFieldComparator {
        FieldByFieldComparator::with_selection(selection)
            .with_type_comparators(Arc::clone(&self.registry))
    }

    // ---- Differs ----

    pub fn diff_sequences(
        &self,
        actual: &[Value],
        expected: &[Value],
        policy: &dyn EqualityPolicy,
    ) -> SdkResult<SequenceDiff> {
        Ok(SequenceDiffer::new(policy).diff(actual, expected)?)
    }

    pub fn duplicates_in(
        &self,
        sequence: &[Value],
        policy: &dyn EqualityPolicy,
    ) -> SdkResult<Vec<Value>> {
        Ok(SequenceDiffer::new(policy).duplicates_from(sequence)?)
    }

    pub fn diff_bytes<A, E>(&self, actual: &mut A, expected: &mut E) -> SdkResult<ByteDiff>
    where
        A: ByteSource + ?Sized,
        E: ByteSource + ?Sized,
    {
        Ok(ByteStreamDiffer::new().diff(actual, expected)?)
    }

    pub fn diff_lines<A, E>(&self, actual: &mut A, expected: &mut E) -> SdkResult<Patch>
    where
        A: LineSource + ?Sized,
        E: LineSource + ?Sized,
    {
        Ok(LineDiffer::new().diff(actual, expected)?)
    }

    pub fn diff_texts(&self, actual: &str, expected: &str) -> Patch {
        LineDiffer::new().diff_texts(actual, expected)
    }

    /// Render the line diff of two texts as a unified diff, with the
    /// configured number of context lines.
    pub fn unified_diff(
        &self,
        actual: &str,
        expected: &str,
        actual_name: &str,
        expected_name: &str,
    ) -> SdkResult<String> {
        let expected_lines = verity_diff::split_lines(expected);
        Ok(self.diff_texts(actual, expected).unified(
            &expected_lines,
            expected_name,
            actual_name,
            self.config.context_lines,
        )?)
    }

    /// Parse a unified diff back into a patch.
    pub fn parse_unified_diff(&self, text: &str) -> SdkResult<Patch> {
        Ok(Patch::parse_unified(text)?)
    }

    /// Compare two files line by line.
    ///
    /// If either file is not valid UTF-8 and `binary_fallback` is enabled,
    /// the files are compared byte by byte instead.
    pub fn diff_file_contents(
        &self,
        actual: impl AsRef<Path>,
        expected: impl AsRef<Path>,
    ) -> SdkResult<ContentDiff> {
        let (actual, expected) = (actual.as_ref(), expected.as_ref());
        let mut a = open(actual)?;
        let mut e = open(expected)?;
        match LineDiffer::new().diff(&mut a, &mut e) {
            Ok(patch) => Ok(ContentDiff::Lines(patch)),
            Err(DiffError::Io { ref source, .. })
                if source.kind() == io::ErrorKind::InvalidData && self.config.binary_fallback =>
            {
                debug!(
                    actual = %actual.display(),
                    expected = %expected.display(),
                    "content is not UTF-8, comparing bytes"
                );
                let mut a = open(actual)?;
                let mut e = open(expected)?;
                Ok(ContentDiff::Binary(ByteStreamDiffer::new().diff(&mut a, &mut e)?))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Compare the BLAKE3 digest of a source with an expected hex digest.
    pub fn digest_diff<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        expected_hex: &str,
    ) -> SdkResult<DigestDiff> {
        Ok(verity_diff::digest_diff(source, expected_hex)?)
    }
}

fn open(path: &Path) -> SdkResult<ReaderSource<std::fs::File>> {
    ReaderSource::open(path).map_err(|source| SdkError::Io {
        path: path.display().to_string(),
        source,
    })
}
