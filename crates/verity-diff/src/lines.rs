//! Line-level diff of two texts.
//!
//! Uses the `similar` crate (Myers diff algorithm) to compute a minimal
//! edit script from the expected lines to the actual lines. The script is a
//! [`Patch`]: an ordered list of [`LineDelta`]s, each anchored to a line
//! range in the expected text. Applying the patch to the expected lines
//! reproduces the actual lines.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, DiffOp, DiffTag};
use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::source::{settle, LineSource};

/// The kind of edit a delta makes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// Lines present only in the actual text.
    Insert,
    /// Lines present only in the expected text.
    Delete,
    /// Expected lines replaced by different actual lines.
    Change,
}

/// A run of consecutive lines starting at a 0-based line index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub position: usize,
    pub lines: Vec<String>,
}

impl Chunk {
    pub fn new(position: usize, lines: Vec<String>) -> Self {
        Self { position, lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index one past the last line.
    pub fn end(&self) -> usize {
        self.position + self.lines.len()
    }
}

/// A single edit: the expected chunk is replaced by the actual chunk.
///
/// An insert has an empty expected chunk positioned at the insertion point;
/// a delete has an empty actual chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDelta {
    pub kind: DeltaKind,
    pub expected: Chunk,
    pub actual: Chunk,
}

/// An ordered edit script from expected lines to actual lines.
///
/// Deltas are sorted, do not overlap, and leave the same number of
/// unchanged lines before each delta on both sides. [`Patch::new`] and
/// deserialization reject anything else.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PatchRepr")]
pub struct Patch {
    deltas: Vec<LineDelta>,
}

#[derive(Deserialize)]
struct PatchRepr {
    deltas: Vec<LineDelta>,
}

impl TryFrom<PatchRepr> for Patch {
    type Error = DiffError;

    fn try_from(repr: PatchRepr) -> DiffResult<Self> {
        Self::new(repr.deltas)
    }
}

impl Patch {
    /// Build a patch from deltas, checking their order and anchoring.
    pub fn new(deltas: Vec<LineDelta>) -> DiffResult<Self> {
        let (mut e, mut a) = (0, 0);
        for (i, delta) in deltas.iter().enumerate() {
            let consistent = match delta.kind {
                DeltaKind::Insert => delta.expected.is_empty() && !delta.actual.is_empty(),
                DeltaKind::Delete => !delta.expected.is_empty() && delta.actual.is_empty(),
                DeltaKind::Change => !delta.expected.is_empty() && !delta.actual.is_empty(),
            };
            if !consistent {
                return Err(DiffError::InvalidPatch(format!(
                    "delta {i} is a {:?} with {} expected and {} actual lines",
                    delta.kind,
                    delta.expected.len(),
                    delta.actual.len()
                )));
            }
            let gaps = (
                delta.expected.position.checked_sub(e),
                delta.actual.position.checked_sub(a),
            );
            match gaps {
                (Some(ge), Some(ga)) if ge == ga => {}
                _ => {
                    return Err(DiffError::InvalidPatch(format!(
                        "delta {i} at expected line {} / actual line {} does not follow \
                         the previous delta ending at {e} / {a}",
                        delta.expected.position, delta.actual.position
                    )))
                }
            }
            e = delta.expected.end();
            a = delta.actual.end();
        }
        Ok(Self { deltas })
    }

    /// Parse a unified diff, such as the output of [`Patch::unified`].
    ///
    /// Lines outside hunks (file headers, `diff` preambles, "\ No newline"
    /// markers) are ignored. Each hunk body must match the counts in its
    /// `@@` header.
    pub fn parse_unified(text: &str) -> DiffResult<Self> {
        let mut deltas = Vec::new();
        let mut lines = text.lines();
        while let Some(line) = lines.next() {
            if !line.starts_with("@@") {
                continue;
            }
            let (mut e, e_count, mut a, a_count) = parse_hunk_header(line)?;
            let (e_end, a_end) = (e + e_count, a + a_count);
            let mut pending = PendingDelta::default();
            while e < e_end || a < a_end {
                let body = lines.next().ok_or_else(|| {
                    DiffError::InvalidPatch(format!("hunk {line:?} ends early"))
                })?;
                let mut chars = body.chars();
                let marker = chars.next().unwrap_or(' ');
                let content = chars.as_str();
                match marker {
                    '\\' => continue,
                    ' ' if e < e_end && a < a_end => {
                        pending.flush_into(&mut deltas);
                        e += 1;
                        a += 1;
                    }
                    '-' if e < e_end => {
                        pending.start(e, a);
                        pending.removed.push(content.to_string());
                        e += 1;
                    }
                    '+' if a < a_end => {
                        pending.start(e, a);
                        pending.added.push(content.to_string());
                        a += 1;
                    }
                    _ => {
                        return Err(DiffError::InvalidPatch(format!(
                            "unexpected line {body:?} in hunk {line:?}"
                        )))
                    }
                }
            }
            pending.flush_into(&mut deltas);
        }
        Self::new(deltas)
    }

    pub fn deltas(&self) -> &[LineDelta] {
        &self.deltas
    }

    pub fn into_deltas(self) -> Vec<LineDelta> {
        self.deltas
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Apply the patch to the expected lines, producing the actual lines.
    ///
    /// Every delta's expected chunk must match the target exactly;
    /// otherwise [`DiffError::PatchMismatch`] is returned.
    pub fn apply_to(&self, expected: &[String]) -> DiffResult<Vec<String>> {
        apply(&self.deltas, expected, |d| (&d.expected, &d.actual))
    }

    /// Apply the patch in reverse to the actual lines, producing the
    /// expected lines.
    pub fn restore(&self, actual: &[String]) -> DiffResult<Vec<String>> {
        apply(&self.deltas, actual, |d| (&d.actual, &d.expected))
    }

    /// Group deltas into hunks with up to `context` unchanged lines around
    /// each change. Deltas separated by at most `2 * context` unchanged
    /// lines share a hunk.
    ///
    /// Fails with [`DiffError::PatchMismatch`] if the patch does not apply
    /// to `expected`.
    pub fn hunks(&self, expected: &[String], context: usize) -> DiffResult<Vec<Hunk>> {
        let actual = self.apply_to(expected)?;
        let hunks = similar::group_diff_ops(self.diff_ops(expected.len()), context)
            .iter()
            .map(|group| build_hunk(group, expected, &actual))
            .collect();
        Ok(hunks)
    }

    /// Render the patch as a unified diff. An empty patch renders as an
    /// empty string.
    pub fn unified(
        &self,
        expected: &[String],
        expected_name: &str,
        actual_name: &str,
        context: usize,
    ) -> DiffResult<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        let mut out = format!("--- {expected_name}\n+++ {actual_name}\n");
        for hunk in self.hunks(expected, context)? {
            out.push_str(&hunk.header());
            out.push('\n');
            for line in &hunk.lines {
                out.push_str(&line.to_string());
                out.push('\n');
            }
        }
        Ok(out)
    }

    /// The patch as `similar` ops over an expected text of `expected_len`
    /// lines, unchanged runs included.
    fn diff_ops(&self, expected_len: usize) -> Vec<DiffOp> {
        let mut ops = Vec::with_capacity(self.deltas.len() * 2 + 1);
        let (mut e, mut a) = (0, 0);
        for delta in &self.deltas {
            let gap = delta.expected.position.saturating_sub(e);
            if gap > 0 {
                ops.push(DiffOp::Equal {
                    old_index: e,
                    new_index: a,
                    len: gap,
                });
            }
            let (old_index, new_index) = (delta.expected.position, delta.actual.position);
            let (old_len, new_len) = (delta.expected.len(), delta.actual.len());
            ops.push(match delta.kind {
                DeltaKind::Insert => DiffOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                },
                DeltaKind::Delete => DiffOp::Delete {
                    old_index,
                    old_len,
                    new_index,
                },
                DeltaKind::Change => DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                },
            });
            e = delta.expected.end();
            a = delta.actual.end();
        }
        let tail = expected_len.saturating_sub(e);
        if tail > 0 {
            ops.push(DiffOp::Equal {
                old_index: e,
                new_index: a,
                len: tail,
            });
        }
        ops
    }
}

#[derive(Default)]
struct PendingDelta {
    expected: usize,
    actual: usize,
    removed: Vec<String>,
    added: Vec<String>,
}

impl PendingDelta {
    fn start(&mut self, expected: usize, actual: usize) {
        if self.removed.is_empty() && self.added.is_empty() {
            self.expected = expected;
            self.actual = actual;
        }
    }

    fn flush_into(&mut self, deltas: &mut Vec<LineDelta>) {
        let kind = match (self.removed.is_empty(), self.added.is_empty()) {
            (true, true) => return,
            (true, false) => DeltaKind::Insert,
            (false, true) => DeltaKind::Delete,
            (false, false) => DeltaKind::Change,
        };
        deltas.push(LineDelta {
            kind,
            expected: Chunk::new(self.expected, std::mem::take(&mut self.removed)),
            actual: Chunk::new(self.actual, std::mem::take(&mut self.added)),
        });
    }
}

/// Parse `@@ -l,s +l,s @@` into 0-based starts and counts.
fn parse_hunk_header(line: &str) -> DiffResult<(usize, usize, usize, usize)> {
    let invalid = || DiffError::InvalidPatch(format!("malformed hunk header {line:?}"));
    let mut parts = line.split_whitespace();
    let (Some("@@"), Some(old), Some(new), Some("@@")) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let (e, e_count) = old.strip_prefix('-').and_then(parse_range).ok_or_else(invalid)?;
    let (a, a_count) = new.strip_prefix('+').and_then(parse_range).ok_or_else(invalid)?;
    Ok((e, e_count, a, a_count))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    let (start, count): (usize, usize) = match range.split_once(',') {
        Some((start, count)) => (start.parse().ok()?, count.parse().ok()?),
        None => (range.parse().ok()?, 1),
    };
    // An empty range is numbered after the line it follows.
    let start = if count == 0 { start } else { start.checked_sub(1)? };
    Some((start, count))
}

fn apply<F>(deltas: &[LineDelta], source: &[String], sides: F) -> DiffResult<Vec<String>>
where
    F: Fn(&LineDelta) -> (&Chunk, &Chunk),
{
    let mut out = Vec::with_capacity(source.len());
    let mut cursor = 0;
    for delta in deltas {
        let (from, to) = sides(delta);
        let found = if from.position >= cursor {
            source.get(from.position..from.end())
        } else {
            None
        };
        match found {
            Some(found) if found == from.lines.as_slice() => {}
            found => {
                return Err(DiffError::PatchMismatch {
                    position: from.position,
                    expected: from.lines.clone(),
                    found: found.map(<[String]>::to_vec).unwrap_or_default(),
                })
            }
        }
        out.extend_from_slice(&source[cursor..from.position]);
        out.extend(to.lines.iter().cloned());
        cursor = from.end();
    }
    out.extend_from_slice(&source[cursor..]);
    Ok(out)
}

/// A contiguous region of changes with surrounding context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// First expected line covered, 0-based.
    pub expected_start: usize,
    pub expected_count: usize,
    /// First actual line covered, 0-based.
    pub actual_start: usize,
    pub actual_count: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// The unified-diff range header, e.g. `@@ -3,4 +3,5 @@`.
    ///
    /// Line numbers are 1-based; an empty range is numbered after the line
    /// it follows.
    pub fn header(&self) -> String {
        let display = |start: usize, count: usize| if count == 0 { start } else { start + 1 };
        format!(
            "@@ -{},{} +{},{} @@",
            display(self.expected_start, self.expected_count),
            self.expected_count,
            display(self.actual_start, self.actual_count),
            self.actual_count
        )
    }
}

/// A single line in a hunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunkLine {
    /// Present in both texts.
    Context(String),
    /// Present only in the actual text.
    Added(String),
    /// Present only in the expected text.
    Removed(String),
}

impl std::fmt::Display for HunkLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context(l) => write!(f, " {l}"),
            Self::Added(l) => write!(f, "+{l}"),
            Self::Removed(l) => write!(f, "-{l}"),
        }
    }
}

fn build_hunk(group: &[DiffOp], expected: &[String], actual: &[String]) -> Hunk {
    let (expected_start, actual_start) = group
        .first()
        .map(|op| (op.old_range().start, op.new_range().start))
        .unwrap_or_default();
    let mut lines = Vec::new();
    let (mut expected_count, mut actual_count) = (0, 0);
    for op in group {
        for change in op.iter_changes(expected, actual) {
            let text = change.value();
            match change.tag() {
                ChangeTag::Equal => {
                    lines.push(HunkLine::Context(text));
                    expected_count += 1;
                    actual_count += 1;
                }
                ChangeTag::Delete => {
                    lines.push(HunkLine::Removed(text));
                    expected_count += 1;
                }
                ChangeTag::Insert => {
                    lines.push(HunkLine::Added(text));
                    actual_count += 1;
                }
            }
        }
    }
    Hunk {
        expected_start,
        expected_count,
        actual_start,
        actual_count,
        lines,
    }
}

/// Computes line deltas between two texts.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineDiffer;

impl LineDiffer {
    pub fn new() -> Self {
        Self
    }

    /// Read both sources to the end and diff their lines.
    ///
    /// Both sources are released before returning, whatever the outcome.
    /// A read failure takes priority over a release failure.
    pub fn diff<A, E>(&self, actual: &mut A, expected: &mut E) -> DiffResult<Patch>
    where
        A: LineSource + ?Sized,
        E: LineSource + ?Sized,
    {
        let (actual_name, expected_name) = (actual.description(), expected.description());
        let outcome = read_all(actual).and_then(|a| Ok((a, read_all(expected)?)));
        let released = [actual.release(), expected.release()];
        let (actual_lines, expected_lines) =
            settle(outcome, released).map_err(|source| DiffError::Io {
                expected: expected_name.clone(),
                actual: actual_name.clone(),
                source,
            })?;
        let patch = self.diff_lines(&actual_lines, &expected_lines);
        debug!(
            actual = %actual_name,
            expected = %expected_name,
            deltas = patch.len(),
            "diffed line sources"
        );
        Ok(patch)
    }

    /// Diff two line sequences.
    pub fn diff_lines(&self, actual: &[String], expected: &[String]) -> Patch {
        let ops = similar::capture_diff_slices(Algorithm::Myers, expected, actual);
        // Anchors come from running cursors; only the op lengths are used.
        let (mut e, mut a) = (0, 0);
        let mut deltas = Vec::new();
        for op in &ops {
            let (tag, old, new) = op.as_tag_tuple();
            let (old_len, new_len) = (old.len(), new.len());
            let kind = match tag {
                DiffTag::Equal => None,
                DiffTag::Insert => Some(DeltaKind::Insert),
                DiffTag::Delete => Some(DeltaKind::Delete),
                DiffTag::Replace => Some(DeltaKind::Change),
            };
            if let Some(kind) = kind {
                deltas.push(LineDelta {
                    kind,
                    expected: Chunk::new(e, run(expected, e, old_len)),
                    actual: Chunk::new(a, run(actual, a, new_len)),
                });
            }
            e += old_len;
            a += new_len;
        }
        Patch { deltas }
    }

    /// Diff two texts line by line.
    pub fn diff_texts(&self, actual: &str, expected: &str) -> Patch {
        self.diff_lines(&split_lines(actual), &split_lines(expected))
    }
}

fn run(lines: &[String], start: usize, len: usize) -> Vec<String> {
    lines
        .get(start..start + len)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

fn read_all<S: LineSource + ?Sized>(source: &mut S) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    while let Some(line) = source.read_line()? {
        lines.push(line);
    }
    Ok(lines)
}

/// Split text into lines, dropping `\n` and `\r\n` terminators. A trailing
/// terminator does not start an extra empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
