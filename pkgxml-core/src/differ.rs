//! Trimmed line diff between two manifests.
//!
//! Lines are compared with leading and trailing whitespace removed, so a
//! re-indented manifest compares equal to the original. The diff itself is
//! a Myers line diff over the trimmed lines, which is minimal and stable for
//! identical inputs.

use std::fmt;

use serde::Serialize;
use similar::{Algorithm, ChangeTag, TextDiff};

use crate::types::DiffOutcome;

/// Which side of the comparison a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentTag {
    /// Present only in the second manifest.
    Added,
    /// Present only in the first manifest.
    Removed,
    Unchanged,
}

impl SegmentTag {
    fn from_change(tag: ChangeTag) -> Self {
        match tag {
            ChangeTag::Insert => SegmentTag::Added,
            ChangeTag::Delete => SegmentTag::Removed,
            ChangeTag::Equal => SegmentTag::Unchanged,
        }
    }

    /// Prefix used when the segment is printed as diff lines.
    pub fn sign(self) -> char {
        match self {
            SegmentTag::Added => '+',
            SegmentTag::Removed => '-',
            SegmentTag::Unchanged => ' ',
        }
    }
}

/// A contiguous run of trimmed lines sharing one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSegment {
    pub tag: SegmentTag,
    /// Trimmed lines joined with `\n`.
    pub text: String,
}

impl DiffSegment {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    pub fn is_change(&self) -> bool {
        self.tag != SegmentTag::Unchanged
    }
}

impl fmt::Display for DiffSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = self.tag.sign();
        for line in self.lines() {
            writeln!(f, "{sign} {line}")?;
        }
        Ok(())
    }
}

/// The reportable part of a manifest diff: added and removed segments only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ManifestDiff {
    pub changes: Vec<DiffSegment>,
    /// Number of trimmed lines common to both manifests.
    pub unchanged_lines: usize,
}

impl ManifestDiff {
    pub fn outcome(&self) -> DiffOutcome {
        if self.changes.is_empty() {
            DiffOutcome::Identical
        } else {
            DiffOutcome::Different
        }
    }

    pub fn added_lines(&self) -> usize {
        self.count_lines(SegmentTag::Added)
    }

    pub fn removed_lines(&self) -> usize {
        self.count_lines(SegmentTag::Removed)
    }

    fn count_lines(&self, tag: SegmentTag) -> usize {
        self.changes
            .iter()
            .filter(|s| s.tag == tag)
            .map(DiffSegment::line_count)
            .sum()
    }
}

/// Every segment of the trimmed line diff, unchanged runs included.
pub fn diff_segments(old: &str, new: &str) -> Vec<DiffSegment> {
    let old_lines: Vec<&str> = old.lines().map(str::trim).collect();
    let new_lines: Vec<&str> = new.lines().map(str::trim).collect();

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(old_lines.as_slice(), new_lines.as_slice());

    let mut segments: Vec<DiffSegment> = Vec::new();
    for change in diff.iter_all_changes() {
        let tag = SegmentTag::from_change(change.tag());
        let line: &str = change.value();
        match segments.last_mut() {
            Some(last) if last.tag == tag => {
                last.text.push('\n');
                last.text.push_str(line);
            }
            _ => segments.push(DiffSegment {
                tag,
                text: line.to_string(),
            }),
        }
    }
    segments
}

/// Diff two manifest texts, keeping only the added and removed segments.
pub fn diff_manifests(old: &str, new: &str) -> ManifestDiff {
    let mut diff = ManifestDiff::default();
    for segment in diff_segments(old, new) {
        if segment.is_change() {
            diff.changes.push(segment);
        } else {
            diff.unchanged_lines += segment.line_count();
        }
    }
    diff
}
