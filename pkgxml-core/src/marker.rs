//! Namespace-marker stripping.
//!
//! A managed package's manifest carries a `<namespacePrefix>` line naming the
//! org's namespace. Two orgs of the same package legitimately differ there, so
//! the line is removed before comparison. Only a single unambiguous match is
//! removed; zero or several matches leave the manifest untouched.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{io_err, ManifestError};

static NAMESPACE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<namespacePrefix>[A-Za-z0-9_-]+</namespacePrefix>")
        .expect("namespace marker pattern is a valid regex")
});

/// What [`strip_namespace_marker`] did to a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StripOutcome {
    /// Exactly one marker line was found and removed.
    Stripped {
        /// The removed line, without its line terminator.
        line: String,
        #[serde(skip_serializing)]
        text: String,
    },
    /// No line matched.
    NotFound,
    /// More than one line matched; nothing was removed.
    Ambiguous { count: usize },
}

impl StripOutcome {
    pub fn is_stripped(&self) -> bool {
        matches!(self, StripOutcome::Stripped { .. })
    }
}

/// Whether `line` contains a namespace marker element.
pub fn is_marker_line(line: &str) -> bool {
    NAMESPACE_MARKER.is_match(line)
}

/// Remove the single namespace-marker line from `text`, if there is exactly one.
///
/// The whole line goes, terminator included, so no blank line is left behind.
/// Every other line keeps its content, terminator and position.
pub fn strip_namespace_marker(text: &str) -> StripOutcome {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let matches: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_marker_line(line))
        .map(|(idx, _)| idx)
        .collect();

    let idx = match matches.as_slice() {
        [] => return StripOutcome::NotFound,
        [idx] => *idx,
        many => return StripOutcome::Ambiguous { count: many.len() },
    };

    let marker = lines[idx];
    let mut stripped = String::with_capacity(text.len() - marker.len());
    for (_, line) in lines.iter().enumerate().filter(|(i, _)| *i != idx) {
        stripped.push_str(line);
    }

    // An unterminated final marker line leaves a dangling break on the line before it.
    if idx + 1 == lines.len() && !marker.ends_with('\n') {
        if stripped.ends_with('\n') {
            stripped.pop();
        }
        if stripped.ends_with('\r') {
            stripped.pop();
        }
    }

    StripOutcome::Stripped {
        line: marker.trim_end_matches(['\r', '\n']).to_string(),
        text: stripped,
    }
}

/// Strip the marker from the manifest at `path`, rewriting the file in place.
///
/// The file is only written when a line was actually removed.
pub fn strip_file(path: &Path) -> Result<StripOutcome, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let outcome = strip_namespace_marker(&text);

    match &outcome {
        StripOutcome::Stripped { line, text } => {
            std::fs::write(path, text).map_err(|e| io_err(path, e))?;
            tracing::debug!(path = %path.display(), marker = %line.trim(), "stripped namespace marker");
        }
        StripOutcome::NotFound => {
            tracing::debug!(path = %path.display(), "no namespace marker found");
        }
        StripOutcome::Ambiguous { count } => {
            tracing::warn!(
                path = %path.display(),
                count,
                "several namespace markers found; leaving manifest unchanged"
            );
        }
    }

    Ok(outcome)
}
