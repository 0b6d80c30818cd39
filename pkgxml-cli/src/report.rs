//! Text rendering of a [`RunReport`].

use std::fmt::Write;

use colored::Colorize;

use pkgxml_core::{SegmentTag, StripOutcome};
use pkgxml_runner::{OrgManifest, RunReport};

pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Comparing package manifests of '{}' and '{}'",
        report.org1.org, report.org2.org
    );

    for org in [&report.org1, &report.org2] {
        if let Some(note) = strip_note(org) {
            let _ = writeln!(out, "{}", note.yellow());
        }
    }

    for segment in &report.diff.changes {
        let sign = segment.tag.sign();
        for line in segment.lines() {
            let rendered = format!("{sign} {line}");
            let rendered = match segment.tag {
                SegmentTag::Added => rendered.green(),
                SegmentTag::Removed => rendered.red(),
                SegmentTag::Unchanged => rendered.normal(),
            };
            let _ = writeln!(out, "{rendered}");
        }
    }

    if report.diff.changes.is_empty() {
        let _ = writeln!(out, "{}", "✓ Manifests are identical.".green());
    } else {
        let _ = writeln!(
            out,
            "{}",
            format!(
                "✗ Manifests differ ({} added, {} removed).",
                report.diff.added_lines(),
                report.diff.removed_lines()
            )
            .red()
        );
    }

    for path in &report.saved {
        let _ = writeln!(out, "  ✎  saved {}", path.display());
    }
    for path in &report.kept_workspaces {
        let _ = writeln!(out, "  ·  kept {}", path.display());
    }
    out
}

fn strip_note(org: &OrgManifest) -> Option<String> {
    match org.strip.as_ref()? {
        StripOutcome::Ambiguous { count } => Some(format!(
            "! '{}': {count} namespace markers found, none stripped",
            org.org
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pkgxml_core::{diff_manifests, OrgAlias};
    use pkgxml_runner::Stage;

    use super::*;

    fn report(old: &str, new: &str) -> RunReport {
        let diff = diff_manifests(old, new);
        RunReport {
            org1: OrgManifest {
                org: OrgAlias::from("dev"),
                strip: Some(StripOutcome::Ambiguous { count: 2 }),
            },
            org2: OrgManifest {
                org: OrgAlias::from("qa"),
                strip: None,
            },
            outcome: diff.outcome(),
            diff,
            saved: Vec::new(),
            kept_workspaces: Vec::new(),
            stages: vec![Stage::Start, Stage::Done],
        }
    }

    #[test]
    fn renders_changes_with_signs_and_summary() {
        colored::control::set_override(false);
        let text = render(&report("<a/>\n<b/>", "<a/>\n<c/>"));
        assert!(text.contains("'dev' and 'qa'"));
        assert!(text.contains("- <b/>\n+ <c/>\n"));
        assert!(text.contains("Manifests differ (1 added, 1 removed)"));
        assert!(text.contains("'dev': 2 namespace markers found"));
        assert!(!text.contains("<a/>"));
    }

    #[test]
    fn renders_identical_summary() {
        colored::control::set_override(false);
        let text = render(&report("<a/>", "<a/>"));
        assert!(text.contains("Manifests are identical."));
    }
}
