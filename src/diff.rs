//! Previews of rewrites as unified diffs.

use crate::report::DiffSummary;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

/// Line-level comparison of a file before and after rewriting.
pub struct FileDiff<'a> {
    diff: TextDiff<'a, 'a, 'a, str>,
}

impl<'a> FileDiff<'a> {
    pub fn new(original: &'a str, modified: &'a str) -> Self {
        Self {
            diff: TextDiff::from_lines(original, modified),
        }
    }

    /// Counts inserted and deleted lines.
    pub fn summary(&self) -> DiffSummary {
        let (insertions, deletions) =
            self.diff
                .iter_all_changes()
                .fold((0, 0), |(ins, del), change| match change.tag() {
                    ChangeTag::Insert => (ins + 1, del),
                    ChangeTag::Delete => (ins, del + 1),
                    ChangeTag::Equal => (ins, del),
                });
        DiffSummary::new(insertions, deletions)
    }

    /// Renders the change with `a/` and `b/` headers for `path`.
    pub fn unified(&'a self, path: &Path) -> String {
        let name = path.display();
        self.diff
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{name}"), &format!("b/{name}"))
            .to_string()
    }
}

/// Colorizes a unified diff for terminal display.
pub fn colorized_diff(diff: &str) -> String {
    const RED: &str = "\x1b[31m";
    const GREEN: &str = "\x1b[32m";
    const CYAN: &str = "\x1b[36m";
    const RESET: &str = "\x1b[0m";

    let mut output = String::new();
    for line in diff.lines() {
        let color = if line.starts_with("---") || line.starts_with("+++") || line.starts_with("@@")
        {
            CYAN
        } else if line.starts_with('-') {
            RED
        } else if line.starts_with('+') {
            GREEN
        } else {
            ""
        };

        if color.is_empty() {
            let _ = writeln!(&mut output, "{line}");
        } else {
            let _ = writeln!(&mut output, "{color}{line}{RESET}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_lines() {
        let summary = FileDiff::new("a\nb\nc\n", "a\nB\nc\nd\n").summary();
        assert_eq!(summary.files_changed, 1);
        assert_eq!(summary.insertions, 2);
        assert_eq!(summary.deletions, 1);
    }

    #[test]
    fn test_unchanged_summary() {
        let summary = FileDiff::new("same\n", "same\n").summary();
        assert_eq!(summary, DiffSummary::default());
    }

    #[test]
    fn test_unified_marks_changes() {
        let diff = FileDiff::new("x\nold\n", "x\nnew\n").unified(Path::new("svc.js"));
        assert!(diff.starts_with("--- a/svc.js\n+++ b/svc.js\n@@ "));
        assert!(diff.contains("\n-old\n"));
        assert!(diff.contains("\n+new\n"));
    }

    #[test]
    fn test_unified_notes_missing_final_newline() {
        let diff = FileDiff::new("x\nold", "x\nold\nnew").unified(Path::new("svc.js"));
        assert!(diff.contains("No newline at end of file"));
        assert!(diff.contains("+new"));
    }

    #[test]
    fn test_colorized_headers_and_changes() {
        let colored = colorized_diff("--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n c\n");
        assert!(colored.contains("\x1b[31m-a\x1b[0m"));
        assert!(colored.contains("\x1b[32m+b\x1b[0m"));
        assert!(colored.contains("\x1b[36m@@ -1 +1 @@\x1b[0m"));
        assert!(colored.ends_with(" c\n"));
    }
}
