//! Per-target results and batch summaries.

use crate::transform::RuleOutcome;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome kind of transforming one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "kebab-case")]
pub enum TransformStatus {
    /// New content was produced (and written, unless in dry-run).
    Applied,
    /// Content already had the post-transform shape, or nothing matched.
    Skipped,
    /// The target file does not exist.
    NotFound,
    /// Reading, rewriting or writing failed.
    Failed(String),
}

impl TransformStatus {
    /// Returns a short label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            TransformStatus::Applied => "applied",
            TransformStatus::Skipped => "skipped",
            TransformStatus::NotFound => "not-found",
            TransformStatus::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for TransformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What one rule did to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    pub outcome: RuleOutcome,
}

/// Result of transforming one target.
#[derive(Debug, Clone, Serialize)]
pub struct TransformResult {
    pub path: PathBuf,
    pub param: String,
    pub status: TransformStatus,
    /// Human-readable cause of the status.
    pub cause: String,
    pub rules: Vec<RuleReport>,
    /// True when some rules were already applied and others were not.
    pub partial: bool,
    pub diff: DiffSummary,
    /// True when new content reached the disk.
    pub written: bool,
    /// Unified diff of the change, kept in dry-run mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl TransformResult {
    fn bare(path: &Path, param: &str, status: TransformStatus, cause: String) -> Self {
        Self {
            path: path.to_path_buf(),
            param: param.to_string(),
            status,
            cause,
            rules: Vec::new(),
            partial: false,
            diff: DiffSummary::default(),
            written: false,
            preview: None,
        }
    }

    /// A result for a missing file.
    pub fn not_found(path: &Path, param: &str) -> Self {
        Self::bare(path, param, TransformStatus::NotFound, "file not found".into())
    }

    /// A result for a failed target.
    pub fn failed(path: &Path, param: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::bare(path, param, TransformStatus::Failed(reason.clone()), reason)
    }

    /// A result for content that needed no change.
    pub fn skipped(path: &Path, param: &str, cause: impl Into<String>, rules: Vec<RuleReport>) -> Self {
        Self {
            rules,
            ..Self::bare(path, param, TransformStatus::Skipped, cause.into())
        }
    }

    /// Returns true if the target failed.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, TransformStatus::Failed(_))
    }

    /// Names of the rules that changed this target.
    pub fn changed_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.outcome.changed())
            .map(|r| r.rule.as_str())
            .collect()
    }
}

impl fmt::Display for TransformResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<9} {} ({})", self.status.label(), self.path.display(), self.cause)
    }
}

/// Inserted and deleted line counts, summed over changed files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Counts for a single file; an empty change counts no file.
    pub fn new(insertions: usize, deletions: usize) -> Self {
        Self {
            files_changed: usize::from(insertions + deletions > 0),
            insertions,
            deletions,
        }
    }

    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}

/// A failed target, named by file and reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate counts for a batch.
///
/// `applied + skipped + not_found + failed == total` always holds.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub applied: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub failed: usize,
    pub failures: Vec<Failure>,
    pub diff: DiffSummary,
}

impl BatchSummary {
    /// Aggregates results in order.
    pub fn from_results(results: &[TransformResult]) -> Self {
        let mut summary = BatchSummary::default();
        for result in results {
            summary.record(result);
        }
        summary
    }

    /// Adds one result to the counts.
    pub fn record(&mut self, result: &TransformResult) {
        self.total += 1;
        match &result.status {
            TransformStatus::Applied => self.applied += 1,
            TransformStatus::Skipped => self.skipped += 1,
            TransformStatus::NotFound => self.not_found += 1,
            TransformStatus::Failed(reason) => {
                self.failed += 1;
                self.failures.push(Failure {
                    path: result.path.clone(),
                    reason: reason.clone(),
                });
            }
        }
        self.diff.merge(&result.diff);
    }

    /// Returns true if any target failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Returns true if the counts add up to the total.
    pub fn is_consistent(&self) -> bool {
        self.applied + self.skipped + self.not_found + self.failed == self.total
            && self.failures.len() == self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} target(s): {} applied, {} skipped, {} not found, {} failed",
            self.total, self.applied, self.skipped, self.not_found, self.failed
        )
    }
}

/// Everything a batch run produced: results in input order plus the summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<TransformResult>,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Builds a report, aggregating the summary from the results.
    pub fn new(results: Vec<TransformResult>) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self { results, summary }
    }

    /// Results for failed targets.
    pub fn failures(&self) -> impl Iterator<Item = &TransformResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// Joined unified diffs of all previewed changes.
    pub fn preview(&self) -> String {
        self.results
            .iter()
            .filter_map(|r| r.preview.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(path: &str) -> TransformResult {
        TransformResult {
            status: TransformStatus::Applied,
            cause: "rewritten".into(),
            ..TransformResult::not_found(Path::new(path), "p")
        }
    }

    #[test]
    fn test_diff_summary_merge() {
        let mut total = DiffSummary::new(1, 1);
        total.merge(&DiffSummary::new(1, 0));
        total.merge(&DiffSummary::new(0, 0));
        assert_eq!(
            total,
            DiffSummary {
                files_changed: 2,
                insertions: 2,
                deletions: 1
            }
        );
    }

    #[test]
    fn test_summary_counts_each_kind() {
        let results = vec![
            applied("a.js"),
            TransformResult::skipped(Path::new("b.js"), "p", "already applied", Vec::new()),
            TransformResult::not_found(Path::new("c.js"), "p"),
            TransformResult::failed(Path::new("d.js"), "p", "permission denied"),
            applied("e.js"),
        ];

        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_consistent());
        assert!(summary.has_failures());
        assert_eq!(
            summary.failures,
            vec![Failure {
                path: PathBuf::from("d.js"),
                reason: "permission denied".into()
            }]
        );
    }

    #[test]
    fn test_status_serializes_with_reason() {
        let json = serde_json::to_value(TransformStatus::Failed("boom".into())).unwrap();
        assert_eq!(json["kind"], "failed");
        assert_eq!(json["reason"], "boom");

        let json = serde_json::to_value(TransformStatus::NotFound).unwrap();
        assert_eq!(json["kind"], "not-found");
    }

    #[test]
    fn test_summary_display() {
        let summary = BatchSummary::from_results(&[applied("a.js")]);
        assert_eq!(
            summary.to_string(),
            "1 target(s): 1 applied, 0 skipped, 0 not found, 0 failed"
        );
    }
}
