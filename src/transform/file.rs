//! Applying a rule set to one file.

use super::TransformSpec;
use crate::atomic;
use crate::diff::FileDiff;
use crate::error::{RewriteError, Result};
use crate::guard::{GuardReport, IdempotenceGuard};
use crate::report::{RuleReport, TransformResult, TransformStatus};
use crate::transform::{RuleOutcome, RuleState};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Content produced by threading a source through every rule.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub content: String,
    pub rules: Vec<RuleReport>,
    pub guard: GuardReport,
}

impl Rewritten {
    /// Returns true if any rule changed the content.
    pub fn changed(&self) -> bool {
        self.rules.iter().any(|r| r.outcome.changed())
    }
}

/// Applies a [`TransformSpec`] to files, one target at a time.
#[derive(Debug, Clone, Copy)]
pub struct FileTransformer<'a> {
    spec: &'a TransformSpec,
    dry_run: bool,
}

impl<'a> FileTransformer<'a> {
    /// Creates a transformer for the given spec.
    pub fn new(spec: &'a TransformSpec) -> Self {
        Self {
            spec,
            dry_run: false,
        }
    }

    /// Computes results and previews without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Applies every rule in order to in-memory content.
    ///
    /// Each rule is re-checked against the output of the rules before it, so a
    /// rule whose post-transform form is already present never fires twice.
    pub fn rewrite_source(&self, source: &str, param: &str) -> Result<Rewritten> {
        let guard = IdempotenceGuard::new(self.spec);
        let report = guard.inspect(source, param);

        let mut content = source.to_string();
        let mut rules = Vec::with_capacity(self.spec.len());

        for rule in self.spec.rules() {
            let outcome = match guard.check(rule.as_ref(), &content, param) {
                RuleState::Pending => {
                    let rewrite = rule.rewrite(&content, param)?;
                    content = rewrite.content;
                    RuleOutcome::Applied {
                        edits: rewrite.edits,
                    }
                }
                RuleState::Applied => RuleOutcome::AlreadyApplied,
                RuleState::NotApplicable => RuleOutcome::NoMatch,
            };
            debug!(rule = rule.name(), %outcome, "rule evaluated");
            rules.push(RuleReport {
                rule: rule.name().to_string(),
                outcome,
            });
        }

        Ok(Rewritten {
            content,
            rules,
            guard: report,
        })
    }

    /// Transforms one file. Never returns an error: failures become
    /// [`TransformStatus::Failed`] results.
    pub fn transform(&self, path: &Path, param: &str) -> TransformResult {
        match fs::metadata(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "target not found, skipping");
                return TransformResult::not_found(path, param);
            }
            Err(e) => return self.fail(path, param, RewriteError::io_at(path, e)),
            Ok(metadata) if !metadata.is_file() => {
                let error = std::io::Error::other("not a regular file");
                return self.fail(path, param, RewriteError::io_at(path, error));
            }
            Ok(_) => {}
        }

        match self.try_transform(path, param) {
            Ok(result) => result,
            Err(e) => self.fail(path, param, e),
        }
    }

    fn try_transform(&self, path: &Path, param: &str) -> Result<TransformResult> {
        let original = fs::read_to_string(path).map_err(|e| RewriteError::io_at(path, e))?;
        let rewritten = self.rewrite_source(&original, param)?;

        if rewritten.content == original {
            let cause = if rewritten.guard.is_converged() {
                "already applied"
            } else {
                "nothing to rewrite"
            };
            debug!(path = %path.display(), cause, "unchanged");
            return Ok(TransformResult::skipped(path, param, cause, rewritten.rules));
        }

        let partial = rewritten.guard.is_partial();
        if partial {
            info!(
                path = %path.display(),
                applied = ?rewritten.guard.rules_in(RuleState::Applied),
                "partial state detected, applying remaining rules"
            );
        }

        let diff = FileDiff::new(&original, &rewritten.content);
        let summary = diff.summary();
        let preview = self.dry_run.then(|| diff.unified(path));

        if !self.dry_run {
            atomic::write_atomic(path, &rewritten.content)?;
        }

        let changed: Vec<&str> = rewritten
            .rules
            .iter()
            .filter(|r| r.outcome.changed())
            .map(|r| r.rule.as_str())
            .collect();
        let cause = if self.dry_run {
            format!("would apply {}", changed.join(", "))
        } else {
            format!("applied {}", changed.join(", "))
        };

        Ok(TransformResult {
            path: path.to_path_buf(),
            param: param.to_string(),
            status: TransformStatus::Applied,
            cause,
            rules: rewritten.rules,
            partial,
            diff: summary,
            written: !self.dry_run,
            preview,
        })
    }

    fn fail(&self, path: &Path, param: &str, error: RewriteError) -> TransformResult {
        warn!(path = %path.display(), error = %error, "target failed");
        TransformResult::failed(path, param, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ANCHOR: &str = "import { db } from '../config/firebaseConfig';";
    const IMPORT: &str = "import paths from '../utils/firestorePaths';";

    fn spec() -> TransformSpec {
        TransformSpec::builder("tenant-paths")
            .insert_after("paths-import", ANCHOR, IMPORT)
            .rule(
                crate::transform::SubstituteRule::new(
                    "collection-name",
                    "COLLECTION_NAME",
                    "paths.{param}()",
                )
                .definition_comment("// Multi-tenant: using paths.{param}()"),
            )
            .build()
            .unwrap()
    }

    fn service_source() -> String {
        format!(
            "{ANCHOR}\nimport {{ collection, getDocs }} from 'firebase/firestore';\n\n\
             const COLLECTION_NAME = 'notices';\n\n\
             export const list = () => getDocs(collection(db, COLLECTION_NAME));\n\
             export const count = () => collection(db, COLLECTION_NAME).count;\n"
        )
    }

    #[test]
    fn test_scenario_rewrite() {
        let spec = spec();
        let rewritten = FileTransformer::new(&spec)
            .rewrite_source(&service_source(), "notices")
            .unwrap();

        let expected = format!(
            "{ANCHOR}\n{IMPORT}\nimport {{ collection, getDocs }} from 'firebase/firestore';\n\n\
             // Multi-tenant: using paths.notices()\n\n\
             export const list = () => getDocs(collection(db, paths.notices()));\n\
             export const count = () => collection(db, paths.notices()).count;\n"
        );
        assert_eq!(rewritten.content, expected);
        assert_eq!(rewritten.content.matches(IMPORT).count(), 1);
        assert!(rewritten.changed());
    }

    #[test]
    fn test_transform_writes_then_skips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noticesService.js");
        fs::write(&path, service_source()).unwrap();
        let spec = spec();
        let transformer = FileTransformer::new(&spec);

        let first = transformer.transform(&path, "notices");
        assert_eq!(first.status, TransformStatus::Applied);
        assert!(first.written);
        let once = fs::read_to_string(&path).unwrap();

        let second = transformer.transform(&path, "notices");
        assert_eq!(second.status, TransformStatus::Skipped);
        assert_eq!(second.cause, "already applied");
        assert_eq!(fs::read_to_string(&path).unwrap(), once);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let spec = spec();
        let result = FileTransformer::new(&spec).transform(&dir.path().join("nope.js"), "x");
        assert_eq!(result.status, TransformStatus::NotFound);
        assert!(!dir.path().join("nope.js").exists());
    }

    #[test]
    fn test_directory_target_fails() {
        let dir = TempDir::new().unwrap();
        let spec = spec();
        let result = FileTransformer::new(&spec).transform(dir.path(), "x");
        assert!(result.is_failure());
        assert!(result.cause.contains("not a regular file"));
    }

    #[test]
    fn test_invalid_utf8_fails_without_touching_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.js");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let spec = spec();

        let result = FileTransformer::new(&spec).transform(&path, "x");

        assert!(result.is_failure());
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xfe, 0x00]);
    }

    #[test]
    fn test_symbol_absent_leaves_bytes_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("util.js");
        let source = "export const add = (a, b) => a + b;\r\n";
        fs::write(&path, source).unwrap();
        let spec = spec();

        let result = FileTransformer::new(&spec).transform(&path, "x");

        assert_eq!(result.status, TransformStatus::Skipped);
        assert_eq!(result.cause, "nothing to rewrite");
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn test_partial_state_converges() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("formsService.js");
        fs::write(
            &path,
            format!("{ANCHOR}\n{IMPORT}\nconst COLLECTION_NAME = 'forms';\nuse(COLLECTION_NAME);\n"),
        )
        .unwrap();
        let spec = spec();

        let result = FileTransformer::new(&spec).transform(&path, "forms");

        assert_eq!(result.status, TransformStatus::Applied);
        assert!(result.partial);
        assert_eq!(result.changed_rules(), vec!["collection-name"]);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(IMPORT).count(), 1);
        assert_eq!(
            content,
            format!("{ANCHOR}\n{IMPORT}\n// Multi-tenant: using paths.forms()\nuse(paths.forms());\n")
        );
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noticesService.js");
        fs::write(&path, service_source()).unwrap();
        let spec = spec();

        let result = FileTransformer::new(&spec).dry_run(true).transform(&path, "notices");

        assert_eq!(result.status, TransformStatus::Applied);
        assert!(!result.written);
        assert!(result.cause.starts_with("would apply"));
        let preview = result.preview.unwrap();
        assert!(preview.contains(&format!("+{IMPORT}")));
        assert_eq!(fs::read_to_string(&path).unwrap(), service_source());
    }
}
