//! Batch runner: one transform per target, failures isolated, results in order.

use crate::error::{RewriteError, Result};
use crate::report::{BatchReport, TransformResult, TransformStatus};
use crate::transform::{FileTransformer, TransformSpec};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One unit of work: a file and the parameter substituted into its rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub path: PathBuf,
    pub param: String,
}

impl Target {
    /// Creates a target.
    pub fn new(path: impl Into<PathBuf>, param: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            param: param.into(),
        }
    }

    /// Resolves a relative path against `root`.
    pub fn resolve(mut self, root: &Path) -> Self {
        if self.path.is_relative() {
            self.path = root.join(&self.path);
        }
        self
    }
}

/// Runs a [`TransformSpec`] over an ordered list of targets.
///
/// # Example
///
/// ```rust,no_run
/// use rewrite_batch::prelude::*;
///
/// let spec = TransformSpec::builder("rename")
///     .substitute("old-api", "oldApi", "newApi")
///     .build()?;
/// let targets = vec![Target::new("src/a.js", ""), Target::new("src/b.js", "")];
///
/// let report = BatchRunner::new(&spec).jobs(4).run(&targets)?;
/// println!("{}", report.summary);
/// # Ok::<(), rewrite_batch::error::RewriteError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner<'a> {
    spec: &'a TransformSpec,
    jobs: usize,
    dry_run: bool,
}

impl<'a> BatchRunner<'a> {
    /// Creates a sequential runner.
    pub fn new(spec: &'a TransformSpec) -> Self {
        Self {
            spec,
            jobs: 1,
            dry_run: false,
        }
    }

    /// Sets the number of worker threads. `0` and `1` both run sequentially.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Enables dry-run mode (compute results without writing).
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Checks targets before any file is touched.
    ///
    /// Duplicate paths are rejected so no two workers ever share a file. Paths
    /// are compared after resolving symlinks and `.` components.
    pub fn validate(&self, targets: &[Target]) -> Result<()> {
        let mut seen = HashSet::new();
        for target in targets {
            if !seen.insert(file_identity(&target.path)) {
                return Err(RewriteError::SpecConflict(format!(
                    "duplicate target path {}",
                    target.path.display()
                )));
            }
            self.spec.check_param(&target.param)?;
        }
        Ok(())
    }

    /// Runs every target and returns results in input order.
    pub fn run(&self, targets: &[Target]) -> Result<BatchReport> {
        self.run_with(targets, |_| {})
    }

    /// Like [`BatchRunner::run`], calling `progress` as each target finishes.
    ///
    /// With more than one job `progress` is called from worker threads in
    /// completion order; the returned results are always in input order.
    pub fn run_with<F>(&self, targets: &[Target], progress: F) -> Result<BatchReport>
    where
        F: Fn(&TransformResult) + Sync,
    {
        self.validate(targets)?;

        info!(
            spec = self.spec.name(),
            targets = targets.len(),
            jobs = self.jobs,
            dry_run = self.dry_run,
            "starting batch"
        );

        let transformer = FileTransformer::new(self.spec).dry_run(self.dry_run);
        let process = |target: &Target| {
            let result = transformer.transform(&target.path, &target.param);
            log_result(&result);
            progress(&result);
            result
        };

        let results: Vec<TransformResult> = if self.jobs > 1 && targets.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| RewriteError::InvalidConfig(format!("thread pool: {e}")))?;
            pool.install(|| targets.par_iter().map(process).collect())
        } else {
            targets.iter().map(process).collect()
        };

        let report = BatchReport::new(results);
        info!(summary = %report.summary, "batch finished");
        Ok(report)
    }
}

/// Runs `spec` over `targets` sequentially.
pub fn run_batch(spec: &TransformSpec, targets: &[Target]) -> Result<BatchReport> {
    BatchRunner::new(spec).run(targets)
}

fn log_result(result: &TransformResult) {
    match &result.status {
        TransformStatus::Failed(reason) => {
            warn!(path = %result.path.display(), %reason, "failed");
        }
        status => {
            info!(path = %result.path.display(), %status, cause = %result.cause, "processed");
        }
    }
}

// Missing files resolve through their parent directory when it exists.
fn file_identity(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
