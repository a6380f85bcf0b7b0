//! # Rewrite Batch
//!
//! Idempotent, atomic batch rewriting of source files from a declarative rule set.
//!
//! This crate provides:
//! - Boundary-aware matching of symbols, anchor lines and markers that skips
//!   comments and string literals
//! - Two rule shapes: insert a line after an anchor unless a marker is present,
//!   and substitute a symbol (turning its definition into a comment)
//! - An idempotence guard so repeated runs are no-ops and partially migrated
//!   files converge
//! - Atomic in-place writes (temp file in the same directory, then rename)
//! - A batch runner that isolates per-file failures and reports a structured
//!   summary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rewrite_batch::prelude::*;
//!
//! let spec = TransformSpec::builder("tenant-paths")
//!     .insert_after(
//!         "paths-import",
//!         "import { db } from '../config/firebaseConfig';",
//!         "import paths from '../utils/firestorePaths';",
//!     )
//!     .rule(
//!         SubstituteRule::new("collection-name", "COLLECTION_NAME", "paths.{param}()")
//!             .definition_comment("// Multi-tenant: using paths.{param}()"),
//!     )
//!     .build()?;
//!
//! let targets = vec![
//!     Target::new("src/services/noticesService.js", "notices"),
//!     Target::new("src/services/formsService.js", "forms"),
//! ];
//!
//! let report = BatchRunner::new(&spec).run(&targets)?;
//! println!("{}", report.summary);
//! # Ok::<(), rewrite_batch::error::RewriteError>(())
//! ```
//!
//! ## Configuration Files
//!
//! ```rust,no_run
//! use rewrite_batch::prelude::*;
//!
//! let config = BatchConfig::from_path("rewrite.yaml")?;
//! let (spec, targets) = config.build()?;
//! let report = BatchRunner::new(&spec).dry_run(true).run(&targets)?;
//! print!("{}", report.preview());
//! # Ok::<(), rewrite_batch::error::RewriteError>(())
//! ```

pub mod atomic;
pub mod batch;
pub mod config;
pub mod diff;
pub mod error;
pub mod guard;
pub mod matcher;
pub mod presets;
pub mod report;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{BatchRunner, Target, run_batch};
    pub use crate::config::{BatchConfig, RuleConfig};
    pub use crate::error::{Result, RewriteError};
    pub use crate::guard::{GuardReport, IdempotenceGuard};
    pub use crate::matcher::{DefinitionMatcher, LineAnchor, MatchRegion, Marker, SymbolMatcher};
    pub use crate::report::{
        BatchReport, BatchSummary, DiffSummary, Failure, RuleReport, TransformResult,
        TransformStatus,
    };
    pub use crate::transform::{
        FileTransformer, InsertRule, Rule, RuleOutcome, RuleState, SubstituteRule, Template,
        TransformSpec,
    };
}

pub use prelude::*;
