//! Pattern matching over raw source text.
//!
//! Matchers are read-only. They locate:
//!
//! - whole-symbol identifier occurrences ([`SymbolMatcher`])
//! - constant definition lines for a symbol ([`DefinitionMatcher`])
//! - anchor lines compared by trimmed text ([`LineAnchor`])
//! - literal markers ([`Marker`])
//!
//! All of them skip comments and string literals found by the
//! [`lexical`] scan.

pub mod anchor;
pub mod lexical;
pub mod symbol;

pub use anchor::{AnchorLine, LineAnchor, Marker};
pub use symbol::{DefinitionMatcher, DefinitionSite, SymbolMatcher, is_ident_char, is_identifier};

use serde::Serialize;
use std::ops::Range;

/// A byte range within a source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchRegion {
    pub start: usize,
    pub end: usize,
}

impl MatchRegion {
    /// Creates a region from byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the region as a range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the matched text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }

    /// Returns the region length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true for a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `other` lies within this region.
    pub fn contains(&self, other: &MatchRegion) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
