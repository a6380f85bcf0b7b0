//! Line anchors and literal markers.

use super::MatchRegion;
use super::lexical::{is_inside, masked_regions};

/// A line located by [`LineAnchor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLine {
    /// The anchor line, without its line terminator.
    pub line: MatchRegion,
    /// Byte offset just past the line terminator (or end of input).
    pub next_line_start: usize,
    /// Whether the line ended with a terminator.
    pub terminated: bool,
    /// Leading whitespace of the line.
    pub indent: String,
}

/// Matches the first line whose trimmed text equals the anchor text.
#[derive(Debug, Clone)]
pub struct LineAnchor {
    text: String,
}

impl LineAnchor {
    /// Creates an anchor for the given line text. Surrounding whitespace is ignored.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the anchor text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Finds the first anchor line that is not inside a block comment or string.
    pub fn find(&self, source: &str) -> Option<AnchorLine> {
        let wanted = self.text.trim();
        if wanted.is_empty() {
            return None;
        }

        let masked = masked_regions(source);
        let mut offset = 0;

        for raw in source.split_inclusive('\n') {
            let start = offset;
            offset += raw.len();

            let body = raw.trim_end_matches(['\n', '\r']);
            if body.trim() != wanted {
                continue;
            }

            let indent_len = body.len() - body.trim_start().len();
            if is_inside(&masked, start + indent_len) {
                continue;
            }

            return Some(AnchorLine {
                line: MatchRegion::new(start, start + body.len()),
                next_line_start: offset,
                terminated: raw.ends_with('\n'),
                indent: body[..indent_len].to_string(),
            });
        }

        None
    }
}

/// A literal marker whose presence means an insertion has already happened.
///
/// Occurrences that start inside a comment or string literal do not count, so
/// a commented-out import is treated as absent.
#[derive(Debug, Clone)]
pub struct Marker {
    text: String,
}

impl Marker {
    /// Creates a marker for the given literal text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the marker text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Finds the first live occurrence of the marker.
    pub fn find(&self, source: &str) -> Option<MatchRegion> {
        if self.text.is_empty() {
            return None;
        }
        let masked = masked_regions(source);
        source
            .match_indices(self.text.as_str())
            .map(|(start, _)| MatchRegion::new(start, start + self.text.len()))
            .find(|region| !is_inside(&masked, region.start))
    }

    /// Returns true if the marker is present.
    pub fn is_present(&self, source: &str) -> bool {
        self.find(source).is_some()
    }
}
