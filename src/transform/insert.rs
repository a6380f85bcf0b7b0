//! Insert-after-anchor rule.

use super::{Rewrite, Rule, RuleShape, RuleState, Template};
use crate::error::{RewriteError, Result};
use crate::matcher::{LineAnchor, Marker};

/// Inserts a line directly after an anchor line unless a marker is already present.
///
/// The marker check is the rule's own idempotence guard: once the inserted
/// line exists the rule never fires again.
#[derive(Debug, Clone)]
pub struct InsertRule {
    name: String,
    anchor: String,
    line: Template,
    marker: Template,
}

impl InsertRule {
    /// Creates an insertion rule.
    ///
    /// The marker defaults to the inserted line without its trailing `;`.
    pub fn new(name: impl Into<String>, anchor: impl Into<String>, line: impl Into<Template>) -> Self {
        let line = line.into();
        let marker = Template::new(line.as_str().trim().trim_end_matches(';').trim_end());
        Self {
            name: name.into(),
            anchor: anchor.into(),
            line,
            marker,
        }
    }

    /// Overrides the marker whose presence means the line is already there.
    pub fn marker(mut self, marker: impl Into<Template>) -> Self {
        self.marker = marker.into();
        self
    }
}

impl Rule for InsertRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self, source: &str, param: &str) -> RuleState {
        if Marker::new(self.marker.render(param)).is_present(source) {
            RuleState::Applied
        } else if LineAnchor::new(self.anchor.as_str()).find(source).is_some() {
            RuleState::Pending
        } else {
            RuleState::NotApplicable
        }
    }

    fn rewrite(&self, source: &str, param: &str) -> Result<Rewrite> {
        let found = LineAnchor::new(self.anchor.as_str())
            .find(source)
            .ok_or_else(|| RewriteError::TransformFailed {
                rule: self.name.clone(),
                message: format!("anchor '{}' not found", self.anchor),
            })?;

        let head = &source[..found.next_line_start];
        let tail = &source[found.next_line_start..];
        let eol = if head.ends_with("\r\n") || (!found.terminated && source.contains("\r\n")) {
            "\r\n"
        } else {
            "\n"
        };

        let mut content = String::with_capacity(source.len() + self.line.as_str().len() + 8);
        content.push_str(head);
        if !found.terminated {
            content.push_str(eol);
        }
        content.push_str(&found.indent);
        content.push_str(&self.line.render(param));
        if found.terminated {
            content.push_str(eol);
        }
        content.push_str(tail);

        Ok(Rewrite { content, edits: 1 })
    }

    fn shape(&self) -> RuleShape<'_> {
        RuleShape::Insert {
            anchor: &self.anchor,
            line: &self.line,
            marker: &self.marker,
        }
    }

    fn describe(&self) -> String {
        format!(
            "Insert '{}' after '{}' unless '{}' is present",
            self.line, self.anchor, self.marker
        )
    }
}
