//! Rewrite rules and the ordered rule set they are applied from.

pub mod file;
pub mod insert;
pub mod substitute;

pub use file::{FileTransformer, Rewritten};
pub use insert::InsertRule;
pub use substitute::SubstituteRule;

use crate::error::{RewriteError, Result};
use crate::matcher::{DefinitionMatcher, Marker, SymbolMatcher, is_identifier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Placeholder replaced by a target's parameter when a template is rendered.
pub const PARAM_PLACEHOLDER: &str = "{param}";

/// Text with an optional `{param}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    /// Creates a template from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Substitutes the parameter into the template.
    pub fn render(&self, param: &str) -> String {
        self.0.replace(PARAM_PLACEHOLDER, param)
    }

    /// Returns the unrendered text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the template uses the parameter.
    pub fn is_parameterized(&self) -> bool {
        self.0.contains(PARAM_PLACEHOLDER)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// What the idempotence guard sees for one rule in one piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleState {
    /// The pre-transform form is present; the rule has work to do.
    Pending,
    /// Only the post-transform form is present.
    Applied,
    /// Neither form is present.
    NotApplicable,
}

/// What happened to one rule during a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RuleOutcome {
    Applied { edits: usize },
    AlreadyApplied,
    NoMatch,
}

impl RuleOutcome {
    /// Returns true if the rule changed the content.
    pub fn changed(&self) -> bool {
        matches!(self, RuleOutcome::Applied { edits } if *edits > 0)
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Applied { edits } => write!(f, "applied ({edits} edit(s))"),
            RuleOutcome::AlreadyApplied => f.write_str("already applied"),
            RuleOutcome::NoMatch => f.write_str("no match"),
        }
    }
}

/// Content produced by one rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub edits: usize,
}

/// The matching footprint of a rule, used to detect conflicting rule sets.
#[derive(Debug, Clone, Copy)]
pub enum RuleShape<'a> {
    Insert {
        anchor: &'a str,
        line: &'a Template,
        marker: &'a Template,
    },
    Substitute {
        symbol: &'a str,
        replacement: &'a Template,
        definition: Option<&'a Template>,
    },
}

/// A pure, idempotent text transformation keyed by a marker or symbol.
pub trait Rule: Send + Sync {
    /// Returns the rule name.
    fn name(&self) -> &str;

    /// Classifies `source` for this rule without changing it.
    fn state(&self, source: &str, param: &str) -> RuleState;

    /// Rewrites `source` unconditionally. Callers check [`Rule::state`] first.
    fn rewrite(&self, source: &str, param: &str) -> Result<Rewrite>;

    /// Returns the rule's matching footprint.
    fn shape(&self) -> RuleShape<'_>;

    /// Returns a description of the rule.
    fn describe(&self) -> String;

    /// Applies the rule if the guard admits it.
    fn apply(&self, source: &str, param: &str) -> Result<(String, RuleOutcome)> {
        match self.state(source, param) {
            RuleState::Pending => {
                let rewrite = self.rewrite(source, param)?;
                Ok((
                    rewrite.content,
                    RuleOutcome::Applied {
                        edits: rewrite.edits,
                    },
                ))
            }
            RuleState::Applied => Ok((source.to_string(), RuleOutcome::AlreadyApplied)),
            RuleState::NotApplicable => Ok((source.to_string(), RuleOutcome::NoMatch)),
        }
    }
}

/// An ordered, validated, immutable set of rules.
pub struct TransformSpec {
    name: String,
    rules: Vec<Box<dyn Rule>>,
}

impl TransformSpec {
    /// Validates and builds a spec from rules in application order.
    pub fn new(name: impl Into<String>, rules: Vec<Box<dyn Rule>>) -> Result<Self> {
        let spec = Self {
            name: name.into(),
            rules,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Starts a builder.
    pub fn builder(name: impl Into<String>) -> TransformSpecBuilder {
        TransformSpecBuilder {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Returns the spec name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rules in application order.
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Returns descriptions of all rules.
    pub fn describe(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|r| format!("{}: {}", r.name(), r.describe()))
            .collect()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Symbols rewritten by substitution rules.
    pub fn substituted_symbols(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter_map(|r| match r.shape() {
                RuleShape::Substitute { symbol, .. } => Some(symbol),
                RuleShape::Insert { .. } => None,
            })
            .collect()
    }

    /// Rejects a parameter that would reintroduce a substituted symbol, or
    /// that hides an insertion marker inside its own line.
    pub fn check_param(&self, param: &str) -> Result<()> {
        for symbol in self.substituted_symbols() {
            if SymbolMatcher::new(symbol).include_literals().is_present(param) {
                return Err(conflict(format!(
                    "parameter '{param}' contains substituted symbol '{symbol}'"
                )));
            }
        }
        for rule in &self.rules {
            if let RuleShape::Insert { line, marker, .. } = rule.shape()
                && !marker_detected(line, marker, param)
            {
                return Err(conflict(format!(
                    "rule '{}': marker '{}' is not detectable in the inserted line for parameter '{param}'",
                    rule.name(),
                    marker.render(param)
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(conflict("spec has no rules"));
        }

        let mut names = HashSet::new();
        for rule in &self.rules {
            if rule.name().trim().is_empty() {
                return Err(conflict("rule name must not be empty"));
            }
            if !names.insert(rule.name()) {
                return Err(conflict(format!("duplicate rule name '{}'", rule.name())));
            }
            validate_shape(rule.name(), rule.shape())?;
        }

        for (i, first) in self.rules.iter().enumerate() {
            for second in &self.rules[i + 1..] {
                check_pair(first.as_ref(), second.as_ref())?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformSpec")
            .field("name", &self.name)
            .field("rules", &self.describe())
            .finish()
    }
}

/// Builder for [`TransformSpec`].
pub struct TransformSpecBuilder {
    name: String,
    rules: Vec<Box<dyn Rule>>,
}

impl TransformSpecBuilder {
    /// Adds an insert-after-anchor rule.
    pub fn insert_after(
        mut self,
        name: impl Into<String>,
        anchor: impl Into<String>,
        line: impl Into<Template>,
    ) -> Self {
        self.rules
            .push(Box::new(InsertRule::new(name, anchor, line)));
        self
    }

    /// Adds a symbol substitution rule.
    pub fn substitute(
        mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        replacement: impl Into<Template>,
    ) -> Self {
        self.rules
            .push(Box::new(SubstituteRule::new(name, symbol, replacement)));
        self
    }

    /// Adds a prepared rule.
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Validates and builds the spec.
    pub fn build(self) -> Result<TransformSpec> {
        TransformSpec::new(self.name, self.rules)
    }
}

fn conflict(message: impl Into<String>) -> RewriteError {
    RewriteError::SpecConflict(message.into())
}

const SAMPLE_PARAM: &str = "param";

// A marker masked within its own line is never seen, so the line would be
// inserted on every run.
fn marker_detected(line: &Template, marker: &Template, param: &str) -> bool {
    Marker::new(marker.render(param)).is_present(&line.render(param))
}

fn validate_shape(name: &str, shape: RuleShape<'_>) -> Result<()> {
    match shape {
        RuleShape::Insert {
            anchor,
            line,
            marker,
        } => {
            if anchor.trim().is_empty() {
                return Err(conflict(format!("rule '{name}': anchor must not be empty")));
            }
            if line.as_str().trim().is_empty() {
                return Err(conflict(format!("rule '{name}': inserted line must not be empty")));
            }
            if line.as_str().contains('\n') {
                return Err(conflict(format!("rule '{name}': inserted line must be a single line")));
            }
            if marker.as_str().is_empty() || !line.as_str().contains(marker.as_str()) {
                return Err(conflict(format!(
                    "rule '{name}': inserted line does not contain its marker '{marker}'"
                )));
            }
            if !marker_detected(line, marker, SAMPLE_PARAM) {
                return Err(conflict(format!(
                    "rule '{name}': marker '{marker}' lies inside a comment or string of the inserted line"
                )));
            }
        }
        RuleShape::Substitute {
            symbol,
            replacement,
            definition,
        } => {
            if !is_identifier(symbol) {
                return Err(conflict(format!(
                    "rule '{name}': '{symbol}' is not an identifier"
                )));
            }
            let matcher = SymbolMatcher::new(symbol).include_literals();
            if matcher.is_present(replacement.as_str()) {
                return Err(conflict(format!(
                    "rule '{name}': replacement '{replacement}' reintroduces '{symbol}'"
                )));
            }
            if let Some(definition) = definition {
                if matcher.is_present(definition.as_str()) {
                    return Err(conflict(format!(
                        "rule '{name}': definition comment '{definition}' reintroduces '{symbol}'"
                    )));
                }
                DefinitionMatcher::new(symbol)?;
            }
        }
    }
    Ok(())
}

// `first` precedes `second` in application order.
fn check_pair(first: &dyn Rule, second: &dyn Rule) -> Result<()> {
    match (first.shape(), second.shape()) {
        (
            RuleShape::Substitute { symbol: a, .. },
            RuleShape::Substitute { symbol: b, .. },
        ) if a == b => Err(conflict(format!(
            "rules '{}' and '{}' both substitute '{a}'",
            first.name(),
            second.name()
        ))),
        (
            RuleShape::Insert {
                anchor: a,
                line: line_a,
                marker: marker_a,
            },
            RuleShape::Insert {
                anchor: b,
                line: line_b,
                marker: marker_b,
            },
        ) if a.trim() == b.trim() && marker_a == marker_b && line_a != line_b => {
            Err(conflict(format!(
                "rules '{}' and '{}' share anchor and marker but insert different lines",
                first.name(),
                second.name()
            )))
        }
        (RuleShape::Substitute { symbol, .. }, RuleShape::Insert { anchor, line, marker }) => {
            let matcher = SymbolMatcher::new(symbol).include_literals();
            if matcher.is_present(anchor) {
                return Err(conflict(format!(
                    "rule '{}' rewrites '{symbol}', which removes the anchor of later rule '{}'",
                    first.name(),
                    second.name()
                )));
            }
            check_insert_text(first.name(), symbol, second.name(), line, marker)
        }
        (RuleShape::Insert { line, marker, .. }, RuleShape::Substitute { symbol, .. }) => {
            check_insert_text(second.name(), symbol, first.name(), line, marker)
        }
        _ => Ok(()),
    }
}

fn check_insert_text(
    substitute: &str,
    symbol: &str,
    insert: &str,
    line: &Template,
    marker: &Template,
) -> Result<()> {
    let matcher = SymbolMatcher::new(symbol).include_literals();
    if matcher.is_present(line.as_str()) || matcher.is_present(marker.as_str()) {
        return Err(conflict(format!(
            "rule '{substitute}' rewrites '{symbol}', which appears in the line inserted by '{insert}'"
        )));
    }
    Ok(())
}
