//! Symbol substitution rule.

use super::{Rewrite, Rule, RuleShape, RuleState, Template};
use crate::error::Result;
use crate::matcher::{DefinitionMatcher, MatchRegion, SymbolMatcher};

/// Replaces every occurrence of a symbol with a parameterized expression.
///
/// When a definition comment is configured, the symbol's declaration
/// statement (`const NAME = ...;`) is replaced by that comment instead of being
/// substituted like a usage site. Code after the statement on the same line
/// moves to the next line.
#[derive(Debug, Clone)]
pub struct SubstituteRule {
    name: String,
    symbol: String,
    replacement: Template,
    definition: Option<Template>,
    skip_literals: bool,
}

impl SubstituteRule {
    /// Creates a substitution rule.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        replacement: impl Into<Template>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            replacement: replacement.into(),
            definition: None,
            skip_literals: true,
        }
    }

    /// Replaces the definition line with the given comment.
    pub fn definition_comment(mut self, comment: impl Into<Template>) -> Self {
        self.definition = Some(comment.into());
        self
    }

    /// Also rewrites occurrences inside comments and string literals.
    pub fn include_literals(mut self) -> Self {
        self.skip_literals = false;
        self
    }

    fn symbol_matcher(&self) -> SymbolMatcher {
        let matcher = SymbolMatcher::new(self.symbol.as_str());
        if self.skip_literals {
            matcher
        } else {
            matcher.include_literals()
        }
    }

    fn definition_matcher(&self) -> Result<Option<DefinitionMatcher>> {
        if self.definition.is_none() {
            return Ok(None);
        }
        let matcher = DefinitionMatcher::new(&self.symbol)?;
        Ok(Some(if self.skip_literals {
            matcher
        } else {
            matcher.include_literals()
        }))
    }

    fn edits(&self, source: &str, param: &str) -> Result<Vec<(MatchRegion, String)>> {
        let mut edits = Vec::new();

        if let (Some(matcher), Some(comment)) = (self.definition_matcher()?, &self.definition) {
            let comment = comment.render(param);
            for site in matcher.find_all(source) {
                let text = match site.split {
                    Some(eol) => format!("{}{comment}{eol}{}", site.indent, site.indent),
                    None => format!("{}{comment}", site.indent),
                };
                edits.push((site.statement, text));
            }
        }

        let replacement = self.replacement.render(param);
        let definitions: Vec<MatchRegion> = edits.iter().map(|(region, _)| *region).collect();
        for usage in self.symbol_matcher().find_all(source) {
            if definitions.iter().any(|d| d.contains(&usage)) {
                continue;
            }
            edits.push((usage, replacement.clone()));
        }

        edits.sort_by_key(|(region, _)| region.start);
        Ok(edits)
    }
}

impl Rule for SubstituteRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self, source: &str, param: &str) -> RuleState {
        // Definition regexes are compiled once during spec validation.
        let pending = self
            .edits(source, param)
            .map(|edits| !edits.is_empty())
            .unwrap_or(false);
        if pending {
            return RuleState::Pending;
        }

        let rewritten = source.contains(&self.replacement.render(param))
            || self
                .definition
                .as_ref()
                .is_some_and(|comment| source.contains(&comment.render(param)));
        if rewritten {
            RuleState::Applied
        } else {
            RuleState::NotApplicable
        }
    }

    fn rewrite(&self, source: &str, param: &str) -> Result<Rewrite> {
        let edits = self.edits(source, param)?;
        let mut content = String::with_capacity(source.len());
        let mut cursor = 0;

        for (region, text) in &edits {
            content.push_str(&source[cursor..region.start]);
            content.push_str(text);
            cursor = region.end;
        }
        content.push_str(&source[cursor..]);

        Ok(Rewrite {
            content,
            edits: edits.len(),
        })
    }

    fn shape(&self) -> RuleShape<'_> {
        RuleShape::Substitute {
            symbol: &self.symbol,
            replacement: &self.replacement,
            definition: self.definition.as_ref(),
        }
    }

    fn describe(&self) -> String {
        match &self.definition {
            Some(comment) => format!(
                "Replace '{}' with '{}', definition becomes '{}'",
                self.symbol, self.replacement, comment
            ),
            None => format!("Replace '{}' with '{}'", self.symbol, self.replacement),
        }
    }
}
