//! Idempotence guard.
//!
//! The guard classifies content against every rule of a spec before anything
//! is rewritten. A file whose rules are all applied (or inapplicable) is left
//! alone; a file with some rules applied and others pending is in a partial
//! state and only the pending rules run.

use crate::transform::{Rule, RuleState, TransformSpec};
use serde::Serialize;

/// Per-rule guard verdicts for one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardReport {
    pub states: Vec<(String, RuleState)>,
}

impl GuardReport {
    /// Returns true if no rule has work to do.
    pub fn is_settled(&self) -> bool {
        !self.states.iter().any(|(_, s)| *s == RuleState::Pending)
    }

    /// Returns true if some rules are applied while others are still pending.
    pub fn is_partial(&self) -> bool {
        self.count(RuleState::Pending) > 0 && self.count(RuleState::Applied) > 0
    }

    /// Returns true if every applicable rule is already applied.
    pub fn is_converged(&self) -> bool {
        self.is_settled() && self.count(RuleState::Applied) > 0
    }

    /// Names of rules in the given state.
    pub fn rules_in(&self, state: RuleState) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, s)| *s == state)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn count(&self, state: RuleState) -> usize {
        self.states.iter().filter(|(_, s)| *s == state).count()
    }
}

/// Checks rules against content without rewriting it.
#[derive(Debug, Clone, Copy)]
pub struct IdempotenceGuard<'a> {
    spec: &'a TransformSpec,
}

impl<'a> IdempotenceGuard<'a> {
    /// Creates a guard for the given spec.
    pub fn new(spec: &'a TransformSpec) -> Self {
        Self { spec }
    }

    /// Classifies `source` against every rule.
    pub fn inspect(&self, source: &str, param: &str) -> GuardReport {
        GuardReport {
            states: self
                .spec
                .rules()
                .iter()
                .map(|rule| (rule.name().to_string(), rule.state(source, param)))
                .collect(),
        }
    }

    /// Classifies `source` for a single rule.
    ///
    /// Checked again for each rule on the content produced by the rules before
    /// it, independent of the initial inspection.
    pub fn check(&self, rule: &dyn Rule, source: &str, param: &str) -> RuleState {
        rule.state(source, param)
    }

    /// Returns true if `rule` still has work to do in `source`.
    pub fn admits(&self, rule: &dyn Rule, source: &str, param: &str) -> bool {
        self.check(rule, source, param) == RuleState::Pending
    }
}
