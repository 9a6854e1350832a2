//! Facade wiring the SFPM layers together: a `RuleSet` convenience over
//! `sfpm-rule` + `sfpm-matcher`, plus the ambient configuration and
//! logging the rest of this workspace shares.
//!
//! Nothing here adds new matching semantics; `RuleSet` exists because the
//! public matcher API operates on a bare `&mut [Option<Rule<Ctx>>]` slice
//! (mirroring the C API's `sfpm_rule_t **rules, size_t rule_count`), and
//! most callers want to own that storage rather than juggle the slice
//! themselves.

pub mod config;
pub mod logging;

pub use sfpm_criteria::{CompareOp, Criteria, Operator};
pub use sfpm_fact::{DictFactSource, FactSource};
pub use sfpm_matcher::{least_specific_rule, match_rules, most_specific_rule, optimize_rules};
pub use sfpm_rule::{EvalResult, Rule};
pub use sfpm_types::{compare, OwnedValue, Value, ValueTag};

/// An owned collection of rules, evaluated together against one fact set
/// at a time.
pub struct RuleSet<Ctx> {
    rules: Vec<Option<Rule<Ctx>>>,
}

impl<Ctx> RuleSet<Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule, returning the index it was stored at.
    pub fn add_rule(&mut self, rule: Rule<Ctx>) -> usize {
        self.rules.push(Some(rule));
        self.rules.len() - 1
    }

    /// Remove the rule at `index`, leaving a gap (a "null rule") rather
    /// than shifting later indices, matching `spec.md` §4.4's failure
    /// semantics for null entries.
    pub fn remove_rule(&mut self, index: usize) {
        if let Some(slot) = self.rules.get_mut(index) {
            *slot = None;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match this rule set against `facts` and fire the winner, if any.
    pub fn match_facts(&mut self, facts: &dyn FactSource, ctx: &Ctx, optimize: bool) {
        sfpm_matcher::match_rules(&mut self.rules, facts, ctx, optimize);
    }

    #[must_use]
    pub fn most_specific(&self) -> Option<&Rule<Ctx>> {
        sfpm_matcher::most_specific_rule(&self.rules)
    }

    #[must_use]
    pub fn least_specific(&self) -> Option<&Rule<Ctx>> {
        sfpm_matcher::least_specific_rule(&self.rules)
    }
}

impl<Ctx> Default for RuleSet<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}
