//! Rules: a conjunction of criteria, a payload, and three ordered hook
//! chains.
//!
//! The C original gives each rule exactly one before-hook slot and one
//! after-hook slot (see `rule.c`), each carrying its own `void *user_data`
//! pointer passed back to the hook alongside the payload's user data. The
//! fuller example-driven API (`interpreter_hook_chaining.c`) chains several
//! hooks per stage and adds a middleware stage. This redesigns both: each
//! stage is an owned `Vec` of boxed closures evaluated in insertion order,
//! and a hook's own data is captured in its closure rather than threaded
//! through as a second `void *` — the payload context (`Ctx`) is the only
//! value passed explicitly, matching [`sfpm_criteria`](../sfpm_criteria)'s
//! predicate signature.

use sfpm_criteria::Criteria;
use sfpm_fact::FactSource;

/// Outcome of evaluating a rule's criteria against a fact set.
///
/// When `matched` is `false`, `criteria_count` is always `0` — mirroring
/// the C `sfpm_eval_result_t` literal `{false, 0}` returned on the first
/// failing criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalResult {
    pub matched: bool,
    pub criteria_count: usize,
}

impl EvalResult {
    const NO_MATCH: Self = Self {
        matched: false,
        criteria_count: 0,
    };
}

/// A single rule: an ordered conjunction of criteria, a payload, an
/// optional display name, a priority, and three hook chains.
///
/// `Ctx` is the payload/hook context type threaded through evaluation —
/// the caller's stand-in for the C API's `void *payload_user_data`.
pub struct Rule<Ctx> {
    criteria: Vec<Criteria<Ctx>>,
    payload: Option<Box<dyn Fn(&Ctx)>>,
    name: Option<String>,
    priority: i32,
    before: Vec<Box<dyn Fn(&Ctx) -> bool>>,
    middleware: Vec<Box<dyn Fn(&Ctx) -> bool>>,
    after: Vec<Box<dyn Fn(&Ctx)>>,
}

impl<Ctx> Rule<Ctx> {
    /// Build a rule owning the given criteria list and payload.
    ///
    /// A rule's criteria count (its specificity) is fixed for its
    /// lifetime: there is no API to add or remove criteria after
    /// construction, matching `spec.md` §4.3's invariant (b).
    #[must_use]
    pub fn new(
        criteria: Vec<Criteria<Ctx>>,
        payload: Option<Box<dyn Fn(&Ctx)>>,
        name: Option<String>,
    ) -> Self {
        Self {
            criteria,
            payload,
            name,
            priority: 0,
            before: Vec::new(),
            middleware: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Number of criteria this rule carries — its specificity.
    #[must_use]
    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Append a before-hook. Returns `true`; the C API's `bool` return
    /// exists only because the original signature could fail on a null
    /// rule, which is not representable here.
    pub fn add_before_hook(&mut self, hook: impl Fn(&Ctx) -> bool + 'static) -> bool {
        self.before.push(Box::new(hook));
        true
    }

    pub fn add_middleware_hook(&mut self, hook: impl Fn(&Ctx) -> bool + 'static) -> bool {
        self.middleware.push(Box::new(hook));
        true
    }

    pub fn add_after_hook(&mut self, hook: impl Fn(&Ctx) + 'static) -> bool {
        self.after.push(Box::new(hook));
        true
    }

    /// Drop all three hook chains, per `spec.md` §4.3 invariant (d).
    pub fn clear_hooks(&mut self) {
        self.before.clear();
        self.middleware.clear();
        self.after.clear();
    }

    #[must_use]
    pub fn before_hook_count(&self) -> usize {
        self.before.len()
    }

    #[must_use]
    pub fn middleware_hook_count(&self) -> usize {
        self.middleware.len()
    }

    #[must_use]
    pub fn after_hook_count(&self) -> usize {
        self.after.len()
    }

    /// Evaluate this rule's criteria against `facts`.
    ///
    /// Short-circuits on the first failing criterion. A rule with zero
    /// criteria matches vacuously with specificity `0`, per `spec.md`
    /// §4.3.
    pub fn evaluate(&self, facts: &dyn FactSource, ctx: &Ctx) -> EvalResult {
        for criterion in &self.criteria {
            if !criterion.evaluate(facts, ctx) {
                return EvalResult::NO_MATCH;
            }
        }
        EvalResult {
            matched: true,
            criteria_count: self.criteria.len(),
        }
    }

    /// Run this rule's full firing sequence: before hooks, middleware
    /// hooks, payload, after hooks.
    ///
    /// If any before or middleware hook returns `false`, the remainder of
    /// the chain — including the payload and every after hook — is
    /// skipped. This is not reported as an error; it is the documented
    /// abort semantics of `spec.md` §4.3. After hooks always run once the
    /// payload has run, and their return values (there are none, by
    /// design — see below) cannot suppress later after hooks.
    pub fn execute_payload(&self, ctx: &Ctx) {
        for hook in &self.before {
            if !hook(ctx) {
                return;
            }
        }
        for hook in &self.middleware {
            if !hook(ctx) {
                return;
            }
        }
        if let Some(payload) = &self.payload {
            payload(ctx);
        }
        for hook in &self.after {
            hook(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfpm_criteria::CompareOp;
    use sfpm_fact::DictFactSource;
    use sfpm_types::Value;
    use std::cell::RefCell;

    #[test]
    fn zero_criteria_matches_vacuously() {
        let rule: Rule<()> = Rule::new(Vec::new(), None, None);
        let facts = DictFactSource::with_capacity(0);
        let result = rule.evaluate(&facts, &());
        assert_eq!(result, EvalResult { matched: true, criteria_count: 0 });
    }

    #[test]
    fn short_circuits_on_first_failing_criterion() {
        let criteria = vec![
            Criteria::comparison("a", CompareOp::Equal, 1_i64),
            Criteria::comparison("b", CompareOp::Equal, 2_i64),
        ];
        let rule: Rule<()> = Rule::new(criteria, None, None);
        let mut facts = DictFactSource::with_capacity(2);
        facts.add("a", Value::Int(1));
        facts.add("b", Value::Int(99));
        assert_eq!(rule.evaluate(&facts, &()), EvalResult::NO_MATCH);
    }

    #[test]
    fn matched_specificity_equals_criteria_count() {
        let criteria = vec![
            Criteria::comparison("a", CompareOp::Equal, 1_i64),
            Criteria::comparison("b", CompareOp::Equal, 2_i64),
        ];
        let rule: Rule<()> = Rule::new(criteria, None, None);
        let mut facts = DictFactSource::with_capacity(2);
        facts.add("a", Value::Int(1));
        facts.add("b", Value::Int(2));
        let result = rule.evaluate(&facts, &());
        assert_eq!(result, EvalResult { matched: true, criteria_count: 2 });
    }

    #[test]
    fn hook_order_is_before_then_middleware_then_payload_then_after() {
        let log: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
        let mut rule: Rule<RefCell<Vec<&'static str>>> =
            Rule::new(Vec::new(), Some(Box::new(|log| log.borrow_mut().push("payload"))), None);
        rule.add_before_hook(|log| { log.borrow_mut().push("before_1"); true });
        rule.add_before_hook(|log| { log.borrow_mut().push("before_2"); true });
        rule.add_middleware_hook(|log| { log.borrow_mut().push("mw_1"); true });
        rule.add_after_hook(|log| log.borrow_mut().push("after_1"));
        rule.add_after_hook(|log| log.borrow_mut().push("after_2"));
        rule.execute_payload(&log);
        assert_eq!(
            *log.borrow(),
            vec!["before_1", "before_2", "mw_1", "payload", "after_1", "after_2"]
        );
    }

    #[test]
    fn before_hook_abort_skips_everything_after_it() {
        let log: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
        let mut rule: Rule<RefCell<Vec<&'static str>>> =
            Rule::new(Vec::new(), Some(Box::new(|log| log.borrow_mut().push("payload"))), None);
        rule.add_before_hook(|log| { log.borrow_mut().push("before_1"); false });
        rule.add_middleware_hook(|log| { log.borrow_mut().push("mw_1"); true });
        rule.add_after_hook(|log| log.borrow_mut().push("after_1"));
        rule.execute_payload(&log);
        assert_eq!(*log.borrow(), vec!["before_1"]);
    }

    #[test]
    fn middleware_abort_skips_payload_and_after_hooks() {
        let log: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
        let mut rule: Rule<RefCell<Vec<&'static str>>> =
            Rule::new(Vec::new(), Some(Box::new(|log| log.borrow_mut().push("payload"))), None);
        rule.add_middleware_hook(|log| { log.borrow_mut().push("mw_1"); false });
        rule.add_after_hook(|log| log.borrow_mut().push("after_1"));
        rule.execute_payload(&log);
        assert_eq!(*log.borrow(), vec!["mw_1"]);
    }

    #[test]
    fn clear_hooks_drops_all_three_chains() {
        let mut rule: Rule<()> = Rule::new(Vec::new(), None, None);
        rule.add_before_hook(|_| true);
        rule.add_middleware_hook(|_| true);
        rule.add_after_hook(|_| ());
        rule.clear_hooks();
        assert_eq!(rule.before_hook_count(), 0);
        assert_eq!(rule.middleware_hook_count(), 0);
        assert_eq!(rule.after_hook_count(), 0);
    }

    #[test]
    fn priority_defaults_to_zero_and_is_settable() {
        let mut rule: Rule<()> = Rule::new(Vec::new(), None, None);
        assert_eq!(rule.priority(), 0);
        rule.set_priority(10);
        assert_eq!(rule.priority(), 10);
    }
}
