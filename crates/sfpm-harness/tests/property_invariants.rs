//! Quantified invariants from `spec.md` §8, exercised with generated
//! inputs rather than fixed examples.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use sfpm_criteria::{CompareOp, Criteria};
use sfpm_dispatch::{Mode, TieredDispatcher};
use sfpm_fact::DictFactSource;
use sfpm_rule::Rule;
use sfpm_types::Value;
use sfpm_vm::{op_add, op_halt, op_push, Instruction, Vm};

fn labeled_rule(label: String, criteria_count: usize, priority: i32) -> Rule<RefCell<Option<String>>> {
    let criteria = (0..criteria_count)
        .map(|i| Criteria::comparison(format!("f{i}"), CompareOp::Equal, 1_i64))
        .collect();
    let mut rule = Rule::new(
        criteria,
        Some({
            let label = label.clone();
            Box::new(move |fired: &RefCell<Option<String>>| *fired.borrow_mut() = Some(label.clone()))
        }),
        Some(label),
    );
    rule.set_priority(priority);
    rule
}

fn matching_facts(max_fields: usize) -> DictFactSource<'static> {
    let mut facts = DictFactSource::with_capacity(max_fields);
    for i in 0..max_fields {
        facts.add(format!("f{i}"), Value::Int(1));
    }
    facts
}

proptest! {
    /// Specificity selection: the fired rule's criteria count is never
    /// smaller than any other matched rule's.
    #[test]
    fn specificity_selection_picks_a_maximal_match(counts in prop::collection::vec(0_usize..5, 1..6)) {
        let max_fields = counts.iter().copied().max().unwrap_or(0);
        let facts = matching_facts(max_fields);

        let mut rules: Vec<Option<Rule<RefCell<Option<String>>>>> = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Some(labeled_rule(format!("rule{i}"), count, 0)))
            .collect();

        let fired = RefCell::new(None);
        sfpm_matcher::match_rules(&mut rules, &facts, &fired, true);

        let winner_label = fired.borrow().clone();
        if let Some(winner_label) = winner_label {
            let winner_count = rules
                .iter()
                .flatten()
                .find(|r| r.name() == Some(winner_label.as_str()))
                .unwrap()
                .criteria_count();
            let max_count = counts.iter().copied().max().unwrap_or(0);
            prop_assert_eq!(winner_count, max_count);
        }
    }

    /// Priority tie-break: among equally specific matched rules, the fired
    /// one never has a lower priority than any other matched rule.
    #[test]
    fn priority_tie_break_never_picks_a_dominated_rule(
        priorities in prop::collection::vec(-5_i32..5, 2..6),
    ) {
        let facts = matching_facts(1);
        let mut rules: Vec<Option<Rule<RefCell<Option<String>>>>> = priorities
            .iter()
            .enumerate()
            .map(|(i, &priority)| Some(labeled_rule(format!("rule{i}"), 1, priority)))
            .collect();

        let fired = RefCell::new(None);
        sfpm_matcher::match_rules(&mut rules, &facts, &fired, false);

        let winner_label = fired.borrow().clone().expect("every rule here matches facts f0==1");
        let winner_priority = rules
            .iter()
            .flatten()
            .find(|r| r.name() == Some(winner_label.as_str()))
            .unwrap()
            .priority();
        let max_priority = priorities.iter().copied().max().unwrap();
        prop_assert_eq!(winner_priority, max_priority);
    }

    /// Hook order and abort atomicity: whichever before/middleware hook in
    /// the chain is the first to return `false`, the payload and every
    /// after hook are skipped, and every hook up to and including the
    /// aborting one still ran exactly once, in order.
    #[test]
    fn hook_chain_aborts_at_first_false_and_runs_nothing_after(
        before_results in prop::collection::vec(any::<bool>(), 0..4),
        middleware_results in prop::collection::vec(any::<bool>(), 0..4),
    ) {
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        let mut rule: Rule<()> = Rule::new(Vec::new(), Some({
            let log = Rc::clone(&log);
            Box::new(move |_ctx: &()| log.borrow_mut().push("payload".to_owned()))
        }), None);

        for (i, &result) in before_results.iter().enumerate() {
            let log = Rc::clone(&log);
            rule.add_before_hook(move |_ctx: &()| {
                log.borrow_mut().push(format!("before_{i}"));
                result
            });
        }
        for (i, &result) in middleware_results.iter().enumerate() {
            let log = Rc::clone(&log);
            rule.add_middleware_hook(move |_ctx: &()| {
                log.borrow_mut().push(format!("mw_{i}"));
                result
            });
        }
        let after_count = 3;
        for i in 0..after_count {
            let log = Rc::clone(&log);
            rule.add_after_hook(move |_ctx: &()| log.borrow_mut().push(format!("after_{i}")));
        }

        rule.execute_payload(&());

        let observed = log.borrow().clone();
        let first_abort = before_results
            .iter()
            .chain(middleware_results.iter())
            .position(|&result| !result);

        match first_abort {
            None => {
                // Nothing aborted: every stage ran in full.
                prop_assert_eq!(observed.last().map(String::as_str), Some(&*format!("after_{}", after_count - 1)));
                prop_assert!(observed.contains(&"payload".to_owned()));
            }
            Some(abort_index) => {
                // The chain stops at the aborting hook: nothing named
                // "payload" or "after_*" ever got logged.
                prop_assert!(!observed.contains(&"payload".to_owned()));
                prop_assert!(!observed.iter().any(|entry| entry.starts_with("after_")));
                prop_assert_eq!(observed.len(), abort_index + 1);
            }
        }
    }
}

#[test]
fn cache_invalidation_bumps_counter_and_leaves_uncached_mode() {
    const OP_PUSH: u32 = 1;
    const OP_HALT: u32 = 2;
    const OP_MAX: usize = 4;

    let vm = Rc::new(RefCell::new(Vm::new()));
    let mut dispatcher = TieredDispatcher::new(OP_MAX, Rc::clone(&vm));
    dispatcher.register_opcode(OP_PUSH, op_push).unwrap();
    dispatcher.register_opcode(OP_HALT, op_halt).unwrap();
    dispatcher.enter_cached_mode();

    let invalidations_before = dispatcher.stats().cache_invalidations;
    dispatcher.register_opcode(OP_PUSH, op_push).unwrap();
    assert_eq!(dispatcher.mode(), Mode::Uncached);
    assert!(dispatcher.stats().cache_invalidations > invalidations_before);

    dispatcher.enter_cached_mode();
    let invalidations_before = dispatcher.stats().cache_invalidations;
    dispatcher.unregister_opcode(OP_PUSH).unwrap();
    assert_eq!(dispatcher.mode(), Mode::Uncached);
    assert!(dispatcher.stats().cache_invalidations > invalidations_before);
}

#[test]
fn dispatch_equivalence_across_modes_for_a_small_program() {
    const OP_PUSH: u32 = 1;
    const OP_ADD: u32 = 2;
    const OP_HALT: u32 = 3;
    const OP_MAX: usize = 8;

    let program = vec![
        Instruction::new(OP_PUSH, 7),
        Instruction::new(OP_PUSH, 35),
        Instruction::new(OP_ADD, 0),
        Instruction::new(OP_HALT, 0),
    ];

    let run = |mode_cached: bool| {
        let vm = Rc::new(RefCell::new(Vm::new()));
        let mut dispatcher = TieredDispatcher::new(OP_MAX, Rc::clone(&vm));
        dispatcher.register_opcode(OP_PUSH, op_push).unwrap();
        dispatcher.register_opcode(OP_ADD, op_add).unwrap();
        dispatcher.register_opcode(OP_HALT, op_halt).unwrap();
        if mode_cached {
            dispatcher.enter_cached_mode();
        } else {
            dispatcher.enter_uncached_mode();
        }
        vm.borrow_mut().load(program.clone());
        dispatcher.run_program(&program).unwrap();
        vm.borrow().peek().unwrap()
    };

    assert_eq!(run(true), run(false));
}
