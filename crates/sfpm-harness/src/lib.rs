//! Scenario fixtures shared by this crate's `tests/` integration suites.
//!
//! Mirrors `fsqlite-harness`'s role as the dedicated integration-test
//! crate: rather than re-deriving each end-to-end scenario inline in every
//! test file, the fixtures live here once and the `tests/` files assert
//! against them. Nothing in this crate is meant to be depended on outside
//! the workspace's own test suites.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sfpm_criteria::{CompareOp, Criteria};
use sfpm_dispatch::{Mode, TieredDispatcher};
use sfpm_fact::DictFactSource;
use sfpm_rule::Rule;
use sfpm_types::Value;
use sfpm_vm::{op_add, op_halt, op_mul, op_print, op_push, Instruction, Vm};

/// Scenario 1 of `spec.md` §8: health/combat facts selecting between a
/// high-priority "critical" rule and a lower-priority "combat" rule.
///
/// Returns the name of whichever rule fired, or `None` if neither matched.
pub fn critical_situation_ai(health: i64) -> Option<String> {
    let mut facts = DictFactSource::with_capacity(3);
    facts.add("health", Value::Int(health));
    facts.add("isInCombat", Value::Bool(true));
    facts.add("enemyCount", Value::Int(3));

    let fired = Rc::new(RefCell::new(None));

    let mut critical = Rule::new(
        vec![
            Criteria::comparison("health", CompareOp::Less, 50_i64),
            Criteria::comparison("isInCombat", CompareOp::Equal, true),
        ],
        Some({
            let fired = Rc::clone(&fired);
            Box::new(move |_ctx: &()| *fired.borrow_mut() = Some("critical".to_owned()))
        }),
        Some("critical".to_owned()),
    );
    critical.set_priority(10);

    let mut combat = Rule::new(
        vec![Criteria::comparison("isInCombat", CompareOp::Equal, true)],
        Some({
            let fired = Rc::clone(&fired);
            Box::new(move |_ctx: &()| *fired.borrow_mut() = Some("combat".to_owned()))
        }),
        Some("combat".to_owned()),
    );
    combat.set_priority(5);

    let mut rules = vec![Some(critical), Some(combat)];
    sfpm_matcher::match_rules(&mut rules, &facts, &(), true);

    fired.borrow().clone()
}

/// Scenario 2 of `spec.md` §8: `R2`'s extra criterion must win over `R1`
/// despite `R1` being inserted first.
pub fn specificity_over_insertion_order() -> Option<String> {
    let mut facts = DictFactSource::with_capacity(2);
    facts.add("a", Value::Int(1));
    facts.add("b", Value::Int(2));

    let fired = Rc::new(RefCell::new(None));

    let r1 = Rule::new(
        vec![Criteria::comparison("a", CompareOp::Equal, 1_i64)],
        Some({
            let fired = Rc::clone(&fired);
            Box::new(move |_ctx: &()| *fired.borrow_mut() = Some("r1".to_owned()))
        }),
        Some("r1".to_owned()),
    );
    let r2 = Rule::new(
        vec![
            Criteria::comparison("a", CompareOp::Equal, 1_i64),
            Criteria::comparison("b", CompareOp::Equal, 2_i64),
        ],
        Some({
            let fired = Rc::clone(&fired);
            Box::new(move |_ctx: &()| *fired.borrow_mut() = Some("r2".to_owned()))
        }),
        Some("r2".to_owned()),
    );

    let mut rules = vec![Some(r1), Some(r2)];
    sfpm_matcher::match_rules(&mut rules, &facts, &(), true);

    fired.borrow().clone()
}

/// Outcome of [`hook_chain_with_abort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookChainOutcome {
    /// Number of opcode payloads that actually ran before the abort.
    pub payloads_run: u32,
}

/// Scenario 3 of `spec.md` §8: a global-style before hook that aborts on
/// its 4th invocation, run against `[PUSH 1, PUSH 2, ADD, PUSH 3, MUL,
/// PRINT, HALT]`.
///
/// The dispatcher's rules have no hooks of their own (each opcode rule is
/// a single payload), so this scenario builds its own small rule set with
/// one shared before hook, rather than going through `TieredDispatcher` —
/// hook chains are a `sfpm-rule` concept, and the dispatcher's opcode
/// rules are deliberately hook-free.
#[must_use]
pub fn hook_chain_with_abort() -> HookChainOutcome {
    const OP_PUSH: i64 = 1;
    const OP_ADD: i64 = 2;
    const OP_MUL: i64 = 3;
    const OP_PRINT: i64 = 4;
    const OP_HALT: i64 = 5;

    let program = [
        (OP_PUSH, 1),
        (OP_PUSH, 2),
        (OP_ADD, 0),
        (OP_PUSH, 3),
        (OP_MUL, 0),
        (OP_PRINT, 0),
        (OP_HALT, 0),
    ];

    let vm = Rc::new(RefCell::new(Vm::new()));
    let invocation = Rc::new(Cell::new(0_u32));
    let payloads_run = Rc::new(Cell::new(0_u32));

    let make_rule = |opcode: i64, handler: fn(&mut Vm, i64) -> Result<(), sfpm_vm::VmError>, operand_fact: i64| {
        let vm = Rc::clone(&vm);
        let payloads_run = Rc::clone(&payloads_run);
        let mut rule = Rule::new(
            vec![Criteria::comparison("opcode", CompareOp::Equal, opcode)],
            Some(Box::new(move |_ctx: &()| {
                handler(&mut vm.borrow_mut(), operand_fact).expect("scenario program never faults");
                payloads_run.set(payloads_run.get() + 1);
            })),
            Some(format!("op_{opcode}")),
        );
        let invocation = Rc::clone(&invocation);
        rule.add_before_hook(Box::new(move |_ctx: &()| {
            let n = invocation.get() + 1;
            invocation.set(n);
            n < 4
        }));
        rule
    };

    for (opcode, operand) in program {
        let mut rules = vec![Some(make_rule(
            opcode,
            match opcode {
                OP_PUSH => op_push,
                OP_ADD => op_add,
                OP_MUL => op_mul,
                OP_PRINT => op_print,
                OP_HALT => op_halt,
                _ => unreachable!("scenario only uses the five opcodes above"),
            },
            operand,
        ))];
        let mut facts = DictFactSource::with_capacity(1);
        facts.add("opcode", Value::Int(opcode));
        sfpm_matcher::match_rules(&mut rules, &facts, &(), false);
    }

    HookChainOutcome {
        payloads_run: payloads_run.get(),
    }
}

/// Scenario 4 of `spec.md` §8: a buggy `ADD` handler hot-swapped for the
/// correct one mid-run. Returns `(stack_top_before_fix,
/// stack_top_after_fix, cache_invalidations)`.
pub fn tiered_hot_swap() -> (i64, i64, u64) {
    const OP_PUSH: u32 = 1;
    const OP_ADD: u32 = 2;
    const OP_PRINT: u32 = 3;
    const OP_HALT: u32 = 4;
    const OP_MAX: usize = 8;

    let vm = Rc::new(RefCell::new(Vm::new()));
    let mut dispatcher = TieredDispatcher::new(OP_MAX, Rc::clone(&vm));
    dispatcher.register_opcode(OP_PUSH, op_push).unwrap();
    dispatcher
        .register_opcode(OP_ADD, |vm, _| {
            let b = vm.pop()?;
            let a = vm.pop()?;
            vm.push(a + b + 1000)
        })
        .unwrap();
    dispatcher.register_opcode(OP_PRINT, op_print).unwrap();
    dispatcher.register_opcode(OP_HALT, op_halt).unwrap();
    dispatcher.enter_cached_mode();

    let program = vec![
        Instruction::new(OP_PUSH, 10),
        Instruction::new(OP_PUSH, 5),
        Instruction::new(OP_ADD, 0),
        Instruction::new(OP_PRINT, 0),
        Instruction::new(OP_HALT, 0),
    ];

    vm.borrow_mut().load(program.clone());
    dispatcher.run_program(&program).unwrap();
    let before_fix = vm.borrow().peek().unwrap();

    dispatcher
        .update_opcode(OP_ADD, op_add, Some("fix +1000 bug"))
        .unwrap();
    dispatcher.enter_cached_mode();

    vm.borrow_mut().load(program.clone());
    dispatcher.run_program(&program).unwrap();
    let after_fix = vm.borrow().peek().unwrap();

    (before_fix, after_fix, dispatcher.stats().cache_invalidations)
}

/// Scenario 5 of `spec.md` §8: the same program run once in `cached` mode
/// and once in `uncached` mode must leave the same value on top of stack.
pub fn interpreter_equivalence() -> (i64, i64) {
    const OP_PUSH: u32 = 1;
    const OP_ADD: u32 = 2;
    const OP_MUL: u32 = 3;
    const OP_HALT: u32 = 4;
    const OP_MAX: usize = 8;

    let program = vec![
        Instruction::new(OP_PUSH, 100),
        Instruction::new(OP_PUSH, 50),
        Instruction::new(OP_ADD, 0),
        Instruction::new(OP_PUSH, 2),
        Instruction::new(OP_MUL, 0),
        Instruction::new(OP_HALT, 0),
    ];

    let run = |mode_cached: bool| {
        let vm = Rc::new(RefCell::new(Vm::new()));
        let mut dispatcher = TieredDispatcher::new(OP_MAX, Rc::clone(&vm));
        dispatcher.register_opcode(OP_PUSH, op_push).unwrap();
        dispatcher.register_opcode(OP_ADD, op_add).unwrap();
        dispatcher.register_opcode(OP_MUL, op_mul).unwrap();
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

    (run(true), run(false))
}
