//! The tiered opcode dispatcher: a dual-mode dispatch front-end over the
//! matcher, driving [`sfpm_vm::Vm`].
//!
//! Ported from `interpreter_tiered.c`'s `tiered_interpreter_t` and its
//! `tiered_*` functions. The C original indexes two compile-time-sized,
//! process-global arrays (`rule_cache[OP_MAX]`, `contexts[OP_MAX]`); per
//! `spec.md` §9's redesign note ("per-opcode global context slots ...
//! re-express as a dispatcher-owned table"), both become `Vec`s owned by
//! [`TieredDispatcher`], sized at construction rather than fixed at
//! compile time.
//!
//! # Context sharing
//!
//! A rule's payload (`sfpm_rule`) is infallible and takes no return value,
//! matching `spec.md` §7 ("payloads ... are assumed total"). Since an
//! opcode handler can fail (stack overflow/underflow, division by zero),
//! the per-opcode [`OpcodeContext`] stashes the fault in a `RefCell` for
//! [`TieredDispatcher::execute_instruction`] to collect after the payload
//! returns — the "caller owns recovery" half of that same sentence.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sfpm_criteria::{CompareOp, Criteria};
use sfpm_error::{Result, SfpmError};
use sfpm_fact::DictFactSource;
use sfpm_rule::Rule;
use sfpm_types::Value;
use sfpm_vm::{Instruction, Vm, VmError};

/// An opcode handler: mutates the VM for one `(opcode, operand)` step.
pub type OpcodeHandler = dyn Fn(&mut Vm, i64) -> std::result::Result<(), VmError>;

/// Dispatch mode, per `spec.md` §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Cached,
    Uncached,
}

/// Dispatcher-owned, per-opcode context. Mutated on every dispatch of its
/// opcode; per `spec.md` §5, it is not re-entrant — a handler that
/// recursively dispatches its own opcode will clobber `operand`.
pub struct OpcodeContext {
    vm: Rc<RefCell<Vm>>,
    operand: Cell<i64>,
    handler: Rc<OpcodeHandler>,
    fault: RefCell<Option<VmError>>,
}

fn run_opcode_payload(ctx: &Rc<OpcodeContext>) {
    let mut vm = ctx.vm.borrow_mut();
    if let Err(err) = (ctx.handler)(&mut vm, ctx.operand.get()) {
        *ctx.fault.borrow_mut() = Some(err);
    }
}

/// Build the single-criterion rule for `op`: `opcode == op`, whose
/// payload is the shared [`run_opcode_payload`] shim. The context that
/// actually drives a firing is whichever `&Rc<OpcodeContext>` is passed
/// to `evaluate`/`execute_payload` at dispatch time, not anything baked
/// into the rule itself — so no context value is needed here, only the
/// `Ctx` type parameter it fixes.
fn build_opcode_rule(op: u32) -> Rule<Rc<OpcodeContext>> {
    let criteria = vec![Criteria::comparison("opcode", CompareOp::Equal, i64::from(op))];
    Rule::new(
        criteria,
        Some(Box::new(run_opcode_payload)),
        Some(format!("opcode_{op}")),
    )
}

/// Dispatch counters, per `spec.md` §3's tiered interpreter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub cached_dispatches: u64,
    pub uncached_dispatches: u64,
    pub cache_invalidations: u64,
    pub cache_version: u64,
    pub mode: Option<Mode>,
}

/// The tiered dispatcher: a direct-index cache for `O(1)` opcode dispatch
/// plus a flat rule array preserving full matcher semantics, with
/// automatic invalidation on mutation.
pub struct TieredDispatcher {
    vm: Rc<RefCell<Vm>>,
    op_max: usize,
    mode: Mode,
    cache_version: u64,
    rule_cache: Vec<Option<Rule<Rc<OpcodeContext>>>>,
    contexts: Vec<Option<Rc<OpcodeContext>>>,
    flat_rules: Vec<Option<Rule<Rc<OpcodeContext>>>>,
    flat_index_of: Vec<Option<usize>>,
    cached_dispatches: u64,
    uncached_dispatches: u64,
    cache_invalidations: u64,
}

impl TieredDispatcher {
    /// Build a dispatcher over `vm`, with room for opcodes in
    /// `0..op_max`. Starts in `Cached` mode at version 1 with empty
    /// tables, per `spec.md` §3.
    #[must_use]
    pub fn new(op_max: usize, vm: Rc<RefCell<Vm>>) -> Self {
        Self {
            vm,
            op_max,
            mode: Mode::Cached,
            cache_version: 1,
            rule_cache: (0..op_max).map(|_| None).collect(),
            contexts: (0..op_max).map(|_| None).collect(),
            flat_rules: Vec::new(),
            flat_index_of: (0..op_max).map(|_| None).collect(),
            cached_dispatches: 0,
            uncached_dispatches: 0,
            cache_invalidations: 0,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn require_in_range(&self, op: u32) -> Result<usize> {
        let op = op as usize;
        if op >= self.op_max {
            return Err(SfpmError::internal(format!(
                "opcode {op} out of range (op_max = {})",
                self.op_max
            )));
        }
        Ok(op)
    }

    /// Register (or rebuild) the rule for `op`, backed by `handler`.
    ///
    /// Installs the new rule in the direct-index slot and the flat array,
    /// dropping the previous rule only after both references have been
    /// replaced — per `spec.md` §5's ordering requirement. If the
    /// dispatcher was in `Cached` mode, it transitions to `Uncached`.
    pub fn register_opcode(&mut self, op: u32, handler: impl Fn(&mut Vm, i64) -> std::result::Result<(), VmError> + 'static) -> Result<()> {
        let index = self.require_in_range(op)?;

        let ctx = Rc::new(OpcodeContext {
            vm: Rc::clone(&self.vm),
            operand: Cell::new(0),
            handler: Rc::new(handler),
            fault: RefCell::new(None),
        });

        self.rule_cache[index] = Some(build_opcode_rule(op));

        match self.flat_index_of[index] {
            Some(flat_index) => self.flat_rules[flat_index] = Some(build_opcode_rule(op)),
            None => {
                self.flat_rules.push(Some(build_opcode_rule(op)));
                self.flat_index_of[index] = Some(self.flat_rules.len() - 1);
            }
        }

        self.contexts[index] = Some(ctx);

        if self.mode == Mode::Cached {
            self.invalidate();
        }

        Ok(())
    }

    /// Convenience wrapper over [`register_opcode`](Self::register_opcode)
    /// that logs a human-readable reason for the hot-swap, mirroring
    /// `tiered_update_opcode`'s `reason` parameter in
    /// `interpreter_tiered.c`.
    pub fn update_opcode(
        &mut self,
        op: u32,
        handler: impl Fn(&mut Vm, i64) -> std::result::Result<(), VmError> + 'static,
        reason: Option<&str>,
    ) -> Result<()> {
        tracing::info!(opcode = op, reason, "hot-swapping opcode handler");
        self.register_opcode(op, handler)
    }

    /// Remove `op`'s rule from both the direct-index cache and the flat
    /// array. Invalidates the cache if currently `Cached`.
    pub fn unregister_opcode(&mut self, op: u32) -> Result<()> {
        let index = self.require_in_range(op)?;

        self.rule_cache[index] = None;
        self.contexts[index] = None;

        if let Some(flat_index) = self.flat_index_of[index].take() {
            self.flat_rules.swap_remove(flat_index);
            // `swap_remove` moved the last element into `flat_index`
            // (unless it *was* the last element). Its old index was
            // `flat_rules.len()` as measured after the removal; find
            // whichever opcode recorded that index and repoint it.
            if flat_index < self.flat_rules.len() {
                let old_last_index = self.flat_rules.len();
                if let Some(moved_op) = self
                    .flat_index_of
                    .iter()
                    .position(|slot| *slot == Some(old_last_index))
                {
                    self.flat_index_of[moved_op] = Some(flat_index);
                }
            }
        }

        if self.mode == Mode::Cached {
            self.invalidate();
        }

        Ok(())
    }

    fn invalidate(&mut self) {
        tracing::debug!("dispatcher cache invalidated, entering uncached mode");
        self.mode = Mode::Uncached;
        self.cache_invalidations += 1;
    }

    /// Enter cached mode, bumping the cache version. Idempotent.
    pub fn enter_cached_mode(&mut self) {
        if self.mode == Mode::Cached {
            return;
        }
        self.mode = Mode::Cached;
        self.cache_version += 1;
        tracing::info!(version = self.cache_version, "dispatcher entering cached mode");
    }

    /// Enter uncached mode. Idempotent.
    pub fn enter_uncached_mode(&mut self) {
        if self.mode == Mode::Uncached {
            return;
        }
        self.invalidate();
    }

    /// Execute one instruction in the current mode.
    ///
    /// In `Cached` mode, an opcode with no installed rule is a fatal
    /// interpreter condition ([`SfpmError::UnknownOpcode`]); in
    /// `Uncached` mode it is a silent no-op, per `spec.md` §4.5.
    pub fn execute_instruction(&mut self, instr: Instruction) -> Result<()> {
        let index = self.require_in_range(instr.op)?;

        match self.mode {
            Mode::Cached => {
                let Some(rule) = &self.rule_cache[index] else {
                    return Err(SfpmError::UnknownOpcode { opcode: instr.op });
                };
                let ctx = self.contexts[index]
                    .as_ref()
                    .expect("a cached rule always has a matching context slot");
                ctx.operand.set(instr.operand);
                *ctx.fault.borrow_mut() = None;
                rule.execute_payload(ctx);
                self.cached_dispatches += 1;
                if let Some(fault) = ctx.fault.borrow_mut().take() {
                    return Err(SfpmError::from(fault));
                }
            }
            Mode::Uncached => {
                self.uncached_dispatches += 1;
                let Some(ctx) = self.contexts[index].clone() else {
                    return Ok(());
                };
                ctx.operand.set(instr.operand);
                *ctx.fault.borrow_mut() = None;

                let mut facts = DictFactSource::with_capacity(1);
                facts.add("opcode", Value::Int(i64::from(instr.op)));
                sfpm_matcher::match_rules(&mut self.flat_rules, &facts, &ctx, false);

                if let Some(fault) = ctx.fault.borrow_mut().take() {
                    return Err(SfpmError::from(fault));
                }
            }
        }

        Ok(())
    }

    /// Run every instruction of `program` against `self.vm` until halted
    /// or the program is exhausted, mirroring `tiered_run_program`.
    pub fn run_program(&mut self, program: &[Instruction]) -> Result<()> {
        loop {
            let (pc, halted) = {
                let vm = self.vm.borrow();
                (vm.pc(), vm.halted())
            };
            if halted || pc >= program.len() {
                break;
            }
            let instr = program[pc];
            self.vm.borrow_mut().advance_pc();
            self.execute_instruction(instr)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            cached_dispatches: self.cached_dispatches,
            uncached_dispatches: self.uncached_dispatches,
            cache_invalidations: self.cache_invalidations,
            cache_version: self.cache_version,
            mode: Some(self.mode),
        }
    }
}
