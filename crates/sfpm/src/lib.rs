//! Stella Fuzzy Pattern Matcher (SFPM): dispatch a unit of work by
//! selecting, from a set of declarative rules, the one whose conjunction
//! of criteria most specifically matches a set of named facts.
//!
//! This crate is the public entry point over the workspace's layered
//! crates — fact sources, criteria, rules, the matcher, a tiered
//! cached/uncached opcode dispatcher built on top of it, and a binary
//! memory-image snapshot engine. Each layer is also usable standalone
//! (`sfpm-criteria`, `sfpm-matcher`, ...); this crate just re-exports the
//! pieces most callers need under one name.
//!
//! # Example
//!
//! ```
//! use sfpm::{CompareOp, Criteria, DictFactSource, Rule, RuleSet, Value};
//! use std::cell::Cell;
//!
//! let mut facts = DictFactSource::with_capacity(2);
//! facts.add("health", Value::Int(30));
//! facts.add("isInCombat", Value::Bool(true));
//!
//! let fired = Cell::new("");
//! let critical = Rule::new(
//!     vec![
//!         Criteria::comparison("health", CompareOp::Less, 50_i64),
//!         Criteria::comparison("isInCombat", CompareOp::Equal, true),
//!     ],
//!     Some(Box::new(|fired: &Cell<&str>| fired.set("critical"))),
//!     Some("critical".to_owned()),
//! );
//!
//! let mut rules = RuleSet::new();
//! rules.add_rule(critical);
//! rules.match_facts(&facts, &fired, true);
//! assert_eq!(fired.get(), "critical");
//! ```
//!
//! # Non-goals
//!
//! This is a fuzzy conjunction matcher, not a general inference engine:
//! no RETE network, no unification, no negation, no forward chaining, no
//! query language. Rule *definitions* are never persisted — only raw
//! memory images via [`snapshot`]. The rule set itself is not
//! thread-safe; serialize access externally.

pub use sfpm_error::{Result, SfpmError};

pub use sfpm_core::{
    compare, config, least_specific_rule, logging, match_rules, most_specific_rule, optimize_rules,
    CompareOp, Criteria, DictFactSource, EvalResult, FactSource, Operator, OwnedValue, Rule, RuleSet, Value,
    ValueTag,
};

/// The tiered cached/uncached opcode dispatcher and the illustrative VM
/// it drives.
pub mod dispatch {
    pub use sfpm_dispatch::{DispatchStats, Mode, OpcodeContext, OpcodeHandler, TieredDispatcher};
    pub use sfpm_vm::{
        op_add, op_div, op_halt, op_mul, op_print, op_push, op_sub, Instruction, Vm, VmError,
        DEFAULT_STACK_SIZE,
    };
}

/// Binary memory-image snapshot save/restore.
pub mod snapshot {
    pub use sfpm_snapshot::{
        read_metadata, SnapshotDescriptor, SnapshotMetadata, DEFAULT_MAX_REGIONS, DESCRIPTION_BYTES, MAGIC,
        VERSION,
    };
}
