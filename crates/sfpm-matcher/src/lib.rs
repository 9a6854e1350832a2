//! The matcher: specificity-maximising rule selection with a priority
//! tie-break and a uniform-random final tie-break.
//!
//! Ported from `matcher.c`'s `sfpm_match`/`sfpm_optimize_rules`/
//! `sfpm_most_specific_rule`/`sfpm_least_specific_rule`. The C original
//! lazily seeds a process-global `rand()` on first tie via a
//! function-local `static bool rand_initialized`; `spec.md` §9 asks for
//! this to become "a module-local state with a single initialization
//! fence" without exposing seeding in the public API — done here with a
//! `OnceLock<Mutex<StdRng>>`.

use std::sync::{Mutex, OnceLock};

use rand::{rngs::StdRng, Rng, SeedableRng};
use sfpm_fact::FactSource;
use sfpm_rule::Rule;

fn process_rng() -> &'static Mutex<StdRng> {
    static RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();
    RNG.get_or_init(|| Mutex::new(StdRng::from_entropy()))
}

/// Sort `rules` in place by descending criteria count (specificity).
///
/// Enables the matcher's early-exit optimisation: once a rule with fewer
/// criteria than the current best score is reached, no later rule in a
/// descending-sorted array can out-specify it.
pub fn optimize_rules<Ctx>(rules: &mut [Option<Rule<Ctx>>]) {
    rules.sort_by(|a, b| {
        let count = |r: &Option<Rule<Ctx>>| r.as_ref().map_or(0, Rule::criteria_count);
        count(b).cmp(&count(a))
    });
}

/// The most specific (highest criteria-count) rule in a non-empty slice.
/// Ties are broken by first occurrence. `None` if the slice is empty or
/// holds only `None` entries.
#[must_use]
pub fn most_specific_rule<Ctx>(rules: &[Option<Rule<Ctx>>]) -> Option<&Rule<Ctx>> {
    let mut best: Option<&Rule<Ctx>> = None;
    for rule in rules.iter().filter_map(Option::as_ref) {
        if best.is_none_or(|b| rule.criteria_count() > b.criteria_count()) {
            best = Some(rule);
        }
    }
    best
}

/// The least specific (lowest criteria-count) rule in a non-empty slice.
/// Ties are broken by first occurrence.
#[must_use]
pub fn least_specific_rule<Ctx>(rules: &[Option<Rule<Ctx>>]) -> Option<&Rule<Ctx>> {
    let mut best: Option<&Rule<Ctx>> = None;
    for rule in rules.iter().filter_map(Option::as_ref) {
        if best.is_none_or(|b| rule.criteria_count() < b.criteria_count()) {
            best = Some(rule);
        }
    }
    best
}

/// Match `rules` against `facts` and fire the winner, if any.
///
/// `rules` entries may be `None` (a "null rule"), which are skipped, per
/// `spec.md` §4.4's failure semantics. If `optimize` is set, `rules` is
/// first sorted descending by specificity in place and the scan exits
/// early once no later rule can out-specify the current best. A miss
/// (nothing matched) is silent, not an error.
pub fn match_rules<Ctx>(rules: &mut [Option<Rule<Ctx>>], facts: &dyn FactSource, ctx: &Ctx, optimize: bool) {
    if rules.is_empty() {
        return;
    }

    if optimize {
        optimize_rules(rules);
    }

    let mut best_score: usize = 0;
    let mut accepted: Vec<usize> = Vec::new();

    for (index, slot) in rules.iter().enumerate() {
        let Some(rule) = slot else { continue };

        let eval = rule.evaluate(facts, ctx);
        if eval.matched {
            if eval.criteria_count > best_score {
                best_score = eval.criteria_count;
                accepted.clear();
                accepted.push(index);
            } else if eval.criteria_count == best_score && best_score > 0 {
                accepted.push(index);
            }
        }

        if optimize && rule.criteria_count() < best_score {
            break;
        }
    }

    if accepted.is_empty() {
        return;
    }

    let selected = if accepted.len() == 1 {
        accepted[0]
    } else {
        select_by_priority(rules, &accepted)
    };

    if let Some(rule) = &rules[selected] {
        rule.execute_payload(ctx);
    }
}

/// Narrow `accepted` to the indices with maximum priority, then pick one:
/// the sole survivor if unique, otherwise uniformly at random.
fn select_by_priority<Ctx>(rules: &[Option<Rule<Ctx>>], accepted: &[usize]) -> usize {
    let highest_priority = accepted
        .iter()
        .filter_map(|&i| rules[i].as_ref())
        .map(sfpm_rule::Rule::priority)
        .max()
        .unwrap_or(0);

    let candidates: Vec<usize> = accepted
        .iter()
        .copied()
        .filter(|&i| rules[i].as_ref().is_some_and(|r| r.priority() == highest_priority))
        .collect();

    if candidates.len() == 1 {
        return candidates[0];
    }

    tracing::debug!(
        candidate_count = candidates.len(),
        "matcher: tied on priority, breaking tie at random"
    );
    let mut rng = process_rng().lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    candidates[rng.gen_range(0..candidates.len())]
}
