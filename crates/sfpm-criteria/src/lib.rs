//! Criteria: one predicate over one named fact.
//!
//! The C original stores a criteria as a single struct with an operator
//! field plus *either* an `expected` value *or* a predicate function
//! pointer, the two fields' validity governed only by convention (an
//! "opaque polymorphism"). This redesigns that as a two-variant sum type —
//! [`Criteria::Comparison`] and [`Criteria::Predicate`] — so a predicate
//! criterion can never carry a stray `expected` value and vice versa; the
//! invariant that "predicate criteria never touch `expected`; comparison
//! criteria never invoke a predicate" is enforced by the type rather than
//! documented as a convention.
//!
//! `Ctx` is the caller-supplied context type threaded through predicate
//! evaluation, replacing the C API's `void *user_data` parameter.

use sfpm_fact::FactSource;
use sfpm_types::{compare, OwnedValue, Value};

/// The comparison operators a [`Criteria::Comparison`] may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    Less,
    Ge,
    Le,
}

/// The full operator set, including `Predicate`, for introspection parity
/// with the original C `sfpm_operator_t` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    Ge,
    Le,
    Predicate,
}

impl From<CompareOp> for Operator {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Equal => Self::Equal,
            CompareOp::NotEqual => Self::NotEqual,
            CompareOp::Greater => Self::Greater,
            CompareOp::Less => Self::Less,
            CompareOp::Ge => Self::Ge,
            CompareOp::Le => Self::Le,
        }
    }
}

/// A single immutable criterion: one fact name plus either a comparison
/// operator and expected value, or a custom predicate.
pub enum Criteria<Ctx> {
    Comparison {
        fact_name: String,
        op: CompareOp,
        expected: OwnedValue,
    },
    Predicate {
        fact_name: String,
        predicate: Box<dyn Fn(Value<'_>, &Ctx) -> bool>,
        debug_name: Option<String>,
    },
}

impl<Ctx> Criteria<Ctx> {
    /// Build a comparison criterion.
    pub fn comparison(fact_name: impl Into<String>, op: CompareOp, expected: impl Into<OwnedValue>) -> Self {
        Self::Comparison {
            fact_name: fact_name.into(),
            op,
            expected: expected.into(),
        }
    }

    /// Build a predicate criterion.
    pub fn predicate(
        fact_name: impl Into<String>,
        debug_name: Option<String>,
        predicate: impl Fn(Value<'_>, &Ctx) -> bool + 'static,
    ) -> Self {
        Self::Predicate {
            fact_name: fact_name.into(),
            predicate: Box::new(predicate),
            debug_name,
        }
    }

    /// The fact name this criterion reads.
    #[must_use]
    pub fn fact_name(&self) -> &str {
        match self {
            Self::Comparison { fact_name, .. } | Self::Predicate { fact_name, .. } => fact_name,
        }
    }

    /// The operator, for introspection. `Comparison` criteria report their
    /// stored operator; `Predicate` criteria always report
    /// [`Operator::Predicate`].
    #[must_use]
    pub fn operator(&self) -> Operator {
        match self {
            Self::Comparison { op, .. } => Operator::from(*op),
            Self::Predicate { .. } => Operator::Predicate,
        }
    }

    /// Evaluate this criterion against a fact source and predicate
    /// context.
    ///
    /// A missing fact is a miss (`false`), never an error. A comparison
    /// criterion against a fact of a different tag is also a miss.
    pub fn evaluate(&self, facts: &dyn FactSource, ctx: &Ctx) -> bool {
        let Some(actual) = facts.try_get(self.fact_name()) else {
            return false;
        };

        match self {
            Self::Predicate { predicate, .. } => predicate(actual, ctx),
            Self::Comparison { op, expected, .. } => {
                let Some(ordering) = compare(actual, expected.as_value()) else {
                    return false;
                };
                match op {
                    CompareOp::Equal => ordering.is_eq(),
                    CompareOp::NotEqual => ordering.is_ne(),
                    CompareOp::Greater => ordering.is_gt(),
                    CompareOp::Less => ordering.is_lt(),
                    CompareOp::Ge => ordering.is_ge(),
                    CompareOp::Le => ordering.is_le(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfpm_fact::DictFactSource;

    #[test]
    fn equal_matches() {
        let mut facts = DictFactSource::with_capacity(1);
        facts.add("health", Value::Int(30));
        let c: Criteria<()> = Criteria::comparison("health", CompareOp::Equal, 30_i64);
        assert!(c.evaluate(&facts, &()));
    }

    #[test]
    fn less_than_matches() {
        let mut facts = DictFactSource::with_capacity(1);
        facts.add("health", Value::Int(30));
        let c: Criteria<()> = Criteria::comparison("health", CompareOp::Less, 50_i64);
        assert!(c.evaluate(&facts, &()));
    }

    #[test]
    fn missing_fact_is_a_miss() {
        let facts = DictFactSource::with_capacity(0);
        let c: Criteria<()> = Criteria::comparison("health", CompareOp::Equal, 30_i64);
        assert!(!c.evaluate(&facts, &()));
    }

    #[test]
    fn tag_mismatch_is_a_miss() {
        let mut facts = DictFactSource::with_capacity(1);
        facts.add("health", Value::Bool(true));
        let c: Criteria<()> = Criteria::comparison("health", CompareOp::Equal, 30_i64);
        assert!(!c.evaluate(&facts, &()));
    }

    #[test]
    fn predicate_receives_value_and_context() {
        let mut facts = DictFactSource::with_capacity(1);
        facts.add("enemyCount", Value::Int(3));
        let threshold = 2_i64;
        let c = Criteria::predicate(
            "enemyCount",
            Some("many_enemies".to_owned()),
            move |v, ctx: &i64| matches!(v, Value::Int(n) if n > threshold + *ctx),
        );
        assert!(c.evaluate(&facts, &0));
        assert!(!c.evaluate(&facts, &10));
    }

    #[test]
    fn operator_introspection_reports_predicate_for_predicate_criteria() {
        let c: Criteria<()> = Criteria::predicate("x", None, |_, _| true);
        assert_eq!(c.operator(), Operator::Predicate);
    }
}
