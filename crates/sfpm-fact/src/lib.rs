//! Fact sources: the host-supplied, named, typed lookup criteria evaluate
//! against.
//!
//! The C original represents a fact source as a vtable-style struct of
//! function pointers (`try_get_fact`, `destroy`) plus a `void *user_data`.
//! This redesigns that as a trait: `try_get` stays, but `destroy` drops out
//! entirely in favor of Rust's ordinary `Drop` — a fact source's owned key
//! storage is freed when the value goes out of scope, with no explicit
//! teardown call needed.

use sfpm_types::Value;

/// An opaque provider of named, typed facts for the duration of one match
/// call.
///
/// Implementations are not required to be efficient for large fact counts;
/// [`DictFactSource`] is the one mandated implementation and is
/// intentionally `O(n)` in entry count.
pub trait FactSource {
    /// Look up a fact by name. A miss (unknown name) returns `None`; this
    /// is never an error.
    fn try_get(&self, name: &str) -> Option<Value<'_>>;
}

/// An insertion-ordered, keyed mapping from fact name to value.
///
/// `add` replaces the value of an existing key (even across differing
/// value tags) rather than erroring. Capacity is advisory: it sizes the
/// initial allocation but growth beyond it is always accepted, doubling
/// the backing storage as the original C implementation does.
#[derive(Debug, Default)]
pub struct DictFactSource<'a> {
    entries: Vec<(String, Value<'a>)>,
}

impl<'a> DictFactSource<'a> {
    /// Create an empty fact source with the given advisory initial
    /// capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Add a fact, replacing any existing entry with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: Value<'a>) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
            return;
        }
        if self.entries.len() == self.entries.capacity() {
            let doubled = (self.entries.capacity() * 2).max(1);
            self.entries.reserve_exact(doubled - self.entries.len());
        }
        self.entries.push((name, value));
    }

    /// Number of facts currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no facts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FactSource for DictFactSource<'a> {
    fn try_get(&self, name: &str) -> Option<Value<'_>> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }
}
