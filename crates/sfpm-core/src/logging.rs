//! Process-wide `tracing` subscriber install.
//!
//! `spec.md` §7 calls for "a human-readable diagnostic ... emitted on a
//! side channel" for snapshot I/O failures, and the matcher/dispatcher
//! crates emit `tracing` events for cache invalidation and hot-swap.
//! This is the one-time installation point, matching the teacher's
//! practice of a single fenced subscriber init rather than letting every
//! binary wire its own.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Install a `tracing` subscriber reading `RUST_LOG` (defaulting to
/// `info`), idempotently. Safe to call more than once — and from more
/// than one test in the same process — since only the first call has any
/// effect.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
