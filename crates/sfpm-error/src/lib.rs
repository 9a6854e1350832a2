//! Shared error type for the SFPM runtime.
//!
//! Most SFPM operations signal failure with `bool` or `Option`, per the
//! runtime's error taxonomy: a type mismatch, a missing fact, or a hook
//! abort is a *miss*, not an error, and is never represented here. This
//! type exists for the smaller set of operations that are genuinely
//! fallible and caller-actionable: snapshot I/O, snapshot format
//! validation, and dispatcher misconfiguration.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SfpmError>;

/// The error type returned by fallible SFPM operations.
#[derive(Debug, thiserror::Error)]
pub enum SfpmError {
    /// Opening, reading, or writing a snapshot file failed at the OS level.
    #[error("snapshot I/O error on {path}: {source}")]
    SnapshotIo {
        /// Path to the snapshot file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file was truncated: fewer bytes were available than the
    /// format requires at the point of reading.
    #[error("snapshot file truncated while reading {what}")]
    Truncated {
        /// What was being read when the file ran out (e.g. "header", "region 2 payload").
        what: &'static str,
    },

    /// The magic number at the start of a snapshot file did not match.
    #[error("bad snapshot magic number")]
    BadMagic,

    /// The snapshot format version did not match the version this build understands.
    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build supports.
        expected: u32,
        /// Version stored in the file.
        found: u32,
    },

    /// The number of regions in the file did not match the descriptor being restored into.
    #[error("snapshot region count mismatch: descriptor has {expected}, file has {found}")]
    RegionCountMismatch {
        /// Region count in the live descriptor.
        expected: u32,
        /// Region count recorded in the file.
        found: u32,
    },

    /// A region's size in the file did not match the live descriptor's region at the same index.
    #[error("snapshot region {index} size mismatch: descriptor expects {expected}, file has {found}")]
    RegionSizeMismatch {
        /// Index of the mismatched region.
        index: usize,
        /// Size the live descriptor declared for this region.
        expected: u64,
        /// Size recorded in the file for this region.
        found: u64,
    },

    /// The cached dispatcher was asked to execute an opcode with no installed rule.
    #[error("unknown opcode {opcode} in cached dispatch mode")]
    UnknownOpcode {
        /// The opcode that had no cached rule.
        opcode: u32,
    },

    /// A declared-but-unimplemented operation (e.g. delta snapshots) was invoked.
    #[error("{feature} is not implemented")]
    Unimplemented {
        /// Name of the unimplemented feature.
        feature: &'static str,
    },

    /// The illustrative VM hit a fatal condition (stack overflow/underflow,
    /// division by zero) while a tiered dispatcher's payload ran it.
    #[error("vm fault during dispatch: {0}")]
    VmFault(#[from] sfpm_vm::VmError),

    /// A catch-all for conditions that don't warrant a dedicated variant.
    #[error("{0}")]
    Internal(String),
}

impl SfpmError {
    /// Build an [`SfpmError::Internal`] from anything displayable.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
