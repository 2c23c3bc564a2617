use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::history::{DEFAULT_MAX_BYTES, DEFAULT_MAX_DEPTH};

/// Default colour-distance tolerance for flood fill (max per-channel delta).
pub const DEFAULT_FILL_TOLERANCE: u8 = 16;

/// Engine tuning knobs. Every key is optional in a config file; missing keys
/// take the defaults.
///
/// ```toml
/// max_history_depth = 50
/// max_history_bytes = 268435456
/// fill_tolerance = 24
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum undo steps (and redo steps) kept.
    pub max_history_depth: usize,
    /// Memory cap across both history stacks. `None` disables the cap.
    pub max_history_bytes: Option<usize>,
    /// Flood fill tolerance used by `CanvasEngine::flood_fill`.
    pub fill_tolerance: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history_depth: DEFAULT_MAX_DEPTH,
            max_history_bytes: Some(DEFAULT_MAX_BYTES),
            fill_tolerance: DEFAULT_FILL_TOLERANCE,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let src = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config '{}'", path.display()))?;
        Self::from_toml_str(&src)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }
}
