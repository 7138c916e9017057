use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::LoopMode;
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Default storage budget for captured fragments: 20 MiB.
pub const DEFAULT_STORAGE_BUDGET_BYTES: u64 = 20 * 1024 * 1024;

/// Default delay between playback ticks in milliseconds.
pub const DEFAULT_INTERVAL_MS: f64 = 200.0;

/// Default bound on the edit distance explored per alignment bisection.
pub const DEFAULT_DIFF_COST_LIMIT: usize = 4096;

/// Top-level configuration shared by encoding, capture, and playback.
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```json
/// { "default_mode": "reflect", "interval_ms": 50 }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlipbookConfig {
    /// Capture stops once accumulated fragment bytes reach this budget.
    pub storage_budget_bytes: u64,
    /// Loop mode a freshly opened artifact starts in.
    pub default_mode: LoopMode,
    /// Delay between playback ticks in milliseconds.
    pub interval_ms: f64,
    /// Fan pairwise frame diffs out over a worker pool.
    pub parallel_diff: bool,
    /// Worker count for the diff pool. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Store every N-th frame verbatim in addition to frame 0.
    pub checkpoint_interval: Option<usize>,
    /// Edit distance explored per bisection before falling back to a whole-region replace.
    pub diff_cost_limit: Option<usize>,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        Self {
            storage_budget_bytes: DEFAULT_STORAGE_BUDGET_BYTES,
            default_mode: LoopMode::Loop,
            interval_ms: DEFAULT_INTERVAL_MS,
            parallel_diff: true,
            threads: None,
            checkpoint_interval: None,
            diff_cost_limit: Some(DEFAULT_DIFF_COST_LIMIT),
        }
    }
}

impl FlipbookConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> FlipbookResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> FlipbookResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Validate static invariants.
    pub fn validate(&self) -> FlipbookResult<()> {
        if !self.interval_ms.is_finite() || self.interval_ms <= 0.0 {
            return Err(FlipbookError::validation(
                "interval_ms must be finite and > 0",
            ));
        }
        if self.threads == Some(0) {
            return Err(FlipbookError::validation("threads must be >= 1 when set"));
        }
        if self.checkpoint_interval == Some(0) {
            return Err(FlipbookError::validation(
                "checkpoint_interval must be >= 1 when set",
            ));
        }
        if self.diff_cost_limit == Some(0) {
            return Err(FlipbookError::validation(
                "diff_cost_limit must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
