//! Engine tuning knobs.
//!
//! Every field has a default, so a config file only needs to name the
//! values it changes:
//!
//! ```json
//! { "overscanRows": 4, "search": { "kind": "binary" } }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::SearchStrategy;
use crate::momentum::MomentumConfig;

/// Extra rows/cols materialized beyond each viewport edge.
pub const DEFAULT_OVERSCAN: u32 = 2;

/// Unforced recomputes closer together than this are skipped.
pub const MIN_RECOMPUTE_INTERVAL_MS: f64 = 15.0;

/// Size assumed for a row that has not been measured yet.
pub const DEFAULT_ESTIMATED_ROW_SIZE: f64 = 25.0;

/// Size assumed for a column that has not been measured yet.
pub const DEFAULT_ESTIMATED_COL_SIZE: f64 = 100.0;

/// Smallest scrollbar thumb, as a fraction of the track.
pub const MIN_THUMB_FRACTION: f64 = 0.05;

/// Quiet time after the last scroll before the scroll indicator hides.
pub const INDICATOR_IDLE_MS: f64 = 800.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub overscan_rows: u32,
    pub overscan_cols: u32,
    /// Stand-in for unmeasured rows when sizing the materialized range
    pub estimated_row_size: f64,
    pub estimated_col_size: f64,
    pub min_recompute_interval_ms: f64,
    pub search: SearchStrategy,
    pub min_thumb_fraction: f64,
    pub indicator_idle_ms: f64,
    pub momentum: MomentumConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overscan_rows: DEFAULT_OVERSCAN,
            overscan_cols: DEFAULT_OVERSCAN,
            estimated_row_size: DEFAULT_ESTIMATED_ROW_SIZE,
            estimated_col_size: DEFAULT_ESTIMATED_COL_SIZE,
            min_recompute_interval_ms: MIN_RECOMPUTE_INTERVAL_MS,
            search: SearchStrategy::default(),
            min_thumb_fraction: MIN_THUMB_FRACTION,
            indicator_idle_ms: INDICATOR_IDLE_MS,
            momentum: MomentumConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON, filling unspecified fields with defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        tracing::debug!(?config, "loaded engine config");
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"overscanRows": 5}"#).unwrap();
        assert_eq!(config.overscan_rows, 5);
        assert_eq!(config.overscan_cols, DEFAULT_OVERSCAN);
        assert_eq!(config.min_recompute_interval_ms, MIN_RECOMPUTE_INTERVAL_MS);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(EngineConfig::from_json(r#"{"overscanRows": "many"}"#).is_err());
    }
}
