//! Engine tunables.
//!
//! Every distance is in document units at zoom 1; gesture code divides by the
//! current zoom so hot-zones keep a constant on-screen size.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    /// Maximum number of undo entries kept.
    pub history_limit: usize,
    /// Recorded batches closer together than this are merged into one undo entry.
    /// Zero disables merging.
    pub history_merge_window_ms: u64,
    /// Minimum spacing between dispatched pointer-move events.
    pub pointer_move_throttle_ms: u64,
    /// Minimum spacing between handled wheel events.
    pub wheel_throttle_ms: u64,
    /// Movement before a select gesture counts as a drag.
    pub select_threshold: f64,
    /// Movement before a move gesture starts translating elements.
    pub move_threshold: f64,
    /// Reference-line snap tolerance.
    pub snap_distance: f64,
    /// Maximum cursor distance to a connection point for arrow binding.
    pub bind_distance: f64,
    /// Elements whose bounds, inflated by this much, contain the cursor
    /// broadcast their connection points during an arrow drag.
    pub closing_range: f64,
    /// Half-width of the band around an arrow that counts as a hit.
    pub arrow_hit_padding: f64,
    /// Resize handle hit radius.
    pub handle_hit_tolerance: f64,
    /// Connection point hit radius.
    pub connect_point_radius: f64,
    /// Outward offset of the draggable connection points.
    pub connect_extend: f64,
    /// Keyboard nudge distance.
    pub nudge_step: f64,
    /// Keyboard nudge distance while alt is held.
    pub precise_nudge_step: f64,
    /// Multiplicative zoom step for wheel and keyboard zoom.
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Padding used when fitting the viewport to content.
    pub fit_padding: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            history_merge_window_ms: 0,
            pointer_move_throttle_ms: 25,
            wheel_throttle_ms: 100,
            select_threshold: 3.0,
            move_threshold: 5.0,
            snap_distance: 5.0,
            bind_distance: 5.0,
            closing_range: 20.0,
            arrow_hit_padding: 10.0,
            handle_hit_tolerance: 8.0,
            connect_point_radius: 8.0,
            connect_extend: 20.0,
            nudge_step: 5.0,
            precise_nudge_step: 1.0,
            zoom_step: 1.1,
            min_zoom: 0.1,
            max_zoom: 10.0,
            fit_padding: 50.0,
        }
    }
}

impl BoardConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
