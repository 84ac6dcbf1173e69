//! Editor configuration.
//!
//! Defaults suit an interactive session. Values can come from a JSON file
//! and be overridden from the environment:
//!
//! - `VITRINE_AUTOSAVE_MS`: quiet period before an automatic save
//! - `VITRINE_EDGE_MARGIN`: edge promotion margin in pixels
//! - `VITRINE_HISTORY_LIMIT`: maximum undo depth
//! - `VITRINE_READ_ONLY`: set to "1" to disable pointer editing

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet period after the last edit before the state is saved.
    pub autosave_delay_ms: u64,
    /// Pointer distance from an element's edge that promotes a click to the
    /// enclosing container.
    pub edge_margin_px: f64,
    /// Maximum number of undo snapshots kept; 0 keeps everything.
    pub history_limit: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// Preview mode: pointer events are ignored.
    pub read_only: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 5_000,
            edge_margin_px: 6.0,
            history_limit: 100,
            min_zoom: 0.25,
            max_zoom: 3.0,
            zoom_step: 0.1,
            read_only: false,
        }
    }
}

impl EditorConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file; missing fields fall back to defaults and
    /// out-of-range values are reset.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EditorConfig = serde_json::from_str(&text)?;
        Ok(config.with_env_overrides().validated())
    }

    /// Reset unusable values to their defaults: an empty or non-positive
    /// zoom range, a non-positive zoom step, a negative edge margin.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        let zoom_range_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !zoom_range_ok {
            warn!(
                min = self.min_zoom,
                max = self.max_zoom,
                "invalid zoom range, using defaults"
            );
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            warn!(step = self.zoom_step, "invalid zoom step, using default");
            self.zoom_step = defaults.zoom_step;
        }
        if !(self.edge_margin_px.is_finite() && self.edge_margin_px >= 0.0) {
            warn!(margin = self.edge_margin_px, "invalid edge margin, using default");
            self.edge_margin_px = defaults.edge_margin_px;
        }
        self
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env::var("VITRINE_AUTOSAVE_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
        {
            self.autosave_delay_ms = ms;
        }
        if let Some(margin) = env::var("VITRINE_EDGE_MARGIN")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .filter(|m| m.is_finite() && *m >= 0.0)
        {
            self.edge_margin_px = margin;
        }
        if let Some(limit) = env::var("VITRINE_HISTORY_LIMIT")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
        {
            self.history_limit = limit;
        }
        if let Ok(val) = env::var("VITRINE_READ_ONLY") {
            self.read_only = val == "1";
        }
        self
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Clamp a zoom factor into the configured range. Never panics, even
    /// on a range that skipped [`EditorConfig::validated`].
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return 1.0;
        }
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.autosave_delay(), Duration::from_secs(5));
        assert_eq!(config.edge_margin_px, 6.0);
        assert!(!config.read_only);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"autosaveDelayMs": 1500, "readOnly": true}}"#).unwrap();

        let config: EditorConfig =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(config.autosave_delay_ms, 1500);
        assert!(config.read_only);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_clamp_zoom() {
        let config = EditorConfig::default();
        assert_eq!(config.clamp_zoom(10.0), 3.0);
        assert_eq!(config.clamp_zoom(0.0), 0.25);
        assert_eq!(config.clamp_zoom(f64::NAN), 1.0);
    }

    #[test]
    fn test_inverted_zoom_range_is_reset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"minZoom": 2.0, "maxZoom": 1.0, "zoomStep": 0}}"#).unwrap();

        let config = EditorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.min_zoom, 0.25);
        assert_eq!(config.max_zoom, 3.0);
        assert_eq!(config.zoom_step, 0.1);
        assert_eq!(config.clamp_zoom(5.0), 3.0);
    }

    #[test]
    fn test_clamp_zoom_on_unvalidated_range() {
        let config = EditorConfig {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..Default::default()
        };
        assert_eq!(config.clamp_zoom(1.5), 1.0);
    }
}
