//! Editor tunables.

use serde::{Deserialize, Serialize};

/// Tunables for an editor session. Loaded from JSON by hosts that want to
/// override the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Additive step for zoom in/out.
    pub zoom_step: f64,
    /// Largest accepted image upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            min_zoom: 0.1,
            max_zoom: 3.0,
            zoom_step: 0.1,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl EditorConfig {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return 1.0;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
