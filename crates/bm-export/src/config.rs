//! Export tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Resolution multiplier for dialog previews.
    pub preview_multiplier: f32,
    /// Resolution multiplier for the printed PDF.
    pub final_multiplier: f32,
    /// Quiet period before a preview is regenerated.
    pub debounce_ms: u64,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            preview_multiplier: 0.6,
            final_multiplier: 2.0,
            debounce_ms: 500,
            jpeg_quality: 80,
        }
    }
}

impl ExportConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }
}
