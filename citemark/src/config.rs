use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Presentation settings shared by the renderer, tooltips and the CSV copy action.
///
/// Every field has a default so a partial `[render]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tooltip box width in pixels.
    pub tooltip_width: f64,
    /// Tooltip box height in pixels.
    pub tooltip_height: f64,
    /// Minimum distance kept between a tooltip and the viewport edges.
    pub viewport_margin: f64,
    /// Vertical gap between a citation chip and its tooltip.
    pub tooltip_gap: f64,
    /// Excerpt characters shown in a tooltip before `...` is appended.
    pub excerpt_limit: usize,
    /// How long the "Copied" acknowledgement stays visible.
    pub copy_feedback_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            tooltip_width: 320.0,
            tooltip_height: 120.0,
            viewport_margin: 16.0,
            tooltip_gap: 8.0,
            excerpt_limit: 100,
            copy_feedback_ms: 2000,
        }
    }
}

impl RenderConfig {
    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}
