//! Citation tooltip geometry.
//!
//! Positioning is a pure function of the anchor box, the tooltip size and the
//! viewport, so it can be exercised without any rendering environment.

use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::config::RenderConfig;

/// An on-screen box in CSS pixels, measured from the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

/// Place a tooltip under `anchor`, keeping it inside the viewport.
///
/// `left` starts at the anchor's left edge and is clamped to
/// `[margin, viewport.width - tooltip.width - margin]`; when the viewport is
/// narrower than that range the left margin wins. The tooltip flips above the
/// anchor when it would run past the bottom edge and there is room above.
pub fn compute_tooltip_position(
    anchor: Rect,
    tooltip: Size,
    viewport: Size,
    config: &RenderConfig,
) -> Position {
    let margin = config.viewport_margin;
    let max_left = viewport.width - tooltip.width - margin;
    let left = anchor.left.min(max_left).max(margin);

    let below = anchor.bottom() + config.tooltip_gap;
    let above = anchor.top - config.tooltip_gap - tooltip.height;
    let top = if below + tooltip.height > viewport.height - margin && above >= margin {
        above
    } else {
        below
    };

    Position { top, left }
}

/// Cap an excerpt at `limit` characters, appending `...` when it was cut.
pub fn truncate_excerpt(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Content and placement of a detached citation tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub document_title: String,
    pub section: String,
    pub excerpt: String,
    pub position: Position,
}

impl Tooltip {
    pub fn for_citation(
        citation: &Citation,
        anchor: Rect,
        viewport: Size,
        config: &RenderConfig,
    ) -> Self {
        let size = Size::new(config.tooltip_width, config.tooltip_height);
        Tooltip {
            document_title: citation.document_title.clone(),
            section: citation.section.clone(),
            excerpt: truncate_excerpt(&citation.excerpt, config.excerpt_limit),
            position: compute_tooltip_position(anchor, size, viewport, config),
        }
    }
}

/// Per-chip hover state: recomputed on every enter, cleared on leave.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TooltipState {
    pub visible: bool,
    pub position: Position,
}

impl TooltipState {
    pub fn enter(&mut self, anchor: Rect, viewport: Size, config: &RenderConfig) {
        let size = Size::new(config.tooltip_width, config.tooltip_height);
        self.position = compute_tooltip_position(anchor, size, viewport, config);
        self.visible = true;
    }

    pub fn leave(&mut self) {
        *self = TooltipState::default();
    }
}
