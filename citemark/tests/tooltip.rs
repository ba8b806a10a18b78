use citemark::RenderConfig;
use citemark::tooltip::{Rect, Size, TooltipState, compute_tooltip_position, truncate_excerpt};

#[test]
fn clamps_to_right_edge() {
    let config = RenderConfig::default();
    let tooltip = Size::new(300.0, 100.0);
    let viewport = Size::new(1000.0, 800.0);
    let anchor = Rect::new(960.0, 200.0, 16.0, 16.0);
    let pos = compute_tooltip_position(anchor, tooltip, viewport, &config);
    assert!(pos.left <= 1000.0 - 300.0 - 16.0);
    assert_eq!(pos.left, 684.0);
    assert_eq!(pos.top, 216.0 + config.tooltip_gap);
}

#[test]
fn clamps_to_left_margin() {
    let config = RenderConfig::default();
    let pos = compute_tooltip_position(
        Rect::new(2.0, 10.0, 10.0, 10.0),
        Size::new(300.0, 100.0),
        Size::new(1000.0, 800.0),
        &config,
    );
    assert_eq!(pos.left, 16.0);
}

#[test]
fn narrow_viewport_prefers_left_margin() {
    let config = RenderConfig::default();
    let pos = compute_tooltip_position(
        Rect::new(100.0, 10.0, 10.0, 10.0),
        Size::new(300.0, 100.0),
        Size::new(200.0, 800.0),
        &config,
    );
    assert_eq!(pos.left, 16.0);
}

#[test]
fn flips_above_near_bottom() {
    let config = RenderConfig::default();
    let pos = compute_tooltip_position(
        Rect::new(100.0, 760.0, 10.0, 16.0),
        Size::new(300.0, 100.0),
        Size::new(1000.0, 800.0),
        &config,
    );
    assert_eq!(pos.top, 760.0 - config.tooltip_gap - 100.0);
}

#[test]
fn excerpt_truncation_counts_characters() {
    assert_eq!(truncate_excerpt("short", 100), "short");
    let exact = "é".repeat(100);
    assert_eq!(truncate_excerpt(&exact, 100), exact);
    let long = "é".repeat(101);
    assert_eq!(truncate_excerpt(&long, 100), format!("{}...", "é".repeat(100)));
}

#[test]
fn hover_state_enter_and_leave() {
    let config = RenderConfig::default();
    let mut state = TooltipState::default();
    state.enter(
        Rect::new(50.0, 50.0, 10.0, 10.0),
        Size::new(1000.0, 800.0),
        &config,
    );
    assert!(state.visible);
    assert_eq!(state.position.left, 50.0);
    state.leave();
    assert!(!state.visible);
}
