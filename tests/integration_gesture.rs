use std::sync::Arc;

use call_overlay::bridge::BridgeCommand;
use call_overlay::gesture::{TouchAction, TouchEvent};
use call_overlay::platform::headless::{HeadlessJournal, HeadlessPlatform};
use call_overlay::store::{MemoryStore, StoreWriter};
use call_overlay::telephony::CallSignal;
use call_overlay::window::{Dimension, Position, ScreenMetrics};
use call_overlay::{ControllerCore, ControllerHandle, OverlayConfig};

// Default metrics put the overlay at (0, 92) with a 180 px drag band and a
// 24 px slop.
const ORIGIN: Position = Position { x: 0, y: 92 };

fn visible_core(metrics: ScreenMetrics) -> (ControllerCore<HeadlessPlatform>, HeadlessJournal) {
    let platform = HeadlessPlatform::new().with_metrics(metrics);
    let journal = platform.journal();
    let writer = StoreWriter::spawn(Arc::new(MemoryStore::new())).unwrap();
    let mut core = ControllerCore::new(
        OverlayConfig::default(),
        platform,
        writer,
        ControllerHandle::detached(),
    );
    core.on_call_signal(CallSignal::from_label("RINGING", Some("+1")));
    assert!(core.window().is_visible());
    journal.clear();
    (core, journal)
}

/// A sample at surface-relative `(x, y)` while the surface sits at `at`.
fn touch(action: TouchAction, x: f32, y: f32, at: Position) -> TouchEvent {
    TouchEvent::new(action, x, y, x + at.x as f32, y + at.y as f32)
}

fn actions(journal: &HeadlessJournal) -> Vec<TouchAction> {
    journal
        .forwarded_touches()
        .into_iter()
        .map(|t| t.action)
        .collect()
}

#[test]
fn tap_in_the_band_reaches_the_renderer_untouched() {
    let (mut core, journal) = visible_core(ScreenMetrics::default());
    assert!(core.on_touch(&touch(TouchAction::Down, 500.0, 40.0, ORIGIN)));
    assert!(core.on_touch(&touch(TouchAction::Move, 510.0, 50.0, ORIGIN)));
    assert!(core.on_touch(&touch(TouchAction::Up, 510.0, 50.0, ORIGIN)));

    assert_eq!(
        actions(&journal),
        vec![TouchAction::Down, TouchAction::Move, TouchAction::Up]
    );
    assert!(journal.layout_updates().is_empty());
    assert_eq!(core.window().params().map(|p| p.position), Some(ORIGIN));
}

#[test]
fn movement_exactly_at_slop_is_still_a_tap() {
    let (mut core, journal) = visible_core(ScreenMetrics::default());
    core.on_touch(&touch(TouchAction::Down, 500.0, 40.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Move, 524.0, 16.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Up, 524.0, 16.0, ORIGIN));
    assert!(journal.layout_updates().is_empty());
    assert_eq!(actions(&journal).last(), Some(&TouchAction::Up));
}

#[test]
fn drag_moves_the_window_and_cancels_the_press() {
    let (mut core, journal) = visible_core(ScreenMetrics::default());
    core.on_touch(&touch(TouchAction::Down, 500.0, 40.0, ORIGIN));
    // the surface follows the finger, so surface-relative y stays put while
    // raw y grows
    let first = TouchEvent::new(TouchAction::Move, 500.0, 40.0, 500.0, 132.0 + 30.0);
    let second = TouchEvent::new(TouchAction::Move, 500.0, 40.0, 510.0, 132.0 + 80.0);
    assert!(core.on_touch(&first));
    assert!(core.on_touch(&second));
    assert!(core.on_touch(&TouchEvent::new(
        TouchAction::Up,
        500.0,
        40.0,
        510.0,
        212.0
    )));

    assert_eq!(
        actions(&journal),
        vec![TouchAction::Down, TouchAction::Cancel]
    );
    let moves: Vec<Position> = journal
        .layout_updates()
        .into_iter()
        .map(|p| p.position)
        .collect();
    assert_eq!(moves, vec![Position::new(0, 122), Position::new(10, 172)]);
    assert_eq!(
        core.window().params().map(|p| p.position),
        Some(Position::new(10, 172))
    );
}

#[test]
fn touches_below_the_band_are_never_claimed() {
    let (mut core, journal) = visible_core(ScreenMetrics::default());
    assert!(!core.on_touch(&touch(TouchAction::Down, 500.0, 400.0, ORIGIN)));
    assert!(!core.on_touch(&touch(TouchAction::Move, 800.0, 900.0, ORIGIN)));
    assert!(!core.on_touch(&touch(TouchAction::Up, 800.0, 900.0, ORIGIN)));
    assert_eq!(
        actions(&journal),
        vec![TouchAction::Down, TouchAction::Move, TouchAction::Up]
    );
    assert!(journal.layout_updates().is_empty());
}

#[test]
fn band_and_slop_scale_with_density() {
    let metrics = ScreenMetrics {
        density: 1.0,
        ..ScreenMetrics::default()
    };
    let (mut core, journal) = visible_core(metrics);
    // band is 60 px here
    assert!(!core.on_touch(&touch(TouchAction::Down, 10.0, 70.0, ORIGIN)));
    core.on_touch(&touch(TouchAction::Up, 10.0, 70.0, ORIGIN));

    // slop is 8 px here
    assert!(core.on_touch(&touch(TouchAction::Down, 10.0, 30.0, ORIGIN)));
    core.on_touch(&touch(TouchAction::Move, 10.0, 39.0, ORIGIN));
    assert_eq!(journal.layout_updates().len(), 1);
}

#[test]
fn next_sequence_starts_from_the_moved_position() {
    let (mut core, journal) = visible_core(ScreenMetrics::default());
    core.on_touch(&touch(TouchAction::Down, 100.0, 10.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Move, 100.0, 110.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Up, 100.0, 110.0, ORIGIN));
    let moved = Position::new(0, 192);
    assert_eq!(core.window().params().map(|p| p.position), Some(moved));

    core.on_touch(&touch(TouchAction::Down, 100.0, 10.0, moved));
    core.on_touch(&touch(TouchAction::Move, 150.0, 10.0, moved));
    assert_eq!(
        core.window().params().map(|p| p.position),
        Some(Position::new(50, 192))
    );
    assert_eq!(journal.layout_updates().len(), 2);
}

#[test]
fn resize_keeps_the_dragged_position() {
    let (mut core, _) = visible_core(ScreenMetrics::default());
    core.on_touch(&touch(TouchAction::Down, 100.0, 10.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Move, 100.0, 60.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Up, 100.0, 60.0, ORIGIN));
    core.on_bridge_command(BridgeCommand::UpdateHeight(Some(500)));

    let params = core.window().params().unwrap();
    assert_eq!(params.position, Position::new(0, 142));
    assert_eq!(params.height, Dimension::Pixels(500));
}

#[test]
fn reshown_overlay_starts_at_the_initial_position() {
    let (mut core, _) = visible_core(ScreenMetrics::default());
    core.on_touch(&touch(TouchAction::Down, 100.0, 10.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Move, 100.0, 60.0, ORIGIN));
    core.on_touch(&touch(TouchAction::Up, 100.0, 60.0, ORIGIN));
    core.on_bridge_command(BridgeCommand::CloseOverlay);
    assert_eq!(core.window().params(), None);

    core.on_call_signal(CallSignal::from_label("OFFHOOK", None));
    assert_eq!(core.window().params().map(|p| p.position), Some(ORIGIN));
}

#[test]
fn touches_while_hidden_do_nothing() {
    let (mut core, journal) = visible_core(ScreenMetrics::default());
    core.on_call_signal(CallSignal::from_label("IDLE", None));
    journal.clear();
    assert!(!core.on_touch(&touch(TouchAction::Down, 100.0, 10.0, ORIGIN)));
    assert!(journal.events().is_empty());
}
