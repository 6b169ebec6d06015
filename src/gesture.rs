//! Drag-versus-tap classification for touches on the overlay surface.
//!
//! Each touch sequence walks a small state machine:
//!
//! ```text
//! Idle --down in band--> Tracking --moved past slop--> Dragging --up/cancel--> Idle
//!                            \--up/cancel (a tap)--> Idle
//! Idle --down elsewhere--> Passthrough --up/cancel--> Idle
//! ```
//!
//! While tracking, raw events still reach the renderer so a tap is never
//! lost. Crossing the slop threshold sends the renderer a synthetic cancel so
//! whatever press state it started is cleared, after which every move
//! repositions the window and is consumed.

use serde::{Deserialize, Serialize};

use crate::window::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer sample. `x`/`y` are relative to the surface, `raw_x`/`raw_y`
/// to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchEvent {
    pub action: TouchAction,
    pub x: f32,
    pub y: f32,
    pub raw_x: f32,
    pub raw_y: f32,
}

impl TouchEvent {
    pub fn new(action: TouchAction, x: f32, y: f32, raw_x: f32, raw_y: f32) -> Self {
        Self {
            action,
            x,
            y,
            raw_x,
            raw_y,
        }
    }

    /// Copy of this sample with a different action.
    pub fn with_action(&self, action: TouchAction) -> Self {
        Self { action, ..*self }
    }
}

/// Origin of one claimed touch sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub origin_window: Position,
    pub origin_touch: (f32, f32),
}

impl GestureSession {
    fn displacement(&self, event: &TouchEvent) -> (f32, f32) {
        (
            event.raw_x - self.origin_touch.0,
            event.raw_y - self.origin_touch.1,
        )
    }

    fn window_position_for(&self, event: &TouchEvent) -> Position {
        let (dx, dy) = self.displacement(event);
        self.origin_window.offset(dx as i32, dy as i32)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    /// Down landed outside the drag band; the renderer owns the sequence.
    Passthrough,
    Tracking(GestureSession),
    Dragging(GestureSession),
}

/// What the window manager must do with one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureOutcome {
    /// Events to hand to the renderer, in order.
    pub forward: Vec<TouchEvent>,
    /// New window position to apply.
    pub reposition: Option<Position>,
    /// Whether the interpreter owns this touch sequence.
    pub claimed: bool,
}

impl GestureOutcome {
    fn forwarded(event: TouchEvent, claimed: bool) -> Self {
        Self {
            forward: vec![event],
            reposition: None,
            claimed,
        }
    }

    fn consumed(reposition: Option<Position>) -> Self {
        Self {
            forward: Vec::new(),
            reposition,
            claimed: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    state: GestureState,
    drag_band_px: f32,
    slop_px: f32,
}

impl GestureInterpreter {
    pub fn new(drag_band_px: f32, slop_px: f32) -> Self {
        Self {
            state: GestureState::Idle,
            drag_band_px,
            slop_px,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Feeds one event. `window` is the overlay's position at the time of the
    /// event; it only matters on touch-down.
    pub fn on_touch(&mut self, event: &TouchEvent, window: Position) -> GestureOutcome {
        let (next, outcome) = match event.action {
            TouchAction::Down => self.on_down(event, window),
            TouchAction::Move => self.on_move(event),
            TouchAction::Up | TouchAction::Cancel => self.on_release(event),
        };
        self.state = next;
        outcome
    }

    fn on_down(&self, event: &TouchEvent, window: Position) -> (GestureState, GestureOutcome) {
        if event.y <= self.drag_band_px {
            let session = GestureSession {
                origin_window: window,
                origin_touch: (event.raw_x, event.raw_y),
            };
            (
                GestureState::Tracking(session),
                GestureOutcome::forwarded(*event, true),
            )
        } else {
            (
                GestureState::Passthrough,
                GestureOutcome::forwarded(*event, false),
            )
        }
    }

    fn on_move(&self, event: &TouchEvent) -> (GestureState, GestureOutcome) {
        match self.state {
            GestureState::Tracking(session) => {
                if !self.exceeds_slop(&session, event) {
                    return (self.state, GestureOutcome::forwarded(*event, true));
                }
                let mut outcome =
                    GestureOutcome::consumed(Some(session.window_position_for(event)));
                outcome.forward.push(event.with_action(TouchAction::Cancel));
                (GestureState::Dragging(session), outcome)
            }
            GestureState::Dragging(session) => (
                self.state,
                GestureOutcome::consumed(Some(session.window_position_for(event))),
            ),
            GestureState::Idle | GestureState::Passthrough => {
                (self.state, GestureOutcome::forwarded(*event, false))
            }
        }
    }

    fn on_release(&self, event: &TouchEvent) -> (GestureState, GestureOutcome) {
        let outcome = match self.state {
            GestureState::Dragging(_) => GestureOutcome::consumed(None),
            GestureState::Tracking(_) => GestureOutcome::forwarded(*event, true),
            GestureState::Idle | GestureState::Passthrough => {
                GestureOutcome::forwarded(*event, false)
            }
        };
        (GestureState::Idle, outcome)
    }

    /// Per-axis absolute displacement, strictly greater than the slop.
    fn exceeds_slop(&self, session: &GestureSession, event: &TouchEvent) -> bool {
        let (dx, dy) = session.displacement(event);
        dx.abs() > self.slop_px || dy.abs() > self.slop_px
    }
}
