mod machine;

use serde::Serialize;

use crate::payload::OverlayPayload;
use crate::telephony::CallState;

pub use machine::{SessionEffect, SessionStateMachine};

/// Which side placed the call, inferred from the order of transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallDirection {
    #[default]
    Unknown,
    Incoming,
    Outgoing,
}

/// The single in-progress (or most recent) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSession {
    pub state: CallState,
    pub number: Option<String>,
    pub direction: CallDirection,
}

impl Default for CallSession {
    fn default() -> Self {
        Self {
            state: CallState::Idle,
            number: None,
            direction: CallDirection::Unknown,
        }
    }
}

/// Process-scoped values that must outlive any one renderer instance.
///
/// Owned by [`SessionStateMachine`]; the normalizer borrows it mutably for
/// the duration of one signal.
#[derive(Debug, Clone, Default)]
pub struct CallRegistry {
    last_known_number: Option<String>,
    pre_start: Option<OverlayPayload>,
    lookup: Option<OverlayPayload>,
}

impl CallRegistry {
    pub fn last_known_number(&self) -> Option<&str> {
        self.last_known_number.as_deref()
    }

    pub fn set_last_known_number(&mut self, number: String) {
        self.last_known_number = Some(number);
    }

    pub fn clear_last_known_number(&mut self) {
        self.last_known_number = None;
    }

    /// Last payload pushed (or queued for push) to the renderer.
    pub fn pre_start(&self) -> Option<&OverlayPayload> {
        self.pre_start.as_ref()
    }

    pub(crate) fn set_pre_start(&mut self, payload: OverlayPayload) {
        self.pre_start = Some(payload);
    }

    /// Most recent lookup result relayed through the bridge.
    pub fn lookup(&self) -> Option<&OverlayPayload> {
        self.lookup.as_ref()
    }

    pub(crate) fn set_lookup(&mut self, payload: OverlayPayload) {
        self.lookup = Some(payload);
    }

    pub(crate) fn clear_lookup(&mut self) {
        self.lookup = None;
    }
}
