use tracing::debug;

use super::{CallDirection, CallRegistry, CallSession};
use crate::constants::UNKNOWN_NUMBER_PLACEHOLDER;
use crate::payload::{CallStatus, OverlayPayload};
use crate::telephony::{CallState, SessionTransition};

/// Side effects requested by a transition, in the order they must run.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// Durably record the in-progress call's number.
    PersistNumber(String),
    ShowOverlay,
    HideOverlay,
    Push(OverlayPayload),
}

/// Owns the [`CallSession`] and decides, per transition, what happens to the
/// overlay and what the renderer is told.
///
/// Pure: effects are returned, never executed here.
#[derive(Debug)]
pub struct SessionStateMachine {
    session: CallSession,
    registry: CallRegistry,
    unknown_number: String,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new(UNKNOWN_NUMBER_PLACEHOLDER)
    }
}

impl SessionStateMachine {
    pub fn new(unknown_number: impl Into<String>) -> Self {
        Self {
            session: CallSession::default(),
            registry: CallRegistry::default(),
            unknown_number: unknown_number.into(),
        }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CallRegistry {
        &mut self.registry
    }

    pub fn apply(&mut self, transition: SessionTransition) -> Vec<SessionEffect> {
        let previous = self.session.state;
        match transition.state {
            CallState::Idle => {
                self.session = CallSession::default();
                self.registry.clear_lookup();
                vec![SessionEffect::HideOverlay]
            }
            CallState::Ringing => {
                let known = self.resolve_known(transition.number);
                self.session = CallSession {
                    state: CallState::Ringing,
                    number: known.clone(),
                    direction: CallDirection::Incoming,
                };
                self.enter_call(known, CallStatus::Ringing)
            }
            CallState::Offhook => {
                let direction = match previous {
                    CallState::Idle => CallDirection::Outgoing,
                    _ => self.session.direction,
                };
                let status = match (previous, direction) {
                    (CallState::Idle, _) => CallStatus::Dialing,
                    (CallState::Offhook, CallDirection::Outgoing) => CallStatus::Dialing,
                    _ => CallStatus::Active,
                };
                let known = self.resolve_known(transition.number);
                self.session = CallSession {
                    state: CallState::Offhook,
                    number: known.clone(),
                    direction,
                };
                self.enter_call(known, status)
            }
        }
    }

    /// Relays a lookup result to the renderer and remembers it for cold
    /// starts.
    pub fn record_lookup(&mut self, payload: OverlayPayload) -> Vec<SessionEffect> {
        self.registry.set_lookup(payload.clone());
        self.registry.set_pre_start(payload.clone());
        vec![SessionEffect::Push(payload)]
    }

    /// Like [`record_lookup`](Self::record_lookup) but also forces the
    /// overlay onto the screen.
    pub fn show_with_data(&mut self, payload: OverlayPayload) -> Vec<SessionEffect> {
        let mut effects = vec![SessionEffect::ShowOverlay];
        effects.extend(self.record_lookup(payload));
        effects
    }

    fn enter_call(&mut self, known: Option<String>, status: CallStatus) -> Vec<SessionEffect> {
        let mut effects = Vec::with_capacity(3);
        if let Some(number) = &known {
            effects.push(SessionEffect::PersistNumber(number.clone()));
        }
        effects.push(SessionEffect::ShowOverlay);

        let number = known.unwrap_or_else(|| self.unknown_number.clone());
        let mut payload = OverlayPayload::for_call(number.as_str(), status);
        if let Some(lookup) = self.registry.lookup()
            && lookup.number() == Some(number.as_str())
        {
            payload.adopt_identity(lookup);
        }
        debug!(status = status.as_str(), direction = ?self.session.direction, "session push");
        self.registry.set_pre_start(payload.clone());
        effects.push(SessionEffect::Push(payload));
        effects
    }

    /// Explicit number, else the number already attached to the session,
    /// else the process-wide fallback.
    fn resolve_known(&self, explicit: Option<String>) -> Option<String> {
        explicit
            .or_else(|| {
                self.session
                    .state
                    .is_in_call()
                    .then(|| self.session.number.clone())
                    .flatten()
            })
            .or_else(|| self.registry.last_known_number().map(str::to_string))
    }
}
