use tracing::{debug, trace};

use super::{CallSignal, CallState, SessionTransition};
use crate::session::CallRegistry;

/// Collapses the repeating call-state storms a telephony subsystem produces
/// into one transition per distinct `(state, number)` pair.
#[derive(Debug, Default)]
pub struct EventNormalizer {
    last_emitted: Option<(CallState, Option<String>)>,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transition to apply, or `None` when the signal repeats the
    /// last emitted pair.
    ///
    /// Also maintains the registry's last-known number: set by any signal
    /// that carries one, cleared by `Idle`.
    pub fn normalize(
        &mut self,
        signal: CallSignal,
        registry: &mut CallRegistry,
    ) -> Option<SessionTransition> {
        let number = match signal.state {
            CallState::Idle => None,
            _ => signal.number,
        };

        match (&number, signal.state) {
            (_, CallState::Idle) => registry.clear_last_known_number(),
            (Some(n), _) => registry.set_last_known_number(n.clone()),
            (None, _) => {}
        }

        let key = (signal.state, number);
        if self.last_emitted.as_ref() == Some(&key) {
            trace!(state = key.0.as_str(), "dropping repeated call-state signal");
            return None;
        }
        debug!(state = key.0.as_str(), number = ?key.1, "call-state transition");
        self.last_emitted = Some(key.clone());
        Some(SessionTransition {
            state: key.0,
            number: key.1,
        })
    }

    pub fn last_emitted_state(&self) -> Option<CallState> {
        self.last_emitted.as_ref().map(|(state, _)| *state)
    }
}
