mod normalizer;

use serde::{Deserialize, Serialize};

pub use normalizer::EventNormalizer;

/// Voice-call state as reported by the telephony signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    Idle,
    Ringing,
    Offhook,
}

impl CallState {
    /// Parses a state label. Labels the signal source does not define map to
    /// `Idle`, so an unrecognised signal can never leave the overlay up.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "RINGING" => CallState::Ringing,
            "OFFHOOK" => CallState::Offhook,
            _ => CallState::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallState::Idle => "IDLE",
            CallState::Ringing => "RINGING",
            CallState::Offhook => "OFFHOOK",
        }
    }

    pub fn is_in_call(self) -> bool {
        !matches!(self, CallState::Idle)
    }
}

/// Raw notification from the telephony source, possibly redundant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSignal {
    pub state: CallState,
    #[serde(default)]
    pub number: Option<String>,
}

impl CallSignal {
    pub fn new(state: CallState, number: Option<&str>) -> Self {
        Self {
            state,
            number: clean_number(number),
        }
    }

    pub fn from_label(label: &str, number: Option<&str>) -> Self {
        Self::new(CallState::from_label(label), number)
    }
}

/// A de-duplicated change in `(state, number)` handed to the session state
/// machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTransition {
    pub state: CallState,
    pub number: Option<String>,
}

fn clean_number(number: Option<&str>) -> Option<String> {
    number
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
