//! Lifecycle controller for a floating overlay panel that follows the
//! device's voice-call state.
//!
//! Telephony signals pass through the [`telephony::EventNormalizer`] into the
//! [`session::SessionStateMachine`], whose effects drive the
//! [`window::OverlayWindowManager`]. Touches on the overlay go through the
//! [`gesture::GestureInterpreter`]. Everything runs on the single actor
//! thread owned by [`controller::Controller`].

pub mod bridge;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod event_loop;
pub mod gesture;
pub mod log_buffer;
pub mod payload;
pub mod platform;
pub mod session;
pub mod sim;
pub mod store;
pub mod telephony;
pub mod tracing_sub;
pub mod window;

pub use config::OverlayConfig;
pub use controller::{Controller, ControllerCore, ControllerHandle};
pub use error::{OverlayError, OverlayResult};
pub use payload::{CallStatus, OverlayPayload};
