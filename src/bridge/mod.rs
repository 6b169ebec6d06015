//! The command channel between the controller and the renderer.

mod protocol;

use std::sync::Arc;

pub use protocol::{
    BOOT_STATE, BridgeCall, BridgeCommand, BridgeReply, METHOD_CLOSE_OVERLAY,
    METHOD_GET_NATIVE_NUMBER, METHOD_GET_PRE_START_DATA, METHOD_SHOW_OVERLAY_WITH_DATA,
    METHOD_UPDATE_HEIGHT, METHOD_UPDATE_LOOKUP_RESULT, ServiceCommand, StartCommand,
};

use crate::controller::ControllerHandle;

/// The handler registered on the render engine's command channel.
///
/// Every call is marshalled onto the controller's actor thread.
#[derive(Debug, Clone)]
pub struct BridgeEndpoint {
    channel: Arc<str>,
    handle: ControllerHandle,
}

impl BridgeEndpoint {
    pub fn new(channel: impl Into<Arc<str>>, handle: ControllerHandle) -> Self {
        Self {
            channel: channel.into(),
            handle,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Invokes a method and waits for its result.
    ///
    /// Must not be used from the controller's own thread; there it answers
    /// [`BridgeReply::Null`] without running the command.
    pub fn call(&self, call: BridgeCall) -> BridgeReply {
        self.handle.bridge_call(BridgeCommand::from_call(call))
    }

    /// Queues a method without waiting for its result.
    pub fn post(&self, call: BridgeCall) {
        self.handle.post_bridge(BridgeCommand::from_call(call));
    }
}
