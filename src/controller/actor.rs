use serde_json::Value;
use tracing::{debug, info};

use super::ControllerMsg;
use crate::bridge::{BridgeCommand, BridgeEndpoint, BridgeReply, ServiceCommand};
use crate::config::OverlayConfig;
use crate::controller::ControllerHandle;
use crate::event_loop::ControlFlow;
use crate::gesture::TouchEvent;
use crate::platform::OverlayPlatform;
use crate::session::{CallRegistry, CallSession, SessionEffect, SessionStateMachine};
use crate::store::StoreWriter;
use crate::telephony::{CallSignal, EventNormalizer};
use crate::window::{Dimension, GeometryUpdate, OverlayWindowManager};

/// All four components wired together, driven synchronously.
///
/// [`Controller`](super::Controller) runs one of these on its actor thread;
/// tests drive it directly.
pub struct ControllerCore<P: OverlayPlatform> {
    normalizer: EventNormalizer,
    machine: SessionStateMachine,
    window: OverlayWindowManager<P>,
    store: StoreWriter,
    store_key: String,
    stopped: bool,
}

impl<P: OverlayPlatform> ControllerCore<P> {
    pub fn new(
        config: OverlayConfig,
        platform: P,
        store: StoreWriter,
        handle: ControllerHandle,
    ) -> Self {
        let bridge = BridgeEndpoint::new(config.channel_name.clone(), handle);
        Self {
            normalizer: EventNormalizer::new(),
            machine: SessionStateMachine::new(config.unknown_number.clone()),
            store_key: config.store_key.clone(),
            window: OverlayWindowManager::new(platform, config, bridge),
            store,
            stopped: false,
        }
    }

    pub fn session(&self) -> &CallSession {
        self.machine.session()
    }

    pub fn registry(&self) -> &CallRegistry {
        self.machine.registry()
    }

    pub fn window(&self) -> &OverlayWindowManager<P> {
        &self.window
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn handle(&mut self, message: ControllerMsg) -> ControlFlow {
        match message {
            ControllerMsg::Signal(signal) => self.on_call_signal(signal),
            ControllerMsg::Service(command) => self.on_service_command(command),
            ControllerMsg::Bridge { command, reply } => {
                let result = self.on_bridge_command(command);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            ControllerMsg::Touch(event) => {
                self.on_touch(&event);
            }
            ControllerMsg::Shutdown => {
                self.teardown();
                return ControlFlow::Quit;
            }
        }
        ControlFlow::Continue
    }

    pub fn on_call_signal(&mut self, signal: CallSignal) {
        if self.stopped {
            debug!("call-state signal after teardown ignored");
            return;
        }
        let Some(transition) = self
            .normalizer
            .normalize(signal, self.machine.registry_mut())
        else {
            return;
        };
        let effects = self.machine.apply(transition);
        self.run_effects(effects);
    }

    pub fn on_service_command(&mut self, command: ServiceCommand) {
        if self.stopped {
            debug!(?command, "service command after teardown ignored");
            return;
        }
        match command {
            ServiceCommand::CallState(signal) => self.on_call_signal(signal),
            ServiceCommand::ShowOverlay => {
                let mut effects = vec![SessionEffect::ShowOverlay];
                if let Some(payload) = self.machine.registry().pre_start() {
                    effects.push(SessionEffect::Push(payload.clone()));
                }
                self.run_effects(effects);
            }
            ServiceCommand::Boot => self.on_boot(),
        }
    }

    /// Pre-warms the engine without touching the session.
    pub fn on_boot(&mut self) {
        if self.stopped {
            return;
        }
        if self.window.ensure_engine_ready() {
            info!("engine pre-warmed after boot");
        }
    }

    pub fn on_bridge_command(&mut self, command: BridgeCommand) -> BridgeReply {
        if self.stopped {
            debug!(method = command.method(), "bridge call after teardown");
            return BridgeReply::Null;
        }
        debug!(method = command.method(), "bridge call");
        match command {
            BridgeCommand::CloseOverlay => {
                self.window.hide();
                BridgeReply::Null
            }
            BridgeCommand::GetNativeNumber => match &self.machine.session().number {
                Some(number) => BridgeReply::Value(Value::String(number.clone())),
                None => BridgeReply::Null,
            },
            BridgeCommand::GetPreStartData => match self.machine.registry().pre_start() {
                Some(payload) => BridgeReply::Value(payload.to_value()),
                None => BridgeReply::Null,
            },
            BridgeCommand::UpdateLookupResult(Some(payload)) => {
                let effects = self.machine.record_lookup(payload);
                self.run_effects(effects);
                BridgeReply::Null
            }
            BridgeCommand::UpdateLookupResult(None) => {
                debug!("lookup result without a payload map ignored");
                BridgeReply::Null
            }
            BridgeCommand::ShowOverlayWithData(payload) => {
                let effects = match payload {
                    Some(payload) => self.machine.show_with_data(payload),
                    None => vec![SessionEffect::ShowOverlay],
                };
                self.run_effects(effects);
                BridgeReply::Null
            }
            BridgeCommand::UpdateHeight(height) => {
                self.window
                    .update_geometry(GeometryUpdate::Height(Dimension::from_requested(height)));
                BridgeReply::Null
            }
            BridgeCommand::Unknown(method) => {
                debug!(%method, "unknown bridge method");
                BridgeReply::NotImplemented
            }
        }
    }

    /// Returns whether the touch sequence is claimed for dragging.
    pub fn on_touch(&mut self, event: &TouchEvent) -> bool {
        if self.stopped {
            return false;
        }
        self.window.handle_touch(event)
    }

    /// Releases everything. Every later input is a no-op.
    pub fn teardown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.window.teardown();
        info!("controller stopped");
    }

    fn run_effects(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::PersistNumber(number) => self.store.put(&self.store_key, &number),
                SessionEffect::ShowOverlay => {
                    if self.window.ensure_engine_ready() {
                        self.window.show();
                    }
                }
                SessionEffect::HideOverlay => self.window.hide(),
                SessionEffect::Push(payload) => self.window.push(&payload),
            }
        }
    }
}
