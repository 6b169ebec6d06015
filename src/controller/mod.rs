//! The single actor that serializes every input to the overlay.
//!
//! Telephony callbacks, start commands, bridge calls and touches can arrive
//! on any thread. Each becomes a [`ControllerMsg`] in one mailbox, and one
//! thread applies them in order. The platform is built on that thread and
//! never leaves it.

mod actor;

use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Sender, bounded, unbounded};
use tracing::{debug, error, info, warn};

pub use actor::ControllerCore;
use crate::bridge::{BridgeCommand, BridgeReply, ServiceCommand, StartCommand};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::event_loop::EventLoop;
use crate::gesture::TouchEvent;
use crate::platform::OverlayPlatform;
use crate::store::{KeyValueStore, StoreWriter};
use crate::telephony::CallSignal;

#[derive(Debug)]
pub enum ControllerMsg {
    Signal(CallSignal),
    Service(ServiceCommand),
    Bridge {
        command: BridgeCommand,
        /// `None` for fire-and-forget posts.
        reply: Option<Sender<BridgeReply>>,
    },
    Touch(TouchEvent),
    Shutdown,
}

/// Cloneable sender side of the controller's mailbox.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: Sender<ControllerMsg>,
    actor: Arc<OnceLock<ThreadId>>,
}

impl ControllerHandle {
    /// A handle connected to nothing; every message is dropped.
    pub fn detached() -> Self {
        let (tx, _) = unbounded();
        Self {
            tx,
            actor: Arc::new(OnceLock::new()),
        }
    }

    /// Telephony callback entry point.
    pub fn call_state_changed(&self, state_label: &str, number: Option<&str>) {
        self.signal(CallSignal::from_label(state_label, number));
    }

    pub fn signal(&self, signal: CallSignal) {
        self.send(ControllerMsg::Signal(signal));
    }

    pub fn start_command(&self, start: StartCommand) {
        match ServiceCommand::from_start(start) {
            Some(command) => self.service_command(command),
            None => debug!("start command with neither state nor command ignored"),
        }
    }

    pub fn service_command(&self, command: ServiceCommand) {
        self.send(ControllerMsg::Service(command));
    }

    pub fn boot(&self) {
        self.service_command(ServiceCommand::Boot);
    }

    /// Runs a bridge command on the actor and waits for its reply.
    ///
    /// Answers [`BridgeReply::Null`] when the controller has stopped, and
    /// when called from the actor thread itself.
    pub fn bridge_call(&self, command: BridgeCommand) -> BridgeReply {
        if self.is_actor_thread() {
            warn!(
                method = command.method(),
                "blocking bridge call from the controller thread; answering null"
            );
            return BridgeReply::Null;
        }
        let (reply_tx, reply_rx) = bounded(1);
        let sent = self.send(ControllerMsg::Bridge {
            command,
            reply: Some(reply_tx),
        });
        if !sent {
            return BridgeReply::Null;
        }
        reply_rx.recv().unwrap_or(BridgeReply::Null)
    }

    pub fn post_bridge(&self, command: BridgeCommand) {
        self.send(ControllerMsg::Bridge {
            command,
            reply: None,
        });
    }

    pub fn touch(&self, event: TouchEvent) {
        self.send(ControllerMsg::Touch(event));
    }

    fn send(&self, message: ControllerMsg) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(err) => {
                debug!(message = ?err.into_inner(), "controller stopped; message dropped");
                false
            }
        }
    }

    fn is_actor_thread(&self) -> bool {
        self.actor
            .get()
            .is_some_and(|id| *id == thread::current().id())
    }
}

/// Owns the actor thread. Dropping it (or [`shutdown`](Self::shutdown)) is
/// the only way the actor stops; dropping every handle does not.
pub struct Controller {
    handle: ControllerHandle,
    worker: Option<JoinHandle<()>>,
}

impl Controller {
    /// Starts the actor. `make_platform` runs on the actor thread and is the
    /// only place the platform is constructed.
    pub fn spawn<P, F>(
        config: OverlayConfig,
        store: Arc<dyn KeyValueStore>,
        make_platform: F,
    ) -> OverlayResult<Self>
    where
        P: OverlayPlatform + 'static,
        F: FnOnce(ControllerHandle) -> P + Send + 'static,
    {
        config.validate()?;
        let writer = StoreWriter::spawn(store)?;
        let (tx, inbox) = unbounded();
        let actor = Arc::new(OnceLock::new());
        let handle = ControllerHandle {
            tx,
            actor: Arc::clone(&actor),
        };
        let core_handle = handle.clone();

        let worker = thread::Builder::new()
            .name("call-overlay-controller".into())
            .spawn(move || {
                let _ = actor.set(thread::current().id());
                let platform = make_platform(core_handle.clone());
                let mut core = ControllerCore::new(config, platform, writer, core_handle);
                let mut event_loop = EventLoop::new(inbox);
                info!("controller started");
                // The core's bridge keeps a sender alive, so only Shutdown
                // (sent by `Controller::stop`) ends this loop.
                event_loop.run(|message| core.handle(message));
                core.teardown();
                let ignored = event_loop.drain(reject);
                if ignored > 0 {
                    debug!(ignored, "messages queued behind shutdown ignored");
                }
            })
            .map_err(|err| OverlayError::Spawn("controller", err))?;

        Ok(Self {
            handle,
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    /// Tears the overlay down and waits for the actor to exit. Messages
    /// queued before this call are processed first.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if self.handle.tx.send(ControllerMsg::Shutdown).is_err() {
            debug!("controller already stopped");
        }
        if worker.join().is_err() {
            error!("controller thread panicked");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reject(message: ControllerMsg) {
    if let ControllerMsg::Bridge {
        reply: Some(reply), ..
    } = message
    {
        let _ = reply.send(BridgeReply::Null);
    }
}
