use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{Value, json};

use call_overlay::bridge::{
    BridgeCall, BridgeCommand, BridgeEndpoint, BridgeReply, METHOD_CLOSE_OVERLAY,
    METHOD_GET_NATIVE_NUMBER, METHOD_GET_PRE_START_DATA, METHOD_UPDATE_HEIGHT, StartCommand,
};
use call_overlay::constants::CURRENT_CALL_NUMBER_KEY;
use call_overlay::error::OverlayResult;
use call_overlay::gesture::TouchEvent;
use call_overlay::platform::headless::{
    HeadlessEngine, HeadlessJournal, HeadlessPlatform, HeadlessSurface, PlatformEvent,
};
use call_overlay::platform::{OverlayPlatform, RenderEngine};
use call_overlay::store::{KeyValueStore, MemoryStore, StoreWriter};
use call_overlay::telephony::CallSignal;
use call_overlay::window::{Dimension, ScreenMetrics, WindowParams};
use call_overlay::{
    CallStatus, Controller, ControllerCore, ControllerHandle, OverlayConfig, OverlayPayload,
};

fn core() -> (ControllerCore<HeadlessPlatform>, HeadlessJournal) {
    let platform = HeadlessPlatform::new();
    let journal = platform.journal();
    let writer = StoreWriter::spawn(Arc::new(MemoryStore::new())).unwrap();
    let core = ControllerCore::new(
        OverlayConfig::default(),
        platform,
        writer,
        ControllerHandle::detached(),
    );
    (core, journal)
}

fn ring(core: &mut ControllerCore<HeadlessPlatform>, number: &str) {
    core.on_call_signal(CallSignal::from_label("RINGING", Some(number)));
}

fn lookup(number: &str, name: &str) -> OverlayPayload {
    OverlayPayload::from_value(json!({
        "number": number,
        "status": "RINGING",
        "isPersonal": true,
        "name": name,
    }))
    .unwrap()
}

#[test]
fn close_overlay_hides_but_keeps_the_session() {
    let (mut core, journal) = core();
    ring(&mut core, "+1");
    assert_eq!(
        core.on_bridge_command(BridgeCommand::CloseOverlay),
        BridgeReply::Null
    );
    assert!(!core.window().is_visible());
    assert_eq!(core.session().number.as_deref(), Some("+1"));
    assert_eq!(
        journal.count(|e| matches!(e, PlatformEvent::SurfaceRemoved { .. })),
        1
    );

    // a repeated RINGING for the same call does not bring it back
    ring(&mut core, "+1");
    assert!(!core.window().is_visible());
}

#[test]
fn native_number_follows_the_session() {
    let (mut core, _) = core();
    assert_eq!(
        core.on_bridge_command(BridgeCommand::GetNativeNumber),
        BridgeReply::Null
    );
    ring(&mut core, "+15551234567");
    assert_eq!(
        core.on_bridge_command(BridgeCommand::GetNativeNumber),
        BridgeReply::Value(Value::String("+15551234567".into()))
    );
    core.on_call_signal(CallSignal::from_label("IDLE", None));
    assert_eq!(
        core.on_bridge_command(BridgeCommand::GetNativeNumber),
        BridgeReply::Null
    );
}

#[test]
fn pre_start_data_is_the_last_push() {
    let (mut core, _) = core();
    ring(&mut core, "+1");
    core.on_call_signal(CallSignal::from_label("OFFHOOK", None));
    let reply = core.on_bridge_command(BridgeCommand::GetPreStartData);
    assert_eq!(
        reply.value().cloned().and_then(OverlayPayload::from_value),
        Some(OverlayPayload::for_call("+1", CallStatus::Active))
    );
}

#[test]
fn lookup_result_is_relayed_and_merged_into_later_pushes() {
    let (mut core, journal) = core();
    ring(&mut core, "+1");
    let result = lookup("+1", "Acme Support");
    core.on_bridge_command(BridgeCommand::UpdateLookupResult(Some(result.clone())));
    assert_eq!(journal.pushes().last(), Some(&result));

    core.on_call_signal(CallSignal::from_label("OFFHOOK", None));
    let active = journal.pushes().last().cloned().unwrap();
    assert_eq!(active.status(), Some("ACTIVE"));
    assert_eq!(active.name(), Some("Acme Support"));
    assert_eq!(active.is_personal(), Some(true));
}

#[test]
fn lookup_for_another_number_is_not_merged() {
    let (mut core, journal) = core();
    ring(&mut core, "+1");
    core.on_bridge_command(BridgeCommand::UpdateLookupResult(Some(lookup("+2", "Other"))));
    core.on_call_signal(CallSignal::from_label("OFFHOOK", None));
    let active = journal.pushes().last().cloned().unwrap();
    assert_eq!(active.name(), None);
}

#[test]
fn malformed_lookup_is_ignored() {
    let (mut core, journal) = core();
    ring(&mut core, "+1");
    let before = journal.pushes().len();
    let command =
        BridgeCommand::from_call(BridgeCall::new("updateLookupResult", Some(json!([1, 2]))));
    assert_eq!(core.on_bridge_command(command), BridgeReply::Null);
    assert_eq!(journal.pushes().len(), before);
}

#[test]
fn show_with_data_works_without_a_call() {
    let (mut core, journal) = core();
    let data = lookup("+1", "Acme Support");
    core.on_bridge_command(BridgeCommand::ShowOverlayWithData(Some(data.clone())));
    assert!(core.window().is_visible());
    assert_eq!(journal.pushes(), vec![data.clone()]);
    assert_eq!(
        core.on_bridge_command(BridgeCommand::GetPreStartData),
        BridgeReply::Value(data.to_value())
    );
}

#[test]
fn update_height_resizes_the_visible_overlay() {
    let (mut core, journal) = core();
    core.on_bridge_command(BridgeCommand::UpdateHeight(Some(400)));
    assert!(journal.layout_updates().is_empty());

    ring(&mut core, "+1");
    let command = BridgeCommand::from_call(BridgeCall::new(
        METHOD_UPDATE_HEIGHT,
        Some(json!({ "height": 400 })),
    ));
    core.on_bridge_command(command);
    assert_eq!(
        core.window().params().map(|p| p.height),
        Some(Dimension::Pixels(400))
    );

    core.on_bridge_command(BridgeCommand::UpdateHeight(Some(0)));
    assert_eq!(
        core.window().params().map(|p| p.height),
        Some(Dimension::WrapContent)
    );
    assert_eq!(journal.layout_updates().len(), 2);
}

#[test]
fn unknown_methods_are_not_implemented() {
    let (mut core, _) = core();
    let command = BridgeCommand::from_call(BridgeCall::new("openSettings", None));
    let reply = core.on_bridge_command(command);
    assert_eq!(reply, BridgeReply::NotImplemented);
    assert_eq!(reply.to_json(), json!({ "error": "notImplemented" }));
}

#[test]
fn threaded_controller_serializes_every_source() {
    let platform = HeadlessPlatform::new();
    let journal = platform.journal();
    let store = Arc::new(MemoryStore::new());
    let controller =
        Controller::spawn(OverlayConfig::default(), store.clone(), move |_| platform).unwrap();
    let handle = controller.handle();

    let signals: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || handle.call_state_changed("RINGING", Some("+15551234567")))
        })
        .collect();
    for signal in signals {
        signal.join().unwrap();
    }

    assert_eq!(
        handle.bridge_call(BridgeCommand::GetNativeNumber),
        BridgeReply::Value(json!("+15551234567"))
    );
    assert_eq!(journal.pushes().len(), 1);

    let endpoint = BridgeEndpoint::new("call_overlay/overlay", handle.clone());
    let reply = endpoint.call(BridgeCall::new(METHOD_GET_PRE_START_DATA, None));
    assert_eq!(
        reply.value().and_then(|v| v.get("status")),
        Some(&json!("RINGING"))
    );

    controller.shutdown();
    assert!(journal.events().contains(&PlatformEvent::ListeningStopped));
    assert_eq!(journal.events().last(), Some(&PlatformEvent::EngineDestroyed));
    assert_eq!(
        store.get(CURRENT_CALL_NUMBER_KEY).as_deref(),
        Some("+15551234567")
    );

    // everything after shutdown is a no-op
    handle.call_state_changed("OFFHOOK", None);
    assert_eq!(
        handle.bridge_call(BridgeCommand::GetNativeNumber),
        BridgeReply::Null
    );
}

#[test]
fn start_commands_reach_the_actor() {
    let platform = HeadlessPlatform::new();
    let journal = platform.journal();
    let controller = Controller::spawn(
        OverlayConfig::default(),
        Arc::new(MemoryStore::new()),
        move |_| platform,
    )
    .unwrap();
    let handle = controller.handle();

    handle.start_command(StartCommand {
        state: Some("BOOT".into()),
        ..StartCommand::default()
    });
    handle.start_command(StartCommand {
        state: Some("OFFHOOK".into()),
        number: Some("+2".into()),
        command: None,
    });
    handle.bridge_call(BridgeCommand::GetNativeNumber);

    assert_eq!(
        journal.count(|e| matches!(e, PlatformEvent::EngineCreated { .. })),
        1
    );
    assert_eq!(
        journal.pushes(),
        vec![OverlayPayload::for_call("+2", CallStatus::Dialing)]
    );
    drop(controller);
    assert_eq!(
        journal.count(|e| matches!(e, PlatformEvent::EngineDestroyed)),
        1
    );
}

#[test]
fn invalid_config_is_refused() {
    let config = OverlayConfig {
        width_fraction: Some(1.5),
        ..OverlayConfig::default()
    };
    let result = Controller::spawn(config, Arc::new(MemoryStore::new()), |_| {
        HeadlessPlatform::new()
    });
    assert!(result.is_err());
}

/// Renderer that calls back into the bridge from inside every push, the way
/// a renderer reacting to new data would.
struct CallbackEngine {
    inner: HeadlessEngine,
    bridge: BridgeEndpoint,
    replies: Arc<Mutex<Vec<BridgeReply>>>,
}

impl RenderEngine for CallbackEngine {
    fn run_entrypoint(&mut self, entrypoint: &str) -> OverlayResult<()> {
        self.inner.run_entrypoint(entrypoint)
    }

    fn invoke(&mut self, method: &str, payload: &OverlayPayload) -> OverlayResult<()> {
        self.inner.invoke(method, payload)?;
        let reply = self
            .bridge
            .call(BridgeCall::new(METHOD_GET_NATIVE_NUMBER, None));
        self.replies.lock().unwrap().push(reply);
        self.bridge.post(BridgeCall::new(METHOD_CLOSE_OVERLAY, None));
        Ok(())
    }

    fn destroy(&mut self) {
        self.inner.destroy();
    }
}

struct CallbackPlatform {
    inner: HeadlessPlatform,
    replies: Arc<Mutex<Vec<BridgeReply>>>,
}

impl OverlayPlatform for CallbackPlatform {
    type Engine = CallbackEngine;
    type Surface = HeadlessSurface;

    fn create_engine(&mut self, bridge: BridgeEndpoint) -> OverlayResult<CallbackEngine> {
        let inner = self.inner.create_engine(bridge.clone())?;
        Ok(CallbackEngine {
            inner,
            bridge,
            replies: Arc::clone(&self.replies),
        })
    }

    fn screen_metrics(&self) -> ScreenMetrics {
        self.inner.screen_metrics()
    }

    fn create_surface(&mut self, engine: &mut CallbackEngine) -> OverlayResult<HeadlessSurface> {
        self.inner.create_surface(&mut engine.inner)
    }

    fn release_surface(&mut self, engine: &mut CallbackEngine, surface: HeadlessSurface) {
        self.inner.release_surface(&mut engine.inner, surface);
    }

    fn add_to_screen(
        &mut self,
        surface: &HeadlessSurface,
        params: &WindowParams,
    ) -> OverlayResult<()> {
        self.inner.add_to_screen(surface, params)
    }

    fn remove_from_screen(&mut self, surface: &HeadlessSurface) -> OverlayResult<()> {
        self.inner.remove_from_screen(surface)
    }

    fn update_layout(
        &mut self,
        surface: &HeadlessSurface,
        params: &WindowParams,
    ) -> OverlayResult<()> {
        self.inner.update_layout(surface, params)
    }

    fn dispatch_touch(&mut self, surface: &HeadlessSurface, event: &TouchEvent) {
        self.inner.dispatch_touch(surface, event);
    }

    fn stop_listening(&mut self) {
        self.inner.stop_listening();
    }
}

#[test]
fn renderer_callbacks_from_the_actor_thread_do_not_deadlock() {
    let platform = HeadlessPlatform::new();
    let journal = platform.journal();
    let replies = Arc::new(Mutex::new(Vec::new()));
    let engine_replies = Arc::clone(&replies);
    let controller = Controller::spawn(
        OverlayConfig::default(),
        Arc::new(MemoryStore::new()),
        move |_| CallbackPlatform {
            inner: platform,
            replies: engine_replies,
        },
    )
    .unwrap();
    let handle = controller.handle();

    handle.call_state_changed("RINGING", Some("+1"));
    // The first call queues behind the ring, and the close posted while the
    // ring was handled queues before the second.
    assert_eq!(
        handle.bridge_call(BridgeCommand::GetNativeNumber),
        BridgeReply::Value(json!("+1"))
    );
    assert_eq!(
        handle.bridge_call(BridgeCommand::GetNativeNumber),
        BridgeReply::Value(json!("+1"))
    );

    assert_eq!(*replies.lock().unwrap(), vec![BridgeReply::Null]);
    assert_eq!(journal.pushes().len(), 1);
    assert_eq!(
        journal.count(|e| matches!(e, PlatformEvent::SurfaceRemoved { .. })),
        1
    );
    controller.shutdown();
}
