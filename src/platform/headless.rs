//! A platform with no display: every call is recorded in a shared journal.
//!
//! Used by the integration tests and the `call-replay` tool.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::{OverlayPlatform, RenderEngine};
use crate::bridge::BridgeEndpoint;
use crate::constants::UPDATE_DATA_METHOD;
use crate::error::{OverlayError, OverlayResult};
use crate::gesture::TouchEvent;
use crate::payload::OverlayPayload;
use crate::window::{ScreenMetrics, WindowParams};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlatformEvent {
    EngineCreated { channel: String },
    EntrypointRun { entrypoint: String },
    Invoke { method: String, payload: OverlayPayload },
    SurfaceCreated { surface: u32 },
    SurfaceAdded { surface: u32, params: WindowParams },
    AddRejected { surface: u32 },
    SurfaceRemoved { surface: u32 },
    LayoutUpdated { surface: u32, params: WindowParams },
    SurfaceReleased { surface: u32 },
    TouchDispatched { surface: u32, touch: TouchEvent },
    ListeningStopped,
    EngineDestroyed,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessJournal {
    events: Arc<Mutex<Vec<PlatformEvent>>>,
}

impl HeadlessJournal {
    fn record(&self, event: PlatformEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&PlatformEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|e| pred(e)).count())
            .unwrap_or(0)
    }

    /// Payloads delivered to the renderer through `updateData`.
    pub fn pushes(&self) -> Vec<OverlayPayload> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlatformEvent::Invoke { method, payload } if method == UPDATE_DATA_METHOD => {
                    Some(payload)
                }
                _ => None,
            })
            .collect()
    }

    pub fn forwarded_touches(&self) -> Vec<TouchEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlatformEvent::TouchDispatched { touch, .. } => Some(touch),
                _ => None,
            })
            .collect()
    }

    pub fn layout_updates(&self) -> Vec<WindowParams> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlatformEvent::LayoutUpdated { params, .. } => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

/// Knobs for simulating platform misbehaviour from outside the controller.
#[derive(Debug, Clone, Default)]
pub struct HeadlessControls {
    deny_overlay: Arc<AtomicBool>,
    fail_entrypoint: Arc<AtomicBool>,
    reject_remove: Arc<AtomicBool>,
    on_screen: Arc<Mutex<Option<u32>>>,
}

impl HeadlessControls {
    /// Makes subsequent `add_to_screen` calls fail, as when the overlay
    /// permission is revoked at runtime.
    pub fn set_overlay_denied(&self, denied: bool) {
        self.deny_overlay.store(denied, Ordering::SeqCst);
    }

    pub fn set_entrypoint_failure(&self, fail: bool) {
        self.fail_entrypoint.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `remove_from_screen` calls fail while leaving the
    /// surface on screen.
    pub fn set_remove_rejected(&self, rejected: bool) {
        self.reject_remove.store(rejected, Ordering::SeqCst);
    }

    /// Removes the current surface behind the controller's back.
    pub fn remove_externally(&self) {
        if let Ok(mut on_screen) = self.on_screen.lock() {
            *on_screen = None;
        }
    }

    pub fn surface_on_screen(&self) -> Option<u32> {
        self.on_screen.lock().ok().and_then(|s| *s)
    }
}

pub struct HeadlessEngine {
    journal: HeadlessJournal,
    fail_entrypoint: Arc<AtomicBool>,
    started: bool,
    _bridge: BridgeEndpoint,
}

impl RenderEngine for HeadlessEngine {
    fn run_entrypoint(&mut self, entrypoint: &str) -> OverlayResult<()> {
        if self.fail_entrypoint.load(Ordering::SeqCst) {
            return Err(OverlayError::EngineStart(format!(
                "entrypoint {entrypoint} not found"
            )));
        }
        self.started = true;
        self.journal.record(PlatformEvent::EntrypointRun {
            entrypoint: entrypoint.to_string(),
        });
        Ok(())
    }

    fn invoke(&mut self, method: &str, payload: &OverlayPayload) -> OverlayResult<()> {
        if !self.started {
            return Err(OverlayError::RendererUnavailable(
                "entrypoint has not run".into(),
            ));
        }
        self.journal.record(PlatformEvent::Invoke {
            method: method.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }

    fn destroy(&mut self) {
        self.started = false;
        self.journal.record(PlatformEvent::EngineDestroyed);
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    id: u32,
}

pub struct HeadlessPlatform {
    journal: HeadlessJournal,
    controls: HeadlessControls,
    metrics: ScreenMetrics,
    next_surface: AtomicU32,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            journal: HeadlessJournal::default(),
            controls: HeadlessControls::default(),
            metrics: ScreenMetrics::default(),
            next_surface: AtomicU32::new(1),
        }
    }

    pub fn with_metrics(mut self, metrics: ScreenMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn journal(&self) -> HeadlessJournal {
        self.journal.clone()
    }

    pub fn controls(&self) -> HeadlessControls {
        self.controls.clone()
    }
}

impl OverlayPlatform for HeadlessPlatform {
    type Engine = HeadlessEngine;
    type Surface = HeadlessSurface;

    fn create_engine(&mut self, bridge: BridgeEndpoint) -> OverlayResult<HeadlessEngine> {
        self.journal.record(PlatformEvent::EngineCreated {
            channel: bridge.channel().to_string(),
        });
        Ok(HeadlessEngine {
            journal: self.journal.clone(),
            fail_entrypoint: Arc::clone(&self.controls.fail_entrypoint),
            started: false,
            _bridge: bridge,
        })
    }

    fn screen_metrics(&self) -> ScreenMetrics {
        self.metrics
    }

    fn create_surface(&mut self, _engine: &mut HeadlessEngine) -> OverlayResult<HeadlessSurface> {
        let id = self.next_surface.fetch_add(1, Ordering::SeqCst);
        self.journal.record(PlatformEvent::SurfaceCreated { surface: id });
        Ok(HeadlessSurface { id })
    }

    fn release_surface(&mut self, _engine: &mut HeadlessEngine, surface: HeadlessSurface) {
        self.journal
            .record(PlatformEvent::SurfaceReleased { surface: surface.id });
    }

    fn add_to_screen(
        &mut self,
        surface: &HeadlessSurface,
        params: &WindowParams,
    ) -> OverlayResult<()> {
        if self.controls.deny_overlay.load(Ordering::SeqCst) {
            self.journal
                .record(PlatformEvent::AddRejected { surface: surface.id });
            return Err(OverlayError::SurfaceRejected(
                "overlay permission denied".into(),
            ));
        }
        if let Ok(mut on_screen) = self.controls.on_screen.lock() {
            *on_screen = Some(surface.id);
        }
        self.journal.record(PlatformEvent::SurfaceAdded {
            surface: surface.id,
            params: *params,
        });
        Ok(())
    }

    fn remove_from_screen(&mut self, surface: &HeadlessSurface) -> OverlayResult<()> {
        let mut on_screen = self
            .controls
            .on_screen
            .lock()
            .map_err(|_| OverlayError::SurfaceDetached)?;
        if *on_screen != Some(surface.id) {
            return Err(OverlayError::SurfaceDetached);
        }
        if self.controls.reject_remove.load(Ordering::SeqCst) {
            return Err(OverlayError::SurfaceRejected(
                "window service refused removal".into(),
            ));
        }
        *on_screen = None;
        self.journal
            .record(PlatformEvent::SurfaceRemoved { surface: surface.id });
        Ok(())
    }

    fn update_layout(
        &mut self,
        surface: &HeadlessSurface,
        params: &WindowParams,
    ) -> OverlayResult<()> {
        if self.controls.surface_on_screen() != Some(surface.id) {
            return Err(OverlayError::SurfaceDetached);
        }
        self.journal.record(PlatformEvent::LayoutUpdated {
            surface: surface.id,
            params: *params,
        });
        Ok(())
    }

    fn dispatch_touch(&mut self, surface: &HeadlessSurface, event: &TouchEvent) {
        self.journal.record(PlatformEvent::TouchDispatched {
            surface: surface.id,
            touch: *event,
        });
    }

    fn stop_listening(&mut self) {
        self.journal.record(PlatformEvent::ListeningStopped);
    }
}
