//! Terminal-backed platform for the `call-overlay` host binary.
//!
//! The "screen" is a region of the terminal, one cell per pixel. The render
//! engine is a tiny stand-in renderer that shows the last pushed payload
//! and a close button. All state the host needs for drawing lives in
//! [`SimState`] behind a mutex shared between the controller thread (which
//! owns the platform) and the UI thread.

pub mod view;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::bridge::{BridgeCall, BridgeEndpoint, METHOD_CLOSE_OVERLAY};
use crate::config::OverlayConfig;
use crate::constants::UPDATE_DATA_METHOD;
use crate::error::{OverlayError, OverlayResult};
use crate::gesture::{TouchAction, TouchEvent};
use crate::payload::OverlayPayload;
use crate::platform::{OverlayPlatform, RenderEngine};
use crate::window::{ScreenMetrics, WindowParams};

/// Cells per density-independent pixel. Puts the 60 dp drag band at three
/// rows.
pub const SIM_DENSITY: f32 = 0.05;

/// Config tuned for a screen measured in terminal cells.
pub fn sim_config() -> OverlayConfig {
    OverlayConfig {
        top_margin_px: 1,
        width_fraction: Some(0.7),
        ..OverlayConfig::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayView {
    pub surface: u32,
    pub params: WindowParams,
}

#[derive(Debug)]
pub struct SimState {
    pub screen: ScreenMetrics,
    /// The surface currently on screen.
    pub overlay: Option<OverlayView>,
    /// What the renderer is displaying.
    pub payload: Option<OverlayPayload>,
    pub engine_running: bool,
    /// Set when the renderer starts; the host answers it with a
    /// `getPreStartData` call.
    pub pre_start_pending: bool,
    pub overlay_denied: bool,
    pub listening: bool,
    pressed: bool,
}

impl SimState {
    pub fn new(screen: ScreenMetrics) -> Self {
        Self {
            screen,
            overlay: None,
            payload: None,
            engine_running: false,
            pre_start_pending: false,
            overlay_denied: false,
            listening: true,
            pressed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SharedSim(Arc<Mutex<SimState>>);

impl SharedSim {
    pub fn new(state: SimState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn lock(&self) -> MutexGuard<'_, SimState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct SimEngine {
    shared: SharedSim,
    started: bool,
}

impl RenderEngine for SimEngine {
    fn run_entrypoint(&mut self, entrypoint: &str) -> OverlayResult<()> {
        let mut state = self.shared.lock();
        state.engine_running = true;
        state.pre_start_pending = true;
        self.started = true;
        debug!(entrypoint, "sim renderer started");
        Ok(())
    }

    fn invoke(&mut self, method: &str, payload: &OverlayPayload) -> OverlayResult<()> {
        if !self.started {
            return Err(OverlayError::RendererUnavailable(
                "sim renderer not started".into(),
            ));
        }
        if method == UPDATE_DATA_METHOD {
            self.shared.lock().payload = Some(payload.clone());
        } else {
            debug!(method, "sim renderer ignored method");
        }
        Ok(())
    }

    fn destroy(&mut self) {
        let mut state = self.shared.lock();
        state.engine_running = false;
        state.payload = None;
        self.started = false;
    }
}

pub struct SimSurface {
    id: u32,
}

pub struct TerminalPlatform {
    shared: SharedSim,
    bridge: Option<BridgeEndpoint>,
    next_surface: u32,
}

impl TerminalPlatform {
    pub fn new(shared: SharedSim) -> Self {
        Self {
            shared,
            bridge: None,
            next_surface: 1,
        }
    }

    /// The stand-in renderer's touch handling: a press released on the
    /// close button asks the controller to close the overlay.
    fn renderer_touch(&self, width: u16, event: &TouchEvent) {
        let mut state = self.shared.lock();
        match event.action {
            TouchAction::Down => state.pressed = true,
            TouchAction::Move => {}
            TouchAction::Cancel => state.pressed = false,
            TouchAction::Up => {
                let tapped = state.pressed && view::hits_close(width, event.x, event.y);
                state.pressed = false;
                drop(state);
                if tapped && let Some(bridge) = &self.bridge {
                    bridge.post(BridgeCall::new(METHOD_CLOSE_OVERLAY, None));
                }
            }
        }
    }
}

impl OverlayPlatform for TerminalPlatform {
    type Engine = SimEngine;
    type Surface = SimSurface;

    fn create_engine(&mut self, bridge: BridgeEndpoint) -> OverlayResult<SimEngine> {
        self.bridge = Some(bridge);
        Ok(SimEngine {
            shared: self.shared.clone(),
            started: false,
        })
    }

    fn screen_metrics(&self) -> ScreenMetrics {
        self.shared.lock().screen
    }

    fn create_surface(&mut self, _engine: &mut SimEngine) -> OverlayResult<SimSurface> {
        let id = self.next_surface;
        self.next_surface = self.next_surface.wrapping_add(1);
        trace!(surface = id, "sim surface created");
        Ok(SimSurface { id })
    }

    fn release_surface(&mut self, _engine: &mut SimEngine, surface: SimSurface) {
        trace!(surface = surface.id, "sim surface released");
    }

    fn add_to_screen(&mut self, surface: &SimSurface, params: &WindowParams) -> OverlayResult<()> {
        let mut state = self.shared.lock();
        if state.overlay_denied {
            return Err(OverlayError::SurfaceRejected(
                "overlay permission revoked".into(),
            ));
        }
        state.overlay = Some(OverlayView {
            surface: surface.id,
            params: *params,
        });
        Ok(())
    }

    fn remove_from_screen(&mut self, surface: &SimSurface) -> OverlayResult<()> {
        let mut state = self.shared.lock();
        if state.overlay.map(|view| view.surface) != Some(surface.id) {
            return Err(OverlayError::SurfaceDetached);
        }
        state.overlay = None;
        state.pressed = false;
        Ok(())
    }

    fn update_layout(&mut self, surface: &SimSurface, params: &WindowParams) -> OverlayResult<()> {
        let mut state = self.shared.lock();
        match state.overlay.as_mut() {
            Some(view) if view.surface == surface.id => {
                view.params = *params;
                Ok(())
            }
            _ => Err(OverlayError::SurfaceDetached),
        }
    }

    fn dispatch_touch(&mut self, surface: &SimSurface, event: &TouchEvent) {
        let width = {
            let state = self.shared.lock();
            match state.overlay.filter(|view| view.surface == surface.id) {
                Some(view) => view::overlay_width(&view.params, state.screen.width_px),
                None => return,
            }
        };
        self.renderer_touch(width, event);
    }

    fn stop_listening(&mut self) {
        self.shared.lock().listening = false;
    }
}
