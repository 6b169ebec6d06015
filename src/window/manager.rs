use tracing::{debug, error, info, warn};

use super::{Dimension, GeometryUpdate, Position, ScreenMetrics, WindowParams};
use crate::bridge::BridgeEndpoint;
use crate::config::OverlayConfig;
use crate::constants::UPDATE_DATA_METHOD;
use crate::error::OverlayError;
use crate::gesture::{GestureInterpreter, TouchEvent};
use crate::payload::OverlayPayload;
use crate::platform::{EngineLease, OverlayPlatform, RenderEngine};

/// Owns the render engine, the single overlay surface and its layout.
///
/// A surface is held only while it is on screen, so `visible` is derived
/// from it rather than tracked separately.
pub struct OverlayWindowManager<P: OverlayPlatform> {
    platform: P,
    config: OverlayConfig,
    bridge: BridgeEndpoint,
    engine: Option<EngineLease<P::Engine>>,
    surface: Option<P::Surface>,
    params: Option<WindowParams>,
    gesture: Option<GestureInterpreter>,
    torn_down: bool,
}

impl<P: OverlayPlatform> OverlayWindowManager<P> {
    pub fn new(platform: P, config: OverlayConfig, bridge: BridgeEndpoint) -> Self {
        Self {
            platform,
            config,
            bridge,
            engine: None,
            surface: None,
            params: None,
            gesture: None,
            torn_down: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_engine_ready(&self) -> bool {
        self.engine.is_some()
    }

    /// Current layout, `None` while hidden.
    pub fn params(&self) -> Option<WindowParams> {
        self.surface.as_ref().and(self.params)
    }

    /// Constructs the engine and runs its entrypoint, once. Returns whether
    /// an engine is ready afterwards.
    ///
    /// A failed start leaves no engine behind; the next call tries again.
    pub fn ensure_engine_ready(&mut self) -> bool {
        if self.torn_down {
            debug!("engine requested after teardown; ignoring");
            return false;
        }
        if self.engine.is_some() {
            return true;
        }

        let engine = match self.platform.create_engine(self.bridge.clone()) {
            Ok(engine) => engine,
            Err(err) => {
                error!(%err, "failed to construct render engine");
                return false;
            }
        };
        let mut lease = EngineLease::new(engine);
        let started = match lease.get_mut() {
            Some(engine) => engine.run_entrypoint(&self.config.entrypoint),
            None => return false,
        };
        if let Err(err) = started {
            error!(%err, entrypoint = %self.config.entrypoint, "renderer entrypoint failed");
            lease.release();
            return false;
        }
        info!(
            channel = self.bridge.channel(),
            entrypoint = %self.config.entrypoint,
            "render engine ready"
        );
        self.engine = Some(lease);
        true
    }

    /// Puts a fresh surface on screen. No-op when already visible, when the
    /// engine is not ready, or after teardown.
    pub fn show(&mut self) {
        if self.torn_down {
            debug!("show after teardown ignored");
            return;
        }
        if self.surface.is_some() {
            debug!("overlay already visible");
            return;
        }
        let Some(engine) = self.engine.as_mut().and_then(EngineLease::get_mut) else {
            debug!("engine not ready; show skipped");
            return;
        };

        let surface = match self.platform.create_surface(engine) {
            Ok(surface) => surface,
            Err(err) => {
                warn!(%err, "failed to create overlay surface");
                return;
            }
        };
        let metrics = self.platform.screen_metrics();
        let params = initial_params(&self.config, &metrics);
        let gesture = GestureInterpreter::new(
            metrics.dp_to_px(self.config.drag_handle_height_dp),
            metrics.dp_to_px(self.config.touch_slop_dp),
        );

        match self.platform.add_to_screen(&surface, &params) {
            Ok(()) => {
                info!(x = params.position.x, y = params.position.y, "overlay shown");
                self.surface = Some(surface);
                self.params = Some(params);
                self.gesture = Some(gesture);
            }
            Err(err) => {
                warn!(%err, "window service refused the overlay");
                self.platform.release_surface(engine, surface);
            }
        }
    }

    /// Takes the surface off screen and releases it. Tolerates the surface
    /// having been removed by someone else.
    ///
    /// If the window service refuses the removal the surface is still on
    /// screen, so it stays owned and the overlay stays visible.
    pub fn hide(&mut self) {
        let Some(surface) = self.surface.take() else {
            debug!("overlay already hidden");
            return;
        };

        match self.platform.remove_from_screen(&surface) {
            Ok(()) => {}
            Err(OverlayError::SurfaceDetached) => {
                warn!("overlay surface was already off screen");
            }
            Err(err) => {
                warn!(%err, "window service refused to remove the overlay");
                self.surface = Some(surface);
                return;
            }
        }
        self.gesture = None;
        self.params = None;
        match self.engine.as_mut().and_then(EngineLease::get_mut) {
            Some(engine) => self.platform.release_surface(engine, surface),
            None => warn!("no engine to detach the overlay surface from"),
        }
        info!("overlay hidden");
    }

    /// Applies a size or position change to the live surface. Ignored while
    /// hidden.
    pub fn update_geometry(&mut self, update: GeometryUpdate) {
        let (Some(surface), Some(params)) = (self.surface.as_ref(), self.params.as_mut()) else {
            debug!(?update, "geometry update while hidden ignored");
            return;
        };
        params.apply(update);
        if let Err(err) = self.platform.update_layout(surface, params) {
            warn!(%err, "failed to apply overlay layout");
        }
    }

    /// Best-effort `updateData` push. Dropped when the renderer is not up.
    pub fn push(&mut self, payload: &OverlayPayload) {
        let Some(engine) = self.engine.as_mut().and_then(EngineLease::get_mut) else {
            debug!("renderer not ready; push dropped");
            return;
        };
        if let Err(err) = engine.invoke(UPDATE_DATA_METHOD, payload) {
            debug!(%err, "push dropped");
        }
    }

    /// Routes one touch sample through the gesture interpreter. Returns
    /// whether the sequence is claimed for dragging.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        let (Some(surface), Some(params), Some(gesture)) =
            (self.surface.as_ref(), self.params, self.gesture.as_mut())
        else {
            return false;
        };

        let outcome = gesture.on_touch(event, params.position);
        for forwarded in &outcome.forward {
            self.platform.dispatch_touch(surface, forwarded);
        }
        if let Some(position) = outcome.reposition {
            self.update_geometry(GeometryUpdate::Position(position));
        }
        outcome.claimed
    }

    /// Stops the call-state listener, hides, and destroys the engine. Only
    /// the first call does anything.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.platform.stop_listening();
        self.hide();
        if let Some(lease) = self.engine.take() {
            lease.release();
        }
        self.torn_down = true;
        info!("overlay window manager torn down");
    }
}

fn initial_params(config: &OverlayConfig, metrics: &ScreenMetrics) -> WindowParams {
    let width = match config.width_fraction {
        Some(fraction) => Dimension::Pixels((metrics.width_px as f32 * fraction).round() as u32),
        None => Dimension::MatchParent,
    };
    let top = i32::try_from(metrics.status_bar_px).unwrap_or(i32::MAX);
    WindowParams {
        position: Position::new(0, top.saturating_add(config.top_margin_px)),
        width,
        height: Dimension::WrapContent,
    }
}
