//! Seams to the collaborators the controller drives but does not implement:
//! the render engine, the window service, and the call-state listener.
//!
//! Every method is called from the controller's own thread only.

pub mod headless;

use tracing::{info, warn};

use crate::bridge::BridgeEndpoint;
use crate::error::OverlayResult;
use crate::gesture::TouchEvent;
use crate::payload::OverlayPayload;
use crate::window::{ScreenMetrics, WindowParams};

/// The heavyweight renderer. Constructed at most once per controller.
pub trait RenderEngine {
    /// Runs the renderer's entrypoint. The bridge is already registered.
    fn run_entrypoint(&mut self, entrypoint: &str) -> OverlayResult<()>;

    /// Fire-and-forget push to the renderer.
    fn invoke(&mut self, method: &str, payload: &OverlayPayload) -> OverlayResult<()>;

    fn destroy(&mut self);
}

pub trait OverlayPlatform {
    type Engine: RenderEngine;
    type Surface;

    /// Builds the engine and registers `bridge` as its command channel
    /// handler. Must not run the entrypoint.
    fn create_engine(&mut self, bridge: BridgeEndpoint) -> OverlayResult<Self::Engine>;

    fn screen_metrics(&self) -> ScreenMetrics;

    /// Constructs a render surface and attaches it to `engine`.
    fn create_surface(&mut self, engine: &mut Self::Engine) -> OverlayResult<Self::Surface>;

    /// Detaches `surface` from `engine` and releases it.
    fn release_surface(&mut self, engine: &mut Self::Engine, surface: Self::Surface);

    fn add_to_screen(&mut self, surface: &Self::Surface, params: &WindowParams)
    -> OverlayResult<()>;

    fn remove_from_screen(&mut self, surface: &Self::Surface) -> OverlayResult<()>;

    fn update_layout(&mut self, surface: &Self::Surface, params: &WindowParams)
    -> OverlayResult<()>;

    /// Delivers a touch sample to the renderer content behind `surface`.
    fn dispatch_touch(&mut self, surface: &Self::Surface, event: &TouchEvent);

    /// Stops delivering call-state callbacks.
    fn stop_listening(&mut self) {}
}

/// Scoped ownership of a started engine.
///
/// [`release`](Self::release) is the teardown path; dropping an unreleased
/// lease still destroys the engine but logs it.
pub struct EngineLease<E: RenderEngine> {
    engine: Option<E>,
}

impl<E: RenderEngine> EngineLease<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn release(mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
            info!("render engine destroyed");
        }
    }
}

impl<E: RenderEngine> Drop for EngineLease<E> {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            warn!("render engine dropped without teardown; destroying");
            engine.destroy();
        }
    }
}
