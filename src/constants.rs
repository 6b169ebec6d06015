//! Shared crate-wide constants.

/// Name of the command channel registered on the render engine before its
/// entrypoint runs.
pub const DEFAULT_CHANNEL_NAME: &str = "call_overlay/overlay";

/// Renderer entrypoint executed once the engine is constructed.
pub const DEFAULT_ENTRYPOINT: &str = "overlayMain";

/// Durable key under which the in-progress call's number is written so the
/// surrounding application can read it even if the controller restarts
/// mid-call.
pub const CURRENT_CALL_NUMBER_KEY: &str = "flutter.current_call_number";

/// Number shown when neither the signal nor the fallback supplies one.
pub const UNKNOWN_NUMBER_PLACEHOLDER: &str = "Unknown";

/// Method name of the push event delivered to the renderer.
pub const UPDATE_DATA_METHOD: &str = "updateData";

/// Height of the band at the top of the surface that claims touch-down
/// events for repositioning.
///
/// Units: density-independent pixels. Converted with
/// [`ScreenMetrics::dp_to_px`](crate::window::ScreenMetrics::dp_to_px).
pub const DRAG_HANDLE_HEIGHT_DP: f32 = 60.0;

/// Displacement a pointer must exceed on either axis before a tracked touch
/// becomes a drag.
///
/// Units: density-independent pixels.
pub const TOUCH_SLOP_DP: f32 = 8.0;

/// Gap between the status bar and the top edge of a freshly shown overlay.
///
/// Units: physical pixels.
pub const TOP_MARGIN_PX: i32 = 20;

/// Fraction of the screen width given to the overlay on first show.
pub const OVERLAY_WIDTH_FRACTION: f32 = 0.95;
