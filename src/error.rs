use thiserror::Error;

/// Failures surfaced by the controller's collaborators.
///
/// None of these cross the controller boundary: every entry point logs them
/// and leaves state consistent with what actually happened on screen.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("render engine failed to start: {0}")]
    EngineStart(String),
    #[error("window service rejected the overlay surface: {0}")]
    SurfaceRejected(String),
    #[error("overlay surface is not attached to the screen")]
    SurfaceDetached,
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
    #[error("failed to spawn {0} thread: {1}")]
    Spawn(&'static str, #[source] std::io::Error),
    #[error("store I/O failed: {0}")]
    StoreIo(#[from] std::io::Error),
    #[error("store encoding failed: {0}")]
    StoreEncoding(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
