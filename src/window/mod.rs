mod manager;

use serde::{Deserialize, Serialize};

pub use manager::OverlayWindowManager;

/// Signed window origin, in physical pixels.
///
/// `x` is an offset from the horizontally centred position (the overlay is
/// placed with top / centre-horizontal gravity); `y` is measured from the
/// top of the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// One axis of the window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Pixels(u32),
    WrapContent,
    MatchParent,
}

impl Dimension {
    /// Positive heights are explicit; zero, negative or missing values
    /// restore wrap-content.
    pub fn from_requested(value: Option<i64>) -> Self {
        match value {
            Some(px) if px > 0 => Dimension::Pixels(px.min(u32::MAX as i64) as u32),
            _ => Dimension::WrapContent,
        }
    }
}

/// Layout parameters applied to the live surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowParams {
    pub position: Position,
    pub width: Dimension,
    pub height: Dimension,
}

/// What the platform reports about the display the overlay lives on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width_px: u32,
    pub height_px: u32,
    /// Physical pixels per density-independent pixel.
    pub density: f32,
    pub status_bar_px: u32,
}

impl ScreenMetrics {
    pub fn dp_to_px(&self, dp: f32) -> f32 {
        dp * self.density
    }
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self {
            width_px: 1080,
            height_px: 2400,
            density: 3.0,
            status_bar_px: 72,
        }
    }
}

/// A geometry change requested while the overlay is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryUpdate {
    Height(Dimension),
    Width(Dimension),
    Position(Position),
}

impl WindowParams {
    pub fn apply(&mut self, update: GeometryUpdate) {
        match update {
            GeometryUpdate::Height(height) => self.height = height,
            GeometryUpdate::Width(width) => self.width = width,
            GeometryUpdate::Position(position) => self.position = position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_heights() {
        assert_eq!(Dimension::from_requested(Some(320)), Dimension::Pixels(320));
        assert_eq!(Dimension::from_requested(Some(0)), Dimension::WrapContent);
        assert_eq!(Dimension::from_requested(Some(-5)), Dimension::WrapContent);
        assert_eq!(Dimension::from_requested(None), Dimension::WrapContent);
    }

    #[test]
    fn dp_conversion_uses_density() {
        let metrics = ScreenMetrics {
            density: 2.5,
            ..ScreenMetrics::default()
        };
        assert_eq!(metrics.dp_to_px(60.0), 150.0);
    }

    #[test]
    fn apply_only_touches_requested_axis() {
        let mut params = WindowParams {
            position: Position::new(0, 92),
            width: Dimension::Pixels(1026),
            height: Dimension::WrapContent,
        };
        params.apply(GeometryUpdate::Height(Dimension::Pixels(400)));
        assert_eq!(params.width, Dimension::Pixels(1026));
        assert_eq!(params.height, Dimension::Pixels(400));
        params.apply(GeometryUpdate::Position(Position::new(-10, 300)));
        assert_eq!(params.position, Position::new(-10, 300));
    }
}
