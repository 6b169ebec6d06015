//! Controller configuration, loadable from JSON with every field optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CURRENT_CALL_NUMBER_KEY, DEFAULT_CHANNEL_NAME, DEFAULT_ENTRYPOINT, DRAG_HANDLE_HEIGHT_DP,
    OVERLAY_WIDTH_FRACTION, TOP_MARGIN_PX, TOUCH_SLOP_DP, UNKNOWN_NUMBER_PLACEHOLDER,
};
use crate::error::{OverlayError, OverlayResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    pub channel_name: String,
    pub entrypoint: String,
    pub store_key: String,
    pub unknown_number: String,
    pub drag_handle_height_dp: f32,
    pub touch_slop_dp: f32,
    pub top_margin_px: i32,
    /// `None` gives the overlay the full screen width.
    pub width_fraction: Option<f32>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
            store_key: CURRENT_CALL_NUMBER_KEY.to_string(),
            unknown_number: UNKNOWN_NUMBER_PLACEHOLDER.to_string(),
            drag_handle_height_dp: DRAG_HANDLE_HEIGHT_DP,
            touch_slop_dp: TOUCH_SLOP_DP,
            top_margin_px: TOP_MARGIN_PX,
            width_fraction: Some(OVERLAY_WIDTH_FRACTION),
        }
    }
}

impl OverlayConfig {
    pub fn load(path: &Path) -> OverlayResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if self.channel_name.trim().is_empty() {
            return Err(OverlayError::InvalidConfig(
                "channel name must not be empty".into(),
            ));
        }
        if self.entrypoint.trim().is_empty() {
            return Err(OverlayError::InvalidConfig(
                "entrypoint must not be empty".into(),
            ));
        }
        if !(self.drag_handle_height_dp > 0.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "drag handle height must be positive, got {}",
                self.drag_handle_height_dp
            )));
        }
        if !(self.touch_slop_dp > 0.0) {
            return Err(OverlayError::InvalidConfig(format!(
                "touch slop must be positive, got {}",
                self.touch_slop_dp
            )));
        }
        if let Some(fraction) = self.width_fraction
            && !(fraction > 0.0 && fraction <= 1.0)
        {
            return Err(OverlayError::InvalidConfig(format!(
                "width fraction must be within (0, 1], got {fraction}"
            )));
        }
        Ok(())
    }
}
