//! Timing defaults and the tunables consumed by [`SwitchController`].
//!
//! [`SwitchController`]: crate::controller::SwitchController

use crate::time::Millis;

/// Minimum spacing between two time-screen redraws.
pub const DISPLAY_REFRESH_MS: Millis = 200;

/// Remaining time at which the indicator starts blinking.
pub const DEFAULT_WARNING_THRESHOLD_S: i32 = 60;

/// Blink half-period used once the warning threshold is crossed.
pub const DEFAULT_WARNING_BLINK_MS: Millis = 500;

/// How long interval summaries and messages stay on screen.
pub const DEFAULT_OVERLAY_MS: Millis = 1_500;

/// Grace window opened while the operator changes settings.
pub const DEFAULT_SETTINGS_GRACE_S: u32 = 10;

/// Number of selectable countdown intervals.
pub const INTERVAL_SLOTS: usize = 4;

/// Factory interval choices, in minutes.
pub const DEFAULT_INTERVALS_MIN: [u16; INTERVAL_SLOTS] = [15, 30, 60, 120];

/// Tunables for the cooperative update loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub warning_threshold_s: i32,
    pub warning_blink_ms: Millis,
    pub overlay_ms: Millis,
    pub settings_grace_s: u32,
    pub display_refresh_ms: Millis,
}

impl ControllerConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            warning_threshold_s: DEFAULT_WARNING_THRESHOLD_S,
            warning_blink_ms: DEFAULT_WARNING_BLINK_MS,
            overlay_ms: DEFAULT_OVERLAY_MS,
            settings_grace_s: DEFAULT_SETTINGS_GRACE_S,
            display_refresh_ms: DISPLAY_REFRESH_MS,
        }
    }

    /// Returns a copy with a different overlay duration.
    #[must_use]
    pub const fn with_overlay(mut self, overlay_ms: Millis) -> Self {
        self.overlay_ms = overlay_ms;
        self
    }

    /// Returns a copy with a different time-screen refresh period.
    #[must_use]
    pub const fn with_display_refresh(mut self, refresh_ms: Millis) -> Self {
        self.display_refresh_ms = refresh_ms;
        self
    }

    /// Returns a copy with a different warning threshold.
    #[must_use]
    pub const fn with_warning_threshold(mut self, seconds: i32) -> Self {
        self.warning_threshold_s = seconds;
        self
    }

    /// Returns `true` when `remaining` falls inside the warning band.
    #[must_use]
    pub const fn in_warning_band(&self, remaining: i32) -> bool {
        remaining > 0 && remaining <= self.warning_threshold_s
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_band_excludes_expired_countdown() {
        let config = ControllerConfig::default().with_warning_threshold(30);
        assert!(config.in_warning_band(30));
        assert!(config.in_warning_band(1));
        assert!(!config.in_warning_band(31));
        assert!(!config.in_warning_band(0));
    }
}
