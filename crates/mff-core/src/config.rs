//! Runtime configuration supplied by the preferences/UI collaborator.

use crate::Color;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Top-level configuration for the focus-follow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Master switch; when false no warp is ever issued.
    pub active: bool,
    /// Whether focus decisions are appended to the recording sink.
    pub recording: bool,
    /// Carried for the login-item collaborator. The engine ignores it.
    pub launch_at_login: bool,
    pub suppression: SuppressionConfig,
    pub indicator: IndicatorConfig,
    pub warp: WarpConfig,
    pub recording_sink: RecordingConfig,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            active: true,
            recording: false,
            launch_at_login: false,
            suppression: SuppressionConfig::default(),
            indicator: IndicatorConfig::default(),
            warp: WarpConfig::default(),
            recording_sink: RecordingConfig::default(),
        }
    }
}

impl FollowConfig {
    /// Clamp every tunable into a usable range, logging each adjustment.
    pub fn validate(mut self) -> Self {
        self.suppression.interval_ms =
            clamp_logged("suppression.interval_ms", self.suppression.interval_ms, 1, 5_000);
        self.suppression.radius_px =
            clamp_logged("suppression.radius_px", self.suppression.radius_px, 0, 64);
        self.indicator.duration_ms =
            clamp_logged("indicator.duration_ms", self.indicator.duration_ms, 50, 5_000);
        self.indicator.tick_ms = clamp_logged(
            "indicator.tick_ms",
            self.indicator.tick_ms,
            10,
            self.indicator.duration_ms,
        );
        self.indicator.size = clamp_logged("indicator.size", self.indicator.size, 4, 512);
        self.warp.timeout_ms = clamp_logged("warp.timeout_ms", self.warp.timeout_ms, 1, 1_000);
        self.recording_sink.capacity =
            clamp_logged("recording_sink.capacity", self.recording_sink.capacity, 1, 1 << 20);
        self
    }
}

fn clamp_logged<T: PartialOrd + Copy + std::fmt::Debug>(name: &str, value: T, min: T, max: T) -> T {
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        warn!(setting = name, ?value, ?clamped, "config value out of range, clamped");
    }
    clamped
}

/// Warp-suppression tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// Tolerance radius around the last warp point (pixels).
    pub radius_px: u32,
    /// How long a warp keeps suppressing nearby focus events (ms).
    pub interval_ms: u64,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            radius_px: 4,
            interval_ms: 200,
        }
    }
}

/// Transient indicator appearance and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub enabled: bool,
    pub color: Color,
    /// Marker diameter in points.
    pub size: u32,
    /// Total on-screen time of one marker (ms).
    pub duration_ms: u64,
    /// Fade step interval (ms).
    pub tick_ms: u64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Color::new(0xFF, 0x3B, 0x30),
            size: 40,
            duration_ms: 600,
            tick_ms: 30,
        }
    }
}

/// Pointer warp bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Longest the engine waits for the host warp primitive (ms).
    pub timeout_ms: u64,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self { timeout_ms: 50 }
    }
}

/// Where recorded focus decisions go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Entries kept in memory, or queued for the file writer.
    pub capacity: usize,
    /// Append JSON lines to this file instead of keeping them in memory.
    pub file: Option<PathBuf>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FollowConfig::default();
        assert!(config.active);
        assert!(!config.recording);
        assert_eq!(config.suppression.radius_px, 4);
        assert_eq!(config.suppression.interval_ms, 200);
        assert_eq!(config.indicator.duration_ms, 600);
        assert_eq!(config.warp.timeout_ms, 50);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FollowConfig =
            serde_json::from_str(r##"{"recording": true, "indicator": {"color": "#00FF00"}}"##)
                .unwrap();
        assert!(config.active);
        assert!(config.recording);
        assert_eq!(config.indicator.color, Color::new(0, 255, 0));
        assert_eq!(config.indicator.size, 40);
        assert_eq!(config.suppression, SuppressionConfig::default());
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = FollowConfig::default();
        config.suppression.interval_ms = 0;
        config.suppression.radius_px = 1000;
        config.indicator.duration_ms = 100;
        config.indicator.tick_ms = 500;
        config.recording_sink.capacity = 0;

        let config = config.validate();
        assert_eq!(config.suppression.interval_ms, 1);
        assert_eq!(config.suppression.radius_px, 64);
        assert_eq!(config.indicator.tick_ms, 100);
        assert_eq!(config.recording_sink.capacity, 1);
    }
}
