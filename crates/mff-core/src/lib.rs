//! mff-core: focus-follow engine + supporting primitives.
//!
//! Design goal: keep this crate UI-agnostic and platform-agnostic.
//! Host I/O (focus notifications, display geometry, pointer warp) lives in
//! `mff-platform`; this crate only sees it through the traits below.

mod clock;
mod config;
mod display;
mod engine;
mod error;
mod indicator;
mod recorder;
mod source;
mod suppressor;
mod warp;

pub use clock::{monotonic_ms, Clock, ManualClock, MonotonicClock};
pub use config::{
    FollowConfig, IndicatorConfig, RecordingConfig, SuppressionConfig, WarpConfig,
};
pub use display::{Display, DisplayId, DisplayLayout, StaticLayout};
pub use engine::{
    EngineCommand, EngineEvent, EngineHandle, EngineState, EngineStatus, EventForwarder,
    FollowEngine, Outcome, Phase, Toggles,
};
pub use error::{FollowError, FollowResult};
pub use indicator::{
    IndicatorPresenter, IndicatorTrigger, MarkerId, MarkerSurface, PresenterTrigger,
};
pub use recorder::{Decision, JsonlFileSink, MemorySink, NullSink, RecordEntry, RecordingSink};
pub use source::{ChannelSource, FocusCallback, FocusEventSource};
pub use suppressor::{SuppressionWindow, WarpSuppressor};
pub use warp::{BoundedWarper, PointerWarper};

use serde::{Deserialize, Serialize};

/// A point in global screen coordinates (top-left origin, y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance, widened so it cannot overflow.
    pub fn distance_sq(&self, other: &Point) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// Whether `other` lies within `radius` pixels of this point (inclusive).
    pub fn within(&self, other: &Point, radius: u32) -> bool {
        let r = radius as i64;
        self.distance_sq(other) <= r * r
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle in global screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && (point.x as i64) < self.x as i64 + self.width as i64
            && (point.y as i64) < self.y as i64 + self.height as i64
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Clamp a point onto the last addressable pixel of this rectangle.
    pub fn clamp(&self, point: Point) -> Point {
        let max_x = self.x + (self.width - 1).max(0);
        let max_y = self.y + (self.height - 1).max(0);
        Point::new(point.x.clamp(self.x, max_x), point.y.clamp(self.y, max_y))
    }
}

/// Opaque host identifier of a window (HWND, CGWindowID, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// A normalized focus transition reported by a [`FocusEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusEvent {
    pub window_id: WindowId,
    /// Target point in global screen coordinates.
    pub point: Point,
    /// Milliseconds on the process monotonic clock (see [`monotonic_ms`]).
    pub timestamp_ms: u64,
    pub pid: u32,
}

impl FocusEvent {
    pub fn new(window_id: WindowId, point: Point, timestamp_ms: u64, pid: u32) -> Self {
        Self {
            window_id,
            point,
            timestamp_ms,
            pid,
        }
    }
}

/// RGB color value, written as `#RRGGBB` in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create color from hex string (e.g., "#FF0000" or "FF0000").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    /// Convert to hex string (e.g., "#FF0000").
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Request to show a transient marker at a warp target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub point: Point,
    pub color: Color,
    pub display: DisplayId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_within_radius() {
        let p = Point::new(500, 300);
        assert!(p.within(&Point::new(502, 301), 4));
        assert!(p.within(&Point::new(504, 300), 4));
        assert!(!p.within(&Point::new(504, 301), 4));
        assert!(p.within(&p, 0));
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = Rect::new(0, 0, 1920, 1080);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(1919, 1079)));
        assert!(!r.contains(Point::new(1920, 500)));
        assert!(!r.contains(Point::new(-1, 500)));

        let left = Rect::new(-1280, 0, 1280, 1024);
        assert!(left.contains(Point::new(-1, 10)));
    }

    #[test]
    fn test_rect_clamp() {
        let r = Rect::new(100, 100, 50, 50);
        assert_eq!(r.clamp(Point::new(0, 0)), Point::new(100, 100));
        assert_eq!(r.clamp(Point::new(500, 120)), Point::new(149, 120));
        assert_eq!(r.clamp(Point::new(120, 130)), Point::new(120, 130));
    }

    #[test]
    fn test_color_hex() {
        let color = Color::from_hex("#FF3B30").unwrap();
        assert_eq!(color, Color::new(255, 59, 48));
        assert_eq!(color.to_hex(), "#FF3B30");
        assert!(Color::from_hex("#FFF").is_none());
        assert!(Color::from_hex("zz0000").is_none());
        assert!(Color::from_hex("#+F+F+F").is_none());
        assert!(Color::from_hex("-1-1-1").is_none());
    }

    #[test]
    fn test_color_serde_as_string() {
        let json = serde_json::to_string(&Color::new(0, 128, 255)).unwrap();
        assert_eq!(json, "\"#0080FF\"");
        let back: Color = serde_json::from_str("\"00ff00\"").unwrap();
        assert_eq!(back, Color::new(0, 255, 0));
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }
}
