//! Display geometry as seen by the engine.

use crate::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Host display identifier (CGDirectDisplayID, monitor index, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub u32);

/// One attached display, bounds in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub id: DisplayId,
    pub bounds: Rect,
    pub scale_factor: f64,
}

impl Display {
    pub fn new(id: u32, bounds: Rect) -> Self {
        Self {
            id: DisplayId(id),
            bounds,
            scale_factor: 1.0,
        }
    }
}

/// Provider of the current display arrangement.
///
/// Queried on every accepted focus event, since displays can be attached,
/// detached or rearranged at any time.
pub trait DisplayLayout: Send {
    fn displays(&self) -> Vec<Display>;

    /// The display containing `point`, if any.
    fn locate(&self, point: Point) -> Option<Display> {
        self.displays()
            .into_iter()
            .find(|d| d.bounds.contains(point))
    }
}

/// A fixed arrangement.
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
    displays: Vec<Display>,
}

impl StaticLayout {
    pub fn new(displays: Vec<Display>) -> Self {
        Self { displays }
    }

    /// A single display at the origin.
    pub fn single(width: i32, height: i32) -> Self {
        Self::new(vec![Display::new(0, Rect::new(0, 0, width, height))])
    }
}

impl DisplayLayout for StaticLayout {
    fn displays(&self) -> Vec<Display> {
        self.displays.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_across_displays() {
        let layout = StaticLayout::new(vec![
            Display::new(1, Rect::new(0, 0, 1920, 1080)),
            Display::new(2, Rect::new(1920, -200, 1440, 900)),
        ]);

        assert_eq!(layout.locate(Point::new(10, 10)).map(|d| d.id), Some(DisplayId(1)));
        assert_eq!(
            layout.locate(Point::new(2000, -100)).map(|d| d.id),
            Some(DisplayId(2))
        );
        assert!(layout.locate(Point::new(9999, 9999)).is_none());
        assert!(layout.locate(Point::new(100, -100)).is_none());
    }
}
