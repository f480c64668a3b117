//! Pointer warp implementations.

use crate::{PlatformError, PlatformResult};
use enigo::{Coordinate, Enigo, Mouse, Settings};
use mff_core::{FollowResult, Point, PointerWarper};
use tracing::debug;

/// No-op warper for headless runs / testing.
#[derive(Debug, Default)]
pub struct NoopWarper;

impl PointerWarper for NoopWarper {
    fn warp(&mut self, point: Point) -> FollowResult<()> {
        debug!(%point, "NoopWarper: would warp pointer");
        Ok(())
    }
}

/// Real pointer warper using `enigo` crate.
pub struct EnigoWarper {
    enigo: Enigo,
}

impl EnigoWarper {
    /// Create a new EnigoWarper.
    pub fn new() -> PlatformResult<Self> {
        let settings = Settings::default();
        let enigo = Enigo::new(&settings)
            .map_err(|e| PlatformError::WarpFailed(format!("failed to create Enigo: {e}")))?;
        Ok(Self { enigo })
    }
}

impl PointerWarper for EnigoWarper {
    fn warp(&mut self, point: Point) -> FollowResult<()> {
        debug!(x = point.x, y = point.y, "warping pointer");
        self.enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(|e| PlatformError::WarpFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_warper_accepts_anything() {
        let mut warper = NoopWarper;
        assert!(warper.warp(Point::new(-100, 5000)).is_ok());
    }
}
