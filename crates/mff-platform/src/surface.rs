//! Marker surfaces for the indicator presenter.

use mff_core::{IndicatorRequest, MarkerId, MarkerSurface};
use tracing::{debug, info, trace};

/// Logs the marker lifecycle. Used when no UI layer is attached.
#[derive(Debug, Default)]
pub struct TracingSurface;

impl MarkerSurface for TracingSurface {
    fn create(&mut self, id: MarkerId, request: &IndicatorRequest, size: u32) {
        info!(
            id,
            point = %request.point,
            color = %request.color,
            display = request.display.0,
            size,
            "indicator shown"
        );
    }

    fn set_opacity(&mut self, id: MarkerId, opacity: f32) {
        trace!(id, opacity, "indicator fading");
    }

    fn remove(&mut self, id: MarkerId) {
        debug!(id, "indicator removed");
    }
}

type CreateFn = Box<dyn FnMut(MarkerId, &IndicatorRequest, u32) + Send>;
type OpacityFn = Box<dyn FnMut(MarkerId, f32) + Send>;
type RemoveFn = Box<dyn FnMut(MarkerId) + Send>;

/// Forwards marker operations to closures supplied by a UI layer, e.g. one
/// that owns borderless click-through overlay windows.
pub struct CallbackSurface {
    on_create: CreateFn,
    on_opacity: OpacityFn,
    on_remove: RemoveFn,
}

impl CallbackSurface {
    pub fn new(
        on_create: impl FnMut(MarkerId, &IndicatorRequest, u32) + Send + 'static,
        on_opacity: impl FnMut(MarkerId, f32) + Send + 'static,
        on_remove: impl FnMut(MarkerId) + Send + 'static,
    ) -> Self {
        Self {
            on_create: Box::new(on_create),
            on_opacity: Box::new(on_opacity),
            on_remove: Box::new(on_remove),
        }
    }
}

impl MarkerSurface for CallbackSurface {
    fn create(&mut self, id: MarkerId, request: &IndicatorRequest, size: u32) {
        (self.on_create)(id, request, size);
    }

    fn set_opacity(&mut self, id: MarkerId, opacity: f32) {
        (self.on_opacity)(id, opacity);
    }

    fn remove(&mut self, id: MarkerId) {
        (self.on_remove)(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mff_core::{Color, DisplayId, IndicatorConfig, IndicatorPresenter, Point};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_callback_surface_driven_by_presenter() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (log.clone(), log.clone(), log.clone());
        let surface = CallbackSurface::new(
            move |id, req: &IndicatorRequest, size| {
                a.lock().unwrap().push(format!("create {id} {} {size}", req.point))
            },
            move |_, _| b.lock().unwrap().push("fade".to_string()),
            move |id| c.lock().unwrap().push(format!("remove {id}")),
        );

        let config = IndicatorConfig {
            size: 24,
            duration_ms: 120,
            tick_ms: 30,
            ..IndicatorConfig::default()
        };
        let presenter = IndicatorPresenter::spawn(surface, config);
        presenter.show(IndicatorRequest {
            point: Point::new(7, 9),
            color: Color::new(0, 0, 0),
            display: DisplayId(0),
        });
        thread::sleep(Duration::from_millis(400));
        drop(presenter);

        let log = log.lock().unwrap();
        assert_eq!(log.first().map(String::as_str), Some("create 1 (7, 9) 24"));
        assert_eq!(log.last().map(String::as_str), Some("remove 1"));
        assert_eq!(log.iter().filter(|l| l.starts_with("remove")).count(), 1);
    }
}
