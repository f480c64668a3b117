//! Pointer warp primitive and a latency bound around it.

use crate::{FollowError, FollowResult, Point, WarpConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Trait for moving the on-screen pointer (implemented by mff-platform).
pub trait PointerWarper: Send {
    fn warp(&mut self, point: Point) -> FollowResult<()>;

    /// A warp previously reported as `WarpTimedOut` that has since landed.
    fn take_late_landing(&mut self) -> Option<Point> {
        None
    }

    /// Apply new warp tuning.
    fn configure(&mut self, _config: &WarpConfig) {}
}

impl<W: PointerWarper + ?Sized> PointerWarper for Box<W> {
    fn warp(&mut self, point: Point) -> FollowResult<()> {
        (**self).warp(point)
    }

    fn take_late_landing(&mut self) -> Option<Point> {
        (**self).take_late_landing()
    }

    fn configure(&mut self, config: &WarpConfig) {
        (**self).configure(config)
    }
}

/// Runs a warper on its own thread so a stuck host call cannot hold the
/// processing thread for longer than `timeout`.
///
/// A warp that times out keeps running on the worker; until it finishes
/// further warps fail fast instead of queueing behind it.
pub struct BoundedWarper {
    req_tx: Option<Sender<Point>>,
    done_rx: Receiver<FollowResult<()>>,
    timeout: Duration,
    /// Target of a timed-out warp still running on the worker.
    pending: Option<Point>,
    landed: Option<Point>,
    /// Not joined on drop: the host call may never return.
    #[allow(dead_code)]
    thread: Option<JoinHandle<()>>,
}

impl BoundedWarper {
    pub fn spawn<W: PointerWarper + 'static>(mut warper: W, timeout: Duration) -> Self {
        let (req_tx, req_rx) = bounded::<Point>(1);
        let (done_tx, done_rx) = bounded::<FollowResult<()>>(1);

        let thread = thread::spawn(move || {
            debug!("Warp worker thread started");
            while let Ok(point) = req_rx.recv() {
                let result = warper.warp(point);
                if done_tx.send(result).is_err() {
                    break;
                }
            }
            debug!("Warp worker thread exiting");
        });

        Self {
            req_tx: Some(req_tx),
            done_rx,
            timeout,
            pending: None,
            landed: None,
            thread: Some(thread),
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn settle_previous(&mut self) -> FollowResult<()> {
        let Some(point) = self.pending else {
            return Ok(());
        };
        match self.done_rx.try_recv() {
            Ok(Ok(())) => {
                info!(%point, "timed-out warp landed late");
                self.pending = None;
                self.landed = Some(point);
                Ok(())
            }
            Ok(Err(e)) => {
                info!(%point, error = %e, "timed-out warp failed late");
                self.pending = None;
                Ok(())
            }
            Err(_) => Err(FollowError::WarpFailed(
                "previous warp still pending".into(),
            )),
        }
    }
}

impl PointerWarper for BoundedWarper {
    fn warp(&mut self, point: Point) -> FollowResult<()> {
        self.settle_previous()?;
        // A landing nobody asked about is superseded by this warp.
        self.landed = None;

        let Some(req_tx) = self.req_tx.as_ref() else {
            return Err(FollowError::WarpFailed("warp worker stopped".into()));
        };
        req_tx
            .send(point)
            .map_err(|_| FollowError::WarpFailed("warp worker stopped".into()))?;

        match self.done_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                self.pending = Some(point);
                warn!(%point, timeout_ms, "warp timed out");
                Err(FollowError::WarpTimedOut { point, timeout_ms })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(FollowError::WarpFailed("warp worker stopped".into()))
            }
        }
    }

    fn take_late_landing(&mut self) -> Option<Point> {
        let _ = self.settle_previous();
        self.landed.take()
    }

    fn configure(&mut self, config: &WarpConfig) {
        let timeout = Duration::from_millis(config.timeout_ms);
        if timeout != self.timeout {
            debug!(timeout_ms = config.timeout_ms, "warp timeout changed");
            self.set_timeout(timeout);
        }
    }
}

impl Drop for BoundedWarper {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop once it is idle.
        drop(self.req_tx.take());
        let _ = self.thread.take();
    }
}
