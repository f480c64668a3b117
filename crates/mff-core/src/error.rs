//! Error taxonomy for the focus-follow core.

use crate::Point;
use thiserror::Error;

/// Core-level errors.
///
/// None of these are fatal: the engine always lands back in `Idle` or
/// `Disabled` after handling one. Only `PermissionDenied` is meant to reach
/// the user.
#[derive(Debug, Error)]
pub enum FollowError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("point {point} is outside all known displays")]
    OutOfBounds { point: Point },
    #[error("pointer warp failed: {0}")]
    WarpFailed(String),
    /// The host call did not return in time and may still move the pointer.
    #[error("pointer warp to {point} timed out after {timeout_ms}ms")]
    WarpTimedOut { point: Point, timeout_ms: u64 },
    #[error("recording sink unavailable: {0}")]
    SinkUnavailable(String),
    #[error("focus source unsupported on this platform: {0}")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type FollowResult<T> = Result<T, FollowError>;
