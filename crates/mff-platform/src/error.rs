//! Common error types for mff-platform.

use mff_core::FollowError;
use thiserror::Error;

/// Platform-level errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not supported on this platform: {0}")]
    Unsupported(&'static str),
    #[error("warp failed: {0}")]
    WarpFailed(String),
    #[error("registration failed: {0}")]
    RegistrationFailed(String),
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

impl From<PlatformError> for FollowError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::PermissionDenied(msg) => FollowError::PermissionDenied(msg),
            PlatformError::Unsupported(what) => FollowError::Unsupported(what.to_string()),
            PlatformError::WarpFailed(msg) => FollowError::WarpFailed(msg),
            // A refused registration is reported the same way as a refused permission.
            PlatformError::RegistrationFailed(msg) => FollowError::PermissionDenied(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_follow_error() {
        let err: FollowError = PlatformError::RegistrationFailed("hook".into()).into();
        assert!(matches!(err, FollowError::PermissionDenied(_)));

        let err: FollowError = PlatformError::Unsupported("focus").into();
        assert!(matches!(err, FollowError::Unsupported(ref s) if s == "focus"));
    }
}
