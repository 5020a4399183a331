//! Error types for interactive authentication.
//!
//! Display strings are shown to the user as the failure message.

use crate::surface::SurfaceError;

/// Reasons an authentication attempt fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("another authentication dialog is already open")]
    AlreadyInProgress,

    #[error("interactive authentication is only required for forward-auth")]
    NotForwardAuth,

    #[error("an authentication cookie name is required")]
    MissingCookieName,

    #[error("authentication cookie '{0}' not found")]
    CookieMissing(String),

    #[error("authentication cookie '{0}' was found but is empty")]
    CookieEmpty(String),

    #[error("authentication cookie '{0}' has expired")]
    CookieExpired(String),

    #[error("authentication window was closed before login completed")]
    WindowClosed,

    #[error("authentication was cancelled")]
    Cancelled,

    #[error("browser surface error: {0}")]
    Surface(String),

    #[error("unexpected fault during authentication: {0}")]
    Fault(String),
}

impl From<SurfaceError> for AuthError {
    fn from(err: SurfaceError) -> Self {
        AuthError::Surface(err.0)
    }
}
