//! Browser surface capability used by the authenticator.
//!
//! Web views commonly deliver their callbacks on a UI thread and deadlock if
//! the callback queries the web view synchronously. [`SurfaceEvents`] therefore
//! only queues the event and returns; all querying happens later on the
//! authenticator's event task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Error reported by a browser surface implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// A cookie read from the surface's cookie jar.
#[derive(Clone, PartialEq, Eq)]
pub struct SurfaceCookie {
    pub name: String,
    pub value: String,
    /// `None` for session cookies.
    pub expires: Option<DateTime<Utc>>,
}

impl SurfaceCookie {
    /// Returns true if the cookie expired at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expiry| expiry <= now)
    }
}

impl std::fmt::Debug for SurfaceCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("expires", &self.expires)
            .finish()
    }
}

/// An embedded, programmatically controllable web view.
///
/// Implementations must not block: `open_dialog` shows the window and returns.
/// `close` may be followed by a [`SurfaceEvents::closed`] notification; the
/// authenticator tolerates either order and disposes exactly once.
pub trait BrowserSurface: Send + Sync {
    /// Starts navigation to `url`.
    fn navigate(&self, url: &str) -> Result<(), SurfaceError>;

    /// Shows the surface to the user.
    fn open_dialog(&self) -> Result<(), SurfaceError>;

    /// Address of the page currently displayed.
    fn current_address(&self) -> Result<String, SurfaceError>;

    /// Cookies visible to the current page.
    fn cookies(&self) -> Result<Vec<SurfaceCookie>, SurfaceError>;

    /// Closes the window.
    fn close(&self) -> Result<(), SurfaceError>;

    /// Releases every resource held by the surface.
    fn dispose(&self);
}

/// Creates one surface per authentication attempt.
pub trait SurfaceFactory: Send + Sync {
    /// Creates a surface of the given size that reports its callbacks to `events`.
    fn create_surface(
        &self,
        width: u32,
        height: u32,
        events: SurfaceEvents,
    ) -> Result<Arc<dyn BrowserSurface>, SurfaceError>;
}

/// Callback events queued by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceEvent {
    LoadingChanged { is_loading: bool },
    Closed,
}

/// Handle a surface uses to report its callbacks.
///
/// Every method only queues the event, so it is safe to call from inside a
/// web view callback on any thread.
#[derive(Debug, Clone)]
pub struct SurfaceEvents {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl SurfaceEvents {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Page loading started (`true`) or finished (`false`).
    pub fn loading_changed(&self, is_loading: bool) {
        // The attempt may already be over; late events are dropped.
        let _ = self.tx.send(SurfaceEvent::LoadingChanged { is_loading });
    }

    /// The surface window was closed, by the user or by [`BrowserSurface::close`].
    pub fn closed(&self) {
        let _ = self.tx.send(SurfaceEvent::Closed);
    }
}
