//! Interactive forward-auth login for Gameyfin.
//!
//! When the Gameyfin server sits behind a forward-auth proxy, the session
//! cookie can only be obtained by logging in through a real browser. This
//! crate drives an embedded [`BrowserSurface`] through that login and
//! extracts the cookie once the surface lands back on the Gameyfin server.
//!
//! The crate has no UI dependency. The host application implements
//! [`SurfaceFactory`] and [`BrowserSurface`] on top of its web view and
//! forwards web view callbacks to the [`SurfaceEvents`] handle it is given.

pub mod authenticator;
pub mod error;
pub mod surface;
pub mod types;

pub use authenticator::CookieAuthenticator;
pub use error::AuthError;
pub use surface::{BrowserSurface, SurfaceCookie, SurfaceError, SurfaceEvents, SurfaceFactory};
pub use types::{AuthOutcome, AuthState, AuthStatus};
