//! Gameyfin library settings.
//!
//! Holds the server address, the authentication configuration and the
//! platform import filter. Consumers never mutate a live settings value while
//! it is in use; they take [`AuthSession`] and [`ImportFilter`] snapshots
//! instead.

pub mod error;
pub mod session;
pub mod settings;

pub use error::SettingsError;
pub use session::{AuthMethod, AuthSession, ImportFilter};
pub use settings::LibrarySettings;
