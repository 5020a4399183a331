//! Gameyfin library client.
//!
//! Ties the settings, the forward-auth login and the catalog fetcher together.
//! A host application owns one [`GameyfinLibrary`] and calls
//! [`GameyfinLibrary::get_games`] whenever it imports.

pub mod error;
pub mod library;

pub use error::LibraryError;
pub use library::GameyfinLibrary;
