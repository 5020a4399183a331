//! Gameyfin API client for catalog import.
//!
//! Fetches the game list from a Gameyfin server, drops unconfirmed matches and
//! games outside the platform import filter, and maps every remaining record
//! into [`GameMetadata`] for the local library.
//!
//! Every error aborts the whole fetch. No partial catalogs are returned.

pub mod client;
pub mod error;
pub mod metadata;
pub mod types;

pub use client::{GameFetcher, games_from_json, select_games};
pub use error::CatalogError;
pub use metadata::{GameAction, GameActionType, GameMetadata, SOURCE_NAME};
pub use types::{LibraryDetails, RemoteGame, SlugAndName, SlugNameAndLogo};
