//! API response types for the Gameyfin `/v1/games` endpoint.

use serde::{Deserialize, Deserializer, Serialize};

/// A game as returned by the Gameyfin server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGame {
    pub slug: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default)]
    pub user_rating: Option<u32>,
    #[serde(default)]
    pub critics_rating: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cover_id: String,
    /// Set once the server operator has verified the IGDB match.
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmed_match: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub offline_coop: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub online_coop: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lan_support: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub library: LibraryDetails,
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_perspectives: Vec<SlugAndName>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<SlugAndName>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub companies: Vec<SlugNameAndLogo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<SlugNameAndLogo>,
}

impl RemoteGame {
    /// Platform slugs of the library the game was found in.
    pub fn library_platform_slugs(&self) -> impl Iterator<Item = &str> {
        self.library.platforms.iter().map(|p| p.slug.as_str())
    }
}

/// The Gameyfin library a game lives in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<SlugNameAndLogo>,
}

/// IGDB descriptor such as a genre or player perspective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugAndName {
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// IGDB descriptor that also carries a logo, used for companies and platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugNameAndLogo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo_id: String,
}

// Gameyfin emits explicit nulls for unknown values.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
