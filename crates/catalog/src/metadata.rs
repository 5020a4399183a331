//! Mapping from Gameyfin records to library metadata.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;

use crate::error::CatalogError;
use crate::types::RemoteGame;

/// Source name attached to every imported game.
pub const SOURCE_NAME: &str = "Gameyfin";

const FEATURE_ONLINE_COOP: &str = "Online Co-Op";
const FEATURE_OFFLINE_COOP: &str = "Offline Co-Op";
const FEATURE_LAN: &str = "LAN Support";

/// Characters escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Kind of action attached to a library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameActionType {
    /// Opens a URL.
    Url,
}

/// An action the library offers for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    pub name: String,
    pub action_type: GameActionType,
    pub path: String,
    pub is_play_action: bool,
}

/// Normalized metadata for one imported game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMetadata {
    pub source: String,
    pub name: String,
    pub game_id: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub user_score: Option<u32>,
    pub critic_score: Option<u32>,
    pub genres: BTreeSet<String>,
    pub platforms: BTreeSet<String>,
    pub features: BTreeSet<String>,
    pub developers: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub is_installed: bool,
    pub game_actions: Vec<GameAction>,
}

impl GameMetadata {
    /// Maps a confirmed Gameyfin record. `base_url` is the server URL.
    ///
    /// Fails if the release date cannot be parsed.
    pub fn from_remote(game: RemoteGame, base_url: &str) -> Result<Self, CatalogError> {
        let release_date = parse_release_date(&game.release_date).ok_or_else(|| {
            CatalogError::DateParseFailed {
                slug: game.slug.clone(),
                value: game.release_date.clone(),
            }
        })?;

        let features = features(&game);
        let cover_image = (!game.cover_id.is_empty()).then(|| image_url(base_url, &game.cover_id));
        let download = GameAction {
            name: "Download".into(),
            action_type: GameActionType::Url,
            path: download_url(base_url, &game.slug),
            is_play_action: false,
        };

        Ok(Self {
            source: SOURCE_NAME.into(),
            name: game.title,
            game_id: game.slug,
            description: game.summary,
            release_date,
            user_score: game.user_rating,
            critic_score: game.critics_rating,
            genres: game.genres.into_iter().map(|g| g.name).collect(),
            platforms: game.library.platforms.into_iter().map(|p| p.name).collect(),
            features,
            developers: game.companies.into_iter().map(|c| c.name).collect(),
            cover_image,
            is_installed: false,
            game_actions: vec![download],
        })
    }
}

/// Co-op and LAN flags plus every player perspective.
fn features(game: &RemoteGame) -> BTreeSet<String> {
    let flags = [
        (game.online_coop, FEATURE_ONLINE_COOP),
        (game.offline_coop, FEATURE_OFFLINE_COOP),
        (game.lan_support, FEATURE_LAN),
    ];
    flags
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, label)| label.to_string())
        .chain(game.player_perspectives.iter().map(|p| p.name.clone()))
        .collect()
}

/// Parses a Gameyfin release date.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamps
/// and plain `YYYY-MM-DD` dates.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// `{base}/v1/images/{id}`
pub fn image_url(base_url: &str, image_id: &str) -> String {
    format!(
        "{}/v1/images/{}",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(image_id, PATH_SEGMENT)
    )
}

/// `{base}/v1/games/game/{slug}/download`
pub fn download_url(base_url: &str, slug: &str) -> String {
    format!(
        "{}/v1/games/game/{}/download",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(slug, PATH_SEGMENT)
    )
}
