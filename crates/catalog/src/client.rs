//! Gameyfin catalog fetcher.
//!
//! One GET against `/v1/games` per call. The forward-auth cookie is attached
//! to that request only; the underlying `reqwest::Client` has no cookie jar,
//! so a cookie from an earlier attempt can never leak into a later one.

use gameyfin_settings::{AuthSession, ImportFilter};
use reqwest::header::{COOKIE, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::metadata::GameMetadata;
use crate::types::RemoteGame;

const GAMES_ENDPOINT: &str = "/v1/games";

/// Fetches games from a Gameyfin server.
///
/// Session and filter are snapshots taken at construction. Build a new fetcher
/// for every import so a refreshed cookie is picked up.
pub struct GameFetcher {
    http: reqwest::Client,
    session: AuthSession,
    filter: ImportFilter,
}

impl GameFetcher {
    /// Creates a fetcher sharing the given HTTP client.
    pub fn new(http: reqwest::Client, session: AuthSession, filter: ImportFilter) -> Self {
        Self {
            http,
            session,
            filter,
        }
    }

    /// Base URL without surrounding whitespace or trailing slashes.
    fn base_url(&self) -> &str {
        self.session.server_url.trim().trim_end_matches('/')
    }

    /// Fetches, filters and maps the catalog.
    ///
    /// Cancelling `cancel` aborts the network call and returns
    /// [`CatalogError::Cancelled`]. Filtering and mapping run to completion
    /// once the body has been received.
    pub async fn fetch_games(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<GameMetadata>, CatalogError> {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("game fetch cancelled");
                return Err(CatalogError::Cancelled);
            }
            body = self.get_games_body() => body?,
        };

        let games = games_from_json(&body, self.base_url(), &self.filter)?;
        info!(count = games.len(), "imported games from Gameyfin");
        Ok(games)
    }

    /// Sends the request and returns the raw body of a successful response.
    async fn get_games_body(&self) -> Result<Vec<u8>, CatalogError> {
        let url = format!("{}{}", self.base_url(), GAMES_ENDPOINT);
        let mut request = self.http.get(&url);

        if self.session.requires_cookie() {
            let header = self
                .session
                .cookie_header()
                .ok_or_else(|| CatalogError::MissingCredential(self.session.cookie_name.clone()))?;
            let value = HeaderValue::from_str(&header)
                .map_err(|_| CatalogError::InvalidCookie(self.session.cookie_name.clone()))?;
            request = request.header(COOKIE, value);
        }

        debug!(url = %url, method = ?self.session.method, "fetching games");
        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            warn!(status = status.as_u16(), "game fetch rejected by server");
            return Err(CatalogError::RemoteRequestFailed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// Parses a `/v1/games` body and maps the games that pass the filters.
///
/// Unconfirmed matches are always dropped; `filter` applies afterwards when
/// non-empty. Any malformed record aborts the whole batch.
pub fn games_from_json(
    body: &[u8],
    base_url: &str,
    filter: &ImportFilter,
) -> Result<Vec<GameMetadata>, CatalogError> {
    let games: Vec<RemoteGame> = serde_json::from_slice(body)?;
    let total = games.len();

    let selected = select_games(games, filter);
    debug!(total, selected = selected.len(), "filtered games");

    selected
        .into_iter()
        .map(|game| GameMetadata::from_remote(game, base_url))
        .collect()
}

/// Drops unconfirmed matches and games outside the import filter.
pub fn select_games(games: Vec<RemoteGame>, filter: &ImportFilter) -> Vec<RemoteGame> {
    games
        .into_iter()
        .filter(|game| game.confirmed_match)
        .filter(|game| filter.matches(game.library_platform_slugs()))
        .collect()
}
