//! Error types for catalog fetching.

/// Errors produced while fetching the Gameyfin catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to fetch games from Gameyfin failed with response code {status} ({reason})")]
    RemoteRequestFailed { status: u16, reason: String },

    #[error("failed to parse the games response from Gameyfin: {0}")]
    ResponseParseFailed(#[from] serde_json::Error),

    #[error("game '{slug}' has an invalid release date '{value}'")]
    DateParseFailed { slug: String, value: String },

    #[error("forward-auth cookie '{0}' has no value, log in first")]
    MissingCredential(String),

    #[error("forward-auth cookie '{0}' is not a valid header value")]
    InvalidCookie(String),

    #[error("cancelled")]
    Cancelled,
}
