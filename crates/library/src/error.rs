use gameyfin_auth::AuthError;
use gameyfin_catalog::CatalogError;
use gameyfin_settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("forward-auth login requires an interactive browser surface")]
    NoAuthenticator,

    #[error("operation cancelled")]
    Cancelled,
}
