//! Headless Gameyfin import.
//!
//! Usage: `gameyfin-sync [SETTINGS_PATH]`
//!
//! Loads the library settings, fetches the catalog and writes it to stdout as
//! JSON. Logs go to stderr. Forward-auth servers need a cookie already stored
//! in the settings file since there is no browser to log in with.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use gameyfin_library::GameyfinLibrary;
use gameyfin_settings::LibrarySettings;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting gameyfin-sync");

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => LibrarySettings::default_path().context("cannot locate settings directory")?,
    };
    if !path.exists() {
        tracing::warn!(path = %path.display(), "settings file not found, using defaults");
    }
    let settings = LibrarySettings::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;

    let problems = settings.verify();
    if !problems.is_empty() {
        bail!("invalid settings:\n  {}", problems.join("\n  "));
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling import");
            on_signal.cancel();
        }
    });

    let mut library = GameyfinLibrary::new(settings, reqwest::Client::new(), None);
    let games = library
        .get_games(&cancel)
        .await
        .context("failed to import games from Gameyfin")?;
    tracing::info!(count = games.len(), "import finished");

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &games)?;
    writeln!(stdout)?;
    Ok(())
}
