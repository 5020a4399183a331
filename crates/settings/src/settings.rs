//! Library settings and their JSON file.
//!
//! Stored at `<config dir>/gameyfin-library/settings.json`. Missing files load
//! as defaults so a fresh install starts with the `win` platform filter and no
//! authentication.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SettingsError;
use crate::session::{AuthMethod, AuthSession, ImportFilter};

/// Platform slugs imported when no filter has been configured yet.
const DEFAULT_IMPORT_PLATFORMS: &[&str] = &["win"];

/// Settings for the Gameyfin library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySettings {
    /// URL of the Gameyfin server to import from.
    #[serde(default)]
    pub gameyfin_url: String,

    /// IGDB platform slugs to import. Empty imports every platform.
    #[serde(default = "default_import_platforms")]
    pub import_platforms: Vec<String>,

    #[serde(default)]
    pub auth_method: AuthMethod,

    /// Name of the cookie issued by the forward-auth proxy.
    #[serde(default)]
    pub auth_cookie_name: String,

    /// Value of the forward-auth cookie, filled in by a successful login.
    #[serde(default)]
    pub auth_cookie_value: String,
}

fn default_import_platforms() -> Vec<String> {
    DEFAULT_IMPORT_PLATFORMS
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            gameyfin_url: String::new(),
            import_platforms: default_import_platforms(),
            auth_method: AuthMethod::None,
            auth_cookie_name: String::new(),
            auth_cookie_value: String::new(),
        }
    }
}

impl LibrarySettings {
    /// Loads settings from `path`, returning defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Writes settings to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        set_permissions_0600(path);
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Default settings file location.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        Ok(config_base_dir()?
            .join("gameyfin-library")
            .join("settings.json"))
    }

    /// The import filter as comma separated text, for editing.
    pub fn platform_filter(&self) -> String {
        self.import_platforms.join(",")
    }

    /// Replaces the import filter from comma separated text.
    ///
    /// Blank text clears the filter.
    pub fn set_platform_filter(&mut self, text: &str) {
        let text = text.trim();
        self.import_platforms = if text.is_empty() {
            Vec::new()
        } else {
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };
    }

    /// Checks the settings and returns human readable problems, if any.
    pub fn verify(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let url = self.gameyfin_url.trim();
        if url.is_empty() {
            errors.push("A Gameyfin server URL is required".to_string());
        } else {
            match url::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => errors.push(format!("{url} is not a valid URL")),
            }
        }

        if self.auth_method == AuthMethod::ForwardAuth && self.auth_cookie_name.trim().is_empty()
        {
            errors.push("An authentication cookie name is required for forward-auth".to_string());
        }

        if !errors.is_empty() {
            warn!(count = errors.len(), "settings verification failed");
        }
        errors
    }

    /// Snapshot of the credential state for one fetch.
    pub fn session(&self) -> AuthSession {
        AuthSession {
            method: self.auth_method,
            cookie_name: self.auth_cookie_name.clone(),
            cookie_value: self.auth_cookie_value.clone(),
            server_url: self.gameyfin_url.trim().to_string(),
        }
    }

    /// Snapshot of the platform import filter.
    pub fn import_filter(&self) -> ImportFilter {
        ImportFilter::new(&self.import_platforms)
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

fn config_base_dir() -> Result<PathBuf, SettingsError> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(SettingsError::NoConfigDir)
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Library").join("Application Support"))
            .ok_or(SettingsError::NoConfigDir)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(xdg));
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or(SettingsError::NoConfigDir)
    }
}
