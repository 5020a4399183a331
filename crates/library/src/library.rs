//! Library client facade.
//!
//! Owns the settings and the optional interactive authenticator. Each import
//! takes a fresh settings snapshot and builds a new [`GameFetcher`], so a
//! cookie harvested by a login in between is always picked up.

use std::path::PathBuf;

use gameyfin_auth::{AuthOutcome, CookieAuthenticator};
use gameyfin_catalog::{GameFetcher, GameMetadata};
use gameyfin_settings::LibrarySettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::LibraryError;

pub struct GameyfinLibrary {
    settings: LibrarySettings,
    settings_path: Option<PathBuf>,
    http: reqwest::Client,
    authenticator: Option<CookieAuthenticator>,
}

impl GameyfinLibrary {
    /// Creates a library client.
    ///
    /// Without an authenticator, forward-auth imports rely on the cookie
    /// already stored in `settings`.
    pub fn new(
        settings: LibrarySettings,
        http: reqwest::Client,
        authenticator: Option<CookieAuthenticator>,
    ) -> Self {
        Self {
            settings,
            settings_path: None,
            http,
            authenticator,
        }
    }

    /// Saves the settings to `path` whenever a login stores a new cookie.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &LibrarySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut LibrarySettings {
        &mut self.settings
    }

    pub fn authenticator(&self) -> Option<&CookieAuthenticator> {
        self.authenticator.as_ref()
    }

    /// The Gameyfin web UI address, for opening in an external browser.
    pub fn home_url(&self) -> Option<String> {
        let url = self.settings.gameyfin_url.trim().trim_end_matches('/');
        (!url.is_empty()).then(|| url.to_string())
    }

    /// True when forward-auth is configured but no cookie has been stored yet.
    pub fn needs_login(&self) -> bool {
        let session = self.settings.session();
        session.requires_cookie() && session.cookie_value.trim().is_empty()
    }

    /// Runs the interactive login and stores the harvested cookie.
    pub async fn authenticate(&mut self) -> Result<(), LibraryError> {
        self.authenticate_until(&CancellationToken::new()).await
    }

    async fn authenticate_until(&mut self, cancel: &CancellationToken) -> Result<(), LibraryError> {
        let authenticator = self
            .authenticator
            .as_ref()
            .ok_or(LibraryError::NoAuthenticator)?;

        authenticator.start_login(&self.settings.session())?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                authenticator.abort();
                return Err(LibraryError::Cancelled);
            }
            outcome = authenticator.wait_for_outcome() => outcome,
        };

        match outcome {
            AuthOutcome::Success(cookie) => {
                self.settings.auth_cookie_value = cookie;
                info!(cookie = %self.settings.auth_cookie_name, "stored forward-auth cookie");
                self.persist()
            }
            AuthOutcome::Failure(err) => {
                warn!(error = %err, "forward-auth login failed");
                Err(LibraryError::AuthFailed(err.to_string()))
            }
            AuthOutcome::Pending => Err(LibraryError::AuthFailed(
                "login ended without an outcome".to_string(),
            )),
        }
    }

    fn persist(&self) -> Result<(), LibraryError> {
        if let Some(path) = &self.settings_path {
            self.settings.save(path)?;
            debug!(path = %path.display(), "settings persisted after login");
        }
        Ok(())
    }

    /// Imports the catalog.
    ///
    /// Logs in first when forward-auth has no cookie yet and an authenticator
    /// is available. Cancelling `cancel` aborts the login or the fetch.
    pub async fn get_games(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Vec<GameMetadata>, LibraryError> {
        if self.needs_login() && self.authenticator.is_some() {
            debug!("no forward-auth cookie stored, starting login");
            self.authenticate_until(cancel).await?;
        }

        let fetcher = GameFetcher::new(
            self.http.clone(),
            self.settings.session(),
            self.settings.import_filter(),
        );
        Ok(fetcher.fetch_games(cancel).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use gameyfin_auth::{
        AuthError, BrowserSurface, SurfaceCookie, SurfaceError, SurfaceEvents, SurfaceFactory,
    };
    use gameyfin_catalog::CatalogError;
    use gameyfin_settings::AuthMethod;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const GAMES_JSON: &str = r#"[
        {"slug":"hades","title":"Hades","releaseDate":"2020-09-17","confirmedMatch":true,
         "library":{"path":"/pc","platforms":[{"slug":"win","name":"PC (Microsoft Windows)"}]}},
        {"slug":"celeste","title":"Celeste","releaseDate":"2018-01-25","confirmedMatch":true,
         "library":{"path":"/switch","platforms":[{"slug":"switch","name":"Nintendo Switch"}]}}
    ]"#;

    /// Answers one request with `200 OK` and `body`; yields the request text.
    async fn mock_server(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            let resp = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        (url, handle)
    }

    /// Surface that lands on the requested page as soon as it is shown.
    struct InstantLoginSurface {
        address: Mutex<String>,
        cookie: Option<SurfaceCookie>,
        events: SurfaceEvents,
        completes: bool,
    }

    impl BrowserSurface for InstantLoginSurface {
        fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
            *self.address.lock().unwrap() = url.to_string();
            Ok(())
        }

        fn open_dialog(&self) -> Result<(), SurfaceError> {
            if self.completes {
                self.events.loading_changed(true);
                self.events.loading_changed(false);
            }
            Ok(())
        }

        fn current_address(&self) -> Result<String, SurfaceError> {
            Ok(self.address.lock().unwrap().clone())
        }

        fn cookies(&self) -> Result<Vec<SurfaceCookie>, SurfaceError> {
            Ok(self.cookie.iter().cloned().collect())
        }

        fn close(&self) -> Result<(), SurfaceError> {
            self.events.closed();
            Ok(())
        }

        fn dispose(&self) {}
    }

    struct InstantLoginFactory {
        cookie: Option<SurfaceCookie>,
        completes: bool,
    }

    impl SurfaceFactory for InstantLoginFactory {
        fn create_surface(
            &self,
            _width: u32,
            _height: u32,
            events: SurfaceEvents,
        ) -> Result<Arc<dyn BrowserSurface>, SurfaceError> {
            Ok(Arc::new(InstantLoginSurface {
                address: Mutex::new(String::new()),
                cookie: self.cookie.clone(),
                events,
                completes: self.completes,
            }))
        }
    }

    fn authenticator(cookie: Option<&str>, completes: bool) -> CookieAuthenticator {
        let factory = InstantLoginFactory {
            cookie: cookie.map(|value| SurfaceCookie {
                name: "authelia_session".into(),
                value: value.into(),
                expires: None,
            }),
            completes,
        };
        CookieAuthenticator::new(Arc::new(factory), tokio::runtime::Handle::current())
    }

    fn settings(url: &str, method: AuthMethod) -> LibrarySettings {
        LibrarySettings {
            gameyfin_url: url.to_string(),
            import_platforms: Vec::new(),
            auth_method: method,
            auth_cookie_name: "authelia_session".into(),
            auth_cookie_value: String::new(),
        }
    }

    #[tokio::test]
    async fn open_server_imports_without_login() {
        let (url, handle) = mock_server(GAMES_JSON).await;
        let mut library = GameyfinLibrary::new(
            settings(&url, AuthMethod::None),
            reqwest::Client::new(),
            Some(authenticator(None, false)),
        );

        let games = library.get_games(&CancellationToken::new()).await.unwrap();
        assert_eq!(games.len(), 2);
        assert!(!library.authenticator().unwrap().in_progress());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn forward_auth_logs_in_then_sends_cookie() {
        let (url, handle) = mock_server(GAMES_JSON).await;
        let mut library = GameyfinLibrary::new(
            settings(&url, AuthMethod::ForwardAuth),
            reqwest::Client::new(),
            Some(authenticator(Some("s3cr3t"), true)),
        );
        assert!(library.needs_login());

        let games = library.get_games(&CancellationToken::new()).await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(library.settings().auth_cookie_value, "s3cr3t");
        assert!(!library.needs_login());

        let request = handle.await.unwrap().to_lowercase();
        assert!(request.contains("cookie: authelia_session=s3cr3t"));
    }

    #[tokio::test]
    async fn stored_cookie_skips_login() {
        let (url, handle) = mock_server("[]").await;
        let mut s = settings(&url, AuthMethod::ForwardAuth);
        s.auth_cookie_value = "cached".into();
        // A login here would fail: the surface has no cookie.
        let mut library =
            GameyfinLibrary::new(s, reqwest::Client::new(), Some(authenticator(None, true)));

        let games = library.get_games(&CancellationToken::new()).await.unwrap();
        assert!(games.is_empty());

        let request = handle.await.unwrap().to_lowercase();
        assert!(request.contains("cookie: authelia_session=cached"));
    }

    #[tokio::test]
    async fn failed_login_aborts_import() {
        let mut library = GameyfinLibrary::new(
            settings("http://127.0.0.1:9", AuthMethod::ForwardAuth),
            reqwest::Client::new(),
            Some(authenticator(None, true)),
        );

        let err = library.get_games(&CancellationToken::new()).await.unwrap_err();
        match err {
            LibraryError::AuthFailed(msg) => assert!(msg.contains("not found")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(library.settings().auth_cookie_value.is_empty());
    }

    #[tokio::test]
    async fn forward_auth_without_authenticator_needs_cookie() {
        let mut library = GameyfinLibrary::new(
            settings("http://127.0.0.1:9", AuthMethod::ForwardAuth),
            reqwest::Client::new(),
            None,
        );

        let err = library.get_games(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            LibraryError::Catalog(CatalogError::MissingCredential(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_without_authenticator_fails() {
        let mut library = GameyfinLibrary::new(
            settings("http://127.0.0.1:9", AuthMethod::ForwardAuth),
            reqwest::Client::new(),
            None,
        );
        assert!(matches!(
            library.authenticate().await,
            Err(LibraryError::NoAuthenticator)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_non_forward_auth() {
        let mut library = GameyfinLibrary::new(
            settings("http://127.0.0.1:9", AuthMethod::None),
            reqwest::Client::new(),
            Some(authenticator(Some("x"), true)),
        );
        assert!(matches!(
            library.authenticate().await,
            Err(LibraryError::Auth(AuthError::NotForwardAuth))
        ));
    }

    #[tokio::test]
    async fn cancel_during_login_closes_surface() {
        let mut library = GameyfinLibrary::new(
            settings("http://127.0.0.1:9", AuthMethod::ForwardAuth),
            reqwest::Client::new(),
            Some(authenticator(None, false)),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = library.get_games(&cancel).await.unwrap_err();
        assert!(matches!(err, LibraryError::Cancelled));
        let auth = library.authenticator().unwrap();
        assert!(!auth.in_progress());
        assert_eq!(
            auth.status().outcome,
            gameyfin_auth::AuthOutcome::Failure(AuthError::Cancelled)
        );
    }

    #[tokio::test]
    async fn login_persists_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut library = GameyfinLibrary::new(
            settings("https://games.example.com", AuthMethod::ForwardAuth),
            reqwest::Client::new(),
            Some(authenticator(Some("fresh"), true)),
        )
        .with_settings_path(&path);

        library.authenticate().await.unwrap();

        let saved = LibrarySettings::load(&path).unwrap();
        assert_eq!(saved.auth_cookie_value, "fresh");
        assert_eq!(saved.auth_method, AuthMethod::ForwardAuth);
    }

    #[test]
    fn home_url_trims_slashes() {
        let library = GameyfinLibrary::new(
            settings(" https://games.example.com/ ", AuthMethod::None),
            reqwest::Client::new(),
            None,
        );
        assert_eq!(
            library.home_url().as_deref(),
            Some("https://games.example.com")
        );

        let empty = GameyfinLibrary::new(
            settings("", AuthMethod::None),
            reqwest::Client::new(),
            None,
        );
        assert_eq!(empty.home_url(), None);
    }
}
