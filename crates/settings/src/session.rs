//! Read-only snapshots handed to the catalog fetcher and the authenticator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How requests to the Gameyfin server are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    /// No authentication.
    #[default]
    None,
    /// Forward-auth behind a reverse proxy (Authelia and friends). Requests
    /// carry the session cookie issued by the proxy.
    ForwardAuth,
}

/// Credential state for a single fetch.
///
/// Built fresh from the settings before every fetch, so an expired cookie is
/// never carried over from a previous attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub method: AuthMethod,
    pub cookie_name: String,
    pub cookie_value: String,
    pub server_url: String,
}

impl AuthSession {
    /// Returns true when requests must carry the session cookie.
    pub fn requires_cookie(&self) -> bool {
        self.method == AuthMethod::ForwardAuth
    }

    /// Returns the `Cookie` header value for this session.
    ///
    /// `None` when the method does not use cookies or when the name or value
    /// is still blank (forward-auth login has not completed yet).
    pub fn cookie_header(&self) -> Option<String> {
        if !self.requires_cookie() {
            return None;
        }
        let name = self.cookie_name.trim();
        let value = self.cookie_value.trim();
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some(format!("{name}={value}"))
    }
}

// Cookie values are credentials and must never show up in logs.
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("method", &self.method)
            .field("cookie_name", &self.cookie_name)
            .field(
                "cookie_value",
                &if self.cookie_value.is_empty() {
                    "<empty>"
                } else {
                    "<redacted>"
                },
            )
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Ordered set of platform slugs a game must match to be imported.
///
/// An empty filter imports everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFilter {
    platforms: Vec<String>,
}

impl ImportFilter {
    /// Builds a filter from slugs, keeping first-seen order and dropping
    /// blanks and duplicates.
    pub fn new<I, S>(platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slugs: Vec<String> = Vec::new();
        for p in platforms {
            let p = p.as_ref().trim();
            if !p.is_empty() && !slugs.iter().any(|s| s == p) {
                slugs.push(p.to_string());
            }
        }
        Self { platforms: slugs }
    }

    /// Returns true when the filter imports everything.
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// The configured slugs, in order.
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Returns true if a game with the given platform slugs passes the filter.
    pub fn matches<'a, I>(&self, slugs: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.is_empty() {
            return true;
        }
        slugs
            .into_iter()
            .any(|slug| self.platforms.iter().any(|p| p == slug))
    }
}
