//! Observable authentication state.

use crate::error::AuthError;

/// Result of the most recent authentication attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No attempt has finished yet.
    #[default]
    Pending,
    /// Login completed; carries the cookie value.
    Success(String),
    /// Login failed; the error's display string is the user-facing message.
    Failure(AuthError),
}

impl AuthOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthOutcome::Pending)
    }
}

/// Snapshot published by the authenticator after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStatus {
    /// True while a browser surface is held for an attempt.
    pub in_progress: bool,
    pub outcome: AuthOutcome,
}

/// State machine view of an [`AuthStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    InProgress,
    Success(String),
    Failure(String),
}

impl AuthStatus {
    pub fn state(&self) -> AuthState {
        match &self.outcome {
            AuthOutcome::Success(cookie) => AuthState::Success(cookie.clone()),
            AuthOutcome::Failure(err) => AuthState::Failure(err.to_string()),
            AuthOutcome::Pending if self.in_progress => AuthState::InProgress,
            AuthOutcome::Pending => AuthState::Idle,
        }
    }
}
