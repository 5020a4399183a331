//! Forward-auth cookie authenticator.
//!
//! One attempt at a time. An attempt opens a browser surface on the Gameyfin
//! URL, lets the user walk through the proxy's login pages and, on the first
//! completed page load back on the Gameyfin server, reads the session cookie.
//!
//! Surface callbacks only queue events (see [`SurfaceEvents`]). A task spawned
//! on the runtime handle given at construction drains the queue in delivery
//! order and is the only place the surface is queried while the attempt runs.
//!
//! Whatever ends the attempt (success, failure, the user closing the window,
//! [`CookieAuthenticator::abort`]) converges on a single teardown that takes
//! the surface out of its slot, so disposal happens exactly once.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use gameyfin_settings::{AuthMethod, AuthSession};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::surface::{BrowserSurface, SurfaceEvent, SurfaceEvents, SurfaceFactory};
use crate::types::{AuthOutcome, AuthState, AuthStatus};

/// Login dialog size.
const SURFACE_WIDTH: u32 = 400;
const SURFACE_HEIGHT: u32 = 445;

/// Interactive authenticator for forward-auth protected Gameyfin servers.
///
/// Owned by the caller. Dropping it tears down any open surface.
pub struct CookieAuthenticator {
    factory: Arc<dyn SurfaceFactory>,
    runtime: Handle,
    shared: Arc<Shared>,
    next_attempt: AtomicU64,
}

impl CookieAuthenticator {
    /// Creates an authenticator. `runtime` must be the runtime the surface's
    /// events are handled on.
    pub fn new(factory: Arc<dyn SurfaceFactory>, runtime: Handle) -> Self {
        let (status, _) = watch::channel(AuthStatus::default());
        Self {
            factory,
            runtime,
            shared: Arc::new(Shared {
                status,
                slot: Mutex::new(Slot::Idle),
            }),
            next_attempt: AtomicU64::new(0),
        }
    }

    /// Current status snapshot.
    pub fn status(&self) -> AuthStatus {
        self.shared.status.borrow().clone()
    }

    pub fn state(&self) -> AuthState {
        self.status().state()
    }

    /// True while a surface is held for an attempt.
    pub fn in_progress(&self) -> bool {
        self.shared.status.borrow().in_progress
    }

    /// Subscribes to status changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.shared.status.subscribe()
    }

    /// Waits until no attempt is in progress and returns the last outcome.
    pub async fn wait_for_outcome(&self) -> AuthOutcome {
        let mut rx = self.shared.status.subscribe();
        match rx.wait_for(|status| !status.in_progress).await {
            Ok(status) => status.outcome.clone(),
            Err(_) => AuthOutcome::Pending,
        }
    }

    /// Opens a login surface for `session` and returns immediately.
    ///
    /// Rejected with [`AuthError::AlreadyInProgress`] while another attempt
    /// holds a surface; the running attempt is left alone. Every other error is
    /// also published as the attempt's failure outcome.
    pub fn start_login(&self, session: &AuthSession) -> Result<(), AuthError> {
        let id = self.next_attempt.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut slot = self.shared.slot();
            if !matches!(*slot, Slot::Idle) {
                warn!("authentication dialog already open");
                return Err(AuthError::AlreadyInProgress);
            }
            *slot = Slot::Starting(id);
            // Published under the slot lock so a concurrent teardown cannot
            // interleave with it.
            self.shared.status.send_replace(AuthStatus {
                in_progress: true,
                outcome: AuthOutcome::Pending,
            });
        }

        info!(attempt = id, server = %session.server_url, "starting forward-auth login");

        match self.open_surface(id, session) {
            Ok((stop, events)) => {
                self.runtime
                    .spawn(run_events(Arc::clone(&self.shared), id, stop, events));
                Ok(())
            }
            Err(err) => {
                self.shared.fail(id, err.clone());
                Err(err)
            }
        }
    }

    fn open_surface(
        &self,
        id: u64,
        session: &AuthSession,
    ) -> Result<(CancellationToken, mpsc::UnboundedReceiver<SurfaceEvent>), AuthError> {
        if session.method != AuthMethod::ForwardAuth {
            return Err(AuthError::NotForwardAuth);
        }
        if session.cookie_name.trim().is_empty() {
            return Err(AuthError::MissingCookieName);
        }

        let (events, rx) = SurfaceEvents::channel();
        let surface = guarded(|| {
            Ok(self
                .factory
                .create_surface(SURFACE_WIDTH, SURFACE_HEIGHT, events)?)
        })?;

        let stop = CancellationToken::new();
        let attempt = Attempt {
            id,
            surface: Arc::clone(&surface),
            session: session.clone(),
            stop: stop.clone(),
        };
        if let Err(attempt) = self.shared.install(attempt) {
            // Aborted while the surface was being created.
            release(&attempt, false);
            return Err(AuthError::Cancelled);
        }

        guarded(|| {
            surface.navigate(&session.server_url)?;
            surface.open_dialog()?;
            Ok(())
        })?;

        Ok((stop, rx))
    }

    /// Closes the login surface of the running attempt, if any.
    ///
    /// An attempt without an outcome yet ends with [`AuthError::Cancelled`].
    /// Safe to call any number of times.
    pub fn abort(&self) -> bool {
        let id = match &*self.shared.slot() {
            Slot::Idle => return false,
            Slot::Starting(id) => *id,
            Slot::Active(attempt) => attempt.id,
        };
        if self
            .shared
            .conclude(id, AuthOutcome::Failure(AuthError::Cancelled))
        {
            info!(attempt = id, "forward-auth login aborted");
        }
        self.shared.teardown(id, true);
        true
    }
}

impl Drop for CookieAuthenticator {
    fn drop(&mut self) {
        self.abort();
    }
}

/// The surface slot. At most one attempt owns it.
enum Slot {
    Idle,
    /// Reserved while the surface is being created.
    Starting(u64),
    Active(Attempt),
}

impl Slot {
    fn owned_by(&self, id: u64) -> bool {
        match self {
            Slot::Idle => false,
            Slot::Starting(owner) => *owner == id,
            Slot::Active(attempt) => attempt.id == id,
        }
    }
}

struct Attempt {
    id: u64,
    surface: Arc<dyn BrowserSurface>,
    session: AuthSession,
    stop: CancellationToken,
}

struct Shared {
    status: watch::Sender<AuthStatus>,
    slot: Mutex<Slot>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn install(&self, attempt: Attempt) -> Result<(), Attempt> {
        let mut slot = self.slot();
        if matches!(*slot, Slot::Starting(id) if id == attempt.id) {
            *slot = Slot::Active(attempt);
            Ok(())
        } else {
            Err(attempt)
        }
    }

    fn active(&self, id: u64) -> Option<(Arc<dyn BrowserSurface>, AuthSession)> {
        match &*self.slot() {
            Slot::Active(attempt) if attempt.id == id => {
                Some((Arc::clone(&attempt.surface), attempt.session.clone()))
            }
            _ => None,
        }
    }

    /// Records the attempt's outcome. Only the first outcome of the attempt
    /// that currently owns the slot is kept.
    fn conclude(&self, id: u64, outcome: AuthOutcome) -> bool {
        let slot = self.slot();
        if !slot.owned_by(id) {
            return false;
        }
        self.status.send_if_modified(|status| {
            if status.outcome.is_terminal() {
                return false;
            }
            status.outcome = outcome;
            true
        })
    }

    fn fail(&self, id: u64, err: AuthError) {
        if self.conclude(id, AuthOutcome::Failure(err.clone())) {
            warn!(attempt = id, error = %err, "forward-auth login failed");
        }
        self.teardown(id, true);
    }

    /// Releases the attempt's surface and clears `in_progress`.
    ///
    /// No-op unless `id` still owns the slot, which makes repeated calls from
    /// different teardown paths harmless. `in_progress` is cleared together
    /// with freeing the slot; the surface is closed after the lock is dropped,
    /// so a new attempt may already be running while it is disposed.
    fn teardown(&self, id: u64, close_window: bool) {
        let taken = {
            let mut slot = self.slot();
            if !slot.owned_by(id) {
                return;
            }
            self.status.send_modify(|status| status.in_progress = false);
            std::mem::replace(&mut *slot, Slot::Idle)
        };

        if let Slot::Active(attempt) = taken {
            attempt.stop.cancel();
            release(&attempt, close_window);
            debug!(attempt = id, "login surface disposed");
        }
    }

    fn page_loaded(&self, id: u64) {
        if self.status.borrow().outcome.is_terminal() {
            return;
        }
        let Some((surface, session)) = self.active(id) else {
            return;
        };

        match guarded(|| read_session_cookie(surface.as_ref(), &session)) {
            Ok(None) => debug!(attempt = id, "page loaded outside the Gameyfin server"),
            Ok(Some(cookie)) => {
                if self.conclude(id, AuthOutcome::Success(cookie)) {
                    info!(attempt = id, cookie = %session.cookie_name, "forward-auth login succeeded");
                }
                self.teardown(id, true);
            }
            Err(err) => self.fail(id, err),
        }
    }

    fn window_closed(&self, id: u64) {
        if self.conclude(id, AuthOutcome::Failure(AuthError::WindowClosed)) {
            info!(attempt = id, "login window closed before completion");
        }
        self.teardown(id, false);
    }
}

/// Drains surface events for one attempt until it is torn down.
async fn run_events(
    shared: Arc<Shared>,
    id: u64,
    stop: CancellationToken,
    mut events: mpsc::UnboundedReceiver<SurfaceEvent>,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Some(SurfaceEvent::LoadingChanged { is_loading: true }) => {}
            Some(SurfaceEvent::LoadingChanged { is_loading: false }) => shared.page_loaded(id),
            // A surface that drops its event handle can no longer finish the login.
            Some(SurfaceEvent::Closed) | None => {
                shared.window_closed(id);
                break;
            }
        }
    }
    debug!(attempt = id, "login event loop finished");
}

/// Reads the configured cookie once the surface is back on the Gameyfin server.
///
/// `Ok(None)` while the user is still on the proxy's login pages.
fn read_session_cookie(
    surface: &dyn BrowserSurface,
    session: &AuthSession,
) -> Result<Option<String>, AuthError> {
    let address = surface.current_address()?;
    if !is_target_address(&address, &session.server_url) {
        return Ok(None);
    }

    let name = session.cookie_name.trim();
    let cookie = surface
        .cookies()?
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| AuthError::CookieMissing(name.to_string()))?;

    if cookie.value.trim().is_empty() {
        return Err(AuthError::CookieEmpty(name.to_string()));
    }
    if cookie.is_expired(Utc::now()) {
        return Err(AuthError::CookieExpired(name.to_string()));
    }
    Ok(Some(cookie.value))
}

/// Returns true if `address` is the server URL or a page below it.
///
/// The prefix must end at a path, query or fragment boundary, so
/// `https://games.example.com.evil.net` does not count as
/// `https://games.example.com`.
fn is_target_address(address: &str, server_url: &str) -> bool {
    let base = server_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return false;
    }
    let Some(prefix) = address.get(..base.len()) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case(base) {
        return false;
    }
    let rest = &address[base.len()..];
    rest.is_empty() || rest.starts_with(['/', '?', '#'])
}

fn release(attempt: &Attempt, close_window: bool) {
    if close_window {
        let _ = guarded(|| Ok(attempt.surface.close()?));
    }
    let _ = guarded(|| {
        attempt.surface.dispose();
        Ok(())
    });
}

/// Runs surface code, turning panics into [`AuthError::Fault`].
fn guarded<T>(f: impl FnOnce() -> Result<T, AuthError>) -> Result<T, AuthError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(AuthError::Fault(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "browser surface panicked".to_string()
    }
}
