//! Single source of truth for "who is logged in and with what token",
//! plus every side effect that has to happen when that answer changes.
//!
//! The manager is owned by the composition root and handed around as
//! `Arc<SessionManager>`; nothing else touches the token, the session
//! file, or the expiry timer. All authenticated traffic goes through
//! [`SessionManager::request`] so a session revoked server-side is
//! detected in exactly one place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde_json::{Value, json};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clients::backend::{
    ApiError, ApiRequest, Transport, classify, error_message, is_device_restricted, unwrap_data,
};
use crate::constants::session::{EXPIRY_SKEW, STORE_POLL};
use crate::models::{PendingDeviceApproval, User};
use crate::session::store::{PersistedSession, SessionStore};
use crate::session::token::decode_expiry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    Expired,
    Unauthorized,
    ClearedElsewhere,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoggedOut { reason: LogoutReason },
}

/// A login either completes, or is parked on device approval. Callers
/// must branch on `DevicePending` and show the approval flow instead of
/// a generic failure.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Success { user: User },
    DevicePending(PendingDeviceApproval),
}

pub struct SessionManager {
    /// Handle to ourselves for the background tasks we spawn; they hold
    /// a weak reference so a dropped manager stops its timers.
    weak: Weak<Self>,

    transport: Arc<dyn Transport>,
    store: SessionStore,
    state: RwLock<Option<PersistedSession>>,
    pending: RwLock<Option<PendingDeviceApproval>>,

    /// Bumped on every token change and logout. An expiry timer carries
    /// the epoch it was scheduled under and goes inert once superseded,
    /// so at most one timer can ever act.
    timer_epoch: AtomicU64,

    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            transport,
            store,
            state: RwLock::new(None),
            pending: RwLock::new(None),
            timer_epoch: AtomicU64::new(0),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn pending_approval(&self) -> Option<PendingDeviceApproval> {
        self.pending.read().await.clone()
    }

    /// Restores a persisted session at startup. Returns the restored
    /// user, or `None` when there is no usable session (including a
    /// persisted token that already expired).
    pub async fn restore(&self) -> Option<User> {
        let persisted = self.store.load()?;
        let user = persisted.user.clone();
        match self.install(persisted, false).await {
            Ok(true) => Some(user),
            Ok(false) => None,
            Err(e) => {
                warn!(error = %e, "failed to restore session");
                None
            }
        }
    }

    /// Authenticates against the backend.
    ///
    /// On success the token and user are persisted together and the
    /// auto-logout timer is scheduled. A device-restriction response
    /// becomes [`LoginOutcome::DevicePending`], not an error. Any other
    /// failure leaves no partial state behind.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        *self.pending.write().await = None;

        let request = ApiRequest::post("auth/login", json!({ "email": email, "password": password }));
        let response = self.transport.execute(request).await?;

        if (200..300).contains(&response.status) {
            let data = unwrap_data(&response.body);
            let token = data
                .get("token")
                .and_then(Value::as_str)
                .ok_or_else(|| ApiError::UnexpectedShape("login response missing token".into()))?
                .to_string();
            let user: User = data
                .get("user")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| ApiError::UnexpectedShape(format!("login user payload: {e}")))?
                .ok_or_else(|| ApiError::UnexpectedShape("login response missing user".into()))?;

            let active = self
                .install(PersistedSession { token, user: user.clone() }, true)
                .await?;
            if !active {
                // The server handed out a token that is already past its
                // exp claim; treat it like any other invalid session.
                return Err(ApiError::Unauthorized);
            }

            info!(email = %user.email, "logged in");
            return Ok(LoginOutcome::Success { user });
        }

        if matches!(response.status, 401 | 403) && is_device_restricted(&response.body) {
            let mut approval: PendingDeviceApproval =
                serde_json::from_value(unwrap_data(&response.body)).unwrap_or_default();
            if approval.message.is_empty() {
                approval.message = error_message(&response.body);
            }

            info!(ip = %approval.ip, "login held for device approval");
            *self.pending.write().await = Some(approval.clone());
            return Ok(LoginOutcome::DevicePending(approval));
        }

        Err(ApiError::Rejected {
            status: response.status,
            message: error_message(&response.body),
        })
    }

    /// Logs out. The server-side invalidation is best-effort; local
    /// state is cleared no matter what so the client can never appear
    /// stuck logged-in.
    pub async fn logout(&self) {
        let token = { self.state.read().await.as_ref().map(|s| s.token.clone()) };
        if let Some(token) = token {
            let request = ApiRequest::post("auth/logout", json!({})).with_token(&token);
            if let Err(e) = self.transport.execute(request).await {
                debug!(error = %e, "server-side logout failed; clearing locally anyway");
            }
        }

        self.clear_local(LogoutReason::UserRequested).await;
    }

    /// Re-pulls the profile for the stored token. Role and approval
    /// flags may have changed server-side; a 401 here runs the same
    /// forced-logout path as any other call.
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let data = self.request(Method::GET, "auth/me", None).await?;
        let user: User = serde_json::from_value(data)
            .map_err(|e| ApiError::UnexpectedShape(format!("profile payload: {e}")))?;

        let mut state = self.state.write().await;
        if let Some(session) = state.as_mut() {
            session.user = user.clone();
            if let Err(e) = self.store.save(session) {
                warn!(error = %e, "failed to persist refreshed profile");
            }
        }

        Ok(user)
    }

    /// The single authenticated call wrapper.
    ///
    /// Fails fast with [`ApiError::NotLoggedIn`] when no token is held;
    /// a 401 from the server clears the session, notifies subscribers,
    /// and surfaces as [`ApiError::Unauthorized`]. Everything else is
    /// classified into the shared error taxonomy.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let token = self.current_token().await?;

        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
            token: Some(token),
        };
        let response = self.transport.execute(request).await?;

        if response.status == 401 {
            warn!(path, "server rejected session; logging out");
            self.clear_local(LogoutReason::Unauthorized).await;
            return Err(ApiError::Unauthorized);
        }

        classify(&response)
    }

    /// Watches the shared session file and clears the in-memory session
    /// when another process removed it, without calling the server.
    pub fn spawn_store_watcher(&self) -> JoinHandle<()> {
        let weak = self.weak.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STORE_POLL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else { break };
                let logged_in = manager.state.read().await.is_some();
                if logged_in && !manager.store.exists() {
                    info!("session file removed by another process; logging out");
                    manager.clear_local(LogoutReason::ClearedElsewhere).await;
                }
            }
        })
    }

    /// Periodically revalidates the session while a long-lived view is
    /// open. Errors are already handled inside `fetch_current_user`.
    pub fn spawn_heartbeat(&self, every: Duration) -> JoinHandle<()> {
        let weak = self.weak.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so a fresh
            // login is not re-validated right away.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else { break };
                if !manager.is_logged_in().await {
                    continue;
                }
                if let Err(e) = manager.fetch_current_user().await {
                    debug!(error = %e, "session heartbeat failed");
                }
            }
        })
    }

    /// Installs a session: state and persisted file change together, and
    /// the expiry timer is rescheduled under the same write lock so no
    /// two timers can both act. Returns `false` when the token's exp is
    /// already in the past (the session is cleared synchronously).
    async fn install(&self, session: PersistedSession, persist: bool) -> Result<bool, ApiError> {
        let expiry = decode_expiry(&session.token);

        if let Some(expiry) = expiry
            && expiry <= Utc::now()
        {
            info!("token already expired; clearing session");
            self.clear_local(LogoutReason::Expired).await;
            return Ok(false);
        }

        let mut state = self.state.write().await;
        let epoch = self.timer_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        if persist {
            self.store
                .save(&session)
                .map_err(|e| ApiError::Store(e.to_string()))?;
        }
        *state = Some(session);
        drop(state);

        if let Some(expiry) = expiry {
            let delay = (expiry - Utc::now()).to_std().unwrap_or_default() + EXPIRY_SKEW;
            debug!(?delay, "auto-logout scheduled");

            let weak = self.weak.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let Some(manager) = weak.upgrade() else { return };
                if manager.timer_epoch.load(Ordering::SeqCst) != epoch {
                    return; // superseded by a newer token or a logout
                }
                info!("token expired; logging out");
                manager.clear_local_if(LogoutReason::Expired, Some(epoch)).await;
            });
        }
        // No decodable exp: the token is trusted until a server 401.

        Ok(true)
    }

    async fn current_token(&self) -> Result<String, ApiError> {
        let token = { self.state.read().await.as_ref().map(|s| s.token.clone()) };
        let Some(token) = token else {
            return Err(ApiError::NotLoggedIn);
        };

        // Another process may have logged out since our last call.
        if !self.store.exists() {
            info!("session file gone; treating as logged out");
            self.clear_local(LogoutReason::ClearedElsewhere).await;
            return Err(ApiError::NotLoggedIn);
        }

        Ok(token)
    }

    async fn clear_local(&self, reason: LogoutReason) {
        self.clear_local_if(reason, None).await;
    }

    /// Clears token + user together. `expected_epoch` lets the expiry
    /// timer stand down if a newer token landed between its wakeup and
    /// this lock acquisition.
    async fn clear_local_if(&self, reason: LogoutReason, expected_epoch: Option<u64>) {
        let mut state = self.state.write().await;

        if let Some(epoch) = expected_epoch
            && self.timer_epoch.load(Ordering::SeqCst) != epoch
        {
            return;
        }
        self.timer_epoch.fetch_add(1, Ordering::SeqCst);

        let had_session = state.take().is_some();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to remove session file");
        }
        drop(state);

        if had_session {
            info!(?reason, "session cleared");
            let _ = self.events.send(SessionEvent::LoggedOut { reason });
        }
    }
}
