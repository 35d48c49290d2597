use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::token::TokenStore;
use crate::models::User;

/// Whether a credential is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// Snapshot of the session record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub user: Option<User>,
    /// Cached credential reference, mirrors the token store while signed in.
    pub token: Option<String>,
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        *self == SessionData::default()
    }
}

/// Shared, mutable record of the current identity.
///
/// Every sign-in and every reset starts a new epoch. Results fetched under an
/// older epoch must not be written back.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<SessionInner>,
}

#[derive(Debug, Default)]
struct SessionInner {
    data: SessionData,
    epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionData {
        self.read().data.clone()
    }

    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    pub fn user(&self) -> Option<User> {
        self.read().data.user.clone()
    }

    pub fn set_user(&self, user: User) {
        self.write().data.user = Some(user);
    }

    /// Store `user` only if no sign-in or reset happened since `epoch`.
    pub fn set_user_if_current(&self, epoch: u64, user: User) -> bool {
        let mut inner = self.write();
        if inner.epoch != epoch {
            return false;
        }
        inner.data.user = Some(user);
        true
    }

    pub fn token(&self) -> Option<String> {
        self.read().data.token.clone()
    }

    /// Start a new signed-in epoch with `token`.
    pub fn set_token(&self, token: String) {
        let mut inner = self.write();
        inner.data.token = Some(token);
        inner.data.signed_in_at = Some(Utc::now());
        inner.epoch += 1;
    }

    pub fn reset(&self) {
        let mut inner = self.write();
        inner.data = SessionData::default();
        inner.epoch += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.read().data.is_empty()
    }
}

struct AuthInner {
    tokens: TokenStore,
    session: SessionState,
    state_tx: watch::Sender<AuthState>,
}

/// Owns the token store and session state for one application.
///
/// Built once at the composition root and cloned into the API client's
/// interceptors and the query layer. Clone is cheap (Arc).
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<AuthInner>,
}

impl AuthContext {
    /// Create a context, picking up a credential persisted by a previous run.
    pub fn new(tokens: TokenStore) -> Self {
        let session = SessionState::new();
        let initial = match tokens.get_token() {
            Some(token) => {
                debug!("Restored persisted token");
                session.set_token(token);
                AuthState::Authenticated
            }
            None => AuthState::Unauthenticated,
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            inner: Arc::new(AuthInner {
                tokens,
                session,
                state_tx,
            }),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    /// The credential as the token store reports it right now.
    pub fn token(&self) -> Option<String> {
        self.inner.tokens.get_token()
    }

    pub fn has_token(&self) -> bool {
        self.inner.tokens.has_token()
    }

    pub fn state(&self) -> AuthState {
        *self.inner.state_tx.borrow()
    }

    /// Receiver observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    /// Commit a freshly issued credential.
    ///
    /// If the token store rejects the credential nothing changes: the session
    /// stays unauthenticated and the storage error is returned.
    pub fn login(&self, token: &str, user: Option<User>) -> Result<(), super::StorageError> {
        if let Err(e) = self.inner.tokens.set_token(token) {
            warn!(error = %e, "Failed to persist token, staying signed out");
            return Err(e);
        }
        self.inner.session.set_token(token.to_string());
        if let Some(user) = user {
            self.inner.session.set_user(user);
        }
        self.inner.state_tx.send_replace(AuthState::Authenticated);
        info!("Session authenticated");
        Ok(())
    }

    /// Explicit sign-out.
    pub fn logout(&self) {
        info!("Signing out");
        self.clear();
    }

    /// Tear the session down after the backend rejected the credential.
    ///
    /// Idempotent: concurrent 401s may each call this.
    pub fn teardown(&self) {
        warn!("Credential rejected by backend, clearing session");
        self.clear();
    }

    fn clear(&self) {
        if let Err(e) = self.inner.tokens.remove_token() {
            warn!(error = %e, "Failed to remove token from storage");
        }
        self.inner.session.reset();
        self.inner.state_tx.send_replace(AuthState::Unauthenticated);
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &self.state())
            .field("tokens", &self.inner.tokens)
            .finish()
    }
}
