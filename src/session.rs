use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::storage::{ROLE_KEY, SessionStorage, StorageState, TOKEN_KEY};

/// Role
///
/// The RBAC field carried by every session. Unknown or missing stored values
/// resolve to `Normal`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Normal,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Normal => "normal",
        }
    }

    /// Resolves a persisted role value, falling back to the default role for
    /// anything absent or unrecognized.
    pub fn from_stored(value: Option<&str>) -> Role {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "normal" => Ok(Role::Normal),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Session
///
/// Client-held authentication state: an opaque token and a role. The default
/// value is the logged-out session (`token: None, role: normal`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub role: Role,
}

impl Session {
    pub fn authenticated(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: Some(token.into()),
            role,
        }
    }

    /// A missing or empty token means unauthenticated, whatever the role says.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("login requires a non-empty token")]
    EmptyToken,
}

/// SessionStore
///
/// Single owner of the session. Every other component reads through `current()`
/// or a `subscribe()` receiver; only the operations below mutate it.
///
/// Mutations persist to the storage port first and then publish the new value.
/// Both steps happen under one lock so concurrent requests observe a total order.
/// A storage failure is logged and the in-memory transition still happens: the
/// session simply will not survive a restart.
pub struct SessionStore {
    storage: StorageState,
    state: watch::Sender<Session>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Builds the store and rehydrates it from durable storage. This is the only
    /// constructor, so a store can never be observed before rehydration.
    pub fn initialize(storage: StorageState) -> Self {
        let session = rehydrate(storage.as_ref());
        if session.is_authenticated() {
            tracing::info!(role = %session.role, "session restored from durable storage");
        } else {
            tracing::debug!("no persisted session; starting unauthenticated");
        }

        let (state, _) = watch::channel(session);
        Self {
            storage,
            state,
            write_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every observable session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Adopts a credential that was already validated elsewhere. No network call.
    pub fn login(&self, token: &str, role: Role) -> Result<Session, SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let _guard = self.lock();
        self.persist(TOKEN_KEY, Some(token));
        self.persist(ROLE_KEY, Some(role.as_str()));

        let session = Session::authenticated(token, role);
        self.state.send_replace(session.clone());
        tracing::info!(role = %role, "session established");
        Ok(session)
    }

    /// Clears the session. Calling it while logged out changes nothing and
    /// notifies nobody.
    pub fn logout(&self) {
        let _guard = self.lock();
        self.persist(TOKEN_KEY, None);
        self.persist(ROLE_KEY, None);

        let changed = self.state.send_if_modified(|session| {
            if *session == Session::default() {
                return false;
            }
            *session = Session::default();
            true
        });
        if changed {
            tracing::info!("session cleared");
        }
    }

    /// Local role correction; the token (and thus authentication status) is untouched.
    pub fn set_role(&self, role: Role) {
        let _guard = self.lock();
        self.persist(ROLE_KEY, Some(role.as_str()));

        let changed = self.state.send_if_modified(|session| {
            if session.role == role {
                return false;
            }
            session.role = role;
            true
        });
        if changed {
            tracing::info!(role = %role, "session role updated");
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "durable storage write failed; session kept in memory only");
        }
    }
}

fn rehydrate(storage: &dyn SessionStorage) -> Session {
    let read = |key: &str| match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "durable storage read failed");
            None
        }
    };

    match read(TOKEN_KEY).filter(|t| !t.is_empty()) {
        Some(token) => Session::authenticated(token, Role::from_stored(read(ROLE_KEY).as_deref())),
        None => Session::default(),
    }
}

/// SessionState
///
/// The shared handle placed in the application state.
pub type SessionState = Arc<SessionStore>;
