//! Session store: who is logged in.
//!
//! The session lives in durable client storage under two entries, `auth`
//! (the bearer token) and `role`. [`SessionContext`] is the single owner of
//! those entries: it reads them once on initialization and every later write
//! goes through [`SessionContext::set_session`].

use crate::models::Role;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key for the bearer token.
pub const AUTH_KEY: &str = "auth";
/// Storage key for the role.
pub const ROLE_KEY: &str = "role";

/// The authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

/// Session as seen by the rest of the application.
///
/// `Loading` means storage has not been read yet. Consumers must not treat it
/// as "logged out".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Ready(Option<Session>),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Ready(session) => session.as_ref(),
            SessionState::Loading => None,
        }
    }
}

/// Durable key/value storage backing the session.
pub trait SessionStorage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-process storage, for tools and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored entry. Clones share the same entries.
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entry(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.lock().remove(key);
    }
}

struct Inner {
    state: SessionState,
    storage: Box<dyn SessionStorage>,
}

/// Shared handle to the current session.
///
/// Cloning is cheap; all clones observe the same session. Writes are
/// last-write-wins and never held across an await point.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Mutex<Inner>>,
}

impl SessionContext {
    /// Create a context in the `Loading` state. Call [`initialize`](Self::initialize)
    /// before making access decisions.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Loading,
                storage: Box::new(storage),
            })),
        }
    }

    /// Create a context and immediately read the persisted session.
    pub fn load(storage: impl SessionStorage + 'static) -> Self {
        let ctx = Self::new(storage);
        ctx.initialize();
        ctx
    }

    /// Read `auth` and `role` from storage.
    ///
    /// Both entries must be present and the role must be known, otherwise the
    /// session starts out empty.
    pub fn initialize(&self) {
        let mut inner = self.inner.lock();
        let token = inner.storage.get(AUTH_KEY).filter(|t| !t.is_empty());
        let role = inner.storage.get(ROLE_KEY);

        let session = match (token, role) {
            (Some(token), Some(role)) => match role.parse::<Role>() {
                Ok(role) => Some(Session { token, role }),
                Err(e) => {
                    warn!("Ignoring persisted session: {}", e);
                    None
                }
            },
            _ => None,
        };

        debug!(logged_in = session.is_some(), "Session initialized");
        inner.state = SessionState::Ready(session);
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.inner.lock().state, SessionState::Loading)
    }

    pub fn get_session(&self) -> Option<Session> {
        self.inner.lock().state.session().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.get_session().map(|s| s.token)
    }

    pub fn role(&self) -> Option<Role> {
        self.get_session().map(|s| s.role)
    }

    /// Replace the current session. `None` logs out.
    ///
    /// This is the only place that writes the persisted entries; `auth` and
    /// `role` are always written or cleared together.
    pub fn set_session(&self, session: Option<Session>) {
        let mut inner = self.inner.lock();
        match &session {
            Some(s) => {
                inner.storage.set(AUTH_KEY, &s.token);
                inner.storage.set(ROLE_KEY, s.role.as_str());
            }
            None => {
                inner.storage.remove(AUTH_KEY);
                inner.storage.remove(ROLE_KEY);
            }
        }
        inner.state = SessionState::Ready(session);
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.inner.lock().state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with(entries: &[(&str, &str)]) -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        for (k, v) in entries {
            storage.set(k, v);
        }
        storage
    }

    #[test]
    fn test_starts_loading_until_initialized() {
        let ctx = SessionContext::new(storage_with(&[("auth", "T1"), ("role", "admin")]));
        assert!(ctx.is_loading());
        assert_eq!(ctx.get_session(), None);

        ctx.initialize();
        assert!(!ctx.is_loading());
        assert_eq!(
            ctx.get_session(),
            Some(Session {
                token: "T1".into(),
                role: Role::Admin
            })
        );
    }

    #[test]
    fn test_initialize_requires_both_entries() {
        let ctx = SessionContext::load(storage_with(&[("auth", "T1")]));
        assert_eq!(ctx.state(), SessionState::Ready(None));

        let ctx = SessionContext::load(storage_with(&[("role", "student")]));
        assert_eq!(ctx.state(), SessionState::Ready(None));

        let ctx = SessionContext::load(storage_with(&[("auth", "T1"), ("role", "superuser")]));
        assert_eq!(ctx.state(), SessionState::Ready(None));
    }

    #[test]
    fn test_set_session_writes_and_clears_storage() {
        let storage = MemoryStorage::new();
        let ctx = SessionContext::load(storage.clone());

        ctx.set_session(Some(Session {
            token: "T2".into(),
            role: Role::Student,
        }));
        assert_eq!(storage.entry("auth").as_deref(), Some("T2"));
        assert_eq!(storage.entry("role").as_deref(), Some("student"));
        assert_eq!(ctx.role(), Some(Role::Student));

        ctx.set_session(None);
        assert_eq!(storage.entry("auth"), None);
        assert_eq!(storage.entry("role"), None);
        assert_eq!(ctx.state(), SessionState::Ready(None));
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = SessionContext::load(MemoryStorage::new());
        let other = ctx.clone();
        other.set_session(Some(Session {
            token: "T3".into(),
            role: Role::Admin,
        }));
        assert_eq!(ctx.token().as_deref(), Some("T3"));
    }
}
