use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// The credentials attached to every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    /// Known after login; absent when a token is supplied out of band.
    pub user: Option<UserAccount>,
}

impl Session {
    pub fn from_token(access_token: impl Into<String>) -> Self {
        Session { access_token: access_token.into(), user: None }
    }
}

/// Process-wide session store: at most one session, one mutation entry point.
///
/// Cleared on logout and on any 401 response. Components that must react to
/// the session ending (e.g. to redirect to authentication) subscribe and
/// watch for the value turning `None`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        SessionStore { inner: Arc::new(tx) }
    }

    pub fn set(&self, session: Session) {
        self.inner.send_replace(Some(session));
    }

    pub fn clear(&self) {
        self.inner.send_replace(None);
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.borrow().as_ref().map(|s| s.access_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.subscribe()
    }
}
