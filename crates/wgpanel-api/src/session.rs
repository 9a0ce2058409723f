use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub login_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no such session")]
    Unknown,

    #[error("session expired")]
    Expired,
}

/// Server-side sessions keyed by the opaque id stored in the session cookie.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    timeout: chrono::Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout: chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn timeout(&self) -> chrono::Duration {
        self.timeout
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.login_time > self.timeout
    }

    /// Drop `previous` (if any) and issue a fresh id for `username`.
    pub fn regenerate(&self, previous: Option<&str>, username: &str, now: DateTime<Utc>) -> String {
        if let Some(old) = previous {
            if self.sessions.remove(old).is_some() {
                debug!("discarded pre-login session");
            }
        }
        self.purge_expired(now);

        let id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            id.clone(),
            Session {
                username: username.to_owned(),
                login_time: now,
            },
        );
        id
    }

    /// Look up `id`. An expired session is removed before reporting `Expired`.
    pub fn validate(&self, id: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::Unknown)?;

        if self.is_expired(&session, now) {
            self.sessions.remove(id);
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Owner of a live session, without touching the store.
    pub fn username_of(&self, id: &str, now: DateTime<Utc>) -> Option<String> {
        self.sessions
            .get(id)
            .filter(|entry| !self.is_expired(entry.value(), now))
            .map(|entry| entry.value().username.clone())
    }

    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.sessions.retain(|_, session| !self.is_expired(session, now));
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
