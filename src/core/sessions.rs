//! Login sessions, keyed by the random token stored in the session cookie.

use crate::config::Settings;
use crate::core::traits::SessionStore;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use di::{Ref, inject, injectable};
use std::time::Duration;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, Session>,
    ttl: TimeDelta,
}

#[injectable(SessionStore)]
impl InMemorySessionStore {
    #[inject]
    pub fn from_settings(settings: Ref<Settings>) -> InMemorySessionStore {
        InMemorySessionStore::new(settings.session_ttl)
    }
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> InMemorySessionStore {
        InMemorySessionStore {
            sessions: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    fn is_live(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.created_at) < self.ttl
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, username: String) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(
            token,
            Session {
                username,
                created_at: Utc::now(),
            },
        );
        token
    }

    fn get(&self, token: Uuid) -> Option<Session> {
        let session = self.sessions.get(&token)?.clone();

        if self.is_live(&session, Utc::now()) {
            Some(session)
        } else {
            self.sessions.remove(&token);
            None
        }
    }

    fn remove(&self, token: Uuid) {
        self.sessions.remove(&token);
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| self.is_live(session, now));
        before.saturating_sub(self.sessions.len())
    }
}

/// `Set-Cookie` value for a freshly created session.
pub fn session_cookie(token: Uuid) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = InMemorySessionStore::new(Duration::from_secs(3600));
        let token = store.create("admin".to_string());

        let session = store.get(token).unwrap();
        assert_eq!(session.username, "admin");
        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_remove() {
        let store = InMemorySessionStore::new(Duration::from_secs(3600));
        let token = store.create("admin".to_string());

        store.remove(token);
        assert!(store.get(token).is_none());
    }

    #[test]
    fn test_expired_session_is_missing() {
        let store = InMemorySessionStore::new(Duration::ZERO);
        let token = store.create("admin".to_string());

        assert!(store.get(token).is_none());
        assert_eq!(store.sessions.len(), 0);
    }

    #[test]
    fn test_evict_expired() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        store.create("admin".to_string());
        store.create("admin".to_string());

        assert_eq!(store.evict_expired(Utc::now()), 0);
        assert_eq!(
            store.evict_expired(Utc::now() + TimeDelta::seconds(120)),
            2
        );
    }

    #[test]
    fn test_cookie_values() {
        let token = Uuid::new_v4();

        assert!(session_cookie(token).starts_with(&format!("session_id={token};")));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
