// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in sessions and their per-user favorites stores.
//!
//! A [`Session`] owns the [`FavoritesStore`] of its user. The store is
//! created (and fetched once) when the session opens and is dropped with
//! the session when it closes, so no favorites outlive a sign-out.
//! Sessions also close on their own once their token has expired.

use crate::db::{new_document_id, Db};
use crate::error::AppError;
use crate::middleware::auth::SESSION_TTL_SECS;
use crate::services::favorites::FavoritesStore;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the auth-event channel. Slow subscribers miss old events.
const AUTH_EVENT_CAPACITY: usize = 64;

/// Auth-state changes, published to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: String, session_id: String },
    SignedOut { user_id: String, session_id: String },
}

/// One signed-in session.
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub email: String,
    /// Unix timestamp after which the session is gone; also the token's `exp`
    pub expires_at: i64,
    pub favorites: Arc<FavoritesStore>,
}

impl Session {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// All live sessions, keyed by session ID.
#[derive(Clone)]
pub struct SessionRegistry {
    db: Db,
    sessions: Arc<DashMap<String, Arc<Session>>>,
    events: broadcast::Sender<AuthEvent>,
    ttl_secs: i64,
}

impl SessionRegistry {
    pub fn new(db: Db) -> Self {
        Self::with_ttl(db, SESSION_TTL_SECS)
    }

    pub fn with_ttl(db: Db, ttl_secs: u64) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            db,
            sessions: Arc::new(DashMap::new()),
            events,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Open a session and load the user's favorites.
    ///
    /// A failed initial fetch is logged and the session still opens with an
    /// empty snapshot; the next mutation or explicit fetch retries.
    pub async fn open(&self, user_id: &str, email: &str) -> Result<Arc<Session>, AppError> {
        self.prune_expired();

        let favorites = Arc::new(FavoritesStore::new(self.db.clone(), user_id));

        if let Err(e) = favorites.fetch().await {
            tracing::warn!(user_id, error = %e, "Initial favorites fetch failed");
        }

        let session = Arc::new(Session {
            id: new_document_id()?,
            user_id: user_id.to_string(),
            email: email.to_string(),
            expires_at: Utc::now().timestamp().saturating_add(self.ttl_secs),
            favorites,
        });
        self.sessions.insert(session.id.clone(), session.clone());

        tracing::info!(user_id, session_id = %session.id, "Session opened");
        self.publish(AuthEvent::SignedIn {
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
        });

        Ok(session)
    }

    /// A live session. An expired one is closed on the way and reported
    /// as absent.
    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(session_id).map(|s| s.value().clone())?;
        if session.is_expired(Utc::now().timestamp()) {
            self.remove_if_expired(session_id);
            return None;
        }
        Some(session)
    }

    /// Close a session, dropping its favorites store.
    ///
    /// Returns the closed session, or `None` if it was not open.
    pub fn close(&self, session_id: &str) -> Option<Arc<Session>> {
        let (_, session) = self.sessions.remove(session_id)?;

        tracing::info!(user_id = %session.user_id, session_id, "Session closed");
        self.publish(AuthEvent::SignedOut {
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
        });

        Some(session)
    }

    /// Close every expired session. Returns how many were closed.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let closed = expired
            .iter()
            .filter(|id| self.remove_if_expired(id))
            .count();
        if closed > 0 {
            tracing::info!(closed, remaining = self.sessions.len(), "Expired sessions pruned");
        }
        closed
    }

    fn remove_if_expired(&self, session_id: &str) -> bool {
        let now = Utc::now().timestamp();
        let Some((_, session)) = self
            .sessions
            .remove_if(session_id, |_, s| s.is_expired(now))
        else {
            return false;
        };

        tracing::info!(user_id = %session.user_id, session_id, "Session expired");
        self.publish(AuthEvent::SignedOut {
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
        });

        true
    }

    /// Number of open sessions, expired ones included until pruned.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Subscribe to auth-state changes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    #[tokio::test]
    async fn test_open_and_close_publish_events() {
        let registry = SessionRegistry::new(MemoryDb::new().into());
        let mut events = registry.subscribe();

        let session = registry.open("u1", "a@example.com").await.unwrap();
        assert!(registry.get(&session.id).is_some());
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedIn {
                user_id: "u1".to_string(),
                session_id: session.id.clone()
            }
        );

        assert!(registry.close(&session.id).is_some());
        assert!(registry.get(&session.id).is_none());
        assert!(matches!(
            events.recv().await.unwrap(),
            AuthEvent::SignedOut { .. }
        ));

        assert!(registry.close(&session.id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_open_survives_failed_initial_fetch() {
        let db = MemoryDb::new();
        db.set_offline(true);
        let registry = SessionRegistry::new(db.into());

        let session = registry.open("u1", "a@example.com").await.unwrap();
        assert!(session.favorites.snapshot().await.items().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned() {
        let registry = SessionRegistry::with_ttl(MemoryDb::new().into(), 0);
        let mut events = registry.subscribe();

        let first = registry.open("u1", "a@example.com").await.unwrap();
        let second = registry.open("u1", "a@example.com").await.unwrap();
        // Opening the second session closed the first one.
        assert_eq!(registry.len(), 1);
        events.recv().await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedOut {
                user_id: "u1".to_string(),
                session_id: first.id.clone()
            }
        );

        assert!(registry.get(&second.id).is_none());
        assert!(registry.is_empty());
        assert_eq!(registry.prune_expired(), 0);
    }

    #[tokio::test]
    async fn test_repeated_sign_ins_do_not_accumulate_expired_sessions() {
        let registry = SessionRegistry::with_ttl(MemoryDb::new().into(), 0);
        for _ in 0..50 {
            registry.open("u1", "a@example.com").await.unwrap();
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.prune_expired(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_live_sessions_survive_pruning() {
        let registry = SessionRegistry::new(MemoryDb::new().into());
        let session = registry.open("u1", "a@example.com").await.unwrap();

        assert_eq!(registry.prune_expired(), 0);
        assert!(registry.get(&session.id).is_some());
        assert!(session.expires_at > Utc::now().timestamp());
    }
}
