//! Interactive sessions and the registry of active ones.

use crate::recent::RecentQueries;
use crate::{QueryCacheError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use qrcache_types::SessionSummary;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

/// Source of the set of session ids that are currently alive.
pub trait ActiveSessions: Send + Sync {
    fn active_session_ids(&self) -> HashSet<Uuid>;
}

/// An interactive session owning its recent-query history.
#[derive(Debug)]
pub struct UserSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    recent: Mutex<RecentQueries>,
}

impl UserSession {
    pub fn new(recent_capacity: usize) -> Self {
        Self::with_id(Uuid::new_v4(), recent_capacity)
    }

    pub fn with_id(id: Uuid, recent_capacity: usize) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            recent: Mutex::new(RecentQueries::new(recent_capacity)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Lock the recent-query history. The lock is per session.
    pub fn recent_queries(&self) -> MutexGuard<'_, RecentQueries> {
        self.recent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            recent_queries: self.recent_queries().len(),
        }
    }
}

/// Registry of active sessions.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<UserSession>>,
    recent_capacity: usize,
}

impl SessionRegistry {
    pub fn new(recent_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            recent_capacity,
        }
    }

    /// Open a new session and register it as active.
    pub fn open(&self) -> Arc<UserSession> {
        let session = Arc::new(UserSession::new(self.recent_capacity));
        self.sessions.insert(session.id(), session.clone());
        info!(target: "qrcache::session", "Opened session {}", session.id());
        session
    }

    /// Register a session with a caller-chosen id, returning the existing one if present.
    pub fn attach(&self, id: Uuid) -> Arc<UserSession> {
        self.sessions
            .entry(id)
            .or_insert_with(|| Arc::new(UserSession::with_id(id, self.recent_capacity)))
            .clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<UserSession>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    pub fn require(&self, id: Uuid) -> Result<Arc<UserSession>> {
        self.get(id).ok_or(QueryCacheError::SessionNotFound(id))
    }

    /// Remove a session from the active set.
    pub fn close(&self, id: Uuid) -> Option<Arc<UserSession>> {
        let removed = self.sessions.remove(&id).map(|(_, session)| session);
        if removed.is_some() {
            info!(target: "qrcache::session", "Closed session {}", id);
        }
        removed
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| entry.value().summary())
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl ActiveSessions for SessionRegistry {
    fn active_session_ids(&self) -> HashSet<Uuid> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }
}
