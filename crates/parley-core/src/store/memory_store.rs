//! In-process session store
//!
//! Runs the same optimistic protocol as [`RedisStore`](super::RedisStore)
//! with the map's write lock as the watch guard. Data is lost on restart;
//! meant for development and tests.

use super::merge::MergePolicy;
use super::optimistic::{prepare, save_with_retries, validate, CommitAttempt, WriteBase};
use super::{SessionStore, DEFAULT_TTL};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::utils::RetryConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

struct Entry {
    session: Session,
    expires_at: Instant,
}

/// In-memory session store
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
    policy: MergePolicy,
    retry: RetryConfig,
    closed: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store with the default 24h TTL
    #[must_use]
    pub fn new() -> Self {
        info!("Initializing MemoryStore for session storage");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: DEFAULT_TTL,
            policy: MergePolicy::default(),
            retry: RetryConfig::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Set the session TTL
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the merge policy
    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the backoff used between optimistic retries
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let sessions = self.sessions.read().await;
        sessions.values().filter(|e| e.expires_at > now).count()
    }

    /// Whether no live session is stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        purge_expired(&mut sessions, Instant::now())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::StoreClosed);
        }
        Ok(())
    }

    fn entry(&self, session: Session) -> Entry {
        Entry {
            session,
            expires_at: Instant::now() + self.ttl,
        }
    }
}

fn purge_expired(sessions: &mut HashMap<String, Entry>, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|_, e| e.expires_at > now);
    let removed = before - sessions.len();
    if removed > 0 {
        debug!(removed, remaining = sessions.len(), "Expired sessions removed");
    }
    removed
}

#[async_trait]
impl CommitAttempt for MemoryStore {
    async fn try_commit(&self, incoming: &Session, base: WriteBase) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        purge_expired(&mut sessions, Instant::now());

        let current = sessions.get(&incoming.id).map(|e| e.session.clone());

        let next = prepare(current, incoming, base, &self.policy)?;
        sessions.insert(next.id.clone(), self.entry(next.clone()));
        Ok(next)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        self.ensure_open()?;
        if session_id.is_empty() {
            return Err(Error::InvalidParam("session id is empty".to_string()));
        }

        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.session.clone()))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.ensure_open()?;
        validate(session)?;

        let mut sessions = self.sessions.write().await;
        purge_expired(&mut sessions, Instant::now());
        sessions.insert(session.id.clone(), self.entry(session.clone()));
        debug!(session_id = %session.id, version = session.version, "Session saved");
        Ok(())
    }

    async fn save_with_optimistic_lock(&self, session: &mut Session, max_retries: i32) -> Result<()> {
        self.ensure_open()?;
        save_with_retries(self, session, max_retries, &self.retry).await
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        self.ensure_open()?;
        if session_id.is_empty() {
            return Err(Error::InvalidParam("session id is empty".to_string()));
        }

        let mut sessions = self.sessions.write().await;
        let deleted = sessions.remove(session_id).is_some();
        debug!(session_id = %session_id, deleted, "Session deleted");
        Ok(deleted)
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        info!("MemoryStore closed");
        Ok(())
    }
}
