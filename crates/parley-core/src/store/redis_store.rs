//! Redis-backed session store
//!
//! Sessions are JSON values under `prefix + id` with `SET ... EX ttl`. The
//! optimistic write runs `WATCH key` / `GET key` / `MULTI SET EXEC` on its own
//! connection; a nil `EXEC` reply means another writer touched the key.

use super::merge::MergePolicy;
use super::optimistic::{prepare, save_with_retries, validate, CommitAttempt, WriteBase};
use super::{SessionStore, DEFAULT_KEY_PREFIX, DEFAULT_TTL};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::utils::RetryConfig;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis session store
pub struct RedisStore {
    client: redis::Client,
    /// Key prefix for session keys
    prefix: String,
    /// TTL in seconds
    ttl_seconds: u64,
    policy: MergePolicy,
    retry: RetryConfig,
    closed: AtomicBool,
}

impl RedisStore {
    /// Create a new Redis store with the default prefix and 24h TTL
    ///
    /// # Errors
    ///
    /// Returns error if Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        Self::with_options(redis_url, DEFAULT_KEY_PREFIX, DEFAULT_TTL)
    }

    /// Create with custom prefix and TTL
    ///
    /// # Errors
    ///
    /// Returns error if Redis URL is invalid or the TTL is zero
    pub fn with_options(redis_url: &str, prefix: &str, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Configuration(format!("invalid redis url: {}", e)))?;

        if ttl.as_secs() == 0 {
            return Err(Error::Configuration(
                "session ttl must be at least one second".to_string(),
            ));
        }

        info!(prefix = %prefix, ttl_secs = ttl.as_secs(), "Initializing RedisStore");

        Ok(Self {
            client,
            prefix: prefix.to_string(),
            ttl_seconds: ttl.as_secs(),
            policy: MergePolicy::default(),
            retry: RetryConfig::default(),
            closed: AtomicBool::new(false),
        })
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

    /// Build the full Redis key
    fn build_key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::StoreClosed);
        }
        Ok(())
    }

    /// Open a fresh connection
    ///
    /// Each call yields its own connection, so WATCH state is never shared
    /// with another in-flight write.
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Storage(format!("Redis connection failed: {}", e)))
    }

    async fn unwatch(conn: &mut MultiplexedConnection) {
        if let Err(e) = redis::cmd("UNWATCH").query_async::<()>(conn).await {
            warn!(error = %e, "Redis UNWATCH failed");
        }
    }

    fn decode(json: &str) -> Result<Session> {
        serde_json::from_str(json).map_err(Error::from)
    }
}

#[async_trait]
impl CommitAttempt for RedisStore {
    async fn try_commit(&self, incoming: &Session, base: WriteBase) -> Result<Session> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(&incoming.id);

        redis::cmd("WATCH")
            .arg(&key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis WATCH failed: {}", e)))?;

        let staged = async {
            let data: Option<String> = redis::cmd("GET")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::Storage(format!("Redis GET failed: {}", e)))?;

            let current = data.as_deref().map(Self::decode).transpose()?;
            let next = prepare(current, incoming, base, &self.policy)?;
            let json = serde_json::to_string(&next)?;
            Ok::<_, Error>((next, json))
        }
        .await;

        let (next, json) = match staged {
            Ok(staged) => staged,
            Err(e) => {
                Self::unwatch(&mut conn).await;
                return Err(e);
            }
        };

        let reply: redis::Value = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(&json)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis EXEC failed: {}", e)))?;

        if matches!(reply, redis::Value::Nil) {
            return Err(Error::TransactionAborted {
                session_id: incoming.id.clone(),
            });
        }

        Ok(next)
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        self.ensure_open()?;
        if session_id.is_empty() {
            return Err(Error::InvalidParam("session id is empty".to_string()));
        }

        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let data: Option<String> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis GET failed: {}", e)))?;

        match data {
            Some(json) => {
                let session = Self::decode(&json)?;
                debug!(session_id = %session_id, version = session.version, "Session loaded from Redis");
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.ensure_open()?;
        validate(session)?;

        let mut conn = self.get_connection().await?;
        let key = self.build_key(&session.id);
        let json = serde_json::to_string(session)?;

        redis::cmd("SET")
            .arg(&key)
            .arg(&json)
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis SET failed: {}", e)))?;

        debug!(session_id = %session.id, ttl = %self.ttl_seconds, "Session saved to Redis");
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

        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let deleted: i64 = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis DEL failed: {}", e)))?;

        debug!(session_id = %session_id, deleted = deleted > 0, "Session deleted from Redis");
        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()?;
        let mut conn = self.get_connection().await?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Storage(format!("Redis PING failed: {}", e)))?;

        if pong != "PONG" {
            return Err(Error::Storage(format!("unexpected PING reply: {}", pong)));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        info!("RedisStore closed");
        Ok(())
    }
}
