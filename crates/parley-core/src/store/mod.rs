//! Session storage backends
//!
//! [`SessionStore`] is the only serialization point for session data. Writes
//! that may race go through [`SessionStore::save_with_optimistic_lock`], which
//! detects concurrent writers by version and reconciles with [`MergePolicy`].
//!
//! - `RedisStore`: production backend, WATCH/MULTI/EXEC with TTL
//! - `MemoryStore`: development/testing backend, same protocol under a lock

mod memory_store;
mod merge;
mod optimistic;
mod redis_store;

pub use memory_store::MemoryStore;
pub use merge::{DedupKey, MergePolicy};
pub use optimistic::WriteBase;
pub use redis_store::RedisStore;

use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;
use std::time::Duration;

/// Default key namespace
pub const DEFAULT_KEY_PREFIX: &str = "parley:session:";

/// Default session lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Session store trait for abstracting storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session by id; `Ok(None)` when absent or expired
    async fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// Unconditional write
    ///
    /// Only for first-time creation after the caller saw the id absent. Racing
    /// updates must use [`save_with_optimistic_lock`](Self::save_with_optimistic_lock).
    async fn save(&self, session: &Session) -> Result<()>;

    /// Versioned write with conflict retry and merge
    ///
    /// On success `session` holds what was committed, including the new version.
    async fn save_with_optimistic_lock(&self, session: &mut Session, max_retries: i32) -> Result<()>;

    /// Delete a session; `true` if something was removed
    async fn delete(&self, session_id: &str) -> Result<bool>;

    /// Backend liveness check
    async fn ping(&self) -> Result<()>;

    /// Stop serving; later calls fail with `StoreClosed`
    async fn close(&self) -> Result<()>;
}
