//! Optimistic write protocol shared by the store backends
//!
//! A backend only supplies [`CommitAttempt::try_commit`]: read the stored
//! value under its own guard (WATCH or a write lock), run [`prepare`], and
//! commit. The retry loop, conflict rebasing and backoff live here.

use super::merge::{enforce_flow_invariant, MergePolicy};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::utils::RetryConfig;
use async_trait::async_trait;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Version the caller's update is based on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteBase {
    /// Stored version the update was derived from
    pub version: u64,
    /// A concurrent writer was observed during this save
    pub raced: bool,
}

/// One guarded read-prepare-commit cycle
#[async_trait]
pub(crate) trait CommitAttempt: Send + Sync {
    /// Attempt a single commit, returning the session as written
    async fn try_commit(&self, incoming: &Session, base: WriteBase) -> Result<Session>;
}

/// Compute the value to write given what is stored now
///
/// Fails with `SessionConflict` when the store moved past `base` on a first
/// attempt. Once a race has been observed the update is merged into whatever
/// is stored, whatever its version.
pub(crate) fn prepare(
    current: Option<Session>,
    incoming: &Session,
    base: WriteBase,
    policy: &MergePolicy,
) -> Result<Session> {
    let mut next = match current {
        None => {
            let mut fresh = incoming.clone();
            fresh.version = 1;
            fresh
        }
        Some(current) if base.raced => {
            let mut merged = policy.merge(&current, incoming);
            merged.version = current.version + 1;
            merged
        }
        Some(current) if current.version > base.version => {
            return Err(Error::SessionConflict {
                session_id: incoming.id.clone(),
                current_version: current.version,
                incoming_version: base.version,
            });
        }
        Some(current) => {
            // Nobody wrote since the caller's read: its fields are authoritative
            let mut next = incoming.clone();
            next.messages = policy.union_messages(&current.messages, &incoming.messages);
            next.created_at = current.created_at;
            next.version = current.version + 1;
            next
        }
    };

    enforce_flow_invariant(&mut next);
    next.enforce_message_cap();
    next.updated_at = Utc::now();
    Ok(next)
}

/// Reject sessions that can never be written
pub(crate) fn validate(session: &Session) -> Result<()> {
    if session.id.trim().is_empty() {
        return Err(Error::InvalidSession("session id is empty".to_string()));
    }
    Ok(())
}

/// Drive `try_commit` until it succeeds, fails hard, or the budget runs out
///
/// `max_retries` counts retries after the first attempt. The committed session
/// is written back into `session`.
pub(crate) async fn save_with_retries<S>(
    store: &S,
    session: &mut Session,
    max_retries: i32,
    retry: &RetryConfig,
) -> Result<()>
where
    S: CommitAttempt + ?Sized,
{
    validate(session)?;
    let max_retries = u32::try_from(max_retries).map_err(|_| {
        Error::InvalidParam(format!("max_retries cannot be negative: {}", max_retries))
    })?;

    let mut base = WriteBase {
        version: session.version,
        raced: false,
    };
    let mut last_error = None;

    for attempt in 0..=max_retries {
        let err = match store.try_commit(session, base).await {
            Ok(committed) => {
                debug!(
                    session_id = %committed.id,
                    version = committed.version,
                    attempt,
                    merged = base.raced,
                    "Session committed"
                );
                *session = committed;
                return Ok(());
            }
            Err(err) if err.is_retryable() => err,
            Err(err) => return Err(err),
        };

        if let Error::SessionConflict {
            current_version, ..
        } = &err
        {
            base.version = *current_version;
        }
        base.raced = true;

        if attempt < max_retries {
            let delay = retry.delay_for(attempt + 1);
            warn!(
                session_id = %session.id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Optimistic write lost a race, retrying"
            );
            sleep(delay).await;
        }
        last_error = Some(err);
    }

    let source = last_error.unwrap_or_else(|| Error::TransactionAborted {
        session_id: session.id.clone(),
    });
    Err(Error::MaxRetriesExceeded {
        session_id: session.id.clone(),
        attempts: max_retries + 1,
        source: Box::new(source),
    })
}
