//! Field-level reconciliation of racing session writes

use crate::session::{Message, MessageRole, Session, SessionState};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// What makes two messages "the same message"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupKey {
    /// role + content + timestamp
    #[default]
    RoleContentTimestamp,
    /// role + content (repeated identical messages collapse)
    RoleContent,
}

/// Merge policy applied when a write races another writer
#[derive(Debug, Clone, Copy, Default)]
pub struct MergePolicy {
    /// Message identity
    pub dedup: DedupKey,
}

impl MergePolicy {
    /// Create the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message identity
    #[must_use]
    pub fn with_dedup(mut self, dedup: DedupKey) -> Self {
        self.dedup = dedup;
        self
    }

    /// Merge `incoming` (the caller's update) into `current` (the stored value)
    ///
    /// The result carries `incoming.version`; the caller sets the committed
    /// version.
    #[must_use]
    pub fn merge(&self, current: &Session, incoming: &Session) -> Session {
        let mut merged = current.clone();

        merged.messages = self.union_messages(&current.messages, &incoming.messages);

        if advances(current.state, incoming.state) {
            merged.state = incoming.state;
        }
        if incoming.flow_id.is_some() {
            merged.flow_id = incoming.flow_id.clone();
        }
        if incoming.current_step.is_some() {
            merged.current_step = incoming.current_step.clone();
        }
        if incoming.flow_state.is_some() {
            merged.flow_state = incoming.flow_state.clone();
        }
        if !incoming.user_id.is_empty() {
            merged.user_id = incoming.user_id.clone();
        }

        merged.version = incoming.version;
        merged.updated_at = current.updated_at.max(incoming.updated_at);
        merged.created_at = current.created_at.min(incoming.created_at);

        enforce_flow_invariant(&mut merged);
        merged
    }

    /// Union of both logs by dedup key, sorted by timestamp, ties in first-seen order
    #[must_use]
    pub fn union_messages(&self, current: &[Message], incoming: &[Message]) -> Vec<Message> {
        let mut seen: HashSet<(MessageRole, &str, Option<DateTime<Utc>>)> =
            HashSet::with_capacity(current.len() + incoming.len());
        let mut out = Vec::with_capacity(current.len() + incoming.len());

        for message in current.iter().chain(incoming) {
            let stamp = match self.dedup {
                DedupKey::RoleContentTimestamp => Some(message.timestamp),
                DedupKey::RoleContent => None,
            };
            if seen.insert((message.role, message.content.as_str(), stamp)) {
                out.push(message.clone());
            }
        }

        out.sort_by_key(|m| m.timestamp);
        out
    }
}

/// Strictly more advanced on the lifecycle order; unknown states never advance
fn advances(current: SessionState, incoming: SessionState) -> bool {
    match (current.rank(), incoming.rank()) {
        (Some(c), Some(i)) => i > c,
        (None, Some(_)) => true,
        _ => false,
    }
}

/// Flow position only exists while a flow runs
pub(crate) fn enforce_flow_invariant(session: &mut Session) {
    if session.state != SessionState::OnFlow {
        session.clear_flow();
    }
}
