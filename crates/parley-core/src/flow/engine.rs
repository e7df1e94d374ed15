//! Step dispatch for the session's active flow

use super::handler::FlowContext;
use super::registry::FlowRegistry;
use crate::error::Result;
use crate::session::{Session, START_STEP};
use crate::store::SessionStore;
use crate::turn::{IntentType, TurnResponse};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Reply when the session points at a flow that is not registered
pub const UNKNOWN_FLOW_REPLY: &str = "抱歉，系统错误，请重新开始。";

/// Reply when neither the recorded step nor `start` exists
pub const FLOW_ENDED_REPLY: &str = "流程已结束，请重新开始。";

/// Default retry budget for the post-step save
pub const DEFAULT_SAVE_RETRIES: i32 = 3;

/// Registry-driven step state machine
pub struct FlowEngine {
    registry: Arc<FlowRegistry>,
    store: Arc<dyn SessionStore>,
    save_retries: i32,
}

impl FlowEngine {
    /// Create an engine over an immutable registry
    pub fn new(registry: Arc<FlowRegistry>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            registry,
            store,
            save_retries: DEFAULT_SAVE_RETRIES,
        }
    }

    /// Set the optimistic save retry budget
    #[must_use]
    pub fn with_save_retries(mut self, retries: i32) -> Self {
        self.save_retries = retries;
        self
    }

    /// The registry this engine dispatches into
    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    /// Run the session's current step for `user_message` and persist the result
    ///
    /// Missing flows and steps are recovered by resetting the session and
    /// answering with an apology; handler and persistence errors propagate.
    #[instrument(skip(self, ctx, session, user_message), fields(session_id = %session.id))]
    pub async fn dispatch(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<TurnResponse> {
        let flow_id = session.flow_id.clone().unwrap_or_default();
        let Some(flow) = self.registry.get(&flow_id) else {
            warn!(flow_id = %flow_id, "Flow not registered, resetting session");
            return Ok(self.recover(session, UNKNOWN_FLOW_REPLY).await);
        };

        let step = session.step_or_start().to_string();
        let handler = match flow.handler(&step) {
            Some(handler) => handler,
            None => match flow.handler(START_STEP) {
                Some(start) => {
                    warn!(flow_id = %flow_id, step = %step, "Step not registered, restarting flow");
                    session.current_step = Some(START_STEP.to_string());
                    start
                }
                None => {
                    warn!(flow_id = %flow_id, step = %step, "Flow has no start step, resetting session");
                    return Ok(self.recover(session, FLOW_ENDED_REPLY).await);
                }
            },
        };

        debug!(flow_id = %flow_id, step = %session.step_or_start(), "Running flow step");
        let outcome = handler.handle(ctx, session, user_message).await?;

        session.add_user_message(user_message);
        session.add_assistant_message(outcome.reply.clone());

        if outcome.done {
            info!(flow_id = %flow_id, "Flow completed");
            session.complete();
        } else {
            debug!(flow_id = %flow_id, next_step = ?outcome.next_step, "Flow step completed");
            session.current_step = outcome.next_step;
        }

        session.touch();
        self.store
            .save_with_optimistic_lock(session, self.save_retries)
            .await?;

        Ok(TurnResponse {
            reply: outcome.reply,
            intent_type: IntentType::Flow,
            session_state: session.state,
            session_id: session.id.clone(),
            flow_step: session.current_step.clone(),
        })
    }

    /// Reset the session, persist best-effort, and answer with `reply`
    async fn recover(&self, session: &mut Session, reply: &str) -> TurnResponse {
        session.reset();
        session.touch();

        if let Err(e) = self
            .store
            .save_with_optimistic_lock(session, self.save_retries)
            .await
        {
            warn!(session_id = %session.id, error = %e, "Failed to persist session reset");
        }

        TurnResponse {
            reply: reply.to_string(),
            intent_type: IntentType::Unknown,
            session_state: session.state,
            session_id: session.id.clone(),
            flow_step: None,
        }
    }
}
