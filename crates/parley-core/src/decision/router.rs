//! Per-turn routing

use super::intent::{IntentCatalog, IntentKind};
use crate::error::{Error, Result};
use crate::flow::FlowContext;
use crate::session::{Session, SessionState};
use parley_inference::{IntentRequest, IntentResponse, InterruptCheckRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Literal classifier label for retrieval answers
pub const FAQ_LABEL: &str = "faq";

/// Literal classifier label for flows
pub const FLOW_LABEL: &str = "flow";

/// Default number of history messages sent to the classifier
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Where a turn goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Keep running the active flow
    ContinueFlow,
    /// Start a flow
    NewIntent,
    /// Retrieval answer
    Rag,
    /// File a ticket
    Ticket,
}

/// Routing verdict for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Route
    pub kind: DecisionKind,
    /// Flow to run
    pub flow_id: Option<String>,
    /// Suggested reply from the classifier
    pub reply: Option<String>,
    /// Confidence (0.0 - 1.0)
    pub confidence: f32,
}

impl DecisionResult {
    fn new(kind: DecisionKind, confidence: f32) -> Self {
        Self {
            kind,
            flow_id: None,
            reply: None,
            confidence,
        }
    }

    /// Keep the active flow
    #[must_use]
    pub fn continue_flow(flow_id: Option<String>, confidence: f32) -> Self {
        Self {
            flow_id,
            ..Self::new(DecisionKind::ContinueFlow, confidence)
        }
    }
}

/// Decides continue flow / new flow / RAG / ticket for each turn
pub struct DecisionRouter {
    catalog: Arc<IntentCatalog>,
    history_window: usize,
}

impl DecisionRouter {
    /// Create a router over the configured intents
    pub fn new(catalog: Arc<IntentCatalog>) -> Self {
        Self {
            catalog,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Set how many recent messages the classifier sees
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Route one turn
    ///
    /// May mutate the session: a `Complete` session is reset to `New`, and an
    /// interrupted flow is left when the new route is not a flow.
    #[instrument(skip(self, ctx, session, user_message), fields(session_id = %session.id, state = %session.state))]
    pub async fn decide(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<DecisionResult> {
        match session.state {
            SessionState::Complete => {
                debug!("Session complete, starting over");
                session.reset();
                self.classify(ctx, session, user_message).await
            }
            SessionState::OnFlow => self.on_flow(ctx, session, user_message).await,
            _ => self.classify(ctx, session, user_message).await,
        }
    }

    async fn on_flow(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<DecisionResult> {
        let request = InterruptCheckRequest {
            session_id: session.id.clone(),
            flow_id: session.flow_id.clone().unwrap_or_default(),
            current_step: session.current_step.clone(),
            user_message: user_message.to_string(),
            flow_state: session.flow_state.as_ref().map(|s| s.fields.clone()),
        };

        let verdict = match ctx.call(ctx.inference().check_flow_interrupt(request)).await {
            Ok(verdict) => verdict,
            Err(Error::Collaborator(e)) => {
                warn!(error = %e, "Interrupt check unavailable, continuing flow");
                return Ok(DecisionResult::continue_flow(session.flow_id.clone(), 1.0));
            }
            Err(e) => return Err(e),
        };

        if !verdict.should_interrupt {
            debug!(confidence = verdict.confidence, "Continuing flow");
            return Ok(DecisionResult::continue_flow(
                session.flow_id.clone(),
                verdict.confidence,
            ));
        }

        info!(
            flow_id = ?session.flow_id,
            new_intent = ?verdict.new_intent,
            reason = ?verdict.reason,
            "Flow interrupted, re-deciding"
        );

        let decision = self.classify(ctx, session, user_message).await?;
        if decision.kind != DecisionKind::NewIntent {
            session.state = SessionState::Active;
            session.clear_flow();
        }
        Ok(decision)
    }

    async fn classify(
        &self,
        ctx: &FlowContext,
        session: &Session,
        user_message: &str,
    ) -> Result<DecisionResult> {
        let request = IntentRequest {
            message: user_message.to_string(),
            session_id: session.id.clone(),
            history: session.recent_history(self.history_window),
        };

        let response = ctx.call(ctx.inference().recognize_intent(request)).await?;
        debug!(
            intent = %response.intent,
            confidence = response.confidence,
            flow_id = ?response.flow_id,
            "Intent recognized"
        );

        Ok(self.route(response, session.flow_id.as_deref()))
    }

    /// Map a classifier answer to a route
    fn route(&self, response: IntentResponse, session_flow: Option<&str>) -> DecisionResult {
        let kind = match response.intent.as_str() {
            FAQ_LABEL => Some(IntentKind::Faq),
            FLOW_LABEL => Some(IntentKind::Flow),
            other => self.catalog.lookup(other).map(|def| def.kind),
        };

        let configured_flow = self
            .catalog
            .lookup(&response.intent)
            .and_then(|def| def.next_flow.clone());

        let mut result = DecisionResult {
            kind: DecisionKind::Ticket,
            flow_id: None,
            reply: response.reply,
            confidence: response.confidence,
        };

        match kind {
            Some(IntentKind::Faq) => result.kind = DecisionKind::Rag,
            Some(IntentKind::Flow) => {
                let flow_id = response
                    .flow_id
                    .filter(|f| !f.is_empty())
                    .or(configured_flow)
                    .or_else(|| session_flow.map(str::to_string));

                match flow_id {
                    Some(flow_id) => {
                        result.kind = DecisionKind::NewIntent;
                        result.flow_id = Some(flow_id);
                    }
                    None => {
                        warn!(intent = %response.intent, "Flow intent without a flow id, filing ticket");
                    }
                }
            }
            Some(IntentKind::Other) | None => {
                debug!(intent = %response.intent, "Unrecognized intent, filing ticket");
            }
        }

        result
    }
}
