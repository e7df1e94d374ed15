//! Orchestrator core structure and turn handling

use super::config::OrchestratorConfig;
use crate::decision::{DecisionKind, DecisionRouter, IntentCatalog, FAQ_LABEL};
use crate::error::{Error, Result};
use crate::flow::{FlowContext, FlowEngine, FlowRegistry};
use crate::session::{Session, SessionState};
use crate::store::SessionStore;
use crate::turn::{IntentType, SessionHistory, TurnRequest, TurnResponse};
use chrono::Utc;
use parley_inference::{ChatRequest, InferenceClient, Ticket, TicketStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Reply sent after a ticket is filed
pub const TICKET_REPLY: &str =
    "您好，我无法准确理解您的问题。已为您创建工单，客服人员将尽快与您联系。";

/// Flow id hint sent with retrieval chats
const FAQ_FLOW_HINT: &str = "faq_response";

/// Intent label recorded on tickets
const TICKET_INTENT: &str = "unknown";

/// Turn entry point: load or create the session, route, dispatch, persist
pub struct Orchestrator {
    store: Arc<dyn SessionStore>,
    inference: Arc<dyn InferenceClient>,
    registry: Arc<FlowRegistry>,
    catalog: Arc<IntentCatalog>,
    engine: FlowEngine,
    router: DecisionRouter,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator over `store` with no intent definitions
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        inference: Arc<dyn InferenceClient>,
        registry: Arc<FlowRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let catalog = Arc::new(IntentCatalog::default());

        Self {
            engine: Self::build_engine(&registry, &store, &config),
            router: Self::build_router(&catalog, &config),
            store,
            inference,
            registry,
            catalog,
            config,
        }
    }

    /// Set the intent definitions used for routing
    #[must_use]
    pub fn with_intents(mut self, catalog: Arc<IntentCatalog>) -> Self {
        self.router = Self::build_router(&catalog, &self.config);
        self.catalog = catalog;
        self
    }

    fn build_engine(
        registry: &Arc<FlowRegistry>,
        store: &Arc<dyn SessionStore>,
        config: &OrchestratorConfig,
    ) -> FlowEngine {
        FlowEngine::new(registry.clone(), store.clone()).with_save_retries(config.save_retries)
    }

    fn build_router(catalog: &Arc<IntentCatalog>, config: &OrchestratorConfig) -> DecisionRouter {
        DecisionRouter::new(catalog.clone()).with_history_window(config.history_window)
    }

    /// Session store in use
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Registered flows
    #[must_use]
    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    /// Enabled intent definitions
    #[must_use]
    pub fn intents(&self) -> &IntentCatalog {
        &self.catalog
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Handle one turn with a fresh cancellation token
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
        self.handle_turn_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Handle one turn; cancelling `cancel` aborts pending inference calls
    /// before anything is persisted
    #[instrument(skip(self, request, cancel), fields(session_id = ?request.session_id, user_id = %request.user_id))]
    pub async fn handle_turn_with_cancel(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<TurnResponse> {
        if request.message.trim().is_empty() {
            return Err(Error::InvalidParam("message is empty".to_string()));
        }

        let session_id = match request.session_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = Uuid::new_v4().to_string();
                debug!(session_id = %id, "Generated session id");
                id
            }
        };

        let mut session = self.load_or_create(&session_id, &request.user_id).await?;
        debug!(
            session_id = %session.id,
            state = %session.state,
            flow_id = ?session.flow_id,
            step = ?session.current_step,
            version = session.version,
            "Session loaded"
        );

        let ctx = FlowContext::new(
            self.inference.clone(),
            cancel,
            self.config.collaborator_timeout,
        );
        let decision = self
            .router
            .decide(&ctx, &mut session, &request.message)
            .await?;
        info!(
            session_id = %session.id,
            decision = ?decision.kind,
            flow_id = ?decision.flow_id,
            confidence = decision.confidence,
            "Turn routed"
        );

        match decision.kind {
            DecisionKind::ContinueFlow => {
                self.engine
                    .dispatch(&ctx, &mut session, &request.message)
                    .await
            }
            DecisionKind::NewIntent => match decision.flow_id {
                Some(flow_id) => {
                    session.begin_flow(flow_id);
                    self.engine
                        .dispatch(&ctx, &mut session, &request.message)
                        .await
                }
                None => self.file_ticket(&ctx, &mut session, &request).await,
            },
            DecisionKind::Rag => self.answer_faq(&ctx, &mut session, &request).await,
            DecisionKind::Ticket => self.file_ticket(&ctx, &mut session, &request).await,
        }
    }

    async fn load_or_create(&self, session_id: &str, user_id: &str) -> Result<Session> {
        if let Some(session) = self.store.get(session_id).await? {
            return Ok(session);
        }

        let mut session = Session::new(session_id, user_id);
        session.version = 1;
        self.store.save(&session).await?;
        info!(session_id = %session_id, "Created session");
        Ok(session)
    }

    async fn answer_faq(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        request: &TurnRequest,
    ) -> Result<TurnResponse> {
        let chat = ChatRequest {
            session_id: session.id.clone(),
            message: request.message.clone(),
            user_id: Some(request.user_id.clone()).filter(|u| !u.is_empty()),
            history: Some(session.recent_history(self.config.history_window)),
            intent: Some(FAQ_LABEL.to_string()),
            flow_id: Some(FAQ_FLOW_HINT.to_string()),
        };

        let answer = ctx.call(self.inference.chat(chat)).await?;

        self.record_exchange(session, &request.message, &answer.reply)
            .await?;

        Ok(TurnResponse {
            reply: answer.reply,
            intent_type: IntentType::Faq,
            session_state: session.state,
            session_id: session.id.clone(),
            flow_step: None,
        })
    }

    async fn file_ticket(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        request: &TurnRequest,
    ) -> Result<TurnResponse> {
        let now = Utc::now().to_rfc3339();
        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            user_id: request.user_id.clone(),
            intent: TICKET_INTENT.to_string(),
            subject: None,
            description: request.message.clone(),
            status: TicketStatus::Open,
            created_at: now.clone(),
            updated_at: now,
        };

        let filed = ctx.call(self.inference.create_ticket(ticket)).await?;
        info!(session_id = %session.id, ticket_id = %filed.id, "Ticket filed");

        self.record_exchange(session, &request.message, TICKET_REPLY)
            .await?;

        Ok(TurnResponse {
            reply: TICKET_REPLY.to_string(),
            intent_type: IntentType::Unknown,
            session_state: session.state,
            session_id: session.id.clone(),
            flow_step: None,
        })
    }

    /// Append a non-flow exchange and persist it
    async fn record_exchange(&self, session: &mut Session, user: &str, reply: &str) -> Result<()> {
        session.add_user_message(user);
        session.add_assistant_message(reply);
        if session.state == SessionState::New {
            session.state = SessionState::Active;
        }
        session.touch();

        self.store
            .save_with_optimistic_lock(session, self.config.save_retries)
            .await
    }

    /// Stored conversation log; an unknown session yields an empty history
    pub async fn session_history(&self, session_id: &str) -> Result<SessionHistory> {
        let messages = self
            .store
            .get(session_id)
            .await?
            .map(|s| s.messages)
            .unwrap_or_default();

        Ok(SessionHistory {
            session_id: session_id.to_string(),
            count: messages.len(),
            messages,
        })
    }

    /// Delete a session; `true` if it existed
    pub async fn clear_session(&self, session_id: &str) -> Result<bool> {
        let deleted = self.store.delete(session_id).await?;
        info!(session_id = %session_id, deleted, "Session cleared");
        Ok(deleted)
    }

    /// Store liveness
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
