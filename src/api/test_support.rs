//! Scripted inference double for handler tests

use async_trait::async_trait;
use parley_core::{
    FlowRegistry, IntentCatalog, IntentDefinition, IntentKind, MemoryStore, Orchestrator,
    OrchestratorConfig,
};
use parley_flows::{default_registry, StaticOrderBook};
use parley_inference::{
    ChatRequest, ChatResponse, InferenceClient, IntentRequest, IntentResponse,
    InterruptCheckRequest, InterruptCheckResponse, Result, Ticket,
};
use std::sync::Arc;

/// Classifies by keyword, never interrupts, echoes FAQ questions
pub struct KeywordInference;

#[async_trait]
impl InferenceClient for KeywordInference {
    async fn recognize_intent(&self, request: IntentRequest) -> Result<IntentResponse> {
        let intent = if request.message.contains("订单") {
            "order_query"
        } else if request.message.contains("政策") {
            "faq"
        } else {
            "unknown"
        };
        Ok(IntentResponse {
            intent: intent.to_string(),
            confidence: 0.9,
            ..Default::default()
        })
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        Ok(ChatResponse {
            reply: format!("FAQ: {}", request.message),
            kind: "faq".to_string(),
            session_state: None,
        })
    }

    async fn create_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        Ok(ticket)
    }

    async fn check_flow_interrupt(
        &self,
        _request: InterruptCheckRequest,
    ) -> Result<InterruptCheckResponse> {
        Ok(InterruptCheckResponse {
            should_interrupt: false,
            confidence: 0.9,
            ..Default::default()
        })
    }
}

pub fn orchestrator() -> Arc<Orchestrator> {
    let registry: Arc<FlowRegistry> =
        Arc::new(default_registry(Arc::new(StaticOrderBook::fixtures())));
    let intents = Arc::new(IntentCatalog::new(vec![IntentDefinition::new(
        "order_query",
        IntentKind::Flow,
    )
    .with_next_flow("order_query")]));

    Arc::new(
        Orchestrator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(KeywordInference),
            registry,
            OrchestratorConfig::default(),
        )
        .with_intents(intents),
    )
}
