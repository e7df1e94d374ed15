//! Integration tests for Parley
//!
//! End-to-end turns through the orchestrator with:
//! - parley-core: MemoryStore, decision router, flow engine
//! - parley-flows: the shipped flow registry and fixture order book
//! - a scripted inference service

use async_trait::async_trait;
use parley_core::{
    Error, IntentCatalog, IntentDefinition, IntentKind, IntentType, MemoryStore, Orchestrator,
    OrchestratorConfig, Session, SessionState, SessionStore, TurnRequest, MAX_MESSAGES,
    UNKNOWN_FLOW_REPLY,
};
use parley_flows::{default_registry, ReturnGoodsData, StaticOrderBook};
use parley_inference::{
    ChatRequest, ChatResponse, InferenceClient, IntentRequest, IntentResponse,
    InterruptCheckRequest, InterruptCheckResponse, Ticket,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Scripted inference service
// ============================================================================

/// Keyword classifier; interrupts when the message contains "政策" or "订单"
#[derive(Default)]
struct ScriptedInference {
    interrupt_down: AtomicBool,
    interrupt_checks: AtomicUsize,
    chats: AtomicUsize,
}

impl ScriptedInference {
    fn classify(message: &str) -> &'static str {
        if message.contains("政策") {
            "faq"
        } else if message.contains("订单") || message.contains("查询") {
            "order_query"
        } else if message.contains("退货") {
            "return_goods"
        } else {
            "unknown"
        }
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    async fn recognize_intent(
        &self,
        request: IntentRequest,
    ) -> parley_inference::Result<IntentResponse> {
        Ok(IntentResponse {
            intent: Self::classify(&request.message).to_string(),
            confidence: 0.92,
            ..Default::default()
        })
    }

    async fn chat(&self, request: ChatRequest) -> parley_inference::Result<ChatResponse> {
        self.chats.fetch_add(1, Ordering::SeqCst);
        Ok(ChatResponse {
            reply: format!("FAQ: {}", request.message),
            kind: "faq".to_string(),
            session_state: None,
        })
    }

    async fn create_ticket(&self, ticket: Ticket) -> parley_inference::Result<Ticket> {
        Ok(ticket)
    }

    async fn check_flow_interrupt(
        &self,
        request: InterruptCheckRequest,
    ) -> parley_inference::Result<InterruptCheckResponse> {
        self.interrupt_checks.fetch_add(1, Ordering::SeqCst);
        if self.interrupt_down.load(Ordering::SeqCst) {
            return Err(parley_inference::Error::Network(
                "connection refused".to_string(),
            ));
        }

        let leaves = request.user_message.contains("政策") || request.user_message.contains("订单");
        Ok(InterruptCheckResponse {
            should_interrupt: leaves,
            confidence: 0.85,
            ..Default::default()
        })
    }
}

fn intents() -> Arc<IntentCatalog> {
    Arc::new(IntentCatalog::new(vec![
        IntentDefinition::new("order_query", IntentKind::Flow).with_next_flow("order_query"),
        IntentDefinition::new("return_goods", IntentKind::Flow).with_next_flow("return_goods"),
    ]))
}

fn orchestrator_with(
    inference: Arc<ScriptedInference>,
    store: Arc<MemoryStore>,
) -> Orchestrator {
    Orchestrator::new(
        store,
        inference,
        Arc::new(default_registry(Arc::new(StaticOrderBook::fixtures()))),
        OrchestratorConfig::new().with_collaborator_timeout(Duration::from_secs(2)),
    )
    .with_intents(intents())
}

fn setup() -> (Orchestrator, Arc<ScriptedInference>, Arc<MemoryStore>) {
    let inference = Arc::new(ScriptedInference::default());
    let store = Arc::new(MemoryStore::new());
    (
        orchestrator_with(inference.clone(), store.clone()),
        inference,
        store,
    )
}

fn turn(session_id: &str, message: &str) -> TurnRequest {
    TurnRequest::new(message, "u1").with_session(session_id)
}

// ============================================================================
// Flow scenarios
// ============================================================================

#[tokio::test]
async fn test_order_query_end_to_end() {
    let (orchestrator, _, store) = setup();

    let first = orchestrator.handle_turn(turn("s1", "查询订单")).await.unwrap();
    assert_eq!(first.intent_type, IntentType::Flow);
    assert_eq!(first.session_state, SessionState::OnFlow);
    assert_eq!(first.flow_step.as_deref(), Some("processing"));

    let mid = store.get("s1").await.unwrap().unwrap();
    assert_eq!(mid.flow_id.as_deref(), Some("order_query"));
    assert_eq!(mid.current_step.as_deref(), Some("processing"));

    let second = orchestrator.handle_turn(turn("s1", "12345")).await.unwrap();
    assert_eq!(second.session_state, SessionState::Complete);
    assert!(second.reply.starts_with("订单 12345 的状态：已发货"));

    let done = store.get("s1").await.unwrap().unwrap();
    assert_eq!(done.state, SessionState::Complete);
    assert!(done.flow_id.is_none());
    assert!(done.current_step.is_none());
    assert!(done.flow_state.is_none());
    assert_eq!(done.messages.len(), 4);
}

#[tokio::test]
async fn test_completed_session_starts_fresh() {
    let (orchestrator, _, store) = setup();

    orchestrator.handle_turn(turn("s1", "查询订单 67890")).await.unwrap();
    assert_eq!(
        store.get("s1").await.unwrap().unwrap().state,
        SessionState::Complete
    );

    let next = orchestrator.handle_turn(turn("s1", "我要退货")).await.unwrap();
    assert_eq!(next.session_state, SessionState::OnFlow);
    assert_eq!(next.flow_step.as_deref(), Some("ask_order_id"));
}

#[tokio::test]
async fn test_return_goods_full_conversation() {
    let (orchestrator, inference, store) = setup();

    for message in ["我要退货", "12345", "尺寸不合适"] {
        orchestrator.handle_turn(turn("s1", message)).await.unwrap();
    }
    let mid = store.get("s1").await.unwrap().unwrap();
    assert_eq!(mid.current_step.as_deref(), Some("confirm"));
    assert_eq!(
        mid.flow_data::<ReturnGoodsData>().unwrap().unwrap(),
        ReturnGoodsData {
            order_id: "12345".to_string(),
            reason: "尺寸不合适".to_string(),
        }
    );

    let submitted = orchestrator.handle_turn(turn("s1", "确认")).await.unwrap();
    assert!(submitted.reply.starts_with("退货申请已提交！"));
    assert_eq!(submitted.session_state, SessionState::Complete);
    assert_eq!(inference.interrupt_checks.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_interrupt_to_faq_leaves_flow() {
    let (orchestrator, inference, store) = setup();

    let mut session = Session::new("s1", "u1");
    session.begin_flow("return_goods");
    session.current_step = Some("ask_reason".to_string());
    session.version = 1;
    store.save(&session).await.unwrap();

    let response = orchestrator
        .handle_turn(turn("s1", "你们的退货政策是什么"))
        .await
        .unwrap();

    assert_eq!(response.intent_type, IntentType::Faq);
    assert_eq!(response.reply, "FAQ: 你们的退货政策是什么");
    assert_eq!(inference.chats.load(Ordering::SeqCst), 1);

    let stored = store.get("s1").await.unwrap().unwrap();
    assert_eq!(stored.state, SessionState::Active);
    assert!(stored.flow_id.is_none());
    assert!(stored.current_step.is_none());
}

#[tokio::test]
async fn test_interrupt_into_another_flow() {
    let (orchestrator, _, store) = setup();

    let mut session = Session::new("s1", "u1");
    session.begin_flow("return_goods");
    session.current_step = Some("ask_reason".to_string());
    session.version = 1;
    store.save(&session).await.unwrap();

    let response = orchestrator
        .handle_turn(turn("s1", "先帮我查一下订单 11111"))
        .await
        .unwrap();

    assert_eq!(response.intent_type, IntentType::Flow);
    assert!(response.reply.contains("已签收"));
    assert_eq!(response.session_state, SessionState::Complete);
}

#[tokio::test]
async fn test_interrupt_check_outage_fails_open() {
    let (orchestrator, inference, store) = setup();
    orchestrator.handle_turn(turn("s1", "我要退货")).await.unwrap();

    inference.interrupt_down.store(true, Ordering::SeqCst);
    let response = orchestrator.handle_turn(turn("s1", "12345")).await.unwrap();

    assert_eq!(response.intent_type, IntentType::Flow);
    assert_eq!(response.flow_step.as_deref(), Some("ask_reason"));
    assert_eq!(
        store.get("s1").await.unwrap().unwrap().current_step.as_deref(),
        Some("ask_reason")
    );
}

#[tokio::test]
async fn test_unknown_flow_resets_session() {
    let (orchestrator, _, store) = setup();

    let mut session = Session::new("s1", "u1");
    session.begin_flow("retired_flow");
    session.current_step = Some("ask_something".to_string());
    session.version = 1;
    store.save(&session).await.unwrap();

    let response = orchestrator.handle_turn(turn("s1", "你好")).await.unwrap();
    assert_eq!(response.reply, UNKNOWN_FLOW_REPLY);
    assert_eq!(response.intent_type, IntentType::Unknown);
    assert_eq!(response.session_state, SessionState::New);

    let stored = store.get("s1").await.unwrap().unwrap();
    assert_eq!(stored.state, SessionState::New);
    assert!(stored.flow_id.is_none());
}

// ============================================================================
// Persistence scenarios
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_keep_every_message() {
    let inference = Arc::new(ScriptedInference::default());
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Arc::new(
        Orchestrator::new(
            store.clone(),
            inference,
            Arc::new(default_registry(Arc::new(StaticOrderBook::fixtures()))),
            OrchestratorConfig::new().with_save_retries(8),
        )
        .with_intents(intents()),
    );

    orchestrator.handle_turn(turn("s1", "运费政策")).await.unwrap();
    let base = store.get("s1").await.unwrap().unwrap().version;

    let writers = 4;
    let handles = (0..writers).map(|i| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .handle_turn(turn("s1", &format!("退换政策 {i}")))
                .await
        })
    });

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let stored = store.get("s1").await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 2 + 2 * writers);
    assert_eq!(stored.version, base + writers as u64);
    for i in 0..writers {
        let question = format!("退换政策 {i}");
        assert!(stored.messages.iter().any(|m| m.content == question));
    }
}

#[tokio::test]
async fn test_message_log_is_capped() {
    let (orchestrator, _, _) = setup();

    for i in 0..60 {
        orchestrator
            .handle_turn(turn("s1", &format!("政策问题 {i}")))
            .await
            .unwrap();
    }

    let history = orchestrator.session_history("s1").await.unwrap();
    assert_eq!(history.count, MAX_MESSAGES);
    assert_eq!(history.messages[0].content, "政策问题 10");
    assert_eq!(
        history.messages.last().unwrap().content,
        "FAQ: 政策问题 59"
    );
}

#[tokio::test]
async fn test_generated_session_and_clear() {
    let (orchestrator, _, _) = setup();

    let response = orchestrator
        .handle_turn(TurnRequest::new("运费政策", "u2"))
        .await
        .unwrap();
    assert!(!response.session_id.is_empty());

    assert_eq!(
        orchestrator
            .session_history(&response.session_id)
            .await
            .unwrap()
            .count,
        2
    );
    assert!(orchestrator.clear_session(&response.session_id).await.unwrap());
    assert!(!orchestrator.clear_session(&response.session_id).await.unwrap());
}

#[tokio::test]
async fn test_closed_store_fails_turn() {
    let (orchestrator, _, store) = setup();
    store.close().await.unwrap();

    let err = orchestrator.handle_turn(turn("s1", "运费政策")).await.unwrap_err();
    assert!(matches!(err, Error::StoreClosed));
}
