use super::*;
use crate::error::Error;
use crate::flow::FlowContext;
use crate::session::{Session, SessionState};
use crate::test_support::MockInference;
use parley_inference::{IntentResponse, InterruptCheckResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn catalog() -> Arc<IntentCatalog> {
    Arc::new(IntentCatalog::new(vec![
        IntentDefinition::new("return_goods", IntentKind::Flow).with_next_flow("return_goods"),
        IntentDefinition::new("order_status", IntentKind::Flow).with_next_flow("order_query"),
        IntentDefinition::new("flow_without_target", IntentKind::Flow),
        IntentDefinition::new("shipping_fee", IntentKind::Faq),
        IntentDefinition::new("complaint", IntentKind::Other),
    ]))
}

fn ctx(mock: MockInference) -> FlowContext {
    FlowContext::new(
        Arc::new(mock),
        CancellationToken::new(),
        Duration::from_millis(200),
    )
}

fn intent(label: &str, flow_id: Option<&str>) -> IntentResponse {
    IntentResponse {
        intent: label.to_string(),
        confidence: 0.8,
        flow_id: flow_id.map(str::to_string),
        ..Default::default()
    }
}

fn mid_flow() -> Session {
    let mut session = Session::new("s1", "u1");
    session.begin_flow("return_goods");
    session.current_step = Some("ask_reason".to_string());
    session
        .set_flow_data(&serde_json::json!({"order_id": "12345"}))
        .unwrap();
    session
}

async fn decide_fresh(response: IntentResponse) -> DecisionResult {
    let mut mock = MockInference::new();
    mock.expect_recognize_intent()
        .times(1)
        .returning(move |_| Ok(response.clone()));

    let mut session = Session::new("s1", "u1");
    DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "hello")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_faq_label_routes_to_rag() {
    let mut response = intent("faq", None);
    response.reply = Some("运费说明".to_string());

    let decision = decide_fresh(response).await;
    assert_eq!(decision.kind, DecisionKind::Rag);
    assert_eq!(decision.reply.as_deref(), Some("运费说明"));
    assert!((decision.confidence - 0.8).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_catalog_faq_routes_to_rag() {
    let decision = decide_fresh(intent("shipping_fee", None)).await;
    assert_eq!(decision.kind, DecisionKind::Rag);
}

#[tokio::test]
async fn test_flow_id_preference_order() {
    // collaborator value first
    let decision = decide_fresh(intent("order_status", Some("logistics"))).await;
    assert_eq!(decision.kind, DecisionKind::NewIntent);
    assert_eq!(decision.flow_id.as_deref(), Some("logistics"));

    // then the configured mapping
    let decision = decide_fresh(intent("order_status", None)).await;
    assert_eq!(decision.flow_id.as_deref(), Some("order_query"));

    // literal flow label with the collaborator's id
    let decision = decide_fresh(intent("flow", Some("customer_service"))).await;
    assert_eq!(decision.kind, DecisionKind::NewIntent);
    assert_eq!(decision.flow_id.as_deref(), Some("customer_service"));
}

#[tokio::test]
async fn test_flow_without_any_target_files_ticket() {
    let decision = decide_fresh(intent("flow_without_target", None)).await;
    assert_eq!(decision.kind, DecisionKind::Ticket);

    let decision = decide_fresh(intent("flow", None)).await;
    assert_eq!(decision.kind, DecisionKind::Ticket);
}

#[tokio::test]
async fn test_unrecognized_intents_file_ticket() {
    assert_eq!(
        decide_fresh(intent("complaint", None)).await.kind,
        DecisionKind::Ticket
    );
    assert_eq!(
        decide_fresh(intent("unknown", None)).await.kind,
        DecisionKind::Ticket
    );
}

#[tokio::test]
async fn test_classification_failure_propagates() {
    let mut mock = MockInference::new();
    mock.expect_recognize_intent()
        .returning(|_| Err(parley_inference::Error::Api("HTTP 500".to_string())));

    let mut session = Session::new("s1", "u1");
    let err = DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "hello")
        .await
        .unwrap_err();
    assert!(err.is_collaborator());
}

#[tokio::test]
async fn test_history_window_sent_to_classifier() {
    let mut mock = MockInference::new();
    mock.expect_recognize_intent()
        .withf(|req| req.history.len() == 3 && req.history[2].content == "m9")
        .returning(|_| Ok(intent("faq", None)));

    let mut session = Session::new("s1", "u1");
    for i in 0..10 {
        session.add_user_message(format!("m{i}"));
    }

    DecisionRouter::new(catalog())
        .with_history_window(3)
        .decide(&ctx(mock), &mut session, "hello")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_complete_session_resets_before_deciding() {
    let mut mock = MockInference::new();
    mock.expect_check_flow_interrupt().never();
    mock.expect_recognize_intent()
        .returning(|_| Ok(intent("faq", None)));

    let mut session = mid_flow();
    session.complete();

    let decision = DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "hello")
        .await
        .unwrap();

    assert_eq!(decision.kind, DecisionKind::Rag);
    assert_eq!(session.state, SessionState::New);
}

#[tokio::test]
async fn test_on_flow_continues_when_not_interrupted() {
    let mut mock = MockInference::new();
    mock.expect_check_flow_interrupt()
        .withf(|req| {
            req.flow_id == "return_goods"
                && req.current_step.as_deref() == Some("ask_reason")
                && req.flow_state.as_ref().is_some_and(|s| s["order_id"] == "12345")
        })
        .returning(|_| {
            Ok(InterruptCheckResponse {
                should_interrupt: false,
                confidence: 0.7,
                ..Default::default()
            })
        });
    mock.expect_recognize_intent().never();

    let mut session = mid_flow();
    let decision = DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "尺寸不合适")
        .await
        .unwrap();

    assert_eq!(decision.kind, DecisionKind::ContinueFlow);
    assert_eq!(decision.flow_id.as_deref(), Some("return_goods"));
    assert!((decision.confidence - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_interrupt_check_failure_fails_open() {
    let mut mock = MockInference::new();
    mock.expect_check_flow_interrupt()
        .returning(|_| Err(parley_inference::Error::Network("refused".to_string())));
    mock.expect_recognize_intent().never();

    let mut session = mid_flow();
    let decision = DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "hi")
        .await
        .unwrap();

    assert_eq!(decision.kind, DecisionKind::ContinueFlow);
    assert_eq!(decision.confidence, 1.0);
    assert!(session.is_on_flow());
}

#[tokio::test]
async fn test_interrupt_check_timeout_fails_open() {
    struct Slow;

    #[async_trait::async_trait]
    impl parley_inference::InferenceClient for Slow {
        async fn recognize_intent(
            &self,
            _: parley_inference::IntentRequest,
        ) -> parley_inference::Result<IntentResponse> {
            Err(parley_inference::Error::Api("unexpected".to_string()))
        }
        async fn chat(
            &self,
            _: parley_inference::ChatRequest,
        ) -> parley_inference::Result<parley_inference::ChatResponse> {
            Err(parley_inference::Error::Api("unexpected".to_string()))
        }
        async fn create_ticket(
            &self,
            _: parley_inference::Ticket,
        ) -> parley_inference::Result<parley_inference::Ticket> {
            Err(parley_inference::Error::Api("unexpected".to_string()))
        }
        async fn check_flow_interrupt(
            &self,
            _: parley_inference::InterruptCheckRequest,
        ) -> parley_inference::Result<InterruptCheckResponse> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(InterruptCheckResponse {
                should_interrupt: true,
                ..Default::default()
            })
        }
    }

    let ctx = FlowContext::new(
        Arc::new(Slow),
        CancellationToken::new(),
        Duration::from_millis(100),
    );
    let mut session = mid_flow();

    let decision = DecisionRouter::new(catalog())
        .decide(&ctx, &mut session, "hi")
        .await
        .unwrap();

    assert_eq!(decision.kind, DecisionKind::ContinueFlow);
    assert_eq!(decision.confidence, 1.0);
}

#[tokio::test]
async fn test_cancellation_is_not_fail_open() {
    let mut mock = MockInference::new();
    mock.expect_check_flow_interrupt()
        .returning(|_| Ok(InterruptCheckResponse::default()));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = FlowContext::new(Arc::new(mock), cancel, Duration::from_secs(1));

    let mut session = mid_flow();
    let err = DecisionRouter::new(catalog())
        .decide(&ctx, &mut session, "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_interrupt_to_faq_leaves_flow() {
    let mut mock = MockInference::new();
    mock.expect_check_flow_interrupt().returning(|_| {
        Ok(InterruptCheckResponse {
            should_interrupt: true,
            confidence: 0.95,
            new_intent: Some("faq".to_string()),
            reason: Some("asked about shipping".to_string()),
        })
    });
    mock.expect_recognize_intent()
        .times(1)
        .returning(|_| Ok(intent("faq", None)));

    let mut session = mid_flow();
    let decision = DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "运费怎么算？")
        .await
        .unwrap();

    assert_eq!(decision.kind, DecisionKind::Rag);
    assert_eq!(session.state, SessionState::Active);
    assert!(session.flow_id.is_none());
    assert!(session.flow_state.is_none());
}

#[tokio::test]
async fn test_interrupt_to_other_flow() {
    let mut mock = MockInference::new();
    mock.expect_check_flow_interrupt().returning(|_| {
        Ok(InterruptCheckResponse {
            should_interrupt: true,
            confidence: 0.9,
            ..Default::default()
        })
    });
    mock.expect_recognize_intent()
        .returning(|_| Ok(intent("order_status", None)));

    let mut session = mid_flow();
    let decision = DecisionRouter::new(catalog())
        .decide(&ctx(mock), &mut session, "查一下订单 67890")
        .await
        .unwrap();

    assert_eq!(decision.kind, DecisionKind::NewIntent);
    assert_eq!(decision.flow_id.as_deref(), Some("order_query"));
}
