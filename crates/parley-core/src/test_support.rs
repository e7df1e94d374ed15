use async_trait::async_trait;
use mockall::mock;
use parley_inference::{
    ChatRequest, ChatResponse, InferenceClient, IntentRequest, IntentResponse,
    InterruptCheckRequest, InterruptCheckResponse, Ticket,
};

mock! {
    pub Inference {}

    #[async_trait]
    impl InferenceClient for Inference {
        async fn recognize_intent(
            &self,
            request: IntentRequest,
        ) -> parley_inference::Result<IntentResponse>;
        async fn chat(&self, request: ChatRequest) -> parley_inference::Result<ChatResponse>;
        async fn create_ticket(&self, ticket: Ticket) -> parley_inference::Result<Ticket>;
        async fn check_flow_interrupt(
            &self,
            request: InterruptCheckRequest,
        ) -> parley_inference::Result<InterruptCheckResponse>;
    }
}
