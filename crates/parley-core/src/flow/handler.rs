//! Step handler contract

use crate::error::Result;
use crate::session::Session;
use crate::utils::bounded;
use async_trait::async_trait;
use parley_inference::InferenceClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-turn capabilities handed to step handlers
#[derive(Clone)]
pub struct FlowContext {
    inference: Arc<dyn InferenceClient>,
    cancel: CancellationToken,
    timeout: Duration,
}

impl FlowContext {
    /// Create a context for one turn
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        cancel: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self {
            inference,
            cancel,
            timeout,
        }
    }

    /// Inference capability
    pub fn inference(&self) -> &dyn InferenceClient {
        self.inference.as_ref()
    }

    /// The turn's cancellation token
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a collaborator call under the turn's deadline and cancellation
    pub async fn call<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = parley_inference::Result<T>>,
    {
        bounded(&self.cancel, self.timeout, call).await
    }
}

/// What a step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Reply shown to the user
    pub reply: String,
    /// The flow finished
    pub done: bool,
    /// Step to run on the next turn (ignored when `done`)
    pub next_step: Option<String>,
}

impl StepOutcome {
    /// Continue at `step` on the next turn
    #[must_use]
    pub fn next(reply: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            done: false,
            next_step: Some(step.into()),
        }
    }

    /// Finish the flow
    #[must_use]
    pub fn done(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            done: true,
            next_step: None,
        }
    }
}

/// One step of a flow
///
/// Handlers may read and write the session's flow data. Other session fields
/// belong to the engine.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Handle the user's message at this step
    async fn handle(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<StepOutcome>;
}

/// Adapter for steps that need no collaborator
pub struct SyncStep<F>(F);

/// Wrap a plain function as a [`StepHandler`]
pub fn sync_step<F>(f: F) -> SyncStep<F>
where
    F: Fn(&mut Session, &str) -> Result<StepOutcome> + Send + Sync,
{
    SyncStep(f)
}

#[async_trait]
impl<F> StepHandler for SyncStep<F>
where
    F: Fn(&mut Session, &str) -> Result<StepOutcome> + Send + Sync,
{
    async fn handle(
        &self,
        _ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<StepOutcome> {
        (self.0)(session, user_message)
    }
}
