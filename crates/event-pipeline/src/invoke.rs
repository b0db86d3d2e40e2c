//! Synchronous, request/response invocation of named targets.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::RequestId;
use tokio::sync::RwLock;

use crate::{PipelineError, Result};

/// Correlation data forwarded from the triggering request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    pub request_id: RequestId,
}

impl CorrelationContext {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }
}

/// Context handed to a target for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Id of this invocation, distinct from the correlation id.
    pub invocation_id: RequestId,
    pub correlation: CorrelationContext,
}

/// What a successful invocation returned.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResponse {
    pub target: String,
    pub invocation_id: RequestId,
    pub payload: serde_json::Value,
}

/// A function that can be invoked by name.
#[async_trait]
pub trait InvocationTarget: Send + Sync {
    async fn handle(
        &self,
        payload: serde_json::Value,
        context: &InvocationContext,
    ) -> Result<serde_json::Value>;
}

/// Invokes a named target and waits for its response.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Calls `target` with `payload`.
    ///
    /// Fails with `UnknownTarget` if nothing is registered under `target`
    /// and with `Invocation` if the target itself fails.
    async fn invoke(
        &self,
        target: &str,
        payload: serde_json::Value,
        correlation: CorrelationContext,
    ) -> Result<InvocationResponse>;
}

/// In-process invoker backed by a registry of targets.
#[derive(Clone, Default)]
pub struct LocalInvoker {
    targets: Arc<RwLock<HashMap<String, Arc<dyn InvocationTarget>>>>,
}

impl LocalInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` under `name`, replacing any previous registration.
    pub async fn register(&self, name: impl Into<String>, target: Arc<dyn InvocationTarget>) {
        self.targets.write().await.insert(name.into(), target);
    }
}

#[async_trait]
impl Invoker for LocalInvoker {
    #[tracing::instrument(
        skip(self, target, payload, correlation),
        fields(invocation_target = %target, request_id = %correlation.request_id)
    )]
    async fn invoke(
        &self,
        target: &str,
        payload: serde_json::Value,
        correlation: CorrelationContext,
    ) -> Result<InvocationResponse> {
        let handler = self
            .targets
            .read()
            .await
            .get(target)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownTarget(target.to_string()))?;

        let context = InvocationContext {
            invocation_id: RequestId::generate(),
            correlation,
        };

        let start = std::time::Instant::now();
        let outcome = handler.handle(payload, &context).await;
        metrics::histogram!("invocation_duration_seconds", "target" => target.to_string())
            .record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(payload) => Ok(InvocationResponse {
                target: target.to_string(),
                invocation_id: context.invocation_id,
                payload,
            }),
            Err(e) => {
                tracing::warn!(invocation_target = target, error = %e, "invocation failed");
                Err(PipelineError::Invocation {
                    target: target.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
