//! Stage trait and implementations.
//!
//! A stage is a named transform with its own acceptance check. Stages see
//! the previous stage's output as their input and know nothing else about
//! the pipeline they run in.

use crate::context::StageContext;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A validation predicate over a stage output.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Transforms the previous stage's output into this stage's output.
    ///
    /// May suspend on external work. Any error is forwarded to the caller of
    /// `run` as the cause of an execution failure.
    async fn execute(&self, input: Value, ctx: &StageContext) -> anyhow::Result<Value>;

    /// Decides whether `output` may be passed to the next stage.
    ///
    /// Must be pure. Accepts everything unless overridden.
    fn validate(&self, _output: &Value) -> bool {
        true
    }
}

/// A stage built from a synchronous closure.
pub struct FnStage<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    name: String,
    func: F,
    validator: Option<Validator>,
}

impl<F> FnStage<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    /// Creates a new function-based stage that accepts every output.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            validator: None,
        }
    }

    /// Sets the validation predicate.
    #[must_use]
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Value, _ctx: &StageContext) -> anyhow::Result<Value> {
        (self.func)(input)
    }

    fn validate(&self, output: &Value) -> bool {
        self.validator.as_ref().map_or(true, |v| v(output))
    }
}

/// A stage built from an async closure.
///
/// The closure receives an owned copy of the stage context so the returned
/// future can be `'static`.
pub struct AsyncFnStage<F, Fut>
where
    F: Fn(Value, StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    name: String,
    func: F,
    validator: Option<Validator>,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnStage<F, Fut>
where
    F: Fn(Value, StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    /// Creates a new async function-based stage that accepts every output.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            validator: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the validation predicate.
    #[must_use]
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl<F, Fut> Debug for AsyncFnStage<F, Fut>
where
    F: Fn(Value, StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStage")
            .field("name", &self.name)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Stage for AsyncFnStage<F, Fut>
where
    F: Fn(Value, StageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Value, ctx: &StageContext) -> anyhow::Result<Value> {
        (self.func)(input, ctx.clone()).await
    }

    fn validate(&self, output: &Value) -> bool {
        self.validator.as_ref().map_or(true, |v| v(output))
    }
}

/// A stage that passes its input through unchanged.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Value, _ctx: &StageContext) -> anyhow::Result<Value> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunIdentity;
    use crate::events::NoOpEventSink;
    use serde_json::json;

    fn test_stage_context(name: &str) -> StageContext {
        StageContext::new(Arc::new(RunIdentity::new("test")), name, 0, None, Arc::new(NoOpEventSink))
    }

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("double", |v: Value| {
            let n = v.as_i64().ok_or_else(|| anyhow::anyhow!("expected a number"))?;
            Ok(json!(n * 2))
        })
        .with_validator(|out| out.as_i64().is_some_and(|n| n < 100));

        assert_eq!(stage.name(), "double");

        let ctx = test_stage_context("double");
        let out = stage.execute(json!(21), &ctx).await.unwrap();
        assert_eq!(out, json!(42));
        assert!(stage.validate(&out));
        assert!(!stage.validate(&json!(200)));

        let err = stage.execute(json!("x"), &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "expected a number");
    }

    #[tokio::test]
    async fn test_async_fn_stage_sees_context() {
        let stage = AsyncFnStage::new("tag", |v: Value, ctx: StageContext| async move {
            tokio::task::yield_now().await;
            Ok::<_, anyhow::Error>(json!({"input": v, "stage": ctx.stage_name()}))
        });

        let ctx = test_stage_context("tag");
        let out = stage.execute(json!(1), &ctx).await.unwrap();
        assert_eq!(out, json!({"input": 1, "stage": "tag"}));
        assert!(stage.validate(&out));
    }

    #[tokio::test]
    async fn test_noop_stage_is_identity() {
        let stage = NoOpStage::new("noop");
        let ctx = test_stage_context("noop");

        let input = json!({"brief": "x"});
        let out = stage.execute(input.clone(), &ctx).await.unwrap();
        assert_eq!(out, input);
        assert!(stage.validate(&Value::Null));
    }
}
