//! Sequential execution with a validation gate after each stage.

use super::{Pipeline, RunReport, StageRecord};
use crate::cancellation::CancellationToken;
use crate::context::{RunIdentity, StageContext};
use crate::core::{IllegalTransition, PipelineEvent, RunState};
use crate::errors::PipelineError;
use crate::events::{EventSink, NoOpEventSink};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, error, info, info_span, warn, Instrument};

/// How long the runner waits on one stage, and which limit it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StageBudget {
    wait: Duration,
    reported: Duration,
}

impl Pipeline {
    /// Runs every stage in registration order, threading each output into
    /// the next stage.
    ///
    /// Returns the last stage's output, or `input` unchanged when no stages
    /// are registered. Stops at the first stage whose `execute` fails or whose
    /// `validate` rejects its output; no later stage is started and no partial
    /// result is returned.
    pub async fn run(&self, input: Value) -> Result<Value, PipelineError> {
        self.execute_run(input, None).await.map(RunReport::into_output)
    }

    /// Like [`run`](Self::run), but stops with [`PipelineError::Cancelled`]
    /// once `token` is cancelled.
    ///
    /// The token is checked before each stage and raced against the running
    /// stage, whose future is dropped on cancellation.
    pub async fn run_with_token(
        &self,
        input: Value,
        token: &CancellationToken,
    ) -> Result<Value, PipelineError> {
        self.execute_run(input, Some(token.clone()))
            .await
            .map(RunReport::into_output)
    }

    /// Like [`run`](Self::run), but returns per-stage timings on success.
    pub async fn run_traced(&self, input: Value) -> Result<RunReport, PipelineError> {
        self.execute_run(input, None).await
    }

    async fn execute_run(
        &self,
        input: Value,
        token: Option<CancellationToken>,
    ) -> Result<RunReport, PipelineError> {
        let identity = Arc::new(RunIdentity::new(self.name()));
        let span = info_span!("pipeline.run", pipeline = %self.name(), run_id = %identity.run_id);
        self.drive(input, identity, token).instrument(span).await
    }

    async fn drive(
        &self,
        input: Value,
        identity: Arc<RunIdentity>,
        token: Option<CancellationToken>,
    ) -> Result<RunReport, PipelineError> {
        let run_start = Instant::now();
        let deadline = self.config.run_timeout().map(|limit| (run_start + limit, limit));
        let run_id = identity.run_id.to_string();
        let mut state = RunState::NotStarted;
        let mut records = Vec::with_capacity(self.stages.len());
        let mut current = input;
        let stage_sink: Arc<dyn EventSink> = if self.config.emit_events {
            self.event_sink.clone()
        } else {
            Arc::new(NoOpEventSink)
        };

        info!(stage_count = self.stages.len(), "Pipeline run started");
        self.emit(&PipelineEvent::pipeline_started(self.name(), &run_id, self.stages.len()));

        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.name();

            if let Some(token) = token.as_ref().filter(|t| t.is_cancelled()) {
                let err = PipelineError::Cancelled {
                    stage: name.to_string(),
                    reason: token.reason().unwrap_or_default(),
                };
                return Err(self.fail(&mut state, &run_id, index, err));
            }

            let budget = match self.budget(deadline) {
                Ok(budget) => budget,
                Err(limit) => {
                    let err = PipelineError::Timeout {
                        stage: name.to_string(),
                        limit,
                    };
                    return Err(self.fail(&mut state, &run_id, index, err));
                }
            };

            checked(state.advance_to(index));
            debug!(stage = %name, stage_index = index, "Stage started");
            self.emit(&PipelineEvent::stage_started(name, index));

            let ctx = StageContext::new(
                identity.clone(),
                name,
                index,
                token.clone(),
                stage_sink.clone(),
            );
            let started = Instant::now();
            let execution = stage
                .execute(current, &ctx)
                .instrument(debug_span!("stage", stage = %name, stage_index = index));

            let output = match guard(execution, name, token.as_ref(), budget).await {
                Ok(Ok(output)) => output,
                Ok(Err(cause)) => {
                    let err = PipelineError::execution(name, cause);
                    return Err(self.fail(&mut state, &run_id, index, err));
                }
                Err(err) => return Err(self.fail(&mut state, &run_id, index, err)),
            };

            if !stage.validate(&output) {
                let err = PipelineError::validation(name, output);
                return Err(self.fail(&mut state, &run_id, index, err));
            }

            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
            debug!(stage = %name, stage_index = index, duration_ms, "Stage completed");
            self.emit(&PipelineEvent::stage_completed(name, index, duration_ms));
            records.push(StageRecord {
                name: name.to_string(),
                index,
                duration_ms,
            });
            current = output;
        }

        checked(state.succeed());
        let duration_ms = run_start.elapsed().as_secs_f64() * 1000.0;
        info!(duration_ms, "Pipeline run completed");
        self.emit(&PipelineEvent::pipeline_completed(self.name(), &run_id, duration_ms));

        Ok(RunReport {
            run_id: identity.run_id,
            pipeline: self.name().to_string(),
            output: current,
            stages: records,
            duration_ms,
            state,
        })
    }

    /// Computes the budget for the next stage.
    ///
    /// `Err` carries the run limit when the run deadline has already passed.
    fn budget(&self, deadline: Option<(Instant, Duration)>) -> Result<Option<StageBudget>, Duration> {
        let stage = self.config.stage_timeout().map(|limit| StageBudget {
            wait: limit,
            reported: limit,
        });
        let Some((deadline, run_limit)) = deadline else {
            return Ok(stage);
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(run_limit);
        }
        let run = StageBudget {
            wait: remaining,
            reported: run_limit,
        };
        Ok(Some(match stage {
            Some(stage) if stage.wait <= remaining => stage,
            _ => run,
        }))
    }

    /// Moves the run to `Failed`. `stage.failed` is only emitted for a stage
    /// that actually started.
    fn fail(
        &self,
        state: &mut RunState,
        run_id: &str,
        index: usize,
        err: PipelineError,
    ) -> PipelineError {
        let kind = err.kind();
        let stage = err.stage_name();
        let started = state.current_index() == Some(index);
        checked(state.fail(stage, kind));

        warn!(stage = %stage, stage_index = index, kind = %kind, error = %err, "Stage failed");
        if started {
            self.emit(&PipelineEvent::stage_failed(stage, index, &kind.to_string(), &err.to_string()));
        }
        self.emit(&PipelineEvent::pipeline_failed(self.name(), run_id, stage, &kind.to_string()));
        err
    }

    fn emit(&self, event: &PipelineEvent) {
        if self.config.emit_events {
            self.event_sink.handle(event);
        }
    }
}

/// Awaits a stage's execution under the optional token and time budget.
async fn guard<F>(
    execution: F,
    stage: &str,
    token: Option<&CancellationToken>,
    budget: Option<StageBudget>,
) -> Result<anyhow::Result<Value>, PipelineError>
where
    F: Future<Output = anyhow::Result<Value>>,
{
    let bounded = async {
        match budget {
            Some(budget) => tokio::time::timeout(budget.wait, execution)
                .await
                .map_err(|_| PipelineError::Timeout {
                    stage: stage.to_string(),
                    limit: budget.reported,
                }),
            None => Ok(execution.await),
        }
    };

    match token {
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(PipelineError::Cancelled {
                    stage: stage.to_string(),
                    reason: token.reason().unwrap_or_default(),
                }),
                result = bounded => result,
            }
        }
        None => bounded.await,
    }
}

fn checked(transition: Result<(), IllegalTransition>) {
    if let Err(e) = &transition {
        error!(error = %e, "Run state machine violated");
    }
    debug_assert!(transition.is_ok(), "illegal run state transition");
}
