use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

use super::responder::{Responder, SessionContext};
use crate::domain::Address;
use crate::error::{EnrichError, Result};
use crate::observability::metrics;

/// An ordered chain of responders. Each stage's output is the next stage's input.
///
/// Stages can be added at either end without rebuilding the chain. The pipeline
/// is itself a [`Responder`], so pipelines can be nested.
#[derive(Default)]
pub struct ResponderPipeline {
    responders: VecDeque<Box<dyn Responder>>,
}

impl ResponderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stage that runs before every existing stage.
    pub fn add_first(&mut self, responder: impl Responder + 'static) -> &mut Self {
        self.responders.push_front(Box::new(responder));
        self
    }

    /// Insert a stage that runs after every existing stage.
    pub fn add_last(&mut self, responder: impl Responder + 'static) -> &mut Self {
        self.responders.push_back(Box::new(responder));
        self
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.responders.iter().map(|r| r.name()).collect()
    }

    /// Run every stage in order and return the last stage's output.
    ///
    /// With no stages the batch comes back unchanged. Any stage error aborts the
    /// run; so does a stage that changes the batch length.
    pub async fn run(&self, addresses: Vec<Address>, ctx: &SessionContext) -> Result<Vec<Address>> {
        let expected = addresses.len();
        if self.responders.is_empty() {
            debug!("Pipeline has no stages, returning batch unchanged");
            return Ok(addresses);
        }

        info!(
            session = %ctx.session_id(),
            stages = self.responders.len(),
            batch = expected,
            "Starting pipeline run"
        );

        let mut batch = addresses;
        for responder in &self.responders {
            let stage = responder.name();
            let started = Instant::now();
            let span = info_span!("stage", stage = %stage);

            batch = match responder.respond(batch, ctx).instrument(span).await {
                Ok(output) => output,
                Err(e) => {
                    error!(stage = %stage, "Stage failed, aborting run: {}", e);
                    metrics::pipeline::run_failed(stage);
                    return Err(e);
                }
            };

            if batch.len() != expected {
                metrics::pipeline::run_failed(stage);
                return Err(EnrichError::StageContract {
                    stage: stage.to_string(),
                    expected,
                    actual: batch.len(),
                });
            }

            let secs = started.elapsed().as_secs_f64();
            metrics::pipeline::stage_completed(stage, secs);
            debug!(stage = %stage, secs, "Stage completed");
        }

        metrics::pipeline::run_completed(expected);
        Ok(batch)
    }
}

#[async_trait]
impl Responder for ResponderPipeline {
    fn name(&self) -> &str {
        "pipeline"
    }

    async fn respond(&self, addresses: Vec<Address>, ctx: &SessionContext) -> Result<Vec<Address>> {
        self.run(addresses, ctx).await
    }
}
