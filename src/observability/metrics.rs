//! Metrics for the enrichment pipeline.
//!
//! Recording goes through the `metrics` facade. Without an installed recorder
//! every call is a no-op, so stages can record unconditionally.

use std::fmt;
use std::net::SocketAddr;

use tracing::{info, warn};

/// Every metric name the pipeline emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Pipeline metrics
    PipelineRunsCompleted,
    PipelineRunsFailed,
    PipelineStageDuration,
    PipelineBatchSize,

    // Validation metrics
    ValidationConfirmed,
    ValidationCorrected,
    ValidationNoCandidate,

    // Carrier route metrics
    CarrierRouteAssigned,
    CarrierRouteMissing,

    // Report metrics
    ReportWrites,
    ReportBytes,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::PipelineRunsCompleted => "enrich_pipeline_runs_completed_total",
            MetricName::PipelineRunsFailed => "enrich_pipeline_runs_failed_total",
            MetricName::PipelineStageDuration => "enrich_pipeline_stage_duration_seconds",
            MetricName::PipelineBatchSize => "enrich_pipeline_batch_size",

            MetricName::ValidationConfirmed => "enrich_validation_confirmed_total",
            MetricName::ValidationCorrected => "enrich_validation_corrected_total",
            MetricName::ValidationNoCandidate => "enrich_validation_no_candidate_total",

            MetricName::CarrierRouteAssigned => "enrich_carrier_route_assigned_total",
            MetricName::CarrierRouteMissing => "enrich_carrier_route_missing_total",

            MetricName::ReportWrites => "enrich_report_writes_total",
            MetricName::ReportBytes => "enrich_report_bytes",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Installs the Prometheus exporter when a port is configured.
pub fn init(port: Option<u16>) {
    let Some(port) = port else {
        info!("Metrics exporter disabled (no metrics_port configured)");
        return;
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}

pub mod pipeline {
    use super::MetricName;

    pub fn stage_completed(stage: &str, secs: f64) {
        ::metrics::histogram!(MetricName::PipelineStageDuration.as_str(), "stage" => stage.to_string())
            .record(secs);
    }

    pub fn run_completed(batch_size: usize) {
        ::metrics::counter!(MetricName::PipelineRunsCompleted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PipelineBatchSize.as_str()).record(batch_size as f64);
    }

    pub fn run_failed(stage: &str) {
        ::metrics::counter!(MetricName::PipelineRunsFailed.as_str(), "stage" => stage.to_string())
            .increment(1);
    }
}

pub mod validation {
    use super::MetricName;

    /// The best candidate matched the address on every core field
    pub fn confirmed() {
        ::metrics::counter!(MetricName::ValidationConfirmed.as_str()).increment(1);
    }

    /// The address was replaced by the best candidate
    pub fn corrected() {
        ::metrics::counter!(MetricName::ValidationCorrected.as_str()).increment(1);
    }

    pub fn no_candidate() {
        ::metrics::counter!(MetricName::ValidationNoCandidate.as_str()).increment(1);
    }
}

pub mod carrier_route {
    use super::MetricName;

    pub fn assigned() {
        ::metrics::counter!(MetricName::CarrierRouteAssigned.as_str()).increment(1);
    }

    pub fn missing() {
        ::metrics::counter!(MetricName::CarrierRouteMissing.as_str()).increment(1);
    }
}

pub mod report {
    use super::MetricName;

    pub fn written(bytes: usize) {
        ::metrics::counter!(MetricName::ReportWrites.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ReportBytes.as_str()).record(bytes as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn names_follow_prometheus_conventions() {
        assert!(MetricName::ValidationCorrected.as_str().ends_with("_total"));
        assert!(MetricName::PipelineStageDuration.as_str().ends_with("_seconds"));
        assert_eq!(
            MetricName::CarrierRouteAssigned.to_string(),
            "enrich_carrier_route_assigned_total"
        );
    }

    #[test]
    fn recorded_metrics_reach_the_prometheus_exporter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            validation::corrected();
            carrier_route::missing();
            pipeline::stage_completed("address_validation", 0.25);
            report::written(128);
        });

        let rendered = handle.render();
        assert!(rendered.contains("enrich_validation_corrected_total 1"), "{}", rendered);
        assert!(rendered.contains(MetricName::CarrierRouteMissing.as_str()));
        assert!(rendered.contains(MetricName::PipelineStageDuration.as_str()));
        assert!(rendered.contains("stage=\"address_validation\""));
        assert!(rendered.contains(MetricName::ReportWrites.as_str()));
    }
}
