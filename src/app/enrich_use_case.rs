use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::app::ports::{AddressLookupPort, CarrierRoutePort, StoragePort};
use crate::config::Config;
use crate::domain::Address;
use crate::error::Result;
use crate::pipeline::processing::{
    AddressValidationResponder, CarrierRouteRetrieverResponder, ReportGeneratorResponder,
};
use crate::pipeline::{ResponderPipeline, SessionContext};

/// Use case for enriching one uploaded batch: validate, route, persist.
pub struct EnrichUseCase {
    config: Config,
    address_lookup: Arc<dyn AddressLookupPort>,
    carrier_routes: Arc<dyn CarrierRoutePort>,
    storage: Arc<dyn StoragePort>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichReport {
    pub session_id: String,
    pub report_path: String,
    pub total: usize,
    /// Entries the validation stage replaced with a better match
    pub corrected: usize,
    /// Entries that ended up with a carrier route
    pub routed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub addresses: Vec<Address>,
}

impl EnrichUseCase {
    pub fn new(
        config: Config,
        address_lookup: Arc<dyn AddressLookupPort>,
        carrier_routes: Arc<dyn CarrierRoutePort>,
        storage: Arc<dyn StoragePort>,
    ) -> Self {
        Self {
            config,
            address_lookup,
            carrier_routes,
            storage,
        }
    }

    fn report_stage(&self) -> ReportGeneratorResponder {
        ReportGeneratorResponder::new(self.storage.clone(), self.config.report.upload_folder.clone())
            .with_filename(self.config.report.filename.clone())
    }

    /// Validation, then carrier routes, then the report. Validation must come
    /// first because a correction replaces the whole entry.
    pub fn build_pipeline(&self) -> ResponderPipeline {
        let concurrency = self.config.lookup.concurrency;
        let mut pipeline = ResponderPipeline::new();
        pipeline
            .add_last(AddressValidationResponder::new(self.address_lookup.clone()).with_concurrency(concurrency))
            .add_last(CarrierRouteRetrieverResponder::new(self.carrier_routes.clone()).with_concurrency(concurrency))
            .add_last(self.report_stage());
        pipeline
    }

    /// Run the batch once through the default pipeline.
    #[instrument(skip(self, addresses, ctx), fields(session = %ctx.session_id(), batch = addresses.len()))]
    pub async fn enrich(&self, addresses: Vec<Address>, ctx: &SessionContext) -> Result<EnrichReport> {
        let started_at = Utc::now();
        let input = addresses.clone();

        let output = self.build_pipeline().run(addresses, ctx).await?;

        // Routing never touches core fields, so any core difference is a correction.
        let corrected = input.iter().zip(&output).filter(|(before, after)| before != after).count();
        let routed = output.iter().filter(|a| a.carrier_route().is_some()).count();

        let report = EnrichReport {
            session_id: ctx.session_id().to_string(),
            report_path: self.report_stage().report_path(ctx),
            total: output.len(),
            corrected,
            routed,
            started_at,
            finished_at: Utc::now(),
            addresses: output,
        };
        info!(
            total = report.total,
            corrected = report.corrected,
            routed = report.routed,
            path = %report.report_path,
            "Enrichment complete"
        );
        Ok(report)
    }
}
