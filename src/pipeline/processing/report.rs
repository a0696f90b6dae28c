use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::app::ports::StoragePort;
use crate::constants;
use crate::domain::Address;
use crate::error::{EnrichError, Result};
use crate::observability::metrics;
use crate::pipeline::responder::{Responder, SessionContext};

/// Final stage: writes the enriched batch to storage once per run.
///
/// The backend is injected; this stage only decides the path and the bytes.
pub struct ReportGeneratorResponder {
    storage: Arc<dyn StoragePort>,
    upload_folder: String,
    filename: String,
}

impl ReportGeneratorResponder {
    pub fn new(storage: Arc<dyn StoragePort>, upload_folder: impl Into<String>) -> Self {
        Self {
            storage,
            upload_folder: upload_folder.into(),
            filename: constants::DEFAULT_REPORT_FILENAME.to_string(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// `{upload_folder}/{session_id}{filename}`, unique per session.
    pub fn report_path(&self, ctx: &SessionContext) -> String {
        let name = format!("{}{}", ctx.session_id(), self.filename);
        Path::new(&self.upload_folder)
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

/// Pretty JSON array of addresses in a stable field order.
pub fn serialize_report(addresses: &[Address]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(addresses)?)
}

#[async_trait]
impl Responder for ReportGeneratorResponder {
    fn name(&self) -> &str {
        "report"
    }

    async fn respond(&self, addresses: Vec<Address>, ctx: &SessionContext) -> Result<Vec<Address>> {
        let bytes = serialize_report(&addresses)?;
        let path = self.report_path(ctx);
        let size = bytes.len();

        self.storage
            .write(bytes, &path)
            .await
            .map_err(|e| match e {
                EnrichError::Storage(_) => e,
                other => EnrichError::Storage(format!("writing '{}': {}", path, other)),
            })?;

        metrics::report::written(size);
        info!(path = %path, bytes = size, addresses = addresses.len(), "Report written");
        Ok(addresses)
    }
}
