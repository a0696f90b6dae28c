use async_trait::async_trait;
use tracing::info;

use crate::app::ports::StoragePort;
use crate::config::StorageConfig;
use crate::constants::ENV_SUPABASE_KEY;
use crate::error::{EnrichError, Result};

/// Uploads reports to Supabase Storage.
/// Config:
/// - `storage.supabase_url` or SUPABASE_URL (e.g., https://xyzcompany.supabase.co)
/// - `storage.supabase_bucket` or SUPABASE_BUCKET
/// - SUPABASE_SERVICE_ROLE_KEY (service role key, env only)
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let url = config
            .supabase_url
            .clone()
            .ok_or_else(|| EnrichError::Config("storage.supabase_url is required in production".to_string()))?;
        let bucket = config
            .supabase_bucket
            .clone()
            .ok_or_else(|| EnrichError::Config("storage.supabase_bucket is required in production".to_string()))?;
        let key = std::env::var(ENV_SUPABASE_KEY)?;
        Ok(Self::new(url, bucket, key))
    }

    /// Object endpoint for a report path inside the bucket.
    pub fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl StoragePort for SupabaseStorage {
    async fn write(&self, bytes: Vec<u8>, path: &str) -> Result<()> {
        let endpoint = self.object_url(path);
        let resp = self
            .client
            .put(&endpoint)
            .header("Authorization", format!("Bearer {}", self.key))
            .header("apikey", self.key.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(&[("upsert", "true")])
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EnrichError::Storage(format!(
                "Supabase upload failed: {} - {}",
                status, body
            )));
        }
        info!(path = %path, bucket = %self.bucket, "Uploaded report to Supabase");
        Ok(())
    }
}
