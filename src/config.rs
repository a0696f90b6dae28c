use serde::Deserialize;
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;

use crate::constants;
use crate::error::{EnrichError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Port for the Prometheus exporter. Metrics stay in-process when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub address_lookup_url: String,
    pub carrier_route_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Max in-flight lookups per stage. 1 keeps stages strictly sequential;
    /// 0 fails to parse.
    pub concurrency: NonZeroUsize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            address_lookup_url: constants::ADDRESS_LOOKUP_URL.to_string(),
            carrier_route_url: constants::CARRIER_ROUTE_URL.to_string(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: constants::DEFAULT_TIMEOUT_SECONDS,
            concurrency: constants::DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub upload_folder: String,
    pub filename: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            upload_folder: constants::DEFAULT_UPLOAD_FOLDER.to_string(),
            filename: constants::DEFAULT_REPORT_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub environment: DeploymentEnvironment,
    pub supabase_url: Option<String>,
    pub supabase_bucket: Option<String>,
}

/// Which storage backend the host deploys with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentEnvironment {
    #[default]
    Development,
    Production,
}

impl FromStr for DeploymentEnvironment {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(EnrichError::Config(format!(
                "unknown deployment environment '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DeploymentEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EnrichError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment variables win over the file so deployments can switch backends
    /// without editing config.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(env) = std::env::var(constants::ENV_DEPLOYMENT) {
            self.storage.environment = env.parse()?;
        }
        if let Ok(url) = std::env::var(constants::ENV_SUPABASE_URL) {
            self.storage.supabase_url = Some(url);
        }
        if let Ok(bucket) = std::env::var(constants::ENV_SUPABASE_BUCKET) {
            self.storage.supabase_bucket = Some(bucket);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.report.filename.trim().is_empty() {
            return Err(EnrichError::Config(
                "report.filename must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.lookup.address_lookup_url, constants::ADDRESS_LOOKUP_URL);
        assert_eq!(config.report.upload_folder, "web/files");
        assert_eq!(config.report.filename, "data.json");
        assert_eq!(config.lookup.concurrency.get(), 1);
        assert_eq!(config.storage.environment, DeploymentEnvironment::Development);
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            metrics_port = 9899

            [lookup]
            concurrency = 4

            [storage]
            environment = "production"
            supabase_bucket = "reports"
            "#,
        )
        .unwrap();

        assert_eq!(config.lookup.concurrency.get(), 4);
        assert_eq!(config.lookup.user_agent, constants::DEFAULT_USER_AGENT);
        assert_eq!(config.storage.environment, DeploymentEnvironment::Production);
        assert_eq!(config.storage.supabase_bucket.as_deref(), Some("reports"));
        assert_eq!(config.metrics_port, Some(9899));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let parsed = toml::from_str::<Config>("[lookup]\nconcurrency = 0");
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_concurrency_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[lookup]\nconcurrency = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(EnrichError::Toml(_))));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load_from("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, EnrichError::Config(_)));
    }

    #[test]
    fn deployment_environment_parses_aliases() {
        assert_eq!("prod".parse::<DeploymentEnvironment>().unwrap(), DeploymentEnvironment::Production);
        assert_eq!("Development".parse::<DeploymentEnvironment>().unwrap(), DeploymentEnvironment::Development);
        assert!("staging".parse::<DeploymentEnvironment>().is_err());
    }
}
