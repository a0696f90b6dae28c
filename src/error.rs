use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Invalid session id: {0}")]
    InvalidSession(String),

    #[error("Stage '{stage}' returned {actual} addresses for a batch of {expected}")]
    StageContract {
        stage: String,
        expected: usize,
        actual: usize,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, EnrichError>;
