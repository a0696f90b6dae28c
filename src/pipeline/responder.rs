use async_trait::async_trait;

use crate::domain::Address;
use crate::error::{EnrichError, Result};

/// A stage in the enrichment chain.
///
/// A responder takes ownership of the batch and returns a batch of the same
/// length where index `i` still corresponds to input index `i`. Entries may be
/// updated in place or replaced wholesale, but never reordered, added or dropped.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short stable name used in logs, metrics and contract errors.
    fn name(&self) -> &str;

    async fn respond(&self, addresses: Vec<Address>, ctx: &SessionContext) -> Result<Vec<Address>>;
}

/// Host-supplied context for one pipeline run.
///
/// The session id comes from the caller and is only ever used to compose the
/// report path, so it is restricted to characters that cannot escape a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Result<Self> {
        let session_id = session_id.into();
        if session_id.is_empty() {
            return Err(EnrichError::InvalidSession("session id is empty".to_string()));
        }
        if let Some(c) = session_id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(EnrichError::InvalidSession(format!(
                "unexpected character {:?} in session id",
                c
            )));
        }
        Ok(Self { session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
