use crate::utils::error::Result;
use async_trait::async_trait;

/// Producer of raw fleet-carrier payloads, as returned by the companion API.
#[async_trait]
pub trait CarrierSource: Send + Sync {
    async fn fetch(&self) -> Result<serde_json::Value>;

    /// Human readable origin, used in log lines.
    fn describe(&self) -> String;
}
