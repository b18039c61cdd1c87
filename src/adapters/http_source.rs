use crate::config::SourceConfig;
use crate::domain::ports::CarrierSource;
use crate::utils::error::{CargoError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetches the fleet-carrier payload over HTTP.
///
/// Session handling is left to whoever issues the access token; this only
/// attaches it as a bearer token.
#[derive(Debug, Clone)]
pub struct HttpCarrierSource {
    endpoint: String,
    access_token: Option<String>,
    client: Client,
}

impl HttpCarrierSource {
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            access_token,
            client,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let endpoint = crate::utils::validation::validate_required_field(
            "source.endpoint",
            &config.endpoint,
        )?;
        Self::new(
            endpoint.clone(),
            config.access_token.clone(),
            Duration::from_secs(config.timeout_seconds()),
        )
    }
}

#[async_trait]
impl CarrierSource for HttpCarrierSource {
    async fn fetch(&self) -> Result<serde_json::Value> {
        tracing::debug!("Making API request to: {}", self.endpoint);

        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(CargoError::ApiStatusError {
                endpoint: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        Ok(payload)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
