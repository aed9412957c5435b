use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{TaxBreakdown, TaxEstimator, TaxSource, estimate_fallback};
use crate::config::TaxApiConfig;

#[derive(Debug, Error)]
pub enum TaxError {
    #[error("Tax API client configuration failed: {0}")]
    Configuration(String),

    #[error("Tax API request failed: {0}")]
    Transport(String),

    #[error("Tax API returned status {0}")]
    Status(u16),

    #[error("Tax API response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxRequest<'a> {
    salary: f64,
    state: &'a str,
    filing_status: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    #[serde(alias = "federal", alias = "federal_tax")]
    federal_tax: f64,
    #[serde(alias = "state", alias = "state_tax", default)]
    state_tax: f64,
    #[serde(alias = "fica", alias = "fica_tax")]
    fica_tax: f64,
}

/// Third-party tax API client. Requests are bounded by the configured timeout.
pub struct HttpTaxEstimator {
    client: Client,
    config: TaxApiConfig,
    endpoint: String,
}

impl HttpTaxEstimator {
    pub fn new(config: TaxApiConfig) -> Result<Self, TaxError> {
        let endpoint = config
            .url
            .clone()
            .ok_or_else(|| TaxError::Configuration("tax API url is not set".to_string()))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TaxError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    pub async fn fetch(&self, gross_annual: f64, state: &str) -> Result<TaxBreakdown, TaxError> {
        let mut request = self.client.post(&self.endpoint).json(&TaxRequest {
            salary: gross_annual,
            state,
            filing_status: "single",
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TaxError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TaxError::Status(status.as_u16()));
        }
        let body: TaxResponse = response
            .json()
            .await
            .map_err(|e| TaxError::Decode(e.to_string()))?;

        Ok(TaxBreakdown::from_parts(
            gross_annual,
            body.federal_tax.max(0.0),
            body.state_tax.max(0.0),
            body.fica_tax.max(0.0),
            TaxSource::Api,
        ))
    }
}

#[async_trait]
impl TaxEstimator for HttpTaxEstimator {
    async fn estimate(&self, gross_annual: f64, state: &str) -> TaxBreakdown {
        match self.fetch(gross_annual, state).await {
            Ok(breakdown) => breakdown,
            Err(err) => {
                tracing::warn!(error = %err, state, "tax API unavailable, using fallback estimate");
                estimate_fallback(gross_annual, state)
            }
        }
    }
}
