//! Tax estimation collaborator.
//!
//! The engine only ever needs `net_income_annual`. A live third-party API is used when
//! configured; any failure or timeout degrades to the bracket-based fallback and the
//! result is tagged with [`TaxSource::Fallback`].

mod fallback;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::TaxApiConfig;

pub use fallback::{estimate_fallback, solve_gross_for_net};
pub use http::{HttpTaxEstimator, TaxError};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxSource {
    Api,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub gross_annual: f64,
    pub federal_tax_annual: f64,
    pub state_tax_annual: f64,
    pub fica_tax_annual: f64,
    pub total_tax_annual: f64,
    pub net_income_annual: f64,
    pub source: TaxSource,
}

impl TaxBreakdown {
    pub fn from_parts(
        gross_annual: f64,
        federal_tax_annual: f64,
        state_tax_annual: f64,
        fica_tax_annual: f64,
        source: TaxSource,
    ) -> Self {
        let total_tax_annual = federal_tax_annual + state_tax_annual + fica_tax_annual;
        Self {
            gross_annual,
            federal_tax_annual,
            state_tax_annual,
            fica_tax_annual,
            total_tax_annual,
            net_income_annual: (gross_annual - total_tax_annual).max(0.0),
            source,
        }
    }

    pub fn net_income_monthly(&self) -> f64 {
        self.net_income_annual / 12.0
    }
}

#[async_trait]
pub trait TaxEstimator: Send + Sync {
    /// Never fails: implementations fall back to [`estimate_fallback`].
    async fn estimate(&self, gross_annual: f64, state: &str) -> TaxBreakdown;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTaxEstimator;

#[async_trait]
impl TaxEstimator for FallbackTaxEstimator {
    async fn estimate(&self, gross_annual: f64, state: &str) -> TaxBreakdown {
        estimate_fallback(gross_annual, state)
    }
}

/// Live API estimator when a URL is configured, otherwise the fallback alone.
pub fn estimator_from_config(config: &TaxApiConfig) -> Arc<dyn TaxEstimator> {
    if config.url.is_none() {
        tracing::info!("no tax API configured, using bracket estimates");
        return Arc::new(FallbackTaxEstimator);
    }
    match HttpTaxEstimator::new(config.clone()) {
        Ok(estimator) => Arc::new(estimator),
        Err(err) => {
            tracing::warn!(error = %err, "tax API client unavailable, using bracket estimates");
            Arc::new(FallbackTaxEstimator)
        }
    }
}

/// Flat effective state income tax rates applied to income above the standard deduction.
#[rustfmt::skip]
const STATE_RATES: [(&str, f64); 51] = [
    ("AL", 0.040), ("AK", 0.0), ("AZ", 0.025), ("AR", 0.039), ("CA", 0.060),
    ("CO", 0.044), ("CT", 0.050), ("DE", 0.052), ("DC", 0.065), ("FL", 0.0),
    ("GA", 0.0539), ("HI", 0.068), ("ID", 0.05695), ("IL", 0.0495), ("IN", 0.030),
    ("IA", 0.038), ("KS", 0.052), ("KY", 0.040), ("LA", 0.030), ("ME", 0.058),
    ("MD", 0.0475), ("MA", 0.050), ("MI", 0.0425), ("MN", 0.068), ("MS", 0.044),
    ("MO", 0.047), ("MT", 0.059), ("NE", 0.052), ("NV", 0.0), ("NH", 0.0),
    ("NJ", 0.055), ("NM", 0.049), ("NY", 0.060), ("NC", 0.0425), ("ND", 0.0195),
    ("OH", 0.0275), ("OK", 0.0475), ("OR", 0.0875), ("PA", 0.0307), ("RI", 0.0475),
    ("SC", 0.062), ("SD", 0.0), ("TN", 0.0), ("TX", 0.0), ("UT", 0.0455),
    ("VT", 0.066), ("VA", 0.0575), ("WA", 0.0), ("WV", 0.0482), ("WI", 0.053),
    ("WY", 0.0),
];

pub(crate) fn state_rate(code: &str) -> f64 {
    let upper = code.trim().to_ascii_uppercase();
    STATE_RATES
        .iter()
        .find(|(state, _)| *state == upper)
        .map(|(_, rate)| *rate)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::STATE_CODES;

    #[test]
    fn every_state_code_has_a_rate() {
        assert_eq!(STATE_RATES.len(), STATE_CODES.len());
        for code in STATE_CODES {
            assert!(STATE_RATES.iter().any(|(state, _)| *state == code), "{code}");
        }
    }

    #[test]
    fn from_parts_never_reports_negative_net() {
        let b = TaxBreakdown::from_parts(1_000.0, 800.0, 200.0, 100.0, TaxSource::Api);
        assert_eq!(b.total_tax_annual, 1_100.0);
        assert_eq!(b.net_income_annual, 0.0);
    }

    #[tokio::test]
    async fn unconfigured_api_uses_fallback_estimator() {
        let config = TaxApiConfig {
            url: None,
            api_key: None,
            timeout: std::time::Duration::from_secs(10),
        };
        let estimator = estimator_from_config(&config);
        let breakdown = estimator.estimate(70_000.0, "OR").await;
        assert_eq!(breakdown.source, TaxSource::Fallback);
    }

    #[tokio::test]
    async fn fallback_estimator_matches_free_function() {
        let estimated = FallbackTaxEstimator.estimate(85_000.0, "IL").await;
        assert_eq!(estimated, estimate_fallback(85_000.0, "IL"));
        assert!((estimated.net_income_monthly() - estimated.net_income_annual / 12.0).abs() < 1e-9);
    }
}
