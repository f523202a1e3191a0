//! Flight provider trait and fallback chain.
//!
//! Providers are tried in order until one succeeds; the chain is always
//! terminated by the mock stub, so callers never see a hard failure.
//! Fallback events are observable through tracing and a counter for tests.

use crate::mock::MockFlightProvider;
use async_trait::async_trait;
use flightfriend_core::config::AppConfig;
use flightfriend_core::error::Result;
use flightfriend_core::flight::{Flight, FlightSearchParams};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// An abstract source of flight records.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// Short provider name used in logs and fallback events.
    fn name(&self) -> &'static str;

    /// Searches for flights matching the request.
    ///
    /// Implementations return `Err` on any external failure; the chain
    /// converts that into a fallback, never into a user-visible error.
    async fn search(&self, params: &FlightSearchParams) -> Result<Vec<Flight>>;
}

/// Ordered provider chain: primary sources first, the mock stub last.
pub struct ProviderChain {
    providers: Vec<Box<dyn FlightProvider>>,
    stub: MockFlightProvider,
    fallbacks: AtomicU64,
}

impl ProviderChain {
    /// Builds a chain from explicit primary providers. The mock stub is
    /// always appended as the terminal element.
    pub fn new(providers: Vec<Box<dyn FlightProvider>>) -> Self {
        Self {
            providers,
            stub: MockFlightProvider::new(),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Builds the default chain from configuration: Aviationstack when a
    /// key is present and mocks are not forced, otherwise mock only.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut providers: Vec<Box<dyn FlightProvider>> = Vec::new();
        if !config.enable_mocks {
            if let Some(key) = &config.aviationstack_api_key {
                providers.push(Box::new(crate::aviationstack::AviationstackProvider::new(
                    key.clone(),
                )));
            }
        }
        if providers.is_empty() {
            info!("[ProviderChain] No external flight source configured, using mock data");
        }
        Self::new(providers)
    }

    /// Searches the chain in order. Infallible: the terminal stub always
    /// produces records.
    pub async fn search(&self, params: &FlightSearchParams) -> Vec<Flight> {
        for provider in &self.providers {
            match provider.search(params).await {
                Ok(flights) => {
                    info!(
                        "[ProviderChain] {} returned {} flights for {} -> {}",
                        provider.name(),
                        flights.len(),
                        params.source,
                        params.destination
                    );
                    return flights;
                }
                Err(err) => {
                    self.fallbacks.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "[ProviderChain] {} failed ({err}), falling back",
                        provider.name()
                    );
                }
            }
        }
        // The stub cannot fail; an error here would be an internal bug.
        self.stub
            .search(params)
            .await
            .unwrap_or_default()
    }

    /// Number of provider failures observed so far. Exposed for tests and
    /// operational logging.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flightfriend_core::error::FlightFriendError;

    struct FailingProvider;

    #[async_trait]
    impl FlightProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _params: &FlightSearchParams) -> Result<Vec<Flight>> {
            Err(FlightFriendError::external("failing", "injected failure"))
        }
    }

    fn params() -> FlightSearchParams {
        FlightSearchParams::new("DEL", "BOM", NaiveDate::from_ymd_opt(2026, 9, 1).unwrap())
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_mock_shape() {
        let chain = ProviderChain::new(vec![Box::new(FailingProvider)]);
        let flights = chain.search(&params()).await;

        assert!(!flights.is_empty(), "fallback must produce records");
        assert_eq!(chain.fallback_count(), 1);
        for flight in &flights {
            // Same field set as mock-mode output.
            assert_eq!(flight.departure_airport, "DEL");
            assert_eq!(flight.arrival_airport, "BOM");
            assert_eq!(flight.currency, "INR");
            assert!(flight.non_stop);
        }
    }

    #[tokio::test]
    async fn test_empty_chain_uses_stub_directly() {
        let chain = ProviderChain::new(Vec::new());
        let flights = chain.search(&params()).await;
        assert_eq!(flights.len(), 8);
        assert_eq!(chain.fallback_count(), 0);
    }

    #[tokio::test]
    async fn test_from_config_without_credentials() {
        let chain = ProviderChain::from_config(&AppConfig::mock_only());
        let flights = chain.search(&params()).await;
        assert!(!flights.is_empty());
    }
}
