//! Mock admin API for unit testing.
//!
//! This module provides an in-memory [`MarketApi`] that behaves like the
//! backend (assigns `_id`s, applies toggles, deletes and declarations) and
//! records every request it receives.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::ApiError;

use super::client::MarketApi;
use super::types::{DeclareResults, Market, NewMarket, ResultKey};

/// A request the mock received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// GET /markets.
    List,
    /// POST /admin/add-market.
    Create(NewMarket),
    /// PUT /admin/markets/{marketId}.
    SetBettingOpen {
        /// Target market.
        market_id: String,
        /// Requested flag.
        desired: bool,
    },
    /// DELETE /admin/markets/{id}.
    Delete {
        /// Target id.
        id: String,
    },
    /// POST /admin/markets/declare-results.
    DeclareResults(DeclareResults),
}

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail list requests.
    pub fail_list: bool,
    /// Whether to fail create requests.
    pub fail_create: bool,
    /// Whether to fail toggle requests.
    pub fail_toggle: bool,
    /// Whether to fail delete requests.
    pub fail_delete: bool,
    /// Whether to fail declare requests.
    pub fail_declare: bool,
    /// Message carried by injected failures.
    pub failure_message: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// Mock admin API for testing.
#[derive(Debug, Clone, Default)]
pub struct MockMarketApi {
    /// Mock configuration, shared so tests can flip failures mid-flow.
    config: Arc<Mutex<MockConfig>>,
    /// Server-side market collection.
    markets: Arc<Mutex<Vec<Market>>>,
    /// Requests received.
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Next backend id suffix.
    next_id: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockMarketApi {
    /// Create a new mock with no markets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        let mock = Self::default();
        *lock(&mock.config) = config;
        mock
    }

    /// Create a mock pre-loaded with markets.
    pub fn with_markets(markets: Vec<Market>) -> Self {
        let mock = Self::default();
        *lock(&mock.markets) = markets;
        mock
    }

    /// Replace the mock configuration.
    pub fn set_config(&self, config: MockConfig) {
        *lock(&self.config) = config;
    }

    /// Snapshot of the server-side collection.
    pub fn markets(&self) -> Vec<Market> {
        lock(&self.markets).clone()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Requests other than list fetches.
    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| *r != RecordedRequest::List)
            .collect()
    }

    async fn begin(&self, request: RecordedRequest) -> MockConfig {
        lock(&self.requests).push(request);
        let config = lock(&self.config).clone();
        if config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(config.latency_ms)).await;
        }
        config
    }

    fn failure(config: &MockConfig, operation: &'static str) -> ApiError {
        ApiError::RequestFailed {
            operation,
            status: 500,
            message: config
                .failure_message
                .clone()
                .unwrap_or_else(|| format!("Mock {} failure", operation)),
        }
    }

    fn not_found(operation: &'static str) -> ApiError {
        ApiError::RequestFailed {
            operation,
            status: 404,
            message: "Market not found".to_string(),
        }
    }
}

#[async_trait]
impl MarketApi for MockMarketApi {
    async fn list_markets(&self) -> Result<Vec<Market>, ApiError> {
        let config = self.begin(RecordedRequest::List).await;
        if config.fail_list {
            return Err(Self::failure(&config, "list markets"));
        }
        Ok(self.markets())
    }

    async fn create_market(&self, draft: &NewMarket) -> Result<Market, ApiError> {
        let config = self.begin(RecordedRequest::Create(draft.clone())).await;
        if config.fail_create {
            return Err(Self::failure(&config, "add market"));
        }

        let mut next_id = lock(&self.next_id);
        *next_id += 1;

        let mut market = Market::provisional(draft);
        market.id = Some(format!("oid-{}", *next_id));
        lock(&self.markets).push(market.clone());
        Ok(market)
    }

    async fn set_betting_open(&self, market_id: &str, desired: bool) -> Result<(), ApiError> {
        let config = self
            .begin(RecordedRequest::SetBettingOpen {
                market_id: market_id.to_string(),
                desired,
            })
            .await;
        if config.fail_toggle {
            return Err(Self::failure(&config, "toggle market"));
        }

        let mut markets = lock(&self.markets);
        let market = markets
            .iter_mut()
            .find(|m| m.market_id == market_id)
            .ok_or_else(|| Self::not_found("toggle market"))?;
        market.set_betting_open(desired);
        Ok(())
    }

    async fn delete_market(&self, id: &str) -> Result<(), ApiError> {
        let config = self
            .begin(RecordedRequest::Delete { id: id.to_string() })
            .await;
        if config.fail_delete {
            return Err(Self::failure(&config, "delete market"));
        }

        let mut markets = lock(&self.markets);
        let before = markets.len();
        markets.retain(|m| m.id.as_deref() != Some(id) && m.market_id != id);
        if markets.len() == before {
            return Err(Self::not_found("delete market"));
        }
        Ok(())
    }

    async fn declare_results(
        &self,
        market_id: &str,
        open_result: &str,
        close_result: &str,
    ) -> Result<(), ApiError> {
        let config = self
            .begin(RecordedRequest::DeclareResults(DeclareResults {
                market_id: market_id.to_string(),
                open_result: open_result.to_string(),
                close_result: close_result.to_string(),
            }))
            .await;
        if config.fail_declare {
            return Err(Self::failure(&config, "declare results"));
        }

        let mut markets = lock(&self.markets);
        let market = markets
            .iter_mut()
            .find(|m| m.market_id == market_id)
            .ok_or_else(|| Self::not_found("declare results"))?;
        market
            .results
            .insert(ResultKey::OpenNumber.as_ref(), open_result);
        market
            .results
            .insert(ResultKey::CloseNumber.as_ref(), close_result);
        Ok(())
    }
}

/// Builder for test markets.
pub struct MarketBuilder {
    market: Market,
}

impl MarketBuilder {
    /// Start a market with the given `marketId`; `_id` defaults to `oid-<marketId>`.
    pub fn new(market_id: impl Into<String>) -> Self {
        let market_id = market_id.into();
        Self {
            market: Market {
                id: Some(format!("oid-{}", market_id)),
                name: format!("{} Market", market_id),
                market_id,
                open_time: "10:00 AM".to_string(),
                close_time: "12:00 PM".to_string(),
                is_betting_open: false,
                open_betting: None,
                results: Default::default(),
            },
        }
    }

    /// Set the backend id.
    pub fn id(mut self, id: Option<&str>) -> Self {
        self.market.id = id.map(str::to_string);
        self
    }

    /// Set the display name.
    pub fn name(mut self, name: &str) -> Self {
        self.market.name = name.to_string();
        self
    }

    /// Set the betting flag.
    pub fn betting_open(mut self, open: bool) -> Self {
        self.market.is_betting_open = open;
        self
    }

    /// Set a result value.
    pub fn result(mut self, key: ResultKey, value: &str) -> Self {
        self.market.results.insert(key.as_ref(), value);
        self
    }

    /// Build the market.
    pub fn build(self) -> Market {
        self.market
    }
}
