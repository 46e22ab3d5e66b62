//! Shared market query and the one normalization rule both views use.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::ApiError;

use super::client::MarketApi;
use super::types::{Market, ResultKey};

/// A market as the views hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRow {
    /// View-model id: backend `_id`, or `marketId` when the backend sent none.
    pub id: String,
    /// Mirrors `marketId`.
    pub market_type: String,
    /// The market exactly as the server returned it.
    pub market: Market,
}

impl MarketRow {
    /// Wrap a server market.
    pub fn from_market(market: Market) -> Self {
        let id = market
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| market.market_id.clone());

        Self {
            id,
            market_type: market.market_id.clone(),
            market,
        }
    }

    /// The market's `marketId`.
    pub fn market_id(&self) -> &str {
        &self.market.market_id
    }

    /// Display value of a result field (placeholder when unset).
    pub fn result(&self, key: ResultKey) -> &str {
        self.market.results.display_value(key)
    }
}

/// Normalize a fetched collection into rows.
///
/// Rows keep server order. A repeated `marketId` keeps its first occurrence so
/// lookups by `marketId` resolve to at most one row. Documents without a
/// `marketId` are skipped.
pub fn normalize(markets: Vec<Market>) -> Vec<MarketRow> {
    let mut seen = HashSet::with_capacity(markets.len());

    markets
        .into_iter()
        .filter(|market| {
            if market.market_id.trim().is_empty() {
                warn!(id = ?market.id, "Market without marketId in market list, skipping");
                return false;
            }
            let fresh = seen.insert(market.market_id.clone());
            if !fresh {
                warn!(market_id = %market.market_id, "Duplicate marketId in market list, keeping first");
            }
            fresh
        })
        .map(MarketRow::from_market)
        .collect()
}

/// Find a row by `marketId`.
pub fn find_by_market_id<'a>(rows: &'a [MarketRow], market_id: &str) -> Option<&'a MarketRow> {
    rows.iter().find(|row| row.market_id() == market_id)
}

/// Market query shared by the list and result views.
#[derive(Debug, Clone)]
pub struct MarketRepository<A> {
    api: A,
}

impl<A: MarketApi> MarketRepository<A> {
    /// Create a repository over `api`.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The underlying API, for mutations.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch and normalize the full collection.
    pub async fn fetch(&self) -> Result<Vec<MarketRow>, ApiError> {
        let markets = self.api.list_markets().await?;
        let rows = normalize(markets);
        debug!(count = rows.len(), "Normalized market rows");
        Ok(rows)
    }
}
