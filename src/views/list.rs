//! Market list view: fetch, toggle, delete and add.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::{MarketError, Result};
use crate::market::repository::{find_by_market_id, MarketRepository, MarketRow};
use crate::market::{Market, MarketApi, NewMarket};
use crate::metrics;

use super::form::SaveMarket;
use super::{LoadState, Notice, LOAD_FAILED};

/// Market table state.
#[derive(Debug)]
pub struct MarketListView<A> {
    repo: MarketRepository<A>,
    state: LoadState,
    rows: Vec<MarketRow>,
    adding: bool,
    notice: Option<Notice>,
}

impl<A: MarketApi> MarketListView<A> {
    /// New view in the loading state.
    pub fn new(api: A) -> Self {
        Self {
            repo: MarketRepository::new(api),
            state: LoadState::Loading,
            rows: Vec::new(),
            adding: false,
            notice: None,
        }
    }

    /// Fetch the collection: `Loading → Ready | Failed`.
    pub async fn mount(&mut self) -> Result<()> {
        self.state = LoadState::Loading;

        match self.repo.fetch().await {
            Ok(rows) => {
                info!(count = rows.len(), "Markets loaded");
                self.rows = rows;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch markets: {}", e);
                self.rows.clear();
                self.state = LoadState::Failed {
                    message: LOAD_FAILED.to_string(),
                };
                Err(e.into())
            }
        }
    }

    /// Current load state.
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Rows to render. Empty unless the view is ready.
    pub fn rows(&self) -> &[MarketRow] {
        &self.rows
    }

    /// Whether a market is being added.
    pub fn is_adding(&self) -> bool {
        self.adding
    }

    /// Notice from the last action.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Take the notice, clearing it.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Row with this `marketId`.
    pub fn find(&self, market_id: &str) -> Option<&MarketRow> {
        find_by_market_id(&self.rows, market_id)
    }

    /// Row matching either the view-model id or the `marketId`.
    pub fn resolve(&self, key: &str) -> Option<&MarketRow> {
        self.rows
            .iter()
            .find(|row| row.id == key)
            .or_else(|| self.find(key))
    }

    /// Flip betting for `market_id`, whose flag the caller sees as `current`.
    ///
    /// Local state changes only after the server confirms. Returns the new flag.
    pub async fn toggle_betting(&mut self, market_id: &str, current: bool) -> Result<bool> {
        if self.find(market_id).is_none() {
            warn!(market_id, "Toggle requested for unknown market");
            self.notice = Some(Notice::Error("Market not found.".to_string()));
            return Err(MarketError::NotFound {
                market_id: market_id.to_string(),
            }
            .into());
        }

        let desired = !current;
        info!(market_id, desired, "Toggling betting");

        if let Err(e) = self.repo.api().set_betting_open(market_id, desired).await {
            self.notice = Some(Notice::Error(format!(
                "Failed to toggle market: {}",
                e.message()
            )));
            return Err(e.into());
        }

        if let Some(row) = self.rows.iter_mut().find(|r| r.market_id() == market_id) {
            row.market.set_betting_open(desired);
        }
        metrics::inc_betting_toggles();

        let status = if desired { "opened" } else { "closed" };
        self.notice = Some(Notice::Success(format!(
            "Betting {} for {}.",
            status, market_id
        )));
        Ok(desired)
    }

    /// Delete the row with view-model id `id` once `confirm` approves it.
    ///
    /// The row stays in place while the request runs and is removed only
    /// after the server confirms. Returns `false` when not confirmed.
    pub async fn delete_market<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&MarketRow) -> bool,
    {
        let Some(row) = self.rows.iter().find(|row| row.id == id) else {
            self.notice = Some(Notice::Error("Market not found.".to_string()));
            return Err(MarketError::NotFound {
                market_id: id.to_string(),
            }
            .into());
        };

        if !confirm(row) {
            info!(id, "Delete not confirmed");
            return Ok(false);
        }

        if let Err(e) = self.repo.api().delete_market(id).await {
            warn!(id, "Delete failed: {}", e);
            self.notice = Some(Notice::Error(format!(
                "Failed to delete market: {}",
                e.message()
            )));
            return Err(e.into());
        }

        // Re-resolve by id; the index may be stale after the await.
        if let Some(index) = self.rows.iter().position(|row| row.id == id) {
            let row = self.rows.remove(index);
            info!(id, market_id = %row.market_id(), "Market deleted");
        }
        metrics::inc_markets_deleted();
        self.notice = Some(Notice::Success("Market deleted successfully.".to_string()));
        Ok(true)
    }

    /// Create a market, then refetch the whole list.
    ///
    /// The refetched list is authoritative for server-assigned fields. If the
    /// refetch fails the previous rows stay and a notice says so.
    pub async fn add_market(&mut self, draft: NewMarket) -> Result<Market> {
        if self.adding {
            return Err(MarketError::AddInProgress.into());
        }

        let created = {
            let _busy = BusyFlag::raise(&mut self.adding);
            self.repo.api().create_market(&draft).await
        };

        let created = match created {
            Ok(market) => market,
            Err(e) => {
                self.notice = Some(Notice::Error(format!(
                    "Failed to add market: {}",
                    e.message()
                )));
                return Err(e.into());
            }
        };

        info!(market_id = %created.market_id, "Market added");
        metrics::inc_markets_created();

        match self.repo.fetch().await {
            Ok(rows) => {
                self.rows = rows;
                self.state = LoadState::Ready;
                self.notice = Some(Notice::Success(format!(
                    "Market {} added.",
                    created.name
                )));
            }
            Err(e) => {
                warn!("Refetch after add failed: {}", e);
                self.notice = Some(Notice::Error(format!(
                    "Market added but the list could not be refreshed: {}",
                    e.message()
                )));
            }
        }

        Ok(created)
    }
}

/// Holds a busy flag up until dropped, including when the owning future is
/// cancelled mid-request.
struct BusyFlag<'a>(&'a mut bool);

impl<'a> BusyFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[async_trait]
impl<A: MarketApi> SaveMarket for MarketListView<A> {
    async fn save(&mut self, draft: NewMarket) -> Result<Market> {
        self.add_market(draft).await
    }
}
