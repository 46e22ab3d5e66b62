//! Result declaration view.

use tracing::{error, info, warn};

use crate::error::{MarketError, Result};
use crate::market::repository::{find_by_market_id, MarketRepository, MarketRow};
use crate::market::MarketApi;
use crate::metrics;

use super::{LoadState, Notice, LOAD_FAILED};

/// Shown after a successful declaration.
pub const DECLARE_SUCCESS: &str = "Game results updated successfully!";

/// Shown after a failed declaration.
pub const DECLARE_FAILURE: &str = "Failed to update game results. Please try again!";

/// What the view renders for the selected market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDetails {
    /// `marketId`.
    pub market_id: String,
    /// Display name.
    pub name: String,
    /// Opening time.
    pub open_time: String,
    /// Closing time.
    pub close_time: String,
    /// "Open" or "Closed".
    pub betting_status: String,
    /// Labelled result values, placeholders included.
    pub results: Vec<(String, String)>,
}

impl MarketDetails {
    fn from_row(row: &MarketRow) -> Self {
        let market = &row.market;
        Self {
            market_id: market.market_id.clone(),
            name: market.name.clone(),
            open_time: market.open_time.clone(),
            close_time: market.close_time.clone(),
            betting_status: market.betting_status().to_string(),
            results: market.results.display_entries(),
        }
    }
}

/// Declare results for one selected market.
#[derive(Debug)]
pub struct ResultDeclarationView<A> {
    repo: MarketRepository<A>,
    state: LoadState,
    rows: Vec<MarketRow>,
    selected: Option<String>,
    /// Open result input, sent as typed.
    pub open_result: String,
    /// Close result input, sent as typed.
    pub close_result: String,
    notice: Option<Notice>,
}

impl<A: MarketApi> ResultDeclarationView<A> {
    /// New view in the loading state.
    pub fn new(api: A) -> Self {
        Self {
            repo: MarketRepository::new(api),
            state: LoadState::Loading,
            rows: Vec::new(),
            selected: None,
            open_result: String::new(),
            close_result: String::new(),
            notice: None,
        }
    }

    /// Fetch markets and select the first one.
    pub async fn mount(&mut self) -> Result<()> {
        self.state = LoadState::Loading;

        match self.repo.fetch().await {
            Ok(rows) => {
                self.selected = rows.first().map(|row| row.market_id().to_string());
                self.rows = rows;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch markets: {}", e);
                self.rows.clear();
                self.selected = None;
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

    /// Markets available for selection.
    pub fn rows(&self) -> &[MarketRow] {
        &self.rows
    }

    /// Notice from the last submit.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Selected `marketId`.
    pub fn selected_market_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selected market, if it is still in the collection.
    pub fn selected_market(&self) -> Option<&MarketRow> {
        self.selected
            .as_deref()
            .and_then(|id| find_by_market_id(&self.rows, id))
    }

    /// Select a market by `marketId`.
    pub fn select(&mut self, market_id: &str) -> Result<()> {
        if find_by_market_id(&self.rows, market_id).is_none() {
            return Err(MarketError::NotFound {
                market_id: market_id.to_string(),
            }
            .into());
        }
        self.selected = Some(market_id.to_string());
        Ok(())
    }

    /// Set both result inputs.
    pub fn set_results(&mut self, open_result: impl Into<String>, close_result: impl Into<String>) {
        self.open_result = open_result.into();
        self.close_result = close_result.into();
    }

    /// Declare the two inputs for the selected market.
    ///
    /// Nothing is sent if the selection no longer resolves. Inputs are opaque.
    pub async fn submit(&mut self) -> Result<()> {
        let Some(market_id) = self.selected_market().map(|row| row.market_id().to_string()) else {
            let market_id = self.selected.clone().unwrap_or_default();
            warn!(market_id = %market_id, "No selected market to declare results for");
            self.notice = Some(Notice::Error("Market not found.".to_string()));
            return Err(MarketError::NotFound { market_id }.into());
        };

        info!(market_id = %market_id, "Declaring results");

        match self
            .repo
            .api()
            .declare_results(&market_id, &self.open_result, &self.close_result)
            .await
        {
            Ok(()) => {
                metrics::inc_results_declared();
                self.notice = Some(Notice::Success(DECLARE_SUCCESS.to_string()));
                Ok(())
            }
            Err(e) => {
                error!(market_id = %market_id, "Declare results failed: {}", e);
                self.notice = Some(Notice::Error(DECLARE_FAILURE.to_string()));
                Err(e.into())
            }
        }
    }

    /// Details of the selected market.
    pub fn details(&self) -> Option<MarketDetails> {
        self.selected_market().map(MarketDetails::from_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::mock::{MarketBuilder, MockConfig, MockMarketApi, RecordedRequest};
    use crate::market::types::{DeclareResults, ResultKey};
    use pretty_assertions::assert_eq;

    async fn ready_view(api: MockMarketApi) -> ResultDeclarationView<MockMarketApi> {
        let mut view = ResultDeclarationView::new(api);
        view.mount().await.unwrap();
        view
    }

    fn two_markets() -> MockMarketApi {
        MockMarketApi::with_markets(vec![
            MarketBuilder::new("M1").name("Morning").build(),
            MarketBuilder::new("M2").name("Evening").betting_open(true).build(),
        ])
    }

    #[tokio::test]
    async fn mount_selects_first_market() {
        let view = ready_view(two_markets()).await;
        assert_eq!(view.state(), &LoadState::Ready);
        assert_eq!(view.selected_market_id(), Some("M1"));
    }

    #[tokio::test]
    async fn mount_failure_halts() {
        let api = MockMarketApi::with_config(MockConfig {
            fail_list: true,
            ..Default::default()
        });
        let mut view = ResultDeclarationView::new(api);

        assert!(view.mount().await.is_err());
        assert!(matches!(view.state(), LoadState::Failed { .. }));
        assert!(view.details().is_none());
    }

    #[tokio::test]
    async fn submit_posts_selected_market_and_inputs() {
        let api = two_markets();
        let mut view = ready_view(api.clone()).await;

        view.select("M2").unwrap();
        view.set_results("45", "67");
        view.submit().await.unwrap();

        assert_eq!(
            api.mutations(),
            vec![RecordedRequest::DeclareResults(DeclareResults {
                market_id: "M2".to_string(),
                open_result: "45".to_string(),
                close_result: "67".to_string(),
            })]
        );
        assert_eq!(view.notice(), Some(&Notice::Success(DECLARE_SUCCESS.to_string())));
    }

    #[tokio::test]
    async fn submit_failure_shows_generic_notice() {
        let api = two_markets();
        let mut view = ready_view(api.clone()).await;
        api.set_config(MockConfig {
            fail_declare: true,
            failure_message: Some("Results already declared".to_string()),
            ..Default::default()
        });

        view.set_results("1", "2");
        assert!(view.submit().await.is_err());

        assert_eq!(view.notice(), Some(&Notice::Error(DECLARE_FAILURE.to_string())));
        assert_eq!(view.state(), &LoadState::Ready);
    }

    #[tokio::test]
    async fn submit_with_empty_collection_sends_nothing() {
        let api = MockMarketApi::new();
        let mut view = ready_view(api.clone()).await;

        assert!(view.submit().await.is_err());
        assert!(api.mutations().is_empty());
    }

    #[tokio::test]
    async fn select_rejects_unknown_market() {
        let mut view = ready_view(two_markets()).await;
        assert!(view.select("M9").is_err());
        assert_eq!(view.selected_market_id(), Some("M1"));
    }

    #[tokio::test]
    async fn declaring_on_empty_results_sends_only_inputs() {
        let api = two_markets();
        let mut view = ready_view(api.clone()).await;

        view.set_results("123", "456");
        view.submit().await.unwrap();

        let body = match &api.mutations()[0] {
            RecordedRequest::DeclareResults(body) => serde_json::to_value(body).unwrap(),
            other => panic!("unexpected request {:?}", other),
        };
        assert_eq!(
            body,
            serde_json::json!({"marketId": "M1", "openResult": "123", "closeResult": "456"})
        );

        // Local view is not rewritten; every field still shows the placeholder.
        let details = view.details().unwrap();
        assert!(details.results.iter().all(|(_, v)| v == "---"));
    }

    #[tokio::test]
    async fn details_render_labels_and_status() {
        let api = MockMarketApi::with_markets(vec![MarketBuilder::new("M1")
            .betting_open(true)
            .result(ResultKey::OpenSingleDigit, "6")
            .build()]);
        let view = ready_view(api).await;

        let details = view.details().unwrap();
        assert_eq!(details.market_id, "M1");
        assert_eq!(details.betting_status, "Open");
        assert_eq!(details.open_time, "10:00 AM");
        assert!(details
            .results
            .contains(&("Open Single Digit".to_string(), "6".to_string())));
        assert!(details
            .results
            .contains(&("Jodi Result".to_string(), "---".to_string())));
    }
}
