//! Admin API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::metrics;

use super::auth::TokenProvider;
use super::types::{BettingUpdate, DeclareResults, Market, NewMarket};

/// Remote market operations.
///
/// Each call issues exactly one request. There is no retry and no caching.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Fetch every market.
    async fn list_markets(&self) -> Result<Vec<Market>, ApiError>;

    /// Create a market and return it as the server knows it.
    async fn create_market(&self, draft: &NewMarket) -> Result<Market, ApiError>;

    /// Open or close betting on a market.
    async fn set_betting_open(&self, market_id: &str, desired: bool) -> Result<(), ApiError>;

    /// Delete a market.
    async fn delete_market(&self, id: &str) -> Result<(), ApiError>;

    /// Declare open and close results for a market.
    async fn declare_results(
        &self,
        market_id: &str,
        open_result: &str,
        close_result: &str,
    ) -> Result<(), ApiError>;
}

/// Error body returned by the admin API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Accepted create-market response shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateResponse {
    Wrapped { market: Market },
    Bare(Market),
}

/// HTTP client for the market admin API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL, always ending in `/`.
    base_url: Url,
    /// Bearer token source, consulted per request.
    auth: Arc<dyn TokenProvider>,
}

impl AdminClient {
    /// Create a client from config with the given token provider.
    pub fn new(config: &Config, auth: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| ApiError::Transport {
            operation: "build http client",
            source,
        })?;

        Ok(Self {
            http,
            base_url: normalize_base(&config.admin_api_url)?,
            auth,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path relative to the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// `admin/markets/{id}` with the id percent-encoded as one segment.
    fn market_endpoint(&self, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint("admin/markets")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => {
                debug!("No bearer token available, sending unauthenticated request");
                request
            }
        }
    }

    /// Send a request and turn any non-2xx status into `RequestFailed`.
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let _timer = metrics::timer_request(operation);

        let response = self.authorize(request).send().await.map_err(|source| {
            metrics::inc_requests_failed(operation);
            ApiError::Transport { operation, source }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        metrics::inc_requests_failed(operation);
        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
        warn!(operation, status = status.as_u16(), "Request failed: {}", message);

        Err(ApiError::RequestFailed {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MarketApi for AdminClient {
    #[instrument(skip(self))]
    async fn list_markets(&self) -> Result<Vec<Market>, ApiError> {
        let operation = "list markets";
        let url = self.endpoint("markets")?;

        let response = self.send(operation, self.http.get(url)).await?;
        let markets: Vec<Market> = response
            .json()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        debug!(count = markets.len(), "Fetched markets");
        Ok(markets)
    }

    #[instrument(skip(self, draft), fields(market_id = %draft.market_id))]
    async fn create_market(&self, draft: &NewMarket) -> Result<Market, ApiError> {
        let operation = "add market";
        let url = self.endpoint("admin/add-market")?;

        let response = self.send(operation, self.http.post(url).json(draft)).await?;
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        let market = match serde_json::from_str::<CreateResponse>(&body) {
            Ok(CreateResponse::Wrapped { market }) | Ok(CreateResponse::Bare(market)) => market,
            Err(_) => {
                debug!("Create response carried no market, using provisional record");
                Market::provisional(draft)
            }
        };

        Ok(market)
    }

    #[instrument(skip(self))]
    async fn set_betting_open(&self, market_id: &str, desired: bool) -> Result<(), ApiError> {
        let url = self.market_endpoint(market_id)?;
        let body = BettingUpdate {
            is_betting_open: desired,
        };

        self.send("toggle market", self.http.put(url).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_market(&self, id: &str) -> Result<(), ApiError> {
        let url = self.market_endpoint(id)?;

        self.send("delete market", self.http.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn declare_results(
        &self,
        market_id: &str,
        open_result: &str,
        close_result: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("admin/markets/declare-results")?;
        let body = DeclareResults {
            market_id: market_id.to_string(),
            open_result: open_result.to_string(),
            close_result: close_result.to_string(),
        };

        self.send("declare results", self.http.post(url).json(&body))
            .await?;
        Ok(())
    }
}

/// Parse the base URL and make sure relative joins append to its path.
fn normalize_base(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Pull the server's message out of an error body.
fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}
