//! Market module for the admin API.
//!
//! This module handles:
//! - Market types and data structures
//! - Bearer token providers
//! - Admin API client
//! - The shared market repository
//! - Mock client for testing

pub mod auth;
pub mod client;
pub mod mock;
pub mod repository;
pub mod types;

pub use auth::{provider_from_config, StaticToken, StoredToken, TokenProvider, TokenStore};
pub use client::{AdminClient, MarketApi};
pub use mock::{MarketBuilder, MockConfig, MockMarketApi, RecordedRequest};
pub use repository::{MarketRepository, MarketRow};
pub use types::{Market, MarketResults, NewMarket, ResultKey, RESULT_PLACEHOLDER};
