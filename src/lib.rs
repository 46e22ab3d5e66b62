//! Admin client for numbers-game betting markets.
//!
//! A thin layer over the remote admin API: list markets, open or close
//! betting, add and delete markets, and declare results. The server owns
//! validation, persistence and authorization; this crate owns the view state
//! and the rules for when local state changes:
//!
//! ```text
//! toggle   lookup → PUT → flip locally on success
//! delete   confirm → detach → DELETE → drop, or re-insert on failure
//! add      POST → refetch full list
//! declare  lookup selection → POST → notice
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Market types, token providers, API client and repository
//! - [`views`]: List, create-form and result-declaration view models
//! - [`display`]: Terminal rendering
//! - [`metrics`]: Request latency and mutation counters

pub mod config;
pub mod display;
pub mod error;
pub mod market;
pub mod metrics;
pub mod views;

pub use config::Config;
pub use error::{AdminError, Result};
