//! View models for the admin dashboard.
//!
//! - [`list`]: market table with toggle, delete and add
//! - [`form`]: create-market form
//! - [`results`]: result declaration

pub mod form;
pub mod list;
pub mod results;

use strum::Display;

pub use form::{format_time, generate_market_id, MarketForm, SaveMarket};
pub use list::MarketListView;
pub use results::{MarketDetails, ResultDeclarationView};

/// Shown when the initial market fetch fails.
pub const LOAD_FAILED: &str = "Failed to load markets";

/// Lifecycle of a view's market collection.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LoadState {
    /// Fetch in flight.
    Loading,
    /// Collection available.
    Ready,
    /// Fetch failed; the view renders no table.
    Failed {
        /// Message to show in place of the table.
        message: String,
    },
}

/// Transient notice produced by the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The action succeeded.
    Success(String),
    /// The action failed; view state is unchanged.
    Error(String),
}

impl Notice {
    /// Notice text.
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    /// Whether this reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}
