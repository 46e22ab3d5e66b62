//! Terminal rendering of the views.

use tabled::{Table, Tabled};

use crate::market::{MarketRow, ResultKey};
use crate::views::{LoadState, MarketDetails, Notice};

#[derive(Tabled)]
struct MarketTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Market")]
    market_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Open")]
    open_time: String,
    #[tabled(rename = "Close")]
    close_time: String,
    #[tabled(rename = "Betting")]
    betting: String,
    #[tabled(rename = "Open No.")]
    open_number: String,
    #[tabled(rename = "Close No.")]
    close_number: String,
    #[tabled(rename = "Open Digit")]
    open_digit: String,
    #[tabled(rename = "Close Digit")]
    close_digit: String,
    #[tabled(rename = "Jodi")]
    jodi: String,
}

impl From<&MarketRow> for MarketTableRow {
    fn from(row: &MarketRow) -> Self {
        Self {
            id: row.id.clone(),
            market_id: row.market_type.clone(),
            name: row.market.name.clone(),
            open_time: row.market.open_time.clone(),
            close_time: row.market.close_time.clone(),
            betting: row.market.betting_status().to_string(),
            open_number: row.result(ResultKey::OpenNumber).to_string(),
            close_number: row.result(ResultKey::CloseNumber).to_string(),
            open_digit: row.result(ResultKey::OpenSingleDigit).to_string(),
            close_digit: row.result(ResultKey::CloseSingleDigit).to_string(),
            jodi: row.result(ResultKey::JodiResult).to_string(),
        }
    }
}

/// The markets table, or the state message when there is nothing to show.
pub fn markets_table(state: &LoadState, rows: &[MarketRow]) -> String {
    match state {
        LoadState::Loading => "Loading markets...".to_string(),
        LoadState::Failed { message } => format!("Error loading markets: {}", message),
        LoadState::Ready if rows.is_empty() => "No markets.".to_string(),
        LoadState::Ready => Table::new(rows.iter().map(MarketTableRow::from)).to_string(),
    }
}

/// Detail lines for the selected market.
pub fn details_lines(details: &MarketDetails) -> Vec<String> {
    let mut lines = vec![
        format!("Market ID: {}", details.market_id),
        format!("Name: {}", details.name),
        format!("Open Time: {}", details.open_time),
        format!("Close Time: {}", details.close_time),
        format!("Betting Status: {}", details.betting_status),
        "Results:".to_string(),
    ];
    lines.extend(
        details
            .results
            .iter()
            .map(|(label, value)| format!("  {}: {}", label, value)),
    );
    lines
}

/// One-line notice with a status marker.
pub fn notice_line(notice: &Notice) -> String {
    match notice {
        Notice::Success(message) => format!("OK: {}", message),
        Notice::Error(message) => format!("ERROR: {}", message),
    }
}
