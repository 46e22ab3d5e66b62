//! Market types shared by the API client and the views.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// Shown for result fields the server has not filled in. Display only.
pub const RESULT_PLACEHOLDER: &str = "---";

/// Result fields the dashboard knows about, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ResultKey {
    /// Open panel number.
    OpenNumber,
    /// Close panel number.
    CloseNumber,
    /// Single digit derived from the open number.
    OpenSingleDigit,
    /// Single digit derived from the close number.
    CloseSingleDigit,
    /// Two-digit jodi.
    JodiResult,
}

impl ResultKey {
    /// All recognized keys in display order.
    pub const ALL: [ResultKey; 5] = [
        ResultKey::OpenNumber,
        ResultKey::CloseNumber,
        ResultKey::OpenSingleDigit,
        ResultKey::CloseSingleDigit,
        ResultKey::JodiResult,
    ];

    /// Spaced title label, e.g. "Open Single Digit".
    pub fn label(&self) -> String {
        result_label(self.as_ref())
    }
}

/// Turn a camelCase result key into a spaced title label.
pub fn result_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.push(ch);
        } else {
            label.push(ch);
        }
    }
    label.trim().to_string()
}

/// Declared results of a market, keyed by result field name.
///
/// Only values the server actually sent are stored. Placeholders are produced
/// by [`MarketResults::display_value`] and never enter this map, so they
/// cannot be sent back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarketResults {
    entries: BTreeMap<String, String>,
}

impl MarketResults {
    /// Value for `key`, if the server set a non-empty one.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value for a recognized key, or the placeholder.
    pub fn display_value(&self, key: ResultKey) -> &str {
        self.get(key.as_ref()).unwrap_or(RESULT_PLACEHOLDER)
    }

    /// Set a result value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// True when no result has been declared.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|v| v.is_empty())
    }

    /// Labelled display entries: recognized keys first (placeholder when
    /// unset), then any other keys the server returned.
    pub fn display_entries(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = ResultKey::ALL
            .iter()
            .map(|key| (key.label(), self.display_value(*key).to_string()))
            .collect();

        for (key, value) in &self.entries {
            if key.parse::<ResultKey>().is_ok() {
                continue;
            }
            let shown = if value.is_empty() {
                RESULT_PLACEHOLDER
            } else {
                value.as_str()
            };
            out.push((result_label(key), shown.to_string()));
        }

        out
    }
}

impl<'de> Deserialize<'de> for MarketResults {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;

        let entries = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();

        Ok(Self { entries })
    }
}

/// A betting market as returned by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// Backend document id.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Externally meaningful market identifier. Empty when the server omitted it.
    #[serde(default)]
    pub market_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Opening time, `h:mm AM`.
    #[serde(default)]
    pub open_time: String,
    /// Closing time, `h:mm PM`.
    #[serde(default)]
    pub close_time: String,
    /// Whether bets are accepted.
    #[serde(default)]
    pub is_betting_open: bool,
    /// Server-derived mirror of `is_betting_open`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_betting: Option<bool>,
    /// Declared results.
    #[serde(default)]
    pub results: MarketResults,
}

impl Market {
    /// Market built from a create payload before the server has answered.
    pub fn provisional(draft: &NewMarket) -> Self {
        Self {
            id: None,
            market_id: draft.market_id.clone(),
            name: draft.name.clone(),
            open_time: draft.open_time.clone(),
            close_time: draft.close_time.clone(),
            is_betting_open: draft.is_betting_open,
            open_betting: Some(draft.is_betting_open),
            results: MarketResults::default(),
        }
    }

    /// Set the betting flag together with its mirror field.
    pub fn set_betting_open(&mut self, open: bool) {
        self.is_betting_open = open;
        self.open_betting = Some(open);
    }

    /// "Open" or "Closed".
    pub fn betting_status(&self) -> BettingStatus {
        if self.is_betting_open {
            BettingStatus::Open
        } else {
            BettingStatus::Closed
        }
    }
}

/// Betting availability as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BettingStatus {
    /// Bets accepted.
    Open,
    /// Bets refused.
    Closed,
}

/// Create-market payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarket {
    /// Display name.
    pub name: String,
    /// Opening time, already in `h:mm AM` form.
    pub open_time: String,
    /// Closing time, already in `h:mm PM` form.
    pub close_time: String,
    /// Initial betting flag.
    pub is_betting_open: bool,
    /// Client-generated provisional id.
    pub market_id: String,
}

/// Partial update body for the betting toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BettingUpdate {
    /// Desired betting flag.
    pub is_betting_open: bool,
}

/// Declare-results command body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclareResults {
    /// Target market.
    pub market_id: String,
    /// Open result, sent as typed.
    pub open_result: String,
    /// Close result, sent as typed.
    pub close_result: String,
}

impl fmt::Display for DeclareResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} open={} close={}",
            self.market_id, self.open_result, self.close_result
        )
    }
}
