//! Create-market form.

use async_trait::async_trait;
use rand::Rng;
use time::macros::format_description;
use time::Time;
use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::market::{Market, NewMarket};

/// Prefix of client-generated market ids.
pub const MARKET_ID_PREFIX: &str = "MKT-";

/// Characters after the prefix.
pub const MARKET_ID_LEN: usize = 9;

const MARKET_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Receives a submitted form.
#[async_trait]
pub trait SaveMarket: Send {
    /// Persist the market.
    async fn save(&mut self, draft: NewMarket) -> Result<Market>;
}

/// Convert a 24-hour `HH:MM` value to `h:mm AM|PM`.
///
/// `00:xx` is `12:xx AM`, `12:xx` is `12:xx PM`; minutes are unchanged.
pub fn format_time(field: &'static str, value: &str) -> std::result::Result<String, FormError> {
    let invalid = || FormError::InvalidTime {
        field,
        value: value.to_string(),
    };

    let time = Time::parse(value.trim(), format_description!("[hour]:[minute]"))
        .map_err(|_| invalid())?;

    time.format(format_description!(
        "[hour repr:12 padding:none]:[minute] [period]"
    ))
    .map_err(|_| invalid())
}

/// Random provisional id: `MKT-` and nine uppercase alphanumerics.
pub fn generate_market_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..MARKET_ID_LEN)
        .map(|_| MARKET_ID_CHARSET[rng.gen_range(0..MARKET_ID_CHARSET.len())] as char)
        .collect();
    format!("{}{}", MARKET_ID_PREFIX, suffix)
}

/// Add-market form state.
#[derive(Debug, Clone)]
pub struct MarketForm {
    /// Market name.
    pub name: String,
    /// Opening time, 24-hour `HH:MM`.
    pub open_time: String,
    /// Closing time, 24-hour `HH:MM`.
    pub close_time: String,
    /// Initial betting flag.
    pub is_betting_open: bool,
    open: bool,
    error: Option<String>,
}

impl Default for MarketForm {
    fn default() -> Self {
        Self::open()
    }
}

impl MarketForm {
    /// An open, empty form.
    pub fn open() -> Self {
        Self {
            name: String::new(),
            open_time: String::new(),
            close_time: String::new(),
            is_betting_open: false,
            open: true,
            error: None,
        }
    }

    /// Whether the form is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Inline error from the last submit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Close without saving.
    pub fn cancel(&mut self) {
        self.open = false;
        self.error = None;
    }

    /// Normalize the fields into a create payload with a fresh id.
    pub fn build_payload(&self) -> std::result::Result<NewMarket, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::EmptyName);
        }

        Ok(NewMarket {
            name: name.to_string(),
            open_time: format_time("open time", &self.open_time)?,
            close_time: format_time("close time", &self.close_time)?,
            is_betting_open: self.is_betting_open,
            market_id: generate_market_id(),
        })
    }

    /// Hand the payload to `sink`. The form closes only if the save succeeds;
    /// otherwise it stays open with the failure as its inline error.
    pub async fn submit<S>(&mut self, sink: &mut S) -> Result<Market>
    where
        S: SaveMarket + ?Sized,
    {
        if !self.open {
            return Err(FormError::Closed.into());
        }

        let draft = match self.build_payload() {
            Ok(draft) => draft,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        debug!(market_id = %draft.market_id, "Submitting market form");

        match sink.save(draft).await {
            Ok(market) => {
                self.open = false;
                self.error = None;
                Ok(market)
            }
            Err(e) => {
                warn!("Market form save failed: {}", e);
                self.error = Some(e.notice_message());
                Err(e)
            }
        }
    }
}
