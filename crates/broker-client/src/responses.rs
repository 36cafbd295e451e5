use chrono::{DateTime, Utc};
use core_types::{MinuteBar, OrderSide, Quote};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

/// The response from `GET /v2/stocks/{symbol}/quotes/latest`.
///
/// Alpaca abbreviates field names on the data API, so we rename explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestQuoteResponse {
    pub symbol: String,
    pub quote: QuoteBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteBody {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "bp")]
    pub bid_price: Decimal,
    #[serde(rename = "ap")]
    pub ask_price: Decimal,
}

impl From<QuoteBody> for Quote {
    fn from(body: QuoteBody) -> Self {
        Quote {
            bid_price: body.bid_price,
            ask_price: body.ask_price,
            timestamp: body.timestamp,
        }
    }
}

/// The response from `GET /v2/stocks/{symbol}/bars/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestBarResponse {
    pub symbol: String,
    pub bar: BarBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BarBody {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: Decimal,
    #[serde(rename = "h")]
    pub high: Decimal,
    #[serde(rename = "l")]
    pub low: Decimal,
    #[serde(rename = "c")]
    pub close: Decimal,
    #[serde(rename = "v")]
    pub volume: Decimal,
}

impl From<BarBody> for MinuteBar {
    fn from(body: BarBody) -> Self {
        MinuteBar {
            open: body.open,
            high: body.high,
            low: body.low,
            close: body.close,
            volume: body.volume,
            timestamp: body.timestamp,
        }
    }
}

/// A single position from `GET /v2/positions/{symbol}`.
///
/// Quantities arrive as strings on the trading API ("4", "-5"); rust_decimal
/// deserializes them directly.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionResponse {
    pub symbol: String,
    pub qty: Decimal,
    pub side: String,
    pub avg_entry_price: Decimal,
}

impl PositionResponse {
    /// The held quantity as a signed whole-share count (negative = short).
    pub fn quantity(&self) -> i64 {
        self.qty.trunc().to_i64().unwrap_or(0)
    }
}

/// An order as reported by `GET /v2/orders` and `POST /v2/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub qty: Decimal,
    pub filled_qty: Decimal,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub limit_price: Option<Decimal>,
    pub status: String,
}

impl OrderResponse {
    /// Whether the order can still fill (and can therefore still be cancelled).
    pub fn is_open(&self) -> bool {
        matches!(
            self.status.as_str(),
            "new" | "accepted" | "partially_filled" | "pending_new" | "held"
        )
    }
}

/// Represents an error response from the Alpaca API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub message: String,
}
