use crate::enums::{OrderSide, OrderType, TimeInForce};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The most recent quote for a symbol, as reported by the market data feed.
///
/// A `bid_price` of zero means the feed has no recent quote; callers are
/// expected to fall back to bar data rather than price an order from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A single one-minute OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinuteBar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A request to place a new order on the brokerage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Caller-assigned id, echoed back by the brokerage for correlation.
    pub client_order_id: Uuid,
    pub symbol: String,
    /// Number of shares; always positive, direction is carried by `side`.
    pub quantity: i64,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    /// Required when `order_type` is `Limit`.
    pub limit_price: Option<Decimal>,
}

impl OrderRequest {
    /// Builds a day-valid limit order, the only order shape the rebalancer submits.
    pub fn day_limit(symbol: &str, quantity: i64, side: OrderSide, limit_price: Decimal) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            quantity,
            side,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Day,
            limit_price: Some(limit_price),
        }
    }
}

/// A point-in-time view of one tracked instrument, read from the brokerage
/// at session start.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    pub symbol: String,
    /// Last known price; `None` when neither the quote feed nor the
    /// minute-bar fallback produced one.
    pub last_price: Option<Decimal>,
    /// Currently held quantity. Negative for short positions, zero when the
    /// instrument has never been held.
    pub position: i64,
}

impl InstrumentState {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            last_price: None,
            position: 0,
        }
    }
}
