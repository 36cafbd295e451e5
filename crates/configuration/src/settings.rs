use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: Gateway,
    pub session: Session,
    #[serde(default)]
    pub allocation: Allocation,
}

/// Connection details for the brokerage gateway.
///
/// Credentials live here explicitly rather than in process-wide environment
/// state; the binary may fill them in from `APCA_*` variables at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Gateway {
    /// Base URL of the trading API (orders, positions).
    pub trading_url: String,
    /// Base URL of the market data API (quotes, bars).
    pub data_url: String,
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub secret_key: String,
}

/// Parameters for a single rebalance session.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// The instruments to rebalance, processed in this exact order.
    pub symbols: Vec<String>,
    /// Cash available for new purchases at session start.
    pub buying_power: Decimal,
    /// How many recent orders to scan when seeding the order ledger.
    #[serde(default = "default_open_order_lookback")]
    pub open_order_lookback: usize,
    /// How many recent orders to scan when cancelling everything.
    #[serde(default = "default_cancel_lookback")]
    pub cancel_lookback: usize,
    /// Cancel all open orders before the first reconcile pass.
    #[serde(default)]
    pub cancel_open_orders_first: bool,
    /// Append-only file receiving one buying-power line per session.
    #[serde(default = "default_ledger_path")]
    pub buying_power_ledger: PathBuf,
}

fn default_open_order_lookback() -> usize {
    100
}

fn default_cancel_lookback() -> usize {
    500
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("buying_power.txt")
}

/// Portfolio weights for the allocation-driven target source.
///
/// With no `weights` table every symbol gets an equal share of the session's
/// buying power. Explicit weights are fractions of buying power per symbol;
/// symbols absent from the table target a flat (zero) position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Allocation {
    #[serde(default)]
    pub weights: Option<HashMap<String, Decimal>>,
}
