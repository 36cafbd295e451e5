#![allow(dead_code)]

use async_trait::async_trait;
use broker_client::error::BrokerError;
use broker_client::{BrokerGateway, OrderResponse, PositionResponse};
use chrono::Utc;
use core_types::{MinuteBar, OrderRequest, OrderSide, Quote};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

/// Everything the mock observed, in call order, so tests can assert on the
/// cancel-before-submit sequencing.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Cancelled(String),
    Submitted {
        symbol: String,
        quantity: i64,
        side: OrderSide,
        limit_price: Decimal,
    },
}

/// An in-memory `BrokerGateway` for driving the engine in tests.
///
/// Symbols absent from `quotes`/`bars`/`positions` answer with
/// `BrokerError::NotFound`, mirroring how the live gateway reports
/// never-held positions and unquoted instruments.
#[derive(Default)]
pub struct MockGateway {
    pub quotes: HashMap<String, Decimal>,
    pub bars: HashMap<String, Decimal>,
    pub positions: HashMap<String, i64>,
    pub seeded_orders: Vec<OrderResponse>,
    /// Symbol whose submissions the brokerage rejects.
    pub reject_submit_for: Option<String>,
    /// Make every cancel fail, as if the order already filled.
    pub fail_cancel: bool,
    pub events: Mutex<Vec<GatewayEvent>>,
    next_id: Mutex<u64>,
}

impl MockGateway {
    /// Builds an open limit order as the brokerage would report it.
    pub fn open_order(
        id: &str,
        symbol: &str,
        quantity: i64,
        side: OrderSide,
        limit_price: Decimal,
    ) -> OrderResponse {
        OrderResponse {
            id: id.to_string(),
            client_order_id: format!("client-{id}"),
            symbol: symbol.to_string(),
            qty: Decimal::from(quantity),
            filled_qty: Decimal::ZERO,
            side,
            order_type: "limit".to_string(),
            time_in_force: "day".to_string(),
            limit_price: Some(limit_price),
            status: "new".to_string(),
        }
    }

    /// Same shape, but already filled and therefore not cancellable.
    pub fn filled_order(
        id: &str,
        symbol: &str,
        quantity: i64,
        side: OrderSide,
        limit_price: Decimal,
    ) -> OrderResponse {
        let mut order = Self::open_order(id, symbol, quantity, side, limit_price);
        order.filled_qty = order.qty;
        order.status = "filled".to_string();
        order
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<GatewayEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, GatewayEvent::Submitted { .. }))
            .collect()
    }
}

#[async_trait]
impl BrokerGateway for MockGateway {
    async fn latest_quote(&self, symbol: &str) -> Result<Quote, BrokerError> {
        match self.quotes.get(symbol) {
            Some(bid) => Ok(Quote {
                bid_price: *bid,
                ask_price: *bid,
                timestamp: Utc::now(),
            }),
            None => Err(BrokerError::NotFound(format!("no quote for {symbol}"))),
        }
    }

    async fn latest_minute_bar(&self, symbol: &str) -> Result<MinuteBar, BrokerError> {
        match self.bars.get(symbol) {
            Some(high) => Ok(MinuteBar {
                open: *high,
                high: *high,
                low: *high,
                close: *high,
                volume: Decimal::from(100),
                timestamp: Utc::now(),
            }),
            None => Err(BrokerError::NotFound(format!("no bar for {symbol}"))),
        }
    }

    async fn position(&self, symbol: &str) -> Result<PositionResponse, BrokerError> {
        match self.positions.get(symbol) {
            Some(qty) => Ok(PositionResponse {
                symbol: symbol.to_string(),
                qty: Decimal::from(*qty),
                side: if *qty < 0 { "short" } else { "long" }.to_string(),
                avg_entry_price: Decimal::ZERO,
            }),
            None => Err(BrokerError::NotFound(format!("position does not exist: {symbol}"))),
        }
    }

    async fn recent_orders(&self, limit: usize) -> Result<Vec<OrderResponse>, BrokerError> {
        Ok(self.seeded_orders.iter().take(limit).cloned().collect())
    }

    async fn order(&self, order_id: &str) -> Result<OrderResponse, BrokerError> {
        self.seeded_orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| BrokerError::NotFound(format!("order not found: {order_id}")))
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        self.events
            .lock()
            .unwrap()
            .push(GatewayEvent::Cancelled(order_id.to_string()));
        if self.fail_cancel {
            return Err(BrokerError::Rejected {
                code: 42210000,
                message: "order is not cancelable".to_string(),
            });
        }
        Ok(())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BrokerError> {
        if self.reject_submit_for.as_deref() == Some(order.symbol.as_str()) {
            return Err(BrokerError::Rejected {
                code: 40310000,
                message: "insufficient buying power".to_string(),
            });
        }

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("mock-order-{next}")
        };
        self.events.lock().unwrap().push(GatewayEvent::Submitted {
            symbol: order.symbol.clone(),
            quantity: order.quantity,
            side: order.side,
            limit_price: order.limit_price.unwrap_or(Decimal::ZERO),
        });

        Ok(OrderResponse {
            id,
            client_order_id: order.client_order_id.to_string(),
            symbol: order.symbol.clone(),
            qty: Decimal::from(order.quantity),
            filled_qty: Decimal::ZERO,
            side: order.side,
            order_type: "limit".to_string(),
            time_in_force: "day".to_string(),
            limit_price: order.limit_price,
            status: "new".to_string(),
        })
    }
}
