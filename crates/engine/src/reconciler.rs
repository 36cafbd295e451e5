use crate::error::EngineError;
use crate::ledger::OrderLedger;
use broker_client::BrokerGateway;
use core_types::{InstrumentState, OrderRequest, OrderSide};
use std::sync::Arc;

/// Moves one instrument's live position toward a target quantity.
///
/// For each instrument the reconciler cancels any order it still has open,
/// computes the signed delta between target and held quantity, and submits a
/// single day-limit order at the last known price. The ledger records the
/// submitted order and quantity so the next cycle can supersede it.
pub struct Reconciler {
    gateway: Arc<dyn BrokerGateway>,
    ledger: OrderLedger,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn BrokerGateway>, ledger: OrderLedger) -> Self {
        Self { gateway, ledger }
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// Reconciles `state.symbol` toward `target` shares.
    ///
    /// Returns the full signed delta between target and held quantity. The
    /// quantity actually submitted can be smaller: a buy against a short
    /// position only covers the short, and a sell never exceeds the long
    /// quantity held. The capped figure lands in the ledger's `last_delta`;
    /// cash accounting reads it from there.
    pub async fn reconcile(
        &mut self,
        state: &InstrumentState,
        target: i64,
    ) -> Result<i64, EngineError> {
        let symbol = state.symbol.as_str();
        let price = state
            .last_price
            .ok_or_else(|| EngineError::MissingPrice(symbol.to_string()))?;

        // Supersede any order still open from the previous cycle. A failed
        // cancel is reported but does not block the new order; the brokerage
        // has likely already filled or expired it.
        let entry = self.ledger.entry_mut(symbol);
        if let Some(order_id) = entry.open_order.take() {
            tracing::info!(
                action = "closed",
                symbol,
                quantity = entry.last_delta,
                price = %price,
                order_id = %order_id,
                "cancelling open order"
            );
            entry.last_delta = 0;
            if let Err(e) = self.gateway.cancel_order(&order_id).await {
                tracing::warn!(symbol, error = %e, "cancel failed; proceeding with new order");
            }
        }

        let delta = target - state.position;

        if delta == 0 {
            tracing::info!(
                action = "no-op",
                symbol,
                quantity = 0i64,
                price = %price,
                "position already at target"
            );
            return Ok(0);
        }

        if delta > 0 {
            // Covering a short never flips into a fresh long beyond flat.
            let buy_quantity = if state.position < 0 {
                delta.min(state.position.abs())
            } else {
                delta
            };

            let order = OrderRequest::day_limit(symbol, buy_quantity, OrderSide::Buy, price);
            let ack = self.gateway.submit_order(&order).await?;

            let entry = self.ledger.entry_mut(symbol);
            entry.open_order = Some(ack.id);
            entry.last_delta = buy_quantity;
            tracing::info!(
                action = "bought",
                symbol,
                quantity = buy_quantity,
                price = %price,
                "submitted day-limit buy"
            );
            Ok(delta)
        } else {
            // Never sell more than is actually held long.
            let sell_quantity = if state.position > 0 {
                delta.abs().min(state.position)
            } else {
                delta.abs()
            };

            let order = OrderRequest::day_limit(symbol, sell_quantity, OrderSide::Sell, price);
            let ack = self.gateway.submit_order(&order).await?;

            let entry = self.ledger.entry_mut(symbol);
            entry.open_order = Some(ack.id);
            entry.last_delta = -sell_quantity;
            tracing::info!(
                action = "sold",
                symbol,
                quantity = sell_quantity,
                price = %price,
                "submitted day-limit sell"
            );
            Ok(delta)
        }
    }
}
