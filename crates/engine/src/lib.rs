use crate::error::EngineError;
use broker_client::BrokerGateway;
use chrono::Utc;
use configuration::Session;
use rust_decimal::Decimal;
use std::sync::Arc;
use strategies::TargetSource;

pub mod buying_power;
pub mod error;
pub mod ledger;
pub mod reconciler;
pub mod snapshot;

pub use buying_power::BuyingPower;
pub use ledger::{LedgerEntry, OrderLedger};
pub use reconciler::Reconciler;
pub use snapshot::load_snapshot;

/// What a completed session did, for the caller's summary output.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub buying_power: Decimal,
    pub reconciled: usize,
    pub skipped: usize,
}

/// The driver for one rebalance cycle.
///
/// Owns the order ledger and the buying-power balance for the duration of
/// the session; instruments are reconciled strictly one at a time in the
/// configured symbol order, so neither needs locking. Open orders left at
/// session end stay live on the brokerage; the session does not force-close
/// on exit.
pub struct RebalanceSession {
    gateway: Arc<dyn BrokerGateway>,
    session: Session,
    target_source: Box<dyn TargetSource>,
}

impl RebalanceSession {
    pub fn new(
        gateway: Arc<dyn BrokerGateway>,
        session: Session,
        target_source: Box<dyn TargetSource>,
    ) -> Self {
        Self {
            gateway,
            session,
            target_source,
        }
    }

    /// Runs the full cycle: snapshot, ledger seed, one reconcile pass, and
    /// the buying-power ledger append.
    ///
    /// Gateway transport/auth failures abort immediately. Everything else
    /// (unpriced instruments, rejected orders, target-source errors) skips
    /// the affected symbol and moves on.
    pub async fn run(&mut self) -> Result<SessionReport, EngineError> {
        if self.session.cancel_open_orders_first {
            let cancelled =
                cancel_all_orders(self.gateway.as_ref(), self.session.cancel_lookback).await?;
            tracing::info!(cancelled, "cancelled pre-existing open orders");
        }

        let snapshot = snapshot::load_snapshot(self.gateway.as_ref(), &self.session.symbols).await?;
        let order_ledger = OrderLedger::load(
            self.gateway.as_ref(),
            &self.session.symbols,
            self.session.open_order_lookback,
        )
        .await?;

        let mut reconciler = Reconciler::new(self.gateway.clone(), order_ledger);
        let mut buying_power = BuyingPower::new(self.session.buying_power);
        let mut reconciled = 0;
        let mut skipped = 0;

        for symbol in &self.session.symbols {
            let Some(state) = snapshot.get(symbol) else {
                tracing::warn!(%symbol, "symbol missing from snapshot; skipping");
                skipped += 1;
                continue;
            };
            let Some(price) = state.last_price else {
                tracing::warn!(%symbol, "no usable price this cycle; skipping");
                skipped += 1;
                continue;
            };

            let target = match self.target_source.target_quantity(state) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "target source failed; skipping");
                    skipped += 1;
                    continue;
                }
            };

            match reconciler.reconcile(state, target).await {
                Ok(_delta) => {
                    // Cash follows the order actually placed, which the
                    // ledger records (capped, signed).
                    let submitted = reconciler.ledger().last_delta(symbol);
                    buying_power.apply_fill(submitted, price);
                    reconciled += 1;
                }
                Err(e) if !e.is_fatal() => {
                    tracing::warn!(%symbol, error = %e, "reconcile failed; continuing");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        buying_power.persist(&self.session.buying_power_ledger, Utc::now().date_naive())?;
        tracing::info!(
            buying_power = %buying_power.balance(),
            reconciled,
            skipped,
            "session complete"
        );

        Ok(SessionReport {
            buying_power: buying_power.balance(),
            reconciled,
            skipped,
        })
    }
}

/// Cancels every open order visible in a bounded window of recent orders.
/// Returns how many were cancelled.
pub async fn cancel_all_orders(
    gateway: &dyn BrokerGateway,
    lookback: usize,
) -> Result<usize, EngineError> {
    let mut cancelled = 0;

    for order in gateway.recent_orders(lookback).await? {
        if !order.is_open() {
            continue;
        }
        let price = order.limit_price.unwrap_or(Decimal::ZERO);
        match gateway.cancel_order(&order.id).await {
            Ok(()) => {
                tracing::info!(
                    action = "closed",
                    symbol = %order.symbol,
                    quantity = %order.qty,
                    price = %price,
                    "cancelled open order"
                );
                cancelled += 1;
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(symbol = %order.symbol, error = %e, "cancel failed; continuing");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(cancelled)
}
