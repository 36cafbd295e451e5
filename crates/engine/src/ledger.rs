use crate::error::EngineError;
use broker_client::BrokerGateway;
use std::collections::HashMap;

/// Per-instrument record of the most recent open order and the last
/// submitted signed quantity. Session-scoped: created at start, mutated only
/// by the reconciler, discarded at session end.
#[derive(Debug, Clone, Default)]
pub struct LedgerEntry {
    /// Brokerage id of the order we currently have open, if any.
    pub open_order: Option<String>,
    /// Last submitted quantity, signed: buys positive, sells negative.
    pub last_delta: i64,
}

/// The order ledger for one rebalance session.
///
/// Invariant: at most one open order is tracked per instrument. The
/// reconciler cancels the tracked order before submitting a replacement.
#[derive(Debug)]
pub struct OrderLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl OrderLedger {
    /// A ledger with an empty entry for each tracked symbol.
    pub fn empty(symbols: &[String]) -> Self {
        Self {
            entries: symbols
                .iter()
                .map(|s| (s.clone(), LedgerEntry::default()))
                .collect(),
        }
    }

    /// Seeds the ledger from a bounded window of the brokerage's most recent
    /// open orders. Orders for untracked symbols are ignored; tracked symbols
    /// without a matching order start with no open order.
    ///
    /// Each candidate is re-fetched by id before being recorded, so an order
    /// that filled or was cancelled between the listing and now drops out.
    pub async fn load(
        gateway: &dyn BrokerGateway,
        symbols: &[String],
        lookback: usize,
    ) -> Result<Self, EngineError> {
        let mut ledger = Self::empty(symbols);

        for listed in gateway.recent_orders(lookback).await? {
            if !listed.is_open() || !ledger.entries.contains_key(&listed.symbol) {
                continue;
            }

            let confirmed = match gateway.order(&listed.id).await {
                Ok(order) => order,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            if !confirmed.is_open() {
                continue;
            }

            if let Some(entry) = ledger.entries.get_mut(&confirmed.symbol) {
                // Orders arrive newest first; keep only the most recent one.
                if entry.open_order.is_none() {
                    tracing::info!(
                        symbol = %confirmed.symbol,
                        order_id = %confirmed.id,
                        "tracking pre-existing open order"
                    );
                    entry.open_order = Some(confirmed.id);
                }
            }
        }

        Ok(ledger)
    }

    pub fn entry(&self, symbol: &str) -> Option<&LedgerEntry> {
        self.entries.get(symbol)
    }

    pub(crate) fn entry_mut(&mut self, symbol: &str) -> &mut LedgerEntry {
        self.entries.entry(symbol.to_string()).or_default()
    }

    /// The tracked open order for a symbol, if any.
    pub fn open_order(&self, symbol: &str) -> Option<&str> {
        self.entries
            .get(symbol)
            .and_then(|e| e.open_order.as_deref())
    }

    /// The last submitted signed quantity for a symbol (0 when untouched).
    pub fn last_delta(&self, symbol: &str) -> i64 {
        self.entries.get(symbol).map(|e| e.last_delta).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_tracks_every_symbol_with_defaults() {
        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let ledger = OrderLedger::empty(&symbols);

        for symbol in &symbols {
            let entry = ledger.entry(symbol).unwrap();
            assert!(entry.open_order.is_none());
            assert_eq!(entry.last_delta, 0);
        }
        assert_eq!(ledger.last_delta("AAA"), 0);
        assert!(ledger.open_order("AAA").is_none());
    }

    #[test]
    fn untracked_symbol_reads_as_flat() {
        let ledger = OrderLedger::empty(&["AAA".to_string()]);
        assert_eq!(ledger.last_delta("ZZZ"), 0);
        assert!(ledger.entry("ZZZ").is_none());
    }
}
