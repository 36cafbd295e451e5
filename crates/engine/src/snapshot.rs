use crate::error::EngineError;
use broker_client::BrokerGateway;
use core_types::InstrumentState;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Reads the point-in-time state of every tracked instrument: last known
/// price and currently held quantity.
///
/// The per-symbol fetches are read-only and run concurrently; the result is
/// still keyed deterministically by symbol. A gateway transport or auth
/// failure aborts the snapshot; a missing position or quote never does.
pub async fn load_snapshot(
    gateway: &dyn BrokerGateway,
    symbols: &[String],
) -> Result<HashMap<String, InstrumentState>, EngineError> {
    let fetches = symbols.iter().map(|symbol| load_instrument(gateway, symbol));

    let mut snapshot = HashMap::with_capacity(symbols.len());
    for state in join_all(fetches).await {
        let state = state?;
        snapshot.insert(state.symbol.clone(), state);
    }
    Ok(snapshot)
}

async fn load_instrument(
    gateway: &dyn BrokerGateway,
    symbol: &str,
) -> Result<InstrumentState, EngineError> {
    let last_price = resolve_last_price(gateway, symbol).await?;

    let position = match gateway.position(symbol).await {
        Ok(position) => position.quantity(),
        Err(e) if e.is_not_found() => {
            tracing::info!(symbol, "no existing position, defaulting to 0");
            0
        }
        Err(e) => return Err(e.into()),
    };

    Ok(InstrumentState {
        symbol: symbol.to_string(),
        last_price,
        position,
    })
}

/// Resolves an instrument's last price: the latest bid, falling back to the
/// most recent minute bar's high when the feed has no usable quote.
///
/// Returns `Ok(None)` when both sources come up empty; the caller skips the
/// instrument for this cycle rather than pricing an order blind.
async fn resolve_last_price(
    gateway: &dyn BrokerGateway,
    symbol: &str,
) -> Result<Option<Decimal>, EngineError> {
    match gateway.latest_quote(symbol).await {
        Ok(quote) if quote.bid_price > Decimal::ZERO => return Ok(Some(quote.bid_price)),
        Ok(_) => {
            tracing::debug!(symbol, "zero bid on latest quote, falling back to minute bar");
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!(symbol, "no latest quote, falling back to minute bar");
        }
        Err(e) => return Err(e.into()),
    }

    match gateway.latest_minute_bar(symbol).await {
        Ok(bar) if bar.high > Decimal::ZERO => Ok(Some(bar.high)),
        Ok(_) => {
            tracing::warn!(symbol, "minute-bar fallback also unpriced; skipping this cycle");
            Ok(None)
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!(symbol, "no quote and no minute bar; skipping this cycle");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
