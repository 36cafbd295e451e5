//! # Helmsman Target Sources
//!
//! This crate defines the contract between the rebalancing engine and
//! whatever decides how many shares of each instrument the account should
//! hold. The engine is target-agnostic: it asks the `TargetSource` for a
//! quantity and reconciles toward it, never looking at how the number was
//! produced.
//!
//! Two concrete sources ship here:
//! - `WeightedAllocation` converts a dollar allocation (equal-weight or an
//!   explicit weight table) into whole shares at the instrument's last price.
//! - `FixedTargets` is an explicit symbol-to-quantity map, useful for manual
//!   rebalances and for driving the engine in tests.
//!
//! Indicator-driven signal generation (moving averages and friends) is
//! deliberately not part of this crate's surface; such a strategy would be
//! one more `TargetSource` implementation.

use configuration::Allocation;
use core_types::InstrumentState;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;

pub mod error;

pub use error::StrategyError;

/// The core trait every target source implements.
///
/// `&mut self` allows stateful implementations (e.g. ones that track
/// indicator history between rebalance cycles). The `Send + Sync` bounds let
/// a source be handed to the async session driver.
pub trait TargetSource: Send + Sync {
    /// Returns the number of shares `state.symbol` should hold after
    /// reconciliation. Negative targets request a short position.
    fn target_quantity(&mut self, state: &InstrumentState) -> Result<i64, StrategyError>;
}

/// Sizes positions from a dollar allocation per symbol.
///
/// The allocation is fixed at construction from the session's *starting*
/// buying power; it does not chase the balance as orders are placed during
/// the cycle.
pub struct WeightedAllocation {
    dollars_by_symbol: HashMap<String, Decimal>,
}

impl WeightedAllocation {
    /// Splits `buying_power` equally across `symbols`.
    pub fn equal_weight(symbols: &[String], buying_power: Decimal) -> Result<Self, StrategyError> {
        if symbols.is_empty() {
            return Err(StrategyError::InvalidParameters(
                "equal-weight allocation needs at least one symbol".to_string(),
            ));
        }
        let share = buying_power / Decimal::from(symbols.len() as i64);
        Ok(Self {
            dollars_by_symbol: symbols.iter().map(|s| (s.clone(), share)).collect(),
        })
    }

    /// Builds the allocation from explicit per-symbol weights (fractions of
    /// buying power). Symbols without a weight target a flat position.
    pub fn from_weights(
        weights: &HashMap<String, Decimal>,
        buying_power: Decimal,
    ) -> Result<Self, StrategyError> {
        if weights.values().any(|w| w.is_sign_negative()) {
            return Err(StrategyError::InvalidParameters(
                "allocation weights must not be negative".to_string(),
            ));
        }
        Ok(Self {
            dollars_by_symbol: weights
                .iter()
                .map(|(symbol, weight)| (symbol.clone(), *weight * buying_power))
                .collect(),
        })
    }

    /// Picks equal-weight or explicit weights based on the config section.
    pub fn from_config(
        allocation: &Allocation,
        symbols: &[String],
        buying_power: Decimal,
    ) -> Result<Self, StrategyError> {
        match &allocation.weights {
            Some(weights) => Self::from_weights(weights, buying_power),
            None => Self::equal_weight(symbols, buying_power),
        }
    }
}

impl TargetSource for WeightedAllocation {
    fn target_quantity(&mut self, state: &InstrumentState) -> Result<i64, StrategyError> {
        let Some(dollars) = self.dollars_by_symbol.get(&state.symbol) else {
            // No allocation means the symbol should end the session flat.
            return Ok(0);
        };

        let price = state
            .last_price
            .filter(|p| p > &Decimal::ZERO)
            .ok_or_else(|| StrategyError::UnpricedInstrument(state.symbol.clone()))?;

        // Whole shares only: truncate toward zero, never round up past the
        // dollar allocation.
        (*dollars / price)
            .trunc()
            .to_i64()
            .ok_or_else(|| StrategyError::InvalidParameters(format!(
                "allocation for {} does not fit a share count",
                state.symbol
            )))
    }
}

/// An explicit symbol-to-quantity map. Symbols absent from the map target
/// a flat (zero) position.
pub struct FixedTargets {
    targets: HashMap<String, i64>,
}

impl FixedTargets {
    pub fn new(targets: HashMap<String, i64>) -> Self {
        Self { targets }
    }
}

impl TargetSource for FixedTargets {
    fn target_quantity(&mut self, state: &InstrumentState) -> Result<i64, StrategyError> {
        Ok(self.targets.get(&state.symbol).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn state(symbol: &str, price: Decimal, position: i64) -> InstrumentState {
        InstrumentState {
            symbol: symbol.to_string(),
            last_price: Some(price),
            position,
        }
    }

    #[test]
    fn equal_weight_truncates_to_whole_shares() {
        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let mut source = WeightedAllocation::equal_weight(&symbols, dec!(1000)).unwrap();

        // $500 at $50 is exactly 10 shares.
        assert_eq!(source.target_quantity(&state("AAA", dec!(50), 0)).unwrap(), 10);
        // $500 at $33.40 is 14.97 shares, truncated to 14.
        assert_eq!(source.target_quantity(&state("BBB", dec!(33.40), 0)).unwrap(), 14);
    }

    #[test]
    fn unallocated_symbol_targets_flat() {
        let mut weights = HashMap::new();
        weights.insert("AAA".to_string(), dec!(0.5));
        let mut source = WeightedAllocation::from_weights(&weights, dec!(1000)).unwrap();

        assert_eq!(source.target_quantity(&state("ZZZ", dec!(10), 7)).unwrap(), 0);
    }

    #[test]
    fn missing_price_is_an_error_not_a_zero_target() {
        let symbols = vec!["AAA".to_string()];
        let mut source = WeightedAllocation::equal_weight(&symbols, dec!(1000)).unwrap();
        let unpriced = InstrumentState {
            symbol: "AAA".to_string(),
            last_price: None,
            position: 3,
        };

        assert!(matches!(
            source.target_quantity(&unpriced),
            Err(StrategyError::UnpricedInstrument(_))
        ));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut weights = HashMap::new();
        weights.insert("AAA".to_string(), dec!(-0.2));
        assert!(WeightedAllocation::from_weights(&weights, dec!(1000)).is_err());
    }

    #[test]
    fn fixed_targets_default_to_zero() {
        let mut targets = HashMap::new();
        targets.insert("AAA".to_string(), 12);
        let mut source = FixedTargets::new(targets);

        assert_eq!(source.target_quantity(&state("AAA", dec!(5), 0)).unwrap(), 12);
        assert_eq!(source.target_quantity(&state("BBB", dec!(5), 4)).unwrap(), 0);
    }
}
