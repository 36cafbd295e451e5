use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// The running cash balance for one rebalance session.
///
/// Tracked locally: the brokerage keeps its own accounting, this figure is
/// the session's view of what its orders committed. Buys reduce it, sells
/// increase it, matching the reconciler's signed delta convention.
#[derive(Debug, Clone)]
pub struct BuyingPower {
    balance: Decimal,
}

impl BuyingPower {
    pub fn new(initial: Decimal) -> Self {
        Self { balance: initial }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Applies one order's notional value and returns the updated balance.
    /// `delta` is signed: positive (buy) subtracts, negative (sell) adds.
    pub fn apply_fill(&mut self, delta: i64, price: Decimal) -> Decimal {
        self.balance -= Decimal::from(delta) * price;
        self.balance
    }

    /// Appends this session's final balance to the durable ledger, one line
    /// per session: `<date> | New Buying Power: <value>`. The file is only
    /// ever appended to, never truncated.
    pub fn persist(&self, path: &Path, date: NaiveDate) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{} | New Buying Power: {:.2}", date, self.balance)
    }
}
