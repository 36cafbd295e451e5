use broker_client::error::BrokerError;
use strategies::StrategyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Brokerage gateway error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Target source error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("No usable price for {0}")]
    MissingPrice(String),

    #[error("Buying-power ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Fatal errors abort the whole session; everything else is isolated to
    /// the instrument being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Broker(e) if e.is_fatal())
    }
}
