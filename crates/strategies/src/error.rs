use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Target source received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Cannot size a position for {0}: no usable price")]
    UnpricedInstrument(String),
}
