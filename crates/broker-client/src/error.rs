use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The brokerage rejected our credentials: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("The brokerage rejected the request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data from the brokerage: {0}")]
    InvalidData(String),
}

impl BrokerError {
    /// Whether this error means the whole session must abort.
    ///
    /// Transport and credential failures poison every subsequent call; a
    /// not-found or a rejected order only affects the instrument at hand.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BrokerError::Transport(_) | BrokerError::Unauthorized(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BrokerError::NotFound(_))
    }
}
