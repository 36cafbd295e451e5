use rust_decimal::Decimal;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{Allocation, Config, Gateway, Session};

/// Loads the application configuration from the given TOML file.
///
/// Environment variables prefixed with `HELMSMAN_` override file values
/// (e.g. `HELMSMAN_SESSION__BUYING_POWER=2500` or
/// `HELMSMAN_GATEWAY__KEY_ID=...`), so secrets never have to live in the
/// checked-in file.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("HELMSMAN").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct.
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects configurations the engine cannot run with.
fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.session.symbols.is_empty() {
        return Err(ConfigError::ValidationError(
            "session.symbols must list at least one instrument".to_string(),
        ));
    }
    if config.session.buying_power < Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "session.buying_power must not be negative".to_string(),
        ));
    }
    if config.session.open_order_lookback == 0 {
        return Err(ConfigError::ValidationError(
            "session.open_order_lookback must be at least 1".to_string(),
        ));
    }
    if let Some(weights) = &config.allocation.weights {
        let total: Decimal = weights.values().copied().sum();
        if weights.values().any(|w| w.is_sign_negative()) || total > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "allocation.weights must be non-negative and sum to at most 1".to_string(),
            ));
        }
    }
    Ok(())
}
