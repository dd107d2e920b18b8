use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod optimizer_config;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use optimizer_config::{OptimizerConfig, ParameterRange, ParameterSpace};
pub use settings::{
    AllocatorSettings, Config, LoggingSettings, MACrossoverParams, MacdTrendParams, RewardPolicy,
    RiskManagement, RiskTier, RsiReversionParams, Simulation, Strategies,
};

/// Prefix for environment overrides, e.g. `TRADEWIND__OPTIMIZER__MIN_TRADES=50`.
pub const ENV_PREFIX: &str = "TRADEWIND";

/// Loads the application configuration from `config.toml` in the working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Loads the configuration from `path`, layered under environment overrides.
///
/// The file is optional: every section has defaults that reproduce the
/// documented business rules, so a missing file yields `Config::default()`
/// (plus whatever the environment overrides).
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
