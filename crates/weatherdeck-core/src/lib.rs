pub mod config;
pub mod error;

pub use config::{
    ApiConfig, Config, LocationConfig, StorageConfig, UiConfig, Units, ValidationResult,
    DEMO_API_KEY,
};
pub use error::{AppError, ConfigError, StorageError};

use anyhow::Result;

/// Initialize logging for the dashboard.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once;
/// only the first call installs the subscriber.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("WeatherDeck core initialized");
    }
    Ok(())
}
