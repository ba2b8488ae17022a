use std::env;

use fleetgrid_core::AppError;

/// Runtime configuration for the engine's two backing stores.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Base URL of the external policy-tuple backend.
    pub policy_base_url: String,
    /// Attempt budget for transient policy backend failures.
    pub policy_max_attempts: u8,
    /// Linear backoff step between policy backend retries.
    pub policy_retry_backoff_ms: u64,
}

impl EngineConfig {
    /// Loads configuration from the environment.
    pub fn load() -> Result<Self, AppError> {
        let database_url = required_env("DATABASE_URL")?;
        let policy_base_url = required_env("POLICY_STORE_URL")?;

        let policy_max_attempts = env::var("POLICY_STORE_MAX_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u8>().ok())
            .unwrap_or(3);
        let policy_retry_backoff_ms = env::var("POLICY_STORE_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(200);

        Ok(Self {
            database_url,
            policy_base_url,
            policy_max_attempts,
            policy_retry_backoff_ms,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
