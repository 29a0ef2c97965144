//! Centralized configuration (environment variables + defaults).

use tracing::Level;

/// Loads `.env` from the working directory, if there is one.
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

/// Database URL; defaults to a private in-memory SQLite database.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

/// Maximum log level (`LOG_LEVEL`, default `info`).
pub fn log_level() -> anyhow::Result<Level> {
    let v = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    v.parse::<Level>()
        .map_err(|_| anyhow::anyhow!("LOG_LEVEL must be one of trace, debug, info, warn, error (got '{}')", v))
}
