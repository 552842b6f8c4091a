//! Request logging sink and tracing setup
//!
//! Handlers and middleware write request/response lines through an
//! [`EventLog`] held in the application state rather than a global.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use uqa_core::{LoggingConfig, Result};

/// Target used for request/response lines
pub const REQUEST_LOG_TARGET: &str = "uqa_api::requests";

/// Leveled, possibly fallible, text log
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Write one message at the given level
    async fn log(&self, level: Level, message: &str) -> Result<()>;

    async fn info(&self, message: &str) -> Result<()> {
        self.log(Level::INFO, message).await
    }

    async fn error(&self, message: &str) -> Result<()> {
        self.log(Level::ERROR, message).await
    }
}

/// Event log that forwards to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

#[async_trait]
impl EventLog for TracingEventLog {
    async fn log(&self, level: Level, message: &str) -> Result<()> {
        if level == Level::ERROR {
            tracing::error!(target: REQUEST_LOG_TARGET, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: REQUEST_LOG_TARGET, "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: REQUEST_LOG_TARGET, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: REQUEST_LOG_TARGET, "{message}");
        } else {
            tracing::trace!(target: REQUEST_LOG_TARGET, "{message}");
        }
        Ok(())
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracing_event_log_never_fails() {
        let log = TracingEventLog;
        assert!(log.info("hello").await.is_ok());
        assert!(log.error("boom").await.is_ok());
        assert!(log.log(Level::TRACE, "fine").await.is_ok());
    }
}
