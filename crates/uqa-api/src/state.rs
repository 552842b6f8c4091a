//! Application state management
//!
//! Everything here is built once at startup and only read afterwards;
//! no per-request data is kept between requests.
//!
//! Author: hephaex@gmail.com

use crate::logging::{EventLog, TracingEventLog};
use std::sync::Arc;
use std::time::Instant;
use uqa_core::config::AppConfig;
use uqa_rag::PredictionPipeline;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Answer + evidence pipeline
    pub pipeline: PredictionPipeline,
    /// Request/response log sink
    pub event_log: Arc<dyn EventLog>,
}

impl AppState {
    /// Create state from explicit collaborators
    pub fn new(
        config: AppConfig,
        pipeline: PredictionPipeline,
        event_log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            pipeline,
            event_log,
        }
    }

    /// Create state with the production clients and tracing log
    pub fn from_config(config: AppConfig) -> Self {
        let pipeline = PredictionPipeline::from_config(&config);
        Self::new(config, pipeline, Arc::new(TracingEventLog))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Largest request body the logging middleware will buffer
    pub fn max_body_size(&self) -> usize {
        self.config.server.max_body_size
    }
}
