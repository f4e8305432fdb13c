//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`. Using the `thiserror` crate, it
//! provides one place to describe everything that can go wrong outside the per-sample hot
//! path.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from `figment`, typically file parsing or type mismatches
//!   while extracting settings.
//! - **`Configuration`**: Semantic errors in settings that parsed fine but are logically
//!   invalid (e.g. an alpha frequency above Nyquist). Caught during validation.
//! - **`Acquisition`**: The ADC capability could not produce any reading. The sampler logs it
//!   once and skips the cycle.
//! - **`Gatt`**: An out-of-order event during GATT service bring-up.
//! - **`Notification`**: The wireless stack rejected a notification.
//! - **`PipelineRunning`**: A test-build state reset was attempted while the sampler and
//!   processor tasks were still running.
//! - **`Logging`**: The tracing subscriber could not be installed.
//!
//! Nothing in the sampling/filtering/detection path returns these errors: per-sample failures
//! degrade and are logged, they never abort a cycle.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Application error type.
#[derive(Error, Debug)]
pub enum DaqError {
    /// Settings could not be loaded or extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Settings loaded but failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// No reading could be obtained from the ADC.
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    /// GATT bring-up received an event that does not fit the current state.
    #[error("GATT state error: {0}")]
    Gatt(String),

    /// A notification could not be delivered to the wireless stack.
    #[error("Notification error: {0}")]
    Notification(String),

    /// A full reset was requested while the acquisition tasks are running.
    #[error("Cannot reset pipeline state while the acquisition tasks are running")]
    PipelineRunning,

    /// The tracing subscriber could not be installed.
    #[error("Logging initialisation error: {0}")]
    Logging(String),
}

impl From<figment::Error> for DaqError {
    fn from(err: figment::Error) -> Self {
        DaqError::Config(Box::new(err))
    }
}

impl DaqError {
    /// Whether the pipeline keeps running after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DaqError::Acquisition(_) | DaqError::Gatt(_) | DaqError::Notification(_)
        )
    }
}
