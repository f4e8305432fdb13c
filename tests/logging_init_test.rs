//! Global subscriber installation
//!
//! Lives in its own test binary: installing the global subscriber would otherwise send every
//! other test's log output to stdout.

use eeg_daq::config::AppConfig;
use eeg_daq::logging::{self, OutputFormat, TracingConfig};
use tracing::Level;

#[test]
fn test_init_is_idempotent() {
    let mut config = AppConfig::default();
    config.application.log_format = OutputFormat::Json;
    logging::init_from_config(&config).unwrap();

    // A second installation, even with different settings, is not an error.
    assert!(logging::init(TracingConfig::new(Level::DEBUG)).is_ok());
    assert!(logging::init(TracingConfig::default().with_format(OutputFormat::Pretty)).is_ok());
}
