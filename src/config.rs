//! Runtime configuration using Figment
//!
//! The DSP constants (buffer size, sample period, thresholds, filter coefficients) are fixed at
//! compile time in [`crate::constants`]. Everything else is loaded here, in increasing priority:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. A TOML file (default `config/eeg_daq.toml`, optional)
//! 3. Environment variables prefixed with `EEG_DAQ_`, using `__` between section and key
//!
//! # Example
//! ```no_run
//! use eeg_daq::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // EEG_DAQ_SIMULATION__NOISE_MV=0.5 overrides simulation.noise_mv
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("Application: {}", config.application.name);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::constants::{SAMPLE_PERIOD, SAMPLE_RATE_HZ};
use crate::error::{AppResult, DaqError};
use crate::logging::OutputFormat;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/eeg_daq.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "EEG_DAQ_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// ADC acquisition settings
    pub acquisition: AcquisitionConfig,
    /// Synthetic front-end used by the simulated ADC
    pub simulation: SimulationConfig,
    /// Wireless notifier settings
    pub notifier: NotifierConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: OutputFormat,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "EEG DAQ".to_string(),
            log_level: "info".to_string(),
            log_format: OutputFormat::Compact,
        }
    }
}

/// ADC acquisition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Whether the ADC calibration curve is available at start-up
    pub calibration_enabled: bool,
    /// Seed for the simulated front-end noise
    pub seed: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            calibration_enabled: true,
            seed: 0x5eed,
        }
    }
}

/// Synthetic EEG parameters
///
/// The signal is `baseline + alpha sinusoid + uniform noise`, with a half-sine blink artefact
/// starting every `blink_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// DC level in millivolts
    pub baseline_mv: f64,
    /// Peak amplitude of the alpha rhythm in millivolts
    pub alpha_amplitude_mv: f64,
    /// Alpha rhythm frequency in Hz
    pub alpha_frequency_hz: f64,
    /// Peak uniform noise in millivolts (0 disables noise)
    pub noise_mv: f64,
    /// Peak amplitude of a blink artefact in millivolts
    pub blink_amplitude_mv: f64,
    /// Time between blink onsets
    #[serde(with = "humantime_serde")]
    pub blink_interval: Duration,
    /// Length of one blink artefact
    #[serde(with = "humantime_serde")]
    pub blink_duration: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            baseline_mv: 0.0,
            alpha_amplitude_mv: 1.5,
            alpha_frequency_hz: 10.0,
            noise_mv: 0.2,
            blink_amplitude_mv: 30.0,
            blink_interval: Duration::from_secs(1),
            blink_duration: Duration::from_millis(100),
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// How often the metrics store is polled for changes
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Whether the simulated peer connects as soon as advertising starts
    pub auto_connect: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            auto_connect: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Self::figment(path.as_ref()).extract().map_err(DaqError::from)
    }

    /// The provider chain used by [`AppConfig::load_from`].
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let level = self.application.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        let sim = &self.simulation;
        let nyquist = SAMPLE_RATE_HZ / 2.0;
        if !(sim.alpha_frequency_hz > 0.0 && sim.alpha_frequency_hz < nyquist) {
            return Err(DaqError::Configuration(format!(
                "alpha_frequency_hz {} must be in (0, {nyquist})",
                sim.alpha_frequency_hz
            )));
        }

        for (name, value) in [
            ("alpha_amplitude_mv", sim.alpha_amplitude_mv),
            ("noise_mv", sim.noise_mv),
            ("blink_amplitude_mv", sim.blink_amplitude_mv),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DaqError::Configuration(format!(
                    "{name} must be a finite value >= 0, got {value}"
                )));
            }
        }
        if !sim.baseline_mv.is_finite() {
            return Err(DaqError::Configuration(
                "baseline_mv must be finite".to_string(),
            ));
        }

        if sim.blink_duration < SAMPLE_PERIOD {
            return Err(DaqError::Configuration(format!(
                "blink_duration {:?} is shorter than one sample period",
                sim.blink_duration
            )));
        }
        if sim.blink_duration >= sim.blink_interval {
            return Err(DaqError::Configuration(format!(
                "blink_duration {:?} must be shorter than blink_interval {:?}",
                sim.blink_duration, sim.blink_interval
            )));
        }

        if self.notifier.poll_interval.is_zero() {
            return Err(DaqError::Configuration(
                "notifier.poll_interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
