// src/config/mod.rs
//! Hardware configuration

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::ConfigLoader;

use crate::error::{HwError, HwResult};
use serde::{Deserialize, Serialize};

/// Complete hardware configuration
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct HardwareConfig {
    #[serde(default)]
    pub adc: AdcConfig,

    #[serde(default)]
    pub spi: SpiConfig,

    #[serde(default)]
    pub timer: TimerConfig,
}

/// Converter settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AdcConfig {
    /// Ticks a caller waits before re-polling an unfinished conversion
    #[serde(default = "defaults::retry_ticks")]
    pub retry_ticks: u32,
}

/// spidev settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpiConfig {
    /// Path prefix; `<prefix><bus>.<device>` names a device file
    #[serde(default = "defaults::device_prefix")]
    pub device_prefix: String,
}

/// Scheduler timer settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimerConfig {
    #[serde(default = "defaults::clock_freq_hz")]
    pub clock_freq_hz: u32,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn retry_ticks() -> u32 {
        adc::DEFAULT_RETRY_TICKS
    }

    pub fn device_prefix() -> String {
        spi::DEFAULT_DEVICE_PREFIX.to_string()
    }

    pub fn clock_freq_hz() -> u32 {
        timer::DEFAULT_CLOCK_FREQ_HZ
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            retry_ticks: defaults::retry_ticks(),
        }
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            device_prefix: defaults::device_prefix(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            clock_freq_hz: defaults::clock_freq_hz(),
        }
    }
}

impl HardwareConfig {
    /// Reject values the hardware layer cannot run with
    pub fn validate(&self) -> HwResult<()> {
        // A zero delay would read as "sample ready"
        if self.adc.retry_ticks == 0 {
            return Err(HwError::configuration("config", "adc.retry_ticks must be non-zero"));
        }
        if self.spi.device_prefix.is_empty() {
            return Err(HwError::configuration("config", "spi.device_prefix cannot be empty"));
        }
        if self.timer.clock_freq_hz == 0 {
            return Err(HwError::configuration("config", "timer.clock_freq_hz must be non-zero"));
        }
        Ok(())
    }
}
