//! HWIO-Core: non-blocking hardware access for cooperative firmware hosts
//!
//! The firmware this library serves runs a cooperative scheduler where no
//! call may wait on slow hardware. This crate provides:
//!
//! - An ADC sampler that starts a conversion, reports "retry after N ticks"
//!   until the result lands, then hands out the value
//! - A periodic oversampling reader built on that sampler
//! - A bounded cache of non-blocking spidev handles keyed by `(bus, device)`
//! - Layered configuration, a fatal-shutdown boundary and simulated hardware
//!
//! # Quick Start
//!
//! ```rust
//! use hwio_core::hal::{AdcSampler, SpiDeviceCache, SpiMode};
//! use hwio_core::hal::simulator::{MemoryDeviceOpener, SimulatedAdc};
//!
//! let adc = SimulatedAdc::new();
//! let mut sampler = AdcSampler::new(adc.clone());
//! let channel = sampler.setup(128)?;
//!
//! // Start the conversion; a non-zero result means "poll again later"
//! assert_ne!(sampler.sample(channel), 0);
//! adc.push_result(channel, 2048);
//! assert_eq!(sampler.sample(channel), 0);
//! assert_eq!(sampler.read(channel), 2048);
//!
//! let mut spi = SpiDeviceCache::new(MemoryDeviceOpener::new());
//! let handle = spi.setup(0x0001, SpiMode::Mode0, 1_000_000)?;
//! spi.transfer(handle, &[0x01, 0x02])?;
//! # Ok::<(), hwio_core::HwError>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod hal;
pub mod shutdown;
pub mod utils;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, HwError, HwResult};
pub use hal::{
    AdcChannel, AdcSampler, AnalogIn, AnalogInConfig, AnalogPoll, DeviceAddress, SampleStatus,
    SamplerState, SpiDeviceCache, SpiHandle, SpiMode,
};
pub use shutdown::{LogShutdown, Shutdown, ShutdownExt};
pub use utils::time::{FixedRateClock, TickClock, TickSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
