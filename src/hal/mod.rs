// src/hal/mod.rs
//! Hardware access layer: ADC sampling and spidev handles

pub mod traits;
pub mod types;
pub mod adc;
pub mod analog_in;
pub mod spidev;
pub mod simulator;


pub use traits::*;
pub use types::*;
pub use adc::AdcSampler;
pub use analog_in::{AnalogIn, AnalogInConfig, AnalogPoll};
pub use spidev::{SpiDeviceCache, SpiHandle};
#[cfg(unix)]
pub use spidev::LinuxDeviceOpener;
