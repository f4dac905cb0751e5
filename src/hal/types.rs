// src/hal/types.rs
//! Core types for hardware access

use crate::config::constants::adc::{CHANNEL_COUNT, PIN_OFFSET};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One input of the shared converter, `0..8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdcChannel(u8);

impl AdcChannel {
    /// Map a physical pin to its converter channel
    pub fn from_pin(pin: u8) -> Option<Self> {
        let chan = pin.checked_sub(PIN_OFFSET)?;
        (chan < CHANNEL_COUNT).then_some(Self(chan))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Physical pin carrying this channel
    pub fn pin(self) -> u8 {
        self.0 + PIN_OFFSET
    }

    /// Step-enable bit that starts a conversion on this channel. Step 0 is
    /// reserved, so channel N lives in step N + 1.
    pub fn step_mask(self) -> u32 {
        1 << (u32::from(self.0) + 1)
    }
}

impl fmt::Display for AdcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adc{}", self.0)
    }
}

/// Sampler state; at most one conversion is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplerState {
    #[default]
    Idle,
    Pending(AdcChannel),
}

/// Interpretation of the tick count returned by a sample call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    /// Result available; read it now
    Ready,
    /// Not ready; poll again after this many ticks
    Retry(u32),
}

impl SampleStatus {
    pub fn from_ticks(ticks: u32) -> Self {
        match ticks {
            0 => SampleStatus::Ready,
            n => SampleStatus::Retry(n),
        }
    }

    pub fn is_ready(self) -> bool {
        self == SampleStatus::Ready
    }
}

/// Composite `(bus, device)` key of an SPI peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    pub bus: u8,
    pub device: u8,
}

impl DeviceAddress {
    pub fn new(bus: u8, device: u8) -> Self {
        Self { bus, device }
    }

    /// Decode a packed bus id: bits 15..8 are the bus, 7..0 the device.
    /// Higher bits are ignored.
    pub fn from_encoded(encoded: u32) -> Self {
        Self {
            bus: ((encoded >> 8) & 0xff) as u8,
            device: (encoded & 0xff) as u8,
        }
    }

    pub fn encode(self) -> u32 {
        (u32::from(self.bus) << 8) | u32::from(self.device)
    }

    /// Device file for this address, e.g. `/dev/spidev0.1`
    pub fn device_path(self, prefix: &str) -> PathBuf {
        PathBuf::from(format!("{}{}.{}", prefix, self.bus, self.device))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bus, self.device)
    }
}

/// SPI clock polarity/phase. Accepted for interface compatibility; the
/// kernel driver owns the actual bus setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpiMode {
    /// CPOL 0, CPHA 0
    Mode0 = 0,
    /// CPOL 0, CPHA 1
    Mode1 = 1,
    /// CPOL 1, CPHA 0
    Mode2 = 2,
    /// CPOL 1, CPHA 1
    Mode3 = 3,
}

impl SpiMode {
    /// Decode a wire mode byte; only the low two bits are significant
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => SpiMode::Mode0,
            1 => SpiMode::Mode1,
            2 => SpiMode::Mode2,
            _ => SpiMode::Mode3,
        }
    }
}
