// src/config/constants.rs
//! Hardware constants

/// Analog-to-digital converter constants
pub mod adc {
    /// Pins are numbered 32 per GPIO bank; the converter inputs live in bank 4
    pub const PIN_OFFSET: u8 = 4 * 32;
    pub const CHANNEL_COUNT: u8 = 8;

    /// Largest raw value a single 12-bit conversion can produce
    pub const ADC_MAX: u16 = 4095;

    /// Minimum conversion latency, in timer ticks
    pub const DEFAULT_RETRY_TICKS: u32 = 160;

    /// FIFO words carry the step (channel) id above this bit
    pub const FIFO_CHANNEL_SHIFT: u32 = 16;
}

/// Linux spidev constants
pub mod spi {
    /// Maximum simultaneously open device handles. Not configurable.
    pub const MAX_DEVICES: usize = 16;
    pub const DEFAULT_DEVICE_PREFIX: &str = "/dev/spidev";

    /// Largest single transfer the command layer hands down
    pub const MAX_TRANSFER_BYTES: usize = u8::MAX as usize;
}

/// Timer constants
pub mod timer {
    pub const DEFAULT_CLOCK_FREQ_HZ: u32 = 200_000_000;
    pub const MICROSECONDS_PER_SECOND: u64 = 1_000_000;
}
