// src/hal/traits.rs
//! Low-level hardware seams
//!
//! The sampler and the device cache never touch registers or the filesystem
//! directly; they go through these traits so the simulator can stand in for
//! real hardware.

use std::io::{self, Write};
use std::path::Path;

/// Register access for a single shared analog-to-digital converter
pub trait AdcRegisters {
    /// True if the converter's control register reports it enabled
    fn is_enabled(&self) -> bool;

    /// Write the step-enable register, starting the conversions selected by `mask`
    fn enable_step(&mut self, mask: u32);

    /// Number of finished conversions waiting in the result FIFO
    fn fifo_count(&mut self) -> u32;

    /// Pop one result word; the channel sits above bit 16, the value below
    fn fifo_pop(&mut self) -> u32;
}

/// Opens device files for the spidev cache
pub trait DeviceOpener {
    type Stream: Write;

    /// Open `path` read/write and close-on-exec
    fn open(&mut self, path: &Path) -> io::Result<Self::Stream>;

    /// Switch an opened stream to non-blocking mode
    fn set_non_blocking(&mut self, stream: &Self::Stream) -> io::Result<()>;
}

impl<R: AdcRegisters + ?Sized> AdcRegisters for Box<R> {
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn enable_step(&mut self, mask: u32) {
        (**self).enable_step(mask)
    }

    fn fifo_count(&mut self) -> u32 {
        (**self).fifo_count()
    }

    fn fifo_pop(&mut self) -> u32 {
        (**self).fifo_pop()
    }
}
