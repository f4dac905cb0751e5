// src/hal/spidev.rs
//! Linux spidev handle cache
//!
//! Opening a device file can stall, so each `(bus, device)` address is opened
//! once, switched to non-blocking mode, and reused for the life of the
//! process. The table is append-only and bounded by
//! [`MAX_DEVICES`](crate::config::constants::spi::MAX_DEVICES).

use crate::config::constants::spi::{DEFAULT_DEVICE_PREFIX, MAX_DEVICES, MAX_TRANSFER_BYTES};
use crate::config::SpiConfig;
use crate::error::{HwError, HwResult, IntoHwError, IoOperation};
use crate::hal::traits::DeviceOpener;
use crate::hal::types::{DeviceAddress, SpiMode};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Opaque reference to a cached device, returned by setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiHandle {
    index: usize,
    address: DeviceAddress,
}

impl SpiHandle {
    pub fn address(&self) -> DeviceAddress {
        self.address
    }
}

struct SpiDevice<S> {
    address: DeviceAddress,
    stream: S,
}

/// Bounded, deduplicating set of open device handles
pub struct SpiDeviceCache<O: DeviceOpener> {
    opener: O,
    device_prefix: String,
    devices: Vec<SpiDevice<O::Stream>>,
}

impl<O: DeviceOpener> SpiDeviceCache<O> {
    pub fn new(opener: O) -> Self {
        Self::with_prefix(opener, DEFAULT_DEVICE_PREFIX)
    }

    pub fn with_config(opener: O, config: &SpiConfig) -> Self {
        Self::with_prefix(opener, &config.device_prefix)
    }

    pub fn with_prefix(opener: O, device_prefix: &str) -> Self {
        Self {
            opener,
            device_prefix: device_prefix.to_string(),
            devices: Vec::with_capacity(MAX_DEVICES),
        }
    }

    /// Resolve a packed bus id to a cached handle, opening the device on
    /// first use. `mode` and `rate` are left to the kernel driver.
    pub fn setup(&mut self, bus_encoded: u32, mode: SpiMode, rate: u32) -> HwResult<SpiHandle> {
        let address = DeviceAddress::from_encoded(bus_encoded);
        debug!(%address, ?mode, rate, "spi setup");
        self.get_or_open(address.bus, address.device)
    }

    /// Return the handle for `(bus, device)`, opening it if not yet cached
    pub fn get_or_open(&mut self, bus: u8, device: u8) -> HwResult<SpiHandle> {
        let address = DeviceAddress::new(bus, device);
        if let Some(index) = self.devices.iter().position(|d| d.address == address) {
            return Ok(SpiHandle { index, address });
        }

        if self.devices.len() >= MAX_DEVICES {
            return Err(HwError::configuration("spidev", "Too many spi devices"));
        }

        let path = address.device_path(&self.device_prefix);
        let stream = self.opener.open(&path).hw_err(IoOperation::Open, &path)?;
        self.opener
            .set_non_blocking(&stream)
            .hw_err(IoOperation::SetNonBlocking, &path)?;

        let index = self.devices.len();
        self.devices.push(SpiDevice { address, stream });
        info!(%address, path = %path.display(), "opened spi device");
        Ok(SpiHandle { index, address })
    }

    /// Write `data` to the device in one call. A short write is not an error.
    pub fn transfer(&mut self, handle: SpiHandle, data: &[u8]) -> HwResult<usize> {
        if data.len() > MAX_TRANSFER_BYTES {
            return Err(HwError::configuration("spidev", "Spi transfer too large"));
        }
        let device_prefix = &self.device_prefix;
        let device = self
            .devices
            .get_mut(handle.index)
            .filter(|d| d.address == handle.address)
            .ok_or(HwError::configuration("spidev", "Unknown spi handle"))?;

        device.stream.write(data).hw_err(
            IoOperation::Write,
            &device.address.device_path(device_prefix),
        )
    }

    /// Transfer that optionally asks for the response bytes. The write-only
    /// transport cannot return data, so `receive` is rejected.
    pub fn transfer_with_response(
        &mut self,
        handle: SpiHandle,
        receive: bool,
        data: &[u8],
    ) -> HwResult<usize> {
        if receive {
            return Err(HwError::configuration("spidev", "Spi receive not supported"));
        }
        self.transfer(handle, data)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Cached addresses in open order
    pub fn addresses(&self) -> impl Iterator<Item = DeviceAddress> + '_ {
        self.devices.iter().map(|d| d.address)
    }

    pub fn device_prefix(&self) -> &str {
        &self.device_prefix
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }
}

impl<O: DeviceOpener> std::fmt::Debug for SpiDeviceCache<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpiDeviceCache")
            .field("device_prefix", &self.device_prefix)
            .field("devices", &self.addresses().collect::<Vec<_>>())
            .finish()
    }
}

/// Opens real device files: read/write, close-on-exec, then `O_NONBLOCK`
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxDeviceOpener;

#[cfg(unix)]
impl DeviceOpener for LinuxDeviceOpener {
    type Stream = std::fs::File;

    fn open(&mut self, path: &Path) -> std::io::Result<std::fs::File> {
        use std::os::unix::fs::OpenOptionsExt;

        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(path)
    }

    fn set_non_blocking(&mut self, stream: &std::fs::File) -> std::io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let fd = stream.as_raw_fd();
        // SAFETY: fd is owned by `stream` and stays open for both calls
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(std::io::Error::last_os_error());
        }
        // SAFETY: as above
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }
}
