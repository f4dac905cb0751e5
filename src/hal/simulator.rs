// src/hal/simulator.rs
//! Simulated hardware
//!
//! Stand-ins for the converter registers and the spidev filesystem. Both are
//! cheap to clone and share state between clones, so a test can keep one
//! handle for inspection while the sampler or cache owns the other.

use crate::config::constants::adc::{ADC_MAX, CHANNEL_COUNT, FIFO_CHANNEL_SHIFT};
use crate::hal::traits::{AdcRegisters, DeviceOpener};
use crate::hal::types::AdcChannel;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Simulated converter register file
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    inner: Arc<Mutex<AdcState>>,
}

#[derive(Debug)]
struct AdcState {
    enabled: bool,
    fifo: VecDeque<u32>,
    step_writes: Vec<u32>,
    latency: Option<Latency>,
    in_flight: Vec<Conversion>,
    channel_values: [u16; CHANNEL_COUNT as usize],
}

/// Automatic conversion timing, counted in FIFO polls
#[derive(Debug)]
struct Latency {
    min_polls: u32,
    max_polls: u32,
    rng: StdRng,
}

#[derive(Debug)]
struct Conversion {
    channel: u8,
    remaining_polls: u32,
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAdc {
    /// Enabled converter that only produces results pushed by the test
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AdcState {
                enabled: true,
                fifo: VecDeque::new(),
                step_writes: Vec::new(),
                latency: None,
                in_flight: Vec::new(),
                channel_values: [0; CHANNEL_COUNT as usize],
            })),
        }
    }

    /// Converter that finishes each started conversion on its own after a
    /// random number of FIFO polls in `min_polls..=max_polls`
    pub fn with_latency(min_polls: u32, max_polls: u32, seed: u64) -> Self {
        let adc = Self::new();
        adc.inner.lock().latency = Some(Latency {
            min_polls,
            max_polls: max_polls.max(min_polls),
            rng: StdRng::seed_from_u64(seed),
        });
        adc
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.lock().enabled = enabled;
    }

    /// Value produced by automatic conversions on `channel`, clamped to `ADC_MAX`
    pub fn set_channel_value(&self, channel: AdcChannel, value: u16) {
        self.inner.lock().channel_values[usize::from(channel.index())] = value.min(ADC_MAX);
    }

    /// Queue a finished conversion
    pub fn push_result(&self, channel: AdcChannel, value: u16) {
        self.push_raw((u32::from(channel.index()) << FIFO_CHANNEL_SHIFT) | u32::from(value));
    }

    /// Queue a raw FIFO word
    pub fn push_raw(&self, word: u32) {
        self.inner.lock().fifo.push_back(word);
    }

    pub fn fifo_len(&self) -> usize {
        self.inner.lock().fifo.len()
    }

    /// Every mask written to the step-enable register
    pub fn step_writes(&self) -> Vec<u32> {
        self.inner.lock().step_writes.clone()
    }
}

impl AdcRegisters for SimulatedAdc {
    fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    fn enable_step(&mut self, mask: u32) {
        let mut state = self.inner.lock();
        state.step_writes.push(mask);

        let Some(latency) = state.latency.as_mut() else {
            return;
        };
        let polls = latency.rng.gen_range(latency.min_polls..=latency.max_polls);
        // Bit N + 1 selects channel N
        for channel in 0..CHANNEL_COUNT {
            if mask & (1 << (u32::from(channel) + 1)) != 0 {
                state.in_flight.push(Conversion {
                    channel,
                    remaining_polls: polls,
                });
            }
        }
    }

    fn fifo_count(&mut self) -> u32 {
        let mut state = self.inner.lock();
        let AdcState {
            in_flight,
            fifo,
            channel_values,
            ..
        } = &mut *state;

        in_flight.retain_mut(|conv| {
            if conv.remaining_polls == 0 {
                let value = channel_values[usize::from(conv.channel)];
                fifo.push_back((u32::from(conv.channel) << FIFO_CHANNEL_SHIFT) | u32::from(value));
                false
            } else {
                conv.remaining_polls -= 1;
                true
            }
        });
        fifo.len() as u32
    }

    fn fifo_pop(&mut self) -> u32 {
        self.inner.lock().fifo.pop_front().unwrap_or(0)
    }
}

/// In-memory device filesystem for the spidev cache
#[derive(Debug, Clone, Default)]
pub struct MemoryDeviceOpener {
    inner: Arc<Mutex<OpenerState>>,
}

#[derive(Debug, Default)]
struct OpenerState {
    opened: Vec<PathBuf>,
    buffers: HashMap<PathBuf, Arc<Mutex<Vec<u8>>>>,
    missing: HashSet<PathBuf>,
    fail_non_blocking: bool,
    fail_writes: bool,
}

/// Stream handed out by [`MemoryDeviceOpener`]
#[derive(Debug)]
pub struct MemoryStream {
    path: PathBuf,
    buffer: Arc<Mutex<Vec<u8>>>,
    opener: Arc<Mutex<OpenerState>>,
}

impl MemoryDeviceOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make opens of `path` fail with `ENOENT`
    pub fn remove_device(&self, path: impl Into<PathBuf>) {
        self.inner.lock().missing.insert(path.into());
    }

    pub fn fail_non_blocking(&self, fail: bool) {
        self.inner.lock().fail_non_blocking = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Every successful open, in order
    pub fn opened(&self) -> Vec<PathBuf> {
        self.inner.lock().opened.clone()
    }

    pub fn open_count(&self) -> usize {
        self.inner.lock().opened.len()
    }

    /// Bytes written to `path` so far
    pub fn written(&self, path: impl AsRef<Path>) -> Vec<u8> {
        self.inner
            .lock()
            .buffers
            .get(path.as_ref())
            .map(|buf| buf.lock().clone())
            .unwrap_or_default()
    }
}

impl DeviceOpener for MemoryDeviceOpener {
    type Stream = MemoryStream;

    fn open(&mut self, path: &Path) -> io::Result<MemoryStream> {
        let mut state = self.inner.lock();
        if state.missing.contains(path) {
            return Err(io::Error::from_raw_os_error(libc::ENOENT));
        }
        state.opened.push(path.to_path_buf());
        let buffer = state.buffers.entry(path.to_path_buf()).or_default().clone();
        Ok(MemoryStream {
            path: path.to_path_buf(),
            buffer,
            opener: Arc::clone(&self.inner),
        })
    }

    fn set_non_blocking(&mut self, _stream: &MemoryStream) -> io::Result<()> {
        if self.inner.lock().fail_non_blocking {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        Ok(())
    }
}

impl MemoryStream {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.opener.lock().fail_writes {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
