// src/utils/time.rs
//! Timer tick helpers
//!
//! Ticks are 32-bit and wrap; compare them with [`is_before`] rather than `<`.

use crate::config::constants::timer::MICROSECONDS_PER_SECOND;
use crate::config::TimerConfig;
use std::sync::atomic::{AtomicU32, Ordering};

/// Conversion between wall time and scheduler ticks
pub trait TickClock: Send + Sync {
    fn freq_hz(&self) -> u32;

    /// Ticks in `us` microseconds, saturating at `u32::MAX`
    fn us_to_ticks(&self, us: u32) -> u32 {
        let ticks = u64::from(us) * u64::from(self.freq_hz()) / MICROSECONDS_PER_SECOND;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Microseconds spanned by `ticks`, rounded down
    fn ticks_to_us(&self, ticks: u32) -> u64 {
        u64::from(ticks) * MICROSECONDS_PER_SECOND / u64::from(self.freq_hz().max(1))
    }
}

/// Source of the current tick count
pub trait TickSource: Send + Sync {
    fn now_ticks(&self) -> u32;
}

/// Clock running at a constant frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRateClock {
    freq_hz: u32,
}

impl FixedRateClock {
    pub fn new(freq_hz: u32) -> Self {
        Self { freq_hz }
    }

    pub fn from_config(config: &TimerConfig) -> Self {
        Self::new(config.clock_freq_hz)
    }
}

impl TickClock for FixedRateClock {
    fn freq_hz(&self) -> u32 {
        self.freq_hz
    }
}

/// Manually advanced tick source for deterministic testing
#[derive(Debug, Default)]
pub struct MockTickSource {
    current: AtomicU32,
}

impl MockTickSource {
    pub fn new(initial: u32) -> Self {
        Self {
            current: AtomicU32::new(initial),
        }
    }

    pub fn advance_by(&self, ticks: u32) {
        self.current.fetch_add(ticks, Ordering::Relaxed);
    }

    pub fn set(&self, ticks: u32) {
        self.current.store(ticks, Ordering::Relaxed);
    }
}

impl TickSource for MockTickSource {
    fn now_ticks(&self) -> u32 {
        self.current.load(Ordering::Relaxed)
    }
}

/// True if tick `a` comes before tick `b`, allowing for wraparound
pub fn is_before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}
