// src/hal/analog_in.rs
//! Periodic oversampled analog input
//!
//! Drives an [`AdcSampler`] from a cooperative timer: every `rest_ticks` a
//! batch of `sample_count` conversions is taken, `sample_ticks` apart, and
//! their sum is range-checked and reported. Each [`AnalogIn::poll`] call does
//! at most one non-blocking step and says when it wants to run next.

use crate::config::constants::adc::ADC_MAX;
use crate::error::{HwError, HwResult};
use crate::hal::adc::AdcSampler;
use crate::hal::traits::AdcRegisters;
use crate::hal::types::AdcChannel;
use crate::utils::time::is_before;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Batch timing and accepted range for an analog input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogInConfig {
    /// Ticks between conversions within a batch
    pub sample_ticks: u32,
    /// Conversions summed per report
    pub sample_count: u8,
    /// Ticks from one batch start to the next
    pub rest_ticks: u32,
    /// Smallest acceptable sum
    pub min_value: u32,
    /// Largest acceptable sum
    pub max_value: u32,
}

impl Default for AnalogInConfig {
    fn default() -> Self {
        Self {
            sample_ticks: 0,
            sample_count: 1,
            rest_ticks: 0,
            min_value: 0,
            max_value: u32::MAX,
        }
    }
}

/// What the caller should do after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogPoll {
    /// Call again once the clock reaches this tick
    WaitUntil(u32),
    /// A batch finished. The next batch starts at `next_clock`.
    Report { value: u32, next_clock: u32 },
}

/// One periodically sampled input
#[derive(Debug, Clone)]
pub struct AnalogIn {
    channel: AdcChannel,
    config: AnalogInConfig,
    waketime: u32,
    next_begin_time: u32,
    value: u32,
    taken: u8,
}

impl AnalogIn {
    pub fn new(channel: AdcChannel, config: AnalogInConfig, start_clock: u32) -> HwResult<Self> {
        if config.sample_count == 0 {
            return Err(HwError::configuration("analog_in", "sample_count must be non-zero"));
        }
        if config.min_value > config.max_value {
            return Err(HwError::configuration("analog_in", "min_value exceeds max_value"));
        }
        Ok(Self {
            channel,
            config,
            waketime: start_clock,
            next_begin_time: start_clock,
            value: 0,
            taken: 0,
        })
    }

    pub fn channel(&self) -> AdcChannel {
        self.channel
    }

    /// Tick at which the next poll does work
    pub fn waketime(&self) -> u32 {
        self.waketime
    }

    /// Run one step if `now` has reached the wake time
    pub fn poll<R: AdcRegisters>(
        &mut self,
        sampler: &mut AdcSampler<R>,
        now: u32,
    ) -> HwResult<AnalogPoll> {
        if is_before(now, self.waketime) {
            return Ok(AnalogPoll::WaitUntil(self.waketime));
        }

        let delay = sampler.sample(self.channel);
        if delay != 0 {
            self.waketime = self.waketime.wrapping_add(delay);
            return Ok(AnalogPoll::WaitUntil(self.waketime));
        }

        let sample = u32::from(sampler.read(self.channel));
        if self.taken == 0 {
            self.value = sample;
        } else {
            self.value = self.value.saturating_add(sample);
        }
        self.taken += 1;

        if self.taken < self.config.sample_count {
            self.waketime = self.waketime.wrapping_add(self.config.sample_ticks);
            return Ok(AnalogPoll::WaitUntil(self.waketime));
        }

        let value = self.value;
        self.taken = 0;
        self.next_begin_time = self.next_begin_time.wrapping_add(self.config.rest_ticks);
        self.waketime = self.next_begin_time;

        if value < self.config.min_value || value > self.config.max_value {
            error!(channel = %self.channel, value, "adc value out of range");
            return Err(HwError::configuration("analog_in", "ADC out of range"));
        }
        debug!(channel = %self.channel, value, "analog batch complete");
        Ok(AnalogPoll::Report {
            value,
            next_clock: self.next_begin_time,
        })
    }

    /// Abandon the current batch and any in-flight conversion
    pub fn cancel<R: AdcRegisters>(&mut self, sampler: &mut AdcSampler<R>) {
        sampler.cancel(self.channel);
        self.taken = 0;
    }

    /// Normalise a reported sum to `0.0..=1.0`
    pub fn to_fraction(&self, value: u32) -> f32 {
        value as f32 / (f32::from(self.config.sample_count) * f32::from(ADC_MAX))
    }
}
