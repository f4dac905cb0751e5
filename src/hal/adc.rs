// src/hal/adc.rs
//! Non-blocking analog-to-digital sampling
//!
//! The converter needs an unpredictable amount of time per conversion, and
//! callers run on a cooperative scheduler that must never stall. So a sample
//! is a small state machine driven by repeated calls:
//!
//! 1. [`AdcSampler::sample`] on an idle sampler starts a conversion and
//!    returns a non-zero number of ticks to wait.
//! 2. Later calls for the same channel drain the result FIFO. They return `0`
//!    once the channel's result has arrived, otherwise the same tick count.
//! 3. After a `0`, [`AdcSampler::read`] returns the value.
//!
//! Only one conversion may be in flight. A caller that gives up must call
//! [`AdcSampler::cancel`], or every other channel stays locked out.

use crate::config::constants::adc::{DEFAULT_RETRY_TICKS, FIFO_CHANNEL_SHIFT};
use crate::config::AdcConfig;
use crate::error::{HwError, HwResult};
use crate::hal::traits::AdcRegisters;
use crate::hal::types::{AdcChannel, SampleStatus, SamplerState};
use tracing::{debug, trace, warn};

/// Owner of the single converter and its in-flight request
#[derive(Debug)]
pub struct AdcSampler<R: AdcRegisters> {
    regs: R,
    state: SamplerState,
    last_sample: u16,
    last_channel: Option<AdcChannel>,
    retry_ticks: u32,
}

impl<R: AdcRegisters> AdcSampler<R> {
    pub fn new(regs: R) -> Self {
        Self::with_retry_ticks(regs, DEFAULT_RETRY_TICKS)
    }

    pub fn with_config(regs: R, config: &AdcConfig) -> Self {
        Self::with_retry_ticks(regs, config.retry_ticks)
    }

    /// `retry_ticks` of zero is bumped to one; zero means "ready"
    pub fn with_retry_ticks(regs: R, retry_ticks: u32) -> Self {
        Self {
            regs,
            state: SamplerState::Idle,
            last_sample: 0,
            last_channel: None,
            retry_ticks: retry_ticks.max(1),
        }
    }

    /// Validate `pin` and the converter, returning the channel descriptor
    pub fn setup(&self, pin: u8) -> HwResult<AdcChannel> {
        let channel =
            AdcChannel::from_pin(pin).ok_or(HwError::configuration("adc", "Not an adc channel"))?;
        if !self.regs.is_enabled() {
            return Err(HwError::configuration("adc", "ADC module not enabled"));
        }
        debug!(pin, %channel, "adc channel configured");
        Ok(channel)
    }

    /// Advance the sampling state machine for `channel`.
    ///
    /// Returns `0` if a result is ready for [`read`](Self::read), otherwise
    /// the number of ticks to wait before calling again.
    pub fn sample(&mut self, channel: AdcChannel) -> u32 {
        match self.state {
            SamplerState::Idle => {
                self.state = SamplerState::Pending(channel);
                self.regs.enable_step(channel.step_mask());
                debug!(%channel, "adc conversion started");
            }
            SamplerState::Pending(pending) if pending == channel => {
                while self.regs.fifo_count() > 0 {
                    let word = self.regs.fifo_pop();
                    if word >> FIFO_CHANNEL_SHIFT == u32::from(channel.index()) {
                        self.state = SamplerState::Idle;
                        self.last_sample = word as u16;
                        self.last_channel = Some(channel);
                        debug!(%channel, value = self.last_sample, "adc conversion complete");
                        return 0;
                    }
                    trace!(%channel, word, "discarding stale adc result");
                }
            }
            SamplerState::Pending(pending) => {
                warn!(%channel, %pending, "adc sample requested while another channel is pending");
            }
        }
        self.retry_ticks
    }

    /// [`sample`](Self::sample) as a typed status
    pub fn poll(&mut self, channel: AdcChannel) -> SampleStatus {
        SampleStatus::from_ticks(self.sample(channel))
    }

    /// Last completed sample.
    ///
    /// Only meaningful right after [`sample`](Self::sample) returned `0` for
    /// `channel`. Out-of-protocol calls return stale data in release builds
    /// and panic in debug builds; use [`try_read`](Self::try_read) for a
    /// checked variant.
    pub fn read(&self, channel: AdcChannel) -> u16 {
        debug_assert!(
            self.is_result_for(channel),
            "adc read of {} outside the sample protocol",
            channel
        );
        self.last_sample
    }

    /// Last completed sample, if it belongs to `channel` and no conversion
    /// has been started since
    pub fn try_read(&self, channel: AdcChannel) -> Option<u16> {
        self.is_result_for(channel).then_some(self.last_sample)
    }

    /// Abandon an in-flight sample for `channel`; no-op otherwise
    pub fn cancel(&mut self, channel: AdcChannel) {
        if self.state == SamplerState::Pending(channel) {
            self.state = SamplerState::Idle;
            debug!(%channel, "adc conversion cancelled");
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn retry_ticks(&self) -> u32 {
        self.retry_ticks
    }

    fn is_result_for(&self, channel: AdcChannel) -> bool {
        self.state == SamplerState::Idle && self.last_channel == Some(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::simulator::SimulatedAdc;

    fn channel(pin: u8) -> AdcChannel {
        AdcChannel::from_pin(pin).unwrap()
    }

    #[test]
    fn test_setup_maps_pins() {
        let sampler = AdcSampler::new(SimulatedAdc::new());
        assert_eq!(sampler.setup(128).unwrap().index(), 0);
        assert_eq!(sampler.setup(135).unwrap().index(), 7);
    }

    #[test]
    fn test_setup_rejects_invalid_pins() {
        let sampler = AdcSampler::new(SimulatedAdc::new());
        for pin in [0, 127, 136, 255] {
            let err = sampler.setup(pin).unwrap_err();
            assert_eq!(err.shutdown_reason(), "Not an adc channel");
        }
    }

    #[test]
    fn test_setup_requires_enabled_converter() {
        let adc = SimulatedAdc::new();
        adc.set_enabled(false);
        let sampler = AdcSampler::new(adc);

        let err = sampler.setup(130).unwrap_err();
        assert_eq!(err.shutdown_reason(), "ADC module not enabled");
    }

    #[test]
    fn test_idle_sample_starts_conversion() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc.clone());
        let ch = channel(131);

        assert_eq!(sampler.sample(ch), DEFAULT_RETRY_TICKS);
        assert_eq!(sampler.state(), SamplerState::Pending(ch));
        assert_eq!(adc.step_writes(), vec![1 << 4]);
    }

    #[test]
    fn test_polling_without_result_is_idempotent() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::with_retry_ticks(adc.clone(), 42);
        let ch = channel(128);

        for _ in 0..5 {
            assert_eq!(sampler.sample(ch), 42);
            assert_eq!(sampler.state(), SamplerState::Pending(ch));
        }
        assert_eq!(adc.step_writes().len(), 1);
    }

    #[test]
    fn test_ready_result_completes_sample() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc.clone());
        let ch = channel(129);

        assert_ne!(sampler.sample(ch), 0);
        adc.push_result(ch, 1234);

        assert_eq!(sampler.sample(ch), 0);
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert_eq!(sampler.read(ch), 1234);
        assert_eq!(sampler.try_read(ch), Some(1234));
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc.clone());
        let ch = channel(133);

        sampler.sample(ch);
        adc.push_result(channel(128), 11);
        adc.push_result(channel(134), 22);
        assert_ne!(sampler.sample(ch), 0);
        assert_eq!(adc.fifo_len(), 0);

        adc.push_result(channel(130), 33);
        adc.push_result(ch, 44);
        adc.push_result(channel(131), 55);
        assert_eq!(sampler.sample(ch), 0);
        assert_eq!(sampler.read(ch), 44);
        // Entries behind the match stay queued
        assert_eq!(adc.fifo_len(), 1);
    }

    #[test]
    fn test_other_channel_does_not_start_while_pending() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc.clone());
        let first = channel(128);
        let second = channel(129);

        sampler.sample(first);
        adc.push_result(second, 99);

        assert_ne!(sampler.sample(second), 0);
        assert_eq!(sampler.state(), SamplerState::Pending(first));
        assert_eq!(adc.step_writes().len(), 1);
        // The queued result was not consumed by the wrong caller
        assert_eq!(adc.fifo_len(), 1);
    }

    #[test]
    fn test_cancel() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc);
        let first = channel(128);
        let second = channel(129);

        sampler.cancel(first);
        assert_eq!(sampler.state(), SamplerState::Idle);

        sampler.sample(first);
        sampler.cancel(second);
        assert_eq!(sampler.state(), SamplerState::Pending(first));

        sampler.cancel(first);
        assert_eq!(sampler.state(), SamplerState::Idle);

        assert_ne!(sampler.sample(second), 0);
        assert_eq!(sampler.state(), SamplerState::Pending(second));
    }

    #[test]
    fn test_try_read_outside_protocol() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc.clone());
        let first = channel(128);
        let second = channel(129);

        assert_eq!(sampler.try_read(first), None);

        sampler.sample(first);
        adc.push_result(first, 7);
        assert_eq!(sampler.sample(first), 0);
        assert_eq!(sampler.try_read(second), None);

        sampler.sample(second);
        assert_eq!(sampler.try_read(first), None);
    }

    #[test]
    fn test_raw_word_for_channel_zero() {
        let adc = SimulatedAdc::new();
        let mut sampler = AdcSampler::new(adc.clone());
        let ch = channel(128);

        sampler.sample(ch);
        adc.push_raw(0x0fff);
        assert_eq!(sampler.poll(ch), SampleStatus::Ready);
        assert_eq!(sampler.read(ch), 0x0fff);
    }

    #[test]
    fn test_zero_retry_ticks_is_bumped() {
        let sampler = AdcSampler::with_retry_ticks(SimulatedAdc::new(), 0);
        assert_eq!(sampler.retry_ticks(), 1);
    }
}
