// src/shutdown.rs
//! Fatal shutdown boundary
//!
//! The hardware layer returns [`HwError`] values; the process entry point
//! hands them to a [`Shutdown`] implementation, which is where the firmware
//! actually halts.

use crate::error::{HwError, HwResult};
use parking_lot::Mutex;
use tracing::error;

/// Receiver of fatal hardware errors
pub trait Shutdown {
    /// Report a fatal condition. Implementations typically stop the scheduler.
    fn shutdown(&self, reason: &'static str, err: &HwError);
}

/// Shutdown handler that only logs the reason
#[derive(Debug, Default)]
pub struct LogShutdown;

impl Shutdown for LogShutdown {
    fn shutdown(&self, reason: &'static str, err: &HwError) {
        error!(reason, error = %err, "hardware shutdown");
    }
}

/// Shutdown handler that remembers every reason it was given
#[derive(Debug, Default)]
pub struct RecordingShutdown {
    reasons: Mutex<Vec<&'static str>>,
}

impl RecordingShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reasons reported so far, oldest first
    pub fn reasons(&self) -> Vec<&'static str> {
        self.reasons.lock().clone()
    }

    pub fn is_shutdown(&self) -> bool {
        !self.reasons.lock().is_empty()
    }
}

impl Shutdown for RecordingShutdown {
    fn shutdown(&self, reason: &'static str, err: &HwError) {
        error!(reason, error = %err, "hardware shutdown");
        self.reasons.lock().push(reason);
    }
}

/// Route an error result into a [`Shutdown`] handler
pub trait ShutdownExt<T> {
    /// Returns the value, or `None` after reporting the error as fatal.
    fn or_shutdown(self, handler: &dyn Shutdown) -> Option<T>;
}

impl<T> ShutdownExt<T> for HwResult<T> {
    fn or_shutdown(self, handler: &dyn Shutdown) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                handler.shutdown(err.shutdown_reason(), &err);
                None
            }
        }
    }
}
