// src/error.rs
//! Unified error handling for hardware access
//!
//! Every failure this crate can produce is fatal to the surrounding firmware:
//! a bad pin, a disabled converter, a full device table or a failed syscall
//! all mean the device set cannot be configured. The core still returns
//! these as values so callers (and tests) decide where to halt; see
//! [`crate::shutdown`] for the boundary that turns them into a shutdown.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum HwError {
    /// Static misconfiguration detected before any hardware I/O
    #[error("[CONFIG] {component}: {reason}")]
    Configuration {
        component: &'static str,
        reason: &'static str,
    },

    /// Underlying open/fcntl/write failure
    #[error("[IO] {operation} failed on {}: {source}", .path.display())]
    Io {
        operation: IoOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration source could not be parsed or merged
    #[error("[CONFIG] configuration load failed: {0}")]
    Config(String),
}

/// Error categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Io,
}

/// The syscall-level operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Open,
    SetNonBlocking,
    Write,
}

impl std::fmt::Display for IoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoOperation::Open => write!(f, "open spi"),
            IoOperation::SetNonBlocking => write!(f, "set non-blocking"),
            IoOperation::Write => write!(f, "write spi"),
        }
    }
}

/// Result type alias for hardware operations
pub type HwResult<T> = Result<T, HwError>;

impl HwError {
    pub(crate) fn configuration(component: &'static str, reason: &'static str) -> Self {
        HwError::Configuration { component, reason }
    }

    /// Error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            HwError::Configuration { .. } | HwError::Config(_) => ErrorKind::Configuration,
            HwError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Static message suitable for a firmware shutdown reason
    pub fn shutdown_reason(&self) -> &'static str {
        match self {
            HwError::Configuration { reason, .. } => *reason,
            HwError::Io { operation, .. } => match operation {
                IoOperation::Open => "Unable to open spi device",
                IoOperation::SetNonBlocking => "Unable to set non-blocking on spi device",
                IoOperation::Write => "Unable to write to spi",
            },
            HwError::Config(_) => "Invalid configuration",
        }
    }

    /// OS error number for I/O failures, if the platform reported one
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            HwError::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

impl From<::config::ConfigError> for HwError {
    fn from(err: ::config::ConfigError) -> Self {
        HwError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for HwError {
    fn from(err: toml::de::Error) -> Self {
        HwError::Config(err.to_string())
    }
}

/// Convenience trait for attaching I/O context
pub trait IntoHwError<T> {
    fn hw_err(self, operation: IoOperation, path: &Path) -> HwResult<T>;
}

impl<T> IntoHwError<T> for Result<T, io::Error> {
    fn hw_err(self, operation: IoOperation, path: &Path) -> HwResult<T> {
        self.map_err(|source| HwError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        })
    }
}
