// src/utils/mod.rs
//! Common utilities shared by the hardware layer

pub mod time;

pub use time::{is_before, FixedRateClock, MockTickSource, TickClock, TickSource};
