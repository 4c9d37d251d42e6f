//! Shared utilities used across modules.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
