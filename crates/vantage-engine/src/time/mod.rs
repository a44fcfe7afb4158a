//! Time subsystem.
//!
//! Render requests advance their own `NoiseClock` once per drawn frame; no
//! wall-clock time enters the pipeline.

mod noise_clock;

pub use noise_clock::{NoiseClock, NOISE_TIME_STEP, NOISE_TIME_WRAP};
