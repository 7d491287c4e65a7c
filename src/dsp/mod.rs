//! # DSP (Digital Signal Processing)
//!
//! The host-independent core of the plugin, leaves first:
//!
//! - **`parameter`**: what each control is called, what range it accepts
//!   and how out-of-range values are folded back in.
//! - **`smoother`**: the atomic target shared with the control thread, and
//!   the per-sample ramp that turns knob jumps into click-free values.
//! - **`delay_line`**: multi-channel ring buffer with interpolated reads.
//! - **`ping_pong`**: the engine that ties them together and crosses the
//!   feedback paths.

pub mod delay_line;
pub mod parameter;
pub mod ping_pong;
pub mod smoother;
