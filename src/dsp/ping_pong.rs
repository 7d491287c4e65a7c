//! # Ping-Pong Engine
//!
//! A ping-pong delay is two delay lines whose feedback paths are crossed:
//! whatever comes out of the left line is fed into the right line, and vice
//! versa. An echo therefore alternates sides on every repeat.
//!
//! ## Signal Flow (one sample)
//!
//! ```text
//!  in_l ──►(+)──► [L line] ──► delayed_l ──┬──► mix ──► out_l
//!           ▲                              │
//!           └─── × feedback ◄── delayed_r ─┼─┐
//!                                          │ │
//!           ┌─── × feedback ◄──────────────┘ │
//!           ▼                                │
//!  in_r ──►(+)──► [R line] ──► delayed_r ────┴──► mix ──► out_r
//! ```
//!
//! Written out, with `w` the shared write cursor:
//!
//! ```text
//! out_l = in_l + mix * (delayed_l - in_l)
//! out_r = in_r + mix * (delayed_r - in_r)
//! L[w]  = in_l + delayed_r * feedback      ← right echo lands in the left line
//! R[w]  = in_r + delayed_l * feedback      ← left echo lands in the right line
//! ```
//!
//! A left impulse is first heard on the left after `d` samples, then on the
//! right at `2d` scaled by `feedback`, then the left again at `3d` scaled by
//! `feedback²`, and so on.
//!
//! ## The empty-slot guard
//!
//! If the read position rounds down to the write cursor itself (a delay of
//! zero), the slot about to be read is the one about to be overwritten. For
//! that sample the engine stands aside: the host's input samples are left
//! exactly as they were (no balance, no mix) and nothing is written to the
//! delay line.

use std::sync::Arc;

use nih_plug::nih_debug_assert;

use super::delay_line::DelayLine;
use super::parameter::{Parameter, ParameterId, ParameterKind};
use super::smoother::{ParameterSmoother, ParameterTarget};

/// Smoothing window applied to balance, feedback and mix.
pub const SMOOTHING_SECONDS: f32 = 1e-3;

/// Maximum delay when none is given explicitly.
pub const DEFAULT_MAX_DELAY_SECONDS: f32 = 5.0;

/// Longest delay line `configure` will allocate, in samples per channel.
/// About 87 s at 48 kHz.
pub const MAX_DELAY_SPAN: usize = 1 << 22;

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// Negative, NaN and infinite values all become 0.
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Thread-safe handle for changing the engine's parameters from outside the
/// audio thread. Cheap to clone; every clone talks to the same engine.
#[derive(Debug, Clone)]
pub struct EngineControls {
    balance: Arc<ParameterTarget>,
    delay_time: Arc<ParameterTarget>,
    feedback: Arc<ParameterTarget>,
    mix: Arc<ParameterTarget>,
}

impl EngineControls {
    /// Publish a new target. Clamped to the parameter's range.
    pub fn set(&self, id: ParameterId, value: f32) {
        self.target(id).set(value);
    }

    /// The last published (clamped) target.
    pub fn get(&self, id: ParameterId) -> f32 {
        self.target(id).get()
    }

    /// The descriptor for `id`, with the range cut to the ceiling currently
    /// in effect (delay time follows the configured maximum).
    pub fn descriptor(&self, id: ParameterId) -> Parameter {
        let target = self.target(id);
        let mut descriptor = *target.descriptor();
        if let ParameterKind::Continuous { max, .. } = &mut descriptor.kind {
            *max = target.ceiling();
        }
        descriptor
    }

    fn target(&self, id: ParameterId) -> &ParameterTarget {
        match id {
            ParameterId::Balance => &self.balance,
            ParameterId::DelayTime => &self.delay_time,
            ParameterId::Feedback => &self.feedback,
            ParameterId::Mix => &self.mix,
        }
    }
}

/// The stereo ping-pong delay.
///
/// Owns its delay storage and its smoothers outright. The only thing shared
/// with other threads is the set of parameter targets behind
/// [`EngineControls`].
#[derive(Debug)]
pub struct PingPongEngine {
    sample_rate: f32,
    max_delay_seconds: f32,
    delay_line: DelayLine,
    /// Next slot to be written, shared by both channels. Always `< len`
    /// once configured.
    write_pos: usize,
    configured: bool,

    balance: ParameterSmoother,
    delay_time: ParameterSmoother,
    feedback: ParameterSmoother,
    mix: ParameterSmoother,
}

impl Default for PingPongEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PingPongEngine {
    /// An unconfigured engine with every parameter at its default. Outputs
    /// silence until [`configure`](Self::configure) is called.
    pub fn new() -> Self {
        let smoother = |id: ParameterId| {
            let descriptor = id.descriptor(DEFAULT_MAX_DELAY_SECONDS);
            ParameterSmoother::new(Arc::new(ParameterTarget::new(descriptor)))
        };

        Self {
            sample_rate: 0.0,
            max_delay_seconds: DEFAULT_MAX_DELAY_SECONDS,
            delay_line: DelayLine::new(),
            write_pos: 0,
            configured: false,
            balance: smoother(ParameterId::Balance),
            delay_time: smoother(ParameterId::DelayTime),
            feedback: smoother(ParameterId::Feedback),
            mix: smoother(ParameterId::Mix),
        }
    }

    /// A handle for setting parameters from another thread.
    pub fn controls(&self) -> EngineControls {
        EngineControls {
            balance: self.balance.target_handle(),
            delay_time: self.delay_time.target_handle(),
            feedback: self.feedback.target_handle(),
            mix: self.mix.target_handle(),
        }
    }

    /// (Re)allocate the delay storage for a sample rate and maximum delay.
    ///
    /// The buffer holds `floor(max_delay_seconds * sample_rate) + 1`
    /// samples, starts silent, and the write cursor returns to 0. Smoothers
    /// snap to their latest targets. Invalid arguments are coerced (negative,
    /// NaN and infinite rates and delays to 0, zero channels to 1), never
    /// rejected. A span longer than [`MAX_DELAY_SPAN`] samples is cut down
    /// to it, and the maximum delay with it.
    ///
    /// Must not run concurrently with [`process_block`](Self::process_block);
    /// the `&mut self` receiver already enforces that within one thread.
    pub fn configure(&mut self, sample_rate: f32, max_delay_seconds: f32, num_channels: usize) {
        let sample_rate = finite_or_zero(sample_rate);
        let mut max_delay_seconds = finite_or_zero(max_delay_seconds);

        let mut span = (f64::from(max_delay_seconds) * f64::from(sample_rate)).floor();
        if span > MAX_DELAY_SPAN as f64 {
            span = MAX_DELAY_SPAN as f64;
            max_delay_seconds = (span / f64::from(sample_rate)) as f32;
        }
        let length = span as usize + 1;
        self.delay_line.configure(num_channels, length);
        self.write_pos = 0;
        self.sample_rate = sample_rate;
        self.max_delay_seconds = max_delay_seconds;

        self.delay_time.target_handle().set_ceiling(max_delay_seconds);
        for smoother in self.smoothers_mut() {
            smoother.reset(sample_rate, SMOOTHING_SECONDS);
        }

        self.configured = true;
    }

    /// Publish a new target for `id`. Clamped to the parameter's range.
    pub fn set_parameter(&self, id: ParameterId, value: f32) {
        self.smoother(id).set_target(value);
    }

    /// The last published target for `id`.
    pub fn target(&self, id: ParameterId) -> f32 {
        self.smoother(id).peek_target()
    }

    /// The value the audio path is using right now (mid-ramp, possibly).
    pub fn current_value(&self, id: ParameterId) -> f32 {
        self.smoother(id).current_value()
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Delay storage length in samples, 0 before the first `configure`.
    pub fn buffer_len(&self) -> usize {
        self.delay_line.len()
    }

    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_delay_seconds(&self) -> f32 {
        self.max_delay_seconds
    }

    /// Silence the delay storage and rewind the cursor without reallocating.
    /// Used when the host stops the transport.
    pub fn clear(&mut self) {
        self.delay_line.clear();
        self.write_pos = 0;
    }

    /// The current delay time converted to samples, clamped to the buffer.
    pub fn delay_samples(&self) -> f64 {
        let seconds = self
            .delay_time
            .peek_target()
            .clamp(0.0, self.max_delay_seconds);
        f64::from(seconds) * f64::from(self.sample_rate)
    }

    /// How many samples it takes for the echoes to fall below -60 dB.
    ///
    /// Each hop multiplies the echo by `feedback`, so after `N` hops the
    /// level is `feedback^N`. Solving `feedback^N = 0.001` gives
    /// `N = -3 / log10(feedback)` hops of `delay_samples` each. With no
    /// feedback there is exactly one echo, one delay away.
    pub fn tail_samples(&self) -> u32 {
        let delay = self.delay_samples() as f32;
        let feedback = self.feedback.peek_target();

        if feedback > 0.001 {
            let hops = -3.0 / feedback.log10();
            (hops.ceil() * delay) as u32
        } else {
            delay as u32
        }
    }

    /// Process a host buffer in place. Channels 0 and 1 are the stereo pair;
    /// any further channel is filled with silence. Fewer than two channels
    /// cannot ping-pong and are silenced as well.
    pub fn process_buffer(&mut self, channels: &mut [&mut [f32]]) {
        if channels.len() < 2 {
            for channel in channels.iter_mut() {
                channel.fill(0.0);
            }
            return;
        }

        let (pair, rest) = channels.split_at_mut(2);
        for channel in rest {
            channel.fill(0.0);
        }
        if let [left, right] = pair {
            self.process_block(left, right);
        }
    }

    /// Process one stereo block in place.
    ///
    /// The two slices should be the same length; any excess on the longer
    /// one is silenced. An unconfigured or mono-configured engine outputs
    /// silence.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        if !self.configured || self.delay_line.num_channels() < 2 {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        let len = self.delay_line.len();
        let len_f = len as f64;

        // Read once per block. Moving the read offset every sample would
        // bend the pitch of whatever is already in the buffer.
        let delay_samples = self.delay_samples();

        let frames = left.len().min(right.len());
        let (left, left_excess) = left.split_at_mut(frames);
        let (right, right_excess) = right.split_at_mut(frames);
        left_excess.fill(0.0);
        right_excess.fill(0.0);

        for (sample_l, sample_r) in left.iter_mut().zip(right.iter_mut()) {
            let balance = self.balance.next_value();
            let feedback = self.feedback.next_value();
            let mix = self.mix.next_value();

            let read_pos = (self.write_pos as f64 - delay_samples + len_f).rem_euclid(len_f);
            let read_slot = (read_pos.floor() as usize) % len;

            // Empty slot: the host samples pass through untouched.
            if read_slot != self.write_pos {
                let in_l = (1.0 - balance) * *sample_l;
                let in_r = balance * *sample_r;

                let delayed_l = self.delay_line.read_interpolated(LEFT, read_pos);
                let delayed_r = self.delay_line.read_interpolated(RIGHT, read_pos);

                *sample_l = in_l + mix * (delayed_l - in_l);
                *sample_r = in_r + mix * (delayed_r - in_r);

                // The ping-pong: each line is fed the *other* line's echo.
                self.delay_line
                    .write(LEFT, self.write_pos, in_l + delayed_r * feedback);
                self.delay_line
                    .write(RIGHT, self.write_pos, in_r + delayed_l * feedback);
            }

            self.write_pos += 1;
            if self.write_pos >= len {
                self.write_pos = 0;
            }
        }

        nih_debug_assert!(self.write_pos < len);
    }

    fn smoother(&self, id: ParameterId) -> &ParameterSmoother {
        match id {
            ParameterId::Balance => &self.balance,
            ParameterId::DelayTime => &self.delay_time,
            ParameterId::Feedback => &self.feedback,
            ParameterId::Mix => &self.mix,
        }
    }

    fn smoothers_mut(&mut self) -> [&mut ParameterSmoother; 4] {
        [
            &mut self.balance,
            &mut self.delay_time,
            &mut self.feedback,
            &mut self.mix,
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
