//! # Parameter Smoothing
//!
//! Knob movements arrive as instant jumps. Applying a jump to the signal
//! in one sample produces a discontinuity that you hear as a click, so every
//! control is ramped from its old value to its new one over a short window
//! (1 ms in this plugin).
//!
//! ## Two halves
//!
//! ```text
//!   control / UI thread                 audio thread
//!   ───────────────────                 ────────────
//!   ParameterTarget::set(v) ──atomic──► ParameterSmoother::next_value()
//!   (clamps, stores)                    (observes target, ramps current)
//! ```
//!
//! [`ParameterTarget`] is the only state the two threads share. It is a
//! single atomic float, so a write is either seen whole or not at all. A
//! target written halfway through a block is picked up on the next sample,
//! which is an inaudible timing skew. Nothing here locks or allocates.
//!
//! ## Linear ramps
//!
//! When the smoother sees a new target it computes a fixed per-sample step:
//!
//! ```text
//! step = (target - current) / ramp_len      ramp_len = ceil(seconds * sample_rate)
//! ```
//!
//! and adds it once per call until `ramp_len` samples have passed. The last
//! step assigns the target directly so float rounding can't leave the value
//! a hair short.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF32;

use super::parameter::Parameter;

/// The control-side half of a parameter: an atomic target value plus the
/// range it is clamped to.
///
/// Shared through an `Arc` between exactly one writer (the control thread)
/// and one reader (the smoother on the audio thread).
#[derive(Debug)]
pub struct ParameterTarget {
    descriptor: Parameter,
    value: AtomicF32,
    /// Upper bound in effect. Starts at the descriptor's maximum; delay time
    /// moves it when the buffer is reconfigured.
    ceiling: AtomicF32,
}

impl ParameterTarget {
    pub fn new(descriptor: Parameter) -> Self {
        let ceiling = descriptor.max();
        Self {
            value: AtomicF32::new(descriptor.kind.constrain(descriptor.default)),
            ceiling: AtomicF32::new(ceiling),
            descriptor,
        }
    }

    pub fn descriptor(&self) -> &Parameter {
        &self.descriptor
    }

    /// Clamp `value` into range and publish it.
    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(self.constrain(value), Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling.load(Ordering::Acquire)
    }

    /// Move the upper bound and re-clamp the stored target against it.
    pub fn set_ceiling(&self, ceiling: f32) {
        let ceiling = if ceiling.is_nan() {
            self.descriptor.min()
        } else {
            ceiling
        };
        self.ceiling.store(ceiling, Ordering::Release);
        self.set(self.get());
    }

    fn constrain(&self, value: f32) -> f32 {
        self.descriptor
            .kind
            .constrain_below(value, self.ceiling())
    }
}

/// The audio-side half of a parameter: turns the shared target into one
/// ramped value per sample.
#[derive(Debug)]
pub struct ParameterSmoother {
    target: Arc<ParameterTarget>,
    current: f32,
    /// Where the ramp in flight started and where it is heading. A new
    /// target is detected by comparing against `ramp_end`.
    ramp_start: f32,
    ramp_end: f32,
    step: f32,
    /// Samples left in the ramp in flight. Zero means settled.
    remaining: usize,
    ramp_len: usize,
}

impl ParameterSmoother {
    /// Wrap a shared target. Starts settled at the target's current value
    /// with smoothing disabled until [`reset`](Self::reset) is called.
    pub fn new(target: Arc<ParameterTarget>) -> Self {
        let value = target.get();
        Self {
            target,
            current: value,
            ramp_start: value,
            ramp_end: value,
            step: 0.0,
            remaining: 0,
            ramp_len: 0,
        }
    }

    /// A new handle on the shared target, for the control thread.
    pub fn target_handle(&self) -> Arc<ParameterTarget> {
        Arc::clone(&self.target)
    }

    /// Re-derive the ramp length and snap to the latest target.
    ///
    /// Call it from configuration, never from inside a block.
    pub fn reset(&mut self, sample_rate: f32, smoothing_seconds: f32) {
        let samples = (f64::from(sample_rate) * f64::from(smoothing_seconds)).ceil();
        // Negative and NaN products saturate to 0 (no smoothing).
        self.ramp_len = samples as usize;
        self.snap(self.target.get());
    }

    /// Constrain `value`, publish it as the target and jump straight to it.
    pub fn set_current_and_target(&mut self, value: f32) {
        self.target.set(value);
        self.snap(self.target.get());
    }

    /// Publish a new target. The current value is untouched; the ramp starts
    /// on the next [`next_value`](Self::next_value).
    #[inline]
    pub fn set_target(&self, value: f32) {
        self.target.set(value);
    }

    /// The target as last published, without advancing.
    #[inline]
    pub fn peek_target(&self) -> f32 {
        self.target.get()
    }

    #[inline]
    pub fn current_value(&self) -> f32 {
        self.current
    }

    pub fn is_smoothing(&self) -> bool {
        self.remaining > 0
    }

    pub fn ramp_len(&self) -> usize {
        self.ramp_len
    }

    /// Advance one sample toward the target and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        let target = self.target.get();
        if target != self.ramp_end {
            self.begin_ramp(target);
        }

        if self.remaining == 0 {
            return self.current;
        }

        self.remaining -= 1;
        self.current = if self.remaining == 0 {
            self.ramp_end
        } else {
            let (lo, hi) = if self.ramp_start <= self.ramp_end {
                (self.ramp_start, self.ramp_end)
            } else {
                (self.ramp_end, self.ramp_start)
            };
            (self.current + self.step).clamp(lo, hi)
        };
        self.current
    }

    fn begin_ramp(&mut self, target: f32) {
        self.ramp_start = self.current;
        self.ramp_end = target;
        if self.ramp_len == 0 {
            self.current = target;
            self.remaining = 0;
        } else {
            self.remaining = self.ramp_len;
            self.step = (target - self.current) / self.ramp_len as f32;
        }
    }

    fn snap(&mut self, value: f32) {
        self.current = value;
        self.ramp_start = value;
        self.ramp_end = value;
        self.step = 0.0;
        self.remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::parameter::{ParameterId, ParameterKind};

    fn unit_target(default: f32) -> Arc<ParameterTarget> {
        Arc::new(ParameterTarget::new(Parameter {
            name: "Test",
            unit: "",
            kind: ParameterKind::Continuous { min: 0.0, max: 1.0 },
            default,
        }))
    }

    /// `set_target` publishes a value but must not move the current value.
    #[test]
    fn test_set_target_leaves_current() {
        let mut smoother = ParameterSmoother::new(unit_target(0.0));
        smoother.reset(100.0, 0.5);

        smoother.set_target(1.0);
        assert_eq!(smoother.peek_target(), 1.0);
        assert_eq!(smoother.current_value(), 0.0);
        assert!(!smoother.is_smoothing());
    }

    /// 0.5 s at 100 Hz is a 50-sample ramp. Each step covers 1/50 of the
    /// distance and the 50th lands exactly on the target.
    #[test]
    fn test_linear_ramp_reaches_target() {
        let mut smoother = ParameterSmoother::new(unit_target(0.0));
        smoother.reset(100.0, 0.5);
        assert_eq!(smoother.ramp_len(), 50);

        smoother.set_target(1.0);
        let first = smoother.next_value();
        assert!(
            (first - 0.02).abs() < 1e-6,
            "First step should be 1/50, got {first}"
        );

        let mut last = first;
        for _ in 1..49 {
            let value = smoother.next_value();
            assert!(value > last, "Ramp should rise monotonically");
            assert!(value < 1.0, "Ramp should not arrive early");
            last = value;
        }

        assert_eq!(smoother.next_value(), 1.0);
        assert!(!smoother.is_smoothing());
        assert_eq!(smoother.next_value(), 1.0, "Settled value should hold");
    }

    /// The ramp length is rounded up: 0.5 s at 101 Hz is 50.5 → 51 samples.
    #[test]
    fn test_ramp_length_rounds_up() {
        let mut smoother = ParameterSmoother::new(unit_target(0.0));
        smoother.reset(101.0, 0.5);
        assert_eq!(smoother.ramp_len(), 51);
    }

    /// A target change mid-ramp restarts the ramp from wherever the value
    /// currently is, so there is never a jump.
    #[test]
    fn test_retarget_mid_ramp() {
        let mut smoother = ParameterSmoother::new(unit_target(0.0));
        smoother.reset(100.0, 0.5);

        smoother.set_target(1.0);
        for _ in 0..25 {
            smoother.next_value();
        }
        let midway = smoother.current_value();
        assert!((midway - 0.5).abs() < 1e-4, "Expected ~0.5, got {midway}");

        smoother.set_target(0.0);
        let next = smoother.next_value();
        assert!(
            next < midway && (midway - next) < 0.011,
            "Reversal should step down by ~0.01, went {midway} -> {next}"
        );
    }

    /// Out-of-range requests are clamped before the smoother ever sees them.
    #[test]
    fn test_target_is_clamped() {
        let target = Arc::new(ParameterTarget::new(
            ParameterId::Feedback.descriptor(5.0),
        ));
        let mut smoother = ParameterSmoother::new(Arc::clone(&target));
        smoother.reset(100.0, 0.5);

        target.set(5.0);
        assert_eq!(smoother.peek_target(), 0.9);
        for _ in 0..200 {
            let value = smoother.next_value();
            assert!(
                (0.0..=0.9).contains(&value),
                "Value {value} left the declared range"
            );
        }
        assert_eq!(smoother.current_value(), 0.9);
    }

    /// With no smoothing time the value follows the target immediately.
    #[test]
    fn test_zero_smoothing_is_instant() {
        let mut smoother = ParameterSmoother::new(unit_target(0.0));
        smoother.reset(44100.0, 0.0);

        smoother.set_target(0.75);
        assert_eq!(smoother.next_value(), 0.75);
    }

    /// `reset` snaps to the latest target.
    #[test]
    fn test_reset_snaps_to_target() {
        let mut smoother = ParameterSmoother::new(unit_target(0.2));
        smoother.reset(100.0, 0.5);
        smoother.set_target(0.8);
        smoother.next_value();
        assert!(smoother.is_smoothing());

        smoother.reset(100.0, 0.5);
        assert_eq!(smoother.current_value(), 0.8);
        assert!(!smoother.is_smoothing());
    }

    #[test]
    fn test_set_current_and_target() {
        let mut smoother = ParameterSmoother::new(unit_target(0.0));
        smoother.reset(100.0, 0.5);
        smoother.set_current_and_target(3.0);
        assert_eq!(smoother.current_value(), 1.0);
        assert_eq!(smoother.next_value(), 1.0);
    }

    /// Lowering the ceiling pulls an existing target down with it.
    #[test]
    fn test_ceiling_reclamps_target() {
        let target = ParameterTarget::new(ParameterId::DelayTime.descriptor(5.0));
        assert_eq!(target.ceiling(), 5.0);
        target.set(4.0);
        target.set_ceiling(2.0);
        assert_eq!(target.ceiling(), 2.0);
        assert_eq!(target.get(), 2.0);
        // The descriptor keeps the declared range; only the ceiling moves.
        assert_eq!(target.descriptor().max(), 5.0);

        target.set_ceiling(10.0);
        target.set(8.0);
        assert_eq!(target.get(), 8.0);
    }

    /// A switch built on a toggle target only ever yields 0 or 1.
    #[test]
    fn test_toggle_target() {
        let target = ParameterTarget::new(Parameter {
            name: "Bypass",
            unit: "",
            kind: ParameterKind::Toggle,
            default: 0.0,
        });
        assert_eq!(target.ceiling(), 1.0);

        target.set(0.7);
        assert_eq!(target.get(), 1.0);
        target.set(-2.0);
        assert_eq!(target.get(), 0.0);
    }

    /// A write from another thread is visible to the smoother afterwards.
    #[test]
    fn test_cross_thread_target() {
        let target = unit_target(0.0);
        let mut smoother = ParameterSmoother::new(Arc::clone(&target));
        smoother.reset(100.0, 0.0);

        let writer = std::thread::spawn({
            let target = Arc::clone(&target);
            move || target.set(0.6)
        });
        writer.join().expect("writer thread panicked");

        assert_eq!(smoother.next_value(), 0.6);
    }
}
