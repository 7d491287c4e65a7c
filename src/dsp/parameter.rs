//! # Parameter Model
//!
//! The engine knows four controls. Each one is described by a [`Parameter`]:
//! a display name, a unit, a default, and a [`ParameterKind`] that says what
//! shape of value it accepts and how out-of-range requests are folded back
//! into range.
//!
//! The kind is a closed set. Continuous controls (sliders) clamp, toggles
//! snap to 0 or 1, and choices round to the nearest valid index. Smoothing is
//! not part of the kind: any parameter can be wrapped in a
//! [`ParameterSmoother`](super::smoother::ParameterSmoother).

/// Identifies one of the engine's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    /// Input crossfade: 0 = left input only, 1 = right input only.
    Balance,
    /// Echo distance in seconds.
    DelayTime,
    /// Fraction of each echo sent to the opposite channel.
    Feedback,
    /// Dry/wet blend.
    Mix,
}

/// Hard ceiling on feedback. At 1.0 the echoes would never decay.
pub const MAX_FEEDBACK: f32 = 0.9;

impl ParameterId {
    pub const ALL: [ParameterId; 4] = [
        ParameterId::Balance,
        ParameterId::DelayTime,
        ParameterId::Feedback,
        ParameterId::Mix,
    ];

    /// The descriptor for this control. `max_delay_seconds` sets the upper
    /// end of the delay-time range; the other ranges are fixed.
    pub fn descriptor(self, max_delay_seconds: f32) -> Parameter {
        match self {
            ParameterId::Balance => Parameter {
                name: "Balance input",
                unit: "",
                kind: ParameterKind::Continuous { min: 0.0, max: 1.0 },
                default: 0.25,
            },
            ParameterId::DelayTime => {
                let max = if max_delay_seconds > 0.0 {
                    max_delay_seconds
                } else {
                    0.0
                };
                Parameter {
                    name: "Delay time",
                    unit: "s",
                    kind: ParameterKind::Continuous { min: 0.0, max },
                    default: 0.1_f32.min(max),
                }
            }
            ParameterId::Feedback => Parameter {
                name: "Feedback",
                unit: "",
                kind: ParameterKind::Continuous {
                    min: 0.0,
                    max: MAX_FEEDBACK,
                },
                default: 0.7,
            },
            ParameterId::Mix => Parameter {
                name: "Mix",
                unit: "",
                kind: ParameterKind::Continuous { min: 0.0, max: 1.0 },
                default: 0.1,
            },
        }
    }
}

/// The shape of values a parameter accepts.
///
/// The four engine controls are all `Continuous`. `Toggle` and `Choice` are
/// there for code that builds its own [`ParameterTarget`]s on top of this
/// crate (switches, mode selectors) and wants the same clamping rules.
///
/// [`ParameterTarget`]: super::smoother::ParameterTarget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterKind {
    /// Any value in `[min, max]`.
    Continuous { min: f32, max: f32 },
    /// 0.0 (off) or 1.0 (on).
    Toggle,
    /// An index in `0..count`, stored as a float.
    Choice { count: usize },
}

impl ParameterKind {
    pub fn min(&self) -> f32 {
        match *self {
            ParameterKind::Continuous { min, .. } => min,
            ParameterKind::Toggle | ParameterKind::Choice { .. } => 0.0,
        }
    }

    pub fn max(&self) -> f32 {
        match *self {
            ParameterKind::Continuous { max, .. } => max,
            ParameterKind::Toggle => 1.0,
            ParameterKind::Choice { count } => count.saturating_sub(1) as f32,
        }
    }

    /// Fold an arbitrary request into this kind's domain. NaN maps to the
    /// minimum so a bad host value can never poison the audio path.
    pub fn constrain(&self, value: f32) -> f32 {
        self.constrain_below(value, self.max())
    }

    /// Like [`constrain`](Self::constrain), with the upper bound lowered (or
    /// raised) to `max`. Used for delay time, whose ceiling follows the
    /// configured buffer.
    pub fn constrain_below(&self, value: f32, max: f32) -> f32 {
        let min = self.min();
        let max = if max >= min { max } else { min };
        if value.is_nan() {
            return min;
        }
        match *self {
            ParameterKind::Continuous { .. } => value.clamp(min, max),
            ParameterKind::Toggle => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ParameterKind::Choice { .. } => value.round().clamp(min, max),
        }
    }
}

/// Static description of a control: everything a UI or host binding needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: ParameterKind,
    pub default: f32,
}

impl Parameter {
    pub fn min(&self) -> f32 {
        self.kind.min()
    }

    pub fn max(&self) -> f32 {
        self.kind.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_clamps_to_range() {
        let kind = ParameterKind::Continuous { min: 0.0, max: 0.9 };
        assert_eq!(kind.constrain(5.0), 0.9);
        assert_eq!(kind.constrain(-1.0), 0.0);
        assert_eq!(kind.constrain(0.4), 0.4);
    }

    /// NaN must never reach the smoother, or every sample after it is NaN.
    #[test]
    fn test_nan_maps_to_minimum() {
        let kind = ParameterKind::Continuous { min: 0.25, max: 1.0 };
        assert_eq!(kind.constrain(f32::NAN), 0.25);
        assert_eq!(ParameterKind::Toggle.constrain(f32::NAN), 0.0);
    }

    #[test]
    fn test_toggle_snaps() {
        assert_eq!(ParameterKind::Toggle.constrain(0.49), 0.0);
        assert_eq!(ParameterKind::Toggle.constrain(0.5), 1.0);
        assert_eq!(ParameterKind::Toggle.constrain(7.0), 1.0);
    }

    #[test]
    fn test_choice_rounds_to_valid_index() {
        let kind = ParameterKind::Choice { count: 3 };
        assert_eq!(kind.max(), 2.0);
        assert_eq!(kind.constrain(1.4), 1.0);
        assert_eq!(kind.constrain(1.6), 2.0);
        assert_eq!(kind.constrain(10.0), 2.0);
        assert_eq!(kind.constrain(-3.0), 0.0);
    }

    #[test]
    fn test_lowered_ceiling() {
        let kind = ParameterKind::Continuous { min: 0.0, max: 5.0 };
        assert_eq!(kind.constrain_below(3.0, 2.0), 2.0);
        // A ceiling below the minimum collapses the range to the minimum.
        assert_eq!(kind.constrain_below(3.0, -1.0), 0.0);
    }

    /// Only continuous kinds back the engine's own controls.
    #[test]
    fn test_engine_controls_are_continuous() {
        for id in ParameterId::ALL {
            assert!(
                matches!(id.descriptor(5.0).kind, ParameterKind::Continuous { .. }),
                "{id:?} is not continuous"
            );
        }
    }

    /// Declared ranges and defaults of the four controls.
    #[test]
    fn test_descriptors() {
        let feedback = ParameterId::Feedback.descriptor(5.0);
        assert_eq!(feedback.min(), 0.0);
        assert_eq!(feedback.max(), 0.9);
        assert_eq!(feedback.default, 0.7);

        let delay = ParameterId::DelayTime.descriptor(5.0);
        assert_eq!(delay.max(), 5.0);
        assert_eq!(delay.unit, "s");

        // Default delay never exceeds a short configured maximum.
        let short = ParameterId::DelayTime.descriptor(0.05);
        assert_eq!(short.default, 0.05);

        for id in ParameterId::ALL {
            let p = id.descriptor(5.0);
            assert!(
                p.min() <= p.default && p.default <= p.max(),
                "{id:?} default {} outside [{}, {}]",
                p.default,
                p.min(),
                p.max()
            );
        }
    }
}
