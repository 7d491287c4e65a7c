//! # Plugin Parameters
//!
//! The four knobs the host sees. Each one has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to
//!   save and recall presets. Once published, never change these IDs
//!   or existing presets will break.
//! - A **human-readable name**, a **range** and a **default**, all read
//!   back from the engine's own targets through
//!   [`EngineControls::descriptor`] so the two can't drift apart.
//!
//! ## No smoothing here
//!
//! nih-plug can smooth parameters itself, but the engine already ramps
//! balance, feedback and mix over 1 ms and deliberately does *not* ramp delay
//! time. These params are therefore plain values. Every change (knob,
//! automation, preset load) is forwarded through a callback into the
//! engine's atomic targets, from whichever thread made it.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::dsp::parameter::ParameterId;
use crate::dsp::ping_pong::EngineControls;

/// All user-facing parameters of the Ping-Pong Delay plugin.
#[derive(Params)]
pub struct PluginParams {
    /// **Balance** — which input feeds the delay.
    ///
    /// 0 takes only the left input, 1 only the right, 0.5 both at half
    /// level. Because the echoes cross sides, feeding one side is enough to
    /// hear the bounce.
    #[id = "balance"]
    pub balance: FloatParam,

    /// **Delay Time** — seconds between repeats. 0 to 5 s, default 0.1 s.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback** — how much of each echo crosses to the other side.
    /// Capped at 0.9 so the bounce always dies away.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Mix** — dry (0) to fully wet (1).
    #[id = "mix"]
    pub mix: FloatParam,
}

impl PluginParams {
    /// Build the parameters, wiring each one to the engine's targets.
    pub fn new(controls: &EngineControls) -> Self {
        Self {
            balance: float_param(ParameterId::Balance, controls),
            delay_time: float_param(ParameterId::DelayTime, controls).with_step_size(0.001),
            feedback: float_param(ParameterId::Feedback, controls),
            mix: float_param(ParameterId::Mix, controls),
        }
    }

    /// Push every current value into the engine.
    ///
    /// Callbacks only fire on *changes*, so after a preset restore the
    /// engine may still hold defaults. Called before each reconfiguration.
    pub fn sync_to(&self, controls: &EngineControls) {
        controls.set(ParameterId::Balance, self.balance.value());
        controls.set(ParameterId::DelayTime, self.delay_time.value());
        controls.set(ParameterId::Feedback, self.feedback.value());
        controls.set(ParameterId::Mix, self.mix.value());
    }
}

fn float_param(id: ParameterId, controls: &EngineControls) -> FloatParam {
    let descriptor = controls.descriptor(id);
    let forward = {
        let controls = controls.clone();
        Arc::new(move |value: f32| controls.set(id, value))
    };

    let unit = match id {
        ParameterId::DelayTime => " s",
        _ => "",
    };

    FloatParam::new(
        descriptor.name,
        descriptor.default,
        FloatRange::Linear {
            min: descriptor.min(),
            max: descriptor.max(),
        },
    )
    .with_unit(unit)
    // Two decimals on every readout.
    .with_value_to_string(formatters::v2s_f32_rounded(2))
    .with_callback(forward)
}
