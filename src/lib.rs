//! # Ping-Pong Delay — An AU/VST3/CLAP Stereo Delay Plugin
//!
//! A stereo delay whose echoes bounce between the left and right channels,
//! built with [nih-plug](https://github.com/robbert-vdh/nih-plug). Outputs
//! Audio Unit (AUv2), VST3 and CLAP formats from a single codebase.
//!
//! ## Signal Flow
//!
//! ```text
//!  Input L ── ×(1-balance) ──┬──────────────────────── dry ──┐
//!                            └─►(+)─► [L line] ─┬──── wet ──►(mix)──► Output L
//!                                ▲              │
//!                                │         × feedback
//!                           × feedback          │
//!                                │              ▼
//!                            ┌─►(+)─► [R line] ─┴──── wet ──►(mix)──► Output R
//!  Input R ── ×balance ──────┴──────────────────────── dry ──┘
//! ```
//!
//! ## Layout
//!
//! - [`dsp`]: the host-independent engine. Everything with real DSP
//!   content lives here and can be driven without a plugin host.
//! - `params`: the host-facing knobs, forwarded into the engine.
//! - This file: the thin nih-plug wrapper that owns the engine and walks it
//!   over each audio block.

pub mod dsp;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;
use params::PluginParams;

pub use dsp::parameter::{Parameter, ParameterId, ParameterKind};
pub use dsp::ping_pong::{EngineControls, PingPongEngine};

/// Largest delay the plugin offers, and therefore the size of its buffers.
const MAX_DELAY_SECONDS: f32 = dsp::ping_pong::DEFAULT_MAX_DELAY_SECONDS;

/// The plugin struct.
///
/// ## Why separate state from parameters?
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and can
/// be touched from any thread. The engine (delay storage, smoothers) is
/// owned by the audio thread and only accessed in `process()`. The two meet
/// only in the engine's atomic parameter targets, so nothing locks.
struct PingPongDelay {
    params: Arc<PluginParams>,
    engine: PingPongEngine,
}

impl Default for PingPongDelay {
    fn default() -> Self {
        // The engine starts unconfigured; buffers are allocated in
        // initialize() once the sample rate is known.
        let engine = PingPongEngine::new();
        let params = Arc::new(PluginParams::new(&engine.controls()));

        Self { params, engine }
    }
}

impl Plugin for PingPongDelay {
    const NAME: &'static str = "Ping-Pong Delay";
    const VENDOR: &'static str = "Ping-Pong Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo only: a ping-pong needs two sides to bounce between.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    // Audio-only effect.
    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameter changes are split into sub-blocks at the sample they occur,
    // so a block-stable delay time is stable between automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is first loaded, or when the audio
    /// configuration changes. The host guarantees `process()` is not
    /// running, which is exactly what `configure` needs.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);

        // Restored presets don't fire callbacks; push the real values so
        // configure() snaps the smoothers to them instead of the defaults.
        self.params.sync_to(&self.engine.controls());
        self.engine
            .configure(buffer_config.sample_rate, MAX_DELAY_SECONDS, num_channels);

        nih_log!(
            "ping-pong engine configured: {} Hz, {} channel(s), {} samples of delay storage",
            self.engine.sample_rate(),
            num_channels,
            self.engine.buffer_len()
        );

        true
    }

    /// Called when playback stops or the plugin is bypassed. Drops any
    /// echoes still circulating so they don't burst out on the next play.
    fn reset(&mut self) {
        self.engine.clear();
    }

    /// Walk the engine over the block, then report how long the echoes
    /// will keep ringing so the host keeps calling us after the input stops.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.engine.process_buffer(buffer.as_slice());

        ProcessStatus::Tail(self.engine.tail_samples())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for PingPongDelay {
    const CLAP_ID: &'static str = "com.ping-pong-audio.ping-pong-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A stereo delay whose echoes bounce between left and right");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for PingPongDelay {
    // 16 ASCII bytes, unique across all VST3 plugins.
    const VST3_CLASS_ID: [u8; 16] = *b"PingPongDelay001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as AUv2 for Logic Pro.

nih_export_clap!(PingPongDelay);
nih_export_vst3!(PingPongDelay);

clap_wrapper::export_auv2!();

#[cfg(test)]
mod tests {
    use super::*;

    /// The engine wrapped by the plugin is configured the way
    /// `initialize()` does it: stereo, 5 s of storage.
    #[test]
    fn test_plugin_buffer_size() {
        let mut plugin = PingPongDelay::default();
        plugin.params.sync_to(&plugin.engine.controls());
        plugin.engine.configure(48_000.0, MAX_DELAY_SECONDS, 2);

        assert_eq!(plugin.engine.buffer_len(), 240_001);
        assert_eq!(plugin.engine.target(ParameterId::DelayTime), 0.1);
    }
}
