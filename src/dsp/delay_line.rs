//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. This one holds several channels side by side, all
//! the same length, so the ping-pong engine can read one channel's history
//! and write into another's.
//!
//! ## Who owns the write head?
//!
//! A single-channel delay line usually tracks its own write position. Here
//! both channels must advance in lockstep and the engine needs to compare
//! the read position against the write position (see
//! [`PingPongEngine`](super::ping_pong::PingPongEngine)), so the cursor lives
//! in the engine and every call takes an explicit position:
//!
//! ```text
//!   write(channel, position, value)     stores at position % len
//!   read_interpolated(channel, pos)     reads between floor(pos) and the
//!                                       next slot, wrapping at the end
//! ```
//!
//! Every index is taken modulo the buffer length, so no input (huge, negative
//! or NaN positions included) can reach outside the storage.
//!
//! ## Linear Interpolation
//!
//! Positions are real numbers. The read blends the slot at `floor(pos)` with
//! the slot after it:
//!
//! ```text
//! result = a + frac * (b - a)
//! ```
//!
//! For position 441.3, `a` is slot 441 and `b` is slot 442, weighted 0.7 and
//! 0.3. When the position is a whole number the fraction is exactly zero and
//! the stored sample comes back bit-for-bit.

/// Multi-channel ring buffer storage.
///
/// Allocated by [`configure`](Self::configure) and never resized afterwards,
/// so reads and writes on the audio thread never touch the allocator.
#[derive(Debug, Default)]
pub struct DelayLine {
    /// One contiguous buffer per channel, all `len` samples long.
    channels: Vec<Vec<f32>>,
    len: usize,
}

impl DelayLine {
    /// An empty delay line with no channels. Reads return silence and
    /// writes are ignored until [`configure`](Self::configure) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `num_channels` zero-filled buffers of `length` samples.
    ///
    /// Zero channels or zero length are coerced to 1; a ring of length 0
    /// would make every modulo a division by zero.
    pub fn configure(&mut self, num_channels: usize, length: usize) {
        let num_channels = num_channels.max(1);
        let length = length.max(1);

        self.channels = vec![vec![0.0; length]; num_channels];
        self.len = length;
    }

    /// Buffer length in samples (0 before the first `configure`).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Store `value` at `position % len` on `channel`. Unknown channels are
    /// ignored.
    #[inline]
    pub fn write(&mut self, channel: usize, position: usize, value: f32) {
        let len = self.len;
        if let Some(buffer) = self.channels.get_mut(channel) {
            buffer[position % len] = value;
        }
    }

    /// Read `channel` at a fractional `position`, interpolating linearly
    /// toward the next slot. Unknown channels read as silence.
    ///
    /// # How the index math works
    ///
    /// ```text
    /// index_a = floor(position) % len
    /// index_b = (index_a + 1) % len
    /// ```
    ///
    /// `index_b` wraps so that a position in the last slot blends with
    /// slot 0, which is the next-older sample on the ring.
    #[inline]
    pub fn read_interpolated(&self, channel: usize, position: f64) -> f32 {
        let Some(buffer) = self.channels.get(channel) else {
            return 0.0;
        };

        let position = if position.is_finite() { position } else { 0.0 };
        let base = position.floor();
        // `as usize` saturates: negatives become 0, overflow becomes
        // usize::MAX. Either way the modulo keeps us in bounds.
        let index_a = (base as usize) % self.len;
        let index_b = (index_a + 1) % self.len;
        let frac = (position - base) as f32;

        let sample_a = buffer[index_a];
        if frac == 0.0 {
            return sample_a;
        }
        let sample_b = buffer[index_b];

        sample_a + frac * (sample_b - sample_a)
    }

    /// Zero every channel. The length and channel count are kept.
    pub fn clear(&mut self) {
        for buffer in &mut self.channels {
            buffer.fill(0.0);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
