//! Seedable PRNG for particle placement.
//!
//! Initial positions and per-particle phase offsets come from this
//! generator, so a given seed always lays out the same particle field.
//! Pure integer core; the same seed yields the same sequence on every target,
//! including wasm32.

/// Xorshift64 PRNG with the (13, 7, 17) shift triple.
///
/// A zero seed is a fixed point of xorshift and is replaced by a non-zero
/// constant.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const ZERO_SEED_REPLACEMENT: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 {
                Self::ZERO_SEED_REPLACEMENT
            } else {
                seed
            },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform value in [-extent, extent], narrowed to f32 for GPU buffers.
    ///
    /// The narrowing can round onto `extent` itself, never past it.
    pub fn next_symmetric_f32(&mut self, extent: f32) -> f32 {
        let v = (self.next_f64() * 2.0 - 1.0) as f32 * extent;
        v.clamp(-extent, extent)
    }

    /// Uniform f32 in [0, max], for phase offsets.
    pub fn next_f32(&mut self, max: f32) -> f32 {
        ((self.next_f64() as f32) * max).min(max)
    }
}
