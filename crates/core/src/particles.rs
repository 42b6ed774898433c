//! Struct-of-arrays particle buffer.
//!
//! Positions are stored as `x, y, z` triples with `z = 0` so the slice can be
//! handed to the GPU without repacking. All storage is allocated once in
//! [`ParticleStore::new`]; the integrator mutates it in place.

use crate::error::EngineError;
use crate::prng::Xorshift64;

/// Upper bound of each per-particle phase offset component.
pub const OFFSET_RANGE: f32 = 1000.0;

/// Half-extents of the wrap rectangle, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32) -> Result<Self, EngineError> {
        if !(x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "bounds must be positive and finite, got ({x}, {y})"
            )));
        }
        Ok(Self { x, y })
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (-self.x..=self.x).contains(&x) && (-self.y..=self.y).contains(&y)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self { x: 6.0, y: 3.5 }
    }
}

/// Positions, velocities, and phase offsets for `N` particles.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    positions: Vec<f32>,
    velocities: Vec<f32>,
    offsets: Vec<f32>,
    bounds: Bounds,
    needs_upload: bool,
}

impl ParticleStore {
    /// Scatters `count` particles uniformly over `bounds` at rest.
    ///
    /// Each particle draws `x`, `y`, then its three offsets from `rng`, in
    /// index order, so a seed fully determines the layout.
    pub fn new(count: usize, bounds: Bounds, rng: &mut Xorshift64) -> Result<Self, EngineError> {
        if count == 0 {
            return Err(EngineError::InvalidConfig(
                "particle count must be greater than zero".into(),
            ));
        }
        let triples = count
            .checked_mul(3)
            .ok_or_else(|| EngineError::InvalidConfig(format!("particle count {count} too large")))?;

        let mut positions = Vec::with_capacity(triples);
        let mut offsets = Vec::with_capacity(triples);
        for _ in 0..count {
            positions.push(rng.next_symmetric_f32(bounds.x));
            positions.push(rng.next_symmetric_f32(bounds.y));
            positions.push(0.0);
            for _ in 0..3 {
                offsets.push(rng.next_f32(OFFSET_RANGE));
            }
        }

        Ok(Self {
            positions,
            velocities: vec![0.0; count * 2],
            offsets,
            bounds,
            needs_upload: true,
        })
    }

    pub fn len(&self) -> usize {
        self.velocities.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Flat `[x0, y0, 0, x1, y1, 0, ...]`, ready for a vertex buffer.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn position(&self, i: usize) -> (f32, f32) {
        (self.positions[i * 3], self.positions[i * 3 + 1])
    }

    pub fn velocity(&self, i: usize) -> (f32, f32) {
        (self.velocities[i * 2], self.velocities[i * 2 + 1])
    }

    pub fn offset(&self, i: usize) -> (f32, f32, f32) {
        (
            self.offsets[i * 3],
            self.offsets[i * 3 + 1],
            self.offsets[i * 3 + 2],
        )
    }

    /// Moves particle `i`, keeping `z = 0`. Flags the buffer for upload.
    pub fn set_position(&mut self, i: usize, x: f32, y: f32) {
        self.positions[i * 3] = x;
        self.positions[i * 3 + 1] = y;
        self.needs_upload = true;
    }

    /// Mutable views for the integrator: positions, velocities, offsets.
    pub(crate) fn split_mut(&mut self) -> (&mut [f32], &mut [f32], &[f32]) {
        (&mut self.positions, &mut self.velocities, &self.offsets)
    }

    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    pub fn mark_needs_upload(&mut self) {
        self.needs_upload = true;
    }

    /// Returns the upload flag and clears it.
    pub fn take_needs_upload(&mut self) -> bool {
        std::mem::take(&mut self.needs_upload)
    }
}
