//! Soft circular point sprite.
//!
//! Every particle is drawn with the same small RGBA image: opaque white at
//! the center fading linearly to transparent at the rim, fully transparent
//! outside the disc.

use crate::error::EngineError;

/// Edge length of the default sprite, in pixels.
pub const DEFAULT_SPRITE_SIZE: u32 = 64;

/// A square RGBA8 image, row-major, unpremultiplied alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    size: u32,
    pixels: Vec<u8>,
}

impl SpriteImage {
    /// Generates the radial-gradient disc at `size × size`.
    ///
    /// Returns `EngineError::InvalidDimensions` if `size` is zero.
    pub fn circle(size: u32) -> Result<Self, EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let n = size as usize;
        let len = n
            .checked_mul(n)
            .and_then(|px| px.checked_mul(4))
            .ok_or(EngineError::InvalidDimensions)?;
        let radius = size as f64 / 2.0;

        let mut pixels = Vec::with_capacity(len);
        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 + 0.5 - radius;
                let dy = y as f64 + 0.5 - radius;
                let alpha = radial_alpha((dx * dx + dy * dy).sqrt() / radius);
                pixels.extend_from_slice(&[255, 255, 255, alpha]);
            }
        }
        Ok(Self { size, pixels })
    }

    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Raw RGBA8 bytes, `size * size * 4` long.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Alpha at `(x, y)`, or 0 outside the image.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.size || y >= self.size {
            return 0;
        }
        self.pixels[alpha_offset(self.size, x, y)]
    }

    /// Nearest-neighbour alpha lookup by normalized coordinates in [0, 1], as a point
    /// sampler would. Coordinates are clamped.
    pub fn sample_alpha(&self, u: f64, v: f64) -> f64 {
        let max = (self.size - 1) as f64;
        let x = (u.clamp(0.0, 1.0) * max).round() as u32;
        let y = (v.clamp(0.0, 1.0) * max).round() as u32;
        self.alpha_at(x, y) as f64 / 255.0
    }
}

/// Index of the alpha byte for `(x, y)`, computed in `usize`.
fn alpha_offset(size: u32, x: u32, y: u32) -> usize {
    (y as usize * size as usize + x as usize) * 4 + 3
}

impl Default for SpriteImage {
    fn default() -> Self {
        // DEFAULT_SPRITE_SIZE is non-zero, so generation cannot fail.
        Self::circle(DEFAULT_SPRITE_SIZE).unwrap_or(Self {
            size: 1,
            pixels: vec![255, 255, 255, 255],
        })
    }
}

/// Gradient stop 0 (center) is alpha 1, stop 1 (rim) is alpha 0.
fn radial_alpha(normalized_distance: f64) -> u8 {
    if normalized_distance >= 1.0 {
        return 0;
    }
    ((1.0 - normalized_distance) * 255.0).round() as u8
}
