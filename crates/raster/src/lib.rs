#![deny(unsafe_code)]
//! CPU preview of a backdrop frame.
//!
//! Splats every particle as the point sprite into a float color buffer,
//! using the same camera, size attenuation, alpha test, opacity, and blend
//! mode as the GL renderer. Hosts without a GPU (the CLI, tests) use this to
//! inspect what a frame looks like.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use backdrop_core::error::EngineError;
use backdrop_core::scene::{BlendMode, SceneSetup};
use backdrop_core::sprite::SpriteImage;
use backdrop_core::{Backdrop, Srgb};
use glam::Vec3;

/// Linear-accumulation RGB buffer, row-major, three floats per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Raster {
    /// A buffer filled with `background`.
    pub fn new(width: u32, height: u32, background: Srgb) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or(EngineError::InvalidDimensions)?;
        let bg = background.to_array_f32();
        let data = bg.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// RGB at `(x, y)`, unclamped.
    pub fn get(&self, x: u32, y: u32) -> [f32; 3] {
        let i = pixel_offset(self.width, x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    fn blend(&mut self, x: u32, y: u32, color: [f32; 3], alpha: f32, mode: BlendMode) {
        let i = pixel_offset(self.width, x, y);
        for (c, dst) in color.iter().zip(&mut self.data[i..i + 3]) {
            *dst = match mode {
                BlendMode::Additive => *dst + c * alpha,
                BlendMode::Normal => c * alpha + *dst * (1.0 - alpha),
            };
        }
    }
}

/// Start of the RGB triple for `(x, y)`, computed in `usize`.
fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 3
}

/// Draws `positions` (flat `x, y, z` triples) into `raster` with the scene's
/// camera and material.
pub fn splat(raster: &mut Raster, positions: &[f32], scene: &SceneSetup, sprite: &SpriteImage) {
    let material = &scene.material;
    let color = material.color.to_array_f32();
    let (w, h) = (raster.width, raster.height);

    for p in positions.chunks_exact(3) {
        let Some((sx, sy, depth)) = scene
            .camera
            .world_to_screen(Vec3::new(p[0], p[1], p[2]), w, h)
        else {
            continue;
        };
        let size = material.point_size_px(depth, h as f32);
        if size <= 0.0 {
            continue;
        }
        let left = sx - size / 2.0;
        let top = sy - size / 2.0;

        let x0 = left.floor().max(0.0) as u32;
        let y0 = top.floor().max(0.0) as u32;
        let x1 = ((left + size).ceil().max(0.0) as u32).min(w);
        let y1 = ((top + size).ceil().max(0.0) as u32).min(h);

        for py in y0..y1 {
            for px in x0..x1 {
                let u = (px as f32 + 0.5 - left) / size;
                let v = (py as f32 + 0.5 - top) / size;
                if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
                    continue;
                }
                let alpha = sprite.sample_alpha(u as f64, v as f64) as f32 * material.opacity;
                if !material.passes_alpha_test(alpha) {
                    continue;
                }
                raster.blend(px, py, color, alpha, material.blend);
            }
        }
    }
}

/// Renders the backdrop's current frame over `background`.
pub fn render_frame(
    backdrop: &Backdrop,
    width: u32,
    height: u32,
    background: Srgb,
) -> Result<Raster, EngineError> {
    let mut raster = Raster::new(width, height, background)?;
    splat(&mut raster, backdrop.positions(), backdrop.scene(), backdrop.sprite());
    Ok(raster)
}
