//! Float raster to RGBA8 conversion.
//!
//! Always available (no feature gate) so the PNG path and any in-memory
//! consumer share the same quantization.

use crate::Raster;

/// Clamps each channel to [0, 1] and writes `(R, G, B, 255)` per pixel.
pub fn raster_to_rgba(raster: &Raster) -> Vec<u8> {
    raster
        .data()
        .chunks_exact(3)
        .flat_map(|px| [quantize(px[0]), quantize(px[1]), quantize(px[2]), 255u8])
        .collect()
}

fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
