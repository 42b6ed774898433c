//! PNG output for rasters and the point sprite.
//!
//! Feature-gated behind `png` (default on) so consumers that only need the
//! float buffer do not pull in the `image` crate.

use std::path::Path;

use backdrop_core::error::EngineError;
use backdrop_core::sprite::SpriteImage;

use crate::pixel::raster_to_rgba;
use crate::Raster;

/// Writes a raster as an opaque RGBA PNG.
pub fn write_png(raster: &Raster, path: &Path) -> Result<(), EngineError> {
    save_rgba(raster.width(), raster.height(), raster_to_rgba(raster), path)
}

/// Writes the sprite with its alpha channel intact.
pub fn write_sprite_png(sprite: &SpriteImage, path: &Path) -> Result<(), EngineError> {
    save_rgba(sprite.size(), sprite.size(), sprite.pixels().to_vec(), path)
}

fn save_rgba(width: u32, height: u32, rgba: Vec<u8>, path: &Path) -> Result<(), EngineError> {
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))?;
    log::info!("wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::Srgb;

    #[test]
    fn raster_png_reads_back_with_same_size() {
        let raster = Raster::new(16, 9, Srgb::from_rgb8(0, 128, 255)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&raster, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!((img.width(), img.height()), (16, 9));
        assert_eq!(img.get_pixel(0, 0).0, [0, 128, 255, 255]);
    }

    #[test]
    fn sprite_png_keeps_alpha() {
        let sprite = SpriteImage::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprite.png");
        write_sprite_png(&sprite, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width(), 64);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(32, 32).0[3], sprite.alpha_at(32, 32));
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let raster = Raster::new(2, 2, Srgb::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.png");
        assert!(matches!(write_png(&raster, &path), Err(EngineError::Io(_))));
    }
}
