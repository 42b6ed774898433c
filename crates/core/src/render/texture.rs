//! Sprite texture upload.
//!
//! The point sprite is a small RGBA8 image sampled with LINEAR filtering,
//! no mipmaps, clamped at the edges.

use crate::error::EngineError;
use crate::sprite::SpriteImage;

/// Parameters for the sprite texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
    /// GL internal format (e.g. `glow::RGBA8`).
    pub internal_format: u32,
    /// Min and mag filter.
    pub filter: u32,
    pub wrap: u32,
}

impl TextureConfig {
    /// RGBA8, LINEAR, clamp-to-edge, sized to the sprite.
    pub fn for_sprite(sprite: &SpriteImage) -> Self {
        Self {
            width: sprite.size(),
            height: sprite.size(),
            internal_format: glow::RGBA8,
            filter: glow::LINEAR,
            wrap: glow::CLAMP_TO_EDGE,
        }
    }
}

/// Uploads the sprite and returns the texture handle.
///
/// A failure here is fatal to setup and surfaces as `EngineError::Render`.
#[allow(unsafe_code)]
pub fn upload_sprite(gl: &glow::Context, sprite: &SpriteImage) -> Result<glow::Texture, EngineError> {
    use glow::HasContext;

    let config = TextureConfig::for_sprite(sprite);
    // SAFETY: the texture is freshly created and bound; the pixel slice is
    // exactly width * height * 4 bytes of RGBA8.
    unsafe {
        let texture = gl
            .create_texture()
            .map_err(|e| EngineError::Render(format!("sprite texture: {e}")))?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, config.wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, config.wrap as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, config.filter as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, config.filter as i32);
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            config.internal_format as i32,
            config.width as i32,
            config.height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(sprite.pixels())),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_config_is_rgba8_linear_clamped() {
        let config = TextureConfig::for_sprite(&SpriteImage::default());
        assert_eq!((config.width, config.height), (64, 64));
        assert_eq!(config.internal_format, glow::RGBA8);
        assert_eq!(config.filter, glow::LINEAR);
        assert_eq!(config.wrap, glow::CLAMP_TO_EDGE);
    }

    #[test]
    fn sprite_config_matches_sprite_size() {
        let sprite = SpriteImage::circle(16).unwrap();
        let config = TextureConfig::for_sprite(&sprite);
        assert_eq!((config.width, config.height), (16, 16));
        assert_eq!(sprite.pixels().len(), (config.width * config.height * 4) as usize);
    }

    #[test]
    #[ignore = "requires GL context"]
    fn sprite_upload_returns_texture() {}
}
