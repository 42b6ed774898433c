//! WebGL2 point rendering.
//!
//! Only available with the `render` feature.
//!
//! - [`shader`]: point-sprite GLSL, compile/link, error formatting.
//! - [`texture`]: sprite texture upload.
//! - [`points`]: the renderer that owns every GL object for one backdrop.

pub mod points;
pub mod shader;
pub mod texture;

pub use points::{blend_factors, PointUniforms, PointsRenderer};
pub use shader::{compile_program, compile_shader, format_shader_error, ShaderError};
pub use texture::{upload_sprite, TextureConfig};
