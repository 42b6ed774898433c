//! GL resources for drawing the particle buffer as point sprites.
//!
//! [`PointsRenderer`] owns the program, vertex array, position buffer, and
//! sprite texture. Positions are uploaded only when the store flags them;
//! [`PointsRenderer::destroy`] releases every object.

use glam::Mat4;

use crate::error::EngineError;
use crate::render::shader::{compile_program, POINTS_FRAGMENT_SHADER, POINTS_VERTEX_SHADER};
use crate::render::texture::upload_sprite;
use crate::scene::{BlendMode, SceneSetup};
use crate::sprite::SpriteImage;

/// GL source and destination factors for a blend mode.
pub fn blend_factors(mode: BlendMode) -> (u32, u32) {
    match mode {
        BlendMode::Additive => (glow::SRC_ALPHA, glow::ONE),
        BlendMode::Normal => (glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA),
    }
}

/// Everything the point program reads for one draw, derived from the scene
/// and the drawing-buffer size.
#[derive(Debug, Clone, PartialEq)]
pub struct PointUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub size: f32,
    pub half_height: f32,
    pub attenuate: bool,
    pub color: [f32; 3],
    pub opacity: f32,
    pub alpha_test: f32,
}

impl PointUniforms {
    pub fn from_scene(scene: &SceneSetup, width_px: u32, height_px: u32) -> Self {
        let aspect = width_px as f32 / height_px.max(1) as f32;
        let m = &scene.material;
        Self {
            projection: scene.camera.projection(aspect),
            view: scene.camera.view(),
            size: m.size,
            half_height: height_px as f32 / 2.0,
            attenuate: m.size_attenuation,
            color: m.color.to_array_f32(),
            opacity: m.opacity,
            alpha_test: m.alpha_test,
        }
    }
}

pub struct PointsRenderer {
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    texture: glow::Texture,
    /// Floats currently allocated in `vbo`.
    capacity: usize,
    point_count: usize,
}

impl PointsRenderer {
    /// Compiles the point program, uploads the sprite, and allocates the
    /// position buffer with `positions`.
    #[allow(unsafe_code)]
    pub fn new(
        gl: &glow::Context,
        sprite: &SpriteImage,
        positions: &[f32],
    ) -> Result<Self, EngineError> {
        use glow::HasContext;

        let program = compile_program(gl, POINTS_VERTEX_SHADER, POINTS_FRAGMENT_SHADER)?;
        let texture = match upload_sprite(gl, sprite) {
            Ok(t) => t,
            Err(e) => {
                // SAFETY: program is a live handle from compile_program.
                unsafe { gl.delete_program(program) };
                return Err(e);
            }
        };

        // SAFETY: every handle is created here and deleted on failure; the
        // attribute layout matches `layout(location = 0) in vec3`.
        unsafe {
            let vao = match gl.create_vertex_array() {
                Ok(v) => v,
                Err(e) => {
                    gl.delete_program(program);
                    gl.delete_texture(texture);
                    return Err(EngineError::Render(format!("vertex array: {e}")));
                }
            };
            let vbo = match gl.create_buffer() {
                Ok(b) => b,
                Err(e) => {
                    gl.delete_vertex_array(vao);
                    gl.delete_program(program);
                    gl.delete_texture(texture);
                    return Err(EngineError::Render(format!("position buffer: {e}")));
                }
            };
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(positions),
                glow::DYNAMIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 12, 0);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            log::debug!("points renderer ready: {} points", positions.len() / 3);
            Ok(Self {
                program,
                vao,
                vbo,
                texture,
                capacity: positions.len(),
                point_count: positions.len() / 3,
            })
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Copies `positions` into the buffer, reallocating when the length
    /// changed since the last upload.
    #[allow(unsafe_code)]
    pub fn upload(&mut self, gl: &glow::Context, positions: &[f32]) {
        use glow::HasContext;

        let bytes: &[u8] = bytemuck::cast_slice(positions);
        // SAFETY: vbo is live; the byte slice covers exactly `positions`.
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            if positions.len() == self.capacity {
                gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytes);
            } else {
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::DYNAMIC_DRAW);
                self.capacity = positions.len();
            }
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        self.point_count = positions.len() / 3;
    }

    /// Draws every point with the scene's material into the current
    /// framebuffer, which is `width_px × height_px`.
    #[allow(unsafe_code)]
    pub fn draw(&self, gl: &glow::Context, scene: &SceneSetup, width_px: u32, height_px: u32) {
        use glow::HasContext;

        let u = PointUniforms::from_scene(scene, width_px, height_px);
        let (src, dst) = blend_factors(scene.material.blend);
        let p = self.program;

        // SAFETY: program, vao, and texture are live; uniform locations come
        // from the same program.
        unsafe {
            gl.viewport(0, 0, width_px as i32, height_px as i32);
            gl.enable(glow::BLEND);
            gl.blend_func(src, dst);
            gl.depth_mask(scene.material.depth_write);

            gl.use_program(Some(p));
            gl.uniform_matrix_4_f32_slice(
                gl.get_uniform_location(p, "u_projection").as_ref(),
                false,
                &u.projection.to_cols_array(),
            );
            gl.uniform_matrix_4_f32_slice(
                gl.get_uniform_location(p, "u_view").as_ref(),
                false,
                &u.view.to_cols_array(),
            );
            gl.uniform_1_f32(gl.get_uniform_location(p, "u_size").as_ref(), u.size);
            gl.uniform_1_f32(gl.get_uniform_location(p, "u_half_height").as_ref(), u.half_height);
            gl.uniform_1_i32(
                gl.get_uniform_location(p, "u_attenuate").as_ref(),
                i32::from(u.attenuate),
            );
            gl.uniform_3_f32(
                gl.get_uniform_location(p, "u_color").as_ref(),
                u.color[0],
                u.color[1],
                u.color[2],
            );
            gl.uniform_1_f32(gl.get_uniform_location(p, "u_opacity").as_ref(), u.opacity);
            gl.uniform_1_f32(gl.get_uniform_location(p, "u_alpha_test").as_ref(), u.alpha_test);

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.uniform_1_i32(gl.get_uniform_location(p, "u_sprite").as_ref(), 0);

            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::POINTS, 0, self.point_count as i32);
            gl.bind_vertex_array(None);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }

    /// Deletes every GL object owned by the renderer.
    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: the handles are live and consumed with `self`.
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
            gl.delete_texture(self.texture);
            gl.delete_program(self.program);
        }
        log::debug!("points renderer destroyed");
    }
}
