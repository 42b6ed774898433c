//! Point-sprite shaders and GLSL compile/link helpers.
//!
//! The compile and link functions need a live `glow::Context`; the shader
//! sources and the error formatting are plain strings and are tested
//! without a GPU.

use thiserror::Error;

/// Vertex stage: projects each position and sizes the point with
/// perspective attenuation (`size * (half_height / depth)`).
pub const POINTS_VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;

uniform mat4 u_projection;
uniform mat4 u_view;
uniform float u_size;
uniform float u_half_height;
uniform bool u_attenuate;

void main() {
    vec4 view_pos = u_view * vec4(a_position, 1.0);
    gl_Position = u_projection * view_pos;
    gl_PointSize = u_attenuate ? u_size * (u_half_height / -view_pos.z) : u_size;
}
"#;

/// Fragment stage: tints the sprite, applies opacity, and discards
/// fragments at or below the alpha test.
pub const POINTS_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

uniform sampler2D u_sprite;
uniform vec3 u_color;
uniform float u_opacity;
uniform float u_alpha_test;

out vec4 frag_color;

void main() {
    vec4 texel = texture(u_sprite, vec2(gl_PointCoord.x, 1.0 - gl_PointCoord.y));
    vec4 color = vec4(u_color, u_opacity) * texel;
    if (color.a < u_alpha_test) discard;
    frag_color = color;
}
"#;

/// Errors from shader compilation or program linking.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A stage of the point-sprite program failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    CompileError {
        /// "vertex" or "fragment".
        stage: String,
        /// Numbered source followed by the driver's info log.
        log: String,
    },
    /// The compiled stages failed to link.
    #[error("shader link error:\n{0}")]
    LinkError(String),
}

/// Prefixes each source line with a right-aligned line number, then appends
/// the driver log, so log positions can be matched against the GLSL.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let width = source.lines().count().max(1).to_string().len();
    let numbered = source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, _) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

/// Compiles one shader stage.
#[allow(unsafe_code)]
pub fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    let stage = stage_name(shader_type);
    // SAFETY: shader_type is a valid stage enum and the handle is deleted on
    // the failure path.
    unsafe {
        let shader = gl
            .create_shader(shader_type)
            .map_err(|log| ShaderError::CompileError {
                stage: stage.to_string(),
                log,
            })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            return Ok(shader);
        }
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        Err(ShaderError::CompileError {
            stage: stage.to_string(),
            log: format_shader_error(source, &log),
        })
    }
}

/// Compiles both stages and links them. The stage objects are always
/// deleted; only the program survives.
#[allow(unsafe_code)]
pub fn compile_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let vert = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
    let frag = match compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            // SAFETY: vert came from a successful compile_shader call.
            unsafe { gl.delete_shader(vert) };
            return Err(e);
        }
    };

    // SAFETY: vert and frag are live shader handles; the program keeps its
    // own copies after linking, so both are deleted on every path.
    unsafe {
        let result = match gl.create_program() {
            Ok(program) => {
                gl.attach_shader(program, vert);
                gl.attach_shader(program, frag);
                gl.link_program(program);
                gl.detach_shader(program, vert);
                gl.detach_shader(program, frag);
                if gl.get_program_link_status(program) {
                    Ok(program)
                } else {
                    let log = gl.get_program_info_log(program);
                    gl.delete_program(program);
                    Err(ShaderError::LinkError(log))
                }
            }
            Err(e) => Err(ShaderError::LinkError(e)),
        };
        gl.delete_shader(vert);
        gl.delete_shader(frag);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_discards_strictly_below_alpha_test() {
        assert!(POINTS_FRAGMENT_SHADER.contains("if (color.a < u_alpha_test) discard;"));
    }

    #[test]
    fn sources_target_glsl_es_300() {
        assert!(POINTS_VERTEX_SHADER.starts_with("#version 300 es"));
        assert!(POINTS_FRAGMENT_SHADER.starts_with("#version 300 es"));
    }

    #[test]
    fn vertex_shader_writes_point_size() {
        assert!(POINTS_VERTEX_SHADER.contains("gl_PointSize"));
        assert!(POINTS_VERTEX_SHADER.contains("layout(location = 0) in vec3 a_position"));
    }

    #[test]
    fn fragment_shader_samples_point_coord_and_discards() {
        assert!(POINTS_FRAGMENT_SHADER.contains("gl_PointCoord"));
        assert!(POINTS_FRAGMENT_SHADER.contains("discard"));
    }

    #[test]
    fn every_uniform_the_renderer_sets_is_declared() {
        let both = format!("{POINTS_VERTEX_SHADER}{POINTS_FRAGMENT_SHADER}");
        for name in [
            "u_projection",
            "u_view",
            "u_size",
            "u_half_height",
            "u_attenuate",
            "u_sprite",
            "u_color",
            "u_opacity",
            "u_alpha_test",
        ] {
            assert!(both.contains(&format!(" {name};")), "{name} not declared");
        }
    }

    #[test]
    fn format_numbers_lines_and_appends_log() {
        let formatted = format_shader_error("#version 300 es\nvoid main() {\n}", "ERROR: 0:2");
        assert!(formatted.contains("1: #version 300 es"));
        assert!(formatted.contains("3: }"));
        assert!(formatted.ends_with("ERROR: 0:2"));
    }

    #[test]
    fn format_right_aligns_numbers() {
        let source = (1..=12).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let formatted = format_shader_error(&source, "");
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines[0], " 1: l1");
        assert_eq!(lines[11], "12: l12");
    }

    #[test]
    fn format_handles_empty_inputs() {
        assert_eq!(format_shader_error("", ""), "");
        assert_eq!(format_shader_error("", "log only"), "log only");
        assert_eq!(format_shader_error("x", ""), "1: x");
    }

    #[test]
    fn shader_error_display_includes_details() {
        let err = ShaderError::CompileError {
            stage: "fragment".into(),
            log: "undeclared identifier".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fragment") && msg.contains("undeclared identifier"));
        assert!(ShaderError::LinkError("varying mismatch".into())
            .to_string()
            .contains("varying mismatch"));
    }

    #[test]
    #[ignore = "requires GL context"]
    fn point_program_compiles_and_links() {}
}
