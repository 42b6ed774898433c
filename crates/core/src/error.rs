//! Error types for the backdrop core.

use thiserror::Error;

/// Errors produced while building or driving a backdrop.
///
/// Per-frame updates never fail; these only surface at setup time or at
/// the outer surfaces (CLI, wasm mount).
#[derive(Debug, Error)]
pub enum EngineError {
    /// A size (sprite, raster buffer) was zero or overflowed.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A configuration value was out of its accepted range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A GPU resource (context, texture, buffer, program) could not be created.
    #[error("render setup failed: {0}")]
    Render(String),

    /// Writing an output file failed.
    #[error("i/o error: {0}")]
    Io(String),
}

#[cfg(feature = "render")]
impl From<crate::render::ShaderError> for EngineError {
    fn from(e: crate::render::ShaderError) -> Self {
        EngineError::Render(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let msg = format!("{}", EngineError::InvalidDimensions);
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn invalid_config_includes_message() {
        let msg = format!("{}", EngineError::InvalidConfig("count must be > 0".into()));
        assert!(msg.contains("count must be > 0"), "missing message in: {msg}");
    }

    #[test]
    fn invalid_color_includes_message() {
        let msg = format!("{}", EngineError::InvalidColor("bad hex".into()));
        assert!(msg.contains("bad hex"), "missing message in: {msg}");
    }

    #[test]
    fn render_error_includes_message() {
        let msg = format!("{}", EngineError::Render("no webgl2".into()));
        assert!(msg.contains("no webgl2"), "missing message in: {msg}");
    }

    #[test]
    fn io_error_includes_message() {
        let msg = format!("{}", EngineError::Io("disk full".into()));
        assert!(msg.contains("disk full"), "missing message in: {msg}");
    }

    #[test]
    fn engine_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }

    #[test]
    fn engine_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<EngineError>();
    }
}
