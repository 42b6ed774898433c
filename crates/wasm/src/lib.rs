#![deny(unsafe_code)]
//! Browser bindings for the backdrop particle field.
//!
//! `mount(options)` appends a full-viewport, non-interactive `<canvas>` to
//! `<body>`, reads the theme custom properties from the root element's
//! computed style, and drives the animation from `requestAnimationFrame`
//! until `BackdropHandle::unmount` is called.

pub mod logger;

#[cfg(target_arch = "wasm32")]
mod mount;

#[cfg(target_arch = "wasm32")]
pub use mount::{mount, BackdropHandle};

use backdrop_core::{BackdropConfig, EngineError};

/// Inline style of the mounted canvas: fixed, covering the viewport,
/// behind content, ignoring pointer input.
pub const CANVAS_STYLE: &str =
    "position:fixed;inset:0;width:100vw;height:100vh;z-index:0;pointer-events:none;display:block";

/// Parses mount options; an empty string means all defaults.
pub fn parse_options(options_json: &str) -> Result<BackdropConfig, EngineError> {
    let text = options_json.trim();
    if text.is_empty() {
        return Ok(BackdropConfig::default());
    }
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| EngineError::InvalidConfig(format!("mount options are not JSON: {e}")))?;
    BackdropConfig::from_json(&value)
}

/// Drawing-buffer size for a CSS viewport at a (clamped) pixel ratio.
pub fn drawing_buffer_size(css_width: f64, css_height: f64, dpr: f64) -> (u32, u32) {
    let px = |css: f64| {
        let v = (css * dpr).round();
        if v.is_finite() && v >= 1.0 {
            v as u32
        } else {
            1
        }
    };
    (px(css_width), px(css_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::theme::ColorMode;

    #[test]
    fn empty_options_are_defaults() {
        assert_eq!(parse_options("").unwrap(), BackdropConfig::default());
        assert_eq!(parse_options("  ").unwrap(), BackdropConfig::default());
        assert_eq!(parse_options("{}").unwrap(), BackdropConfig::default());
    }

    #[test]
    fn options_use_camel_case_keys() {
        let c = parse_options(r#"{"count": 600, "dotSize": 0.055, "colorMode": "accent"}"#).unwrap();
        assert_eq!(c.count, 600);
        assert_eq!(c.dot_size, 0.055);
        assert_eq!(c.color_mode, ColorMode::Accent);
    }

    #[test]
    fn malformed_options_are_rejected() {
        assert!(matches!(
            parse_options("{count:"),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(parse_options(r#"{"speed": -1}"#).is_err());
    }

    #[test]
    fn canvas_style_is_a_passive_fullscreen_layer() {
        for decl in ["position:fixed", "inset:0", "z-index:0", "pointer-events:none"] {
            assert!(CANVAS_STYLE.contains(decl), "missing {decl}");
        }
    }

    #[test]
    fn drawing_buffer_scales_with_dpr() {
        assert_eq!(drawing_buffer_size(800.0, 600.0, 2.0), (1600, 1200));
        assert_eq!(drawing_buffer_size(801.0, 600.5, 1.5), (1202, 901));
        assert_eq!(drawing_buffer_size(0.0, f64::NAN, 1.0), (1, 1));
    }
}
