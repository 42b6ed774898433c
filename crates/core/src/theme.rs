//! Theme color resolution.
//!
//! Reads the two theme custom properties from the host environment once,
//! validates them with [`parse_css_color`], and derives the blended color.
//! The result is immutable for the lifetime of the render material.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{mix_hex, parse_css_color, Srgb};
use crate::error::EngineError;

/// Custom property holding the primary theme color.
pub const PRIMARY_PROPERTY: &str = "--color-primary";
/// Custom property holding the accent theme color.
pub const ACCENT_PROPERTY: &str = "--color-accent";
/// Used when the primary property is absent or malformed.
pub const FALLBACK_PRIMARY: &str = "#4ADE80";
/// Used when the accent property is absent or malformed.
pub const FALLBACK_ACCENT: &str = "#A7F3D0";
/// Share of accent in the blended color.
pub const MIX_RATIO: f64 = 0.3;

/// Which resolved color feeds the particle material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Mix,
    Primary,
    Accent,
}

impl ColorMode {
    /// All modes in declaration order.
    pub const ALL: [ColorMode; 3] = [ColorMode::Mix, ColorMode::Primary, ColorMode::Accent];

    /// The lower-case name used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Mix => "mix",
            ColorMode::Primary => "primary",
            ColorMode::Accent => "accent",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "unknown color mode {s:?}, expected mix, primary or accent"
                ))
            })
    }
}

/// Somewhere theme custom properties can be read from.
///
/// In the browser this is the computed style of the document root; the CLI
/// and tests use a [`HashMap`].
pub trait ThemeSource {
    /// Raw value of a custom property, or `None` when unset.
    fn custom_property(&self, name: &str) -> Option<String>;
}

impl ThemeSource for HashMap<String, String> {
    fn custom_property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A source with no properties set; every color falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTheme;

impl ThemeSource for NoTheme {
    fn custom_property(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Validated theme colors plus the derived blend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTheme {
    /// Validated primary color string (`#rrggbb` or `rgb(...)`).
    pub primary: String,
    /// Validated accent color string.
    pub accent: String,
    /// `primary` blended [`MIX_RATIO`] toward `accent`, as `rgb(...)`.
    pub mix: String,
}

impl ResolvedTheme {
    /// Reads and validates both theme colors from `source`.
    pub fn resolve(source: &dyn ThemeSource) -> Self {
        let primary = resolve_property(source, PRIMARY_PROPERTY, FALLBACK_PRIMARY);
        let accent = resolve_property(source, ACCENT_PROPERTY, FALLBACK_ACCENT);
        Self::from_colors(primary, accent)
    }

    /// Builds a theme from already-validated color strings.
    pub fn from_colors(primary: String, accent: String) -> Self {
        let mix = mix_hex(&primary, &accent, MIX_RATIO)
            .or_else(|_| mix_hex(FALLBACK_PRIMARY, FALLBACK_ACCENT, MIX_RATIO))
            .unwrap_or_else(|_| FALLBACK_PRIMARY.to_string());
        Self {
            primary,
            accent,
            mix,
        }
    }

    /// The color string selected by `mode`.
    pub fn color_string(&self, mode: ColorMode) -> &str {
        match mode {
            ColorMode::Mix => &self.mix,
            ColorMode::Primary => &self.primary,
            ColorMode::Accent => &self.accent,
        }
    }

    /// The material color selected by `mode`.
    pub fn material_color(&self, mode: ColorMode) -> Srgb {
        Srgb::from_css(self.color_string(mode))
            .or_else(|_| Srgb::from_hex(FALLBACK_PRIMARY))
            .unwrap_or_default()
    }
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        Self::resolve(&NoTheme)
    }
}

fn resolve_property(source: &dyn ThemeSource, name: &str, fallback: &str) -> String {
    let raw = source.custom_property(name).unwrap_or_default();
    let resolved = parse_css_color(&raw, fallback);
    if resolved == fallback && !raw.trim().is_empty() && raw.trim() != fallback {
        log::warn!("theme property {name} = {raw:?} is not a usable color, using {fallback}");
    }
    resolved
}
