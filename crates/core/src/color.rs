//! Color parsing, normalization and blending for theme colors.
//!
//! Theme colors arrive as CSS strings read from the host page. This module
//! validates them ([`parse_css_color`]), parses them into [`Srgb`], and
//! blends two of them ([`mix_hex`]) by linear interpolation in sRGB space.

use crate::error::EngineError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// sRGB color with components in [0, 1].
///
/// Serializes as a hex string `"#rrggbb"`. The hex round-trip has 8-bit
/// quantization (1/255 precision loss), which is what CSS colors carry anyway.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Srgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Srgb {
    /// Parses a hex color like `"#ff00aa"`, `"#f0a"`, `"ff00aa"` or `"f0a"`
    /// (case insensitive). Three-digit forms expand each digit (`#abc` is `#aabbcc`).
    pub fn from_hex(hex: &str) -> Result<Srgb, EngineError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EngineError::InvalidColor(format!(
                "non-hex digit in {hex:?}"
            )));
        }
        let (r, g, b) = match digits.len() {
            3 => {
                let d = digits.as_bytes();
                (
                    nibble(d[0]) * 0x11,
                    nibble(d[1]) * 0x11,
                    nibble(d[2]) * 0x11,
                )
            }
            6 => (
                byte_at(digits, 0)?,
                byte_at(digits, 2)?,
                byte_at(digits, 4)?,
            ),
            n => {
                return Err(EngineError::InvalidColor(format!(
                    "expected 3 or 6 hex digits, got {n}"
                )))
            }
        };
        Ok(Srgb::from_rgb8(r, g, b))
    }

    /// Parses any color form the resolver accepts: `#rgb`, `#rrggbb`,
    /// `rgb(r, g, b)` or `rgba(r, g, b, a)`. Alpha is validated but dropped.
    pub fn from_css(value: &str) -> Result<Srgb, EngineError> {
        let v = value.trim();
        if v.starts_with('#') {
            return Srgb::from_hex(v);
        }
        parse_rgb_function(v)
            .ok_or_else(|| EngineError::InvalidColor(format!("unrecognized color {v:?}")))
    }

    /// Builds a color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Srgb {
        Srgb {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Quantizes to 8-bit channels with rounding, clamping out-of-range values.
    pub fn to_rgb8(self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// Converts the color to a hex string like `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Converts the color to a CSS functional string like `"rgb(74,222,128)"`.
    pub fn to_css(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("rgb({r},{g},{b})")
    }

    /// Component-wise linear interpolation; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Srgb, t: f64) -> Srgb {
        Srgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Channels as `f32`, the form GL uniforms take.
    pub fn to_array_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }
}

impl Serialize for Srgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Srgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Srgb::from_css(&s).map_err(serde::de::Error::custom)
    }
}

/// Validates a theme color string, substituting `fallback` for anything unusable.
///
/// - surrounding whitespace is trimmed; an empty value yields the fallback
/// - a well-formed `rgb(...)` / `rgba(...)` call passes through unchanged
/// - `#rgb` expands to `#rrggbb` by digit duplication (case preserved)
/// - `#rrggbb` passes through
/// - anything else yields the fallback
///
/// Never fails.
pub fn parse_css_color(value: &str, fallback: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        return fallback.to_string();
    }
    if v.to_ascii_lowercase().starts_with("rgb") {
        return match parse_rgb_function(v) {
            Some(_) => v.to_string(),
            None => fallback.to_string(),
        };
    }
    let Some(digits) = v.strip_prefix('#') else {
        return fallback.to_string();
    };
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return fallback.to_string();
    }
    match digits.len() {
        3 => digits.chars().fold(String::from("#"), |mut out, c| {
            out.push(c);
            out.push(c);
            out
        }),
        6 => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Blends two color strings in sRGB space and returns the result as `rgb(...)`.
///
/// `t` is the share of `b`: `0.3` means 70 % `a`, 30 % `b`.
pub fn mix_hex(a: &str, b: &str, t: f64) -> Result<String, EngineError> {
    let ca = Srgb::from_css(a)?;
    let cb = Srgb::from_css(b)?;
    Ok(ca.lerp(cb, t).to_css())
}

fn quantize(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

fn byte_at(digits: &str, at: usize) -> Result<u8, EngineError> {
    u8::from_str_radix(&digits[at..at + 2], 16)
        .map_err(|e| EngineError::InvalidColor(format!("invalid component: {e}")))
}

/// Parses `rgb(r, g, b)`, `rgba(r, g, b, a)` and the space-separated
/// `rgb(r g b / a)` form. Channels are 0-255 numbers or percentages.
fn parse_rgb_function(v: &str) -> Option<Srgb> {
    let lower = v.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let (channels, slash_alpha) = match inner.split_once('/') {
        Some((c, a)) => (c, Some(a.trim())),
        None => (inner, None),
    };
    let parts: Vec<&str> = channels
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let alpha = match (parts.len(), slash_alpha) {
        (3, alpha) => alpha,
        (4, None) => Some(parts[3]),
        _ => return None,
    };
    if let Some(a) = alpha {
        parse_alpha(a)?;
    }

    Some(Srgb {
        r: parse_channel(parts[0])?,
        g: parse_channel(parts[1])?,
        b: parse_channel(parts[2])?,
    })
}

fn parse_channel(part: &str) -> Option<f64> {
    let (number, divisor) = match part.strip_suffix('%') {
        Some(pct) => (pct, 100.0),
        None => (part, 255.0),
    };
    let value: f64 = number.parse().ok()?;
    value
        .is_finite()
        .then(|| (value / divisor).clamp(0.0, 1.0))
}

fn parse_alpha(part: &str) -> Option<f64> {
    let (number, divisor) = match part.strip_suffix('%') {
        Some(pct) => (pct, 100.0),
        None => (part, 1.0),
    };
    let value: f64 = number.parse().ok()?;
    value.is_finite().then(|| (value / divisor).clamp(0.0, 1.0))
}
