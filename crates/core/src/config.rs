//! Component options.
//!
//! [`BackdropConfig`] deserializes from camelCase JSON with every field
//! defaulted, so `{}` is a complete configuration. [`BackdropConfig::from_json`]
//! is the lenient path used by hosts: wrong-typed values fall back to their
//! defaults instead of failing. Both paths end in [`BackdropConfig::validate`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::params::{param_bool, param_f64, param_opt_u64, param_string};
use crate::particles::Bounds;
use crate::theme::ColorMode;

pub const DEFAULT_COUNT: usize = 1200;
pub const DEFAULT_SPEED: f64 = 0.02;
pub const DEFAULT_DOT_SIZE: f64 = 0.06;
pub const DEFAULT_SMOOTHING: f64 = 0.06;
pub const DEFAULT_NOISE_SCALE: f64 = 0.6;
pub const DEFAULT_TIME_SCALE: f64 = 0.6;
/// Noise clock units per second of elapsed time (0.0003 per millisecond).
pub const DEFAULT_CLOCK_RATE: f64 = 0.3;
pub const DEFAULT_MAX_FRAME_DT: f64 = 1.0 / 30.0;
pub const DEFAULT_BOUNDS_X: f64 = 6.0;
pub const DEFAULT_BOUNDS_Y: f64 = 3.5;

/// Largest accepted particle count.
pub const MAX_COUNT: usize = 1_000_000;
/// Largest accepted `speed`.
pub const MAX_SPEED: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackdropConfig {
    /// Number of particles.
    pub count: usize,
    /// Multiplier from field value to target velocity.
    pub speed: f64,
    /// Point size in world units.
    pub dot_size: f64,
    /// Additive blending at opacity 0.5 when true, normal at 0.9 otherwise.
    pub glow: bool,
    /// Theme color the particles take.
    pub color_mode: ColorMode,
    /// Fraction of the gap to the target velocity closed each frame.
    pub smoothing: f64,
    /// Spatial scale applied to phase-shifted positions before sampling.
    pub noise_scale: f64,
    /// Scale applied to the phase-shifted noise clock before sampling.
    pub time_scale: f64,
    /// Noise clock units per second of elapsed time.
    pub clock_rate: f64,
    /// Upper clamp on the per-frame time step, in seconds.
    pub max_frame_dt: f64,
    /// Half-width of the wrap rectangle.
    pub bounds_x: f64,
    /// Half-height of the wrap rectangle.
    pub bounds_y: f64,
    /// Noise seed; `None` uses the built-in default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            speed: DEFAULT_SPEED,
            dot_size: DEFAULT_DOT_SIZE,
            glow: true,
            color_mode: ColorMode::Mix,
            smoothing: DEFAULT_SMOOTHING,
            noise_scale: DEFAULT_NOISE_SCALE,
            time_scale: DEFAULT_TIME_SCALE,
            clock_rate: DEFAULT_CLOCK_RATE,
            max_frame_dt: DEFAULT_MAX_FRAME_DT,
            bounds_x: DEFAULT_BOUNDS_X,
            bounds_y: DEFAULT_BOUNDS_Y,
            seed: None,
        }
    }
}

impl BackdropConfig {
    /// Builds a config from a JSON options object, then validates it.
    ///
    /// Missing or wrong-typed keys take their defaults. An unrecognized
    /// `colorMode` string is an error.
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        let d = Self::default();
        let config = Self {
            // saturate so an oversized count fails validation on 32-bit targets too
            count: param_opt_u64(params, "count")
                .map_or(d.count, |n| usize::try_from(n).unwrap_or(usize::MAX)),
            speed: param_f64(params, "speed", d.speed),
            dot_size: param_f64(params, "dotSize", d.dot_size),
            glow: param_bool(params, "glow", d.glow),
            color_mode: param_string(params, "colorMode", d.color_mode.as_str()).parse()?,
            smoothing: param_f64(params, "smoothing", d.smoothing),
            noise_scale: param_f64(params, "noiseScale", d.noise_scale),
            time_scale: param_f64(params, "timeScale", d.time_scale),
            clock_rate: param_f64(params, "clockRate", d.clock_rate),
            max_frame_dt: param_f64(params, "maxFrameDt", d.max_frame_dt),
            bounds_x: param_f64(params, "boundsX", d.bounds_x),
            bounds_y: param_f64(params, "boundsY", d.bounds_y),
            seed: param_opt_u64(params, "seed"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Strict parse of a JSON document, then validation.
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| EngineError::InvalidConfig(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.count == 0 {
            return Err(invalid("count must be greater than zero"));
        }
        if self.count > MAX_COUNT {
            return Err(invalid(&format!(
                "count must be at most {MAX_COUNT}, got {}",
                self.count
            )));
        }
        positive("speed", self.speed)?;
        if self.speed > MAX_SPEED {
            return Err(invalid(&format!(
                "speed must be at most {MAX_SPEED}, got {}",
                self.speed
            )));
        }
        positive("dotSize", self.dot_size)?;
        positive("maxFrameDt", self.max_frame_dt)?;
        positive("boundsX", self.bounds_x)?;
        positive("boundsY", self.bounds_y)?;
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(invalid(&format!(
                "smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        for (name, value) in [
            ("noiseScale", self.noise_scale),
            ("timeScale", self.time_scale),
            ("clockRate", self.clock_rate),
        ] {
            if !value.is_finite() {
                return Err(invalid(&format!("{name} must be finite, got {value}")));
            }
        }
        Ok(())
    }

    /// The wrap rectangle, narrowed for the particle buffers.
    pub fn bounds(&self) -> Result<Bounds, EngineError> {
        Bounds::new(self.bounds_x as f32, self.bounds_y as f32)
    }

    /// Whether switching from `self` to `other` requires new particle storage.
    pub fn needs_realloc(&self, other: &Self) -> bool {
        self.count != other.count
            || self.bounds_x != other.bounds_x
            || self.bounds_y != other.bounds_y
    }

    /// Describes every option: type, default, range, and meaning.
    pub fn param_schema() -> Value {
        let d = Self::default();
        json!({
            "count": {"type": "integer", "default": d.count, "min": 1, "max": MAX_COUNT,
                "description": "Number of particles"},
            "speed": {"type": "number", "default": d.speed, "min": 0.0, "exclusiveMin": true,
                "max": MAX_SPEED,
                "description": "Field-to-velocity multiplier (0.015-0.03 recommended)"},
            "dotSize": {"type": "number", "default": d.dot_size, "min": 0.0, "exclusiveMin": true,
                "description": "Point size in world units (0.055-0.065 recommended)"},
            "glow": {"type": "boolean", "default": d.glow,
                "description": "Additive blending at opacity 0.5; normal blending at 0.9 when off"},
            "colorMode": {"type": "string", "default": d.color_mode.as_str(),
                "enum": ColorMode::ALL.map(ColorMode::as_str),
                "description": "Theme color used for the particles"},
            "smoothing": {"type": "number", "default": d.smoothing, "min": 0.0, "max": 1.0,
                "exclusiveMin": true,
                "description": "Per-frame velocity smoothing; higher reacts faster"},
            "noiseScale": {"type": "number", "default": d.noise_scale,
                "description": "Spatial scale applied before sampling the field"},
            "timeScale": {"type": "number", "default": d.time_scale,
                "description": "Scale applied to the noise clock before sampling"},
            "clockRate": {"type": "number", "default": d.clock_rate,
                "description": "Noise clock units per elapsed second"},
            "maxFrameDt": {"type": "number", "default": d.max_frame_dt, "min": 0.0,
                "exclusiveMin": true,
                "description": "Largest time step applied in one frame, in seconds"},
            "boundsX": {"type": "number", "default": d.bounds_x, "min": 0.0, "exclusiveMin": true,
                "description": "Half-width of the wrap rectangle"},
            "boundsY": {"type": "number", "default": d.bounds_y, "min": 0.0, "exclusiveMin": true,
                "description": "Half-height of the wrap rectangle"},
            "seed": {"type": "integer", "default": null, "min": 0,
                "description": "Noise seed; omitted uses the built-in seed"},
        })
    }
}

fn invalid(msg: &str) -> EngineError {
    EngineError::InvalidConfig(msg.to_owned())
}

fn positive(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be positive, got {value}")))
    }
}
