//! Camera, pixel-ratio range, and point material.
//!
//! These are plain values: the GL renderer and the CPU rasterizer both read
//! them, so a preview PNG and the browser frame agree on framing and size.

use glam::{Mat4, Vec3, Vec4Swizzles};

use crate::config::BackdropConfig;
use crate::theme::ResolvedTheme;
use crate::color::Srgb;

/// Fragments with alpha at or below this are discarded.
pub const ALPHA_TEST: f32 = 0.02;
pub const GLOW_OPACITY: f32 = 0.5;
pub const NORMAL_OPACITY: f32 = 0.9;

/// Perspective camera looking down -Z at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            fov_deg: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh_gl(self.fov_deg.to_radians(), aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    /// Maps a world point to pixel coordinates (origin top-left) plus its
    /// distance in front of the camera. `None` when behind the near plane.
    pub fn world_to_screen(&self, point: Vec3, width: u32, height: u32) -> Option<(f32, f32, f32)> {
        let view_pos = self.view() * point.extend(1.0);
        let depth = -view_pos.z;
        if depth < self.near {
            return None;
        }
        let clip = self.projection(width as f32 / height.max(1) as f32) * view_pos;
        let ndc = clip.xy() / clip.w;
        let sx = (ndc.x + 1.0) * 0.5 * width as f32;
        let sy = (1.0 - ndc.y) * 0.5 * height as f32;
        Some((sx, sy, depth))
    }
}

/// Allowed device-pixel-ratio range for the drawing buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DprRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DprRange {
    fn default() -> Self {
        Self { min: 1.0, max: 2.0 }
    }
}

impl DprRange {
    /// Clamps a reported device pixel ratio; NaN maps to `min`.
    pub fn clamp(&self, ratio: f64) -> f64 {
        if ratio.is_nan() {
            return self.min;
        }
        ratio.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// `src * alpha + dst`
    Additive,
    /// `src * alpha + dst * (1 - alpha)`
    Normal,
}

/// Point material shared by every particle.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMaterial {
    pub color: Srgb,
    /// World-space point size.
    pub size: f32,
    pub size_attenuation: bool,
    pub transparent: bool,
    pub depth_write: bool,
    pub alpha_test: f32,
    pub blend: BlendMode,
    pub opacity: f32,
}

impl PointMaterial {
    pub fn new(color: Srgb, size: f32, glow: bool) -> Self {
        let (blend, opacity) = if glow {
            (BlendMode::Additive, GLOW_OPACITY)
        } else {
            (BlendMode::Normal, NORMAL_OPACITY)
        };
        Self {
            color,
            size,
            size_attenuation: true,
            transparent: true,
            depth_write: false,
            alpha_test: ALPHA_TEST,
            blend,
            opacity,
        }
    }

    /// Whether a fragment of final alpha `alpha` is kept. Only alphas strictly
    /// below the threshold are discarded.
    pub fn passes_alpha_test(&self, alpha: f32) -> bool {
        alpha >= self.alpha_test
    }

    /// On-screen diameter in pixels for a point `view_depth` units in front
    /// of the camera, with a drawing buffer `viewport_height_px` tall.
    pub fn point_size_px(&self, view_depth: f32, viewport_height_px: f32) -> f32 {
        if !self.size_attenuation {
            return self.size;
        }
        if view_depth <= 0.0 {
            return 0.0;
        }
        self.size * (viewport_height_px / 2.0) / view_depth
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSetup {
    pub camera: Camera,
    pub dpr: DprRange,
    pub material: PointMaterial,
}

impl SceneSetup {
    pub fn from_config(config: &BackdropConfig, theme: &ResolvedTheme) -> Self {
        Self {
            camera: Camera::default(),
            dpr: DprRange::default(),
            material: PointMaterial::new(
                theme.material_color(config.color_mode),
                config.dot_size as f32,
                config.glow,
            ),
        }
    }
}
