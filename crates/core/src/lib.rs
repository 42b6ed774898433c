#![deny(unsafe_code)]
//! Core of the curl-noise particle background.
//!
//! Provides theme color resolution (`ResolvedTheme`, `Srgb`), the soft point
//! `SpriteImage`, the `FieldSource` trait with the `CurlField` sampler, the
//! `ParticleStore` and `FlowIntegrator`, scene values (`SceneSetup`), the
//! `BackdropConfig` options, and the assembled `Backdrop`. The `render`
//! feature adds the glow point renderer.

pub mod animation;
pub mod backdrop;
pub mod color;
pub mod config;
pub mod error;
pub mod field_source;
pub mod flow;
pub mod params;
pub mod particles;
pub mod prng;
pub mod scene;
pub mod sprite;
pub mod theme;

#[cfg(feature = "render")]
pub mod render;

pub use animation::Animation;
pub use backdrop::Backdrop;
pub use color::Srgb;
pub use config::BackdropConfig;
pub use error::EngineError;
pub use field_source::{ConstantField, CurlField, FieldSource};
pub use flow::{FlowIntegrator, FlowParams};
pub use particles::{Bounds, ParticleStore};
pub use prng::Xorshift64;
pub use scene::{BlendMode, Camera, DprRange, PointMaterial, SceneSetup};
pub use sprite::SpriteImage;
pub use theme::{ColorMode, NoTheme, ResolvedTheme, ThemeSource};
