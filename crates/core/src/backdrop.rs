//! The assembled particle background.
//!
//! [`Backdrop`] owns everything one mounted instance needs: resolved theme,
//! scene values, sprite, flow field, particle storage, and the integrator.
//! Resources are built once; [`Backdrop::reconfigure`] rebuilds only what a
//! changed option affects.

use serde_json::Value;

use crate::animation::Animation;
use crate::config::BackdropConfig;
use crate::error::EngineError;
use crate::field_source::{CurlField, FieldSource, DEFAULT_NOISE_SEED};
use crate::flow::FlowIntegrator;
use crate::particles::ParticleStore;
use crate::prng::Xorshift64;
use crate::scene::SceneSetup;
use crate::sprite::SpriteImage;
use crate::theme::{ResolvedTheme, ThemeSource};

/// Folds an optional 64-bit config seed into a noise seed.
pub fn noise_seed(seed: Option<u64>) -> u32 {
    match seed {
        Some(s) => (s ^ (s >> 32)) as u32,
        None => DEFAULT_NOISE_SEED,
    }
}

pub struct Backdrop {
    config: BackdropConfig,
    theme: ResolvedTheme,
    scene: SceneSetup,
    sprite: SpriteImage,
    field: Box<dyn FieldSource>,
    injected_field: bool,
    store: ParticleStore,
    integrator: FlowIntegrator,
    placement_seed: u64,
}

impl Backdrop {
    /// Builds a backdrop over the curl-noise field.
    ///
    /// `placement_seed` lays out the initial particles; the noise seed comes
    /// from `config.seed`.
    pub fn new(
        config: BackdropConfig,
        theme: &dyn ThemeSource,
        placement_seed: u64,
    ) -> Result<Self, EngineError> {
        let field = Box::new(CurlField::new(noise_seed(config.seed)));
        Self::build(config, theme, placement_seed, field, false)
    }

    /// Builds a backdrop over a caller-supplied field.
    pub fn with_field(
        config: BackdropConfig,
        theme: &dyn ThemeSource,
        placement_seed: u64,
        field: Box<dyn FieldSource>,
    ) -> Result<Self, EngineError> {
        Self::build(config, theme, placement_seed, field, true)
    }

    fn build(
        config: BackdropConfig,
        theme: &dyn ThemeSource,
        placement_seed: u64,
        field: Box<dyn FieldSource>,
        injected_field: bool,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let theme = ResolvedTheme::resolve(theme);
        let scene = SceneSetup::from_config(&config, &theme);
        let sprite = SpriteImage::default();
        let store = ParticleStore::new(
            config.count,
            config.bounds()?,
            &mut Xorshift64::new(placement_seed),
        )?;
        let integrator = FlowIntegrator::new((&config).into());
        log::debug!(
            "backdrop built: {} particles, color {}, glow {}",
            config.count,
            theme.color_string(config.color_mode),
            config.glow
        );
        Ok(Self {
            config,
            theme,
            scene,
            sprite,
            field,
            injected_field,
            store,
            integrator,
            placement_seed,
        })
    }

    /// Advances every particle by one frame.
    pub fn frame(&mut self, dt: f64, elapsed: f64) {
        self.integrator
            .step(&mut self.store, self.field.as_ref(), dt, elapsed);
    }

    /// Flat position triples for upload.
    pub fn positions(&self) -> &[f32] {
        self.store.positions()
    }

    /// Whether positions changed since the last call; clears the flag.
    pub fn take_needs_upload(&mut self) -> bool {
        self.store.take_needs_upload()
    }

    /// Applies new options.
    ///
    /// Returns `Ok(false)` when `config` equals the current one. Particle
    /// storage is reallocated only when the count or bounds change; the
    /// material is always rebuilt. On error the backdrop is left untouched.
    pub fn reconfigure(&mut self, config: BackdropConfig) -> Result<bool, EngineError> {
        if config == self.config {
            return Ok(false);
        }
        config.validate()?;

        if self.config.needs_realloc(&config) {
            self.store = ParticleStore::new(
                config.count,
                config.bounds()?,
                &mut Xorshift64::new(self.placement_seed),
            )?;
            log::debug!("particles reallocated: {}", config.count);
        }
        if !self.injected_field && config.seed != self.config.seed {
            self.field = Box::new(CurlField::new(noise_seed(config.seed)));
        }
        self.integrator = FlowIntegrator::new((&config).into());
        self.scene = SceneSetup::from_config(&config, &self.theme);
        self.store.mark_needs_upload();
        self.config = config;
        Ok(true)
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    pub fn theme(&self) -> &ResolvedTheme {
        &self.theme
    }

    pub fn scene(&self) -> &SceneSetup {
        &self.scene
    }

    pub fn sprite(&self) -> &SpriteImage {
        &self.sprite
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Mutable access for hosts that place particles by hand.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }
}

impl Animation for Backdrop {
    fn frame(&mut self, dt: f64, elapsed: f64) {
        Backdrop::frame(self, dt, elapsed);
    }

    fn positions(&self) -> &[f32] {
        Backdrop::positions(self)
    }

    fn params(&self) -> Value {
        self.config.to_json()
    }

    fn param_schema(&self) -> Value {
        BackdropConfig::param_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_source::ConstantField;
    use crate::scene::BlendMode;
    use crate::theme::{ColorMode, NoTheme};

    fn small() -> BackdropConfig {
        BackdropConfig {
            count: 16,
            ..Default::default()
        }
    }

    #[test]
    fn default_build_allocates_count_particles() {
        let b = Backdrop::new(BackdropConfig::default(), &NoTheme, 1).unwrap();
        assert_eq!(b.positions().len(), 1200 * 3);
        assert_eq!(b.theme().mix, "rgb(102,228,152)");
        assert_eq!(b.scene().material.blend, BlendMode::Additive);
    }

    #[test]
    fn invalid_config_is_rejected_at_build() {
        let config = BackdropConfig {
            count: 0,
            ..Default::default()
        };
        assert!(matches!(
            Backdrop::new(config, &NoTheme, 1),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn constant_field_end_to_end() {
        let config = BackdropConfig {
            count: 2,
            speed: 0.1,
            smoothing: 1.0,
            max_frame_dt: 1.0,
            ..Default::default()
        };
        let field = Box::new(ConstantField { u: 1.0, v: 0.0 });
        let mut b = Backdrop::with_field(config, &NoTheme, 3, field).unwrap();
        b.store_mut().set_position(0, 0.0, 0.0);
        b.frame(1.0, 0.0);
        let (x, y) = b.store().position(0);
        assert!((x - 0.1).abs() < 1e-6);
        assert_eq!(y, 0.0);
        assert!(b.take_needs_upload());
        assert!(!b.take_needs_upload());
    }

    #[test]
    fn same_seeds_replay_identically() {
        let mut a = Backdrop::new(small(), &NoTheme, 77).unwrap();
        let mut b = Backdrop::new(small(), &NoTheme, 77).unwrap();
        for i in 0..20 {
            let t = i as f64 / 60.0;
            a.frame(1.0 / 60.0, t);
            b.frame(1.0 / 60.0, t);
        }
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn unchanged_config_is_a_no_op() {
        let mut b = Backdrop::new(small(), &NoTheme, 1).unwrap();
        b.frame(0.016, 0.0);
        let before = b.positions().to_vec();
        assert!(!b.reconfigure(small()).unwrap());
        assert_eq!(b.positions(), &before[..]);
    }

    #[test]
    fn count_change_reallocates() {
        let mut b = Backdrop::new(small(), &NoTheme, 1).unwrap();
        let changed = b
            .reconfigure(BackdropConfig {
                count: 40,
                ..small()
            })
            .unwrap();
        assert!(changed);
        assert_eq!(b.store().len(), 40);
        assert_eq!(b.config().count, 40);
    }

    #[test]
    fn material_change_keeps_particles() {
        let mut b = Backdrop::new(small(), &NoTheme, 1).unwrap();
        b.frame(0.016, 0.5);
        let before = b.positions().to_vec();
        let changed = b
            .reconfigure(BackdropConfig {
                glow: false,
                color_mode: ColorMode::Accent,
                ..small()
            })
            .unwrap();
        assert!(changed);
        assert_eq!(b.positions(), &before[..]);
        assert_eq!(b.scene().material.blend, BlendMode::Normal);
        assert_eq!(b.scene().material.opacity, 0.9);
        assert_eq!(b.scene().material.color.to_hex(), "#a7f3d0");
    }

    #[test]
    fn rejected_reconfigure_leaves_state_untouched() {
        let mut b = Backdrop::new(small(), &NoTheme, 1).unwrap();
        let err = b.reconfigure(BackdropConfig {
            speed: -1.0,
            count: 3,
            ..small()
        });
        assert!(err.is_err());
        assert_eq!(b.config(), &small());
        assert_eq!(b.store().len(), 16);
    }

    #[test]
    fn noise_seed_folds_and_defaults() {
        assert_eq!(noise_seed(None), DEFAULT_NOISE_SEED);
        assert_eq!(noise_seed(Some(5)), 5);
        assert_eq!(noise_seed(Some(1 << 32)), 1);
    }

    #[test]
    fn animation_params_are_the_config() {
        let b = Backdrop::new(small(), &NoTheme, 1).unwrap();
        let anim: &dyn Animation = &b;
        assert_eq!(anim.params()["count"], 16);
        assert_eq!(anim.point_count(), 16);
        assert!(anim.param_schema().get("dotSize").is_some());
    }
}
