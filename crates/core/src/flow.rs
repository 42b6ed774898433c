//! Per-frame particle update.
//!
//! Each frame every particle samples the flow field at its phase-shifted
//! position, eases its velocity toward `field * speed`, advances by the
//! clamped time step, and wraps to the opposite edge when it leaves the
//! bounds. The update is in place and allocation-free.

use crate::config::BackdropConfig;
use crate::field_source::FieldSource;
use crate::particles::ParticleStore;

/// Tunables for [`FlowIntegrator`], copied out of a [`BackdropConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    /// Field-to-velocity multiplier.
    pub speed: f64,
    /// Fraction of the gap to the target velocity closed per frame.
    pub smoothing: f64,
    /// Scale on phase-shifted positions before sampling.
    pub noise_scale: f64,
    /// Scale on the phase-shifted noise clock before sampling.
    pub time_scale: f64,
    /// Noise clock units per second of elapsed time.
    pub clock_rate: f64,
    /// Largest step applied in one frame, in seconds.
    pub max_frame_dt: f64,
}

impl From<&BackdropConfig> for FlowParams {
    fn from(c: &BackdropConfig) -> Self {
        Self {
            speed: c.speed,
            smoothing: c.smoothing,
            noise_scale: c.noise_scale,
            time_scale: c.time_scale,
            clock_rate: c.clock_rate,
            max_frame_dt: c.max_frame_dt,
        }
    }
}

impl Default for FlowParams {
    fn default() -> Self {
        Self::from(&BackdropConfig::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowIntegrator {
    params: FlowParams,
}

impl FlowIntegrator {
    pub fn new(params: FlowParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FlowParams {
        &self.params
    }

    /// The step actually applied for a frame delta of `dt` seconds.
    ///
    /// Negative and NaN deltas become 0; large ones are capped at
    /// `max_frame_dt` so a stalled tab does not teleport particles.
    pub fn clamp_dt(&self, dt: f64) -> f64 {
        if dt.is_nan() || dt <= 0.0 {
            return 0.0;
        }
        dt.min(self.params.max_frame_dt)
    }

    /// Advances every particle by one frame.
    ///
    /// `elapsed` is seconds since the animation started and drives the noise
    /// clock. Flags the store's position buffer for upload.
    pub fn step<F: FieldSource + ?Sized>(
        &self,
        store: &mut ParticleStore,
        field: &F,
        dt: f64,
        elapsed: f64,
    ) {
        let p = &self.params;
        let d = self.clamp_dt(dt);
        let t = elapsed * p.clock_rate;
        let bounds = store.bounds();
        let (bx, by) = (bounds.x as f64, bounds.y as f64);

        let (positions, velocities, offsets) = store.split_mut();
        for ((pos, vel), off) in positions
            .chunks_exact_mut(3)
            .zip(velocities.chunks_exact_mut(2))
            .zip(offsets.chunks_exact(3))
        {
            let mut x = pos[0] as f64;
            let mut y = pos[1] as f64;

            let (u, v) = field.sample(
                (x + off[0] as f64) * p.noise_scale,
                (y + off[1] as f64) * p.noise_scale,
                (t + off[2] as f64) * p.time_scale,
            );

            let (tx, ty) = (u * p.speed, v * p.speed);
            let vx = storable(vel[0] as f64 + (tx - vel[0] as f64) * p.smoothing, tx);
            let vy = storable(vel[1] as f64 + (ty - vel[1] as f64) * p.smoothing, ty);

            x += vx * d;
            y += vy * d;

            // wrap to the opposite edge, exactly on the boundary;
            // a non-finite coordinate restarts at the low edge
            if !x.is_finite() || x > bx {
                x = -bx;
            } else if x < -bx {
                x = bx;
            }
            if !y.is_finite() || y > by {
                y = -by;
            } else if y < -by {
                y = by;
            }

            vel[0] = vx as f32;
            vel[1] = vy as f32;
            pos[0] = x as f32;
            pos[1] = y as f32;
        }

        store.mark_needs_upload();
    }
}

/// `v` if it survives narrowing to the f32 velocity buffer, else the
/// target velocity, else rest.
fn storable(v: f64, target: f64) -> f64 {
    if (v as f32).is_finite() {
        v
    } else if (target as f32).is_finite() {
        target
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_source::{ConstantField, CurlField};
    use crate::particles::Bounds;
    use crate::prng::Xorshift64;

    fn store(count: usize) -> ParticleStore {
        ParticleStore::new(count, Bounds::default(), &mut Xorshift64::new(42)).unwrap()
    }

    fn unit_params() -> FlowParams {
        FlowParams {
            speed: 0.1,
            smoothing: 1.0,
            max_frame_dt: 1.0,
            ..FlowParams::default()
        }
    }

    #[test]
    fn one_step_in_constant_field_moves_by_speed_times_dt() {
        let mut s = store(2);
        s.set_position(0, 0.0, 0.0);
        let integrator = FlowIntegrator::new(unit_params());
        integrator.step(&mut s, &ConstantField { u: 1.0, v: 0.0 }, 1.0, 0.0);

        let (vx, vy) = s.velocity(0);
        assert!((vx - 0.1).abs() < 1e-6, "vx = {vx}");
        assert_eq!(vy, 0.0);
        let (x, y) = s.position(0);
        assert!((x - 0.1).abs() < 1e-6, "x = {x}");
        assert_eq!(y, 0.0);
    }

    #[test]
    fn velocity_eases_toward_target() {
        let mut s = store(1);
        let integrator = FlowIntegrator::new(FlowParams {
            speed: 1.0,
            smoothing: 0.06,
            ..FlowParams::default()
        });
        let field = ConstantField { u: 1.0, v: -1.0 };
        integrator.step(&mut s, &field, 0.0, 0.0);
        let (vx, vy) = s.velocity(0);
        assert!((vx - 0.06).abs() < 1e-6);
        assert!((vy + 0.06).abs() < 1e-6);
        integrator.step(&mut s, &field, 0.0, 0.0);
        let (vx, _) = s.velocity(0);
        // 0.06 + (1 - 0.06) * 0.06
        assert!((vx - 0.1164).abs() < 1e-6, "vx = {vx}");
    }

    #[test]
    fn zero_dt_changes_velocity_but_not_position() {
        let mut s = store(8);
        let before = s.positions().to_vec();
        FlowIntegrator::new(unit_params()).step(&mut s, &ConstantField { u: 1.0, v: 1.0 }, 0.0, 0.0);
        assert_eq!(s.positions(), &before[..]);
        assert!(s.velocity(0).0 > 0.0);
    }

    #[test]
    fn large_dt_is_clamped_to_max_frame_dt() {
        let field = ConstantField { u: 0.5, v: 0.25 };
        let integrator = FlowIntegrator::default();
        let mut a = store(16);
        let mut b = a.clone();
        integrator.step(&mut a, &field, 5.0, 0.0);
        integrator.step(&mut b, &field, 1.0 / 30.0, 0.0);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn negative_and_nan_dt_apply_no_motion() {
        let integrator = FlowIntegrator::default();
        assert_eq!(integrator.clamp_dt(-0.5), 0.0);
        assert_eq!(integrator.clamp_dt(f64::NAN), 0.0);
        assert_eq!(integrator.clamp_dt(0.01), 0.01);
        assert_eq!(integrator.clamp_dt(f64::INFINITY), 1.0 / 30.0);
    }

    #[test]
    fn crossing_the_right_edge_wraps_to_exactly_the_left_edge() {
        let mut s = store(1);
        s.set_position(0, 6.0, 0.0);
        let integrator = FlowIntegrator::new(FlowParams {
            speed: 0.01,
            ..unit_params()
        });
        integrator.step(&mut s, &ConstantField { u: 1.0, v: 0.0 }, 1.0, 0.0);
        assert_eq!(s.position(0).0, -6.0);
    }

    #[test]
    fn crossing_each_edge_wraps_to_the_opposite_one() {
        let integrator = FlowIntegrator::new(unit_params());
        let cases = [
            ((-6.0, 0.0), (-1.0, 0.0), (6.0, 0.0)),
            ((0.0, 3.5), (0.0, 1.0), (0.0, -3.5)),
            ((0.0, -3.5), (0.0, -1.0), (0.0, 3.5)),
        ];
        for ((x0, y0), (u, v), expected) in cases {
            let mut s = store(1);
            s.set_position(0, x0, y0);
            integrator.step(&mut s, &ConstantField { u, v }, 1.0, 0.0);
            assert_eq!(s.position(0), expected, "from ({x0}, {y0})");
        }
    }

    #[test]
    fn wrap_preserves_velocity_and_offsets() {
        let mut s = store(1);
        s.set_position(0, 5.99, 0.0);
        let offsets = s.offset(0);
        let integrator = FlowIntegrator::new(unit_params());
        integrator.step(&mut s, &ConstantField { u: 1.0, v: 0.0 }, 1.0, 0.0);
        assert_eq!(s.position(0).0, -6.0);
        assert_eq!(s.velocity(0), (0.1, 0.0));
        assert_eq!(s.offset(0), offsets);
    }

    #[test]
    fn overflowing_speed_keeps_particles_finite_and_in_bounds() {
        let mut s = store(4);
        let integrator = FlowIntegrator::new(FlowParams {
            speed: 1e40,
            ..FlowParams::default()
        });
        let field = ConstantField { u: 1.0, v: 0.0 };
        for frame in 0..5 {
            integrator.step(&mut s, &field, 1.0 / 60.0, frame as f64 / 60.0);
            for i in 0..s.len() {
                let (x, y) = s.position(i);
                let (vx, vy) = s.velocity(i);
                assert!(Bounds::default().contains(x, y), "frame {frame}: ({x}, {y})");
                assert!(vx.is_finite() && vy.is_finite(), "frame {frame}: ({vx}, {vy})");
            }
        }
    }

    #[test]
    fn non_finite_position_restarts_at_the_low_edge() {
        let mut s = store(1);
        s.set_position(0, f32::NAN, f32::INFINITY);
        FlowIntegrator::new(unit_params()).step(&mut s, &ConstantField { u: 0.0, v: 0.0 }, 1.0, 0.0);
        assert_eq!(s.position(0), (-6.0, -3.5));
    }

    #[test]
    fn step_flags_upload() {
        let mut s = store(4);
        s.take_needs_upload();
        FlowIntegrator::default().step(&mut s, &CurlField::default(), 0.016, 1.0);
        assert!(s.take_needs_upload());
    }

    #[test]
    fn field_is_sampled_at_phase_shifted_scaled_coordinates() {
        struct EchoField;
        impl FieldSource for EchoField {
            // echo the sample coordinates as the field value
            fn sample(&self, x: f64, y: f64, _time: f64) -> (f64, f64) {
                (x, y)
            }
        }
        let mut s = store(1);
        s.set_position(0, 1.0, 2.0);
        let (ox, oy, _) = s.offset(0);
        let integrator = FlowIntegrator::new(FlowParams {
            speed: 1.0,
            smoothing: 1.0,
            noise_scale: 0.5,
            ..FlowParams::default()
        });
        integrator.step(&mut s, &EchoField, 0.0, 0.0);
        let (vx, vy) = s.velocity(0);
        let ex = ((1.0 + ox as f64) * 0.5) as f32;
        let ey = ((2.0 + oy as f64) * 0.5) as f32;
        assert!((vx - ex).abs() < 1e-3, "{vx} vs {ex}");
        assert!((vy - ey).abs() < 1e-3, "{vy} vs {ey}");
    }

    #[test]
    fn curl_flow_is_deterministic() {
        let field = CurlField::new(5);
        let integrator = FlowIntegrator::default();
        let mut a = store(64);
        let mut b = store(64);
        for frame in 0..30 {
            let elapsed = frame as f64 / 60.0;
            integrator.step(&mut a, &field, 1.0 / 60.0, elapsed);
            integrator.step(&mut b, &field, 1.0 / 60.0, elapsed);
        }
        assert_eq!(a.positions(), b.positions());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn particles_stay_inside_bounds(
                seed: u64,
                frames in 1_usize..60,
                dt in 0.0_f64..1.0,
                field_seed: u32,
            ) {
                let bounds = Bounds::default();
                let mut s = ParticleStore::new(32, bounds, &mut Xorshift64::new(seed)).unwrap();
                let field = CurlField::new(field_seed);
                let integrator = FlowIntegrator::new(FlowParams {
                    speed: 5.0,
                    ..FlowParams::default()
                });
                for f in 0..frames {
                    integrator.step(&mut s, &field, dt, f as f64 * dt);
                }
                for i in 0..s.len() {
                    let (x, y) = s.position(i);
                    prop_assert!(bounds.contains(x, y), "particle {} escaped to ({}, {})", i, x, y);
                }
            }
        }
    }
}
