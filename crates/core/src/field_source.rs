//! Flow field sampling.
//!
//! A [`FieldSource`] returns a 2D direction at any `(x, y, t)`. The particle
//! background uses [`CurlField`], the curl of 3D simplex noise, which is
//! divergence-free: particles swirl without collecting at sinks.
//!
//! All implementations are deterministic: same inputs produce the same output.

use noise::{NoiseFn, OpenSimplex};

/// Default noise seed used when the configuration does not pin one.
pub const DEFAULT_NOISE_SEED: u32 = 0x0B5E_55ED;

/// Finite-difference step for the curl derivatives.
pub const CURL_EPSILON: f64 = 0.001;

/// A source of 2D vector values for the particle integrator.
///
/// Returns a `(u, v)` direction at any point in space and time.
/// All implementations must be deterministic: same inputs = same output.
pub trait FieldSource: Send + Sync {
    /// Sample the field at position (x, y) at the given time.
    fn sample(&self, x: f64, y: f64, time: f64) -> (f64, f64);
}

/// Curl of a scalar 3D OpenSimplex noise, with time as the third axis.
///
/// `u = ∂n/∂y`, `v = -∂n/∂x`, each by central difference with step
/// [`CURL_EPSILON`]. The seed table is fixed at construction.
pub struct CurlField {
    noise: OpenSimplex,
    seed: u32,
}

impl CurlField {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: OpenSimplex::new(seed),
            seed,
        }
    }

    /// The seed this field was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The raw scalar noise value the curl is derived from.
    pub fn potential(&self, x: f64, y: f64, time: f64) -> f64 {
        self.noise.get([x, y, time])
    }
}

impl Default for CurlField {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_SEED)
    }
}

impl FieldSource for CurlField {
    fn sample(&self, x: f64, y: f64, time: f64) -> (f64, f64) {
        let e = CURL_EPSILON;
        let dn_dx = (self.potential(x + e, y, time) - self.potential(x - e, y, time)) / (2.0 * e);
        let dn_dy = (self.potential(x, y + e, time) - self.potential(x, y - e, time)) / (2.0 * e);
        // 90° rotation of the gradient
        (dn_dy, -dn_dx)
    }
}

/// A uniform field returning the same vector everywhere.
///
/// Useful for previews and for pinning the integrator in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantField {
    pub u: f64,
    pub v: f64,
}

impl FieldSource for ConstantField {
    fn sample(&self, _x: f64, _y: f64, _time: f64) -> (f64, f64) {
        (self.u, self.v)
    }
}

impl<T: FieldSource + ?Sized> FieldSource for Box<T> {
    fn sample(&self, x: f64, y: f64, time: f64) -> (f64, f64) {
        (**self).sample(x, y, time)
    }
}
