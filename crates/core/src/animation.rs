//! The `Animation` trait driven by every host loop.
//!
//! The trait is object-safe; the CLI preview drives its frame loop through
//! `&mut dyn Animation` without knowing the concrete type.

use serde_json::Value;

/// A frame-driven point animation.
///
/// Hosts call [`frame`](Animation::frame) once per display refresh and then
/// read [`positions`](Animation::positions) to draw.
pub trait Animation {
    /// Advances by one display frame.
    ///
    /// `dt` is seconds since the previous frame, `elapsed` seconds since the
    /// animation started.
    fn frame(&mut self, dt: f64, elapsed: f64);

    /// Flat `x, y, z` triples, one per point.
    fn positions(&self) -> &[f32];

    /// Current option values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing every option, its type, range, and default.
    fn param_schema(&self) -> Value;

    /// Number of points drawn.
    fn point_count(&self) -> usize {
        self.positions().len() / 3
    }
}
