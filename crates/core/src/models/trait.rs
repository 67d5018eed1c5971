//! Model capability traits
//!
//! The engine depends on exactly two functions from the physics layer: a rate of
//! spread for a marker, and a heat flux at a location given its arrival time. Any
//! concrete model (isotropic, wind-driven, fuel-based) plugs in behind these traits.

use crate::core_types::Point;
use crate::perimeter::Marker;

/// Rate-of-spread capability
pub trait PropagationModel: Send + Sync {
    /// Name under which the model is registered
    fn name(&self) -> &str;

    /// Normal propagation speed (m/s) of the perimeter at `marker`.
    ///
    /// The marker carries its location, outward normal, curvature and front depth.
    fn speed_for_marker(&self, marker: &Marker) -> f64;
}

/// Surface flux capability
pub trait FluxModel: Send + Sync {
    /// Name under which the model is registered
    fn name(&self) -> &str;

    /// Mean flux (W/m²) at `location` over `[begin, end]` for a surface that
    /// ignited at `arrival`.
    ///
    /// # Arguments
    ///
    /// * `location` - Query point
    /// * `begin` - Start of the averaging window (s)
    /// * `end` - End of the averaging window (s); equal to `begin` for an instantaneous value
    /// * `arrival` - Arrival time of the fire at `location` (s), `+inf` if unburnt
    fn value_at(&self, location: &Point, begin: f64, end: f64, arrival: f64) -> f64;
}
