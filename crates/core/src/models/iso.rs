//! Isotropic, constant rate of spread.

use super::r#trait::PropagationModel;
use crate::perimeter::Marker;

/// Same speed everywhere, in every direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsotropicSpeed {
    /// Rate of spread (m/s)
    pub speed: f64,
}

impl IsotropicSpeed {
    pub const NAME: &'static str = "Iso";

    pub fn new(speed: f64) -> Self {
        Self { speed }
    }
}

impl Default for IsotropicSpeed {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl PropagationModel for IsotropicSpeed {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn speed_for_marker(&self, _marker: &Marker) -> f64 {
        self.speed
    }
}
