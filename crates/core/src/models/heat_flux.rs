//! Top-hat surface heat flux.
//!
//! A location releases `nominal_flux` for `burning_duration` seconds after the fire
//! arrives, and nothing before or after. Window queries return the mean over the
//! overlap of the window with the burning interval.

use super::r#trait::FluxModel;
use crate::core_types::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicHeatFlux {
    /// Time a location keeps burning after arrival (s)
    pub burning_duration: f64,
    /// Flux released while burning (W/m²)
    pub nominal_flux: f64,
}

impl BasicHeatFlux {
    pub const NAME: &'static str = "HeatFluxBasic";
}

impl Default for BasicHeatFlux {
    fn default() -> Self {
        Self {
            burning_duration: 300.0,
            nominal_flux: 1.0e6,
        }
    }
}

impl FluxModel for BasicHeatFlux {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn value_at(&self, _location: &Point, begin: f64, end: f64, arrival: f64) -> f64 {
        if !arrival.is_finite() || end < arrival {
            return 0.0;
        }
        let extinction = arrival + self.burning_duration;
        if end <= begin {
            // instantaneous query
            return if begin >= arrival && begin <= extinction {
                self.nominal_flux
            } else {
                0.0
            };
        }
        let overlap = (end.min(extinction) - begin.max(arrival)).max(0.0);
        self.nominal_flux * overlap / (end - begin)
    }
}
