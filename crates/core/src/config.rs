//! Simulation parameters
//!
//! All tunables of the perimeter engine live in [`SimulationParameters`]. The defaults
//! reproduce the reference configuration; override individual fields with struct
//! update syntax:
//!
//! ```rust
//! use firefront_core::config::SimulationParameters;
//!
//! let params = SimulationParameters {
//!     perimeter_resolution: 20.0,
//!     ..Default::default()
//! };
//! assert!(params.validate().is_ok());
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How a marker's outward normal is derived from its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalScheme {
    /// Bisector of the two unit edge directions
    #[default]
    Medians,
    /// Chord from previous to next marker (longer edges weigh more)
    WeightedMedians,
}

/// How a marker's curvature is derived from its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurvatureScheme {
    /// Signed inverse radius of the circle through prev, self and next
    #[default]
    Circumradius,
    /// Turning angle divided by the mean adjacent edge length
    Angle,
}

/// How the burning depth behind a marker is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrontDepthScheme {
    /// March along the inward normal while the raster says "burning"
    #[default]
    NormalDirection,
    /// Keep the depth the marker already carries
    Closest,
}

/// Configuration of a domain and its markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Target spacing between adjacent markers (m)
    pub perimeter_resolution: f64,
    /// Distance a marker travels per update (m)
    pub spatial_increment: f64,
    /// Smallest front depth still considered propagative (m); bounds the raster resolution
    pub minimal_propagative_front_depth: f64,
    /// Cap on the measured front depth (m)
    pub max_front_depth: f64,
    /// Front depth given to ignition markers (m)
    pub initial_front_depth: f64,
    /// Time span (s) over which the ignition area is back-dated
    pub initial_burning_duration: f64,
    /// Flux (W/m²) above which a raster location counts as burning
    pub burning_threshold_flux: f64,
    /// Lower clamp on propagation speed (m/s)
    pub min_speed: f64,
    /// Upper clamp on propagation speed (m/s)
    pub max_speed: f64,
    /// Weight of the new velocity against the previous one (1 = no memory)
    pub relaxation: f64,
    /// Curvature regularisation of marker speeds (0 disables it)
    pub smoothing: f64,
    /// Atmospheric grid cells along x
    pub atmo_nx: usize,
    /// Atmospheric grid cells along y
    pub atmo_ny: usize,
    /// Atmospheric levels (used for the coupling resolution bound)
    pub atmo_nz: usize,
    pub normal_scheme: NormalScheme,
    pub curvature_scheme: CurvatureScheme,
    pub front_depth_scheme: FrontDepthScheme,
    /// Multiplier applied to every speed returned by the propagation model
    pub propagation_speed_adjustment_factor: f64,
    /// Segments longer than `split_factor × perimeter_resolution` get refined
    pub split_factor: f64,
    /// Markers closer than `merge_factor × perimeter_resolution` collide
    pub merge_factor: f64,
    /// Upper bound on `spatial_increment / perimeter_resolution`
    pub spatial_cfl_max: f64,
    /// Registered name of the propagation model
    pub propagation_model: String,
    /// Registered name of the flux model
    pub flux_model: String,
    /// Speed of the isotropic model (m/s)
    pub iso_speed: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            perimeter_resolution: 40.0,
            spatial_increment: 2.0,
            minimal_propagative_front_depth: 10.0,
            max_front_depth: 200.0,
            initial_front_depth: 20.0,
            initial_burning_duration: 30.0,
            burning_threshold_flux: 10.0,
            min_speed: 0.005,
            max_speed: 10.0,
            relaxation: 0.5,
            smoothing: 1.0,
            atmo_nx: 100,
            atmo_ny: 100,
            atmo_nz: 20,
            normal_scheme: NormalScheme::Medians,
            curvature_scheme: CurvatureScheme::Circumradius,
            front_depth_scheme: FrontDepthScheme::NormalDirection,
            propagation_speed_adjustment_factor: 1.0,
            split_factor: 2.0,
            merge_factor: 0.9,
            spatial_cfl_max: 0.3,
            propagation_model: "Iso".to_string(),
            flux_model: "HeatFluxBasic".to_string(),
            iso_speed: 1.0,
        }
    }
}

impl SimulationParameters {
    /// Distance above which a segment between two markers is refined.
    pub fn split_distance(&self) -> f64 {
        self.split_factor * self.perimeter_resolution
    }

    /// Distance below which two markers collide.
    pub fn merge_distance(&self) -> f64 {
        self.merge_factor * self.perimeter_resolution
    }

    /// Ratio of spatial increment to perimeter resolution, capped by `spatial_cfl_max`.
    pub fn spatial_cfl(&self) -> f64 {
        (self.spatial_increment / self.perimeter_resolution).min(self.spatial_cfl_max)
    }

    /// Checks value ranges and the split/merge hysteresis band.
    ///
    /// # Errors
    /// Returns the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("perimeter_resolution", self.perimeter_resolution),
            ("spatial_increment", self.spatial_increment),
            (
                "minimal_propagative_front_depth",
                self.minimal_propagative_front_depth,
            ),
            ("max_front_depth", self.max_front_depth),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("spatial_cfl_max", self.spatial_cfl_max),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::new(
                    name,
                    format!("must be finite and positive, got {value}"),
                ));
            }
        }
        if self.initial_front_depth < 0.0 || self.initial_burning_duration < 0.0 {
            return Err(ConfigError::new(
                "initial_front_depth",
                "ignition depth and duration must not be negative",
            ));
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::new(
                "min_speed",
                format!("{} exceeds max_speed {}", self.min_speed, self.max_speed),
            ));
        }
        if !(0.0..=1.0).contains(&self.relaxation) || self.relaxation == 0.0 {
            return Err(ConfigError::new(
                "relaxation",
                format!("must lie in (0, 1], got {}", self.relaxation),
            ));
        }
        if !(self.smoothing.is_finite() && self.smoothing >= 0.0) {
            return Err(ConfigError::new(
                "smoothing",
                format!("must be finite and not negative, got {}", self.smoothing),
            ));
        }
        if self.atmo_nx == 0 || self.atmo_ny == 0 || self.atmo_nz == 0 {
            return Err(ConfigError::new("atmo_nx", "grid dimensions must be non-zero"));
        }
        if !(self.merge_factor > 0.0 && self.merge_factor < self.split_factor / 2.0) {
            return Err(ConfigError::new(
                "merge_factor",
                format!(
                    "must be positive and below half of split_factor ({}), got {}",
                    self.split_factor, self.merge_factor
                ),
            ));
        }
        if self.propagation_speed_adjustment_factor < 0.0 {
            return Err(ConfigError::new(
                "propagation_speed_adjustment_factor",
                "must not be negative",
            ));
        }
        Ok(())
    }
}
