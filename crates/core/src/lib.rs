//! Fire Front Simulation Core Library
//!
//! A Lagrangian wildfire perimeter engine. Fire fronts are closed loops of markers
//! advancing along their outward normal at the rate of spread given by a pluggable
//! propagation model. A discrete-event scheduler moves each marker on its own
//! clock, the perimeter graph is repaired as fronts collide or stretch, and the
//! swept area is rasterised into an arrival-time map.
//!
//! ## Layout
//!
//! - [`simulation`] - time-stamped entities, the event schedule and the run loop
//! - [`perimeter`] - markers, fronts and the cyclic graph surgery between them
//! - [`grid`] - cells bucketing markers and holding the arrival-time raster
//! - [`domain`] - the [`Domain`] tying it all together: stepping, topology repair,
//!   burning scans, safe-mode recovery and the coupling exchange
//! - [`models`] - propagation and flux capabilities with their registry
//! - [`coupling`] - message channels and the coupling context
//!
//! ## Example
//!
//! ```
//! use firefront_core::{Domain, Point, SimulationParameters};
//!
//! let params = SimulationParameters {
//!     atmo_nx: 10,
//!     atmo_ny: 10,
//!     ..Default::default()
//! };
//! let mut domain = Domain::new(
//!     0,
//!     Point::new(0.0, 0.0, 0.0),
//!     Point::new(1000.0, 1000.0, 0.0),
//!     0.0,
//!     params,
//! )?;
//! let front = domain.start_fire(Point::new(500.0, 500.0, 0.0), 0.0)?;
//! domain.step_to(60.0)?;
//! assert!(domain.perimeter().area(front) > 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core_types;
pub mod coupling;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod models;
pub mod perimeter;
pub mod simulation;

// Re-export core types
pub use core_types::{AtomId, FrontId, MarkerId, Point};

pub use config::{CurvatureScheme, FrontDepthScheme, NormalScheme, SimulationParameters};
pub use coupling::{CouplingContext, LocalBus, LocalEndpoint, MessageChannel};
pub use domain::{DataLayer, Domain, DomainSnapshot, FrontSnapshot, MarkerInit, MarkerSnapshot};
pub use error::{ConfigError, CouplingError, ModelError, StepError, TopologyError};
pub use geometry::BoundingBox;
pub use models::{BasicHeatFlux, FluxModel, IsotropicSpeed, ModelRegistry, PropagationModel};
pub use perimeter::{Front, Marker, MarkerState, Perimeter};
pub use simulation::{EntityKey, Event, EventKind, EventSchedule, Simulator, TimeStamped, World};
