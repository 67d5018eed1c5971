//! Discrete-event simulation engine
//!
//! [`EventSchedule`] orders pending activations, [`Simulator`] drains it up to a
//! target time, and [`World`] is the seam through which the simulator reaches the
//! entities it activates.

mod entity;
mod schedule;
mod simulator;

pub use entity::{EntityKey, TimeStamped, World};
pub use schedule::{Event, EventKind, EventSchedule};
pub use simulator::Simulator;
