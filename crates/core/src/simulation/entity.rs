//! Time-stamped entity contract.
//!
//! Every schedulable object carries a current `time`, the `update_time` at which it
//! wants to be activated next, and a globally unique [`AtomId`]. Activation runs four
//! phases in order: `input`, `update`, `time_advance`, `output`. The phases are
//! dispatched by a [`World`] that owns the entities, so handlers can reach the rest of
//! the domain (cells, raster, other markers) without back-pointers.

use super::schedule::EventSchedule;
use crate::core_types::{AtomId, FrontId, MarkerId};

/// State shared by every schedulable entity.
pub trait TimeStamped {
    fn atom_id(&self) -> AtomId;
    fn time(&self) -> f64;
    fn set_time(&mut self, time: f64);
    /// Next activation time; `+inf` when the entity is inert.
    fn update_time(&self) -> f64;
    fn set_update_time(&mut self, time: f64);

    /// True once the entity no longer wants to be activated.
    fn is_inert(&self) -> bool {
        self.update_time() == f64::INFINITY
    }
}

/// Address of a schedulable entity inside a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// The domain itself
    Domain,
    Front(FrontId),
    Marker(MarkerId),
}

/// Owner of schedulable entities, driven by [`super::Simulator`].
///
/// Handlers must not block and are never called concurrently.
pub trait World {
    type Error;

    fn schedule(&self) -> &EventSchedule;
    fn schedule_mut(&mut self) -> &mut EventSchedule;

    fn input(&mut self, entity: EntityKey) -> Result<(), Self::Error>;
    fn update(&mut self, entity: EntityKey) -> Result<(), Self::Error>;
    fn time_advance(&mut self, entity: EntityKey) -> Result<(), Self::Error>;
    fn output(&mut self, entity: EntityKey) -> Result<(), Self::Error>;

    /// Time at which `entity` wants its next activation. Entities that no longer
    /// exist report `+inf`, which makes the schedule drop their event.
    fn next_update_time(&self, entity: EntityKey) -> f64;
}
