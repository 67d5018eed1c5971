//! Perimeter markers
//!
//! A [`Marker`] is one Lagrangian sample of the fire perimeter. It carries its
//! kinematic state and the `prev`/`next` handles that link it into the closed cycle
//! of its [`super::Front`].

use crate::core_types::{AtomId, FrontId, MarkerId, Point};
use crate::simulation::TimeStamped;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a marker
///
/// `Init → Moving → {Splitting | Merging | Final}`; `Link` never transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarkerState {
    /// Just created, eligible for integration
    #[default]
    Init,
    /// Steady propagation
    Moving,
    /// A neighbouring segment is being refined
    Splitting,
    /// Colliding with another marker
    Merging,
    /// Domain-boundary stitching point, never integrated
    Link,
    /// Stopped for good (left the domain)
    Final,
}

impl MarkerState {
    /// Whether markers in this state take part in integration and topology changes.
    pub const fn is_physical(self) -> bool {
        !matches!(self, Self::Link | Self::Final)
    }
}

/// One point of a fire perimeter
#[derive(Debug, Clone)]
pub struct Marker {
    pub(crate) atom_id: AtomId,
    /// Current position
    pub(crate) location: Point,
    /// Position the marker will occupy at `update_time`
    pub(crate) next_location: Point,
    pub(crate) velocity: Point,
    /// Outward unit normal computed at the last time advance
    pub(crate) normal: Point,
    pub(crate) time: f64,
    pub(crate) update_time: f64,
    /// Depth of the burning band behind the marker (m)
    pub(crate) front_depth: f64,
    /// Signed curvature, positive where the burnt area is convex (1/m)
    pub(crate) curvature: f64,
    pub(crate) state: MarkerState,
    pub(crate) prev: Option<MarkerId>,
    pub(crate) next: Option<MarkerId>,
    /// Front this marker belongs to
    pub(crate) front: Option<FrontId>,
    /// Flat index of the cell holding the marker, `None` outside the domain
    pub(crate) cell: Option<usize>,
}

impl Marker {
    /// Unlinked marker at rest.
    pub fn new(atom_id: AtomId, location: Point, time: f64) -> Self {
        Self {
            atom_id,
            location,
            next_location: location,
            velocity: Point::zeros(),
            normal: Point::zeros(),
            time,
            update_time: time,
            front_depth: 0.0,
            curvature: 0.0,
            state: MarkerState::Init,
            prev: None,
            next: None,
            front: None,
            cell: None,
        }
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn next_location(&self) -> Point {
        self.next_location
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    pub fn normal(&self) -> Point {
        self.normal
    }

    pub fn front_depth(&self) -> f64 {
        self.front_depth
    }

    pub fn curvature(&self) -> f64 {
        self.curvature
    }

    pub fn state(&self) -> MarkerState {
        self.state
    }

    pub fn prev(&self) -> Option<MarkerId> {
        self.prev
    }

    pub fn next(&self) -> Option<MarkerId> {
        self.next
    }

    pub fn front(&self) -> Option<FrontId> {
        self.front
    }

    pub fn cell(&self) -> Option<usize> {
        self.cell
    }

    /// Link and final markers never take part in collisions.
    pub fn merge_allowed(&self) -> bool {
        self.state.is_physical()
    }

    /// Link and final markers never get their segments refined.
    pub fn split_allowed(&self) -> bool {
        self.state.is_physical()
    }

    pub fn is_final(&self) -> bool {
        self.state == MarkerState::Final
    }

    pub fn is_link(&self) -> bool {
        self.state == MarkerState::Link
    }

    /// Stops the marker where it stands.
    pub(crate) fn make_final(&mut self) {
        self.state = MarkerState::Final;
        self.next_location = self.location;
        self.velocity = Point::zeros();
        self.update_time = f64::INFINITY;
    }
}

impl TimeStamped for Marker {
    fn atom_id(&self) -> AtomId {
        self.atom_id
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    fn update_time(&self) -> f64 {
        self.update_time
    }

    fn set_update_time(&mut self, time: f64) {
        self.update_time = time;
    }
}
