//! Domain edges and markers leaving the domain.

use super::Domain;
use crate::core_types::{MarkerId, Point};
use crate::error::TopologyError;
use crate::simulation::EntityKey;
use tracing::debug;

impl Domain {
    /// The four domain edges, clockwise from the west edge: SW→NW, NW→NE, NE→SE,
    /// SE→SW.
    pub fn frontiers(&self) -> [(Point, Point); 4] {
        [0, 1, 2, 3].map(|side| self.bounds.side(side))
    }

    /// Where segment `a`-`b` crosses the domain edge, with the edge index.
    pub fn find_intersection_with_frontiers(&self, a: &Point, b: &Point) -> Option<(Point, usize)> {
        self.bounds.intersect_segment(a, b)
    }

    /// Clockwise distance along the domain edge from `from` (on edge `from_side`)
    /// to `to` (on edge `to_side`).
    pub fn distance_along_frontier(
        &self,
        from: &Point,
        from_side: usize,
        to: &Point,
        to_side: usize,
    ) -> f64 {
        let start = self.bounds.perimeter_position(from, from_side);
        let end = self.bounds.perimeter_position(to, to_side);
        (end - start).rem_euclid(self.bounds.perimeter())
    }

    pub fn is_in_domain(&self, p: &Point) -> bool {
        self.grid.locate(p).is_some()
    }

    pub fn cell_is_in_outer_halo(&self, index: usize) -> bool {
        self.grid.is_in_outer_halo(index)
    }

    pub fn cell_is_in_inner_halo(&self, index: usize) -> bool {
        self.grid.is_in_inner_halo(index)
    }

    /// Freezes a marker whose next step would leave the domain: it becomes final at
    /// its current location and is no longer scheduled.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn stop_outgoing_marker(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let m = self.perimeter.marker_mut(id)?;
        m.make_final();
        m.update_time = f64::INFINITY;
        let (atom, location) = (m.atom_id, m.location);
        self.schedule.drop_entity_events(EntityKey::Marker(id));
        debug!(
            "Marker {} stopped at the domain edge ({:.1}, {:.1})",
            atom, location.x, location.y
        );
        Ok(())
    }
}
