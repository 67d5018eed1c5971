//! Neighbour queries through the cell grid.

use super::Domain;
use crate::core_types::{planar_distance, MarkerId, Point};
use crate::error::TopologyError;

impl Domain {
    /// Markers that may collide with `id`: live, mergeable and closer than
    /// `distance`, nearest first.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn potential_merging_markers(
        &self,
        id: MarkerId,
        distance: f64,
    ) -> Result<Vec<(MarkerId, f64)>, TopologyError> {
        let m = self.perimeter.marker(id)?;
        let Some(cell) = m.cell.or_else(|| self.grid.locate(&m.location)) else {
            return Ok(Vec::new());
        };
        let mut found: Vec<(MarkerId, f64)> = Vec::new();
        for index in self.grid.neighbourhood(cell, distance) {
            let Some(c) = self.grid.cell(index) else {
                continue;
            };
            for other in c.markers() {
                if other == id {
                    continue;
                }
                let Some(o) = self.perimeter.markers.get(other) else {
                    continue;
                };
                if !o.merge_allowed() {
                    continue;
                }
                let d = planar_distance(&m.location, &o.location);
                if d < distance {
                    found.push((other, d));
                }
            }
        }
        found.sort_by(|a, b| {
            a.1.total_cmp(&b.1).then_with(|| {
                let ka = self.perimeter.markers.get(a.0).map(|m| m.atom_id);
                let kb = self.perimeter.markers.get(b.0).map(|m| m.atom_id);
                ka.cmp(&kb)
            })
        });
        Ok(found)
    }

    /// Nearest marker within the merge distance that `id` should collide with.
    ///
    /// Neighbours are skipped while the front cannot spare a marker.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn closest_merge_candidate(
        &self,
        id: MarkerId,
    ) -> Result<Option<MarkerId>, TopologyError> {
        let m = self.perimeter.marker(id)?;
        let spare = m
            .front
            .and_then(|f| self.perimeter.fronts.get(f))
            .is_some_and(|f| f.marker_count > 3);
        let candidates = self.potential_merging_markers(id, self.params.merge_distance())?;
        Ok(candidates
            .into_iter()
            .map(|(other, _)| other)
            .find(|&other| spare || (m.next != Some(other) && m.prev != Some(other))))
    }

    /// Every marker within `distance` of `location`.
    pub fn markers_within(&self, location: &Point, distance: f64) -> Vec<MarkerId> {
        self.collect_within(location, distance, false)
    }

    /// Physical markers within `distance` of `location`, ignoring the outer halo
    /// cells shared with neighbouring domains.
    pub fn physical_markers_within(&self, location: &Point, distance: f64) -> Vec<MarkerId> {
        self.collect_within(location, distance, true)
    }

    fn collect_within(&self, location: &Point, distance: f64, physical: bool) -> Vec<MarkerId> {
        let Some(cell) = self.grid.locate(location) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for index in self.grid.neighbourhood(cell, distance) {
            if physical && self.grid.is_in_outer_halo(index) {
                continue;
            }
            let Some(c) = self.grid.cell(index) else {
                continue;
            };
            for id in c.markers() {
                let Some(m) = self.perimeter.markers.get(id) else {
                    continue;
                };
                if physical && !m.state.is_physical() {
                    continue;
                }
                if planar_distance(location, &m.location) <= distance {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Marker closest to `location` among those within `distance`.
    pub fn closest_marker(&self, location: &Point, distance: f64) -> Option<MarkerId> {
        self.markers_within(location, distance)
            .into_iter()
            .filter_map(|id| {
                self.perimeter
                    .markers
                    .get(id)
                    .map(|m| (id, planar_distance(location, &m.location)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}
