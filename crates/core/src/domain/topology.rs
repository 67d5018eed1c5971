//! Topology maintenance: collisions, stretching and front surgery.
//!
//! Two markers closer than the merge distance collide. Neighbours in a front that
//! can spare a marker coalesce into one; non-neighbours of the same front pinch it
//! into two fronts; markers of different fronts join their fronts into one. A
//! segment longer than the split distance is refined with interpolated markers.
//! Fronts left with fewer than three markers are removed.

use super::{Domain, MarkerInit};
use crate::core_types::{lerp, planar_distance, FrontId, MarkerId};
use crate::error::TopologyError;
use crate::perimeter::MarkerState;
use tracing::{debug, warn};

/// Smallest marker count of a front that still encloses an area.
const MIN_FRONT_MARKERS: usize = 3;

impl Domain {
    /// Checks the neighbourhood of a marker after it moved and repairs what the
    /// move broke. In safe topology mode only degenerate cycles are handled.
    ///
    /// # Errors
    /// [`TopologyError::OpenChain`] when exactly one of the marker's links is missing.
    pub fn check_topology(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let Some(m) = self.perimeter.markers.get(id) else {
            return Ok(());
        };
        let (prev, next, atom, front) = (m.prev, m.next, m.atom_id, m.front);
        let merge_allowed = m.merge_allowed();
        match (prev, next) {
            (None, None) => {
                warn!("Marker {} lost both neighbours, discarding it", atom);
                return self.trash_marker(id);
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(TopologyError::OpenChain { marker: atom });
            }
            (Some(p), Some(n)) if p == n => {
                debug!("Marker {} closes a degenerate cycle", atom);
                return match front {
                    Some(front) => self.trash_front(front),
                    None => self.trash_marker(id),
                };
            }
            _ => {}
        }
        if self.safe_topology_mode {
            return Ok(());
        }

        if merge_allowed {
            if let Some(other) = self.closest_merge_candidate(id)? {
                return self.merge(id, other);
            }
        }

        let mut inserted = self.split_segment(id)?;
        if let Some(prev) = self.perimeter.marker(id)?.prev {
            inserted.extend(self.split_segment(prev)?);
        }
        if !inserted.is_empty() {
            debug!("Refined around marker {} with {} markers", atom, inserted.len());
        }
        Ok(())
    }

    /// Resolves a collision between `a` and `b`.
    ///
    /// # Errors
    /// Fails for stale handles or broken links around the collision.
    pub fn merge(&mut self, a: MarkerId, b: MarkerId) -> Result<(), TopologyError> {
        let ma = self.perimeter.marker(a)?;
        let mb = self.perimeter.marker(b)?;
        let (fa, fb) = match (ma.front, mb.front) {
            (Some(fa), Some(fb)) => (fa, fb),
            _ => {
                return Err(TopologyError::FrontMismatch {
                    first: ma.atom_id,
                    second: mb.atom_id,
                })
            }
        };
        let adjacent = ma.next == Some(b) || ma.prev == Some(b);
        if fa != fb {
            return self.merge_fronts(a, b).map(|_| ());
        }
        if adjacent {
            return self.coalesce(a, b);
        }
        self.split_front(a, b).map(|_| ())
    }

    /// Merges neighbour `b` into `a`: `a` moves to the midpoint and `b` is dropped.
    fn coalesce(&mut self, a: MarkerId, b: MarkerId) -> Result<(), TopologyError> {
        let (la, va, da) = {
            let m = self.perimeter.marker(a)?;
            (m.location, m.velocity, m.front_depth)
        };
        let (lb, vb, db, front) = {
            let m = self.perimeter.marker(b)?;
            (m.location, m.velocity, m.front_depth, m.front)
        };
        self.perimeter.marker_mut(a)?.state = MarkerState::Merging;
        self.trash_marker(b)?;
        let midpoint = lerp(&la, &lb, 0.5);
        if !self.relocate_marker(a, midpoint)? {
            self.stop_outgoing_marker(a)?;
        }
        {
            let m = self.perimeter.marker_mut(a)?;
            m.velocity = lerp(&va, &vb, 0.5);
            m.next_location = m.location;
            m.front_depth = 0.5 * (da + db);
            if m.state == MarkerState::Merging {
                m.state = MarkerState::Moving;
            }
        }
        if let Some(front) = front {
            self.trash_if_degenerate(front)?;
        }
        Ok(())
    }

    /// Pinches the front of `a` and `b` into two fronts and drops the pinch
    /// markers. Returns the front created by the cut, unless it degenerated.
    ///
    /// # Errors
    /// Fails when the markers are neighbours or in different fronts.
    pub fn split_front(
        &mut self,
        a: MarkerId,
        b: MarkerId,
    ) -> Result<Option<FrontId>, TopologyError> {
        let m = self.perimeter.marker(a)?;
        let front = m
            .front
            .ok_or(TopologyError::Detached { marker: m.atom_id })?;
        let atom = self.next_atom();
        let created = self.perimeter.cut(a, b, atom)?;
        self.trash_marker(a)?;
        self.trash_marker(b)?;
        self.trash_if_degenerate(front)?;
        let survived = self.trash_if_degenerate(created)?;
        debug!("Front split, new front {}", atom);
        Ok(survived.then_some(created))
    }

    /// Joins the fronts of `a` and `b` and drops the junction markers. Returns the
    /// surviving front, unless it degenerated.
    ///
    /// # Errors
    /// Fails when the markers share a front.
    pub fn merge_fronts(
        &mut self,
        a: MarkerId,
        b: MarkerId,
    ) -> Result<Option<FrontId>, TopologyError> {
        let survivor = self.perimeter.splice(a, b)?;
        self.trash_marker(a)?;
        self.trash_marker(b)?;
        let survived = self.trash_if_degenerate(survivor)?;
        if survived {
            self.perimeter.update_orientation(survivor)?;
            debug!(
                "Fronts merged into {}",
                self.perimeter.front(survivor)?.atom_id
            );
        }
        Ok(survived.then_some(survivor))
    }

    /// Refines the segment from `id` to its successor with evenly spaced markers so
    /// no piece exceeds the split distance. Returns the inserted markers.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn split_segment(&mut self, id: MarkerId) -> Result<Vec<MarkerId>, TopologyError> {
        let split_distance = self.params.split_distance();
        let m = self.perimeter.marker(id)?;
        let (Some(next), Some(front)) = (m.next, m.front) else {
            return Ok(Vec::new());
        };
        if next == id {
            return Ok(Vec::new());
        }
        let n = self.perimeter.marker(next)?;
        if !(m.split_allowed() || n.split_allowed()) {
            return Ok(Vec::new());
        }
        let distance = planar_distance(&m.location, &n.location);
        if distance <= split_distance {
            return Ok(Vec::new());
        }

        let pieces = (distance / split_distance).ceil() as usize;
        let (la, lb) = (m.location, n.location);
        let (va, vb) = (m.velocity, n.velocity);
        let (da, db) = (m.front_depth, n.front_depth);
        let (ka, kb) = (m.curvature, n.curvature);
        let time = m.time;

        let state = m.state;
        if state.is_physical() {
            self.perimeter.marker_mut(id)?.state = MarkerState::Splitting;
        }
        let mut inserted = Vec::with_capacity(pieces - 1);
        let mut after = id;
        for k in 1..pieces {
            let s = k as f64 / pieces as f64;
            let init = MarkerInit::new(lerp(&la, &lb, s), time)
                .velocity(lerp(&va, &vb, s))
                .front_depth(da + s * (db - da))
                .curvature(ka + s * (kb - ka));
            after = self.add_marker(front, Some(after), init)?;
            inserted.push(after);
        }
        self.perimeter.marker_mut(id)?.state = state;
        Ok(inserted)
    }

    /// Removes `front` when it no longer encloses an area. Returns whether it
    /// survived.
    fn trash_if_degenerate(&mut self, front: FrontId) -> Result<bool, TopologyError> {
        let Some(f) = self.perimeter.fronts.get(front) else {
            return Ok(false);
        };
        if front == self.perimeter.root() {
            return Ok(true);
        }
        if f.marker_count < MIN_FRONT_MARKERS {
            debug!(
                "Front {} down to {} markers, removing it",
                f.atom_id, f.marker_count
            );
            self.trash_front(front)?;
            return Ok(false);
        }
        self.perimeter.update_orientation(front)?;
        Ok(true)
    }

    /// Removes every front whose cycle is broken or too small. Returns how many
    /// fronts were removed.
    pub fn validate_topology(&mut self) -> usize {
        let mut removed = 0;
        for front in self.all_fronts() {
            let Some(f) = self.perimeter.fronts.get(front) else {
                continue;
            };
            let atom = f.atom_id;
            let valid = f.marker_count >= MIN_FRONT_MARKERS && self.perimeter.is_closed(front);
            if valid {
                continue;
            }
            warn!("Front {} failed validation, removing it", atom);
            if let Err(err) = self.trash_front(front) {
                warn!("Could not remove front {}: {}", atom, err);
                continue;
            }
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{polygon_front, test_domain};
    use super::*;
    use crate::core_types::Point;

    #[test]
    fn test_adjacent_collision_coalesces() {
        let mut domain = test_domain();
        let (front, ids) = polygon_front(
            &mut domain,
            &[
                (100.0, 100.0),
                (100.0, 300.0),
                (300.0, 300.0),
                (300.0, 100.0),
                (120.0, 100.0),
            ],
        );
        domain.check_topology(ids[0]).unwrap();
        assert_eq!(domain.front(front).unwrap().marker_count(), 4);
        assert!(domain.marker(ids[0]).is_ok());
        assert!(domain.marker(ids[4]).is_err());
        let survivor = domain.marker(ids[0]).unwrap().location();
        assert!((survivor.x - 110.0).abs() < 1e-9);
        assert!(domain.perimeter().is_closed(front));
    }

    #[test]
    fn test_triangle_neighbours_do_not_coalesce() {
        let mut domain = test_domain();
        let (front, ids) =
            polygon_front(&mut domain, &[(100.0, 100.0), (110.0, 120.0), (120.0, 100.0)]);
        domain.check_topology(ids[0]).unwrap();
        assert_eq!(domain.front(front).unwrap().marker_count(), 3);
    }

    #[test]
    fn test_stretch_inserts_markers() {
        let mut domain = test_domain();
        let (front, ids) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (300.0, 300.0), (300.0, 100.0)],
        );
        domain.check_topology(ids[0]).unwrap();
        // 200 m sides at an 80 m bound: two markers on each side of ids[0]
        assert_eq!(domain.front(front).unwrap().marker_count(), 8);
        let bound = domain.params().split_distance();
        let m = domain.marker(ids[0]).unwrap();
        let next = domain.marker(m.next().unwrap()).unwrap();
        let prev = domain.marker(m.prev().unwrap()).unwrap();
        assert!(planar_distance(&m.location(), &next.location()) <= bound);
        assert!(planar_distance(&m.location(), &prev.location()) <= bound);
        assert!((next.location().x - 100.0).abs() < 1e-9);
        assert!(domain.perimeter().is_closed(front));
    }

    #[test]
    fn test_pinch_cuts_front() {
        let mut domain = test_domain();
        // hourglass: two lobes whose waist markers are 10 m apart
        let (front, ids) = polygon_front(
            &mut domain,
            &[
                (100.0, 100.0),
                (100.0, 250.0),
                (195.0, 200.0),
                (100.0, 350.0),
                (100.0, 500.0),
                (300.0, 500.0),
                (300.0, 350.0),
                (205.0, 200.0),
                (300.0, 250.0),
                (300.0, 100.0),
            ],
        );
        domain.merge(ids[2], ids[7]).unwrap();
        assert_eq!(domain.perimeter().front_count(), 2);
        assert_eq!(domain.front(front).unwrap().marker_count(), 4);
        for f in domain.all_fronts() {
            assert!(domain.perimeter().is_closed(f));
            assert_eq!(domain.front(f).unwrap().marker_count(), 4);
        }
    }

    #[test]
    fn test_pinched_ring_keeps_unburnt_island() {
        let mut domain = test_domain();
        // ring around a square island, open by a 10 m slit at the bottom
        let (front, ids) = polygon_front(
            &mut domain,
            &[
                (295.0, 100.0),
                (100.0, 100.0),
                (100.0, 500.0),
                (500.0, 500.0),
                (500.0, 100.0),
                (305.0, 100.0),
                (305.0, 200.0),
                (400.0, 200.0),
                (400.0, 400.0),
                (200.0, 400.0),
                (200.0, 200.0),
                (295.0, 200.0),
            ],
        );
        domain.merge(ids[6], ids[11]).unwrap();

        assert_eq!(domain.perimeter().front_count(), 2);
        let outline = domain.front(front).unwrap();
        assert_eq!(outline.marker_count(), 6);
        assert!(outline.is_expanding());
        assert_eq!(outline.inner_fronts().len(), 1);
        let island = outline.inner_fronts()[0];
        let island_front = domain.front(island).unwrap();
        assert_eq!(island_front.marker_count(), 4);
        assert!(!island_front.is_expanding());
        assert_eq!(island_front.parent(), Some(front));
        assert_eq!(domain.top_level_fronts(), vec![front]);

        domain.burning_scan(5.0);
        assert_eq!(domain.arrival_time_at(&Point::new(150.0, 150.0, 0.0)), 5.0);
        assert!(domain
            .arrival_time_at(&Point::new(300.0, 300.0, 0.0))
            .is_infinite());
    }

    #[test]
    fn test_pinch_then_reconnect_restores_one_front() {
        let mut domain = test_domain();
        let (_, ids) = polygon_front(
            &mut domain,
            &[
                (100.0, 100.0),
                (100.0, 250.0),
                (195.0, 200.0),
                (100.0, 350.0),
                (100.0, 500.0),
                (300.0, 500.0),
                (300.0, 350.0),
                (205.0, 200.0),
                (300.0, 250.0),
                (300.0, 100.0),
            ],
        );
        domain.merge(ids[2], ids[7]).unwrap();
        assert_eq!(domain.perimeter().front_count(), 2);
        assert_ne!(
            domain.marker(ids[1]).unwrap().front(),
            domain.marker(ids[6]).unwrap().front()
        );

        domain.merge(ids[1], ids[6]).unwrap();
        assert_eq!(domain.perimeter().front_count(), 1);
        let survivor = domain.top_level_fronts()[0];
        assert!(domain.perimeter().is_closed(survivor));
        assert!(domain.front(survivor).unwrap().is_expanding());

        let cycle = domain.perimeter().cycle(survivor).unwrap();
        let start = cycle.iter().position(|&id| id == ids[0]).unwrap();
        let from_first: Vec<MarkerId> =
            cycle[start..].iter().chain(&cycle[..start]).copied().collect();
        assert_eq!(from_first, vec![ids[0], ids[3], ids[4], ids[5], ids[8], ids[9]]);
    }

    #[test]
    fn test_collision_between_fronts_joins_them() {
        let mut domain = test_domain();
        let (left, a) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (195.0, 300.0), (195.0, 100.0)],
        );
        let (right, b) = polygon_front(
            &mut domain,
            &[(205.0, 100.0), (205.0, 300.0), (400.0, 300.0), (400.0, 100.0)],
        );
        domain.merge(a[2], b[0]).unwrap();
        assert_eq!(domain.perimeter().front_count(), 1);
        let survivor = if domain.front(left).is_ok() { left } else { right };
        assert_eq!(domain.front(survivor).unwrap().marker_count(), 6);
        assert!(domain.perimeter().is_closed(survivor));
    }

    #[test]
    fn test_degenerate_cycle_removed() {
        let mut domain = test_domain();
        let (front, ids) =
            polygon_front(&mut domain, &[(100.0, 100.0), (110.0, 120.0), (120.0, 100.0)]);
        domain.trash_marker(ids[2]).unwrap();
        domain.check_topology(ids[0]).unwrap();
        assert!(domain.front(front).is_err());
        assert_eq!(domain.perimeter().marker_count(), 0);
    }

    #[test]
    fn test_safe_mode_skips_refinement() {
        let mut domain = test_domain();
        let (front, ids) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (300.0, 300.0), (300.0, 100.0)],
        );
        domain.set_safe_topology_mode(true);
        domain.check_topology(ids[0]).unwrap();
        assert_eq!(domain.front(front).unwrap().marker_count(), 4);
    }

    #[test]
    fn test_validate_removes_broken_fronts() {
        let mut domain = test_domain();
        let (front, ids) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (300.0, 300.0), (300.0, 100.0)],
        );
        domain.perimeter.marker_mut(ids[1]).unwrap().next = None;
        assert_eq!(domain.validate_topology(), 1);
        assert!(domain.front(front).is_err());
    }
}
