//! Perimeter graph: markers linked into closed cycles, cycles organised in a tree
//!
//! [`Perimeter`] owns both slot maps and every splice on them. It knows nothing about
//! cells, the raster or the schedule; the domain wraps these operations and keeps
//! those in sync.
//!
//! Cycle surgery is done by swapping successors. Swapping the successors of two
//! markers of one cycle cuts it in two ([`Perimeter::cut`]); swapping the successors
//! of two markers of different cycles joins them ([`Perimeter::splice`]). The two
//! are exact inverses.

mod front;
pub mod kinematics;
mod marker;

pub use front::Front;
pub use marker::{Marker, MarkerState};

use crate::core_types::{AtomId, FrontId, MarkerId, Point, LOOP_LIMIT};
use crate::error::TopologyError;
use crate::geometry::{point_in_polygon, signed_area, BoundingBox};
use slotmap::SlotMap;
use tracing::debug;

/// Marker and front maps plus the root of the front tree
#[derive(Debug, Clone)]
pub struct Perimeter {
    pub(crate) markers: SlotMap<MarkerId, Marker>,
    pub(crate) fronts: SlotMap<FrontId, Front>,
    root: FrontId,
}

impl Perimeter {
    pub fn new(root_atom: AtomId, time: f64) -> Self {
        let mut fronts = SlotMap::with_key();
        let root = fronts.insert(Front::new(root_atom, time, None));
        Self {
            markers: SlotMap::with_key(),
            fronts,
            root,
        }
    }

    pub fn root(&self) -> FrontId {
        self.root
    }

    /// # Errors
    /// [`TopologyError::UnknownMarker`] for a stale or foreign handle.
    pub fn marker(&self, id: MarkerId) -> Result<&Marker, TopologyError> {
        self.markers.get(id).ok_or(TopologyError::UnknownMarker(id))
    }

    pub(crate) fn marker_mut(&mut self, id: MarkerId) -> Result<&mut Marker, TopologyError> {
        self.markers
            .get_mut(id)
            .ok_or(TopologyError::UnknownMarker(id))
    }

    /// # Errors
    /// [`TopologyError::UnknownFront`] for a stale or foreign handle.
    pub fn front(&self, id: FrontId) -> Result<&Front, TopologyError> {
        self.fronts.get(id).ok_or(TopologyError::UnknownFront(id))
    }

    pub(crate) fn front_mut(&mut self, id: FrontId) -> Result<&mut Front, TopologyError> {
        self.fronts.get_mut(id).ok_or(TopologyError::UnknownFront(id))
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Number of fronts, root excluded.
    pub fn front_count(&self) -> usize {
        self.fronts.len().saturating_sub(1)
    }

    /// Creates an empty front nested in `parent`.
    ///
    /// # Errors
    /// Fails if `parent` is not a live front.
    pub fn create_front(
        &mut self,
        atom_id: AtomId,
        time: f64,
        parent: FrontId,
    ) -> Result<FrontId, TopologyError> {
        self.front(parent)?;
        let id = self.fronts.insert(Front::new(atom_id, time, Some(parent)));
        self.front_mut(parent)?.inner.push(id);
        Ok(id)
    }

    /// Stores an unlinked marker.
    pub fn insert_marker(&mut self, marker: Marker) -> MarkerId {
        self.markers.insert(marker)
    }

    /// Links `id` into `front` right after `after`, or at the tail of the chain
    /// (just before the head of a closed cycle) when `after` is `None`.
    ///
    /// # Errors
    /// Fails for unknown handles, for the root front, or when `after` belongs to
    /// another front.
    pub fn link_marker(
        &mut self,
        front: FrontId,
        id: MarkerId,
        after: Option<MarkerId>,
    ) -> Result<(), TopologyError> {
        if front == self.root {
            return Err(TopologyError::RootFront);
        }
        self.marker(id)?;
        let after = match after {
            Some(prev) => {
                let prev_marker = self.marker(prev)?;
                if prev_marker.front != Some(front) {
                    return Err(TopologyError::FrontMismatch {
                        first: prev_marker.atom_id,
                        second: self.marker(id)?.atom_id,
                    });
                }
                Some(prev)
            }
            None => self.chain_tail(front)?,
        };

        match after {
            Some(prev) => {
                let next = self.marker(prev)?.next;
                {
                    let m = self.marker_mut(id)?;
                    m.prev = Some(prev);
                    m.next = next;
                }
                self.marker_mut(prev)?.next = Some(id);
                if let Some(next) = next {
                    self.marker_mut(next)?.prev = Some(id);
                }
            }
            None => {
                let m = self.marker_mut(id)?;
                m.prev = None;
                m.next = None;
                self.front_mut(front)?.head = Some(id);
            }
        }
        self.marker_mut(id)?.front = Some(front);
        self.front_mut(front)?.marker_count += 1;
        Ok(())
    }

    /// Last marker of the chain starting at the head (the head's predecessor for a
    /// closed cycle), `None` for an empty front.
    fn chain_tail(&self, front: FrontId) -> Result<Option<MarkerId>, TopologyError> {
        let Some(head) = self.front(front)?.head else {
            return Ok(None);
        };
        let mut current = head;
        for _ in 0..LOOP_LIMIT {
            match self.marker(current)?.next {
                None => return Ok(Some(current)),
                Some(next) if next == head => return Ok(Some(current)),
                Some(next) => current = next,
            }
        }
        Err(self.broken(front, LOOP_LIMIT))
    }

    /// Unlinks `id` from its front, reconnecting its neighbours.
    ///
    /// # Errors
    /// Fails for unknown handles.
    pub fn unlink_marker(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let (prev, next, front) = {
            let m = self.marker(id)?;
            (m.prev.filter(|&p| p != id), m.next.filter(|&n| n != id), m.front)
        };
        if let Some(prev) = prev {
            if let Some(p) = self.markers.get_mut(prev) {
                p.next = next;
            }
        }
        if let Some(next) = next {
            if let Some(n) = self.markers.get_mut(next) {
                n.prev = prev;
            }
        }
        if let Some(front) = front {
            if let Some(f) = self.fronts.get_mut(front) {
                f.marker_count = f.marker_count.saturating_sub(1);
                if f.head == Some(id) {
                    f.head = next.or(prev);
                }
                if f.marker_count == 0 {
                    f.head = None;
                }
            }
        }
        let m = self.marker_mut(id)?;
        m.prev = None;
        m.next = None;
        m.front = None;
        Ok(())
    }

    /// Unlinks and drops a marker, returning it.
    ///
    /// # Errors
    /// Fails for unknown handles.
    pub fn remove_marker(&mut self, id: MarkerId) -> Result<Marker, TopologyError> {
        self.unlink_marker(id)?;
        self.markers.remove(id).ok_or(TopologyError::UnknownMarker(id))
    }

    /// Links the chain's tail back to its head.
    ///
    /// # Errors
    /// Fails for unknown handles or a chain that loops without reaching its end.
    pub fn close_front(&mut self, front: FrontId) -> Result<(), TopologyError> {
        let Some(head) = self.front(front)?.head else {
            return Ok(());
        };
        if let Some(tail) = self.chain_tail(front)? {
            self.marker_mut(tail)?.next = Some(head);
            self.marker_mut(head)?.prev = Some(tail);
        }
        self.update_orientation(front)
    }

    /// Markers of a closed front in `next` order starting at the head.
    ///
    /// # Errors
    /// [`TopologyError::BrokenCycle`] when the walk does not return to the head in
    /// exactly `marker_count` steps, [`TopologyError::OpenChain`] on a missing link.
    pub fn cycle(&self, front: FrontId) -> Result<Vec<MarkerId>, TopologyError> {
        let f = self.front(front)?;
        let Some(head) = f.head else {
            return Ok(Vec::new());
        };
        let walked = self.walk_cycle(head)?;
        if walked.len() != f.marker_count {
            return Err(self.broken(front, walked.len()));
        }
        Ok(walked)
    }

    /// Follows `next` from `start` back to `start`.
    ///
    /// # Errors
    /// [`TopologyError::OpenChain`] on a missing link.
    pub fn walk_cycle(&self, start: MarkerId) -> Result<Vec<MarkerId>, TopologyError> {
        let mut out = vec![start];
        let mut current = start;
        for _ in 0..LOOP_LIMIT {
            let m = self.marker(current)?;
            let next = m.next.ok_or(TopologyError::OpenChain { marker: m.atom_id })?;
            if next == start {
                return Ok(out);
            }
            out.push(next);
            current = next;
        }
        let front = self.marker(start)?.front.unwrap_or(self.root);
        Err(self.broken(front, out.len()))
    }

    /// Markers reachable from the head, tolerating an open chain.
    pub fn chain(&self, front: FrontId) -> Vec<MarkerId> {
        let Some(head) = self.fronts.get(front).and_then(|f| f.head) else {
            return Vec::new();
        };
        let mut out = vec![head];
        let mut current = head;
        while out.len() < LOOP_LIMIT {
            match self.markers.get(current).and_then(|m| m.next) {
                Some(next) if next != head => {
                    out.push(next);
                    current = next;
                }
                _ => break,
            }
        }
        out
    }

    /// Whether walking `next` from the head returns to it in `marker_count` steps.
    pub fn is_closed(&self, front: FrontId) -> bool {
        self.cycle(front).is_ok()
    }

    /// Vertex arrays of a front in chain order.
    pub fn store_vertices(&self, front: FrontId) -> (Vec<f64>, Vec<f64>) {
        self.chain(front)
            .into_iter()
            .filter_map(|id| self.markers.get(id))
            .map(|m| (m.location.x, m.location.y))
            .unzip()
    }

    /// Shoelace area, negative for clockwise (expanding) fronts.
    pub fn signed_area(&self, front: FrontId) -> f64 {
        let (xs, ys) = self.store_vertices(front);
        signed_area(&xs, &ys)
    }

    /// Enclosed area (m²).
    pub fn area(&self, front: FrontId) -> f64 {
        self.signed_area(front).abs()
    }

    /// Recomputes the winding flag from the current vertex positions.
    ///
    /// # Errors
    /// Fails for an unknown front.
    pub fn update_orientation(&mut self, front: FrontId) -> Result<(), TopologyError> {
        let area = self.signed_area(front);
        let f = self.front_mut(front)?;
        if f.marker_count >= 3 && area != 0.0 {
            f.expanding = area < 0.0;
        }
        Ok(())
    }

    /// Bounding box of the front's markers.
    pub fn bounding_box(&self, front: FrontId) -> Option<BoundingBox> {
        let points: Vec<Point> = self
            .chain(front)
            .into_iter()
            .filter_map(|id| self.markers.get(id).map(|m| m.location))
            .collect();
        BoundingBox::from_points(points.iter())
    }

    /// Whether `(x, y)` lies inside the polygon of `front`.
    pub fn contains_point(&self, front: FrontId, x: f64, y: f64) -> bool {
        let (xs, ys) = self.store_vertices(front);
        point_in_polygon(x, y, &xs, &ys)
    }

    /// `ancestor` is `front` or one of its containers.
    pub fn is_ancestor(&self, ancestor: FrontId, front: FrontId) -> bool {
        let mut current = Some(front);
        let mut steps = 0;
        while let Some(f) = current {
            if f == ancestor {
                return true;
            }
            steps += 1;
            if steps > LOOP_LIMIT {
                return false;
            }
            current = self.fronts.get(f).and_then(|f| f.parent);
        }
        false
    }

    /// `front` and everything nested in it, parents before children.
    pub fn descendants(&self, front: FrontId) -> Vec<FrontId> {
        let mut out = Vec::new();
        let mut stack = vec![front];
        while let Some(f) = stack.pop() {
            if let Some(data) = self.fronts.get(f) {
                out.push(f);
                stack.extend(data.inner.iter().rev().copied());
            }
        }
        out
    }

    /// Moves `front` under `parent`.
    ///
    /// # Errors
    /// Fails for unknown handles.
    pub fn reparent(&mut self, front: FrontId, parent: FrontId) -> Result<(), TopologyError> {
        self.front(parent)?;
        let old = self.front(front)?.parent;
        if let Some(old) = old {
            if let Some(old) = self.fronts.get_mut(old) {
                old.remove_inner(front);
            }
        }
        self.front_mut(front)?.parent = Some(parent);
        self.front_mut(parent)?.inner.push(front);
        Ok(())
    }

    /// Removes a front from the tree and the slot map. Its inner fronts move to its
    /// container; markers still linked to it are returned for the caller to drop.
    ///
    /// # Errors
    /// Refuses the root front; fails for unknown handles.
    pub fn remove_front(&mut self, front: FrontId) -> Result<Vec<MarkerId>, TopologyError> {
        if front == self.root {
            return Err(TopologyError::RootFront);
        }
        let markers = self.chain(front);
        let (parent, inner) = {
            let f = self.front(front)?;
            (f.parent.unwrap_or(self.root), f.inner.clone())
        };
        for child in inner {
            self.reparent(child, parent)?;
        }
        if let Some(p) = self.fronts.get_mut(parent) {
            p.remove_inner(front);
        }
        self.fronts.remove(front);
        for &id in &markers {
            if let Some(m) = self.markers.get_mut(id) {
                m.front = None;
            }
        }
        Ok(markers)
    }

    /// Cuts the cycle holding `a` and `b` into two by swapping their successors.
    ///
    /// The part holding the original head keeps the front; the other part becomes a
    /// new front (`new_atom`). When one part winds the other way and lies inside the
    /// other, it is nested there; otherwise both share the old container. Inner
    /// fronts go to the innermost part holding their head. Returns the new front.
    ///
    /// # Errors
    /// Fails when the markers are in different fronts, are neighbours, or a link is
    /// missing.
    pub fn cut(
        &mut self,
        a: MarkerId,
        b: MarkerId,
        new_atom: AtomId,
    ) -> Result<FrontId, TopologyError> {
        let (ma, mb) = (self.marker(a)?, self.marker(b)?);
        let (ida, idb) = (ma.atom_id, mb.atom_id);
        let front = match (ma.front, mb.front) {
            (Some(fa), Some(fb)) if fa == fb => fa,
            _ => {
                return Err(TopologyError::FrontMismatch {
                    first: ida,
                    second: idb,
                })
            }
        };
        let a_next = ma.next.ok_or(TopologyError::OpenChain { marker: ida })?;
        let b_next = mb.next.ok_or(TopologyError::OpenChain { marker: idb })?;
        if a == b || a_next == b || b_next == a {
            return Err(TopologyError::AdjacentMarkers {
                first: ida,
                second: idb,
            });
        }

        self.swap_successors(a, a_next, b, b_next)?;

        let (head, parent, time) = {
            let f = self.front(front)?;
            (f.head, f.parent.unwrap_or(self.root), f.time)
        };
        let cycle_a = self.walk_cycle(a)?;
        let moved = if head.is_some_and(|h| cycle_a.contains(&h)) {
            self.walk_cycle(b)?
        } else {
            cycle_a
        };

        let created = self.create_front(new_atom, time, parent)?;
        for &id in &moved {
            self.marker_mut(id)?.front = Some(created);
        }
        {
            let f = self.front_mut(created)?;
            f.head = moved.first().copied();
            f.marker_count = moved.len();
        }
        {
            let f = self.front_mut(front)?;
            f.marker_count = f.marker_count.saturating_sub(moved.len());
        }
        self.update_orientation(front)?;
        self.update_orientation(created)?;

        let nested = self.nested_piece(front, created, [a, b])?;
        let children = self.front(front)?.inner.clone();
        if let Some((inner, outer)) = nested {
            self.reparent(inner, outer)?;
        }
        for child in children {
            let head_location = self
                .front(child)?
                .head
                .and_then(|h| self.markers.get(h))
                .map(|m| m.location);
            let Some(p) = head_location else {
                continue;
            };
            let target = match nested {
                Some((inner, _)) if self.contains_point(inner, p.x, p.y) => inner,
                Some((_, outer)) => outer,
                None if self.contains_point(created, p.x, p.y) => created,
                None => front,
            };
            if target != front {
                self.reparent(child, target)?;
            }
        }
        debug!(
            "Cut front {} into {} and {} markers",
            self.front(front)?.atom_id,
            self.front(front)?.marker_count,
            moved.len()
        );
        Ok(created)
    }

    /// After a cut, the piece that winds the other way and lies inside the other
    /// piece is a hole (or an island) of it: returns `(inner, outer)`.
    fn nested_piece(
        &self,
        first: FrontId,
        second: FrontId,
        pinch: [MarkerId; 2],
    ) -> Result<Option<(FrontId, FrontId)>, TopologyError> {
        if self.front(first)?.expanding == self.front(second)?.expanding {
            return Ok(None);
        }
        for (inner, outer) in [(first, second), (second, first)] {
            let sample = self
                .cycle(inner)?
                .into_iter()
                .filter(|id| !pinch.contains(id))
                .find_map(|id| self.markers.get(id).map(|m| m.location));
            if let Some(p) = sample {
                if self.contains_point(outer, p.x, p.y) {
                    return Ok(Some((inner, outer)));
                }
            }
        }
        Ok(None)
    }

    /// Joins the cycles holding `a` and `b` by swapping their successors.
    ///
    /// The containing front survives when one front is nested in the other,
    /// otherwise the front of `a` survives. The absorbed front's inner fronts move to
    /// the survivor. Returns the survivor.
    ///
    /// # Errors
    /// Fails when the markers share a front or a link is missing.
    pub fn splice(&mut self, a: MarkerId, b: MarkerId) -> Result<FrontId, TopologyError> {
        let (ma, mb) = (self.marker(a)?, self.marker(b)?);
        let (ida, idb) = (ma.atom_id, mb.atom_id);
        let (fa, fb) = match (ma.front, mb.front) {
            (Some(fa), Some(fb)) if fa != fb => (fa, fb),
            _ => {
                return Err(TopologyError::FrontMismatch {
                    first: ida,
                    second: idb,
                })
            }
        };
        let a_next = ma.next.ok_or(TopologyError::OpenChain { marker: ida })?;
        let b_next = mb.next.ok_or(TopologyError::OpenChain { marker: idb })?;
        let (survivor, absorbed) = if self.is_ancestor(fb, fa) {
            (fb, fa)
        } else {
            (fa, fb)
        };

        self.swap_successors(a, a_next, b, b_next)?;

        let absorbed_count = self.front(absorbed)?.marker_count;
        let (absorbed_parent, absorbed_inner) = {
            let f = self.front(absorbed)?;
            (f.parent, f.inner.clone())
        };
        for child in absorbed_inner {
            self.reparent(child, survivor)?;
        }
        if let Some(parent) = absorbed_parent {
            if let Some(p) = self.fronts.get_mut(parent) {
                p.remove_inner(absorbed);
            }
        }
        self.fronts.remove(absorbed);

        let head = self.front(survivor)?.head.unwrap_or(a);
        for id in self.walk_cycle(head)? {
            self.marker_mut(id)?.front = Some(survivor);
        }
        self.front_mut(survivor)?.marker_count += absorbed_count;
        self.update_orientation(survivor)?;
        debug!(
            "Spliced fronts into {} ({} markers)",
            self.front(survivor)?.atom_id,
            self.front(survivor)?.marker_count
        );
        Ok(survivor)
    }

    fn swap_successors(
        &mut self,
        a: MarkerId,
        a_next: MarkerId,
        b: MarkerId,
        b_next: MarkerId,
    ) -> Result<(), TopologyError> {
        self.marker_mut(a)?.next = Some(b_next);
        self.marker_mut(b_next)?.prev = Some(a);
        self.marker_mut(b)?.next = Some(a_next);
        self.marker_mut(a_next)?.prev = Some(b);
        Ok(())
    }

    fn broken(&self, front: FrontId, walked: usize) -> TopologyError {
        TopologyError::BrokenCycle {
            front: self
                .fronts
                .get(front)
                .map_or_else(AtomId::default, |f| f.atom_id),
            walked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closed front through `points`, returning the front and its markers.
    fn polygon(perimeter: &mut Perimeter, points: &[(f64, f64)]) -> (FrontId, Vec<MarkerId>) {
        let root = perimeter.root();
        let front = perimeter
            .create_front(AtomId::new(0, 1000), 0.0, root)
            .unwrap();
        let mut ids = Vec::new();
        for (k, &(x, y)) in points.iter().enumerate() {
            let id = perimeter.insert_marker(Marker::new(
                AtomId::new(0, k as u64),
                Point::new(x, y, 0.0),
                0.0,
            ));
            perimeter.link_marker(front, id, ids.last().copied()).unwrap();
            ids.push(id);
        }
        perimeter.close_front(front).unwrap();
        (front, ids)
    }

    fn octagon() -> Vec<(f64, f64)> {
        // clockwise
        vec![
            (0.0, 1.0),
            (1.0, 2.0),
            (2.0, 2.0),
            (3.0, 1.0),
            (3.0, 0.0),
            (2.0, -1.0),
            (1.0, -1.0),
            (0.0, 0.0),
        ]
    }

    #[test]
    fn test_closed_front_cycle() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (front, ids) = polygon(&mut perimeter, &octagon());
        assert_eq!(perimeter.cycle(front).unwrap(), ids);
        assert!(perimeter.front(front).unwrap().is_expanding());
        assert_eq!(perimeter.front_count(), 1);
    }

    #[test]
    fn test_link_without_anchor_appends_before_head() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (front, ids) = polygon(&mut perimeter, &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let extra = perimeter.insert_marker(Marker::new(
            AtomId::new(0, 99),
            Point::new(1.0, 0.0, 0.0),
            0.0,
        ));
        perimeter.link_marker(front, extra, None).unwrap();
        let cycle = perimeter.cycle(front).unwrap();
        assert_eq!(cycle, vec![ids[0], ids[1], ids[2], extra]);
    }

    #[test]
    fn test_unlink_keeps_cycle_closed() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (front, ids) = polygon(&mut perimeter, &octagon());
        perimeter.remove_marker(ids[0]).unwrap();
        let cycle = perimeter.cycle(front).unwrap();
        assert_eq!(cycle.len(), 7);
        assert_eq!(perimeter.front(front).unwrap().head(), Some(ids[1]));
    }

    #[test]
    fn test_cut_then_splice_restores_cycle() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (front, ids) = polygon(&mut perimeter, &octagon());

        let created = perimeter
            .cut(ids[1], ids[5], AtomId::new(0, 2000))
            .unwrap();
        let kept = perimeter.cycle(front).unwrap();
        let moved = perimeter.cycle(created).unwrap();
        assert_eq!(kept.len() + moved.len(), 8);
        assert_eq!(perimeter.front_count(), 2);
        assert_eq!(
            perimeter.front(created).unwrap().parent(),
            Some(perimeter.root())
        );

        let survivor = perimeter.splice(ids[1], ids[5]).unwrap();
        let restored = perimeter.cycle(survivor).unwrap();
        assert_eq!(restored.len(), 8);
        let start = restored.iter().position(|&id| id == ids[0]).unwrap();
        let rotated: Vec<MarkerId> = restored[start..]
            .iter()
            .chain(restored[..start].iter())
            .copied()
            .collect();
        assert_eq!(rotated, ids);
        assert_eq!(perimeter.front_count(), 1);
    }

    /// Clockwise square 0..40 with a square hole 10..30 opened to the south by a
    /// 1 m slit. Markers 6 and 11 face each other across the top of the slit.
    fn slit_ring() -> Vec<(f64, f64)> {
        vec![
            (19.5, 0.0),
            (0.0, 0.0),
            (0.0, 40.0),
            (40.0, 40.0),
            (40.0, 0.0),
            (20.5, 0.0),
            (20.5, 10.0),
            (30.0, 10.0),
            (30.0, 30.0),
            (10.0, 30.0),
            (10.0, 10.0),
            (19.5, 10.0),
        ]
    }

    #[test]
    fn test_cut_nests_enclosed_hole() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (front, ids) = polygon(&mut perimeter, &slit_ring());
        let hole = perimeter.cut(ids[6], ids[11], AtomId::new(0, 2000)).unwrap();

        assert_eq!(perimeter.cycle(hole).unwrap().len(), 5);
        assert!(!perimeter.front(hole).unwrap().is_expanding());
        assert!(perimeter.front(front).unwrap().is_expanding());
        assert_eq!(perimeter.front(hole).unwrap().parent(), Some(front));
        assert_eq!(perimeter.front(front).unwrap().inner_fronts(), &[hole]);
    }

    #[test]
    fn test_cut_nests_kept_hole_under_new_outline() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        // same ring, listed from a hole corner so the head stays on the hole
        let mut points = slit_ring();
        points.rotate_left(7);
        let (front, ids) = polygon(&mut perimeter, &points);
        let outline = perimeter.cut(ids[11], ids[4], AtomId::new(0, 2000)).unwrap();

        assert!(perimeter.front(outline).unwrap().is_expanding());
        assert!(!perimeter.front(front).unwrap().is_expanding());
        assert_eq!(perimeter.front(front).unwrap().parent(), Some(outline));
        assert_eq!(
            perimeter.front(outline).unwrap().parent(),
            Some(perimeter.root())
        );
    }

    #[test]
    fn test_cut_rejects_neighbours() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (_, ids) = polygon(&mut perimeter, &octagon());
        let err = perimeter.cut(ids[2], ids[3], AtomId::new(0, 5)).unwrap_err();
        assert!(matches!(err, TopologyError::AdjacentMarkers { .. }));
    }

    #[test]
    fn test_remove_front_reparents_children() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (outer, _) = polygon(&mut perimeter, &octagon());
        let hole = perimeter
            .create_front(AtomId::new(0, 3000), 0.0, outer)
            .unwrap();
        perimeter.remove_front(outer).unwrap();
        assert_eq!(
            perimeter.front(hole).unwrap().parent(),
            Some(perimeter.root())
        );
        assert!(perimeter.remove_front(perimeter.root()).is_err());
    }

    #[test]
    fn test_open_chain_is_not_closed() {
        let mut perimeter = Perimeter::new(AtomId::new(0, 0), 0.0);
        let (front, ids) = polygon(&mut perimeter, &octagon());
        perimeter.marker_mut(ids[4]).unwrap().next = None;
        assert!(!perimeter.is_closed(front));
        assert!(matches!(
            perimeter.cycle(front),
            Err(TopologyError::OpenChain { .. })
        ));
    }
}
