//! Arrival-time raster: burning scans and accessors.
//!
//! Raster vertex `(i, j)` sits at `sw + (i * res_x, j * res_y)` and touches the four
//! raster cells `(i-1, j-1)`, `(i-1, j)`, `(i, j-1)` and `(i, j)`. A burning vertex
//! stamps those cells, keeping the earliest time already recorded.

use super::Domain;
use crate::config::FrontDepthScheme;
use crate::core_types::{FrontId, MarkerId, Point};
use crate::error::TopologyError;
use crate::geometry::{distance_to_polygon, point_in_polygon, BoundingBox};
use crate::perimeter::Perimeter;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Layers exposed to output writers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataLayer {
    ArrivalTime,
    Flux,
    /// Front depth of the closest marker
    FrontDepth,
}

struct Polygon {
    expanding: bool,
    xs: Vec<f64>,
    ys: Vec<f64>,
    bbox: BoundingBox,
    children: Vec<usize>,
}

/// Vertex arrays of every front, nested like the front tree, built once per scan.
pub(crate) struct PolygonSet {
    polygons: Vec<Polygon>,
    roots: Vec<usize>,
}

impl PolygonSet {
    pub(crate) fn build(perimeter: &Perimeter) -> Self {
        let mut set = Self {
            polygons: Vec::new(),
            roots: Vec::new(),
        };
        let top = perimeter
            .front(perimeter.root())
            .map(|f| f.inner_fronts().to_vec())
            .unwrap_or_default();
        set.roots = set.collect(perimeter, &top);
        set
    }

    /// Adds `fronts` and their descendants; degenerate fronts are skipped but their
    /// children are kept at the same level.
    fn collect(&mut self, perimeter: &Perimeter, fronts: &[FrontId]) -> Vec<usize> {
        let mut level = Vec::new();
        for &front in fronts {
            let Ok(f) = perimeter.front(front) else {
                continue;
            };
            let children = f.inner_fronts().to_vec();
            let expanding = f.is_expanding();
            let (xs, ys) = perimeter.store_vertices(front);
            let bbox = perimeter.bounding_box(front);
            match bbox {
                Some(bbox) if xs.len() >= 3 => {
                    let index = self.polygons.len();
                    self.polygons.push(Polygon {
                        expanding,
                        xs,
                        ys,
                        bbox,
                        children: Vec::new(),
                    });
                    let nested = self.collect(perimeter, &children);
                    self.polygons[index].children = nested;
                    level.push(index);
                }
                _ => level.extend(self.collect(perimeter, &children)),
            }
        }
        level
    }

    /// Whether `(x, y)` lies inside an area the fire has reached: the innermost
    /// polygon containing it is expanding.
    pub(crate) fn is_burning(&self, x: f64, y: f64) -> bool {
        self.status_in(&self.roots, x, y).unwrap_or(false)
    }

    fn status_in(&self, list: &[usize], x: f64, y: f64) -> Option<bool> {
        let p = Point::new(x, y, 0.0);
        list.iter().find_map(|&k| {
            let polygon = &self.polygons[k];
            (polygon.bbox.contains(&p) && point_in_polygon(x, y, &polygon.xs, &polygon.ys))
                .then(|| {
                    self.status_in(&polygon.children, x, y)
                        .unwrap_or(polygon.expanding)
                })
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

impl Domain {
    /// Global raster index of the cell holding `p`.
    pub fn raster_index(&self, p: &Point) -> Option<(usize, usize)> {
        let (gx, gy) = self.grid.raster_size();
        let fx = (p.x - self.bounds.sw.x) / self.raster_res_x;
        let fy = (p.y - self.bounds.sw.y) / self.raster_res_y;
        if !(fx >= 0.0 && fy >= 0.0) {
            return None;
        }
        let (ii, jj) = (fx.floor() as usize, fy.floor() as usize);
        (ii < gx && jj < gy).then_some((ii, jj))
    }

    /// Arrival time at a global raster index, `+inf` outside the raster.
    pub fn arrival_time(&self, ii: usize, jj: usize) -> f64 {
        self.grid.arrival_time(ii, jj)
    }

    /// Overwrites an arrival time, ignoring indices outside the raster.
    pub fn set_arrival_time(&mut self, ii: usize, jj: usize, time: f64) {
        self.grid.set_arrival_time(ii, jj, time);
    }

    /// Arrival time of the raster cell holding `p`, `+inf` outside the domain.
    pub fn arrival_time_at(&self, p: &Point) -> f64 {
        self.raster_index(p)
            .map_or(f64::INFINITY, |(ii, jj)| self.grid.arrival_time(ii, jj))
    }

    /// Whether the surface at `p` burns at time `t`. Without a flux model any point
    /// past its arrival time burns.
    pub fn is_burning(&self, p: &Point, t: f64) -> bool {
        let arrival = self.arrival_time_at(p);
        if !(t >= arrival) {
            return false;
        }
        match &self.flux {
            Some(flux) => flux.value_at(p, t, t, arrival) > self.params.burning_threshold_flux,
            None => true,
        }
    }

    /// Value of an output layer at `p`.
    pub fn data_at(&self, layer: DataLayer, p: &Point, t: f64) -> f64 {
        match layer {
            DataLayer::ArrivalTime => self.arrival_time_at(p),
            DataLayer::Flux => {
                let arrival = self.arrival_time_at(p);
                self.flux
                    .as_ref()
                    .map_or(0.0, |flux| flux.value_at(p, t, t, arrival))
            }
            DataLayer::FrontDepth => {
                let radius = self.grid.cell_size().0.max(self.grid.cell_size().1);
                self.closest_marker(p, radius)
                    .and_then(|id| self.perimeter.markers.get(id))
                    .map_or(0.0, |m| m.front_depth)
            }
        }
    }

    /// Rate of spread estimated from the arrival-time gradient around `p`.
    pub fn max_speed_from_raster(&self, p: &Point) -> Option<f64> {
        let (ii, jj) = self.raster_index(p)?;
        let (gx, gy) = self.grid.raster_size();
        let centre = self.grid.arrival_time(ii, jj);
        if !centre.is_finite() {
            return None;
        }
        let slope = |lo: Option<usize>, hi: Option<usize>, along_x: bool| -> f64 {
            let sample = |k: usize| {
                if along_x {
                    self.grid.arrival_time(k, jj)
                } else {
                    self.grid.arrival_time(ii, k)
                }
            };
            let here = if along_x { ii } else { jj };
            let finite = |k: Option<usize>| k.map(&sample).filter(|t| t.is_finite()).zip(k);
            match (finite(lo), finite(hi)) {
                (Some((a, ka)), Some((b, kb))) => (b - a) / (kb - ka) as f64,
                (Some((a, ka)), None) => (centre - a) / (here - ka) as f64,
                (None, Some((b, kb))) => (b - centre) / (kb - here) as f64,
                (None, None) => 0.0,
            }
        };
        let gx_slope = slope(ii.checked_sub(1), (ii + 1 < gx).then_some(ii + 1), true)
            / self.raster_res_x;
        let gy_slope = slope(jj.checked_sub(1), (jj + 1 < gy).then_some(jj + 1), false)
            / self.raster_res_y;
        let gradient = gx_slope.hypot(gy_slope);
        (gradient > 0.0).then(|| 2.0 * self.raster_resolution / gradient)
    }

    /// Smallest rectangle covering the cells whose raster has burnt.
    pub fn active_bounding_box(&self) -> Option<BoundingBox> {
        let corners: Vec<Point> = self
            .grid
            .cells()
            .iter()
            .filter(|c| c.is_active())
            .flat_map(|c| [c.sw(), c.ne()])
            .collect();
        BoundingBox::from_points(&corners)
    }

    /// Burnt surface (m²) at time `t`.
    pub fn burnt_area(&self, t: f64) -> f64 {
        let burnt: usize = self
            .grid
            .cells()
            .iter()
            .map(|c| c.arrival_times().iter().filter(|&&a| a <= t).count())
            .sum();
        burnt as f64 * self.raster_res_x * self.raster_res_y
    }

    /// Raster vertices covered by `bbox`.
    fn vertices_in(&self, bbox: &BoundingBox) -> Vec<(usize, usize)> {
        let (gx, gy) = self.grid.raster_size();
        let first = |lo: f64, origin: f64, res: f64| ((lo - origin) / res).ceil().max(0.0) as usize;
        let last = |hi: f64, origin: f64, res: f64, n: usize| {
            let k = ((hi - origin) / res).floor();
            if k < 0.0 {
                None
            } else {
                Some((k as usize).min(n))
            }
        };
        let i0 = first(bbox.sw.x, self.bounds.sw.x, self.raster_res_x);
        let j0 = first(bbox.sw.y, self.bounds.sw.y, self.raster_res_y);
        let (Some(i1), Some(j1)) = (
            last(bbox.ne.x, self.bounds.sw.x, self.raster_res_x, gx),
            last(bbox.ne.y, self.bounds.sw.y, self.raster_res_y, gy),
        ) else {
            return Vec::new();
        };
        if i0 > i1 || j0 > j1 {
            return Vec::new();
        }
        (i0..=i1)
            .flat_map(|i| (j0..=j1).map(move |j| (i, j)))
            .collect()
    }

    fn touching_cells(i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> {
        [
            (i.checked_sub(1), j.checked_sub(1)),
            (i.checked_sub(1), Some(j)),
            (Some(i), j.checked_sub(1)),
            (Some(i), Some(j)),
        ]
        .into_iter()
        .filter_map(|(a, b)| a.zip(b))
    }

    /// Whether stamping vertex `(i, j)` at `t` could still change the raster.
    fn burn_check(&self, i: usize, j: usize, t: f64) -> bool {
        Self::touching_cells(i, j).any(|(a, b)| self.grid.arrival_time(a, b) > t)
    }

    fn stamp_vertex(&mut self, i: usize, j: usize, t: f64) -> usize {
        Self::touching_cells(i, j)
            .filter(|&(a, b)| self.grid.stamp_earlier(a, b, t))
            .count()
    }

    /// Stamps the raster around every burning vertex inside the bounding box of
    /// `front`, testing vertices against all fronts. Returns the number of raster
    /// cells that changed.
    pub fn front_burning_scan(&mut self, front: FrontId, t: f64) -> usize {
        let set = PolygonSet::build(&self.perimeter);
        self.scan_front_with(&set, front, t)
    }

    /// [`Domain::front_burning_scan`] over every top-level front, sharing one
    /// polygon set.
    pub fn burning_scan(&mut self, t: f64) -> usize {
        let set = PolygonSet::build(&self.perimeter);
        if set.is_empty() {
            return 0;
        }
        self.top_level_fronts()
            .into_iter()
            .map(|front| self.scan_front_with(&set, front, t))
            .sum()
    }

    fn scan_front_with(&mut self, set: &PolygonSet, front: FrontId, t: f64) -> usize {
        let Some(bbox) = self.perimeter.bounding_box(front) else {
            return 0;
        };
        let candidates: Vec<(usize, usize)> = self
            .vertices_in(&bbox)
            .into_iter()
            .filter(|&(i, j)| self.burn_check(i, j, t))
            .collect();
        let (sw, rx, ry) = (self.bounds.sw, self.raster_res_x, self.raster_res_y);
        let burning: Vec<(usize, usize)> = candidates
            .into_par_iter()
            .filter(|&(i, j)| set.is_burning(sw.x + i as f64 * rx, sw.y + j as f64 * ry))
            .collect();
        burning
            .into_iter()
            .map(|(i, j)| self.stamp_vertex(i, j, t))
            .sum()
    }

    /// Ignition scan: vertices inside `front` get an arrival time back-dated in
    /// proportion to their depth inside it, `t - min(d, max_depth) / max_depth * dt`.
    ///
    /// # Errors
    /// Fails for a stale front handle.
    pub fn front_initial_burning_scan(
        &mut self,
        t: f64,
        front: FrontId,
        max_depth: f64,
        dt: f64,
    ) -> Result<usize, TopologyError> {
        self.perimeter.front(front)?;
        let Some(bbox) = self.perimeter.bounding_box(front) else {
            return Ok(0);
        };
        let set = PolygonSet::build(&self.perimeter);
        let (xs, ys) = self.perimeter.store_vertices(front);
        let (sw, rx, ry) = (self.bounds.sw, self.raster_res_x, self.raster_res_y);
        let stamps: Vec<(usize, usize, f64)> = self
            .vertices_in(&bbox)
            .into_par_iter()
            .filter_map(|(i, j)| {
                let (x, y) = (sw.x + i as f64 * rx, sw.y + j as f64 * ry);
                if !set.is_burning(x, y) {
                    return None;
                }
                let arrival = if max_depth > 0.0 {
                    let depth = distance_to_polygon(x, y, &xs, &ys).min(max_depth);
                    t - depth / max_depth * dt
                } else {
                    t
                };
                Some((i, j, arrival))
            })
            .collect();
        Ok(stamps
            .into_iter()
            .map(|(i, j, arrival)| self.stamp_vertex(i, j, arrival))
            .sum())
    }

    /// Local scan around one marker: builds the polygon formed by the stretch of
    /// front inside a small box around the marker closed along the box edges, and
    /// stamps the vertices it covers at the marker's time.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn firenode_burning_scan(&mut self, id: MarkerId) -> Result<usize, TopologyError> {
        let m = self.perimeter.marker(id)?;
        let t = m.time;
        let (Some(prev), Some(next), Some(front)) = (m.prev, m.next, m.front) else {
            return Ok(0);
        };
        let points = [
            self.perimeter.marker(prev)?.location,
            m.location,
            self.perimeter.marker(next)?.location,
        ];
        let Some(bbox) = BoundingBox::from_points(&points) else {
            return Ok(0);
        };
        let bbox = bbox.expanded(2.0 * self.params.spatial_increment);
        let Some((xs, ys, inside_burns)) = self.local_polygon(id, front, &bbox) else {
            return Ok(0);
        };

        let (sw, rx, ry) = (self.bounds.sw, self.raster_res_x, self.raster_res_y);
        let candidates: Vec<(usize, usize)> = self
            .vertices_in(&bbox)
            .into_iter()
            .filter(|&(i, j)| self.burn_check(i, j, t))
            .collect();
        let burning: Vec<(usize, usize)> = candidates
            .into_par_iter()
            .filter(|&(i, j)| {
                point_in_polygon(sw.x + i as f64 * rx, sw.y + j as f64 * ry, &xs, &ys)
                    == inside_burns
            })
            .collect();
        Ok(burning
            .into_iter()
            .map(|(i, j)| self.stamp_vertex(i, j, t))
            .sum())
    }

    /// Polygon made of the markers around `id` that lie inside `bbox`, entering and
    /// leaving through the box edges and closed along them clockwise, so that its
    /// interior is the burnt side of the front. When the whole front fits in the
    /// box the front itself is returned with its orientation flag.
    fn local_polygon(
        &self,
        id: MarkerId,
        front: FrontId,
        bbox: &BoundingBox,
    ) -> Option<(Vec<f64>, Vec<f64>, bool)> {
        let location = |k: MarkerId| self.perimeter.markers.get(k).map(|m| m.location);
        let limit = self.perimeter.front(front).ok()?.marker_count + 1;

        let mut first = id;
        let mut entry_outside = None;
        for _ in 0..limit {
            let prev = self.perimeter.markers.get(first)?.prev?;
            if prev == id {
                break;
            }
            if !bbox.contains(&location(prev)?) {
                entry_outside = Some(prev);
                break;
            }
            first = prev;
        }
        let Some(entry_outside) = entry_outside else {
            let (xs, ys) = self.perimeter.store_vertices(front);
            let expanding = self.perimeter.front(front).ok()?.is_expanding();
            return Some((xs, ys, expanding));
        };

        let mut chain = vec![location(first)?];
        let mut last = first;
        let mut exit_outside = None;
        for _ in 0..limit {
            let next = self.perimeter.markers.get(last)?.next?;
            let p = location(next)?;
            if !bbox.contains(&p) {
                exit_outside = Some(p);
                break;
            }
            chain.push(p);
            last = next;
        }
        let exit_outside = exit_outside?;

        let (entry, entry_side) = bbox.intersect_segment(&location(entry_outside)?, &chain[0])?;
        let (exit, exit_side) = bbox.intersect_segment(&location(last)?, &exit_outside)?;

        let mut points = Vec::with_capacity(chain.len() + 6);
        points.push(entry);
        points.extend(chain);
        points.push(exit);
        let corners = bbox.corners();
        let entry_ahead = entry_side == exit_side
            && bbox.perimeter_position(&entry, entry_side)
                >= bbox.perimeter_position(&exit, exit_side);
        if !entry_ahead {
            let mut side = exit_side;
            for _ in 0..4 {
                side = (side + 1) % 4;
                points.push(corners[side]);
                if side == entry_side {
                    break;
                }
            }
        }
        let (xs, ys) = points.iter().map(|p| (p.x, p.y)).unzip();
        Some((xs, ys, true))
    }

    /// Depth of the burning band behind a marker, marching along its inward normal
    /// and refining by bisection down to the raster resolution.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn compute_front_depth(&self, id: MarkerId) -> Result<f64, TopologyError> {
        let m = self.perimeter.marker(id)?;
        let max_depth = self.params.max_front_depth;
        if self.params.front_depth_scheme == FrontDepthScheme::Closest {
            return Ok(m.front_depth.min(max_depth));
        }
        let mut inward = -m.normal;
        inward.z = 0.0;
        let norm = inward.norm();
        if norm <= 0.0 {
            return Ok(m.front_depth.min(max_depth));
        }
        inward /= norm;

        let resolution = self.raster_resolution;
        let step = (0.1 * m.front_depth).max(resolution);
        let burning_at = |d: f64| self.is_burning(&(m.location + d * inward), m.time);

        let mut inside = 0.0;
        let mut probe = 1.1 * step;
        while probe < max_depth && burning_at(probe) {
            inside = probe;
            probe += step;
        }
        if probe >= max_depth && burning_at(max_depth) {
            return Ok(max_depth);
        }
        let (mut lo, mut hi) = (inside, probe.min(max_depth));
        while hi - lo > resolution {
            let mid = 0.5 * (lo + hi);
            if burning_at(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(lo.min(max_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{polygon_front, test_domain};
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_raster_index_routing() {
        let domain = test_domain();
        assert_eq!(domain.raster_index(&Point::new(15.0, 25.0, 0.0)), Some((1, 2)));
        assert_eq!(domain.raster_index(&Point::new(-1.0, 25.0, 0.0)), None);
        assert_eq!(domain.raster_index(&Point::new(999.0, 999.0, 0.0)), Some((99, 99)));
        assert_eq!(domain.arrival_time_at(&Point::new(15.0, 25.0, 0.0)), f64::INFINITY);
    }

    #[test]
    fn test_scan_stamps_square_interior() {
        let mut domain = test_domain();
        let (front, _) = polygon_front(
            &mut domain,
            &[(105.0, 105.0), (105.0, 195.0), (195.0, 195.0), (195.0, 105.0)],
        );
        let stamped = domain.front_burning_scan(front, 5.0);
        assert!(stamped > 0);
        assert_eq!(domain.arrival_time_at(&Point::new(150.0, 150.0, 0.0)), 5.0);
        assert_eq!(domain.arrival_time_at(&Point::new(50.0, 50.0, 0.0)), f64::INFINITY);
        assert!(domain.is_burning(&Point::new(150.0, 150.0, 0.0), 6.0));
        assert!(!domain.is_burning(&Point::new(150.0, 150.0, 0.0), 4.0));
    }

    #[test]
    fn test_hole_is_not_stamped() {
        let mut domain = test_domain();
        let (outer, _) = polygon_front(
            &mut domain,
            &[(105.0, 105.0), (105.0, 395.0), (395.0, 395.0), (395.0, 105.0)],
        );
        // counter-clockwise inner front: unburnt island
        let hole = domain.add_fire_front(0.0, Some(outer)).unwrap();
        let mut prev = None;
        for (x, y) in [(205.0, 205.0), (295.0, 205.0), (295.0, 295.0), (205.0, 295.0)] {
            let init = super::super::MarkerInit::new(Point::new(x, y, 0.0), 0.0);
            prev = Some(domain.add_marker(hole, prev, init).unwrap());
        }
        domain.complete_front(hole).unwrap();
        assert!(!domain.front(hole).unwrap().is_expanding());

        domain.burning_scan(1.0);
        assert_eq!(domain.arrival_time_at(&Point::new(150.0, 150.0, 0.0)), 1.0);
        assert_eq!(domain.arrival_time_at(&Point::new(250.0, 250.0, 0.0)), f64::INFINITY);
    }

    #[test]
    fn test_earlier_scan_wins() {
        let mut domain = test_domain();
        let (front, _) = polygon_front(
            &mut domain,
            &[(105.0, 105.0), (105.0, 195.0), (195.0, 195.0), (195.0, 105.0)],
        );
        domain.front_burning_scan(front, 5.0);
        assert_eq!(domain.front_burning_scan(front, 9.0), 0);
        assert_eq!(domain.arrival_time_at(&Point::new(150.0, 150.0, 0.0)), 5.0);
    }

    #[test]
    fn test_initial_scan_back_dates_interior() {
        let mut domain = test_domain();
        let (front, _) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (300.0, 300.0), (300.0, 100.0)],
        );
        domain
            .front_initial_burning_scan(100.0, front, 50.0, 30.0)
            .unwrap();
        // deep inside: the full burning duration earlier
        assert_relative_eq!(domain.arrival_time_at(&Point::new(195.0, 195.0, 0.0)), 70.0);
        // one raster cell from the edge: vertex (110, 110) is 10 m deep
        let near_edge = domain.arrival_time_at(&Point::new(105.0, 105.0, 0.0));
        assert!(near_edge > 70.0 && near_edge < 100.0);
    }

    #[test]
    fn test_firenode_scan_stamps_burnt_side() {
        let mut domain = test_domain();
        let (_, ids) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (300.0, 300.0), (300.0, 100.0)],
        );
        // stretch of the left edge: burnt side is +x
        let front = domain.marker(ids[0]).unwrap().front().unwrap();
        let mid = domain
            .add_marker(
                front,
                Some(ids[0]),
                super::super::MarkerInit::new(Point::new(100.0, 200.0, 0.0), 3.0),
            )
            .unwrap();
        domain.split_segment(ids[0]).unwrap();
        domain.split_segment(mid).unwrap();
        let stamped = domain.firenode_burning_scan(mid).unwrap();
        assert!(stamped > 0);
        assert_eq!(domain.arrival_time_at(&Point::new(102.0, 200.0, 0.0)), 3.0);
        assert_eq!(domain.arrival_time_at(&Point::new(85.0, 200.0, 0.0)), f64::INFINITY);
    }

    #[test]
    fn test_front_depth_reaches_burnt_band() {
        let mut domain = test_domain();
        let (front, ids) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 500.0), (500.0, 500.0), (500.0, 100.0)],
        );
        let fresh = domain.add_marker(
            front,
            Some(ids[0]),
            super::super::MarkerInit::new(Point::new(100.0, 300.0, 0.0), 10.0),
        );
        let fresh = fresh.unwrap();
        domain.refresh_geometry(fresh).unwrap();
        domain.front_burning_scan(front, 10.0);
        // only a 50 m band behind the left edge keeps burning
        for ii in 15..100 {
            for jj in 0..100 {
                domain.set_arrival_time(ii, jj, f64::INFINITY);
            }
        }
        let depth = domain.compute_front_depth(fresh).unwrap();
        assert!(depth >= 40.0 && depth <= 60.0, "depth {depth}");
    }

    #[test]
    fn test_active_box_and_area() {
        let mut domain = test_domain();
        assert!(domain.active_bounding_box().is_none());
        domain.set_arrival_time(15, 25, 1.0);
        let bbox = domain.active_bounding_box().unwrap();
        assert_eq!(bbox.sw, Point::new(100.0, 200.0, 0.0));
        assert_eq!(bbox.ne, Point::new(200.0, 300.0, 0.0));
        assert_relative_eq!(domain.burnt_area(2.0), 100.0);
        assert_relative_eq!(domain.burnt_area(0.5), 0.0);
    }

    #[test]
    fn test_speed_from_gradient() {
        let mut domain = test_domain();
        // fire crossing x at 0.5 m/s: arrival = x / 0.5
        for ii in 0..20 {
            for jj in 0..20 {
                let x = (ii as f64 + 0.5) * 10.0;
                domain.set_arrival_time(ii, jj, x / 0.5);
            }
        }
        let speed = domain
            .max_speed_from_raster(&Point::new(55.0, 55.0, 0.0))
            .unwrap();
        // 2 * res / |grad t| with |grad t| = 2 s/m
        assert_relative_eq!(speed, 10.0, epsilon = 1e-9);
        assert!(domain
            .max_speed_from_raster(&Point::new(555.0, 555.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_data_layers() {
        let mut domain = test_domain();
        domain.set_arrival_time(15, 15, 10.0);
        let p = Point::new(155.0, 155.0, 0.0);
        assert_eq!(domain.data_at(DataLayer::ArrivalTime, &p, 20.0), 10.0);
        assert_eq!(domain.data_at(DataLayer::Flux, &p, 20.0), 1.0e6);
        assert_eq!(domain.data_at(DataLayer::Flux, &p, 5.0), 0.0);
        assert_eq!(domain.data_at(DataLayer::FrontDepth, &p, 20.0), 0.0);
    }
}
