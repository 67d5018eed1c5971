//! One tile of the spatial grid.

use crate::core_types::{AtomId, MarkerId, Point};
use rustc_hash::FxHashMap;

/// Grid tile holding the markers located in it and a fine arrival-time raster
#[derive(Debug, Clone)]
pub struct Cell {
    i: usize,
    j: usize,
    sw: Point,
    ne: Point,
    /// Markers in this cell, keyed by packed atom id
    markers: FxHashMap<u64, MarkerId>,
    local_nx: usize,
    local_ny: usize,
    /// Arrival times, x-major (`li * local_ny + lj`), `+inf` when unburnt
    arrival_times: Vec<f64>,
}

impl Cell {
    pub fn new(i: usize, j: usize, sw: Point, ne: Point, local_nx: usize, local_ny: usize) -> Self {
        Self {
            i,
            j,
            sw,
            ne,
            markers: FxHashMap::default(),
            local_nx,
            local_ny,
            arrival_times: vec![f64::INFINITY; local_nx * local_ny],
        }
    }

    /// Grid coordinates `(i, j)`.
    pub fn coordinates(&self) -> (usize, usize) {
        (self.i, self.j)
    }

    pub fn sw(&self) -> Point {
        self.sw
    }

    pub fn ne(&self) -> Point {
        self.ne
    }

    pub fn center(&self) -> Point {
        0.5 * (self.sw + self.ne)
    }

    pub fn add_marker(&mut self, atom: AtomId, marker: MarkerId) {
        self.markers.insert(atom.packed(), marker);
    }

    pub fn remove_marker(&mut self, atom: AtomId) -> Option<MarkerId> {
        self.markers.remove(&atom.packed())
    }

    pub fn marker_by_id(&self, atom: AtomId) -> Option<MarkerId> {
        self.markers.get(&atom.packed()).copied()
    }

    pub fn markers(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.markers.values().copied()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    /// Local raster size `(local_nx, local_ny)`.
    pub fn local_size(&self) -> (usize, usize) {
        (self.local_nx, self.local_ny)
    }

    pub fn arrival_time(&self, li: usize, lj: usize) -> f64 {
        if li >= self.local_nx || lj >= self.local_ny {
            return f64::INFINITY;
        }
        self.arrival_times[li * self.local_ny + lj]
    }

    pub fn set_arrival_time(&mut self, li: usize, lj: usize, time: f64) {
        if li < self.local_nx && lj < self.local_ny {
            self.arrival_times[li * self.local_ny + lj] = time;
        }
    }

    /// Sets the arrival time only if it is earlier than the recorded one.
    pub fn stamp_earlier(&mut self, li: usize, lj: usize, time: f64) -> bool {
        if li >= self.local_nx || lj >= self.local_ny {
            return false;
        }
        let slot = &mut self.arrival_times[li * self.local_ny + lj];
        if time < *slot {
            *slot = time;
            true
        } else {
            false
        }
    }

    pub fn arrival_times(&self) -> &[f64] {
        &self.arrival_times
    }

    /// A cell is active once any of its raster points has burnt.
    pub fn is_active(&self) -> bool {
        self.arrival_times.iter().any(|t| t.is_finite())
    }
}
