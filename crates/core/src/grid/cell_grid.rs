//! Regular grid of cells covering the domain rectangle.
//!
//! Besides bucketing markers for neighbour queries, the grid owns the global
//! arrival-time raster: raster index `(ii, jj)` lives in cell
//! `(ii / local_nx, jj / local_ny)` at local index `(ii % local_nx, jj % local_ny)`.

use super::cell::Cell;
use crate::core_types::{Point, EPSILON_X};

#[derive(Debug, Clone)]
pub struct CellGrid {
    sw: Point,
    ne: Point,
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    inv_dx: f64,
    inv_dy: f64,
    local_nx: usize,
    local_ny: usize,
    /// Cells, x-major (`i * ny + j`)
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn new(sw: Point, ne: Point, nx: usize, ny: usize, local_nx: usize, local_ny: usize) -> Self {
        let nx = nx.max(1);
        let ny = ny.max(1);
        let dx = (ne.x - sw.x) / nx as f64;
        let dy = (ne.y - sw.y) / ny as f64;
        let mut cells = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                let c_sw = Point::new(sw.x + i as f64 * dx, sw.y + j as f64 * dy, sw.z);
                let c_ne = Point::new(sw.x + (i + 1) as f64 * dx, sw.y + (j + 1) as f64 * dy, sw.z);
                cells.push(Cell::new(i, j, c_sw, c_ne, local_nx, local_ny));
            }
        }
        Self {
            sw,
            ne,
            nx,
            ny,
            dx,
            dy,
            inv_dx: 1.0 / dx,
            inv_dy: 1.0 / dy,
            local_nx,
            local_ny,
            cells,
        }
    }

    /// Grid size in cells `(nx, ny)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Cell size `(dx, dy)` in metres.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    /// Local raster size per cell.
    pub fn local_size(&self) -> (usize, usize) {
        (self.local_nx, self.local_ny)
    }

    /// Global raster size `(nx * local_nx, ny * local_ny)`.
    pub fn raster_size(&self) -> (usize, usize) {
        (self.nx * self.local_nx, self.ny * self.local_ny)
    }

    pub fn sw(&self) -> Point {
        self.sw
    }

    pub fn ne(&self) -> Point {
        self.ne
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    #[inline]
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        (index / self.ny, index % self.ny)
    }

    /// Cell containing `p`, `None` when `p` lies outside the domain.
    pub fn locate(&self, p: &Point) -> Option<usize> {
        if p.x < self.sw.x - EPSILON_X
            || p.x > self.ne.x + EPSILON_X
            || p.y < self.sw.y - EPSILON_X
            || p.y > self.ne.y + EPSILON_X
        {
            return None;
        }
        let i = (((p.x - self.sw.x) * self.inv_dx).floor().max(0.0) as usize).min(self.nx - 1);
        let j = (((p.y - self.sw.y) * self.inv_dy).floor().max(0.0) as usize).min(self.ny - 1);
        Some(self.index(i, j))
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Cells within `radius` of cell `index` (the cell itself included), scanning
    /// the ring of `ceil(radius / cell size)` cells in each direction.
    pub fn neighbourhood(&self, index: usize, radius: f64) -> Vec<usize> {
        let (ci, cj) = self.coordinates(index);
        let ri = (radius * self.inv_dx).ceil().max(0.0) as usize;
        let rj = (radius * self.inv_dy).ceil().max(0.0) as usize;
        let (i0, i1) = (ci.saturating_sub(ri), (ci + ri).min(self.nx - 1));
        let (j0, j1) = (cj.saturating_sub(rj), (cj + rj).min(self.ny - 1));
        let mut out = Vec::with_capacity((i1 - i0 + 1) * (j1 - j0 + 1));
        for i in i0..=i1 {
            for j in j0..=j1 {
                out.push(self.index(i, j));
            }
        }
        out
    }

    /// Border ring of cells exchanged with neighbouring processes.
    pub fn is_in_outer_halo(&self, index: usize) -> bool {
        let (i, j) = self.coordinates(index);
        i == 0 || j == 0 || i + 1 == self.nx || j + 1 == self.ny
    }

    /// Ring just inside the outer halo.
    pub fn is_in_inner_halo(&self, index: usize) -> bool {
        if self.is_in_outer_halo(index) {
            return false;
        }
        let (i, j) = self.coordinates(index);
        i == 1 || j == 1 || i + 2 == self.nx || j + 2 == self.ny
    }

    /// Arrival time at global raster index, `+inf` outside the raster.
    pub fn arrival_time(&self, ii: usize, jj: usize) -> f64 {
        let (gx, gy) = self.raster_size();
        if ii >= gx || jj >= gy {
            return f64::INFINITY;
        }
        let cell = &self.cells[self.index(ii / self.local_nx, jj / self.local_ny)];
        cell.arrival_time(ii % self.local_nx, jj % self.local_ny)
    }

    /// Overwrites the arrival time at a global raster index; ignored outside the raster.
    pub fn set_arrival_time(&mut self, ii: usize, jj: usize, time: f64) {
        let (gx, gy) = self.raster_size();
        if ii >= gx || jj >= gy {
            return;
        }
        let index = self.index(ii / self.local_nx, jj / self.local_ny);
        self.cells[index].set_arrival_time(ii % self.local_nx, jj % self.local_ny, time);
    }

    /// Records `time` only where it is earlier than the current value.
    pub fn stamp_earlier(&mut self, ii: usize, jj: usize, time: f64) -> bool {
        let (gx, gy) = self.raster_size();
        if ii >= gx || jj >= gy {
            return false;
        }
        let index = self.index(ii / self.local_nx, jj / self.local_ny);
        self.cells[index].stamp_earlier(ii % self.local_nx, jj % self.local_ny, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> CellGrid {
        CellGrid::new(Point::zeros(), Point::new(100.0, 50.0, 0.0), 10, 5, 4, 4)
    }

    #[test]
    fn test_cells_partition_domain() {
        let grid = grid();
        let total: f64 = grid
            .cells()
            .iter()
            .map(|c| (c.ne().x - c.sw().x) * (c.ne().y - c.sw().y))
            .sum();
        assert!((total - 5000.0).abs() < 1e-9);
        assert_eq!(grid.raster_size(), (40, 20));
    }

    #[test]
    fn test_locate_clamps_upper_edge() {
        let grid = grid();
        assert_eq!(grid.locate(&Point::new(100.0, 50.0, 0.0)), Some(grid.index(9, 4)));
        assert_eq!(grid.locate(&Point::new(15.0, 25.0, 0.0)), Some(grid.index(1, 2)));
        assert!(grid.locate(&Point::new(100.5, 10.0, 0.0)).is_none());
    }

    #[test]
    fn test_neighbourhood_is_clipped() {
        let grid = grid();
        assert_eq!(grid.neighbourhood(grid.index(0, 0), 10.0).len(), 4);
        assert_eq!(grid.neighbourhood(grid.index(5, 2), 10.0).len(), 9);
    }

    #[test]
    fn test_halo_rings() {
        let grid = grid();
        assert!(grid.is_in_outer_halo(grid.index(0, 3)));
        assert!(grid.is_in_inner_halo(grid.index(1, 2)));
        assert!(!grid.is_in_inner_halo(grid.index(5, 0)));
        assert!(!grid.is_in_outer_halo(grid.index(5, 2)));
    }

    #[test]
    fn test_two_level_raster_indexing() {
        let mut grid = grid();
        grid.set_arrival_time(13, 6, 7.5);
        let cell = grid.cell(grid.index(3, 1)).unwrap();
        assert_eq!(cell.arrival_time(1, 2), 7.5);
        assert_eq!(grid.arrival_time(13, 6), 7.5);
        assert_eq!(grid.arrival_time(400, 6), f64::INFINITY);
        grid.set_arrival_time(400, 6, 1.0);
    }
}
