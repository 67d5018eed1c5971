//! Spatial grid of cells and the two-level arrival-time raster

pub mod cell;
pub mod cell_grid;

pub use cell::Cell;
pub use cell_grid::CellGrid;
