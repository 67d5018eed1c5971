//! Raster exchange between domains.
//!
//! Every domain sits in a global lattice of atmospheric cells; by default the
//! lattice is the domain itself. Cells travel with their global coordinates, so
//! ranks owning different rectangles (with or without overlapping halos) stamp
//! each other's rasters at the right place and drop cells they do not own.
//!
//! Payload layout, little-endian: a header of four `u64`
//! `(atmo_nx, atmo_ny, global_nx, global_ny)` giving the global cell lattice and
//! the global raster size, then for every active cell its global coordinates as
//! two `i32` followed by its local raster as `f64`, x-major.

use super::Domain;
use crate::core_types::Point;
use crate::coupling::{ByteReader, CouplingContext, MessageChannel};
use crate::error::{ConfigError, CouplingError};
use tracing::{debug, info};

const HEADER_BYTES: usize = 4 * 8;

/// Largest distance (in cells) a corner may sit off the global lattice.
const LATTICE_TOLERANCE: f64 = 1e-6;

impl Domain {
    /// Places the domain in a global lattice of `global_cells` atmospheric cells
    /// of this domain's cell size, whose south-west corner is `origin`.
    ///
    /// # Errors
    /// Fails when the domain's corner is off the lattice or the domain overflows it.
    pub fn set_global_layout(
        &mut self,
        origin: Point,
        global_cells: (usize, usize),
    ) -> Result<(), ConfigError> {
        let (dx, dy) = self.grid.cell_size();
        let (nx, ny) = self.grid.dimensions();
        let offset_along = |name: &'static str, from: f64, to: f64, size: f64| {
            let cells = (to - from) / size;
            if cells < -LATTICE_TOLERANCE || (cells - cells.round()).abs() > LATTICE_TOLERANCE {
                return Err(ConfigError::new(
                    name,
                    format!("domain corner {to} is not on the global lattice from {from} by {size}"),
                ));
            }
            Ok(cells.round() as usize)
        };
        let offset = (
            offset_along("global_origin", origin.x, self.bounds.sw.x, dx)?,
            offset_along("global_origin", origin.y, self.bounds.sw.y, dy)?,
        );
        if offset.0 + nx > global_cells.0 || offset.1 + ny > global_cells.1 {
            return Err(ConfigError::new(
                "global_cells",
                format!(
                    "{}x{} cells at offset ({}, {}) overflow a {}x{} lattice",
                    nx, ny, offset.0, offset.1, global_cells.0, global_cells.1
                ),
            ));
        }
        self.cell_offset = offset;
        self.global_cells = global_cells;
        info!(
            "Domain {} placed at cell ({}, {}) of a {}x{} lattice",
            self.id, offset.0, offset.1, global_cells.0, global_cells.1
        );
        Ok(())
    }

    /// Global coordinates of this domain's south-west cell.
    pub fn cell_offset(&self) -> (usize, usize) {
        self.cell_offset
    }

    /// Size of the global cell lattice.
    pub fn global_cells(&self) -> (usize, usize) {
        self.global_cells
    }

    fn layout(&self) -> [u64; 4] {
        let (gx, gy) = self.global_cells;
        let (lnx, lny) = self.grid.local_size();
        [gx as u64, gy as u64, (gx * lnx) as u64, (gy * lny) as u64]
    }

    /// Serialises every cell whose raster has burnt.
    pub fn dump_active_cells(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        for value in self.layout() {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
        let (oi, oj) = self.cell_offset;
        for cell in self.grid.cells().iter().filter(|c| c.is_active()) {
            let (i, j) = cell.coordinates();
            buffer.extend_from_slice(&((i + oi) as i32).to_le_bytes());
            buffer.extend_from_slice(&((j + oj) as i32).to_le_bytes());
            for time in cell.arrival_times() {
                buffer.extend_from_slice(&time.to_le_bytes());
            }
        }
        buffer
    }

    /// Applies a payload from [`Domain::dump_active_cells`], keeping the earlier
    /// arrival time wherever both sides burnt. Cells outside this domain are
    /// skipped. Returns the number of raster cells that changed.
    ///
    /// # Errors
    /// Fails on a short payload, a different lattice or cells outside the lattice.
    /// Cells before the faulty record are already applied.
    pub fn load_active_cells(&mut self, payload: &[u8]) -> Result<usize, CouplingError> {
        let mut reader = ByteReader::new(payload);
        let mut found = [0_u64; 4];
        for value in &mut found {
            *value = reader.u64()?;
        }
        let expected = self.layout();
        if found != expected {
            return Err(CouplingError::LayoutMismatch { expected, found });
        }

        let (nx, ny) = self.grid.dimensions();
        let (gx, gy) = self.global_cells;
        let (oi, oj) = self.cell_offset;
        let (lnx, lny) = self.grid.local_size();
        let raster_bytes = 8 * lnx * lny;
        let record = 2 * 4 + raster_bytes;
        if reader.remaining() % record != 0 {
            return Err(CouplingError::Truncated {
                expected: HEADER_BYTES + (reader.remaining() / record + 1) * record,
                found: payload.len(),
            });
        }

        let mut changed = 0;
        while reader.remaining() > 0 {
            let (i, j) = (reader.i32()?, reader.i32()?);
            let (Ok(gi), Ok(gj)) = (usize::try_from(i), usize::try_from(j)) else {
                return Err(CouplingError::CellOutOfRange { i, j });
            };
            if gi >= gx || gj >= gy {
                return Err(CouplingError::CellOutOfRange { i, j });
            }
            let local = gi
                .checked_sub(oi)
                .zip(gj.checked_sub(oj))
                .filter(|&(ci, cj)| ci < nx && cj < ny);
            let Some((ci, cj)) = local else {
                reader.bytes(raster_bytes)?;
                continue;
            };
            let index = self.grid.index(ci, cj);
            for li in 0..lnx {
                for lj in 0..lny {
                    let time = reader.f64()?;
                    if !time.is_finite() {
                        continue;
                    }
                    if let Some(cell) = self.grid.cell_mut(index) {
                        if cell.stamp_earlier(li, lj, time) {
                            changed += 1;
                        }
                    }
                }
            }
        }
        Ok(changed)
    }

    /// Sends the active cells and the local scalar contributions to every peer.
    ///
    /// # Errors
    /// Fails when the channel does.
    pub fn publish<C: MessageChannel>(
        &self,
        ctx: &CouplingContext,
        channel: &mut C,
    ) -> Result<(), CouplingError> {
        let raster = self.dump_active_cells();
        let scalars = ctx.encode_scalars();
        for peer in ctx.peers() {
            channel.send(peer, &raster)?;
            channel.send(peer, &scalars)?;
        }
        debug!(
            "Domain {} published {} bytes to {} peers",
            self.id,
            raster.len(),
            ctx.world_size.saturating_sub(1)
        );
        Ok(())
    }

    /// Receives every peer's cells and scalars in rank order, merges the rasters
    /// and replaces the scalar contributions in `ctx` by their world sums.
    ///
    /// # Errors
    /// Fails when the channel does or a payload is malformed.
    pub fn collect<C: MessageChannel>(
        &mut self,
        ctx: &mut CouplingContext,
        channel: &mut C,
    ) -> Result<usize, CouplingError> {
        let mut changed = 0;
        let mut totals = ctx.accumulated.clone();
        for peer in ctx.peers().collect::<Vec<_>>() {
            let raster = channel.recv(peer)?;
            changed += self.load_active_cells(&raster)?;
            let scalars = channel.recv(peer)?;
            for (name, value) in CouplingContext::decode_scalars(&scalars)? {
                *totals.entry(name).or_insert(0.0) += value;
            }
        }
        ctx.accumulated = totals;
        ctx.iteration += 1;
        Ok(changed)
    }

    /// Coupling barrier: [`Domain::publish`] then [`Domain::collect`]. Returns
    /// the number of raster cells updated from peers.
    ///
    /// # Errors
    /// Fails when the channel does or a payload is malformed.
    pub fn coupling_exchange<C: MessageChannel>(
        &mut self,
        ctx: &mut CouplingContext,
        channel: &mut C,
    ) -> Result<usize, CouplingError> {
        self.publish(ctx, channel)?;
        let changed = self.collect(ctx, channel)?;
        info!(
            "Domain {} coupling step {} done: {} raster cells from {} peers",
            self.id,
            ctx.iteration,
            changed,
            ctx.world_size.saturating_sub(1)
        );
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_domain;
    use super::*;
    use crate::config::SimulationParameters;

    #[test]
    fn test_empty_raster_is_header_only() {
        let domain = test_domain();
        assert_eq!(domain.dump_active_cells().len(), HEADER_BYTES);
    }

    #[test]
    fn test_load_keeps_earlier_times() {
        let mut source = test_domain();
        source.set_arrival_time(15, 25, 4.0);
        source.set_arrival_time(16, 25, 9.0);
        let payload = source.dump_active_cells();
        assert_eq!(payload.len(), HEADER_BYTES + 8 + 8 * 100);

        let mut target = test_domain();
        target.set_arrival_time(16, 25, 6.0);
        assert_eq!(target.load_active_cells(&payload).unwrap(), 1);
        assert_eq!(target.arrival_time(15, 25), 4.0);
        assert_eq!(target.arrival_time(16, 25), 6.0);
    }

    #[test]
    fn test_load_rejects_other_layout() {
        let mut target = test_domain();
        let mut payload = target.dump_active_cells();
        payload[0] = 7;
        assert!(matches!(
            target.load_active_cells(&payload),
            Err(CouplingError::LayoutMismatch { .. })
        ));
        let mut short = target.dump_active_cells();
        short.extend_from_slice(&[0; 5]);
        assert!(matches!(
            target.load_active_cells(&short),
            Err(CouplingError::Truncated { .. })
        ));
    }

    #[test]
    fn test_global_layout_must_sit_on_lattice() {
        let mut domain = test_domain();
        let err = domain
            .set_global_layout(Point::new(50.0, 0.0, 0.0), (20, 20))
            .unwrap_err();
        assert_eq!(err.parameter, "global_origin");
        let err = domain
            .set_global_layout(Point::new(-200.0, -100.0, 0.0), (11, 11))
            .unwrap_err();
        assert_eq!(err.parameter, "global_cells");

        domain
            .set_global_layout(Point::new(-200.0, -100.0, 0.0), (12, 11))
            .unwrap();
        assert_eq!(domain.cell_offset(), (2, 1));
        assert_eq!(domain.global_cells(), (12, 11));
    }

    #[test]
    fn test_cells_land_at_global_position() {
        let strip = |id: u32, x0: f64| {
            let params = SimulationParameters {
                atmo_nx: 6,
                atmo_ny: 10,
                ..Default::default()
            };
            let sw = Point::new(x0, 0.0, 0.0);
            let ne = Point::new(x0 + 600.0, 1000.0, 0.0);
            let mut domain = Domain::new(id, sw, ne, 0.0, params).unwrap();
            domain.set_global_layout(Point::zeros(), (10, 10)).unwrap();
            domain
        };
        let mut west = strip(0, 0.0);
        let mut east = strip(1, 400.0);
        // x = 550 is shared, x = 250 belongs to the west only
        west.set_arrival_time(55, 50, 3.0);
        west.set_arrival_time(25, 50, 7.0);

        assert_eq!(east.load_active_cells(&west.dump_active_cells()).unwrap(), 1);
        assert_eq!(east.arrival_time(15, 50), 3.0);
        assert_eq!(east.arrival_time_at(&Point::new(555.0, 505.0, 0.0)), 3.0);
        assert!(east.arrival_time_at(&Point::new(855.0, 505.0, 0.0)).is_infinite());
    }

    #[test]
    fn test_load_rejects_foreign_cell() {
        let mut target = test_domain();
        let mut payload = target.dump_active_cells();
        payload.extend_from_slice(&42_i32.to_le_bytes());
        payload.extend_from_slice(&0_i32.to_le_bytes());
        payload.extend(std::iter::repeat(0_u8).take(8 * 100));
        assert_eq!(
            target.load_active_cells(&payload),
            Err(CouplingError::CellOutOfRange { i: 42, j: 0 })
        );
    }
}
