//! Fire domain
//!
//! The [`Domain`] owns everything one process simulates: the cell grid with its
//! arrival-time raster, the perimeter graph, the event schedule and the model
//! capabilities. It is also the [`World`] the simulator drives, dispatching the
//! activation phases of markers, fronts and itself.
//!
//! Responsibilities are split across submodules:
//!
//! - `topology` - collision and stretch detection, cutting and splicing fronts
//! - `search` - neighbour queries through the cell grid
//! - `raster` - burning scans, arrival-time accessors, front depth
//! - `frontier` - domain edges, boundary intersections, outgoing markers
//! - `snapshot` - backup and restore of the front tree for safe-mode recovery
//! - `exchange` - serialisation of active cells and the coupling barrier

mod exchange;
mod frontier;
mod raster;
mod search;
mod snapshot;
mod topology;

pub use raster::DataLayer;
pub use snapshot::{DomainSnapshot, FrontSnapshot, MarkerSnapshot};

use crate::config::SimulationParameters;
use crate::core_types::{AtomId, FrontId, MarkerId, Point};
use crate::error::{ConfigError, StepError, TopologyError};
use crate::geometry::BoundingBox;
use crate::grid::CellGrid;
use crate::models::{FluxModel, ModelRegistry, PropagationModel};
use crate::perimeter::kinematics::{compute_curvature, compute_normal};
use crate::perimeter::{Front, Marker, MarkerState, Perimeter};
use crate::simulation::{
    EntityKey, Event, EventKind, EventSchedule, Simulator, TimeStamped, World,
};
use tracing::{debug, error, info, warn};

/// Initial state of a marker handed to [`Domain::add_marker`]
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInit {
    pub location: Point,
    pub velocity: Point,
    pub time: f64,
    pub front_depth: f64,
    pub curvature: f64,
    pub state: MarkerState,
    /// Identity to reuse; a fresh one is allocated when `None`
    pub id: Option<AtomId>,
}

impl MarkerInit {
    pub fn new(location: Point, time: f64) -> Self {
        Self {
            location,
            velocity: Point::zeros(),
            time,
            front_depth: 0.0,
            curvature: 0.0,
            state: MarkerState::Init,
            id: None,
        }
    }

    pub fn velocity(mut self, velocity: Point) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn front_depth(mut self, depth: f64) -> Self {
        self.front_depth = depth;
        self
    }

    pub fn curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }

    pub fn state(mut self, state: MarkerState) -> Self {
        self.state = state;
        self
    }

    pub fn id(mut self, id: AtomId) -> Self {
        self.id = Some(id);
        self
    }
}

/// One process's share of the fire simulation
pub struct Domain {
    id: u32,
    params: SimulationParameters,
    bounds: BoundingBox,
    grid: CellGrid,
    /// Raster spacing along x and y (m)
    raster_res_x: f64,
    raster_res_y: f64,
    /// Coarsest raster spacing, the resolution of every raster-based search
    raster_resolution: f64,
    /// Finest resolution worth exchanging with the atmospheric model
    parallel_max_resolution: f64,
    /// Position of the south-west cell in the global cell lattice
    cell_offset: (usize, usize),
    global_cells: (usize, usize),
    perimeter: Perimeter,
    schedule: EventSchedule,
    simulator: Simulator,
    atom_id: AtomId,
    time: f64,
    update_time: f64,
    next_local_id: u64,
    safe_topology_mode: bool,
    backup: Option<DomainSnapshot>,
    propagation: Option<Box<dyn PropagationModel>>,
    flux: Option<Box<dyn FluxModel>>,
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("id", &self.id)
            .field("bounds", &self.bounds)
            .field("time", &self.time)
            .field("markers", &self.perimeter.marker_count())
            .field("fronts", &self.perimeter.front_count())
            .field("pending_events", &self.schedule.len())
            .field("safe_topology_mode", &self.safe_topology_mode)
            .finish_non_exhaustive()
    }
}

impl Domain {
    /// Creates a domain with the built-in model registry.
    ///
    /// # Errors
    /// Returns an error for invalid parameters or an empty rectangle.
    pub fn new(
        id: u32,
        sw: Point,
        ne: Point,
        start_time: f64,
        params: SimulationParameters,
    ) -> Result<Self, ConfigError> {
        let mut registry = ModelRegistry::default();
        Self::with_registry(id, sw, ne, start_time, params, &mut registry)
    }

    /// Creates a domain covering the rectangle `sw`-`ne`, instantiating the
    /// configured models from `registry`.
    ///
    /// Unknown model names are reported by the registry and leave the capability
    /// unset: without a propagation model markers move at `min_speed`, without a
    /// flux model every raster point past its arrival time counts as burning.
    ///
    /// # Errors
    /// Returns an error for invalid parameters or an empty rectangle.
    pub fn with_registry(
        id: u32,
        sw: Point,
        ne: Point,
        start_time: f64,
        params: SimulationParameters,
        registry: &mut ModelRegistry,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        if !(ne.x > sw.x && ne.y > sw.y) {
            return Err(ConfigError::new(
                "domain",
                format!(
                    "north-east corner ({}, {}) must lie above and right of south-west ({}, {})",
                    ne.x, ne.y, sw.x, sw.y
                ),
            ));
        }

        let (nx, ny) = (params.atmo_nx, params.atmo_ny);
        let dx = (ne.x - sw.x) / nx as f64;
        let dy = (ne.y - sw.y) / ny as f64;
        let target_resolution = (params.spatial_increment / std::f64::consts::SQRT_2)
            .max(params.minimal_propagative_front_depth);
        let local_nx = ((dx / target_resolution).floor() as usize).max(1);
        let local_ny = ((dy / target_resolution).floor() as usize).max(1);
        let grid = CellGrid::new(sw, ne, nx, ny, local_nx, local_ny);
        let (gx, gy) = grid.raster_size();
        let raster_res_x = (ne.x - sw.x) / gx as f64;
        let raster_res_y = (ne.y - sw.y) / gy as f64;

        let propagation = registry
            .instantiate_propagation_by_name(&params.propagation_model, &params)
            .ok();
        let flux = registry
            .instantiate_flux_by_name(&params.flux_model, &params)
            .ok();

        let domain = Self {
            id,
            bounds: BoundingBox::new(sw, ne),
            grid,
            raster_res_x,
            raster_res_y,
            raster_resolution: raster_res_x.max(raster_res_y),
            parallel_max_resolution: 0.25 * (dx * dy / params.atmo_nz as f64).sqrt(),
            cell_offset: (0, 0),
            global_cells: (nx, ny),
            perimeter: Perimeter::new(AtomId::new(id, 1), start_time),
            schedule: EventSchedule::new(),
            simulator: Simulator::new(),
            atom_id: AtomId::new(id, 0),
            time: start_time,
            update_time: f64::INFINITY,
            next_local_id: 2,
            safe_topology_mode: false,
            backup: None,
            propagation,
            flux,
            params,
        };
        info!(
            "Domain {} created: {:.0}x{:.0} m, {}x{} cells, raster {}x{} at {:.2} m",
            id,
            ne.x - sw.x,
            ne.y - sw.y,
            nx,
            ny,
            gx,
            gy,
            domain.raster_resolution
        );
        Ok(domain)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn perimeter(&self) -> &Perimeter {
        &self.perimeter
    }

    pub fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Activations processed by this domain's simulator so far.
    pub fn processed_events(&self) -> u64 {
        self.simulator.processed()
    }

    pub fn raster_resolution(&self) -> f64 {
        self.raster_resolution
    }

    /// Global raster size `(nx, ny)`.
    pub fn raster_size(&self) -> (usize, usize) {
        self.grid.raster_size()
    }

    pub fn parallel_max_resolution(&self) -> f64 {
        self.parallel_max_resolution
    }

    pub fn is_safe_topology_mode(&self) -> bool {
        self.safe_topology_mode
    }

    /// Suppresses (or re-enables) collision and stretch handling.
    pub fn set_safe_topology_mode(&mut self, safe: bool) {
        if safe != self.safe_topology_mode {
            info!(
                "Domain {} {} safe topology mode",
                self.id,
                if safe { "entering" } else { "leaving" }
            );
        }
        self.safe_topology_mode = safe;
    }

    pub fn set_propagation_model(&mut self, model: Box<dyn PropagationModel>) {
        self.propagation = Some(model);
    }

    pub fn set_flux_model(&mut self, model: Box<dyn FluxModel>) {
        self.flux = Some(model);
    }

    pub fn has_propagation_model(&self) -> bool {
        self.propagation.is_some()
    }

    pub fn has_flux_model(&self) -> bool {
        self.flux.is_some()
    }

    /// # Errors
    /// Fails for a stale handle.
    pub fn marker(&self, id: MarkerId) -> Result<&Marker, TopologyError> {
        self.perimeter.marker(id)
    }

    /// # Errors
    /// Fails for a stale handle.
    pub fn front(&self, id: FrontId) -> Result<&Front, TopologyError> {
        self.perimeter.front(id)
    }

    /// Root of the front tree; never destroyed.
    pub fn root_front(&self) -> FrontId {
        self.perimeter.root()
    }

    /// Fronts directly under the root.
    pub fn top_level_fronts(&self) -> Vec<FrontId> {
        self.perimeter
            .front(self.perimeter.root())
            .map(|f| f.inner_fronts().to_vec())
            .unwrap_or_default()
    }

    /// Every front except the root, parents before children.
    pub fn all_fronts(&self) -> Vec<FrontId> {
        let root = self.perimeter.root();
        self.perimeter
            .descendants(root)
            .into_iter()
            .filter(|&f| f != root)
            .collect()
    }

    /// Locations of a front's markers in cycle order.
    pub fn front_outline(&self, front: FrontId) -> Vec<Point> {
        self.perimeter
            .chain(front)
            .into_iter()
            .filter_map(|id| self.perimeter.markers.get(id).map(|m| m.location))
            .collect()
    }

    fn next_atom(&mut self) -> AtomId {
        let atom = AtomId::new(self.id, self.next_local_id);
        self.next_local_id += 1;
        atom
    }

    /// Creates an empty front nested in `parent` (the root when `None`).
    ///
    /// # Errors
    /// Fails for a stale parent handle.
    pub fn add_fire_front(
        &mut self,
        time: f64,
        parent: Option<FrontId>,
    ) -> Result<FrontId, TopologyError> {
        let parent = parent.unwrap_or(self.perimeter.root());
        let atom = self.next_atom();
        self.perimeter.create_front(atom, time, parent)
    }

    /// Creates a marker in `front` right after `after` (at the chain tail when
    /// `None`), registers it in its cell and schedules it unless it is a link or
    /// final marker. A negative or infinite time keeps the marker unscheduled.
    ///
    /// # Errors
    /// Fails for stale handles or when `after` belongs to another front.
    pub fn add_marker(
        &mut self,
        front: FrontId,
        after: Option<MarkerId>,
        init: MarkerInit,
    ) -> Result<MarkerId, TopologyError> {
        let atom = match init.id {
            Some(atom) => {
                if atom.domain_id == self.id {
                    self.next_local_id = self.next_local_id.max(atom.local_id + 1);
                }
                atom
            }
            None => self.next_atom(),
        };
        let mut marker = Marker::new(atom, init.location, init.time);
        marker.velocity = init.velocity;
        marker.front_depth = init.front_depth;
        marker.curvature = init.curvature;
        marker.state = init.state;
        let id = self.perimeter.insert_marker(marker);
        if let Err(err) = self.perimeter.link_marker(front, id, after) {
            self.perimeter.markers.remove(id);
            return Err(err);
        }
        self.register_in_cell(id)?;
        let scheduled = init.state.is_physical()
            && self
                .schedule
                .insert_before(Event::new(EntityKey::Marker(id), init.time));
        if !scheduled {
            if init.state.is_physical() {
                warn!(
                    "Marker {} rejected by the schedule at t={}, it will not move",
                    atom, init.time
                );
            }
            self.perimeter.marker_mut(id)?.update_time = f64::INFINITY;
        }
        Ok(id)
    }

    /// Creates a non-physical marker stitching a front to the domain boundary.
    ///
    /// # Errors
    /// Same as [`Domain::add_marker`].
    pub fn add_link_marker(
        &mut self,
        front: FrontId,
        after: Option<MarkerId>,
        location: Point,
        time: f64,
    ) -> Result<MarkerId, TopologyError> {
        self.add_marker(
            front,
            after,
            MarkerInit::new(location, time).state(MarkerState::Link),
        )
    }

    /// Closes the marker chain of `front` into a cycle, initialises the normals
    /// and curvatures of its markers and backs up the resulting perimeter, so the
    /// very first step can already be retried.
    ///
    /// # Errors
    /// Fails for a stale handle or a chain that cannot be closed.
    pub fn complete_front(&mut self, front: FrontId) -> Result<(), TopologyError> {
        self.perimeter.close_front(front)?;
        for id in self.perimeter.cycle(front)? {
            self.refresh_geometry(id)?;
        }
        self.backup_state();
        Ok(())
    }

    /// Ignites a clockwise triangle around `location` and back-dates the raster
    /// inside it over the initial burning duration.
    ///
    /// # Errors
    /// Fails only on internal topology inconsistencies.
    pub fn start_fire(&mut self, location: Point, time: f64) -> Result<FrontId, TopologyError> {
        let radius = 2.0 * self.params.spatial_increment;
        let depth = self.params.initial_front_depth;
        let front = self.add_fire_front(time, None)?;
        let mut prev = None;
        for (dx, dy) in [(0.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            let direction = Point::new(dx, dy, 0.0);
            let init = MarkerInit::new(location + radius * direction, time)
                .velocity(0.1 * direction)
                .front_depth(depth);
            prev = Some(self.add_marker(front, prev, init)?);
        }
        self.complete_front(front)?;
        let stamped = self.front_initial_burning_scan(
            time,
            front,
            self.params.initial_front_depth,
            self.params.initial_burning_duration,
        )?;
        info!(
            "Fire started at ({:.1}, {:.1}) t={:.1}, {} raster cells pre-burnt",
            location.x, location.y, time, stamped
        );
        Ok(front)
    }

    fn register_in_cell(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let (atom, location) = {
            let m = self.perimeter.marker(id)?;
            (m.atom_id, m.location)
        };
        let cell = self.grid.locate(&location);
        if let Some(index) = cell {
            if let Some(c) = self.grid.cell_mut(index) {
                c.add_marker(atom, id);
            }
        }
        self.perimeter.marker_mut(id)?.cell = cell;
        Ok(())
    }

    /// Moves a marker, keeping its cell registration in sync. Returns `false` when
    /// `location` lies outside the domain (nothing is changed then).
    pub(crate) fn relocate_marker(
        &mut self,
        id: MarkerId,
        location: Point,
    ) -> Result<bool, TopologyError> {
        let Some(new_cell) = self.grid.locate(&location) else {
            return Ok(false);
        };
        let (atom, old_cell) = {
            let m = self.perimeter.marker(id)?;
            (m.atom_id, m.cell)
        };
        if old_cell != Some(new_cell) {
            if let Some(old) = old_cell.and_then(|c| self.grid.cell_mut(c)) {
                old.remove_marker(atom);
            }
            if let Some(cell) = self.grid.cell_mut(new_cell) {
                cell.add_marker(atom, id);
            }
        }
        let m = self.perimeter.marker_mut(id)?;
        m.location = location;
        m.cell = Some(new_cell);
        Ok(true)
    }

    /// Removes a marker from its cell, the schedule and its front, then frees it.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn trash_marker(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let (atom, cell) = {
            let m = self.perimeter.marker(id)?;
            (m.atom_id, m.cell)
        };
        if let Some(c) = cell.and_then(|c| self.grid.cell_mut(c)) {
            c.remove_marker(atom);
        }
        self.schedule.drop_entity_events(EntityKey::Marker(id));
        self.perimeter.remove_marker(id)?;
        debug!("Marker {} trashed", atom);
        Ok(())
    }

    /// Removes a front and all its markers. Inner fronts move to its container.
    ///
    /// # Errors
    /// Refuses the root front; fails for a stale handle.
    pub fn trash_front(&mut self, front: FrontId) -> Result<(), TopologyError> {
        let atom = self.perimeter.front(front)?.atom_id;
        let mut markers = self.perimeter.remove_front(front)?;
        // markers cut off the chain by a broken link still point at the front
        markers.extend(
            self.perimeter
                .markers
                .iter()
                .filter(|(_, m)| m.front == Some(front))
                .map(|(id, _)| id),
        );
        self.schedule.drop_entity_events(EntityKey::Front(front));
        for id in markers {
            if self.perimeter.markers.contains_key(id) {
                self.trash_marker(id)?;
            }
        }
        debug!("Front {} trashed", atom);
        Ok(())
    }

    /// Recomputes normal and curvature of a marker from its neighbours.
    fn refresh_geometry(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let m = self.perimeter.marker(id)?;
        let (Some(prev), Some(next)) = (m.prev, m.next) else {
            return Ok(());
        };
        let here = m.location;
        let before = self.perimeter.marker(prev)?.location;
        let after = self.perimeter.marker(next)?.location;
        let normal = compute_normal(&before, &here, &after, self.params.normal_scheme);
        let curvature = compute_curvature(&before, &here, &after, self.params.curvature_scheme);
        let m = self.perimeter.marker_mut(id)?;
        m.normal = normal;
        m.curvature = curvature;
        Ok(())
    }

    /// Marker update phase: commit the location computed by the last advance,
    /// refresh the burning depth, rasterise locally, then check topology.
    fn update_marker(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let Some(m) = self.perimeter.markers.get_mut(id) else {
            return Ok(());
        };
        if m.update_time.is_finite() {
            m.time = m.update_time;
        }
        if !m.state.is_physical() {
            return Ok(());
        }
        let target = m.next_location;
        if m.state == MarkerState::Init {
            m.state = MarkerState::Moving;
        }
        if !self.relocate_marker(id, target)? {
            self.stop_outgoing_marker(id)?;
            return Ok(());
        }
        self.refresh_geometry(id)?;
        let depth = self.compute_front_depth(id)?;
        self.perimeter.marker_mut(id)?.front_depth = depth;
        self.firenode_burning_scan(id)?;
        self.check_topology(id)
    }

    /// Marker time advance: ask the propagation model for a speed, regularise it
    /// by the local curvature and integrate one spatial increment along the
    /// outward normal.
    fn advance_marker(&mut self, id: MarkerId) -> Result<(), TopologyError> {
        let Some(m) = self.perimeter.markers.get(id) else {
            return Ok(());
        };
        if !m.state.is_physical() {
            self.perimeter.marker_mut(id)?.update_time = f64::INFINITY;
            return Ok(());
        }
        self.refresh_geometry(id)?;
        let marker = self.perimeter.marker(id)?;
        let raw = match &self.propagation {
            Some(model) => model.speed_for_marker(marker),
            None => 0.0,
        };
        let regularised = raw * self.curvature_factor(marker.curvature);
        let speed =
            self.clamp_speed(regularised * self.params.propagation_speed_adjustment_factor);
        let relax = self.params.relaxation;
        let velocity = relax * (speed * marker.normal) + (1.0 - relax) * marker.velocity;
        let dt = self.params.spatial_cfl() * self.params.perimeter_resolution / speed;
        let mut next_location = marker.location + velocity * dt;
        next_location.z = marker.location.z;

        let m = self.perimeter.marker_mut(id)?;
        m.velocity = velocity;
        m.next_location = next_location;
        m.update_time = m.time + dt;
        Ok(())
    }

    /// Speed multiplier `1 - smoothing * curvature * spatial_increment`: convex
    /// parts of a front slow down and concave parts catch up.
    fn curvature_factor(&self, curvature: f64) -> f64 {
        (1.0 - self.params.smoothing * curvature * self.params.spatial_increment).clamp(0.0, 2.0)
    }

    fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return self.params.min_speed;
        }
        speed.clamp(self.params.min_speed, self.params.max_speed)
    }

    /// Advances the domain to `target`, recovering from topology failures.
    ///
    /// On failure the last validated backup is restored and the step is retried in
    /// safe topology mode; a successful step ends with a fresh backup. A failing
    /// retry is fatal for this domain: the caller must stop the process and report
    /// the domain id.
    ///
    /// # Errors
    /// [`StepError::Topology`] when no front was ever completed (no backup exists),
    /// [`StepError::Unrecoverable`] when the safe-mode retry fails.
    pub fn step_to(&mut self, target: f64) -> Result<(), StepError> {
        if let Err(err) = self.advance_to(target) {
            warn!(
                "Domain {} hit a topology failure before t={:.3}: {}",
                self.id, target, err
            );
            if self.backup.is_none() {
                return Err(StepError::Topology(err));
            }
            self.restore_valid_state()?;
            self.set_safe_topology_mode(true);
            let retry = self.advance_to(target);
            self.set_safe_topology_mode(false);
            if let Err(source) = retry {
                error!(
                    "Domain {} cannot reach t={:.3} even in safe topology mode: {}",
                    self.id, target, source
                );
                return Err(StepError::Unrecoverable {
                    domain_id: self.id,
                    time: target,
                    source,
                });
            }
            self.validate_topology();
        }
        self.backup_state();
        Ok(())
    }

    fn advance_to(&mut self, target: f64) -> Result<(), TopologyError> {
        self.schedule.drop_entity_events(EntityKey::Domain);
        self.update_time = target;
        self.schedule.insert(Event::with_kind(
            EntityKey::Domain,
            target,
            EventKind::Output,
        ));
        let mut simulator = std::mem::take(&mut self.simulator);
        let result = simulator.go_to(self, target);
        self.simulator = simulator;
        result
    }
}

impl TimeStamped for Domain {
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

impl World for Domain {
    type Error = TopologyError;

    fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    fn schedule_mut(&mut self) -> &mut EventSchedule {
        &mut self.schedule
    }

    fn input(&mut self, _entity: EntityKey) -> Result<(), TopologyError> {
        Ok(())
    }

    fn update(&mut self, entity: EntityKey) -> Result<(), TopologyError> {
        match entity {
            EntityKey::Domain => {
                if self.update_time.is_finite() {
                    self.time = self.update_time;
                }
                Ok(())
            }
            EntityKey::Front(front) => {
                if let Some(f) = self.perimeter.fronts.get_mut(front) {
                    if f.update_time.is_finite() {
                        f.time = f.update_time;
                    }
                }
                Ok(())
            }
            EntityKey::Marker(id) => self.update_marker(id),
        }
    }

    fn time_advance(&mut self, entity: EntityKey) -> Result<(), TopologyError> {
        match entity {
            EntityKey::Domain => {
                self.update_time = f64::INFINITY;
                Ok(())
            }
            EntityKey::Front(front) => {
                if let Some(f) = self.perimeter.fronts.get_mut(front) {
                    f.update_time = f64::INFINITY;
                }
                Ok(())
            }
            EntityKey::Marker(id) => self.advance_marker(id),
        }
    }

    fn output(&mut self, entity: EntityKey) -> Result<(), TopologyError> {
        if entity == EntityKey::Domain {
            let stamped = self.burning_scan(self.time);
            debug!(
                "Domain {} rasterised t={:.3}: {} cells stamped",
                self.id, self.time, stamped
            );
        }
        Ok(())
    }

    fn next_update_time(&self, entity: EntityKey) -> f64 {
        match entity {
            EntityKey::Domain => self.update_time,
            EntityKey::Front(front) => self
                .perimeter
                .fronts
                .get(front)
                .map_or(f64::INFINITY, |f| f.update_time),
            EntityKey::Marker(id) => self
                .perimeter
                .markers
                .get(id)
                .map_or(f64::INFINITY, |m| m.update_time),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_domain() -> Domain {
        let params = SimulationParameters {
            atmo_nx: 10,
            atmo_ny: 10,
            ..Default::default()
        };
        Domain::new(
            0,
            Point::new(0.0, 0.0, 0.0),
            Point::new(1000.0, 1000.0, 0.0),
            0.0,
            params,
        )
        .unwrap()
    }

    /// Closed front through `points` (give them clockwise for a burning interior).
    pub(crate) fn polygon_front(
        domain: &mut Domain,
        points: &[(f64, f64)],
    ) -> (FrontId, Vec<MarkerId>) {
        let front = domain.add_fire_front(0.0, None).unwrap();
        let mut ids: Vec<MarkerId> = Vec::new();
        for &(x, y) in points {
            let init = MarkerInit::new(Point::new(x, y, 0.0), 0.0);
            ids.push(domain.add_marker(front, ids.last().copied(), init).unwrap());
        }
        domain.complete_front(front).unwrap();
        (front, ids)
    }

    fn outlines(domain: &Domain) -> Vec<Vec<Point>> {
        domain
            .all_fronts()
            .into_iter()
            .map(|f| domain.front_outline(f))
            .collect()
    }

    #[test]
    fn test_raster_layout_from_defaults() {
        let domain = test_domain();
        assert_eq!(domain.grid().dimensions(), (10, 10));
        assert_eq!(domain.grid().local_size(), (10, 10));
        assert_eq!(domain.raster_size(), (100, 100));
        assert_eq!(domain.raster_resolution(), 10.0);
        assert!(domain.has_propagation_model());
        assert!(domain.has_flux_model());
    }

    #[test]
    fn test_empty_rectangle_rejected() {
        let err = Domain::new(
            0,
            Point::new(10.0, 0.0, 0.0),
            Point::new(0.0, 10.0, 0.0),
            0.0,
            SimulationParameters::default(),
        )
        .unwrap_err();
        assert_eq!(err.parameter, "domain");
    }

    #[test]
    fn test_unknown_model_leaves_capability_unset() {
        let params = SimulationParameters {
            atmo_nx: 4,
            atmo_ny: 4,
            propagation_model: "Unregistered".to_string(),
            ..Default::default()
        };
        let domain = Domain::new(
            0,
            Point::zeros(),
            Point::new(400.0, 400.0, 0.0),
            0.0,
            params,
        )
        .unwrap();
        assert!(!domain.has_propagation_model());
        assert!(domain.has_flux_model());
    }

    #[test]
    fn test_markers_scheduled_unless_link() {
        let mut domain = test_domain();
        let front = domain.add_fire_front(0.0, None).unwrap();
        let a = domain
            .add_marker(front, None, MarkerInit::new(Point::new(10.0, 10.0, 0.0), 1.0))
            .unwrap();
        let link = domain
            .add_link_marker(front, Some(a), Point::new(0.0, 20.0, 0.0), 1.0)
            .unwrap();
        assert!(domain.schedule().contains(EntityKey::Marker(a)));
        assert!(!domain.schedule().contains(EntityKey::Marker(link)));
        let cell = domain.marker(a).unwrap().cell().unwrap();
        assert_eq!(
            domain.grid().cell(cell).unwrap().marker_by_id(domain.marker(a).unwrap().atom_id()),
            Some(a)
        );
    }

    #[test]
    fn test_trash_marker_cleans_cell_and_schedule() {
        let mut domain = test_domain();
        let (front, ids) = polygon_front(
            &mut domain,
            &[(100.0, 100.0), (100.0, 300.0), (300.0, 300.0), (300.0, 100.0)],
        );
        let cell = domain.marker(ids[0]).unwrap().cell().unwrap();
        domain.trash_marker(ids[0]).unwrap();
        assert_eq!(domain.grid().cell(cell).unwrap().marker_count(), 0);
        assert!(!domain.schedule().contains(EntityKey::Marker(ids[0])));
        assert_eq!(domain.front(front).unwrap().marker_count(), 3);
        assert!(domain.perimeter().is_closed(front));
    }

    #[test]
    fn test_ignition_triangle() {
        let mut domain = test_domain();
        let front = domain
            .start_fire(Point::new(100.0, 100.0, 0.0), 0.0)
            .unwrap();
        let f = domain.front(front).unwrap();
        assert_eq!(f.marker_count(), 3);
        assert!(f.is_expanding());
        assert!(domain.perimeter().is_closed(front));
    }

    #[test]
    fn test_step_moves_markers_outward() {
        let mut domain = test_domain();
        let front = domain
            .start_fire(Point::new(500.0, 500.0, 0.0), 0.0)
            .unwrap();
        let area_before = domain.perimeter().area(front);
        domain.step_to(30.0).unwrap();
        assert_eq!(domain.time(), 30.0);
        let area_after = domain.perimeter().area(front);
        assert!(area_after > area_before);
        assert!(domain.perimeter().is_closed(front));
        assert!(domain.front(front).unwrap().is_expanding());
        assert!(domain.processed_events() > 0);
        assert!(domain.backup.is_some());
    }

    #[test]
    fn test_first_step_recovers_from_broken_chain() {
        let mut domain = test_domain();
        let front = domain
            .start_fire(Point::new(500.0, 500.0, 0.0), 0.0)
            .unwrap();
        assert!(domain.backup.is_some());
        let head = domain.front(front).unwrap().head().unwrap();
        domain.perimeter.marker_mut(head).unwrap().next = None;

        domain.step_to(10.0).unwrap();
        assert_eq!(domain.time(), 10.0);
        assert!(!domain.is_safe_topology_mode());
        for f in domain.all_fronts() {
            assert!(domain.perimeter().is_closed(f));
        }
    }

    #[test]
    fn test_open_chain_without_backup_is_reported() {
        let mut domain = test_domain();
        let front = domain.add_fire_front(0.0, None).unwrap();
        let mut prev = None;
        for (x, y) in [(500.0, 500.0), (500.0, 540.0), (540.0, 500.0)] {
            let init = MarkerInit::new(Point::new(x, y, 0.0), 0.0);
            prev = Some(domain.add_marker(front, prev, init).unwrap());
        }
        assert!(domain.backup.is_none());
        let err = domain.step_to(10.0).unwrap_err();
        assert!(matches!(err, StepError::Topology(_)));
    }

    #[test]
    fn test_negative_time_marker_stays_unscheduled() {
        let mut domain = test_domain();
        let front = domain.add_fire_front(0.0, None).unwrap();
        let id = domain
            .add_marker(front, None, MarkerInit::new(Point::new(50.0, 50.0, 0.0), -5.0))
            .unwrap();
        assert!(!domain.schedule().contains(EntityKey::Marker(id)));
        assert!(domain.marker(id).unwrap().update_time.is_infinite());
    }

    #[test]
    fn test_curvature_slows_convex_corners() {
        let corner = [
            (100.0, 100.0),
            (100.0, 300.0),
            (200.0, 300.0),
            (200.0, 200.0),
            (300.0, 200.0),
            (300.0, 100.0),
        ];
        let update_times = |smoothing: f64| {
            let params = SimulationParameters {
                atmo_nx: 10,
                atmo_ny: 10,
                smoothing,
                ..Default::default()
            };
            let mut domain =
                Domain::new(0, Point::zeros(), Point::new(1000.0, 1000.0, 0.0), 0.0, params)
                    .unwrap();
            let (front, ids) = polygon_front(&mut domain, &corner);
            assert!(domain.front(front).unwrap().is_expanding());
            let mut times = Vec::new();
            for id in [ids[1], ids[3]] {
                domain.advance_marker(id).unwrap();
                times.push(domain.marker(id).unwrap().update_time);
            }
            times
        };
        let plain = update_times(0.0);
        let smoothed = update_times(1.0);
        // convex corner
        assert!(smoothed[0] > plain[0]);
        // concave corner
        assert!(smoothed[1] < plain[1]);
    }

    #[test]
    fn test_restore_reproduces_backup() {
        let mut domain = test_domain();
        domain
            .start_fire(Point::new(500.0, 500.0, 0.0), 0.0)
            .unwrap();
        domain.step_to(10.0).unwrap();
        let saved = outlines(&domain);

        let front = domain.top_level_fronts()[0];
        let head = domain.front(front).unwrap().head().unwrap();
        domain.perimeter.marker_mut(head).unwrap().next = None;
        domain.restore_valid_state().unwrap();

        assert_eq!(outlines(&domain), saved);
        for f in domain.all_fronts() {
            assert!(domain.perimeter().is_closed(f));
        }
    }

    #[test]
    fn test_step_recovers_in_safe_mode() {
        let mut domain = test_domain();
        domain
            .start_fire(Point::new(500.0, 500.0, 0.0), 0.0)
            .unwrap();
        domain.step_to(10.0).unwrap();

        let front = domain.top_level_fronts()[0];
        let head = domain.front(front).unwrap().head().unwrap();
        domain.perimeter.marker_mut(head).unwrap().next = None;

        domain.step_to(20.0).unwrap();
        assert!(!domain.is_safe_topology_mode());
        assert_eq!(domain.time(), 20.0);
        for f in domain.all_fronts() {
            assert!(domain.perimeter().is_closed(f));
        }
    }
}
