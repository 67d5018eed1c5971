//! Front tree snapshots for safe-mode recovery.
//!
//! A snapshot mirrors the front tree in memory after every validated step. When a
//! step fails, the domain throws away its perimeter and rebuilds it from the last
//! snapshot before retrying.

use super::{Domain, MarkerInit};
use crate::core_types::{AtomId, FrontId, MarkerId, Point};
use crate::error::TopologyError;
use crate::perimeter::MarkerState;
use crate::simulation::{EntityKey, Event};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Saved state of one marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSnapshot {
    pub id: AtomId,
    pub location: Point,
    pub next_location: Point,
    pub velocity: Point,
    pub normal: Point,
    pub time: f64,
    pub update_time: f64,
    pub front_depth: f64,
    pub curvature: f64,
    pub state: MarkerState,
}

/// Saved state of a front: its markers in cycle order and its inner fronts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontSnapshot {
    pub id: AtomId,
    pub time: f64,
    pub expanding: bool,
    pub markers: Vec<MarkerSnapshot>,
    pub inner: Vec<FrontSnapshot>,
}

impl FrontSnapshot {
    /// Markers in this front and all nested fronts.
    pub fn total_markers(&self) -> usize {
        self.markers.len() + self.inner.iter().map(Self::total_markers).sum::<usize>()
    }
}

/// Saved front tree of a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    pub time: f64,
    pub fronts: Vec<FrontSnapshot>,
}

impl DomainSnapshot {
    pub fn total_markers(&self) -> usize {
        self.fronts.iter().map(FrontSnapshot::total_markers).sum()
    }
}

impl Domain {
    /// Mirror of the current front tree. Fronts with fewer than three markers or a
    /// broken cycle are left out (their inner fronts are kept).
    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            time: self.time,
            fronts: self.snapshot_fronts(&self.top_level_fronts()),
        }
    }

    fn snapshot_fronts(&self, fronts: &[FrontId]) -> Vec<FrontSnapshot> {
        let mut out = Vec::new();
        for &front in fronts {
            let Ok(f) = self.perimeter.front(front) else {
                continue;
            };
            let inner = self.snapshot_fronts(f.inner_fronts());
            let cycle = match self.perimeter.cycle(front) {
                Ok(cycle) if cycle.len() >= 3 => cycle,
                _ => {
                    out.extend(inner);
                    continue;
                }
            };
            let markers = cycle
                .into_iter()
                .filter_map(|id| self.perimeter.markers.get(id))
                .map(|m| MarkerSnapshot {
                    id: m.atom_id,
                    location: m.location,
                    next_location: m.next_location,
                    velocity: m.velocity,
                    normal: m.normal,
                    time: m.time,
                    update_time: m.update_time,
                    front_depth: m.front_depth,
                    curvature: m.curvature,
                    state: m.state,
                })
                .collect();
            out.push(FrontSnapshot {
                id: f.atom_id,
                time: f.time,
                expanding: f.expanding,
                markers,
                inner,
            });
        }
        out
    }

    /// Stores the current front tree as the last validated state.
    pub fn backup_state(&mut self) {
        let snapshot = self.snapshot();
        debug!(
            "Domain {} backed up {} fronts, {} markers at t={:.3}",
            self.id,
            snapshot.fronts.len(),
            snapshot.total_markers(),
            snapshot.time
        );
        self.backup = Some(snapshot);
    }

    pub fn backup(&self) -> Option<&DomainSnapshot> {
        self.backup.as_ref()
    }

    /// Replaces the perimeter with the last backup: every front and marker is
    /// dropped, then fronts, markers, cell membership and marker events are rebuilt.
    ///
    /// # Errors
    /// [`TopologyError::NoBackup`] before the first backup.
    pub fn restore_valid_state(&mut self) -> Result<(), TopologyError> {
        let snapshot = self.backup.clone().ok_or(TopologyError::NoBackup)?;
        self.clear_perimeter()?;

        let root = self.perimeter.root();
        let mut restored = FxHashMap::default();
        for front in &snapshot.fronts {
            self.rebuild_front(front, root, &mut restored)?;
        }
        info!(
            "Domain {} restored {} markers from t={:.3}",
            self.id,
            restored.len(),
            snapshot.time
        );
        Ok(())
    }

    fn clear_perimeter(&mut self) -> Result<(), TopologyError> {
        while let Some(&front) = self.top_level_fronts().first() {
            self.trash_front(front)?;
        }
        for id in self.perimeter.markers.keys().collect::<Vec<_>>() {
            self.trash_marker(id)?;
        }
        Ok(())
    }

    fn rebuild_front(
        &mut self,
        snapshot: &FrontSnapshot,
        parent: FrontId,
        restored: &mut FxHashMap<AtomId, MarkerId>,
    ) -> Result<(), TopologyError> {
        let front = self
            .perimeter
            .create_front(snapshot.id, snapshot.time, parent)?;
        let mut prev = None;
        for saved in &snapshot.markers {
            if restored.contains_key(&saved.id) {
                warn!("Marker {} appears twice in the backup, skipping it", saved.id);
                continue;
            }
            let init = MarkerInit::new(saved.location, saved.time)
                .velocity(saved.velocity)
                .front_depth(saved.front_depth)
                .curvature(saved.curvature)
                .state(saved.state)
                .id(saved.id);
            let id = self.add_marker(front, prev, init)?;
            {
                let m = self.perimeter.marker_mut(id)?;
                m.next_location = saved.next_location;
                m.normal = saved.normal;
                m.update_time = saved.update_time;
            }
            if saved.state.is_physical() {
                self.schedule.drop_entity_events(EntityKey::Marker(id));
                self.schedule
                    .insert(Event::new(EntityKey::Marker(id), saved.update_time));
            }
            restored.insert(saved.id, id);
            prev = Some(id);
        }
        self.perimeter.close_front(front)?;
        self.perimeter.front_mut(front)?.expanding = snapshot.expanding;
        if snapshot.id.domain_id == self.id {
            self.next_local_id = self.next_local_id.max(snapshot.id.local_id + 1);
        }
        for inner in &snapshot.inner {
            self.rebuild_front(inner, front, restored)?;
        }
        Ok(())
    }
}
