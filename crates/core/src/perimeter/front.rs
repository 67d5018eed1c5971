//! Fire fronts
//!
//! A [`Front`] is the entry point into one closed cycle of markers plus the list of
//! fronts nested inside it. The domain owns a root front without markers whose
//! inner fronts are the top-level perimeters.

use crate::core_types::{AtomId, FrontId, MarkerId};
use crate::simulation::TimeStamped;

#[derive(Debug, Clone)]
pub struct Front {
    pub(crate) atom_id: AtomId,
    /// Entry point into the marker cycle
    pub(crate) head: Option<MarkerId>,
    pub(crate) marker_count: usize,
    /// Clockwise winding: the enclosed area burns
    pub(crate) expanding: bool,
    /// Front this one is nested in; `None` only for the root
    pub(crate) parent: Option<FrontId>,
    pub(crate) inner: Vec<FrontId>,
    pub(crate) time: f64,
    pub(crate) update_time: f64,
}

impl Front {
    pub(crate) fn new(atom_id: AtomId, time: f64, parent: Option<FrontId>) -> Self {
        Self {
            atom_id,
            head: None,
            marker_count: 0,
            expanding: true,
            parent,
            inner: Vec::new(),
            time,
            update_time: f64::INFINITY,
        }
    }

    pub fn head(&self) -> Option<MarkerId> {
        self.head
    }

    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    pub fn is_expanding(&self) -> bool {
        self.expanding
    }

    pub fn parent(&self) -> Option<FrontId> {
        self.parent
    }

    pub fn inner_fronts(&self) -> &[FrontId] {
        &self.inner
    }

    pub(crate) fn remove_inner(&mut self, front: FrontId) {
        self.inner.retain(|&f| f != front);
    }
}

impl TimeStamped for Front {
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
