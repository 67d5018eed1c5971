//! Identifiers for schedulable entities.
//!
//! Two families of ids live here:
//!
//! - [`AtomId`] is the globally unique identity of a marker or front across
//!   processes. It survives snapshots and is what gets exchanged between domains.
//! - [`MarkerId`] and [`FrontId`] are slot-map keys local to one domain. They carry
//!   a version so a handle to a recycled slot never aliases the new occupant.

use serde::{Deserialize, Serialize};

/// Number of bits reserved for the local part of a packed id.
const LOCAL_BITS: u32 = 40;
const LOCAL_MASK: u64 = (1 << LOCAL_BITS) - 1;

/// Scale used by the floating-point id encoding (`local + 1e7 * domain`).
const FLOAT_ID_DOMAIN_SCALE: f64 = 10_000_000.0;

/// Globally unique identity of a time-stamped entity: owning domain plus a local counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AtomId {
    /// Domain (process) that created the entity
    pub domain_id: u32,
    /// Counter value within that domain
    pub local_id: u64,
}

impl AtomId {
    pub const fn new(domain_id: u32, local_id: u64) -> Self {
        Self {
            domain_id,
            local_id,
        }
    }

    /// Packs the id as `domain_id << 40 | local_id`.
    pub const fn packed(self) -> u64 {
        ((self.domain_id as u64) << LOCAL_BITS) | (self.local_id & LOCAL_MASK)
    }

    /// Inverse of [`AtomId::packed`].
    pub const fn from_packed(packed: u64) -> Self {
        Self {
            domain_id: (packed >> LOCAL_BITS) as u32,
            local_id: packed & LOCAL_MASK,
        }
    }

    /// Floating-point encoding used when ids travel inside raster payloads.
    pub fn as_f64(self) -> f64 {
        self.local_id as f64 + FLOAT_ID_DOMAIN_SCALE * f64::from(self.domain_id)
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.domain_id, self.local_id)
    }
}

slotmap::new_key_type! {
    /// Handle to a marker stored in a domain's marker map.
    pub struct MarkerId;
    /// Handle to a front stored in a domain's front map.
    pub struct FrontId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_id_keeps_both_parts() {
        let id = AtomId::new(7, 123_456);
        let packed = id.packed();
        assert_eq!(packed >> 40, 7);
        assert_eq!(AtomId::from_packed(packed), id);
    }

    #[test]
    fn test_float_id_encoding() {
        assert_eq!(AtomId::new(2, 15).as_f64(), 20_000_015.0);
        assert_eq!(AtomId::new(0, 3).as_f64(), 3.0);
    }
}
