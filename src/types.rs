//! Core identifier and flag types for the vehicle lattice.
//!
//! - [`NodeId`] - Grid-derived identifier for a chassis node
//! - [`BodyId`] - Handle into the external rigid-body store
//! - [`NodeFlags`] - Per-node state flags (fixed, boundary, damaged, ...)

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle for a rigid body owned by the external integrator.
///
/// The dynamics core never owns positions or velocities; it reads and writes
/// them through a [`RigidBodyStore`](crate::integrator::RigidBodyStore) using
/// this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Stable identifier for a chassis node, derived from its grid coordinate.
///
/// The lattice builder assigns each node the packed coordinate of its grid
/// cell, so the ID survives any reordering of the node map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a node ID from a grid coordinate.
    ///
    /// Coordinates are packed 16 bits per axis, which comfortably covers the
    /// expected lattice resolutions (tens of nodes per axis).
    #[must_use]
    pub const fn from_grid(ix: usize, iy: usize, iz: usize) -> Self {
        Self(((ix as u64) << 32) | ((iy as u64) << 16) | (iz as u64))
    }

    /// Recover the grid coordinate this ID was derived from.
    #[must_use]
    pub const fn grid(self) -> (usize, usize, usize) {
        (
            ((self.0 >> 32) & 0xffff) as usize,
            ((self.0 >> 16) & 0xffff) as usize,
            (self.0 & 0xffff) as usize,
        )
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (ix, iy, iz) = self.grid();
        write!(f, "Node({ix},{iy},{iz})")
    }
}

bitflags::bitflags! {
    /// Flags for node state and lattice role.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct NodeFlags: u32 {
        /// Node sits in the bottom layer and may touch the ground.
        const GROUND_CONTACT = 0b0000_0001;
        /// Node lies on the lattice boundary (hardened at construction).
        const BOUNDARY = 0b0000_0010;
        /// Node is fixed (kinematic); forces applied to it are dropped.
        const FIXED = 0b0000_0100;
        /// Node has taken overstress damage (one-way).
        const DAMAGED = 0b0000_1000;
    }
}
