//! Point masses in the chassis lattice.
//!
//! A [`PhysicsNode`] is a mass point whose kinematic state lives in the
//! external [`RigidBodyStore`](crate::integrator::RigidBodyStore). The node
//! itself tracks lattice role flags, its stress budget, and which beams are
//! incident on it. Nodes do not own beams; beam references are plain indices
//! into the assembly's beam list.

use nalgebra::Vector3;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::integrator::RigidBodyStore;
use crate::types::{BodyId, NodeFlags, NodeId};

/// Factor applied to `max_stress` when a node takes overstress damage.
const OVERSTRESS_WEAKEN: f64 = 0.5;

/// A mass point in the chassis lattice.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicsNode {
    id: NodeId,
    body: BodyId,
    mass: f64,
    max_stress: f64,
    flags: NodeFlags,
    /// Indices into the assembly's beam list. 18 covers every neighbor a
    /// grid-interior node reaches at the 1.5-unit join threshold.
    incident_beams: SmallVec<[usize; 18]>,
}

impl PhysicsNode {
    /// Create a node bound to a body in the external store.
    #[must_use]
    pub fn new(id: NodeId, body: BodyId, mass: f64, max_stress: f64, flags: NodeFlags) -> Self {
        Self {
            id,
            body,
            mass,
            max_stress,
            flags,
            incident_beams: SmallVec::new(),
        }
    }

    /// The node's grid-derived identifier.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Handle of the body backing this node.
    #[must_use]
    pub const fn body(&self) -> BodyId {
        self.body
    }

    /// Node mass in kilograms.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Current stress budget. Only ever decreases once damage lands.
    #[must_use]
    pub const fn max_stress(&self) -> f64 {
        self.max_stress
    }

    /// Role and state flags.
    #[must_use]
    pub const fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether this node sits in the ground-contact layer.
    #[must_use]
    pub const fn is_ground_contact(&self) -> bool {
        self.flags.contains(NodeFlags::GROUND_CONTACT)
    }

    /// Whether this node is fixed (kinematic).
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.flags.contains(NodeFlags::FIXED)
    }

    /// Whether the overstress transition has already fired.
    #[must_use]
    pub const fn is_damaged(&self) -> bool {
        self.flags.contains(NodeFlags::DAMAGED)
    }

    /// Beams incident on this node, as indices into the assembly beam list.
    #[must_use]
    pub fn incident_beams(&self) -> &[usize] {
        &self.incident_beams
    }

    /// Register an incident beam. Called by the topology builder.
    pub(crate) fn attach_beam(&mut self, beam_index: usize) {
        self.incident_beams.push(beam_index);
    }

    /// Accumulate a force on the backing body.
    ///
    /// Silent no-op when the node is fixed; fixed nodes hold position but
    /// still occupy the lattice for topology purposes.
    pub fn apply_force(&self, store: &mut dyn RigidBodyStore, force: Vector3<f64>) {
        if self.is_fixed() {
            return;
        }
        store.apply_force(self.body, force, None);
    }

    /// Toggle whether the node participates in dynamics.
    pub fn set_fixed(&mut self, store: &mut dyn RigidBodyStore, fixed: bool) {
        self.flags.set(NodeFlags::FIXED, fixed);
        store.set_kinematic(self.body, fixed);
    }

    /// Feed the node its summed incident-beam stress for this tick.
    ///
    /// Returns `true` when this call fires the overstress transition: the
    /// stress budget is halved (permanently) and the caller must apply
    /// `add_damage(0.3)` to every incident beam. The transition fires at
    /// most once; a damaged node ignores further overstress.
    pub fn accumulate_stress(&mut self, total_stress: f64) -> bool {
        if self.is_damaged() || total_stress <= self.max_stress {
            return false;
        }
        self.max_stress *= OVERSTRESS_WEAKEN;
        self.flags.insert(NodeFlags::DAMAGED);
        tracing::debug!(node = %self.id, max_stress = self.max_stress, "node overstressed");
        true
    }

    /// Weaken the stress budget by a factor. Used when an incident beam
    /// breaks; the weakening is permanent.
    pub(crate) fn weaken(&mut self, factor: f64) {
        self.max_stress *= factor;
    }
}
