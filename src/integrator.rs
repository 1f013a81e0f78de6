//! The seam between the dynamics core and the external rigid-body integrator.
//!
//! This core never integrates. Each tick it reads kinematic state, computes
//! spring-damper and tire forces, and submits them through
//! [`RigidBodyStore::apply_force`]. After `VehicleAssembly::update` returns,
//! every force contribution for the tick has been accumulated and the caller
//! may ask its integrator to advance state; advancing mid-tick is a
//! correctness violation.
//!
//! [`BodySet`] is the reference store: plain kinematic storage plus force
//! accumulation, with no integration of its own. An external engine drains
//! [`BodySet::accumulated_force`] per body, advances positions and
//! velocities however it likes, then calls [`BodySet::clear_forces`].

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::BodyId;

/// Kinematic state store for the rigid bodies the vehicle is built from.
///
/// Implementations own position, velocity, and force accumulators for each
/// body. Lookups with an unknown [`BodyId`] are defined as silent no-ops
/// (zero vectors for reads) rather than errors; the core's per-tick path has
/// no failure mode.
pub trait RigidBodyStore {
    /// Create a body at the given position with the given mass.
    fn add_body(&mut self, position: Point3<f64>, mass: f64) -> BodyId;

    /// Remove a body and any links that reference it.
    fn remove_body(&mut self, id: BodyId);

    /// Current position of a body (origin if unknown).
    fn position(&self, id: BodyId) -> Point3<f64>;

    /// Current velocity of a body (zero if unknown).
    fn velocity(&self, id: BodyId) -> Vector3<f64>;

    /// Overwrite a body's position (used by reset and the ground clamp).
    fn set_position(&mut self, id: BodyId, position: Point3<f64>);

    /// Overwrite a body's velocity.
    fn set_velocity(&mut self, id: BodyId, velocity: Vector3<f64>);

    /// Accumulate a force on a body, optionally applied at a world point.
    ///
    /// The integrator clears accumulated forces after each integration step.
    fn apply_force(&mut self, id: BodyId, force: Vector3<f64>, at: Option<Point3<f64>>);

    /// Toggle a body between dynamic and kinematic integration.
    fn set_kinematic(&mut self, id: BodyId, kinematic: bool);

    /// Whether a body is currently kinematic.
    fn is_kinematic(&self, id: BodyId) -> bool;

    /// Create a rigid point-to-point link between two bodies.
    ///
    /// Used for the suspension attachment between each wheel and its nearest
    /// chassis node. The link is resolved by the external integrator.
    fn add_point_link(&mut self, a: BodyId, b: BodyId);
}

/// State kept per body in a [`BodySet`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct BodyEntry {
    position: Point3<f64>,
    velocity: Vector3<f64>,
    mass: f64,
    force: Vector3<f64>,
    kinematic: bool,
}

/// A force-accumulating body store with no integrator of its own.
///
/// Suitable as the backing store for headless tests and as the hand-off
/// structure to an external integration engine.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodySet {
    bodies: HashMap<BodyId, BodyEntry>,
    links: Vec<(BodyId, BodyId)>,
    next_id: u64,
}

impl BodySet {
    /// Create an empty body set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the set holds no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Mass of a body (zero if unknown).
    #[must_use]
    pub fn mass(&self, id: BodyId) -> f64 {
        self.bodies.get(&id).map_or(0.0, |b| b.mass)
    }

    /// Force accumulated on a body since the last [`Self::clear_forces`].
    #[must_use]
    pub fn accumulated_force(&self, id: BodyId) -> Vector3<f64> {
        self.bodies.get(&id).map_or_else(Vector3::zeros, |b| b.force)
    }

    /// Clear all force accumulators, as an integrator does after stepping.
    pub fn clear_forces(&mut self) {
        for body in self.bodies.values_mut() {
            body.force = Vector3::zeros();
        }
    }

    /// Point-to-point links registered so far, in creation order.
    #[must_use]
    pub fn point_links(&self) -> &[(BodyId, BodyId)] {
        &self.links
    }
}

impl RigidBodyStore for BodySet {
    fn add_body(&mut self, position: Point3<f64>, mass: f64) -> BodyId {
        let id = BodyId::new(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            id,
            BodyEntry {
                position,
                velocity: Vector3::zeros(),
                mass,
                force: Vector3::zeros(),
                kinematic: false,
            },
        );
        id
    }

    fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(&id);
        self.links.retain(|&(a, b)| a != id && b != id);
    }

    fn position(&self, id: BodyId) -> Point3<f64> {
        self.bodies.get(&id).map_or_else(Point3::origin, |b| b.position)
    }

    fn velocity(&self, id: BodyId) -> Vector3<f64> {
        self.bodies
            .get(&id)
            .map_or_else(Vector3::zeros, |b| b.velocity)
    }

    fn set_position(&mut self, id: BodyId, position: Point3<f64>) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vector3<f64>) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn apply_force(&mut self, id: BodyId, force: Vector3<f64>, _at: Option<Point3<f64>>) {
        // Point masses carry no angular state, so the application point only
        // matters to integrators that model torque; the reference store
        // accumulates the linear part.
        if let Some(body) = self.bodies.get_mut(&id) {
            body.force += force;
        }
    }

    fn set_kinematic(&mut self, id: BodyId, kinematic: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.kinematic = kinematic;
        }
    }

    fn is_kinematic(&self, id: BodyId) -> bool {
        self.bodies.get(&id).is_some_and(|b| b.kinematic)
    }

    fn add_point_link(&mut self, a: BodyId, b: BodyId) {
        self.links.push((a, b));
    }
}
