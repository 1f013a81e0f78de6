//! Vehicle assembly: topology construction and per-tick orchestration.
//!
//! A [`VehicleAssembly`] owns the chassis node map, the beam graph, the
//! wheel set, the wheel-to-chassis suspension links, and the drivetrain
//! state. Each tick, [`VehicleAssembly::update`] runs a fixed single-threaded
//! sequence:
//!
//! ```text
//! 1. every beam computes its spring-damper force → applied to its node pair
//! 2. every node accumulates its incident beams' stress (damage propagation)
//! 3. every wheel resolves ground contact and applies tire forces
//! ```
//!
//! All force contributions are submitted to the [`RigidBodyStore`] before
//! `update` returns; only then may the caller ask its integrator to advance
//! state. The assembly never integrates.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::beam::{BeamType, StructuralBeam};
use crate::drivetrain::{Drivetrain, DrivetrainConfig};
use crate::error::{Result, VehicleError};
use crate::integrator::RigidBodyStore;
use crate::lattice::{build_lattice, LatticeConfig};
use crate::node::PhysicsNode;
use crate::types::NodeId;
use crate::wheel::{Wheel, WheelConfig, WheelData};

/// Stress budget multiplier applied to a beam's endpoint nodes when the
/// beam breaks.
const BREAK_WEAKEN: f64 = 0.8;
/// Damage applied to every incident beam when a node overstresses.
const NODE_DAMAGE_SPILL: f64 = 0.3;

/// Full configuration for a vehicle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleConfig {
    /// Chassis lattice dimensions and mass.
    pub lattice: LatticeConfig,
    /// Distance between front and rear axles (meters).
    pub wheel_base: f64,
    /// Distance between left and right wheels (meters).
    pub track_width: f64,
    /// Shared wheel geometry; role flags are assigned per position.
    pub wheel: WheelConfig,
    /// Engine and gearbox configuration.
    pub drivetrain: DrivetrainConfig,
    /// Brake force at full brake input, applied to every wheel (N).
    pub max_brake_force: f64,
    /// Steering angle at full steering input (radians).
    pub max_steer_angle: f64,
    /// Offset the vehicle is re-posed at on [`VehicleAssembly::reset`].
    pub spawn_offset: Vector3<f64>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeConfig::default(),
            wheel_base: 2.6,
            track_width: 1.5,
            wheel: WheelConfig::default(),
            drivetrain: DrivetrainConfig::default(),
            max_brake_force: 3000.0,
            max_steer_angle: 30.0_f64.to_radians(),
            spawn_offset: Vector3::new(0.0, 0.5, 0.0),
        }
    }
}

impl VehicleConfig {
    fn validate(&self) -> Result<()> {
        if self.wheel.radius <= 0.0 {
            return Err(VehicleError::invalid_wheel("radius must be positive"));
        }
        if self.wheel.mass <= 0.0 {
            return Err(VehicleError::invalid_wheel("mass must be positive"));
        }
        Ok(())
    }
}

/// Fixed connection between a wheel and its nearest chassis node.
///
/// Resolved once at construction and never re-evaluated: if the chassis
/// deforms, the link target does not change. This is a behavioral contract,
/// not an optimization shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuspensionLink {
    /// Index of the wheel.
    pub wheel_index: usize,
    /// The chassis node the wheel is attached to.
    pub node: NodeId,
}

/// A simulated vehicle: node lattice, beam graph, wheels, and drivetrain.
#[derive(Debug)]
pub struct VehicleAssembly {
    config: VehicleConfig,
    nodes: HashMap<NodeId, PhysicsNode>,
    /// Node iteration order; the tick must be deterministic and hash-map
    /// order is not.
    node_order: Vec<NodeId>,
    /// As-built node positions, for re-posing on reset.
    node_rest_positions: Vec<Point3<f64>>,
    beams: Vec<StructuralBeam>,
    wheels: Vec<Wheel>,
    /// As-built wheel positions, for re-posing on reset.
    wheel_rest_positions: Vec<Point3<f64>>,
    suspension_links: Vec<SuspensionLink>,
    drivetrain: Drivetrain,
}

impl VehicleAssembly {
    /// Build a vehicle: lay out the chassis lattice, join it with beams,
    /// place the wheels, and attach each wheel to its nearest chassis node.
    ///
    /// Bodies for every node and wheel are created in `store`. The default
    /// configuration is front-wheel drive: the front pair is steered and
    /// driven, the rear pair neither.
    pub fn new(config: VehicleConfig, store: &mut dyn RigidBodyStore) -> Result<Self> {
        config.validate()?;
        let drivetrain = Drivetrain::new(config.drivetrain.clone())?;
        let lattice = build_lattice(&config.lattice)?;

        let mut nodes = HashMap::with_capacity(lattice.nodes.len());
        let mut node_order = Vec::with_capacity(lattice.nodes.len());
        let mut node_rest_positions = Vec::with_capacity(lattice.nodes.len());
        for lattice_node in &lattice.nodes {
            let body = store.add_body(lattice_node.position, lattice_node.mass);
            nodes.insert(
                lattice_node.id,
                PhysicsNode::new(
                    lattice_node.id,
                    body,
                    lattice_node.mass,
                    lattice_node.max_stress,
                    lattice_node.flags,
                ),
            );
            node_order.push(lattice_node.id);
            node_rest_positions.push(lattice_node.position);
        }

        let mut beams = Vec::with_capacity(lattice.beams.len());
        for &(i, j) in &lattice.beams {
            let (a, b) = (lattice.nodes[i], lattice.nodes[j]);
            let beam_index = beams.len();
            beams.push(StructuralBeam::between(
                a.id,
                b.id,
                a.position,
                b.position,
                BeamType::Structural,
            ));
            if let Some(node) = nodes.get_mut(&a.id) {
                node.attach_beam(beam_index);
            }
            if let Some(node) = nodes.get_mut(&b.id) {
                node.attach_beam(beam_index);
            }
        }

        // Four wheel positions from wheelbase and track width, resting on
        // the ground plane. Front pair (positive z) steered and driven.
        let half_track = config.track_width / 2.0;
        let half_base = config.wheel_base / 2.0;
        let radius = config.wheel.radius;
        let offsets = [
            (Point3::new(-half_track, radius, half_base), true),
            (Point3::new(half_track, radius, half_base), true),
            (Point3::new(-half_track, radius, -half_base), false),
            (Point3::new(half_track, radius, -half_base), false),
        ];

        let mut wheels = Vec::with_capacity(offsets.len());
        let mut wheel_rest_positions = Vec::with_capacity(offsets.len());
        let mut suspension_links = Vec::with_capacity(offsets.len());
        for (index, &(position, front)) in offsets.iter().enumerate() {
            let wheel_config = WheelConfig {
                steered: front,
                driven: front,
                ..config.wheel
            };
            let body = store.add_body(position, wheel_config.mass);
            wheels.push(Wheel::new(index, body, wheel_config));
            wheel_rest_positions.push(position);

            // Nearest-node search: O(n) linear scan, fixed at construction.
            let mut nearest = lattice.nodes[0].id;
            let mut nearest_distance = f64::INFINITY;
            for lattice_node in &lattice.nodes {
                let distance = (lattice_node.position - position).norm();
                if distance < nearest_distance {
                    nearest_distance = distance;
                    nearest = lattice_node.id;
                }
            }
            if let Some(node) = nodes.get(&nearest) {
                store.add_point_link(body, node.body());
            }
            suspension_links.push(SuspensionLink {
                wheel_index: index,
                node: nearest,
            });
        }

        tracing::info!(
            nodes = nodes.len(),
            beams = beams.len(),
            wheels = wheels.len(),
            "vehicle assembled"
        );

        Ok(Self {
            config,
            nodes,
            node_order,
            node_rest_positions,
            beams,
            wheels,
            wheel_rest_positions,
            suspension_links,
            drivetrain,
        })
    }

    /// Build a vehicle with the default configuration.
    pub fn with_defaults(store: &mut dyn RigidBodyStore) -> Result<Self> {
        Self::new(VehicleConfig::default(), store)
    }

    /// The vehicle configuration.
    #[must_use]
    pub const fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Run one simulation tick: beams, node stress propagation, wheels.
    ///
    /// Every force for the tick is submitted to `store` before this returns;
    /// the caller integrates afterwards. Non-positive `dt` skips the tick.
    pub fn update(&mut self, dt: f64, store: &mut dyn RigidBodyStore) {
        if dt <= 0.0 {
            return;
        }

        // Beam pass: spring-damper forces as Newton's third law pairs.
        for index in 0..self.beams.len() {
            let beam = &self.beams[index];
            let (id_a, id_b) = (beam.node_a(), beam.node_b());
            let (Some(node_a), Some(node_b)) = (self.nodes.get(&id_a), self.nodes.get(&id_b))
            else {
                continue;
            };
            let (body_a, body_b) = (node_a.body(), node_b.body());

            let was_broken = self.beams[index].is_broken();
            let force = self.beams[index].update(
                store.position(body_a),
                store.velocity(body_a),
                store.position(body_b),
                store.velocity(body_b),
            );
            if let Some(force) = force {
                if let Some(node) = self.nodes.get(&id_a) {
                    node.apply_force(store, force);
                }
                if let Some(node) = self.nodes.get(&id_b) {
                    node.apply_force(store, -force);
                }
            }
            if !was_broken && self.beams[index].is_broken() {
                self.weaken_endpoints(id_a, id_b);
            }
        }

        // Node pass: accumulate incident stress and propagate overstress
        // damage into the incident beams.
        for order_index in 0..self.node_order.len() {
            let id = self.node_order[order_index];
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let incident: Vec<usize> = node.incident_beams().to_vec();
            let total_stress: f64 = incident
                .iter()
                .map(|&beam| self.beams[beam].current_stress())
                .sum();

            let fired = self
                .nodes
                .get_mut(&id)
                .is_some_and(|node| node.accumulate_stress(total_stress));
            if !fired {
                continue;
            }
            for beam_index in incident {
                let was_broken = self.beams[beam_index].is_broken();
                self.beams[beam_index].add_damage(NODE_DAMAGE_SPILL);
                if !was_broken && self.beams[beam_index].is_broken() {
                    let (a, b) = (
                        self.beams[beam_index].node_a(),
                        self.beams[beam_index].node_b(),
                    );
                    self.weaken_endpoints(a, b);
                }
            }
        }

        // Wheel pass: ground contact and tire forces.
        for wheel in &mut self.wheels {
            wheel.update(store);
        }
    }

    fn weaken_endpoints(&mut self, a: NodeId, b: NodeId) {
        if let Some(node) = self.nodes.get_mut(&a) {
            node.weaken(BREAK_WEAKEN);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.weaken(BREAK_WEAKEN);
        }
    }

    /// Apply throttle input in `[0, 1]`.
    ///
    /// Recomputes the drivetrain chain and splits the resulting wheel force
    /// evenly across driven wheels. Throttle ≤ 0 drops the engine to idle
    /// and zeroes drive force everywhere.
    pub fn apply_throttle(&mut self, amount: f64) {
        let amount = amount.min(1.0);
        if amount <= 0.0 {
            self.drivetrain.set_idle();
            for wheel in &mut self.wheels {
                wheel.set_drive_force(0.0);
            }
            return;
        }

        let total_force = self.drivetrain.wheel_force(amount, self.config.wheel.radius);
        let driven = self
            .wheels
            .iter()
            .filter(|wheel| wheel.config().driven)
            .count();
        if driven == 0 {
            return;
        }
        let per_wheel = total_force / driven as f64;
        for wheel in &mut self.wheels {
            wheel.set_drive_force(per_wheel);
        }
    }

    /// Apply brake input in `[0, 1]`, scaled to the configured maximum brake
    /// force and applied to every wheel regardless of role.
    pub fn apply_brake(&mut self, amount: f64) {
        let force = amount.clamp(0.0, 1.0) * self.config.max_brake_force;
        for wheel in &mut self.wheels {
            wheel.set_brake_force(force);
        }
    }

    /// Apply steering input in `[-1, 1]`, scaled to the configured maximum
    /// steering angle. Only steered wheels respond.
    pub fn apply_steering(&mut self, value: f64) {
        let angle = value.clamp(-1.0, 1.0) * self.config.max_steer_angle;
        for wheel in &mut self.wheels {
            wheel.set_steering(angle);
        }
    }

    /// Re-pose the vehicle at the spawn offset and zero all inputs.
    ///
    /// Wheel kinematics, drive/brake/steer inputs, and engine RPM are
    /// cleared; nodes and wheels return to their as-built layout shifted by
    /// the spawn offset. Accumulated damage is not repaired: beams stay
    /// broken and weakened stress budgets stay weakened. Full repair means
    /// disposing of the vehicle and constructing a new one.
    pub fn reset(&mut self, store: &mut dyn RigidBodyStore) {
        let offset = self.config.spawn_offset;
        for (index, wheel) in self.wheels.iter_mut().enumerate() {
            wheel.reset(store, self.wheel_rest_positions[index] + offset);
        }
        for (index, id) in self.node_order.iter().enumerate() {
            if let Some(node) = self.nodes.get(id) {
                store.set_position(node.body(), self.node_rest_positions[index] + offset);
                store.set_velocity(node.body(), Vector3::zeros());
            }
        }
        self.drivetrain.set_idle();
    }

    /// Remove every body this vehicle created from the store.
    pub fn dispose(self, store: &mut dyn RigidBodyStore) {
        for node in self.nodes.values() {
            store.remove_body(node.body());
        }
        for wheel in &self.wheels {
            store.remove_body(wheel.body());
        }
    }

    /// Vehicle position: arithmetic mean of the wheel positions.
    ///
    /// Defined as the origin when the vehicle has no wheels.
    #[must_use]
    pub fn position(&self, store: &dyn RigidBodyStore) -> Point3<f64> {
        if self.wheels.is_empty() {
            return Point3::origin();
        }
        let sum: Vector3<f64> = self
            .wheels
            .iter()
            .map(|wheel| store.position(wheel.body()).coords)
            .sum();
        Point3::from(sum / self.wheels.len() as f64)
    }

    /// Vehicle velocity: arithmetic mean of the wheel velocities.
    #[must_use]
    pub fn velocity(&self, store: &dyn RigidBodyStore) -> Vector3<f64> {
        if self.wheels.is_empty() {
            return Vector3::zeros();
        }
        let sum: Vector3<f64> = self
            .wheels
            .iter()
            .map(|wheel| store.velocity(wheel.body()))
            .sum();
        sum / self.wheels.len() as f64
    }

    /// Vehicle speed: magnitude of the mean wheel velocity.
    #[must_use]
    pub fn speed(&self, store: &dyn RigidBodyStore) -> f64 {
        self.velocity(store).norm()
    }

    /// Toggle whether a node participates in dynamics.
    pub fn set_node_fixed(&mut self, id: NodeId, store: &mut dyn RigidBodyStore, fixed: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_fixed(store, fixed);
        }
    }

    /// The chassis nodes, keyed by grid-derived ID.
    #[must_use]
    pub const fn nodes(&self) -> &HashMap<NodeId, PhysicsNode> {
        &self.nodes
    }

    /// Look up a node by ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PhysicsNode> {
        self.nodes.get(&id)
    }

    /// The beam graph, in construction order.
    #[must_use]
    pub fn beams(&self) -> &[StructuralBeam] {
        &self.beams
    }

    /// The wheel set, in placement order (FL, FR, RL, RR).
    #[must_use]
    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    /// The fixed wheel-to-node suspension links.
    #[must_use]
    pub fn suspension_links(&self) -> &[SuspensionLink] {
        &self.suspension_links
    }

    /// Current engine/gearbox state.
    #[must_use]
    pub const fn drivetrain(&self) -> &Drivetrain {
        &self.drivetrain
    }

    /// Mutable engine/gearbox state, for gear selection.
    pub fn drivetrain_mut(&mut self) -> &mut Drivetrain {
        &mut self.drivetrain
    }

    /// Number of beams that have broken so far.
    #[must_use]
    pub fn broken_beam_count(&self) -> usize {
        self.beams.iter().filter(|beam| beam.is_broken()).count()
    }

    /// Telemetry snapshot for one wheel.
    #[must_use]
    pub fn wheel_data(&self, index: usize, store: &dyn RigidBodyStore) -> Option<WheelData> {
        self.wheels.get(index).map(|wheel| wheel.wheel_data(store))
    }
}
