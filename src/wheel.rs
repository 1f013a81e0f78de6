//! Wheels: ground contact, the simplified tire force model, and telemetry.
//!
//! The ground is a flat plane at height 0. Contact is resolved from the
//! wheel center's height against that plane, and the center is clamped so
//! the wheel never penetrates it.
//!
//! The tire model is deliberately longitudinal-only: drive force along the
//! steered forward axis and brake force opposing the velocity direction.
//! The [`TireProperties`] bundle carries friction and slip limits that the
//! simplified model does not consume; they are kept for telemetry and for
//! integrators that implement their own slip response.

use nalgebra::{Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::integrator::RigidBodyStore;
use crate::types::BodyId;

/// Brake forces only act above this speed (m/s); below it the wheel is
/// treated as stopped.
const BRAKE_SPEED_FLOOR: f64 = 0.1;

/// Tire friction and slip limits.
///
/// Carried in full but only partially used: the simplified force model reads
/// none of these fields. Preserved as data so wheel telemetry and external
/// integrators can consume them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TireProperties {
    /// Dry surface friction coefficient.
    pub friction_coefficient: f64,
    /// Rolling resistance coefficient.
    pub rolling_resistance: f64,
    /// Maximum slip angle before grip loss (radians).
    pub max_slip_angle: f64,
    /// Maximum longitudinal slip ratio before grip loss.
    pub max_slip_ratio: f64,
}

impl Default for TireProperties {
    fn default() -> Self {
        Self {
            friction_coefficient: 1.0,
            rolling_resistance: 0.015,
            max_slip_angle: 0.14,
            max_slip_ratio: 0.12,
        }
    }
}

/// Geometry and role configuration for one wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WheelConfig {
    /// Wheel radius in meters.
    pub radius: f64,
    /// Wheel width in meters.
    pub width: f64,
    /// Wheel mass in kilograms.
    pub mass: f64,
    /// Whether the wheel responds to steering input.
    pub steered: bool,
    /// Whether the wheel receives drive force.
    pub driven: bool,
    /// Tire property bundle.
    pub tire: TireProperties,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            radius: 0.35,
            width: 0.25,
            mass: 20.0,
            steered: false,
            driven: false,
            tire: TireProperties::default(),
        }
    }
}

/// Read-only telemetry snapshot for one wheel.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WheelData {
    /// Wheel index within the vehicle.
    pub index: usize,
    /// Wheel center position.
    pub position: Point3<f64>,
    /// Wheel body velocity.
    pub velocity: Vector3<f64>,
    /// Whether the wheel touched the ground on the last update.
    pub grounded: bool,
    /// Ground contact point (meaningful only while grounded).
    pub contact_point: Point3<f64>,
    /// Ground normal at the contact.
    pub ground_normal: Vector3<f64>,
    /// Steering angle in radians.
    pub steer_angle: f64,
    /// Rotational speed from ground speed (rad/s); telemetry only.
    pub spin_velocity: f64,
    /// Lateral slip metric. Tracked, not modeled; stays 0 in this core.
    pub lateral_slip: f64,
    /// Longitudinal slip metric. Tracked, not modeled; stays 0 in this core.
    pub longitudinal_slip: f64,
    /// Magnitude of the lateral tire force applied on the last update.
    pub lateral_force: f64,
    /// Magnitude of the longitudinal tire force applied on the last update.
    pub longitudinal_force: f64,
}

/// A wheel body with steering, drive/brake inputs, and ground contact.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wheel {
    index: usize,
    body: BodyId,
    config: WheelConfig,
    base_orientation: UnitQuaternion<f64>,
    orientation: UnitQuaternion<f64>,
    steer_angle: f64,
    drive_force: f64,
    brake_force: f64,
    grounded: bool,
    contact_point: Point3<f64>,
    ground_normal: Vector3<f64>,
    spin_velocity: f64,
    lateral_slip: f64,
    longitudinal_slip: f64,
    lateral_force: Vector3<f64>,
    longitudinal_force: Vector3<f64>,
}

impl Wheel {
    /// Create a wheel bound to a body in the external store.
    #[must_use]
    pub fn new(index: usize, body: BodyId, config: WheelConfig) -> Self {
        Self {
            index,
            body,
            config,
            base_orientation: UnitQuaternion::identity(),
            orientation: UnitQuaternion::identity(),
            steer_angle: 0.0,
            drive_force: 0.0,
            brake_force: 0.0,
            grounded: false,
            contact_point: Point3::origin(),
            ground_normal: Vector3::y(),
            spin_velocity: 0.0,
            lateral_slip: 0.0,
            longitudinal_slip: 0.0,
            lateral_force: Vector3::zeros(),
            longitudinal_force: Vector3::zeros(),
        }
    }

    /// Wheel index within the vehicle's wheel set.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Handle of the body backing this wheel.
    #[must_use]
    pub const fn body(&self) -> BodyId {
        self.body
    }

    /// The wheel's configuration.
    #[must_use]
    pub const fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Whether the wheel was grounded on the last update.
    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Current steering angle in radians.
    #[must_use]
    pub const fn steer_angle(&self) -> f64 {
        self.steer_angle
    }

    /// Current drive force input in newtons.
    #[must_use]
    pub const fn drive_force(&self) -> f64 {
        self.drive_force
    }

    /// Current brake force input in newtons.
    #[must_use]
    pub const fn brake_force(&self) -> f64 {
        self.brake_force
    }

    /// Rotational speed inferred from ground speed (rad/s).
    #[must_use]
    pub const fn spin_velocity(&self) -> f64 {
        self.spin_velocity
    }

    /// The wheel's forward direction under the current steering angle.
    #[must_use]
    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * Vector3::z()
    }

    /// Set the steering angle.
    ///
    /// Silent no-op unless the wheel is steered. The orientation becomes the
    /// base wheel orientation composed with a yaw rotation by `angle`.
    pub fn set_steering(&mut self, angle: f64) {
        if !self.config.steered {
            return;
        }
        self.steer_angle = angle;
        self.orientation =
            self.base_orientation * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);
    }

    /// Set the drive force. Silent no-op unless the wheel is driven.
    pub fn set_drive_force(&mut self, force: f64) {
        if !self.config.driven {
            return;
        }
        self.drive_force = force;
    }

    /// Set the brake force. Settable on every wheel regardless of role.
    pub fn set_brake_force(&mut self, force: f64) {
        self.brake_force = force;
    }

    /// Run one tick: resolve ground contact, compute tire forces, apply them
    /// at the contact point, and refresh rotation bookkeeping.
    pub fn update(&mut self, store: &mut dyn RigidBodyStore) {
        let radius = self.config.radius;
        let position = store.position(self.body);

        // Ground contact against the plane at height 0, clamping the center
        // so the wheel never penetrates.
        self.grounded = position.y - radius <= 0.0;
        if self.grounded {
            self.contact_point = Point3::new(position.x, radius, position.z);
            self.ground_normal = Vector3::y();
            if position.y < radius {
                store.set_position(self.body, Point3::new(position.x, radius, position.z));
            }
        }

        self.lateral_force = Vector3::zeros();
        self.longitudinal_force = Vector3::zeros();
        if !self.grounded {
            return;
        }

        if self.drive_force != 0.0 {
            self.longitudinal_force = self.forward() * self.drive_force;
        }

        let velocity = store.velocity(self.body);
        let speed = velocity.norm();
        if self.brake_force > 0.0 && speed > BRAKE_SPEED_FLOOR {
            self.longitudinal_force -= (velocity / speed) * self.brake_force;
        }

        self.spin_velocity = speed / radius;

        let total = self.lateral_force + self.longitudinal_force;
        if total != Vector3::zeros() {
            store.apply_force(self.body, total, Some(self.contact_point));
        }
    }

    /// Zero all inputs and kinematics and re-pose the wheel body.
    pub fn reset(&mut self, store: &mut dyn RigidBodyStore, position: Point3<f64>) {
        self.steer_angle = 0.0;
        self.drive_force = 0.0;
        self.brake_force = 0.0;
        self.spin_velocity = 0.0;
        self.grounded = false;
        self.orientation = self.base_orientation;
        store.set_position(self.body, position);
        store.set_velocity(self.body, Vector3::zeros());
    }

    /// Telemetry snapshot for this wheel.
    #[must_use]
    pub fn wheel_data(&self, store: &dyn RigidBodyStore) -> WheelData {
        WheelData {
            index: self.index,
            position: store.position(self.body),
            velocity: store.velocity(self.body),
            grounded: self.grounded,
            contact_point: self.contact_point,
            ground_normal: self.ground_normal,
            steer_angle: self.steer_angle,
            spin_velocity: self.spin_velocity,
            lateral_slip: self.lateral_slip,
            longitudinal_slip: self.longitudinal_slip,
            lateral_force: self.lateral_force.norm(),
            longitudinal_force: self.longitudinal_force.norm(),
        }
    }
}
