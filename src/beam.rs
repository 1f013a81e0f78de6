//! Spring-damper links between lattice nodes.
//!
//! A [`StructuralBeam`] connects two nodes and generates an axial
//! spring-damper force each tick. Beams carry the lattice's damage model:
//!
//! ```text
//! Intact ──add_damage──▶ Damaged (0 < level ≤ 0.8) ──level > 0.8──▶ Broken
//! ```
//!
//! Damage attenuates the restoring force linearly. Breaking is terminal: a
//! broken beam contributes zero force forever and is never recreated short
//! of rebuilding the vehicle. Overstress accrues a fixed 0.1 damage per tick
//! regardless of how far the stress exceeds the threshold; the increment is
//! deliberately not proportional to the overshoot.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Damage accrued per overstressed tick.
const OVERSTRESS_DAMAGE: f64 = 0.1;
/// Damage level beyond which a beam breaks.
const BREAK_THRESHOLD: f64 = 0.8;
/// Lengths below this are treated as degenerate and skip force computation.
const MIN_LENGTH: f64 = 1e-3;

/// Preset stiffness, damping and break threshold for a beam role.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeamPreset {
    /// Spring stiffness (N/m).
    pub stiffness: f64,
    /// Damping coefficient (N·s/m).
    pub damping: f64,
    /// Stress magnitude above which the beam accrues damage (N).
    pub max_stress: f64,
}

/// Role of a beam in the lattice, selecting a property preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BeamType {
    /// General chassis lattice member.
    Structural,
    /// Softer, heavily damped member for wheel attachment regions.
    Suspension,
    /// Compliant member for crumple regions.
    Flexible,
    /// Stiff, high-threshold member for hardened sections.
    Reinforcement,
}

impl BeamType {
    /// The property preset for this role.
    #[must_use]
    pub const fn preset(self) -> BeamPreset {
        match self {
            Self::Structural => BeamPreset {
                stiffness: 8000.0,
                damping: 120.0,
                max_stress: 5000.0,
            },
            Self::Suspension => BeamPreset {
                stiffness: 3000.0,
                damping: 350.0,
                max_stress: 4000.0,
            },
            Self::Flexible => BeamPreset {
                stiffness: 1500.0,
                damping: 80.0,
                max_stress: 2500.0,
            },
            Self::Reinforcement => BeamPreset {
                stiffness: 15_000.0,
                damping: 150.0,
                max_stress: 8000.0,
            },
        }
    }
}

/// A spring-damper link between two lattice nodes.
///
/// The beam owns the relationship, not the nodes; endpoints are referenced
/// by [`NodeId`]. Force computation is pure over the endpoint kinematic
/// states so beams can be exercised without a body store.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StructuralBeam {
    a: NodeId,
    b: NodeId,
    rest_length: f64,
    /// Spring stiffness (N/m). Overwritten wholesale by [`Self::set_beam_type`].
    pub stiffness: f64,
    /// Damping coefficient (N·s/m).
    pub damping: f64,
    /// Stress threshold for damage accrual (N).
    pub max_stress: f64,
    beam_type: BeamType,
    current_length: f64,
    current_stress: f64,
    damage_level: f64,
    broken: bool,
}

impl StructuralBeam {
    /// Create a beam between two nodes with the given rest length and role.
    #[must_use]
    pub fn new(a: NodeId, b: NodeId, rest_length: f64, beam_type: BeamType) -> Self {
        let preset = beam_type.preset();
        Self {
            a,
            b,
            rest_length,
            stiffness: preset.stiffness,
            damping: preset.damping,
            max_stress: preset.max_stress,
            beam_type,
            current_length: rest_length,
            current_stress: 0.0,
            damage_level: 0.0,
            broken: false,
        }
    }

    /// Create a beam whose rest length is the current distance between the
    /// endpoint positions.
    #[must_use]
    pub fn between(
        a: NodeId,
        b: NodeId,
        pos_a: Point3<f64>,
        pos_b: Point3<f64>,
        beam_type: BeamType,
    ) -> Self {
        Self::new(a, b, (pos_b - pos_a).norm(), beam_type)
    }

    /// First endpoint.
    #[must_use]
    pub const fn node_a(&self) -> NodeId {
        self.a
    }

    /// Second endpoint.
    #[must_use]
    pub const fn node_b(&self) -> NodeId {
        self.b
    }

    /// Natural, unstressed length fixed at creation.
    #[must_use]
    pub const fn rest_length(&self) -> f64 {
        self.rest_length
    }

    /// Endpoint distance measured on the most recent update.
    #[must_use]
    pub const fn current_length(&self) -> f64 {
        self.current_length
    }

    /// Force magnitude carried on the most recent update. Always ≥ 0.
    #[must_use]
    pub const fn current_stress(&self) -> f64 {
        self.current_stress
    }

    /// Cumulative degradation in `[0, 1]`. Monotonically non-decreasing.
    #[must_use]
    pub const fn damage_level(&self) -> f64 {
        self.damage_level
    }

    /// Remaining structural health, `1 − damage_level`.
    #[must_use]
    pub fn health(&self) -> f64 {
        1.0 - self.damage_level
    }

    /// Whether the beam has broken. One-way.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    /// Current role preset.
    #[must_use]
    pub const fn beam_type(&self) -> BeamType {
        self.beam_type
    }

    /// Switch the beam to a different role preset.
    ///
    /// Overwrites stiffness, damping and the stress threshold wholesale;
    /// presets are mutually exclusive, last write wins. Damage state is
    /// untouched.
    pub fn set_beam_type(&mut self, beam_type: BeamType) {
        let preset = beam_type.preset();
        self.beam_type = beam_type;
        self.stiffness = preset.stiffness;
        self.damping = preset.damping;
        self.max_stress = preset.max_stress;
    }

    /// Compute this tick's spring-damper force from the endpoint states.
    ///
    /// Returns the force to apply to endpoint A; the caller applies the
    /// negation to endpoint B (Newton's third law pair). Returns `None` when
    /// the beam is broken or the endpoints are degenerately close.
    ///
    /// Overstress (`current_stress > max_stress`) accrues a fixed 0.1 damage
    /// before the force is returned, so a beam can break on the same tick
    /// that its force is still applied.
    pub fn update(
        &mut self,
        pos_a: Point3<f64>,
        vel_a: Vector3<f64>,
        pos_b: Point3<f64>,
        vel_b: Vector3<f64>,
    ) -> Option<Vector3<f64>> {
        if self.broken {
            return None;
        }

        let delta = pos_b - pos_a;
        let length = delta.norm();
        self.current_length = length;
        if length < MIN_LENGTH {
            // Degenerate geometry: skip the tick rather than propagate NaN.
            return None;
        }

        let direction = delta / length;
        let displacement = length - self.rest_length;
        let attenuation = 1.0 - self.damage_level;

        let spring_force = displacement * self.stiffness * attenuation;
        let damping_force = (vel_b - vel_a).dot(&direction) * self.damping * attenuation;
        let total_force = spring_force + damping_force;

        self.current_stress = total_force.abs();
        if self.current_stress > self.max_stress {
            self.add_damage(OVERSTRESS_DAMAGE);
        }

        Some(direction * total_force)
    }

    /// Accrue damage and break the beam once the level passes 0.8.
    pub fn add_damage(&mut self, amount: f64) {
        self.damage_level = (self.damage_level + amount).min(1.0);
        if self.damage_level > BREAK_THRESHOLD && !self.broken {
            self.break_beam();
        }
    }

    /// Break the beam. Irreversible: the damage level pins at 1 and the beam
    /// contributes zero force from here on.
    ///
    /// The owning assembly observes the transition and weakens both endpoint
    /// nodes' stress budgets by 0.8.
    pub fn break_beam(&mut self) {
        self.broken = true;
        self.damage_level = 1.0;
        self.current_stress = 0.0;
        tracing::debug!(a = %self.a, b = %self.b, "beam broken");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn endpoints() -> (NodeId, NodeId) {
        (NodeId::from_grid(0, 0, 0), NodeId::from_grid(1, 0, 0))
    }

    #[test]
    fn test_rest_length_equilibrium_has_zero_stress() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.damping = 0.0;

        let force = beam.update(
            Point3::origin(),
            Vector3::zeros(),
            Point3::new(1.0, 0.0, 0.0),
            Vector3::zeros(),
        );

        assert_eq!(beam.current_stress(), 0.0);
        assert_relative_eq!(force.unwrap().norm(), 0.0);
    }

    #[test]
    fn test_stretched_beam_pulls_endpoints_together() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.damping = 0.0;

        // Stretched to 1.5: force on A points toward B (+x).
        let force = beam
            .update(
                Point3::origin(),
                Vector3::zeros(),
                Point3::new(1.5, 0.0, 0.0),
                Vector3::zeros(),
            )
            .unwrap();

        assert!(force.x > 0.0);
        assert_relative_eq!(force.x, 0.5 * beam.stiffness, epsilon = 1e-9);
        assert_relative_eq!(beam.current_stress(), 0.5 * beam.stiffness, epsilon = 1e-9);
    }

    #[test]
    fn test_damping_resists_separation() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.stiffness = 0.0;
        beam.damping = 100.0;

        // B moving away from A along the beam axis at 2 m/s.
        let force = beam
            .update(
                Point3::origin(),
                Vector3::zeros(),
                Point3::new(1.0, 0.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
            )
            .unwrap();

        // Positive along +x: pulls A after B, i.e. resists separation.
        assert_relative_eq!(force.x, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_damage_attenuates_force_linearly() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.damping = 0.0;
        beam.max_stress = f64::INFINITY;

        beam.add_damage(0.5);
        let force = beam
            .update(
                Point3::origin(),
                Vector3::zeros(),
                Point3::new(2.0, 0.0, 0.0),
                Vector3::zeros(),
            )
            .unwrap();

        assert_relative_eq!(force.x, 1.0 * beam.stiffness * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_damage_is_monotonic_and_clamped() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);

        let mut previous = 0.0;
        for amount in [0.05, 0.3, 0.0, 0.7, 0.4] {
            beam.add_damage(amount);
            assert!(beam.damage_level() >= previous);
            assert!(beam.damage_level() <= 1.0);
            previous = beam.damage_level();
        }
        assert_eq!(beam.damage_level(), 1.0);
    }

    #[test]
    fn test_break_threshold_is_strictly_above_0_8() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);

        // Eight 0.1 increments reach exactly 0.8, which does not break.
        for _ in 0..8 {
            beam.add_damage(0.1);
        }
        assert_relative_eq!(beam.damage_level(), 0.8, epsilon = 1e-12);
        assert!(!beam.is_broken());

        // The ninth pushes past the threshold.
        beam.add_damage(0.1);
        assert!(beam.is_broken());
        assert_eq!(beam.damage_level(), 1.0);
    }

    #[test]
    fn test_broken_beam_is_permanently_inert() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.break_beam();

        for _ in 0..5 {
            let force = beam.update(
                Point3::origin(),
                Vector3::zeros(),
                Point3::new(3.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
            );
            assert!(force.is_none());
            assert_eq!(beam.damage_level(), 1.0);
            assert_eq!(beam.current_stress(), 0.0);
        }
    }

    #[test]
    fn test_degenerate_length_skips_tick() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);

        let force = beam.update(
            Point3::origin(),
            Vector3::zeros(),
            Point3::new(1e-6, 0.0, 0.0),
            Vector3::zeros(),
        );
        assert!(force.is_none());
        assert!(!beam.is_broken());
    }

    #[test]
    fn test_overstress_accrues_fixed_increment() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.damping = 0.0;
        beam.max_stress = 1.0;

        // Wildly overstressed, but the increment stays at 0.1 per tick.
        beam.update(
            Point3::origin(),
            Vector3::zeros(),
            Point3::new(10.0, 0.0, 0.0),
            Vector3::zeros(),
        );
        assert_relative_eq!(beam.damage_level(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_preset_last_write_wins() {
        let (a, b) = endpoints();
        let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
        beam.stiffness = 42.0;

        beam.set_beam_type(BeamType::Suspension);
        let preset = BeamType::Suspension.preset();
        assert_eq!(beam.stiffness, preset.stiffness);
        assert_eq!(beam.damping, preset.damping);
        assert_eq!(beam.max_stress, preset.max_stress);
        assert_eq!(beam.beam_type(), BeamType::Suspension);
    }

    #[test]
    fn test_between_measures_rest_length() {
        let (a, b) = endpoints();
        let beam = StructuralBeam::between(
            a,
            b,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 4.0, 0.0),
            BeamType::Structural,
        );
        assert_relative_eq!(beam.rest_length(), 5.0, epsilon = 1e-12);
    }
}
