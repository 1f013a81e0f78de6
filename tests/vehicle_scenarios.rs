//! End-to-end scenarios for the vehicle dynamics core.
//!
//! These tests exercise the public API the way an embedding engine would:
//! build a vehicle into a [`BodySet`], feed control inputs, tick, and
//! inspect telemetry. Component-level behavior is covered by the unit tests
//! in each module; this file covers the cross-module contracts — topology
//! counts, the drivetrain-to-wheel force chain, and damage propagation
//! through the node/beam graph.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use sim_vehicle::{
    BeamType, BodySet, LatticeConfig, NodeId, RigidBodyStore, StructuralBeam, VehicleAssembly,
    VehicleConfig,
};

fn build_default() -> (VehicleAssembly, BodySet) {
    let mut bodies = BodySet::new();
    let vehicle = VehicleAssembly::new(VehicleConfig::default(), &mut bodies)
        .expect("default config builds");
    (vehicle, bodies)
}

// ============================================================================
// Topology (Scenario A)
// ============================================================================

/// With the source defaults (1.8 × 1.4 × 4.2 m at 0.8 m spacing), the grid
/// resolves to 4 × 3 × 7 nodes and the beam count matches a brute-force
/// recount of node pairs within the join threshold.
#[test]
fn test_default_topology_counts() {
    let (vehicle, bodies) = build_default();

    let expected_nodes = (1.8_f64 / 0.8).ceil() as usize + 1;
    let expected_nodes = expected_nodes
        * ((1.4_f64 / 0.8).ceil() as usize + 1)
        * ((4.2_f64 / 0.8).ceil() as usize + 1);
    assert_eq!(vehicle.nodes().len(), expected_nodes);
    assert_eq!(expected_nodes, 84);

    // Brute-force recount of pairs within 1.5 units.
    let positions: Vec<Point3<f64>> = vehicle
        .nodes()
        .values()
        .map(|node| bodies.position(node.body()))
        .collect();
    let mut expected_beams = 0;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if (positions[j] - positions[i]).norm() < 1.5 {
                expected_beams += 1;
            }
        }
    }
    assert_eq!(vehicle.beams().len(), expected_beams);
}

#[test]
fn test_beam_rest_lengths_match_initial_distances() {
    let (vehicle, bodies) = build_default();

    for beam in vehicle.beams() {
        let a = bodies.position(vehicle.node(beam.node_a()).expect("endpoint exists").body());
        let b = bodies.position(vehicle.node(beam.node_b()).expect("endpoint exists").body());
        assert_relative_eq!(beam.rest_length(), (b - a).norm(), epsilon = 1e-12);
    }
}

// ============================================================================
// Drivetrain chain (Scenario B)
// ============================================================================

/// Full throttle at the default curve pegs RPM at max; the resulting wheel
/// force runs through first gear (3.5) and the final drive (3.9), divides by
/// the wheel radius (0.35 m), and splits evenly across exactly two driven
/// wheels.
#[test]
fn test_full_throttle_force_reaches_driven_wheels() {
    let (mut vehicle, _) = build_default();

    vehicle.apply_throttle(1.0);

    let torque_at_max = vehicle.drivetrain().torque_curve().torque_at(7000.0);
    let expected_total = torque_at_max * 3.5 * 3.9 / 0.35;

    let driven: Vec<_> = vehicle
        .wheels()
        .iter()
        .filter(|wheel| wheel.config().driven)
        .collect();
    assert_eq!(driven.len(), 2);
    for wheel in driven {
        assert_relative_eq!(wheel.drive_force(), expected_total / 2.0, epsilon = 1e-6);
    }
}

#[test]
fn test_tick_submits_wheel_and_beam_forces_together() {
    let (mut vehicle, mut bodies) = build_default();

    // Load a beam by displacing one chassis node, and load the wheels with
    // throttle. Both kinds of force must land in the same tick, before any
    // integration happens.
    let node = vehicle.node(NodeId::from_grid(0, 0, 0)).expect("corner exists");
    let node_body = node.body();
    let rest = bodies.position(node_body);
    bodies.set_position(node_body, rest + Vector3::new(0.2, 0.0, 0.0));

    vehicle.apply_throttle(1.0);
    vehicle.update(1.0 / 60.0, &mut bodies);

    assert!(bodies.accumulated_force(node_body).norm() > 0.0);
    for wheel in vehicle.wheels() {
        if wheel.config().driven {
            assert!(bodies.accumulated_force(wheel.body()).norm() > 0.0);
        }
    }
}

// ============================================================================
// Beam damage accrual (Scenario C)
// ============================================================================

/// Held above its stress threshold, a beam accrues a fixed 0.1 damage per
/// tick: after eight ticks it sits at exactly 0.8 (not broken, since the
/// break condition is strictly greater), and the ninth tick breaks it.
#[test]
fn test_overstressed_beam_breaks_on_ninth_tick() {
    let a = NodeId::from_grid(0, 0, 0);
    let b = NodeId::from_grid(1, 0, 0);
    let mut beam = StructuralBeam::new(a, b, 1.0, BeamType::Structural);
    beam.damping = 0.0;
    beam.max_stress = 1.0; // any load overstresses, even heavily attenuated

    let pos_a = Point3::origin();
    let pos_b = Point3::new(2.0, 0.0, 0.0); // stretched to twice rest length

    for tick in 1..=8 {
        beam.update(pos_a, Vector3::zeros(), pos_b, Vector3::zeros());
        assert_relative_eq!(beam.damage_level(), 0.1 * f64::from(tick), epsilon = 1e-9);
        assert!(!beam.is_broken(), "beam must survive tick {tick}");
    }

    beam.update(pos_a, Vector3::zeros(), pos_b, Vector3::zeros());
    assert!(beam.is_broken());
    assert_eq!(beam.damage_level(), 1.0);

    // Broken is terminal: further ticks contribute nothing.
    let force = beam.update(pos_a, Vector3::zeros(), pos_b, Vector3::zeros());
    assert!(force.is_none());
    assert_eq!(beam.current_stress(), 0.0);
}

// ============================================================================
// Node damage propagation (P4)
// ============================================================================

/// When a node's summed incident-beam stress first exceeds its budget, the
/// budget halves exactly once and every incident beam takes exactly one
/// 0.3 damage hit; later overstress ticks change nothing.
#[test]
fn test_node_overstress_propagates_once() {
    let (mut vehicle, mut bodies) = build_default();

    // Displace the grid corner by 0.6 m: its seven incident beams sum to
    // roughly 16 kN of stress — above the hardened 15 kN budget — while each
    // stays below its own 5 kN threshold (so no per-beam overstress accrual
    // muddies the accounting).
    let corner = NodeId::from_grid(0, 0, 0);
    let corner_body = vehicle.node(corner).expect("corner exists").body();
    let rest = bodies.position(corner_body);
    bodies.set_position(corner_body, rest + Vector3::new(0.6, 0.0, 0.0));

    let initial_budget = vehicle.node(corner).expect("corner exists").max_stress();
    assert_relative_eq!(initial_budget, 15_000.0);

    let incident: Vec<usize> = vehicle
        .node(corner)
        .expect("corner exists")
        .incident_beams()
        .to_vec();
    assert_eq!(incident.len(), 7);

    vehicle.update(1.0 / 60.0, &mut bodies);

    let node = vehicle.node(corner).expect("corner exists");
    assert!(node.is_damaged());
    assert_relative_eq!(node.max_stress(), 7500.0);
    for &index in &incident {
        assert_relative_eq!(vehicle.beams()[index].damage_level(), 0.3, epsilon = 1e-12);
    }

    // The store is never integrated here, so the node stays displaced and
    // its beams stay loaded. The transition must not fire again.
    vehicle.update(1.0 / 60.0, &mut bodies);

    let node = vehicle.node(corner).expect("corner exists");
    assert_relative_eq!(node.max_stress(), 7500.0);
    for &index in &incident {
        assert_relative_eq!(vehicle.beams()[index].damage_level(), 0.3, epsilon = 1e-12);
    }
}

/// Under sustained extreme load the damage machinery runs end to end: beams
/// accrue damage each tick, break terminally, and breaking weakens the
/// endpoint stress budgets.
#[test]
fn test_sustained_overload_breaks_beams_terminally() {
    let (mut vehicle, mut bodies) = build_default();

    let corner = NodeId::from_grid(0, 0, 0);
    let corner_body = vehicle.node(corner).expect("corner exists").body();
    let rest = bodies.position(corner_body);
    bodies.set_position(corner_body, rest + Vector3::new(5.0, 0.0, 0.0));

    let mut previous_broken = 0;
    for _ in 0..20 {
        vehicle.update(1.0 / 60.0, &mut bodies);
        let broken = vehicle.broken_beam_count();
        assert!(broken >= previous_broken, "broken count must not regress");
        previous_broken = broken;
    }
    assert!(previous_broken > 0, "extreme load must break beams");

    // The corner node was both halved (overstress) and weakened by its
    // breaking beams, so its budget sits well below the as-built 15 kN.
    let node = vehicle.node(corner).expect("corner exists");
    assert!(node.is_damaged());
    assert!(node.max_stress() < 7500.0 + 1e-9);

    // Broken beams persist through reset.
    vehicle.reset(&mut bodies);
    assert_eq!(vehicle.broken_beam_count(), previous_broken);
}

// ============================================================================
// Wheels and telemetry
// ============================================================================

/// A wheel pushed below the ground plane is clamped back to riding height
/// on the next tick (P6).
#[test]
fn test_ground_clamp_restores_riding_height() {
    let (mut vehicle, mut bodies) = build_default();

    let wheel_body = vehicle.wheels()[0].body();
    let radius = vehicle.wheels()[0].config().radius;
    let position = bodies.position(wheel_body);
    bodies.set_position(wheel_body, Point3::new(position.x, 0.05, position.z));

    vehicle.update(1.0 / 60.0, &mut bodies);

    assert!(bodies.position(wheel_body).y >= radius);
    let data = vehicle.wheel_data(0, &bodies).expect("wheel 0 exists");
    assert!(data.grounded);
    assert_eq!(data.ground_normal, Vector3::y());
}

#[test]
fn test_braking_decelerating_force_opposes_motion() {
    let (mut vehicle, mut bodies) = build_default();

    // Roll every wheel forward, then brake hard.
    for wheel in vehicle.wheels() {
        bodies.set_velocity(wheel.body(), Vector3::new(0.0, 0.0, 10.0));
    }
    vehicle.apply_brake(1.0);
    vehicle.update(1.0 / 60.0, &mut bodies);

    for wheel in vehicle.wheels() {
        let force = bodies.accumulated_force(wheel.body());
        assert!(force.z < 0.0, "brake force must oppose +z motion");
    }
    assert_relative_eq!(vehicle.speed(&bodies), 10.0, epsilon = 1e-12);
}

#[test]
fn test_custom_lattice_dimensions() {
    let mut bodies = BodySet::new();
    let config = VehicleConfig {
        lattice: LatticeConfig {
            width: 2.0,
            height: 1.0,
            length: 3.0,
            spacing: 1.0,
            ..LatticeConfig::default()
        },
        ..VehicleConfig::default()
    };
    let vehicle = VehicleAssembly::new(config, &mut bodies).expect("config builds");

    // ceil(2/1)+1 = 3, ceil(1/1)+1 = 2, ceil(3/1)+1 = 4
    assert_eq!(vehicle.nodes().len(), 3 * 2 * 4);
}
