//! Soft-body vehicle dynamics core.
//!
//! A vehicle is modeled as a lattice of point masses ("nodes") connected by
//! spring-damper links ("beams"), plus a wheel set with a simplified
//! longitudinal tire model and an engine/drivetrain chain mapping throttle
//! to wheel force.
//!
//! ```text
//!      ●───●───●───●          nodes: point masses
//!     /│\ /│\ /│\ /│          beams: spring-dampers with a damage
//!    ● ● ● ● ● ● ● ●                 state machine (intact → damaged
//!    │/ \│/ \│/ \│/                   → broken, break is terminal)
//!    ●───●───●───●
//!   (◯)          (◯)         wheels: ground contact + tire forces
//! ```
//!
//! # Scope
//!
//! This core computes and submits forces; it never integrates. Kinematic
//! state lives behind the [`RigidBodyStore`] trait — an external rigid-body
//! integrator owns positions and velocities and advances them once all of a
//! tick's forces have been accumulated. [`BodySet`] is the bundled reference
//! store for headless use and tests.
//!
//! # Per-tick flow
//!
//! [`VehicleAssembly::update`] runs a fixed, single-threaded sequence: every
//! beam applies its spring-damper force pair, every node accumulates its
//! incident beams' stress (propagating damage when its budget is exceeded),
//! then every wheel resolves ground contact and applies tire forces. The
//! caller integrates afterwards. One vehicle is one-thread territory;
//! multiple vehicles may run on separate threads as long as they do not
//! share a store.
//!
//! # Quick start
//!
//! ```
//! use sim_vehicle::{BodySet, VehicleAssembly, VehicleConfig};
//!
//! let mut bodies = BodySet::new();
//! let mut vehicle = VehicleAssembly::new(VehicleConfig::default(), &mut bodies)?;
//!
//! vehicle.apply_throttle(0.6);
//! vehicle.apply_steering(0.2);
//! for _ in 0..60 {
//!     vehicle.update(1.0 / 60.0, &mut bodies);
//!     // ... hand `bodies` to an integrator, then clear its accumulators:
//!     bodies.clear_forces();
//! }
//!
//! let speed = vehicle.speed(&bodies);
//! # assert!(speed >= 0.0);
//! # Ok::<(), sim_vehicle::VehicleError>(())
//! ```
//!
//! # Error model
//!
//! Construction validates its configuration and returns [`VehicleError`];
//! the tick path has no error returns. Forces on fixed nodes, drive on
//! undriven wheels, and steering on unsteered wheels are silent no-ops, and
//! degenerate beam geometry skips force computation for the tick. The only
//! terminal condition is a broken beam, which is a domain event, not an
//! error — the simulation continues around it.

#![doc(html_root_url = "https://docs.rs/sim-vehicle/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
#![cfg_attr(
    test,
    allow(
        clippy::uninlined_format_args,
        clippy::float_cmp,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic
    )
)]

pub mod beam;
pub mod drivetrain;
pub mod error;
pub mod integrator;
pub mod lattice;
pub mod node;
pub mod types;
pub mod vehicle;
pub mod wheel;

// Re-export main types at crate root
pub use beam::{BeamPreset, BeamType, StructuralBeam};
pub use drivetrain::{Drivetrain, DrivetrainConfig, TorqueCurve};
pub use error::{Result, VehicleError};
pub use integrator::{BodySet, RigidBodyStore};
pub use lattice::{build_lattice, LatticeBlueprint, LatticeConfig, LatticeNode};
pub use node::PhysicsNode;
pub use types::{BodyId, NodeFlags, NodeId};
pub use vehicle::{SuspensionLink, VehicleAssembly, VehicleConfig};
pub use wheel::{TireProperties, Wheel, WheelConfig, WheelData};
