//! Chassis lattice construction: grid layout and beam topology.
//!
//! Nodes are laid out as a 3D grid covering the configured
//! width × height × length at fixed spacing, with the bottom layer resting
//! on y = 0. The per-axis resolution is `ceil(dimension / spacing) + 1`.
//! Total vehicle mass splits evenly across all grid nodes; bottom-layer
//! nodes are flagged ground-contact-capable and boundary nodes get a
//! hardened stress budget.
//!
//! Beams come from an O(n²) proximity join: every unordered node pair
//! closer than the join threshold gets one structural beam. Simplicity over
//! sparsity — no spatial partitioning, which is fine at the expected scale
//! of tens to low hundreds of nodes. Past ~500 nodes the quadratic cost
//! starts to bite and a spatial index would be warranted.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};
use crate::types::{NodeFlags, NodeId};

/// Unordered node pairs closer than this get a beam (length units).
pub const JOIN_THRESHOLD: f64 = 1.5;

/// Stress budget multiplier for boundary nodes.
pub const BOUNDARY_HARDENING: f64 = 1.5;

/// Dimensions and mass of the chassis lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticeConfig {
    /// Chassis width (x extent, meters).
    pub width: f64,
    /// Chassis height (y extent, meters).
    pub height: f64,
    /// Chassis length (z extent, meters).
    pub length: f64,
    /// Grid spacing (meters).
    pub spacing: f64,
    /// Total chassis mass, divided evenly across nodes (kg).
    pub total_mass: f64,
    /// Base per-node stress budget before boundary hardening (N).
    pub node_max_stress: f64,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            width: 1.8,
            height: 1.4,
            length: 4.2,
            spacing: 0.8,
            total_mass: 1200.0,
            node_max_stress: 10_000.0,
        }
    }
}

impl LatticeConfig {
    fn validate(&self) -> Result<()> {
        if self.spacing <= 0.0 {
            return Err(VehicleError::invalid_lattice("spacing must be positive"));
        }
        if self.width <= 0.0 || self.height <= 0.0 || self.length <= 0.0 {
            return Err(VehicleError::invalid_lattice(format!(
                "dimensions {}x{}x{} must all be positive",
                self.width, self.height, self.length
            )));
        }
        if self.total_mass <= 0.0 {
            return Err(VehicleError::invalid_lattice("total mass must be positive"));
        }
        Ok(())
    }

    /// Grid resolution per axis: `ceil(dimension / spacing) + 1`.
    #[must_use]
    pub fn resolution(&self) -> (usize, usize, usize) {
        let count = |dim: f64| (dim / self.spacing).ceil() as usize + 1;
        (
            count(self.width),
            count(self.height),
            count(self.length),
        )
    }
}

/// One node produced by the lattice builder, before body creation.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticeNode {
    /// Grid-derived identifier.
    pub id: NodeId,
    /// Initial position relative to the vehicle origin.
    pub position: Point3<f64>,
    /// Node mass (total mass / node count).
    pub mass: f64,
    /// Stress budget, hardened on the boundary.
    pub max_stress: f64,
    /// Role flags (ground contact, boundary).
    pub flags: NodeFlags,
}

/// The built lattice: nodes plus the beam topology as index pairs.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatticeBlueprint {
    /// Nodes in grid iteration order (x outermost, z innermost).
    pub nodes: Vec<LatticeNode>,
    /// Beam endpoints as unordered index pairs into `nodes`, `a < b`.
    pub beams: Vec<(usize, usize)>,
}

/// Build the chassis lattice for a configuration.
///
/// The grid is anchored at `-width/2` and `-length/2` in x and z with the
/// bottom layer at y = 0. With ceil-based resolution the grid overshoots on
/// the positive side whenever the spacing does not divide a dimension
/// evenly, so the origin sits inside the grid but not at its center.
pub fn build_lattice(config: &LatticeConfig) -> Result<LatticeBlueprint> {
    config.validate()?;

    let (nx, ny, nz) = config.resolution();
    let node_count = nx * ny * nz;
    let node_mass = config.total_mass / node_count as f64;

    let mut nodes = Vec::with_capacity(node_count);
    for ix in 0..nx {
        for iy in 0..ny {
            for iz in 0..nz {
                let position = Point3::new(
                    ix as f64 * config.spacing - config.width / 2.0,
                    iy as f64 * config.spacing,
                    iz as f64 * config.spacing - config.length / 2.0,
                );

                let mut flags = NodeFlags::empty();
                if iy == 0 {
                    flags.insert(NodeFlags::GROUND_CONTACT);
                }
                let boundary = ix == 0
                    || ix == nx - 1
                    || iy == 0
                    || iy == ny - 1
                    || iz == 0
                    || iz == nz - 1;
                if boundary {
                    flags.insert(NodeFlags::BOUNDARY);
                }

                let max_stress = if boundary {
                    config.node_max_stress * BOUNDARY_HARDENING
                } else {
                    config.node_max_stress
                };

                nodes.push(LatticeNode {
                    id: NodeId::from_grid(ix, iy, iz),
                    position,
                    mass: node_mass,
                    max_stress,
                    flags,
                });
            }
        }
    }

    // Proximity join over all unordered pairs.
    let mut beams = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let distance = (nodes[j].position - nodes[i].position).norm();
            if distance < JOIN_THRESHOLD {
                beams.push((i, j));
            }
        }
    }

    tracing::info!(
        nodes = nodes.len(),
        beams = beams.len(),
        resolution = ?(nx, ny, nz),
        "lattice built"
    );

    Ok(LatticeBlueprint { nodes, beams })
}
