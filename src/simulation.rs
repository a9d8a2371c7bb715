use crate::electron::Electron;
use crate::element::{Element, MaterialTable};
use crate::error::SimulationError;
use crate::grid::{Point3, VoxelGrid, EDGE_EPSILON};
use crate::physics;
use crate::rng::FastRng;
use crate::trajectory::{Trajectory, SOLID_MASK, VOID_MASK};
use crate::traversal::{find_crossings, Crossings};
use log::{debug, trace, warn};
use rayon::prelude::*;

/// Offset keeping entry and drop points off voxel faces, in nm.
const FACE_OFFSET: f64 = 1e-3;

/// Rough trajectory length to reserve; a 5 keV history in a dense deposit
/// records a few hundred scattering points.
const RECORD_RESERVE: usize = 128;

/// Beam and termination settings for one simulation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    /// Initial beam energy in keV
    pub e0: f64,
    /// Tracking cutoff in keV
    pub emin: f64,
    /// Call-level RNG seed; None draws a fresh one per call
    pub seed: Option<u64>,
}

/// One-shot batch simulation of primary-electron trajectories.
///
/// Holds a read-only grid snapshot and material table; `run` traces every
/// beam entry independently and returns trajectories ordered by entry index.
/// No state survives between calls.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: VoxelGrid,
    materials: MaterialTable,
    parameters: Parameters,
}

impl Simulation {
    pub fn new(
        grid: VoxelGrid,
        materials: MaterialTable,
        parameters: Parameters,
    ) -> Result<Self, SimulationError> {
        if !parameters.e0.is_finite() || parameters.e0 <= 0.0 {
            return Err(SimulationError::InvalidInput(format!(
                "beam energy must be positive, got {} keV",
                parameters.e0
            )));
        }
        if !parameters.emin.is_finite() || parameters.emin <= 0.0 {
            return Err(SimulationError::InvalidInput(format!(
                "cutoff energy must be positive, got {} keV",
                parameters.emin
            )));
        }
        if parameters.emin >= parameters.e0 {
            return Err(SimulationError::InvalidInput(format!(
                "cutoff {} keV must lie below beam energy {} keV",
                parameters.emin, parameters.e0
            )));
        }
        if parameters.e0 > 30.0 {
            warn!(
                "beam energy {} keV is above the validated 30 keV range",
                parameters.e0
            );
        }
        Ok(Simulation {
            grid,
            materials,
            parameters,
        })
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Trace one electron per (y, x) beam entry on the top face.
    ///
    /// Electrons are independent and traced on the rayon pool, each with a
    /// private RNG stream derived from the call seed and its entry index, so
    /// the result is reproducible for a fixed seed at any worker count. The
    /// returned list is ordered by entry index.
    pub fn run(&self, y0: &[f64], x0: &[f64]) -> Result<Vec<Trajectory>, SimulationError> {
        if y0.len() != x0.len() {
            return Err(SimulationError::InvalidInput(format!(
                "entry arrays differ in length: {} vs {}",
                y0.len(),
                x0.len()
            )));
        }
        let ext = self.grid.extents();
        for (i, (&y, &x)) in y0.iter().zip(x0).enumerate() {
            if !(EDGE_EPSILON..=ext[1] - EDGE_EPSILON).contains(&y)
                || !(EDGE_EPSILON..=ext[2] - EDGE_EPSILON).contains(&x)
            {
                return Err(SimulationError::InvalidInput(format!(
                    "entry {i} at (y={y}, x={x}) lies outside the top face"
                )));
            }
        }

        let seed = self.parameters.seed.unwrap_or_else(rand::random);
        debug!(
            "tracing {} electrons at E0 = {} keV (cutoff {} keV, seed {}) through a {:?} grid",
            y0.len(),
            self.parameters.e0,
            self.parameters.emin,
            seed,
            self.grid.shape()
        );

        (0..y0.len())
            .into_par_iter()
            .map(|i| {
                let mut rng = FastRng::for_electron(seed, i as u64);
                self.trace(i, y0[i], x0[i], &mut rng)
            })
            .collect()
    }

    /// Trace a single electron history.
    fn trace(
        &self,
        index: usize,
        y0: f64,
        x0: f64,
        rng: &mut FastRng,
    ) -> Result<Trajectory, SimulationError> {
        let h = self.grid.cell_dim();
        let ext = self.grid.extents();
        let emin = self.parameters.emin;

        let mut trajectory = Trajectory::with_capacity(RECORD_RESERVE);
        let mut electron =
            Electron::at_entry(Point3::new(ext[0] - FACE_OFFSET, y0, x0), self.parameters.e0);
        trajectory.push(&electron.position, electron.energy, VOID_MASK);

        // Drop through the empty column above the workpiece to just under the
        // top face of the highest solid cell.
        let entry_voxel = self.grid.voxel_of(&electron.position);
        if self.grid.label(entry_voxel) > -1.0 {
            match self
                .grid
                .highest_solid_below(entry_voxel[0], entry_voxel[1], entry_voxel[2])
            {
                Some(top) => {
                    let mut landing = electron.position;
                    landing[0] = (top + 1) as f64 * h - FACE_OFFSET;
                    electron.advance_to(landing);
                    trajectory.push(&electron.position, electron.energy, VOID_MASK);
                }
                None => {
                    // nothing solid in this column: record the drop and close
                    let mut landing = electron.position;
                    landing[0] = h - FACE_OFFSET;
                    electron.advance_to(landing);
                    trajectory.push(&electron.position, electron.energy, VOID_MASK);
                    trace!("electron {index}: empty column, closed after drop");
                    return Ok(trajectory);
                }
            }
        }

        let mut material = self.materials.deposit();

        while electron.energy > emin {
            let alpha = physics::screening_factor(electron.energy, material.z);
            let lambda = physics::elastic_mean_free_path(material, electron.energy, alpha);
            let mut step = physics::sample_step(lambda, rng);
            if !electron.sample_angles(alpha, rng) {
                return Err(self.physics_error(index, &electron, "NaN in scattering angles"));
            }
            if !electron.rotate() {
                return Err(self.physics_error(index, &electron, "NaN in direction update"));
            }

            let mut next = electron.proposed(step);
            let mut exiting = false;
            if let Some(clamped) = self.grid.clamp(&next) {
                step = (clamped - electron.position).norm();
                next = clamped;
                exiting = true;
            }

            let voxel = self.grid.voxel_of(&next);
            let label = self.grid.label(voxel);
            if label < 0.0 {
                // solid segment: Bethe loss over the full step
                self.apply_loss(index, &mut electron, material, step)?;
                electron.advance_to(next);
                trajectory.push(&electron.position, electron.energy, SOLID_MASK);
                if label != material.mark {
                    material = self.switch_material(index, voxel, label)?;
                }
            } else {
                // void landing: the electron flies in a straight line until
                // it re-enters solid or leaves the volume
                let ray_end = self.grid.exit_point(&electron.position, &electron.direction);
                match find_crossings(&self.grid, electron.position, ray_end, rng) {
                    Crossings::Both { surface, solid } => {
                        let travelled = (surface - electron.position).norm();
                        self.apply_loss(index, &mut electron, material, travelled)?;
                        electron.advance_to(surface);
                        trajectory.push(&electron.position, electron.energy, SOLID_MASK);
                        electron.advance_to(solid.point);
                        trajectory.push(&electron.position, electron.energy, VOID_MASK);
                        if solid.label != material.mark {
                            material = self.switch_material(index, solid.voxel, solid.label)?;
                        }
                        // re-entered solid inside the volume, keep tracing
                        exiting = false;
                    }
                    Crossings::SurfaceOnly { surface } => {
                        let travelled = (surface - electron.position).norm();
                        self.apply_loss(index, &mut electron, material, travelled)?;
                        electron.advance_to(surface);
                        trajectory.push(&electron.position, electron.energy, SOLID_MASK);
                        electron.advance_to(ray_end);
                        trajectory.push(&electron.position, electron.energy, VOID_MASK);
                        exiting = true;
                    }
                    Crossings::Miss => {
                        electron.advance_to(ray_end);
                        trajectory.push(&electron.position, electron.energy, VOID_MASK);
                        exiting = true;
                    }
                }
            }

            if exiting {
                trace!("electron {index}: left the volume after {} records", trajectory.len());
                return Ok(trajectory);
            }
        }

        trace!(
            "electron {index}: slowed below cutoff after {} records",
            trajectory.len()
        );
        Ok(trajectory)
    }

    /// Apply the Bethe loss over one travelled distance, failing before the
    /// state is touched if the energy would drop below zero.
    fn apply_loss(
        &self,
        index: usize,
        electron: &mut Electron,
        material: &Element,
        distance: f64,
    ) -> Result<(), SimulationError> {
        let after =
            electron.energy + physics::stopping_power(material, electron.energy) * distance;
        if after < 0.0 {
            return Err(self.physics_error(index, electron, "energy went negative"));
        }
        electron.energy = after;
        Ok(())
    }

    fn switch_material(
        &self,
        index: usize,
        voxel: [usize; 3],
        label: f64,
    ) -> Result<&Element, SimulationError> {
        self.materials
            .by_mark(label)
            .ok_or(SimulationError::GridConsistencyError {
                electron: index,
                voxel,
                label,
            })
    }

    fn physics_error(&self, index: usize, electron: &Electron, reason: &str) -> SimulationError {
        SimulationError::PhysicsInvariantBroken {
            electron: index,
            reason: reason.to_string(),
            point: [
                electron.position[0],
                electron.position[1],
                electron.position[2],
            ],
            energy: electron.energy,
        }
    }
}
