use crate::error::SimulationError;
use nalgebra::Vector3;

/// Spatial triple with components ordered (z, y, x), in nm. z is measured up
/// from the bottom face of the simulation volume.
pub type Point3 = Vector3<f64>;

/// Margin keeping recorded points off the bounding-box faces.
pub const EDGE_EPSILON: f64 = 1e-6;

/// Read-only voxel snapshot of the workpiece for one simulation call.
///
/// Two arrays of identical shape share an isotropic voxel edge `cell_dim`:
/// signed cell labels (negative = solid, -2 deposit / -1 substrate,
/// non-negative = void) and byte surface flags marking the interface layer.
/// `z_top` caches the highest surface layer as a column-scan hint.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    shape: [usize; 3],
    cell_dim: f64,
    cells: Vec<f64>,
    surface: Vec<u8>,
    z_top: f64,
    z_top_index: usize,
}

impl VoxelGrid {
    /// Build a snapshot from flattened row-major (z, y, x) arrays.
    pub fn new(
        shape: [usize; 3],
        cell_dim: f64,
        cells: Vec<f64>,
        surface: Vec<u8>,
    ) -> Result<Self, SimulationError> {
        if !(cell_dim > 0.0) || !cell_dim.is_finite() {
            return Err(SimulationError::InvalidInput(format!(
                "cell_dim must be positive and finite, got {cell_dim}"
            )));
        }
        let volume = shape[0] * shape[1] * shape[2];
        if volume == 0 {
            return Err(SimulationError::InvalidInput(format!(
                "grid shape ({}, {}, {}) has zero cells",
                shape[0], shape[1], shape[2]
            )));
        }
        if cells.len() != volume {
            return Err(SimulationError::InvalidInput(format!(
                "grid array has {} cells, shape implies {}",
                cells.len(),
                volume
            )));
        }
        if surface.len() != volume {
            return Err(SimulationError::InvalidInput(format!(
                "surface array has {} cells, grid has {}",
                surface.len(),
                volume
            )));
        }

        let layer = shape[1] * shape[2];
        let top_layer = (0..shape[0])
            .rev()
            .find(|i| surface[i * layer..(i + 1) * layer].iter().any(|&s| s != 0));
        let (z_top, z_top_index) = match top_layer {
            Some(i) => (i as f64 * cell_dim, i),
            // no surface anywhere: the hint is useless, scan full columns
            None => (0.0, shape[0] - 1),
        };

        Ok(VoxelGrid {
            shape,
            cell_dim,
            cells,
            surface,
            z_top,
            z_top_index,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn cell_dim(&self) -> f64 {
        self.cell_dim
    }

    /// Absolute bounding box (Z_abs, Y_abs, X_abs) in nm.
    pub fn extents(&self) -> Point3 {
        Point3::new(
            self.shape[0] as f64 * self.cell_dim,
            self.shape[1] as f64 * self.cell_dim,
            self.shape[2] as f64 * self.cell_dim,
        )
    }

    /// Highest surface layer scaled by the voxel edge.
    pub fn z_top(&self) -> f64 {
        self.z_top
    }

    #[inline]
    fn offset(&self, voxel: [usize; 3]) -> usize {
        (voxel[0] * self.shape[1] + voxel[1]) * self.shape[2] + voxel[2]
    }

    /// Cell label at a voxel index.
    #[inline]
    pub fn label(&self, voxel: [usize; 3]) -> f64 {
        self.cells[self.offset(voxel)]
    }

    /// Whether a voxel belongs to the surface interface layer.
    #[inline]
    pub fn is_surface(&self, voxel: [usize; 3]) -> bool {
        self.surface[self.offset(voxel)] != 0
    }

    /// Voxel containing a point, clamped into the grid.
    ///
    /// Crossing points sit on voxel faces and nudged points can round a hair
    /// past the outermost face; the clamp keeps the index addressable.
    #[inline]
    pub fn voxel_of(&self, point: &Point3) -> [usize; 3] {
        let mut voxel = [0usize; 3];
        for axis in 0..3 {
            let i = (point[axis] / self.cell_dim).floor() as isize;
            voxel[axis] = i.clamp(0, self.shape[axis] as isize - 1) as usize;
        }
        voxel
    }

    /// Highest solid cell in the z-column (j, k) at or below layer `from`.
    ///
    /// The scan starts no higher than the cached top surface layer.
    pub fn highest_solid_below(&self, from: usize, j: usize, k: usize) -> Option<usize> {
        let start = from.min(self.z_top_index);
        (0..=start).rev().find(|&i| self.label([i, j, k]) < 0.0)
    }

    /// Clamp a proposed point into the recordable box [ε, extent − ε].
    ///
    /// Returns `Some(clamped)` with the offending coordinates snapped to
    /// EDGE_EPSILON off the face, or `None` when the point is inside. A
    /// `Some` doubles as the signal that the electron has left the volume.
    pub fn clamp(&self, point: &Point3) -> Option<Point3> {
        let ext = self.extents();
        let mut clamped = *point;
        let mut outside = false;
        for axis in 0..3 {
            if point[axis] < EDGE_EPSILON {
                clamped[axis] = EDGE_EPSILON;
                outside = true;
            } else if point[axis] > ext[axis] - EDGE_EPSILON {
                clamped[axis] = ext[axis] - EDGE_EPSILON;
                outside = true;
            }
        }
        if outside {
            Some(clamped)
        } else {
            None
        }
    }

    /// Point where a ray from `origin` along `direction` leaves the volume,
    /// snapped off the exit face.
    pub fn exit_point(&self, origin: &Point3, direction: &Point3) -> Point3 {
        let ext = self.extents();
        let mut t_exit = f64::INFINITY;
        for axis in 0..3 {
            let d = direction[axis];
            let t = if d > 0.0 {
                (ext[axis] - origin[axis]) / d
            } else if d < 0.0 {
                origin[axis] / -d
            } else {
                continue;
            };
            if t >= 0.0 && t < t_exit {
                t_exit = t;
            }
        }
        if !t_exit.is_finite() {
            // degenerate zero direction: stay put
            return *origin;
        }
        let hit = *origin + *direction * t_exit;
        self.clamp(&hit).unwrap_or(hit)
    }
}
