use crate::grid::Point3;
use crate::physics::{self, ScatterAngles};
use rand::Rng;

/// State of one primary electron while it is being traced.
///
/// Direction cosines are (d_z, d_y, d_x) matching the coordinate order; the
/// vector stays unit length by construction of the rotation. The latest
/// sampled deflection is kept in scratch fields between sampling and the
/// direction update.
#[derive(Debug, Clone, PartialEq)]
pub struct Electron {
    pub position: Point3,
    pub previous: Point3,
    pub direction: Point3,
    pub energy: f64,
    pub cos_theta: f64,
    pub sin_theta: f64,
    pub psi: f64,
}

impl Electron {
    /// Electron at a beam entry point, travelling straight down the column.
    pub fn at_entry(position: Point3, energy: f64) -> Self {
        Electron {
            position,
            previous: position,
            direction: Point3::new(-1.0, 0.0, 0.0),
            energy,
            cos_theta: 1.0,
            sin_theta: 0.0,
            psi: 0.0,
        }
    }

    /// Sample a fresh deflection into the scratch angles.
    ///
    /// Returns false when any angle came out NaN; the caller turns that into
    /// a physics error carrying the electron state.
    pub fn sample_angles(&mut self, alpha: f64, rng: &mut impl Rng) -> bool {
        match physics::sample_scatter_angles(alpha, rng) {
            Some(ScatterAngles {
                cos_theta,
                sin_theta,
                psi,
            }) => {
                self.cos_theta = cos_theta;
                self.sin_theta = sin_theta;
                self.psi = psi;
                true
            }
            None => false,
        }
    }

    /// Rotate the direction by the scratch angles.
    ///
    /// A d_z of exactly zero is bumped to 1e-5 before the pivot division, and
    /// any component landing on exactly zero afterwards is bumped to 1e-7 so
    /// the traversal never sees an axis-aligned ray. Both constants mask
    /// specific instabilities and must stay as written.
    ///
    /// Returns false when the rotation arithmetic produced a NaN component;
    /// the stored direction is left untouched so the caller can report the
    /// last valid state.
    #[must_use]
    pub fn rotate(&mut self) -> bool {
        let mut d_z = self.direction[0];
        let d_y = self.direction[1];
        let d_x = self.direction[2];
        if d_z == 0.0 {
            d_z = 1e-5;
        }

        let am = -d_x / d_z;
        let an = 1.0 / (1.0 + am * am).sqrt();
        let v1 = an * self.sin_theta;
        let v2 = an * am * self.sin_theta;
        let v3 = self.psi.cos();
        let v4 = self.psi.sin();

        let mut new_x = d_x * self.cos_theta + v1 * v3 + d_y * v2 * v4;
        let mut new_y = d_y * self.cos_theta + v4 * (d_z * v1 - d_x * v2);
        let mut new_z = d_z * self.cos_theta + v2 * v3 - d_y * v1 * v4;
        if new_x.is_nan() || new_y.is_nan() || new_z.is_nan() {
            return false;
        }

        if new_x == 0.0 {
            new_x = 1e-7;
        }
        if new_y == 0.0 {
            new_y = 1e-7;
        }
        if new_z == 0.0 {
            new_z = 1e-7;
        }
        self.direction = Point3::new(new_z, new_y, new_x);
        true
    }

    /// Proposed next scattering point after a free flight of `step` nm.
    pub fn proposed(&self, step: f64) -> Point3 {
        self.position + step * self.direction
    }

    /// Record a new point, pushing the current one into `previous`.
    pub fn advance_to(&mut self, point: Point3) {
        self.previous = self.position;
        self.position = point;
    }
}
