// Voxel-walk along a scattering segment: find where a ray first meets the
// surface interface layer and where it first enters solid interior.
//
// The walk is an Amanatides-Woo DDA over the parametric ray t in [0, 1] from
// `start` to `end` (`end` is the in-volume ray end, already clamped off the
// bounding box). One axis advances per iteration in order of increasing t;
// the voxel index is stepped incrementally so a crossing always attributes
// to the cell the ray is entering.

use crate::grid::{Point3, VoxelGrid};
use rand::Rng;

/// Face-disambiguation nudge applied to returned crossing points, in nm.
/// Downstream voxel attribution depends on this exact value.
const NUDGE: f64 = 1e-3;

/// A crossing into solid interior, with the voxel that triggered it.
///
/// The label is taken from the hit voxel, not re-read at the nudged
/// continuation point: the nudge can overshoot a one-voxel shell.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidHit {
    pub point: Point3,
    pub voxel: [usize; 3],
    pub label: f64,
}

/// Outcome of the dual crossing search along one void segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Crossings {
    /// Surface layer and solid interior both crossed before the ray end.
    Both { surface: Point3, solid: SolidHit },
    /// Crossed the surface layer but never reached solid: the electron
    /// re-exits through the interface.
    SurfaceOnly { surface: Point3 },
    /// The whole ray is void.
    Miss,
}

/// Search the ray `start` -> `end` for the surface crossing and the solid
/// crossing beyond it.
///
/// The surface crossing is pushed NUDGE backward along every axis (toward
/// the void side), the solid crossing NUDGE forward (into the solid), both
/// symmetrically on all three components, then snapped into the bounding
/// box. The solid search resumes from the nudged surface point, which also
/// keeps it from starting exactly on the face it just crossed.
pub fn find_crossings(
    grid: &VoxelGrid,
    start: Point3,
    end: Point3,
    rng: &mut impl Rng,
) -> Crossings {
    let Some((surface_raw, _)) = walk(grid, start, end, rng, |g, v| g.is_surface(v)) else {
        return Crossings::Miss;
    };

    let surface = nudged(grid, surface_raw, end - start, -NUDGE);

    match walk(grid, surface, end, rng, |g, v| g.label(v) <= -1.0) {
        Some((solid_raw, voxel)) => {
            let label = grid.label(voxel);
            let point = nudged(grid, solid_raw, end - surface, NUDGE);
            Crossings::Both {
                surface,
                solid: SolidHit {
                    point,
                    voxel,
                    label,
                },
            }
        }
        None => Crossings::SurfaceOnly { surface },
    }
}

/// Push a crossing point off its voxel face, `amount` signed along the ray
/// direction per axis, and keep it inside the volume.
fn nudged(grid: &VoxelGrid, point: Point3, ray: Point3, amount: f64) -> Point3 {
    let mut out = point;
    for axis in 0..3 {
        out[axis] += ray[axis].signum() * amount;
    }
    grid.clamp(&out).unwrap_or(out)
}

/// Walk the voxel-face crossings of the ray in order of increasing t and
/// return the first crossing whose entered voxel satisfies the predicate,
/// or None if the ray end (t = 1) comes first.
fn walk(
    grid: &VoxelGrid,
    start: Point3,
    end: Point3,
    rng: &mut impl Rng,
    hit: impl Fn(&VoxelGrid, [usize; 3]) -> bool,
) -> Option<(Point3, [usize; 3])> {
    let h = grid.cell_dim();
    let shape = grid.shape();
    let mut ray = end - start;
    for axis in 0..3 {
        if ray[axis] == 0.0 {
            // an exactly grid-aligned ray would divide by zero below
            ray[axis] = rng.gen_range(-1e-6..1e-6);
        }
    }

    let mut t = [0.0f64; 3];
    let mut t_step = [0.0f64; 3];
    let mut step = [0isize; 3];
    for axis in 0..3 {
        let sign = ray[axis].signum();
        step[axis] = if sign > 0.0 { 1 } else { -1 };
        // offset to the nearest lower voxel face
        let delta = -(start[axis] % h);
        let mut numer = delta;
        if sign > 0.0 {
            numer += h;
        }
        if delta == 0.0 {
            numer += sign * h;
        }
        t[axis] = (numer / ray[axis]).abs();
        t_step[axis] = (h / ray[axis]).abs();
    }

    let mut voxel = grid.voxel_of(&start);
    loop {
        let axis = if t[0] <= t[1] && t[0] <= t[2] {
            0
        } else if t[1] <= t[2] {
            1
        } else {
            2
        };
        if t[axis] > 1.0 {
            return None;
        }
        let next = voxel[axis] as isize + step[axis];
        if next < 0 || next >= shape[axis] as isize {
            return None;
        }
        voxel[axis] = next as usize;
        if hit(grid, voxel) {
            let point = start + t[axis] * ray;
            return Some((point, voxel));
        }
        t[axis] += t_step[axis];
    }
}
