use thiserror::Error;

/// Errors raised by a trajectory simulation call.
///
/// Any of these aborts the whole call; partial trajectory lists are never
/// returned. The physics and grid variants carry the offending electron index
/// and the last valid state so a broken configuration can be located.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "physics invariant broken for electron {electron}: {reason} \
         (last point {point:?} nm, energy {energy} keV)"
    )]
    PhysicsInvariantBroken {
        electron: usize,
        reason: String,
        point: [f64; 3],
        energy: f64,
    },

    #[error("grid label {label} at voxel {voxel:?} matches no material mark (electron {electron})")]
    GridConsistencyError {
        electron: usize,
        voxel: [usize; 3],
        label: f64,
    },
}
