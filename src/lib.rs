// Module declarations and re-exports for Rust usage
mod electron;
mod element;
mod error;
mod grid;
pub mod physics;
mod rng;
mod simulation;
mod trajectory;
mod traversal;

pub use electron::Electron;
pub use element::{
    deposit, substrate, Element, MaterialTable, DEPOSITS, DEPOSIT_MARK, SUBSTRATES, SUBSTRATE_MARK,
};
pub use error::SimulationError;
pub use grid::{Point3, VoxelGrid, EDGE_EPSILON};
pub use rng::FastRng;
pub use simulation::{Parameters, Simulation};
pub use trajectory::{Trajectory, SOLID_MASK, VOID_MASK};
pub use traversal::{find_crossings, Crossings, SolidHit};

// Python bindings for the host runtime
#[cfg(feature = "pyo3")]
mod python;

#[cfg(feature = "pyo3")]
use pyo3::prelude::*;
#[cfg(feature = "pyo3")]
use pyo3::wrap_pyfunction;

#[cfg(feature = "pyo3")]
#[pymodule]
fn etraj(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyElement>()?;
    m.add_function(wrap_pyfunction!(python::simulate, m)?)?;
    m.add_function(wrap_pyfunction!(python::deposit_preset, m)?)?;
    m.add_function(wrap_pyfunction!(python::substrate_preset, m)?)?;
    Ok(())
}
