use crate::element::MaterialTable;
use crate::error::SimulationError;
use crate::grid::VoxelGrid;
use crate::simulation::{Parameters, Simulation};
use numpy::ndarray::Array2;
use numpy::{
    IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray3, PyUntypedArrayMethods,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

type PyTrajectory<'py> = (
    Bound<'py, PyArray2<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
);

/// Trace one primary electron per beam entry through the voxel snapshot.
///
/// Returns, ordered by entry index, one (points, energies, masks) triple per
/// electron: an (L, 3) float64 array of scattering points in (z, y, x) nm and
/// two length-L float64 vectors. The arrays take ownership of the buffers the
/// kernel filled; nothing is copied on the way out.
#[pyfunction]
#[pyo3(signature = (e0, emin, y0, x0, cell_dim, grid, surface, materials, seed=None))]
#[allow(clippy::too_many_arguments)]
pub fn simulate<'py>(
    py: Python<'py>,
    e0: f64,
    emin: f64,
    y0: PyReadonlyArray1<'py, f64>,
    x0: PyReadonlyArray1<'py, f64>,
    cell_dim: f64,
    grid: PyReadonlyArray3<'py, f64>,
    surface: PyReadonlyArray3<'py, u8>,
    materials: Vec<super::PyElement>,
    seed: Option<u64>,
) -> PyResult<Vec<PyTrajectory<'py>>> {
    let grid_shape = grid.shape().to_vec();
    if grid_shape != surface.shape() {
        return Err(PyValueError::new_err(format!(
            "grid shape {:?} does not match surface shape {:?}",
            grid_shape,
            surface.shape()
        )));
    }

    let cells: Vec<f64> = grid.as_array().iter().copied().collect();
    let flags: Vec<u8> = surface.as_array().iter().copied().collect();
    let snapshot = VoxelGrid::new(
        [grid_shape[0], grid_shape[1], grid_shape[2]],
        cell_dim,
        cells,
        flags,
    )
    .map_err(to_py_err)?;

    let table = MaterialTable::new(materials.into_iter().map(|m| m.inner).collect())
        .map_err(to_py_err)?;
    let simulation =
        Simulation::new(snapshot, table, Parameters { e0, emin, seed }).map_err(to_py_err)?;

    let y: Vec<f64> = y0.as_array().iter().copied().collect();
    let x: Vec<f64> = x0.as_array().iter().copied().collect();
    let trajectories = py
        .allow_threads(|| simulation.run(&y, &x))
        .map_err(to_py_err)?;

    trajectories
        .into_iter()
        .map(|trajectory| {
            let records = trajectory.len();
            let (points, energies, masks) = trajectory.into_parts();
            let points = Array2::from_shape_vec((records, 3), points)
                .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
            Ok((
                points.into_pyarray_bound(py),
                energies.into_pyarray_bound(py),
                masks.into_pyarray_bound(py),
            ))
        })
        .collect()
}

fn to_py_err(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidInput(_) => PyValueError::new_err(err.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}
