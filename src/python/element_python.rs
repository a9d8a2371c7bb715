use crate::element::{self, Element};
use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;

#[pyclass(name = "Element")]
#[derive(Clone)]
pub struct PyElement {
    pub inner: Element,
}

#[pymethods]
impl PyElement {
    #[new]
    #[pyo3(signature = (name, z, a, rho, e, lambda_escape, mark, j=None))]
    pub fn new(
        name: String,
        z: f64,
        a: f64,
        rho: f64,
        e: f64,
        lambda_escape: f64,
        mark: f64,
        j: Option<f64>,
    ) -> Self {
        let mut inner = Element::new(name, z, a, rho, e, lambda_escape, mark);
        if let Some(j) = j {
            inner = inner.with_ionisation_potential(j);
        }
        PyElement { inner }
    }

    #[getter]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[getter]
    pub fn rho(&self) -> f64 {
        self.inner.rho
    }

    #[getter]
    pub fn z(&self) -> f64 {
        self.inner.z
    }

    #[getter]
    pub fn a(&self) -> f64 {
        self.inner.a
    }

    #[getter]
    pub fn j(&self) -> f64 {
        self.inner.j
    }

    #[getter]
    pub fn e(&self) -> f64 {
        self.inner.e
    }

    #[getter]
    pub fn lambda_escape(&self) -> f64 {
        self.inner.lambda_escape
    }

    #[getter]
    pub fn mark(&self) -> f64 {
        self.inner.mark
    }

    fn __repr__(&self) -> String {
        format!(
            "Element(name='{}', Z={}, A={}, rho={}, mark={})",
            self.inner.name, self.inner.z, self.inner.a, self.inner.rho, self.inner.mark
        )
    }
}

/// Built-in deposit material for a precursor name.
#[pyfunction]
pub fn deposit_preset(name: &str) -> PyResult<PyElement> {
    element::deposit(name)
        .map(|e| PyElement { inner: e.clone() })
        .ok_or_else(|| PyKeyError::new_err(format!("unknown deposit '{name}'")))
}

/// Built-in substrate material for an element symbol.
#[pyfunction]
pub fn substrate_preset(name: &str) -> PyResult<PyElement> {
    element::substrate(name)
        .map(|e| PyElement { inner: e.clone() })
        .ok_or_else(|| PyKeyError::new_err(format!("unknown substrate '{name}'")))
}
