mod element_python;
mod simulate_python;

pub use element_python::{deposit_preset, substrate_preset, PyElement};
pub use simulate_python::simulate;
