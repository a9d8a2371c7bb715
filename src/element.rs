use crate::error::SimulationError;
use crate::physics::ionisation_potential;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grid label marking deposit voxels.
pub const DEPOSIT_MARK: f64 = -2.0;
/// Grid label marking substrate voxels.
pub const SUBSTRATE_MARK: f64 = -1.0;

/// One solid material as seen by the scattering kernel.
///
/// A row is immutable once built. `mark` ties the material to the voxel
/// labels of the grid snapshot: a solid voxel whose label equals `mark`
/// belongs to this material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Precursor or substrate name, e.g. "Me3PtCpMe" or "Au"
    pub name: String,
    /// Mass density in g/cm^3
    pub rho: f64,
    /// Atomic number (effective for compound deposits)
    pub z: f64,
    /// Atomic weight in g/mol
    pub a: f64,
    /// Mean ionisation potential in keV
    pub j: f64,
    /// Energy per secondary-electron pair in eV
    pub e: f64,
    /// Secondary-electron escape length in nm
    pub lambda_escape: f64,
    /// Voxel label identifying this material in the grid
    pub mark: f64,
}

impl Element {
    /// Build a material row; J is derived from Z via the ionisation-potential
    /// formula.
    pub fn new(
        name: impl Into<String>,
        z: f64,
        a: f64,
        rho: f64,
        e: f64,
        lambda_escape: f64,
        mark: f64,
    ) -> Self {
        Element {
            name: name.into(),
            rho,
            z,
            a,
            j: ionisation_potential(z),
            e,
            lambda_escape,
            mark,
        }
    }

    /// Override the derived ionisation potential with a measured value.
    pub fn with_ionisation_potential(mut self, j: f64) -> Self {
        self.j = j;
        self
    }
}

/// Ordered material table for one simulation call.
///
/// Index 0 is the deposit, index 1 (when present) the substrate. Lookup
/// during transport goes through `by_mark`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTable {
    elements: Vec<Element>,
}

impl MaterialTable {
    pub fn new(elements: Vec<Element>) -> Result<Self, SimulationError> {
        if elements.is_empty() {
            return Err(SimulationError::InvalidInput(
                "material table must contain at least one element (the deposit)".to_string(),
            ));
        }
        Ok(MaterialTable { elements })
    }

    /// The primary deposit (index 0).
    pub fn deposit(&self) -> &Element {
        &self.elements[0]
    }

    /// The material whose mark equals the given grid label, if any.
    pub fn by_mark(&self, label: f64) -> Option<&Element> {
        self.elements.iter().find(|e| e.mark == label)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Load a table from a JSON array of element rows.
    pub fn from_json_str(json: &str) -> Result<Self, SimulationError> {
        let elements: Vec<Element> = serde_json::from_str(json)
            .map_err(|err| SimulationError::InvalidInput(format!("material table JSON: {err}")))?;
        MaterialTable::new(elements)
    }
}

/// Built-in deposit materials, keyed by precursor name.
pub static DEPOSITS: Lazy<HashMap<&'static str, Element>> = Lazy::new(|| {
    let mut m = HashMap::new();
    // PtC deposit grown from trimethyl(methylcyclopentadienyl)platinum(IV);
    // effective Z/A for the carbonaceous platinum composite.
    m.insert(
        "Me3PtCpMe",
        Element::new("Me3PtCpMe", 40.0, 121.0, 4.5, 50.0, 3.5, DEPOSIT_MARK),
    );
    m
});

/// Built-in substrate materials, keyed by element symbol.
pub static SUBSTRATES: Lazy<HashMap<&'static str, Element>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "Au",
        Element::new("Au", 79.0, 196.967, 19.32, 35.0, 0.5, SUBSTRATE_MARK),
    );
    m.insert(
        "Si",
        Element::new("Si", 14.0, 28.086, 2.33, 90.0, 2.7, SUBSTRATE_MARK),
    );
    m
});

/// Look up a built-in deposit by precursor name.
pub fn deposit(name: &str) -> Option<&'static Element> {
    DEPOSITS.get(name)
}

/// Look up a built-in substrate by element symbol.
pub fn substrate(name: &str) -> Option<&'static Element> {
    SUBSTRATES.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_derives_ionisation_potential() {
        let el = Element::new("Si", 14.0, 28.086, 2.33, 90.0, 2.7, SUBSTRATE_MARK);
        assert!(el.j > 0.0);
        assert_eq!(el.j, ionisation_potential(14.0));
    }

    #[test]
    fn test_ionisation_potential_override() {
        let el = Element::new("Si", 14.0, 28.086, 2.33, 90.0, 2.7, SUBSTRATE_MARK)
            .with_ionisation_potential(0.173);
        assert_eq!(el.j, 0.173);
    }

    #[test]
    fn test_material_table_rejects_empty() {
        assert!(matches!(
            MaterialTable::new(vec![]),
            Err(SimulationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_material_table_lookup_by_mark() {
        let table = MaterialTable::new(vec![
            deposit("Me3PtCpMe").unwrap().clone(),
            substrate("Au").unwrap().clone(),
        ])
        .unwrap();
        assert_eq!(table.deposit().name, "Me3PtCpMe");
        assert_eq!(table.by_mark(DEPOSIT_MARK).unwrap().name, "Me3PtCpMe");
        assert_eq!(table.by_mark(SUBSTRATE_MARK).unwrap().name, "Au");
        assert!(table.by_mark(-3.0).is_none());
        assert!(table.by_mark(0.0).is_none());
    }

    #[test]
    fn test_presets_available() {
        assert!(deposit("Me3PtCpMe").is_some());
        assert!(substrate("Au").is_some());
        assert!(substrate("Si").is_some());
        assert!(deposit("nope").is_none());
        assert_eq!(deposit("Me3PtCpMe").unwrap().mark, DEPOSIT_MARK);
        assert_eq!(substrate("Si").unwrap().mark, SUBSTRATE_MARK);
    }

    #[test]
    fn test_material_table_json_round_trip() {
        let table = MaterialTable::new(vec![
            deposit("Me3PtCpMe").unwrap().clone(),
            substrate("Si").unwrap().clone(),
        ])
        .unwrap();
        let json = serde_json::to_string(&table.elements).unwrap();
        let back = MaterialTable::from_json_str(&json).unwrap();
        assert_eq!(table, back);
    }

    #[test]
    fn test_material_table_json_rejects_garbage() {
        assert!(matches!(
            MaterialTable::from_json_str("not json"),
            Err(SimulationError::InvalidInput(_))
        ));
    }
}
