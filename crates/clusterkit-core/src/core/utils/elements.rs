use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Tabulated per-element constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Standard atomic weight in atomic mass units.
    pub mass: f64,
    /// Van der Waals radius in Angstroms.
    pub vdw_radius: f64,
}

// "X" is the dummy/ghost site used by CAR and GULP files.
static ELEMENTS: Map<&'static str, Element> = phf_map! {
    "H" => Element { mass: 1.008, vdw_radius: 1.20 },
    "He" => Element { mass: 4.0026, vdw_radius: 1.40 },
    "Li" => Element { mass: 6.94, vdw_radius: 1.82 },
    "Be" => Element { mass: 9.0122, vdw_radius: 1.53 },
    "B" => Element { mass: 10.81, vdw_radius: 1.92 },
    "C" => Element { mass: 12.011, vdw_radius: 1.70 },
    "N" => Element { mass: 14.007, vdw_radius: 1.55 },
    "O" => Element { mass: 15.999, vdw_radius: 1.52 },
    "F" => Element { mass: 18.998, vdw_radius: 1.47 },
    "Ne" => Element { mass: 20.180, vdw_radius: 1.54 },
    "Na" => Element { mass: 22.990, vdw_radius: 2.27 },
    "Mg" => Element { mass: 24.305, vdw_radius: 1.73 },
    "Al" => Element { mass: 26.982, vdw_radius: 1.84 },
    "Si" => Element { mass: 28.085, vdw_radius: 2.10 },
    "P" => Element { mass: 30.974, vdw_radius: 1.80 },
    "S" => Element { mass: 32.06, vdw_radius: 1.80 },
    "Cl" => Element { mass: 35.45, vdw_radius: 1.75 },
    "Ar" => Element { mass: 39.948, vdw_radius: 1.88 },
    "K" => Element { mass: 39.098, vdw_radius: 2.75 },
    "Ca" => Element { mass: 40.078, vdw_radius: 2.31 },
    "Sc" => Element { mass: 44.956, vdw_radius: 2.15 },
    "Ti" => Element { mass: 47.867, vdw_radius: 2.11 },
    "V" => Element { mass: 50.942, vdw_radius: 2.07 },
    "Cr" => Element { mass: 51.996, vdw_radius: 2.06 },
    "Mn" => Element { mass: 54.938, vdw_radius: 2.05 },
    "Fe" => Element { mass: 55.845, vdw_radius: 2.04 },
    "Co" => Element { mass: 58.933, vdw_radius: 2.00 },
    "Ni" => Element { mass: 58.693, vdw_radius: 1.63 },
    "Cu" => Element { mass: 63.546, vdw_radius: 1.40 },
    "Zn" => Element { mass: 65.38, vdw_radius: 1.39 },
    "Ga" => Element { mass: 69.723, vdw_radius: 1.87 },
    "Ge" => Element { mass: 72.630, vdw_radius: 2.11 },
    "As" => Element { mass: 74.922, vdw_radius: 1.85 },
    "Se" => Element { mass: 78.971, vdw_radius: 1.90 },
    "Br" => Element { mass: 79.904, vdw_radius: 1.85 },
    "Kr" => Element { mass: 83.798, vdw_radius: 2.02 },
    "Rb" => Element { mass: 85.468, vdw_radius: 3.03 },
    "Sr" => Element { mass: 87.62, vdw_radius: 2.49 },
    "Y" => Element { mass: 88.906, vdw_radius: 2.32 },
    "Zr" => Element { mass: 91.224, vdw_radius: 2.23 },
    "Nb" => Element { mass: 92.906, vdw_radius: 2.18 },
    "Mo" => Element { mass: 95.95, vdw_radius: 2.17 },
    "Tc" => Element { mass: 98.0, vdw_radius: 2.16 },
    "Ru" => Element { mass: 101.07, vdw_radius: 2.13 },
    "Rh" => Element { mass: 102.91, vdw_radius: 2.10 },
    "Pd" => Element { mass: 106.42, vdw_radius: 1.63 },
    "Ag" => Element { mass: 107.87, vdw_radius: 1.72 },
    "Cd" => Element { mass: 112.41, vdw_radius: 1.58 },
    "In" => Element { mass: 114.82, vdw_radius: 1.93 },
    "Sn" => Element { mass: 118.71, vdw_radius: 2.17 },
    "Sb" => Element { mass: 121.76, vdw_radius: 2.06 },
    "Te" => Element { mass: 127.60, vdw_radius: 2.06 },
    "I" => Element { mass: 126.90, vdw_radius: 1.98 },
    "Xe" => Element { mass: 131.29, vdw_radius: 2.16 },
    "Cs" => Element { mass: 132.91, vdw_radius: 3.43 },
    "Ba" => Element { mass: 137.33, vdw_radius: 2.68 },
    "La" => Element { mass: 138.91, vdw_radius: 2.43 },
    "Ce" => Element { mass: 140.12, vdw_radius: 2.42 },
    "Pr" => Element { mass: 140.91, vdw_radius: 2.40 },
    "Nd" => Element { mass: 144.24, vdw_radius: 2.39 },
    "Pm" => Element { mass: 145.0, vdw_radius: 2.38 },
    "Sm" => Element { mass: 150.36, vdw_radius: 2.36 },
    "Eu" => Element { mass: 151.96, vdw_radius: 2.35 },
    "Gd" => Element { mass: 157.25, vdw_radius: 2.34 },
    "Tb" => Element { mass: 158.93, vdw_radius: 2.33 },
    "Dy" => Element { mass: 162.50, vdw_radius: 2.31 },
    "Ho" => Element { mass: 164.93, vdw_radius: 2.30 },
    "Er" => Element { mass: 167.26, vdw_radius: 2.29 },
    "Tm" => Element { mass: 168.93, vdw_radius: 2.27 },
    "Yb" => Element { mass: 173.05, vdw_radius: 2.26 },
    "Lu" => Element { mass: 174.97, vdw_radius: 2.24 },
    "Hf" => Element { mass: 178.49, vdw_radius: 2.23 },
    "Ta" => Element { mass: 180.95, vdw_radius: 2.22 },
    "W" => Element { mass: 183.84, vdw_radius: 2.18 },
    "Re" => Element { mass: 186.21, vdw_radius: 2.16 },
    "Os" => Element { mass: 190.23, vdw_radius: 2.16 },
    "Ir" => Element { mass: 192.22, vdw_radius: 2.13 },
    "Pt" => Element { mass: 195.08, vdw_radius: 1.75 },
    "Au" => Element { mass: 196.97, vdw_radius: 1.66 },
    "Hg" => Element { mass: 200.59, vdw_radius: 1.55 },
    "Tl" => Element { mass: 204.38, vdw_radius: 1.96 },
    "Pb" => Element { mass: 207.2, vdw_radius: 2.02 },
    "Bi" => Element { mass: 208.98, vdw_radius: 2.07 },
    "Po" => Element { mass: 209.0, vdw_radius: 1.97 },
    "At" => Element { mass: 210.0, vdw_radius: 2.02 },
    "Rn" => Element { mass: 222.0, vdw_radius: 2.20 },
    "X" => Element { mass: 0.0, vdw_radius: 0.0 },
};

/// Source of atomic masses keyed by chemical symbol.
pub trait MassLookup {
    fn mass_of(&self, symbol: &str) -> Option<f64>;
}

/// Source of van der Waals radii keyed by chemical symbol.
pub trait RadiusLookup {
    fn vdw_radius_of(&self, symbol: &str) -> Option<f64>;
}

/// Brings a symbol into canonical capitalisation (`"SI"` -> `"Si"`, `"o"` -> `"O"`).
pub fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Looks up the built-in data for `symbol`, tolerating non-canonical capitalisation.
pub fn element(symbol: &str) -> Option<&'static Element> {
    ELEMENTS
        .get(symbol)
        .or_else(|| ELEMENTS.get(normalize_symbol(symbol).as_str()))
}

/// The compiled-in periodic table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicTable;

impl MassLookup for PeriodicTable {
    fn mass_of(&self, symbol: &str) -> Option<f64> {
        element(symbol).map(|e| e.mass)
    }
}

impl RadiusLookup for PeriodicTable {
    fn vdw_radius_of(&self, symbol: &str) -> Option<f64> {
        element(symbol).map(|e| e.vdw_radius)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ElementOverride {
    pub mass: Option<f64>,
    pub vdw_radius: Option<f64>,
}

/// Periodic table with user-supplied overrides layered on top.
///
/// Overrides are read from a TOML file with one table per symbol:
///
/// ```toml
/// [Si]
/// mass = 28.0855
/// vdw-radius = 2.05
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementTable {
    overrides: HashMap<String, ElementOverride>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ElementLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ElementLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: HashMap<String, ElementOverride> =
            toml::from_str(&content).map_err(|e| ElementLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        let overrides = raw
            .into_iter()
            .map(|(symbol, data)| (normalize_symbol(&symbol), data))
            .collect();
        Ok(Self { overrides })
    }

    pub fn insert(&mut self, symbol: &str, data: ElementOverride) {
        self.overrides.insert(normalize_symbol(symbol), data);
    }

    fn override_for(&self, symbol: &str) -> Option<&ElementOverride> {
        self.overrides
            .get(symbol)
            .or_else(|| self.overrides.get(&normalize_symbol(symbol)))
    }
}

impl MassLookup for ElementTable {
    fn mass_of(&self, symbol: &str) -> Option<f64> {
        self.override_for(symbol)
            .and_then(|o| o.mass)
            .or_else(|| PeriodicTable.mass_of(symbol))
    }
}

impl RadiusLookup for ElementTable {
    fn vdw_radius_of(&self, symbol: &str) -> Option<f64> {
        self.override_for(symbol)
            .and_then(|o| o.vdw_radius)
            .or_else(|| PeriodicTable.vdw_radius_of(symbol))
    }
}

#[derive(Debug, Error)]
pub enum ElementLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}
