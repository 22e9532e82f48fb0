use super::species::{SpeciesError, SpeciesRegistry};
use crate::core::utils::geometry;
use nalgebra::{Matrix3, Point3};
use thiserror::Error;

/// Simulation-cell geometry of a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Cell lengths `a`, `b`, `c` in Angstroms.
    pub dimensions: [f64; 3],
    /// Cell angles `alpha`, `beta`, `gamma` in degrees.
    pub angles: [f64; 3],
    /// Whether the structure wraps along each Cartesian axis.
    pub periodic: [bool; 3],
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            dimensions: [0.0; 3],
            angles: [90.0; 3],
            periodic: [false; 3],
        }
    }
}

impl Cell {
    /// A cell that wraps along all three axes.
    pub fn periodic(dimensions: [f64; 3], angles: [f64; 3]) -> Self {
        Self {
            dimensions,
            angles,
            periodic: [true; 3],
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic.iter().any(|&p| p)
    }

    /// Lattice vectors as matrix rows.
    pub fn lattice(&self) -> Matrix3<f64> {
        geometry::cell_matrix(&self.dimensions, &self.angles)
    }
}

/// Construction-time behaviour switches for a [`Cluster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Remove a species from the registry once its last atom is removed.
    pub prune_empty_species: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            prune_empty_species: true,
        }
    }
}

/// An owned copy of one atom's data, as returned by [`Cluster::remove_atom`].
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub symbol: String,
    pub position: Point3<f64>,
    pub charge: f64,
}

/// A borrowed view of one atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomRef<'a> {
    pub index: usize,
    pub symbol: &'a str,
    pub position: &'a Point3<f64>,
    pub charge: f64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error(transparent)]
    Species(#[from] SpeciesError),
    #[error("Atom index {index} is out of range (cluster holds {len} atoms)")]
    AtomOutOfRange { index: usize, len: usize },
    #[error("Species '{symbol}' still has {count} atom(s) and cannot be removed")]
    SpeciesInUse { symbol: String, count: usize },
}

/// A finite collection of atoms with cell metadata and cached geometric descriptors.
///
/// The per-atom arrays (species index, position, charge) always have the same length,
/// and every species index refers to a live entry of the embedded [`SpeciesRegistry`],
/// whose counts match the number of atoms of each species. All mutation goes through
/// [`add_atom`](Self::add_atom), [`remove_atom`](Self::remove_atom),
/// [`add_species`](Self::add_species) and [`remove_species`](Self::remove_species) so
/// these invariants hold after every call.
///
/// The center of mass, inertia tensor and bounding box are caches: they are only
/// refreshed by the corresponding `compute_*`/`update_bounds` calls and go stale when
/// atoms are added, removed or moved.
#[derive(Debug, Clone)]
pub struct Cluster {
    species: SpeciesRegistry,
    species_index: Vec<usize>,
    positions: Vec<Point3<f64>>,
    charges: Vec<f64>,
    /// Cell lengths, angles and periodicity.
    pub cell: Cell,
    /// Total energy reported by the source of the structure.
    pub total_energy: f64,
    pub(crate) min_bound: [f64; 3],
    pub(crate) max_bound: [f64; 3],
    pub(crate) center_of_mass: Point3<f64>,
    pub(crate) moment_of_inertia: Matrix3<f64>,
    options: ClusterOptions,
}

impl Default for Cluster {
    fn default() -> Self {
        Self {
            species: SpeciesRegistry::default(),
            species_index: Vec::new(),
            positions: Vec::new(),
            charges: Vec::new(),
            cell: Cell::default(),
            total_energy: 0.0,
            min_bound: [0.0; 3],
            max_bound: [0.0; 3],
            center_of_mass: Point3::origin(),
            moment_of_inertia: Matrix3::zeros(),
            options: ClusterOptions::default(),
        }
    }
}

impl Cluster {
    /// Creates an empty cluster that prunes empty species.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ClusterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Creates an empty cluster with room for `atom_count` atoms.
    pub fn with_capacity(atom_count: usize) -> Self {
        Self {
            species_index: Vec::with_capacity(atom_count),
            positions: Vec::with_capacity(atom_count),
            charges: Vec::with_capacity(atom_count),
            ..Self::default()
        }
    }

    pub fn options(&self) -> ClusterOptions {
        self.options
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.species_index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.species_index.is_empty()
    }

    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    pub fn species_indices(&self) -> &[usize] {
        &self.species_index
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Mutable access to the coordinates; the slice cannot change the atom count.
    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    /// Chemical symbol of the atom at `index`.
    pub fn symbol_of(&self, index: usize) -> Option<&str> {
        self.species_index
            .get(index)
            .and_then(|&s| self.species.symbol(s))
    }

    pub fn atom(&self, index: usize) -> Option<AtomRef<'_>> {
        Some(AtomRef {
            index,
            symbol: self.symbol_of(index)?,
            position: self.positions.get(index)?,
            charge: *self.charges.get(index)?,
        })
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomRef<'_>> {
        (0..self.atom_count()).filter_map(|i| self.atom(i))
    }

    /// Appends an atom, registering its species on first sight.
    ///
    /// # Return
    ///
    /// The index of the new atom.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Species`] if `symbol` is not a valid species symbol.
    pub fn add_atom(
        &mut self,
        symbol: &str,
        position: Point3<f64>,
        charge: f64,
    ) -> Result<usize, ClusterError> {
        let species = self.species.register(symbol, None)?;
        self.species.increment(species);

        self.species_index.push(species);
        self.positions.push(position);
        self.charges.push(charge);

        Ok(self.species_index.len() - 1)
    }

    /// Removes the atom at `index`, shifting later atoms down by one.
    ///
    /// When this was the last atom of its species and pruning is enabled, the species is
    /// dropped from the registry and the species indices of the remaining atoms are
    /// adjusted.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::AtomOutOfRange`] if `index >= atom_count()`.
    pub fn remove_atom(&mut self, index: usize) -> Result<AtomRecord, ClusterError> {
        if index >= self.atom_count() {
            return Err(ClusterError::AtomOutOfRange {
                index,
                len: self.atom_count(),
            });
        }

        let species = self.species_index.remove(index);
        let position = self.positions.remove(index);
        let charge = self.charges.remove(index);
        let symbol = self
            .species
            .symbol(species)
            .unwrap_or_default()
            .to_string();

        if self.species.decrement(species) == 0 && self.options.prune_empty_species {
            self.prune_species(species)?;
        }

        Ok(AtomRecord {
            symbol,
            position,
            charge,
        })
    }

    /// Registers `symbol` without adding atoms, e.g. to reserve its registry slot.
    pub fn add_species(&mut self, symbol: &str) -> Result<usize, ClusterError> {
        Ok(self.species.register(symbol, None)?)
    }

    /// Removes an empty species from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::SpeciesInUse`] if atoms of that species remain, or
    /// [`ClusterError::Species`] if `index` is not a registry index.
    pub fn remove_species(&mut self, index: usize) -> Result<(), ClusterError> {
        let count = self.species.count(index).ok_or(SpeciesError::OutOfRange {
            index,
            len: self.species.len(),
        })?;
        if count > 0 {
            return Err(ClusterError::SpeciesInUse {
                symbol: self.species.symbol(index).unwrap_or_default().to_string(),
                count,
            });
        }
        self.prune_species(index)
    }

    fn prune_species(&mut self, index: usize) -> Result<(), ClusterError> {
        self.species.remove(index)?;
        for s in self.species_index.iter_mut().filter(|s| **s > index) {
            *s -= 1;
        }
        Ok(())
    }

    /// Recomputes the cached bounding box along every axis that is not periodic.
    ///
    /// Periodic axes keep whatever value they held before; an empty cluster leaves the
    /// box unchanged.
    pub fn update_bounds(&mut self, periodic: &[bool; 3]) {
        if self.positions.is_empty() {
            return;
        }
        for axis in (0..3).filter(|&axis| !periodic[axis]) {
            let (min, max) = self
                .positions
                .iter()
                .map(|p| p[axis])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            self.min_bound[axis] = min;
            self.max_bound[axis] = max;
        }
    }

    pub fn min_bound(&self) -> &[f64; 3] {
        &self.min_bound
    }

    pub fn max_bound(&self) -> &[f64; 3] {
        &self.max_bound
    }

    /// The center of mass as of the last `compute_center_of_mass` call.
    pub fn center_of_mass(&self) -> &Point3<f64> {
        &self.center_of_mass
    }

    /// The inertia tensor as of the last `compute_moment_of_inertia` call.
    pub fn moment_of_inertia(&self) -> &Matrix3<f64> {
        &self.moment_of_inertia
    }
}
