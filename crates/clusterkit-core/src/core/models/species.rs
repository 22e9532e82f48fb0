use thiserror::Error;

/// Longest chemical symbol the registry accepts.
pub const MAX_SYMBOL_LEN: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeciesError {
    #[error("Invalid species symbol '{0}': expected 1 or 2 characters")]
    InvalidSymbol(String),
    #[error("Species index {index} is out of range (registry holds {len} species)")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered registry of the distinct species present in a cluster.
///
/// Symbols keep their first-seen order, so a species' index is stable until a species
/// in front of it is removed. Each entry carries the live number of atoms of that
/// species; the owning `Cluster` is responsible for keeping those counts in step with
/// its per-atom species indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesRegistry {
    symbols: Vec<String>,
    counts: Vec<usize>,
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `symbol`, or updates its count when it is already known.
    ///
    /// A new symbol is appended with `count` (zero when `None`). For an existing symbol a
    /// supplied `count` overwrites the stored value; without one the call is a no-op.
    ///
    /// # Return
    ///
    /// The index of the symbol in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`SpeciesError::InvalidSymbol`] for an empty symbol or one longer than
    /// [`MAX_SYMBOL_LEN`] characters.
    pub fn register(&mut self, symbol: &str, count: Option<usize>) -> Result<usize, SpeciesError> {
        let symbol = symbol.trim();
        let len = symbol.chars().count();
        if len == 0 || len > MAX_SYMBOL_LEN {
            return Err(SpeciesError::InvalidSymbol(symbol.to_string()));
        }

        if let Some(index) = self.index_of(symbol) {
            if let Some(count) = count {
                self.counts[index] = count;
            }
            return Ok(index);
        }

        self.symbols.push(symbol.to_string());
        self.counts.push(count.unwrap_or(0));
        Ok(self.symbols.len() - 1)
    }

    /// Index of `symbol`, scanning in insertion order.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Drops the species at `index`; every later species moves down by one.
    ///
    /// Callers that hold per-atom indices into the registry must decrement every index
    /// greater than `index` themselves.
    pub(crate) fn remove(&mut self, index: usize) -> Result<(String, usize), SpeciesError> {
        if index >= self.symbols.len() {
            return Err(SpeciesError::OutOfRange {
                index,
                len: self.symbols.len(),
            });
        }
        Ok((self.symbols.remove(index), self.counts.remove(index)))
    }

    pub(crate) fn increment(&mut self, index: usize) {
        self.counts[index] += 1;
    }

    /// Decrements the live count and returns the new value.
    pub(crate) fn decrement(&mut self, index: usize) -> usize {
        self.counts[index] = self.counts[index].saturating_sub(1);
        self.counts[index]
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    pub fn count(&self, index: usize) -> Option<usize> {
        self.counts.get(index).copied()
    }

    pub fn count_of(&self, symbol: &str) -> usize {
        self.index_of(symbol).map_or(0, |i| self.counts[i])
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates over `(symbol, count)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }
}
