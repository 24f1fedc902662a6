//! Id-keyed travel matrix.

use std::collections::HashMap;

/// A nested `from → to → value` mapping of travel quantities between
/// locations, keyed by string id. The depot id is a first-class key.
///
/// The same type holds both distance matrices (km) and travel-time matrices
/// (minutes). Entries are directional: symmetric data must be inserted both
/// ways (or via [`insert_symmetric`](TravelMatrix::insert_symmetric)); the
/// solvers never assume symmetry.
///
/// # Examples
///
/// ```
/// use weekroute::matrix::TravelMatrix;
///
/// let mut km = TravelMatrix::new();
/// km.insert_symmetric("depot", "S1", 10.0);
/// assert_eq!(km.get("depot", "S1"), Some(10.0));
/// assert_eq!(km.get("S1", "depot"), Some(10.0));
/// assert_eq!(km.get("S1", "S2"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TravelMatrix {
    entries: HashMap<String, HashMap<String, f64>>,
}

impl TravelMatrix {
    /// Creates an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a directed entry.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>, value: f64) {
        self.entries
            .entry(from.into())
            .or_default()
            .insert(to.into(), value);
    }

    /// Inserts an entry in both directions.
    pub fn insert_symmetric(&mut self, a: impl Into<String>, b: impl Into<String>, value: f64) {
        let a = a.into();
        let b = b.into();
        self.insert(a.clone(), b.clone(), value);
        self.insert(b, a, value);
    }

    /// Returns the entry from `from` to `to`, if present.
    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        self.entries.get(from).and_then(|row| row.get(to)).copied()
    }

    /// Returns `true` if the directed entry is present.
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.get(from, to).is_some()
    }

    /// Returns the entry from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if the entry is absent. Problem instances validate distance
    /// matrices at construction, so solver-side lookups use this accessor.
    pub fn at(&self, from: &str, to: &str) -> f64 {
        self.get(from, to)
            .unwrap_or_else(|| panic!("matrix entry {from} -> {to} is missing"))
    }

    /// Number of origin rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the matrix has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, HashMap<String, f64>>> for TravelMatrix {
    fn from(entries: HashMap<String, HashMap<String, f64>>) -> Self {
        Self { entries }
    }
}
