//! Results Grid - ordered mapping of matrix name to its series
//!
//! The grid keeps matrices in configured order, so the JSON dump and the
//! chart legend list them the way the configuration does.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::MatrixSeries;

/// Insertion-ordered store of matrix series keyed by display name.
///
/// ## Design
///
/// A run holds a handful of matrices, so entries live in a vector and
/// lookups are linear. Serialization writes a JSON object whose key order
/// matches insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsGrid {
    entries: Vec<(String, MatrixSeries)>,
}

impl ResultsGrid {
    /// Create a new empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the grid has no matrices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of matrices in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert a series, replacing (in place) any series with the same name.
    pub fn insert(&mut self, name: impl Into<String>, series: MatrixSeries) {
        let name = name.into();
        if let Some(slot) = self.get_mut(&name) {
            *slot = series;
        } else {
            self.entries.push((name, series));
        }
    }

    /// Get a series by matrix name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MatrixSeries> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, series)| series)
    }

    /// Get a mutable series by matrix name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut MatrixSeries> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, series)| series)
    }

    /// Iterate over `(name, series)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatrixSeries)> {
        self.entries
            .iter()
            .map(|(name, series)| (name.as_str(), series))
    }

    /// Matrix names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Largest thread count recorded for any matrix.
    #[must_use]
    pub fn max_threads(&self) -> Option<u32> {
        self.entries
            .iter()
            .filter_map(|(_, series)| series.max_threads())
            .max()
    }
}

impl Serialize for ResultsGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, series) in &self.entries {
            map.serialize_entry(name, series)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultsGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(GridVisitor)
    }
}

struct GridVisitor;

impl<'de> Visitor<'de> for GridVisitor {
    type Value = ResultsGrid;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of matrix name to series")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut grid = ResultsGrid::new();
        while let Some((name, series)) = access.next_entry::<String, MatrixSeries>()? {
            if grid.get(&name).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate matrix '{name}'"
                )));
            }
            grid.entries.push((name, series));
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TrialResult;

    fn series(threads: &[u32]) -> MatrixSeries {
        let mut series = MatrixSeries::new();
        for &t in threads {
            series.record(
                t,
                &TrialResult {
                    speedup: Some(f64::from(t)),
                    ..TrialResult::default()
                },
            );
        }
        series
    }

    #[test]
    fn test_grid_default() {
        let grid = ResultsGrid::new();
        assert!(grid.is_empty());
        assert_eq!(grid.len(), 0);
        assert!(grid.max_threads().is_none());
    }

    #[test]
    fn test_grid_preserves_insertion_order() {
        let mut grid = ResultsGrid::new();
        grid.insert("4000x4000", series(&[1]));
        grid.insert("2000x2000", series(&[1, 2]));
        grid.insert("3000x3000", series(&[1, 2, 3]));

        let names: Vec<&str> = grid.names().collect();
        assert_eq!(names, ["4000x4000", "2000x2000", "3000x3000"]);
        assert_eq!(grid.max_threads(), Some(3));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut grid = ResultsGrid::new();
        grid.insert("a", series(&[1]));
        grid.insert("b", series(&[1]));
        grid.insert("a", series(&[1, 2]));

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.names().next(), Some("a"));
        assert_eq!(grid.get("a").map(MatrixSeries::len), Some(2));
    }

    #[test]
    fn test_json_object_keeps_order() {
        let mut grid = ResultsGrid::new();
        grid.insert("zeta", series(&[1]));
        grid.insert("alpha", series(&[1]));

        let json = serde_json::to_string(&grid).unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());

        let back: ResultsGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let entry = r#"{"threads":[],"speedup":[],"efficiency":[],"sequential_times":[],"parallel_times":[],"determinant":null}"#;
        let json = format!(r#"{{"a":{entry},"a":{entry}}}"#);
        let err = serde_json::from_str::<ResultsGrid>(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate matrix"));
    }
}
