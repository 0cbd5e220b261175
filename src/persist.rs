//! Results Persister - JSON dump of the results grid
//!
//! The file is pretty-printed UTF-8 (non-ASCII matrix names are written
//! as-is). It is overwritten on every run.

use std::fs;
use std::path::Path;

use crate::experiment::ResultsGrid;
use crate::Result;

/// Write `grid` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn save_results(grid: &ResultsGrid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut json = serde_json::to_string_pretty(grid)?;
    json.push('\n');
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), matrices = grid.len(), "results saved");
    Ok(())
}

/// Read a grid previously written by [`save_results`].
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or a JSON error if it is
/// malformed or its series are misaligned.
pub fn load_results(path: impl AsRef<Path>) -> Result<ResultsGrid> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}
