//! Quick profile of raw exports before preprocessing: shape, columns, missing cells.

use super::RawTable;
use crate::error::{Result, ThreatError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct SourceProfile {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    /// Empty or absent cells per column, same order as `columns`
    pub missing: Vec<usize>,
    pub header_corrected: bool,
}

pub fn profile_file(path: &Path) -> Result<SourceProfile> {
    let file = std::fs::File::open(path)?;
    let table = RawTable::read(file)?;

    let mut missing = vec![0usize; table.headers.len()];
    for row in &table.rows {
        for (i, slot) in missing.iter_mut().enumerate() {
            if row.get(i).map(str::is_empty).unwrap_or(true) {
                *slot += 1;
            }
        }
    }

    Ok(SourceProfile {
        path: path.to_path_buf(),
        rows: table.rows.len(),
        columns: table.headers,
        missing,
        header_corrected: table.header_corrected,
    })
}

/// Profile every `*.csv` in `dir`, sorted by file name. A file that fails to
/// parse is reported in place and does not stop the others.
pub fn profile_dir(dir: &Path) -> Result<Vec<(PathBuf, Result<SourceProfile>)>> {
    ThreatError::require(dir, "point data.raw_dir at the activity exports")?;
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|x| x.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    Ok(files
        .into_iter()
        .map(|p| {
            let profile = profile_file(&p);
            if let Err(ref e) = profile {
                warn!(file = %p.display(), error = %e, "could not profile source");
            }
            (p, profile)
        })
        .collect())
}
