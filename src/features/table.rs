//! CSV persistence for per-domain, merged and labeled feature tables.

use super::{DailyCount, DailyUserFeature};
use crate::error::{Result, ThreatError};
use crate::threat::LabeledSample;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_rows<T: DeserializeOwned>(path: &Path, hint: &'static str) -> Result<Vec<T>> {
    ThreatError::require(path, hint)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize() {
        out.push(row?);
    }
    Ok(out)
}

/// `user,date,<column>`
pub fn write_counts(path: &Path, column: &str, counts: &[DailyCount]) -> Result<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["user", "date", column])?;
    for c in counts {
        let date = c.date.to_string();
        let count = c.count.to_string();
        writer.write_record([c.user.as_str(), date.as_str(), count.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_counts(path: &Path, column: &str) -> Result<Vec<DailyCount>> {
    #[derive(serde::Deserialize)]
    struct Row {
        user: String,
        date: NaiveDate,
        count: u32,
    }

    ThreatError::require(path, "run `preprocess` first")?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == column) {
        return Err(ThreatError::MalformedSource {
            source_name: path.display().to_string(),
            missing: vec![column.to_string()],
        });
    }
    // Rename the domain column so one row type covers both tables.
    let renamed: csv::StringRecord = headers
        .iter()
        .map(|h| if h == column { "count" } else { h })
        .collect();
    reader.set_headers(renamed);

    let mut out = Vec::new();
    for row in reader.deserialize::<Row>() {
        let row = row?;
        out.push(DailyCount {
            user: row.user,
            date: row.date,
            count: row.count,
        });
    }
    Ok(out)
}

pub fn write_features(path: &Path, rows: &[DailyUserFeature]) -> Result<()> {
    write_rows(path, rows)
}

pub fn read_features(path: &Path) -> Result<Vec<DailyUserFeature>> {
    read_rows(path, "run `preprocess` first")
}

pub fn write_labeled(path: &Path, rows: &[LabeledSample]) -> Result<()> {
    write_rows(path, rows)
}

pub fn read_labeled(path: &Path) -> Result<Vec<LabeledSample>> {
    read_rows(path, "run `train` first")
}
