//! Export Module
//! Writes the current query result to CSV or JSON at a user-chosen path.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::data::{SeriesPoint, SnapshotRow};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct SeriesExport<'a> {
    country: &'a str,
    window: usize,
    points: &'a [SeriesPoint],
}

#[derive(Serialize)]
struct SnapshotExport<'a> {
    year: i32,
    rows: &'a [SnapshotRow],
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write a country's series as CSV, one row per year.
pub fn write_series_csv(
    path: &Path,
    country: &str,
    points: &[SeriesPoint],
) -> Result<(), ExportError> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "country,year,co2,co2_smoothed")?;
    for p in points {
        writeln!(
            file,
            "{},{},{:.6},{}",
            csv_field(country),
            p.year,
            p.co2,
            p.smoothed.map(|s| format!("{s:.6}")).unwrap_or_default(),
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Write a country's series as a JSON document.
pub fn write_series_json(
    path: &Path,
    country: &str,
    window: usize,
    points: &[SeriesPoint],
) -> Result<(), ExportError> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(
        file,
        &SeriesExport {
            country,
            window,
            points,
        },
    )?;
    Ok(())
}

/// Write a year snapshot as CSV, one row per country.
pub fn write_snapshot_csv(path: &Path, rows: &[SnapshotRow]) -> Result<(), ExportError> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "iso_code,country,co2")?;
    for row in rows {
        writeln!(
            file,
            "{},{},{:.6}",
            csv_field(&row.iso_code),
            csv_field(&row.country),
            row.co2
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Write a year snapshot as a JSON document.
pub fn write_snapshot_json(path: &Path, year: i32, rows: &[SnapshotRow]) -> Result<(), ExportError> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &SnapshotExport { year, rows })?;
    Ok(())
}
