//! Prepared Table Module
//! Immutable, query-ready view of the cleaned emissions data.

use polars::prelude::*;
use serde::Serialize;

use crate::data::prepare::DropStats;

/// One year of a country's emissions series.
///
/// `smoothed` is a centered rolling mean; edge years without a full window
/// carry `None` rather than an approximation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub co2: f64,
    pub smoothed: Option<f64>,
}

/// One country's emissions for a single year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub iso_code: String,
    pub country: String,
    pub co2: f64,
}

/// The cleaned, sorted emissions table. Read-only after construction; a
/// re-fetch builds a new table rather than mutating this one.
pub struct PreparedTable {
    df: DataFrame,
    dropped: DropStats,
}

impl PreparedTable {
    pub(crate) fn new(df: DataFrame, dropped: DropStats) -> Self {
        Self { df, dropped }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn dropped(&self) -> &DropStats {
        &self.dropped
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Sorted unique country names.
    pub fn countries(&self) -> Vec<String> {
        let Ok(names) = self.df.column("country").and_then(|col| col.str()) else {
            return Vec::new();
        };

        // Rows are already sorted by country, so consecutive dedup suffices.
        let mut out: Vec<String> = Vec::new();
        for i in 0..names.len() {
            if let Some(name) = names.get(i) {
                if out.last().map(String::as_str) != Some(name) {
                    out.push(name.to_string());
                }
            }
        }
        out
    }

    /// Min and max year present in the table.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let years = self.df.column("year").and_then(|col| col.i32()).ok()?;
        Some((years.min()?, years.max()?))
    }

    /// Emissions series for one country, in year order, with a centered
    /// rolling mean over `window` years. A country with fewer rows than
    /// `window` collapses the window to 1 (no smoothing). Unknown countries
    /// yield an empty series.
    pub fn series_for(&self, country: &str, window: usize) -> Vec<SeriesPoint> {
        self.try_series_for(country, window).unwrap_or_default()
    }

    fn try_series_for(&self, country: &str, window: usize) -> PolarsResult<Vec<SeriesPoint>> {
        let filtered = self
            .df
            .clone()
            .lazy()
            .filter(col("country").eq(lit(country)))
            .collect()?;

        let years = filtered.column("year")?.i32()?;
        let co2 = filtered.column("co2")?.f64()?;

        let mut raw: Vec<(i32, f64)> = Vec::with_capacity(filtered.height());
        for i in 0..filtered.height() {
            if let (Some(year), Some(value)) = (years.get(i), co2.get(i)) {
                raw.push((year, value));
            }
        }

        let window = if raw.len() < window { 1 } else { window.max(1) };
        let values: Vec<f64> = raw.iter().map(|&(_, v)| v).collect();
        let smoothed = centered_mean(&values, window);

        Ok(raw
            .into_iter()
            .zip(smoothed)
            .map(|((year, co2), smoothed)| SeriesPoint {
                year,
                co2,
                smoothed,
            })
            .collect())
    }

    /// All countries' emissions for a single year, in country order. A year
    /// with no rows yields an empty result.
    pub fn snapshot_for(&self, year: i32) -> Vec<SnapshotRow> {
        self.try_snapshot_for(year).unwrap_or_default()
    }

    fn try_snapshot_for(&self, year: i32) -> PolarsResult<Vec<SnapshotRow>> {
        let filtered = self
            .df
            .clone()
            .lazy()
            .filter(col("year").eq(lit(year)))
            .collect()?;

        let iso = filtered.column("iso_code")?.str()?;
        let countries = filtered.column("country")?.str()?;
        let co2 = filtered.column("co2")?.f64()?;

        let mut out = Vec::with_capacity(filtered.height());
        for i in 0..filtered.height() {
            if let (Some(code), Some(name), Some(value)) =
                (iso.get(i), countries.get(i), co2.get(i))
            {
                out.push(SnapshotRow {
                    iso_code: code.to_string(),
                    country: name.to_string(),
                    co2: value,
                });
            }
        }
        Ok(out)
    }
}

/// Centered moving average matching a rolling mean with the label at the
/// window center: positions without a full window are `None`.
fn centered_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return values.iter().map(|&v| Some(v)).collect();
    }

    let left = (window - 1) / 2;
    let right = window / 2;
    (0..values.len())
        .map(|i| {
            if i < left || i + right >= values.len() {
                None
            } else {
                let sum: f64 = values[i - left..=i + right].iter().sum();
                Some(sum / window as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::prepare::prepare_from_csv_bytes;

    fn table(rows: &[&str]) -> PreparedTable {
        let mut raw = String::from("country,iso_code,year,co2,population\n");
        for row in rows {
            raw.push_str(row);
            raw.push('\n');
        }
        prepare_from_csv_bytes(raw.as_bytes()).unwrap()
    }

    #[test]
    fn window_collapses_when_series_is_short() {
        let t = table(&["Austria,AUT,2019,50.0,", "Austria,AUT,2020,60.0,"]);

        let series = t.series_for("Austria", 5);
        assert_eq!(series.len(), 2);
        for point in &series {
            assert_eq!(point.smoothed, Some(point.co2));
        }
    }

    #[test]
    fn centered_mean_leaves_edges_undefined() {
        let t = table(&[
            "Austria,AUT,2016,10.0,",
            "Austria,AUT,2017,20.0,",
            "Austria,AUT,2018,30.0,",
            "Austria,AUT,2019,40.0,",
            "Austria,AUT,2020,50.0,",
        ]);

        let series = t.series_for("Austria", 3);
        assert_eq!(series[0].smoothed, None);
        assert_eq!(series[1].smoothed, Some(20.0));
        assert_eq!(series[2].smoothed, Some(30.0));
        assert_eq!(series[3].smoothed, Some(40.0));
        assert_eq!(series[4].smoothed, None);
    }

    #[test]
    fn even_window_uses_center_right_label() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = centered_mean(&values, 4);

        // Window of 4 reaches one position left and two right.
        assert_eq!(smoothed[0], None);
        assert_eq!(smoothed[1], Some(2.5));
        assert_eq!(smoothed[2], Some(3.5));
        assert_eq!(smoothed[3], None);
        assert_eq!(smoothed[4], None);
    }

    #[test]
    fn unknown_country_yields_empty_series() {
        let t = table(&["Austria,AUT,2020,60.0,"]);
        assert!(t.series_for("Atlantis", 5).is_empty());
    }

    #[test]
    fn series_is_in_year_order() {
        let t = table(&[
            "Austria,AUT,2020,60.0,",
            "Austria,AUT,2018,40.0,",
            "Austria,AUT,2019,50.0,",
        ]);

        let years: Vec<i32> = t.series_for("Austria", 1).iter().map(|p| p.year).collect();
        assert_eq!(years, [2018, 2019, 2020]);
    }

    #[test]
    fn snapshot_of_absent_year_is_empty() {
        let t = table(&["Austria,AUT,2020,60.0,"]);
        assert!(t.snapshot_for(1850).is_empty());
    }

    #[test]
    fn snapshot_returns_all_rows_for_the_year() {
        let t = table(&[
            "Austria,AUT,2019,70.0,",
            "Austria,AUT,2020,60.0,",
            "Brazil,BRA,2020,450.0,",
        ]);

        let snapshot = t.snapshot_for(2020);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].iso_code, "AUT");
        assert_eq!(snapshot[1].iso_code, "BRA");
        assert!((snapshot[1].co2 - 450.0).abs() < 1e-12);
    }

    #[test]
    fn countries_are_sorted_and_unique() {
        let t = table(&[
            "Brazil,BRA,2019,450.0,",
            "Austria,AUT,2019,70.0,",
            "Austria,AUT,2020,60.0,",
        ]);

        assert_eq!(t.countries(), ["Austria", "Brazil"]);
    }

    #[test]
    fn year_range_spans_the_table() {
        let t = table(&[
            "Austria,AUT,1990,55.0,",
            "Austria,AUT,2020,60.0,",
            "Brazil,BRA,2005,300.0,",
        ]);

        assert_eq!(t.year_range(), Some((1990, 2020)));

        let empty = table(&[]);
        assert_eq!(empty.year_range(), None);
    }
}
