//! Data Preparer Module
//! Turns raw CSV bytes into the cleaned, validated, sorted emissions table.

use std::io::Cursor;

use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::data::table::PreparedTable;

/// Columns the dashboard needs; everything else in the source file is dropped.
const REQUIRED_COLUMNS: [&str; 4] = ["country", "iso_code", "year", "co2"];
const POPULATION_COLUMN: &str = "population";

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("required column '{0}' missing from dataset")]
    MissingColumn(&'static str),
}

/// Rows removed during cleaning, by reason.
///
/// Individually invalid rows are never an error; these counts are the only
/// record that they existed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    /// `country`, `iso_code`, or `co2` missing (or unparseable `co2`).
    pub missing_value: usize,
    /// `co2 <= 0`.
    pub non_positive: usize,
    /// `iso_code` length other than 3 (aggregate pseudo-codes like `OWID_WRL`).
    pub bad_iso_code: usize,
    /// `year` not coercible to a whole number.
    pub bad_year: usize,
}

impl DropStats {
    pub fn total(&self) -> usize {
        self.missing_value + self.non_positive + self.bad_iso_code + self.bad_year
    }
}

impl std::fmt::Display for DropStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} dropped ({} missing, {} non-positive, {} bad code, {} bad year)",
            self.total(),
            self.missing_value,
            self.non_positive,
            self.bad_iso_code,
            self.bad_year
        )
    }
}

/// Clean raw CSV bytes into a [`PreparedTable`].
///
/// Keeps only the recognized columns, coerces `co2` to float and `year` to
/// integer, drops invalid rows (counting them per reason), and sorts by
/// (`country`, `year`). An empty result is valid; only bytes that cannot be
/// read as a headered CSV at all are an error.
pub fn prepare_from_csv_bytes(raw: &[u8]) -> Result<PreparedTable, PrepareError> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(10_000))
        .with_ignore_errors(true)
        .into_reader_with_file_handle(Cursor::new(raw))
        .finish()?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for required in REQUIRED_COLUMNS {
        if !names.iter().any(|n| n == required) {
            return Err(PrepareError::MissingColumn(required));
        }
    }
    let has_population = names.iter().any(|n| n == POPULATION_COLUMN);

    // Coerce once up front; unparseable values become null, not errors.
    let country_col = df.column("country")?.cast(&DataType::String)?;
    let country = country_col.str()?;
    let iso_col = df.column("iso_code")?.cast(&DataType::String)?;
    let iso = iso_col.str()?;
    let year_col = df.column("year")?.cast(&DataType::Int32)?;
    let year = year_col.i32()?;
    let co2_col = df.column("co2")?.cast(&DataType::Float64)?;
    let co2 = co2_col.f64()?;
    let pop_col = if has_population {
        Some(df.column(POPULATION_COLUMN)?.cast(&DataType::Float64)?)
    } else {
        None
    };
    let population = match &pop_col {
        Some(col) => Some(col.f64()?),
        None => None,
    };

    let mut countries: Vec<String> = Vec::new();
    let mut iso_codes: Vec<String> = Vec::new();
    let mut years: Vec<i32> = Vec::new();
    let mut co2_values: Vec<f64> = Vec::new();
    let mut populations: Vec<Option<f64>> = Vec::new();
    let mut dropped = DropStats::default();

    for i in 0..df.height() {
        let (Some(name), Some(code), Some(co2_value)) = (country.get(i), iso.get(i), co2.get(i))
        else {
            dropped.missing_value += 1;
            continue;
        };
        if name.is_empty() || code.is_empty() {
            dropped.missing_value += 1;
            continue;
        }
        if co2_value <= 0.0 {
            dropped.non_positive += 1;
            continue;
        }
        if code.chars().count() != 3 {
            dropped.bad_iso_code += 1;
            continue;
        }
        let Some(year_value) = year.get(i) else {
            dropped.bad_year += 1;
            continue;
        };

        countries.push(name.to_string());
        iso_codes.push(code.to_string());
        years.push(year_value);
        co2_values.push(co2_value);
        populations.push(population.and_then(|ca| ca.get(i)));
    }

    let mut columns = vec![
        Column::new("country".into(), countries),
        Column::new("iso_code".into(), iso_codes),
        Column::new("year".into(), years),
        Column::new("co2".into(), co2_values),
    ];
    if has_population {
        columns.push(Column::new("population".into(), populations));
    }

    let cleaned = DataFrame::new(columns)?.sort(["country", "year"], SortMultipleOptions::default())?;

    info!(
        "prepared table: {} rows, {} columns ({})",
        cleaned.height(),
        cleaned.width(),
        dropped
    );

    Ok(PreparedTable::new(cleaned, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "country,iso_code,year,co2,population\n";

    fn csv(rows: &[&str]) -> Vec<u8> {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out.into_bytes()
    }

    #[test]
    fn negative_co2_rows_are_dropped() {
        let table = prepare_from_csv_bytes(&csv(&[
            "Austria,AUT,2019,50.2,",
            "Austria,AUT,2020,-1,",
        ]))
        .unwrap();

        assert_eq!(table.len(), 1);
        let series = table.series_for("Austria", 1);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].year, 2019);
        assert!((series[0].co2 - 50.2).abs() < 1e-12);
        assert_eq!(table.dropped().non_positive, 1);
    }

    #[test]
    fn aggregate_pseudo_codes_are_excluded() {
        let table = prepare_from_csv_bytes(&csv(&["World,OWID_WRL,2020,34000,"])).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.dropped().bad_iso_code, 1);
    }

    #[test]
    fn zero_and_non_numeric_co2_are_absent() {
        let table = prepare_from_csv_bytes(&csv(&[
            "Austria,AUT,2018,0,",
            "Austria,AUT,2019,not-a-number,",
            "Austria,AUT,2020,70.1,",
        ]))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.dropped().non_positive, 1);
        assert_eq!(table.dropped().missing_value, 1);
    }

    #[test]
    fn iso_code_length_is_enforced() {
        let table = prepare_from_csv_bytes(&csv(&[
            "Austria,AT,2020,70.1,",
            "Austria,AUTX,2020,70.1,",
            "Austria,AUT,2020,70.1,",
        ]))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.dropped().bad_iso_code, 2);
        assert_eq!(table.snapshot_for(2020)[0].iso_code, "AUT");
    }

    #[test]
    fn missing_iso_code_counts_as_missing() {
        let table = prepare_from_csv_bytes(&csv(&["Austria,,2020,70.1,"])).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.dropped().missing_value, 1);
    }

    #[test]
    fn header_only_input_yields_empty_table() {
        let table = prepare_from_csv_bytes(HEADER.as_bytes()).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.dropped().total(), 0);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let result = prepare_from_csv_bytes(b"country,iso_code,year\nAustria,AUT,2020\n");
        assert!(matches!(result, Err(PrepareError::MissingColumn("co2"))));
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(prepare_from_csv_bytes(&[0x00, 0xff, 0xfe, 0x01]).is_err());
        assert!(prepare_from_csv_bytes(b"").is_err());
    }

    #[test]
    fn rows_are_sorted_by_country_then_year() {
        let table = prepare_from_csv_bytes(&csv(&[
            "Brazil,BRA,2019,450.0,",
            "Austria,AUT,2020,65.0,",
            "Austria,AUT,2019,70.0,",
            "Brazil,BRA,2018,440.0,",
        ]))
        .unwrap();

        let df = table.dataframe();
        let countries = df.column("country").unwrap().str().unwrap();
        let years = df.column("year").unwrap().i32().unwrap();
        let rows: Vec<(String, i32)> = (0..df.height())
            .map(|i| (countries.get(i).unwrap().to_string(), years.get(i).unwrap()))
            .collect();

        for pair in rows.windows(2) {
            assert!(pair[0] <= pair[1], "rows out of order: {pair:?}");
        }
        assert_eq!(rows[0], ("Austria".to_string(), 2019));
        assert_eq!(rows[3], ("Brazil".to_string(), 2019));
    }

    #[test]
    fn invariants_hold_for_every_row() {
        let table = prepare_from_csv_bytes(&csv(&[
            "Austria,AUT,2019,70.0,8900000",
            "Belgium,BEL,2019,95.0,",
            "World,OWID_WRL,2019,34000,",
            "Chad,TD,2019,1.0,",
            "Denmark,DNK,2019,-3.0,",
        ]))
        .unwrap();

        let df = table.dataframe();
        let iso = df.column("iso_code").unwrap().str().unwrap();
        let co2 = df.column("co2").unwrap().f64().unwrap();
        for i in 0..df.height() {
            let code = iso.get(i).unwrap();
            assert_eq!(code.chars().count(), 3);
            assert!(co2.get(i).unwrap() > 0.0);
        }
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn preparing_twice_is_idempotent() {
        let raw = csv(&[
            "Brazil,BRA,2019,450.0,210000000",
            "Austria,AUT,2019,70.0,8900000",
            "Austria,AUT,2020,bad,",
        ]);

        let first = prepare_from_csv_bytes(&raw).unwrap();
        let second = prepare_from_csv_bytes(&raw).unwrap();

        assert!(first.dataframe().equals(second.dataframe()));
        assert_eq!(first.dropped(), second.dropped());
    }

    #[test]
    fn unrecognized_columns_are_discarded() {
        let table = prepare_from_csv_bytes(
            b"country,iso_code,year,co2,population,gdp\nAustria,AUT,2020,70.1,8900000,430000000000\n",
        )
        .unwrap();

        let names: Vec<String> = table
            .dataframe()
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, ["country", "iso_code", "year", "co2", "population"]);
    }

    #[test]
    fn population_column_is_optional() {
        let table =
            prepare_from_csv_bytes(b"country,iso_code,year,co2\nAustria,AUT,2020,70.1\n").unwrap();

        assert_eq!(table.len(), 1);
        assert!(!table
            .dataframe()
            .get_column_names()
            .iter()
            .any(|n| n.as_str() == "population"));
    }

    #[test]
    fn population_values_pass_through() {
        let table = prepare_from_csv_bytes(&csv(&[
            "Austria,AUT,2019,70.0,8900000",
            "Austria,AUT,2020,65.0,",
        ]))
        .unwrap();

        let pop = table
            .dataframe()
            .column("population")
            .unwrap()
            .f64()
            .unwrap();
        assert_eq!(pop.get(0), Some(8_900_000.0));
        assert_eq!(pop.get(1), None);
    }
}
