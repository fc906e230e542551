//! Hourly time-series profiles and the helpers for reshaping them.
use crate::input::input_err_msg;
use crate::units::HOURS_PER_DAY;
use anyhow::{Context, Result, ensure};
use log::info;
use std::iter::Sum;
use std::path::{Path, PathBuf};

/// The index of the first hour of 29 February in a leap year
pub const FEB_29: usize = (31 + 28) * HOURS_PER_DAY;

/// The maximum number of distinct years of data used to build a multi-year profile
pub const MAX_DISTINCT_YEARS: u32 = 10;

/// Sum an hourly series into a daily series.
///
/// A trailing partial day is summed as though it were a full day.
pub fn hourly_profile_to_daily_sum<T>(hourly: &[T]) -> Vec<T>
where
    T: Copy + Sum,
{
    hourly
        .chunks(HOURS_PER_DAY)
        .map(|day| day.iter().copied().sum())
        .collect()
}

/// An hourly profile with one or more named numeric columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ProfileTable {
    /// Create an empty table with the given column names
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table from column names and rows.
    ///
    /// Every row must have one value per column.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        ensure!(
            rows.iter().all(|row| row.len() == columns.len()),
            "Every row of a profile must have {} values",
            columns.len()
        );

        Ok(Self { columns, rows })
    }

    /// Read a table from a CSV file with a header row
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(file_path)
            .with_context(|| input_err_msg(file_path))?;
        let columns = reader
            .headers()
            .with_context(|| input_err_msg(file_path))?
            .iter()
            .map(String::from)
            .collect();

        let rows = reader
            .records()
            .map(|record| -> Result<Vec<f64>> {
                record?
                    .iter()
                    .map(|value| value.parse::<f64>().map_err(anyhow::Error::from))
                    .collect()
            })
            .collect::<Result<_>>()
            .with_context(|| input_err_msg(file_path))?;

        Self::from_rows(columns, rows).with_context(|| input_err_msg(file_path))
    }

    /// Write the table to a CSV file, with a header row
    pub fn write(&self, file_path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(file_path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(f64::to_string))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// The column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The rows of the table, in time order
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// The number of hours covered by the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The values of the named column, if present
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Add a derived column to the table
    pub fn push_column<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[f64]) -> f64,
    {
        for row in &mut self.rows {
            let value = f(row);
            row.push(value);
        }
        self.columns.push(name.to_string());
    }

    /// Append the rows of another table with the same columns
    pub fn extend(&mut self, other: &ProfileTable) -> Result<()> {
        ensure!(
            self.columns == other.columns,
            "Cannot join profiles with different columns"
        );
        self.rows.extend_from_slice(&other.rows);

        Ok(())
    }

    /// Drop the 24 hours of 29 February from a table covering a whole leap year.
    ///
    /// Tables too short to contain 29 February are left unchanged.
    pub fn remove_leap_day(&mut self) {
        if self.rows.len() >= FEB_29 + HOURS_PER_DAY {
            self.rows.drain(FEB_29..FEB_29 + HOURS_PER_DAY);
        }
    }

    /// Shift a table from UTC into local time.
    ///
    /// `time_difference` is the local offset from UTC in hours and is rounded to the nearest
    /// hour. The rows are rotated, so hours pushed past one end of the table wrap around to the
    /// other.
    pub fn to_local_time(&mut self, time_difference: f64) {
        if self.rows.is_empty() {
            return;
        }

        let shift = (time_difference.round().abs() as usize) % self.rows.len();
        if time_difference > 0.0 {
            self.rows.rotate_right(shift);
        } else {
            self.rows.rotate_left(shift);
        }
    }
}

/// The file name of a single year of a generation profile
pub fn yearly_profile_file_name(prefix: &str, name: &str, year: u32) -> String {
    format!("{prefix}{name}_generation_{year}.csv")
}

/// Build a generation profile covering `num_years` years from the yearly profiles in `dir`.
///
/// The profiles for up to the first ten years starting at `start_year` are joined, then this
/// block is repeated until it covers at least `num_years` years. The result is cached in `dir`
/// and reused on later calls unless `regenerate` is set.
pub fn total_profile_output(
    dir: &Path,
    name: &str,
    prefix: &str,
    start_year: u32,
    num_years: u32,
    regenerate: bool,
) -> Result<ProfileTable> {
    let total_path = total_profile_path(dir, name, prefix, num_years);
    if total_path.is_file() && !regenerate {
        info!(
            "Using existing {name} profile from {}",
            total_path.display()
        );
        return ProfileTable::from_path(&total_path);
    }

    let mut block: Option<ProfileTable> = None;
    for year in start_year..start_year + num_years.min(MAX_DISTINCT_YEARS) {
        let year_path = dir.join(yearly_profile_file_name(prefix, name, year));
        let year_data = ProfileTable::from_path(&year_path)?;
        match block.as_mut() {
            Some(block) => block
                .extend(&year_data)
                .with_context(|| input_err_msg(&year_path))?,
            None => block = Some(year_data),
        }
    }
    let block = block.unwrap_or_default();

    let mut total = ProfileTable::new(block.columns.clone());
    for _ in 0..num_years.div_ceil(MAX_DISTINCT_YEARS) {
        total.rows.extend_from_slice(&block.rows);
    }
    total.write(&total_path)?;
    info!(
        "Total {name} profile for {num_years} years saved to {}",
        total_path.display()
    );

    Ok(total)
}

/// The path to which a multi-year generation profile is cached
fn total_profile_path(dir: &Path, name: &str, prefix: &str, num_years: u32) -> PathBuf {
    dir.join(format!("{prefix}{name}_generation_{num_years}_years.csv"))
}
