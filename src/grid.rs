//! Grid-availability profiles, generated from the hourly probability of the grid being up.
use crate::input::{input_err_msg, read_csv};
use crate::units::{DAYS_PER_YEAR, HOURS_PER_DAY};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const GRID_TIMES_FILE_NAME: &str = "grid_times.csv";

/// For each named grid profile, the probability of the grid being available in each hour of
/// the day.
pub type GridTimes = IndexMap<String, Vec<f64>>;

/// For each named grid profile, whether the grid is available (1) or not (0) in each hour of
/// the system lifetime.
pub type GridStatusMap = IndexMap<String, Vec<u8>>;

/// A single row of a cached grid status file
#[derive(Debug, PartialEq, Deserialize, Serialize)]
struct GridStatusRow {
    status: u8,
}

/// Read grid times from the specified model directory.
///
/// The file has one column per grid profile and one row per hour of the day.
///
/// # Returns
///
/// The grid times or `None` if the file is not present.
pub fn read_grid_times(model_dir: &Path) -> Result<Option<GridTimes>> {
    let file_path = model_dir.join(GRID_TIMES_FILE_NAME);
    if !file_path.is_file() {
        return Ok(None);
    }

    let grid_times = read_grid_times_from_path(&file_path)
        .with_context(|| input_err_msg(&file_path))?;
    Ok(Some(grid_times))
}

fn read_grid_times_from_path(file_path: &Path) -> Result<GridTimes> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;
    let mut grid_times: GridTimes = reader
        .headers()?
        .iter()
        .map(|name| (name.to_string(), Vec::with_capacity(HOURS_PER_DAY)))
        .collect();

    for record in reader.records() {
        for ((name, probabilities), value) in grid_times.iter_mut().zip(record?.iter()) {
            let probability: f64 = value
                .parse()
                .with_context(|| format!("Invalid probability for grid profile {name}"))?;
            probabilities.push(probability);
        }
    }

    validate_grid_times(&grid_times)?;
    Ok(grid_times)
}

/// Check that there are 24 probabilities for each profile, each in the range [0, 1]
fn validate_grid_times(grid_times: &GridTimes) -> Result<()> {
    ensure!(!grid_times.is_empty(), "No grid profiles provided");
    for (name, probabilities) in grid_times {
        ensure!(
            probabilities.len() == HOURS_PER_DAY,
            "Grid profile {name} must have {HOURS_PER_DAY} hourly values, but has {}",
            probabilities.len()
        );
        ensure!(
            probabilities
                .iter()
                .all(|probability| (0.0..=1.0).contains(probability)),
            "Grid availability probabilities for {name} must be between 0 and 1"
        );
    }

    Ok(())
}

/// Generate an availability profile covering `num_days` days from hourly probabilities.
///
/// An hour is available when a uniform random draw in [0, 1) falls below its probability.
fn generate_status<R: Rng>(probabilities: &[f64], num_days: usize, rng: &mut R) -> Vec<u8> {
    probabilities
        .iter()
        .cycle()
        .take(num_days * probabilities.len())
        .map(|probability| u8::from(rng.random::<f64>() < *probability))
        .collect()
}

/// Generate availability profiles for every grid covering the whole system lifetime.
///
/// # Arguments
///
/// * `grid_times` - Hourly availability probabilities for each grid profile
/// * `max_years` - The system lifetime in years
/// * `rng` - The source of randomness
pub fn lifetime_grid_status<R: Rng>(
    grid_times: &GridTimes,
    max_years: u32,
    rng: &mut R,
) -> GridStatusMap {
    let num_days = max_years as usize * DAYS_PER_YEAR as usize;
    grid_times
        .iter()
        .map(|(name, probabilities)| {
            (name.clone(), generate_status(probabilities, num_days, rng))
        })
        .collect()
}

/// Get availability profiles for every grid, reading them from `dir` where they already exist.
///
/// Profiles which are missing, or all profiles if `regenerate` is set, are generated and saved
/// to `dir`.
pub fn get_lifetime_grid_status<R: Rng>(
    dir: &Path,
    grid_times: &GridTimes,
    max_years: u32,
    regenerate: bool,
    rng: &mut R,
) -> Result<GridStatusMap> {
    let num_days = max_years as usize * DAYS_PER_YEAR as usize;
    let mut statuses = GridStatusMap::new();
    for (name, probabilities) in grid_times {
        let file_path = grid_status_path(dir, name);
        let status = if file_path.is_file() && !regenerate {
            info!(
                "Using existing {name} grid status from {}",
                file_path.display()
            );
            read_grid_status(&file_path)?
        } else {
            let status = generate_status(probabilities, num_days, rng);
            write_grid_status(&file_path, &status)?;
            info!(
                "Generated {name} grid status saved to {}",
                file_path.display()
            );
            status
        };

        statuses.insert(name.clone(), status);
    }

    Ok(statuses)
}

/// The path of the cached status for a grid profile
fn grid_status_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_grid_status.csv"))
}

fn read_grid_status(file_path: &Path) -> Result<Vec<u8>> {
    let rows: Vec<GridStatusRow> = read_csv(file_path)?;
    ensure!(
        rows.iter().all(|row| row.status <= 1),
        "Grid status values must be 0 or 1"
    );

    Ok(rows.into_iter().map(|row| row.status).collect())
}

fn write_grid_status(file_path: &Path, status: &[u8]) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)?;
    for &status in status {
        writer.serialize(GridStatusRow { status })?;
    }
    writer.flush()?;

    Ok(())
}
