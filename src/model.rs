//! The model represents the static input data provided by the user.
use crate::discount::SimulationWindow;
use crate::finance::{CostInputs, FinanceInputs};
use crate::grid::{GridTimes, read_grid_times};
use crate::input::{input_err_msg, read_csv};
use crate::ninja::{GENERATION_FILE_NAME, GenerationInputs};
use crate::units::{HOURS_PER_DAY, Volume};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::ModelParameters;

const SIMULATION_FILE_NAME: &str = "simulation.csv";
const YEARLY_LOAD_STATISTICS_FILE_NAME: &str = "yearly_load_statistics.csv";

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The simulation window
    pub window: SimulationWindow,
    /// Financial inputs for the system components
    pub finance: FinanceInputs,
    /// Hourly outputs of the system simulation
    pub simulation: SimulationOutputs,
    /// The peak load (in W) for each year of the system lifetime
    pub yearly_peak_load: Vec<f64>,
    /// Hourly grid availability probabilities, if provided
    pub grid_times: Option<GridTimes>,
    /// Configuration for fetching generation profiles, if provided
    pub generation: Option<GenerationInputs>,
}

/// A single hour of simulation outputs
#[derive(Debug, Deserialize, PartialEq)]
struct SimulationRow {
    diesel_fuel_usage: f64,
    households: f64,
    #[serde(default)]
    grid_energy: f64,
    #[serde(default)]
    kerosene_usage: f64,
}

/// Hourly series produced by a system simulation, covering the simulation window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationOutputs {
    /// Diesel fuel consumed, in litres
    pub diesel_fuel_usage: Vec<Volume>,
    /// The number of households connected
    pub households: Vec<f64>,
    /// Energy bought from the grid, in kWh
    pub grid_energy: Vec<f64>,
    /// Kerosene burnt during outages, in litres
    pub kerosene_usage: Vec<f64>,
}

impl FromIterator<SimulationRow> for SimulationOutputs {
    fn from_iter<I: IntoIterator<Item = SimulationRow>>(iter: I) -> Self {
        let mut outputs = SimulationOutputs::default();
        for row in iter {
            outputs.diesel_fuel_usage.push(Volume(row.diesel_fuel_usage));
            outputs.households.push(row.households);
            outputs.grid_energy.push(row.grid_energy);
            outputs.kerosene_usage.push(row.kerosene_usage);
        }

        outputs
    }
}

/// A single year of load statistics
#[derive(Debug, Deserialize, PartialEq)]
struct YearlyLoadRow {
    #[serde(rename = "Maximum")]
    maximum: f64,
}

/// Read the hourly simulation outputs, checking that they cover the simulation window
fn read_simulation_outputs(model_dir: &Path, window: SimulationWindow) -> Result<SimulationOutputs> {
    let file_path = model_dir.join(SIMULATION_FILE_NAME);
    let rows: Vec<SimulationRow> = read_csv(&file_path)?;

    let expected_hours = window.num_days() * HOURS_PER_DAY;
    ensure!(
        rows.len() == expected_hours,
        "{} has {} rows, but the simulation window covers {expected_hours} hours",
        file_path.display(),
        rows.len()
    );

    Ok(rows.into_iter().collect())
}

/// Read the peak load for each year, checking that every year of the system lifetime is covered
fn read_yearly_peak_load(model_dir: &Path, max_years: u32) -> Result<Vec<f64>> {
    let file_path = model_dir.join(YEARLY_LOAD_STATISTICS_FILE_NAME);
    let rows: Vec<YearlyLoadRow> = read_csv(&file_path)?;

    ensure!(
        rows.len() >= max_years as usize,
        "{} has {} rows, but the system lifetime is {max_years} years",
        file_path.display(),
        rows.len()
    );
    ensure!(
        rows.iter()
            .all(|row| row.maximum.is_finite() && row.maximum >= 0.0),
        "Error reading {}: Maximum load must be a finite number greater than or equal to zero",
        file_path.display()
    );

    Ok(rows.into_iter().map(|row| row.maximum).collect())
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = ModelParameters::from_path(model_dir)?;
        let window = parameters.window()?;
        let finance = FinanceInputs::from_path(model_dir)?;

        // Every sized component needs finance inputs
        CostInputs::new(&finance, &parameters.sizes)
            .with_context(|| input_err_msg(model_dir.join("finance_inputs.toml")))?;

        let simulation = read_simulation_outputs(model_dir, window)?;
        let yearly_peak_load = read_yearly_peak_load(model_dir, parameters.max_years)?;
        let grid_times = read_grid_times(model_dir)?;
        let generation = GenerationInputs::from_path(model_dir)?;
        if let Some(generation) = &generation {
            generation
                .check_covers_lifetime(parameters.max_years)
                .with_context(|| input_err_msg(model_dir.join(GENERATION_FILE_NAME)))?;
        }

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            parameters,
            window,
            finance,
            simulation,
            yearly_peak_load,
            grid_times,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, file_name: &str, contents: &str) {
        let mut file = File::create(dir.join(file_name)).unwrap();
        write!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_read_simulation_outputs() {
        let dir = tempdir().unwrap();
        let mut contents = "diesel_fuel_usage,households,grid_energy\n".to_string();
        for hour in 0..8760 {
            contents.push_str(&format!("0.5,{},1\n", 10 + hour / 4380));
        }
        write_file(dir.path(), SIMULATION_FILE_NAME, &contents);

        let window = SimulationWindow::new(0, 1).unwrap();
        let outputs = read_simulation_outputs(dir.path(), window).unwrap();
        assert_eq!(outputs.diesel_fuel_usage.len(), 8760);
        assert_eq!(outputs.households[0], 10.0);
        assert_eq!(outputs.households[8759], 11.0);
        assert_eq!(outputs.grid_energy[0], 1.0);
        assert_eq!(outputs.kerosene_usage, vec![0.0; 8760]);

        // Window covering two years needs twice as many rows
        let window = SimulationWindow::new(0, 2).unwrap();
        assert!(read_simulation_outputs(dir.path(), window).is_err());
    }

    #[test]
    fn test_read_yearly_peak_load() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            YEARLY_LOAD_STATISTICS_FILE_NAME,
            "Maximum,Mean\n4000,1200\n4500,1300\n",
        );

        assert_eq!(
            read_yearly_peak_load(dir.path(), 2).unwrap(),
            [4000.0, 4500.0]
        );
        assert!(read_yearly_peak_load(dir.path(), 3).is_err());
    }
}
