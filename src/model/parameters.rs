//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::discount::SimulationWindow;
use crate::finance::ComponentSizes;
use crate::input::{input_err_msg, read_toml};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// The first simulated year, counted from the start of the system lifetime
    pub start_year: u32,
    /// The year after the last simulated year
    pub end_year: u32,
    /// The lifetime of the system in years
    pub max_years: u32,
    /// The year in which the system equipment is installed.
    ///
    /// Defaults to `start_year`.
    #[serde(default)]
    pub installation_year: Option<u32>,
    /// The sizes of the system components
    #[serde(default)]
    pub sizes: ComponentSizes,
}

/// Check that the system lifetime covers the simulation window
fn check_max_years(max_years: u32, end_year: u32) -> Result<()> {
    ensure!(
        max_years >= end_year,
        "max_years ({max_years}) must be at least end_year ({end_year})"
    );

    Ok(())
}

/// Check that equipment is installed within the system lifetime
fn check_installation_year(installation_year: u32, max_years: u32) -> Result<()> {
    ensure!(
        installation_year < max_years,
        "installation_year ({installation_year}) must be before max_years ({max_years})"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The simulation window
    pub fn window(&self) -> Result<SimulationWindow> {
        Ok(SimulationWindow::new(self.start_year, self.end_year)?)
    }

    /// The year in which the system equipment is installed
    pub fn installation_year(&self) -> u32 {
        self.installation_year.unwrap_or(self.start_year)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        self.window()?;
        check_max_years(self.max_years, self.end_year)?;
        check_installation_year(self.installation_year(), self.max_years)?;
        self.sizes.validate().context("Invalid component sizes")?;

        Ok(())
    }
}
