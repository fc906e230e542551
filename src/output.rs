//! The module responsible for writing output data to disk.
use crate::expenditure::CostSummary;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "minigrid_results";

/// The output file name for the cost summary
const COSTS_FILE_NAME: &str = "costs.csv";

/// Get the default output directory for the model in the specified directory
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory, emptying it first if it already exists and overwriting is
/// allowed.
///
/// # Returns
///
/// Whether an existing directory with contents was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
             --overwrite command line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// A row of the costs output file
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct CostRow {
    cost_type: String,
    value: f64,
}

/// Write the cost summary to `costs.csv` in the output folder
pub fn write_costs(output_dir: &Path, summary: &CostSummary) -> Result<()> {
    let file_path = output_dir.join(COSTS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for (cost_type, value) in summary.iter() {
        writer.serialize(CostRow {
            cost_type: cost_type.to_string(),
            value: value.value(),
        })?;
    }
    writer.flush()?;

    Ok(())
}
