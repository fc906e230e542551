//! Techno-economic modelling of off-grid and minigrid energy systems.
//!
//! The core of the crate calculates the discounted costs of a system over a simulation window.
//! Alongside this are tools for generating the grid-availability and weather profiles which
//! drive system simulations.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod component;
pub mod cost;
pub mod discount;
pub mod error;
pub mod expenditure;
pub mod finance;
pub mod grid;
pub mod input;
pub mod log;
pub mod model;
pub mod ninja;
pub mod output;
pub mod profile;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the folder in which program configuration files are stored
pub fn get_minigrid_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        // No standard config folder on this platform, so use the working directory
        return PathBuf::new();
    };

    dir.push("minigrid");
    dir
}
