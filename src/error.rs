//! Error kinds raised by the cost calculations and the weather-data boundary.
use crate::component::ComponentKind;
use thiserror::Error;

/// An error raised while computing costs or while consuming external profile data.
///
/// Everything outside the cost core works with [`anyhow::Error`]; these variants can be
/// recovered from it with `downcast_ref` when a caller needs to tell them apart.
#[derive(Debug, Error, PartialEq)]
pub enum CostError {
    /// A component has a non-zero size but no finance record.
    #[error(
        "No {component} financial input information provided, but a non-zero {component} \
         size ({size}) is being considered"
    )]
    MissingFinanceInput {
        /// The component missing from the finance inputs
        component: ComponentKind,
        /// The size of the component which required the record
        size: f64,
    },

    /// A daily series does not cover the simulation window exactly.
    #[error("Daily series has {actual} entries but the simulation window covers {expected} days")]
    DimensionMismatch {
        /// Number of days in the simulation window
        expected: usize,
        /// Number of entries in the daily series
        actual: usize,
    },

    /// The inverter cannot be resized on replacement.
    #[error("The inverter must have a {0}")]
    InvalidInverterSizing(&'static str),

    /// The simulation window is empty or reversed.
    #[error("Invalid simulation window: start year {start_year} must be before end year {end_year}")]
    InvalidWindow {
        /// First simulated year
        start_year: u32,
        /// Year after the last simulated year
        end_year: u32,
    },

    /// The weather-data API returned something other than the expected structured data.
    #[error("Malformed weather-data response: {0}. Check that the API token is correct")]
    MalformedResponse(String),
}
