//! The system components which carry a financial impact.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// A component of a minigrid system that has costs associated with it.
///
/// The serialised names are the keys used for component tables in `finance_inputs.toml`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    /// Balance-of-systems equipment, sized with the PV array
    Bos,
    /// Clean-water storage tanks
    CleanWaterTank,
    /// The diesel generator
    DieselGenerator,
    /// Diesel fuel consumed by the generator
    DieselFuel,
    /// Impacts associated with the system as a whole rather than any one component
    General,
    /// Energy bought from the national grid
    Grid,
    /// Hot-water storage tanks
    HotWaterTank,
    /// Household connections to the minigrid
    Households,
    /// The inverter, replaced periodically over the system lifetime
    Inverter,
    /// Kerosene used as a backup during supply outages
    Kerosene,
    /// Miscellaneous capacity-related costs
    Misc,
    /// The PV array
    Pv,
    /// The PV-T (hybrid photovoltaic-thermal) array
    PvT,
    /// Battery storage
    Storage,
}

impl ComponentKind {
    /// Whether installing this component is charged on top of its capital cost
    pub fn has_installation_cost(self) -> bool {
        !matches!(self, Self::Bos | Self::Storage)
    }

    /// Whether this piece of equipment has O&M costs of its own
    pub fn has_operating_cost(self) -> bool {
        self != Self::Bos
    }
}
