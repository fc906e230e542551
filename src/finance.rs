//! Financial input parameters for the system components.
//!
//! These are read from `finance_inputs.toml` and validated once. [`CostInputs`] then pairs them
//! with the component sizes, checking that every sized component has a finance record, so that
//! the cost calculations themselves cannot fail on missing inputs.
use crate::component::ComponentKind;
use crate::error::CostError;
use crate::input::{check_non_negative, input_err_msg, read_toml};
use crate::units::{
    Capacity, Dimensionless, Money, MoneyPerCapacity, MoneyPerCapacityPerYear,
};
use anyhow::{Context, Result, ensure};
use log::error;
use serde::Deserialize;
use std::path::Path;

const FINANCE_INPUTS_FILE_NAME: &str = "finance_inputs.toml";

/// Financial parameters for a single component.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentFinance {
    /// Cost per unit size (or per unit consumed, for fuels and grid energy).
    ///
    /// For households this is the cost of a single connection.
    #[serde(default, alias = "connection_cost")]
    pub cost: f64,
    /// The annual percentage decrease in `cost`
    #[serde(default)]
    pub cost_decrease: f64,
    /// Annual operating and maintenance cost per unit size
    #[serde(default, rename = "o&m", alias = "om")]
    pub om: MoneyPerCapacityPerYear,
    /// Lifetime of the component in years
    #[serde(default)]
    pub lifetime: Option<u32>,
    /// The increments in which the component can be sized
    #[serde(default)]
    pub size_increment: Option<f64>,
    /// Installation cost per unit size
    #[serde(default)]
    pub installation_cost: MoneyPerCapacity,
    /// The annual percentage decrease in `installation_cost`
    #[serde(default)]
    pub installation_cost_decrease: f64,
}

impl ComponentFinance {
    /// The unit cost, for components sized by capacity
    pub fn unit_cost(&self) -> MoneyPerCapacity {
        MoneyPerCapacity(self.cost)
    }

    /// The cost of a single household connection
    pub fn connection_cost(&self) -> Money {
        Money(self.cost)
    }

    /// Check that all values are finite and non-negative
    fn validate(&self) -> Result<()> {
        check_non_negative(self.cost, "cost")?;
        check_non_negative(self.om.value(), "o&m")?;
        check_non_negative(self.installation_cost.value(), "installation_cost")?;
        ensure!(
            self.cost_decrease.is_finite() && self.installation_cost_decrease.is_finite(),
            "Cost decreases must be finite numbers"
        );
        if let Some(size_increment) = self.size_increment {
            ensure!(
                size_increment.is_finite() && size_increment > 0.0,
                "size_increment must be a finite number greater than zero"
            );
        }

        Ok(())
    }
}

/// The financial inputs for a whole system.
///
/// Components which are only present in some systems (tanks, PV-T, grid and kerosene) are
/// optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinanceInputs {
    /// The annual discount rate, in the range [0, 1)
    pub discount_rate: Dimensionless,
    /// Balance-of-systems equipment
    pub bos: ComponentFinance,
    /// The diesel generator
    pub diesel_generator: ComponentFinance,
    /// Diesel fuel, with `cost` given per litre
    pub diesel_fuel: ComponentFinance,
    /// General system-wide O&M
    pub general: ComponentFinance,
    /// Household connections
    pub households: ComponentFinance,
    /// Inverter replacements
    pub inverter: ComponentFinance,
    /// Miscellaneous costs, charged per unit of PV and diesel capacity
    pub misc: ComponentFinance,
    /// The PV array
    pub pv: ComponentFinance,
    /// Battery storage
    pub storage: ComponentFinance,
    /// Clean-water tanks
    #[serde(default)]
    pub clean_water_tank: Option<ComponentFinance>,
    /// Energy bought from the grid, with `cost` given per kWh
    #[serde(default)]
    pub grid: Option<ComponentFinance>,
    /// Hot-water tanks
    #[serde(default)]
    pub hot_water_tank: Option<ComponentFinance>,
    /// Kerosene, with `cost` given per litre
    #[serde(default)]
    pub kerosene: Option<ComponentFinance>,
    /// The PV-T array
    #[serde(default)]
    pub pv_t: Option<ComponentFinance>,
}

impl FinanceInputs {
    /// Read the finance inputs file from the specified model directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<FinanceInputs> {
        let file_path = model_dir.as_ref().join(FINANCE_INPUTS_FILE_NAME);
        let inputs: FinanceInputs = read_toml(&file_path)?;
        inputs.validate().with_context(|| input_err_msg(&file_path))?;

        Ok(inputs)
    }

    /// Iterate over the finance records which are present, along with their component kind
    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &ComponentFinance)> {
        [
            (ComponentKind::Bos, Some(&self.bos)),
            (ComponentKind::CleanWaterTank, self.clean_water_tank.as_ref()),
            (ComponentKind::DieselGenerator, Some(&self.diesel_generator)),
            (ComponentKind::DieselFuel, Some(&self.diesel_fuel)),
            (ComponentKind::General, Some(&self.general)),
            (ComponentKind::Grid, self.grid.as_ref()),
            (ComponentKind::HotWaterTank, self.hot_water_tank.as_ref()),
            (ComponentKind::Households, Some(&self.households)),
            (ComponentKind::Inverter, Some(&self.inverter)),
            (ComponentKind::Kerosene, self.kerosene.as_ref()),
            (ComponentKind::Misc, Some(&self.misc)),
            (ComponentKind::Pv, Some(&self.pv)),
            (ComponentKind::PvT, self.pv_t.as_ref()),
            (ComponentKind::Storage, Some(&self.storage)),
        ]
        .into_iter()
        .filter_map(|(kind, finance)| finance.map(|finance| (kind, finance)))
    }

    /// How the inverter is resized each time it is replaced.
    ///
    /// Fails if the inverter has no positive lifetime or no positive size increment, which
    /// [`FinanceInputs::from_path`] rules out.
    pub fn inverter_sizing(&self) -> Result<InverterSizing, CostError> {
        let lifetime = self
            .inverter
            .lifetime
            .filter(|&lifetime| lifetime > 0)
            .ok_or(CostError::InvalidInverterSizing("lifetime greater than zero"))?;
        let size_increment = self
            .inverter
            .size_increment
            .filter(|increment| increment.is_finite() && *increment > 0.0)
            .ok_or(CostError::InvalidInverterSizing(
                "size_increment greater than zero",
            ))?;

        Ok(InverterSizing {
            lifetime,
            size_increment,
        })
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_discount_rate(self.discount_rate)?;

        for (kind, finance) in self.iter() {
            finance
                .validate()
                .with_context(|| format!("Invalid finance inputs for {kind}"))?;
        }

        self.inverter_sizing()?;

        Ok(())
    }
}

/// The lifetime and size increment of a replaceable inverter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverterSizing {
    /// Years between replacements, always greater than zero
    pub lifetime: u32,
    /// Inverter capacity is rounded up to a multiple of this, always greater than zero
    pub size_increment: f64,
}

/// Check that the discount rate lies in [0, 1)
fn check_discount_rate(value: Dimensionless) -> Result<()> {
    ensure!(
        value.is_finite() && (0.0..1.0).contains(&value.value()),
        "discount_rate must be at least zero and less than one"
    );

    Ok(())
}

/// The sizes of the components making up a system.
///
/// Tank sizes are numbers of tanks; all other sizes are capacities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentSizes {
    /// Capacity of the PV array
    #[serde(default)]
    pub pv: Capacity,
    /// Capacity of the PV-T array
    #[serde(default)]
    pub pv_t: Capacity,
    /// Capacity of the diesel generator
    #[serde(default)]
    pub diesel: Capacity,
    /// Capacity of the battery storage
    #[serde(default)]
    pub storage: Capacity,
    /// The number of clean-water tanks
    #[serde(default)]
    pub clean_water_tanks: Capacity,
    /// The number of hot-water tanks
    #[serde(default)]
    pub hot_water_tanks: Capacity,
}

impl ComponentSizes {
    /// Check that all sizes are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("pv", self.pv),
            ("pv_t", self.pv_t),
            ("diesel", self.diesel),
            ("storage", self.storage),
            ("clean_water_tanks", self.clean_water_tanks),
            ("hot_water_tanks", self.hot_water_tanks),
        ] {
            check_non_negative(size.value(), name)?;
        }

        Ok(())
    }
}

/// Finance inputs paired with the sizes of the components they apply to.
///
/// Constructing this checks that every component with a non-zero size has a finance record,
/// after which every cost calculation over it is infallible.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    finance: &'a FinanceInputs,
    sizes: &'a ComponentSizes,
    clean_water_tank: Option<&'a ComponentFinance>,
    hot_water_tank: Option<&'a ComponentFinance>,
    pv_t: Option<&'a ComponentFinance>,
}

impl<'a> CostInputs<'a> {
    /// Pair finance inputs with component sizes.
    ///
    /// # Returns
    ///
    /// An error naming the first optional component which is sized but has no finance record.
    pub fn new(finance: &'a FinanceInputs, sizes: &'a ComponentSizes) -> Result<Self, CostError> {
        Ok(Self {
            finance,
            sizes,
            clean_water_tank: sized_record(
                ComponentKind::CleanWaterTank,
                finance.clean_water_tank.as_ref(),
                sizes.clean_water_tanks,
            )?,
            hot_water_tank: sized_record(
                ComponentKind::HotWaterTank,
                finance.hot_water_tank.as_ref(),
                sizes.hot_water_tanks,
            )?,
            pv_t: sized_record(ComponentKind::PvT, finance.pv_t.as_ref(), sizes.pv_t)?,
        })
    }

    /// The underlying finance inputs
    pub fn finance(&self) -> &'a FinanceInputs {
        self.finance
    }

    /// The underlying component sizes
    pub fn sizes(&self) -> &'a ComponentSizes {
        self.sizes
    }

    /// The discount rate
    pub fn discount_rate(&self) -> Dimensionless {
        self.finance.discount_rate
    }

    /// Iterate over the installed equipment with its finance record and size.
    ///
    /// Optional components are only included when they have a non-zero size. Balance-of-systems
    /// equipment is sized with the PV array.
    pub fn equipment(&self) -> impl Iterator<Item = (ComponentKind, &'a ComponentFinance, Capacity)> {
        let finance = self.finance;
        let sizes = self.sizes;
        [
            (ComponentKind::Bos, Some(&finance.bos), sizes.pv),
            (
                ComponentKind::CleanWaterTank,
                self.clean_water_tank,
                sizes.clean_water_tanks,
            ),
            (
                ComponentKind::DieselGenerator,
                Some(&finance.diesel_generator),
                sizes.diesel,
            ),
            (
                ComponentKind::HotWaterTank,
                self.hot_water_tank,
                sizes.hot_water_tanks,
            ),
            (ComponentKind::Pv, Some(&finance.pv), sizes.pv),
            (ComponentKind::PvT, self.pv_t, sizes.pv_t),
            (ComponentKind::Storage, Some(&finance.storage), sizes.storage),
        ]
        .into_iter()
        .filter_map(|(kind, finance, size)| finance.map(|finance| (kind, finance, size)))
    }
}

/// Get the finance record for an optional component, if the component is sized
fn sized_record(
    kind: ComponentKind,
    record: Option<&ComponentFinance>,
    size: Capacity,
) -> Result<Option<&ComponentFinance>, CostError> {
    if size <= Capacity(0.0) {
        return Ok(None);
    }

    match record {
        Some(record) => Ok(Some(record)),
        None => {
            error!("No {kind} financial input information provided.");
            Err(CostError::MissingFinanceInput {
                component: kind,
                size: size.value(),
            })
        }
    }
}
