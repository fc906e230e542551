//! Whole-system expenditure, combining the costs of the individual components.
use crate::component::ComponentKind;
use crate::cost::{capital_cost, installation_cost, misc_cost, operating_cost};
use crate::discount::{SimulationWindow, daily_discount_rate, discounted_total};
use crate::error::CostError;
use crate::finance::{ComponentFinance, CostInputs, FinanceInputs, InverterSizing};
use crate::model::Model;
use crate::profile::hourly_profile_to_daily_sum;
use crate::units::{Capacity, Dimensionless, Money, MoneyPerVolume, Volume};
use itertools::{Itertools, MinMaxResult};
use log::{debug, error};

/// The fraction by which costs incurred in `installation_year` are discounted.
///
/// NB: This uses a simple `(1 - r)^year` factor, unlike the compounded daily discounting used
/// for costs which are spread across the simulation window.
fn installation_discount(discount_rate: Dimensionless, installation_year: u32) -> Dimensionless {
    (Dimensionless(1.0) - discount_rate).powi(installation_year as i32)
}

/// Round a sum of money to the nearest hundredth of a unit
fn round_to_cents(money: Money) -> Money {
    Money((money.value() * 100.0).round() / 100.0)
}

/// Calculate the undiscounted cost of all system equipment installed in the given year.
///
/// This is the capital cost of every installed component, the installation cost of those
/// installed separately, plus miscellaneous costs proportional to the combined PV and diesel
/// capacity. Balance-of-systems and storage installation is included in their capital cost.
pub fn total_equipment_cost(inputs: &CostInputs, installation_year: u32) -> Money {
    let equipment_cost: Money = inputs
        .equipment()
        .map(|(kind, finance, size)| {
            let mut cost = capital_cost(
                finance.unit_cost(),
                finance.cost_decrease,
                size,
                installation_year,
            );
            if kind.has_installation_cost() {
                cost = cost
                    + installation_cost(
                        size,
                        finance.installation_cost,
                        finance.installation_cost_decrease,
                        installation_year,
                    );
            }
            debug!("Equipment cost for {kind} (size {size}): {cost}");
            cost
        })
        .sum();

    let sizes = inputs.sizes();
    let misc = misc_cost(inputs.finance().misc.unit_cost(), sizes.pv, sizes.diesel);
    debug!("Miscellaneous equipment cost: {misc}");

    equipment_cost + misc
}

/// Calculate the cost of all system equipment, discounted to the installation year.
pub fn discounted_equipment_cost(inputs: &CostInputs, installation_year: u32) -> Money {
    total_equipment_cost(inputs, installation_year)
        * installation_discount(inputs.discount_rate(), installation_year)
}

/// Calculate the discounted O&M cost of the whole system over the simulation window.
///
/// As well as the O&M for each installed component, this includes general O&M costs for the
/// system, which are charged as though for a component of unit size. Balance-of-systems
/// equipment has no O&M of its own.
pub fn total_operating_cost(inputs: &CostInputs, window: SimulationWindow) -> Money {
    let discount_rate = inputs.discount_rate();
    let general = &inputs.finance().general;
    inputs
        .equipment()
        .filter(|(kind, _, _)| kind.has_operating_cost())
        .chain([(ComponentKind::General, general, Capacity(1.0))])
        .map(|(kind, finance, size)| {
            let cost = operating_cost(finance.om, size, discount_rate, window);
            debug!("O&M cost for {kind}: {cost}");
            cost
        })
        .sum()
}

/// Calculate the discounted cost of the diesel fuel used over the simulation window.
///
/// The fuel price falls at the fuel's annual cost-decrease rate, converted to an equivalent
/// daily rate, starting from the first day of year 0.
///
/// # Arguments
///
/// * `hourly_usage` - Fuel used in each hour of the window
/// * `finance` - Finance inputs for the system
/// * `window` - The simulation window
pub fn diesel_fuel_cost(
    hourly_usage: &[Volume],
    finance: &FinanceInputs,
    window: SimulationWindow,
) -> Result<Money, CostError> {
    let daily_usage = hourly_profile_to_daily_sum(hourly_usage);
    if daily_usage.len() != window.num_days() {
        return Err(CostError::DimensionMismatch {
            expected: window.num_days(),
            actual: daily_usage.len(),
        });
    }

    let fuel = &finance.diesel_fuel;
    let price_decrease = daily_discount_rate(Dimensionless(0.01 * fuel.cost_decrease));
    let daily_cost: Vec<Money> = daily_usage
        .into_iter()
        .zip(window.days())
        .map(|(usage, day)| {
            let price = MoneyPerVolume(fuel.cost)
                * (Dimensionless(1.0) - price_decrease).powf(day as f64);
            price * usage
        })
        .collect();

    discounted_total(&daily_cost, finance.discount_rate, window)
}

/// Calculate the cost of connecting new households to the system.
///
/// Every household connected over the course of the simulation is treated as having been
/// connected in `installation_year`, so the cost is `(max - min) * connection_cost`, discounted
/// to that year.
pub fn connection_cost(finance: &FinanceInputs, households: &[f64], installation_year: u32) -> Money {
    let new_connections = match households.iter().minmax() {
        MinMaxResult::MinMax(min, max) => max - min,
        MinMaxResult::OneElement(_) | MinMaxResult::NoElements => 0.0,
    };

    finance.households.connection_cost()
        * Dimensionless(new_connections)
        * installation_discount(finance.discount_rate, installation_year)
}

/// Calculate the discounted cost of replacing the inverter during the simulation window.
///
/// The inverter is replaced at multiples of its lifetime over the whole system lifetime. At each
/// replacement it is sized for the peak load over the following lifetime interval, rounded up to
/// the inverter's size increment. Only replacements which fall inside the window are counted.
/// Fails if the inverter has no lifetime or size increment.
///
/// # Arguments
///
/// * `finance` - Finance inputs for the system
/// * `yearly_peak_load` - The maximum load (in W) for each year of the system lifetime
/// * `max_years` - The system lifetime in years
/// * `window` - The simulation window
pub fn inverter_replacement_cost(
    finance: &FinanceInputs,
    yearly_peak_load: &[f64],
    max_years: u32,
    window: SimulationWindow,
) -> Result<Money, CostError> {
    let InverterSizing {
        lifetime,
        size_increment,
    } = finance.inverter_sizing()?;
    let inverter = &finance.inverter;

    let total: Money = inverter_replacement_years(lifetime, max_years)
        .filter(|year| window.contains(*year))
        .map(|year| {
            let peak_load = yearly_peak_load
                .iter()
                .skip(year as usize)
                .take(lifetime as usize)
                .copied()
                .fold(0.0, f64::max);

            // Peak load is given in W, but inverters are sized in kW
            let size = Capacity((0.001 * peak_load / size_increment).ceil() * size_increment);
            let cost = capital_cost(inverter.unit_cost(), inverter.cost_decrease, size, year)
                * installation_discount(finance.discount_rate, year);
            debug!("Inverter replacement in year {year} (size {size}): {cost}");
            cost
        })
        .sum();

    Ok(round_to_cents(total))
}

/// The years in which the inverter is (re)installed over the system lifetime
fn inverter_replacement_years(lifetime: u32, max_years: u32) -> impl Iterator<Item = u32> {
    (0..max_years).step_by(lifetime.max(1) as usize)
}

/// Calculate the discounted cost of equipment which is independent of the simulation window.
///
/// Currently this consists only of inverter replacements.
pub fn independent_expenditure(
    finance: &FinanceInputs,
    yearly_peak_load: &[f64],
    max_years: u32,
    window: SimulationWindow,
) -> Result<Money, CostError> {
    inverter_replacement_cost(finance, yearly_peak_load, max_years, window)
}

/// Calculate the discounted cost of a component's hourly usage, e.g. grid energy or kerosene.
///
/// `hourly_usage` is given in whatever unit the component's `cost` is quoted per. A component
/// with no finance record contributes nothing, unless it is actually used.
pub fn usage_expenditure(
    kind: ComponentKind,
    finance: Option<&ComponentFinance>,
    hourly_usage: &[f64],
    discount_rate: Dimensionless,
    window: SimulationWindow,
) -> Result<Money, CostError> {
    let Some(finance) = finance else {
        let peak_usage = hourly_usage.iter().copied().fold(0.0, f64::max);
        if peak_usage > 0.0 {
            error!("No {kind} financial input information provided.");
            return Err(CostError::MissingFinanceInput {
                component: kind,
                size: peak_usage,
            });
        }

        return Ok(Money(0.0));
    };

    let hourly_cost: Vec<Money> = hourly_usage
        .iter()
        .map(|usage| Money(usage * finance.cost))
        .collect();
    discounted_total(
        &hourly_profile_to_daily_sum(&hourly_cost),
        discount_rate,
        window,
    )
}

/// The discounted costs of a system over the simulation window, broken down by type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSummary {
    /// Undiscounted cost of the equipment installed in the installation year
    pub equipment: Money,
    /// Equipment cost discounted to the installation year
    pub discounted_equipment: Money,
    /// Cost of new household connections
    pub connections: Money,
    /// O&M cost
    pub operating: Money,
    /// Cost of diesel fuel
    pub diesel_fuel: Money,
    /// Cost of energy bought from the grid
    pub grid: Money,
    /// Cost of kerosene
    pub kerosene: Money,
    /// Cost of inverter replacements
    pub inverter: Money,
}

impl CostSummary {
    /// Calculate the costs of the system described by `model`
    pub fn calculate(model: &Model) -> Result<Self, CostError> {
        let finance = &model.finance;
        let window = model.window;
        let installation_year = model.parameters.installation_year();
        let inputs = CostInputs::new(finance, &model.parameters.sizes)?;
        let simulation = &model.simulation;

        Ok(Self {
            equipment: total_equipment_cost(&inputs, installation_year),
            discounted_equipment: discounted_equipment_cost(&inputs, installation_year),
            connections: connection_cost(finance, &simulation.households, installation_year),
            operating: total_operating_cost(&inputs, window),
            diesel_fuel: diesel_fuel_cost(&simulation.diesel_fuel_usage, finance, window)?,
            grid: usage_expenditure(
                ComponentKind::Grid,
                finance.grid.as_ref(),
                &simulation.grid_energy,
                finance.discount_rate,
                window,
            )?,
            kerosene: usage_expenditure(
                ComponentKind::Kerosene,
                finance.kerosene.as_ref(),
                &simulation.kerosene_usage,
                finance.discount_rate,
                window,
            )?,
            inverter: independent_expenditure(
                finance,
                &model.yearly_peak_load,
                model.parameters.max_years,
                window,
            )?,
        })
    }

    /// The total discounted cost of the system.
    ///
    /// Equipment is counted at its discounted cost.
    pub fn total(&self) -> Money {
        self.discounted_equipment
            + self.connections
            + self.operating
            + self.diesel_fuel
            + self.grid
            + self.kerosene
            + self.inverter
    }

    /// Iterate over the named cost types, ending with the total
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Money)> {
        [
            ("equipment", self.equipment),
            ("discounted_equipment", self.discounted_equipment),
            ("connections", self.connections),
            ("operating", self.operating),
            ("diesel_fuel", self.diesel_fuel),
            ("grid", self.grid),
            ("kerosene", self.kerosene),
            ("inverter", self.inverter),
            ("total", self.total()),
        ]
        .into_iter()
    }
}
