//! Undiscounted costs for individual components.
use crate::discount::{SimulationWindow, discounted_sum};
use crate::units::{Capacity, Dimensionless, Money, MoneyPerCapacity, MoneyPerCapacityPerYear};

/// The number of days per year for which O&M costs are charged.
///
/// NB: This is deliberately *not* 365. It reproduces the day count used by earlier versions of
/// the model, so O&M is only charged for the first 265 days of each simulated year.
pub const OM_DAYS_PER_YEAR: usize = 265;

/// The factor by which a cost has fallen after `installation_year` years of decrease.
///
/// `cost_decrease` is given as an annual percentage.
fn cost_decrease_factor(cost_decrease: f64, installation_year: u32) -> Dimensionless {
    Dimensionless(1.0 - 0.01 * cost_decrease).powi(installation_year as i32)
}

/// Calculate the capital cost of a component installed in the given year.
///
/// `size * unit_cost * (1 - 0.01 * cost_decrease)^installation_year`
pub fn capital_cost(
    unit_cost: MoneyPerCapacity,
    cost_decrease: f64,
    size: Capacity,
    installation_year: u32,
) -> Money {
    unit_cost * size * cost_decrease_factor(cost_decrease, installation_year)
}

/// Calculate the cost of installing a component in the given year.
///
/// `size * installation_cost * (1 - 0.01 * installation_cost_decrease)^installation_year`
pub fn installation_cost(
    size: Capacity,
    installation_cost: MoneyPerCapacity,
    installation_cost_decrease: f64,
    installation_year: u32,
) -> Money {
    installation_cost * size * cost_decrease_factor(installation_cost_decrease, installation_year)
}

/// Calculate the discounted O&M cost of a component over the simulation window.
///
/// A constant daily cost of `size * om_cost / 365` is charged for [`OM_DAYS_PER_YEAR`] days
/// per simulated year, starting from the first day of the window.
pub fn operating_cost(
    om_cost: MoneyPerCapacityPerYear,
    size: Capacity,
    discount_rate: Dimensionless,
    window: SimulationWindow,
) -> Money {
    let daily_cost = (om_cost * size).per_day();
    let num_days = window.years().len() * OM_DAYS_PER_YEAR;
    discounted_sum(&vec![daily_cost; num_days], discount_rate, window)
}

/// Calculate miscellaneous costs, which scale with the combined PV and diesel capacity.
pub fn misc_cost(misc_cost: MoneyPerCapacity, pv_size: Capacity, diesel_size: Capacity) -> Money {
    misc_cost * (pv_size + diesel_size)
}
