//! Fixtures for tests

use crate::finance::{ComponentFinance, ComponentSizes, FinanceInputs};
use crate::units::{Capacity, Dimensionless, MoneyPerCapacity, MoneyPerCapacityPerYear};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A finance record with the given unit cost and no other costs
pub fn component_finance(cost: f64) -> ComponentFinance {
    ComponentFinance {
        cost,
        ..ComponentFinance::default()
    }
}

#[fixture]
pub fn finance_inputs() -> FinanceInputs {
    FinanceInputs {
        discount_rate: Dimensionless(0.1),
        bos: component_finance(100.0),
        diesel_generator: ComponentFinance {
            installation_cost: MoneyPerCapacity(50.0),
            ..component_finance(200.0)
        },
        diesel_fuel: component_finance(1.0),
        general: ComponentFinance {
            om: MoneyPerCapacityPerYear(365.0),
            ..ComponentFinance::default()
        },
        households: component_finance(100.0),
        inverter: ComponentFinance {
            lifetime: Some(10),
            size_increment: Some(1.0),
            ..component_finance(200.0)
        },
        misc: component_finance(10.0),
        pv: ComponentFinance {
            om: MoneyPerCapacityPerYear(36.5),
            installation_cost: MoneyPerCapacity(100.0),
            ..component_finance(500.0)
        },
        storage: component_finance(400.0),
        clean_water_tank: None,
        grid: None,
        hot_water_tank: None,
        kerosene: None,
        pv_t: None,
    }
}

#[fixture]
pub fn component_sizes() -> ComponentSizes {
    ComponentSizes {
        pv: Capacity(10.0),
        diesel: Capacity(5.0),
        storage: Capacity(20.0),
        ..ComponentSizes::default()
    }
}
