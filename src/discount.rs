//! Discounting of daily cash flows over a simulation window.
//!
//! Days are counted from the start of the system lifetime (year 0), not from the start of the
//! window, so the first day of a window starting in year 5 is already discounted by five years.
use crate::error::CostError;
use crate::units::{DAYS_PER_YEAR, Dimensionless};
use std::iter::Sum;
use std::ops::{Mul, Range};

/// A span of whole simulation years, `[start_year, end_year)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationWindow {
    start_year: u32,
    end_year: u32,
}

impl SimulationWindow {
    /// Create a new window, checking that it spans at least one year
    pub fn new(start_year: u32, end_year: u32) -> Result<Self, CostError> {
        if start_year >= end_year {
            return Err(CostError::InvalidWindow {
                start_year,
                end_year,
            });
        }

        Ok(Self {
            start_year,
            end_year,
        })
    }

    /// The first simulated year
    pub fn start_year(&self) -> u32 {
        self.start_year
    }

    /// The year after the last simulated year
    pub fn end_year(&self) -> u32 {
        self.end_year
    }

    /// The years covered by the window
    pub fn years(&self) -> Range<u32> {
        self.start_year..self.end_year
    }

    /// Whether `year` falls inside the window
    pub fn contains(&self, year: u32) -> bool {
        self.years().contains(&year)
    }

    /// The day indices covered by the window, counted from the start of year 0
    pub fn days(&self) -> Range<usize> {
        let days_per_year = DAYS_PER_YEAR as usize;
        self.start_year as usize * days_per_year..self.end_year as usize * days_per_year
    }

    /// The number of days covered by the window
    pub fn num_days(&self) -> usize {
        self.days().len()
    }
}

/// Convert an annual rate into the equivalent daily rate by compounding.
///
/// `daily = (1 + annual)^(1/365) - 1`
pub fn daily_discount_rate(discount_rate: Dimensionless) -> Dimensionless {
    (Dimensionless(1.0) + discount_rate).powf(1.0 / DAYS_PER_YEAR) - Dimensionless(1.0)
}

/// Calculate the discount fraction for every day in the window.
///
/// The fraction for day `t` is `(1 + r_d)^-t`, where `r_d` is the daily discount rate. A zero
/// discount rate gives fractions of one throughout; a negative rate is accepted and gives
/// growing fractions.
pub fn discounted_fraction(
    discount_rate: Dimensionless,
    window: SimulationWindow,
) -> Vec<Dimensionless> {
    let denominator = Dimensionless(1.0) + daily_discount_rate(discount_rate);
    window
        .days()
        .map(|day| denominator.powf(-(day as f64)))
        .collect()
}

/// Calculate the discounted total of a daily series over the window.
///
/// The series must contain exactly one entry per day in the window.
pub fn discounted_total<T>(
    daily: &[T],
    discount_rate: Dimensionless,
    window: SimulationWindow,
) -> Result<T, CostError>
where
    T: Copy + Mul<Dimensionless, Output = T> + Sum,
{
    if daily.len() != window.num_days() {
        return Err(CostError::DimensionMismatch {
            expected: window.num_days(),
            actual: daily.len(),
        });
    }

    Ok(discounted_sum(daily, discount_rate, window))
}

/// Sum the discounted values of a daily series, pairing entries with the window's days in order.
///
/// Entries beyond the end of the window, and days beyond the end of the series, are ignored.
pub(crate) fn discounted_sum<T>(
    daily: &[T],
    discount_rate: Dimensionless,
    window: SimulationWindow,
) -> T
where
    T: Copy + Mul<Dimensionless, Output = T> + Sum,
{
    daily
        .iter()
        .zip(discounted_fraction(discount_rate, window))
        .map(|(value, fraction)| *value * fraction)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Money;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_window_new() {
        let window = SimulationWindow::new(2, 5).unwrap();
        assert_eq!(window.years(), 2..5);
        assert_eq!(window.days(), 730..1825);
        assert_eq!(window.num_days(), 1095);
        assert!(window.contains(2));
        assert!(!window.contains(5));

        assert_eq!(
            SimulationWindow::new(5, 5).unwrap_err().to_string(),
            "Invalid simulation window: start year 5 must be before end year 5"
        );
        assert!(SimulationWindow::new(6, 5).is_err());
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(0.05, 0.000_133_680_6)]
    #[case(0.1, 0.000_261_157_9)]
    fn test_daily_discount_rate(#[case] annual: f64, #[case] expected: f64) {
        assert_approx_eq!(
            Dimensionless,
            daily_discount_rate(Dimensionless(annual)),
            Dimensionless(expected),
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case(0.05)]
    #[case(0.1)]
    #[case(0.5)]
    fn test_discounted_fraction_decreasing(#[case] rate: f64) {
        let window = SimulationWindow::new(0, 2).unwrap();
        let fractions = discounted_fraction(Dimensionless(rate), window);
        assert_eq!(fractions.len(), 730);
        assert_eq!(fractions[0], Dimensionless(1.0));
        assert!(fractions.windows(2).all(|pair| pair[1] < pair[0]));

        // A full year of discounting should match the annual rate
        assert_approx_eq!(
            Dimensionless,
            fractions[365],
            Dimensionless(1.0 / (1.0 + rate)),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_discounted_fraction_zero_rate() {
        let window = SimulationWindow::new(1, 3).unwrap();
        assert!(
            discounted_fraction(Dimensionless(0.0), window)
                .into_iter()
                .all(|fraction| fraction == Dimensionless(1.0))
        );
    }

    #[test]
    fn test_discounted_fraction_negative_rate() {
        let window = SimulationWindow::new(0, 1).unwrap();
        let fractions = discounted_fraction(Dimensionless(-0.05), window);
        assert!(fractions.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn test_discounted_fraction_counts_from_year_zero() {
        let window = SimulationWindow::new(1, 2).unwrap();
        let fractions = discounted_fraction(Dimensionless(0.05), window);
        assert_eq!(fractions.len(), 365);
        assert_approx_eq!(
            Dimensionless,
            fractions[0],
            Dimensionless(1.0 / 1.05),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_discounted_total_constant_series() {
        let window = SimulationWindow::new(0, 1).unwrap();
        let daily = vec![Money(100.0); 365];
        let total = discounted_total(&daily, Dimensionless(0.05), window).unwrap();

        let factor = 1.05_f64.powf(-1.0 / 365.0);
        let expected = 100.0 * (1.0 - factor.powi(365)) / (1.0 - factor);
        assert_approx_eq!(Money, total, Money(expected), epsilon = 1e-4);
        assert!((35_500.0..35_700.0).contains(&total.value()));
    }

    #[test]
    fn test_discounted_total_linear() {
        let window = SimulationWindow::new(0, 1).unwrap();
        let rate = Dimensionless(0.08);
        let x: Vec<_> = (0..365).map(|day| Money(f64::from(day % 7))).collect();
        let y: Vec<_> = (0..365).map(|day| Money(f64::from(day) * 0.5)).collect();
        let (a, b) = (Dimensionless(2.0), Dimensionless(-3.0));
        let combined: Vec<_> = x.iter().zip(&y).map(|(x, y)| a * *x + b * *y).collect();

        let lhs = discounted_total(&combined, rate, window).unwrap();
        let rhs = a * discounted_total(&x, rate, window).unwrap()
            + b * discounted_total(&y, rate, window).unwrap();
        assert_approx_eq!(Money, lhs, rhs, epsilon = 1e-4);
    }

    #[test]
    fn test_discounted_total_dimension_mismatch() {
        let window = SimulationWindow::new(0, 1).unwrap();
        assert_eq!(
            discounted_total(&[Money(1.0); 364], Dimensionless(0.05), window),
            Err(CostError::DimensionMismatch {
                expected: 365,
                actual: 364
            })
        );
    }
}
