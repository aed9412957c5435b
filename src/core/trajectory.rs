use serde::{Deserialize, Serialize};

use super::DEFAULT_REAL_RETURN;

pub const DEFAULT_TRAJECTORY_YEARS: u32 = 30;
pub const DEFAULT_DELAY_MONTHS: u32 = 12;

fn default_real_return() -> f64 {
    DEFAULT_REAL_RETURN
}

fn default_years() -> u32 {
    DEFAULT_TRAJECTORY_YEARS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryInputs {
    pub gross_annual: f64,
    pub current_401k_pct: f64,
    pub optimized_401k_pct: f64,
    pub match_pct: f64,
    pub has_employer_match: bool,
    #[serde(default = "default_real_return")]
    pub real_return: f64,
    #[serde(default = "default_years")]
    pub years: u32,
}

impl TrajectoryInputs {
    pub fn new(
        gross_annual: f64,
        current_401k_pct: f64,
        optimized_401k_pct: f64,
        match_pct: f64,
        has_employer_match: bool,
    ) -> Self {
        Self {
            gross_annual,
            current_401k_pct,
            optimized_401k_pct,
            match_pct,
            has_employer_match,
            real_return: DEFAULT_REAL_RETURN,
            years: DEFAULT_TRAJECTORY_YEARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryResult {
    pub baseline_by_year: Vec<f64>,
    pub optimized_by_year: Vec<f64>,
    pub year_labels: Vec<String>,
    pub baseline_end: f64,
    pub optimized_end: f64,
    #[serde(rename = "delta30yr")]
    pub delta_30yr: f64,
}

#[derive(Debug, Clone, Copy)]
struct MonthlyFlow {
    employee: f64,
    employer: f64,
}

impl MonthlyFlow {
    fn at_pct(inputs: &TrajectoryInputs, pct: f64) -> Self {
        let gross = inputs.gross_annual.max(0.0);
        let pct = pct.max(0.0);
        let employee = gross * pct / 100.0 / 12.0;
        let employer = if inputs.has_employer_match {
            gross * pct.min(inputs.match_pct.max(0.0)) / 100.0 / 12.0
        } else {
            0.0
        };
        Self { employee, employer }
    }

    fn total(self) -> f64 {
        self.employee + self.employer
    }
}

fn monthly_rate(real_return: f64) -> f64 {
    real_return / 12.0
}

/// Future value of `n` end-of-period payments of `payment` at periodic rate `rate`.
pub fn annuity_future_value(payment: f64, rate: f64, n: u32) -> f64 {
    if rate.abs() < 1e-12 {
        return payment * n as f64;
    }
    payment * ((1.0 + rate).powi(n as i32) - 1.0) / rate
}

fn simulate_path(inputs: &TrajectoryInputs, pct: f64) -> Vec<f64> {
    let flow = MonthlyFlow::at_pct(inputs, pct).total();
    let rate = monthly_rate(inputs.real_return);
    let year_growth = (1.0 + rate).powi(12);
    let year_contribution = annuity_future_value(flow, rate, 12);

    let mut balances = Vec::with_capacity(inputs.years as usize + 1);
    let mut balance = 0.0;
    balances.push(balance);
    for _ in 0..inputs.years {
        balance = (balance * year_growth + year_contribution).round();
        balances.push(balance);
    }
    balances
}

pub fn run_trajectory(inputs: &TrajectoryInputs) -> TrajectoryResult {
    let baseline_by_year = simulate_path(inputs, inputs.current_401k_pct);
    let optimized_by_year = simulate_path(inputs, inputs.optimized_401k_pct);
    let year_labels = (0..=inputs.years).map(|y| format!("Year {y}")).collect();

    let baseline_end = baseline_by_year.last().copied().unwrap_or(0.0);
    let optimized_end = optimized_by_year.last().copied().unwrap_or(0.0);

    TrajectoryResult {
        baseline_by_year,
        optimized_by_year,
        year_labels,
        baseline_end,
        optimized_end,
        delta_30yr: optimized_end - baseline_end,
    }
}

/// Shortfall from running at the current rate for `delay_months` before switching to
/// the optimized rate, versus optimizing from month zero.
pub fn cost_of_delay(inputs: &TrajectoryInputs, delay_months: u32) -> i64 {
    let total_months = inputs.years * 12;
    let delay_months = delay_months.min(total_months);
    let rate = monthly_rate(inputs.real_return);
    let baseline = MonthlyFlow::at_pct(inputs, inputs.current_401k_pct).total();
    let optimized = MonthlyFlow::at_pct(inputs, inputs.optimized_401k_pct).total();

    let on_time = simulate_months(total_months, rate, |_| optimized);
    let delayed = simulate_months(total_months, rate, |month| {
        if month < delay_months {
            baseline
        } else {
            optimized
        }
    });
    (on_time - delayed).round() as i64
}

fn simulate_months(total_months: u32, rate: f64, contribution: impl Fn(u32) -> f64) -> f64 {
    let mut balance = 0.0;
    for month in 0..total_months {
        balance = balance * (1.0 + rate) + contribution(month);
        if (month + 1) % 12 == 0 {
            balance = balance.round();
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> TrajectoryInputs {
        TrajectoryInputs::new(100_000.0, 3.0, 5.0, 5.0, true)
    }

    #[test]
    fn year_zero_is_zero_and_length_is_years_plus_one() {
        let result = run_trajectory(&sample_inputs());
        assert_eq!(result.baseline_by_year.len(), 31);
        assert_eq!(result.optimized_by_year.len(), 31);
        assert_eq!(result.year_labels.len(), 31);
        assert_eq!(result.year_labels[0], "Year 0");
        assert_approx(result.baseline_by_year[0], 0.0);
        assert_approx(result.optimized_by_year[0], 0.0);
    }

    #[test]
    fn oracle_zero_return_is_linear_sum_of_contributions() {
        let mut inputs = sample_inputs();
        inputs.real_return = 0.0;
        inputs.years = 3;
        let result = run_trajectory(&inputs);

        // Baseline: 3% employee + 3% match = 6,000/yr.
        // Optimized: 5% employee + 5% match = 10,000/yr.
        assert_eq!(result.baseline_by_year, vec![0.0, 6_000.0, 12_000.0, 18_000.0]);
        assert_eq!(result.optimized_by_year, vec![0.0, 10_000.0, 20_000.0, 30_000.0]);
        assert_approx(result.delta_30yr, 12_000.0);
    }

    #[test]
    fn oracle_first_year_uses_monthly_annuity_formula() {
        let mut inputs = sample_inputs();
        inputs.years = 1;
        inputs.has_employer_match = false;
        inputs.current_401k_pct = 12.0;
        let result = run_trajectory(&inputs);

        let i: f64 = 0.07 / 12.0;
        let expected = (1_000.0 * ((1.0 + i).powi(12) - 1.0) / i).round();
        assert_approx(result.baseline_by_year[1], expected);
        assert_approx(result.baseline_by_year[1], 12_393.0);
    }

    #[test]
    fn match_is_capped_at_match_pct() {
        let mut inputs = sample_inputs();
        inputs.real_return = 0.0;
        inputs.years = 1;
        inputs.current_401k_pct = 10.0;
        inputs.match_pct = 4.0;
        let result = run_trajectory(&inputs);
        assert_approx(result.baseline_by_year[1], 14_000.0);
    }

    #[test]
    fn delta_can_be_negative_when_optimized_is_lower() {
        let mut inputs = sample_inputs();
        inputs.current_401k_pct = 10.0;
        inputs.optimized_401k_pct = 2.0;
        let result = run_trajectory(&inputs);
        assert!(result.delta_30yr < 0.0);
        assert_approx(result.delta_30yr, result.optimized_end - result.baseline_end);
    }

    #[test]
    fn zero_salary_yields_flat_zero_paths() {
        let mut inputs = sample_inputs();
        inputs.gross_annual = 0.0;
        let result = run_trajectory(&inputs);
        assert!(result.optimized_by_year.iter().all(|v| *v == 0.0));
        assert_eq!(cost_of_delay(&inputs, DEFAULT_DELAY_MONTHS), 0);
    }

    #[test]
    fn oracle_cost_of_delay_at_zero_return_is_missed_contributions() {
        let mut inputs = sample_inputs();
        inputs.real_return = 0.0;
        // 12 months at 10,000/yr instead of 6,000/yr.
        assert_eq!(cost_of_delay(&inputs, 12), 4_000);
        assert_eq!(cost_of_delay(&inputs, 0), 0);
    }

    #[test]
    fn delay_longer_than_horizon_is_clamped() {
        let mut inputs = sample_inputs();
        inputs.years = 1;
        inputs.real_return = 0.0;
        assert_eq!(cost_of_delay(&inputs, 600), 4_000);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_paths_start_at_zero_and_never_decrease(
            gross in 0u32..400_000,
            current in 0u32..30,
            optimized in 0u32..30,
            match_pct in 0u32..10,
            has_match in proptest::bool::ANY,
            return_bp in 0u32..1_200,
            years in 1u32..45
        ) {
            let inputs = TrajectoryInputs {
                gross_annual: gross as f64,
                current_401k_pct: current as f64,
                optimized_401k_pct: optimized as f64,
                match_pct: match_pct as f64,
                has_employer_match: has_match,
                real_return: return_bp as f64 / 10_000.0,
                years,
            };
            let result = run_trajectory(&inputs);
            prop_assert_eq!(result.baseline_by_year[0], 0.0);
            prop_assert_eq!(result.optimized_by_year[0], 0.0);
            prop_assert_eq!(result.baseline_by_year.len(), years as usize + 1);
            for path in [&result.baseline_by_year, &result.optimized_by_year] {
                prop_assert!(path.windows(2).all(|w| w[1] >= w[0]));
            }
            prop_assert_eq!(result.delta_30yr, result.optimized_end - result.baseline_end);
        }

        #[test]
        fn prop_cost_of_delay_is_non_negative_for_upside(
            gross in 10_000u32..400_000,
            current in 0u32..20,
            bump in 1u32..15,
            match_pct in 0u32..8,
            return_bp in 1u32..1_200,
            delay in 0u32..60
        ) {
            let mut inputs = TrajectoryInputs::new(
                gross as f64,
                current as f64,
                (current + bump) as f64,
                match_pct as f64,
                true,
            );
            inputs.real_return = return_bp as f64 / 10_000.0;
            prop_assert!(cost_of_delay(&inputs, delay) >= 0);
        }
    }
}
