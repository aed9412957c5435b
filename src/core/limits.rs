use serde::Serialize;

use super::types::HsaCoverage;

/// IRS contribution limits for a single plan year.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionLimits {
    pub plan_year: u16,
    pub employee_deferral_cap: f64,
    pub hsa_single_cap: f64,
    pub hsa_family_cap: f64,
}

const KNOWN_LIMITS: [ContributionLimits; 3] = [
    ContributionLimits {
        plan_year: 2024,
        employee_deferral_cap: 23_000.0,
        hsa_single_cap: 4_150.0,
        hsa_family_cap: 8_300.0,
    },
    ContributionLimits {
        plan_year: 2025,
        employee_deferral_cap: 23_500.0,
        hsa_single_cap: 4_300.0,
        hsa_family_cap: 8_550.0,
    },
    ContributionLimits {
        plan_year: 2026,
        employee_deferral_cap: 24_500.0,
        hsa_single_cap: 4_400.0,
        hsa_family_cap: 8_750.0,
    },
];

pub const DEFAULT_PLAN_YEAR: u16 = 2025;

impl ContributionLimits {
    /// Limits for `plan_year`. Years past the table reuse the latest known year;
    /// years before it reuse the earliest.
    pub fn for_year(plan_year: u16) -> Self {
        if let Some(limits) = KNOWN_LIMITS.iter().find(|l| l.plan_year == plan_year) {
            return *limits;
        }
        let first = KNOWN_LIMITS[0];
        let last = KNOWN_LIMITS[KNOWN_LIMITS.len() - 1];
        if plan_year < first.plan_year { first } else { last }
    }

    pub fn hsa_cap(&self, coverage: HsaCoverage) -> f64 {
        match coverage {
            HsaCoverage::Single => self.hsa_single_cap,
            HsaCoverage::Family => self.hsa_family_cap,
        }
    }

    /// Deferral cap as a percent of `salary_annual`, never above 100.
    pub fn deferral_cap_pct(&self, salary_annual: f64) -> f64 {
        if !(salary_annual > 0.0) {
            return 100.0;
        }
        (self.employee_deferral_cap / salary_annual * 100.0).min(100.0)
    }
}

impl Default for ContributionLimits {
    fn default() -> Self {
        Self::for_year(DEFAULT_PLAN_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_2025() {
        let limits = ContributionLimits::default();
        assert_eq!(limits.plan_year, 2025);
        assert_eq!(limits.employee_deferral_cap, 23_500.0);
    }

    #[test]
    fn unknown_years_clamp_to_table_edges() {
        assert_eq!(ContributionLimits::for_year(2019).plan_year, 2024);
        assert_eq!(ContributionLimits::for_year(2031).plan_year, 2026);
    }

    #[test]
    fn deferral_cap_pct_handles_small_and_zero_salary() {
        let limits = ContributionLimits::default();
        assert!((limits.deferral_cap_pct(100_000.0) - 23.5).abs() < 1e-9);
        assert_eq!(limits.deferral_cap_pct(10_000.0), 100.0);
        assert_eq!(limits.deferral_cap_pct(0.0), 100.0);
        assert_eq!(limits.deferral_cap_pct(f64::NAN), 100.0);
    }

    #[test]
    fn hsa_cap_follows_coverage() {
        let limits = ContributionLimits::for_year(2025);
        assert_eq!(limits.hsa_cap(HsaCoverage::Single), 4_300.0);
        assert_eq!(limits.hsa_cap(HsaCoverage::Family), 8_550.0);
    }
}
