use serde::Serialize;

use super::format::{format_currency, format_pct};
use super::limits::ContributionLimits;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedLeapType {
    CaptureMatch,
    AtCap,
    IncreaseContribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedLeap {
    #[serde(rename = "type")]
    pub leap_type: RecommendedLeapType,
    pub current_pct: f64,
    pub target_pct: f64,
    pub annual_increase: f64,
    pub headline: String,
}

pub fn get_recommended_leap(
    has_match: bool,
    match_cap_pct: f64,
    current_401k_pct: f64,
    salary_annual: f64,
) -> RecommendedLeap {
    get_recommended_leap_with_limits(
        has_match,
        match_cap_pct,
        current_401k_pct,
        salary_annual,
        &ContributionLimits::default(),
    )
}

/// Picks the single next 401(k) move: capture the match, stop at the deferral cap,
/// or raise toward the larger of the match cap and the cap-equivalent percent.
pub fn get_recommended_leap_with_limits(
    has_match: bool,
    match_cap_pct: f64,
    current_401k_pct: f64,
    salary_annual: f64,
    limits: &ContributionLimits,
) -> RecommendedLeap {
    let salary = if salary_annual.is_finite() { salary_annual.max(0.0) } else { 0.0 };
    let current = if current_401k_pct.is_finite() { current_401k_pct.max(0.0) } else { 0.0 };
    let match_cap = if match_cap_pct.is_finite() { match_cap_pct.max(0.0) } else { 0.0 };

    if has_match && current < match_cap {
        let annual_increase = salary * (match_cap - current) / 100.0;
        return RecommendedLeap {
            leap_type: RecommendedLeapType::CaptureMatch,
            current_pct: current,
            target_pct: match_cap,
            annual_increase,
            headline: format!(
                "Raise your 401(k) from {} to {} to capture the full employer match",
                format_pct(current),
                format_pct(match_cap)
            ),
        };
    }

    if salary * current / 100.0 >= limits.employee_deferral_cap {
        return RecommendedLeap {
            leap_type: RecommendedLeapType::AtCap,
            current_pct: current,
            target_pct: current,
            annual_increase: 0.0,
            headline: format!(
                "You're at the {} limit of {}",
                limits.plan_year,
                format_currency(limits.employee_deferral_cap)
            ),
        };
    }

    let target = match_cap.max(limits.deferral_cap_pct(salary));
    let annual_increase = (salary * (target - current) / 100.0).max(0.0);
    RecommendedLeap {
        leap_type: RecommendedLeapType::IncreaseContribution,
        current_pct: current,
        target_pct: target,
        annual_increase,
        headline: format!(
            "Move your 401(k) from {} toward {}",
            format_pct(current),
            format_pct(target)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    #[test]
    fn below_match_captures_match() {
        let leap = get_recommended_leap(true, 5.0, 3.0, 80_000.0);
        assert_eq!(leap.leap_type, RecommendedLeapType::CaptureMatch);
        assert_eq!(leap.target_pct, 5.0);
        assert!((leap.annual_increase - 1_600.0).abs() < 1e-9);
    }

    #[test]
    fn past_match_moves_toward_deferral_cap() {
        let leap = get_recommended_leap(true, 5.0, 15.0, 100_000.0);
        assert_ne!(leap.leap_type, RecommendedLeapType::CaptureMatch);
        assert_eq!(leap.leap_type, RecommendedLeapType::IncreaseContribution);
        assert!((leap.target_pct - 23.5).abs() < 1e-9);
        assert!((leap.annual_increase - 8_500.0).abs() < 1e-6);
    }

    #[test]
    fn contribution_over_cap_is_at_cap() {
        let leap = get_recommended_leap(true, 5.0, 15.0, 200_000.0);
        assert_eq!(leap.leap_type, RecommendedLeapType::AtCap);
        assert_eq!(leap.annual_increase, 0.0);
        assert_eq!(leap.headline, "You're at the 2025 limit of $23,500");
    }

    #[test]
    fn without_match_low_contribution_still_increases() {
        let leap = get_recommended_leap(false, 6.0, 2.0, 60_000.0);
        assert_eq!(leap.leap_type, RecommendedLeapType::IncreaseContribution);
        assert!(leap.target_pct > 6.0);
    }

    #[test]
    fn plan_year_changes_cap() {
        let limits = ContributionLimits::for_year(2024);
        let leap = get_recommended_leap_with_limits(false, 0.0, 23.2, 100_000.0, &limits);
        assert_eq!(leap.leap_type, RecommendedLeapType::AtCap);
        let leap = get_recommended_leap(false, 0.0, 23.2, 100_000.0);
        assert_eq!(leap.leap_type, RecommendedLeapType::IncreaseContribution);
    }

    #[test]
    fn zero_salary_is_total() {
        let leap = get_recommended_leap(false, 0.0, 0.0, 0.0);
        assert_eq!(leap.leap_type, RecommendedLeapType::IncreaseContribution);
        assert_eq!(leap.target_pct, 100.0);
        assert_eq!(leap.annual_increase, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_target_never_below_current_and_match_wins_first(
            has_match in proptest::bool::ANY,
            match_cap in 0u32..12,
            current in 0u32..40,
            salary in 0u32..500_000
        ) {
            let leap =
                get_recommended_leap(has_match, match_cap as f64, current as f64, salary as f64);
            prop_assert!(leap.target_pct >= leap.current_pct);
            prop_assert!(leap.annual_increase >= 0.0);
            let expect_match = has_match && current < match_cap;
            prop_assert!((leap.leap_type == RecommendedLeapType::CaptureMatch) == expect_match);
        }
    }
}
