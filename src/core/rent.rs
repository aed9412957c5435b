use serde::Serialize;

use super::format::format_range;

pub const RENT_LOW_SHARE: f64 = 0.28;
pub const RENT_HIGH_SHARE: f64 = 0.35;
pub const GAP_LIVING_SHARE: f64 = 0.35;
pub const PAYCHECK_GAP_DAYS: f64 = 14.0;
pub const DAYS_PER_MONTH: f64 = 30.0;
pub const MOVING_SETUP_COST: f64 = 600.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentRange {
    pub low: f64,
    pub high: f64,
    pub formatted: String,
}

impl RentRange {
    pub fn empty() -> Self {
        Self {
            low: 0.0,
            high: 0.0,
            formatted: format_range(0.0, 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.high <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetBreakdown {
    pub needs: f64,
    pub wants: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpfrontCash {
    pub security_deposit_low: f64,
    pub security_deposit_high: f64,
    pub first_month_low: f64,
    pub first_month_high: f64,
    pub gap_living: f64,
    pub moving_setup: f64,
    pub total_low: f64,
    pub total_high: f64,
    pub formatted: String,
}

fn usable_income(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Safe rent band on take-home pay left after minimum debt payments.
pub fn calculate_rent_range(
    take_home_monthly: Option<f64>,
    debt_monthly: Option<f64>,
) -> RentRange {
    let take_home = usable_income(take_home_monthly);
    if take_home <= 0.0 {
        return RentRange::empty();
    }
    let debt = usable_income(debt_monthly);
    let available = (take_home - debt).max(0.0);
    let low = (available * RENT_LOW_SHARE).round();
    let high = (available * RENT_HIGH_SHARE).round();
    RentRange {
        low,
        high,
        formatted: format_range(low, high),
    }
}

/// 50/30/20 split of take-home pay.
pub fn calculate_budget_breakdown(take_home_monthly: Option<f64>) -> BudgetBreakdown {
    let take_home = usable_income(take_home_monthly);
    BudgetBreakdown {
        needs: (take_home * 0.50).round(),
        wants: (take_home * 0.30).round(),
        savings: (take_home * 0.20).round(),
    }
}

fn round_to_hundred(value: f64) -> f64 {
    (value / 100.0).round() * 100.0
}

/// Cash needed before the first paycheck lands for a rent in `range`.
pub fn calculate_upfront_cash(take_home_monthly: Option<f64>, range: &RentRange) -> UpfrontCash {
    let take_home = usable_income(take_home_monthly);
    if take_home <= 0.0 || range.is_empty() {
        return UpfrontCash {
            security_deposit_low: 0.0,
            security_deposit_high: 0.0,
            first_month_low: 0.0,
            first_month_high: 0.0,
            gap_living: 0.0,
            moving_setup: 0.0,
            total_low: 0.0,
            total_high: 0.0,
            formatted: format_range(0.0, 0.0),
        };
    }

    let gap_living = take_home * GAP_LIVING_SHARE * PAYCHECK_GAP_DAYS / DAYS_PER_MONTH;
    let total_low = round_to_hundred(range.low * 2.0 + gap_living + MOVING_SETUP_COST);
    let total_high = round_to_hundred(range.high * 2.0 + gap_living + MOVING_SETUP_COST);
    UpfrontCash {
        security_deposit_low: range.low,
        security_deposit_high: range.high,
        first_month_low: range.low,
        first_month_high: range.high,
        gap_living: gap_living.round(),
        moving_setup: MOVING_SETUP_COST,
        total_low,
        total_high,
        formatted: format_range(total_low, total_high),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    #[test]
    fn range_sits_inside_twenty_eight_to_thirty_five_percent() {
        let range = calculate_rent_range(Some(5_000.0), Some(0.0));
        assert_eq!(range.low, 1_400.0);
        assert_eq!(range.high, 1_750.0);
        assert_eq!(range.formatted, "$1,400 - $1,750");
    }

    #[test]
    fn debt_payments_reduce_both_bounds() {
        let base = calculate_rent_range(Some(5_000.0), None);
        let with_debt = calculate_rent_range(Some(5_000.0), Some(500.0));
        assert!(with_debt.low < base.low);
        assert!(with_debt.high < base.high);
        assert_eq!(with_debt.low, 1_260.0);
        assert_eq!(with_debt.high, 1_575.0);
    }

    #[test]
    fn zero_or_missing_take_home_is_empty() {
        assert_eq!(calculate_rent_range(None, None), RentRange::empty());
        assert_eq!(calculate_rent_range(Some(0.0), Some(200.0)), RentRange::empty());
        assert_eq!(calculate_rent_range(Some(f64::NAN), None), RentRange::empty());
        let cash = calculate_upfront_cash(None, &RentRange::empty());
        assert_eq!(cash.total_high, 0.0);
        let budget = calculate_budget_breakdown(None);
        assert_eq!(budget.needs + budget.wants + budget.savings, 0.0);
    }

    #[test]
    fn debt_above_take_home_floors_at_zero() {
        let range = calculate_rent_range(Some(2_000.0), Some(3_000.0));
        assert_eq!(range.low, 0.0);
        assert_eq!(range.high, 0.0);
    }

    #[test]
    fn budget_is_fifty_thirty_twenty() {
        let budget = calculate_budget_breakdown(Some(4_000.0));
        assert_eq!(budget.needs, 2_000.0);
        assert_eq!(budget.wants, 1_200.0);
        assert_eq!(budget.savings, 800.0);
    }

    #[test]
    fn oracle_upfront_cash_for_five_thousand_take_home() {
        let range = calculate_rent_range(Some(5_000.0), None);
        let cash = calculate_upfront_cash(Some(5_000.0), &range);
        // gap = 5000 * 0.35 * 14 / 30 = 816.67
        // low = 1400*2 + 816.67 + 600 = 4216.67 -> 4200
        // high = 1750*2 + 816.67 + 600 = 4916.67 -> 4900
        assert_eq!(cash.gap_living, 817.0);
        assert_eq!(cash.total_low, 4_200.0);
        assert_eq!(cash.total_high, 4_900.0);
        assert_eq!(cash.formatted, "$4,200 - $4,900");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_more_debt_strictly_lowers_range(
            take_home in 2_000u32..20_000,
            debt in 0u32..1_000,
            extra in 10u32..500
        ) {
            let base = calculate_rent_range(Some(take_home as f64), Some(debt as f64));
            let more = calculate_rent_range(Some(take_home as f64), Some((debt + extra) as f64));
            prop_assert!(more.low < base.low);
            prop_assert!(more.high < base.high);
            prop_assert!(base.low <= base.high);
        }
    }
}
