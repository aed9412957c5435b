use serde::Serialize;

use crate::api::{PlanRequest, PlanResponse, build_plan};
use crate::config::PlanArgs;
use crate::core::{
    AllocatorUnlockData, ContributionLimits, DEFAULT_DELAY_MONTHS, InputError, LeapPrefill,
    TrajectoryInputs, TrajectoryResult, cost_of_delay, get_recommended_leap_with_limits,
    normalize_state, run_trajectory,
};
use crate::notify::PlanSnapshot;
use crate::tax::TaxEstimator;

/// Everything `leapwise plan` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub rent: PlanSnapshot,
    pub trajectory: TrajectoryResult,
    pub cost_of_delay: i64,
    pub plan: PlanResponse,
}

#[derive(Debug, Clone, PartialEq)]
struct ValidatedArgs {
    salary: f64,
    state: String,
    current_pct: f64,
    match_pct: f64,
    has_match: bool,
}

fn validate_args(args: &PlanArgs) -> Result<ValidatedArgs, InputError> {
    if !args.salary.is_finite() {
        return Err(InputError::InvalidNumber {
            field: "--salary",
            value: args.salary.to_string(),
        });
    }
    if args.salary <= 0.0 {
        return Err(InputError::NotPositive("--salary"));
    }

    let state =
        normalize_state(&args.state).ok_or_else(|| InputError::UnknownState(args.state.clone()))?;

    if !(0.0..=100.0).contains(&args.current_pct) {
        return Err(InputError::OutOfRange {
            field: "--current-pct",
            min: 0.0,
            max: 100.0,
        });
    }
    let match_pct = args.match_pct.unwrap_or(0.0);
    if !(0.0..=100.0).contains(&match_pct) {
        return Err(InputError::OutOfRange {
            field: "--match-pct",
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(ValidatedArgs {
        salary: args.salary,
        state,
        current_pct: args.current_pct,
        match_pct,
        has_match: match_pct > 0.0,
    })
}

pub async fn build_report(
    args: &PlanArgs,
    tax: &dyn TaxEstimator,
    limits: &ContributionLimits,
) -> Result<PlanReport, InputError> {
    let valid = validate_args(args)?;

    let breakdown = tax.estimate(valid.salary, &valid.state).await;
    let rent = PlanSnapshot::from_tax(breakdown, args.debt_monthly);

    let recommendation = get_recommended_leap_with_limits(
        valid.has_match,
        valid.match_pct,
        valid.current_pct,
        valid.salary,
        limits,
    );
    let inputs = TrajectoryInputs::new(
        valid.salary,
        valid.current_pct,
        recommendation.target_pct.max(valid.current_pct),
        valid.match_pct,
        valid.has_match,
    );

    let request = PlanRequest {
        prefill: LeapPrefill {
            salary_annual: valid.salary,
            employer_match_enabled: valid.has_match,
            current_401k_pct: valid.current_pct,
            recommended_401k_pct: if valid.has_match {
                valid.match_pct
            } else {
                valid.current_pct
            },
            ef_current: 0.0,
            post_tax_savings_monthly: args.savings_monthly,
            plan_year: Some(limits.plan_year),
        },
        match_pct: valid.match_pct,
        unlock: AllocatorUnlockData {
            essential_monthly: args.essential_monthly,
            ..Default::default()
        },
    };

    Ok(PlanReport {
        rent,
        trajectory: run_trajectory(&inputs),
        cost_of_delay: cost_of_delay(&inputs, DEFAULT_DELAY_MONTHS),
        plan: build_plan(&request, limits),
    })
}
