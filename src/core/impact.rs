use serde::{Deserialize, Serialize};

use super::format::format_currency;
use super::trajectory::annuity_future_value;
use super::{DEFAULT_DEBT_APR_PCT, DEFAULT_REAL_RETURN};

pub const IMPACT_HORIZONS: [u32; 3] = [1, 10, 30];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactUseCase {
    Investing,
    Cash,
    #[serde(alias = "debt")]
    DebtPayoff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactProjection {
    pub horizon_years: u32,
    pub net_worth_change: f64,
    pub interest_avoided: Option<f64>,
    pub sentence: String,
}

/// Net-worth change after `horizon_years` of a recurring `monthly_delta`.
///
/// Debt payoff treats every extra payment as earning the debt's APR, compounded
/// monthly; the part above the raw payments is the interest avoided.
pub fn net_worth_impact(
    monthly_delta: f64,
    use_case: ImpactUseCase,
    horizon_years: u32,
    debt_apr_pct: Option<f64>,
) -> f64 {
    if !monthly_delta.is_finite() {
        return 0.0;
    }
    let months = horizon_years * 12;
    let raw = match use_case {
        ImpactUseCase::Investing => {
            annuity_future_value(monthly_delta, DEFAULT_REAL_RETURN / 12.0, months)
        }
        ImpactUseCase::Cash => monthly_delta * 12.0 * horizon_years as f64,
        ImpactUseCase::DebtPayoff => {
            let apr = debt_apr_pct.unwrap_or(DEFAULT_DEBT_APR_PCT).max(0.0) / 100.0;
            annuity_future_value(monthly_delta, apr / 12.0, months)
        }
    };
    raw.round()
}

pub fn net_worth_impact_table(
    monthly_delta: f64,
    use_case: ImpactUseCase,
    debt_apr_pct: Option<f64>,
) -> Vec<ImpactProjection> {
    IMPACT_HORIZONS
        .iter()
        .map(|&years| {
            let change = net_worth_impact(monthly_delta, use_case, years, debt_apr_pct);
            let interest_avoided = match use_case {
                ImpactUseCase::DebtPayoff => {
                    let paid = (monthly_delta * 12.0 * years as f64).round();
                    Some(change - paid)
                }
                _ => None,
            };
            let sentence = impact_sentence(use_case, years, interest_avoided.unwrap_or(change));
            ImpactProjection {
                horizon_years: years,
                net_worth_change: change,
                interest_avoided,
                sentence,
            }
        })
        .collect()
}

/// Sentence fragment describing `amount` over `years`, phrased by sign.
pub fn impact_sentence(use_case: ImpactUseCase, years: u32, amount: f64) -> String {
    let span = if years == 1 {
        "1 year".to_string()
    } else {
        format!("{years} years")
    };
    let magnitude = format_currency(amount.abs());
    let gaining = amount >= 0.0;
    match (use_case, gaining) {
        (ImpactUseCase::Investing, true) => {
            format!("could grow your net worth by about {magnitude} in {span}")
        }
        (ImpactUseCase::Investing, false) => {
            format!("could cost you about {magnitude} in net worth over {span}")
        }
        (ImpactUseCase::Cash, true) => format!("adds {magnitude} to your savings over {span}"),
        (ImpactUseCase::Cash, false) => format!("means {magnitude} less in savings over {span}"),
        (ImpactUseCase::DebtPayoff, true) => {
            format!("saves about {magnitude} in interest over {span}")
        }
        (ImpactUseCase::DebtPayoff, false) => {
            format!("adds about {magnitude} in interest costs over {span}")
        }
    }
}
