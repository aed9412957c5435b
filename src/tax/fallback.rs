use super::{TaxBreakdown, TaxSource, state_rate};

/// 2025 single-filer federal brackets: (upper bound of taxable income, rate).
const FEDERAL_BRACKETS: [(f64, f64); 7] = [
    (11_925.0, 0.10),
    (48_475.0, 0.12),
    (103_350.0, 0.22),
    (197_300.0, 0.24),
    (250_525.0, 0.32),
    (626_350.0, 0.35),
    (f64::INFINITY, 0.37),
];
const STANDARD_DEDUCTION: f64 = 15_000.0;

const SOCIAL_SECURITY_RATE: f64 = 0.062;
const SOCIAL_SECURITY_WAGE_BASE: f64 = 176_100.0;
const MEDICARE_RATE: f64 = 0.0145;
const ADDITIONAL_MEDICARE_RATE: f64 = 0.009;
const ADDITIONAL_MEDICARE_THRESHOLD: f64 = 200_000.0;

const SOLVE_ITERATIONS: u32 = 50;
const SOLVE_TOLERANCE: f64 = 1.0;

fn federal_income_tax(gross: f64) -> f64 {
    let taxable = (gross - STANDARD_DEDUCTION).max(0.0);
    let mut tax = 0.0;
    let mut lower = 0.0;
    for (upper, rate) in FEDERAL_BRACKETS {
        if taxable <= lower {
            break;
        }
        tax += (taxable.min(upper) - lower) * rate;
        lower = upper;
    }
    tax
}

fn fica_tax(gross: f64) -> f64 {
    let social_security = gross.min(SOCIAL_SECURITY_WAGE_BASE) * SOCIAL_SECURITY_RATE;
    let medicare = gross * MEDICARE_RATE
        + (gross - ADDITIONAL_MEDICARE_THRESHOLD).max(0.0) * ADDITIONAL_MEDICARE_RATE;
    social_security + medicare
}

/// Bracket-based estimate used whenever the live tax API is unavailable.
pub fn estimate_fallback(gross_annual: f64, state: &str) -> TaxBreakdown {
    let gross = if gross_annual.is_finite() { gross_annual.max(0.0) } else { 0.0 };
    let federal = federal_income_tax(gross).round();
    let state_tax = ((gross - STANDARD_DEDUCTION).max(0.0) * state_rate(state)).round();
    let fica = fica_tax(gross).round();
    TaxBreakdown::from_parts(gross, federal, state_tax, fica, TaxSource::Fallback)
}

/// Gross salary whose fallback net pay is `desired_net_annual`, by bisection.
pub fn solve_gross_for_net(desired_net_annual: f64, state: &str) -> f64 {
    if !(desired_net_annual > 0.0) {
        return 0.0;
    }
    let mut low = desired_net_annual;
    let mut high = desired_net_annual * 3.0;
    for _ in 0..SOLVE_ITERATIONS {
        let mid = (low + high) / 2.0;
        let net = estimate_fallback(mid, state).net_income_annual;
        if (net - desired_net_annual).abs() <= SOLVE_TOLERANCE {
            return mid.round();
        }
        if net < desired_net_annual {
            low = mid;
        } else {
            high = mid;
        }
    }
    ((low + high) / 2.0).round()
}
