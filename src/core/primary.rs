use serde::{Deserialize, Serialize};

use super::RETIREMENT_FLOOR_PCT;
use super::types::{AllocatorUnlockData, Leap, LeapCategory};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryLeapKind {
    Match,
    #[serde(rename = "retirement_15")]
    Retirement15,
    Debt,
    GrowthSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Retirement15 {
    pub current_pct: f64,
    pub target_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryLeapResult {
    pub kind: PrimaryLeapKind,
    pub leap: Option<Leap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retirement15: Option<Retirement15>,
}

#[derive(Debug, Clone)]
pub struct PrimaryLeapInputs<'a> {
    pub employer_match_enabled: bool,
    pub current_401k_pct: f64,
    pub recommended_401k_pct: f64,
    pub unlock: &'a AllocatorUnlockData,
    pub leaps: &'a [Leap],
}

fn find_leap(leaps: &[Leap], category: LeapCategory) -> Option<Leap> {
    leaps.iter().find(|l| l.category() == category).cloned()
}

fn debt_declared(unlock: &AllocatorUnlockData) -> bool {
    unlock.has_positive_debt_balance() && unlock.debt_apr_range.is_some()
}

pub fn select_primary_leap(inputs: &PrimaryLeapInputs<'_>) -> PrimaryLeapResult {
    if inputs.employer_match_enabled && inputs.current_401k_pct < inputs.recommended_401k_pct {
        return PrimaryLeapResult {
            kind: PrimaryLeapKind::Match,
            leap: find_leap(inputs.leaps, LeapCategory::Match),
            retirement15: None,
        };
    }

    if inputs.current_401k_pct < RETIREMENT_FLOOR_PCT {
        return PrimaryLeapResult {
            kind: PrimaryLeapKind::Retirement15,
            leap: None,
            retirement15: Some(Retirement15 {
                current_pct: inputs.current_401k_pct,
                target_pct: RETIREMENT_FLOOR_PCT,
            }),
        };
    }

    if debt_declared(inputs.unlock) {
        return PrimaryLeapResult {
            kind: PrimaryLeapKind::Debt,
            leap: find_leap(inputs.leaps, LeapCategory::Debt),
            retirement15: None,
        };
    }

    PrimaryLeapResult {
        kind: PrimaryLeapKind::GrowthSplit,
        leap: find_leap(inputs.leaps, LeapCategory::RetirementSplit),
        retirement15: None,
    }
}

/// Structural leaps shown under the primary one, minus whatever it already covers.
pub fn get_supporting_leaps(leaps: &[Leap], primary: PrimaryLeapKind) -> Vec<&Leap> {
    let covered = match primary {
        PrimaryLeapKind::Debt => Some(LeapCategory::Debt),
        PrimaryLeapKind::GrowthSplit => Some(LeapCategory::RetirementSplit),
        PrimaryLeapKind::Match | PrimaryLeapKind::Retirement15 => None,
    };
    leaps
        .iter()
        .filter(|leap| {
            matches!(
                leap.category(),
                LeapCategory::EmergencyFund | LeapCategory::Debt | LeapCategory::RetirementSplit
            )
        })
        .filter(|leap| Some(leap.category()) != covered)
        .collect()
}
