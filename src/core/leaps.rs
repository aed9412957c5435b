use serde::{Deserialize, Serialize};

use super::format::{format_currency, format_monthly, format_pct};
use super::limits::{ContributionLimits, DEFAULT_PLAN_YEAR};
use super::routing::{
    CapitalRoutingResult, RoutingInputs, compute_capital_routing, ef_step_active,
};
use super::types::{
    AllocatorUnlockData, Cta, HsaCoverage, Leap, LeapDetail, LeapStatus, split_for_focus,
};
use super::{EF_TARGET_MONTHS, ROUTING_SHARE};

pub const MATCH_LEAP_ID: &str = "match";
pub const HSA_LEAP_ID: &str = "hsa";
pub const EF_LEAP_ID: &str = "emergency_fund";
pub const DEBT_LEAP_ID: &str = "debt";
pub const SPLIT_LEAP_ID: &str = "retirement_split";

const INACTIVE_BADGE: &str = "0% (inactive)";

/// Figures carried over from earlier pages (salary, match, current contribution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeapPrefill {
    pub salary_annual: f64,
    pub employer_match_enabled: bool,
    pub current_401k_pct: f64,
    pub recommended_401k_pct: f64,
    #[serde(default)]
    pub ef_current: f64,
    #[serde(default)]
    pub post_tax_savings_monthly: Option<f64>,
    #[serde(default)]
    pub plan_year: Option<u16>,
}

impl LeapPrefill {
    pub fn match_captured(&self) -> bool {
        !self.employer_match_enabled || self.current_401k_pct >= self.recommended_401k_pct
    }

    fn limits(&self) -> ContributionLimits {
        ContributionLimits::for_year(self.plan_year.unwrap_or(DEFAULT_PLAN_YEAR))
    }

    fn known_savings(&self) -> Option<f64> {
        self.post_tax_savings_monthly
            .filter(|v| v.is_finite() && *v > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeapStack {
    pub leaps: Vec<Leap>,
    pub next_leap_id: Option<String>,
    pub flow_summary: String,
    pub flow_summary_with_dollars: Option<String>,
    pub match_captured: bool,
    pub routing: Option<CapitalRoutingResult>,
}

fn cta(label: &str, action: &str) -> Option<Cta> {
    Some(Cta {
        label: label.to_string(),
        action: action.to_string(),
    })
}

fn base_leap(id: &str, detail: LeapDetail) -> Leap {
    let is_payroll = detail.is_payroll();
    Leap {
        id: id.to_string(),
        title: String::new(),
        subtitle: String::new(),
        status: LeapStatus::Queued,
        target_value: 0.0,
        current_value: 0.0,
        delta_value: 0.0,
        timeline_text: String::new(),
        impact_text: String::new(),
        why_now_text: String::new(),
        requires_unlock: false,
        cta: None,
        allocation_badge: INACTIVE_BADGE.to_string(),
        is_payroll,
        detail,
    }
}

fn match_leap(prefill: &LeapPrefill) -> Leap {
    let mut leap = base_leap(MATCH_LEAP_ID, LeapDetail::Match);
    let current = prefill.current_401k_pct.max(0.0);
    let recommended = prefill.recommended_401k_pct.max(0.0);
    leap.current_value = current;
    leap.target_value = recommended;
    leap.allocation_badge = format!("{} of pay", format_pct(recommended));

    if !prefill.employer_match_enabled {
        leap.title = "No employer match to capture".to_string();
        leap.subtitle =
            "Your plan doesn't offer a match, so nothing is left on the table.".to_string();
        leap.status = LeapStatus::Complete;
        leap.target_value = current;
        leap.allocation_badge = "Payroll".to_string();
        return leap;
    }

    if prefill.match_captured() {
        leap.title = "Employer match captured".to_string();
        leap.subtitle = format!(
            "You contribute {} and receive the full match.",
            format_pct(current)
        );
        leap.status = LeapStatus::Complete;
        return leap;
    }

    let delta = recommended - current;
    // Below the cap every extra employee dollar is matched one-for-one.
    let free_money = prefill.salary_annual.max(0.0) * delta / 100.0;
    leap.title = "Capture your full employer match".to_string();
    leap.subtitle = format!(
        "Raise your 401(k) from {} to {}.",
        format_pct(current),
        format_pct(recommended)
    );
    leap.status = LeapStatus::Next;
    leap.delta_value = delta;
    leap.timeline_text = "Takes effect next paycheck".to_string();
    leap.impact_text = format!("{}/yr in employer money", format_currency(free_money));
    leap.why_now_text = "Unclaimed match is gone for good once the year ends.".to_string();
    leap.cta = cta("Update my contribution", "update_401k");
    leap
}

fn hsa_leap(unlock: &AllocatorUnlockData, limits: &ContributionLimits) -> Option<Leap> {
    if unlock.hsa_eligible != Some(true) {
        return None;
    }
    let coverage = unlock.hsa_coverage_type.unwrap_or(HsaCoverage::Single);
    let max_annual = limits.hsa_cap(coverage);
    let current = unlock.current_hsa_annual.filter(|v| v.is_finite() && *v >= 0.0);

    let mut leap = base_leap(
        HSA_LEAP_ID,
        LeapDetail::Hsa {
            hsa_current_annual: current,
            hsa_max_annual: max_annual,
        },
    );
    leap.target_value = max_annual;
    leap.current_value = current.unwrap_or(0.0);
    leap.delta_value = (max_annual - leap.current_value).max(0.0);
    leap.requires_unlock = current.is_none() || unlock.hsa_coverage_type.is_none();
    leap.allocation_badge = format!("{}/yr", format_currency(max_annual));

    // Without a coverage type the single cap is only a placeholder, never a finish line.
    let maxed = unlock.hsa_coverage_type.is_some() && current.is_some_and(|c| c >= max_annual);
    if maxed {
        leap.title = "HSA maxed".to_string();
        leap.subtitle = format!("You're at the {} limit.", limits.plan_year);
        leap.status = LeapStatus::Complete;
        return Some(leap);
    }

    leap.title = "Max out your HSA".to_string();
    leap.subtitle = format!(
        "Contribute up to {} a year, pre-tax.",
        format_currency(max_annual)
    );
    leap.why_now_text = "HSA dollars skip income and payroll tax on the way in.".to_string();
    if leap.requires_unlock {
        leap.cta = cta("Add HSA details", "unlock_hsa");
    } else {
        leap.impact_text = format!("{}/yr more pre-tax", format_currency(leap.delta_value));
    }
    Some(leap)
}

fn emergency_fund_leap(prefill: &LeapPrefill, unlock: &AllocatorUnlockData) -> Leap {
    let mut leap = base_leap(EF_LEAP_ID, LeapDetail::EmergencyFund);
    leap.title = "Build your emergency fund".to_string();
    leap.subtitle =
        "First milestone: one month of essentials, then extend to 3-6 months.".to_string();
    leap.why_now_text = "A cash cushion keeps surprises off your credit card.".to_string();
    leap.current_value = prefill.ef_current.max(0.0);

    let Some(essential) = unlock.known_essential_monthly() else {
        leap.requires_unlock = true;
        leap.timeline_text = "Add your essential spending to size this".to_string();
        leap.cta = cta("Add essential spending", "unlock_essentials");
        return leap;
    };

    let full_target = essential * EF_TARGET_MONTHS;
    if leap.current_value >= full_target {
        leap.title = "Emergency fund funded".to_string();
        leap.subtitle = format!("{} months of essentials set aside.", EF_TARGET_MONTHS);
        leap.status = LeapStatus::Complete;
        leap.target_value = full_target;
        leap.impact_text = format!("{} target", format_currency(full_target));
        return leap;
    }

    // Once the first month is covered, aim at the full cushion.
    let target = if leap.current_value >= essential {
        leap.subtitle = format!(
            "First milestone reached. Extend to {} months of essentials.",
            EF_TARGET_MONTHS
        );
        full_target
    } else {
        essential
    };
    leap.target_value = target;
    leap.delta_value = target - leap.current_value;
    leap.allocation_badge = format_pct(ROUTING_SHARE * 100.0);
    if prefill.match_captured() {
        leap.status = LeapStatus::Next;
    }
    leap.timeline_text = match prefill.known_savings() {
        Some(savings) => {
            let monthly = savings * ROUTING_SHARE;
            let months = (leap.delta_value / monthly).ceil() as u32;
            format!("About {months} months at {} a month", format_currency(monthly))
        }
        None => "Set your monthly savings to estimate timing".to_string(),
    };
    leap.impact_text = format!("{} target", format_currency(target));
    leap
}

fn debt_leap(unlock: &AllocatorUnlockData) -> Leap {
    let apr = unlock
        .has_positive_debt_balance()
        .then(|| unlock.effective_debt_apr_pct());
    let mut leap = base_leap(DEBT_LEAP_ID, LeapDetail::Debt { debt_apr_pct: apr });

    match unlock.carries_balance {
        None => {
            leap.title = "Check for high-APR debt".to_string();
            leap.subtitle = "Tell us whether you carry a credit card or loan balance.".to_string();
            leap.requires_unlock = true;
            leap.cta = cta("Answer debt questions", "unlock_debt");
        }
        Some(false) => {
            leap.title = "No high-APR debt".to_string();
            leap.subtitle = "Nothing to pay down here.".to_string();
            leap.status = LeapStatus::Complete;
        }
        Some(true) => match unlock.debt_balance {
            None => {
                leap.title = "Pay down high-APR debt".to_string();
                leap.subtitle = "Add your balance to size the payoff.".to_string();
                leap.requires_unlock = true;
                leap.cta = cta("Add debt balance", "unlock_debt");
            }
            Some(balance) if balance <= 0.0 => {
                leap.title = "No high-APR debt".to_string();
                leap.subtitle = "Your balance is already paid off.".to_string();
                leap.status = LeapStatus::Complete;
            }
            Some(balance) => {
                let apr_pct = unlock.effective_debt_apr_pct();
                leap.title = "Pay down high-APR debt".to_string();
                leap.subtitle = format!(
                    "{} at about {} APR",
                    format_currency(balance),
                    format_pct(apr_pct)
                );
                leap.target_value = balance;
                leap.delta_value = balance;
                leap.why_now_text = format!(
                    "Every dollar here earns a guaranteed {}.",
                    format_pct(apr_pct)
                );
                if unlock.high_apr_debt_active() {
                    leap.allocation_badge =
                        format!("{} of remaining", format_pct(ROUTING_SHARE * 100.0));
                }
            }
        },
    }
    leap
}

fn split_leap(unlock: &AllocatorUnlockData) -> Leap {
    let (retirement_pct, brokerage_pct) = split_for_focus(unlock.retirement_focus);
    let mut leap = base_leap(
        SPLIT_LEAP_ID,
        LeapDetail::RetirementSplit {
            split_retirement_pct: retirement_pct,
            split_brokerage_pct: brokerage_pct,
        },
    );
    leap.title = "Split the rest between retirement and brokerage".to_string();
    leap.subtitle = format!(
        "{} to retirement accounts, {} to a brokerage account.",
        format_pct(retirement_pct),
        format_pct(brokerage_pct)
    );
    leap.allocation_badge = format!(
        "{} / {}",
        format_pct(retirement_pct),
        format_pct(brokerage_pct)
    );
    leap.why_now_text = "Time in the market does the heavy lifting.".to_string();
    if unlock.retirement_focus.is_none() {
        leap.requires_unlock = true;
        leap.cta = cta("Set retirement focus", "unlock_focus");
    }
    leap
}

fn flow_summary(prefill: &LeapPrefill, unlock: &AllocatorUnlockData) -> String {
    let share = format_pct(ROUTING_SHARE * 100.0);
    let (retirement_pct, brokerage_pct) = split_for_focus(unlock.retirement_focus);
    let mut steps = Vec::new();
    if ef_step_active(unlock, prefill.ef_current) {
        steps.push(format!("Emergency fund {share}"));
    }
    if unlock.high_apr_debt_active() {
        steps.push(format!("Debt {share} of remainder"));
    }
    let split_label = if steps.is_empty() { "Split" } else { "Split remainder" };
    steps.push(format!(
        "{split_label} {} retirement / {} brokerage",
        format_pct(retirement_pct),
        format_pct(brokerage_pct)
    ));
    steps.join(" → ")
}

fn flow_summary_with_dollars(routing: &CapitalRoutingResult) -> String {
    let mut steps = Vec::new();
    if routing.ef_alloc > 0.0 {
        steps.push(format!("{} emergency fund", format_monthly(routing.ef_alloc)));
    }
    if routing.debt_alloc > 0.0 {
        steps.push(format!("{} debt", format_monthly(routing.debt_alloc)));
    }
    steps.push(format!(
        "{} retirement / {} brokerage",
        format_monthly(routing.retirement_alloc),
        format_monthly(routing.brokerage_alloc)
    ));
    steps.join(" → ")
}

/// Ranked plan in fixed priority order. Brokerage is folded into the split leap.
pub fn build_leaps(prefill: &LeapPrefill, unlock: &AllocatorUnlockData) -> LeapStack {
    let limits = prefill.limits();
    let mut leaps = vec![match_leap(prefill)];
    leaps.extend(hsa_leap(unlock, &limits));
    leaps.push(emergency_fund_leap(prefill, unlock));
    leaps.push(debt_leap(unlock));
    leaps.push(split_leap(unlock));

    let next_leap_id = leaps
        .iter()
        .find(|leap| leap.status == LeapStatus::Next)
        .map(|leap| leap.id.clone());

    let routing = prefill.known_savings().map(|savings| {
        compute_capital_routing(&RoutingInputs {
            post_tax_savings_monthly: savings,
            ef_current: prefill.ef_current,
            unlock: Some(unlock),
        })
    });

    LeapStack {
        next_leap_id,
        flow_summary: flow_summary(prefill, unlock),
        flow_summary_with_dollars: routing.as_ref().map(flow_summary_with_dollars),
        match_captured: prefill.match_captured(),
        routing,
        leaps,
    }
}
