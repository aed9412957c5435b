use serde::Serialize;

use super::types::{AllocatorUnlockData, LeapCategory, split_for_focus};
use super::{EF_TARGET_MONTHS, ROUTING_SHARE};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalRoutingResult {
    pub post_tax_savings_monthly: f64,
    pub ef_alloc: f64,
    pub debt_alloc: f64,
    pub retirement_alloc: f64,
    pub brokerage_alloc: f64,
    pub ef_target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_to_ef_target: Option<u32>,
}

impl CapitalRoutingResult {
    pub fn total_allocated(&self) -> f64 {
        self.ef_alloc + self.debt_alloc + self.retirement_alloc + self.brokerage_alloc
    }

    /// Non-zero destinations in waterfall order.
    pub fn lines(&self) -> Vec<(LeapCategory, f64)> {
        [
            (LeapCategory::EmergencyFund, self.ef_alloc),
            (LeapCategory::Debt, self.debt_alloc),
            (LeapCategory::RetirementSplit, self.retirement_alloc),
            (LeapCategory::Brokerage, self.brokerage_alloc),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .collect()
    }
}

/// Money left to route. Each step moves part of it into an allocation, so the
/// allocations always add back up to the starting amount.
#[derive(Debug)]
struct Waterfall {
    remaining: f64,
}

impl Waterfall {
    fn new(total: f64) -> Self {
        Self { remaining: total }
    }

    fn take_share(&mut self, share: f64, active: bool) -> f64 {
        if !active {
            return 0.0;
        }
        let allocated = self.remaining * share;
        self.remaining -= allocated;
        allocated
    }

    /// Splits what is left, returning `(first, rest)`, and drains the waterfall.
    fn split_rest(&mut self, first_pct: f64) -> (f64, f64) {
        let first = self.remaining * first_pct / 100.0;
        let rest = self.remaining - first;
        self.remaining = 0.0;
        (first, rest)
    }
}

/// Whether the emergency-fund step takes its share: essentials are known and the
/// fund is still short of its target.
pub fn ef_step_active(unlock: &AllocatorUnlockData, ef_current: f64) -> bool {
    unlock
        .known_essential_monthly()
        .is_some_and(|essential| ef_current < essential * EF_TARGET_MONTHS)
}

#[derive(Debug, Clone, Default)]
pub struct RoutingInputs<'a> {
    pub post_tax_savings_monthly: f64,
    pub ef_current: f64,
    pub unlock: Option<&'a AllocatorUnlockData>,
}

pub fn compute_capital_routing(inputs: &RoutingInputs<'_>) -> CapitalRoutingResult {
    let default_unlock = AllocatorUnlockData::default();
    let unlock = inputs.unlock.unwrap_or(&default_unlock);
    let total = if inputs.post_tax_savings_monthly.is_finite() {
        inputs.post_tax_savings_monthly.max(0.0)
    } else {
        0.0
    };
    let ef_current = if inputs.ef_current.is_finite() {
        inputs.ef_current.max(0.0)
    } else {
        0.0
    };

    let essential = unlock.known_essential_monthly();
    let ef_target = essential.map(|e| e * EF_TARGET_MONTHS).unwrap_or(0.0);

    let mut waterfall = Waterfall::new(total);
    let ef_alloc = waterfall.take_share(ROUTING_SHARE, ef_step_active(unlock, ef_current));
    let debt_alloc = waterfall.take_share(ROUTING_SHARE, unlock.high_apr_debt_active());
    let (retirement_pct, _) = split_for_focus(unlock.retirement_focus);
    let (retirement_alloc, brokerage_alloc) = waterfall.split_rest(retirement_pct);

    let months_to_ef_target = if ef_alloc > 0.0 {
        Some(((ef_target - ef_current) / ef_alloc).ceil() as u32)
    } else {
        None
    };

    CapitalRoutingResult {
        post_tax_savings_monthly: total,
        ef_alloc,
        debt_alloc,
        retirement_alloc,
        brokerage_alloc,
        ef_target,
        months_to_ef_target,
    }
}
