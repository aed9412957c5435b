use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapStatus {
    Next,
    Queued,
    Complete,
    Locked,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapCategory {
    Match,
    Hsa,
    EmergencyFund,
    Debt,
    RetirementSplit,
    Brokerage,
}

impl LeapCategory {
    pub fn label(self) -> &'static str {
        match self {
            LeapCategory::Match => "Employer match",
            LeapCategory::Hsa => "HSA",
            LeapCategory::EmergencyFund => "Emergency fund",
            LeapCategory::Debt => "High-APR debt",
            LeapCategory::RetirementSplit => "Retirement",
            LeapCategory::Brokerage => "Brokerage",
        }
    }
}

/// Category-specific payload of a [`Leap`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum LeapDetail {
    Match,
    #[serde(rename_all = "camelCase")]
    Hsa {
        hsa_current_annual: Option<f64>,
        hsa_max_annual: f64,
    },
    EmergencyFund,
    #[serde(rename_all = "camelCase")]
    Debt { debt_apr_pct: Option<f64> },
    #[serde(rename_all = "camelCase")]
    RetirementSplit {
        split_retirement_pct: f64,
        split_brokerage_pct: f64,
    },
}

impl LeapDetail {
    pub fn category(&self) -> LeapCategory {
        match self {
            LeapDetail::Match => LeapCategory::Match,
            LeapDetail::Hsa { .. } => LeapCategory::Hsa,
            LeapDetail::EmergencyFund => LeapCategory::EmergencyFund,
            LeapDetail::Debt { .. } => LeapCategory::Debt,
            LeapDetail::RetirementSplit { .. } => LeapCategory::RetirementSplit,
        }
    }

    /// Pre-tax levers run through payroll; everything else is routed from take-home.
    pub fn is_payroll(&self) -> bool {
        matches!(self, LeapDetail::Match | LeapDetail::Hsa { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cta {
    pub label: String,
    pub action: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leap {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub status: LeapStatus,
    pub target_value: f64,
    pub current_value: f64,
    pub delta_value: f64,
    pub timeline_text: String,
    pub impact_text: String,
    pub why_now_text: String,
    pub requires_unlock: bool,
    pub cta: Option<Cta>,
    pub allocation_badge: String,
    pub is_payroll: bool,
    #[serde(flatten)]
    pub detail: LeapDetail,
}

impl Leap {
    pub fn category(&self) -> LeapCategory {
        self.detail.category()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DebtAprRange {
    #[serde(rename = "10-14")]
    From10To14,
    #[serde(rename = "15-19")]
    From15To19,
    #[serde(rename = "20+")]
    Over20,
}

impl DebtAprRange {
    pub fn representative_apr_pct(self) -> f64 {
        match self {
            DebtAprRange::From10To14 => 12.0,
            DebtAprRange::From15To19 => 17.0,
            DebtAprRange::Over20 => 24.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DebtAprRange::From10To14 => "10-14",
            DebtAprRange::From15To19 => "15-19",
            DebtAprRange::Over20 => "20+",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetirementFocus {
    High,
    Medium,
    Low,
}

/// Retirement/brokerage split in percent, keyed by how much the user leans retirement.
pub fn split_for_focus(focus: Option<RetirementFocus>) -> (f64, f64) {
    match focus {
        Some(RetirementFocus::High) => (80.0, 20.0),
        Some(RetirementFocus::Low) => (20.0, 80.0),
        Some(RetirementFocus::Medium) | None => (60.0, 40.0),
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HsaCoverage {
    Single,
    Family,
}

/// Answers collected progressively from the user. `None` means not yet answered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocatorUnlockData {
    pub essential_monthly: Option<f64>,
    pub carries_balance: Option<bool>,
    pub debt_apr_range: Option<DebtAprRange>,
    pub debt_balance: Option<f64>,
    pub retirement_focus: Option<RetirementFocus>,
    pub hsa_eligible: Option<bool>,
    pub current_hsa_annual: Option<f64>,
    pub hsa_coverage_type: Option<HsaCoverage>,
}

impl AllocatorUnlockData {
    pub fn known_essential_monthly(&self) -> Option<f64> {
        self.essential_monthly.filter(|v| v.is_finite() && *v > 0.0)
    }

    pub fn has_positive_debt_balance(&self) -> bool {
        self.carries_balance == Some(true) && self.debt_balance.is_some_and(|b| b > 0.0)
    }

    /// APR used for routing; a balance with no answered range assumes the middle bucket.
    pub fn effective_debt_apr_pct(&self) -> f64 {
        self.debt_apr_range
            .map(DebtAprRange::representative_apr_pct)
            .unwrap_or(super::DEFAULT_DEBT_APR_PCT)
    }

    pub fn high_apr_debt_active(&self) -> bool {
        self.has_positive_debt_balance()
            && self.effective_debt_apr_pct() >= super::HIGH_APR_THRESHOLD_PCT
    }
}
