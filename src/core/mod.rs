mod decision;
mod error;
pub mod format;
mod impact;
mod leaps;
mod limits;
mod prefill;
mod primary;
mod rent;
mod routing;
mod states;
mod trajectory;
mod types;

/// Real (after-inflation) annual return used by every projection.
pub const DEFAULT_REAL_RETURN: f64 = 0.07;
/// APR assumed for a declared balance whose range was never answered.
pub const DEFAULT_DEBT_APR_PCT: f64 = 17.0;
pub const HIGH_APR_THRESHOLD_PCT: f64 = 10.0;
/// Share each waterfall step takes from what is still unallocated.
pub const ROUTING_SHARE: f64 = 0.4;
pub const EF_TARGET_MONTHS: f64 = 3.0;
pub const RETIREMENT_FLOOR_PCT: f64 = 15.0;

pub use decision::{
    RecommendedLeap, RecommendedLeapType, get_recommended_leap, get_recommended_leap_with_limits,
};
pub use error::InputError;
pub use impact::{
    IMPACT_HORIZONS, ImpactProjection, ImpactUseCase, impact_sentence, net_worth_impact,
    net_worth_impact_table,
};
pub use leaps::{LeapPrefill, LeapStack, build_leaps};
pub use limits::{ContributionLimits, DEFAULT_PLAN_YEAR};
pub use prefill::{Intent, Prefill, PrefillQuery};
pub use primary::{
    PrimaryLeapInputs, PrimaryLeapKind, PrimaryLeapResult, Retirement15, get_supporting_leaps,
    select_primary_leap,
};
pub use rent::{
    BudgetBreakdown, RentRange, UpfrontCash, calculate_budget_breakdown, calculate_rent_range,
    calculate_upfront_cash,
};
pub use routing::{CapitalRoutingResult, RoutingInputs, compute_capital_routing};
pub use states::{STATE_CODES, normalize_state};
pub use trajectory::{
    DEFAULT_DELAY_MONTHS, DEFAULT_TRAJECTORY_YEARS, TrajectoryInputs, TrajectoryResult,
    annuity_future_value, cost_of_delay, run_trajectory,
};
pub use types::{
    AllocatorUnlockData, Cta, DebtAprRange, HsaCoverage, Leap, LeapCategory, LeapDetail,
    LeapStatus, RetirementFocus, split_for_focus,
};
