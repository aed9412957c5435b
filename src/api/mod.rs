use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::core::{
    AllocatorUnlockData, BudgetBreakdown, ContributionLimits, DEFAULT_DELAY_MONTHS,
    DEFAULT_REAL_RETURN, DEFAULT_TRAJECTORY_YEARS, DebtAprRange, ImpactProjection, ImpactUseCase,
    InputError, LeapPrefill, LeapStack, Prefill, PrefillQuery, PrimaryLeapInputs,
    PrimaryLeapResult, RecommendedLeap, RentRange, TrajectoryInputs, TrajectoryResult,
    UpfrontCash, build_leaps, calculate_budget_breakdown, calculate_rent_range,
    calculate_upfront_cash, cost_of_delay, get_recommended_leap_with_limits, get_supporting_leaps,
    net_worth_impact_table, normalize_state, run_trajectory, select_primary_leap,
};
use crate::market::{MarketComparison, MarketRents};
use crate::notify::{
    InMemoryWaitlist, NotifyError, OutboxEmailSender, PlanSnapshot, SignupRequest, SignupService,
    SignupType,
};
use crate::tax::{TaxBreakdown, TaxEstimator, estimator_from_config, solve_gross_for_net};

const MAX_TRAJECTORY_YEARS: u32 = 60;
const MAX_DELAY_MONTHS: u32 = 120;
const MAX_REAL_RETURN: f64 = 0.5;

/// Collaborators shared by every handler. Built once from [`AppConfig`].
#[derive(Clone)]
pub struct AppState {
    pub tax: Arc<dyn TaxEstimator>,
    pub market: Arc<MarketRents>,
    pub signup: Arc<SignupService>,
    pub limits: ContributionLimits,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tax: estimator_from_config(&config.tax_api()),
            market: Arc::new(MarketRents::from_config(&config.market_rents())),
            signup: Arc::new(SignupService::new(
                Arc::new(InMemoryWaitlist::default()),
                Arc::new(OutboxEmailSender::default()),
                config.email(),
            )),
            limits: config.limits(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TaxPayload {
    salary: Option<f64>,
    state: Option<String>,
    desired_net_annual: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum TaxTarget {
    Gross(f64),
    Net(f64),
}

#[derive(Debug, PartialEq)]
struct TaxApiRequest {
    target: TaxTarget,
    state: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxResponse {
    #[serde(flatten)]
    breakdown: TaxBreakdown,
    net_income_monthly: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    solved_gross_annual: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TrajectoryPayload {
    salary: Option<f64>,
    current_pct: Option<f64>,
    optimized_pct: Option<f64>,
    match_pct: Option<f64>,
    has_match: Option<bool>,
    real_return: Option<f64>,
    years: Option<u32>,
    delay_months: Option<u32>,
}

#[derive(Debug)]
struct TrajectoryRequest {
    inputs: TrajectoryInputs,
    delay_months: u32,
    recommendation: RecommendedLeap,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrajectoryResponse {
    #[serde(flatten)]
    trajectory: TrajectoryResult,
    optimized_pct: f64,
    recommendation: RecommendedLeap,
    delay_months: u32,
    cost_of_delay: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImpactPayload {
    monthly_delta: Option<f64>,
    use_case: Option<ImpactUseCase>,
    debt_apr_pct: Option<f64>,
    debt_apr_range: Option<DebtAprRange>,
}

#[derive(Debug, PartialEq)]
struct ImpactRequest {
    monthly_delta: f64,
    use_case: ImpactUseCase,
    debt_apr_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImpactResponse {
    monthly_delta: f64,
    use_case: ImpactUseCase,
    projections: Vec<ImpactProjection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RentPayload {
    take_home_monthly: Option<f64>,
    salary: Option<f64>,
    state: Option<String>,
    debt_monthly: Option<f64>,
    metro: Option<String>,
}

#[derive(Debug, PartialEq)]
enum Income {
    TakeHome(f64),
    Gross { salary: f64, state: String },
}

#[derive(Debug, PartialEq)]
struct RentRequest {
    income: Income,
    debt_monthly: Option<f64>,
    metro: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RentResponse {
    take_home_monthly: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax: Option<TaxBreakdown>,
    rent_range: RentRange,
    budget: BudgetBreakdown,
    upfront_cash: UpfrontCash,
    #[serde(skip_serializing_if = "Option::is_none")]
    market: Option<MarketComparison>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    salary: Option<f64>,
    current_pct: Option<f64>,
    match_pct: Option<f64>,
    has_match: Option<bool>,
    recommended_pct: Option<f64>,
    ef_current: Option<f64>,
    post_tax_savings_monthly: Option<f64>,
    unlock: AllocatorUnlockData,
}

/// Everything needed to rank Leaps and pick the primary one.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub prefill: LeapPrefill,
    pub match_pct: f64,
    pub unlock: AllocatorUnlockData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub recommendation: RecommendedLeap,
    pub primary: PrimaryLeapResult,
    pub supporting_leap_ids: Vec<String>,
    #[serde(flatten)]
    pub stack: LeapStack,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrefillResponse {
    prefill: Prefill,
    leap_prefill: LeapPrefill,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MarketRentQuery {
    metro: Option<String>,
    take_home_monthly: Option<f64>,
    debt_monthly: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarketRentResponse {
    metro: String,
    median_rent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<MarketComparison>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SignupPayload {
    email: Option<String>,
    signup_type: Option<SignupType>,
    page: Option<String>,
    take_home_monthly: Option<f64>,
    salary: Option<f64>,
    state: Option<String>,
    debt_monthly: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn positive(field: &'static str, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    if value <= 0.0 {
        return Err(InputError::NotPositive(field));
    }
    Ok(value)
}

fn required_salary(value: Option<f64>) -> Result<f64, InputError> {
    positive("salary", value.ok_or(InputError::MissingField("salary"))?)
}

fn required_state(value: Option<&str>) -> Result<String, InputError> {
    let raw = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(InputError::MissingField("state"))?;
    normalize_state(raw).ok_or_else(|| InputError::UnknownState(raw.to_string()))
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, InputError> {
    if !value.is_finite() || value < min || value > max {
        return Err(InputError::OutOfRange { field, min, max });
    }
    Ok(value)
}

fn percent(field: &'static str, value: Option<f64>) -> Result<f64, InputError> {
    in_range(field, value.unwrap_or(0.0), 0.0, 100.0)
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<Option<f64>, InputError> {
    match value {
        Some(v) if !v.is_finite() => Err(InputError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
        Some(v) if v < 0.0 => Err(InputError::Negative(field)),
        other => Ok(other),
    }
}

fn tax_request_from_payload(payload: TaxPayload) -> Result<TaxApiRequest, InputError> {
    let target = match (payload.salary, payload.desired_net_annual) {
        (Some(salary), _) => TaxTarget::Gross(positive("salary", salary)?),
        (None, Some(net)) => TaxTarget::Net(positive("desiredNetAnnual", net)?),
        (None, None) => return Err(InputError::MissingField("salary")),
    };
    Ok(TaxApiRequest {
        target,
        state: required_state(payload.state.as_deref())?,
    })
}

fn trajectory_request_from_payload(
    payload: TrajectoryPayload,
    limits: &ContributionLimits,
) -> Result<TrajectoryRequest, InputError> {
    let salary = required_salary(payload.salary)?;
    let current = percent("currentPct", payload.current_pct)?;
    let match_pct = percent("matchPct", payload.match_pct)?;
    let has_match = payload.has_match.unwrap_or(match_pct > 0.0);
    let recommendation =
        get_recommended_leap_with_limits(has_match, match_pct, current, salary, limits);

    let optimized = match payload.optimized_pct {
        Some(v) => in_range("optimizedPct", v, 0.0, 100.0)?,
        None => recommendation.target_pct.max(current),
    };
    let years = payload.years.unwrap_or(DEFAULT_TRAJECTORY_YEARS);
    if years == 0 || years > MAX_TRAJECTORY_YEARS {
        return Err(InputError::OutOfRange {
            field: "years",
            min: 1.0,
            max: MAX_TRAJECTORY_YEARS as f64,
        });
    }
    let delay_months = payload.delay_months.unwrap_or(DEFAULT_DELAY_MONTHS);
    if delay_months > MAX_DELAY_MONTHS {
        return Err(InputError::OutOfRange {
            field: "delayMonths",
            min: 0.0,
            max: MAX_DELAY_MONTHS as f64,
        });
    }

    let mut inputs = TrajectoryInputs::new(salary, current, optimized, match_pct, has_match);
    inputs.real_return = in_range(
        "realReturn",
        payload.real_return.unwrap_or(DEFAULT_REAL_RETURN),
        -MAX_REAL_RETURN,
        MAX_REAL_RETURN,
    )?;
    inputs.years = years;

    Ok(TrajectoryRequest {
        inputs,
        delay_months,
        recommendation,
    })
}

fn impact_request_from_payload(payload: ImpactPayload) -> Result<ImpactRequest, InputError> {
    let monthly_delta = payload
        .monthly_delta
        .ok_or(InputError::MissingField("monthlyDelta"))?;
    if !monthly_delta.is_finite() {
        return Err(InputError::InvalidNumber {
            field: "monthlyDelta",
            value: monthly_delta.to_string(),
        });
    }
    let explicit_apr = payload
        .debt_apr_pct
        .map(|v| in_range("debtAprPct", v, 0.0, 100.0))
        .transpose()?;
    Ok(ImpactRequest {
        monthly_delta,
        use_case: payload.use_case.unwrap_or(ImpactUseCase::Investing),
        debt_apr_pct: explicit_apr
            .or_else(|| payload.debt_apr_range.map(DebtAprRange::representative_apr_pct)),
    })
}

fn rent_request_from_payload(payload: RentPayload) -> Result<RentRequest, InputError> {
    let income = match payload.take_home_monthly {
        Some(take_home) => Income::TakeHome(positive("takeHomeMonthly", take_home)?),
        None => Income::Gross {
            salary: required_salary(payload.salary)?,
            state: required_state(payload.state.as_deref())?,
        },
    };
    Ok(RentRequest {
        income,
        debt_monthly: non_negative("debtMonthly", payload.debt_monthly)?,
        metro: payload
            .metro
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
    })
}

fn plan_request_from_payload(
    payload: PlanPayload,
    limits: &ContributionLimits,
) -> Result<PlanRequest, InputError> {
    let salary = required_salary(payload.salary)?;
    let current = percent("currentPct", payload.current_pct)?;
    let match_pct = percent("matchPct", payload.match_pct)?;
    let has_match = payload.has_match.unwrap_or(match_pct > 0.0);
    let recommended = match payload.recommended_pct {
        Some(v) => in_range("recommendedPct", v, 0.0, 100.0)?,
        None if has_match => match_pct,
        None => current,
    };
    Ok(PlanRequest {
        prefill: LeapPrefill {
            salary_annual: salary,
            employer_match_enabled: has_match,
            current_401k_pct: current,
            recommended_401k_pct: recommended,
            ef_current: non_negative("efCurrent", payload.ef_current)?.unwrap_or(0.0),
            post_tax_savings_monthly: non_negative(
                "postTaxSavingsMonthly",
                payload.post_tax_savings_monthly,
            )?,
            plan_year: Some(limits.plan_year),
        },
        match_pct,
        unlock: payload.unlock,
    })
}

/// Leap stack, primary Leap and the 401(k) recommendation for one set of answers.
pub fn build_plan(request: &PlanRequest, limits: &ContributionLimits) -> PlanResponse {
    let prefill = &request.prefill;
    let stack = build_leaps(prefill, &request.unlock);
    let primary = select_primary_leap(&PrimaryLeapInputs {
        employer_match_enabled: prefill.employer_match_enabled,
        current_401k_pct: prefill.current_401k_pct,
        recommended_401k_pct: prefill.recommended_401k_pct,
        unlock: &request.unlock,
        leaps: &stack.leaps,
    });
    let supporting_leap_ids = get_supporting_leaps(&stack.leaps, primary.kind)
        .into_iter()
        .map(|leap| leap.id.clone())
        .collect();
    let recommendation = get_recommended_leap_with_limits(
        prefill.employer_match_enabled,
        request.match_pct,
        prefill.current_401k_pct,
        prefill.salary_annual,
        limits,
    );
    PlanResponse {
        recommendation,
        primary,
        supporting_leap_ids,
        stack,
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tax", post(tax_handler))
        .route("/api/trajectory", post(trajectory_handler))
        .route("/api/impact", post(impact_handler))
        .route("/api/rent", post(rent_handler))
        .route("/api/plan", post(plan_handler))
        .route("/api/prefill", get(prefill_handler))
        .route("/api/market-rent", get(market_rent_handler))
        .route("/api/signup", post(signup_handler))
        .fallback(not_found_handler)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_http_server(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "leapwise API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn tax_handler(
    State(app): State<AppState>,
    payload: Result<Json<TaxPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let request = match tax_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return bad_request(&err),
    };
    let (gross, solved_gross_annual) = match request.target {
        TaxTarget::Gross(gross) => (gross, None),
        TaxTarget::Net(net) => {
            let gross = solve_gross_for_net(net, &request.state);
            (gross, Some(gross))
        }
    };
    let breakdown = app.tax.estimate(gross, &request.state).await;
    json_response(
        StatusCode::OK,
        TaxResponse {
            net_income_monthly: breakdown.net_income_monthly().round(),
            breakdown,
            solved_gross_annual,
        },
    )
}

async fn trajectory_handler(
    State(app): State<AppState>,
    payload: Result<Json<TrajectoryPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let request = match trajectory_request_from_payload(payload, &app.limits) {
        Ok(request) => request,
        Err(err) => return bad_request(&err),
    };
    json_response(
        StatusCode::OK,
        TrajectoryResponse {
            trajectory: run_trajectory(&request.inputs),
            optimized_pct: request.inputs.optimized_401k_pct,
            cost_of_delay: cost_of_delay(&request.inputs, request.delay_months),
            delay_months: request.delay_months,
            recommendation: request.recommendation,
        },
    )
}

async fn impact_handler(payload: Result<Json<ImpactPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let request = match impact_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return bad_request(&err),
    };
    json_response(
        StatusCode::OK,
        ImpactResponse {
            monthly_delta: request.monthly_delta,
            use_case: request.use_case,
            projections: net_worth_impact_table(
                request.monthly_delta,
                request.use_case,
                request.debt_apr_pct,
            ),
        },
    )
}

async fn rent_handler(
    State(app): State<AppState>,
    payload: Result<Json<RentPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let request = match rent_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return bad_request(&err),
    };
    let (take_home, tax) = match request.income {
        Income::TakeHome(take_home) => (take_home, None),
        Income::Gross { salary, state } => {
            let breakdown = app.tax.estimate(salary, &state).await;
            (breakdown.net_income_monthly(), Some(breakdown))
        }
    };
    let rent_range = calculate_rent_range(Some(take_home), request.debt_monthly);
    let market = request
        .metro
        .as_deref()
        .and_then(|metro| app.market.compare_to_market(&rent_range, metro));
    json_response(
        StatusCode::OK,
        RentResponse {
            take_home_monthly: take_home.round(),
            tax,
            budget: calculate_budget_breakdown(Some(take_home)),
            upfront_cash: calculate_upfront_cash(Some(take_home), &rent_range),
            rent_range,
            market,
        },
    )
}

async fn plan_handler(
    State(app): State<AppState>,
    payload: Result<Json<PlanPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let request = match plan_request_from_payload(payload, &app.limits) {
        Ok(request) => request,
        Err(err) => return bad_request(&err),
    };
    json_response(StatusCode::OK, build_plan(&request, &app.limits))
}

async fn prefill_handler(query: Result<Query<PrefillQuery>, QueryRejection>) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected_query(rejection),
    };
    match query.into_prefill() {
        Ok(prefill) => json_response(
            StatusCode::OK,
            PrefillResponse {
                leap_prefill: prefill.to_leap_prefill(),
                prefill,
            },
        ),
        Err(err) => bad_request(&err),
    }
}

async fn market_rent_handler(
    State(app): State<AppState>,
    query: Result<Query<MarketRentQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected_query(rejection),
    };
    let Some(metro) = query
        .metro
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
    else {
        return bad_request(&InputError::MissingField("metro"));
    };
    let Some(median_rent) = app.market.median_rent(metro) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("No rent data for metro {metro:?}"),
        );
    };
    let comparison = query.take_home_monthly.and_then(|take_home| {
        let range = calculate_rent_range(Some(take_home), query.debt_monthly);
        app.market.compare_to_market(&range, metro)
    });
    json_response(
        StatusCode::OK,
        MarketRentResponse {
            metro: metro.to_string(),
            median_rent,
            comparison,
        },
    )
}

async fn signup_handler(
    State(app): State<AppState>,
    payload: Result<Json<SignupPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let Some(email) = payload.email.filter(|e| !e.trim().is_empty()) else {
        return bad_request(&InputError::MissingField("email"));
    };

    let plan = if payload.salary.is_some() {
        let salary = match required_salary(payload.salary) {
            Ok(salary) => salary,
            Err(err) => return bad_request(&err),
        };
        let state = match required_state(payload.state.as_deref()) {
            Ok(state) => state,
            Err(err) => return bad_request(&err),
        };
        let breakdown = app.tax.estimate(salary, &state).await;
        Some(PlanSnapshot::from_tax(breakdown, payload.debt_monthly))
    } else {
        payload
            .take_home_monthly
            .map(|take_home| PlanSnapshot::from_take_home(take_home, payload.debt_monthly))
    };

    let request = SignupRequest {
        email,
        signup_type: payload.signup_type.unwrap_or_default(),
        page: payload.page.unwrap_or_else(|| "/".to_string()),
        plan,
    };
    match app.signup.signup(request).await {
        Ok(outcome) => json_response(StatusCode::OK, outcome),
        Err(err @ NotifyError::InvalidEmail(_)) => {
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Err(err) => error_response(StatusCode::BAD_GATEWAY, &err.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn bad_request(err: &InputError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn rejected_body(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection, "rejected request body");
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid request body: {}", rejection.body_text()),
    )
}

fn rejected_query(rejection: QueryRejection) -> Response {
    tracing::debug!(error = %rejection, "rejected query string");
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid query string: {}", rejection.body_text()),
    )
}

#[cfg(test)]
fn payload_from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str::<T>(json).map_err(|e| format!("Invalid API JSON payload: {e}"))
}
