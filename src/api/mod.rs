mod rates;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    GoalSolveConfig, GoalType, MAX_AGE, ProjectionInput, ProjectionResult, SolveError,
    WithdrawalPolicy, project, solve_goal,
};

pub use rates::{
    BUSINESS_DAYS_PER_YEAR, FallbackRates, PublishedRates, RateSource, ReferenceRateProvider,
    ReferenceRates, annualize_daily_rate,
};

const DEFAULT_NOMINAL_RETURN: f64 = 10.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliWithdrawalPolicy {
    FixedRate,
    FixedSpend,
}

impl From<CliWithdrawalPolicy> for WithdrawalPolicy {
    fn from(value: CliWithdrawalPolicy) -> Self {
        match value {
            CliWithdrawalPolicy::FixedRate => WithdrawalPolicy::FixedRate,
            CliWithdrawalPolicy::FixedSpend => WithdrawalPolicy::FixedSpend,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliGoalType {
    RequiredContributionRate,
    MaxMonthlySpend,
}

impl From<CliGoalType> for GoalType {
    fn from(value: CliGoalType) -> Self {
        match value {
            CliGoalType::RequiredContributionRate => GoalType::RequiredContributionRate,
            CliGoalType::MaxMonthlySpend => GoalType::MaxMonthlySpend,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiWithdrawalPolicy {
    #[serde(alias = "fixedRate", alias = "fixed_rate")]
    FixedRate,
    #[serde(alias = "fixedSpend", alias = "fixed_spend")]
    FixedSpend,
}

impl From<ApiWithdrawalPolicy> for CliWithdrawalPolicy {
    fn from(value: ApiWithdrawalPolicy) -> Self {
        match value {
            ApiWithdrawalPolicy::FixedRate => CliWithdrawalPolicy::FixedRate,
            ApiWithdrawalPolicy::FixedSpend => CliWithdrawalPolicy::FixedSpend,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGoalType {
    #[serde(
        alias = "requiredContributionRate",
        alias = "required_contribution_rate",
        alias = "contribution"
    )]
    RequiredContributionRate,
    #[serde(
        alias = "maxMonthlySpend",
        alias = "max_monthly_spend",
        alias = "spend"
    )]
    MaxMonthlySpend,
}

impl From<ApiGoalType> for GoalType {
    fn from(value: ApiGoalType) -> Self {
        match value {
            ApiGoalType::RequiredContributionRate => GoalType::RequiredContributionRate,
            ApiGoalType::MaxMonthlySpend => GoalType::MaxMonthlySpend,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    monthly_income: Option<f64>,
    invested_today: Option<f64>,
    contribution_rate: Option<f64>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    life_expectancy_age: Option<u32>,
    nominal_return: Option<f64>,
    use_reference_rate: Option<bool>,
    inflation: Option<f64>,
    monthly_spend: Option<f64>,
    wealth_goal: Option<f64>,
    withdrawal_policy: Option<ApiWithdrawalPolicy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    #[serde(flatten)]
    projection: ProjectPayload,
    goal: Option<ApiGoalType>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "fire-projection",
    about = "Deterministic FIRE projection: accumulation at a real return, then a 4%-rule or fixed-spend drawdown"
)]
pub struct Cli {
    #[arg(long, default_value_t = 15000.0, help = "Monthly income in today's money")]
    pub monthly_income: f64,
    #[arg(long, default_value_t = 150000.0, help = "Amount already invested")]
    pub invested_today: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Share of monthly income invested each month, in percent"
    )]
    pub contribution_rate: f64,
    #[arg(long, default_value_t = 37)]
    pub current_age: u32,
    #[arg(long, default_value_t = 65)]
    pub retirement_age: u32,
    #[arg(long, default_value_t = 95, help = "Age to fund through")]
    pub life_expectancy_age: u32,
    #[arg(
        long,
        help = "Expected annual nominal return in percent; defaults to 10, or to the reference policy rate with --use-reference-rate"
    )]
    pub nominal_return: Option<f64>,
    #[arg(
        long,
        default_value_t = false,
        help = "Default --nominal-return to the reference policy rate"
    )]
    pub use_reference_rate: bool,
    #[arg(long, default_value_t = 5.0, help = "Expected annual inflation in percent")]
    pub inflation: f64,
    #[arg(
        long,
        default_value_t = 5000.0,
        help = "Desired monthly spend in retirement, in today's money"
    )]
    pub monthly_spend: f64,
    #[arg(
        long,
        default_value_t = 1000000.0,
        help = "Target wealth at retirement; 0 derives it from the 4% rule"
    )]
    pub wealth_goal: f64,
    #[arg(long, value_enum, default_value_t = CliWithdrawalPolicy::FixedRate)]
    pub withdrawal_policy: CliWithdrawalPolicy,
    #[arg(long, value_enum, help = "Also solve for a goal with default search bounds")]
    pub solve: Option<CliGoalType>,
    #[arg(long, default_value_t = false, help = "Omit the age,balance CSV")]
    pub summary_only: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("{flag} must be a finite number")]
    NotFinite { flag: &'static str },
    #[error("{flag} must be >= 0")]
    Negative { flag: &'static str },
    #[error("{flag} must be between 0 and 100")]
    PercentOutOfRange { flag: &'static str },
    #[error("{flag} must be <= {max}")]
    AgeOutOfRange { flag: &'static str, max: u32 },
    #[error("invalid solver configuration: {0}")]
    Solve(#[from] SolveError),
}

#[derive(Clone)]
struct AppState {
    rates: Arc<dyn ReferenceRateProvider>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveResponse {
    goal_type: GoalType,
    unit: SolveUnit,
    solved_value: Option<f64>,
    converged: bool,
    feasible: bool,
    iterations: usize,
    message: String,
    projection: Option<ProjectionResult>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum SolveUnit {
    Percent,
    Currency,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_inputs(
    cli: &Cli,
    rates: &dyn ReferenceRateProvider,
) -> Result<ProjectionInput, InputError> {
    for (flag, value) in [
        ("--monthly-income", cli.monthly_income),
        ("--invested-today", cli.invested_today),
        ("--monthly-spend", cli.monthly_spend),
        ("--wealth-goal", cli.wealth_goal),
    ] {
        if !value.is_finite() {
            return Err(InputError::NotFinite { flag });
        }
        if value < 0.0 {
            return Err(InputError::Negative { flag });
        }
    }

    if !cli.contribution_rate.is_finite() {
        return Err(InputError::NotFinite {
            flag: "--contribution-rate",
        });
    }
    if !(0.0..=100.0).contains(&cli.contribution_rate) {
        return Err(InputError::PercentOutOfRange {
            flag: "--contribution-rate",
        });
    }

    let nominal_return = match cli.nominal_return {
        Some(v) => v,
        None if cli.use_reference_rate => rates.reference_rates().policy_rate,
        None => DEFAULT_NOMINAL_RETURN,
    };
    for (flag, value) in [
        ("--nominal-return", nominal_return),
        ("--inflation", cli.inflation),
    ] {
        if !value.is_finite() {
            return Err(InputError::NotFinite { flag });
        }
    }

    for (flag, age) in [
        ("--current-age", cli.current_age),
        ("--retirement-age", cli.retirement_age),
        ("--life-expectancy-age", cli.life_expectancy_age),
    ] {
        if age > MAX_AGE {
            return Err(InputError::AgeOutOfRange { flag, max: MAX_AGE });
        }
    }

    Ok(ProjectionInput {
        monthly_income: cli.monthly_income,
        invested_today: cli.invested_today,
        contribution_rate: cli.contribution_rate / 100.0,
        current_age: cli.current_age,
        retirement_age: cli.retirement_age,
        life_expectancy_age: cli.life_expectancy_age,
        nominal_return: nominal_return / 100.0,
        inflation: cli.inflation / 100.0,
        monthly_spend_target: cli.monthly_spend,
        wealth_goal: cli.wealth_goal,
        withdrawal_policy: cli.withdrawal_policy.into(),
    })
}

pub fn run_cli(cli: &Cli, rates: &dyn ReferenceRateProvider) -> Result<String, InputError> {
    let inputs = build_inputs(cli, rates)?;
    let result = project(&inputs);
    log_projection(&inputs, &result);

    let mut report = render_summary(&result);
    if let Some(goal) = cli.solve {
        let solved = solve_goal(&inputs, GoalSolveConfig::for_goal(goal.into()))?;
        let line = render_solve_line(solved.goal_type, solved.solved_value, &solved.message);
        let _ = writeln!(report, "{line}");
    }
    if !cli.summary_only {
        report.push('\n');
        report.push_str(&render_series_csv(&result));
    }
    Ok(report)
}

pub fn render_summary(result: &ProjectionResult) -> String {
    let mut out = String::new();
    let rows = [
        ("Monthly contribution", money(result.monthly_contribution)),
        ("Years to retirement", result.years_to_retirement.to_string()),
        ("Real annual return", percent(result.real_annual_rate)),
        ("Balance at retirement", money(result.balance_at_retirement)),
        ("Wealth target", money(result.wealth_target)),
        ("4% rule target", money(result.fire_target)),
        ("Gap", money(result.gap)),
        (
            "Goal met",
            if result.goal_met { "yes" } else { "no" }.to_string(),
        ),
        (
            "Sustainable monthly spend",
            money(result.sustainable_monthly_spend),
        ),
        ("Drawdown", drawdown_status(result)),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{:<27}{value}", format!("{label}:"));
    }
    out
}

pub fn render_series_csv(result: &ProjectionResult) -> String {
    let mut out = String::from("age,balance\n");
    for point in &result.series {
        let _ = writeln!(out, "{},{}", point.age, money(point.balance));
    }
    out
}

fn render_solve_line(goal_type: GoalType, solved_value: Option<f64>, message: &str) -> String {
    let label = match goal_type {
        GoalType::RequiredContributionRate => "Required contribution rate",
        GoalType::MaxMonthlySpend => "Max sustainable spend",
    };
    let value = match (goal_type, solved_value) {
        (_, None) => "not found".to_string(),
        (GoalType::RequiredContributionRate, Some(v)) => percent(v),
        (GoalType::MaxMonthlySpend, Some(v)) => money(v),
    };
    format!("{:<27}{value} ({message})", format!("{label}:"))
}

fn drawdown_status(result: &ProjectionResult) -> String {
    match (result.ruin_age, result.final_point()) {
        (Some(age), _) => format!("ruin at age {age}"),
        (None, Some(last)) => format!("sustainable to age {}", last.age),
        (None, None) => "sustainable".to_string(),
    }
}

/// Whole currency units; never prints "-0".
fn money(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded:.0}")
}

fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn log_projection(inputs: &ProjectionInput, result: &ProjectionResult) {
    debug!(
        current_age = inputs.current_age,
        retirement_age = inputs.retirement_age,
        life_expectancy_age = inputs.life_expectancy_age,
        policy = ?inputs.withdrawal_policy,
        balance_at_retirement = result.balance_at_retirement,
        goal_met = result.goal_met,
        ruin_age = ?result.ruin_age,
        "projection computed"
    );
}

pub fn router(rates: Arc<dyn ReferenceRateProvider>) -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/rates", get(rates_handler))
        .route("/api/solve", post(solve_handler))
        .fallback(not_found_handler)
        .with_state(AppState { rates })
}

pub async fn run_http_server(
    port: u16,
    rates: Arc<dyn ReferenceRateProvider>,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(rates);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE projection API listening");
    info!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<ProjectPayload>,
) -> Response {
    project_handler_impl(&state, payload)
}

async fn project_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectPayload>,
) -> Response {
    project_handler_impl(&state, payload)
}

async fn rates_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.rates.reference_rates())
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(payload): Json<SolvePayload>,
) -> Response {
    match solve_from_payload(payload, state.rates.as_ref()) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => {
            warn!(error = %e, "rejected solve request");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

fn project_handler_impl(state: &AppState, payload: ProjectPayload) -> Response {
    let inputs = match project_input_from_payload(payload, state.rates.as_ref()) {
        Ok(inputs) => inputs,
        Err(e) => {
            warn!(error = %e, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };
    let result = project(&inputs);
    log_projection(&inputs, &result);
    json_response(StatusCode::OK, result)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
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

#[cfg(test)]
fn project_input_from_json(json: &str) -> Result<ProjectionInput, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    project_input_from_payload(payload, &FallbackRates).map_err(|e| e.to_string())
}

fn project_input_from_payload(
    payload: ProjectPayload,
    rates: &dyn ReferenceRateProvider,
) -> Result<ProjectionInput, InputError> {
    let mut cli = default_cli();

    if let Some(v) = payload.monthly_income {
        cli.monthly_income = v;
    }
    if let Some(v) = payload.invested_today {
        cli.invested_today = v;
    }
    if let Some(v) = payload.contribution_rate {
        cli.contribution_rate = v;
    }
    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.life_expectancy_age {
        cli.life_expectancy_age = v;
    }
    if let Some(v) = payload.nominal_return {
        cli.nominal_return = Some(v);
    }
    if let Some(v) = payload.use_reference_rate {
        cli.use_reference_rate = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation = v;
    }
    if let Some(v) = payload.monthly_spend {
        cli.monthly_spend = v;
    }
    if let Some(v) = payload.wealth_goal {
        cli.wealth_goal = v;
    }
    if let Some(v) = payload.withdrawal_policy {
        cli.withdrawal_policy = v.into();
    }

    build_inputs(&cli, rates)
}

fn solve_from_payload(
    payload: SolvePayload,
    rates: &dyn ReferenceRateProvider,
) -> Result<SolveResponse, InputError> {
    let inputs = project_input_from_payload(payload.projection, rates)?;
    let goal_type: GoalType = payload
        .goal
        .unwrap_or(ApiGoalType::RequiredContributionRate)
        .into();
    let (unit, scale) = match goal_type {
        GoalType::RequiredContributionRate => (SolveUnit::Percent, 100.0),
        GoalType::MaxMonthlySpend => (SolveUnit::Currency, 1.0),
    };

    let mut config = GoalSolveConfig::for_goal(goal_type);
    if let Some(v) = payload.search_min {
        config.search_min = v / scale;
    }
    if let Some(v) = payload.search_max {
        config.search_max = v / scale;
    }
    if let Some(v) = payload.tolerance {
        config.tolerance = v / scale;
    }
    if let Some(v) = payload.max_iterations {
        config.max_iterations = v;
    }

    let solved = solve_goal(&inputs, config)?;
    debug!(
        goal = ?solved.goal_type,
        solved_value = ?solved.solved_value,
        converged = solved.converged,
        feasible = solved.feasible,
        "goal solved"
    );

    Ok(SolveResponse {
        goal_type: solved.goal_type,
        unit,
        solved_value: solved.solved_value.map(|v| v * scale),
        converged: solved.converged,
        feasible: solved.feasible,
        iterations: solved.iterations.len(),
        message: solved.message,
        projection: solved.projection,
    })
}

fn default_cli() -> Cli {
    Cli {
        monthly_income: 15_000.0,
        invested_today: 150_000.0,
        contribution_rate: 5.0,
        current_age: 37,
        retirement_age: 65,
        life_expectancy_age: 95,
        nominal_return: None,
        use_reference_rate: false,
        inflation: 5.0,
        monthly_spend: 5_000.0,
        wealth_goal: 1_000_000.0,
        withdrawal_policy: CliWithdrawalPolicy::FixedRate,
        solve: None,
        summary_only: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli()
    }

    async fn call(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = router(Arc::new(FallbackRates));
        let response = app.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = serde_json::from_slice(&bytes).expect("body should be JSON");
        (status, json)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    #[test]
    fn default_cli_matches_default_projection_input() {
        let inputs = build_inputs(&sample_cli(), &FallbackRates).expect("valid inputs");
        assert_eq!(inputs, ProjectionInput::default());
    }

    #[test]
    fn clap_defaults_match_default_cli() {
        let parsed = Cli::try_parse_from(["fire-projection"]).expect("defaults parse");
        let from_clap = build_inputs(&parsed, &FallbackRates).expect("valid inputs");
        let from_default = build_inputs(&sample_cli(), &FallbackRates).expect("valid inputs");
        assert_eq!(from_clap, from_default);
    }

    #[test]
    fn build_inputs_converts_whole_percents_to_fractions() {
        let mut cli = sample_cli();
        cli.contribution_rate = 12.5;
        cli.nominal_return = Some(8.0);
        cli.inflation = 3.0;

        let inputs = build_inputs(&cli, &FallbackRates).expect("valid inputs");
        assert_approx(inputs.contribution_rate, 0.125);
        assert_approx(inputs.nominal_return, 0.08);
        assert_approx(inputs.inflation, 0.03);
    }

    #[test]
    fn build_inputs_uses_reference_rate_only_when_requested() {
        let mut cli = sample_cli();
        cli.use_reference_rate = true;
        let inputs = build_inputs(&cli, &FallbackRates).expect("valid inputs");
        assert_approx(inputs.nominal_return, 0.1075);

        cli.nominal_return = Some(7.0);
        let inputs = build_inputs(&cli, &FallbackRates).expect("valid inputs");
        assert_approx(inputs.nominal_return, 0.07);
    }

    #[test]
    fn build_inputs_rejects_negative_money() {
        let mut cli = sample_cli();
        cli.invested_today = -1.0;
        let err = build_inputs(&cli, &FallbackRates).expect_err("must reject negative");
        assert!(err.to_string().contains("--invested-today"));
    }

    #[test]
    fn build_inputs_rejects_non_finite_values() {
        let mut cli = sample_cli();
        cli.inflation = f64::NAN;
        let err = build_inputs(&cli, &FallbackRates).expect_err("must reject NaN");
        assert_eq!(err, InputError::NotFinite { flag: "--inflation" });
    }

    #[test]
    fn build_inputs_rejects_contribution_rate_outside_percent_range() {
        let mut cli = sample_cli();
        cli.contribution_rate = 120.0;
        let err = build_inputs(&cli, &FallbackRates).expect_err("must reject > 100");
        assert!(err.to_string().contains("--contribution-rate"));
    }

    #[test]
    fn build_inputs_rejects_ages_past_ceiling_but_not_out_of_order() {
        let mut cli = sample_cli();
        cli.life_expectancy_age = MAX_AGE + 1;
        let err = build_inputs(&cli, &FallbackRates).expect_err("must reject age");
        assert!(err.to_string().contains("--life-expectancy-age"));

        let mut cli = sample_cli();
        cli.retirement_age = 20;
        cli.life_expectancy_age = 10;
        assert!(build_inputs(&cli, &FallbackRates).is_ok());
    }

    #[test]
    fn project_input_from_json_parses_web_keys() {
        let json = r#"{
          "monthlyIncome": 8000,
          "investedToday": 20000,
          "contributionRate": 20,
          "currentAge": 30,
          "retirementAge": 55,
          "lifeExpectancyAge": 90,
          "nominalReturn": 9,
          "inflation": 4,
          "monthlySpend": 3000,
          "wealthGoal": 0,
          "withdrawalPolicy": "fixed-spend"
        }"#;
        let inputs = project_input_from_json(json).expect("json should parse");

        assert_approx(inputs.monthly_income, 8_000.0);
        assert_approx(inputs.invested_today, 20_000.0);
        assert_approx(inputs.contribution_rate, 0.2);
        assert_eq!(inputs.current_age, 30);
        assert_eq!(inputs.retirement_age, 55);
        assert_eq!(inputs.life_expectancy_age, 90);
        assert_approx(inputs.nominal_return, 0.09);
        assert_approx(inputs.inflation, 0.04);
        assert_approx(inputs.monthly_spend_target, 3_000.0);
        assert_approx(inputs.wealth_goal, 0.0);
        assert_eq!(inputs.withdrawal_policy, WithdrawalPolicy::FixedSpend);
    }

    #[test]
    fn project_input_from_json_accepts_policy_aliases_and_defaults() {
        let inputs = project_input_from_json(r#"{ "withdrawalPolicy": "fixedSpend" }"#)
            .expect("json should parse");
        assert_eq!(inputs.withdrawal_policy, WithdrawalPolicy::FixedSpend);
        assert_eq!(inputs.current_age, 37);

        let err = project_input_from_json(r#"{ "withdrawalPolicy": "yolo" }"#)
            .expect_err("unknown policy");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn summary_reports_goal_and_drawdown() {
        let result = project(&ProjectionInput::default());
        let summary = render_summary(&result);

        assert!(summary.contains("Monthly contribution:      750\n"));
        assert!(summary.contains("Years to retirement:       28\n"));
        assert!(summary.contains("Real annual return:        5.00%\n"));
        assert!(summary.contains("Balance at retirement:     1125582\n"));
        assert!(summary.contains("Goal met:                  yes\n"));
        assert!(summary.contains("Drawdown:                  sustainable to age 95\n"));
    }

    #[test]
    fn series_csv_has_header_and_one_row_per_point() {
        let mut inputs = ProjectionInput::default();
        inputs.current_age = 60;
        inputs.retirement_age = 61;
        inputs.life_expectancy_age = 62;
        inputs.nominal_return = 0.0;
        inputs.inflation = 0.0;
        let result = project(&inputs);

        let csv = render_series_csv(&result);
        assert_eq!(csv, "age,balance\n60,150000\n61,159000\n62,152640\n");
    }

    #[test]
    fn money_never_prints_negative_zero() {
        assert_eq!(money(-0.3), "0");
        assert_eq!(money(-1.6), "-2");
        assert_eq!(money(1_234.5), "1235");
    }

    #[test]
    fn run_cli_appends_solver_line_and_csv() {
        let mut cli = sample_cli();
        cli.solve = Some(CliGoalType::RequiredContributionRate);
        let report = run_cli(&cli, &FallbackRates).expect("valid run");
        assert!(report.contains("Required contribution rate:"));
        assert!(report.contains("\nage,balance\n37,150000\n"));

        cli.summary_only = true;
        let report = run_cli(&cli, &FallbackRates).expect("valid run");
        assert!(!report.contains("age,balance"));
    }

    #[tokio::test]
    async fn get_project_returns_camel_case_result() {
        let request = Request::builder()
            .uri("/api/project?currentAge=40&retirementAge=40&lifeExpectancyAge=41&withdrawalPolicy=fixed-spend")
            .body(Body::empty())
            .expect("valid request");
        let (status, json) = call(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["yearsToRetirement"], 0);
        assert_eq!(json["balanceAtRetirement"], 150_000.0);
        assert_eq!(json["sustainableMonthlySpend"], 5_000.0);
        assert_eq!(json["goalMet"], false);
        assert_eq!(json["series"][0]["phase"], "accumulation");
        assert_eq!(json["series"][1]["phase"], "decumulation");
        assert!(json["ruinAge"].is_null());
    }

    #[tokio::test]
    async fn post_project_rejects_invalid_values_with_json_error() {
        let (status, json) =
            call(post_json("/api/project", r#"{ "contributionRate": 150 }"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            json["error"]
                .as_str()
                .is_some_and(|e| e.contains("--contribution-rate"))
        );
    }

    #[tokio::test]
    async fn rates_endpoint_reports_fallback_source() {
        let request = Request::builder()
            .uri("/api/rates")
            .body(Body::empty())
            .expect("valid request");
        let (status, json) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["policyRate"], 10.75);
        assert_eq!(json["source"], "fallback");
    }

    #[tokio::test]
    async fn solve_endpoint_reports_contribution_in_percent() {
        let body = r#"{
          "goal": "required-contribution-rate",
          "monthlyIncome": 10000,
          "investedToday": 0,
          "currentAge": 30,
          "retirementAge": 40,
          "lifeExpectancyAge": 50,
          "nominalReturn": 5,
          "inflation": 5,
          "wealthGoal": 600000
        }"#;
        let (status, json) = call(post_json("/api/solve", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["unit"], "percent");
        assert_eq!(json["feasible"], true);
        let solved = json["solvedValue"].as_f64().expect("solved value");
        assert!((solved - 50.0).abs() <= 0.01, "got {solved}");
    }

    #[tokio::test]
    async fn solve_endpoint_rejects_bad_bounds() {
        let body = r#"{ "goal": "spend", "searchMin": 100, "searchMax": 10 }"#;
        let (status, json) = call(post_json("/api/solve", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            json["error"]
                .as_str()
                .is_some_and(|e| e.contains("search_max must be greater"))
        );
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let request = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .expect("valid request");
        let (status, json) = call(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not found");
    }
}
