use serde::Serialize;

pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

/// Lowest real annual return the engine will compound at. Anything at or below
/// -100% has no monthly equivalent.
pub const REAL_RATE_FLOOR: f64 = -0.99;

pub const MAX_AGE: u32 = 150;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalPolicy {
    FixedRate,
    FixedSpend,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Accumulation,
    Decumulation,
}

/// All rates are fractions (0.05 means 5%).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub monthly_income: f64,
    pub invested_today: f64,
    pub contribution_rate: f64,
    pub current_age: u32,
    pub retirement_age: u32,
    pub life_expectancy_age: u32,
    pub nominal_return: f64,
    pub inflation: f64,
    pub monthly_spend_target: f64,
    /// Explicit wealth target; zero or negative means unset.
    pub wealth_goal: f64,
    pub withdrawal_policy: WithdrawalPolicy,
}

impl Default for ProjectionInput {
    fn default() -> Self {
        Self {
            monthly_income: 15_000.0,
            invested_today: 150_000.0,
            contribution_rate: 0.05,
            current_age: 37,
            retirement_age: 65,
            life_expectancy_age: 95,
            nominal_return: 0.10,
            inflation: 0.05,
            monthly_spend_target: 5_000.0,
            wealth_goal: 1_000_000.0,
            withdrawal_policy: WithdrawalPolicy::FixedRate,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub age: u32,
    pub balance: f64,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub years_to_retirement: u32,
    pub monthly_contribution: f64,
    pub real_annual_rate: f64,
    pub monthly_rate: f64,
    pub balance_at_retirement: f64,
    pub monthly_withdrawal: f64,
    pub sustainable_monthly_spend: f64,
    pub fire_target: f64,
    pub wealth_target: f64,
    pub gap: f64,
    pub goal_met: bool,
    pub ruin_age: Option<u32>,
    pub sustainable: bool,
    pub series: Vec<SeriesPoint>,
}

impl ProjectionResult {
    pub fn accumulation(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.series
            .iter()
            .filter(|p| p.phase == Phase::Accumulation)
    }

    pub fn decumulation(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.series
            .iter()
            .filter(|p| p.phase == Phase::Decumulation)
    }

    pub fn final_point(&self) -> Option<&SeriesPoint> {
        self.series.last()
    }
}
