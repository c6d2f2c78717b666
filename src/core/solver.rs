use serde::Serialize;
use thiserror::Error;

use super::{ProjectionInput, ProjectionResult, WithdrawalPolicy, project};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    RequiredContributionRate,
    MaxMonthlySpend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl GoalSolveConfig {
    pub fn for_goal(goal_type: GoalType) -> Self {
        match goal_type {
            GoalType::RequiredContributionRate => Self {
                goal_type,
                search_min: 0.0,
                search_max: 1.0,
                tolerance: 1e-4,
                max_iterations: 64,
            },
            GoalType::MaxMonthlySpend => Self {
                goal_type,
                search_min: 0.0,
                search_max: 1_000_000.0,
                tolerance: 0.5,
                max_iterations: 80,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub satisfied: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub solved_value: Option<f64>,
    pub projection: Option<ProjectionResult>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("search bounds must be finite")]
    NonFiniteBounds,
    #[error("search_max must be greater than search_min")]
    EmptySearchRange,
    #[error("contribution rate bounds must lie within [0, 1]")]
    ContributionRateOutOfRange,
    #[error("monthly spend bounds must be >= 0")]
    NegativeSpendBound,
    #[error("tolerance must be > 0")]
    InvalidTolerance,
    #[error("max_iterations must be > 0")]
    ZeroIterations,
}

pub fn solve_goal(
    inputs: &ProjectionInput,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, SolveError> {
    validate_config(config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_ok = evaluate_candidate(inputs, config.goal_type, config.search_min).1;
    let high_ok = evaluate_candidate(inputs, config.goal_type, config.search_max).1;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    match config.goal_type {
        GoalType::RequiredContributionRate => {
            if low_ok {
                solved_value = Some(config.search_min);
                converged = true;
                feasible = true;
                message = "Already meets target at lower contribution bound.".to_string();
            } else if !high_ok {
                feasible = false;
                message = "No contribution rate within the search bounds meets the target."
                    .to_string();
            } else {
                let (value, done) = bisect(inputs, config, &mut iterations, true);
                solved_value = Some(value);
                converged = done;
                feasible = true;
                message = if converged {
                    "Solved required contribution rate.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
        GoalType::MaxMonthlySpend => {
            if !low_ok {
                feasible = false;
                message = "No sustainable spend found within the search bounds.".to_string();
            } else if high_ok {
                solved_value = Some(config.search_max);
                converged = true;
                feasible = true;
                message =
                    "Upper spend bound is still sustainable; increase search max for higher target."
                        .to_string();
            } else {
                let (value, done) = bisect(inputs, config, &mut iterations, false);
                solved_value = Some(value);
                converged = done;
                feasible = true;
                message = if converged {
                    "Solved maximum sustainable monthly spend.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
    }

    let projection =
        solved_value.map(|value| evaluate_candidate(inputs, config.goal_type, value).0);

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        solved_value,
        projection,
        iterations,
        converged,
        feasible,
        message,
    })
}

/// `satisfied_moves_high` is true when a satisfied candidate should shrink the
/// upper bound (minimising); false when it should raise the lower bound.
fn bisect(
    inputs: &ProjectionInput,
    config: GoalSolveConfig,
    iterations: &mut Vec<GoalSolveIteration>,
    satisfied_moves_high: bool,
) -> (f64, bool) {
    let mut lo = config.search_min;
    let mut hi = config.search_max;
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        let (_, satisfied) = evaluate_candidate(inputs, config.goal_type, mid);
        iterations.push(GoalSolveIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_value: mid,
            satisfied,
        });

        if satisfied == satisfied_moves_high {
            hi = mid;
        } else {
            lo = mid;
        }

        if (hi - lo).abs() <= config.tolerance {
            return (if satisfied_moves_high { hi } else { lo }, true);
        }
    }
    (if satisfied_moves_high { hi } else { lo }, false)
}

fn evaluate_candidate(
    base_inputs: &ProjectionInput,
    goal_type: GoalType,
    candidate_value: f64,
) -> (ProjectionResult, bool) {
    let mut inputs = base_inputs.clone();
    match goal_type {
        GoalType::RequiredContributionRate => {
            inputs.contribution_rate = candidate_value;
            let result = project(&inputs);
            let met = result.goal_met;
            (result, met)
        }
        GoalType::MaxMonthlySpend => {
            inputs.withdrawal_policy = WithdrawalPolicy::FixedSpend;
            inputs.monthly_spend_target = candidate_value;
            let result = project(&inputs);
            let sustainable = result.sustainable;
            (result, sustainable)
        }
    }
}

fn validate_config(config: GoalSolveConfig) -> Result<(), SolveError> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(SolveError::NonFiniteBounds);
    }
    if config.search_max <= config.search_min {
        return Err(SolveError::EmptySearchRange);
    }
    match config.goal_type {
        GoalType::RequiredContributionRate => {
            if config.search_min < 0.0 || config.search_max > 1.0 {
                return Err(SolveError::ContributionRateOutOfRange);
            }
        }
        GoalType::MaxMonthlySpend => {
            if config.search_min < 0.0 {
                return Err(SolveError::NegativeSpendBound);
            }
        }
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::ZeroIterations);
    }
    Ok(())
}
