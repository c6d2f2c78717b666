mod engine;
mod solver;
mod types;

pub use engine::{closed_form_future_value, monthly_rate, project};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, SolveError, solve_goal,
};
pub use types::{
    MAX_AGE, Phase, ProjectionInput, ProjectionResult, REAL_RATE_FLOOR, SAFE_WITHDRAWAL_RATE,
    SeriesPoint, WithdrawalPolicy,
};
