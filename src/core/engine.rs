use super::types::{
    MAX_AGE, Phase, ProjectionInput, ProjectionResult, REAL_RATE_FLOOR, SAFE_WITHDRAWAL_RATE,
    SeriesPoint, WithdrawalPolicy,
};

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, Copy)]
struct NormalizedInput {
    monthly_income: f64,
    invested_today: f64,
    contribution_rate: f64,
    current_age: u32,
    retirement_age: u32,
    life_expectancy_age: u32,
    real_annual_rate: f64,
    monthly_spend_target: f64,
    wealth_goal: f64,
    withdrawal_policy: WithdrawalPolicy,
}

impl NormalizedInput {
    fn years_to_retirement(&self) -> u32 {
        self.retirement_age - self.current_age
    }
}

#[derive(Debug, Clone, Copy)]
struct GoalEvaluation {
    fire_target: f64,
    wealth_target: f64,
    gap: f64,
    goal_met: bool,
}

pub fn project(input: &ProjectionInput) -> ProjectionResult {
    let inputs = normalize(input);
    let monthly_rate = monthly_rate(inputs.real_annual_rate);
    let monthly_contribution = (inputs.monthly_income * inputs.contribution_rate).round();

    let horizon = (inputs.life_expectancy_age - inputs.current_age) as usize + 1;
    let mut series = Vec::with_capacity(horizon);

    let balance_at_retirement =
        run_accumulation(&inputs, monthly_rate, monthly_contribution, &mut series);
    let monthly_withdrawal = monthly_withdrawal(&inputs, balance_at_retirement);
    let ruin_age = run_decumulation(
        &inputs,
        monthly_rate,
        balance_at_retirement,
        monthly_withdrawal,
        &mut series,
    );
    let goal = evaluate_goal(&inputs, balance_at_retirement);

    ProjectionResult {
        years_to_retirement: inputs.years_to_retirement(),
        monthly_contribution,
        real_annual_rate: inputs.real_annual_rate,
        monthly_rate,
        balance_at_retirement,
        monthly_withdrawal,
        sustainable_monthly_spend: monthly_withdrawal,
        fire_target: goal.fire_target,
        wealth_target: goal.wealth_target,
        gap: goal.gap,
        goal_met: goal.goal_met,
        ruin_age,
        sustainable: ruin_age.is_none(),
        series,
    }
}

pub fn monthly_rate(real_annual_rate: f64) -> f64 {
    (1.0 + real_annual_rate).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
}

pub fn closed_form_future_value(principal: f64, contribution: f64, rate: f64, months: u32) -> f64 {
    let n = months as f64;
    if rate == 0.0 {
        return principal + contribution * n;
    }
    // (1+r)^n - 1 via expm1/ln_1p keeps precision for rates near zero.
    let growth_minus_one = (n * rate.ln_1p()).exp_m1();
    principal * (1.0 + growth_minus_one) + contribution * growth_minus_one / rate
}

fn normalize(input: &ProjectionInput) -> NormalizedInput {
    let current_age = input.current_age.min(MAX_AGE);
    let life_expectancy_age = input.life_expectancy_age.clamp(current_age, MAX_AGE);
    let retirement_age = input.retirement_age.clamp(current_age, MAX_AGE);

    let real_annual_rate = finite_or_zero(input.nominal_return) - finite_or_zero(input.inflation);
    let real_annual_rate = if real_annual_rate.is_finite() {
        real_annual_rate.max(REAL_RATE_FLOOR)
    } else {
        0.0
    };

    NormalizedInput {
        monthly_income: non_negative(input.monthly_income),
        invested_today: non_negative(input.invested_today),
        contribution_rate: finite_or_zero(input.contribution_rate).clamp(0.0, 1.0),
        current_age,
        retirement_age,
        life_expectancy_age,
        real_annual_rate,
        monthly_spend_target: non_negative(input.monthly_spend_target),
        wealth_goal: non_negative(input.wealth_goal),
        withdrawal_policy: input.withdrawal_policy,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

fn saturate(value: f64) -> f64 {
    value.min(f64::MAX)
}

fn run_accumulation(
    inputs: &NormalizedInput,
    monthly_rate: f64,
    monthly_contribution: f64,
    series: &mut Vec<SeriesPoint>,
) -> f64 {
    let mut balance = inputs.invested_today;
    series.push(SeriesPoint {
        age: inputs.current_age,
        balance,
        phase: Phase::Accumulation,
    });

    // Retiring after life expectancy still compounds the full horizon, but
    // the series never runs past life expectancy.
    for year in 1..=inputs.years_to_retirement() {
        for _ in 0..MONTHS_PER_YEAR {
            balance =
                saturate((balance * (1.0 + monthly_rate) + monthly_contribution).max(0.0));
        }
        let age = inputs.current_age + year;
        if age <= inputs.life_expectancy_age {
            series.push(SeriesPoint {
                age,
                balance,
                phase: Phase::Accumulation,
            });
        }
    }

    balance
}

fn monthly_withdrawal(inputs: &NormalizedInput, balance_at_retirement: f64) -> f64 {
    match inputs.withdrawal_policy {
        WithdrawalPolicy::FixedRate => {
            balance_at_retirement * SAFE_WITHDRAWAL_RATE / MONTHS_PER_YEAR as f64
        }
        WithdrawalPolicy::FixedSpend => inputs.monthly_spend_target,
    }
}

fn run_decumulation(
    inputs: &NormalizedInput,
    monthly_rate: f64,
    balance_at_retirement: f64,
    monthly_withdrawal: f64,
    series: &mut Vec<SeriesPoint>,
) -> Option<u32> {
    let mut balance = balance_at_retirement;

    for age in (inputs.retirement_age + 1)..=inputs.life_expectancy_age {
        let mut ruined = false;
        for _ in 0..MONTHS_PER_YEAR {
            balance = saturate(balance * (1.0 + monthly_rate) - monthly_withdrawal);
            if balance <= 0.0 {
                balance = 0.0;
                ruined = true;
                break;
            }
        }

        series.push(SeriesPoint {
            age,
            balance,
            phase: Phase::Decumulation,
        });
        if ruined {
            return Some(age);
        }
    }

    None
}

fn evaluate_goal(inputs: &NormalizedInput, balance_at_retirement: f64) -> GoalEvaluation {
    let fire_target =
        saturate(inputs.monthly_spend_target * MONTHS_PER_YEAR as f64 / SAFE_WITHDRAWAL_RATE);
    let wealth_target = if inputs.wealth_goal > 0.0 {
        inputs.wealth_goal
    } else {
        fire_target
    };
    let gap = balance_at_retirement - wealth_target;

    GoalEvaluation {
        fire_target,
        wealth_target,
        gap,
        goal_met: gap >= 0.0,
    }
}
