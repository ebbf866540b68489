use super::normalize::ensure_required;
use super::payout::{AmortizationConfig, amortize_payouts};
use super::types::{CalculatorInputs, CalculatorResult, InsufficientInput};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPacing {
    // after the daily drawdown cap, for the evaluation stage
    pub risk_per_day: f64,
    pub risk_per_trade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseEconomics {
    pub rr: f64,
    pub cost_personal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationEconomics {
    pub max_sl_trades: f64,
    pub hedge_rate_per_dd: f64,
    pub hedge_profit_per_sl: f64,
    pub fail_gross_personal: f64,
    pub fail_net: f64,
    pub phase1: PhaseEconomics,
    pub phase2: Option<PhaseEconomics>,
    pub total_cost_personal: f64,
    pub cost_to_funded: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundedEconomics {
    pub max_sl_trades: f64,
    pub hedge_rate_per_dd: f64,
    pub hedge_profit_per_sl: f64,
    pub fail_gross_personal: f64,
    pub fail_net: f64,
    pub payout_amount: f64,
    pub rr_per_payout: f64,
    pub hedge_cost_per_payout: f64,
}

pub fn evaluation_risk_pacing(inputs: &CalculatorInputs) -> RiskPacing {
    let risk_per_day = inputs.risk_per_day_eval.min(inputs.daily_drawdown);
    RiskPacing {
        risk_per_day,
        risk_per_trade: guarded_div(risk_per_day, inputs.trades_per_day_eval),
    }
}

pub fn funded_risk_pacing(inputs: &CalculatorInputs) -> RiskPacing {
    RiskPacing {
        risk_per_day: inputs.risk_per_day_funded,
        risk_per_trade: guarded_div(inputs.risk_per_day_funded, inputs.trades_per_day_funded),
    }
}

/// Whole number of full stop-loss trades that fit in `max_drawdown`.
pub fn max_loss_trades(max_drawdown: f64, risk_per_trade: f64) -> f64 {
    if !risk_per_trade.is_finite() || risk_per_trade <= 0.0 || !max_drawdown.is_finite() {
        return 0.0;
    }
    saturate((max_drawdown.max(0.0) / risk_per_trade).floor())
}

pub fn evaluation_economics(inputs: &CalculatorInputs, pacing: RiskPacing) -> EvaluationEconomics {
    let max_sl_trades = max_loss_trades(inputs.max_drawdown, pacing.risk_per_trade);
    let hedge_rate_per_dd = guarded_div(
        inputs.eval_cost + inputs.fail_eval_profit,
        inputs.max_drawdown,
    );
    let hedge_profit_per_sl = saturate(hedge_rate_per_dd * pacing.risk_per_trade);
    let fail_gross_personal = saturate(hedge_profit_per_sl * max_sl_trades);

    let phase1 = phase_economics(inputs.phase1_target, pacing, hedge_profit_per_sl);
    let phase2 = inputs
        .phase2_target
        .map(|target| phase_economics(target, pacing, hedge_profit_per_sl));
    let total_cost_personal =
        saturate(phase1.cost_personal + phase2.map_or(0.0, |phase| phase.cost_personal));

    EvaluationEconomics {
        max_sl_trades,
        hedge_rate_per_dd,
        hedge_profit_per_sl,
        fail_gross_personal,
        fail_net: saturate(fail_gross_personal - inputs.eval_cost),
        phase1,
        phase2,
        total_cost_personal,
        cost_to_funded: saturate(total_cost_personal + inputs.eval_cost),
    }
}

pub fn funded_economics(
    inputs: &CalculatorInputs,
    pacing: RiskPacing,
    cost_to_funded: f64,
) -> FundedEconomics {
    let max_sl_trades = max_loss_trades(inputs.max_drawdown, pacing.risk_per_trade);
    let hedge_rate_per_dd = guarded_div(
        cost_to_funded + inputs.fail_funded_profit,
        inputs.max_drawdown,
    );
    let hedge_profit_per_sl = saturate(hedge_rate_per_dd * pacing.risk_per_trade);
    let fail_gross_personal = saturate(hedge_profit_per_sl * max_sl_trades);

    let payout_amount = saturate(
        inputs.account_size * (inputs.payout_target / 100.0) * (inputs.funded_split / 100.0),
    );
    let rr_per_payout = guarded_div(inputs.payout_target, pacing.risk_per_trade);

    FundedEconomics {
        max_sl_trades,
        hedge_rate_per_dd,
        hedge_profit_per_sl,
        fail_gross_personal,
        fail_net: saturate(fail_gross_personal - cost_to_funded),
        payout_amount,
        rr_per_payout,
        hedge_cost_per_payout: saturate(hedge_profit_per_sl * rr_per_payout),
    }
}

pub fn calculate(inputs: &CalculatorInputs) -> Result<CalculatorResult, InsufficientInput> {
    ensure_required(inputs)?;

    let eval_pacing = evaluation_risk_pacing(inputs);
    let evaluation = evaluation_economics(inputs, eval_pacing);

    let funded_pacing = funded_risk_pacing(inputs);
    let funded = funded_economics(inputs, funded_pacing, evaluation.cost_to_funded);

    let plan = amortize_payouts(AmortizationConfig {
        initial_carried_cost: evaluation.cost_to_funded,
        payout_amount: funded.payout_amount,
        hedge_cost_per_payout: funded.hedge_cost_per_payout,
        funded_fail_gross: funded.fail_gross_personal,
    });
    let first_profitable_payout = plan.first_profitable_payout();

    Ok(CalculatorResult {
        inputs: inputs.clone(),

        risk_per_day_eval_capped: eval_pacing.risk_per_day,
        risk_per_trade_eval: eval_pacing.risk_per_trade,
        max_eval_sl_trades: evaluation.max_sl_trades,
        eval_hedge_rate_per_dd: evaluation.hedge_rate_per_dd,
        eval_hedge_profit_per_sl: evaluation.hedge_profit_per_sl,
        eval_fail_gross_personal: evaluation.fail_gross_personal,
        eval_fail_net: evaluation.fail_net,
        phase1_rr: evaluation.phase1.rr,
        phase1_cost_personal: evaluation.phase1.cost_personal,
        phase2_rr: evaluation.phase2.map(|phase| phase.rr),
        phase2_cost_personal: evaluation.phase2.map(|phase| phase.cost_personal),
        total_eval_cost_personal: evaluation.total_cost_personal,
        cost_to_funded: evaluation.cost_to_funded,

        risk_per_trade_funded: funded_pacing.risk_per_trade,
        max_funded_sl_trades: funded.max_sl_trades,
        funded_hedge_rate_per_dd: funded.hedge_rate_per_dd,
        funded_hedge_profit_per_sl: funded.hedge_profit_per_sl,
        funded_fail_gross_personal: funded.fail_gross_personal,
        funded_fail_net: funded.fail_net,
        payout_amount: funded.payout_amount,
        rr_per_payout: funded.rr_per_payout,
        hedge_cost_per_payout: funded.hedge_cost_per_payout,

        payout_scenarios: plan.scenarios,
        payout_plan_converged: plan.converged,
        first_profitable_payout,
    })
}

// an N·R win on the prop side costs N·R on the hedge side
fn phase_economics(target: f64, pacing: RiskPacing, hedge_profit_per_sl: f64) -> PhaseEconomics {
    let rr = guarded_div(target, pacing.risk_per_trade);
    PhaseEconomics {
        rr,
        cost_personal: saturate(hedge_profit_per_sl * rr),
    }
}

fn guarded_div(numerator: f64, denominator: f64) -> f64 {
    if !denominator.is_finite() || denominator <= 0.0 {
        return 0.0;
    }
    saturate(numerator / denominator)
}

/// Clamps overflow to the largest finite magnitude; NaN becomes 0.
pub(super) fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}
