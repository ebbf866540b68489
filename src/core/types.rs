use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PAYOUT_SCENARIOS: usize = 10;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationType {
    #[default]
    #[serde(alias = "oneStep", alias = "one_step", alias = "1-step")]
    OneStep,
    #[serde(alias = "twoStep", alias = "two_step", alias = "2-step")]
    TwoStep,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInputs {
    pub evaluation_type: Option<EvaluationType>,
    pub account_size: Option<f64>,
    pub eval_cost: Option<f64>,
    pub phase1_target: Option<f64>,
    pub phase2_target: Option<f64>,
    pub daily_drawdown: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub risk_per_day_eval: Option<f64>,
    pub trades_per_day_eval: Option<f64>,
    pub fail_eval_profit: Option<f64>,
    pub funded_split: Option<f64>,
    pub fail_funded_profit: Option<f64>,
    pub payout_target: Option<f64>,
    pub risk_per_day_funded: Option<f64>,
    pub trades_per_day_funded: Option<f64>,
}

// percent fields are percent of account size (5.0 = 5%)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInputs {
    pub evaluation_type: EvaluationType,
    pub account_size: f64,
    pub eval_cost: f64,
    pub phase1_target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_target: Option<f64>,
    pub daily_drawdown: f64,
    pub max_drawdown: f64,
    pub risk_per_day_eval: f64,
    pub trades_per_day_eval: f64,
    pub fail_eval_profit: f64,
    pub funded_split: f64,
    pub fail_funded_profit: f64,
    pub payout_target: f64,
    pub risk_per_day_funded: f64,
    pub trades_per_day_funded: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    AccountSize,
    DailyDrawdown,
    MaxDrawdown,
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::AccountSize => "accountSize",
            RequiredField::DailyDrawdown => "dailyDrawdown",
            RequiredField::MaxDrawdown => "maxDrawdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("insufficient input: {} must be greater than zero", join_fields(.missing))]
pub struct InsufficientInput {
    pub missing: Vec<RequiredField>,
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutScenario {
    pub payout_number: u32,
    pub total_cost: f64,
    pub net_after_payout: f64,
    pub net_if_fail_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    #[serde(flatten)]
    pub inputs: CalculatorInputs,

    pub risk_per_day_eval_capped: f64,
    pub risk_per_trade_eval: f64,
    pub max_eval_sl_trades: f64,
    pub eval_hedge_rate_per_dd: f64,
    pub eval_hedge_profit_per_sl: f64,
    pub eval_fail_gross_personal: f64,
    pub eval_fail_net: f64,
    pub phase1_rr: f64,
    pub phase1_cost_personal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_rr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2_cost_personal: Option<f64>,
    pub total_eval_cost_personal: f64,
    pub cost_to_funded: f64,

    pub risk_per_trade_funded: f64,
    pub max_funded_sl_trades: f64,
    pub funded_hedge_rate_per_dd: f64,
    pub funded_hedge_profit_per_sl: f64,
    pub funded_fail_gross_personal: f64,
    pub funded_fail_net: f64,
    pub payout_amount: f64,
    pub rr_per_payout: f64,
    pub hedge_cost_per_payout: f64,

    pub payout_scenarios: Vec<PayoutScenario>,
    pub payout_plan_converged: bool,
    pub first_profitable_payout: Option<u32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Advisory {
    DailyDrawdownExceedsMax,
    EvalRiskPerDayCapped,
}

impl Advisory {
    pub fn message(self) -> &'static str {
        match self {
            Advisory::DailyDrawdownExceedsMax => {
                "Daily drawdown is larger than max drawdown; check the firm rules."
            }
            Advisory::EvalRiskPerDayCapped => {
                "Evaluation risk per day exceeds the daily drawdown and was capped to it."
            }
        }
    }
}
