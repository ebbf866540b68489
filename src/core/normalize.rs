use super::types::{
    Advisory, CalculatorInputs, EvaluationType, InsufficientInput, RawInputs, RequiredField,
};

pub fn normalize(raw: &RawInputs) -> Result<CalculatorInputs, InsufficientInput> {
    let evaluation_type = raw.evaluation_type.unwrap_or_default();
    let phase2_target = match evaluation_type {
        EvaluationType::TwoStep => Some(non_negative(raw.phase2_target)),
        EvaluationType::OneStep => None,
    };

    let inputs = CalculatorInputs {
        evaluation_type,
        account_size: non_negative(raw.account_size),
        eval_cost: non_negative(raw.eval_cost),
        phase1_target: non_negative(raw.phase1_target),
        phase2_target,
        daily_drawdown: non_negative(raw.daily_drawdown),
        max_drawdown: non_negative(raw.max_drawdown),
        risk_per_day_eval: non_negative(raw.risk_per_day_eval),
        trades_per_day_eval: trade_count(raw.trades_per_day_eval),
        fail_eval_profit: non_negative(raw.fail_eval_profit),
        funded_split: non_negative(raw.funded_split).min(100.0),
        fail_funded_profit: non_negative(raw.fail_funded_profit),
        payout_target: non_negative(raw.payout_target),
        risk_per_day_funded: non_negative(raw.risk_per_day_funded),
        trades_per_day_funded: trade_count(raw.trades_per_day_funded),
    };

    ensure_required(&inputs)?;
    Ok(inputs)
}

pub fn ensure_required(inputs: &CalculatorInputs) -> Result<(), InsufficientInput> {
    let missing: Vec<RequiredField> = [
        (RequiredField::AccountSize, inputs.account_size),
        (RequiredField::DailyDrawdown, inputs.daily_drawdown),
        (RequiredField::MaxDrawdown, inputs.max_drawdown),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_finite() || *value <= 0.0)
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(InsufficientInput { missing })
    }
}

pub fn advisories(inputs: &CalculatorInputs) -> Vec<Advisory> {
    let mut notes = Vec::new();
    if inputs.daily_drawdown > inputs.max_drawdown {
        notes.push(Advisory::DailyDrawdownExceedsMax);
    }
    if inputs.risk_per_day_eval > inputs.daily_drawdown {
        notes.push(Advisory::EvalRiskPerDayCapped);
    }
    notes
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.max(0.0),
        _ => 0.0,
    }
}

fn trade_count(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.max(1.0),
        _ => 1.0,
    }
}
