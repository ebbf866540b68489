mod engine;
mod normalize;
mod payout;
mod types;

pub use engine::{
    EvaluationEconomics, FundedEconomics, PhaseEconomics, RiskPacing, calculate,
    evaluation_economics, evaluation_risk_pacing, funded_economics, funded_risk_pacing,
    max_loss_trades,
};
pub use normalize::{advisories, ensure_required, normalize};
pub use payout::{AmortizationConfig, PayoutPlan, amortize_payouts};
pub use types::{
    Advisory, CalculatorInputs, CalculatorResult, EvaluationType, InsufficientInput,
    MAX_PAYOUT_SCENARIOS, PayoutScenario, RawInputs, RequiredField,
};
