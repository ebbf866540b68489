use std::fmt::Write as _;
use std::net::SocketAddr;
use std::process::ExitCode;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    Advisory, CalculatorResult, EvaluationType, InsufficientInput, RawInputs, advisories,
    calculate, normalize,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliEvaluationType {
    OneStep,
    TwoStep,
}

impl From<CliEvaluationType> for EvaluationType {
    fn from(value: CliEvaluationType) -> Self {
        match value {
            CliEvaluationType::OneStep => EvaluationType::OneStep,
            CliEvaluationType::TwoStep => EvaluationType::TwoStep,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    evaluation_type: Option<EvaluationType>,
    account_size: Option<f64>,
    eval_cost: Option<f64>,
    phase1_target: Option<f64>,
    phase2_target: Option<f64>,
    daily_drawdown: Option<f64>,
    max_drawdown: Option<f64>,
    risk_per_day_eval: Option<f64>,
    trades_per_day_eval: Option<f64>,
    fail_eval_profit: Option<f64>,
    funded_split: Option<f64>,
    fail_funded_profit: Option<f64>,
    payout_target: Option<f64>,
    risk_per_day_funded: Option<f64>,
    trades_per_day_funded: Option<f64>,
}

impl From<CalculatePayload> for RawInputs {
    fn from(payload: CalculatePayload) -> Self {
        RawInputs {
            evaluation_type: payload.evaluation_type,
            account_size: payload.account_size,
            eval_cost: payload.eval_cost,
            phase1_target: payload.phase1_target,
            phase2_target: payload.phase2_target,
            daily_drawdown: payload.daily_drawdown,
            max_drawdown: payload.max_drawdown,
            risk_per_day_eval: payload.risk_per_day_eval,
            trades_per_day_eval: payload.trades_per_day_eval,
            fail_eval_profit: payload.fail_eval_profit,
            funded_split: payload.funded_split,
            fail_funded_profit: payload.fail_funded_profit,
            payout_target: payload.payout_target,
            risk_per_day_funded: payload.risk_per_day_funded,
            trades_per_day_funded: payload.trades_per_day_funded,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "prophedge calc",
    about = "Hedged prop-firm evaluation economics: failure payoff, pass cost and payout amortization"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliEvaluationType::OneStep)]
    evaluation_type: CliEvaluationType,
    #[arg(long, help = "Prop account size in account currency")]
    account_size: f64,
    #[arg(long, default_value_t = 0.0, help = "Evaluation fee")]
    eval_cost: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Phase 1 profit target in percent of account"
    )]
    phase1_target: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Phase 2 profit target in percent, used by two-step evaluations only"
    )]
    phase2_target: f64,
    #[arg(long, help = "Daily drawdown limit in percent of account")]
    daily_drawdown: f64,
    #[arg(long, help = "Max drawdown limit in percent of account")]
    max_drawdown: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Planned evaluation risk per day in percent; capped to the daily drawdown"
    )]
    risk_per_day_eval: f64,
    #[arg(long, default_value_t = 3.0)]
    trades_per_day_eval: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Net profit wanted if the evaluation fails"
    )]
    fail_eval_profit: f64,
    #[arg(
        long,
        default_value_t = 80.0,
        help = "Trader share of funded profits in percent"
    )]
    funded_split: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Net profit wanted if the funded account fails before a payout"
    )]
    fail_funded_profit: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Payout target in percent of account"
    )]
    payout_target: f64,
    #[arg(long, default_value_t = 1.0, help = "Funded risk per day in percent")]
    risk_per_day_funded: f64,
    #[arg(long, default_value_t = 3.0)]
    trades_per_day_funded: f64,
    #[arg(long, help = "Print the JSON body served by /api/calculate")]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    result: CalculatorResult,
    advisories: Vec<AdvisoryResponse>,
}

#[derive(Debug, Serialize)]
struct AdvisoryResponse {
    kind: Advisory,
    message: &'static str,
}

impl From<Advisory> for AdvisoryResponse {
    fn from(kind: Advisory) -> Self {
        AdvisoryResponse {
            kind,
            message: kind.message(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<&'static str>,
}

impl From<&InsufficientInput> for ErrorResponse {
    fn from(err: &InsufficientInput) -> Self {
        ErrorResponse {
            error: err.to_string(),
            missing: err.missing.iter().map(|f| f.as_str()).collect(),
        }
    }
}

fn build_raw_inputs(cli: &Cli) -> RawInputs {
    RawInputs {
        evaluation_type: Some(cli.evaluation_type.into()),
        account_size: Some(cli.account_size),
        eval_cost: Some(cli.eval_cost),
        phase1_target: Some(cli.phase1_target),
        phase2_target: Some(cli.phase2_target),
        daily_drawdown: Some(cli.daily_drawdown),
        max_drawdown: Some(cli.max_drawdown),
        risk_per_day_eval: Some(cli.risk_per_day_eval),
        trades_per_day_eval: Some(cli.trades_per_day_eval),
        fail_eval_profit: Some(cli.fail_eval_profit),
        funded_split: Some(cli.funded_split),
        fail_funded_profit: Some(cli.fail_funded_profit),
        payout_target: Some(cli.payout_target),
        risk_per_day_funded: Some(cli.risk_per_day_funded),
        trades_per_day_funded: Some(cli.trades_per_day_funded),
    }
}

fn build_calculate_response(raw: &RawInputs) -> Result<CalculateResponse, InsufficientInput> {
    let inputs = normalize(raw)?;
    let result = calculate(&inputs)?;
    debug!(
        payout_cycles = result.payout_scenarios.len(),
        converged = result.payout_plan_converged,
        cost_to_funded = result.cost_to_funded,
        "hedge plan calculated"
    );
    Ok(CalculateResponse {
        result,
        advisories: advisories(&inputs).into_iter().map(Into::into).collect(),
    })
}

// `args` starts with the program name
pub fn run_calc<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let raw = build_raw_inputs(&cli);

    let response = match build_calculate_response(&raw) {
        Ok(response) => response,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        match render_text(&response) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("Failed to render result: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn render_text(response: &CalculateResponse) -> Result<String, std::fmt::Error> {
    let r = &response.result;
    let mut out = String::new();

    writeln!(out, "Evaluation")?;
    writeln!(
        out,
        "  risk/trade {:.3}% ({:.2}%/day), absorbable SL trades {}",
        r.risk_per_trade_eval, r.risk_per_day_eval_capped, r.max_eval_sl_trades
    )?;
    writeln!(
        out,
        "  hedge profit per SL {:.2}, if failed: gross {:.2} / net {:.2}",
        r.eval_hedge_profit_per_sl, r.eval_fail_gross_personal, r.eval_fail_net
    )?;
    writeln!(
        out,
        "  phase 1: {:.1}R costs {:.2}",
        r.phase1_rr, r.phase1_cost_personal
    )?;
    if let (Some(rr), Some(cost)) = (r.phase2_rr, r.phase2_cost_personal) {
        writeln!(out, "  phase 2: {rr:.1}R costs {cost:.2}")?;
    }
    writeln!(out, "  cost to funded {:.2}", r.cost_to_funded)?;

    writeln!(out, "Funded")?;
    writeln!(
        out,
        "  risk/trade {:.3}%, absorbable SL trades {}",
        r.risk_per_trade_funded, r.max_funded_sl_trades
    )?;
    writeln!(
        out,
        "  hedge profit per SL {:.2}, if failed: gross {:.2} / net {:.2}",
        r.funded_hedge_profit_per_sl, r.funded_fail_gross_personal, r.funded_fail_net
    )?;
    writeln!(
        out,
        "  payout {:.2} needs {:.1}R, hedge cost per payout {:.2}",
        r.payout_amount, r.rr_per_payout, r.hedge_cost_per_payout
    )?;

    writeln!(out, "Payouts")?;
    for s in &r.payout_scenarios {
        writeln!(
            out,
            "  #{:<2} cost {:>12.2}  net after payout {:>12.2}  net if failed {:>12.2}",
            s.payout_number, s.total_cost, s.net_after_payout, s.net_if_fail_after
        )?;
    }
    match r.first_profitable_payout {
        Some(n) => writeln!(out, "  break-even at payout #{n}")?,
        None => writeln!(out, "  no break-even within {} payouts", r.payout_scenarios.len())?,
    }

    for advisory in &response.advisories {
        writeln!(out, "note: {}", advisory.message)?;
    }
    Ok(out)
}

pub fn build_router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("prophedge HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, build_router()).await
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            ok: true,
            service: "prophedge",
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let raw = RawInputs::from(payload);
    match build_calculate_response(&raw) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            info!(error = %err, "rejected calculation");
            json_response(StatusCode::UNPROCESSABLE_ENTITY, ErrorResponse::from(&err))
        }
    }
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
            missing: Vec::new(),
        },
    )
}
