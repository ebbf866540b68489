use std::env;
use std::process::ExitCode;

use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = prophedge::api::run_http_server(port).await {
                error!("Server error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Some("calc") => prophedge::api::run_calc(raw_args.into_iter().skip(1)),
        _ => {
            eprintln!("Usage: prophedge serve [port] | prophedge calc --account-size <N> ...");
            ExitCode::FAILURE
        }
    }
}
