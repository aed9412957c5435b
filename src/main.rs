use clap::Parser;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use leapwise::api::{AppState, run_http_server};
use leapwise::cli::build_report;
use leapwise::config::{AppConfig, Command};
use leapwise::tax::estimator_from_config;

fn init_tracing(config: &AppConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "leapwise=info".into());

    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let config = AppConfig::parse();
    init_tracing(&config);

    match &config.command {
        Command::Serve(args) => {
            let state = AppState::from_config(&config);
            if let Err(e) = run_http_server(state, args.port).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        Command::Plan(args) => {
            let tax = estimator_from_config(&config.tax_api());
            let report = match build_report(args, tax.as_ref(), &config.limits()).await {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Failed to render plan: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
