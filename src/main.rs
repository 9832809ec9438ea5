//! OIDC gateway (v1)
//!
//! Loads the gateway configuration, validates it and hands it to the proxy
//! engine.
//!
//! # Architecture Overview
//!
//! ```text
//!   data.json ──▶ canonical ──┐
//!                             ├──▶ decode ──▶ Options ──▶ validation ──▶ ValidatedConfig
//!   --flags  ──▶ overlay   ──┘                               │                  │
//!                                                 violations ▼                  ▼
//!                                          "invalid configuration"     Handoff {config,
//!                                              (exit non-zero)           authorizer}
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use oidc_gateway::config::ConfigFlags;
use oidc_gateway::lifecycle;
use oidc_gateway::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "oidc-gateway")]
#[command(about = "OAuth2/OIDC authentication gateway", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = "data.json")]
    config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    flags: ConfigFlags,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&logging::default_directive(&cli.log_level));

    tracing::info!(config = %cli.config.display(), "oidc-gateway v0.1.0 starting");

    match lifecycle::prepare(&cli.config, &cli.flags) {
        Ok(handoff) => {
            tracing::info!(
                client_address_header = handoff
                    .config
                    .capabilities()
                    .client_address()
                    .parser()
                    .map(|parser| parser.header().as_str())
                    .unwrap_or("-"),
                "Ready for proxy engine"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
