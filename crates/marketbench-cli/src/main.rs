//! # marketbench CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use marketbench_cli::verify::{run_verify, VerifyArgs};
use marketbench_cli::EXIT_ABORTED;
use marketbench_session::token::{secure_random_hex, FORGED_TOKEN_BYTES};
use marketbench_session::NegativeSuite;

/// Negative-path conformance verifier for the marketplace API.
///
/// Sends deliberately invalid requests (wrong credentials, forged
/// anti-forgery tokens, out-of-range prices, unauthorized actors) and checks
/// that each is rejected with the exact expected status and message.
#[derive(Parser, Debug)]
#[command(name = "marketbench", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in as one account and run the negative suite against a target.
    Verify(VerifyArgs),

    /// List the names of the suite's cases.
    Cases,

    /// Print a forged anti-forgery token.
    Token {
        /// Random bytes before hex encoding.
        #[arg(long, default_value_t = FORGED_TOKEN_BYTES as u16)]
        bytes: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Verify(args) => run_verify(&args).await,
        Commands::Cases => {
            for name in NegativeSuite::case_names() {
                println!("{name}");
            }
            Ok(0)
        }
        Commands::Token { bytes } => secure_random_hex(usize::from(bytes))
            .map(|token| {
                println!("{token}");
                0
            })
            .map_err(anyhow::Error::from),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ABORTED)
        }
    }
}
