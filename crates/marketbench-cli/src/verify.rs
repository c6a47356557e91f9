//! # Verify — run the negative suite against a target
//!
//! Logs in with the given account, fetches its anti-forgery token and runs
//! every case the provided inputs allow. Item-targeting cases only run when
//! the matching item id is given.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rand_core::{OsRng, RngCore};

use marketbench_session::suite::ListingTemplate;
use marketbench_session::{
    Credentials, NegativeCaseVerifier, NegativeSuite, Session, SuiteReport, TargetConfig,
};

use crate::{EXIT_ABORTED, EXIT_CASE_FAILURES, EXIT_OK};

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Verify subcommand arguments.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Marketplace URL. Defaults to `MARKETBENCH_TARGET_URL` or http://127.0.0.1:8000.
    #[arg(long)]
    pub target: Option<String>,

    /// Account the suite acts as.
    #[arg(long)]
    pub account: String,

    /// The account's real password, used to obtain a valid anti-forgery token.
    #[arg(long)]
    pub password: String,

    /// Password sent by the wrong-password login case.
    #[arg(long, default_value = "wrong-password")]
    pub wrong_password: String,

    /// Out-of-range prices for the wrong-price case (repeatable).
    #[arg(long = "price", allow_negative_numbers = true, default_values_t = [99, 1_000_001])]
    pub prices: Vec<i64>,

    /// Category id used by sell cases.
    #[arg(long, default_value_t = 1)]
    pub category_id: i64,

    /// Item on sale by another account: target of buy and ship cases.
    #[arg(long)]
    pub foreign_item_id: Option<i64>,

    /// Item on sale by this account: target of the self-purchase case.
    #[arg(long)]
    pub own_item_id: Option<i64>,

    /// Payment card token sent with buy cases.
    #[arg(long, default_value = "card-token-for-negative-cases")]
    pub payment_token: String,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl VerifyArgs {
    /// Suite inputs derived from the arguments.
    pub fn suite(&self) -> NegativeSuite {
        let mut suite = NegativeSuite::new(&self.account);
        suite.wrong_password = self.wrong_password.clone();
        suite.out_of_range_prices = self.prices.clone();
        suite.listing = ListingTemplate {
            category_id: self.category_id,
            ..ListingTemplate::default()
        };
        suite.foreign_item_id = self.foreign_item_id;
        suite.own_item_id = self.own_item_id;
        suite.payment_token = self.payment_token.clone();
        suite
    }

    fn target_config(&self) -> Result<TargetConfig> {
        let env = TargetConfig::from_env().context("invalid target configuration")?;
        self.apply_target(env)
    }

    /// `--target` replaces the URL of `base` and nothing else.
    fn apply_target(&self, base: TargetConfig) -> Result<TargetConfig> {
        match &self.target {
            Some(raw) => base.with_target(raw).context("invalid --target"),
            None => Ok(base),
        }
    }
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs) -> Result<u8> {
    run_verify_from(args, &mut OsRng).await
}

/// [`run_verify`] with forged tokens drawn from `rng`.
pub async fn run_verify_from<R: RngCore + ?Sized>(args: &VerifyArgs, rng: &mut R) -> Result<u8> {
    let config = args.target_config()?;
    tracing::info!(target = %config.app_url, account = %args.account, "starting negative suite");

    let mut session = Session::new(&config).context("failed to build HTTP session")?;
    session
        .bootstrap(&Credentials::new(&args.account, &args.password))
        .await
        .with_context(|| format!("could not log in as {}", args.account))?;

    let verifier = NegativeCaseVerifier::new(&session);
    let report = match args.suite().run_from(&verifier, rng).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("{}", e.report());
            tracing::error!("{e}");
            return Ok(EXIT_ABORTED);
        }
    };

    emit_report(&report, args.format, args.out.as_deref())?;

    Ok(if report.is_success() {
        EXIT_OK
    } else {
        EXIT_CASE_FAILURES
    })
}

/// Render `report` and write it to `out`, or stdout when `None`.
pub fn emit_report(report: &SuiteReport, format: OutputFormat, out: Option<&Path>) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize report")?
        }
    };
    match out {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Human-readable report: one line per case, then totals.
pub fn render_text(report: &SuiteReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "target: {}", report.target);
    for outcome in &report.outcomes {
        let verdict = if outcome.passed { "PASS" } else { "FAIL" };
        let _ = write!(out, "  {verdict}  {:<28} {}", outcome.name, outcome.operation);
        if let Some(line) = &outcome.report {
            let _ = write!(out, "  {line}");
        }
        out.push('\n');
    }
    let _ = write!(
        out,
        "passed: {}  failed: {}",
        report.passed, report.failed
    );
    out
}
