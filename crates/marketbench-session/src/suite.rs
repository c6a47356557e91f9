//! An ordered negative suite for one actor, and its report.
//!
//! The suite records every case verdict and keeps going after ordinary
//! failures. A fatal error (no entropy for forged tokens) stops the run and
//! is returned to the caller instead of a report.

use rand_core::{OsRng, RngCore};
use reqwest::StatusCode;
use serde::Serialize;

use crate::case::NegativeCase;
use crate::error::CaseError;
use crate::request::Operation;
use crate::verifier::NegativeCaseVerifier;

/// Error message for buying one's own listing.
pub const SELF_PURCHASE_ERR_MSG: &str = "自分の商品は買えません";

/// Valid listing fields that sell cases start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTemplate {
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
}

impl Default for ListingTemplate {
    fn default() -> Self {
        Self {
            name: "negative-case listing".into(),
            price: 1_000,
            description: "listing that must never be created".into(),
            category_id: 1,
        }
    }
}

/// Inputs for one actor's negative suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativeSuite {
    pub account_name: String,
    pub wrong_password: String,
    pub listing: ListingTemplate,
    pub out_of_range_prices: Vec<i64>,
    /// Item listed by another actor: target of buy/ship cases.
    pub foreign_item_id: Option<i64>,
    /// Item listed by this actor: target of the self-purchase case.
    pub own_item_id: Option<i64>,
    pub payment_token: String,
}

impl NegativeSuite {
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            wrong_password: "wrong-password".into(),
            listing: ListingTemplate::default(),
            out_of_range_prices: vec![99, 1_000_001],
            foreign_item_id: None,
            own_item_id: None,
            payment_token: "card-token-for-negative-cases".into(),
        }
    }

    /// Names of every case this suite can run, in order.
    pub fn case_names() -> &'static [&'static str] {
        &[
            "login_with_wrong_password",
            "sell_with_wrong_csrf_token",
            "sell_with_wrong_price",
            "buy_with_wrong_csrf_token",
            "buy_with_failed",
            "ship_with_wrong_csrf_token",
            "ship_with_wrong_seller",
        ]
    }

    /// Build the suite's cases. Valid-token cases need `csrf_token`; when it
    /// is `None` they are returned as immediate failures.
    pub fn build(
        &self,
        csrf_token: Option<&str>,
    ) -> Result<Vec<Result<NegativeCase, CaseError>>, CaseError> {
        self.build_from(&mut OsRng, csrf_token)
    }

    /// [`Self::build`] with forged tokens drawn from `rng`.
    pub fn build_from<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        csrf_token: Option<&str>,
    ) -> Result<Vec<Result<NegativeCase, CaseError>>, CaseError> {
        let l = &self.listing;
        let mut cases = vec![
            Ok(NegativeCase::login_with_wrong_password(
                &self.account_name,
                &self.wrong_password,
            )),
            Ok(NegativeCase::sell_with_wrong_csrf_token_from(
                rng,
                &l.name,
                l.price,
                &l.description,
                l.category_id,
            )?),
        ];

        for &price in &self.out_of_range_prices {
            cases.push(with_token(csrf_token, Operation::Sell, |t| {
                NegativeCase::sell_with_wrong_price(
                    t,
                    &l.name,
                    price,
                    &l.description,
                    l.category_id,
                )
            }));
        }

        if let Some(item_id) = self.foreign_item_id {
            cases.push(Ok(NegativeCase::buy_with_wrong_csrf_token_from(
                rng,
                item_id,
                &self.payment_token,
            )?));
            cases.push(Ok(NegativeCase::ship_with_wrong_csrf_token_from(rng, item_id)?));
            cases.push(with_token(csrf_token, Operation::Ship, |t| {
                NegativeCase::ship_with_wrong_seller(t, item_id)
            }));
        }

        if let Some(item_id) = self.own_item_id {
            cases.push(with_token(csrf_token, Operation::Buy, |t| {
                NegativeCase::buy_with_failed(
                    t,
                    item_id,
                    &self.payment_token,
                    StatusCode::FORBIDDEN,
                    SELF_PURCHASE_ERR_MSG,
                )
            }));
        }

        Ok(cases)
    }

    /// Run every case through `verifier` and collect the verdicts.
    pub async fn run(&self, verifier: &NegativeCaseVerifier<'_>) -> Result<SuiteReport, CaseError> {
        self.run_from(verifier, &mut OsRng).await
    }

    /// [`Self::run`] with forged tokens drawn from `rng`.
    ///
    /// Every case is built before the first request is sent, so an entropy
    /// failure aborts the run with nothing on the wire.
    pub async fn run_from<R: RngCore + ?Sized>(
        &self,
        verifier: &NegativeCaseVerifier<'_>,
        rng: &mut R,
    ) -> Result<SuiteReport, CaseError> {
        let session = verifier.session();
        let cases = match self.build_from(rng, session.csrf_token()) {
            Ok(cases) => cases,
            Err(e) => {
                tracing::error!("aborting suite before any request: {e}");
                return Err(e);
            }
        };
        let mut report = SuiteReport::new(session.app_url().as_str());

        for case in cases {
            let outcome = match case {
                Ok(case) => match verifier.run(&case).await {
                    Err(e) if e.is_fatal() => {
                        tracing::error!(case = case.name, "aborting suite: {e}");
                        return Err(e);
                    }
                    result => CaseOutcome::from_result(case.name, case.operation(), &result),
                },
                Err(e) => CaseOutcome::from_result(missing_token_name(&e), e.operation(), &Err(e)),
            };
            report.push(outcome);
        }

        tracing::info!(
            passed = report.passed,
            failed = report.failed,
            "negative suite finished"
        );
        Ok(report)
    }
}

fn with_token(
    csrf_token: Option<&str>,
    operation: Operation,
    build: impl FnOnce(&str) -> NegativeCase,
) -> Result<NegativeCase, CaseError> {
    csrf_token
        .map(build)
        .ok_or(CaseError::MissingCsrfToken { operation })
}

fn missing_token_name(err: &CaseError) -> &'static str {
    match err.operation() {
        Operation::Sell => "sell_with_wrong_price",
        Operation::Ship => "ship_with_wrong_seller",
        Operation::Buy => "buy_with_failed",
        Operation::Login => "login_with_wrong_password",
    }
}

/// Verdict of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub name: &'static str,
    pub operation: Operation,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CaseOutcome {
    pub fn from_result(
        name: &'static str,
        operation: Operation,
        result: &Result<(), CaseError>,
    ) -> Self {
        match result {
            Ok(()) => Self {
                name,
                operation,
                passed: true,
                kind: None,
                report: None,
                detail: None,
            },
            Err(e) => Self {
                name,
                operation,
                passed: false,
                kind: Some(e.kind()),
                report: Some(e.report()),
                detail: Some(e.to_string()),
            },
        }
    }
}

/// Verdicts of a whole suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub target: String,
    pub outcomes: Vec<CaseOutcome>,
    pub passed: usize,
    pub failed: usize,
}

impl SuiteReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            outcomes: Vec::new(),
            passed: 0,
            failed: 0,
        }
    }

    pub fn push(&mut self, outcome: CaseOutcome) {
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Every case confirmed its rejection.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Report lines of the failed cases, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}
