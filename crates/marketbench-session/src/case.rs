//! Negative case definitions.
//!
//! A [`NegativeCase`] pairs one faulty request with the oracle it must meet.
//! Builders that use a legitimate anti-forgery token take it as an explicit
//! argument; builders that forge one draw it from [`crate::token`].

use reqwest::StatusCode;

use crate::error::CaseError;
use crate::oracle::{
    ExpectedOutcome, MessageExpectation, FORBIDDEN_DIAGNOSTIC, FORBIDDEN_ERR_MSG,
    ITEM_PRICE_DIAGNOSTIC, ITEM_PRICE_ERR_MSG,
};
use crate::request::{
    price_in_bounds, BuyRequest, LoginRequest, Operation, OperationRequest, SellRequest,
    ShipRequest,
};
use rand_core::{OsRng, RngCore};

use crate::token::forged_csrf_token_from;

/// One self-contained negative-path check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativeCase {
    /// Stable case name, used in reports.
    pub name: &'static str,
    pub request: OperationRequest,
    pub expected: ExpectedOutcome,
}

fn forge<R: RngCore + ?Sized>(rng: &mut R, operation: Operation) -> Result<String, CaseError> {
    forged_csrf_token_from(rng).map_err(|source| CaseError::Entropy { operation, source })
}

impl NegativeCase {
    pub fn new(name: &'static str, request: OperationRequest, expected: ExpectedOutcome) -> Self {
        Self {
            name,
            request,
            expected,
        }
    }

    pub fn operation(&self) -> Operation {
        self.request.operation()
    }

    /// Login with a password that does not belong to `account_name`. Expects 401.
    pub fn login_with_wrong_password(account_name: &str, password: &str) -> Self {
        Self::new(
            "login_with_wrong_password",
            LoginRequest {
                account_name: account_name.to_string(),
                password: password.to_string(),
            }
            .into(),
            ExpectedOutcome::status_only(StatusCode::UNAUTHORIZED),
        )
    }

    /// Listing carrying a forged anti-forgery token. Expects 422.
    pub fn sell_with_wrong_csrf_token(
        name: &str,
        price: i64,
        description: &str,
        category_id: i64,
    ) -> Result<Self, CaseError> {
        Self::sell_with_wrong_csrf_token_from(&mut OsRng, name, price, description, category_id)
    }

    /// [`Self::sell_with_wrong_csrf_token`] with the token drawn from `rng`.
    pub fn sell_with_wrong_csrf_token_from<R: RngCore + ?Sized>(
        rng: &mut R,
        name: &str,
        price: i64,
        description: &str,
        category_id: i64,
    ) -> Result<Self, CaseError> {
        Ok(Self::new(
            "sell_with_wrong_csrf_token",
            SellRequest {
                csrf_token: forge(rng, Operation::Sell)?,
                name: name.to_string(),
                price,
                description: description.to_string(),
                category_id,
            }
            .into(),
            ExpectedOutcome::status_only(StatusCode::UNPROCESSABLE_ENTITY),
        ))
    }

    /// Listing with a valid token and a price outside [100, 1,000,000].
    /// Expects 400 with the price-bound message.
    pub fn sell_with_wrong_price(
        csrf_token: &str,
        name: &str,
        price: i64,
        description: &str,
        category_id: i64,
    ) -> Self {
        if price_in_bounds(price) {
            tracing::warn!(price, "sell_with_wrong_price built with an in-range price");
        }
        Self::new(
            "sell_with_wrong_price",
            SellRequest {
                csrf_token: csrf_token.to_string(),
                name: name.to_string(),
                price,
                description: description.to_string(),
                category_id,
            }
            .into(),
            ExpectedOutcome::with_message(
                StatusCode::BAD_REQUEST,
                MessageExpectation::exact_with(ITEM_PRICE_ERR_MSG, ITEM_PRICE_DIAGNOSTIC),
            ),
        )
    }

    /// Purchase carrying a forged anti-forgery token. Expects 422.
    pub fn buy_with_wrong_csrf_token(item_id: i64, payment_token: &str) -> Result<Self, CaseError> {
        Self::buy_with_wrong_csrf_token_from(&mut OsRng, item_id, payment_token)
    }

    pub fn buy_with_wrong_csrf_token_from<R: RngCore + ?Sized>(
        rng: &mut R,
        item_id: i64,
        payment_token: &str,
    ) -> Result<Self, CaseError> {
        Ok(Self::new(
            "buy_with_wrong_csrf_token",
            BuyRequest {
                csrf_token: forge(rng, Operation::Buy)?,
                item_id,
                token: payment_token.to_string(),
            }
            .into(),
            ExpectedOutcome::status_only(StatusCode::UNPROCESSABLE_ENTITY),
        ))
    }

    /// Well-formed purchase that a business rule must reject with
    /// `expected_status` and exactly `expected_msg`.
    pub fn buy_with_failed(
        csrf_token: &str,
        item_id: i64,
        payment_token: &str,
        expected_status: StatusCode,
        expected_msg: &str,
    ) -> Self {
        Self::new(
            "buy_with_failed",
            BuyRequest {
                csrf_token: csrf_token.to_string(),
                item_id,
                token: payment_token.to_string(),
            }
            .into(),
            ExpectedOutcome::with_message(expected_status, MessageExpectation::exact(expected_msg)),
        )
    }

    /// Shipment request carrying a forged anti-forgery token. Expects 422.
    pub fn ship_with_wrong_csrf_token(item_id: i64) -> Result<Self, CaseError> {
        Self::ship_with_wrong_csrf_token_from(&mut OsRng, item_id)
    }

    pub fn ship_with_wrong_csrf_token_from<R: RngCore + ?Sized>(
        rng: &mut R,
        item_id: i64,
    ) -> Result<Self, CaseError> {
        Ok(Self::new(
            "ship_with_wrong_csrf_token",
            ShipRequest {
                csrf_token: forge(rng, Operation::Ship)?,
                item_id,
            }
            .into(),
            ExpectedOutcome::status_only(StatusCode::UNPROCESSABLE_ENTITY),
        ))
    }

    /// Shipment request for an item the acting session did not list.
    ///
    /// `csrf_token` is the acting session's own valid token, so the only
    /// fault is the actor's identity. Expects 403 with the forbidden message.
    pub fn ship_with_wrong_seller(csrf_token: &str, item_id: i64) -> Self {
        Self::new(
            "ship_with_wrong_seller",
            ShipRequest {
                csrf_token: csrf_token.to_string(),
                item_id,
            }
            .into(),
            ExpectedOutcome::with_message(
                StatusCode::FORBIDDEN,
                MessageExpectation::exact_with(FORBIDDEN_ERR_MSG, FORBIDDEN_DIAGNOSTIC),
            ),
        )
    }
}
