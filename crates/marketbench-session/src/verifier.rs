//! Executes negative cases over a [`Session`].
//!
//! Every case runs the same sequence: encode the body, POST it, check the
//! status, decode the error envelope, check the message. Only the request
//! and the oracle vary, so a single executor ([`NegativeCaseVerifier::run`])
//! serves all of them.

use reqwest::StatusCode;

use crate::case::NegativeCase;
use crate::error::CaseError;
use crate::request::Operation;
use crate::session::Session;

/// Runs negative cases as the actor behind one session.
#[derive(Debug, Clone, Copy)]
pub struct NegativeCaseVerifier<'s> {
    session: &'s Session,
}

impl<'s> NegativeCaseVerifier<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    /// Send one case and check its response against the case's oracle.
    pub async fn run(&self, case: &NegativeCase) -> Result<(), CaseError> {
        let operation = case.operation();
        let body = case
            .request
            .to_body()
            .map_err(|source| CaseError::Encode { operation, source })?;

        tracing::debug!(
            case = case.name,
            %operation,
            expected = %case.expected.status,
            "sending negative case"
        );

        let resp = self
            .session
            .post_json(operation.path(), body)
            .await
            .map_err(|source| CaseError::Transport { operation, source })?;

        match case.expected.judge(operation, resp.status, &resp.body) {
            Ok(envelope) => {
                tracing::debug!(case = case.name, error = %envelope.error, "rejection confirmed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(case = case.name, "{e}");
                Err(e)
            }
        }
    }

    /// `POST /login` with a wrong password must be 401.
    pub async fn login_with_wrong_password(
        &self,
        account_name: &str,
        password: &str,
    ) -> Result<(), CaseError> {
        self.run(&NegativeCase::login_with_wrong_password(account_name, password))
            .await
    }

    /// `POST /sell` with a forged token must be 422.
    pub async fn sell_with_wrong_csrf_token(
        &self,
        name: &str,
        price: i64,
        description: &str,
        category_id: i64,
    ) -> Result<(), CaseError> {
        let case = NegativeCase::sell_with_wrong_csrf_token(name, price, description, category_id)?;
        self.run(&case).await
    }

    /// `POST /sell` with an out-of-range price must be 400 with the price message.
    pub async fn sell_with_wrong_price(
        &self,
        name: &str,
        price: i64,
        description: &str,
        category_id: i64,
    ) -> Result<(), CaseError> {
        let token = self.session.require_csrf_token(Operation::Sell)?;
        let case =
            NegativeCase::sell_with_wrong_price(token, name, price, description, category_id);
        self.run(&case).await
    }

    /// `POST /buy` with a forged token must be 422.
    pub async fn buy_with_wrong_csrf_token(
        &self,
        item_id: i64,
        payment_token: &str,
    ) -> Result<(), CaseError> {
        let case = NegativeCase::buy_with_wrong_csrf_token(item_id, payment_token)?;
        self.run(&case).await
    }

    /// `POST /buy` that a business rule must reject with the given status and message.
    pub async fn buy_with_failed(
        &self,
        item_id: i64,
        payment_token: &str,
        expected_status: StatusCode,
        expected_msg: &str,
    ) -> Result<(), CaseError> {
        let token = self.session.require_csrf_token(Operation::Buy)?;
        let case = NegativeCase::buy_with_failed(
            token,
            item_id,
            payment_token,
            expected_status,
            expected_msg,
        );
        self.run(&case).await
    }

    /// `POST /ship` with a forged token must be 422.
    pub async fn ship_with_wrong_csrf_token(&self, item_id: i64) -> Result<(), CaseError> {
        let case = NegativeCase::ship_with_wrong_csrf_token(item_id)?;
        self.run(&case).await
    }

    /// `POST /ship` by a non-seller must be 403 with the forbidden message.
    pub async fn ship_with_wrong_seller(&self, item_id: i64) -> Result<(), CaseError> {
        let token = self.session.require_csrf_token(Operation::Ship)?;
        let case = NegativeCase::ship_with_wrong_seller(token, item_id);
        self.run(&case).await
    }
}
