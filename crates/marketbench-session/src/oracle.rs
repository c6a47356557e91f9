//! The expected rejection for a case, and the check against a response.
//!
//! A status mismatch ends the check before the body is decoded. On a status
//! match the body must decode as `{"error": "<message>"}`; exact-message
//! oracles then compare the message byte for byte.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{body_excerpt, CaseError};
use crate::request::Operation;

/// Error message for a listing price outside [100, 1,000,000].
pub const ITEM_PRICE_ERR_MSG: &str = "商品価格は100円以上、1,000,000円以下にしてください";

/// Error message for a shipment requested by someone other than the seller.
pub const FORBIDDEN_ERR_MSG: &str = "権限がありません";

/// Report line when a 400 on `/sell` carried some other message.
pub const ITEM_PRICE_DIAGNOSTIC: &str = "商品価格は100円以上、1,000,000円以下しか出品できません";

/// Report line when a 403 on `/ship` carried some other message.
pub const FORBIDDEN_DIAGNOSTIC: &str = "権限がないエラーが発生していません";

/// Failure response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// What the error message must be once the status matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageExpectation {
    /// Any message, as long as the body decodes.
    Any,
    /// Exactly `message`; otherwise fail with `diagnostic` in the report.
    Exact { message: String, diagnostic: String },
}

impl MessageExpectation {
    /// Exact match with the generic "not the expected error" diagnostic.
    pub fn exact(message: impl Into<String>) -> Self {
        let message = message.into();
        let diagnostic = format!("{message}というエラーではありません");
        Self::Exact {
            message,
            diagnostic,
        }
    }

    /// Exact match with a case-specific diagnostic.
    pub fn exact_with(message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::Exact {
            message: message.into(),
            diagnostic: diagnostic.into(),
        }
    }
}

/// The oracle a case's response is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutcome {
    pub status: StatusCode,
    pub message: MessageExpectation,
}

impl ExpectedOutcome {
    /// Status must match; any decodable error message is accepted.
    pub fn status_only(status: StatusCode) -> Self {
        Self {
            status,
            message: MessageExpectation::Any,
        }
    }

    pub fn with_message(status: StatusCode, message: MessageExpectation) -> Self {
        Self { status, message }
    }

    /// Check a fully read response against this oracle.
    pub fn judge(
        &self,
        operation: Operation,
        status: StatusCode,
        body: &[u8],
    ) -> Result<ErrorEnvelope, CaseError> {
        check_status_code(operation, status, self.status, body)?;

        let envelope: ErrorEnvelope = serde_json::from_slice(body)
            .map_err(|source| CaseError::Decode { operation, source })?;

        if let MessageExpectation::Exact {
            message,
            diagnostic,
        } = &self.message
        {
            if envelope.error != *message {
                return Err(CaseError::MessageMismatch {
                    operation,
                    expected: message.clone(),
                    actual: envelope.error,
                    diagnostic: diagnostic.clone(),
                });
            }
        }

        Ok(envelope)
    }
}

/// Compare the actual status with the expected one.
pub fn check_status_code(
    operation: Operation,
    actual: StatusCode,
    expected: StatusCode,
    body: &[u8],
) -> Result<(), CaseError> {
    if actual == expected {
        return Ok(());
    }
    Err(CaseError::StatusMismatch {
        operation,
        expected: expected.as_u16(),
        actual: actual.as_u16(),
        body: body_excerpt(body),
    })
}
