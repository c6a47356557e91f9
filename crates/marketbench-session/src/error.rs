//! Error types for sessions and negative cases.
//!
//! [`CaseError`] is the verdict of a failed case. `Display` is the developer
//! form; [`CaseError::report`] is the line shown in the benchmark report, in
//! the marketplace's display locale.

use crate::request::Operation;
use crate::token::EntropyError;

/// Longest response body excerpt carried in a status mismatch.
const BODY_EXCERPT_LIMIT: usize = 256;

/// A negative case did not observe the expected rejection.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// The request could not be sent or its response could not be read.
    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: Operation,
        source: reqwest::Error,
    },
    /// The request body could not be serialized.
    #[error("{operation}: failed to encode request body: {source}")]
    Encode {
        operation: Operation,
        source: serde_json::Error,
    },
    /// The response status differed from the oracle. The body is not decoded.
    #[error("{operation}: got response status code {actual}; expected {expected}")]
    StatusMismatch {
        operation: Operation,
        expected: u16,
        actual: u16,
        body: String,
    },
    /// The status matched but the body is not an error envelope.
    #[error("{operation}: malformed error body: {source}")]
    Decode {
        operation: Operation,
        source: serde_json::Error,
    },
    /// The status matched but the error message is not the required one.
    #[error("{operation}: expected error message {expected:?}, got {actual:?}")]
    MessageMismatch {
        operation: Operation,
        expected: String,
        actual: String,
        diagnostic: String,
    },
    /// A valid-token case ran on a session that never obtained a token.
    #[error("{operation}: session holds no anti-forgery token; log in first")]
    MissingCsrfToken { operation: Operation },
    /// No forged token could be produced. Fatal for the whole run.
    #[error("{operation}: {source}")]
    Entropy {
        operation: Operation,
        source: EntropyError,
    },
}

impl CaseError {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Transport { operation, .. }
            | Self::Encode { operation, .. }
            | Self::StatusMismatch { operation, .. }
            | Self::Decode { operation, .. }
            | Self::MessageMismatch { operation, .. }
            | Self::MissingCsrfToken { operation }
            | Self::Entropy { operation, .. } => *operation,
        }
    }

    /// Whether the run must stop: the harness itself is broken, not the target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Entropy { .. })
    }

    /// Short machine-readable kind, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::Encode { .. } => "transport",
            Self::StatusMismatch { .. } => "status_mismatch",
            Self::Decode { .. } => "decode",
            Self::MessageMismatch { .. } => "message_mismatch",
            Self::MissingCsrfToken { .. } => "missing_csrf_token",
            Self::Entropy { .. } => "fatal_environment",
        }
    }

    /// Human-readable report line naming the operation and the violated expectation.
    pub fn report(&self) -> String {
        let op = self.operation().endpoint();
        match self {
            Self::Transport { .. } | Self::Encode { .. } => {
                format!("{op}: リクエストに失敗しました")
            }
            Self::StatusMismatch {
                expected, actual, ..
            } => format!("{op}: got response status code {actual}; expected {expected}"),
            Self::Decode { .. } => format!("{op}: JSONデコードに失敗しました"),
            Self::MessageMismatch { diagnostic, .. } => format!("{op}: {diagnostic}"),
            Self::MissingCsrfToken { .. } => format!("{op}: CSRFトークンが取得できていません"),
            Self::Entropy { .. } => format!("{op}: 乱数の生成に失敗しました"),
        }
    }
}

/// Truncate a response body for inclusion in a diagnostic.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(BODY_EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.into_owned(),
    }
}

/// Errors from session bootstrap calls (login, token refresh).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The marketplace returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The marketplace issued no anti-forgery token: the session is not logged in.
    #[error("{endpoint} issued no anti-forgery token; session is not logged in")]
    NotLoggedIn { endpoint: String },
    /// A configured value cannot be sent as an HTTP header.
    #[error("invalid {header} header {value:?}: {reason}")]
    InvalidHeader {
        header: &'static str,
        value: String,
        reason: String,
    },
}
