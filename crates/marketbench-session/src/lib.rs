//! # marketbench-session -- Negative-path conformance cases for the marketplace API
//!
//! Builds deliberately invalid requests against the marketplace's
//! state-changing endpoints and asserts the exact rejection each must get:
//!
//! | Case | Fault | Expected |
//! |------|-------|----------|
//! | `login_with_wrong_password` | password | 401 |
//! | `sell_with_wrong_csrf_token` | forged token | 422 |
//! | `sell_with_wrong_price` | price outside [100, 1,000,000] | 400 + price message |
//! | `buy_with_wrong_csrf_token` | forged token | 422 |
//! | `buy_with_failed` | business rule | caller-specified |
//! | `ship_with_wrong_csrf_token` | forged token | 422 |
//! | `ship_with_wrong_seller` | acting user is not the seller | 403 + forbidden message |
//!
//! ## Flow
//!
//! build → send → check status → decode `{"error": ...}` → check message.
//! [`NegativeCase`] holds the request and its oracle; [`NegativeCaseVerifier`]
//! is the single executor. [`Session`] owns transport and the actor's valid
//! anti-forgery token.

pub mod case;
pub mod config;
pub mod error;
pub mod oracle;
pub mod request;
pub mod session;
pub mod suite;
pub mod token;
pub mod verifier;

pub use case::NegativeCase;
pub use config::TargetConfig;
pub use error::{CaseError, SessionError};
pub use oracle::{ErrorEnvelope, ExpectedOutcome, MessageExpectation};
pub use request::{Operation, OperationRequest};
pub use session::{Credentials, Session};
pub use suite::{NegativeSuite, SuiteReport};
pub use verifier::NegativeCaseVerifier;
