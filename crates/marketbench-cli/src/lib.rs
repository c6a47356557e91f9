//! # marketbench-cli — CLI for the marketplace negative suite
//!
//! ## Subcommands
//!
//! - `marketbench verify` — log in as one actor and run the negative suite.
//! - `marketbench cases` — list the suite's case names.
//! - `marketbench token` — print a forged anti-forgery token.
//!
//! ```bash
//! marketbench verify --target http://127.0.0.1:8000 --account alice --password alice-pw
//! marketbench verify --account alice --password alice-pw --foreign-item-id 12 --format json
//! ```
//!
//! Exit codes: 0 every case confirmed its rejection, 1 at least one case
//! failed, 2 the run could not complete (bootstrap or entropy failure).

pub mod verify;

/// Exit code when every case passed.
pub const EXIT_OK: u8 = 0;
/// Exit code when at least one case failed.
pub const EXIT_CASE_FAILURES: u8 = 1;
/// Exit code when the run itself could not complete.
pub const EXIT_ABORTED: u8 = 2;
