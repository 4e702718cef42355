//! pubkit release gate
//!
//! Runs a fixed sequence of checks before a release, stops at the first
//! failure and writes `summary.json` and `summary.md`.
//!
//! # Core Concepts
//!
//! - [`GatePlan`]: ordered steps (`lint`, `typecheck`, `build`, `seo`,
//!   `performance`, `security`, `i18n`, `content`)
//! - [`GateMode`]: `ci` runs everything, `local` skips `ci_only` steps
//! - [`GateCheck`]: a step's check; commands go through [`CommandRunner`]
//! - [`ReleaseGate`]: the fail-fast runner producing a [`GateSummary`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod check;
mod error;
mod gate;
mod plan;
mod summary;

pub use check::{CheckOutcome, CommandCheck, CommandOutput, CommandRunner, GateCheck, GateContext, TokioCommandRunner};
pub use error::GateError;
pub use gate::ReleaseGate;
pub use plan::{GateAction, GateId, GateMode, GatePlan, GateStep};
pub use summary::{tail_lines, GateResult, GateStatus, GateSummary, OUTPUT_TAIL_LINES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
