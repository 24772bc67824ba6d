//! ddk-controller
//!
//! The single choke-point for deal mutations. Every user action flows
//! through [`DealController`]:
//!
//! 1. validate the caller-supplied input synchronously;
//! 2. check the gate prerequisites for the action;
//! 3. on success, apply exactly the fields the action owns as one overlay
//!    patch — a failed step 1 or 2 mutates nothing;
//! 4. re-derive the active stage / navigation ceiling and return them with
//!    the refreshed control-enablement set.
//!
//! Failures are typed ([`ActionError`]): the presentation layer decides how
//! to surface them, the core never blocks.
//!
//! The deferred payout settlement lives in [`SettlementQueue`]: an explicit,
//! cancelable task keyed by deal id, driven by a caller-supplied clock so
//! tests fire it deterministically.

mod controller;
mod errors;
mod settlement;
mod validate;

pub use controller::{ActionOutcome, Controls, DealController};
pub use errors::{ActionError, GateViolation, ValidationError};
pub use settlement::{SettlementQueue, SETTLEMENT_DELAY_MS};
pub use validate::{is_valid_email, is_valid_link};
