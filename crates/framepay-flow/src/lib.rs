//! Frame step controller for the framepay payment flow.
//!
//! This crate is the protocol state machine: one handler per step,
//! each consuming a verified action plus the decoded carried state,
//! persisting ledger transitions, and producing the next declarative
//! frame response.
//!
//! ```text
//! AwaitingToken -> AwaitingAmount -> AwaitingConfirmation
//!     -> { Executing | DeferredToApp } -> AwaitingComment -> Done
//! ```
//!
//! `Invalid` and `Expired` are reachable from every state: a failed
//! verification, malformed state, missing jar, or lapsed ledger row
//! always renders the fixed inert response. The transport cannot
//! display errors, so nothing here ever surfaces one.
//!
//! Submodules:
//!
//! - [`engine`] - the [`FlowEngine`](engine::FlowEngine) step handlers
//! - [`amount`] - preset and free-text amount parsing
//! - [`calldata`] - transfer call construction and amount rounding
//! - [`collaborators`] - external service seams (identity, jars,
//!   pricing, notifications)
//! - [`receipt`] - receipt links and notification text
//! - [`handlers`] - axum routes wiring verification to the engine

pub mod amount;
pub mod calldata;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod receipt;

pub use amount::*;
pub use calldata::*;
pub use collaborators::*;
pub use config::*;
pub use engine::*;
pub use receipt::*;
