//! Core domain types for the framepay frame payment protocol.
//!
//! This crate defines the shared vocabulary of the workspace:
//!
//! - [`Network`](network::Network) and the token registry in [`token`]
//! - The [`Payment`](payment::Payment) ledger row and its status machine
//! - The client-echoed [`PaymentFrameState`](state::PaymentFrameState)
//!   and its opaque base64 codec
//! - The normalized [`ValidatedAction`](action::ValidatedAction) produced
//!   by frame message verification
//! - Declarative [`FrameResponse`](frame::FrameResponse) rendering and
//!   frame transaction payloads
//!
//! Everything here is transport-agnostic and side-effect free. The
//! validator, ledger, and flow crates build on these types.

pub mod action;
pub mod frame;
pub mod network;
pub mod payment;
pub mod profile;
pub mod state;
pub mod timestamp;
pub mod token;

pub use action::*;
pub use frame::*;
pub use network::*;
pub use payment::*;
pub use profile::*;
pub use state::*;
pub use timestamp::*;
pub use token::*;
