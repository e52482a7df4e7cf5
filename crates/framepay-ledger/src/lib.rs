//! Persisted payment ledger for the framepay protocol.
//!
//! This crate owns the payment lifecycle:
//!
//! - [`PaymentStore`] - the persistence seam. Stores enforce the two
//!   global unique indexes (`reference_id`, `hash`) and optimistic
//!   version checks; they know nothing about payment semantics.
//! - [`InMemoryPaymentStore`] - the default store, a `RwLock`ed map
//!   with the same index and versioning guarantees a SQL store gives.
//! - [`PaymentLedger`] - the domain rules over any store: reference-id
//!   assignment with bounded collision retries, the executed and
//!   comment transitions, expiry, and intent deferral.
//!
//! The ledger is the only shared mutable resource in the system; every
//! cross-step fact a handler acts on is re-derived from here.

pub mod ledger;
pub mod memory;
pub mod store;

pub use ledger::*;
pub use memory::*;
pub use store::*;
