//! Price source for securities listed on MOEX.
//!
//! One idempotent GET per (ticker, asset class) against the public ISS
//! endpoint. Retries are the caller's policy, not this crate's.

pub mod client;
pub mod error;

pub use client::{FakeClient, MoexClient, PriceSource};
pub use error::MoexError;
