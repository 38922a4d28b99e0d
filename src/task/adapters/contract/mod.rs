//! Contract-backed ledger gateway adapter.

mod client;

pub use client::ContractClient;
