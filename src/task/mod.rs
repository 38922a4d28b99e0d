//! Task lifecycle management for the Agora marketplace.
//!
//! This module implements the marketplace core: normalizing ledger task
//! records into a canonical model, guarding and executing lifecycle
//! transitions (apply, assign, unassign, submit-result, complete, delete),
//! reconciling the local cache after every confirmed mutation, and
//! projecting the single action available to the current viewer. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
