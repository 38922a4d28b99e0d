//! Adapter implementations of the marketplace ports.

pub mod contract;
pub mod memory;
