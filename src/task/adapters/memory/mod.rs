//! In-memory adapters for tests and local development.

mod blob;
mod ledger;

pub use blob::InMemoryBlobStore;
pub use ledger::{InMemoryLedger, LedgerSettings, LedgerState};
