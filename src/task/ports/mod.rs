//! Port contracts for marketplace task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces to the external
//! collaborators: the ledger, the wallet, and blob storage.

pub mod blob;
pub mod ledger;
pub mod wallet;

pub use blob::{AttachmentUpload, AttachmentUrl, BlobStore, BlobStoreError};
pub use ledger::{GatewayError, GatewayResult, LedgerGateway, TxReference};
pub use wallet::{IdentityProvider, WalletError, WalletResult, WalletSession};
