//! Wallet session port: identity and signed-call primitives.
//!
//! The wallet collaborator owns keys and signatures; the core only needs
//! the current identity and a way to submit view and change calls against
//! the contract it is connected to.

use super::ledger::GatewayError;
use crate::task::domain::{AccountId, RewardAmount};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Errors surfaced by wallet implementations.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    /// No account is signed in.
    #[error("no account is signed in")]
    NotSignedIn,

    /// The signed call was rejected by the ledger.
    #[error("signed call rejected: {reason}")]
    Rejected {
        /// The ledger's own rejection reason.
        reason: String,
    },

    /// The call did not reach the ledger.
    #[error("wallet transport failure: {0}")]
    Network(Arc<dyn std::error::Error + Send + Sync>),
}

impl WalletError {
    /// Builds a rejection carrying the ledger's reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Wraps a transport error.
    pub fn network(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network(Arc::new(err))
    }
}

impl From<WalletError> for GatewayError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotSignedIn => Self::NotAuthenticated,
            WalletError::Rejected { reason } => Self::Rejected { reason },
            WalletError::Network(source) => Self::Network(source),
        }
    }
}

/// Supplies the current actor identity.
pub trait IdentityProvider: Send + Sync {
    /// Returns the signed-in account, if any.
    fn current_identity(&self) -> Option<AccountId>;
}

/// Signs and submits contract calls on behalf of the connected account.
#[async_trait]
pub trait WalletSession: IdentityProvider {
    /// Executes a read-only view method and returns its JSON result.
    async fn view(&self, method: &str, args: Value) -> WalletResult<Value>;

    /// Signs and submits a change method, optionally attaching a deposit,
    /// and returns the settled transaction hash.
    async fn call(
        &self,
        method: &str,
        args: Value,
        deposit: Option<RewardAmount>,
    ) -> WalletResult<String>;
}
