//! Ledger gateway implementation over a connected wallet session.

use crate::task::domain::{
    AccountId, AccountRating, FeePercentage, Rating, RecordError, RewardAmount, TaskDraft, TaskId,
    TaskRecord,
};
use crate::task::ports::{GatewayError, GatewayResult, LedgerGateway, TxReference, WalletSession};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

const GET_TASKS: &str = "get_tasks";
const GET_TASK: &str = "get_task";
const GET_PLATFORM_FEE_PERCENTAGE: &str = "get_platform_fee_percentage";
const GET_RATING: &str = "get_rating";
const ADD_TASK: &str = "add_task";
const APPLY_FOR_TASK: &str = "apply_for_task";
const ASSIGN_TASK: &str = "assign_task";
const UNASSIGN_TASK: &str = "unassign_task";
const SUBMIT_RESULT: &str = "submit_result";
const COMPLETE_TASK: &str = "complete_task";
const DELETE_TASK: &str = "delete_task";

/// Ledger gateway backed by a wallet session connected to the contract.
///
/// All arguments travel as JSON; all responses are decoded against the
/// explicit record schema and fail fast on mismatch.
#[derive(Clone)]
pub struct ContractClient<W: WalletSession> {
    wallet: Arc<W>,
}

impl<W: WalletSession> ContractClient<W> {
    /// Creates a client over a connected wallet session.
    #[must_use]
    pub const fn new(wallet: Arc<W>) -> Self {
        Self { wallet }
    }

    async fn view<T: DeserializeOwned>(&self, method: &'static str, args: Value) -> GatewayResult<T> {
        debug!(method, "issuing contract view call");
        let value = self.wallet.view(method, args).await?;
        decode(value)
    }

    async fn change(
        &self,
        method: &'static str,
        args: Value,
        deposit: Option<RewardAmount>,
    ) -> GatewayResult<TxReference> {
        debug!(method, "submitting signed contract call");
        let hash = self.wallet.call(method, args, deposit).await?;
        Ok(TxReference::new(hash))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> GatewayResult<T> {
    serde_json::from_value(value)
        .map_err(|err| GatewayError::Schema(RecordError::Malformed(err.to_string())))
}

#[async_trait]
impl<W: WalletSession> LedgerGateway for ContractClient<W> {
    async fn fetch_all_tasks(&self) -> GatewayResult<Vec<TaskRecord>> {
        // The contract lists tasks as (id, record) pairs; the key must agree
        // with the record's own id.
        let rows: Vec<(u64, TaskRecord)> = self.view(GET_TASKS, json!({})).await?;
        rows.into_iter()
            .map(|(key, record)| {
                if key == record.id {
                    Ok(record)
                } else {
                    Err(GatewayError::Schema(RecordError::Malformed(format!(
                        "listing key {key} does not match record id {}",
                        record.id
                    ))))
                }
            })
            .collect()
    }

    async fn fetch_task(&self, id: TaskId) -> GatewayResult<TaskRecord> {
        self.view(GET_TASK, json!({ "task_id": id.value() })).await
    }

    async fn fetch_platform_fee_percentage(&self) -> GatewayResult<FeePercentage> {
        let raw: u8 = self.view(GET_PLATFORM_FEE_PERCENTAGE, json!({})).await?;
        FeePercentage::new(raw)
            .map_err(|err| GatewayError::Schema(RecordError::Malformed(err.to_string())))
    }

    async fn fetch_rating(&self, account: &AccountId) -> GatewayResult<AccountRating> {
        let raw: u8 = self
            .view(GET_RATING, json!({ "account_id": account.as_str() }))
            .await?;
        AccountRating::new(raw)
            .map_err(|err| GatewayError::Schema(RecordError::Malformed(err.to_string())))
    }

    async fn create_task(
        &self,
        draft: &TaskDraft,
        escrow: RewardAmount,
    ) -> GatewayResult<TxReference> {
        let args = json!({
            "title": draft.title(),
            "description": draft.description(),
            "task_type": draft.kind().as_code(),
            "reward": draft.reward().native().to_string(),
        });
        self.change(ADD_TASK, args, Some(escrow)).await
    }

    async fn apply_for_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        self.change(APPLY_FOR_TASK, json!({ "task_id": id.value() }), None)
            .await
    }

    async fn assign_task(&self, id: TaskId, candidate: &AccountId) -> GatewayResult<TxReference> {
        let args = json!({
            "task_id": id.value(),
            "candidate_account": candidate.as_str(),
        });
        self.change(ASSIGN_TASK, args, None).await
    }

    async fn unassign_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        self.change(UNASSIGN_TASK, json!({ "task_id": id.value() }), None)
            .await
    }

    async fn submit_result(&self, id: TaskId, result: &str) -> GatewayResult<TxReference> {
        let args = json!({ "task_id": id.value(), "result": result });
        self.change(SUBMIT_RESULT, args, None).await
    }

    async fn complete_task(&self, id: TaskId, rating: Rating) -> GatewayResult<TxReference> {
        let args = json!({ "task_id": id.value(), "rating": rating.value() });
        self.change(COMPLETE_TASK, args, None).await
    }

    async fn delete_task(&self, id: TaskId) -> GatewayResult<TxReference> {
        self.change(DELETE_TASK, json!({ "task_id": id.value() }), None)
            .await
    }
}
