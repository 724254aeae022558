use super::dispatcher::RpcEndpoint;
use crate::application::balance::BalanceService;
use crate::application::lookup::LookupService;
use crate::domain::user::{Amount, BalanceDirection};
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Batch existence check for a set of user ids.
///
/// Every id is evaluated; a missing user is a per-id result, not an abort.
pub struct ValidateUsers {
    lookup: Arc<LookupService>,
}

impl ValidateUsers {
    pub fn new(lookup: Arc<LookupService>) -> Self {
        Self { lookup }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateUsersRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateUsersReply {
    pub all_valid: bool,
    pub results: Vec<UserValidation>,
    pub total_users: usize,
    pub valid_users: usize,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserValidation {
    pub user_id: String,
    pub valid: bool,
}

#[async_trait]
impl RpcEndpoint for ValidateUsers {
    const QUEUE: &'static str = "validate-users";
    type Request = ValidateUsersRequest;
    type Reply = ValidateUsersReply;

    async fn call(&self, request: Self::Request) -> Result<Option<Self::Reply>> {
        let mut results = Vec::with_capacity(request.user_ids.len());
        for user_id in request.user_ids {
            let valid = match self.lookup.find_user(&user_id).await {
                Ok(_) => true,
                Err(ServiceError::NotFound(_)) => false,
                Err(err) => return Err(err),
            };
            results.push(UserValidation { user_id, valid });
        }

        let total_users = results.len();
        let valid_users = results.iter().filter(|result| result.valid).count();
        info!(total_users, valid_users, "validated user batch");

        Ok(Some(ValidateUsersReply {
            all_valid: valid_users == total_users,
            results,
            total_users,
            valid_users,
        }))
    }
}

/// Balance-sufficiency check ahead of a pending transfer.
pub struct CheckBalance {
    lookup: Arc<LookupService>,
}

impl CheckBalance {
    pub fn new(lookup: Arc<LookupService>) -> Self {
        Self { lookup }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBalanceRequest {
    pub sender_user_id: String,
    pub amount: Decimal,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBalanceReply {
    pub has_sufficient_balance: bool,
    pub current_balance: Decimal,
    pub required_amount: Decimal,
    pub sender_user_id: String,
    pub user_exists: bool,
    pub error_message: Option<String>,
}

#[async_trait]
impl RpcEndpoint for CheckBalance {
    const QUEUE: &'static str = "check-balance";
    type Request = CheckBalanceRequest;
    type Reply = CheckBalanceReply;

    async fn call(&self, request: Self::Request) -> Result<Option<Self::Reply>> {
        let amount = Amount::new(request.amount)?;

        match self.lookup.find_user(&request.sender_user_id).await {
            Ok(user) => {
                let current_balance = user.balance();
                // Equal balance is sufficient.
                let has_sufficient_balance = current_balance >= amount.value();
                info!(
                    user_id = %request.sender_user_id,
                    %current_balance,
                    required = %amount.value(),
                    sufficient = has_sufficient_balance,
                    "balance checked"
                );
                Ok(Some(CheckBalanceReply {
                    has_sufficient_balance,
                    current_balance,
                    required_amount: amount.value(),
                    sender_user_id: request.sender_user_id,
                    user_exists: true,
                    error_message: None,
                }))
            }
            // Absence is an answer, not a failure.
            Err(ServiceError::NotFound(_)) => Ok(Some(CheckBalanceReply {
                has_sufficient_balance: false,
                current_balance: Decimal::ZERO,
                required_amount: amount.value(),
                sender_user_id: request.sender_user_id,
                user_exists: false,
                error_message: Some("user not found".to_string()),
            })),
            Err(err) => Err(err),
        }
    }
}

/// Applies a confirmed transfer: debit the sender, then credit the receiver.
///
/// The two mutations are independent store calls with no rollback; a credit
/// failure after a successful debit leaves the debit in place. Reconciliation
/// of that window belongs to the ledger service.
pub struct ApplyTransaction {
    balance: Arc<BalanceService>,
}

impl ApplyTransaction {
    pub fn new(balance: Arc<BalanceService>) -> Self {
        Self { balance }
    }
}

// Field casing follows what the ledger service publishes.
#[derive(Debug, Deserialize)]
pub struct ApplyTransactionRequest {
    pub senderid: String,
    pub receiverid: String,
    pub amount: Decimal,
}

#[async_trait]
impl RpcEndpoint for ApplyTransaction {
    const QUEUE: &'static str = "new-transactions";
    type Request = ApplyTransactionRequest;
    type Reply = ();

    async fn call(&self, request: Self::Request) -> Result<Option<Self::Reply>> {
        if request.senderid.is_empty() || request.receiverid.is_empty() {
            return Err(ServiceError::Validation(
                "senderid and receiverid are required".to_string(),
            ));
        }
        let amount = Amount::new(request.amount)?;

        info!(
            sender = %request.senderid,
            receiver = %request.receiverid,
            amount = %amount.value(),
            "applying transfer"
        );
        self.balance
            .apply_delta(&request.senderid, amount, BalanceDirection::Debit)
            .await?;
        self.balance
            .apply_delta(&request.receiverid, amount, BalanceDirection::Credit)
            .await?;

        Ok(None)
    }
}
