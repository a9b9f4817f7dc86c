//! Executes validated actions against the contract store
//!
//! Every failure is returned as an [`ActionError`] value; nothing here panics
//! or aborts the surrounding turn.

use super::{ActionError, ActionInput, ActionOutcome, ActionRegistry, ActionRequest};
use crate::auth::CallerIdentity;
use crate::store::{ContractStore, NewContract};
use chrono::Utc;
use std::sync::Arc;

pub struct ActionExecutor<S: ContractStore> {
    registry: Arc<ActionRegistry>,
    store: S,
}

impl<S: ContractStore> ActionExecutor<S> {
    pub fn new(registry: Arc<ActionRegistry>, store: S) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Resolve, validate, and run one requested action on behalf of `caller`
    pub async fn execute(
        &self,
        request: &ActionRequest,
        caller: &CallerIdentity,
    ) -> Result<ActionOutcome, ActionError> {
        let result = match self.registry.parse(request) {
            Ok(input) => self.run(input, caller).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(outcome) => tracing::info!(
                action = outcome.action,
                call_id = %request.id,
                contract_id = outcome.contract_id.as_deref().unwrap_or_default(),
                store_id = %caller.store_id,
                "Action succeeded"
            ),
            Err(e) => tracing::warn!(
                action = %request.name,
                call_id = %request.id,
                error = %e,
                "Action failed"
            ),
        }

        result
    }

    async fn run(
        &self,
        input: ActionInput,
        caller: &CallerIdentity,
    ) -> Result<ActionOutcome, ActionError> {
        tracing::debug!(
            action = input.action_name(),
            store_id = %caller.store_id,
            "Executing action"
        );
        match input {
            ActionInput::CreateContract(terms) => {
                let record = self
                    .store
                    .insert(NewContract {
                        store_id: caller.store_id.clone(),
                        org_id: caller.org_id.clone(),
                        terms,
                        created_at: Utc::now(),
                    })
                    .await?;

                Ok(ActionOutcome {
                    action: super::CREATE_CONTRACT,
                    message: format!("Contract {} created successfully.", record.contract_id),
                    contract_id: Some(record.contract_id),
                })
            }
        }
    }
}
