//! Side-effecting actions the model may request
//!
//! Raw model requests are turned into a typed [`ActionInput`] at one
//! boundary ([`ActionRegistry::parse`]) before anything touches the store.

mod contract;
mod executor;
mod schema;

pub use contract::{create_contract_schema, CREATE_CONTRACT};
pub use executor::ActionExecutor;
pub use schema::{ActionSchema, ValidationError};

use crate::llm::ToolDefinition;
use crate::store::{ContractTerms, StoreError};
use serde_json::Value;
use thiserror::Error;

/// An action requested by the model, exactly as emitted
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ActionRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A request that resolved to a registered action and passed validation
#[derive(Debug, Clone, PartialEq)]
pub enum ActionInput {
    CreateContract(ContractTerms),
}

impl ActionInput {
    pub fn action_name(&self) -> &'static str {
        match self {
            ActionInput::CreateContract(_) => CREATE_CONTRACT,
        }
    }
}

/// Successful execution, narrated for the finalizing pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: &'static str,
    pub message: String,
    pub contract_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No matching action: {0}")]
    UnknownAction(String),
    #[error("Invalid arguments for {action}: {source}")]
    Validation {
        action: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Error saving contract: {0}")]
    Persistence(#[from] StoreError),
}

/// Render an execution result as text the model can narrate
pub fn narrate(result: &Result<ActionOutcome, ActionError>) -> String {
    match result {
        Ok(outcome) => outcome.message.clone(),
        Err(e) => e.to_string(),
    }
}

/// The set of actions offered to the model
pub struct ActionRegistry {
    schemas: Vec<ActionSchema>,
}

impl ActionRegistry {
    /// Registry with every action this service supports
    pub fn standard() -> Self {
        Self {
            schemas: vec![create_contract_schema()],
        }
    }

    pub fn schemas(&self) -> &[ActionSchema] {
        &self.schemas
    }

    pub fn resolve(&self, name: &str) -> Option<&ActionSchema> {
        self.schemas.iter().find(|schema| schema.name == name)
    }

    /// Tool definitions for the drafting pass
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.schemas
            .iter()
            .map(|schema| ToolDefinition {
                name: schema.name.to_string(),
                description: schema.description.to_string(),
                input_schema: schema.to_json_schema(),
            })
            .collect()
    }

    /// Resolve and validate a raw request into a typed input
    pub fn parse(&self, request: &ActionRequest) -> Result<ActionInput, ActionError> {
        let schema = self
            .resolve(&request.name)
            .ok_or_else(|| ActionError::UnknownAction(request.name.clone()))?;
        let invalid = |source| ActionError::Validation {
            action: schema.name,
            source,
        };

        let arguments = schema.validate(&request.arguments).map_err(invalid)?;
        match schema.name {
            CREATE_CONTRACT => ContractTerms::try_from(&arguments)
                .map(ActionInput::CreateContract)
                .map_err(invalid),
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }
}
