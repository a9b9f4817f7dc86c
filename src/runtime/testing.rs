//! Test doubles and fixtures
//!
//! These mocks let the runtime, executor and handlers run without a model
//! provider or a database file.

use crate::auth::CallerIdentity;
use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use crate::store::{
    format_contract_id, ContractRecord, ContractStore, ContractTerms, NewContract, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock LLM
// ============================================================================

/// Mock model that returns queued responses in order
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a plain text response
    pub fn queue_text(&self, text: &str) {
        self.queue_response(LlmResponse::from_text(text));
    }

    /// Queue a response requesting one action per `(name, arguments)` pair
    pub fn queue_actions(&self, calls: Vec<(&str, Value)>) {
        let content = calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, input))| {
                ContentBlock::tool_use(format!("call_{i}_{name}"), name, input)
            })
            .collect();
        self.queue_response(LlmResponse {
            content,
            end_turn: false,
            usage: Usage::default(),
        });
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// In-memory contract store
// ============================================================================

/// Contract store backed by a vector and an atomic sequence
pub struct MemoryStore {
    next_seq: AtomicI64,
    records: Mutex<Vec<ContractRecord>>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicI64::new(1),
            records: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A store whose every insert fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn records(&self) -> Vec<ContractRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn insert(&self, contract: NewContract) -> StoreResult<ContractRecord> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = contract.into_record(format_contract_id(seq));
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn get(&self, contract_id: &str) -> StoreResult<Option<ContractRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.contract_id == contract_id)
            .cloned())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn caller() -> CallerIdentity {
    CallerIdentity {
        store_id: "ST001".to_string(),
        org_id: "ORG001".to_string(),
    }
}

/// Complete create-contract arguments, shaped the way the model sends them
pub fn contract_arguments() -> Value {
    json!({
        "vendor_name": "Acme Supplies",
        "vendor_email": "sales@acme.test",
        "phone": "+91 98765 43210",
        "address": "12 Industrial Estate, Peenya",
        "pincode": "560058",
        "business_type": "Wholesale",
        "gst_number": "29ABCDE1234F1Z5",
        "tax": "18%",
        "product_name": "Steel Bolts",
        "quantity": 500,
        "unit": "pcs",
        "category": "Hardware",
        "sub_category": "Fasteners",
        "tags": ["bulk", "hardware"],
        "warranty_tenure": 12,
        "warranty_unit": "months",
        "date_of_delivery": "2026-11-30",
        "returnable": "yes",
        "return_conditions": "unused, original packaging",
        "status": "active"
    })
}

pub fn sample_terms() -> ContractTerms {
    ContractTerms {
        vendor_name: "Acme Supplies".to_string(),
        vendor_email: "sales@acme.test".to_string(),
        phone: "+91 98765 43210".to_string(),
        address: "12 Industrial Estate, Peenya".to_string(),
        pincode: "560058".to_string(),
        business_type: "Wholesale".to_string(),
        gst_number: "29ABCDE1234F1Z5".to_string(),
        tax: 18.0,
        product_name: "Steel Bolts".to_string(),
        quantity: 500,
        unit: "pcs".to_string(),
        category: "Hardware".to_string(),
        sub_category: "Fasteners".to_string(),
        tags: vec!["bulk".to_string()],
        warranty_tenure: 12,
        warranty_unit: "months".to_string(),
        date_of_delivery: "2026-11-30".to_string(),
        returnable: true,
        return_conditions: vec!["unused".to_string()],
        status: "active".to_string(),
    }
}
