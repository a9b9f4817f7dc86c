//! Database schema and record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS contracts (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id TEXT UNIQUE,
    store_id TEXT NOT NULL,
    org_id TEXT NOT NULL,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contracts_owner ON contracts(org_id, store_id);
";

/// `C001`, `C002`, ... widening past three digits as needed
pub fn format_contract_id(seq: i64) -> String {
    format!("C{seq:03}")
}

/// Vendor and commercial terms of a contract, as agreed in conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    pub vendor_name: String,
    pub vendor_email: String,
    pub phone: String,
    pub address: String,
    pub pincode: String,
    pub business_type: String,
    pub gst_number: String,
    pub tax: f64,
    pub product_name: String,
    pub quantity: i64,
    pub unit: String,
    pub category: String,
    pub sub_category: String,
    pub tags: Vec<String>,
    pub warranty_tenure: i64,
    pub warranty_unit: String,
    pub date_of_delivery: String,
    pub returnable: bool,
    pub return_conditions: Vec<String>,
    pub status: String,
}

/// A contract awaiting persistence
#[derive(Debug, Clone)]
pub struct NewContract {
    pub store_id: String,
    pub org_id: String,
    pub terms: ContractTerms,
    pub created_at: DateTime<Utc>,
}

impl NewContract {
    pub fn into_record(self, contract_id: String) -> ContractRecord {
        ContractRecord {
            contract_id,
            store_id: self.store_id,
            org_id: self.org_id,
            terms: self.terms,
            created_at: self.created_at,
        }
    }
}

/// Persisted contract document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub contract_id: String,
    pub store_id: String,
    pub org_id: String,
    #[serde(flatten)]
    pub terms: ContractTerms,
    pub created_at: DateTime<Utc>,
}
