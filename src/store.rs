//! Contract persistence
//!
//! Records are stored as JSON documents in SQLite. The `contract_id` is
//! derived from the row's AUTOINCREMENT sequence inside the inserting
//! transaction, so concurrent inserts can never observe the same id.

mod schema;

pub use schema::{format_contract_id, ContractRecord, ContractTerms, NewContract};
use schema::SCHEMA;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage task failed: {0}")]
    Task(String),
    #[error("{0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store for contract records
#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Persist a new contract, assigning its unique id
    async fn insert(&self, contract: NewContract) -> StoreResult<ContractRecord>;

    /// Number of stored contracts
    async fn count(&self) -> StoreResult<u64>;

    /// Look up a contract by id
    #[cfg(test)]
    async fn get(&self, contract_id: &str) -> StoreResult<Option<ContractRecord>>;
}

#[async_trait]
impl<T: ContractStore + ?Sized> ContractStore for Arc<T> {
    async fn insert(&self, contract: NewContract) -> StoreResult<ContractRecord> {
        (**self).insert(contract).await
    }

    async fn count(&self) -> StoreResult<u64> {
        (**self).count().await
    }

    #[cfg(test)]
    async fn get(&self, contract_id: &str) -> StoreResult<Option<ContractRecord>> {
        (**self).get(contract_id).await
    }
}

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn insert_blocking(&self, contract: NewContract) -> StoreResult<ContractRecord> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO contracts (store_id, org_id, document, created_at) VALUES (?1, ?2, '{}', ?3)",
            params![
                contract.store_id,
                contract.org_id,
                contract.created_at.to_rfc3339()
            ],
        )?;
        let seq = tx.last_insert_rowid();
        let record = contract.into_record(format_contract_id(seq));
        let document = serde_json::to_string(&record)?;

        tx.execute(
            "UPDATE contracts SET contract_id = ?1, document = ?2 WHERE seq = ?3",
            params![record.contract_id, document, seq],
        )?;
        tx.commit()?;

        Ok(record)
    }

    fn count_blocking(&self) -> StoreResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contracts", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[cfg(test)]
    fn get_blocking(&self, contract_id: &str) -> StoreResult<Option<ContractRecord>> {
        use rusqlite::OptionalExtension;

        let conn = self.lock();
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM contracts WHERE contract_id = ?1",
                params![contract_id],
                |row| row.get(0),
            )
            .optional()?;
        document
            .map(|doc| serde_json::from_str(&doc).map_err(StoreError::from))
            .transpose()
    }
}

/// Run a blocking SQLite operation off the async executor
async fn blocking<T, F>(db: &Database, f: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

#[async_trait]
impl ContractStore for Database {
    async fn insert(&self, contract: NewContract) -> StoreResult<ContractRecord> {
        blocking(self, move |db| db.insert_blocking(contract)).await
    }

    async fn count(&self) -> StoreResult<u64> {
        blocking(self, Database::count_blocking).await
    }

    #[cfg(test)]
    async fn get(&self, contract_id: &str) -> StoreResult<Option<ContractRecord>> {
        let contract_id = contract_id.to_string();
        blocking(self, move |db| db.get_blocking(&contract_id)).await
    }
}
