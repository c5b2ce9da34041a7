//! In-memory code store.
//!
//! The inventory is one mutex-guarded vector; holding the lock for the whole
//! read-modify-write of a claim makes claims serializable by construction.
//! This is the process-local store the binary runs with, and the reference
//! implementation of the `CodeStore` contract for everything else.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CodeStore, StoreError};
use crate::code::CodeRecord;

#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    records: Mutex<Vec<CodeRecord>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<CodeRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("inventory lock poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<CodeRecord> {
        self.records.lock().expect("inventory lock poisoned").clone()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn claim_newest_unused(&self) -> Result<Option<String>, StoreError> {
        let mut records = self.lock()?;

        let Some(record) = records
            .iter_mut()
            .filter(|r| !r.used)
            .max_by_key(|r| r.created)
        else {
            return Ok(None);
        };

        // The unused filter and the flag can disagree in stores whose query
        // snapshot lags the transaction; a used record is never claimable.
        if record.used {
            return Ok(None);
        }

        record.used = true;
        Ok(Some(record.value.clone()))
    }

    async fn newest(&self) -> Result<Option<CodeRecord>, StoreError> {
        let records = self.lock()?;
        Ok(records.iter().max_by_key(|r| r.created).cloned())
    }

    async fn contains(&self, value: &str) -> Result<bool, StoreError> {
        let records = self.lock()?;
        Ok(records.iter().any(|r| r.value == value))
    }

    async fn insert(&self, record: CodeRecord) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        records.push(record);
        Ok(())
    }
}
