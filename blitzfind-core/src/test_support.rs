//! In-memory `FeatureStore` implementation used by unit and behaviour tests.

use std::collections::BTreeMap;

use crate::{
    Feature, FeatureId, FeatureStore, RecordPage, StoreError, StoredRecord, Timestamp,
};

/// In-memory `FeatureStore` keyed by identifier.
///
/// Timestamps never move backwards for a given record, even when the system
/// clock does.
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    records: BTreeMap<FeatureId, StoredRecord>,
    remaining_writes: Option<usize>,
}

impl MemoryStore {
    /// Create a store that accepts `writes` successful `put` calls and then
    /// rejects every further write.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn failing_after(writes: usize) -> Self {
        Self {
            records: BTreeMap::new(),
            remaining_writes: Some(writes),
        }
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn consume_write(&mut self, id: &FeatureId) -> Result<(), StoreError> {
        match self.remaining_writes.as_mut() {
            Some(0) => Err(StoreError::Rejected {
                id: id.clone(),
                reason: "write budget exhausted".into(),
            }),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl FeatureStore for MemoryStore {
    fn get(&self, id: &FeatureId) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, id: &FeatureId, mut feature: Feature) -> Result<StoredRecord, StoreError> {
        self.consume_write(id)?;
        feature.id = id.clone();
        let now = Timestamp::now();
        let record = match self.records.get(id) {
            Some(existing) => StoredRecord {
                id: id.clone(),
                value: feature,
                created_at: existing.created_at,
                updated_at: now.max(existing.updated_at),
            },
            None => StoredRecord {
                id: id.clone(),
                value: feature,
                created_at: now,
                updated_at: now,
            },
        };
        self.records.insert(id.clone(), record.clone());
        Ok(record)
    }

    fn delete(&mut self, id: &FeatureId) -> Result<bool, StoreError> {
        Ok(self.records.remove(id).is_some())
    }

    fn list(&self, skip: u64, limit: u64) -> Result<RecordPage, StoreError> {
        let skip_count = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit_count = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(RecordPage {
            total: u64::try_from(self.records.len()).unwrap_or(u64::MAX),
            skip,
            limit,
            records: self
                .records
                .values()
                .skip(skip_count)
                .take(limit_count)
                .map(StoredRecord::summary)
                .collect(),
        })
    }
}
