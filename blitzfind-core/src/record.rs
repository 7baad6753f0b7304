//! Stored record metadata returned by [`FeatureStore`](crate::FeatureStore)
//! implementations.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{Feature, FeatureId};

/// Wall-clock instant with millisecond resolution, counted from the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Current system time. Clocks set before the epoch read as zero.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self(millis)
    }

    /// Construct a timestamp from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

/// A feature as held by the store, with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store key.
    pub id: FeatureId,
    /// Current feature value.
    pub value: Feature,
    /// Time of the first write for this key.
    pub created_at: Timestamp,
    /// Time of the latest write for this key.
    pub updated_at: Timestamp,
}

impl StoredRecord {
    /// Identifier and timestamps without the feature body.
    #[must_use]
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Identifier and timestamps of a stored record, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    /// Store key.
    pub id: FeatureId,
    /// Time of the first write for this key.
    pub created_at: Timestamp,
    /// Time of the latest write for this key.
    pub updated_at: Timestamp,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    /// Total number of records in the store.
    pub total: u64,
    /// Number of records skipped before this page.
    pub skip: u64,
    /// Maximum page size requested.
    pub limit: u64,
    /// Records on this page, ordered by identifier.
    pub records: Vec<RecordSummary>,
}
