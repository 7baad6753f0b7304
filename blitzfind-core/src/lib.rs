//! Core domain types for the BlitzFind feature store.
//!
//! Every imported record is normalised into a [`Feature`] and written through
//! the [`FeatureStore`] seam. Constructors return `Result` where an invariant
//! (such as a non-empty identifier) must hold.

mod feature;
mod record;
pub mod store;
pub mod test_support;

pub use feature::{Feature, FeatureId, FeatureIdError, Geometry, Properties};
pub use record::{RecordPage, RecordSummary, StoredRecord, Timestamp};
pub use store::{FeatureStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::SqliteFeatureStore;
