//! Create-or-overwrite reconciliation against a [`FeatureStore`].
#![forbid(unsafe_code)]

use blitzfind_core::{Feature, FeatureId, FeatureStore, Geometry, StoreError};

use crate::ingest::{ImportError, ImportSummary};

/// How a single feature was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// No record existed; one was created.
    Created,
    /// A record existed and was overwritten.
    Updated,
}

/// Tallies created and updated records while writing through a store.
///
/// Every source unit must be handed to either [`UpsertReconciler::reconcile`]
/// or [`UpsertReconciler::skip_unit`] so `total_processed` stays accurate.
///
/// # Examples
/// ```
/// use blitzfind_core::{Feature, FeatureId, Properties};
/// use blitzfind_core::test_support::MemoryStore;
/// use blitzfind_data::ingest::{Reconciliation, UpsertReconciler};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = MemoryStore::default();
/// let id = FeatureId::new("BLD001")?;
/// let mut reconciler = UpsertReconciler::new(&mut store);
/// let feature = Feature::new(id, None, Properties::new());
/// assert_eq!(reconciler.reconcile(feature.clone())?, Reconciliation::Created);
/// assert_eq!(reconciler.reconcile(feature)?, Reconciliation::Updated);
/// let summary = reconciler.finish();
/// assert_eq!((summary.imported, summary.updated, summary.total_processed), (1, 1, 2));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UpsertReconciler<'s, S: FeatureStore + ?Sized> {
    store: &'s mut S,
    summary: ImportSummary,
}

impl<'s, S: FeatureStore + ?Sized> UpsertReconciler<'s, S> {
    /// Start reconciling into `store` with zeroed counts.
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            summary: ImportSummary::default(),
        }
    }

    /// Write `feature` under its own identifier and classify the write.
    ///
    /// # Errors
    /// Returns [`ImportError::Storage`] carrying the counts so far when the
    /// store fails. The failed unit is not counted.
    pub fn reconcile(&mut self, feature: Feature) -> Result<Reconciliation, ImportError> {
        let id = feature.id.clone();
        let positions = feature
            .geometry
            .as_ref()
            .map(Geometry::positions)
            .unwrap_or_default();

        let existing = self
            .store
            .get(&id)
            .map_err(|source| self.storage_error(&id, source))?;
        self.store
            .put(&id, feature)
            .map_err(|source| self.storage_error(&id, source))?;

        let outcome = if existing.is_some() {
            self.summary.updated += 1;
            Reconciliation::Updated
        } else {
            self.summary.imported += 1;
            Reconciliation::Created
        };
        self.summary.total_processed += 1;
        for position in positions {
            self.summary.include_position(position);
        }
        Ok(outcome)
    }

    /// Record a unit that had no derivable identifier.
    pub fn skip_unit(&mut self) {
        self.summary.total_processed += 1;
    }

    /// Counts accumulated so far.
    #[must_use]
    pub const fn summary(&self) -> &ImportSummary {
        &self.summary
    }

    /// Finish reconciliation, returning the accumulated counts.
    #[must_use]
    pub fn finish(self) -> ImportSummary {
        self.summary
    }

    fn storage_error(&self, id: &FeatureId, source: StoreError) -> ImportError {
        ImportError::Storage {
            id: id.clone(),
            summary: self.summary.clone(),
            source,
        }
    }
}
