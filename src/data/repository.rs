//! Collaborator interfaces over the record store

use std::sync::Arc;

use crate::{PerformanceRecord, PlayerStats, RecordId, Result};

/// Read access to the full set of performance records
pub trait PerformanceSource {
    fn find_all(&self) -> Result<Vec<PerformanceRecord>>;
}

/// CRUD access to performance records
pub trait PerformanceRepository: PerformanceSource {
    fn find_by_id(&self, id: RecordId) -> Result<Option<PerformanceRecord>>;

    /// Store a new record and return it with its assigned id
    fn insert(&self, stats: &PlayerStats) -> Result<PerformanceRecord>;

    /// Replace the stats of an existing record; `None` if the id is unknown
    fn update(&self, id: RecordId, stats: &PlayerStats) -> Result<Option<PerformanceRecord>>;

    /// Returns whether a record was removed
    fn delete_by_id(&self, id: RecordId) -> Result<bool>;

    fn exists_by_id(&self, id: RecordId) -> Result<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }
}

impl PerformanceSource for Vec<PerformanceRecord> {
    fn find_all(&self) -> Result<Vec<PerformanceRecord>> {
        Ok(self.clone())
    }
}

impl<T: PerformanceSource + ?Sized> PerformanceSource for Arc<T> {
    fn find_all(&self) -> Result<Vec<PerformanceRecord>> {
        (**self).find_all()
    }
}

impl<T: PerformanceSource + ?Sized> PerformanceSource for &T {
    fn find_all(&self) -> Result<Vec<PerformanceRecord>> {
        (**self).find_all()
    }
}
