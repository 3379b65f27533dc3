//! Pending-deletion selection for the admin view.
//!
//! The admin marks records across the grouped view; the selection lives in
//! the session only. Commit is two-phase with a fixed order: database rows
//! first, then stored objects. A failure after the rows are gone leaves
//! orphaned objects, which a later sweep reclaims; the reverse order would
//! leave rows pointing at missing photos and break display.

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::db::Database;
use crate::storage::{PhotoStore, StoreError};

/// Records marked for deletion, keyed by check-in id with the object key
/// payload needed for the blob phase.
#[derive(Debug, Default)]
pub struct DeletionSelection {
    marked: HashMap<i64, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub rows_deleted: usize,
    pub objects_removed: usize,
}

#[derive(Debug, Error)]
pub enum DeletionError {
    #[error("deleting records failed: {0}")]
    Rows(#[source] anyhow::Error),

    /// Rows are gone but some objects remain; retrying the same selection
    /// deletes zero rows and finishes the object pass.
    #[error("records deleted but object removal failed: {source}")]
    Objects {
        rows_deleted: usize,
        #[source]
        source: StoreError,
    },
}

impl DeletionSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a record's marked state. Toggling twice restores the initial
    /// state exactly.
    pub fn toggle(&mut self, checkin_id: i64, photo_path: &str) {
        if self.marked.remove(&checkin_id).is_none() {
            self.marked.insert(checkin_id, photo_path.to_string());
        }
    }

    pub fn is_marked(&self, checkin_id: i64) -> bool {
        self.marked.contains_key(&checkin_id)
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    /// Apply the selection: rows first, then objects. The selection is
    /// cleared only on full success, so the admin can retry after any
    /// failure with the same set.
    pub fn commit(
        &mut self,
        db: &Database,
        store: &PhotoStore,
    ) -> Result<DeletionOutcome, DeletionError> {
        let ids: Vec<i64> = self.marked.keys().copied().collect();
        let paths: Vec<String> = self.marked.values().cloned().collect();

        let rows_deleted = db.delete_checkins_by_ids(&ids).map_err(DeletionError::Rows)?;
        let objects_removed = store
            .remove(&paths)
            .map_err(|source| DeletionError::Objects { rows_deleted, source })?;

        info!(rows_deleted, objects_removed, "deletion committed");
        self.clear();
        Ok(DeletionOutcome { rows_deleted, objects_removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::db::Registration;
    use tempfile::TempDir;

    fn fixtures() -> (TempDir, Database, PhotoStore) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let store = PhotoStore::open(&StorageConfig {
            root: dir.path().join("photos"),
            public_base_url: None,
        })
        .unwrap();
        (dir, db, store)
    }

    fn checked_in(db: &Database, store: &PhotoStore, key: &str) -> i64 {
        let user = db
            .upsert_user(&Registration { name: "Ana".into(), role: None, phone: None, email: None })
            .unwrap();
        store.upload(key, b"jpeg").unwrap();
        db.insert_checkin(user.id, key).unwrap().id
    }

    #[test]
    fn test_toggle_round_trip_is_identity() {
        let mut selection = DeletionSelection::new();
        assert!(selection.is_empty());

        selection.toggle(1, "1/a.jpg");
        assert!(selection.is_marked(1));
        assert_eq!(selection.len(), 1);

        selection.toggle(1, "1/a.jpg");
        assert!(!selection.is_marked(1));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_commit_removes_rows_then_objects_and_clears() {
        let (_dir, db, store) = fixtures();
        let id = checked_in(&db, &store, "1/2026-08-07/100000000000.jpg");

        let mut selection = DeletionSelection::new();
        selection.toggle(id, "1/2026-08-07/100000000000.jpg");

        let outcome = selection.commit(&db, &store).unwrap();
        assert_eq!(outcome.rows_deleted, 1);
        assert_eq!(outcome.objects_removed, 1);
        assert!(selection.is_empty());
        assert_eq!(db.checkin_count().unwrap(), 0);
        assert!(!store.exists("1/2026-08-07/100000000000.jpg"));
    }

    #[test]
    fn test_commit_failure_keeps_selection_and_retry_converges() {
        let (dir, db, store) = fixtures();
        let id = checked_in(&db, &store, "1/good.jpg");

        // A directory where an object should be makes the blob phase fail
        // with a non-NotFound error.
        let blocked = dir.path().join("photos").join("1").join("blocked.jpg");
        std::fs::create_dir_all(&blocked).unwrap();

        let mut selection = DeletionSelection::new();
        selection.toggle(id, "1/good.jpg");
        selection.toggle(999, "1/blocked.jpg");

        match selection.commit(&db, &store) {
            Err(DeletionError::Objects { rows_deleted, .. }) => assert_eq!(rows_deleted, 1),
            other => panic!("expected Objects error, got {:?}", other),
        }

        // Selection intact for retry; the row is already gone.
        assert_eq!(selection.len(), 2);
        assert_eq!(db.checkin_count().unwrap(), 0);

        // Clear the obstruction; the retry deletes zero rows and finishes
        // the object pass.
        std::fs::remove_dir(&blocked).unwrap();
        let outcome = selection.commit(&db, &store).unwrap();
        assert_eq!(outcome.rows_deleted, 0);
        assert!(selection.is_empty());
        assert!(!store.exists("1/good.jpg"));
    }
}
