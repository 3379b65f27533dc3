//! Maintenance routines for the photo store.
//!
//! Two recoveries, both preview/execute pairs so the admin sees the plan
//! before anything moves:
//!
//! - **Orphan sweep**: objects with no referencing check-in row. These are
//!   left behind when an upload succeeds but the record insert fails, or
//!   when a deletion commit dies between its two phases.
//! - **Legacy-key migration**: records whose `photo_path` predates the
//!   current `{user_id}/{YYYY-MM-DD}/{HHMMSSffffff}.jpg` scheme are
//!   re-keyed from their own `(user_id, created_at)`.

use std::collections::HashSet;

use anyhow::Result;
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::db::{parse_timestamp, Database};
use crate::storage::path::{is_current_scheme, object_key};
use crate::storage::PhotoStore;

/// Objects that no check-in row references.
#[derive(Debug, Clone, Default)]
pub struct SweepPreview {
    pub orphans: Vec<String>,
}

pub fn preview_sweep(db: &Database, store: &PhotoStore) -> Result<SweepPreview> {
    let referenced: HashSet<String> = db.referenced_photo_paths()?.into_iter().collect();
    let orphans = store
        .list("")?
        .into_iter()
        .filter(|key| !referenced.contains(key))
        .collect();
    Ok(SweepPreview { orphans })
}

/// Remove the previewed orphans. Returns the number of objects deleted.
pub fn execute_sweep(store: &PhotoStore, preview: &SweepPreview) -> Result<usize> {
    let removed = store.remove(&preview.orphans)?;
    info!(removed, "orphan sweep finished");
    Ok(removed)
}

/// A single planned re-key.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub checkin_id: i64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub moves: Vec<PlannedMove>,
    /// Records that cannot be migrated, with the reason.
    pub skipped: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationResult {
    pub succeeded: Vec<PlannedMove>,
    pub failed: Vec<(String, String)>,
}

/// Find records whose object key is not in the current scheme and derive
/// the key they should have.
pub fn plan_migration(db: &Database, tz: Tz) -> Result<MigrationPlan> {
    let mut plan = MigrationPlan::default();

    for record in db.all_checkins()? {
        if is_current_scheme(&record.photo_path) {
            continue;
        }
        let created_at = match parse_timestamp(&record.created_at) {
            Some(instant) => instant,
            None => {
                plan.skipped.push((
                    record.photo_path.clone(),
                    "unparseable created_at".to_string(),
                ));
                continue;
            }
        };
        let to = object_key(record.user_id, &created_at.with_timezone(&tz));
        plan.moves.push(PlannedMove {
            checkin_id: record.id,
            from: record.photo_path,
            to,
        });
    }

    Ok(plan)
}

/// Execute a migration plan: move each object, then point its record at
/// the new key. A failed record update moves the object back so row and
/// object never disagree.
pub fn execute_migration(
    db: &Database,
    store: &PhotoStore,
    plan: &MigrationPlan,
) -> Result<MigrationResult> {
    let mut result = MigrationResult {
        failed: plan.skipped.clone(),
        ..Default::default()
    };

    for mv in &plan.moves {
        if let Err(e) = store.rename(&mv.from, &mv.to) {
            result.failed.push((mv.from.clone(), e.to_string()));
            continue;
        }
        match db.update_checkin_photo_path(mv.checkin_id, &mv.to) {
            Ok(()) => result.succeeded.push(mv.clone()),
            Err(e) => {
                warn!(from = %mv.from, to = %mv.to, "record update failed, moving object back");
                if let Err(undo) = store.rename(&mv.to, &mv.from) {
                    warn!(key = %mv.to, %undo, "undo move failed; object stranded at new key");
                }
                result.failed.push((mv.from.clone(), e.to_string()));
            }
        }
    }

    info!(
        migrated = result.succeeded.len(),
        failed = result.failed.len(),
        "legacy key migration finished"
    );
    Ok(result)
}
