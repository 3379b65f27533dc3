//! Admin view restructuring: flat check-in rows into user → day groups.
//!
//! The grouped view is derived on every admin load and never cached or
//! persisted. Input arrives most-recent-first from the query; user groups
//! keep first-appearance order (most recent activity first), days are
//! sorted descending, and entries inside a day preserve the query order,
//! i.e. descending as well.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::db::{parse_timestamp, CheckinWithUser};
use crate::storage::path::parse_object_key;

#[derive(Debug, Clone, Default)]
pub struct GroupedView {
    pub users: Vec<UserGroup>,
}

#[derive(Debug, Clone)]
pub struct UserGroup {
    pub user_id: i64,
    pub name: String,
    pub role: Option<String>,
    pub days: Vec<DayGroup>,
}

#[derive(Debug, Clone)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub entries: Vec<GroupedEntry>,
}

#[derive(Debug, Clone)]
pub struct GroupedEntry {
    pub checkin_id: i64,
    pub photo_path: String,
    pub created_at: DateTime<Tz>,
}

impl GroupedView {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.users
            .iter()
            .flat_map(|u| u.days.iter())
            .map(|d| d.entries.len())
            .sum()
    }
}

impl UserGroup {
    pub fn total_entries(&self) -> usize {
        self.days.iter().map(|d| d.entries.len()).sum()
    }
}

/// Display name for a record whose user join came back empty. The object
/// key encodes ownership, so it serves as the fallback before giving up
/// and using the row's own foreign key.
fn fallback_name(record: &CheckinWithUser) -> String {
    let user_id = parse_object_key(&record.photo_path)
        .map(|parts| parts.user_id)
        .unwrap_or(record.user_id);
    format!("user {}", user_id)
}

/// Group joined rows by user, then by local calendar day.
///
/// `now` substitutes for unparseable `created_at` values: the record is
/// kept, logged as a data-quality signal, and the grouping continues.
pub fn group_records(records: &[CheckinWithUser], tz: Tz, now: DateTime<Utc>) -> GroupedView {
    let mut users: Vec<UserGroup> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for record in records {
        let created_at = match parse_timestamp(&record.created_at) {
            Some(instant) => instant.with_timezone(&tz),
            None => {
                warn!(
                    checkin_id = record.id,
                    created_at = %record.created_at,
                    "malformed check-in timestamp, substituting current time"
                );
                now.with_timezone(&tz)
            }
        };

        let user_index = *index.entry(record.user_id).or_insert_with(|| {
            users.push(UserGroup {
                user_id: record.user_id,
                name: record
                    .user_name
                    .clone()
                    .unwrap_or_else(|| fallback_name(record)),
                role: record.user_role.clone(),
                days: Vec::new(),
            });
            users.len() - 1
        });

        let day = created_at.date_naive();
        let group = &mut users[user_index];
        let day_group = match group.days.iter_mut().find(|d| d.day == day) {
            Some(existing) => existing,
            None => {
                group.days.push(DayGroup { day, entries: Vec::new() });
                group.days.last_mut().unwrap()
            }
        };
        day_group.entries.push(GroupedEntry {
            checkin_id: record.id,
            photo_path: record.photo_path.clone(),
            created_at,
        });
    }

    // Most recent day first, regardless of where substituted timestamps landed.
    for group in &mut users {
        group.days.sort_by(|a, b| b.day.cmp(&a.day));
    }

    GroupedView { users }
}
