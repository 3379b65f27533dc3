//! Types for check-in records.

/// One stored check-in row.
#[derive(Debug, Clone)]
pub struct CheckinRecord {
    pub id: i64,
    pub user_id: i64,
    pub photo_path: String,
    pub created_at: String, // UTC, RFC 3339 with microseconds
}

/// A check-in joined with its owner's display fields. The user columns are
/// nullable so a dangling foreign key degrades to a missing name instead of
/// a query error.
#[derive(Debug, Clone)]
pub struct CheckinWithUser {
    pub id: i64,
    pub user_id: i64,
    pub photo_path: String,
    pub created_at: String,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
}
