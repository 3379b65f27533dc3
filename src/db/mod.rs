mod schema;
pub mod checkins;
pub mod users;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;

pub use checkins::{CheckinRecord, CheckinWithUser};
pub use users::{Registration, User};

use schema::{MIGRATIONS, SCHEMA};

/// Stored timestamp format: UTC, RFC 3339, microsecond precision.
/// Fixed-width so lexicographic comparison in SQL equals chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Render an instant in the stored timestamp format.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp back into a UTC instant. `None` on malformed
/// values; callers are expected to degrade gracefully, not abort.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// In-memory database for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        for migration in MIGRATIONS {
            let _ = self.conn.execute(migration, []);
        }
        Ok(())
    }

    // ========================================================================
    // User operations
    // ========================================================================

    /// Register an employee. With an email this is an upsert keyed on the
    /// email column (re-registering updates name/role/phone of the existing
    /// row); without one it is a plain insert. Returns the written row.
    pub fn upsert_user(&self, reg: &Registration) -> Result<User> {
        match reg.email.as_deref() {
            Some(email) => {
                self.conn.execute(
                    r#"
                    INSERT INTO users (name, role, phone, email)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(email) DO UPDATE SET
                        name = excluded.name,
                        role = excluded.role,
                        phone = excluded.phone,
                        updated_at = CURRENT_TIMESTAMP
                    "#,
                    rusqlite::params![reg.name, reg.role, reg.phone, email],
                )?;
                self.find_user_by_email(email)?
                    .ok_or_else(|| anyhow::anyhow!("upserted user not found: {}", email))
            }
            None => {
                self.conn.execute(
                    "INSERT INTO users (name, role, phone) VALUES (?, ?, ?)",
                    rusqlite::params![reg.name, reg.role, reg.phone],
                )?;
                let id = self.conn.last_insert_rowid();
                self.get_user(id)?
                    .ok_or_else(|| anyhow::anyhow!("inserted user not found: {}", id))
            }
        }
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT id, name, role, phone, email FROM users WHERE id = ?",
            [id],
            row_to_user,
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT id, name, role, phone, email FROM users WHERE email = ?",
            [email],
            row_to_user,
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All users ordered by name, for the check-in picker.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, role, phone, email FROM users ORDER BY name",
        )?;
        let users = stmt
            .query_map([], row_to_user)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(users)
    }

    pub fn user_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // Check-in operations
    // ========================================================================

    /// Insert a check-in stamped with the current UTC time.
    pub fn insert_checkin(&self, user_id: i64, photo_path: &str) -> Result<CheckinRecord> {
        self.insert_checkin_at(user_id, photo_path, Utc::now())
    }

    /// Timestamp-explicit variant, used by tests and backfill.
    pub fn insert_checkin_at(
        &self,
        user_id: i64,
        photo_path: &str,
        created_at: DateTime<Utc>,
    ) -> Result<CheckinRecord> {
        let created_at = format_timestamp(created_at);
        self.conn.execute(
            "INSERT INTO checkins (user_id, photo_path, created_at) VALUES (?, ?, ?)",
            rusqlite::params![user_id, photo_path, created_at],
        )?;
        Ok(CheckinRecord {
            id: self.conn.last_insert_rowid(),
            user_id,
            photo_path: photo_path.to_string(),
            created_at,
        })
    }

    /// Most recent check-ins for one user, newest first. The duplicate
    /// guard only needs the tail of the user's history.
    pub fn latest_checkins_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<CheckinRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, photo_path, created_at
            FROM checkins
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )?;
        let records = stmt
            .query_map(rusqlite::params![user_id, limit as i64], row_to_checkin)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// Newest-first check-ins joined with the owning user's display fields.
    /// LEFT JOIN so a dangling user reference still yields the record.
    pub fn recent_checkins_with_users(&self, limit: usize) -> Result<Vec<CheckinWithUser>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.user_id, c.photo_path, c.created_at, u.name, u.role
            FROM checkins c
            LEFT JOIN users u ON u.id = c.user_id
            ORDER BY c.created_at DESC
            LIMIT ?
            "#,
        )?;
        let records = stmt
            .query_map([limit as i64], |row| {
                Ok(CheckinWithUser {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    photo_path: row.get(2)?,
                    created_at: row.get(3)?,
                    user_name: row.get(4)?,
                    user_role: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// All check-ins, oldest first. Used by the maintenance routines.
    pub fn all_checkins(&self) -> Result<Vec<CheckinRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, photo_path, created_at FROM checkins ORDER BY created_at",
        )?;
        let records = stmt
            .query_map([], row_to_checkin)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    pub fn delete_checkins_by_ids(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders: Vec<&str> = ids.iter().map(|_| "?").collect();
        let sql = format!(
            "DELETE FROM checkins WHERE id IN ({})",
            placeholders.join(", ")
        );
        let params: Vec<&dyn rusqlite::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let count = self.conn.execute(&sql, params.as_slice())?;
        Ok(count)
    }

    /// Point a record at a new object key (legacy-key migration).
    pub fn update_checkin_photo_path(&self, id: i64, new_path: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE checkins SET photo_path = ? WHERE id = ?",
            rusqlite::params![new_path, id],
        )?;
        Ok(())
    }

    /// Every photo_path currently referenced by a record, for the orphan sweep.
    pub fn referenced_photo_paths(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT photo_path FROM checkins")?;
        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(paths)
    }

    pub fn checkin_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM checkins", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
    })
}

fn row_to_checkin(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckinRecord> {
    Ok(CheckinRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        photo_path: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn register(db: &Database, name: &str, email: Option<&str>) -> User {
        db.upsert_user(&Registration {
            name: name.to_string(),
            role: None,
            phone: None,
            email: email.map(|e| e.to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_upsert_by_email_updates_existing_row() {
        let db = test_db();
        let first = register(&db, "Ana Silva", Some("ana@x.com"));
        let second = register(&db, "Ana S. Oliveira", Some("ana@x.com"));

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ana S. Oliveira");
        assert_eq!(db.user_count().unwrap(), 1);
    }

    #[test]
    fn test_insert_without_email_always_creates() {
        let db = test_db();
        register(&db, "Maria", None);
        register(&db, "Maria", None);
        assert_eq!(db.user_count().unwrap(), 2);
    }

    #[test]
    fn test_list_users_ordered_by_name() {
        let db = test_db();
        register(&db, "Zeca", None);
        register(&db, "Ana", None);
        let names: Vec<String> = db.list_users().unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Ana".to_string(), "Zeca".to_string()]);
    }

    #[test]
    fn test_checkin_roundtrip_and_join() {
        let db = test_db();
        let user = register(&db, "Ana", Some("ana@x.com"));
        let record = db.insert_checkin(user.id, "1/2026-08-07/101500000000.jpg").unwrap();
        assert_eq!(record.user_id, user.id);

        let joined = db.recent_checkins_with_users(10).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].user_name.as_deref(), Some("Ana"));
        assert_eq!(joined[0].photo_path, record.photo_path);
    }

    #[test]
    fn test_recent_checkins_newest_first() {
        let db = test_db();
        let user = register(&db, "Ana", None);
        let t0 = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        db.insert_checkin_at(user.id, "a.jpg", t0).unwrap();
        db.insert_checkin_at(user.id, "b.jpg", t0 + chrono::Duration::hours(1)).unwrap();

        let recent = db.recent_checkins_with_users(10).unwrap();
        assert_eq!(recent[0].photo_path, "b.jpg");
        assert_eq!(recent[1].photo_path, "a.jpg");
    }

    #[test]
    fn test_delete_checkins_by_ids() {
        let db = test_db();
        let user = register(&db, "Ana", None);
        let a = db.insert_checkin(user.id, "a.jpg").unwrap();
        let b = db.insert_checkin(user.id, "b.jpg").unwrap();
        db.insert_checkin(user.id, "c.jpg").unwrap();

        let deleted = db.delete_checkins_by_ids(&[a.id, b.id]).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.checkin_count().unwrap(), 1);

        // Re-deleting already-removed ids is a no-op, not an error.
        assert_eq!(db.delete_checkins_by_ids(&[a.id]).unwrap(), 0);
        assert_eq!(db.delete_checkins_by_ids(&[]).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_photo_path_rejected() {
        let db = test_db();
        let user = register(&db, "Ana", None);
        db.insert_checkin(user.id, "same.jpg").unwrap();
        assert!(db.insert_checkin(user.id, "same.jpg").is_err());
    }
}
