pub const SCHEMA: &str = r#"
-- Users table: registered employees
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    role TEXT,
    phone TEXT,
    email TEXT UNIQUE,       -- stored trimmed + lower-cased; NULL when not supplied
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);

-- Check-ins: one row per photo submission
CREATE TABLE IF NOT EXISTS checkins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    photo_path TEXT NOT NULL UNIQUE,  -- object key in the photo store
    created_at TEXT NOT NULL,         -- UTC, RFC 3339 with microseconds, set at insert
    FOREIGN KEY (user_id) REFERENCES users(id)
);

-- Indexes for the guard window query and the admin view
CREATE INDEX IF NOT EXISTS idx_checkins_user_created ON checkins(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_checkins_created ON checkins(created_at);
"#;

/// Migrations applied after the base schema. Each statement must be safe
/// to re-run; failures are ignored (column may already exist).
pub const MIGRATIONS: &[&str] = &[];
