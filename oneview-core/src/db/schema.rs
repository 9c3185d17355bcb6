//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: workspace records
    r#"
    -- ============================================
    -- Session state (JSON blobs keyed by name)
    -- ============================================

    CREATE TABLE IF NOT EXISTS kv_store (
        key              TEXT PRIMARY KEY,
        value            TEXT NOT NULL,
        updated_at       DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- ============================================
    -- Workspace
    -- ============================================

    CREATE TABLE IF NOT EXISTS organizations (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        name             TEXT NOT NULL,
        org_type         TEXT NOT NULL,
        integrations     JSON NOT NULL
    );

    CREATE TABLE IF NOT EXISTS dashboards (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        name             TEXT NOT NULL,
        owner            TEXT NOT NULL,
        widgets          JSON NOT NULL
    );

    CREATE TABLE IF NOT EXISTS alerts (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user             TEXT NOT NULL,
        message          TEXT NOT NULL,
        acknowledged     INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS user_mappings (
        user               TEXT PRIMARY KEY,
        loxo_user_id       TEXT,
        aircall_user_id    TEXT,
        timesheet_user_id  TEXT
    );
    "#,
    // Version 2: imported timesheets
    r#"
    CREATE TABLE IF NOT EXISTS timesheet_records (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id  INTEGER NOT NULL REFERENCES organizations(id),
        user_id          TEXT NOT NULL,
        date             DATETIME NOT NULL,
        hours            REAL NOT NULL,
        billable         INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_timesheet_records_org ON timesheet_records(organization_id);
    CREATE INDEX IF NOT EXISTS idx_alerts_user ON alerts(user);
    "#,
];

/// Apply every migration newer than the stored `user_version`.
///
/// Each migration and its version bump commit together.
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let from = get_schema_version(conn)?;
    if from >= SCHEMA_VERSION {
        tracing::debug!(version = from, "Schema up to date");
        return Ok(());
    }

    for (version, sql) in (1..).zip(MIGRATIONS.iter()).skip(from.max(0) as usize) {
        tracing::info!(version, "Applying migration");
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))?;
    }

    tracing::info!(from, to = SCHEMA_VERSION, "Migrations complete");
    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = [
            "kv_store",
            "organizations",
            "dashboards",
            "alerts",
            "user_mappings",
            "timesheet_records",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_partial_upgrade() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0]).unwrap();
        conn.execute_batch("PRAGMA user_version = 1").unwrap();

        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
