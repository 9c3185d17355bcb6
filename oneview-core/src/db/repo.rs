//! Database repository layer
//!
//! Provides query and insert operations for workspace records and the
//! key-value store backing session state.

use crate::analytics::widgets::Widget;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::state::KeyValueStore;
use crate::types::*;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Timestamp format for DATETIME columns
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// SQLite-backed workspace store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        super::schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ============================================
    // Organization operations
    // ============================================

    /// Create an organization with every integration disconnected.
    pub fn add_organization(&self, name: &str, org_type: OrgType) -> Result<Organization> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("organization name is empty".to_string()));
        }
        let integrations: Vec<Integration> = IntegrationType::ALL
            .into_iter()
            .map(|id| Integration {
                id,
                connected: false,
                api_key: None,
            })
            .collect();

        let conn = self.lock();
        conn.execute(
            "INSERT INTO organizations (name, org_type, integrations) VALUES (?1, ?2, ?3)",
            params![name, org_type.as_str(), serde_json::to_string(&integrations)?],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, name, org_type = org_type.as_str(), "Added organization");

        Ok(Organization {
            id,
            name: name.to_string(),
            org_type,
            integrations,
        })
    }

    pub fn get_organization(&self, id: i64) -> Result<Organization> {
        let conn = self.lock();
        Self::query_organization(&conn, id)
    }

    fn query_organization(conn: &Connection, id: i64) -> Result<Organization> {
        conn.query_row(
            "SELECT id, name, org_type, integrations FROM organizations WHERE id = ?1",
            params![id],
            Self::row_to_organization,
        )
        .optional()?
        .ok_or_else(|| Error::not_found("organization", id))
    }

    pub fn list_organizations(&self) -> Result<Vec<Organization>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, name, org_type, integrations FROM organizations ORDER BY id")?;
        let orgs = stmt
            .query_map([], Self::row_to_organization)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orgs)
    }

    /// Replace the state of one integration on an organization.
    pub fn update_integration(&self, org_id: i64, integration: Integration) -> Result<Organization> {
        let conn = self.lock();
        let mut org = Self::query_organization(&conn, org_id)?;
        match org.integrations.iter_mut().find(|i| i.id == integration.id) {
            Some(existing) => *existing = integration,
            None => org.integrations.push(integration),
        }
        conn.execute(
            "UPDATE organizations SET integrations = ?1 WHERE id = ?2",
            params![serde_json::to_string(&org.integrations)?, org_id],
        )?;
        tracing::info!(org_id, "Updated integration");
        Ok(org)
    }

    fn row_to_organization(row: &Row) -> rusqlite::Result<Organization> {
        let org_type_str: String = row.get("org_type")?;
        let integrations_str: String = row.get("integrations")?;

        Ok(Organization {
            id: row.get("id")?,
            name: row.get("name")?,
            org_type: OrgType::parse(&org_type_str).unwrap_or_default(),
            integrations: parse_json_column(3, &integrations_str)?,
        })
    }

    // ============================================
    // Dashboard operations
    // ============================================

    pub fn create_dashboard(&self, name: &str, owner: &str, widgets: Vec<Widget>) -> Result<Dashboard> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO dashboards (name, owner, widgets) VALUES (?1, ?2, ?3)",
            params![name, owner, serde_json::to_string(&widgets)?],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, name, owner, widgets = widgets.len(), "Created dashboard");

        Ok(Dashboard {
            id,
            name: name.to_string(),
            owner: owner.to_string(),
            widgets,
        })
    }

    pub fn get_dashboard(&self, id: i64) -> Result<Dashboard> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, name, owner, widgets FROM dashboards WHERE id = ?1",
            params![id],
            Self::row_to_dashboard,
        )
        .optional()?
        .ok_or_else(|| Error::not_found("dashboard", id))
    }

    /// Rename a dashboard and replace its widgets.
    pub fn update_dashboard(&self, id: i64, name: &str, widgets: &[Widget]) -> Result<()> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE dashboards SET name = ?1, widgets = ?2 WHERE id = ?3",
            params![name, serde_json::to_string(widgets)?, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("dashboard", id));
        }
        tracing::info!(id, name, "Updated dashboard");
        Ok(())
    }

    /// List dashboards, optionally only those of one owner.
    pub fn list_dashboards(&self, owner: Option<&str>) -> Result<Vec<Dashboard>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, owner, widgets FROM dashboards
             WHERE ?1 IS NULL OR owner = ?1
             ORDER BY id",
        )?;
        let dashboards = stmt
            .query_map(params![owner], Self::row_to_dashboard)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dashboards)
    }

    fn row_to_dashboard(row: &Row) -> rusqlite::Result<Dashboard> {
        let widgets_str: String = row.get("widgets")?;
        Ok(Dashboard {
            id: row.get("id")?,
            name: row.get("name")?,
            owner: row.get("owner")?,
            widgets: parse_json_column(3, &widgets_str)?,
        })
    }

    // ============================================
    // Alert operations
    // ============================================

    pub fn add_alert(&self, user: &str, message: &str) -> Result<Alert> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO alerts (user, message, acknowledged) VALUES (?1, ?2, 0)",
            params![user, message],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, user, "Added alert");

        Ok(Alert {
            id,
            user: user.to_string(),
            message: message.to_string(),
            acknowledged: false,
        })
    }

    pub fn get_alert(&self, id: i64) -> Result<Alert> {
        let conn = self.lock();
        Self::query_alert(&conn, id)
    }

    fn query_alert(conn: &Connection, id: i64) -> Result<Alert> {
        conn.query_row(
            "SELECT id, user, message, acknowledged FROM alerts WHERE id = ?1",
            params![id],
            Self::row_to_alert,
        )
        .optional()?
        .ok_or_else(|| Error::not_found("alert", id))
    }

    /// List alerts, optionally only those of one user.
    pub fn list_alerts(&self, user: Option<&str>) -> Result<Vec<Alert>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user, message, acknowledged FROM alerts
             WHERE ?1 IS NULL OR user = ?1
             ORDER BY id",
        )?;
        let alerts = stmt
            .query_map(params![user], Self::row_to_alert)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    /// Mark an alert acknowledged. Acknowledging twice is a no-op.
    pub fn acknowledge_alert(&self, id: i64) -> Result<Alert> {
        let conn = self.lock();
        let changed = conn.execute("UPDATE alerts SET acknowledged = 1 WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(Error::not_found("alert", id));
        }
        tracing::info!(id, "Acknowledged alert");
        Self::query_alert(&conn, id)
    }

    fn row_to_alert(row: &Row) -> rusqlite::Result<Alert> {
        Ok(Alert {
            id: row.get("id")?,
            user: row.get("user")?,
            message: row.get("message")?,
            acknowledged: row.get("acknowledged")?,
        })
    }

    // ============================================
    // User mapping operations
    // ============================================

    /// Insert or replace the mapping for `mapping.user`.
    pub fn add_user_mapping(&self, mapping: &UserMapping) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO user_mappings (user, loxo_user_id, aircall_user_id, timesheet_user_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user) DO UPDATE SET
                loxo_user_id = excluded.loxo_user_id,
                aircall_user_id = excluded.aircall_user_id,
                timesheet_user_id = excluded.timesheet_user_id
            "#,
            params![
                mapping.user,
                mapping.loxo_user_id,
                mapping.aircall_user_id,
                mapping.timesheet_user_id,
            ],
        )?;
        tracing::debug!(user = %mapping.user, "Saved user mapping");
        Ok(())
    }

    pub fn get_user_mapping(&self, user: &str) -> Result<UserMapping> {
        let conn = self.lock();
        conn.query_row(
            "SELECT user, loxo_user_id, aircall_user_id, timesheet_user_id
             FROM user_mappings WHERE user = ?1",
            params![user],
            Self::row_to_user_mapping,
        )
        .optional()?
        .ok_or_else(|| Error::not_found("user mapping", user))
    }

    pub fn list_user_mappings(&self) -> Result<Vec<UserMapping>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT user, loxo_user_id, aircall_user_id, timesheet_user_id
             FROM user_mappings ORDER BY user",
        )?;
        let mappings = stmt
            .query_map([], Self::row_to_user_mapping)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(mappings)
    }

    fn row_to_user_mapping(row: &Row) -> rusqlite::Result<UserMapping> {
        Ok(UserMapping {
            user: row.get("user")?,
            loxo_user_id: row.get("loxo_user_id")?,
            aircall_user_id: row.get("aircall_user_id")?,
            timesheet_user_id: row.get("timesheet_user_id")?,
        })
    }

    // ============================================
    // Timesheet operations
    // ============================================

    /// Store a timesheet record; the id of `record` is ignored and assigned.
    pub fn add_timesheet_record(&self, record: &TimesheetRecord) -> Result<TimesheetRecord> {
        if !record.hours.is_finite() || record.hours < 0.0 {
            return Err(Error::InvalidInput(format!(
                "timesheet hours must be a non-negative number, got {}",
                record.hours
            )));
        }
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO timesheet_records (organization_id, user_id, date, hours, billable)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.organization_id,
                record.user_id,
                record.date.format(DATETIME_FORMAT).to_string(),
                record.hours,
                record.billable,
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, user_id = %record.user_id, "Added timesheet record");

        Ok(TimesheetRecord {
            id,
            ..record.clone()
        })
    }

    pub fn get_timesheet_record(&self, id: i64) -> Result<TimesheetRecord> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, organization_id, user_id, date, hours, billable
             FROM timesheet_records WHERE id = ?1",
            params![id],
            Self::row_to_timesheet_record,
        )
        .optional()?
        .ok_or_else(|| Error::not_found("timesheet record", id))
    }

    /// List timesheet records, optionally for one organization, oldest first.
    pub fn list_timesheet_records(&self, organization_id: Option<i64>) -> Result<Vec<TimesheetRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, organization_id, user_id, date, hours, billable
             FROM timesheet_records
             WHERE ?1 IS NULL OR organization_id = ?1
             ORDER BY date, id",
        )?;
        let records = stmt
            .query_map(params![organization_id], Self::row_to_timesheet_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn row_to_timesheet_record(row: &Row) -> rusqlite::Result<TimesheetRecord> {
        let date_str: String = row.get("date")?;
        let date = NaiveDateTime::parse_from_str(&date_str, DATETIME_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(TimesheetRecord {
            id: row.get("id")?,
            organization_id: row.get("organization_id")?,
            user_id: row.get("user_id")?,
            date,
            hours: row.get("hours")?,
            billable: row.get("billable")?,
        })
    }
}

// ============================================
// Key-value store
// ============================================

impl KeyValueStore for Database {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_json_column<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Auto-match every recruiter to its ids in the integrated systems.
///
/// Loxo uses the recruiter id directly; Aircall and the timesheet system
/// prefix it with `ac-` and `ts-`.
pub fn suggest_user_mappings(data: &Dataset) -> Vec<UserMapping> {
    data.recruiters()
        .iter()
        .map(|r| UserMapping {
            user: r.name.clone(),
            loxo_user_id: Some(r.id.clone()),
            aircall_user_id: Some(format!("ac-{}", r.id)),
            timesheet_user_id: Some(format!("ts-{}", r.id)),
        })
        .collect()
}
