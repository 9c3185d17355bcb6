//! Workspace store
//!
//! SQLite storage for organizations, saved dashboards, alerts, user mappings
//! and imported timesheets, plus the key-value table that backs persisted
//! session state.

pub mod repo;
pub mod schema;

pub use repo::{suggest_user_mappings, Database};
