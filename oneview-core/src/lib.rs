//! # oneview-core
//!
//! Core library for OneView Ops - staffing operations analytics.
//!
//! This library provides:
//! - The recruiting schema (dimensions and facts) with deterministic sample data
//! - Filter, metric, leaderboard, data health and report engines
//! - Dashboard aggregates, widgets and free-text dashboard requests
//! - Goal and filter state persisted through a key-value store
//! - SQLite workspace storage, configuration and logging
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Local;
//! use oneview_core::analytics::{compute_all_metrics, AnalyticsContext, FilterCriteria};
//! use oneview_core::Dataset;
//!
//! let now = Local::now().naive_local();
//! let data = Dataset::sample(now);
//! let ctx = AnalyticsContext::new(&data, now);
//! let snapshot = compute_all_metrics(&ctx, &FilterCriteria::default());
//! println!("{} calls", snapshot.total_calls);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsContext, FilterCriteria};
pub use config::Config;
pub use dataset::{Dataset, DatasetTables};
pub use db::Database;
pub use error::{Error, Result};
pub use state::{GlobalFilters, GoalBook, GoalPeriod, KeyValueStore, MemoryStore};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod state;
pub mod types;
