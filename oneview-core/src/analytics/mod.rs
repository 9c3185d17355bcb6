//! Analytics engines for oneview
//!
//! Every engine is a pure function of the loaded [`Dataset`], a reference
//! time and the current [`FilterCriteria`](filters::FilterCriteria):
//! - [`filters`]: date windows and per-fact filtering
//! - [`metrics`]: named KPIs with safe division
//! - [`leaderboards`]: individual and team rankings with goal overlay
//! - [`data_health`]: validation rules and a composite score
//! - [`reports`]: keyword-dispatched narrative reports
//! - [`dashboard`]: aggregates behind the role dashboards
//! - [`intent`]: free-text dashboard request parsing
//! - [`widgets`]: custom dashboard widget library and rendering

pub mod dashboard;
pub mod data_health;
pub mod filters;
pub mod intent;
pub mod leaderboards;
pub mod metrics;
pub mod reports;
pub mod widgets;

use crate::dataset::Dataset;
use chrono::NaiveDateTime;

pub use data_health::{
    compute_data_health_issues, compute_data_health_score, DataHealthIssue, DataHealthScore,
    IssueSeverity,
};
pub use filters::{parse_date_range, DateRange, DateWindow, FilterCriteria};
pub use leaderboards::{
    apply_goals, compute_individual_leaderboard, compute_leaderboard, compute_team_leaderboard,
    LeaderboardEntry, LeaderboardMetric, LeaderboardView,
};
pub use metrics::{compute_all_metrics, compute_metric, MetricId, MetricMetadata, MetricSnapshot};
pub use reports::{generate_ai_report, AiReport, ReportKpi, ReportTable};

/// Read-only inputs shared by every engine call.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsContext<'a> {
    /// Dimension and fact tables
    pub data: &'a Dataset,
    /// Anchor for relative date windows
    pub now: NaiveDateTime,
}

impl<'a> AnalyticsContext<'a> {
    pub fn new(data: &'a Dataset, now: NaiveDateTime) -> Self {
        Self { data, now }
    }
}
