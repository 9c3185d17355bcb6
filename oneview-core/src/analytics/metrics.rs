//! Named KPIs computed from filtered facts.
//!
//! Ratios return `None` when their denominator is zero so callers can render
//! a placeholder instead of NaN or infinity.

use super::filters::{filter_calls, filter_hours, filter_placements, FilterCriteria};
use super::AnalyticsContext;
use crate::format::safe_divide;
use crate::types::{Hours, OrgType, Placement};
use serde::Serialize;
use std::collections::HashSet;

/// Identifier of a KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricId {
    TotalCalls,
    TotalHours,
    CallsPerPlacement,
    HoursPerHire,
    RevenuePerRecruiter,
    RevenuePerHour,
    TimeToFill,
    Utilization,
}

impl MetricId {
    pub const ALL: [MetricId; 8] = [
        MetricId::TotalCalls,
        MetricId::TotalHours,
        MetricId::CallsPerPlacement,
        MetricId::HoursPerHire,
        MetricId::RevenuePerRecruiter,
        MetricId::RevenuePerHour,
        MetricId::TimeToFill,
        MetricId::Utilization,
    ];

    /// Stable key used in widget configs and JSON output.
    pub fn key(&self) -> &'static str {
        self.metadata().key
    }

    /// Parse a metric key; accepts camelCase keys and snake_case aliases.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key.chars().filter(|c| *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|id| id.key().eq_ignore_ascii_case(&normalized))
    }

    pub fn metadata(&self) -> &'static MetricMetadata {
        metric_metadata(*self)
    }
}

/// Static description of a KPI.
#[derive(Debug, Clone, Serialize)]
pub struct MetricMetadata {
    pub id: MetricId,
    pub key: &'static str,
    pub label: &'static str,
    /// Only meaningful for staffing agencies
    pub agency_only: bool,
    pub description: &'static str,
}

const METRICS: &[MetricMetadata] = &[
    MetricMetadata {
        id: MetricId::TotalCalls,
        key: "totalCalls",
        label: "Total Calls",
        agency_only: false,
        description: "Total number of calls made and received",
    },
    MetricMetadata {
        id: MetricId::TotalHours,
        key: "totalHours",
        label: "Total Hours Logged",
        agency_only: false,
        description: "Total hours logged across all recruiters",
    },
    MetricMetadata {
        id: MetricId::CallsPerPlacement,
        key: "callsPerPlacement",
        label: "Calls per Placement",
        agency_only: false,
        description: "Average number of calls required to make a placement",
    },
    MetricMetadata {
        id: MetricId::HoursPerHire,
        key: "hoursPerHire",
        label: "Hours per Hire",
        agency_only: false,
        description: "Average hours invested per successful hire",
    },
    MetricMetadata {
        id: MetricId::RevenuePerRecruiter,
        key: "revenuePerRecruiter",
        label: "Revenue per Recruiter",
        agency_only: true,
        description: "Average revenue generated per recruiter",
    },
    MetricMetadata {
        id: MetricId::RevenuePerHour,
        key: "revenuePerHour",
        label: "Revenue per Hour",
        agency_only: true,
        description: "Revenue efficiency: dollars earned per hour worked",
    },
    MetricMetadata {
        id: MetricId::TimeToFill,
        key: "timeToFill",
        label: "Time-to-Fill",
        agency_only: false,
        description: "Average days from job opening to placement",
    },
    MetricMetadata {
        id: MetricId::Utilization,
        key: "utilization",
        label: "Utilization %",
        agency_only: false,
        description: "Percentage of available hours logged as billable",
    },
];

/// Metadata for a metric.
pub fn metric_metadata(id: MetricId) -> &'static MetricMetadata {
    // METRICS is ordered like MetricId::ALL
    &METRICS[id as usize]
}

/// List all metrics.
pub fn list_metrics() -> &'static [MetricMetadata] {
    METRICS
}

/// Metrics shown to an organization; agency-only metrics are hidden for
/// internal talent acquisition teams.
pub fn visible_metrics(org_type: OrgType) -> Vec<&'static MetricMetadata> {
    METRICS
        .iter()
        .filter(|m| org_type.is_agency() || !m.agency_only)
        .collect()
}

fn sum_hours(hours: &[&Hours]) -> f64 {
    hours.iter().map(|h| h.hours_logged).sum()
}

fn sum_revenue(placements: &[&Placement]) -> f64 {
    placements
        .iter()
        .map(|p| p.revenue_amount.unwrap_or(0.0))
        .sum()
}

/// Count of filtered calls.
pub fn compute_total_calls(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> usize {
    filter_calls(ctx.data.calls(), filters, ctx).len()
}

/// Sum of filtered hours logged.
pub fn compute_total_hours(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> f64 {
    sum_hours(&filter_hours(ctx.data.hours(), filters, ctx))
}

/// Calls divided by placements.
pub fn compute_calls_per_placement(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Option<f64> {
    let calls = filter_calls(ctx.data.calls(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);
    safe_divide(calls.len() as f64, placements.len() as f64)
}

/// Hours divided by placements.
pub fn compute_hours_per_hire(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> Option<f64> {
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);
    safe_divide(sum_hours(&hours), placements.len() as f64)
}

/// Placement revenue divided by the distinct recruiters who placed.
pub fn compute_revenue_per_recruiter(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Option<f64> {
    let placements = filter_placements(ctx.data.placements(), filters, ctx);
    let recruiters: HashSet<&str> = placements.iter().map(|p| p.recruiter_id.as_str()).collect();
    safe_divide(sum_revenue(&placements), recruiters.len() as f64)
}

/// Placement revenue divided by hours logged.
///
/// `None` when no hours were logged, even if revenue exists.
pub fn compute_revenue_per_hour(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Option<f64> {
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);
    safe_divide(sum_revenue(&placements), sum_hours(&hours))
}

/// Mean time-to-fill in days.
pub fn compute_time_to_fill(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> Option<f64> {
    let placements = filter_placements(ctx.data.placements(), filters, ctx);
    let total_days: f64 = placements.iter().map(|p| p.time_to_fill_days as f64).sum();
    safe_divide(total_days, placements.len() as f64)
}

/// Billable share of logged hours, in percent.
///
/// Distinct work days only guard the empty case; the ratio itself is
/// billable hours over all hours.
pub fn compute_utilization(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> Option<f64> {
    let hours = filter_hours(ctx.data.hours(), filters, ctx);

    let work_days: HashSet<_> = hours.iter().map(|h| h.work_date.date()).collect();
    if work_days.is_empty() {
        return None;
    }

    let total = sum_hours(&hours);
    let billable: f64 = hours
        .iter()
        .filter(|h| h.is_billable)
        .map(|h| h.hours_logged)
        .sum();
    safe_divide(billable, total).map(|ratio| ratio * 100.0)
}

/// Compute one metric by id.
pub fn compute_metric(
    id: MetricId,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Option<f64> {
    match id {
        MetricId::TotalCalls => Some(compute_total_calls(ctx, filters) as f64),
        MetricId::TotalHours => Some(compute_total_hours(ctx, filters)),
        MetricId::CallsPerPlacement => compute_calls_per_placement(ctx, filters),
        MetricId::HoursPerHire => compute_hours_per_hire(ctx, filters),
        MetricId::RevenuePerRecruiter => compute_revenue_per_recruiter(ctx, filters),
        MetricId::RevenuePerHour => compute_revenue_per_hour(ctx, filters),
        MetricId::TimeToFill => compute_time_to_fill(ctx, filters),
        MetricId::Utilization => compute_utilization(ctx, filters),
    }
}

/// All KPIs for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub total_calls: usize,
    pub total_hours: f64,
    pub calls_per_placement: Option<f64>,
    pub hours_per_hire: Option<f64>,
    pub revenue_per_recruiter: Option<f64>,
    pub revenue_per_hour: Option<f64>,
    pub time_to_fill: Option<f64>,
    pub utilization: Option<f64>,
}

impl MetricSnapshot {
    /// Value of one metric.
    pub fn get(&self, id: MetricId) -> Option<f64> {
        match id {
            MetricId::TotalCalls => Some(self.total_calls as f64),
            MetricId::TotalHours => Some(self.total_hours),
            MetricId::CallsPerPlacement => self.calls_per_placement,
            MetricId::HoursPerHire => self.hours_per_hire,
            MetricId::RevenuePerRecruiter => self.revenue_per_recruiter,
            MetricId::RevenuePerHour => self.revenue_per_hour,
            MetricId::TimeToFill => self.time_to_fill,
            MetricId::Utilization => self.utilization,
        }
    }
}

/// Compute every metric for the current filters.
pub fn compute_all_metrics(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> MetricSnapshot {
    tracing::debug!(?filters, "Computing all metrics");
    MetricSnapshot {
        total_calls: compute_total_calls(ctx, filters),
        total_hours: compute_total_hours(ctx, filters),
        calls_per_placement: compute_calls_per_placement(ctx, filters),
        hours_per_hire: compute_hours_per_hire(ctx, filters),
        revenue_per_recruiter: compute_revenue_per_recruiter(ctx, filters),
        revenue_per_hour: compute_revenue_per_hour(ctx, filters),
        time_to_fill: compute_time_to_fill(ctx, filters),
        utilization: compute_utilization(ctx, filters),
    }
}
