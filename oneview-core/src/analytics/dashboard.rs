//! Aggregates behind the leadership, recruiter, ops and funnel dashboards.

use super::data_health::{compute_data_health_issues, compute_data_health_score, IssueSeverity};
use super::filters::{
    filter_calls, filter_hours, filter_pipeline, filter_placements, recruiter_slug,
    FilterCriteria,
};
use super::AnalyticsContext;
use crate::types::{Hours, PipelineEvent, PipelineStage, Placement};
use serde::Serialize;

/// Assumed margin on placement revenue.
pub const MARGIN_RATE: f64 = 0.25;

/// Share of placements that remain active contractors.
pub const CONTRACTOR_RATE: f64 = 0.6;

/// Headline totals for the leadership dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub calls: usize,
    pub hours: f64,
    pub pipeline_moves: usize,
    pub placements: usize,
    pub interviews: usize,
    pub offers: usize,
    pub revenue: f64,
    pub margin: f64,
    pub active_contractors: usize,
    pub active_recruiters: usize,
}

fn total_hours(hours: &[&Hours]) -> f64 {
    hours.iter().map(|h| h.hours_logged).sum()
}

fn billable_hours(hours: &[&Hours]) -> f64 {
    hours
        .iter()
        .filter(|h| h.is_billable)
        .map(|h| h.hours_logged)
        .sum()
}

fn total_revenue(placements: &[&Placement]) -> f64 {
    placements
        .iter()
        .map(|p| p.revenue_amount.unwrap_or(0.0))
        .sum()
}

fn count_stage(pipeline: &[&PipelineEvent], stage: PipelineStage) -> usize {
    pipeline.iter().filter(|p| p.stage == stage).count()
}

fn active_contractors(placements: usize) -> usize {
    (placements as f64 * CONTRACTOR_RATE).floor() as usize
}

/// Leadership dashboard totals.
pub fn generate_dashboard_metrics(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> DashboardMetrics {
    let calls = filter_calls(ctx.data.calls(), filters, ctx);
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let pipeline = filter_pipeline(ctx.data.pipeline(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);

    let revenue = total_revenue(&placements);
    DashboardMetrics {
        calls: calls.len(),
        hours: total_hours(&hours),
        pipeline_moves: pipeline.len(),
        placements: placements.len(),
        interviews: count_stage(&pipeline, PipelineStage::Interview),
        offers: count_stage(&pipeline, PipelineStage::Offer),
        revenue,
        margin: revenue * MARGIN_RATE,
        active_contractors: active_contractors(placements.len()),
        active_recruiters: ctx.data.recruiters().iter().filter(|r| r.is_active).count(),
    }
}

/// One funnel stage with its reference conversion percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelStage {
    pub stage: &'static str,
    pub value: u64,
    pub conversion: u32,
}

/// Activity-to-outcome funnel.
pub fn generate_funnel_data(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<FunnelStage> {
    let calls = filter_calls(ctx.data.calls(), filters, ctx);
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let pipeline = filter_pipeline(ctx.data.pipeline(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);

    let stages = [
        ("Calls", calls.len() as u64, 100),
        ("Hours", total_hours(&hours).round() as u64, 85),
        ("Submissions", count_stage(&pipeline, PipelineStage::Submitted) as u64, 65),
        ("Interviews", count_stage(&pipeline, PipelineStage::Interview) as u64, 45),
        ("Offers", count_stage(&pipeline, PipelineStage::Offer) as u64, 25),
        ("Placements", placements.len() as u64, 15),
    ];
    stages
        .into_iter()
        .map(|(stage, value, conversion)| FunnelStage {
            stage,
            value,
            conversion,
        })
        .collect()
}

/// One month of the illustrative trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub month: &'static str,
    pub placements: i64,
    pub calls: i64,
    pub hours: i64,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Twelve-month trend series. Independent of filters.
pub fn generate_trend_data() -> Vec<TrendPoint> {
    MONTHS
        .into_iter()
        .enumerate()
        .map(|(idx, month)| {
            let i = idx as f64;
            TrendPoint {
                month,
                placements: 8 + (i.sin() * 3.0).floor() as i64 + (idx % 3) as i64,
                calls: 180 + (i.cos() * 30.0).floor() as i64 + idx as i64 * 5,
                hours: 140 + (i.sin() * 20.0).floor() as i64 + idx as i64 * 2,
            }
        })
        .collect()
}

/// Activity summary for the recruiter dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterMetrics {
    pub total_calls: usize,
    pub total_hours: u64,
    pub billable_hours: u64,
    /// Whole minutes
    pub avg_call_duration: u64,
    pub pipeline_moves: usize,
    pub placements: usize,
    pub interviews: usize,
    pub offers: usize,
}

pub fn generate_recruiter_metrics(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> RecruiterMetrics {
    let calls = filter_calls(ctx.data.calls(), filters, ctx);
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let pipeline = filter_pipeline(ctx.data.pipeline(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);

    let avg_call_duration = if calls.is_empty() {
        0
    } else {
        let total_sec: f64 = calls.iter().map(|c| c.duration_sec as f64).sum();
        (total_sec / calls.len() as f64 / 60.0).round() as u64
    };

    RecruiterMetrics {
        total_calls: calls.len(),
        total_hours: total_hours(&hours).round() as u64,
        billable_hours: billable_hours(&hours).round() as u64,
        avg_call_duration,
        pipeline_moves: pipeline.len(),
        placements: placements.len(),
        interviews: count_stage(&pipeline, PipelineStage::Interview),
        offers: count_stage(&pipeline, PipelineStage::Offer),
    }
}

/// Workload level derived from long-day timesheet warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BurnoutRisk {
    Low,
    Elevated,
}

/// Ops/HR dashboard summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsMetrics {
    /// Whole percent of hours that are billable
    pub utilization: u32,
    pub burnout_risk: BurnoutRisk,
    /// Data health score of the current selection
    pub data_completeness: u32,
    pub active_contractors: usize,
}

pub fn generate_ops_metrics(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> OpsMetrics {
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let total = total_hours(&hours);
    let utilization = if total > 0.0 {
        (billable_hours(&hours) / total * 100.0).round() as u32
    } else {
        0
    };

    let issues = compute_data_health_issues(ctx, filters);
    let burnout_risk = if issues.iter().any(|i| i.severity == IssueSeverity::Warning) {
        BurnoutRisk::Elevated
    } else {
        BurnoutRisk::Low
    };
    let score = compute_data_health_score(&issues, ctx.data);

    OpsMetrics {
        utilization,
        burnout_risk,
        data_completeness: score.overall,
        active_contractors: active_contractors(
            filter_placements(ctx.data.placements(), filters, ctx).len(),
        ),
    }
}

/// Effort-to-outcome ratios for the funnel analysis page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelAnalysis {
    pub calls: usize,
    pub hours: u64,
    pub outcomes: usize,
    /// Calls spread over a 30-day month
    pub avg_calls_per_day: u64,
    pub hours_per_call: f64,
    pub calls_per_outcome: u64,
    pub hours_per_outcome: u64,
    /// Percent of calls that became placements
    pub conversion_rate: f64,
}

pub fn generate_funnel_analysis(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> FunnelAnalysis {
    let calls = filter_calls(ctx.data.calls(), filters, ctx).len();
    let hours = total_hours(&filter_hours(ctx.data.hours(), filters, ctx));
    let outcomes = filter_placements(ctx.data.placements(), filters, ctx).len();

    let per_outcome = |value: f64| {
        if outcomes > 0 {
            (value / outcomes as f64).round() as u64
        } else {
            0
        }
    };

    FunnelAnalysis {
        calls,
        hours: hours.round() as u64,
        outcomes,
        avg_calls_per_day: (calls as f64 / 30.0).round() as u64,
        hours_per_call: if calls > 0 { hours / calls as f64 } else { 0.0 },
        calls_per_outcome: per_outcome(calls as f64),
        hours_per_outcome: per_outcome(hours),
        conversion_rate: if calls > 0 {
            outcomes as f64 / calls as f64 * 100.0
        } else {
            0.0
        },
    }
}

/// Per-recruiter effort and outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformer {
    pub name: String,
    pub calls: usize,
    pub hours: u64,
    pub outcomes: usize,
    /// Placements per hour logged
    pub efficiency: f64,
}

/// The first five recruiters with their own slice of the filtered data.
pub fn generate_top_performers(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<TopPerformer> {
    ctx.data
        .recruiters()
        .iter()
        .take(5)
        .map(|recruiter| {
            let scoped = filters.clone().with_recruiter(recruiter_slug(&recruiter.name));
            let calls = filter_calls(ctx.data.calls(), &scoped, ctx).len();
            let hours = total_hours(&filter_hours(ctx.data.hours(), &scoped, ctx));
            let outcomes = filter_placements(ctx.data.placements(), &scoped, ctx).len();

            TopPerformer {
                name: recruiter.name.clone(),
                calls,
                hours: hours.round() as u64,
                outcomes,
                efficiency: if hours > 0.0 { outcomes as f64 / hours } else { 0.0 },
            }
        })
        .collect()
}

/// A pipeline event joined with its job and recruiter for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineActivity {
    pub candidate: String,
    pub from_stage: &'static str,
    pub to_stage: &'static str,
    pub job: String,
    pub recruiter: String,
    pub date: String,
    pub status: &'static str,
}

fn describe_move(
    ctx: &AnalyticsContext<'_>,
    event: &PipelineEvent,
    status: &'static str,
) -> PipelineActivity {
    let candidate_number = event
        .candidate_id
        .split_once('-')
        .map(|(_, n)| n)
        .unwrap_or(&event.candidate_id);

    PipelineActivity {
        candidate: format!("Candidate {candidate_number}"),
        from_stage: if event.stage == PipelineStage::Sourced {
            "New"
        } else {
            "Previous Stage"
        },
        to_stage: event.stage.display_name(),
        job: ctx
            .data
            .job(&event.job_id)
            .map(|j| j.title.clone())
            .unwrap_or_else(|| "Unknown Job".to_string()),
        recruiter: ctx
            .data
            .recruiter(&event.recruiter_id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        date: event.stage_start.format("%Y-%m-%d").to_string(),
        status,
    }
}

/// The first ten filtered pipeline moves.
pub fn generate_pipeline_movement(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<PipelineActivity> {
    filter_pipeline(ctx.data.pipeline(), filters, ctx)
        .into_iter()
        .take(10)
        .map(|event| describe_move(ctx, event, "Moved"))
        .collect()
}

/// The first five interviews in the selection.
pub fn generate_interview_activity(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<PipelineActivity> {
    filter_pipeline(ctx.data.pipeline(), filters, ctx)
        .into_iter()
        .filter(|p| p.stage == PipelineStage::Interview)
        .take(5)
        .map(|event| describe_move(ctx, event, "Scheduled"))
        .collect()
}

/// The first five offers; an offer that has ended counts as accepted.
pub fn generate_offer_activity(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<PipelineActivity> {
    filter_pipeline(ctx.data.pipeline(), filters, ctx)
        .into_iter()
        .filter(|p| p.stage == PipelineStage::Offer)
        .take(5)
        .map(|event| {
            let status = if event.stage_end.is_some() {
                "Accepted"
            } else {
                "Pending"
            };
            describe_move(ctx, event, status)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::metrics::compute_all_metrics;
    use crate::dataset::Dataset;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_dashboard_metrics_match_metric_engine() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let filters = FilterCriteria::default();

        let dashboard = generate_dashboard_metrics(&ctx, &filters);
        let metrics = compute_all_metrics(&ctx, &filters);
        assert_eq!(dashboard.calls, metrics.total_calls);
        assert_eq!(dashboard.hours, metrics.total_hours);
        assert_eq!(dashboard.margin, dashboard.revenue * 0.25);
        assert_eq!(
            dashboard.active_contractors,
            (dashboard.placements as f64 * 0.6).floor() as usize
        );
        assert_eq!(dashboard.active_recruiters, 5);
    }

    #[test]
    fn test_funnel_stages() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let funnel = generate_funnel_data(&ctx, &FilterCriteria::default());

        let labels: Vec<_> = funnel.iter().map(|s| s.stage).collect();
        assert_eq!(
            labels,
            vec!["Calls", "Hours", "Submissions", "Interviews", "Offers", "Placements"]
        );
        let conversions: Vec<_> = funnel.iter().map(|s| s.conversion).collect();
        assert_eq!(conversions, vec![100, 85, 65, 45, 25, 15]);
    }

    #[test]
    fn test_trend_data() {
        let trend = generate_trend_data();
        assert_eq!(trend.len(), 12);
        assert_eq!(
            trend[0],
            TrendPoint {
                month: "Jan",
                placements: 8,
                calls: 210,
                hours: 140
            }
        );
        // sin(1) * 3 = 2.52, idx % 3 = 1
        assert_eq!(trend[1].placements, 11);
    }

    #[test]
    fn test_pipeline_movement_joins() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let moves = generate_pipeline_movement(&ctx, &FilterCriteria::default());

        assert!(moves.len() <= 10);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.job != "Unknown Job"));
        assert!(moves.iter().all(|m| m.candidate.starts_with("Candidate ")));
    }

    #[test]
    fn test_top_performers_and_ops() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let filters = FilterCriteria::default();

        let performers = generate_top_performers(&ctx, &filters);
        assert_eq!(performers.len(), 5);
        assert_eq!(performers[0].name, "Sarah Johnson");
        assert!(performers[4].calls > performers[0].calls);

        let ops = generate_ops_metrics(&ctx, &filters);
        assert_eq!(ops.utilization, 100);
        assert_eq!(ops.burnout_risk, BurnoutRisk::Low);
        assert_eq!(ops.data_completeness, 100);
    }

    #[test]
    fn test_funnel_analysis_empty() {
        let data = Dataset::default();
        let ctx = AnalyticsContext::new(&data, now());
        let analysis = generate_funnel_analysis(&ctx, &FilterCriteria::default());
        assert_eq!(analysis.calls, 0);
        assert_eq!(analysis.calls_per_outcome, 0);
        assert_eq!(analysis.hours_per_call, 0.0);
        assert_eq!(analysis.conversion_rate, 0.0);
    }
}
