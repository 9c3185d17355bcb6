//! Keyword-dispatched narrative reports.
//!
//! A query is lowercased, a date range is inferred from it, and the first
//! matching rule in [`REPORT_RULES`] builds the report. Output is fully
//! determined by the dataset, the query text and the filters.

use super::filters::{filter_placements, recruiter_slug, DateRange, FilterCriteria};
use super::metrics::{compute_revenue_per_hour, compute_total_calls, compute_total_hours};
use super::AnalyticsContext;
use crate::format::{format_currency, PLACEHOLDER};
use serde::Serialize;
use std::cmp::Ordering;

/// A headline figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportKpi {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}

impl ReportKpi {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            change: None,
        }
    }
}

/// Tabular breakdown; every row has one cell per header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiReport {
    pub title: String,
    pub kpis: Vec<ReportKpi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<ReportTable>,
    pub narrative: String,
}

/// One dispatch rule: the first rule whose predicate matches builds the report.
pub struct ReportRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub build: fn(&AnalyticsContext<'_>, &FilterCriteria) -> AiReport,
}

/// Rules in priority order.
pub const REPORT_RULES: &[ReportRule] = &[
    ReportRule {
        name: "placement_drop",
        matches: asks_about_placement_drop,
        build: placement_drop_report,
    },
    ReportRule {
        name: "roi_per_hour",
        matches: asks_about_roi,
        build: roi_per_hour_report,
    },
    ReportRule {
        name: "job_effort",
        matches: asks_about_job_effort,
        build: job_effort_report,
    },
];

fn asks_about_placement_drop(q: &str) -> bool {
    q.contains("placement") && (q.contains("drop") || q.contains("decrease"))
}

fn asks_about_roi(q: &str) -> bool {
    q.contains("roi") && q.contains("hour")
}

fn asks_about_job_effort(q: &str) -> bool {
    q.contains("job") && q.contains("effort")
}

/// Date range implied by a query; defaults to the last 30 days.
pub fn infer_date_range(query: &str) -> DateRange {
    let q = query.to_lowercase();
    if q.contains("last month") {
        DateRange::LastMonth
    } else if q.contains("last 90 days") || q.contains("last quarter") {
        DateRange::Last90Days
    } else if q.contains("this year") {
        DateRange::ThisYear
    } else {
        DateRange::Last30Days
    }
}

/// Generate a report for a free-text question.
///
/// The inferred date range replaces the one in `filters`; the other criteria
/// are kept.
pub fn generate_ai_report(
    query: &str,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> AiReport {
    let q = query.to_lowercase();
    let filters = filters.clone().with_date_range(infer_date_range(&q));

    match REPORT_RULES.iter().find(|rule| (rule.matches)(&q)) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, query, "Generating report");
            (rule.build)(ctx, &filters)
        }
        None => {
            tracing::debug!(query, "No report rule matched, using overview");
            overview_report(ctx, &filters)
        }
    }
}

fn placement_drop_report(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> AiReport {
    let last_month = filters.clone().with_date_range(DateRange::LastMonth);
    let trailing = filters.clone().with_date_range(DateRange::Last90Days);

    let last_month_placements = filter_placements(ctx.data.placements(), &last_month, ctx);
    let trailing_count = filter_placements(ctx.data.placements(), &trailing, ctx).len();

    let last_month_count = last_month_placements.len();
    // Rough previous period: the trailing 90 days minus last month
    let previous_count = trailing_count.saturating_sub(last_month_count);
    let change = if previous_count > 0 {
        (last_month_count as f64 - previous_count as f64) / previous_count as f64 * 100.0
    } else {
        0.0
    };

    let calls = compute_total_calls(ctx, &last_month);
    let hours = compute_total_hours(ctx, &last_month);

    let mut by_recruiter: Vec<(&str, usize)> = ctx
        .data
        .recruiters()
        .iter()
        .map(|r| {
            let count = last_month_placements
                .iter()
                .filter(|p| p.recruiter_id == r.id)
                .count();
            (r.name.as_str(), count)
        })
        .collect();
    by_recruiter.sort_by(|a, b| b.1.cmp(&a.1));

    let direction = if change >= 0.0 { "increase" } else { "decrease" };
    let leader = by_recruiter
        .first()
        .map(|(name, count)| format!(" {name} led with {count} placements."))
        .unwrap_or_default();
    let outlook = if change < 0.0 {
        "The decrease may be attributed to seasonal factors, pipeline gaps, or reduced activity levels. Consider reviewing pipeline health and recruiter workload distribution."
    } else {
        "The increase indicates strong performance and effective pipeline management."
    };

    AiReport {
        title: "Placement Analysis: Last Month".to_string(),
        kpis: vec![
            ReportKpi {
                change: Some(format!(
                    "{}{change:.1}%",
                    if change > 0.0 { "+" } else { "" }
                )),
                ..ReportKpi::new("Placements", last_month_count.to_string())
            },
            ReportKpi::new("Total Calls", calls.to_string()),
            ReportKpi::new("Total Hours", format!("{hours:.0}")),
        ],
        table: Some(ReportTable {
            headers: vec!["Recruiter".to_string(), "Placements".to_string()],
            rows: by_recruiter
                .iter()
                .map(|(name, count)| vec![name.to_string(), count.to_string()])
                .collect(),
        }),
        narrative: format!(
            "Last month saw {last_month_count} placements, representing a {:.1}% {direction} compared to the previous period. The team logged {calls} calls and {hours:.0} hours.{leader} {outlook}",
            change.abs()
        ),
    }
}

struct RecruiterRoi<'a> {
    name: &'a str,
    hours: f64,
    revenue: f64,
    roi: f64,
}

fn roi_per_hour_report(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> AiReport {
    let team_average = compute_revenue_per_hour(ctx, filters);

    let mut rows: Vec<RecruiterRoi<'_>> = ctx
        .data
        .recruiters()
        .iter()
        .map(|r| {
            let scoped = filters.clone().with_recruiter(recruiter_slug(&r.name));
            let hours = compute_total_hours(ctx, &scoped);
            let revenue: f64 = filter_placements(ctx.data.placements(), &scoped, ctx)
                .iter()
                .map(|p| p.revenue_amount.unwrap_or(0.0))
                .sum();
            let roi = if hours > 0.0 { revenue / hours } else { 0.0 };
            RecruiterRoi {
                name: &r.name,
                hours,
                revenue,
                roi,
            }
        })
        .collect();
    // Ranked on the displayed (whole dollar) value
    rows.sort_by(|a, b| {
        b.roi
            .round()
            .partial_cmp(&a.roi.round())
            .unwrap_or(Ordering::Equal)
    });

    let average = team_average
        .map(|v| format!("${v:.0}"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut kpis = vec![ReportKpi::new("Team Avg ROI/Hour", average.clone())];
    let narrative = match rows.first() {
        Some(top) => {
            kpis.push(ReportKpi::new("Top Performer", top.name));
            kpis.push(ReportKpi::new("Top ROI/Hour", format!("${:.0}", top.roi)));
            format!(
                "{name} demonstrates the highest ROI per hour at ${roi:.0}, having generated {revenue} in revenue from {hours:.1} hours worked. The team average is {average} per hour. This metric highlights efficiency in converting time investment into revenue outcomes. Consider analyzing {name}'s approach and sharing best practices with the team.",
                name = top.name,
                roi = top.roi,
                revenue = format_currency(Some(top.revenue)),
                hours = top.hours,
            )
        }
        None => format!("No recruiters are available to rank. The team average is {average} per hour."),
    };

    AiReport {
        title: "ROI per Hour Analysis".to_string(),
        kpis,
        table: Some(ReportTable {
            headers: ["Recruiter", "Hours", "Revenue", "ROI/Hour"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| {
                    vec![
                        r.name.to_string(),
                        format!("{:.1}", r.hours),
                        format_currency(Some(r.revenue)),
                        format!("${:.0}", r.roi),
                    ]
                })
                .collect(),
        }),
        narrative,
    }
}

/// Totals for calls, hours and placements under `filters`.
fn activity_totals(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> (usize, f64, usize) {
    (
        compute_total_calls(ctx, filters),
        compute_total_hours(ctx, filters),
        filter_placements(ctx.data.placements(), filters, ctx).len(),
    )
}

fn activity_kpis(calls: usize, hours: f64, placements: usize) -> Vec<ReportKpi> {
    vec![
        ReportKpi::new("Total Calls", calls.to_string()),
        ReportKpi::new("Total Hours", format!("{hours:.0}")),
        ReportKpi::new("Placements", placements.to_string()),
    ]
}

fn job_effort_report(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> AiReport {
    let (calls, hours, placements) = activity_totals(ctx, filters);
    AiReport {
        title: "Job Effort Analysis".to_string(),
        kpis: activity_kpis(calls, hours, placements),
        table: None,
        narrative: format!(
            "Across all active jobs, the team has invested {calls} calls and {hours:.0} hours, resulting in {placements} placements. To identify jobs burning the most effort without results, review jobs with high activity but low conversion rates. Consider reallocating resources from low-performing requisitions to higher-potential opportunities."
        ),
    }
}

fn overview_report(ctx: &AnalyticsContext<'_>, filters: &FilterCriteria) -> AiReport {
    let (calls, hours, placements) = activity_totals(ctx, filters);
    AiReport {
        title: "Performance Overview".to_string(),
        kpis: activity_kpis(calls, hours, placements),
        table: None,
        narrative: format!(
            "Based on your query, here's a performance overview for the selected period. The team made {calls} calls, logged {hours:.0} hours, and achieved {placements} placements. For more specific insights, try queries like \"Why did placements drop last month?\" or \"Who has the best ROI per hour?\""
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_infer_date_range() {
        assert_eq!(infer_date_range("Why did placements drop LAST MONTH?"), DateRange::LastMonth);
        assert_eq!(infer_date_range("calls over the last quarter"), DateRange::Last90Days);
        assert_eq!(infer_date_range("hours this year"), DateRange::ThisYear);
        assert_eq!(infer_date_range("anything"), DateRange::Last30Days);
    }

    #[test]
    fn test_placement_drop_report() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let report = generate_ai_report(
            "Why did placements drop last month?",
            &ctx,
            &FilterCriteria::default(),
        );

        assert_eq!(report.title, "Placement Analysis: Last Month");
        assert_eq!(report.kpis[0].value, "11");
        assert_eq!(report.kpis[0].change.as_deref(), Some("+266.7%"));
        let table = report.table.unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[0], vec!["Emily Rodriguez".to_string(), "3".to_string()]);
        assert!(report.narrative.contains("Emily Rodriguez led with 3 placements."));
        assert!(report.narrative.contains("266.7% increase"));
    }

    #[test]
    fn test_roi_report_ranks_by_rounded_roi() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let report = generate_ai_report("Who has the best ROI per hour?", &ctx, &FilterCriteria::default());

        assert_eq!(report.title, "ROI per Hour Analysis");
        assert_eq!(report.kpis.len(), 3);
        let table = report.table.unwrap();
        assert_eq!(table.headers.len(), 4);
        let rois: Vec<f64> = table
            .rows
            .iter()
            .map(|row| row[3].trim_start_matches('$').parse().unwrap())
            .collect();
        assert!(rois.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(report.kpis[1].value, table.rows[0][0]);
    }

    #[test]
    fn test_rule_priority_and_fallback() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let filters = FilterCriteria::default();

        // Placement drop wins over job effort
        let report = generate_ai_report("job effort and placement decrease", &ctx, &filters);
        assert_eq!(report.title, "Placement Analysis: Last Month");

        let report = generate_ai_report("Which jobs are burning most effort?", &ctx, &filters);
        assert_eq!(report.title, "Job Effort Analysis");
        assert!(report.table.is_none());

        let report = generate_ai_report("How are we doing?", &ctx, &filters);
        assert_eq!(report.title, "Performance Overview");
        assert_eq!(report.kpis.len(), 3);
    }

    #[test]
    fn test_reports_are_deterministic() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let filters = FilterCriteria::default().with_client("techcorp-inc");
        for query in ["placement drop", "roi per hour", "job effort", "hello"] {
            assert_eq!(
                generate_ai_report(query, &ctx, &filters),
                generate_ai_report(query, &ctx, &filters)
            );
        }
    }
}
