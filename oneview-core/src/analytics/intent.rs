//! Free-text dashboard requests.
//!
//! "Show me recruiter activity by client this week" resolves to a dashboard
//! template, a date range and an optional grouping through ordered keyword
//! rules; the first matching rule wins.

use super::filters::DateRange;
use serde::Serialize;

/// Prebuilt dashboard a request can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTemplate {
    Leadership,
    Recruiter,
    OpsHr,
    FunnelAnalysis,
}

impl DashboardTemplate {
    pub fn label(&self) -> &'static str {
        match self {
            DashboardTemplate::Leadership => "Leadership Dashboard",
            DashboardTemplate::Recruiter => "Recruiter Dashboard",
            DashboardTemplate::OpsHr => "Ops/HR Dashboard",
            DashboardTemplate::FunnelAnalysis => "Funnel Analysis",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            DashboardTemplate::Leadership => "/dashboard/leadership",
            DashboardTemplate::Recruiter => "/dashboard/recruiter",
            DashboardTemplate::OpsHr => "/dashboard/ops",
            DashboardTemplate::FunnelAnalysis => "/analysis/funnel",
        }
    }
}

/// Requested grouping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Client,
    Recruiter,
    Team,
}

/// Parsed dashboard request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardIntent {
    pub template: DashboardTemplate,
    pub path: &'static str,
    pub date_range: DateRange,
    pub group_by: Option<GroupBy>,
}

type Rule<T> = (fn(&str) -> bool, T);

const TEMPLATE_RULES: &[Rule<DashboardTemplate>] = &[
    (mentions_recruiter, DashboardTemplate::Recruiter),
    (mentions_ops, DashboardTemplate::OpsHr),
    (mentions_funnel, DashboardTemplate::FunnelAnalysis),
];

const DATE_RULES: &[Rule<DateRange>] = &[
    (mentions_week, DateRange::Last7Days),
    (mentions_month, DateRange::Last30Days),
    (mentions_quarter, DateRange::Last90Days),
    (mentions_year, DateRange::ThisYear),
];

const GROUP_RULES: &[(&str, GroupBy)] = &[
    ("by client", GroupBy::Client),
    ("by recruiter", GroupBy::Recruiter),
    ("by team", GroupBy::Team),
];

fn mentions_recruiter(q: &str) -> bool {
    q.contains("recruiter")
}

fn mentions_ops(q: &str) -> bool {
    q.contains("ops") || q.contains("utilization") || q.contains("contractor")
}

fn mentions_funnel(q: &str) -> bool {
    q.contains("funnel")
}

fn mentions_week(q: &str) -> bool {
    q.contains("last week") || q.contains("this week")
}

fn mentions_month(q: &str) -> bool {
    q.contains("last month") || q.contains("this month")
}

fn mentions_quarter(q: &str) -> bool {
    q.contains("q1") || q.contains("quarter")
}

fn mentions_year(q: &str) -> bool {
    q.contains("year") || q.contains("ytd")
}

fn first_match<T: Copy>(rules: &[Rule<T>], q: &str) -> Option<T> {
    rules
        .iter()
        .find(|(matches, _)| matches(q))
        .map(|(_, value)| *value)
}

/// Parse a dashboard request.
///
/// Unmatched requests open the leadership dashboard over the last 30 days.
pub fn parse_dashboard_query(query: &str) -> DashboardIntent {
    let q = query.to_lowercase();

    let template = first_match(TEMPLATE_RULES, &q).unwrap_or(DashboardTemplate::Leadership);
    let date_range = first_match(DATE_RULES, &q).unwrap_or_default();
    let group_by = GROUP_RULES
        .iter()
        .find(|(phrase, _)| q.contains(phrase))
        .map(|(_, group)| *group);

    tracing::debug!(query, ?template, ?date_range, ?group_by, "Parsed dashboard query");
    DashboardIntent {
        template,
        path: template.path(),
        date_range,
        group_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        assert_eq!(
            parse_dashboard_query("Show recruiter interviews").template,
            DashboardTemplate::Recruiter
        );
        assert_eq!(
            parse_dashboard_query("Contractor utilization").template,
            DashboardTemplate::OpsHr
        );
        assert_eq!(
            parse_dashboard_query("funnel for Q1").template,
            DashboardTemplate::FunnelAnalysis
        );
        let intent = parse_dashboard_query("revenue and margin");
        assert_eq!(intent.template, DashboardTemplate::Leadership);
        assert_eq!(intent.path, "/dashboard/leadership");
    }

    #[test]
    fn test_date_hints() {
        assert_eq!(parse_dashboard_query("calls this week").date_range, DateRange::Last7Days);
        assert_eq!(parse_dashboard_query("placements last month").date_range, DateRange::Last30Days);
        assert_eq!(parse_dashboard_query("Q1 offers").date_range, DateRange::Last90Days);
        assert_eq!(parse_dashboard_query("revenue YTD").date_range, DateRange::ThisYear);
        assert_eq!(parse_dashboard_query("revenue").date_range, DateRange::Last30Days);
    }

    #[test]
    fn test_group_by() {
        assert_eq!(
            parse_dashboard_query("placements by client").group_by,
            Some(GroupBy::Client)
        );
        assert_eq!(parse_dashboard_query("hours by team").group_by, Some(GroupBy::Team));
        assert_eq!(parse_dashboard_query("hours").group_by, None);
    }
}
