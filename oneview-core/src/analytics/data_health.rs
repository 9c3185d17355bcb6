//! Data health rules and scoring.
//!
//! Four fixed rules run over the filtered facts:
//!
//! | Severity | Rule |
//! |----------|------|
//! | flagged | call or timesheet without a recruiter email |
//! | invalid | zero-duration call not marked as missed |
//! | warning | more than 16 hours logged by one recruiter on one day |
//! | quarantined | placement whose job is not in the job dimension |
//!
//! The score divides the issue count by the unfiltered record count, so
//! narrowing filters lowers the number of issues but not the denominator.

use super::filters::{filter_calls, filter_hours, filter_placements, FilterCriteria};
use super::AnalyticsContext;
use crate::dataset::Dataset;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Hours per recruiter per day above which a timesheet day is suspicious.
pub const MAX_DAILY_HOURS: f64 = 16.0;

/// Severity of a data health issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Flagged,
    Invalid,
    Warning,
    Quarantined,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Flagged => "flagged",
            IssueSeverity::Invalid => "invalid",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Quarantined => "quarantined",
        }
    }
}

/// A detected data quality problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataHealthIssue {
    pub id: String,
    pub severity: IssueSeverity,
    pub category: &'static str,
    pub message: String,
    pub explanation: &'static str,
    pub recommended_action: &'static str,
    /// Id of the affected record; comma-separated for aggregated issues
    pub affected_record: String,
}

/// Per-severity tallies and an overall 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DataHealthScore {
    pub overall: u32,
    pub flagged: usize,
    pub invalid: usize,
    pub warnings: usize,
    pub quarantined: usize,
}

/// Assigns sequential `issue-N` ids in emission order.
struct IssueLog {
    issues: Vec<DataHealthIssue>,
}

impl IssueLog {
    fn push(
        &mut self,
        severity: IssueSeverity,
        category: &'static str,
        message: String,
        explanation: &'static str,
        recommended_action: &'static str,
        affected_record: String,
    ) {
        let id = format!("issue-{}", self.issues.len() + 1);
        self.issues.push(DataHealthIssue {
            id,
            severity,
            category,
            message,
            explanation,
            recommended_action,
            affected_record,
        });
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Run every rule over the filtered facts.
pub fn compute_data_health_issues(
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<DataHealthIssue> {
    let calls = filter_calls(ctx.data.calls(), filters, ctx);
    let hours = filter_hours(ctx.data.hours(), filters, ctx);
    let placements = filter_placements(ctx.data.placements(), filters, ctx);

    let mut log = IssueLog { issues: Vec::new() };

    // Flagged: missing recruiter email
    for call in calls.iter().filter(|c| is_blank(&c.recruiter_email)) {
        log.push(
            IssueSeverity::Flagged,
            "Missing Data",
            format!("Call {} has no recruiter email", call.id),
            "Recruiter email is required to join call data with user records across systems.",
            "Update the call record with the correct recruiter email from Aircall.",
            call.id.clone(),
        );
    }
    for entry in hours.iter().filter(|h| is_blank(&h.recruiter_email)) {
        log.push(
            IssueSeverity::Flagged,
            "Missing Data",
            format!("Timesheet {} has no recruiter email", entry.id),
            "Recruiter email is required to join timesheet data with user records.",
            "Update the timesheet record with the correct user email.",
            entry.id.clone(),
        );
    }

    // Invalid: zero duration without the missed flag
    for call in calls
        .iter()
        .filter(|c| c.duration_sec == 0 && !c.is_missed)
    {
        log.push(
            IssueSeverity::Invalid,
            "Invalid Data",
            format!("Call {} has 0 duration but is not marked as missed", call.id),
            "Calls with zero duration should be marked as missed or have a valid duration.",
            "Review the call record in Aircall and update the duration or missed status.",
            call.id.clone(),
        );
    }

    // Warning: too many hours in one day
    let mut by_day: BTreeMap<(&str, NaiveDate), (f64, Vec<&str>)> = BTreeMap::new();
    for entry in &hours {
        let day = by_day
            .entry((entry.recruiter_email.as_str(), entry.work_date.date()))
            .or_insert_with(|| (0.0, Vec::new()));
        day.0 += entry.hours_logged;
        day.1.push(entry.id.as_str());
    }
    for ((email, date), (total, records)) in by_day {
        if total <= MAX_DAILY_HOURS {
            continue;
        }
        let who = ctx
            .data
            .recruiter(email)
            .map(|r| r.name.as_str())
            .unwrap_or(email);
        log.push(
            IssueSeverity::Warning,
            "Burnout Risk",
            format!("{who} logged {total:.1} hours on {}", date.format("%Y-%m-%d")),
            "Logging more than 16 hours in a single day may indicate data entry errors or burnout risk.",
            "Review timesheet entries for accuracy and check in with the recruiter about workload.",
            records.join(", "),
        );
    }

    // Quarantined: placement without a job
    for placement in placements
        .iter()
        .filter(|p| ctx.data.job(&p.job_id).is_none())
    {
        log.push(
            IssueSeverity::Quarantined,
            "Orphaned Data",
            format!(
                "Placement {} references non-existent job {}",
                placement.id, placement.job_id
            ),
            "This placement cannot be properly attributed to a client or analyzed without a valid job record.",
            "Verify the job ID in Loxo and update the placement record, or restore the missing job.",
            placement.id.clone(),
        );
    }

    tracing::debug!(issues = log.issues.len(), ?filters, "Computed data health issues");
    log.issues
}

/// Tally issues by severity and compute the overall score.
///
/// `overall = max(0, round(100 - issues / records * 100))` where `records`
/// is the unfiltered count of calls, timesheets and placements. An empty
/// dataset scores 100.
pub fn compute_data_health_score(issues: &[DataHealthIssue], data: &Dataset) -> DataHealthScore {
    let count = |severity: IssueSeverity| issues.iter().filter(|i| i.severity == severity).count();

    let flagged = count(IssueSeverity::Flagged);
    let invalid = count(IssueSeverity::Invalid);
    let warnings = count(IssueSeverity::Warning);
    let quarantined = count(IssueSeverity::Quarantined);
    let total_issues = flagged + invalid + warnings + quarantined;

    let total_records = data.total_record_count();
    let overall = if total_records == 0 {
        100
    } else {
        let raw = 100.0 - (total_issues as f64 / total_records as f64) * 100.0;
        raw.round().max(0.0) as u32
    };

    DataHealthScore {
        overall,
        flagged,
        invalid,
        warnings,
        quarantined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetTables;
    use crate::types::{Call, CallDirection, Hours, Placement, Recruiter};
    use chrono::{Duration, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn call(id: &str, email: &str, duration_sec: u32, is_missed: bool) -> Call {
        Call {
            id: id.to_string(),
            recruiter_email: email.to_string(),
            direction: CallDirection::Outbound,
            duration_sec,
            called_at: now() - Duration::hours(3),
            is_missed,
        }
    }

    fn timesheet(id: &str, email: &str, logged: f64, hour: u32) -> Hours {
        Hours {
            id: id.to_string(),
            recruiter_email: email.to_string(),
            work_date: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            hours_logged: logged,
            is_billable: true,
            client_name: None,
            job_id: None,
        }
    }

    fn recruiter() -> Recruiter {
        Recruiter {
            id: "rec-1".to_string(),
            email: "ann@x.com".to_string(),
            name: "Ann Lee".to_string(),
            role: "Recruiter".to_string(),
            is_active: true,
            team: None,
        }
    }

    #[test]
    fn test_zero_duration_call_is_invalid() {
        let data = Dataset::new(DatasetTables {
            recruiters: vec![recruiter()],
            calls: vec![
                call("call-1", "ann@x.com", 0, false),
                call("call-2", "ann@x.com", 0, true),
                call("call-3", "ann@x.com", 120, false),
            ],
            ..Default::default()
        });
        let ctx = AnalyticsContext::new(&data, now());

        let issues = compute_data_health_issues(&ctx, &FilterCriteria::default());
        let invalid: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Invalid)
            .collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].affected_record, "call-1");
        assert_eq!(invalid[0].id, "issue-1");

        let score = compute_data_health_score(&issues, &data);
        assert_eq!(score.invalid, 1);
        // 1 issue over 3 records
        assert_eq!(score.overall, 67);
    }

    #[test]
    fn test_missing_email_and_orphaned_placement() {
        let data = Dataset::new(DatasetTables {
            recruiters: vec![recruiter()],
            calls: vec![call("call-1", "  ", 60, false)],
            hours: vec![timesheet("ts-1", "", 4.0, 9)],
            placements: vec![Placement {
                id: "place-1".to_string(),
                placed_at: now() - Duration::days(1),
                recruiter_id: "rec-1".to_string(),
                job_id: "job-missing".to_string(),
                candidate_id: "cand-1".to_string(),
                revenue_amount: None,
                time_to_fill_days: 10,
            }],
            ..Default::default()
        });
        let ctx = AnalyticsContext::new(&data, now());
        let issues = compute_data_health_issues(&ctx, &FilterCriteria::default());

        let severities: Vec<_> = issues.iter().map(|i| i.severity).collect();
        assert_eq!(
            severities,
            vec![
                IssueSeverity::Flagged,
                IssueSeverity::Flagged,
                IssueSeverity::Quarantined
            ]
        );
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["issue-1", "issue-2", "issue-3"]);
        assert_eq!(issues[2].message, "Placement place-1 references non-existent job job-missing");

        let score = compute_data_health_score(&issues, &data);
        assert_eq!(score.flagged, 2);
        assert_eq!(score.quarantined, 1);
        assert_eq!(score.overall, 0);
    }

    #[test]
    fn test_long_day_aggregates_timesheets() {
        let data = Dataset::new(DatasetTables {
            recruiters: vec![recruiter()],
            hours: vec![
                timesheet("ts-1", "ann@x.com", 9.0, 8),
                timesheet("ts-2", "ann@x.com", 8.5, 18),
                timesheet("ts-3", "bob@x.com", 17.0, 8),
            ],
            ..Default::default()
        });
        let ctx = AnalyticsContext::new(&data, now());
        let issues = compute_data_health_issues(&ctx, &FilterCriteria::default());

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == IssueSeverity::Warning));
        assert_eq!(issues[0].message, "Ann Lee logged 17.5 hours on 2024-03-12");
        assert_eq!(issues[0].affected_record, "ts-1, ts-2");
        // Unknown recruiters fall back to their email
        assert_eq!(issues[1].message, "bob@x.com logged 17.0 hours on 2024-03-12");
    }

    #[test]
    fn test_sample_data_is_clean() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let issues = compute_data_health_issues(&ctx, &FilterCriteria::default());
        assert!(issues.is_empty());
        assert_eq!(compute_data_health_score(&issues, &data).overall, 100);
    }

    #[test]
    fn test_empty_dataset_scores_100() {
        let score = compute_data_health_score(&[], &Dataset::default());
        assert_eq!(score, DataHealthScore { overall: 100, ..Default::default() });
    }
}
