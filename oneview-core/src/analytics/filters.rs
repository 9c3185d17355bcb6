//! Shared filter application for fact tables.
//!
//! Every engine narrows facts through these functions so dashboards,
//! leaderboards, data health and reports agree on what "the current
//! selection" means.
//!
//! Criteria combine with AND semantics. A criterion that cannot be resolved
//! (unknown recruiter slug, placement whose job is missing) does not narrow
//! the result; over-including is preferred to failing.

use super::AnalyticsContext;
use crate::types::{Call, Hours, PipelineEvent, Placement, Recruiter};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Named reporting window, resolved against "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "Last 7 days")]
    Last7Days,
    #[default]
    #[serde(rename = "Last 30 days")]
    Last30Days,
    #[serde(rename = "Last 90 days")]
    Last90Days,
    #[serde(rename = "This year")]
    ThisYear,
    #[serde(rename = "Last month")]
    LastMonth,
}

impl DateRange {
    pub const ALL: [DateRange; 5] = [
        DateRange::Last7Days,
        DateRange::Last30Days,
        DateRange::Last90Days,
        DateRange::ThisYear,
        DateRange::LastMonth,
    ];

    /// Display label, also used as the persisted form.
    pub fn label(&self) -> &'static str {
        match self {
            DateRange::Last7Days => "Last 7 days",
            DateRange::Last30Days => "Last 30 days",
            DateRange::Last90Days => "Last 90 days",
            DateRange::ThisYear => "This year",
            DateRange::LastMonth => "Last month",
        }
    }

    /// Parse a display label. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

/// Inclusive `[start, end]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Resolve a date range to a concrete window anchored at `now`.
///
/// `None` resolves to the last 30 days. "Last month" spans the whole previous
/// calendar month, through 23:59:59 of its last day.
pub fn parse_date_range(range: Option<DateRange>, now: NaiveDateTime) -> DateWindow {
    let rolling = |days: i64| DateWindow {
        start: now - Duration::days(days),
        end: now,
    };

    match range.unwrap_or_default() {
        DateRange::Last7Days => rolling(7),
        DateRange::Last30Days => rolling(30),
        DateRange::Last90Days => rolling(90),
        DateRange::ThisYear => DateWindow {
            start: start_of_day(first_of_month(now.year(), 1)),
            end: now,
        },
        DateRange::LastMonth => {
            let this_month = first_of_month(now.year(), now.month());
            let last_day = this_month.pred_opt().unwrap_or(this_month);
            DateWindow {
                start: start_of_day(first_of_month(last_day.year(), last_day.month())),
                end: last_day.and_time(end_of_day()),
            }
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Global filter selection passed into every engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Reporting window; `None` means the last 30 days
    #[serde(default, deserialize_with = "lenient_date_range")]
    pub date_range: Option<DateRange>,
    /// Recruiter slug (see [`recruiter_slug`])
    #[serde(default)]
    pub recruiter: Option<String>,
    /// Client slug (see [`client_slug`])
    #[serde(default)]
    pub client: Option<String>,
    /// Exact job id
    #[serde(default)]
    pub job: Option<String>,
}

/// Unknown labels deserialize to `None` rather than failing.
fn lenient_date_range<'de, D>(deserializer: D) -> Result<Option<DateRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(DateRange::from_label))
}

impl FilterCriteria {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Set the date range from a label; unknown labels fall back to the default window.
    pub fn with_date_label(mut self, label: &str) -> Self {
        self.date_range = DateRange::from_label(label);
        self
    }

    pub fn with_recruiter(mut self, slug: impl Into<String>) -> Self {
        self.recruiter = Some(slug.into());
        self
    }

    pub fn with_client(mut self, slug: impl Into<String>) -> Self {
        self.client = Some(slug.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job = Some(job_id.into());
        self
    }

    /// The effective date range.
    pub fn effective_date_range(&self) -> DateRange {
        self.date_range.unwrap_or_default()
    }
}

/// Recruiter filter slug: lowercased name with the first space replaced by `-`.
///
/// Only the first space is replaced, so "Mary Jane Smith" becomes
/// "mary-jane smith".
pub fn recruiter_slug(name: &str) -> String {
    name.to_lowercase().replacen(' ', "-", 1)
}

/// Client filter slug: lowercased name with every whitespace run collapsed to `-`.
pub fn client_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(ch);
            in_whitespace = false;
        }
    }
    slug
}

/// Criteria resolved against the dataset once per filter call.
struct ResolvedCriteria<'a> {
    window: DateWindow,
    recruiter: Option<&'a Recruiter>,
    client: Option<&'a str>,
    job: Option<&'a str>,
}

impl<'a> ResolvedCriteria<'a> {
    fn new(filters: &'a FilterCriteria, ctx: &AnalyticsContext<'a>) -> Self {
        let recruiter = filters.recruiter.as_deref().and_then(|slug| {
            let found = ctx.data.recruiter_by_slug(slug);
            if found.is_none() {
                tracing::warn!(slug, "Recruiter filter did not match any recruiter, ignoring");
            }
            found
        });

        Self {
            window: parse_date_range(filters.date_range, ctx.now),
            recruiter,
            client: filters.client.as_deref(),
            job: filters.job.as_deref(),
        }
    }

    fn recruiter_email_matches(&self, email: &str) -> bool {
        self.recruiter.map_or(true, |r| r.email == email)
    }

    fn recruiter_id_matches(&self, id: &str) -> bool {
        self.recruiter.map_or(true, |r| r.id == id)
    }

    fn client_matches(&self, client_name: Option<&str>) -> bool {
        match (self.client, client_name) {
            (Some(wanted), Some(name)) => client_slug(name) == wanted,
            _ => true,
        }
    }
}

/// Filter calls by date and recruiter.
pub fn filter_calls<'a>(
    calls: &'a [Call],
    filters: &FilterCriteria,
    ctx: &AnalyticsContext<'_>,
) -> Vec<&'a Call> {
    let criteria = ResolvedCriteria::new(filters, ctx);
    calls
        .iter()
        .filter(|c| criteria.window.contains(c.called_at))
        .filter(|c| criteria.recruiter_email_matches(&c.recruiter_email))
        .collect()
}

/// Filter timesheet entries by date, recruiter, client and job.
///
/// The client filter only applies to entries that carry a client name; the
/// job filter excludes entries without a job.
pub fn filter_hours<'a>(
    hours: &'a [Hours],
    filters: &FilterCriteria,
    ctx: &AnalyticsContext<'_>,
) -> Vec<&'a Hours> {
    let criteria = ResolvedCriteria::new(filters, ctx);
    hours
        .iter()
        .filter(|h| criteria.window.contains(h.work_date))
        .filter(|h| criteria.recruiter_email_matches(&h.recruiter_email))
        .filter(|h| criteria.client_matches(h.client_name.as_deref()))
        .filter(|h| criteria.job.map_or(true, |job| h.job_id.as_deref() == Some(job)))
        .collect()
}

/// Filter pipeline moves by stage start date, recruiter and job.
pub fn filter_pipeline<'a>(
    pipeline: &'a [PipelineEvent],
    filters: &FilterCriteria,
    ctx: &AnalyticsContext<'_>,
) -> Vec<&'a PipelineEvent> {
    let criteria = ResolvedCriteria::new(filters, ctx);
    pipeline
        .iter()
        .filter(|p| criteria.window.contains(p.stage_start))
        .filter(|p| criteria.recruiter_id_matches(&p.recruiter_id))
        .filter(|p| criteria.job.map_or(true, |job| p.job_id == job))
        .collect()
}

/// Filter placements by date, recruiter, job and client (via the job join).
///
/// Placements whose job cannot be resolved are not excluded by the client
/// filter.
pub fn filter_placements<'a>(
    placements: &'a [Placement],
    filters: &FilterCriteria,
    ctx: &AnalyticsContext<'_>,
) -> Vec<&'a Placement> {
    let criteria = ResolvedCriteria::new(filters, ctx);
    placements
        .iter()
        .filter(|p| criteria.window.contains(p.placed_at))
        .filter(|p| criteria.recruiter_id_matches(&p.recruiter_id))
        .filter(|p| criteria.job.map_or(true, |job| p.job_id == job))
        .filter(|p| {
            let client = ctx.data.job(&p.job_id).map(|j| j.client_name.as_str());
            criteria.client_matches(client)
        })
        .collect()
}
