//! Star-schema store for fact and dimension tables.
//!
//! A [`Dataset`] is built once and never mutated. Join indexes (recruiter by
//! email, id and slug; job by id; client by name) are computed at
//! construction so filters resolve joins without rescanning the tables.
//!
//! Join rules:
//! - Calls and timesheets join recruiters by email
//! - Pipeline moves and placements join recruiters by id
//! - Placements join clients through their job's client name

use crate::analytics::filters::recruiter_slug;
use crate::types::*;
use chrono::{Datelike, Duration, NaiveDateTime, Weekday};
use std::collections::HashMap;

/// Immutable fact and dimension tables plus their join indexes.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    recruiters: Vec<Recruiter>,
    jobs: Vec<Job>,
    clients: Vec<Client>,
    calls: Vec<Call>,
    hours: Vec<Hours>,
    pipeline: Vec<PipelineEvent>,
    placements: Vec<Placement>,

    recruiter_by_email: HashMap<String, usize>,
    recruiter_by_id: HashMap<String, usize>,
    recruiter_by_slug: HashMap<String, usize>,
    job_by_id: HashMap<String, usize>,
    client_by_name: HashMap<String, usize>,
}

/// Row collections used to assemble a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct DatasetTables {
    pub recruiters: Vec<Recruiter>,
    pub jobs: Vec<Job>,
    pub clients: Vec<Client>,
    pub calls: Vec<Call>,
    pub hours: Vec<Hours>,
    pub pipeline: Vec<PipelineEvent>,
    pub placements: Vec<Placement>,
}

/// Index rows by key; the first row with a given key wins.
fn index_by<T>(rows: &[T], key: impl Fn(&T) -> String) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(rows.len());
    for (pos, row) in rows.iter().enumerate() {
        index.entry(key(row)).or_insert(pos);
    }
    index
}

impl Dataset {
    /// Build a dataset from explicit tables.
    pub fn new(tables: DatasetTables) -> Self {
        let DatasetTables {
            recruiters,
            jobs,
            clients,
            calls,
            hours,
            pipeline,
            placements,
        } = tables;

        let recruiter_by_email = index_by(&recruiters, |r| r.email.clone());
        let recruiter_by_id = index_by(&recruiters, |r| r.id.clone());
        let recruiter_by_slug = index_by(&recruiters, |r| recruiter_slug(&r.name));
        let job_by_id = index_by(&jobs, |j| j.id.clone());
        let client_by_name = index_by(&clients, |c| c.name.clone());

        tracing::debug!(
            recruiters = recruiters.len(),
            calls = calls.len(),
            hours = hours.len(),
            pipeline = pipeline.len(),
            placements = placements.len(),
            "Dataset loaded"
        );

        Self {
            recruiters,
            jobs,
            clients,
            calls,
            hours,
            pipeline,
            placements,
            recruiter_by_email,
            recruiter_by_id,
            recruiter_by_slug,
            job_by_id,
            client_by_name,
        }
    }

    /// Generate the deterministic sample dataset anchored at `now`.
    ///
    /// Every value is derived from row indexes, so two calls with the same
    /// `now` produce identical tables.
    pub fn sample(now: NaiveDateTime) -> Self {
        let days_ago = |days: i64| now - Duration::days(days);

        let recruiters = vec![
            sample_recruiter(1, "sarah.johnson", "Sarah Johnson", "Senior Recruiter", "Team Alpha"),
            sample_recruiter(2, "mike.chen", "Mike Chen", "Recruiter", "Team Alpha"),
            sample_recruiter(3, "emily.rodriguez", "Emily Rodriguez", "Lead Recruiter", "Team Beta"),
            sample_recruiter(4, "david.kim", "David Kim", "Recruiter", "Team Beta"),
            sample_recruiter(5, "lisa.patel", "Lisa Patel", "Senior Recruiter", "Team Alpha"),
        ];

        let job = |n: u32,
                   title: &str,
                   client: &str,
                   status: JobStatus,
                   opened: i64,
                   closed: Option<i64>,
                   owner: u32| Job {
            id: format!("job-{n:03}"),
            title: title.to_string(),
            client_name: client.to_string(),
            status,
            opened_at: days_ago(opened),
            closed_at: closed.map(|d| days_ago(d)),
            owner_recruiter_id: format!("rec-{owner:03}"),
        };
        let jobs = vec![
            job(1, "Senior Software Engineer", "TechCorp Inc", JobStatus::Open, 45, None, 1),
            job(2, "Product Manager", "Finance Co", JobStatus::Filled, 60, Some(10), 3),
            job(3, "Data Analyst", "Health Systems", JobStatus::Open, 30, None, 2),
            job(4, "UX Designer", "TechCorp Inc", JobStatus::Open, 20, None, 4),
            job(5, "DevOps Engineer", "Finance Co", JobStatus::Filled, 75, Some(5), 5),
        ];

        let clients = vec![
            sample_client(1, "TechCorp Inc", "Technology"),
            sample_client(2, "Finance Co", "Finance"),
            sample_client(3, "Health Systems", "Healthcare"),
        ];

        let mut calls = Vec::new();
        for (idx, recruiter) in recruiters.iter().enumerate() {
            let calls_per_day = 8 + idx * 3;
            for day in 0..30 {
                let date = days_ago(day);
                for i in 0..calls_per_day {
                    calls.push(Call {
                        id: format!("call-{}", calls.len() + 1),
                        recruiter_email: recruiter.email.clone(),
                        direction: if i % 3 == 0 {
                            CallDirection::Inbound
                        } else {
                            CallDirection::Outbound
                        },
                        duration_sec: (180 + idx * 60 + i * 30) as u32,
                        called_at: date + Duration::hours(i as i64),
                        is_missed: i % 15 == 0,
                    });
                }
            }
        }

        let mut hours = Vec::new();
        for (idx, recruiter) in recruiters.iter().enumerate() {
            let hours_per_day = (7 + idx) as f64;
            for day in 0..30 {
                let date = days_ago(day);
                if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                    continue;
                }
                hours.push(Hours {
                    id: format!("ts-{}", hours.len() + 1),
                    recruiter_email: recruiter.email.clone(),
                    work_date: date,
                    hours_logged: hours_per_day + (day as f64).sin() * 0.5,
                    is_billable: true,
                    client_name: Some(clients[idx % clients.len()].name.clone()),
                    job_id: None,
                });
            }
        }

        let mut pipeline = Vec::new();
        let mut candidate_counter = 0;
        for (idx, recruiter) in recruiters.iter().enumerate() {
            // Later recruiters move candidates further down the funnel
            let last_stage = 2 + idx as i64;
            for c in 0..(5 + idx as i64 * 2) {
                candidate_counter += 1;
                let candidate_id = format!("cand-{candidate_counter}");
                let job_id = jobs[c as usize % jobs.len()].id.clone();

                for (stage_idx, stage) in PipelineStage::ALL.iter().enumerate() {
                    let stage_idx = stage_idx as i64;
                    if stage_idx > last_stage {
                        continue;
                    }
                    let start_days_ago = 30 - c * 2 - stage_idx * 3;
                    pipeline.push(PipelineEvent {
                        id: format!("pipe-{}", pipeline.len() + 1),
                        candidate_id: candidate_id.clone(),
                        job_id: job_id.clone(),
                        recruiter_id: recruiter.id.clone(),
                        stage: *stage,
                        stage_start: days_ago(start_days_ago),
                        stage_end: (stage_idx < last_stage).then(|| days_ago(start_days_ago - 2)),
                    });
                }
            }
        }

        let mut placements = Vec::new();
        for (idx, recruiter) in recruiters.iter().enumerate() {
            let count = 2 + idx / 2;
            for p in 0..count {
                placements.push(Placement {
                    id: format!("place-{}", placements.len() + 1),
                    placed_at: days_ago((10 + p * 8 + idx * 3) as i64),
                    recruiter_id: recruiter.id.clone(),
                    job_id: jobs[(idx + p) % jobs.len()].id.clone(),
                    candidate_id: format!("cand-{}", p + 1),
                    revenue_amount: Some((15_000 + idx * 5_000 + p * 2_000) as f64),
                    time_to_fill_days: (35 + idx * 5 + p * 3) as u32,
                });
            }
        }

        Self::new(DatasetTables {
            recruiters,
            jobs,
            clients,
            calls,
            hours,
            pipeline,
            placements,
        })
    }

    pub fn recruiters(&self) -> &[Recruiter] {
        &self.recruiters
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn hours(&self) -> &[Hours] {
        &self.hours
    }

    pub fn pipeline(&self) -> &[PipelineEvent] {
        &self.pipeline
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Look up a recruiter by email (primary key) or id (fallback).
    pub fn recruiter(&self, email_or_id: &str) -> Option<&Recruiter> {
        self.recruiter_by_email
            .get(email_or_id)
            .or_else(|| self.recruiter_by_id.get(email_or_id))
            .map(|&pos| &self.recruiters[pos])
    }

    /// Look up a recruiter by filter slug.
    pub fn recruiter_by_slug(&self, slug: &str) -> Option<&Recruiter> {
        self.recruiter_by_slug
            .get(slug)
            .map(|&pos| &self.recruiters[pos])
    }

    /// Look up a job by id.
    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.job_by_id.get(job_id).map(|&pos| &self.jobs[pos])
    }

    /// Look up a client by exact name.
    pub fn client(&self, name: &str) -> Option<&Client> {
        self.client_by_name.get(name).map(|&pos| &self.clients[pos])
    }

    /// Team of the recruiter with the given id.
    pub fn recruiter_team(&self, recruiter_id: &str) -> Option<&str> {
        self.recruiter_by_id
            .get(recruiter_id)
            .and_then(|&pos| self.recruiters[pos].team.as_deref())
    }

    /// Distinct team names in first-seen order.
    pub fn teams(&self) -> Vec<&str> {
        let mut teams: Vec<&str> = Vec::new();
        for team in self.recruiters.iter().filter_map(|r| r.team.as_deref()) {
            if !teams.contains(&team) {
                teams.push(team);
            }
        }
        teams
    }

    /// Recruiters belonging to a team.
    pub fn team_members<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a Recruiter> + 'a {
        self.recruiters
            .iter()
            .filter(move |r| r.team.as_deref() == Some(team))
    }

    /// Unfiltered count of calls, timesheets and placements.
    pub fn total_record_count(&self) -> usize {
        self.calls.len() + self.hours.len() + self.placements.len()
    }
}

fn sample_recruiter(n: u32, handle: &str, name: &str, role: &str, team: &str) -> Recruiter {
    Recruiter {
        id: format!("rec-{n:03}"),
        email: format!("{handle}@company.com"),
        name: name.to_string(),
        role: role.to_string(),
        is_active: true,
        team: Some(team.to_string()),
    }
}

fn sample_client(n: u32, name: &str, industry: &str) -> Client {
    Client {
        id: format!("client-{n:03}"),
        name: name.to_string(),
        industry: Some(industry.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_sample_table_sizes() {
        let data = Dataset::sample(now());
        assert_eq!(data.recruiters().len(), 5);
        assert_eq!(data.jobs().len(), 5);
        assert_eq!(data.clients().len(), 3);
        // (8 + 11 + 14 + 17 + 20) calls per day over 30 days
        assert_eq!(data.calls().len(), 70 * 30);
        // 2 + 2 + 3 + 3 + 4
        assert_eq!(data.placements().len(), 14);
        // Candidates: 5 + 7 + 9 + 11 + 13; stages 3, 4, 5, 5, 5
        assert_eq!(data.pipeline().len(), 5 * 3 + 7 * 4 + 9 * 5 + 11 * 5 + 13 * 5);
    }

    #[test]
    fn test_hours_only_on_weekdays() {
        let data = Dataset::sample(now());
        assert!(!data.hours().is_empty());
        assert!(data
            .hours()
            .iter()
            .all(|h| !matches!(h.work_date.weekday(), Weekday::Sat | Weekday::Sun)));
        // 30 days back from a Friday contain 22 weekdays, for each of 5 recruiters
        assert_eq!(data.hours().len(), 22 * 5);
    }

    #[test]
    fn test_sample_is_deterministic() {
        let a = Dataset::sample(now());
        let b = Dataset::sample(now());
        assert_eq!(a.calls(), b.calls());
        assert_eq!(a.hours(), b.hours());
        assert_eq!(a.pipeline(), b.pipeline());
        assert_eq!(a.placements(), b.placements());
    }

    #[test]
    fn test_joins() {
        let data = Dataset::sample(now());
        let by_email = data.recruiter("mike.chen@company.com").unwrap();
        assert_eq!(by_email.id, "rec-002");
        let by_id = data.recruiter("rec-003").unwrap();
        assert_eq!(by_id.name, "Emily Rodriguez");
        assert!(data.recruiter("nobody@company.com").is_none());

        assert_eq!(data.recruiter_by_slug("lisa-patel").unwrap().id, "rec-005");
        assert_eq!(data.job("job-002").unwrap().client_name, "Finance Co");
        assert_eq!(data.client("Health Systems").unwrap().id, "client-003");
        assert_eq!(data.recruiter_team("rec-004"), Some("Team Beta"));
    }

    #[test]
    fn test_teams() {
        let data = Dataset::sample(now());
        assert_eq!(data.teams(), vec!["Team Alpha", "Team Beta"]);
        let alpha: Vec<_> = data.team_members("Team Alpha").map(|r| r.id.as_str()).collect();
        assert_eq!(alpha, vec!["rec-001", "rec-002", "rec-005"]);
    }

    #[test]
    fn test_placement_formulas() {
        let data = Dataset::sample(now());
        let first = &data.placements()[0];
        assert_eq!(first.revenue_amount, Some(15_000.0));
        assert_eq!(first.time_to_fill_days, 35);
        assert_eq!(first.placed_at, now() - Duration::days(10));

        let last = data.placements().last().unwrap();
        assert_eq!(last.recruiter_id, "rec-005");
        assert_eq!(last.revenue_amount, Some((15_000 + 4 * 5_000 + 3 * 2_000) as f64));
    }
}
