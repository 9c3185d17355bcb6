//! Individual and team leaderboards.
//!
//! Values come from the globally filtered facts, sliced per recruiter. Team
//! values are the sum of their members' values.

use super::filters::{filter_calls, filter_hours, filter_placements, FilterCriteria};
use super::AnalyticsContext;
use crate::state::GoalBook;
use crate::types::{Call, Hours, Placement, Recruiter};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Metric a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMetric {
    Calls,
    Hours,
    Placements,
    Revenue,
}

impl LeaderboardMetric {
    pub const ALL: [LeaderboardMetric; 4] = [
        LeaderboardMetric::Calls,
        LeaderboardMetric::Hours,
        LeaderboardMetric::Placements,
        LeaderboardMetric::Revenue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardMetric::Calls => "calls",
            LeaderboardMetric::Hours => "hours",
            LeaderboardMetric::Placements => "placements",
            LeaderboardMetric::Revenue => "revenue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaderboardMetric::Calls => "Calls",
            LeaderboardMetric::Hours => "Hours",
            LeaderboardMetric::Placements => "Placements",
            LeaderboardMetric::Revenue => "Revenue",
        }
    }
}

/// Whether a leaderboard ranks recruiters or teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardView {
    #[default]
    Individual,
    Team,
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    /// Recruiter id, or the team name for team rows
    pub id: String,
    pub name: String,
    /// 1-based position after ranking
    pub rank: usize,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    /// Percent of target; `None` without a non-zero target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl LeaderboardEntry {
    /// Unranked entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank: 0,
            value,
            target: None,
            progress: None,
            team: None,
        }
    }
}

/// Facts narrowed by the global filters once per leaderboard.
struct FilteredFacts<'a> {
    calls: Vec<&'a Call>,
    hours: Vec<&'a Hours>,
    placements: Vec<&'a Placement>,
}

impl<'a> FilteredFacts<'a> {
    fn new(ctx: &AnalyticsContext<'a>, filters: &FilterCriteria) -> Self {
        Self {
            calls: filter_calls(ctx.data.calls(), filters, ctx),
            hours: filter_hours(ctx.data.hours(), filters, ctx),
            placements: filter_placements(ctx.data.placements(), filters, ctx),
        }
    }

    fn value_for(&self, metric: LeaderboardMetric, recruiter: &Recruiter) -> f64 {
        let own_placements = self
            .placements
            .iter()
            .filter(|p| p.recruiter_id == recruiter.id);

        match metric {
            LeaderboardMetric::Calls => self
                .calls
                .iter()
                .filter(|c| c.recruiter_email == recruiter.email)
                .count() as f64,
            LeaderboardMetric::Hours => self
                .hours
                .iter()
                .filter(|h| h.recruiter_email == recruiter.email)
                .map(|h| h.hours_logged)
                .sum(),
            LeaderboardMetric::Placements => own_placements.count() as f64,
            LeaderboardMetric::Revenue => own_placements
                .map(|p| p.revenue_amount.unwrap_or(0.0))
                .sum(),
        }
    }
}

/// Sort by value descending (ties by id ascending) and assign ranks `1..=N`.
pub fn rank_entries(mut entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    entries
}

/// One entry per recruiter.
pub fn compute_individual_leaderboard(
    metric: LeaderboardMetric,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<LeaderboardEntry> {
    tracing::debug!(metric = metric.as_str(), ?filters, "Computing individual leaderboard");
    let facts = FilteredFacts::new(ctx, filters);

    let entries = ctx
        .data
        .recruiters()
        .iter()
        .map(|recruiter| LeaderboardEntry {
            team: recruiter.team.clone(),
            ..LeaderboardEntry::new(
                &recruiter.id,
                &recruiter.name,
                facts.value_for(metric, recruiter),
            )
        })
        .collect();

    rank_entries(entries)
}

/// One entry per distinct team, summing member values.
pub fn compute_team_leaderboard(
    metric: LeaderboardMetric,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<LeaderboardEntry> {
    tracing::debug!(metric = metric.as_str(), ?filters, "Computing team leaderboard");
    let facts = FilteredFacts::new(ctx, filters);

    let entries = ctx
        .data
        .teams()
        .into_iter()
        .map(|team| {
            let value: f64 = ctx
                .data
                .team_members(team)
                .map(|member| facts.value_for(metric, member))
                .sum();
            LeaderboardEntry::new(team, team, value)
        })
        .collect();

    rank_entries(entries)
}

/// Compute the leaderboard for a view.
pub fn compute_leaderboard(
    view: LeaderboardView,
    metric: LeaderboardMetric,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Vec<LeaderboardEntry> {
    match view {
        LeaderboardView::Individual => compute_individual_leaderboard(metric, ctx, filters),
        LeaderboardView::Team => compute_team_leaderboard(metric, ctx, filters),
    }
}

/// Overlay goal targets and progress for `metric`.
pub fn apply_goals(
    entries: Vec<LeaderboardEntry>,
    goals: &GoalBook,
    metric: LeaderboardMetric,
) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .map(|mut entry| {
            entry.target = goals.target(&entry.id, metric);
            entry.progress = entry
                .target
                .filter(|t| *t != 0.0)
                .map(|t| entry.value / t * 100.0);
            entry
        })
        .collect()
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
    fn test_rank_ties() {
        let ranked = rank_entries(vec![
            LeaderboardEntry::new("rec-3", "C", 30.0),
            LeaderboardEntry::new("rec-2", "B", 50.0),
            LeaderboardEntry::new("rec-1", "A", 50.0),
        ]);

        assert_eq!(ranked.len(), 3);
        let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["rec-1", "rec-2", "rec-3"]);
        let ranks: Vec<_> = ranked.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(ranked[2].rank > ranked[0].rank && ranked[2].rank > ranked[1].rank);
    }

    #[test]
    fn test_individual_calls_leaderboard() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let board =
            compute_individual_leaderboard(LeaderboardMetric::Calls, &ctx, &FilterCriteria::default());

        assert_eq!(board.len(), 5);
        // Later recruiters make more calls per day
        assert_eq!(board[0].id, "rec-005");
        assert_eq!(board[4].id, "rec-001");
        assert!(board.windows(2).all(|w| w[0].value >= w[1].value));
        assert_eq!(board[0].team.as_deref(), Some("Team Alpha"));
    }

    #[test]
    fn test_team_leaderboard_sums_members() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let filters = FilterCriteria::default();

        let individual = compute_individual_leaderboard(LeaderboardMetric::Revenue, &ctx, &filters);
        let teams = compute_team_leaderboard(LeaderboardMetric::Revenue, &ctx, &filters);
        assert_eq!(teams.len(), 2);

        for team in &teams {
            let expected: f64 = individual
                .iter()
                .filter(|e| e.team.as_deref() == Some(team.id.as_str()))
                .map(|e| e.value)
                .sum();
            assert!((team.value - expected).abs() < 1e-9);
            assert_eq!(team.team, None);
        }
    }

    #[test]
    fn test_apply_goals() {
        let mut goals = GoalBook::default();
        goals.set_target("rec-1", LeaderboardMetric::Calls, 200.0);
        goals.set_target("rec-2", LeaderboardMetric::Calls, 0.0);
        goals.set_target("rec-3", LeaderboardMetric::Hours, 100.0);

        let entries = rank_entries(vec![
            LeaderboardEntry::new("rec-1", "A", 150.0),
            LeaderboardEntry::new("rec-2", "B", 120.0),
            LeaderboardEntry::new("rec-3", "C", 90.0),
        ]);
        let with_goals = apply_goals(entries, &goals, LeaderboardMetric::Calls);

        assert_eq!(with_goals[0].target, Some(200.0));
        assert_eq!(with_goals[0].progress, Some(75.0));
        assert_eq!(with_goals[1].target, Some(0.0));
        assert_eq!(with_goals[1].progress, None);
        // Hours target does not leak into the calls board
        assert_eq!(with_goals[2].target, None);
        assert_eq!(with_goals[2].progress, None);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!(LeaderboardMetric::parse("Revenue"), Some(LeaderboardMetric::Revenue));
        assert_eq!(LeaderboardMetric::parse("margin"), None);
    }
}
