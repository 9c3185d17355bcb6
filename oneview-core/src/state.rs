//! Session state: global filters and leaderboard goals.
//!
//! Both are plain values passed into engine calls. They are loaded from and
//! saved to a [`KeyValueStore`] as JSON at session boundaries.

use crate::analytics::filters::{DateRange, FilterCriteria};
use crate::analytics::leaderboards::LeaderboardMetric;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Storage key for persisted global filters.
pub const FILTERS_KEY: &str = "global-filters";

/// Storage key for persisted leaderboard goals.
pub const GOALS_KEY: &str = "leaderboard-goals";

/// String key-value persistence.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
    S: KeyValueStore + ?Sized,
{
    match store.load(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    store.save(key, &serde_json::to_string(value)?)
}

// ============================================
// Global filters
// ============================================

/// The filter selection shared by every dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalFilters {
    pub filters: FilterCriteria,
}

impl Default for GlobalFilters {
    fn default() -> Self {
        Self::with_default_range(DateRange::default())
    }
}

impl GlobalFilters {
    /// Filters holding only a date range.
    pub fn with_default_range(range: DateRange) -> Self {
        Self {
            filters: FilterCriteria::default().with_date_range(range),
        }
    }

    /// Merge the criteria that are set in `update`; unset criteria are kept.
    pub fn update(&mut self, update: FilterCriteria) {
        let FilterCriteria {
            date_range,
            recruiter,
            client,
            job,
        } = update;
        if date_range.is_some() {
            self.filters.date_range = date_range;
        }
        if recruiter.is_some() {
            self.filters.recruiter = recruiter;
        }
        if client.is_some() {
            self.filters.client = client;
        }
        if job.is_some() {
            self.filters.job = job;
        }
    }

    /// Reset to the last 30 days with no other criteria.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.filters
    }

    /// Load persisted filters, or `default` when none are stored.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, default: DateRange) -> Result<Self> {
        Ok(load_json(store, FILTERS_KEY)?.unwrap_or_else(|| Self::with_default_range(default)))
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<()> {
        save_json(store, FILTERS_KEY, self)?;
        tracing::info!(filters = ?self.filters, "Saved global filters");
        Ok(())
    }
}

// ============================================
// Leaderboard goals
// ============================================

/// Period leaderboard targets are set for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    #[default]
    Monthly,
    Quarterly,
}

impl GoalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPeriod::Monthly => "monthly",
            GoalPeriod::Quarterly => "quarterly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" => Some(GoalPeriod::Monthly),
            "quarterly" | "quarter" => Some(GoalPeriod::Quarterly),
            _ => None,
        }
    }

    /// Default individual target for a metric.
    pub fn default_target(&self, metric: LeaderboardMetric) -> f64 {
        let monthly = match metric {
            LeaderboardMetric::Calls => 200.0,
            LeaderboardMetric::Hours => 160.0,
            LeaderboardMetric::Placements => 3.0,
            LeaderboardMetric::Revenue => 45_000.0,
        };
        match self {
            GoalPeriod::Monthly => monthly,
            GoalPeriod::Quarterly => monthly * 3.0,
        }
    }
}

/// Team targets are this multiple of the individual defaults.
pub const TEAM_TARGET_MULTIPLIER: f64 = 2.0;

/// Per-entity, per-metric leaderboard targets.
///
/// Entities are recruiter ids or team names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalBook {
    #[serde(default)]
    pub period: GoalPeriod,
    #[serde(default)]
    pub targets: BTreeMap<String, BTreeMap<LeaderboardMetric, f64>>,
}

impl GoalBook {
    pub fn new(period: GoalPeriod) -> Self {
        Self {
            period,
            targets: BTreeMap::new(),
        }
    }

    pub fn set_period(&mut self, period: GoalPeriod) {
        self.period = period;
    }

    pub fn set_target(&mut self, id: &str, metric: LeaderboardMetric, value: f64) {
        self.targets
            .entry(id.to_string())
            .or_default()
            .insert(metric, value);
    }

    pub fn target(&self, id: &str, metric: LeaderboardMetric) -> Option<f64> {
        self.targets.get(id)?.get(&metric).copied()
    }

    /// Fill in period defaults for entities without any targets.
    ///
    /// Teams get [`TEAM_TARGET_MULTIPLIER`] times the individual defaults.
    /// Entities that already have targets are left untouched.
    pub fn initialize_default_targets<'a>(
        &mut self,
        recruiter_ids: impl IntoIterator<Item = &'a str>,
        teams: impl IntoIterator<Item = &'a str>,
    ) {
        let period = self.period;
        let mut fill = |id: &str, scale: f64| {
            if self.targets.contains_key(id) {
                return;
            }
            let defaults = LeaderboardMetric::ALL
                .into_iter()
                .map(|m| (m, period.default_target(m) * scale))
                .collect();
            self.targets.insert(id.to_string(), defaults);
        };

        for id in recruiter_ids {
            fill(id, 1.0);
        }
        for team in teams {
            fill(team, TEAM_TARGET_MULTIPLIER);
        }
        tracing::info!(period = period.as_str(), entities = self.targets.len(), "Initialized default goals");
    }

    /// Load persisted goals, or an empty book for `default_period`.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, default_period: GoalPeriod) -> Result<Self> {
        Ok(load_json(store, GOALS_KEY)?.unwrap_or_else(|| Self::new(default_period)))
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<()> {
        save_json(store, GOALS_KEY, self)
    }
}
