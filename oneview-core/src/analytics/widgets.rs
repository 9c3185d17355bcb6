//! Custom dashboard widgets.
//!
//! A saved [`Widget`] carries its type and a JSON config naming a metric id
//! from [`WIDGET_LIBRARY`]. Rendering never fails: a config that does not
//! parse or names an unknown metric renders as [`WidgetView::Unknown`].

use super::dashboard::{generate_dashboard_metrics, generate_trend_data, TrendPoint};
use super::filters::FilterCriteria;
use super::metrics::{compute_metric, MetricId};
use super::AnalyticsContext;
use crate::format::{format_currency, format_number, format_percent};
use serde::{Deserialize, Serialize};

/// How a widget is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetType {
    Table,
    TrendChart,
    KpiCard,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Table => "table",
            WidgetType::TrendChart => "trendChart",
            WidgetType::KpiCard => "kpiCard",
        }
    }
}

/// A widget placed on a saved dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    pub widget_type: WidgetType,
    /// JSON object with at least a `metricId`
    pub config: String,
}

impl Widget {
    /// Instantiate a library widget.
    pub fn from_definition(definition: &WidgetDefinition, id: impl Into<String>) -> Self {
        let config = serde_json::json!({
            "metricId": definition.metric_id,
            "icon": definition.icon,
            "color": definition.color,
        });
        Self {
            id: id.into(),
            widget_type: definition.widget_type,
            config: config.to_string(),
        }
    }
}

/// Parsed widget config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub metric_id: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// A widget available in the dashboard builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub widget_type: WidgetType,
    pub metric_id: &'static str,
    pub icon: Option<&'static str>,
    pub color: Option<&'static str>,
}

const fn kpi(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    icon: &'static str,
    color: &'static str,
) -> WidgetDefinition {
    WidgetDefinition {
        id,
        label,
        description,
        widget_type: WidgetType::KpiCard,
        metric_id: id,
        icon: Some(icon),
        color: Some(color),
    }
}

pub const WIDGET_LIBRARY: &[WidgetDefinition] = &[
    kpi("total-calls", "Total Calls", "Total number of calls made", "Phone", "text-blue-600"),
    kpi("total-hours", "Total Hours Logged", "Total hours logged by recruiters", "Clock", "text-purple-600"),
    kpi("placements", "Placements", "Total number of placements", "Briefcase", "text-green-600"),
    kpi("interviews", "Interviews", "Total number of interviews scheduled", "Users", "text-amber-600"),
    kpi("offers", "Offers", "Total number of offers made", "Target", "text-teal-600"),
    kpi("revenue", "Revenue", "Total revenue generated", "DollarSign", "text-emerald-600"),
    kpi("margin", "Margin", "Total margin (25% of revenue)", "TrendingUp", "text-indigo-600"),
    kpi("active-contractors", "Active Contractors", "Number of active contractors", "Users", "text-cyan-600"),
    kpi("revenue-per-recruiter", "Revenue per Recruiter", "Average revenue per recruiter", "DollarSign", "text-green-600"),
    kpi("revenue-per-hour", "Revenue per Hour", "Revenue generated per hour worked", "Clock", "text-blue-600"),
    kpi("calls-per-placement", "Calls per Placement", "Average calls needed per placement", "Phone", "text-purple-600"),
    kpi("hours-per-hire", "Hours per Hire", "Average hours needed per hire", "Activity", "text-amber-600"),
    kpi("time-to-fill", "Time-to-Fill (days)", "Average days to fill a position", "Calendar", "text-rose-600"),
    kpi("utilization", "Utilization %", "Team utilization percentage", "Percent", "text-teal-600"),
    WidgetDefinition {
        id: "placements-trend",
        label: "Placements Trend",
        description: "12-month placement trend chart",
        widget_type: WidgetType::TrendChart,
        metric_id: "placements-trend",
        icon: None,
        color: None,
    },
];

/// Look up a library widget by metric id.
pub fn find_widget_definition(metric_id: &str) -> Option<&'static WidgetDefinition> {
    WIDGET_LIBRARY.iter().find(|w| w.metric_id == metric_id)
}

/// Rendered widget content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetView {
    Kpi { label: String, value: String },
    Trend { label: String, points: Vec<TrendPoint> },
    Table { label: String, message: String },
    Unknown { reason: String },
}

impl WidgetView {
    fn unknown(widget: &Widget, reason: impl std::fmt::Display) -> Self {
        tracing::warn!(widget_id = %widget.id, %reason, "Rendering unknown widget placeholder");
        WidgetView::Unknown {
            reason: reason.to_string(),
        }
    }
}

/// Render a widget for the current filters.
pub fn render_widget(
    widget: &Widget,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> WidgetView {
    let config: WidgetConfig = match serde_json::from_str(&widget.config) {
        Ok(config) => config,
        Err(e) => return WidgetView::unknown(widget, format!("invalid widget config: {e}")),
    };
    let Some(metric_id) = config.metric_id.as_deref() else {
        return WidgetView::unknown(widget, "widget config has no metricId");
    };
    let Some(definition) = find_widget_definition(metric_id) else {
        return WidgetView::unknown(widget, format!("unknown metric id {metric_id:?}"));
    };
    let label = definition.label.to_string();

    match widget.widget_type {
        WidgetType::KpiCard => match kpi_value(metric_id, ctx, filters) {
            Some(value) => WidgetView::Kpi { label, value },
            None => WidgetView::unknown(widget, format!("{metric_id:?} is not a KPI metric")),
        },
        WidgetType::TrendChart => WidgetView::Trend {
            label,
            points: generate_trend_data(),
        },
        WidgetType::Table => WidgetView::Table {
            label,
            message: "Table widget rendering coming soon".to_string(),
        },
    }
}

/// Formatted KPI value; `None` for metric ids that are not KPIs.
fn kpi_value(
    metric_id: &str,
    ctx: &AnalyticsContext<'_>,
    filters: &FilterCriteria,
) -> Option<String> {
    let metric = |id: MetricId| compute_metric(id, ctx, filters);
    let rounded = |value: Option<f64>| format_number(value.map(f64::round));

    let value = match metric_id {
        "total-calls" => rounded(metric(MetricId::TotalCalls)),
        "total-hours" => rounded(metric(MetricId::TotalHours)),
        "revenue-per-recruiter" => format_currency(metric(MetricId::RevenuePerRecruiter)),
        "revenue-per-hour" => format_currency(metric(MetricId::RevenuePerHour)),
        "calls-per-placement" => rounded(metric(MetricId::CallsPerPlacement)),
        "hours-per-hire" => rounded(metric(MetricId::HoursPerHire)),
        "time-to-fill" => rounded(metric(MetricId::TimeToFill)),
        "utilization" => format_percent(metric(MetricId::Utilization), 0),
        other => {
            let totals = generate_dashboard_metrics(ctx, filters);
            match other {
                "placements" => rounded(Some(totals.placements as f64)),
                "interviews" => rounded(Some(totals.interviews as f64)),
                "offers" => rounded(Some(totals.offers as f64)),
                "active-contractors" => rounded(Some(totals.active_contractors as f64)),
                "revenue" => format_currency(Some(totals.revenue)),
                "margin" => format_currency(Some(totals.margin)),
                _ => return None,
            }
        }
    };
    Some(value)
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

    fn widget(widget_type: WidgetType, config: &str) -> Widget {
        Widget {
            id: "w-1".to_string(),
            widget_type,
            config: config.to_string(),
        }
    }

    #[test]
    fn test_library() {
        assert_eq!(WIDGET_LIBRARY.len(), 15);
        assert_eq!(
            find_widget_definition("placements-trend").map(|w| w.widget_type),
            Some(WidgetType::TrendChart)
        );
        assert!(find_widget_definition("nope").is_none());
    }

    #[test]
    fn test_every_library_widget_renders() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        for (i, definition) in WIDGET_LIBRARY.iter().enumerate() {
            let widget = Widget::from_definition(definition, format!("w-{i}"));
            let view = render_widget(&widget, &ctx, &FilterCriteria::default());
            assert!(
                !matches!(view, WidgetView::Unknown { .. }),
                "{} rendered as unknown",
                definition.id
            );
        }
    }

    #[test]
    fn test_kpi_values() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let view = render_widget(
            &widget(WidgetType::KpiCard, r#"{"metricId":"utilization"}"#),
            &ctx,
            &FilterCriteria::default(),
        );
        assert_eq!(
            view,
            WidgetView::Kpi {
                label: "Utilization %".to_string(),
                value: "100%".to_string()
            }
        );
    }

    #[test]
    fn test_bad_config_degrades_to_unknown() {
        let data = Dataset::sample(now());
        let ctx = AnalyticsContext::new(&data, now());
        let filters = FilterCriteria::default();

        for config in ["not json", r#"{"icon":"Phone"}"#, r#"{"metricId":"bogus"}"#] {
            let view = render_widget(&widget(WidgetType::KpiCard, config), &ctx, &filters);
            assert!(matches!(view, WidgetView::Unknown { .. }), "{config}");
        }
        let view = render_widget(
            &widget(WidgetType::KpiCard, r#"{"metricId":"placements-trend"}"#),
            &ctx,
            &filters,
        );
        assert!(matches!(view, WidgetView::Unknown { .. }));
    }

    #[test]
    fn test_widget_serde() {
        let w = widget(WidgetType::TrendChart, "{}");
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"widgetType\":\"trendChart\""));
        let back: Widget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
