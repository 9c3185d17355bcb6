//! oneview - staffing operations analytics CLI
//!
//! Renders KPIs, leaderboards, data health, reports and role dashboards over
//! the recruiting dataset, and manages the persisted workspace: saved
//! filters, leaderboard goals, organizations, alerts, custom dashboards and
//! user mappings.

mod render;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use oneview_core::analytics::dashboard::{
    generate_dashboard_metrics, generate_funnel_analysis, generate_funnel_data,
    generate_interview_activity, generate_offer_activity, generate_ops_metrics,
    generate_pipeline_movement, generate_recruiter_metrics, generate_top_performers,
    generate_trend_data, PipelineActivity,
};
use oneview_core::analytics::intent::{parse_dashboard_query, DashboardTemplate};
use oneview_core::analytics::metrics::visible_metrics;
use oneview_core::analytics::widgets::{
    find_widget_definition, render_widget, Widget, WidgetView, WIDGET_LIBRARY,
};
use oneview_core::analytics::{
    apply_goals, compute_all_metrics, compute_data_health_issues, compute_data_health_score,
    compute_leaderboard, generate_ai_report, DateRange, LeaderboardMetric, LeaderboardView,
};
use oneview_core::db::suggest_user_mappings;
use oneview_core::format::{
    format_currency, format_duration, format_goal_progress, format_hours, format_number,
    format_percent,
};
use oneview_core::{
    AnalyticsContext, Config, Database, Dataset, FilterCriteria, GlobalFilters, GoalBook,
    GoalPeriod, Integration, IntegrationType, OrgType,
};
use render::{describe_filters, leaderboard_value, metric_value, print_json, Format, Printer};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "oneview")]
#[command(about = "OneView Ops - staffing operations analytics")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    filters: FilterArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Terminal, global = true)]
    format: Format,

    /// Evaluate date windows as of this day (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

/// Filter overrides applied on top of the saved filters.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Date range ("Last 7 days", "Last 30 days", "Last 90 days", "This year",
    /// "Last month", or 7d, 30d, 90d, ytd, last-month)
    #[arg(long, global = true, value_parser = parse_date_range_arg)]
    date_range: Option<DateRange>,

    /// Recruiter slug (e.g. mike-chen)
    #[arg(long, global = true)]
    recruiter: Option<String>,

    /// Client slug (e.g. techcorp-inc)
    #[arg(long, global = true)]
    client: Option<String>,

    /// Job id (e.g. job-001)
    #[arg(long, global = true)]
    job: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            date_range: self.date_range,
            recruiter: self.recruiter.clone(),
            client: self.client.clone(),
            job: self.job.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the KPI snapshot
    Metrics,

    /// Rank recruiters or teams against their goals
    Leaderboard {
        /// calls, hours, placements or revenue
        #[arg(long, default_value = "calls", value_parser = parse_leaderboard_metric)]
        metric: LeaderboardMetric,

        /// Rank teams instead of individual recruiters
        #[arg(long)]
        team: bool,
    },

    /// List data quality issues and the health score
    Health,

    /// Answer a question such as "Why did placements drop last month?"
    Report {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show a role dashboard
    Dashboard {
        /// leadership, recruiter, ops or funnel
        #[arg(long, default_value = "leadership", value_parser = parse_template)]
        view: DashboardTemplate,
    },

    /// Resolve a free-text dashboard request
    Plan {
        #[arg(required = true)]
        query: Vec<String>,

        /// Render the resolved dashboard
        #[arg(long)]
        open: bool,
    },

    /// Saved global filters
    #[command(subcommand)]
    Filters(FiltersCommand),

    /// Leaderboard goals
    #[command(subcommand)]
    Goals(GoalsCommand),

    /// Organizations and integrations
    #[command(subcommand)]
    Org(OrgCommand),

    /// Operational alerts
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Custom dashboards
    #[command(subcommand)]
    Boards(BoardsCommand),

    /// Cross-system user mappings
    #[command(subcommand)]
    Mappings(MappingsCommand),
}

#[derive(Subcommand, Debug)]
enum FiltersCommand {
    /// Show the saved filters
    Show,
    /// Save the filters given with --date-range, --recruiter, --client, --job
    Set,
    /// Reset to the last 30 days with no other criteria
    Clear,
}

#[derive(Subcommand, Debug)]
enum GoalsCommand {
    /// Show every target
    Show,
    /// Set one target for a recruiter (id or slug) or a team
    Set {
        entity: String,
        #[arg(value_parser = parse_leaderboard_metric)]
        metric: LeaderboardMetric,
        value: f64,
    },
    /// Fill in period defaults for recruiters and teams without targets
    Init,
    /// Change the goal period (monthly or quarterly)
    Period {
        #[arg(value_parser = parse_goal_period)]
        period: GoalPeriod,
    },
}

#[derive(Subcommand, Debug)]
enum OrgCommand {
    /// Create an organization
    Add {
        name: String,
        /// staffing or internal_ta
        #[arg(long = "type", default_value = "staffing", value_parser = parse_org_type)]
        org_type: OrgType,
    },
    /// List organizations
    List,
    /// Connect or disconnect an integration
    Connect {
        org_id: i64,
        /// loxo, aircall or timesheets
        #[arg(value_parser = parse_integration)]
        integration: IntegrationType,
        #[arg(long)]
        api_key: Option<String>,
        /// Mark the integration disconnected
        #[arg(long)]
        disconnect: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AlertsCommand {
    /// Raise an alert for a user
    Add {
        user: String,
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// List alerts
    List {
        #[arg(long)]
        user: Option<String>,
    },
    /// Acknowledge an alert
    Ack { id: i64 },
}

#[derive(Subcommand, Debug)]
enum BoardsCommand {
    /// Create a custom dashboard from library widgets
    Create {
        name: String,
        #[arg(long, default_value = "me")]
        owner: String,
        /// Library widget id; repeat for more widgets
        #[arg(long = "widget")]
        widgets: Vec<String>,
    },
    /// List saved dashboards
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Render a saved dashboard
    Show { id: i64 },
    /// Append a library widget to a saved dashboard
    AddWidget { id: i64, widget: String },
    /// List the widget library
    Library,
}

#[derive(Subcommand, Debug)]
enum MappingsCommand {
    /// Auto-match recruiters to their Loxo, Aircall and timesheet ids
    Suggest {
        /// Store the suggestions
        #[arg(long)]
        save: bool,
    },
    /// List stored mappings
    List,
}

fn parse_date_range_arg(s: &str) -> std::result::Result<DateRange, String> {
    let range = match s.trim().to_lowercase().as_str() {
        "7d" | "week" => Some(DateRange::Last7Days),
        "30d" | "month" => Some(DateRange::Last30Days),
        "90d" | "quarter" => Some(DateRange::Last90Days),
        "ytd" | "year" => Some(DateRange::ThisYear),
        "last-month" => Some(DateRange::LastMonth),
        _ => DateRange::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim())),
    };
    range.ok_or_else(|| format!("unknown date range {s:?}"))
}

fn parse_leaderboard_metric(s: &str) -> std::result::Result<LeaderboardMetric, String> {
    LeaderboardMetric::parse(s).ok_or_else(|| format!("unknown metric {s:?}"))
}

fn parse_goal_period(s: &str) -> std::result::Result<GoalPeriod, String> {
    GoalPeriod::parse(s).ok_or_else(|| format!("unknown goal period {s:?}"))
}

fn parse_org_type(s: &str) -> std::result::Result<OrgType, String> {
    OrgType::parse(s).ok_or_else(|| format!("unknown organization type {s:?}"))
}

fn parse_integration(s: &str) -> std::result::Result<IntegrationType, String> {
    IntegrationType::ALL
        .into_iter()
        .find(|i| i.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown integration {s:?}"))
}

fn parse_template(s: &str) -> std::result::Result<DashboardTemplate, String> {
    match s.trim().to_lowercase().as_str() {
        "leadership" => Ok(DashboardTemplate::Leadership),
        "recruiter" => Ok(DashboardTemplate::Recruiter),
        "ops" | "ops-hr" => Ok(DashboardTemplate::OpsHr),
        "funnel" => Ok(DashboardTemplate::FunnelAnalysis),
        _ => Err(format!("unknown dashboard {s:?}")),
    }
}

/// Everything a command needs.
struct Session {
    config: Config,
    db: Database,
    data: Dataset,
    now: NaiveDateTime,
    format: Format,
    overrides: FilterCriteria,
}

impl Session {
    fn ctx(&self) -> AnalyticsContext<'_> {
        AnalyticsContext::new(&self.data, self.now)
    }

    fn printer(&self) -> Printer {
        Printer::new(self.format)
    }

    fn json(&self) -> bool {
        self.format == Format::Json
    }

    fn saved_filters(&self) -> Result<GlobalFilters> {
        GlobalFilters::load(&self.db, self.config.filters.date_range())
            .context("failed to load saved filters")
    }

    /// Saved filters with this invocation's overrides merged in.
    fn filters(&self) -> Result<FilterCriteria> {
        let mut filters = self.saved_filters()?;
        filters.update(self.overrides.clone());
        Ok(filters.filters)
    }

    fn goals(&self) -> Result<GoalBook> {
        GoalBook::load(&self.db, self.config.goals.period).context("failed to load goals")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = oneview_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run migrations")?;

    let now = match cli.as_of {
        Some(day) => day.and_hms_opt(12, 0, 0).context("invalid --as-of date")?,
        None => Local::now().naive_local(),
    };

    tracing::debug!(%now, command = ?cli.command, "Running command");

    let session = Session {
        config,
        db,
        data: Dataset::sample(now),
        now,
        format: cli.format,
        overrides: cli.filters.criteria(),
    };

    match cli.command {
        Command::Metrics => cmd_metrics(&session),
        Command::Leaderboard { metric, team } => cmd_leaderboard(&session, metric, team),
        Command::Health => cmd_health(&session),
        Command::Report { query } => cmd_report(&session, &query.join(" ")),
        Command::Dashboard { view } => {
            let filters = session.filters()?;
            cmd_dashboard(&session, view, &filters)
        }
        Command::Plan { query, open } => cmd_plan(&session, &query.join(" "), open),
        Command::Filters(cmd) => cmd_filters(&session, cmd),
        Command::Goals(cmd) => cmd_goals(&session, cmd),
        Command::Org(cmd) => cmd_org(&session, cmd),
        Command::Alerts(cmd) => cmd_alerts(&session, cmd),
        Command::Boards(cmd) => cmd_boards(&session, cmd),
        Command::Mappings(cmd) => cmd_mappings(&session, cmd),
    }
}

// ============================================
// Analytics
// ============================================

fn cmd_metrics(s: &Session) -> Result<()> {
    let filters = s.filters()?;
    let snapshot = compute_all_metrics(&s.ctx(), &filters);
    let org_type = s.config.organization.org_type;
    let visible = visible_metrics(org_type);

    if s.json() {
        return print_json(&json!({
            "organization": s.config.organization.name,
            "orgType": org_type.as_str(),
            "filters": filters,
            "metrics": snapshot,
            "visible": visible.iter().map(|m| m.key).collect::<Vec<_>>(),
        }));
    }

    let out = s.printer();
    out.title(&format!("{} KPIs", s.config.organization.name));
    out.note(&format!("{} · {}", describe_filters(&filters), org_type.display_name()));
    let rows: Vec<Vec<String>> = visible
        .iter()
        .map(|m| {
            vec![
                m.label.to_string(),
                metric_value(m.id, snapshot.get(m.id)),
                m.description.to_string(),
            ]
        })
        .collect();
    out.table(&["Metric", "Value", "Description"], &rows);
    out.footer();
    Ok(())
}

fn cmd_leaderboard(s: &Session, metric: LeaderboardMetric, team: bool) -> Result<()> {
    let filters = s.filters()?;
    let goals = s.goals()?;
    let view = if team {
        LeaderboardView::Team
    } else {
        LeaderboardView::Individual
    };
    let entries = apply_goals(compute_leaderboard(view, metric, &s.ctx(), &filters), &goals, metric);

    if s.json() {
        return print_json(&json!({
            "metric": metric,
            "view": view,
            "period": goals.period,
            "filters": filters,
            "entries": entries,
        }));
    }

    let out = s.printer();
    let scope = if team { "Team" } else { "Individual" };
    out.title(&format!("{scope} Leaderboard: {}", metric.label()));
    out.note(&format!("{} · {} goals", describe_filters(&filters), goals.period.as_str()));

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let mut row = vec![format!("#{}", e.rank), e.name.clone()];
            if !team {
                row.push(e.team.clone().unwrap_or_else(|| "-".to_string()));
            }
            row.push(leaderboard_value(metric, Some(e.value)));
            row.push(leaderboard_value(metric, e.target));
            row.push(format_goal_progress(e.value, e.target));
            row
        })
        .collect();
    let headers: &[&str] = if team {
        &["Rank", "Team", "Value", "Target", "Progress"]
    } else {
        &["Rank", "Recruiter", "Team", "Value", "Target", "Progress"]
    };
    out.table(headers, &rows);
    out.footer();
    Ok(())
}

fn cmd_health(s: &Session) -> Result<()> {
    let filters = s.filters()?;
    let issues = compute_data_health_issues(&s.ctx(), &filters);
    let score = compute_data_health_score(&issues, &s.data);

    if s.json() {
        return print_json(&json!({
            "filters": filters,
            "score": score,
            "issues": issues,
        }));
    }

    let out = s.printer();
    out.title("Data Health");
    out.fields(&[
        ("Overall score", format!("{}/100", score.overall)),
        ("Flagged", score.flagged.to_string()),
        ("Invalid", score.invalid.to_string()),
        ("Warnings", score.warnings.to_string()),
        ("Quarantined", score.quarantined.to_string()),
    ]);

    if issues.is_empty() {
        out.note("No data health issues found.");
    } else {
        out.section("Issues");
        let rows: Vec<Vec<String>> = issues
            .iter()
            .map(|i| {
                vec![
                    i.severity.as_str().to_string(),
                    i.category.to_string(),
                    i.message.clone(),
                    i.recommended_action.to_string(),
                ]
            })
            .collect();
        out.table(&["Severity", "Category", "Issue", "Action"], &rows);
    }
    out.footer();
    Ok(())
}

fn cmd_report(s: &Session, query: &str) -> Result<()> {
    let filters = s.filters()?;
    let report = generate_ai_report(query, &s.ctx(), &filters);

    if s.json() {
        return print_json(&json!({ "query": query, "report": report }));
    }

    let out = s.printer();
    out.title(&report.title);
    let kpis: Vec<(&str, String)> = report
        .kpis
        .iter()
        .map(|k| {
            let value = match &k.change {
                Some(change) => format!("{} ({change})", k.value),
                None => k.value.clone(),
            };
            (k.label.as_str(), value)
        })
        .collect();
    out.fields(&kpis);
    if let Some(table) = &report.table {
        let headers: Vec<&str> = table.headers.iter().map(String::as_str).collect();
        out.table(&headers, &table.rows);
    }
    out.paragraph(&report.narrative);
    out.footer();
    Ok(())
}

fn activity_rows(activity: &[PipelineActivity]) -> Vec<Vec<String>> {
    activity
        .iter()
        .map(|a| {
            vec![
                a.date.clone(),
                a.candidate.clone(),
                format!("{} → {}", a.from_stage, a.to_stage),
                a.job.clone(),
                a.recruiter.clone(),
                a.status.to_string(),
            ]
        })
        .collect()
}

const ACTIVITY_HEADERS: &[&str] = &["Date", "Candidate", "Move", "Job", "Recruiter", "Status"];

fn cmd_dashboard(s: &Session, view: DashboardTemplate, filters: &FilterCriteria) -> Result<()> {
    let ctx = s.ctx();
    let out = s.printer();
    let is_agency = s.config.organization.org_type.is_agency();

    match view {
        DashboardTemplate::Leadership => {
            let totals = generate_dashboard_metrics(&ctx, filters);
            let funnel = generate_funnel_data(&ctx, filters);
            let top = generate_top_performers(&ctx, filters);
            let trend = generate_trend_data();
            if s.json() {
                return print_json(&json!({
                    "view": view,
                    "filters": filters,
                    "totals": totals,
                    "funnel": funnel,
                    "trend": trend,
                    "topPerformers": top,
                }));
            }

            out.title(view.label());
            out.note(&describe_filters(filters));
            let mut fields = vec![
                ("Calls", format_number(Some(totals.calls as f64))),
                ("Hours", format_hours(Some(totals.hours))),
                ("Placements", totals.placements.to_string()),
                ("Interviews", totals.interviews.to_string()),
                ("Offers", totals.offers.to_string()),
            ];
            if is_agency {
                fields.push(("Revenue", format_currency(Some(totals.revenue))));
                fields.push(("Margin", format_currency(Some(totals.margin))));
                fields.push(("Active contractors", totals.active_contractors.to_string()));
            }
            fields.push(("Active recruiters", totals.active_recruiters.to_string()));
            out.fields(&fields);

            out.section("Funnel");
            let rows: Vec<Vec<String>> = funnel
                .iter()
                .map(|f| vec![f.stage.to_string(), format_number(Some(f.value as f64)), format!("{}%", f.conversion)])
                .collect();
            out.table(&["Stage", "Value", "Conversion"], &rows);

            out.section("Top performers");
            let rows: Vec<Vec<String>> = top
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.calls.to_string(),
                        format!("{}h", p.hours),
                        p.outcomes.to_string(),
                        format!("{:.3}", p.efficiency),
                    ]
                })
                .collect();
            out.table(&["Recruiter", "Calls", "Hours", "Placements", "Per hour"], &rows);

            out.section("12-month trend");
            let rows: Vec<Vec<String>> = trend
                .iter()
                .map(|t| vec![t.month.to_string(), t.placements.to_string(), t.calls.to_string(), t.hours.to_string()])
                .collect();
            out.table(&["Month", "Placements", "Calls", "Hours"], &rows);
        }
        DashboardTemplate::Recruiter => {
            let metrics = generate_recruiter_metrics(&ctx, filters);
            let movement = generate_pipeline_movement(&ctx, filters);
            let interviews = generate_interview_activity(&ctx, filters);
            let offers = generate_offer_activity(&ctx, filters);
            if s.json() {
                return print_json(&json!({
                    "view": view,
                    "filters": filters,
                    "metrics": metrics,
                    "pipelineMovement": movement,
                    "interviews": interviews,
                    "offers": offers,
                }));
            }

            out.title(view.label());
            out.note(&describe_filters(filters));
            out.fields(&[
                ("Calls", format_number(Some(metrics.total_calls as f64))),
                ("Avg call", format_duration((metrics.avg_call_duration * 60) as u32)),
                ("Hours", format!("{}h", metrics.total_hours)),
                ("Billable hours", format!("{}h", metrics.billable_hours)),
                ("Pipeline moves", metrics.pipeline_moves.to_string()),
                ("Interviews", metrics.interviews.to_string()),
                ("Offers", metrics.offers.to_string()),
                ("Placements", metrics.placements.to_string()),
            ]);
            out.section("Pipeline movement");
            out.table(ACTIVITY_HEADERS, &activity_rows(&movement));
            out.section("Interviews");
            out.table(ACTIVITY_HEADERS, &activity_rows(&interviews));
            out.section("Offers");
            out.table(ACTIVITY_HEADERS, &activity_rows(&offers));
        }
        DashboardTemplate::OpsHr => {
            let ops = generate_ops_metrics(&ctx, filters);
            if s.json() {
                return print_json(&json!({ "view": view, "filters": filters, "ops": ops }));
            }

            out.title(view.label());
            out.note(&describe_filters(filters));
            out.fields(&[
                ("Utilization", format!("{}%", ops.utilization)),
                ("Burnout risk", format!("{:?}", ops.burnout_risk)),
                ("Data completeness", format!("{}%", ops.data_completeness)),
                ("Active contractors", ops.active_contractors.to_string()),
            ]);
        }
        DashboardTemplate::FunnelAnalysis => {
            let analysis = generate_funnel_analysis(&ctx, filters);
            let funnel = generate_funnel_data(&ctx, filters);
            if s.json() {
                return print_json(&json!({
                    "view": view,
                    "filters": filters,
                    "analysis": analysis,
                    "funnel": funnel,
                }));
            }

            out.title(view.label());
            out.note(&describe_filters(filters));
            out.fields(&[
                ("Calls", format_number(Some(analysis.calls as f64))),
                ("Hours", format!("{}h", analysis.hours)),
                ("Placements", analysis.outcomes.to_string()),
                ("Calls per day", analysis.avg_calls_per_day.to_string()),
                ("Hours per call", format!("{:.2}", analysis.hours_per_call)),
                ("Calls per placement", analysis.calls_per_outcome.to_string()),
                ("Hours per placement", analysis.hours_per_outcome.to_string()),
                ("Conversion", format_percent(Some(analysis.conversion_rate), 2)),
            ]);
            let rows: Vec<Vec<String>> = funnel
                .iter()
                .map(|f| vec![f.stage.to_string(), format_number(Some(f.value as f64)), format!("{}%", f.conversion)])
                .collect();
            out.table(&["Stage", "Value", "Conversion"], &rows);
        }
    }
    out.footer();
    Ok(())
}

fn cmd_plan(s: &Session, query: &str, open: bool) -> Result<()> {
    let intent = parse_dashboard_query(query);

    if !open {
        if s.json() {
            return print_json(&json!({ "query": query, "intent": intent }));
        }
        let out = s.printer();
        out.title("Dashboard Request");
        let group_by = intent
            .group_by
            .map(|g| format!("{g:?}").to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        out.fields(&[
            ("Dashboard", intent.template.label().to_string()),
            ("Path", intent.path.to_string()),
            ("Date range", intent.date_range.label().to_string()),
            ("Group by", group_by),
        ]);
        return Ok(());
    }

    // An explicit --date-range wins over the one in the request
    let mut filters = s.filters()?;
    if s.overrides.date_range.is_none() {
        filters.date_range = Some(intent.date_range);
    }
    cmd_dashboard(s, intent.template, &filters)
}

// ============================================
// Saved state
// ============================================

fn cmd_filters(s: &Session, cmd: FiltersCommand) -> Result<()> {
    let mut filters = s.saved_filters()?;
    match cmd {
        FiltersCommand::Show => {}
        FiltersCommand::Set => {
            if s.overrides == FilterCriteria::default() {
                bail!("nothing to set: pass --date-range, --recruiter, --client or --job");
            }
            filters.update(s.overrides.clone());
            filters.save(&s.db).context("failed to save filters")?;
        }
        FiltersCommand::Clear => {
            filters.clear();
            filters.save(&s.db).context("failed to save filters")?;
        }
    }

    if s.json() {
        return print_json(&json!({ "filters": filters.criteria() }));
    }
    let criteria = filters.criteria();
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let out = s.printer();
    out.section("Saved filters");
    out.fields(&[
        ("Date range", criteria.effective_date_range().label().to_string()),
        ("Recruiter", show(&criteria.recruiter)),
        ("Client", show(&criteria.client)),
        ("Job", show(&criteria.job)),
    ]);
    Ok(())
}

fn cmd_goals(s: &Session, cmd: GoalsCommand) -> Result<()> {
    let mut goals = s.goals()?;
    match cmd {
        GoalsCommand::Show => {}
        GoalsCommand::Set {
            entity,
            metric,
            value,
        } => {
            if !value.is_finite() || value < 0.0 {
                bail!("target must be a non-negative number");
            }
            let id = resolve_goal_entity(&s.data, &entity)?;
            goals.set_target(&id, metric, value);
            goals.save(&s.db).context("failed to save goals")?;
        }
        GoalsCommand::Init => {
            let ids: Vec<&str> = s.data.recruiters().iter().map(|r| r.id.as_str()).collect();
            goals.initialize_default_targets(ids, s.data.teams());
            goals.save(&s.db).context("failed to save goals")?;
        }
        GoalsCommand::Period { period } => {
            goals.set_period(period);
            goals.save(&s.db).context("failed to save goals")?;
        }
    }

    if s.json() {
        return print_json(&json!({ "goals": goals }));
    }
    let out = s.printer();
    out.section(&format!("Goals ({})", goals.period.as_str()));
    if goals.targets.is_empty() {
        out.note("No targets set. Run `oneview goals init` to create defaults.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = goals
        .targets
        .keys()
        .map(|id| {
            let name = s.data.recruiter(id).map_or(id.as_str(), |r| r.name.as_str());
            let mut row = vec![name.to_string()];
            row.extend(
                LeaderboardMetric::ALL
                    .into_iter()
                    .map(|m| leaderboard_value(m, goals.target(id, m))),
            );
            row
        })
        .collect();
    out.table(&["Recruiter / team", "Calls", "Hours", "Placements", "Revenue"], &rows);
    Ok(())
}

/// Recruiter id for an id or slug, or a team name as-is.
fn resolve_goal_entity(data: &Dataset, entity: &str) -> Result<String> {
    if let Some(r) = data.recruiter(entity).or_else(|| data.recruiter_by_slug(entity)) {
        return Ok(r.id.clone());
    }
    if let Some(team) = data.teams().into_iter().find(|t| t.eq_ignore_ascii_case(entity)) {
        return Ok(team.to_string());
    }
    bail!("unknown recruiter or team {entity:?}")
}

// ============================================
// Workspace
// ============================================

fn cmd_org(s: &Session, cmd: OrgCommand) -> Result<()> {
    let orgs = match cmd {
        OrgCommand::Add { name, org_type } => {
            vec![s.db.add_organization(&name, org_type).context("failed to add organization")?]
        }
        OrgCommand::List => s.db.list_organizations().context("failed to list organizations")?,
        OrgCommand::Connect {
            org_id,
            integration,
            api_key,
            disconnect,
        } => {
            let integration = Integration {
                id: integration,
                connected: !disconnect,
                api_key,
            };
            vec![s
                .db
                .update_integration(org_id, integration)
                .context("failed to update integration")?]
        }
    };

    if s.json() {
        return print_json(&json!({ "organizations": orgs }));
    }
    let rows: Vec<Vec<String>> = orgs
        .iter()
        .map(|o| {
            let connected: Vec<&str> = o
                .integrations
                .iter()
                .filter(|i| i.connected)
                .map(|i| i.id.as_str())
                .collect();
            vec![
                o.id.to_string(),
                o.name.clone(),
                o.org_type.display_name().to_string(),
                if connected.is_empty() {
                    "-".to_string()
                } else {
                    connected.join(", ")
                },
            ]
        })
        .collect();
    s.printer().table(&["ID", "Name", "Type", "Connected"], &rows);
    Ok(())
}

fn cmd_alerts(s: &Session, cmd: AlertsCommand) -> Result<()> {
    let alerts = match cmd {
        AlertsCommand::Add { user, message } => {
            vec![s.db.add_alert(&user, &message.join(" ")).context("failed to add alert")?]
        }
        AlertsCommand::List { user } => s
            .db
            .list_alerts(user.as_deref())
            .context("failed to list alerts")?,
        AlertsCommand::Ack { id } => vec![s.db.acknowledge_alert(id).context("failed to acknowledge alert")?],
    };

    if s.json() {
        return print_json(&json!({ "alerts": alerts }));
    }
    let rows: Vec<Vec<String>> = alerts
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.user.clone(),
                if a.acknowledged { "acknowledged" } else { "open" }.to_string(),
                a.message.clone(),
            ]
        })
        .collect();
    s.printer().table(&["ID", "User", "Status", "Message"], &rows);
    Ok(())
}

fn library_widget(metric_id: &str, widget_id: String) -> Result<Widget> {
    match find_widget_definition(metric_id) {
        Some(def) => Ok(Widget::from_definition(def, widget_id)),
        None => bail!(
            "unknown widget {metric_id:?}; run `oneview boards library` to list widgets"
        ),
    }
}

fn cmd_boards(s: &Session, cmd: BoardsCommand) -> Result<()> {
    let boards = match cmd {
        BoardsCommand::Create {
            name,
            owner,
            widgets,
        } => {
            let widgets = widgets
                .iter()
                .enumerate()
                .map(|(i, id)| library_widget(id, format!("w-{}", i + 1)))
                .collect::<Result<Vec<_>>>()?;
            vec![s
                .db
                .create_dashboard(&name, &owner, widgets)
                .context("failed to create dashboard")?]
        }
        BoardsCommand::List { owner } => s
            .db
            .list_dashboards(owner.as_deref())
            .context("failed to list dashboards")?,
        BoardsCommand::AddWidget { id, widget } => {
            let mut board = s.db.get_dashboard(id).context("failed to load dashboard")?;
            let next = format!("w-{}", board.widgets.len() + 1);
            board.widgets.push(library_widget(&widget, next)?);
            s.db
                .update_dashboard(board.id, &board.name, &board.widgets)
                .context("failed to update dashboard")?;
            vec![board]
        }
        BoardsCommand::Show { id } => {
            let board = s.db.get_dashboard(id).context("failed to load dashboard")?;
            return show_board(s, &board);
        }
        BoardsCommand::Library => {
            if s.json() {
                return print_json(&json!({ "widgets": WIDGET_LIBRARY }));
            }
            let rows: Vec<Vec<String>> = WIDGET_LIBRARY
                .iter()
                .map(|w| vec![w.id.to_string(), w.label.to_string(), w.widget_type.as_str().to_string(), w.description.to_string()])
                .collect();
            s.printer().table(&["ID", "Label", "Type", "Description"], &rows);
            return Ok(());
        }
    };

    if s.json() {
        return print_json(&json!({ "dashboards": boards }));
    }
    let rows: Vec<Vec<String>> = boards
        .iter()
        .map(|b| vec![b.id.to_string(), b.name.clone(), b.owner.clone(), b.widgets.len().to_string()])
        .collect();
    s.printer().table(&["ID", "Name", "Owner", "Widgets"], &rows);
    Ok(())
}

fn show_board(s: &Session, board: &oneview_core::Dashboard) -> Result<()> {
    let filters = s.filters()?;
    let ctx = s.ctx();
    let views: Vec<(String, WidgetView)> = board
        .widgets
        .iter()
        .map(|w| (w.id.clone(), render_widget(w, &ctx, &filters)))
        .collect();

    if s.json() {
        let widgets: Vec<_> = views
            .iter()
            .map(|(id, view)| json!({ "id": id, "view": view }))
            .collect();
        return print_json(&json!({
            "id": board.id,
            "name": board.name,
            "owner": board.owner,
            "filters": filters,
            "widgets": widgets,
        }));
    }

    let out = s.printer();
    out.title(&board.name);
    out.note(&describe_filters(&filters));
    let kpis: Vec<(&str, String)> = views
        .iter()
        .filter_map(|(_, view)| match view {
            WidgetView::Kpi { label, value } => Some((label.as_str(), value.clone())),
            _ => None,
        })
        .collect();
    if !kpis.is_empty() {
        out.fields(&kpis);
    }
    for (id, view) in &views {
        match view {
            WidgetView::Kpi { .. } => {}
            WidgetView::Trend { label, points } => {
                out.section(label);
                let rows: Vec<Vec<String>> = points
                    .iter()
                    .map(|p| vec![p.month.to_string(), p.placements.to_string()])
                    .collect();
                out.table(&["Month", "Placements"], &rows);
            }
            WidgetView::Table { label, message } => {
                out.section(label);
                out.note(message);
            }
            WidgetView::Unknown { reason } => out.note(&format!("Widget {id}: {reason}")),
        }
    }
    out.footer();
    Ok(())
}

fn cmd_mappings(s: &Session, cmd: MappingsCommand) -> Result<()> {
    let mappings = match cmd {
        MappingsCommand::Suggest { save } => {
            let suggested = suggest_user_mappings(&s.data);
            if save {
                for mapping in &suggested {
                    s.db.add_user_mapping(mapping).context("failed to save user mapping")?;
                }
            }
            suggested
        }
        MappingsCommand::List => s.db.list_user_mappings().context("failed to list user mappings")?,
    };

    if s.json() {
        return print_json(&json!({ "mappings": mappings }));
    }
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let rows: Vec<Vec<String>> = mappings
        .iter()
        .map(|m| {
            vec![
                m.user.clone(),
                show(&m.loxo_user_id),
                show(&m.aircall_user_id),
                show(&m.timesheet_user_id),
            ]
        })
        .collect();
    s.printer().table(&["User", "Loxo", "Aircall", "Timesheets"], &rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range_arg() {
        assert_eq!(parse_date_range_arg("7d"), Ok(DateRange::Last7Days));
        assert_eq!(parse_date_range_arg("Last month"), Ok(DateRange::LastMonth));
        assert_eq!(parse_date_range_arg("last 90 days"), Ok(DateRange::Last90Days));
        assert!(parse_date_range_arg("fortnight").is_err());
    }

    #[test]
    fn test_resolve_goal_entity() {
        let data = Dataset::sample(
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        assert_eq!(resolve_goal_entity(&data, "mike-chen").unwrap(), "rec-002");
        assert_eq!(resolve_goal_entity(&data, "rec-001").unwrap(), "rec-001");
        assert_eq!(resolve_goal_entity(&data, "team alpha").unwrap(), "Team Alpha");
        assert!(resolve_goal_entity(&data, "nobody").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
