use oneview_core::{Database, GlobalFilters};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Every run is evaluated as of this day so the sample data is stable.
const AS_OF: &str = "2024-03-15";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("oneview/oneview.db")
    }

    fn write_config(&self, toml: &str) {
        let dir = self.xdg_config.join("oneview");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), toml).expect("failed to write config");
    }
}

fn run(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("oneview"));
    Command::new(bin_path)
        .arg("--as-of")
        .arg(AS_OF)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute oneview: {e}"))
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run(env, args);
    if !output.status.success() {
        panic!(
            "oneview {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_json(env: &CliTestEnv, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.extend(["--format", "json"]);
    let stdout = run_ok(env, &full);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}):\n{stdout}"))
}

#[test]
fn metrics_render_in_every_format() {
    let env = CliTestEnv::new();

    let terminal = run_ok(&env, &["metrics"]);
    assert!(terminal.contains("Total Calls"), "{terminal}");
    assert!(terminal.contains("Revenue per Hour"));

    let markdown = run_ok(&env, &["metrics", "--format", "md"]);
    assert!(markdown.starts_with("# OneView Ops KPIs"), "{markdown}");
    assert!(markdown.contains("| Metric | Value | Description |"));

    let json = run_json(&env, &["metrics"]);
    assert!(json["metrics"]["totalCalls"].as_u64().unwrap() > 0);
    assert_eq!(json["filters"]["date_range"], "Last 30 days");

    assert!(env.db_path().exists(), "database should be created");
}

#[test]
fn internal_ta_hides_revenue_metrics() {
    let env = CliTestEnv::new();
    env.write_config("[organization]\nname = \"Acme Talent\"\norg_type = \"internal_ta\"\n");

    let terminal = run_ok(&env, &["metrics"]);
    assert!(terminal.contains("Acme Talent KPIs"));
    assert!(!terminal.contains("Revenue per Hour"), "{terminal}");
}

#[test]
fn unknown_date_range_is_rejected() {
    let env = CliTestEnv::new();
    let output = run(&env, &["metrics", "--date-range", "fortnight"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown date range"));
}

#[test]
fn saved_filters_apply_to_later_runs() {
    let env = CliTestEnv::new();

    run_ok(&env, &["filters", "set", "--recruiter", "mike-chen", "--date-range", "90d"]);
    let shown = run_ok(&env, &["filters", "show"]);
    assert!(shown.contains("mike-chen"));
    assert!(shown.contains("Last 90 days"));

    let json = run_json(&env, &["metrics"]);
    assert_eq!(json["filters"]["recruiter"], "mike-chen");

    // Overrides apply to one run only
    let json = run_json(&env, &["metrics", "--recruiter", "sarah-johnson"]);
    assert_eq!(json["filters"]["recruiter"], "sarah-johnson");

    let db = Database::open(&env.db_path()).unwrap();
    let saved = GlobalFilters::load(&db, Default::default()).unwrap();
    assert_eq!(saved.filters.recruiter.as_deref(), Some("mike-chen"));

    run_ok(&env, &["filters", "clear"]);
    let json = run_json(&env, &["filters", "show"]);
    assert!(json["filters"]["recruiter"].is_null());

    let output = run(&env, &["filters", "set"]);
    assert!(!output.status.success());
}

#[test]
fn leaderboard_with_goals() {
    let env = CliTestEnv::new();

    let before = run_json(&env, &["leaderboard", "--metric", "revenue"]);
    let entries = before["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e["target"].is_null()));

    run_ok(&env, &["goals", "init"]);
    run_ok(&env, &["goals", "set", "mike-chen", "calls", "50"]);
    let goals = run_ok(&env, &["goals", "show"]);
    assert!(goals.contains("$45,000"));
    assert!(goals.contains("$90,000"));

    let team = run_ok(&env, &["leaderboard", "--team", "--metric", "placements"]);
    assert!(team.contains("Team Alpha"));
    assert!(team.contains("Team Beta"));

    let calls = run_json(&env, &["leaderboard"]);
    let mike = calls["entries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == "rec-002")
        .unwrap();
    assert_eq!(mike["target"], 50.0);

    let output = run(&env, &["goals", "set", "nobody", "calls", "10"]);
    assert!(!output.status.success());
}

#[test]
fn health_report_and_dashboards() {
    let env = CliTestEnv::new();

    let health = run_json(&env, &["health"]);
    assert!(health["score"]["overall"].as_u64().unwrap() <= 100);

    let report = run_ok(&env, &["report", "Why", "did", "placements", "drop", "last", "month?"]);
    assert!(report.contains("Placement Analysis: Last Month"), "{report}");

    let roi = run_json(&env, &["report", "ROI per hour by recruiter"]);
    assert_eq!(roi["report"]["title"], "ROI per Hour Analysis");

    for view in ["leadership", "recruiter", "ops", "funnel"] {
        run_ok(&env, &["dashboard", "--view", view]);
    }
    let leadership = run_ok(&env, &["dashboard"]);
    assert!(leadership.contains("Leadership Dashboard"));
    assert!(leadership.contains("TOP PERFORMERS"));

    let plan = run_json(&env, &["plan", "contractor utilization this week"]);
    assert_eq!(plan["intent"]["template"], "ops_hr");
    assert_eq!(plan["intent"]["date_range"], "Last 7 days");

    let opened = run_ok(&env, &["plan", "--open", "funnel for this quarter"]);
    assert!(opened.contains("Funnel Analysis"));
}

#[test]
fn workspace_records_persist() {
    let env = CliTestEnv::new();

    run_ok(&env, &["org", "add", "Acme Staffing"]);
    run_ok(&env, &["org", "connect", "1", "aircall", "--api-key", "key-123"]);
    let orgs = run_ok(&env, &["org", "list"]);
    assert!(orgs.contains("Acme Staffing"));
    assert!(orgs.contains("aircall"));

    run_ok(&env, &["alerts", "add", "sarah", "Timesheets", "missing"]);
    let acked = run_ok(&env, &["alerts", "ack", "1"]);
    assert!(acked.contains("acknowledged"));
    assert!(!run(&env, &["alerts", "ack", "99"]).status.success());

    run_ok(&env, &["mappings", "suggest", "--save"]);
    let mappings = run_ok(&env, &["mappings", "list"]);
    assert!(mappings.contains("ac-rec-001"));
    assert!(mappings.contains("ts-rec-005"));

    let db = Database::open(&env.db_path()).unwrap();
    assert_eq!(db.list_alerts(Some("sarah")).unwrap().len(), 1);
}

#[test]
fn custom_dashboards() {
    let env = CliTestEnv::new();

    run_ok(
        &env,
        &["boards", "create", "Weekly", "--widget", "total-calls", "--widget", "utilization"],
    );
    run_ok(&env, &["boards", "add-widget", "1", "placements-trend"]);

    let shown = run_ok(&env, &["boards", "show", "1"]);
    assert!(shown.contains("Total Calls"));
    assert!(shown.contains("Utilization %"));
    assert!(shown.contains("PLACEMENTS TREND"));

    let json = run_json(&env, &["boards", "show", "1"]);
    assert_eq!(json["widgets"].as_array().unwrap().len(), 3);
    assert_eq!(json["widgets"][0]["view"]["kind"], "kpi");

    assert!(!run(&env, &["boards", "add-widget", "1", "bogus"]).status.success());
    assert!(!run(&env, &["boards", "show", "7"]).status.success());

    let library = run_ok(&env, &["boards", "library"]);
    assert!(library.contains("revenue-per-recruiter"));
}
