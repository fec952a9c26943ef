use chrono::NaiveDate;
use git2::{Commit, Repository, Signature, Time};
use pacelens_lib::analysis::code_size::resolve_file_at_date;
use pacelens_lib::analysis::fit::fit_models;
use pacelens_lib::analysis::popularity::StarHistory;
use pacelens_lib::models::improvement::CompiledDataset;
use pacelens_lib::models::record::ImprovementRecord;
use pacelens_lib::stages;
use pacelens_lib::stages::config::Config;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CHANGELOG: &str = "\
# Speedrun changelog

## Record history

| # | Record time | Description | Date | Log | Contributors |
| - | - | - | - | - | - |
| 1 | 45 minutes | Initial baseline | 01/01/24 | - | @alice |
| 2 | 30 minutes | Tuned learning rate [PR](https://github.com/x/y/pull/12) | 01/10/24 | - | @bob |
| 3 | 20 minutes | Re-measured baseline hardware | 01/20/24 | - | @carol (just re-timing, not a new record) |
| 4 | 15 minutes | Rotary embeddings | 01/30/24 | - | @dave |
| 5 | 10 minutes | New optimizer | 02/10/24 | - | @erin |
";

fn timestamp(date: &str) -> i64 {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .expect("date")
        .and_hms_opt(12, 0, 0)
        .expect("time")
        .and_utc()
        .timestamp()
}

fn commit_file(repo: &Repository, rel: &str, content: &str, date: &str, message: &str) {
    let workdir = repo.workdir().expect("workdir");
    if let Some(parent) = Path::new(rel).parent() {
        fs::create_dir_all(workdir.join(parent)).expect("create parent dirs");
    }
    fs::write(workdir.join(rel), content).expect("write source file");

    let mut index = repo.index().expect("open git index");
    index.add_path(Path::new(rel)).expect("add source file");
    index.write().expect("write git index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");

    let when = Time::new(timestamp(date), 0);
    let signature = Signature::new("Test User", "test@example.com", &when).expect("signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.as_ref().into_iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("commit");
}

fn file_with_lines(lines: usize) -> String {
    (0..lines).map(|i| format!("print({i})\n")).collect()
}

fn test_config(root: &Path, history_repo: &Path) -> Config {
    Config {
        changelog: root.join("changelog.md").to_string_lossy().into_owned(),
        history_repo: history_repo.to_string_lossy().into_owned(),
        star_history: root.join("star_history.csv").to_string_lossy().into_owned(),
        data_dir: root.join("data").to_string_lossy().into_owned(),
        plots_dir: root.join("plots").to_string_lossy().into_owned(),
        training_file: "train_gpt.py".to_string(),
        legacy_training_file: "train_gpt2.py".to_string(),
    }
}

fn create_history_repo() -> (TempDir, Repository) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("init git repo");
    (temp_dir, repo)
}

#[test]
fn extract_stage_round_trips_the_synthetic_table() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let config = test_config(tmp.path(), Path::new("unused"));
    fs::write(&config.changelog, CHANGELOG).expect("write changelog");

    stages::extract::run(&config).expect("extract stage");

    let raw = fs::read_to_string(config.records_path()).expect("read records artifact");
    let records: Vec<ImprovementRecord> = serde_json::from_str(&raw).expect("parse records");

    assert_eq!(records.len(), 5);
    let indices: Vec<u32> = records.iter().map(|r| r.sequence_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    assert_eq!(records.iter().filter(|r| !r.is_retiming).count(), 4);
    assert!(records[2].is_retiming);
    assert_eq!(records[1].pr_number, Some(12));
    assert_eq!(records[0].date.as_deref(), Some("2024-01-01"));
}

#[test]
fn code_size_resolution_honors_record_dates() {
    let (_tmp, repo) = create_history_repo();
    commit_file(&repo, "train_gpt.py", &file_with_lines(3), "2024-01-05", "initial trainer");
    commit_file(&repo, "train_gpt.py", &file_with_lines(5), "2024-01-15", "grow trainer");

    let date = |text: &str| NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("date");

    // Exact-date match picks that day's commit.
    let exact = resolve_file_at_date(&repo, "train_gpt.py", "train_gpt2.py", date("2024-01-15"))
        .expect("resolve")
        .expect("resolved source");
    assert_eq!(exact.line_count, 5);

    // Between commits the nearest-before state wins; later code never leaks back.
    let nearest = resolve_file_at_date(&repo, "train_gpt.py", "train_gpt2.py", date("2024-01-10"))
        .expect("resolve")
        .expect("resolved source");
    assert_eq!(nearest.line_count, 3);

    // No history at or before the date.
    let before = resolve_file_at_date(&repo, "train_gpt.py", "train_gpt2.py", date("2024-01-01"))
        .expect("resolve");
    assert!(before.is_none());
}

#[test]
fn code_size_resolution_falls_back_to_the_legacy_filename() {
    let (_tmp, repo) = create_history_repo();
    commit_file(&repo, "train_gpt2.py", &file_with_lines(4), "2024-01-05", "legacy trainer");

    let date = NaiveDate::parse_from_str("2024-01-10", "%Y-%m-%d").expect("date");
    let resolved = resolve_file_at_date(&repo, "train_gpt.py", "train_gpt2.py", date)
        .expect("resolve")
        .expect("resolved source");

    assert_eq!(resolved.file, "train_gpt2.py");
    assert_eq!(resolved.line_count, 4);
}

#[test]
fn full_pipeline_compiles_joins_and_fits_without_star_data() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let (history_dir, repo) = create_history_repo();
    commit_file(&repo, "train_gpt.py", &file_with_lines(5), "2024-01-03", "initial trainer");
    commit_file(&repo, "train_gpt.py", &file_with_lines(7), "2024-01-09", "tune lr");
    commit_file(&repo, "train_gpt.py", &file_with_lines(9), "2024-01-28", "rotary");
    commit_file(&repo, "train_gpt.py", &file_with_lines(11), "2024-02-05", "optimizer");

    let config = test_config(tmp.path(), history_dir.path());
    fs::write(&config.changelog, CHANGELOG).expect("write changelog");

    stages::extract::run(&config).expect("extract stage");
    stages::code_size::run(&config).expect("code-size stage");
    stages::compile::run(&config).expect("compile stage");

    let raw = fs::read_to_string(config.improvements_path()).expect("read improvements");
    let dataset: CompiledDataset = serde_json::from_str(&raw).expect("parse improvements");

    // Retiming row dropped, everything else kept in order.
    assert_eq!(dataset.improvements.len(), 4);
    assert!(dataset.warnings.is_empty());

    let days: Vec<f64> = dataset
        .improvements
        .iter()
        .map(|i| i.days_since_start.expect("days"))
        .collect();
    assert_eq!(days, vec![0.0, 9.0, 29.0, 40.0]);

    let locs: Vec<Option<usize>> = dataset.improvements.iter().map(|i| i.cumulative_loc).collect();
    assert_eq!(locs, vec![None, Some(7), Some(9), Some(11)]);

    // Missing star export degrades to nulls, never a failure.
    assert!(dataset.improvements.iter().all(|i| i.stars.is_none()));

    let times: Vec<f64> = dataset
        .improvements
        .iter()
        .map(|i| i.record_time_minutes)
        .collect();
    let fits = fit_models(&days, &times).expect("fit models");

    assert!(fits.power_law.coefficient.is_finite());
    assert!(fits.power_law.exponent.is_finite());
    assert!(fits.exponential.initial_value.is_finite());
    assert!(fits.exponential.decay_rate < 0.0);
    for r in [fits.power_law.r_squared, fits.exponential.r_squared] {
        assert!((0.0..=1.0).contains(&r), "R² out of range: {r}");
    }
}

#[test]
fn monotonicity_violation_is_reported_in_the_compiled_output() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let config = test_config(tmp.path(), Path::new("unused"));

    let changelog = "\
| # | Record time | Description | Date | Log | Contributors |
| - | - | - | - | - | - |
| 1 | 45 minutes | Baseline | 01/01/24 | - | @alice |
| 2 | 50 minutes | Slower change | 01/10/24 | - | @bob |
";
    fs::write(&config.changelog, changelog).expect("write changelog");

    stages::extract::run(&config).expect("extract stage");
    // Hand the compile stage an empty code-size artifact; the join keeps
    // nulls for records without a sample.
    fs::create_dir_all(&config.data_dir).expect("data dir");
    fs::write(config.code_size_path(), "[]").expect("write empty code sizes");

    stages::compile::run(&config).expect("compile stage");

    let raw = fs::read_to_string(config.improvements_path()).expect("read improvements");
    let dataset: CompiledDataset = serde_json::from_str(&raw).expect("parse improvements");

    assert_eq!(dataset.improvements.len(), 2, "violating row must be kept");
    assert_eq!(dataset.warnings.len(), 1);
    assert!(dataset.warnings[0].contains("Record #2"));
}

#[test]
fn star_history_file_interpolates_exactly_and_never_extrapolates() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let csv_path = tmp.path().join("star_history.csv");
    fs::write(&csv_path, "date,stars\n2024-01-01,100\n2024-01-11,200\n").expect("write csv");

    let history = StarHistory::load(&csv_path).expect("load star history");
    let date = |text: &str| NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("date");

    assert_eq!(history.interpolate_at(date("2024-01-01")), Some(100.0));
    assert_eq!(history.interpolate_at(date("2024-01-11")), Some(200.0));
    assert_eq!(history.interpolate_at(date("2024-01-06")), Some(150.0));
    assert_eq!(history.interpolate_at(date("2023-12-31")), None);
    assert_eq!(history.interpolate_at(date("2024-01-12")), None);
}
