//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

const DATE: &str = "2025-03-14";

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dayplanner"))
        .args(args)
        .env("DAYPLANNER_DATA_DIR", data_dir)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn list(data_dir: &Path) -> Vec<serde_json::Value> {
    let stdout = run_ok(data_dir, &["task", "list", "--date", DATE]);
    serde_json::from_str(&stdout).expect("task list prints a JSON array")
}

fn add(data_dir: &Path, title: &str, start: &str, end: &str) -> String {
    let stdout = run_ok(
        data_dir,
        &["task", "add", title, "--start", start, "--end", end, "--date", DATE],
    );
    let first = stdout.lines().next().unwrap();
    first.trim_start_matches("Task created: ").to_string()
}

#[test]
fn test_task_add_and_list() {
    let dir = tempfile::tempdir().unwrap();
    add(dir.path(), "Write report", "13:00", "14:30");
    add(dir.path(), "Standup", "09:00", "09:15");

    let tasks = list(dir.path());
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "Standup");
    assert_eq!(tasks[1]["title"], "Write report");
    assert_eq!(tasks[1]["duration_minutes"], 90);
    assert!(dir.path().join("schedule.json").exists());
}

#[test]
fn test_task_add_rejects_invalid_input() {
    let dir = tempfile::tempdir().unwrap();

    let (code, _, stderr) = run_cli(
        dir.path(),
        &["task", "add", "Backwards", "--start", "11:00", "--end", "10:00", "--date", DATE],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Invalid time range"), "{stderr}");

    let (code, _, stderr) = run_cli(dir.path(), &["task", "add", "   ", "--date", DATE]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid title"), "{stderr}");

    assert!(list(dir.path()).is_empty());
}

#[test]
fn test_overlapping_add_suggests_a_slot() {
    let dir = tempfile::tempdir().unwrap();
    add(dir.path(), "Call", "10:00", "10:30");

    let (code, _, stderr) = run_cli(
        dir.path(),
        &["task", "add", "Clash", "--start", "09:55", "--end", "10:05", "--date", DATE],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("next free slot is 09:00-09:10"), "{stderr}");

    run_ok(
        dir.path(),
        &["task", "add", "Clash", "--start", "09:55", "--end", "10:05", "--date", DATE, "--force"],
    );
    assert_eq!(list(dir.path()).len(), 2);
}

#[test]
fn test_slot_find() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["slot", "find", "--duration", "60", "--date", DATE]).trim(), "09:00");

    add(dir.path(), "Morning", "09:00", "12:00");
    add(dir.path(), "Afternoon", "12:30", "17:00");
    assert_eq!(run_ok(dir.path(), &["slot", "find", "--duration", "30", "--date", DATE]).trim(), "12:00");
    assert_eq!(
        run_ok(dir.path(), &["slot", "find", "--duration", "45", "--date", DATE]).trim(),
        "none available"
    );

    let (code, _, stderr) = run_cli(dir.path(), &["slot", "find", "--duration", "0", "--date", DATE]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid duration"), "{stderr}");
}

#[test]
fn test_huge_duration_finds_no_slot() {
    let dir = tempfile::tempdir().unwrap();
    let huge = i64::MAX.to_string();
    assert_eq!(
        run_ok(dir.path(), &["slot", "find", "--duration", &huge, "--date", DATE]).trim(),
        "none available"
    );

    let (code, _, stderr) = run_cli(
        dir.path(),
        &["task", "add", "Forever", "--auto", "--duration", &huge, "--date", DATE],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("no free"), "{stderr}");
}

#[test]
fn test_auto_placement() {
    let dir = tempfile::tempdir().unwrap();
    add(dir.path(), "Morning", "09:00", "10:00");
    run_ok(
        dir.path(),
        &["task", "add", "Review", "--auto", "--duration", "45", "--date", DATE],
    );

    let tasks = list(dir.path());
    let review = tasks.iter().find(|t| t["title"] == "Review").unwrap();
    assert_eq!(review["start"], "10:00:00");
    assert_eq!(review["end"], "10:45:00");
}

#[test]
fn test_done_edit_remove_and_progress() {
    let dir = tempfile::tempdir().unwrap();
    let id = add(dir.path(), "Plan sprint", "10:00", "11:00");
    add(dir.path(), "Email", "11:30", "12:00");

    let stdout = run_ok(dir.path(), &["task", "done", &id[..8], "--date", DATE]);
    assert!(stdout.contains("[DONE]"), "{stdout}");

    let stdout = run_ok(
        dir.path(),
        &["task", "edit", &id, "--date", DATE, "--title", "Plan sprint 12", "--end", "11:15"],
    );
    let edited: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(edited["title"], "Plan sprint 12");
    assert_eq!(edited["end"], "11:15:00");
    assert_eq!(edited["done"], true);

    let progress: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["task", "progress", "--date", DATE])).unwrap();
    assert_eq!(progress["done"], 1);
    assert_eq!(progress["total"], 2);
    assert_eq!(progress["pending"], serde_json::json!(["Email"]));
    assert_eq!(progress["month"], "2025-03");
    assert_eq!(progress["month_completed"], 1);
    assert_eq!(progress["month_total"], 2);

    run_ok(dir.path(), &["task", "remove", &id, "--date", DATE]);
    let progress: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["task", "progress", "--date", DATE])).unwrap();
    assert_eq!(progress["total"], 1);
    assert_eq!(progress["month_completed"], 0);
    assert_eq!(progress["month_total"], 1);
}

#[test]
fn test_current_and_multi_done() {
    let dir = tempfile::tempdir().unwrap();
    let email = add(dir.path(), "Email", "11:30", "12:00");
    let standup = add(dir.path(), "Standup", "09:00", "09:15");
    let review = add(dir.path(), "Review", "14:00", "15:00");

    let stdout = run_ok(dir.path(), &["task", "current", "--date", DATE]);
    assert!(stdout.starts_with("Current task: Standup"), "{stdout}");

    let stdout = run_ok(dir.path(), &["task", "done", &standup[..8], &email, "--date", DATE]);
    assert_eq!(stdout.matches("[DONE]").count(), 2, "{stdout}");
    let stdout = run_ok(dir.path(), &["task", "current", "--date", DATE]);
    assert!(stdout.starts_with("Current task: Review"), "{stdout}");

    // One unknown id leaves the others untouched.
    let (code, _, _) = run_cli(dir.path(), &["task", "done", &review, "nope", "--date", DATE]);
    assert_eq!(code, 1);
    let tasks = list(dir.path());
    let pending = tasks.iter().find(|t| t["title"] == "Review").unwrap();
    assert_eq!(pending["done"], false);

    run_ok(dir.path(), &["task", "done", &review, "--date", DATE]);
    assert_eq!(
        run_ok(dir.path(), &["task", "current", "--date", DATE]).trim(),
        "No pending tasks. All done!"
    );
}

#[cfg(unix)]
#[test]
fn test_monitor_stops_on_sigterm() {
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_dayplanner"))
        .args(["monitor", "run"])
        .env("DAYPLANNER_DATA_DIR", dir.path())
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn monitor");
    std::thread::sleep(Duration::from_millis(1500));

    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("monitor did not stop after SIGTERM");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert_eq!(exit.code(), Some(0));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "monitor.reminder_lead_minutes"]).trim(),
        "5"
    );

    run_ok(dir.path(), &["config", "set", "monitor.reminder_lead_minutes", "10"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "monitor.reminder_lead_minutes"]).trim(),
        "10"
    );

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "monitor.break_warning_minutes", "90"]);
    assert_eq!(code, 1);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "monitor.break_warning_minutes"]).trim(),
        "55"
    );

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"), "{stderr}");
}

#[test]
fn test_config_work_day_drives_slot_search() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "work_day.start", "08:00"]);
    assert_eq!(run_ok(dir.path(), &["slot", "find", "--duration", "30", "--date", DATE]).trim(), "08:00");
}

#[test]
fn test_monitor_single_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["monitor", "run", "--once"]);
    let events: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert!(events.is_empty());

    let stdout = run_ok(dir.path(), &["monitor", "run", "--once", "--focus"]);
    let events: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(events[0]["type"], "FocusStarted");
}
