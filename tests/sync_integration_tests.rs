//! End-to-end sync runs against a scripted bridge.
//!
//! These cover the orchestrator state machine: device resolution, the
//! incremental gate, transfer, notification, and the commit-only-on-
//! zero-failures rule.

mod common;

use common::{device_listing, exit, ok, push_ok, ScriptedRunner};
use droidsync::commands::sync::run_with;
use droidsync::device::DeviceChooser;
use droidsync::scanner::NoConversion;
use droidsync::state::SyncStateStore;
use droidsync::types::{Device, SyncError};
use droidsync::Config;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

struct AutoChooser(Option<usize>);

impl DeviceChooser for AutoChooser {
    fn choose(&self, _devices: &[Device]) -> Option<usize> {
        self.0
    }
}

fn config_for(source: &Path, state_file: &Path) -> Config {
    Config {
        source: source.to_path_buf(),
        target: "/sdcard/sync".to_string(),
        state_file: state_file.to_path_buf(),
        bridge_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

fn scripted_happy_bridge(serials: &[&str]) -> ScriptedRunner {
    ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(serials))])
        .rule("getprop", vec![ok("")])
        .rule("mkdir -p", vec![ok("")])
        .rule("push", vec![push_ok()])
        .rule("am broadcast", vec![ok("Broadcast completed")])
}

fn now_epoch() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs_f64()
}

#[test]
fn test_successful_run_pushes_notifies_and_commits() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");
    fs::create_dir_all(src.path().join("nested")).expect("create nested dir");
    fs::write(src.path().join("nested/b.jpg"), b"bbbbbb").expect("write b.jpg");

    let state_file = src.path().join(".state");
    let runner = scripted_happy_bridge(&["serial-a"]);
    let started = now_epoch();

    let summary = run_with(
        &config_for(src.path(), &state_file),
        &runner,
        &AutoChooser(None),
        &NoConversion,
    )
    .expect("run succeeds");

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.bytes_pushed, 10);
    assert!(summary.committed);

    // Both files in one notification batch.
    assert_eq!(runner.calls_matching("am broadcast"), 1);
    assert_eq!(runner.calls_matching("push"), 2);

    // Committed timestamp is at or after the run start.
    let committed = SyncStateStore::new(&state_file)
        .read()
        .expect("read state")
        .expect("state present");
    assert!(committed >= started - 1.0);
    assert!(committed <= now_epoch() + 1.0);
}

#[test]
fn test_failed_item_leaves_state_unchanged() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("good.jpg"), b"gggg").expect("write good.jpg");
    fs::write(src.path().join("bad.jpg"), b"bbbb").expect("write bad.jpg");

    let state_file = src.path().join(".state");
    let runner = ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(&["serial-a"]))])
        .rule("getprop", vec![ok("")])
        .rule("mkdir -p", vec![ok("")])
        .rule("bad.jpg", vec![exit(1, "", "error: connection reset")])
        .rule("push", vec![push_ok()])
        .rule("am broadcast", vec![ok("Broadcast completed")]);

    let summary = run_with(
        &config_for(src.path(), &state_file),
        &runner,
        &AutoChooser(None),
        &NoConversion,
    )
    .expect("run completes despite item failure");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(!summary.committed);

    // State is only committed on zero failures.
    assert_eq!(
        SyncStateStore::new(&state_file).read().expect("read state"),
        None
    );

    // The succeeded file was still announced to the media index.
    assert_eq!(runner.calls_matching("am broadcast"), 1);
}

#[test]
fn test_incremental_run_with_nothing_new_is_a_no_op() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("old.jpg"), b"oooo").expect("write old.jpg");

    let state_file = src.path().join(".state");
    // Last sync far in the future relative to the file's mtime.
    SyncStateStore::new(&state_file)
        .write(now_epoch() + 3_600.0)
        .expect("seed state");

    let runner = ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(&["serial-a"]))])
        .rule("getprop", vec![ok("")]);

    let config = Config {
        incremental: true,
        ..config_for(src.path(), &state_file)
    };
    let summary = run_with(&config, &runner, &AutoChooser(None), &NoConversion)
        .expect("no-op run succeeds");

    assert_eq!(summary, Default::default());
    assert_eq!(runner.calls_matching("push"), 0);
    assert_eq!(runner.calls_matching("am broadcast"), 0);
}

#[test]
fn test_incremental_rerun_after_commit_finds_nothing() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    let state_file = src.path().join(".state");
    let config = Config {
        incremental: true,
        ..config_for(src.path(), &state_file)
    };

    let first_runner = scripted_happy_bridge(&["serial-a"]);
    let first = run_with(&config, &first_runner, &AutoChooser(None), &NoConversion)
        .expect("first run succeeds");
    assert!(first.committed);

    let second_runner = ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(&["serial-a"]))])
        .rule("getprop", vec![ok("")]);
    let second = run_with(&config, &second_runner, &AutoChooser(None), &NoConversion)
        .expect("second run succeeds");

    assert_eq!(second.attempted, 0);
    assert_eq!(second_runner.calls_matching("push"), 0);
}

#[test]
fn test_notification_failure_does_not_fail_the_run() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    let state_file = src.path().join(".state");
    let runner = ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(&["serial-a"]))])
        .rule("getprop", vec![ok("")])
        .rule("mkdir -p", vec![ok("")])
        .rule("push", vec![push_ok()])
        .rule("am broadcast", vec![exit(1, "", "Broadcast failed")]);

    let summary = run_with(
        &config_for(src.path(), &state_file),
        &runner,
        &AutoChooser(None),
        &NoConversion,
    )
    .expect("run succeeds despite notification failure");

    // Files are on the device, so the run commits.
    assert_eq!(summary.failed, 0);
    assert!(summary.committed);
}

#[test]
fn test_chooser_selects_among_multiple_devices() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    let state_file = src.path().join(".state");
    let runner = scripted_happy_bridge(&["first", "second"]);

    let summary = run_with(
        &config_for(src.path(), &state_file),
        &runner,
        &AutoChooser(Some(1)),
        &NoConversion,
    )
    .expect("run succeeds");

    assert_eq!(summary.succeeded, 1);
    // Every device-scoped call targets the chosen serial.
    for call in runner.calls() {
        if call.contains("push") || call.contains("mkdir") || call.contains("broadcast") {
            assert!(call.starts_with("-s second"), "unexpected target: {call}");
        }
    }
}

#[test]
fn test_requested_serial_bypasses_chooser() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    let state_file = src.path().join(".state");
    let runner = scripted_happy_bridge(&["first", "second"]);

    let config = Config {
        device: Some("first".to_string()),
        ..config_for(src.path(), &state_file)
    };
    // A chooser that would cancel; it must not be consulted.
    let summary = run_with(&config, &runner, &AutoChooser(None), &NoConversion)
        .expect("run succeeds without prompting");

    assert_eq!(summary.succeeded, 1);
}

#[test]
fn test_cancelled_selection_aborts_before_any_transfer() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    let state_file = src.path().join(".state");
    let runner = ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(&["first", "second"]))]);

    let result = run_with(
        &config_for(src.path(), &state_file),
        &runner,
        &AutoChooser(None),
        &NoConversion,
    );

    assert!(matches!(result, Err(SyncError::SelectionCancelled)));
    assert_eq!(runner.calls_matching("push"), 0);
}

#[test]
fn test_dry_run_transfers_nothing() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    let state_file = src.path().join(".state");
    let runner = ScriptedRunner::new()
        .rule("devices -l", vec![ok(&device_listing(&["serial-a"]))])
        .rule("getprop", vec![ok("")]);

    let config = Config {
        dry_run: true,
        ..config_for(src.path(), &state_file)
    };
    let summary = run_with(&config, &runner, &AutoChooser(None), &NoConversion)
        .expect("dry run succeeds");

    assert_eq!(summary, Default::default());
    assert_eq!(runner.calls_matching("push"), 0);
    assert_eq!(
        SyncStateStore::new(&state_file).read().expect("read state"),
        None
    );
}

#[test]
fn test_unwritable_state_file_surfaces_after_transfer() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.jpg"), b"aaaa").expect("write a.jpg");

    // Parent directory of the state file does not exist.
    let state_file = src.path().join("missing-dir/state");
    let runner = scripted_happy_bridge(&["serial-a"]);

    let result = run_with(
        &config_for(src.path(), &state_file),
        &runner,
        &AutoChooser(None),
        &NoConversion,
    );

    assert!(matches!(result, Err(SyncError::PersistState(_))));
    // The transfer itself completed before the commit failed.
    assert_eq!(runner.calls_matching("push"), 1);
}
