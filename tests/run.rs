//! Integration tests for the `run` command.
use minigrid::cli::{RunOpts, handle_run_command};
use minigrid::settings::Settings;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("MINIGRID_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    let costs = std::fs::read_to_string(output_dir.join("costs.csv")).unwrap();
    let mut lines = costs.lines();
    assert_eq!(lines.next(), Some("cost_type,value"));
    assert_eq!(costs.lines().count(), 10);
    assert!(costs.lines().last().unwrap().starts_with("total,"));
    assert!(output_dir.join("minigrid_info.log").is_file());

    // Second time will fail because the logging is already initialised
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("results2")),
        overwrite: false,
    };
    assert_eq!(
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}
