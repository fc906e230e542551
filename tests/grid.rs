//! Integration tests for the `grid` command.
use minigrid::cli::{ProfileOpts, handle_grid_command};
use minigrid::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `grid` command, checking that profiles are cached.
#[test]
fn test_handle_grid_command() {
    unsafe { std::env::set_var("MINIGRID_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = ProfileOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        regenerate: false,
    };
    handle_grid_command(&get_model_dir(), &opts, Some(42), Some(Settings::default())).unwrap();

    for name in ["weak", "strong"] {
        let contents = fs::read_to_string(tempdir.path().join(format!("{name}_grid_status.csv")))
            .unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("status"));

        // 20 years of hourly values
        assert_eq!(lines.count(), 20 * 8760);
    }
}
